mod common;

use common::{GalleryState, MockGallery};
use gallery_sweep::config::AutomationConfig;
use gallery_sweep::picker::{MonthPicker, PickerState};
use gallery_sweep::poller::Poller;
use gallery_sweep::{AutomationError, YearMonth};
use tokio_util::sync::CancellationToken;

fn poller(config: &AutomationConfig, cancel: &CancellationToken) -> Poller {
    Poller::new(
        config.timings.wait_timeout(),
        config.timings.poll_interval(),
        cancel.clone(),
    )
}

#[tokio::test(start_paused = true)]
async fn navigates_forward_and_selects_month() {
    let page = MockGallery::new(GalleryState {
        year: 2023,
        ..GalleryState::default()
    });
    let config = AutomationConfig::default();
    let cancel = CancellationToken::new();
    let poller = poller(&config, &cancel);
    let mut picker = MonthPicker::new(
        page.as_ref(),
        &poller,
        &config.selectors,
        &config.timings,
        cancel,
    );

    picker.select(YearMonth::new(2025, 3).unwrap()).await.unwrap();

    assert_eq!(picker.state(), PickerState::MonthSelected);
    assert_eq!(picker.nav_attempts(), 2);
    let state = page.state();
    assert_eq!(state.opener_clicks, 1);
    assert_eq!(state.next_clicks, 2);
    assert_eq!(state.prev_clicks, 0);
    assert_eq!(state.selected, Some((2025, "MAR".to_string())));
}

#[tokio::test(start_paused = true)]
async fn navigates_backward() {
    let page = MockGallery::new(GalleryState {
        year: 2026,
        ..GalleryState::default()
    });
    let config = AutomationConfig::default();
    let cancel = CancellationToken::new();
    let poller = poller(&config, &cancel);
    let mut picker = MonthPicker::new(page.as_ref(), &poller, &config.selectors, &config.timings, cancel);

    picker.select(YearMonth::new(2024, 12).unwrap()).await.unwrap();

    let state = page.state();
    assert_eq!(state.prev_clicks, 2);
    assert_eq!(state.selected, Some((2024, "DEC".to_string())));
}

#[tokio::test(start_paused = true)]
async fn already_open_picker_is_not_clicked_again() {
    let page = MockGallery::new(GalleryState {
        picker_open: true,
        ..GalleryState::default()
    });
    let config = AutomationConfig::default();
    let cancel = CancellationToken::new();
    let poller = poller(&config, &cancel);
    let mut picker = MonthPicker::new(page.as_ref(), &poller, &config.selectors, &config.timings, cancel);

    picker.select(YearMonth::new(2025, 7).unwrap()).await.unwrap();

    assert_eq!(page.state().opener_clicks, 0);
    assert_eq!(picker.nav_attempts(), 0);
}

#[tokio::test(start_paused = true)]
async fn stuck_year_display_stops_at_the_attempt_bound() {
    let page = MockGallery::new(GalleryState {
        year: 2020,
        year_stuck: true,
        ..GalleryState::default()
    });
    let config = AutomationConfig::default();
    let cancel = CancellationToken::new();
    let poller = poller(&config, &cancel);
    let mut picker = MonthPicker::new(page.as_ref(), &poller, &config.selectors, &config.timings, cancel);

    let err = picker
        .select(YearMonth::new(2025, 1).unwrap())
        .await
        .unwrap_err();

    assert!(matches!(
        err,
        AutomationError::NavigationBound {
            target: 2025,
            displayed: 2020,
            attempts: 24
        }
    ));
    assert_eq!(page.state().next_clicks, 24);
    assert_eq!(picker.state(), PickerState::Failed);
}

#[tokio::test(start_paused = true)]
async fn failed_picker_refuses_further_selection_without_clicking() {
    let page = MockGallery::new(GalleryState {
        month_cells: Vec::new(),
        ..GalleryState::default()
    });
    let config = AutomationConfig::default();
    let cancel = CancellationToken::new();
    let poller = poller(&config, &cancel);
    let mut picker = MonthPicker::new(page.as_ref(), &poller, &config.selectors, &config.timings, cancel);
    let target = YearMonth::new(2025, 3).unwrap();

    assert!(picker.select(target).await.is_err());
    let clicks = page.state().opener_clicks;

    let err = picker.select(target).await.unwrap_err();
    assert!(matches!(err, AutomationError::PickerFailed { ref month } if month == "3/2025"));
    assert!(err.is_month_local());
    assert_eq!(page.state().opener_clicks, clicks);
}

#[tokio::test(start_paused = true)]
async fn custom_attempt_bound_is_honoured() {
    let page = MockGallery::new(GalleryState {
        year: 2020,
        year_stuck: true,
        ..GalleryState::default()
    });
    let mut config = AutomationConfig::default();
    config.timings.max_year_nav_attempts = 5;
    let cancel = CancellationToken::new();
    let poller = poller(&config, &cancel);
    let mut picker = MonthPicker::new(page.as_ref(), &poller, &config.selectors, &config.timings, cancel);

    assert!(picker.select(YearMonth::new(2025, 1).unwrap()).await.is_err());
    assert_eq!(page.state().next_clicks, 5);
}

#[tokio::test(start_paused = true)]
async fn missing_month_cell_is_no_match() {
    let page = MockGallery::new(GalleryState {
        month_cells: vec!["Jan".into(), "Feb".into()],
        ..GalleryState::default()
    });
    let config = AutomationConfig::default();
    let cancel = CancellationToken::new();
    let poller = poller(&config, &cancel);
    let mut picker = MonthPicker::new(page.as_ref(), &poller, &config.selectors, &config.timings, cancel);

    let err = picker
        .select(YearMonth::new(2025, 3).unwrap())
        .await
        .unwrap_err();

    assert!(matches!(err, AutomationError::NoMatch { ref month } if month == "Mar"));
    assert!(page.state().selected.is_none());
}

#[tokio::test(start_paused = true)]
async fn invisible_opener_is_not_found_after_timeout() {
    let page = MockGallery::new(GalleryState {
        opener_visible: false,
        ..GalleryState::default()
    });
    let config = AutomationConfig::default();
    let cancel = CancellationToken::new();
    let poller = poller(&config, &cancel);
    let mut picker = MonthPicker::new(page.as_ref(), &poller, &config.selectors, &config.timings, cancel);

    let started = tokio::time::Instant::now();
    let err = picker
        .select(YearMonth::new(2025, 3).unwrap())
        .await
        .unwrap_err();

    assert!(matches!(err, AutomationError::NotFound { .. }));
    assert!(started.elapsed() >= config.timings.wait_timeout());
}

#[tokio::test(start_paused = true)]
async fn advance_steps_one_transition_at_a_time() {
    let page = MockGallery::new(GalleryState {
        year: 2024,
        ..GalleryState::default()
    });
    let config = AutomationConfig::default();
    let cancel = CancellationToken::new();
    let poller = poller(&config, &cancel);
    let mut picker = MonthPicker::new(page.as_ref(), &poller, &config.selectors, &config.timings, cancel);
    let target = YearMonth::new(2025, 2).unwrap();

    let opened = PickerState::Open { displayed_year: 2024 };
    assert_eq!(picker.advance(target).await.unwrap(), opened);
    assert_eq!(picker.state(), opened);
    assert_eq!(
        picker.advance(target).await.unwrap(),
        PickerState::Open { displayed_year: 2025 }
    );
    assert_eq!(picker.advance(target).await.unwrap(), PickerState::YearMatched);
    assert_eq!(picker.advance(target).await.unwrap(), PickerState::MonthSelected);
    assert_eq!(page.state().selected, Some((2025, "FEB".to_string())));
}
