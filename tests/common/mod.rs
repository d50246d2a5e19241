#![allow(dead_code)]

use anyhow::{Result, bail};
use async_trait::async_trait;
use gallery_sweep::config::Selectors;
use gallery_sweep::page::{Page, ScrollMetrics, UiTarget};
use std::collections::HashSet;
use std::sync::{Arc, Mutex, MutexGuard};
use tokio::time::{Duration, Instant};

pub const MONTHS: [&str; 12] = [
    "JAN", "FEB", "MAR", "APR", "MAY", "JUN", "JUL", "AUG", "SEP", "OCT", "NOV", "DEC",
];

#[derive(Debug, Clone)]
pub struct Download {
    pub href: String,
    pub filename: String,
    pub at: Instant,
}

#[derive(Debug)]
pub struct GalleryState {
    pub opener_visible: bool,
    pub picker_open: bool,
    pub year: i32,
    /// Year buttons get clicked but the display never changes.
    pub year_stuck: bool,
    pub month_cells: Vec<String>,
    pub opener_clicks: u32,
    pub next_clicks: u32,
    pub prev_clicks: u32,
    pub selected: Option<(i32, String)>,

    /// Items present right after a month is selected.
    pub initial_items: usize,
    /// Items added by each successive scroll; nothing after the list ends.
    pub growth: Vec<usize>,
    pub items: usize,
    pub scrolls: usize,
    /// Forces the "scrolled to the bottom" reading.
    pub at_bottom_override: Option<bool>,
    /// Explicit targets; generated links are used when `None`.
    pub targets: Option<Vec<UiTarget>>,
    pub fail_hrefs: HashSet<String>,
    pub downloads: Vec<Download>,
}

impl Default for GalleryState {
    fn default() -> Self {
        Self {
            opener_visible: true,
            picker_open: false,
            year: 2025,
            year_stuck: false,
            month_cells: MONTHS.iter().map(|m| format!(" {m} ")).collect(),
            opener_clicks: 0,
            next_clicks: 0,
            prev_clicks: 0,
            selected: None,
            initial_items: 0,
            growth: Vec::new(),
            items: 0,
            scrolls: 0,
            at_bottom_override: None,
            targets: None,
            fail_hrefs: HashSet::new(),
            downloads: Vec::new(),
        }
    }
}

/// A scripted month-picker gallery answering the default selectors.
pub struct MockGallery {
    selectors: Selectors,
    state: Mutex<GalleryState>,
}

impl MockGallery {
    pub fn new(state: GalleryState) -> Arc<Self> {
        Arc::new(Self {
            selectors: Selectors::default(),
            state: Mutex::new(state),
        })
    }

    pub fn state(&self) -> MutexGuard<'_, GalleryState> {
        self.state.lock().unwrap()
    }

    fn generated_targets(state: &GalleryState) -> Vec<UiTarget> {
        let (year, month) = state
            .selected
            .clone()
            .unwrap_or((state.year, "NONE".to_string()));
        (0..state.items)
            .map(|i| {
                UiTarget::link(
                    i,
                    format!(
                        "https://cdn.example.com/{year}/{month}/IMG_{i:04}.jpg?Expires={}",
                        1_700_000_000 + i
                    ),
                )
            })
            .collect()
    }
}

#[async_trait]
impl Page for MockGallery {
    async fn visible_text(&self, selector: &str) -> Result<Option<String>> {
        let s = &self.selectors;
        let state = self.state();
        Ok(if selector == s.calendar_opener {
            state.opener_visible.then(|| "Month".to_string())
        } else if selector == s.year_display {
            state.picker_open.then(|| state.year.to_string())
        } else if selector == s.next_year_button || selector == s.prev_year_button {
            state.picker_open.then(String::new)
        } else {
            None
        })
    }

    async fn texts(&self, selector: &str) -> Result<Vec<String>> {
        let state = self.state();
        if selector == self.selectors.month_cell && state.picker_open {
            Ok(state.month_cells.clone())
        } else {
            Ok(Vec::new())
        }
    }

    async fn click(&self, selector: &str, index: usize) -> Result<()> {
        let s = &self.selectors;
        let mut state = self.state();
        if selector == s.calendar_opener {
            state.opener_clicks += 1;
            state.picker_open = true;
        } else if selector == s.next_year_button {
            state.next_clicks += 1;
            if !state.year_stuck {
                state.year += 1;
            }
        } else if selector == s.prev_year_button {
            state.prev_clicks += 1;
            if !state.year_stuck {
                state.year -= 1;
            }
        } else if selector == s.month_cell {
            let Some(cell) = state.month_cells.get(index).cloned() else {
                bail!("no month cell {index}");
            };
            state.selected = Some((state.year, cell.trim().to_string()));
            state.picker_open = false;
            state.items = state.initial_items;
            state.scrolls = 0;
        } else {
            bail!("unexpected click on {selector}");
        }
        Ok(())
    }

    async fn count(&self, _selector: &str) -> Result<usize> {
        Ok(self.state().items)
    }

    async fn scroll_to_end(&self, _container: &str) -> Result<()> {
        let mut state = self.state();
        let added = state.growth.get(state.scrolls).copied().unwrap_or(0);
        state.scrolls += 1;
        state.items += added;
        Ok(())
    }

    async fn scroll_metrics(&self, _container: &str) -> Result<ScrollMetrics> {
        let state = self.state();
        Ok(ScrollMetrics {
            scroll_height: (state.items * 100) as f64,
            at_bottom: state
                .at_bottom_override
                .unwrap_or(state.scrolls >= state.growth.len()),
        })
    }

    async fn targets(&self, _selector: &str) -> Result<Vec<UiTarget>> {
        let state = self.state();
        Ok(match &state.targets {
            Some(targets) => targets.clone(),
            None => Self::generated_targets(&state),
        })
    }

    async fn download(&self, _selector: &str, href: &str, filename: &str) -> Result<()> {
        let mut state = self.state();
        if state.fail_hrefs.contains(href) {
            bail!("click threw for {href}");
        }
        state.downloads.push(Download {
            href: href.to_string(),
            filename: filename.to_string(),
            at: Instant::now(),
        });
        Ok(())
    }
}

pub fn non_link(ordinal: usize, href: &str) -> UiTarget {
    UiTarget {
        ordinal,
        tag: "div".to_string(),
        href: Some(href.to_string()),
    }
}

pub fn missing_href(ordinal: usize) -> UiTarget {
    UiTarget {
        ordinal,
        tag: "a".to_string(),
        href: None,
    }
}

pub fn ms(n: u64) -> Duration {
    Duration::from_millis(n)
}
