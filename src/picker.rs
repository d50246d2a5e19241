//! State machine for the gallery's year/month picker.
//!
//! The picker is an opaque widget we can only click and observe, so every
//! transition is bounded: a poll timeout or an attempt cap moves the machine
//! to `Failed` instead of hanging.

use tokio_util::sync::CancellationToken;
use tracing::{debug, info, warn};

use crate::config::{Selectors, Timings};
use crate::error::AutomationError;
use crate::page::Page;
use crate::poller::{Poller, pause};
use crate::range::YearMonth;

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum PickerState {
    Closed,
    Open { displayed_year: i32 },
    YearMatched,
    MonthSelected,
    Failed,
}

impl PickerState {
    pub fn is_terminal(self) -> bool {
        matches!(self, PickerState::MonthSelected | PickerState::Failed)
    }
}

pub struct MonthPicker<'a> {
    page: &'a dyn Page,
    poller: &'a Poller,
    selectors: &'a Selectors,
    timings: &'a Timings,
    cancel: CancellationToken,
    state: PickerState,
    nav_attempts: u32,
}

impl<'a> MonthPicker<'a> {
    pub fn new(
        page: &'a dyn Page,
        poller: &'a Poller,
        selectors: &'a Selectors,
        timings: &'a Timings,
        cancel: CancellationToken,
    ) -> Self {
        Self {
            page,
            poller,
            selectors,
            timings,
            cancel,
            state: PickerState::Closed,
            nav_attempts: 0,
        }
    }

    pub fn state(&self) -> PickerState {
        self.state
    }

    /// Year-navigation clicks issued so far.
    pub fn nav_attempts(&self) -> u32 {
        self.nav_attempts
    }

    /// Drive the picker until `target` is selected or a transition fails.
    pub async fn select(&mut self, target: YearMonth) -> Result<(), AutomationError> {
        info!(month = %target, "selecting month");
        while !self.state.is_terminal() {
            self.advance(target).await?;
        }
        match self.state {
            PickerState::MonthSelected => Ok(()),
            _ => Err(AutomationError::PickerFailed {
                month: target.to_string(),
            }),
        }
    }

    /// Perform exactly one transition from the current state. A failing
    /// transition leaves the machine in `Failed`.
    pub async fn advance(&mut self, target: YearMonth) -> Result<PickerState, AutomationError> {
        let next = match self.transition(target).await {
            Ok(next) => next,
            Err(e) => {
                self.state = PickerState::Failed;
                return Err(e);
            }
        };
        debug!(from = ?self.state, to = ?next, "picker transition");
        self.state = next;
        Ok(next)
    }

    async fn transition(&mut self, target: YearMonth) -> Result<PickerState, AutomationError> {
        match self.state {
            PickerState::Closed => self.open().await,
            PickerState::Open { displayed_year } if displayed_year == target.year() => {
                info!(year = target.year(), "year is displayed");
                Ok(PickerState::YearMatched)
            }
            PickerState::Open { displayed_year } => {
                self.step_year(displayed_year, target.year()).await
            }
            PickerState::YearMatched => self.pick_month(target).await,
            terminal => Ok(terminal),
        }
    }

    async fn open(&mut self) -> Result<PickerState, AutomationError> {
        let opener = &self.selectors.calendar_opener;
        if self.poller.wait_visible(self.page, opener).await?.is_none() {
            return Err(AutomationError::NotFound {
                what: "calendar opener".to_string(),
                selector: opener.clone(),
            });
        }

        if self
            .page
            .visible_text(&self.selectors.year_display)
            .await?
            .is_some()
        {
            debug!("calendar controls already visible");
        } else {
            info!("opening calendar");
            self.page.click(opener, 0).await?;
            pause(&self.cancel, self.timings.short_delay()).await?;
        }

        let displayed_year = self.read_year().await?;
        Ok(PickerState::Open { displayed_year })
    }

    async fn step_year(&mut self, displayed: i32, target: i32) -> Result<PickerState, AutomationError> {
        if self.nav_attempts >= self.timings.max_year_nav_attempts {
            warn!(target, displayed, attempts = self.nav_attempts, "year navigation bound reached");
            return Err(AutomationError::NavigationBound {
                target,
                displayed,
                attempts: self.nav_attempts,
            });
        }

        let selectors = self.selectors;
        let (button, what) = if displayed < target {
            (&selectors.next_year_button, "next year button")
        } else {
            (&selectors.prev_year_button, "previous year button")
        };
        if self.poller.wait_visible(self.page, button).await?.is_none() {
            return Err(AutomationError::NotFound {
                what: what.to_string(),
                selector: button.clone(),
            });
        }
        self.page.click(button, 0).await?;
        self.nav_attempts += 1;
        pause(&self.cancel, self.timings.short_delay()).await?;

        let displayed_year = self.read_year().await?;
        debug!(displayed_year, attempt = self.nav_attempts, "current displayed year");
        pause(&self.cancel, self.timings.short_delay() / 3).await?;
        Ok(PickerState::Open { displayed_year })
    }

    async fn pick_month(&mut self, target: YearMonth) -> Result<PickerState, AutomationError> {
        let wanted = target.abbr().to_ascii_lowercase();
        let cells = self.page.texts(&self.selectors.month_cell).await?;
        let Some(index) = cells
            .iter()
            .position(|text| text.trim().to_lowercase() == wanted)
        else {
            return Err(AutomationError::NoMatch {
                month: target.abbr().to_string(),
            });
        };

        info!(month = target.abbr(), "clicking month cell");
        self.page.click(&self.selectors.month_cell, index).await?;
        pause(&self.cancel, self.timings.short_delay()).await?;
        info!(month = %target, "month selected");
        Ok(PickerState::MonthSelected)
    }

    async fn read_year(&self) -> Result<i32, AutomationError> {
        let selector = &self.selectors.year_display;
        let text = self
            .poller
            .wait_visible(self.page, selector)
            .await?
            .ok_or_else(|| AutomationError::NotFound {
                what: "year display".to_string(),
                selector: selector.clone(),
            })?;
        parse_year(&text).ok_or(AutomationError::UnreadableYear(text))
    }
}

/// Leading integer of the display text, so "2025 ▾" still reads as 2025.
fn parse_year(text: &str) -> Option<i32> {
    let digits: String = text
        .trim()
        .chars()
        .take_while(|c| c.is_ascii_digit())
        .collect();
    digits.parse().ok()
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn parses_leading_year() {
        assert_eq!(parse_year(" 2025 "), Some(2025));
        assert_eq!(parse_year("2024 ▾"), Some(2024));
        assert_eq!(parse_year("Year"), None);
        assert_eq!(parse_year(""), None);
    }

    #[test]
    fn terminal_states() {
        assert!(PickerState::MonthSelected.is_terminal());
        assert!(PickerState::Failed.is_terminal());
        assert!(!PickerState::Open { displayed_year: 2024 }.is_terminal());
        assert!(!PickerState::Closed.is_terminal());
    }
}
