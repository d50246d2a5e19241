//! Error taxonomy for the automation driver.

use thiserror::Error;

#[derive(Debug, Error)]
pub enum AutomationError {
    /// A polled element never became visible within the timeout.
    #[error("{what} not found or not visible (selector: {selector})")]
    NotFound { what: String, selector: String },

    /// Year navigation ran out of attempts without reaching the target year.
    #[error("failed to navigate to year {target} after {attempts} attempts (displayed: {displayed})")]
    NavigationBound {
        target: i32,
        displayed: i32,
        attempts: u32,
    },

    /// No month cell matched the requested month.
    #[error("could not find month \"{month}\" in the calendar")]
    NoMatch { month: String },

    /// The year display did not contain a number.
    #[error("year display shows \"{0}\", which is not a year")]
    UnreadableYear(String),

    /// `select` was called on a picker that already failed.
    #[error("month picker already failed before selecting {month}")]
    PickerFailed { month: String },

    #[error("input cancelled: {0}")]
    InputCancelled(String),

    #[error("invalid input: {0}")]
    InvalidInput(String),

    #[error("run cancelled")]
    Cancelled,

    #[error(transparent)]
    Page(#[from] anyhow::Error),
}

impl AutomationError {
    /// Whether this error only spoils the current month. Everything else ends the run.
    pub fn is_month_local(&self) -> bool {
        !matches!(
            self,
            AutomationError::InputCancelled(_)
                | AutomationError::InvalidInput(_)
                | AutomationError::Cancelled
        )
    }
}
