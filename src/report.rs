//! Run progress events and the final summary handed to the notification layer.

use serde::Serialize;
use std::fmt;
use std::sync::Arc;

use crate::range::{MonthRange, YearMonth};

#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
#[serde(tag = "kind", rename_all = "snake_case")]
pub enum MonthOutcome {
    /// Selecting or loading the month failed.
    Skipped { reason: String },
    /// Month selected but nothing loaded after scrolling.
    Empty,
    Downloaded { found: usize, dispatched: usize },
    /// The run was cancelled while this month was in progress. `dispatched`
    /// counts downloads initiated before the cancellation.
    Interrupted { dispatched: usize },
}

#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct MonthReport {
    pub month: YearMonth,
    pub label: String,
    pub outcome: MonthOutcome,
}

impl MonthReport {
    pub fn dispatched(&self) -> usize {
        match self.outcome {
            MonthOutcome::Downloaded { dispatched, .. }
            | MonthOutcome::Interrupted { dispatched } => dispatched,
            _ => 0,
        }
    }
}

impl fmt::Display for MonthReport {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        writeln!(f, "Processing {} (Album: {}):", self.month, self.label)?;
        match &self.outcome {
            MonthOutcome::Skipped { reason } => {
                write!(f, "  - Skipped: {reason}")
            }
            MonthOutcome::Empty => {
                writeln!(f, "  - Month selected successfully.")?;
                write!(f, "  - No photos found after scrolling. Skipped download.")
            }
            MonthOutcome::Downloaded { found, dispatched } => {
                writeln!(f, "  - Month selected successfully.")?;
                writeln!(f, "  - Found {found} photo items after scrolling.")?;
                write!(f, "  - Initiated {dispatched} downloads.")
            }
            MonthOutcome::Interrupted { dispatched: 0 } => {
                write!(f, "  - Interrupted by cancellation.")
            }
            MonthOutcome::Interrupted { dispatched } => write!(
                f,
                "  - Interrupted by cancellation after initiating {dispatched} downloads."
            ),
        }
    }
}

#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize)]
pub struct RunSummary {
    pub months: Vec<MonthReport>,
    pub total_dispatched: usize,
    pub cancelled: bool,
}

impl RunSummary {
    pub fn push(&mut self, report: MonthReport) {
        self.total_dispatched += report.dispatched();
        self.months.push(report);
    }
}

impl fmt::Display for RunSummary {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        writeln!(f, "Summary of operations:")?;
        for report in &self.months {
            writeln!(f, "{report}")?;
        }
        if self.cancelled {
            writeln!(f, "Run was cancelled before the whole range was processed.")?;
        }
        write!(
            f,
            "Total photo downloads initiated across all selected months: {}",
            self.total_dispatched
        )
    }
}

#[derive(Debug, Clone, Serialize)]
#[serde(tag = "event", rename_all = "snake_case")]
pub enum RunEvent {
    Started { range: MonthRange, base_label: String },
    MonthStarted { month: YearMonth, label: String },
    MonthFinished { report: MonthReport },
    Finished { summary: RunSummary },
}

/// Output sink for run progress.
pub trait Notifier: Send + Sync {
    fn notify(&self, event: &RunEvent);
}

/// Prints the operator-facing messages to stdout.
pub struct ConsoleNotifier;

impl Notifier for ConsoleNotifier {
    fn notify(&self, event: &RunEvent) {
        match event {
            RunEvent::Started { range, base_label } => println!(
                "Automation starting.\n  Start: {}\n  End: {}\n  Months: {}\n  Base album name: {}\nDownload initiations are logged as they happen.",
                range.start,
                range.end,
                range.month_count(),
                base_label
            ),
            RunEvent::MonthStarted { month, .. } => println!("\n--- Processing: {month} ---"),
            RunEvent::MonthFinished { report } => println!("{report}"),
            RunEvent::Finished { summary } => println!(
                "\n{summary}\nAll download initiations have been issued; check the browser's download manager for completion."
            ),
        }
    }
}

/// Forwards every event to each inner notifier in turn.
pub struct Fanout(pub Vec<Arc<dyn Notifier>>);

impl Notifier for Fanout {
    fn notify(&self, event: &RunEvent) {
        for notifier in &self.0 {
            notifier.notify(event);
        }
    }
}
