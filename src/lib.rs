//! Drives a month-picker photo gallery: select each month of a range, scroll
//! until the gallery stops growing, then click every download link with a
//! generated filename.
//!
//! The browser sits behind the [`page::Page`] trait so the driver can run
//! against anything that answers selector queries.

pub mod config;
pub mod dispatch;
pub mod error;
pub mod input;
pub mod naming;
pub mod page;
pub mod picker;
pub mod poller;
pub mod range;
pub mod report;
pub mod runner;
pub mod scroll;

pub use config::AutomationConfig;
pub use dispatch::{BatchDispatcher, BatchResult};
pub use error::AutomationError;
pub use input::{InputProvider, RunRequest, collect_request};
pub use page::{Page, ScrollMetrics, UiTarget};
pub use range::{MonthRange, YearMonth};
pub use report::{ConsoleNotifier, Fanout, Notifier, RunEvent, RunSummary};
pub use runner::Runner;
