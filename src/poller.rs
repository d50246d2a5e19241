//! Bounded waits on external page state.

use std::future::Future;
use std::sync::Arc;
use std::time::Duration;
use tokio::sync::Notify;
use tokio::time::Instant;
use tokio_util::sync::CancellationToken;
use tracing::{debug, warn};

use crate::error::AutomationError;
use crate::page::Page;

/// Sleep for `duration` unless the run is cancelled first.
pub async fn pause(cancel: &CancellationToken, duration: Duration) -> Result<(), AutomationError> {
    tokio::select! {
        _ = cancel.cancelled() => Err(AutomationError::Cancelled),
        _ = tokio::time::sleep(duration) => Ok(()),
    }
}

#[derive(Clone)]
pub struct Poller {
    timeout: Duration,
    interval: Duration,
    cancel: CancellationToken,
    feed: Option<Arc<Notify>>,
}

impl Poller {
    pub fn new(timeout: Duration, interval: Duration, cancel: CancellationToken) -> Self {
        Self {
            timeout,
            interval,
            cancel,
            feed: None,
        }
    }

    /// Wake early whenever `feed` is notified instead of sleeping a full interval.
    pub fn with_change_feed(mut self, feed: Option<Arc<Notify>>) -> Self {
        self.feed = feed;
        self
    }

    /// Evaluate `probe` until it yields a value or the timeout elapses.
    ///
    /// The probe always runs at least once. Probe errors count as "not yet":
    /// pages mid-render throw all kinds of transient evaluation errors.
    /// Only cancellation is an error; a timeout is `Ok(None)`.
    pub async fn wait_for<T, F, Fut>(
        &self,
        what: &str,
        mut probe: F,
    ) -> Result<Option<T>, AutomationError>
    where
        F: FnMut() -> Fut,
        Fut: Future<Output = anyhow::Result<Option<T>>>,
    {
        let deadline = Instant::now() + self.timeout;
        loop {
            if self.cancel.is_cancelled() {
                return Err(AutomationError::Cancelled);
            }
            match probe().await {
                Ok(Some(value)) => return Ok(Some(value)),
                Ok(None) => {}
                Err(e) => debug!(what, error = %e, "probe failed, retrying"),
            }
            if Instant::now() >= deadline {
                warn!(
                    what,
                    timeout_ms = self.timeout.as_millis() as u64,
                    "condition not met before timeout"
                );
                return Ok(None);
            }
            self.idle(deadline).await?;
        }
    }

    /// Wait for the first element matching `selector` to be present and visible,
    /// returning its text.
    pub async fn wait_visible(
        &self,
        page: &dyn Page,
        selector: &str,
    ) -> Result<Option<String>, AutomationError> {
        self.wait_for(selector, || page.visible_text(selector)).await
    }

    async fn idle(&self, deadline: Instant) -> Result<(), AutomationError> {
        let wake = (Instant::now() + self.interval).min(deadline);
        match &self.feed {
            Some(feed) => tokio::select! {
                _ = self.cancel.cancelled() => Err(AutomationError::Cancelled),
                _ = feed.notified() => Ok(()),
                _ = tokio::time::sleep_until(wake) => Ok(()),
            },
            None => tokio::select! {
                _ = self.cancel.cancelled() => Err(AutomationError::Cancelled),
                _ = tokio::time::sleep_until(wake) => Ok(()),
            },
        }
    }
}
