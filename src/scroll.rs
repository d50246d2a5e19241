//! Scroll until a lazily rendered gallery stops growing.

use tokio_util::sync::CancellationToken;
use tracing::{debug, info, warn};

use crate::config::Timings;
use crate::error::AutomationError;
use crate::page::Page;
use crate::poller::pause;

pub struct ScrollExhauster<'a> {
    page: &'a dyn Page,
    container: &'a str,
    timings: &'a Timings,
    cancel: CancellationToken,
}

impl<'a> ScrollExhauster<'a> {
    pub fn new(
        page: &'a dyn Page,
        container: &'a str,
        timings: &'a Timings,
        cancel: CancellationToken,
    ) -> Self {
        Self {
            page,
            container,
            timings,
            cancel,
        }
    }

    /// Scroll until `item_selector` stops matching new elements, returning the
    /// final count. Hitting the attempt cap is not an error.
    pub async fn exhaust(&self, item_selector: &str) -> Result<usize, AutomationError> {
        let max_attempts = self.timings.max_scroll_attempts;
        let threshold = self.timings.stable_threshold.max(1);
        info!(item_selector, "scrolling to load gallery items");

        let mut count = 0;
        let mut stable = 0u32;
        let mut attempts = 0u32;

        while attempts < max_attempts {
            count = self.page.count(item_selector).await?;
            debug!(attempt = attempts + 1, max_attempts, items = count, "scrolling down");
            let before = self.page.scroll_metrics(self.container).await?;

            self.page.scroll_to_end(self.container).await?;
            pause(&self.cancel, self.timings.scroll_settle()).await?;

            let new_count = self.page.count(item_selector).await?;
            let after = self.page.scroll_metrics(self.container).await?;

            if new_count == count {
                let extent_stalled = after.scroll_height <= before.scroll_height && count > 0;
                if after.at_bottom || extent_stalled {
                    stable += 1;
                } else if count == 0 && attempts > 2 {
                    // empty gallery, nothing will ever load
                    stable = threshold;
                } else {
                    stable = 0;
                }
            } else {
                stable = 0;
            }

            count = new_count;
            attempts += 1;
            if stable >= threshold {
                info!(items = count, attempts, "gallery stopped growing");
                return Ok(count);
            }
        }

        warn!(items = count, max_attempts, "reached max scroll attempts, continuing with loaded items");
        Ok(count)
    }
}
