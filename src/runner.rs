//! Month-by-month orchestration across the requested range.

use std::sync::Arc;
use tokio_util::sync::CancellationToken;
use tracing::{error, info};

use crate::config::AutomationConfig;
use crate::dispatch::BatchDispatcher;
use crate::error::AutomationError;
use crate::input::RunRequest;
use crate::naming::FileNamer;
use crate::page::Page;
use crate::picker::MonthPicker;
use crate::poller::{Poller, pause};
use crate::range::YearMonth;
use crate::report::{MonthOutcome, MonthReport, Notifier, RunEvent, RunSummary};
use crate::scroll::ScrollExhauster;

pub struct Runner {
    page: Arc<dyn Page>,
    config: AutomationConfig,
    notifier: Arc<dyn Notifier>,
    cancel: CancellationToken,
    poller: Poller,
    dispatcher: BatchDispatcher,
}

impl Runner {
    pub fn new(
        page: Arc<dyn Page>,
        config: AutomationConfig,
        notifier: Arc<dyn Notifier>,
        cancel: CancellationToken,
    ) -> Self {
        let poller = Poller::new(
            config.timings.wait_timeout(),
            config.timings.poll_interval(),
            cancel.clone(),
        )
        .with_change_feed(page.change_feed());
        let dispatcher = BatchDispatcher::new(config.timings.download_interval(), cancel.clone());
        Self {
            page,
            config,
            notifier,
            cancel,
            poller,
            dispatcher,
        }
    }

    pub fn dispatcher(&self) -> &BatchDispatcher {
        &self.dispatcher
    }

    /// Process every month of the request in order. Month failures are
    /// recorded and skipped; only cancellation stops the loop early.
    pub async fn run(&self, request: &RunRequest) -> RunSummary {
        self.notifier.notify(&RunEvent::Started {
            range: request.range,
            base_label: request.base_label.clone(),
        });

        let mut summary = RunSummary::default();
        let mut months = request.range.iter().peekable();
        while let Some(month) = months.next() {
            let label = month.album_label(&request.base_label);
            info!(%month, %label, "processing month");
            self.notifier.notify(&RunEvent::MonthStarted {
                month,
                label: label.clone(),
            });

            let outcome = match self.process_month(month, &label).await {
                Ok(outcome) => outcome,
                Err(AutomationError::Cancelled) => MonthOutcome::Interrupted { dispatched: 0 },
                Err(e) => {
                    error!(%month, error = %e, "skipping month");
                    MonthOutcome::Skipped {
                        reason: e.to_string(),
                    }
                }
            };
            let report = MonthReport {
                month,
                label,
                outcome,
            };
            self.notifier.notify(&RunEvent::MonthFinished {
                report: report.clone(),
            });
            summary.push(report);

            if self.cancel.is_cancelled() {
                break;
            }
            if months.peek().is_some() {
                info!(
                    seconds = self.config.timings.between_months().as_secs_f64(),
                    "waiting before next month"
                );
                if pause(&self.cancel, self.config.timings.between_months())
                    .await
                    .is_err()
                {
                    break;
                }
            }
        }

        summary.cancelled = self.cancel.is_cancelled();
        info!(
            total = summary.total_dispatched,
            cancelled = summary.cancelled,
            "all month processing complete"
        );
        self.notifier.notify(&RunEvent::Finished {
            summary: summary.clone(),
        });
        summary
    }

    async fn process_month(
        &self,
        month: YearMonth,
        label: &str,
    ) -> Result<MonthOutcome, AutomationError> {
        let selectors = &self.config.selectors;
        let timings = &self.config.timings;

        let mut picker = MonthPicker::new(
            self.page.as_ref(),
            &self.poller,
            selectors,
            timings,
            self.cancel.clone(),
        );
        picker.select(month).await?;

        info!(
            seconds = timings.post_select_delay().as_secs_f64(),
            "waiting for month to load"
        );
        pause(&self.cancel, timings.post_select_delay()).await?;

        let found = ScrollExhauster::new(
            self.page.as_ref(),
            &selectors.scroll_container,
            timings,
            self.cancel.clone(),
        )
        .exhaust(&selectors.gallery_item)
        .await?;
        if found == 0 {
            info!(%month, "no photos found after scrolling");
            return Ok(MonthOutcome::Empty);
        }

        let targets = self.page.targets(&selectors.gallery_item).await?;
        let namer = FileNamer::new(label, &self.config.default_label);
        let batch = self
            .dispatcher
            .dispatch_all(self.page.clone(), &selectors.gallery_item, targets, &namer)
            .await;

        if batch.cancelled {
            return Ok(MonthOutcome::Interrupted {
                dispatched: batch.dispatched,
            });
        }
        Ok(MonthOutcome::Downloaded {
            found,
            dispatched: batch.dispatched,
        })
    }
}
