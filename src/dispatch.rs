//! Rate-limited, deduplicated download dispatch over one batch of targets.
//!
//! Target `i` fires `i * interval` after the batch starts. Every target ends
//! up in the dispatcher's processed set no matter how its attempt went, and
//! that set outlives the batch: dispatching the same targets again is a no-op.
//! The identity-key set used for duplicate suppression is per batch.

use serde::Serialize;
use std::collections::HashSet;
use std::sync::Arc;
use std::time::Duration;
use tokio::sync::Mutex;
use tokio::task::JoinSet;
use tokio_util::sync::CancellationToken;
use tracing::{debug, error, info, warn};

use crate::naming::FileNamer;
use crate::page::{Page, TargetKey, UiTarget};
use crate::poller::pause;

#[derive(Debug, Default, Clone, Copy, PartialEq, Eq, Serialize)]
pub struct BatchResult {
    pub considered: usize,
    pub dispatched: usize,
    pub already_processed: usize,
    pub missing_payload: usize,
    pub duplicates: usize,
    pub non_link: usize,
    pub failed: usize,
    pub cancelled: bool,
}

impl BatchResult {
    fn record(&mut self, settled: Settled) {
        match settled {
            Settled::Dispatched => self.dispatched += 1,
            Settled::AlreadyProcessed => self.already_processed += 1,
            Settled::MissingPayload => self.missing_payload += 1,
            Settled::Duplicate => self.duplicates += 1,
            Settled::NonLink => self.non_link += 1,
            Settled::Failed => self.failed += 1,
            Settled::Cancelled => self.cancelled = true,
        }
    }
}

/// How a single target's scheduled action ended.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
enum Settled {
    Dispatched,
    AlreadyProcessed,
    MissingPayload,
    Duplicate,
    NonLink,
    Failed,
    Cancelled,
}

pub struct BatchDispatcher {
    interval: Duration,
    cancel: CancellationToken,
    processed: Arc<Mutex<HashSet<TargetKey>>>,
}

/// Everything one scheduled action needs, owned so it can be spawned.
#[derive(Clone)]
struct ItemContext {
    page: Arc<dyn Page>,
    selector: Arc<str>,
    namer: Arc<FileNamer>,
    processed: Arc<Mutex<HashSet<TargetKey>>>,
    seen: Arc<Mutex<HashSet<String>>>,
    cancel: CancellationToken,
}

impl BatchDispatcher {
    pub fn new(interval: Duration, cancel: CancellationToken) -> Self {
        Self {
            interval,
            cancel,
            processed: Arc::new(Mutex::new(HashSet::new())),
        }
    }

    /// Number of targets ever marked processed by this dispatcher.
    pub async fn processed_count(&self) -> usize {
        self.processed.lock().await.len()
    }

    /// Schedule one download per target and wait for all of them to settle.
    pub async fn dispatch_all(
        &self,
        page: Arc<dyn Page>,
        selector: &str,
        targets: Vec<UiTarget>,
        namer: &FileNamer,
    ) -> BatchResult {
        let mut result = BatchResult {
            considered: targets.len(),
            ..BatchResult::default()
        };
        if targets.is_empty() {
            info!("no download targets in this batch");
            return result;
        }
        info!(targets = targets.len(), label = namer.label(), "starting downloads");

        let ctx = ItemContext {
            page,
            selector: Arc::from(selector),
            namer: Arc::new(namer.clone()),
            processed: self.processed.clone(),
            seen: Arc::new(Mutex::new(HashSet::new())),
            cancel: self.cancel.clone(),
        };

        let mut tasks = JoinSet::new();
        for (i, target) in targets.into_iter().enumerate() {
            let delay = self.interval.saturating_mul(i as u32);
            let ctx = ctx.clone();
            tasks.spawn(async move { fire(ctx, target, delay).await });
        }

        while let Some(joined) = tasks.join_next().await {
            match joined {
                Ok(settled) => result.record(settled),
                Err(e) => {
                    error!(error = %e, "download task panicked");
                    result.failed += 1;
                }
            }
        }

        info!(
            label = namer.label(),
            dispatched = result.dispatched,
            considered = result.considered,
            "all download initiations settled"
        );
        result
    }
}

async fn fire(ctx: ItemContext, target: UiTarget, delay: Duration) -> Settled {
    if pause(&ctx.cancel, delay).await.is_err() {
        return Settled::Cancelled;
    }

    if !ctx.processed.lock().await.insert(target.processed_key()) {
        debug!(ordinal = target.ordinal, href = ?target.href, "already processed, skipping");
        return Settled::AlreadyProcessed;
    }

    // Marked processed from here on, whatever happens.
    match attempt(&ctx, &target).await {
        Ok(settled) => settled,
        Err(e) => {
            error!(ordinal = target.ordinal, href = ?target.href, error = %e, "download failed");
            Settled::Failed
        }
    }
}

async fn attempt(ctx: &ItemContext, target: &UiTarget) -> anyhow::Result<Settled> {
    let (Some(href), Some(key)) = (target.href.as_deref(), target.identity_key()) else {
        warn!(ordinal = target.ordinal, "target has no href, skipping");
        return Ok(Settled::MissingPayload);
    };
    let key = key.to_string();

    {
        let mut seen = ctx.seen.lock().await;
        if seen.contains(&key) {
            debug!(url = %key, "duplicate image url, skipping");
            return Ok(Settled::Duplicate);
        }
        if !target.is_link() {
            warn!(ordinal = target.ordinal, tag = %target.tag, url = %href, "target is not a link, skipping");
            return Ok(Settled::NonLink);
        }
        seen.insert(key.clone());
    }

    let filename = ctx.namer.file_name(href, target.ordinal, now_secs());
    if let Err(e) = ctx.page.download(&ctx.selector, href, &filename).await {
        // a later duplicate may still get its chance
        ctx.seen.lock().await.remove(&key);
        return Err(e);
    }
    info!(ordinal = target.ordinal, filename = %filename, "initiated download");
    Ok(Settled::Dispatched)
}

fn now_secs() -> u64 {
    chrono::Utc::now().timestamp().max(0) as u64
}
