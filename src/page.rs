//! The page boundary: everything the driver reads from or does to the gallery.
//!
//! Implementations decide how a selector is resolved and what "visible" means
//! for their host. The driver never holds element references across calls; it
//! re-queries by selector every time.

use anyhow::Result;
use async_trait::async_trait;
use serde::{Deserialize, Serialize};
use std::sync::Arc;
use tokio::sync::Notify;

/// One actionable gallery item found by a scan.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct UiTarget {
    /// Position in scan order.
    pub ordinal: usize,
    /// Lower-case tag name of the element.
    pub tag: String,
    pub href: Option<String>,
}

impl UiTarget {
    pub fn link(ordinal: usize, href: impl Into<String>) -> Self {
        Self {
            ordinal,
            tag: "a".to_string(),
            href: Some(href.into()),
        }
    }

    pub fn is_link(&self) -> bool {
        self.tag.eq_ignore_ascii_case("a")
    }

    /// The href with any query string removed. Used to deduplicate within a
    /// batch. `None` when there is no usable href.
    pub fn identity_key(&self) -> Option<&str> {
        self.href
            .as_deref()
            .filter(|href| !href.is_empty())
            .map(strip_query)
    }

    /// Key under which the dispatcher remembers this target as processed.
    pub fn processed_key(&self) -> TargetKey {
        match &self.href {
            Some(href) if !href.is_empty() => TargetKey::Href(href.clone()),
            _ => TargetKey::Ordinal(self.ordinal),
        }
    }
}

#[derive(Debug, Clone, PartialEq, Eq, Hash)]
pub enum TargetKey {
    Href(String),
    Ordinal(usize),
}

pub fn strip_query(url: &str) -> &str {
    url.split('?').next().unwrap_or(url)
}

/// Scroll state of the gallery's scroller (container or whole document).
#[derive(Debug, Clone, Copy, PartialEq, Default, Serialize, Deserialize)]
pub struct ScrollMetrics {
    pub scroll_height: f64,
    /// Within a few pixels of the bottom.
    pub at_bottom: bool,
}

#[async_trait]
pub trait Page: Send + Sync {
    /// Trimmed text of the first element matching `selector`, if it is present
    /// and visible.
    async fn visible_text(&self, selector: &str) -> Result<Option<String>>;

    /// Trimmed text of every element matching `selector`, in document order.
    async fn texts(&self, selector: &str) -> Result<Vec<String>>;

    /// Click the `index`-th element matching `selector`.
    async fn click(&self, selector: &str, index: usize) -> Result<()>;

    async fn count(&self, selector: &str) -> Result<usize>;

    /// Scroll `container` to its end, or the whole document when `container`
    /// matches nothing.
    async fn scroll_to_end(&self, container: &str) -> Result<()>;

    async fn scroll_metrics(&self, container: &str) -> Result<ScrollMetrics>;

    /// Scan every element matching `selector`.
    async fn targets(&self, selector: &str) -> Result<Vec<UiTarget>>;

    /// Set `filename` as the download name of the link under `selector` whose
    /// href is `href`, then click it.
    async fn download(&self, selector: &str, href: &str, filename: &str) -> Result<()>;

    /// Fired whenever the page changes, for hosts that can observe mutations.
    fn change_feed(&self) -> Option<Arc<Notify>> {
        None
    }
}
