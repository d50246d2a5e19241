use anyhow::{Context, Result};
use serde::{Deserialize, Serialize};
use std::path::Path;
use std::time::Duration;

/// Structural selectors for the gallery page.
#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(default)]
pub struct Selectors {
    pub calendar_opener: String,
    pub year_display: String,
    pub prev_year_button: String,
    pub next_year_button: String,
    pub month_cell: String,
    pub gallery_item: String,
    pub scroll_container: String,
}

impl Default for Selectors {
    fn default() -> Self {
        Self {
            calendar_opener: "div.month-picker__trigger".to_string(),
            year_display: "div.month-picker__year-value".to_string(),
            prev_year_button: "div.month-picker__year-arrow-left".to_string(),
            next_year_button: "div.month-picker__year-arrow-right".to_string(),
            month_cell: "div.month-picker__cell".to_string(),
            gallery_item: ".gallery__item-download".to_string(),
            scroll_container: "section.section".to_string(),
        }
    }
}

/// Delays and bounds, all in milliseconds unless stated otherwise.
#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(default)]
pub struct Timings {
    pub wait_timeout_ms: u64,
    pub poll_interval_ms: u64,
    pub short_delay_ms: u64,
    pub scroll_settle_ms: u64,
    pub max_scroll_attempts: u32,
    pub stable_threshold: u32,
    pub max_year_nav_attempts: u32,
    pub post_select_delay_ms: u64,
    pub between_months_ms: u64,
    pub download_interval_ms: u64,
}

impl Default for Timings {
    fn default() -> Self {
        Self {
            wait_timeout_ms: 7000,
            poll_interval_ms: 100,
            short_delay_ms: 1500,
            scroll_settle_ms: 3500,
            max_scroll_attempts: 40,
            stable_threshold: 2,
            max_year_nav_attempts: 24, // two full decade sweeps
            post_select_delay_ms: 15000,
            between_months_ms: 5000,
            download_interval_ms: 1700,
        }
    }
}

impl Timings {
    pub fn wait_timeout(&self) -> Duration {
        Duration::from_millis(self.wait_timeout_ms)
    }

    pub fn poll_interval(&self) -> Duration {
        Duration::from_millis(self.poll_interval_ms.max(1))
    }

    pub fn short_delay(&self) -> Duration {
        Duration::from_millis(self.short_delay_ms)
    }

    pub fn scroll_settle(&self) -> Duration {
        Duration::from_millis(self.scroll_settle_ms)
    }

    pub fn post_select_delay(&self) -> Duration {
        Duration::from_millis(self.post_select_delay_ms)
    }

    pub fn between_months(&self) -> Duration {
        Duration::from_millis(self.between_months_ms)
    }

    pub fn download_interval(&self) -> Duration {
        Duration::from_millis(self.download_interval_ms)
    }
}

#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(default)]
pub struct AutomationConfig {
    pub selectors: Selectors,
    pub timings: Timings,
    /// Used when a batch label sanitizes down to nothing.
    pub default_label: String,
}

impl Default for AutomationConfig {
    fn default() -> Self {
        Self {
            selectors: Selectors::default(),
            timings: Timings::default(),
            default_label: "GalleryPhotos".to_string(),
        }
    }
}

impl AutomationConfig {
    /// Load a JSON config file. Missing keys keep their defaults.
    pub fn load(path: &Path) -> Result<Self> {
        let raw = std::fs::read_to_string(path)
            .with_context(|| format!("failed to read config file {}", path.display()))?;
        serde_json::from_str(&raw)
            .with_context(|| format!("failed to parse config file {}", path.display()))
    }
}
