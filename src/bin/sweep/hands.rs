use anyhow::{Context, Result};
use headless_chrome::{Browser, LaunchOptions, Tab};
use std::path::PathBuf;
use std::sync::Arc;
use tracing::{info, warn};

pub struct SessionOptions {
    /// DevTools endpoint of an already running Chrome.
    pub debug_url: String,
    pub chrome_path: Option<PathBuf>,
    pub profile_dir: Option<PathBuf>,
    pub start_url: Option<String>,
}

/// Browser session the gallery is driven through. The operator must already
/// be logged in, which is why attaching to their Chrome is tried first.
pub struct BrowserSession {
    _browser: Browser,
    pub tab: Arc<Tab>,
}

impl BrowserSession {
    pub fn launch(options: &SessionOptions) -> Result<Self> {
        // 1. Try to attach to an existing Chrome
        info!(url = %options.debug_url, "attempting to attach to existing Chrome");
        if let Ok(browser) = Browser::connect(options.debug_url.clone()) {
            info!("attached to existing Chrome");

            let existing = browser
                .get_tabs()
                .lock()
                .ok()
                .and_then(|tabs| tabs.first().cloned());
            let tab = match existing {
                Some(tab) => {
                    info!(url = %tab.get_url(), "using existing tab");
                    tab
                }
                None => {
                    info!("no tabs found, creating new one");
                    browser.new_tab()?
                }
            };

            let session = Self {
                _browser: browser,
                tab,
            };
            session.open_start_url(options)?;
            return Ok(session);
        }

        warn!("could not attach, launching Chrome with the sweep profile");

        let profile = match &options.profile_dir {
            Some(dir) => dir.clone(),
            None => default_profile_dir()?,
        };
        if !profile.exists() {
            info!(path = %profile.display(), "creating browser profile");
            std::fs::create_dir_all(&profile)
                .with_context(|| format!("failed to create profile dir {}", profile.display()))?;
        }

        let launch = LaunchOptions {
            headless: false,
            path: options.chrome_path.clone(),
            user_data_dir: Some(profile),
            args: vec![
                std::ffi::OsStr::new("--no-first-run"),
                std::ffi::OsStr::new("--no-default-browser-check"),
                std::ffi::OsStr::new("--disable-infobars"),
                std::ffi::OsStr::new("--password-store=basic"),
            ],
            // months wait up to ~20s between DOM calls; keep the session alive
            idle_browser_timeout: std::time::Duration::from_secs(600),
            ..Default::default()
        };

        info!("starting Chrome");
        let browser = Browser::new(launch).context("browser launch failed")?;
        let tab = browser.new_tab()?;

        let session = Self {
            _browser: browser,
            tab,
        };
        session.open_start_url(options)?;
        info!("Chrome ready");
        Ok(session)
    }

    fn open_start_url(&self, options: &SessionOptions) -> Result<()> {
        if let Some(url) = &options.start_url {
            info!(%url, "navigating to gallery");
            self.tab.navigate_to(url)?;
            self.tab.wait_until_navigated()?;
        }
        Ok(())
    }
}

/// Persistent profile so a login done once in the launched window survives runs.
fn default_profile_dir() -> Result<PathBuf> {
    let base = dirs::data_local_dir().context("no local data directory")?;
    Ok(base.join("gallery-sweep").join("chrome-profile"))
}
