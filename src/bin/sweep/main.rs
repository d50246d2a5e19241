mod dom;
mod face;
mod hands;

use anyhow::{Context, Result};
use clap::Parser;
use dotenvy::dotenv;
use gallery_sweep::input::{InputDefaults, PresetInput, StdinPrompt, collect_request};
use gallery_sweep::report::{ConsoleNotifier, Fanout, Notifier};
use gallery_sweep::{AutomationConfig, Runner, YearMonth};
use std::path::PathBuf;
use std::sync::Arc;
use std::time::Duration;
use tokio_util::sync::CancellationToken;
use tracing::{info, warn};
use tracing_subscriber::{layer::SubscriberExt, util::SubscriberInitExt};

/// Download every photo of a month-picker gallery across a range of months.
#[derive(Parser, Debug)]
#[command(name = "sweep", version)]
struct Cli {
    /// Base album name; Year_Month is appended per month
    #[arg(long)]
    label: Option<String>,

    /// First month, YYYY-MM
    #[arg(long)]
    from: Option<YearMonth>,

    /// Last month, YYYY-MM
    #[arg(long)]
    to: Option<YearMonth>,

    /// JSON file overriding selectors and timings
    #[arg(long, env = "SWEEP_CONFIG")]
    config: Option<PathBuf>,

    /// DevTools endpoint of a running Chrome to attach to
    #[arg(long, env = "SWEEP_DEBUG_URL", default_value = "http://127.0.0.1:9222")]
    debug_url: String,

    #[arg(long, env = "SWEEP_CHROME_PATH")]
    chrome_path: Option<PathBuf>,

    /// Profile directory for a launched Chrome
    #[arg(long, env = "SWEEP_PROFILE_DIR")]
    profile_dir: Option<PathBuf>,

    /// Gallery page to open before starting
    #[arg(long, env = "SWEEP_GALLERY_URL")]
    url: Option<String>,

    /// Serve a live progress dashboard on localhost
    #[arg(long)]
    web: bool,

    #[arg(long, env = "SWEEP_LOG", default_value = "info")]
    log_level: String,
}

#[tokio::main]
async fn main() -> Result<()> {
    dotenv().ok();
    let cli = Cli::parse();
    init_logging(&cli.log_level)?;

    let config = match &cli.config {
        Some(path) => AutomationConfig::load(path)?,
        None => AutomationConfig::default(),
    };

    // 1. Ask for the range first; bad input never touches the browser
    let defaults = InputDefaults::current(&config.default_label);
    let (label, from, to) = (cli.label.clone(), cli.from, cli.to);
    let request = tokio::task::spawn_blocking(move || {
        let prompt = StdinPrompt::new(std::io::stdin().lock(), std::io::stdout());
        let mut input = PresetInput::new(prompt)
            .with_label(label)
            .with_start(from)
            .with_end(to);
        collect_request(&mut input, &defaults)
    })
    .await
    .context("input prompt panicked")?
    .context("no run started")?;

    // 2. Ctrl-C stops the run at the next wait
    let cancel = CancellationToken::new();
    let on_signal = cancel.clone();
    tokio::spawn(async move {
        if tokio::signal::ctrl_c().await.is_ok() {
            warn!("interrupt received, stopping after the current step");
            on_signal.cancel();
        }
    });

    // 3. Launch browser in a blocking task (it can take a while)
    let options = hands::SessionOptions {
        debug_url: cli.debug_url.clone(),
        chrome_path: cli.chrome_path.clone(),
        profile_dir: cli.profile_dir.clone(),
        start_url: cli.url.clone(),
    };
    let session = tokio::task::spawn_blocking(move || hands::BrowserSession::launch(&options))
        .await
        .map_err(|e| anyhow::anyhow!("Browser launch panicked: {}", e))??;
    let page = Arc::new(dom::DomPage::new(session.tab.clone()));

    let mut sinks: Vec<Arc<dyn Notifier>> = vec![Arc::new(ConsoleNotifier)];
    if cli.web {
        sinks.push(Arc::new(face::start_server().await?));
    }

    let runner = Runner::new(page, config, Arc::new(Fanout(sinks)), cancel.clone());
    let summary = runner.run(&request).await;
    info!(
        total = summary.total_dispatched,
        months = summary.months.len(),
        "sweep finished"
    );

    if cli.web {
        face::hold_open(&cancel, Duration::from_secs(1)).await;
    }

    Ok(())
}

fn init_logging(level: &str) -> Result<()> {
    let level: tracing::Level = level.parse().context("Invalid log level")?;

    tracing_subscriber::registry()
        .with(
            tracing_subscriber::EnvFilter::try_from_default_env()
                .unwrap_or_else(|_| tracing_subscriber::EnvFilter::new(level.to_string())),
        )
        .with(tracing_subscriber::fmt::layer().with_writer(std::io::stderr))
        .init();

    Ok(())
}
