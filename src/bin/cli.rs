//! bestseller-watch
//!
//! Runs the Best Sellers price check against a real browser and writes a JSON run report.

use anyhow::Context;
use bestseller_watch::browser::{ConnectionOptions, LaunchOptions};
use bestseller_watch::{BrowserSession, Diagnostics, ExecutionMode, RunConfig, Scenario, ScenarioRunner, SiteProfile};
use clap::{Parser, Subcommand, ValueEnum};
use std::path::PathBuf;

#[derive(Debug, Clone, Copy, ValueEnum)]
enum Mode {
    /// Unattended headless run with scenario retries
    Run,
    /// Interactive headed session without retries
    Open,
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, ValueEnum)]
enum ScenarioArg {
    BestSellerPrice,
    NavigateOnly,
}

impl From<ScenarioArg> for Scenario {
    fn from(arg: ScenarioArg) -> Self {
        match arg {
            ScenarioArg::BestSellerPrice => Scenario::BestSellerPrice,
            ScenarioArg::NavigateOnly => Scenario::NavigateOnly,
        }
    }
}

#[derive(Parser)]
#[command(name = "bestseller-watch")]
#[command(version)]
#[command(about = "Checks the 2nd Best Seller price in TV & Video against a threshold", long_about = None)]
struct Cli {
    #[command(subcommand)]
    command: Command,
}

#[derive(Subcommand)]
enum Command {
    /// Run the scenarios
    Run(RunArgs),
    /// Emit a diagnostic line through the same sink the runner uses
    Log {
        message: String,
    },
}

#[derive(clap::Args)]
struct RunArgs {
    /// Highest acceptable price
    #[arg(long, env = "PRICE_THRESHOLD", default_value_t = 100.0)]
    threshold: f64,

    #[arg(long, value_name = "URL", default_value = "https://www.amazon.com")]
    base_url: String,

    #[arg(long, value_enum, default_value = "run")]
    mode: Mode,

    /// Launch browser in headed mode (implied by --mode open)
    #[arg(long, short = 'H')]
    headed: bool,

    /// Delivery zip code
    #[arg(long, default_value = "72716")]
    zip: String,

    /// Scenarios to run; defaults to the enabled ones
    #[arg(long = "scenario", value_enum)]
    scenarios: Vec<ScenarioArg>,

    /// JSON file overriding selectors and patterns
    #[arg(long, value_name = "FILE")]
    profile: Option<PathBuf>,

    #[arg(long, value_name = "FILE", default_value = "artifacts/report.json")]
    report: PathBuf,

    #[arg(long, value_name = "DIR", default_value = "artifacts")]
    artifacts: PathBuf,

    #[arg(long, value_name = "DIR", default_value = "downloads")]
    downloads: PathBuf,

    /// Embed failure screenshots in the report as base64
    #[arg(long)]
    embed_screenshots: bool,

    /// Also click generic overlay close buttons
    #[arg(long)]
    dismiss_overlays: bool,

    /// Path to a custom Chromium-family executable
    #[arg(long, value_name = "PATH")]
    executable_path: Option<PathBuf>,

    /// WebSocket endpoint of an already running browser
    #[arg(long, value_name = "URL")]
    ws_endpoint: Option<String>,
}

fn main() -> anyhow::Result<()> {
    env_logger::Builder::from_env(env_logger::Env::default().default_filter_or("info")).init();

    match Cli::parse().command {
        Command::Log { message } => {
            Diagnostics::console().task(message);
            Ok(())
        }
        Command::Run(args) => run(args),
    }
}

fn run(args: RunArgs) -> anyhow::Result<()> {
    let mode = match args.mode {
        Mode::Run => ExecutionMode::Run,
        Mode::Open => ExecutionMode::Open,
    };

    let config = RunConfig {
        threshold: args.threshold,
        base_url: args.base_url,
        mode,
        session_key: format!("us-zip-{}", args.zip),
        zip: args.zip,
        artifacts_dir: args.artifacts,
        downloads_dir: args.downloads,
        report_path: args.report,
        embed_screenshots: args.embed_screenshots,
        dismiss_overlays: args.dismiss_overlays,
        ..RunConfig::default()
    };

    let profile = match &args.profile {
        Some(path) => {
            SiteProfile::from_json_file(path).with_context(|| format!("Failed to load profile {}", path.display()))?
        }
        None => SiteProfile::default(),
    };

    let mut launch = LaunchOptions::new()
        .headless(!args.headed && mode == ExecutionMode::Run)
        .window_size(config.viewport.0, config.viewport.1)
        .download_dir(&config.downloads_dir)
        .default_timeout(config.step_timeout);
    if let Some(path) = args.executable_path {
        launch = launch.chrome_path(path);
    }

    let enabled: Vec<Scenario> = if args.scenarios.is_empty() {
        Scenario::defaults()
    } else {
        args.scenarios.iter().copied().map(Scenario::from).collect()
    };

    eprintln!("bestseller-watch v{}", env!("CARGO_PKG_VERSION"));
    eprintln!("Browser mode: {}", if launch.headless { "headless" } else { "headed" });
    eprintln!("Threshold: {}", config.threshold);

    let report_path = config.report_path.clone();
    let mut runner = ScenarioRunner::new(config, &profile).context("Invalid site profile")?;

    let ws_endpoint = args.ws_endpoint;
    let report = runner.run_all(&enabled, || match &ws_endpoint {
        Some(ws) => BrowserSession::connect(ConnectionOptions::new(ws.clone())),
        None => BrowserSession::launch(launch.clone()),
    });

    report.write_json(&report_path).context("Failed to write run report")?;
    eprintln!("{} passed, {} failed, {} skipped", report.passed, report.failed, report.skipped);

    if !report.success() {
        anyhow::bail!("{} scenario(s) failed, see {}", report.failed, report_path.display());
    }
    Ok(())
}
