use crate::engine::{DEFAULT_LOCATION_RETRIES, DEFAULT_ZIP};
use crate::error::{Result, WatchError};
use crate::wait::{DEFAULT_STEP_TIMEOUT, LONG_STEP_TIMEOUT};
use serde::{Deserialize, Serialize};
use std::path::PathBuf;
use std::time::Duration;

/// Environment variable holding the price threshold
pub const THRESHOLD_ENV: &str = "PRICE_THRESHOLD";

/// Headless batch run or interactive (headed) session
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum ExecutionMode {
    #[default]
    Run,
    Open,
}

/// Whole-scenario retries per execution mode
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub struct RetryPolicy {
    pub run: u32,
    pub open: u32,
}

impl Default for RetryPolicy {
    fn default() -> Self {
        Self { run: 2, open: 0 }
    }
}

impl RetryPolicy {
    pub fn for_mode(&self, mode: ExecutionMode) -> u32 {
        match mode {
            ExecutionMode::Run => self.run,
            ExecutionMode::Open => self.open,
        }
    }
}

/// Settings for one run of the scenarios
#[derive(Debug, Clone)]
pub struct RunConfig {
    /// Highest acceptable price
    pub threshold: f64,
    pub base_url: String,
    pub viewport: (u32, u32),
    pub step_timeout: Duration,
    /// Menu signal, Best Sellers heading and zip modal
    pub long_timeout: Duration,
    pub retries: RetryPolicy,
    pub mode: ExecutionMode,
    /// Reload retries of the location resolver
    pub location_retries: u32,
    pub zip: String,
    pub session_key: String,
    pub artifacts_dir: PathBuf,
    pub downloads_dir: PathBuf,
    pub report_path: PathBuf,
    pub embed_screenshots: bool,
    pub dismiss_overlays: bool,
}

impl Default for RunConfig {
    fn default() -> Self {
        Self {
            threshold: 100.0,
            base_url: "https://www.amazon.com".to_string(),
            viewport: (1366, 800),
            step_timeout: DEFAULT_STEP_TIMEOUT,
            long_timeout: LONG_STEP_TIMEOUT,
            retries: RetryPolicy::default(),
            mode: ExecutionMode::Run,
            location_retries: DEFAULT_LOCATION_RETRIES,
            zip: DEFAULT_ZIP.to_string(),
            session_key: format!("us-zip-{}", DEFAULT_ZIP),
            artifacts_dir: PathBuf::from("artifacts"),
            downloads_dir: PathBuf::from("downloads"),
            report_path: PathBuf::from("artifacts/report.json"),
            embed_screenshots: false,
            dismiss_overlays: false,
        }
    }
}

impl RunConfig {
    /// Defaults with the threshold taken from `PRICE_THRESHOLD` when set
    pub fn from_env() -> Result<Self> {
        let mut config = Self::default();
        config.apply_threshold(std::env::var(THRESHOLD_ENV).ok().as_deref())?;
        Ok(config)
    }

    /// Override the threshold from its textual form; `None` or blank keeps the current value
    pub fn apply_threshold(&mut self, raw: Option<&str>) -> Result<()> {
        let Some(raw) = raw.map(str::trim).filter(|r| !r.is_empty()) else {
            return Ok(());
        };
        self.threshold = parse_threshold(raw)?;
        Ok(())
    }

    /// Whole-scenario retries for the current mode
    pub fn scenario_retries(&self) -> u32 {
        self.retries.for_mode(self.mode)
    }

    /// Root URL of the site
    pub fn root_url(&self) -> String {
        format!("{}/", self.base_url.trim_end_matches('/'))
    }
}

pub fn parse_threshold(raw: &str) -> Result<f64> {
    match raw.trim().parse::<f64>() {
        Ok(value) if value.is_finite() => Ok(value),
        _ => Err(WatchError::Config(format!("{} must be a number, got '{}'", THRESHOLD_ENV, raw))),
    }
}
