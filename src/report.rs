use crate::engine::BestSellerPrice;
use crate::error::{ErrorKind, Result, WatchError};
use base64::{Engine as _, engine::general_purpose::STANDARD};
use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};
use std::path::{Path, PathBuf};

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum ScenarioStatus {
    Passed,
    Failed,
    Skipped,
}

/// Screenshot taken when an attempt failed
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct ScreenshotArtifact {
    pub attempt: u32,
    pub path: PathBuf,
    /// PNG bytes, base64 encoded, when embedding is enabled
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub base64_png: Option<String>,
}

impl ScreenshotArtifact {
    pub fn new(attempt: u32, path: impl Into<PathBuf>, png: &[u8], embed: bool) -> Self {
        Self { attempt, path: path.into(), base64_png: embed.then(|| STANDARD.encode(png)) }
    }
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct ReportedError {
    pub kind: ErrorKind,
    pub message: String,
}

impl From<&WatchError> for ReportedError {
    fn from(err: &WatchError) -> Self {
        Self { kind: err.kind(), message: err.to_string() }
    }
}

/// Outcome of a single scenario across all its attempts
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct ScenarioReport {
    pub name: String,
    pub title: String,
    pub status: ScenarioStatus,
    pub attempts: u32,
    pub duration_ms: u64,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub price: Option<BestSellerPrice>,
    /// Error of the last failed attempt
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub error: Option<ReportedError>,
    #[serde(default)]
    pub screenshots: Vec<ScreenshotArtifact>,
    #[serde(default)]
    pub diagnostics: Vec<String>,
}

impl ScenarioReport {
    pub fn skipped(name: impl Into<String>, title: impl Into<String>) -> Self {
        Self {
            name: name.into(),
            title: title.into(),
            status: ScenarioStatus::Skipped,
            attempts: 0,
            duration_ms: 0,
            price: None,
            error: None,
            screenshots: Vec::new(),
            diagnostics: Vec::new(),
        }
    }
}

/// Result of running all scenarios
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct RunReport {
    pub started_at: DateTime<Utc>,
    pub finished_at: Option<DateTime<Utc>>,
    pub base_url: String,
    pub threshold: f64,
    pub total: usize,
    pub passed: usize,
    pub failed: usize,
    pub skipped: usize,
    pub scenarios: Vec<ScenarioReport>,
}

impl RunReport {
    pub fn new(base_url: impl Into<String>, threshold: f64) -> Self {
        Self {
            started_at: Utc::now(),
            finished_at: None,
            base_url: base_url.into(),
            threshold,
            total: 0,
            passed: 0,
            failed: 0,
            skipped: 0,
            scenarios: Vec::new(),
        }
    }

    pub fn push(&mut self, scenario: ScenarioReport) {
        self.total += 1;
        match scenario.status {
            ScenarioStatus::Passed => self.passed += 1,
            ScenarioStatus::Failed => self.failed += 1,
            ScenarioStatus::Skipped => self.skipped += 1,
        }
        self.scenarios.push(scenario);
    }

    pub fn finish(&mut self) {
        self.finished_at = Some(Utc::now());
    }

    /// No scenario failed
    pub fn success(&self) -> bool {
        self.failed == 0
    }

    pub fn scenario(&self, name: &str) -> Option<&ScenarioReport> {
        self.scenarios.iter().find(|s| s.name == name)
    }

    /// Write the report as pretty JSON, creating parent directories
    pub fn write_json(&self, path: impl AsRef<Path>) -> Result<PathBuf> {
        let path = path.as_ref();
        if let Some(parent) = path.parent().filter(|p| !p.as_os_str().is_empty()) {
            std::fs::create_dir_all(parent)?;
        }

        let json = serde_json::to_string_pretty(self)?;
        std::fs::write(path, json)?;

        log::info!("Report written to: {}", path.display());
        Ok(path.to_path_buf())
    }

    pub fn from_json_file(path: impl AsRef<Path>) -> Result<Self> {
        let content = std::fs::read_to_string(path)?;
        Ok(serde_json::from_str(&content)?)
    }
}
