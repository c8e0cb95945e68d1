//! Scenario runner
//!
//! Composes the engine steps into the Best Sellers price check: locale
//! session, root visit, popups, menu walk to TV & Video, extraction of the
//! second priced best seller and the threshold assertion. Every scenario is
//! retried as a whole on a fresh page; each failed attempt leaves a
//! screenshot behind and everything ends up in a [`RunReport`].

use crate::config::RunConfig;
use crate::diagnostics::Diagnostics;
use crate::engine::{BestSellerExtractor, BestSellerPrice, DEFAULT_SETTLE_TIMEOUT, LocationResolver, MenuNavigator,
                    NavigationTarget, PopupDismisser, PopupPolicy, SessionBootstrap, SessionStore, ZipSetter};
use crate::error::{Result, WatchError};
use crate::locator::TextPattern;
use crate::page::{Page, PageError};
use crate::profile::{BenignErrors, SiteProfile};
use crate::report::{ReportedError, RunReport, ScenarioReport, ScenarioStatus, ScreenshotArtifact};
use serde::{Deserialize, Serialize};
use std::time::Instant;

/// The scenario catalogue
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "kebab-case")]
pub enum Scenario {
    /// Navigate to TV & Video and check the 2nd best seller's price
    BestSellerPrice,
    /// Navigation only, no extraction or assertion
    NavigateOnly,
}

impl Scenario {
    pub const ALL: [Scenario; 2] = [Scenario::BestSellerPrice, Scenario::NavigateOnly];

    pub fn name(&self) -> &'static str {
        match self {
            Self::BestSellerPrice => "best-seller-price",
            Self::NavigateOnly => "navigate-only",
        }
    }

    pub fn title(&self) -> &'static str {
        match self {
            Self::BestSellerPrice => "2nd Best Seller in TV & Video costs at most the threshold",
            Self::NavigateOnly => "Navigates to TV & Video",
        }
    }

    pub fn enabled_by_default(&self) -> bool {
        matches!(self, Self::BestSellerPrice)
    }

    /// Scenarios that run when nothing is selected explicitly
    pub fn defaults() -> Vec<Scenario> {
        Self::ALL.into_iter().filter(Scenario::enabled_by_default).collect()
    }

    pub fn from_name(name: &str) -> Option<Self> {
        Self::ALL.into_iter().find(|s| s.name() == name)
    }
}

/// Separates known-benign uncaught page errors from real ones
#[derive(Debug, Clone)]
pub struct ErrorFilter {
    messages: Vec<TextPattern>,
    origins: Vec<String>,
}

impl ErrorFilter {
    pub fn new(benign: &BenignErrors) -> Result<Self> {
        Ok(Self {
            messages: benign.messages.iter().map(|m| TextPattern::regex(m)).collect::<Result<_>>()?,
            origins: benign.origins.clone(),
        })
    }

    pub fn is_benign(&self, error: &PageError) -> bool {
        if self.messages.iter().any(|p| p.is_match(&error.message)) {
            return true;
        }
        self.origins.iter().any(|origin| {
            let from = |text: &Option<String>| text.as_deref().is_some_and(|t| t.contains(origin.as_str()));
            from(&error.source_url) || from(&error.stack)
        })
    }

    /// Fail on the first error that is not benign
    pub fn check(&self, errors: Vec<PageError>) -> Result<()> {
        for error in errors {
            if self.is_benign(&error) {
                log::debug!("Ignoring benign page error: {}", error.message);
                continue;
            }
            return Err(WatchError::UncaughtPageError { message: error.message, origin: error.source_url });
        }
        Ok(())
    }
}

/// The engine steps configured for one storefront
#[derive(Debug, Clone)]
pub struct ScenarioSteps {
    pub bootstrap: SessionBootstrap,
    pub popups: PopupDismisser,
    pub navigator: MenuNavigator,
    pub target: NavigationTarget,
    pub extractor: BestSellerExtractor,
}

impl ScenarioSteps {
    pub fn new(profile: &SiteProfile, config: &RunConfig) -> Result<Self> {
        let root = config.root_url();
        let resolver = LocationResolver::new(&profile.location, root.clone())?
            .with_retries(config.location_retries)
            .with_settle_timeout(config.step_timeout.min(DEFAULT_SETTLE_TIMEOUT));
        let zip_setter = ZipSetter::new(&profile.zip)?.with_timeout(config.long_timeout);

        Ok(Self {
            bootstrap: SessionBootstrap::new(profile, root, config.zip.clone())?
                .with_resolver(resolver)
                .with_zip_setter(zip_setter),
            popups: PopupDismisser::new(&profile.popups, PopupPolicy { dismiss_overlays: config.dismiss_overlays })?,
            navigator: MenuNavigator::new(&profile.menu)?
                .with_step_timeout(config.step_timeout)
                .with_signal_timeout(config.long_timeout),
            target: NavigationTarget::from_patterns(profile.menu.path.as_slice())?,
            extractor: BestSellerExtractor::new(&profile.best_sellers)?.with_timeout(config.long_timeout),
        })
    }
}

/// Runs scenarios against pages produced by a factory
pub struct ScenarioRunner {
    config: RunConfig,
    steps: ScenarioSteps,
    error_filter: ErrorFilter,
    sessions: SessionStore,
    diagnostics: Diagnostics,
}

impl ScenarioRunner {
    pub fn new(config: RunConfig, profile: &SiteProfile) -> Result<Self> {
        profile.validate()?;
        Ok(Self {
            steps: ScenarioSteps::new(profile, &config)?,
            error_filter: ErrorFilter::new(&profile.benign_errors)?,
            sessions: SessionStore::new(),
            diagnostics: Diagnostics::console(),
            config,
        })
    }

    /// Builder method: replace the diagnostic sink
    pub fn with_diagnostics(mut self, diagnostics: Diagnostics) -> Self {
        self.diagnostics = diagnostics;
        self
    }

    pub fn config(&self) -> &RunConfig {
        &self.config
    }

    pub fn steps(&self) -> &ScenarioSteps {
        &self.steps
    }

    pub fn sessions(&self) -> &SessionStore {
        &self.sessions
    }

    pub fn sessions_mut(&mut self) -> &mut SessionStore {
        &mut self.sessions
    }

    pub fn diagnostics(&self) -> &Diagnostics {
        &self.diagnostics
    }

    /// Run every catalogued scenario; those not in `enabled` are reported as skipped
    pub fn run_all<P, F>(&mut self, enabled: &[Scenario], mut new_page: F) -> RunReport
    where
        P: Page,
        F: FnMut() -> Result<P>,
    {
        let mut report = RunReport::new(self.config.base_url.clone(), self.config.threshold);
        for scenario in Scenario::ALL {
            if enabled.contains(&scenario) {
                report.push(self.run_scenario(scenario, &mut new_page));
            } else {
                log::info!("Skipping scenario {}", scenario.name());
                report.push(ScenarioReport::skipped(scenario.name(), scenario.title()));
            }
        }
        report.finish();
        report
    }

    /// Run one scenario with whole-scenario retries, each attempt on a fresh page
    pub fn run_scenario<P, F>(&mut self, scenario: Scenario, new_page: &mut F) -> ScenarioReport
    where
        P: Page,
        F: FnMut() -> Result<P>,
    {
        let started = Instant::now();
        let max_attempts = self.config.scenario_retries() + 1;
        let mut report = ScenarioReport {
            status: ScenarioStatus::Failed,
            ..ScenarioReport::skipped(scenario.name(), scenario.title())
        };
        self.diagnostics.drain();

        for attempt in 1..=max_attempts {
            report.attempts = attempt;
            log::info!("Running {} (attempt {}/{})", scenario.name(), attempt, max_attempts);

            let page = match new_page() {
                Ok(page) => page,
                Err(err) => {
                    log::error!("Could not open a page for {}: {}", scenario.name(), err);
                    report.error = Some(ReportedError::from(&err));
                    continue;
                }
            };

            let outcome = self.run_once(scenario, &page);
            let (picked, outcome) = match outcome {
                Ok(picked) => {
                    let verdict = self.assert_within_threshold(picked.as_ref());
                    (picked, verdict)
                }
                Err(err) => (None, Err(err)),
            };
            report.price = picked;

            match outcome {
                Ok(()) => {
                    report.status = ScenarioStatus::Passed;
                    report.error = None;
                    break;
                }
                Err(err) => {
                    self.diagnostics.task(format!(
                        "{} attempt {}/{} failed: {}",
                        scenario.name(),
                        attempt,
                        max_attempts,
                        err
                    ));
                    if let Some(shot) = self.capture_failure(&page, scenario, attempt) {
                        report.screenshots.push(shot);
                    }
                    report.error = Some(ReportedError::from(&err));
                }
            }
        }

        report.duration_ms = started.elapsed().as_millis() as u64;
        report.diagnostics = self.diagnostics.drain();
        report
    }

    /// One attempt without retries. Returns the extracted price, or `None` for navigation-only scenarios.
    pub fn run_once<P: Page + ?Sized>(&mut self, scenario: Scenario, page: &P) -> Result<Option<BestSellerPrice>> {
        let origin = self.sessions.ensure_established(&self.config.session_key, page, &self.steps.bootstrap)?;
        log::debug!("Locale session '{}': {:?}", self.config.session_key, origin);
        self.checkpoint(page)?;

        let root = self.config.root_url();
        self.diagnostics.task(format!("Visiting {}", root));
        page.visit(&root)?;
        // A fresh document drops the stabilizing style.
        self.steps.bootstrap.stabilize(page)?;

        self.steps.popups.dismiss(page)?;
        self.steps.navigator.open_menu(page)?;
        self.steps.navigator.expand_all(page)?;
        self.checkpoint(page)?;

        self.steps.navigator.navigate(page, &self.steps.target)?;
        self.checkpoint(page)?;

        if scenario == Scenario::NavigateOnly {
            return Ok(None);
        }

        let picked = self.steps.extractor.extract(page)?;
        self.checkpoint(page)?;
        self.diagnostics.task(format!("2nd Best Seller price: ${:.2}", picked.price));
        Ok(Some(picked))
    }

    /// The scenario assertion: the picked price must not exceed the threshold
    pub fn assert_within_threshold(&self, picked: Option<&BestSellerPrice>) -> Result<()> {
        match picked {
            Some(p) if p.price > self.config.threshold => {
                Err(WatchError::ThresholdExceeded { price: p.price, threshold: self.config.threshold })
            }
            _ => Ok(()),
        }
    }

    fn checkpoint<P: Page + ?Sized>(&self, page: &P) -> Result<()> {
        self.error_filter.check(page.drain_page_errors()?)
    }

    fn capture_failure<P: Page + ?Sized>(
        &self,
        page: &P,
        scenario: Scenario,
        attempt: u32,
    ) -> Option<ScreenshotArtifact> {
        let png = match page.screenshot() {
            Ok(png) => png,
            Err(e) => {
                log::warn!("Failed to capture screenshot for {}: {}", scenario.name(), e);
                return None;
            }
        };

        let path = self.config.artifacts_dir.join(format!("{}-attempt-{}.png", scenario.name(), attempt));
        if let Err(e) = std::fs::create_dir_all(&self.config.artifacts_dir).and_then(|_| std::fs::write(&path, &png)) {
            log::warn!("Failed to write screenshot {}: {}", path.display(), e);
            return None;
        }

        Some(ScreenshotArtifact::new(attempt, path, &png, self.config.embed_screenshots))
    }
}
