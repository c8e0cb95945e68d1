mod common;

use bestseller_watch::engine::{BestSellerExtractor, LocationResolver, SessionBootstrap, SessionOrigin, SessionStore,
                               ZipSetter};
use bestseller_watch::page::{ClickMode, CookieRecord, Page, PageError};
use bestseller_watch::profile::SiteProfile;
use bestseller_watch::{Diagnostics, ErrorKind, Result, RunConfig, Scenario, ScenarioRunner, ScenarioStatus,
                       WatchError};
use common::*;
use std::time::Duration;

fn config(artifacts: &std::path::Path) -> RunConfig {
    RunConfig {
        step_timeout: Duration::from_millis(300),
        long_timeout: Duration::from_millis(300),
        artifacts_dir: artifacts.to_path_buf(),
        report_path: artifacts.join("report.json"),
        ..RunConfig::default()
    }
}

fn runner(config: RunConfig) -> ScenarioRunner {
    ScenarioRunner::new(config, &SiteProfile::default()).unwrap().with_diagnostics(Diagnostics::silent())
}

fn extractor() -> BestSellerExtractor {
    BestSellerExtractor::new(&SiteProfile::default().best_sellers).unwrap().with_timeout(Duration::from_millis(300))
}

fn bootstrap() -> SessionBootstrap {
    SessionBootstrap::new(&SiteProfile::default(), "https://www.amazon.com/", "72716").unwrap()
}

#[test]
fn test_extractor_reads_second_priced_item_from_live_page() {
    let page = FakePage::new(document(vec![best_sellers_card(&[
        Some(("$24.", "99")),
        None,
        Some(("$1,234.", "56")),
    ])]));

    let picked = extractor().extract(&page).unwrap();

    assert_eq!(picked.price, 1234.56);
    assert_eq!(picked.asin.as_deref(), Some("B0TV0003"));
    assert!(page.actions().contains(&Action::Scroll("Best Sellers in TV & Video".to_string())));
}

#[test]
fn test_extractor_fails_loudly_on_single_priced_item() {
    let page = FakePage::new(document(vec![best_sellers_card(&[Some(("$24.", "99")), None])]));

    let err = extractor().extract(&page).unwrap_err();

    assert!(matches!(err, WatchError::TooFewPricedItems { found: 1, .. }));
    assert!(err.to_string().contains("items with a price"));
}

#[test]
fn test_extractor_times_out_without_heading() {
    let page = FakePage::new(document(vec![shown("div").with_text("Top Deals")]));

    assert!(matches!(extractor().extract(&page).unwrap_err(), WatchError::Timeout { .. }));
}

#[test]
fn test_session_is_established_once_then_restored() {
    let mut store = SessionStore::new();
    let bootstrap = bootstrap();

    let first = FakePage::new(storefront(("$89.", "99")));
    assert_eq!(store.ensure_established("us-zip-72716", &first, &bootstrap).unwrap(), SessionOrigin::Established);
    assert_eq!(first.typed(), vec!["72716".to_string()]);
    assert!(first.actions().contains(&Action::InjectStyle));

    let cached = store.get("us-zip-72716").unwrap();
    let names: Vec<_> = cached.cookies.iter().map(|c| c.name.as_str()).collect();
    assert_eq!(names, vec!["i18n-prefs", "lc-main"]);

    let second = FakePage::new(storefront(("$89.", "99")));
    assert_eq!(store.ensure_established("us-zip-72716", &second, &bootstrap).unwrap(), SessionOrigin::Restored);
    assert_eq!(
        second.actions(),
        vec![
            Action::Visit("https://www.amazon.com/".to_string()),
            Action::SetCookie("i18n-prefs".to_string()),
            Action::SetCookie("lc-main".to_string()),
        ]
    );
}

#[test]
fn test_restore_keeps_cookie_attributes() {
    let mut store = SessionStore::new();
    let bootstrap = bootstrap();

    let first = FakePage::new(storefront(("$89.", "99")));
    let token = CookieRecord {
        domain: Some(".amazon.com".to_string()),
        http_only: true,
        secure: true,
        expires: Some(1_900_000_000.0),
        ..CookieRecord::new("session-token", "a=b; c")
    };
    first.seed_cookie(token.clone());
    store.ensure_established("us-zip-72716", &first, &bootstrap).unwrap();

    let second = FakePage::new(storefront(("$89.", "99")));
    store.ensure_established("us-zip-72716", &second, &bootstrap).unwrap();

    let restored = second.cookies().unwrap();
    assert!(restored.contains(&token), "restored cookies: {:?}", restored);
}

#[test]
fn test_failed_bootstrap_caches_nothing() {
    let mut store = SessionStore::new();
    let profile = SiteProfile::default();
    let bootstrap = bootstrap()
        .with_resolver(
            LocationResolver::new(&profile.location, "https://www.amazon.com/")
                .unwrap()
                .with_settle_timeout(Duration::from_millis(100)),
        )
        .with_zip_setter(ZipSetter::new(&profile.zip).unwrap().with_timeout(Duration::from_millis(200)));

    let broken = FakePage::new(document(vec![shown("div")]));
    assert!(store.ensure_established("us-zip-72716", &broken, &bootstrap).is_err());
    assert!(store.is_empty());

    let healthy = FakePage::new(storefront(("$89.", "99")));
    assert_eq!(store.ensure_established("us-zip-72716", &healthy, &bootstrap).unwrap(), SessionOrigin::Established);
}

#[test]
fn test_invalidate_forces_a_new_bootstrap() {
    let mut store = SessionStore::new();
    let bootstrap = bootstrap();
    store.ensure_established("us-zip-72716", &FakePage::new(storefront(("$89.", "99"))), &bootstrap).unwrap();

    assert!(store.invalidate("us-zip-72716"));
    assert!(!store.invalidate("us-zip-72716"));

    let page = FakePage::new(storefront(("$89.", "99")));
    assert_eq!(store.ensure_established("us-zip-72716", &page, &bootstrap).unwrap(), SessionOrigin::Established);

    store.clear();
    assert!(store.is_empty());
}

#[test]
fn test_scenario_passes_under_threshold() {
    let dir = tempfile::tempdir().unwrap();
    let mut runner = runner(config(dir.path()));

    let report = runner.run_all(&Scenario::defaults(), || Ok(FakePage::new(storefront(("$89.", "99")))));

    assert!(report.success());
    assert_eq!((report.passed, report.failed, report.skipped), (1, 0, 1));

    let scenario = report.scenario("best-seller-price").unwrap();
    assert_eq!(scenario.status, ScenarioStatus::Passed);
    assert_eq!(scenario.attempts, 1);
    assert_eq!(scenario.price.as_ref().unwrap().price, 89.99);
    assert!(scenario.screenshots.is_empty());
    assert!(scenario.diagnostics.iter().any(|line| line.contains("$89.99")));

    assert_eq!(report.scenario("navigate-only").unwrap().status, ScenarioStatus::Skipped);
}

#[test]
fn test_scenario_fails_over_threshold_with_price_in_message() {
    let dir = tempfile::tempdir().unwrap();
    let mut runner = runner(config(dir.path()));
    let mut opened = 0;

    let report = runner.run_all(&[Scenario::BestSellerPrice], || {
        opened += 1;
        Ok(FakePage::new(storefront(("$129.", "00"))))
    });

    let scenario = report.scenario("best-seller-price").unwrap();
    assert_eq!(scenario.status, ScenarioStatus::Failed);
    let error = scenario.error.as_ref().unwrap();
    assert_eq!(error.kind, ErrorKind::Assertion);
    assert!(error.message.contains("129"));
    assert_eq!(scenario.price.as_ref().unwrap().price, 129.0);

    // Run mode retries the whole scenario twice, each time on a fresh page.
    assert_eq!(scenario.attempts, 3);
    assert_eq!(opened, 3);
    assert_eq!(scenario.screenshots.len(), 3);
    assert!(dir.path().join("best-seller-price-attempt-3.png").exists());
    assert!(scenario.screenshots.iter().all(|s| s.base64_png.is_none()));
}

#[test]
fn test_retries_reuse_the_cached_session() {
    let dir = tempfile::tempdir().unwrap();
    let mut runner = runner(config(dir.path()));

    runner.run_all(&[Scenario::BestSellerPrice], || Ok(FakePage::new(storefront(("$129.", "00")))));

    // The session survives failed scenarios.
    assert_eq!(runner.sessions().len(), 1);
    assert!(runner.sessions().get("us-zip-72716").is_some());
}

#[test]
fn test_open_mode_does_not_retry_and_embeds_screenshots() {
    let dir = tempfile::tempdir().unwrap();
    let mut config = config(dir.path());
    config.mode = bestseller_watch::ExecutionMode::Open;
    config.embed_screenshots = true;
    let mut runner = runner(config);

    let report = runner.run_all(&[Scenario::BestSellerPrice], || Ok(FakePage::new(storefront(("$129.", "00")))));

    let scenario = report.scenario("best-seller-price").unwrap();
    assert_eq!(scenario.attempts, 1);
    assert!(scenario.screenshots[0].base64_png.is_some());
}

#[test]
fn test_navigate_only_skips_extraction() {
    let dir = tempfile::tempdir().unwrap();
    let mut runner = runner(config(dir.path()));

    let report = runner.run_all(&[Scenario::NavigateOnly], || Ok(FakePage::new(storefront(("$129.", "00")))));

    let scenario = report.scenario("navigate-only").unwrap();
    assert_eq!(scenario.status, ScenarioStatus::Passed);
    assert!(scenario.price.is_none());
    assert_eq!(report.scenario("best-seller-price").unwrap().status, ScenarioStatus::Skipped);
}

#[test]
fn test_runner_drives_the_full_flow() {
    let dir = tempfile::tempdir().unwrap();
    let mut runner = runner(config(dir.path()));
    let page = FakePage::new(storefront(("$89.", "99")));

    let picked = runner.run_once(Scenario::BestSellerPrice, &page).unwrap().unwrap();

    assert_eq!(picked.rank, 2);
    assert!(page.clicked("sp-cc-accept"));
    assert!(page.clicked("Electronics"));
    assert!(page.actions().contains(&Action::Click("TV & Video".to_string(), ClickMode::Forced)));
}

#[test]
fn test_uncaught_page_error_fails_scenario() {
    let dir = tempfile::tempdir().unwrap();
    let mut runner = runner(config(dir.path()));
    let page = FakePage::new(storefront(("$89.", "99")));
    page.push_page_error(PageError::new("ReferenceError: checkout is not defined"));

    let err = runner.run_once(Scenario::BestSellerPrice, &page).unwrap_err();
    assert_eq!(err.kind(), ErrorKind::PageScript);
}

#[test]
fn test_benign_page_error_is_ignored() {
    let dir = tempfile::tempdir().unwrap();
    let mut runner = runner(config(dir.path()));
    let page = FakePage::new(storefront(("$89.", "99")));
    page.push_page_error(PageError::new("TypeError: cardModuleFactory is not a function"));

    assert!(runner.run_once(Scenario::BestSellerPrice, &page).is_ok());
}

#[test]
fn test_page_factory_failure_is_reported() {
    let dir = tempfile::tempdir().unwrap();
    let mut runner = runner(config(dir.path()));

    let report = runner.run_all(&[Scenario::BestSellerPrice], || -> Result<FakePage> {
        Err(WatchError::LaunchFailed("no chrome".to_string()))
    });

    let scenario = report.scenario("best-seller-price").unwrap();
    assert_eq!(scenario.status, ScenarioStatus::Failed);
    assert_eq!(scenario.error.as_ref().unwrap().kind, ErrorKind::Browser);
    assert!(!report.success());
}

#[test]
fn test_report_written_to_disk() {
    let dir = tempfile::tempdir().unwrap();
    let config = config(dir.path());
    let report_path = config.report_path.clone();
    let mut runner = runner(config);

    let report = runner.run_all(&Scenario::defaults(), || Ok(FakePage::new(storefront(("$89.", "99")))));
    report.write_json(&report_path).unwrap();

    let written = std::fs::read_to_string(&report_path).unwrap();
    assert!(written.contains("\"best-seller-price\""));
    assert!(written.contains("\"passed\""));
}
