//! # bestseller-watch
//!
//! Resilient browser navigation and extraction for the storefront "Best Sellers" price check,
//! driven over the Chrome DevTools Protocol (CDP).
//!
//! A run establishes a locale session once (currency cookies, delivery region, zip code), then for
//! each scenario visits the root, dismisses popups, walks the hamburger menu to
//! Electronics → TV & Video, waits for the listing request to complete, reads the price of the
//! second priced item in the Best Sellers card and asserts it against a threshold.
//!
//! ## Running
//!
//! ```bash
//! # Headless, threshold from the environment
//! PRICE_THRESHOLD=100 cargo run --bin bestseller-watch -- run
//!
//! # Headed, no retries, navigation-only scenario too
//! cargo run --bin bestseller-watch -- run --mode open --scenario best-seller-price --scenario navigate-only
//! ```
//!
//! ## Library Usage
//!
//! ```rust,no_run
//! use bestseller_watch::{BrowserSession, LaunchOptions, RunConfig, Scenario, ScenarioRunner, SiteProfile};
//!
//! # fn main() -> bestseller_watch::Result<()> {
//! let config = RunConfig::from_env()?;
//! let mut runner = ScenarioRunner::new(config, &SiteProfile::default())?;
//!
//! let report = runner.run_all(&Scenario::defaults(), || BrowserSession::launch(LaunchOptions::default()));
//! report.write_json("artifacts/report.json")?;
//! println!("{} passed, {} failed", report.passed, report.failed);
//! # Ok(())
//! # }
//! ```
//!
//! Every engine step works on any [`Page`], so the control flow can be exercised against
//! in-memory snapshots without a browser.
//!
//! ## Module Overview
//!
//! - [`browser`]: headless Chrome session and launch options
//! - [`page`]: the host primitives the engine drives
//! - [`dom`]: element snapshots and CSS selector evaluation
//! - [`locator`], [`wait`], [`network`]: locator policies, bounded waits, network observation
//! - [`profile`]: every selector and pattern for the storefront
//! - [`engine`]: popups, location, zip, menu, Best Sellers extraction, session bootstrap
//! - [`runner`], [`report`], [`diagnostics`], [`config`]: scenarios, retries, artifacts
//! - [`error`]: error types and result aliases

pub mod browser;
pub mod config;
pub mod diagnostics;
pub mod dom;
pub mod engine;
pub mod error;
pub mod locator;
pub mod network;
pub mod page;
pub mod profile;
pub mod report;
pub mod runner;
pub mod wait;

pub use browser::{BrowserSession, ConnectionOptions, LaunchOptions};
pub use config::{ExecutionMode, RunConfig};
pub use diagnostics::Diagnostics;
pub use dom::{CssSelector, ElementNode};
pub use engine::{BestSellerPrice, SessionStore};
pub use error::{ErrorKind, Result, WatchError};
pub use locator::{Locator, Lookup, TextPattern};
pub use network::{NetworkWatch, UrlPattern};
pub use page::{ClickMode, CookieRecord, Page, PageError};
pub use profile::SiteProfile;
pub use report::{RunReport, ScenarioReport, ScenarioStatus};
pub use runner::{Scenario, ScenarioRunner};
