//! Headless Chrome host for the engine

pub mod config;
pub mod session;

pub use config::{BrowserFamily, ConnectionOptions, DownloadSettings, LaunchOptions, LaunchPlan};
pub use session::BrowserSession;
