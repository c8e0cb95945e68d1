//! Host primitives the engine drives
//!
//! [`Page`] is everything the navigation and extraction steps need from a
//! browser: scoped queries returning [`ElementNode`] snapshots, actions on
//! previously returned nodes, cookies, style injection, network observation
//! and screenshots. [`crate::browser::BrowserSession`] implements it on top of
//! headless Chrome; tests implement it over in-memory snapshots.

use crate::dom::ElementNode;
use crate::error::Result;
use crate::network::{NetworkWatch, UrlPattern};
use serde::{Deserialize, Serialize};

/// How a click is delivered
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum ClickMode {
    /// Real pointer click at the element's centre; fails if the element is covered
    Pointer,
    /// Dispatched straight to the element, bypassing visibility and occlusion checks
    Forced,
}

/// A cookie as captured from or restored into a page
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct CookieRecord {
    pub name: String,
    pub value: String,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub domain: Option<String>,
    #[serde(default = "default_cookie_path")]
    pub path: String,
    #[serde(default)]
    pub secure: bool,
    /// Invisible to page scripts; only the protocol can restore it
    #[serde(default)]
    pub http_only: bool,
    /// Expiry in seconds since the epoch; `None` for session cookies
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub expires: Option<f64>,
}

fn default_cookie_path() -> String {
    "/".to_string()
}

impl CookieRecord {
    pub fn new(name: impl Into<String>, value: impl Into<String>) -> Self {
        Self {
            name: name.into(),
            value: value.into(),
            domain: None,
            path: default_cookie_path(),
            secure: false,
            http_only: false,
            expires: None,
        }
    }
}

/// An uncaught script error reported by the page
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct PageError {
    pub message: String,
    /// Script URL the error was thrown from, when known
    #[serde(default)]
    pub source_url: Option<String>,
    /// Stack trace text, when known
    #[serde(default)]
    pub stack: Option<String>,
}

impl PageError {
    pub fn new(message: impl Into<String>) -> Self {
        Self { message: message.into(), source_url: None, stack: None }
    }
}

/// A live, eventually-consistent document the engine observes and drives
pub trait Page {
    /// Navigate to an absolute URL and wait for the load to finish
    fn visit(&self, url: &str) -> Result<()>;

    /// Full reload of the current document
    fn reload(&self) -> Result<()>;

    /// All elements matching `selector` in document order, searched within `scope` or the whole document
    fn query(&self, scope: Option<&ElementNode>, selector: &str) -> Result<Vec<ElementNode>>;

    /// Nearest ancestor-or-self of `node` matching `selector`
    fn closest(&self, node: &ElementNode, selector: &str) -> Result<Option<ElementNode>>;

    fn click(&self, node: &ElementNode, mode: ClickMode) -> Result<()>;

    /// Empty a text input
    fn clear(&self, node: &ElementNode) -> Result<()>;

    /// Type into a focused text input, without delay between keystrokes
    fn type_text(&self, node: &ElementNode, text: &str) -> Result<()>;

    /// Submit an input with the Enter key
    fn press_enter(&self, node: &ElementNode) -> Result<()>;

    fn scroll_into_view(&self, node: &ElementNode) -> Result<()>;

    /// Set a cookie for the current origin (or its own domain), keeping its flags and expiry
    fn set_cookie(&self, cookie: &CookieRecord) -> Result<()>;

    /// All cookies visible to the current page
    fn cookies(&self) -> Result<Vec<CookieRecord>>;

    /// Append a `<style>` element with the given CSS to the document head
    fn inject_style(&self, css: &str) -> Result<()>;

    /// Start observing completed exchanges whose URL matches `pattern`
    fn observe_network(&self, pattern: &UrlPattern) -> Result<NetworkWatch>;

    /// PNG screenshot of the viewport
    fn screenshot(&self) -> Result<Vec<u8>>;

    /// Uncaught page errors reported since the last call
    fn drain_page_errors(&self) -> Result<Vec<PageError>>;
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_cookie_defaults_to_root_path() {
        let cookie = CookieRecord::new("i18n-prefs", "USD");
        assert_eq!(cookie.path, "/");
        assert!(cookie.domain.is_none());

        let parsed: CookieRecord = serde_json::from_str(r#"{"name":"lc-main","value":"en_US"}"#).unwrap();
        assert_eq!(parsed.path, "/");
        assert!(!parsed.http_only && !parsed.secure);
        assert!(parsed.expires.is_none());
    }
}
