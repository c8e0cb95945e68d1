//! Site profile
//!
//! Every selector, label pattern, cookie and signal URL the engine relies on
//! lives here. The storefront changes shape without notice; when it does,
//! update the defaults below (or ship a JSON override) and leave the engine
//! control flow alone.

use crate::dom::CssSelector;
use crate::error::{Result, WatchError};
use crate::locator::TextPattern;
use crate::network::UrlPattern;
use crate::page::CookieRecord;
use serde::{Deserialize, Serialize};
use std::path::Path;

/// Selectors and patterns for one storefront
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct SiteProfile {
    /// Cookies forcing currency and language before the location flow runs
    pub locale_cookies: Vec<CookieRecord>,
    pub popups: PopupSelectors,
    pub location: LocationSelectors,
    pub zip: ZipSelectors,
    pub menu: MenuSelectors,
    pub best_sellers: BestSellerSelectors,
    pub benign_errors: BenignErrors,
    /// Style override disabling transitions, animations and smooth scrolling
    pub stabilize_css: String,
}

/// Cookie consent and promotional overlays
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct PopupSelectors {
    pub consent: Vec<String>,
    pub overlay_close: Vec<String>,
}

/// The "deliver to" indicator and the controls used to get back to it
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct LocationSelectors {
    pub indicator: String,
    pub home_links: Vec<String>,
}

/// The delivery-region modal
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct ZipSelectors {
    pub entry: String,
    pub modal: Vec<String>,
    pub input: Vec<String>,
    /// Button-like controls scanned after submitting the code
    pub controls: Vec<String>,
    /// Confirm labels in priority order
    pub confirm_labels: Vec<String>,
    pub close: Vec<String>,
}

/// Flyout menu and the path walked through it
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct MenuSelectors {
    pub toggle: String,
    pub panel: String,
    pub item: String,
    pub expand_label: String,
    /// Label patterns, one per menu level
    pub path: Vec<String>,
    /// Request that confirms the destination listing has started loading
    pub signal: UrlPattern,
}

/// Best Sellers merchandising card
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct BestSellerSelectors {
    pub heading: String,
    pub heading_label: String,
    pub card: Vec<String>,
    pub content: String,
    pub candidates: Vec<String>,
    pub price: String,
    pub price_whole: String,
    pub price_fraction: String,
    /// Zero-based rank of the item whose price is checked
    pub position: usize,
}

/// Uncaught page errors that must not fail a scenario
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct BenignErrors {
    /// Case-insensitive patterns matched against the error message
    pub messages: Vec<String>,
    /// Substrings matched against the script URL or stack
    pub origins: Vec<String>,
}

fn strings(items: &[&str]) -> Vec<String> {
    items.iter().map(|s| s.to_string()).collect()
}

impl Default for SiteProfile {
    fn default() -> Self {
        Self {
            locale_cookies: vec![CookieRecord::new("i18n-prefs", "USD"), CookieRecord::new("lc-main", "en_US")],
            popups: PopupSelectors::default(),
            location: LocationSelectors::default(),
            zip: ZipSelectors::default(),
            menu: MenuSelectors::default(),
            best_sellers: BestSellerSelectors::default(),
            benign_errors: BenignErrors::default(),
            stabilize_css: concat!(
                "*, *::before, *::after {\n",
                "  transition: none !important;\n",
                "  animation: none !important;\n",
                "  scroll-behavior: auto !important;\n",
                "}"
            )
            .to_string(),
        }
    }
}

impl Default for PopupSelectors {
    fn default() -> Self {
        Self {
            consent: strings(&["#sp-cc-accept", "input[name=\"accept\"]"]),
            overlay_close: strings(&[
                "button[aria-label=\"Close\"]",
                ".a-button-close",
                ".a-popover-header .a-button-close",
            ]),
        }
    }
}

impl Default for LocationSelectors {
    fn default() -> Self {
        Self {
            indicator: "#nav-global-location-popover-link".to_string(),
            home_links: strings(&["a#nav-logo-sprites", "a.nav-logo-link", "#nav-logo-sprites"]),
        }
    }
}

impl Default for ZipSelectors {
    fn default() -> Self {
        Self {
            entry: "#nav-global-location-popover-link".to_string(),
            modal: strings(&[".a-popover-wrapper", "[aria-label=\"Choose your location\"]"]),
            input: strings(&["#GLUXZipUpdateInput", "#GLUXPostalCode"]),
            controls: strings(&["button", "input[type=\"submit\"]", "input[type=\"button\"]"]),
            confirm_labels: strings(&["^Continue$", "^Done$"]),
            close: strings(&["button[aria-label=\"Close\"]", ".a-button-close", "#GLUXConfirmClose"]),
        }
    }
}

impl Default for MenuSelectors {
    fn default() -> Self {
        Self {
            toggle: "#nav-hamburger-menu".to_string(),
            panel: "#hmenu-content".to_string(),
            item: "a.hmenu-item".to_string(),
            expand_label: "See all".to_string(),
            path: strings(&["^Electronics$", r"TV\s*&\s*Video"]),
            signal: UrlPattern::glob("**/gp/browse*"),
        }
    }
}

impl Default for BestSellerSelectors {
    fn default() -> Self {
        Self {
            heading: ".octopus-pc-card-title span".to_string(),
            heading_label: r"best\s*sellers".to_string(),
            card: strings(&[".octopus-best-seller-card", ".octopus-pc-card"]),
            content: ".octopus-pc-card-content".to_string(),
            candidates: strings(&["[data-asin]", "li", "div"]),
            price: ".a-price".to_string(),
            price_whole: ".a-price .a-price-whole".to_string(),
            price_fraction: ".a-price .a-price-fraction".to_string(),
            position: 1,
        }
    }
}

impl Default for BenignErrors {
    fn default() -> Self {
        Self { messages: strings(&["cardModuleFactory is not a function"]), origins: strings(&["m.media-amazon.com"]) }
    }
}

impl SiteProfile {
    /// Load a JSON override; sections and fields left out keep their defaults
    pub fn from_json_file(path: impl AsRef<Path>) -> Result<Self> {
        let path = path.as_ref();
        let text = std::fs::read_to_string(path)
            .map_err(|e| WatchError::Config(format!("Failed to read profile {}: {}", path.display(), e)))?;
        let profile: Self = serde_json::from_str(&text)
            .map_err(|e| WatchError::Config(format!("Invalid profile {}: {}", path.display(), e)))?;
        profile.validate()?;
        Ok(profile)
    }

    /// Check that every selector parses and every pattern compiles
    pub fn validate(&self) -> Result<()> {
        let single = [
            &self.location.indicator,
            &self.zip.entry,
            &self.menu.toggle,
            &self.menu.panel,
            &self.menu.item,
            &self.best_sellers.heading,
            &self.best_sellers.content,
            &self.best_sellers.price,
            &self.best_sellers.price_whole,
            &self.best_sellers.price_fraction,
        ];
        for selector in single {
            CssSelector::parse(selector)?;
        }

        let lists = [
            &self.popups.consent,
            &self.popups.overlay_close,
            &self.location.home_links,
            &self.zip.modal,
            &self.zip.input,
            &self.zip.controls,
            &self.zip.close,
            &self.best_sellers.card,
            &self.best_sellers.candidates,
        ];
        for list in lists {
            CssSelector::any_of(list.as_slice())?;
        }

        for pattern in self.zip.confirm_labels.iter().chain(&self.menu.path).chain(&self.benign_errors.messages) {
            TextPattern::regex(pattern)?;
        }
        TextPattern::regex(&self.best_sellers.heading_label)?;
        self.menu.signal.validate()?;

        if self.menu.path.is_empty() {
            return Err(WatchError::Config("menu path must name at least one level".to_string()));
        }
        Ok(())
    }
}
