use crate::dom::{ElementNode, CssSelector};
use crate::error::Result;
use crate::profile::BestSellerSelectors;

/// Raw integer and fractional price texts as read from markup
#[derive(Debug, Clone, PartialEq, Eq, Default)]
pub struct PriceFragment {
    pub whole: String,
    pub fraction: String,
}

impl PriceFragment {
    pub fn new(whole: impl Into<String>, fraction: impl Into<String>) -> Self {
        Self { whole: whole.into(), fraction: fraction.into() }
    }

    /// Numeric value, or `None` when there is no usable price.
    ///
    /// Non-digits are stripped from both parts; an empty fraction reads as `00`,
    /// an empty integer part means no price at all.
    pub fn value(&self) -> Option<f64> {
        let whole = digits(&self.whole);
        if whole.is_empty() {
            return None;
        }
        let mut fraction = digits(&self.fraction);
        if fraction.is_empty() {
            fraction.push_str("00");
        }

        format!("{}.{}", whole, fraction).parse::<f64>().ok().filter(|v| v.is_finite())
    }
}

fn digits(text: &str) -> String {
    text.chars().filter(char::is_ascii_digit).collect()
}

/// Reads a price widget with separate integer and fractional elements
#[derive(Debug, Clone)]
pub struct PriceParser {
    whole: CssSelector,
    fraction: CssSelector,
}

impl PriceParser {
    pub fn new(whole: &str, fraction: &str) -> Result<Self> {
        Ok(Self { whole: CssSelector::parse(whole)?, fraction: CssSelector::parse(fraction)? })
    }

    pub fn from_profile(selectors: &BestSellerSelectors) -> Result<Self> {
        Self::new(&selectors.price_whole, &selectors.price_fraction)
    }

    /// First integer and fractional texts inside `container`; missing parts read as empty
    pub fn fragment(&self, container: &ElementNode) -> PriceFragment {
        let text = |list: &CssSelector| {
            list.select_first(container).and_then(|n| n.text_content).unwrap_or_default()
        };
        PriceFragment { whole: text(&self.whole), fraction: text(&self.fraction) }
    }

    /// Price held by `container`, or `None`; never fails on malformed markup
    pub fn parse(&self, container: &ElementNode) -> Option<f64> {
        self.fragment(container).value()
    }
}
