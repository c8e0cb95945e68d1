use crate::dom::{CssSelector, ElementNode, fragment_root};
use crate::engine::price::PriceParser;
use crate::error::{Result, WatchError};
use crate::locator::{Locator, TextPattern};
use crate::page::Page;
use crate::profile::BestSellerSelectors;
use crate::wait::{self, LONG_STEP_TIMEOUT};
use serde::{Deserialize, Serialize};
use std::time::Duration;

/// The item picked out of the Best Sellers card
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct BestSellerPrice {
    pub price: f64,
    /// One-based rank within the priced items
    pub rank: usize,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub asin: Option<String>,
    /// How many priced items the card held
    pub priced_items: usize,
}

/// Finds the Best Sellers card and reads the price of one of its items
#[derive(Debug, Clone)]
pub struct BestSellerExtractor {
    heading: Locator,
    card: CssSelector,
    content: CssSelector,
    candidates: CssSelector,
    price_widget: CssSelector,
    parser: PriceParser,
    position: usize,
    timeout: Duration,
}

impl BestSellerExtractor {
    pub fn new(selectors: &BestSellerSelectors) -> Result<Self> {
        Ok(Self {
            heading: Locator::css(&selectors.heading)?.with_text(TextPattern::regex(&selectors.heading_label)?),
            card: CssSelector::any_of(selectors.card.as_slice())?,
            content: CssSelector::parse(&selectors.content)?,
            candidates: CssSelector::any_of(selectors.candidates.as_slice())?,
            price_widget: CssSelector::parse(&selectors.price)?,
            parser: PriceParser::from_profile(selectors)?,
            position: selectors.position,
            timeout: LONG_STEP_TIMEOUT,
        })
    }

    /// Builder method: bound for the heading to render
    pub fn with_timeout(mut self, timeout: Duration) -> Self {
        self.timeout = timeout;
        self
    }

    /// Locate the card on the live page and read the configured item's price
    pub fn extract<P: Page + ?Sized>(&self, page: &P) -> Result<BestSellerPrice> {
        let heading = wait::wait_for(page, None, &self.heading, self.timeout)?;
        page.scroll_into_view(&heading)?;

        let card = page
            .closest(&heading, self.card.as_str())?
            .ok_or_else(|| WatchError::ElementNotFound(format!("Best Sellers card ({}) around heading", self.card)))?;

        self.extract_from_card(&card)
    }

    /// Items under the card's content region that carry a price widget, in document order
    pub fn priced_candidates(&self, card: &ElementNode) -> Vec<ElementNode> {
        let fragment = card.to_fragment();
        let Some(content) = fragment_root(&fragment).and_then(|root| self.content.select_in(root).next()) else {
            return Vec::new();
        };
        self.candidates
            .select_in(content)
            .filter(|item| self.price_widget.select_in(*item).next().is_some())
            .map(ElementNode::from_element)
            .collect()
    }

    /// Pick and parse the configured item from a card snapshot
    pub fn extract_from_card(&self, card: &ElementNode) -> Result<BestSellerPrice> {
        let candidates = self.priced_candidates(card);
        log::debug!("Best Sellers card holds {} priced item(s)", candidates.len());

        // Never index blindly: at least a first and a second priced item must exist.
        let required = (self.position + 1).max(2);
        if candidates.len() < required {
            return Err(WatchError::TooFewPricedItems { found: candidates.len(), required });
        }

        let item = &candidates[self.position];
        let price = self.parser.parse(item).ok_or(WatchError::MissingPrice { position: self.position + 1 })?;

        Ok(BestSellerPrice {
            price,
            rank: self.position + 1,
            asin: item.get_attribute("data-asin").cloned(),
            priced_items: candidates.len(),
        })
    }
}
