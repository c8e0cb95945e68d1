use crate::dom::ElementNode;
use crate::error::{Result, WatchError};
use crate::locator::{Locator, TextPattern};
use crate::network::UrlPattern;
use crate::page::{ClickMode, Page};
use crate::profile::MenuSelectors;
use crate::wait::{self, DEFAULT_STEP_TIMEOUT, LONG_STEP_TIMEOUT};
use std::time::Duration;

/// Ordered menu levels to click through, root first
#[derive(Debug, Clone)]
pub struct NavigationTarget {
    levels: Vec<TextPattern>,
}

impl NavigationTarget {
    pub fn new(levels: Vec<TextPattern>) -> Result<Self> {
        if levels.is_empty() {
            return Err(WatchError::Config("navigation target needs at least one menu level".to_string()));
        }
        Ok(Self { levels })
    }

    /// Compile case-insensitive label patterns
    pub fn from_patterns<S: AsRef<str>>(patterns: &[S]) -> Result<Self> {
        Self::new(patterns.iter().map(|p| TextPattern::regex(p.as_ref())).collect::<Result<_>>()?)
    }

    pub fn levels(&self) -> &[TextPattern] {
        &self.levels
    }
}

/// Walks the flyout menu and confirms arrival through the listing request
#[derive(Debug, Clone)]
pub struct MenuNavigator {
    toggle: Locator,
    panel: Locator,
    item: Locator,
    expand_label: TextPattern,
    signal: UrlPattern,
    step_timeout: Duration,
    signal_timeout: Duration,
}

impl MenuNavigator {
    pub fn new(selectors: &MenuSelectors) -> Result<Self> {
        selectors.signal.validate()?;
        Ok(Self {
            toggle: Locator::css(&selectors.toggle)?.visible(),
            panel: Locator::css(&selectors.panel)?.visible(),
            item: Locator::css(&selectors.item)?,
            expand_label: TextPattern::regex(&regex::escape(&selectors.expand_label))?,
            signal: selectors.signal.clone(),
            step_timeout: DEFAULT_STEP_TIMEOUT,
            signal_timeout: LONG_STEP_TIMEOUT,
        })
    }

    /// Builder method: bound for each menu control to show up
    pub fn with_step_timeout(mut self, timeout: Duration) -> Self {
        self.step_timeout = timeout;
        self
    }

    /// Builder method: bound for the destination request to complete
    pub fn with_signal_timeout(mut self, timeout: Duration) -> Self {
        self.signal_timeout = timeout;
        self
    }

    /// Open the hamburger menu and wait for its panel
    pub fn open_menu<P: Page + ?Sized>(&self, page: &P) -> Result<ElementNode> {
        let toggle = wait::wait_for(page, None, &self.toggle, self.step_timeout)?;
        page.click(&toggle, ClickMode::Pointer)?;
        wait::wait_for(page, None, &self.panel, self.step_timeout)
    }

    /// Expand the collapsed "see all" department list
    pub fn expand_all<P: Page + ?Sized>(&self, page: &P) -> Result<()> {
        let panel = wait::wait_for(page, None, &self.panel, self.step_timeout)?;
        let see_all = self.item.clone().with_text(self.expand_label.clone());
        let link = wait::wait_for(page, Some(&panel), &see_all, self.step_timeout)?;
        page.click(&link, ClickMode::Forced)
    }

    /// Click through every level of `target` inside the open panel.
    ///
    /// The network observer is armed right before the last click; the call only
    /// returns once the destination request has completed.
    pub fn navigate<P: Page + ?Sized>(&self, page: &P, target: &NavigationTarget) -> Result<String> {
        let Some((last, parents)) = target.levels().split_last() else {
            return Err(WatchError::Config("navigation target is empty".to_string()));
        };

        for level in parents {
            self.click_level(page, level)?;
        }

        let watch = page.observe_network(&self.signal)?;
        self.click_level(page, last)?;
        let url = watch.wait(self.signal_timeout)?;
        log::info!("Menu navigation confirmed by {}", url);
        Ok(url)
    }

    fn click_level<P: Page + ?Sized>(&self, page: &P, level: &TextPattern) -> Result<()> {
        let panel = wait::wait_for(page, None, &self.panel, self.step_timeout)?;
        let locator = self.item.clone().with_text(level.clone()).visible();
        let item = wait::wait_for(page, Some(&panel), &locator, self.step_timeout)?;
        log::debug!("Opening menu level {}", level);
        page.click(&item, ClickMode::Forced)
    }
}
