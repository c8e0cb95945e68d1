//! Element locator policies
//!
//! Stateless matching rules shared by the engine steps: a selector, an
//! optional text pattern and a visibility filter. Lookups return [`Lookup`]
//! so every call site decides whether a miss is tolerated or fatal.

use crate::dom::{ElementNode, CssSelector};
use crate::error::{Result, WatchError};
use regex::{Regex, RegexBuilder};

/// How an element's visible label is compared
#[derive(Debug, Clone)]
pub enum TextPattern {
    /// Whole label equals the text, ignoring case and surrounding whitespace
    Exact(String),
    /// Label contains a match for the expression
    Regex(Regex),
}

impl TextPattern {
    pub fn exact(text: impl Into<String>) -> Self {
        Self::Exact(text.into())
    }

    /// Compile a case-insensitive pattern
    pub fn regex(pattern: &str) -> Result<Self> {
        RegexBuilder::new(pattern)
            .case_insensitive(true)
            .build()
            .map(Self::Regex)
            .map_err(|e| WatchError::InvalidPattern(format!("{}: {}", pattern, e)))
    }

    pub fn is_match(&self, label: &str) -> bool {
        match self {
            Self::Exact(text) => label.trim().eq_ignore_ascii_case(text.trim()),
            Self::Regex(re) => re.is_match(label),
        }
    }
}

impl std::fmt::Display for TextPattern {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        match self {
            Self::Exact(text) => write!(f, "\"{}\"", text),
            Self::Regex(re) => write!(f, "/{}/i", re.as_str()),
        }
    }
}

/// Outcome of a best-effort lookup
#[derive(Debug, Clone, PartialEq)]
pub enum Lookup<T> {
    Found(T),
    NotFound,
}

impl<T> Lookup<T> {
    pub fn is_found(&self) -> bool {
        matches!(self, Self::Found(_))
    }

    pub fn into_option(self) -> Option<T> {
        match self {
            Self::Found(value) => Some(value),
            Self::NotFound => None,
        }
    }
}

impl<T> From<Option<T>> for Lookup<T> {
    fn from(value: Option<T>) -> Self {
        match value {
            Some(v) => Self::Found(v),
            None => Self::NotFound,
        }
    }
}

/// A reusable element matching rule
#[derive(Debug, Clone)]
pub struct Locator {
    selector: CssSelector,
    text: Option<TextPattern>,
    visible_only: bool,
}

impl Locator {
    /// Match elements by CSS selector (or selector list)
    pub fn css(selector: &str) -> Result<Self> {
        Ok(Self::from_selector(CssSelector::parse(selector)?))
    }

    /// Match the first of several alternative selectors, in document order
    pub fn any_of<S: AsRef<str>>(alternatives: &[S]) -> Result<Self> {
        Ok(Self::from_selector(CssSelector::any_of(alternatives)?))
    }

    pub fn from_selector(selector: CssSelector) -> Self {
        Self { selector, text: None, visible_only: false }
    }

    /// Builder method: require the label to match
    pub fn with_text(mut self, pattern: TextPattern) -> Self {
        self.text = Some(pattern);
        self
    }

    /// Builder method: only accept visible elements
    pub fn visible(mut self) -> Self {
        self.visible_only = true;
        self
    }

    pub fn selector(&self) -> &CssSelector {
        &self.selector
    }

    /// Whether a node returned by a selector query passes the text and visibility filters
    pub fn accepts(&self, node: &ElementNode) -> bool {
        (!self.visible_only || node.is_visible) && self.text.as_ref().is_none_or(|p| p.is_match(&node.label()))
    }

    /// First accepted node among query results (kept in document order)
    pub fn first(&self, nodes: Vec<ElementNode>) -> Lookup<ElementNode> {
        nodes.into_iter().find(|n| self.accepts(n)).into()
    }
}

impl std::fmt::Display for Locator {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        write!(f, "'{}'", self.selector)?;
        if let Some(text) = &self.text {
            write!(f, " with text {}", text)?;
        }
        if self.visible_only {
            f.write_str(" (visible)")?;
        }
        Ok(())
    }
}

/// Find the first visible control whose label matches one of `labels`, trying the labels in order
pub fn first_labelled<'a>(controls: &'a [ElementNode], labels: &[TextPattern]) -> Lookup<&'a ElementNode> {
    labels
        .iter()
        .find_map(|pattern| controls.iter().find(|c| c.is_visible && pattern.is_match(&c.label())))
        .into()
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_exact_pattern_ignores_case_and_padding() {
        let pattern = TextPattern::exact("Electronics");
        assert!(pattern.is_match(" electronics "));
        assert!(!pattern.is_match("Electronics & Computers"));
    }

    #[test]
    fn test_regex_pattern_is_case_insensitive() {
        let pattern = TextPattern::regex(r"TV\s*&\s*Video").unwrap();
        assert!(pattern.is_match("tv & video"));
        assert!(pattern.is_match("TV&Video"));
        assert!(!pattern.is_match("Video Games"));
        assert!(TextPattern::regex("(").is_err());
    }

    #[test]
    fn test_locator_filters_visibility_and_text() {
        let locator = Locator::css("a.hmenu-item").unwrap().with_text(TextPattern::regex("see all").unwrap()).visible();
        let item = |text: &str, node_ref: u64| {
            ElementNode::new("a").with_attribute("class", "hmenu-item").with_text(text).with_ref(node_ref)
        };
        let nodes = vec![
            item("See all", 1),
            item("Prime Video", 2).with_visibility(true),
            item("See All", 3).with_visibility(true),
        ];

        match locator.first(nodes) {
            Lookup::Found(node) => assert_eq!(node.node_ref, Some(3)),
            Lookup::NotFound => panic!("expected a match"),
        }
    }

    #[test]
    fn test_locator_accepts_full_css() {
        let locator = Locator::any_of(&["#hmenu-content > a.hmenu-item:not(.hmenu-back)", "a[href^='/gp/browse']"]);
        assert!(locator.is_ok());
        assert!(Locator::css("a.hmenu-item:has(").is_err());
    }

    #[test]
    fn test_first_labelled_respects_label_priority() {
        let controls = vec![
            ElementNode::new("button").with_text("Done").with_visibility(true),
            ElementNode::new("input").with_attribute("value", "Continue").with_visibility(true),
        ];
        let labels = vec![TextPattern::regex("^Continue$").unwrap(), TextPattern::regex("^Done$").unwrap()];

        let found = first_labelled(&controls, &labels).into_option().unwrap();
        assert!(found.is_tag("input"));
    }

    #[test]
    fn test_first_labelled_skips_hidden_controls() {
        let controls = vec![ElementNode::new("button").with_text("Continue")];
        let labels = vec![TextPattern::regex("^Continue$").unwrap()];
        assert!(!first_labelled(&controls, &labels).is_found());
    }
}
