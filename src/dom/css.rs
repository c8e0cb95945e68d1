use crate::dom::element::{ElementNode, fragment_root};
use crate::error::{Result, WatchError};
use scraper::{ElementRef, Selector};

/// A parsed CSS selector (or comma-separated selector list) with its source text
///
/// The source is what gets sent to the browser's `querySelectorAll`; the parsed
/// form evaluates the same selector against snapshots.
#[derive(Debug, Clone)]
pub struct CssSelector {
    source: String,
    selector: Selector,
}

impl CssSelector {
    pub fn parse(source: &str) -> Result<Self> {
        let source = source.trim();
        if source.is_empty() {
            return Err(WatchError::InvalidSelector("empty selector".to_string()));
        }
        let selector = Selector::parse(source).map_err(|e| WatchError::InvalidSelector(format!("{}: {}", source, e)))?;
        Ok(Self { source: source.to_string(), selector })
    }

    /// Alternatives joined into one selector list; matches come back in document order
    pub fn any_of<S: AsRef<str>>(alternatives: &[S]) -> Result<Self> {
        if alternatives.is_empty() {
            return Err(WatchError::InvalidSelector("no alternative selectors given".to_string()));
        }
        for alternative in alternatives {
            Self::parse(alternative.as_ref())?;
        }
        let joined = alternatives.iter().map(|a| a.as_ref().trim()).collect::<Vec<_>>().join(", ");
        Self::parse(&joined)
    }

    pub fn as_str(&self) -> &str {
        &self.source
    }

    pub fn matches(&self, element: &ElementRef<'_>) -> bool {
        self.selector.matches(element)
    }

    /// Matching descendants of `scope` in document order, `scope` itself excluded
    pub fn select_in<'a>(&self, scope: ElementRef<'a>) -> impl Iterator<Item = ElementRef<'a>> {
        scope.select(&self.selector).filter(move |element| *element != scope)
    }

    /// Matching descendants of a snapshot
    pub fn select_all(&self, root: &ElementNode) -> Vec<ElementNode> {
        let fragment = root.to_fragment();
        match fragment_root(&fragment) {
            Some(scope) => self.select_in(scope).map(ElementNode::from_element).collect(),
            None => Vec::new(),
        }
    }

    pub fn select_first(&self, root: &ElementNode) -> Option<ElementNode> {
        let fragment = root.to_fragment();
        fragment_root(&fragment).and_then(|scope| self.select_in(scope).next()).map(ElementNode::from_element)
    }
}

impl std::fmt::Display for CssSelector {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.write_str(&self.source)
    }
}
