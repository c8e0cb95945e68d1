use crate::error::{Result, WatchError};
use scraper::{ElementRef, Html, Node};
use serde::{Deserialize, Serialize};
use std::collections::HashMap;

/// Attribute stamped on elements handed out by a page so they can be targeted again
pub const REF_ATTRIBUTE: &str = "data-bsw-ref";

/// Attribute carrying the layout visibility of each element in a snapshot's markup
pub const VISIBLE_ATTRIBUTE: &str = "data-bsw-visible";

/// Elements whose content is never part of a snapshot
const SKIPPED_TAGS: [&str; 4] = ["script", "style", "noscript", "template"];

const VOID_TAGS: [&str; 8] = ["area", "br", "col", "hr", "img", "input", "link", "meta"];

/// Snapshot of a DOM element and its subtree, as observed at query time
#[derive(Debug, Clone, Serialize, Deserialize, PartialEq)]
pub struct ElementNode {
    /// HTML tag name (e.g., "div", "button", "input")
    pub tag_name: String,

    /// Element attributes (e.g., id, class, href, etc.)
    ///
    /// For form controls the live `value` property is reported here too.
    #[serde(default)]
    pub attributes: HashMap<String, String>,

    /// Text content of the element
    #[serde(skip_serializing_if = "Option::is_none")]
    pub text_content: Option<String>,

    /// Child elements
    #[serde(default, skip_serializing_if = "Vec::is_empty")]
    pub children: Vec<ElementNode>,

    /// Handle assigned by the page to elements returned from a query
    #[serde(skip_serializing_if = "Option::is_none")]
    pub node_ref: Option<u64>,

    /// Whether the element takes up layout space (jQuery `:visible` semantics)
    #[serde(default)]
    pub is_visible: bool,

    /// Markup the snapshot was parsed from, mixed text included; the builder methods drop it
    #[serde(skip)]
    markup: Option<String>,
}

impl ElementNode {
    /// Create a new ElementNode
    pub fn new(tag_name: impl Into<String>) -> Self {
        Self {
            tag_name: tag_name.into(),
            attributes: HashMap::new(),
            text_content: None,
            children: Vec::new(),
            node_ref: None,
            is_visible: false,
            markup: None,
        }
    }

    /// Builder method: set a single attribute
    pub fn with_attribute(mut self, key: impl Into<String>, value: impl Into<String>) -> Self {
        self.add_attribute(key, value);
        self
    }

    /// Builder method: set text content
    pub fn with_text(mut self, text: impl Into<String>) -> Self {
        self.text_content = Some(text.into());
        self.markup = None;
        self
    }

    /// Builder method: set children
    pub fn with_children(mut self, children: Vec<ElementNode>) -> Self {
        self.children = children;
        self.markup = None;
        self
    }

    /// Builder method: set the page handle
    pub fn with_ref(mut self, node_ref: u64) -> Self {
        self.node_ref = Some(node_ref);
        self.markup = None;
        self
    }

    /// Builder method: set visibility
    pub fn with_visibility(mut self, visible: bool) -> Self {
        self.is_visible = visible;
        self.markup = None;
        self
    }

    /// Add a single attribute
    pub fn add_attribute(&mut self, key: impl Into<String>, value: impl Into<String>) {
        self.attributes.insert(key.into(), value.into());
        self.markup = None;
    }

    /// Add a child element
    pub fn add_child(&mut self, child: ElementNode) {
        self.children.push(child);
        self.markup = None;
    }

    /// Get attribute value by key
    pub fn get_attribute(&self, key: &str) -> Option<&String> {
        self.attributes.get(key)
    }

    /// Check if element has a specific class
    pub fn has_class(&self, class_name: &str) -> bool {
        if let Some(classes) = self.attributes.get("class") {
            classes.split_whitespace().any(|c| c == class_name)
        } else {
            false
        }
    }

    /// Get element ID
    pub fn id(&self) -> Option<&String> {
        self.attributes.get("id")
    }

    /// Check if element is a specific tag
    pub fn is_tag(&self, tag: &str) -> bool {
        self.tag_name.eq_ignore_ascii_case(tag)
    }

    /// Visible label of the element, whitespace collapsed.
    ///
    /// Inputs are labelled by their `value`, everything else by its text content.
    pub fn label(&self) -> String {
        let raw = if self.is_tag("input") {
            self.get_attribute("value").map(String::as_str).unwrap_or("")
        } else {
            self.text_content.as_deref().unwrap_or("")
        };
        raw.split_whitespace().collect::<Vec<_>>().join(" ")
    }

    /// CSS selector addressing this exact element on the live page
    pub fn ref_selector(&self) -> Option<String> {
        self.node_ref.map(|r| format!("[{}=\"{}\"]", REF_ATTRIBUTE, r))
    }

    /// Parse the outer HTML of one element, as captured from a live page
    pub fn from_html(html: &str) -> Result<Self> {
        let fragment = Html::parse_fragment(html);
        fragment_root(&fragment)
            .map(Self::from_element)
            .ok_or_else(|| WatchError::DomParseFailed(format!("No element in snapshot markup: {:.80}", html)))
    }

    /// Snapshot of a parsed element; page handles and visibility are read back from their attributes
    pub fn from_element(element: ElementRef<'_>) -> Self {
        let mut node = Self::build(element);
        node.markup = Some(element.html());
        node
    }

    fn build(element: ElementRef<'_>) -> Self {
        let mut node = Self::new(element.value().name());
        for (name, value) in element.value().attrs() {
            match name {
                REF_ATTRIBUTE => node.node_ref = value.parse().ok(),
                VISIBLE_ATTRIBUTE => node.is_visible = value == "true",
                _ => node.add_attribute(name, value),
            }
        }

        let mut text = String::new();
        collect_text(element, &mut text);
        if !text.trim().is_empty() {
            node.text_content = Some(text);
        }

        node.children = element
            .children()
            .filter_map(ElementRef::wrap)
            .filter(|child| !SKIPPED_TAGS.contains(&child.value().name()))
            .map(Self::build)
            .collect();
        node
    }

    /// HTML for this snapshot, with handles and visibility as attributes
    pub fn to_html(&self) -> String {
        if let Some(markup) = &self.markup {
            return markup.clone();
        }
        let mut out = String::new();
        self.write_html(&mut out);
        out
    }

    fn write_html(&self, out: &mut String) {
        out.push('<');
        out.push_str(&self.tag_name);
        let mut names: Vec<&String> = self.attributes.keys().collect();
        names.sort();
        for name in names {
            out.push_str(&format!(" {}=\"{}\"", name, escape(&self.attributes[name])));
        }
        if let Some(node_ref) = self.node_ref {
            out.push_str(&format!(" {}=\"{}\"", REF_ATTRIBUTE, node_ref));
        }
        if self.is_visible {
            out.push_str(&format!(" {}=\"true\"", VISIBLE_ATTRIBUTE));
        }
        out.push('>');
        if VOID_TAGS.contains(&self.tag_name.as_str()) {
            return;
        }

        if self.children.is_empty() {
            if let Some(text) = &self.text_content {
                out.push_str(&escape(text));
            }
        } else {
            for child in &self.children {
                child.write_html(out);
            }
        }
        out.push_str(&format!("</{}>", self.tag_name));
    }

    /// Parsed form of [`Self::to_html`], for selector evaluation
    pub fn to_fragment(&self) -> Html {
        Html::parse_fragment(&self.to_html())
    }

    /// Short one-line description for logs
    pub fn to_simple_string(&self) -> String {
        let mut parts = vec![format!("<{}", self.tag_name)];

        if let Some(id) = self.id() {
            parts.push(format!(" id=\"{}\"", id));
        }

        if let Some(class) = self.attributes.get("class") {
            parts.push(format!(" class=\"{}\"", class));
        }

        if let Some(node_ref) = self.node_ref {
            parts.push(format!(" {}=\"{}\"", REF_ATTRIBUTE, node_ref));
        }

        parts.push(">".to_string());

        let label = self.label();
        if !label.is_empty() {
            parts.push(label);
        }

        parts.join("")
    }
}

/// First element of a parsed fragment
pub fn fragment_root(fragment: &Html) -> Option<ElementRef<'_>> {
    fragment.root_element().children().find_map(ElementRef::wrap)
}

fn collect_text(element: ElementRef<'_>, out: &mut String) {
    for child in element.children() {
        match child.value() {
            Node::Text(text) => out.push_str(text),
            Node::Element(el) if !SKIPPED_TAGS.contains(&el.name()) => {
                if let Some(child) = ElementRef::wrap(child) {
                    collect_text(child, out);
                }
            }
            _ => {}
        }
    }
}

fn escape(text: &str) -> String {
    text.replace('&', "&amp;").replace('<', "&lt;").replace('>', "&gt;").replace('"', "&quot;")
}
