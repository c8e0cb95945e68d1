//! In-memory page for driving the engine without a browser
#![allow(dead_code)]

use bestseller_watch::dom::{ElementNode, REF_ATTRIBUTE};
use bestseller_watch::network::{NetworkWatch, UrlPattern};
use bestseller_watch::page::{ClickMode, CookieRecord, Page, PageError};
use bestseller_watch::{CssSelector, Result, WatchError};
use scraper::{ElementRef, Html};
use std::cell::{Cell, RefCell};
use std::collections::VecDeque;
use std::sync::mpsc::{self, Sender};

/// Clicking an element carrying this attribute loads the next document
pub const NAVIGATE_ATTR: &str = "data-fake-navigate";

/// Like [`NAVIGATE_ATTR`], but the next document lands only after the given number of further queries
pub const LATE_NAVIGATE_ATTR: &str = "data-fake-navigate-late";

/// Clicking an element carrying this attribute completes a request to its value
pub const REQUEST_ATTR: &str = "data-fake-request";

pub const LISTING_URL: &str = "https://www.amazon.com/gp/browse.html?node=1266092011&ref_=nav_em_tv";

#[derive(Debug, Clone, PartialEq)]
pub enum Action {
    Visit(String),
    Reload,
    Click(String, ClickMode),
    Clear(String),
    Type(String, String),
    Enter(String),
    Scroll(String),
    SetCookie(String),
    InjectStyle,
    Observe(String),
}

/// Scripted page: every load (visit, reload, navigating click) shows the next
/// document of the script, the last one repeating forever.
pub struct FakePage {
    upcoming: RefCell<VecDeque<ElementNode>>,
    current: RefCell<ElementNode>,
    next_ref: Cell<u64>,
    pending_load: Cell<Option<u32>>,
    actions: RefCell<Vec<Action>>,
    cookies: RefCell<Vec<CookieRecord>>,
    watchers: RefCell<Vec<Sender<String>>>,
    page_errors: RefCell<Vec<PageError>>,
}

impl FakePage {
    pub fn new(document: ElementNode) -> Self {
        Self::with_documents(vec![document])
    }

    /// The first document is already loaded
    pub fn with_documents(documents: Vec<ElementNode>) -> Self {
        assert!(!documents.is_empty(), "a fake page needs at least one document");
        let page = Self {
            upcoming: RefCell::new(documents.into()),
            current: RefCell::new(ElementNode::new("html")),
            next_ref: Cell::new(1),
            pending_load: Cell::new(None),
            actions: RefCell::new(Vec::new()),
            cookies: RefCell::new(Vec::new()),
            watchers: RefCell::new(Vec::new()),
            page_errors: RefCell::new(Vec::new()),
        };
        page.load();
        page
    }

    /// Cookie already present before the engine touches the page
    pub fn seed_cookie(&self, cookie: CookieRecord) {
        self.cookies.borrow_mut().push(cookie);
    }

    pub fn push_page_error(&self, error: PageError) {
        self.page_errors.borrow_mut().push(error);
    }

    pub fn actions(&self) -> Vec<Action> {
        self.actions.borrow().clone()
    }

    pub fn reloads(&self) -> usize {
        self.actions.borrow().iter().filter(|a| matches!(a, Action::Reload)).count()
    }

    pub fn visits(&self) -> usize {
        self.actions.borrow().iter().filter(|a| matches!(a, Action::Visit(_))).count()
    }

    pub fn clicked(&self, target: &str) -> bool {
        self.actions.borrow().iter().any(|a| matches!(a, Action::Click(t, _) if t == target))
    }

    pub fn typed(&self) -> Vec<String> {
        self.actions
            .borrow()
            .iter()
            .filter_map(|a| match a {
                Action::Type(_, text) => Some(text.clone()),
                _ => None,
            })
            .collect()
    }

    fn record(&self, action: Action) {
        self.actions.borrow_mut().push(action);
    }

    fn load(&self) {
        self.pending_load.set(None);
        let next = {
            let mut upcoming = self.upcoming.borrow_mut();
            if upcoming.len() > 1 { upcoming.pop_front() } else { upcoming.front().cloned() }
        };
        if let Some(mut document) = next {
            self.stamp(&mut document);
            *self.current.borrow_mut() = document;
        }
    }

    // Fresh refs per load, so snapshots of an old document no longer resolve.
    fn stamp(&self, node: &mut ElementNode) {
        node.node_ref = Some(self.next_ref.get());
        self.next_ref.set(self.next_ref.get() + 1);
        for child in &mut node.children {
            self.stamp(child);
        }
    }

    fn land_pending_navigation(&self) {
        match self.pending_load.get() {
            Some(remaining) if remaining <= 1 => self.load(),
            Some(remaining) => self.pending_load.set(Some(remaining - 1)),
            None => {}
        }
    }

    /// The current document as the browser would parse it
    fn parsed(&self) -> Html {
        self.land_pending_navigation();
        Html::parse_document(&self.current.borrow().to_html())
    }

    fn resolve(&self, node: &ElementNode) -> Result<ElementNode> {
        let document = self.current.borrow();
        node.node_ref
            .and_then(|r| find_node(&document, r))
            .cloned()
            .ok_or_else(|| WatchError::ElementNotFound(format!("{} is detached", node.to_simple_string())))
    }
}

fn find_ref(root: ElementRef<'_>, node_ref: u64) -> Option<ElementRef<'_>> {
    let wanted = node_ref.to_string();
    root.descendants().filter_map(ElementRef::wrap).find(|e| e.value().attr(REF_ATTRIBUTE) == Some(wanted.as_str()))
}

fn find_node(root: &ElementNode, node_ref: u64) -> Option<&ElementNode> {
    if root.node_ref == Some(node_ref) {
        return Some(root);
    }
    root.children.iter().find_map(|child| find_node(child, node_ref))
}

fn describe(node: &ElementNode) -> String {
    node.id().cloned().unwrap_or_else(|| node.label())
}

impl Page for FakePage {
    fn visit(&self, url: &str) -> Result<()> {
        self.record(Action::Visit(url.to_string()));
        self.load();
        Ok(())
    }

    fn reload(&self) -> Result<()> {
        self.record(Action::Reload);
        self.load();
        Ok(())
    }

    fn query(&self, scope: Option<&ElementNode>, selector: &str) -> Result<Vec<ElementNode>> {
        let selector = CssSelector::parse(selector)?;
        let html = self.parsed();
        let root = html.root_element();
        let found: Vec<ElementRef<'_>> = match scope {
            None => std::iter::once(root).filter(|r| selector.matches(r)).chain(selector.select_in(root)).collect(),
            Some(node) => match node.node_ref.and_then(|r| find_ref(root, r)) {
                Some(scope) => selector.select_in(scope).collect(),
                None => Vec::new(),
            },
        };
        Ok(found.into_iter().map(ElementNode::from_element).collect())
    }

    fn closest(&self, node: &ElementNode, selector: &str) -> Result<Option<ElementNode>> {
        let selector = CssSelector::parse(selector)?;
        let html = self.parsed();
        let Some(element) = node.node_ref.and_then(|r| find_ref(html.root_element(), r)) else {
            return Ok(None);
        };
        Ok(std::iter::once(element)
            .chain(element.ancestors().filter_map(ElementRef::wrap))
            .find(|candidate| selector.matches(candidate))
            .map(ElementNode::from_element))
    }

    fn click(&self, node: &ElementNode, mode: ClickMode) -> Result<()> {
        let live = self.resolve(node)?;
        if mode == ClickMode::Pointer && !live.is_visible {
            return Err(WatchError::ElementNotFound(format!("{} is not visible", live.to_simple_string())));
        }
        self.record(Action::Click(describe(&live), mode));

        if let Some(url) = live.get_attribute(REQUEST_ATTR) {
            for watcher in self.watchers.borrow().iter() {
                let _ = watcher.send(url.clone());
            }
        }
        if live.get_attribute(NAVIGATE_ATTR).is_some() {
            self.load();
        }
        if let Some(queries) = live.get_attribute(LATE_NAVIGATE_ATTR) {
            self.pending_load.set(Some(queries.parse().unwrap_or(1)));
        }
        Ok(())
    }

    fn clear(&self, node: &ElementNode) -> Result<()> {
        let live = self.resolve(node)?;
        self.record(Action::Clear(describe(&live)));
        Ok(())
    }

    fn type_text(&self, node: &ElementNode, text: &str) -> Result<()> {
        let live = self.resolve(node)?;
        self.record(Action::Type(describe(&live), text.to_string()));
        Ok(())
    }

    fn press_enter(&self, node: &ElementNode) -> Result<()> {
        let live = self.resolve(node)?;
        self.record(Action::Enter(describe(&live)));
        Ok(())
    }

    fn scroll_into_view(&self, node: &ElementNode) -> Result<()> {
        let live = self.resolve(node)?;
        self.record(Action::Scroll(describe(&live)));
        Ok(())
    }

    fn set_cookie(&self, cookie: &CookieRecord) -> Result<()> {
        self.record(Action::SetCookie(cookie.name.clone()));
        let mut cookies = self.cookies.borrow_mut();
        cookies.retain(|c| c.name != cookie.name);
        cookies.push(cookie.clone());
        Ok(())
    }

    fn cookies(&self) -> Result<Vec<CookieRecord>> {
        Ok(self.cookies.borrow().clone())
    }

    fn inject_style(&self, _css: &str) -> Result<()> {
        self.record(Action::InjectStyle);
        Ok(())
    }

    fn observe_network(&self, pattern: &UrlPattern) -> Result<NetworkWatch> {
        self.record(Action::Observe(pattern.to_string()));
        let (sender, receiver) = mpsc::channel();
        self.watchers.borrow_mut().push(sender);
        Ok(NetworkWatch::new(pattern.clone(), receiver))
    }

    fn screenshot(&self) -> Result<Vec<u8>> {
        Ok(b"\x89PNG fake".to_vec())
    }

    fn drain_page_errors(&self) -> Result<Vec<PageError>> {
        Ok(std::mem::take(&mut *self.page_errors.borrow_mut()))
    }
}

// Fixtures shaped like the storefront markup the default profile targets.

pub fn shown(tag: &str) -> ElementNode {
    ElementNode::new(tag).with_visibility(true)
}

pub fn hidden(tag: &str) -> ElementNode {
    ElementNode::new(tag)
}

pub fn document(body: Vec<ElementNode>) -> ElementNode {
    shown("html").with_children(vec![shown("body").with_children(body)])
}

pub fn region_indicator() -> ElementNode {
    shown("a").with_attribute("id", "nav-global-location-popover-link").with_text("Deliver to Bentonville 72716")
}

pub fn home_logo() -> ElementNode {
    shown("a").with_attribute("id", "nav-logo-sprites").with_attribute(NAVIGATE_ATTR, "/")
}

/// Logo whose navigation lands only after `queries` more lookups
pub fn slow_home_logo(queries: u32) -> ElementNode {
    shown("a").with_attribute("id", "nav-logo-sprites").with_attribute(LATE_NAVIGATE_ATTR, queries.to_string())
}

pub fn consent_banner() -> ElementNode {
    shown("div")
        .with_attribute("id", "sp-cc")
        .with_children(vec![shown("input").with_attribute("id", "sp-cc-accept").with_attribute("value", "Accept")])
}

pub fn button(label: &str) -> ElementNode {
    shown("button").with_text(label)
}

pub fn submit_input(value: &str) -> ElementNode {
    shown("input").with_attribute("type", "submit").with_attribute("value", value)
}

pub fn close_icon() -> ElementNode {
    shown("button").with_attribute("id", "close-icon").with_attribute("aria-label", "Close")
}

pub fn zip_modal(controls: Vec<ElementNode>) -> ElementNode {
    let mut children = vec![shown("input").with_attribute("id", "GLUXZipUpdateInput").with_attribute("value", "")];
    children.extend(controls);
    shown("div").with_attribute("class", "a-popover-wrapper").with_children(children)
}

pub fn menu_item(label: &str) -> ElementNode {
    shown("a").with_attribute("class", "hmenu-item").with_text(label)
}

/// Hamburger toggle and panel; clicking "TV & Video" completes `request` when given
pub fn menu(request: Option<&str>) -> Vec<ElementNode> {
    let mut tv = menu_item("TV & Video");
    if let Some(url) = request {
        tv.add_attribute(REQUEST_ATTR, url);
    }
    vec![
        shown("a").with_attribute("id", "nav-hamburger-menu").with_text("All"),
        shown("div").with_attribute("id", "hmenu-content").with_children(vec![
            menu_item("Electronics Deals"),
            menu_item("See all"),
            menu_item("Electronics"),
            tv,
        ]),
    ]
}

pub fn price_widget(whole: &str, fraction: &str) -> ElementNode {
    shown("span").with_attribute("class", "a-price").with_children(vec![
        shown("span").with_attribute("class", "a-price-whole").with_text(whole),
        shown("span").with_attribute("class", "a-price-fraction").with_text(fraction),
    ])
}

/// Best Sellers card; `None` entries are items rendered without a price
pub fn best_sellers_card(prices: &[Option<(&str, &str)>]) -> ElementNode {
    let items = prices
        .iter()
        .enumerate()
        .map(|(i, price)| {
            let mut item = shown("li").with_attribute("data-asin", format!("B0TV{:04}", i + 1));
            if let Some((whole, fraction)) = price {
                item.add_child(price_widget(whole, fraction));
            }
            item
        })
        .collect();

    shown("div").with_attribute("class", "a-cardui octopus-pc-card").with_children(vec![
        shown("div")
            .with_attribute("class", "octopus-pc-card-title")
            .with_children(vec![shown("span").with_text("Best Sellers in TV & Video")]),
        shown("div")
            .with_attribute("class", "octopus-pc-card-content")
            .with_children(vec![shown("ul").with_children(items)]),
    ])
}

/// Whole storefront: consent banner, region indicator, zip modal, menu and a Best Sellers card
pub fn storefront(second_price: (&str, &str)) -> ElementNode {
    let mut body = vec![
        consent_banner(),
        home_logo(),
        region_indicator(),
        zip_modal(vec![button("Continue")]),
    ];
    body.extend(menu(Some(LISTING_URL)));
    body.push(best_sellers_card(&[Some(("$24.", "99")), Some(second_price), Some(("$9.", "99"))]));
    document(body)
}
