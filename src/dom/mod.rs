//! DOM snapshots and selector evaluation
//!
//! Pages hand back [`ElementNode`] snapshots: a matched element plus its subtree,
//! visibility and a handle for follow-up actions. Live pages capture them as
//! outer HTML which is parsed with `scraper`; [`CssSelector`] evaluates the same
//! selectors the engine sends to the browser against those snapshots, so
//! structural decisions (candidate filtering, price lookup) happen in plain Rust.

pub mod css;
pub mod element;

pub use css::CssSelector;
pub use element::{ElementNode, REF_ATTRIBUTE, VISIBLE_ATTRIBUTE, fragment_root};
