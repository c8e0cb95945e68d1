//! Navigation and extraction engine
//!
//! Each step is a small struct built from the [`crate::profile::SiteProfile`]
//! and driven against any [`crate::page::Page`]:
//!
//! - [`PopupDismisser`]: best-effort consent/overlay closing
//! - [`LocationResolver`]: bounded reload loop until the region indicator shows
//! - [`ZipSetter`]: the delivery-region modal
//! - [`MenuNavigator`]: flyout menu walk confirmed by a network exchange
//! - [`BestSellerExtractor`] + [`PriceParser`]: the priced item of the Best Sellers card
//! - [`SessionBootstrap`] + [`SessionStore`]: once-per-key locale setup

pub mod best_sellers;
pub mod bootstrap;
pub mod location;
pub mod menu;
pub mod popups;
pub mod price;
pub mod zip;

pub use best_sellers::{BestSellerExtractor, BestSellerPrice};
pub use bootstrap::{LocaleSession, SessionBootstrap, SessionOrigin, SessionStore};
pub use location::{DEFAULT_LOCATION_RETRIES, DEFAULT_SETTLE_TIMEOUT, LocationResolver, Resolution};
pub use menu::{MenuNavigator, NavigationTarget};
pub use popups::{Dismissed, PopupDismisser, PopupPolicy};
pub use price::{PriceFragment, PriceParser};
pub use zip::{DEFAULT_ZIP, ModalExit, ZipSetter};
