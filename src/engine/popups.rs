use crate::error::Result;
use crate::locator::{Locator, Lookup};
use crate::page::{ClickMode, Page};
use crate::profile::PopupSelectors;

/// What to do with generic close buttons found on the page
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default)]
pub struct PopupPolicy {
    /// Click visible overlay close controls too; otherwise they are only reported
    pub dismiss_overlays: bool,
}

/// Summary of one dismissal pass
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default)]
pub struct Dismissed {
    pub consent_accepted: bool,
    pub overlays_seen: usize,
    pub overlays_closed: usize,
}

/// Best-effort closing of consent banners and promotional overlays
#[derive(Debug, Clone)]
pub struct PopupDismisser {
    consent: Locator,
    overlay_close: Locator,
    policy: PopupPolicy,
}

impl PopupDismisser {
    pub fn new(selectors: &PopupSelectors, policy: PopupPolicy) -> Result<Self> {
        Ok(Self {
            consent: Locator::any_of(selectors.consent.as_slice())?,
            overlay_close: Locator::any_of(selectors.overlay_close.as_slice())?.visible(),
            policy,
        })
    }

    /// Accept the cookie banner if there is one. Absence is not an error.
    pub fn dismiss<P: Page + ?Sized>(&self, page: &P) -> Result<Dismissed> {
        let mut outcome = Dismissed::default();

        // Consent banners often sit on top of other elements, so the click is forced.
        if let Lookup::Found(button) = self.consent.first(page.query(None, self.consent.selector().as_str())?) {
            log::debug!("Accepting cookie consent via {}", button.to_simple_string());
            page.click(&button, ClickMode::Forced)?;
            outcome.consent_accepted = true;
        }

        let overlays: Vec<_> = page
            .query(None, self.overlay_close.selector().as_str())?
            .into_iter()
            .filter(|n| self.overlay_close.accepts(n))
            .collect();
        outcome.overlays_seen = overlays.len();

        if self.policy.dismiss_overlays {
            for close in &overlays {
                page.click(close, ClickMode::Forced)?;
                outcome.overlays_closed += 1;
            }
        } else if !overlays.is_empty() {
            log::debug!("Leaving {} overlay close control(s) untouched", overlays.len());
        }

        Ok(outcome)
    }
}
