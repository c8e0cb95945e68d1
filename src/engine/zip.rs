use crate::error::Result;
use crate::locator::{Locator, Lookup, TextPattern, first_labelled};
use crate::page::{ClickMode, Page};
use crate::profile::ZipSelectors;
use crate::wait::{self, LONG_STEP_TIMEOUT};
use std::time::Duration;

/// Default delivery code
pub const DEFAULT_ZIP: &str = "72716";

/// Which affordance closed the region modal
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum ModalExit {
    /// A confirm control, by its label
    Confirmed(String),
    /// The close icon
    Closed,
    /// Nothing to click; the modal is assumed to have closed on submit
    AutoClosed,
}

/// Drives the delivery-region modal to a postal code
#[derive(Debug, Clone)]
pub struct ZipSetter {
    entry: Locator,
    modal: Locator,
    input: Locator,
    controls: Locator,
    confirm_labels: Vec<TextPattern>,
    close: Locator,
    timeout: Duration,
}

impl ZipSetter {
    pub fn new(selectors: &ZipSelectors) -> Result<Self> {
        Ok(Self {
            entry: Locator::css(&selectors.entry)?.visible(),
            modal: Locator::any_of(selectors.modal.as_slice())?.visible(),
            input: Locator::any_of(selectors.input.as_slice())?.visible(),
            controls: Locator::any_of(selectors.controls.as_slice())?,
            confirm_labels: selectors.confirm_labels.iter().map(|p| TextPattern::regex(p)).collect::<Result<_>>()?,
            close: Locator::any_of(selectors.close.as_slice())?.visible(),
            timeout: LONG_STEP_TIMEOUT,
        })
    }

    /// Builder method: bound for the entry point, modal and input to appear
    pub fn with_timeout(mut self, timeout: Duration) -> Self {
        self.timeout = timeout;
        self
    }

    /// Open the modal, submit `zip`, close the modal however this page variant allows, then reload
    pub fn set<P: Page + ?Sized>(&self, page: &P, zip: &str) -> Result<ModalExit> {
        let entry = wait::wait_for(page, None, &self.entry, self.timeout)?;
        page.click(&entry, ClickMode::Forced)?;

        let modal = wait::wait_for(page, None, &self.modal, self.timeout)?;
        let input = wait::wait_for(page, Some(&modal), &self.input, self.timeout)?;
        page.clear(&input)?;
        page.type_text(&input, zip)?;
        page.press_enter(&input)?;

        let exit = self.leave_modal(page)?;
        log::info!("Delivery zip set to {} ({:?})", zip, exit);

        page.reload()?;
        Ok(exit)
    }

    // Confirm labels differ between page variants and the modal may already be
    // gone after submit, so every miss here falls through to the next option.
    fn leave_modal<P: Page + ?Sized>(&self, page: &P) -> Result<ModalExit> {
        let controls = page.query(None, self.controls.selector().as_str())?;
        if let Lookup::Found(button) = first_labelled(&controls, &self.confirm_labels) {
            page.click(button, ClickMode::Forced)?;
            return Ok(ModalExit::Confirmed(button.label()));
        }

        match self.close.first(page.query(None, self.close.selector().as_str())?) {
            Lookup::Found(close) => {
                page.click(&close, ClickMode::Forced)?;
                Ok(ModalExit::Closed)
            }
            Lookup::NotFound => {
                log::debug!("No confirm or close control after zip submit");
                Ok(ModalExit::AutoClosed)
            }
        }
    }
}
