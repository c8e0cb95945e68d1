use crate::error::{Result, WatchError};
use crate::locator::{Locator, Lookup};
use crate::page::{ClickMode, Page};
use crate::profile::LocationSelectors;
use crate::wait;
use std::time::Duration;

/// Default number of reload retries
pub const DEFAULT_LOCATION_RETRIES: u32 = 2;

/// How long a recovery may take to land before it counts as failed
pub const DEFAULT_SETTLE_TIMEOUT: Duration = Duration::from_secs(5);

/// Steps of the resolver loop
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
enum ResolveState {
    Checking,
    Recovering,
    Reloading,
    Exhausted,
}

/// What it took to get the indicator on screen
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default)]
pub struct Resolution {
    pub recoveries: u32,
    pub reloads: u32,
}

/// Makes sure the "deliver to" region indicator is visible before anything locale-dependent runs
#[derive(Debug, Clone)]
pub struct LocationResolver {
    indicator: Locator,
    home: Locator,
    base_url: String,
    retries: u32,
    settle_timeout: Duration,
}

impl LocationResolver {
    pub fn new(selectors: &LocationSelectors, base_url: impl Into<String>) -> Result<Self> {
        Ok(Self {
            indicator: Locator::css(&selectors.indicator)?.visible(),
            home: Locator::any_of(selectors.home_links.as_slice())?.visible(),
            base_url: base_url.into(),
            retries: DEFAULT_LOCATION_RETRIES,
            settle_timeout: DEFAULT_SETTLE_TIMEOUT,
        })
    }

    /// Builder method: set the number of reload retries
    pub fn with_retries(mut self, retries: u32) -> Self {
        self.retries = retries;
        self
    }

    /// Builder method: bound for the indicator to show up after going home
    pub fn with_settle_timeout(mut self, timeout: Duration) -> Self {
        self.settle_timeout = timeout;
        self
    }

    /// Idempotent: when the indicator is already visible nothing is touched.
    ///
    /// Otherwise go home (logo link, or a direct visit), wait for the indicator
    /// to land, and reload while retries remain. Running out of retries is fatal.
    pub fn ensure<P: Page + ?Sized>(&self, page: &P) -> Result<Resolution> {
        let mut resolution = Resolution::default();
        let mut retries_left = self.retries;
        let mut state = ResolveState::Checking;

        loop {
            state = match state {
                ResolveState::Checking => {
                    if self.indicator_visible(page)? {
                        return Ok(resolution);
                    }
                    ResolveState::Recovering
                }
                ResolveState::Recovering => {
                    self.go_home(page)?;
                    resolution.recoveries += 1;
                    if self.indicator_settles(page)? {
                        return Ok(resolution);
                    }
                    if retries_left > 0 { ResolveState::Reloading } else { ResolveState::Exhausted }
                }
                ResolveState::Reloading => {
                    log::warn!("\"Deliver to\" still missing, reloading (retries left: {})", retries_left);
                    page.reload()?;
                    resolution.reloads += 1;
                    retries_left -= 1;
                    ResolveState::Checking
                }
                ResolveState::Exhausted => {
                    return Err(WatchError::PreconditionNotEstablished { retries: self.retries });
                }
            };
        }
    }

    fn indicator_visible<P: Page + ?Sized>(&self, page: &P) -> Result<bool> {
        Ok(self.indicator.first(page.query(None, self.indicator.selector().as_str())?).is_found())
    }

    // A logo click navigates asynchronously; checking once would still see the old document.
    fn indicator_settles<P: Page + ?Sized>(&self, page: &P) -> Result<bool> {
        match wait::wait_for(page, None, &self.indicator, self.settle_timeout) {
            Ok(_) => Ok(true),
            Err(WatchError::Timeout { .. }) => Ok(false),
            Err(e) => Err(e),
        }
    }

    fn go_home<P: Page + ?Sized>(&self, page: &P) -> Result<()> {
        match self.home.first(page.query(None, self.home.selector().as_str())?) {
            Lookup::Found(logo) => page.click(&logo, ClickMode::Forced),
            Lookup::NotFound => {
                log::debug!("No home link visible, visiting {}", self.base_url);
                page.visit(&self.base_url)
            }
        }
    }
}
