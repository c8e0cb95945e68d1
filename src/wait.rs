//! Bounded waits
//!
//! Every suspension point in the engine goes through here and carries an
//! explicit timeout, so a hung page fails the step instead of the run.

use crate::dom::ElementNode;
use crate::error::{Result, WatchError};
use crate::locator::Locator;
use crate::page::Page;
use std::time::{Duration, Instant};

/// Default per-step timeout (15 seconds)
pub const DEFAULT_STEP_TIMEOUT: Duration = Duration::from_secs(15);

/// Timeout for slow, network-bound steps (20 seconds)
pub const LONG_STEP_TIMEOUT: Duration = Duration::from_secs(20);

/// Default polling interval (100ms)
pub const DEFAULT_POLL_INTERVAL: Duration = Duration::from_millis(100);

/// Wait until `locator` accepts an element under `scope`, returning the first one in document order
pub fn wait_for<P: Page + ?Sized>(
    page: &P,
    scope: Option<&ElementNode>,
    locator: &Locator,
    timeout: Duration,
) -> Result<ElementNode> {
    let deadline = Instant::now() + timeout;
    loop {
        let nodes = page.query(scope, locator.selector().as_str())?;
        if let Some(node) = locator.first(nodes).into_option() {
            return Ok(node);
        }

        let now = Instant::now();
        if now >= deadline {
            return Err(WatchError::Timeout { what: locator.to_string(), timeout_ms: timeout.as_millis() as u64 });
        }
        std::thread::sleep(DEFAULT_POLL_INTERVAL.min(deadline - now));
    }
}
