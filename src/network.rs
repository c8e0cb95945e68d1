//! Network observation primitives
//!
//! A [`NetworkWatch`] is armed before the interaction that triggers a request
//! and then blocks, with a deadline, until the page reports a completed
//! exchange whose URL matches the [`UrlPattern`].

use crate::error::{Result, WatchError};
use regex::Regex;
use serde::{Deserialize, Serialize};
use std::sync::mpsc::{Receiver, RecvTimeoutError};
use std::time::Duration;

/// Pattern for matching request URLs
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum UrlPattern {
    /// Glob over the whole URL: `**` crosses `/`, `*` does not, `?` is one character
    Glob(String),
    /// Regular expression searched anywhere in the URL
    Regex(String),
    /// Plain substring
    Contains(String),
}

impl UrlPattern {
    pub fn glob(pattern: impl Into<String>) -> Self {
        Self::Glob(pattern.into())
    }

    /// Check if a URL matches this pattern
    pub fn matches(&self, url: &str) -> bool {
        match self {
            Self::Glob(pattern) => Regex::new(&glob_to_regex(pattern)).map(|re| re.is_match(url)).unwrap_or(false),
            Self::Regex(pattern) => Regex::new(pattern).map(|re| re.is_match(url)).unwrap_or(false),
            Self::Contains(needle) => url.contains(needle.as_str()),
        }
    }

    /// Reject patterns that can never match because they do not compile
    pub fn validate(&self) -> Result<()> {
        let source = match self {
            Self::Glob(pattern) => glob_to_regex(pattern),
            Self::Regex(pattern) => pattern.clone(),
            Self::Contains(_) => return Ok(()),
        };
        Regex::new(&source).map(|_| ()).map_err(|e| WatchError::InvalidPattern(format!("{}: {}", self, e)))
    }
}

impl std::fmt::Display for UrlPattern {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        match self {
            Self::Glob(p) | Self::Regex(p) | Self::Contains(p) => f.write_str(p),
        }
    }
}

fn glob_to_regex(pattern: &str) -> String {
    let mut out = String::from("^");
    let mut chars = pattern.chars().peekable();
    while let Some(c) = chars.next() {
        match c {
            '*' if chars.peek() == Some(&'*') => {
                chars.next();
                out.push_str(".*");
            }
            '*' => out.push_str("[^/]*"),
            '?' => out.push('.'),
            other => out.push_str(&regex::escape(&other.to_string())),
        }
    }
    out.push('$');
    out
}

/// An armed observer for one matching network exchange
pub struct NetworkWatch {
    pattern: UrlPattern,
    receiver: Receiver<String>,
    on_drop: Option<Box<dyn FnOnce() + Send>>,
}

impl NetworkWatch {
    /// Wrap a channel fed with the URLs of completed exchanges
    pub fn new(pattern: UrlPattern, receiver: Receiver<String>) -> Self {
        Self { pattern, receiver, on_drop: None }
    }

    /// Builder method: run `cleanup` once the watch is finished with
    pub fn with_cleanup(mut self, cleanup: impl FnOnce() + Send + 'static) -> Self {
        self.on_drop = Some(Box::new(cleanup));
        self
    }

    pub fn pattern(&self) -> &UrlPattern {
        &self.pattern
    }

    /// Block until a matching exchange completes, returning its URL
    pub fn wait(self, timeout: Duration) -> Result<String> {
        let deadline = std::time::Instant::now() + timeout;
        loop {
            let remaining = deadline.saturating_duration_since(std::time::Instant::now());
            match self.receiver.recv_timeout(remaining) {
                Ok(url) if self.pattern.matches(&url) => {
                    log::debug!("Observed network exchange {}", url);
                    return Ok(url);
                }
                Ok(url) => log::debug!("Ignoring network exchange {}", url),
                Err(RecvTimeoutError::Timeout) | Err(RecvTimeoutError::Disconnected) => {
                    return Err(WatchError::NavigationUnconfirmed {
                        pattern: self.pattern.to_string(),
                        timeout_ms: timeout.as_millis() as u64,
                    });
                }
            }
        }
    }
}

impl Drop for NetworkWatch {
    fn drop(&mut self) {
        if let Some(cleanup) = self.on_drop.take() {
            cleanup();
        }
    }
}

impl std::fmt::Debug for NetworkWatch {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("NetworkWatch").field("pattern", &self.pattern).finish()
    }
}
