use serde::{Deserialize, Serialize};
use thiserror::Error;

/// Result type alias for bestseller-watch operations
pub type Result<T> = std::result::Result<T, WatchError>;

/// Errors raised by the browser layer and the navigation/extraction engine
#[derive(Error, Debug)]
pub enum WatchError {
    /// The region indicator never became visible
    #[error("Could not find the delivery region indicator after {retries} reload retries")]
    PreconditionNotEstablished { retries: u32 },

    /// The destination listing request was not observed in time
    #[error("Navigation could not be confirmed: no response matching '{pattern}' within {timeout_ms}ms")]
    NavigationUnconfirmed { pattern: String, timeout_ms: u64 },

    /// The Best Sellers card did not render enough priced items
    #[error("Expected at least {required} items with a price in the Best Sellers card, found {found}")]
    TooFewPricedItems { found: usize, required: usize },

    /// A candidate was selected but its price could not be read
    #[error("Best Seller item #{position} has no visible price")]
    MissingPrice { position: usize },

    /// The extracted price is above the configured threshold
    #[error("2nd Best Seller price (${price:.2}) expected to be at most {threshold}")]
    ThresholdExceeded { price: f64, threshold: f64 },

    #[error("Timed out after {timeout_ms}ms waiting for {what}")]
    Timeout { what: String, timeout_ms: u64 },

    #[error("Element not found: {0}")]
    ElementNotFound(String),

    #[error("Invalid selector: {0}")]
    InvalidSelector(String),

    #[error("Invalid text pattern: {0}")]
    InvalidPattern(String),

    /// An uncaught script error that is not on the benign list
    #[error("Uncaught page error: {message}")]
    UncaughtPageError { message: String, origin: Option<String> },

    #[error("Failed to launch browser: {0}")]
    LaunchFailed(String),

    #[error("Failed to connect to browser: {0}")]
    ConnectionFailed(String),

    #[error("Navigation failed: {0}")]
    NavigationFailed(String),

    #[error("JavaScript evaluation failed: {0}")]
    EvaluationFailed(String),

    #[error("Failed to parse DOM snapshot: {0}")]
    DomParseFailed(String),

    #[error("Configuration error: {0}")]
    Config(String),

    #[error("IO error: {0}")]
    Io(#[from] std::io::Error),

    #[error("JSON error: {0}")]
    Json(#[from] serde_json::Error),
}

/// Coarse classification of a failure, used by the run report
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum ErrorKind {
    Precondition,
    NavigationConfirmation,
    ExtractionStructure,
    ExtractionValue,
    Assertion,
    PageScript,
    Timeout,
    Browser,
    Config,
}

impl WatchError {
    /// Classify this error
    pub fn kind(&self) -> ErrorKind {
        match self {
            Self::PreconditionNotEstablished { .. } => ErrorKind::Precondition,
            Self::NavigationUnconfirmed { .. } => ErrorKind::NavigationConfirmation,
            Self::TooFewPricedItems { .. } => ErrorKind::ExtractionStructure,
            Self::MissingPrice { .. } => ErrorKind::ExtractionValue,
            Self::ThresholdExceeded { .. } => ErrorKind::Assertion,
            Self::UncaughtPageError { .. } => ErrorKind::PageScript,
            Self::Timeout { .. } => ErrorKind::Timeout,
            Self::InvalidSelector(_) | Self::InvalidPattern(_) | Self::Config(_) => ErrorKind::Config,
            Self::ElementNotFound(_)
            | Self::LaunchFailed(_)
            | Self::ConnectionFailed(_)
            | Self::NavigationFailed(_)
            | Self::EvaluationFailed(_)
            | Self::DomParseFailed(_)
            | Self::Io(_)
            | Self::Json(_) => ErrorKind::Browser,
        }
    }
}
