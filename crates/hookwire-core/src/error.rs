//! Error types for core domain operations.

use thiserror::Error;

/// Result type alias using `CoreError`.
pub type Result<T> = std::result::Result<T, CoreError>;

/// Core error type for domain-level failures.
#[derive(Debug, Clone, Error)]
pub enum CoreError {
    /// An event name did not match any known `EventKind`.
    #[error("unknown event kind: {0}")]
    UnknownEventKind(String),

    /// Input failed validation.
    #[error("invalid input: {0}")]
    InvalidInput(String),
}

/// Error returned by subscription registry lookups.
///
/// The dispatcher treats any registry failure as "no matching
/// subscriptions" rather than propagating it, so this type only needs to
/// carry enough context for logging.
#[derive(Debug, Clone, Error)]
#[error("subscription registry lookup failed: {message}")]
pub struct RegistryError {
    /// Description of the lookup failure.
    pub message: String,
}

impl RegistryError {
    /// Creates a registry error from a message.
    pub fn new(message: impl Into<String>) -> Self {
        Self { message: message.into() }
    }
}
