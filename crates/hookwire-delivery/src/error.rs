//! Error types for webhook delivery operations.
//!
//! Covers everything that can go wrong between the dispatcher and a
//! destination endpoint. Errors are captured into delivery records rather
//! than propagated; `is_retryable` encodes the retry contract.

use thiserror::Error;

/// Result type alias for delivery operations.
pub type Result<T> = std::result::Result<T, DeliveryError>;

/// Error conditions for webhook delivery.
#[derive(Debug, Clone, Error)]
pub enum DeliveryError {
    /// Network-level connectivity failure (DNS, connection refused, TLS).
    #[error("network error: {message}")]
    Network {
        /// Description of the transport failure.
        message: String,
    },

    /// HTTP request timeout exceeded.
    #[error("request timeout after {timeout_seconds}s")]
    Timeout {
        /// Seconds before the request timed out.
        timeout_seconds: u64,
    },

    /// The endpoint responded with a non-2xx status.
    #[error("endpoint returned HTTP {status_code}")]
    HttpStatus {
        /// HTTP status code of the response.
        status_code: u16,
    },

    /// Payload signing failed for this subscription.
    #[error("payload signing failed: {message}")]
    Signing {
        /// Description of the signing failure.
        message: String,
    },

    /// The delivery was interrupted by caller shutdown.
    #[error("delivery cancelled")]
    Cancelled,

    /// Invalid delivery client configuration.
    #[error("invalid delivery configuration: {message}")]
    Configuration {
        /// Description of the configuration problem.
        message: String,
    },
}

impl DeliveryError {
    /// Creates a network error from a message.
    pub fn network(message: impl Into<String>) -> Self {
        Self::Network { message: message.into() }
    }

    /// Creates a timeout error.
    pub fn timeout(timeout_seconds: u64) -> Self {
        Self::Timeout { timeout_seconds }
    }

    /// Creates an error for a non-2xx response.
    pub fn http_status(status_code: u16) -> Self {
        Self::HttpStatus { status_code }
    }

    /// Creates a signing error.
    pub fn signing(message: impl Into<String>) -> Self {
        Self::Signing { message: message.into() }
    }

    /// Creates a configuration error.
    pub fn configuration(message: impl Into<String>) -> Self {
        Self::Configuration { message: message.into() }
    }

    /// Whether this failure consumes retry budget and tries again.
    ///
    /// The delivery contract is "2xx = success, everything else retries":
    /// transport errors, timeouts, and every non-2xx status (4xx included)
    /// are retried. Signing failures, cancellation, and configuration
    /// problems cannot succeed on retry.
    pub fn is_retryable(&self) -> bool {
        match self {
            Self::Network { .. } | Self::Timeout { .. } | Self::HttpStatus { .. } => true,
            Self::Signing { .. } | Self::Cancelled | Self::Configuration { .. } => false,
        }
    }

    /// HTTP status code associated with this error, if any.
    pub fn status_code(&self) -> Option<u16> {
        match self {
            Self::HttpStatus { status_code } => Some(*status_code),
            _ => None,
        }
    }
}
