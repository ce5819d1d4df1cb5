//! Unified error handling for the work item client.
//!
//! This module provides the error taxonomy using `thiserror`. Every failure
//! that reaches a caller is one of these kinds, carrying the original
//! diagnostic text, so callers can decide whether to retry, prompt for new
//! credentials, or treat a lookup as empty.
//!
//! ## Error Categories
//!
//! - [`Error::Config`]: invalid or missing settings, raised at construction
//! - [`Error::NotFound`]: the addressed work item does not exist
//! - [`Error::Validation`]: malformed request shape, bad field, bad payload
//! - [`Error::Permission`]: authentication or authorization rejected
//! - [`Error::Transient`]: network/timeout/5xx failure after retries

use thiserror::Error;

/// The main error type for the work item client library.
#[derive(Error, Debug)]
pub enum Error {
    /// A configuration value is missing or invalid.
    ///
    /// Raised at client construction or settings loading. Fatal — retrying
    /// cannot help until the configuration is fixed.
    #[error("Configuration error: {message}")]
    Config {
        /// Description of the configuration problem.
        message: String,
    },

    /// The addressed work item does not exist (404).
    #[error("Not found: {resource}")]
    NotFound {
        /// Description of the resource that was not found.
        resource: String,
    },

    /// The request or payload shape was rejected.
    ///
    /// Covers malformed WIQL, unknown field names, empty mandatory fields,
    /// and payloads that fail model validation.
    #[error("Validation error: {message}")]
    Validation {
        /// Diagnostic message, from the service where available.
        message: String,
    },

    /// Authentication or authorization was rejected (401/403).
    #[error("Permission denied ({status}): {message}")]
    Permission {
        /// HTTP status code returned by the service.
        status: u16,
        /// Error message from the service.
        message: String,
    },

    /// A transient failure persisted after all retries were exhausted.
    ///
    /// Covers connection errors, timeouts, and server-side (5xx) responses.
    #[error("Transient failure after {attempts} attempt(s): {message}")]
    Transient {
        /// Number of attempts made before giving up.
        attempts: u32,
        /// The last underlying cause.
        message: String,
    },
}

impl Error {
    /// Shorthand for a configuration error.
    pub fn config(message: impl Into<String>) -> Self {
        Self::Config {
            message: message.into(),
        }
    }

    /// Shorthand for a validation error.
    pub fn validation(message: impl Into<String>) -> Self {
        Self::Validation {
            message: message.into(),
        }
    }

    /// Shorthand for a not-found error.
    pub fn not_found(resource: impl Into<String>) -> Self {
        Self::NotFound {
            resource: resource.into(),
        }
    }
}

/// Type alias for Results using the library error type.
pub type Result<T> = std::result::Result<T, Error>;

#[cfg(test)]
mod tests {
    use super::*;

    /// # Error Display
    ///
    /// Tests that each error kind displays a clear, informative message.
    ///
    /// ## Test Scenario
    /// - Creates one instance of every variant
    /// - Checks the Display output
    ///
    /// ## Expected Outcome
    /// - Each message names its kind and carries the diagnostic text
    #[test]
    fn test_error_display() {
        let config = Error::config("AZURE_DEVOPS_PAT is required");
        assert!(config.to_string().contains("Configuration error"));
        assert!(config.to_string().contains("AZURE_DEVOPS_PAT"));

        let not_found = Error::not_found("work item 999999");
        assert!(not_found.to_string().contains("work item 999999"));

        let validation = Error::validation("missing mandatory field: System.Title");
        assert!(validation.to_string().contains("System.Title"));

        let permission = Error::Permission {
            status: 401,
            message: "invalid or expired Personal Access Token".to_string(),
        };
        assert!(permission.to_string().contains("401"));
        assert!(permission.to_string().contains("Personal Access Token"));

        let transient = Error::Transient {
            attempts: 4,
            message: "HTTP 503: Service Unavailable".to_string(),
        };
        assert!(transient.to_string().contains("4 attempt(s)"));
        assert!(transient.to_string().contains("503"));
    }

    /// # Error Kind Discrimination
    ///
    /// Tests that callers can branch on the error kind.
    ///
    /// ## Test Scenario
    /// - Builds errors through the shorthand constructors
    /// - Matches on the resulting variants
    ///
    /// ## Expected Outcome
    /// - Each constructor produces its corresponding variant
    #[test]
    fn test_error_kind_discrimination() {
        assert!(matches!(Error::config("x"), Error::Config { .. }));
        assert!(matches!(Error::validation("x"), Error::Validation { .. }));
        assert!(matches!(Error::not_found("x"), Error::NotFound { .. }));
    }
}
