//! Configuration for the work item client.
//!
//! All settings are resolved once, up front, into an immutable [`Settings`]
//! bundle that is injected at client construction. Business logic never reads
//! the process environment directly, so the client can be exercised with
//! fabricated settings in tests.
//!
//! ## Example
//!
//! ```rust,no_run
//! use azdo_workitems::Settings;
//!
//! // Resolve from AZURE_DEVOPS_* environment variables
//! let settings = Settings::from_env().unwrap();
//!
//! // Or build explicitly (tests, embedding applications)
//! let settings = Settings::new("my-org", "my-project", "my-pat")
//!     .with_max_retries(5);
//! ```

use std::time::Duration;

use secrecy::{ExposeSecret, SecretString};

use crate::error::{Error, Result};

/// Default REST API version, matching the work item tracking endpoints.
pub const DEFAULT_API_VERSION: &str = "7.1-preview.3";
/// Default API version for the WIQL query endpoint.
pub const DEFAULT_WIQL_API_VERSION: &str = "7.1-preview.2";
/// Default per-request timeout.
pub const DEFAULT_TIMEOUT: Duration = Duration::from_secs(30);
/// Default maximum number of retries for transient failures.
pub const DEFAULT_MAX_RETRIES: u32 = 3;
/// Default exponential backoff factor, in seconds.
pub const DEFAULT_BACKOFF_FACTOR: f64 = 1.0;
/// Default service base URL. Overridable for Azure DevOps Server installs.
pub const DEFAULT_BASE_URL: &str = "https://dev.azure.com";

/// Immutable settings bundle for [`WorkItemClient`](crate::WorkItemClient).
///
/// The personal access token is the single mandatory credential; it is held
/// in a [`SecretString`] so it is never exposed through `Debug` output.
#[derive(Debug, Clone)]
pub struct Settings {
    /// Azure DevOps organization name.
    pub organization: String,
    /// Azure DevOps project name.
    pub project: String,
    /// Personal access token for authentication.
    pub pat: SecretString,
    /// REST API version for work item endpoints.
    pub api_version: String,
    /// API version for the WIQL query endpoint.
    pub wiql_api_version: String,
    /// Per-request timeout.
    pub timeout: Duration,
    /// Maximum number of retries for transient failures.
    pub max_retries: u32,
    /// Exponential backoff factor in seconds: delay = factor * 2^attempt.
    pub backoff_factor: f64,
    /// Whether to verify TLS certificates. Disable for debugging only.
    pub verify_tls: bool,
    /// Service base URL, without trailing slash.
    pub base_url: String,
}

impl Settings {
    /// Creates settings with the given connection identity and defaults for
    /// everything else.
    pub fn new(
        organization: impl Into<String>,
        project: impl Into<String>,
        pat: impl Into<String>,
    ) -> Self {
        Self {
            organization: organization.into(),
            project: project.into(),
            pat: SecretString::from(pat.into()),
            api_version: DEFAULT_API_VERSION.to_string(),
            wiql_api_version: DEFAULT_WIQL_API_VERSION.to_string(),
            timeout: DEFAULT_TIMEOUT,
            max_retries: DEFAULT_MAX_RETRIES,
            backoff_factor: DEFAULT_BACKOFF_FACTOR,
            verify_tls: true,
            base_url: DEFAULT_BASE_URL.to_string(),
        }
    }

    /// Resolves settings from `AZURE_DEVOPS_*` environment variables.
    ///
    /// `AZURE_DEVOPS_PAT` is required; `AZURE_DEVOPS_ORG` and
    /// `AZURE_DEVOPS_PROJECT` are required as well since the client cannot
    /// address the service without them. Everything else falls back to
    /// defaults.
    pub fn from_env() -> Result<Self> {
        let organization = require_env("AZURE_DEVOPS_ORG")?;
        let project = require_env("AZURE_DEVOPS_PROJECT")?;
        let pat = require_env("AZURE_DEVOPS_PAT")?;

        let mut settings = Self::new(organization, project, pat);

        if let Ok(v) = std::env::var("AZURE_DEVOPS_API_VERSION") {
            settings.api_version = v;
        }
        if let Ok(v) = std::env::var("AZURE_DEVOPS_WIQL_API_VERSION") {
            settings.wiql_api_version = v;
        }
        if let Ok(v) = std::env::var("AZURE_DEVOPS_TIMEOUT") {
            let secs: u64 = v.parse().map_err(|_| {
                Error::config(format!("AZURE_DEVOPS_TIMEOUT is not a valid number: {v}"))
            })?;
            settings.timeout = Duration::from_secs(secs);
        }
        if let Ok(v) = std::env::var("AZURE_DEVOPS_MAX_RETRIES") {
            settings.max_retries = v.parse().map_err(|_| {
                Error::config(format!(
                    "AZURE_DEVOPS_MAX_RETRIES is not a valid number: {v}"
                ))
            })?;
        }
        if let Ok(v) = std::env::var("AZURE_DEVOPS_BACKOFF_FACTOR") {
            settings.backoff_factor = v.parse().map_err(|_| {
                Error::config(format!(
                    "AZURE_DEVOPS_BACKOFF_FACTOR is not a valid number: {v}"
                ))
            })?;
        }
        if let Ok(v) = std::env::var("AZURE_DEVOPS_DISABLE_SSL_VERIFY") {
            settings.verify_tls = !v.eq_ignore_ascii_case("true");
        }
        if let Ok(v) = std::env::var("AZURE_DEVOPS_BASE_URL") {
            settings.base_url = v.trim_end_matches('/').to_string();
        }

        settings.validate()?;
        Ok(settings)
    }

    /// Validates the bundle. Called by the client constructor.
    pub fn validate(&self) -> Result<()> {
        if self.pat.expose_secret().trim().is_empty() {
            return Err(Error::config(
                "personal access token is required (set AZURE_DEVOPS_PAT)",
            ));
        }
        if self.organization.trim().is_empty() {
            return Err(Error::config(
                "organization is required (set AZURE_DEVOPS_ORG)",
            ));
        }
        if self.project.trim().is_empty() {
            return Err(Error::config("project is required (set AZURE_DEVOPS_PROJECT)"));
        }
        if self.timeout.is_zero() {
            return Err(Error::config("timeout must be greater than zero"));
        }
        Ok(())
    }

    /// Overrides the per-request timeout.
    #[must_use]
    pub fn with_timeout(mut self, timeout: Duration) -> Self {
        self.timeout = timeout;
        self
    }

    /// Overrides the maximum retry count.
    #[must_use]
    pub fn with_max_retries(mut self, max_retries: u32) -> Self {
        self.max_retries = max_retries;
        self
    }

    /// Overrides the exponential backoff factor (seconds).
    #[must_use]
    pub fn with_backoff_factor(mut self, factor: f64) -> Self {
        self.backoff_factor = factor;
        self
    }

    /// Disables or enables TLS certificate verification.
    #[must_use]
    pub fn with_verify_tls(mut self, verify: bool) -> Self {
        self.verify_tls = verify;
        self
    }

    /// Overrides the service base URL (Azure DevOps Server, tests).
    #[must_use]
    pub fn with_base_url(mut self, base_url: impl Into<String>) -> Self {
        self.base_url = base_url.into().trim_end_matches('/').to_string();
        self
    }
}

fn require_env(name: &str) -> Result<String> {
    match std::env::var(name) {
        Ok(v) if !v.trim().is_empty() => Ok(v),
        _ => Err(Error::config(format!(
            "{name} environment variable is required"
        ))),
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use serial_test::serial;

    fn clear_env() {
        for name in [
            "AZURE_DEVOPS_ORG",
            "AZURE_DEVOPS_PROJECT",
            "AZURE_DEVOPS_PAT",
            "AZURE_DEVOPS_API_VERSION",
            "AZURE_DEVOPS_WIQL_API_VERSION",
            "AZURE_DEVOPS_TIMEOUT",
            "AZURE_DEVOPS_MAX_RETRIES",
            "AZURE_DEVOPS_BACKOFF_FACTOR",
            "AZURE_DEVOPS_DISABLE_SSL_VERIFY",
            "AZURE_DEVOPS_BASE_URL",
        ] {
            unsafe {
                std::env::remove_var(name);
            }
        }
    }

    /// # Settings Defaults
    ///
    /// Tests that explicit construction applies the documented defaults.
    ///
    /// ## Test Scenario
    /// - Creates settings with only the connection identity
    ///
    /// ## Expected Outcome
    /// - API versions, timeout, retry, TLS, and base URL match the defaults
    #[test]
    fn test_settings_defaults() {
        let settings = Settings::new("org", "proj", "pat");
        assert_eq!(settings.api_version, DEFAULT_API_VERSION);
        assert_eq!(settings.wiql_api_version, DEFAULT_WIQL_API_VERSION);
        assert_eq!(settings.timeout, Duration::from_secs(30));
        assert_eq!(settings.max_retries, 3);
        assert!(settings.verify_tls);
        assert_eq!(settings.base_url, "https://dev.azure.com");
        assert!(settings.validate().is_ok());
    }

    /// # Validation Rejects Empty Credential
    ///
    /// Tests that an empty PAT fails validation at construction time.
    ///
    /// ## Test Scenario
    /// - Creates settings with an empty and a whitespace-only token
    ///
    /// ## Expected Outcome
    /// - Both fail with a configuration error mentioning the token
    #[test]
    fn test_validation_rejects_empty_credential() {
        let empty = Settings::new("org", "proj", "");
        let err = empty.validate().unwrap_err();
        assert!(matches!(err, Error::Config { .. }));
        assert!(err.to_string().contains("AZURE_DEVOPS_PAT"));

        let blank = Settings::new("org", "proj", "   ");
        assert!(blank.validate().is_err());
    }

    /// # Validation Rejects Blank Identity
    ///
    /// Tests that organization and project must be non-empty.
    ///
    /// ## Test Scenario
    /// - Creates settings with a blank organization, then a blank project
    ///
    /// ## Expected Outcome
    /// - Each fails with a configuration error naming the missing field
    #[test]
    fn test_validation_rejects_blank_identity() {
        let err = Settings::new("", "proj", "pat").validate().unwrap_err();
        assert!(err.to_string().contains("organization"));

        let err = Settings::new("org", " ", "pat").validate().unwrap_err();
        assert!(err.to_string().contains("project"));
    }

    /// # Environment Loading
    ///
    /// Tests resolving the full bundle from environment variables.
    ///
    /// ## Test Scenario
    /// - Sets all AZURE_DEVOPS_* variables, including overrides
    ///
    /// ## Expected Outcome
    /// - All values land in the bundle, with the TLS flag inverted from the
    ///   disable variable
    #[test]
    #[serial]
    fn test_from_env_full() {
        clear_env();
        unsafe {
            std::env::set_var("AZURE_DEVOPS_ORG", "contoso");
            std::env::set_var("AZURE_DEVOPS_PROJECT", "Widgets");
            std::env::set_var("AZURE_DEVOPS_PAT", "secret-pat");
            std::env::set_var("AZURE_DEVOPS_TIMEOUT", "10");
            std::env::set_var("AZURE_DEVOPS_MAX_RETRIES", "5");
            std::env::set_var("AZURE_DEVOPS_DISABLE_SSL_VERIFY", "true");
            std::env::set_var("AZURE_DEVOPS_BASE_URL", "https://ado.internal/");
        }

        let settings = Settings::from_env().unwrap();
        clear_env();

        assert_eq!(settings.organization, "contoso");
        assert_eq!(settings.project, "Widgets");
        assert_eq!(settings.timeout, Duration::from_secs(10));
        assert_eq!(settings.max_retries, 5);
        assert!(!settings.verify_tls);
        // Trailing slash is normalized away
        assert_eq!(settings.base_url, "https://ado.internal");
    }

    /// # Missing Token Fails Fast
    ///
    /// Tests that environment loading fails when the PAT is absent.
    ///
    /// ## Test Scenario
    /// - Sets organization and project but no token
    ///
    /// ## Expected Outcome
    /// - A configuration error naming AZURE_DEVOPS_PAT
    #[test]
    #[serial]
    fn test_from_env_missing_pat() {
        clear_env();
        unsafe {
            std::env::set_var("AZURE_DEVOPS_ORG", "contoso");
            std::env::set_var("AZURE_DEVOPS_PROJECT", "Widgets");
        }

        let err = Settings::from_env().unwrap_err();
        clear_env();

        assert!(matches!(err, Error::Config { .. }));
        assert!(err.to_string().contains("AZURE_DEVOPS_PAT"));
    }

    /// # Malformed Numeric Variable
    ///
    /// Tests that a non-numeric timeout is rejected rather than ignored.
    ///
    /// ## Test Scenario
    /// - Sets AZURE_DEVOPS_TIMEOUT to a non-numeric value
    ///
    /// ## Expected Outcome
    /// - A configuration error naming the variable
    #[test]
    #[serial]
    fn test_from_env_malformed_timeout() {
        clear_env();
        unsafe {
            std::env::set_var("AZURE_DEVOPS_ORG", "contoso");
            std::env::set_var("AZURE_DEVOPS_PROJECT", "Widgets");
            std::env::set_var("AZURE_DEVOPS_PAT", "secret");
            std::env::set_var("AZURE_DEVOPS_TIMEOUT", "soon");
        }

        let err = Settings::from_env().unwrap_err();
        clear_env();

        assert!(err.to_string().contains("AZURE_DEVOPS_TIMEOUT"));
    }

    /// # Secret Is Not Debug-Printed
    ///
    /// Tests that the PAT does not leak through Debug formatting.
    ///
    /// ## Test Scenario
    /// - Formats the settings bundle with {:?}
    ///
    /// ## Expected Outcome
    /// - The token value is absent from the output
    #[test]
    fn test_pat_redacted_in_debug() {
        let settings = Settings::new("org", "proj", "super-secret-token");
        let debug = format!("{settings:?}");
        assert!(!debug.contains("super-secret-token"));
    }
}
