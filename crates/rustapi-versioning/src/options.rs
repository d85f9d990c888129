//! Versioning options
//!
//! Options are read-only once a route table is built. They can be set through
//! the builder methods, deserialized with serde, or (with the `config`
//! feature) loaded from `API_VERSIONING_*` environment variables.

use crate::version::ApiVersion;
use serde::{Deserialize, Serialize};

/// What to do with a token that is not a valid version when another token is
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum InvalidTokenPolicy {
    /// The valid tokens win
    #[default]
    Ignore,
    /// Any invalid token makes the request invalid
    Reject,
}

/// Options shared by every route of a versioned route table
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(default)]
pub struct VersioningOptions {
    /// Version assumed for requests that do not specify one
    pub default_api_version: ApiVersion,
    /// Whether unversioned requests may use the default on any route
    ///
    /// When false, only the service document and metadata routes assume it.
    pub assume_default_version_when_unspecified: bool,
    /// Whether responses advertise supported and deprecated versions
    pub report_api_versions: bool,
    /// Handling of invalid tokens next to valid ones
    pub invalid_tokens: InvalidTokenPolicy,
}

impl Default for VersioningOptions {
    fn default() -> Self {
        Self {
            default_api_version: ApiVersion::default(),
            assume_default_version_when_unspecified: false,
            report_api_versions: false,
            invalid_tokens: InvalidTokenPolicy::Ignore,
        }
    }
}

impl VersioningOptions {
    /// Create options with defaults
    pub fn new() -> Self {
        Self::default()
    }

    /// Set the default API version
    pub fn default_version(mut self, version: ApiVersion) -> Self {
        self.default_api_version = version;
        self
    }

    /// Allow every route to assume the default version
    pub fn assume_default_version_when_unspecified(mut self, assume: bool) -> Self {
        self.assume_default_version_when_unspecified = assume;
        self
    }

    /// Advertise supported and deprecated versions in responses
    pub fn report_api_versions(mut self, report: bool) -> Self {
        self.report_api_versions = report;
        self
    }

    /// Set the invalid token policy
    pub fn invalid_tokens(mut self, policy: InvalidTokenPolicy) -> Self {
        self.invalid_tokens = policy;
        self
    }
}

#[cfg(feature = "config")]
pub use self::env::ConfigError;

#[cfg(feature = "config")]
mod env {
    use super::VersioningOptions;
    use thiserror::Error;

    /// Prefix of every environment variable read by [`VersioningOptions::from_env`]
    pub(super) const ENV_PREFIX: &str = "API_VERSIONING_";

    /// Error type for configuration loading failures
    #[derive(Debug, Error)]
    pub enum ConfigError {
        /// Environment variable deserialization failed
        #[error("Configuration error: {0}")]
        Envy(#[from] envy::Error),
    }

    impl VersioningOptions {
        /// Load options from `API_VERSIONING_*` environment variables.
        ///
        /// Unset variables keep their defaults. Example:
        ///
        /// ```text
        /// API_VERSIONING_DEFAULT_API_VERSION=2.0
        /// API_VERSIONING_ASSUME_DEFAULT_VERSION_WHEN_UNSPECIFIED=true
        /// API_VERSIONING_INVALID_TOKENS=reject
        /// ```
        pub fn from_env() -> Result<Self, ConfigError> {
            Ok(envy::prefixed(ENV_PREFIX).from_env()?)
        }

        /// Load a `.env` file if one exists, then read the environment
        pub fn from_dotenv() -> Result<Self, ConfigError> {
            dotenvy::dotenv().ok();
            Self::from_env()
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_defaults() {
        let options = VersioningOptions::default();
        assert_eq!(options.default_api_version, ApiVersion::new(1, 0));
        assert!(!options.assume_default_version_when_unspecified);
        assert!(!options.report_api_versions);
        assert_eq!(options.invalid_tokens, InvalidTokenPolicy::Ignore);
    }

    #[test]
    fn test_builder() {
        let options = VersioningOptions::new()
            .default_version(ApiVersion::v2())
            .assume_default_version_when_unspecified(true)
            .report_api_versions(true)
            .invalid_tokens(InvalidTokenPolicy::Reject);

        assert_eq!(options.default_api_version, ApiVersion::v2());
        assert!(options.assume_default_version_when_unspecified);
        assert!(options.report_api_versions);
        assert_eq!(options.invalid_tokens, InvalidTokenPolicy::Reject);
    }

    #[test]
    fn test_deserialize_partial() {
        let json = r#"{"default_api_version": "3.1", "invalid_tokens": "reject"}"#;
        let options: VersioningOptions = serde_json::from_str(json).unwrap();

        assert_eq!(options.default_api_version, ApiVersion::new(3, 1));
        assert_eq!(options.invalid_tokens, InvalidTokenPolicy::Reject);
        assert!(!options.report_api_versions);
    }

    #[cfg(feature = "config")]
    mod env {
        use super::*;
        use serial_test::serial;

        const VARS: [&str; 3] = [
            "API_VERSIONING_DEFAULT_API_VERSION",
            "API_VERSIONING_ASSUME_DEFAULT_VERSION_WHEN_UNSPECIFIED",
            "API_VERSIONING_INVALID_TOKENS",
        ];

        fn clear() {
            for var in VARS {
                std::env::remove_var(var);
            }
        }

        #[test]
        #[serial]
        fn test_from_env() {
            clear();
            std::env::set_var("API_VERSIONING_DEFAULT_API_VERSION", "2.0");
            std::env::set_var(
                "API_VERSIONING_ASSUME_DEFAULT_VERSION_WHEN_UNSPECIFIED",
                "true",
            );
            std::env::set_var("API_VERSIONING_INVALID_TOKENS", "reject");

            let options = VersioningOptions::from_env().unwrap();
            clear();

            assert_eq!(options.default_api_version, ApiVersion::v2());
            assert!(options.assume_default_version_when_unspecified);
            assert_eq!(options.invalid_tokens, InvalidTokenPolicy::Reject);
        }

        #[test]
        #[serial]
        fn test_from_env_uses_defaults_when_unset() {
            clear();
            let options = VersioningOptions::from_env().unwrap();
            assert_eq!(options, VersioningOptions::default());
        }

        #[test]
        #[serial]
        fn test_from_env_rejects_bad_version() {
            clear();
            std::env::set_var("API_VERSIONING_DEFAULT_API_VERSION", "one");
            let result = VersioningOptions::from_env();
            clear();

            assert!(result.is_err());
        }
    }
}
