//! Error types for API version resolution and dispatch

use crate::version::ApiVersion;
use http::StatusCode;
use thiserror::Error;

/// Result type alias for versioning operations
pub type Result<T, E = VersioningError> = std::result::Result<T, E>;

/// Typed outcome of a failed version resolution or action selection.
///
/// Every variant maps to exactly one HTTP status through [`status`](Self::status);
/// the translation into a response happens once, in
/// [`ErrorReporter`](crate::ErrorReporter).
#[derive(Debug, Clone, PartialEq, Eq, Error)]
pub enum VersioningError {
    /// The resource exists, but the request did not say which version it wants
    #[error("An API version is required, but was not specified for '{path}'")]
    UnspecifiedVersion {
        /// Request path
        path: String,
    },

    /// The request carried two or more distinct versions
    #[error("The request contained multiple API versions: {}", .tokens.join(", "))]
    AmbiguousVersion {
        /// Conflicting raw tokens, first-seen order
        tokens: Vec<String>,
    },

    /// No token in the request parsed as a version
    #[error("The API version '{token}' is not valid")]
    InvalidVersionFormat {
        /// The offending raw token
        token: String,
    },

    /// The resource exists, but only for other versions
    #[error("The resource '{path}' does not support the API version '{version}'")]
    UnsupportedVersion {
        /// Requested version
        version: ApiVersion,
        /// Request path
        path: String,
    },

    /// A route accepted the version, but no action serves it
    #[error("No action for '{path}' serves the API version '{version}'")]
    UnmatchedVersion {
        /// Requested (or assumed) version
        version: ApiVersion,
        /// Request path
        path: String,
    },

    /// Two or more actions are equally eligible
    #[error("Request matched multiple actions resulting in ambiguity: {}", .actions.join(", "))]
    AmbiguousAction {
        /// Candidate action names, sorted
        actions: Vec<String>,
    },

    /// No route matches the request path at all
    #[error("No route matches '{path}'")]
    RouteNotFound {
        /// Request path
        path: String,
    },
}

impl VersioningError {
    /// HTTP status code for this outcome
    pub fn status(&self) -> StatusCode {
        match self {
            Self::UnspecifiedVersion { .. }
            | Self::AmbiguousVersion { .. }
            | Self::InvalidVersionFormat { .. }
            | Self::UnsupportedVersion { .. } => StatusCode::BAD_REQUEST,
            Self::UnmatchedVersion { .. } | Self::RouteNotFound { .. } => StatusCode::NOT_FOUND,
            Self::AmbiguousAction { .. } => StatusCode::INTERNAL_SERVER_ERROR,
        }
    }

    /// Error type identifier used in the JSON body
    pub fn error_type(&self) -> &'static str {
        match self {
            Self::UnspecifiedVersion { .. } => "api_version_unspecified",
            Self::AmbiguousVersion { .. } => "ambiguous_api_version",
            Self::InvalidVersionFormat { .. } => "invalid_api_version",
            Self::UnsupportedVersion { .. } => "unsupported_api_version",
            Self::UnmatchedVersion { .. } => "unmatched_api_version",
            Self::AmbiguousAction { .. } => "ambiguous_action",
            Self::RouteNotFound { .. } => "not_found",
        }
    }

    /// Whether the outcome is the client's fault
    pub fn is_client_error(&self) -> bool {
        self.status().is_client_error()
    }
}

/// Error returned while building a route table
#[derive(Debug, Clone, PartialEq, Eq, Error)]
pub enum RouteTableError {
    /// Two routes were registered under the same name
    #[error("a route named '{0}' is already registered")]
    DuplicateRoute(String),

    /// A route prefix template could not be parsed
    #[error("invalid route prefix '{prefix}': {reason}")]
    InvalidPrefix {
        /// The prefix template
        prefix: String,
        /// What is wrong with it
        reason: String,
    },

    /// A resource template was rejected by the path router
    #[error("invalid resource template '{template}': {reason}")]
    InvalidTemplate {
        /// The resource template
        template: String,
        /// Details from the underlying router
        reason: String,
    },
}
