//! Per-request version state
//!
//! A [`RequestVersionContext`] is created empty with each
//! [`VersionedRequest`](crate::VersionedRequest), filled the first time the
//! resolver runs, and dropped with the request. It is never shared between
//! requests.

use crate::error::{Result, VersioningError};
use crate::strategy::ExtractedVersion;
use crate::version::ApiVersion;

/// Outcome of resolving the requested version
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum ResolutionResult {
    /// The request carried no version token
    Unspecified,
    /// Every valid token agreed on one version
    Resolved(ApiVersion),
    /// Tokens named two or more distinct versions
    Ambiguous(Vec<String>),
    /// No token was a valid version (or the policy rejected an invalid one)
    Invalid(String),
}

impl ResolutionResult {
    /// Coarse state of this result
    pub fn state(&self) -> ResolutionState {
        match self {
            Self::Unspecified => ResolutionState::Unspecified,
            Self::Resolved(_) => ResolutionState::Resolved,
            Self::Ambiguous(_) => ResolutionState::Ambiguous,
            Self::Invalid(_) => ResolutionState::Invalid,
        }
    }

    /// Resolved version, if any
    pub fn version(&self) -> Option<&ApiVersion> {
        match self {
            Self::Resolved(version) => Some(version),
            _ => None,
        }
    }
}

/// Resolution state of a request
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum ResolutionState {
    /// No version requested and none assumed yet
    Unspecified,
    /// A concrete version is attached
    Resolved,
    /// Conflicting versions were requested
    Ambiguous,
    /// The requested version could not be parsed
    Invalid,
}

/// Version state attached to one request
#[derive(Debug, Clone, Default)]
pub struct RequestVersionContext {
    candidates: Vec<ExtractedVersion>,
    result: Option<ResolutionResult>,
    api_version: Option<ApiVersion>,
    route_api_version: Option<String>,
}

impl RequestVersionContext {
    /// Raw tokens read from the request, in strategy priority order
    pub fn raw_candidates(&self) -> &[ExtractedVersion] {
        &self.candidates
    }

    /// Memoized resolution result; `None` until the resolver has run
    pub fn result(&self) -> Option<&ResolutionResult> {
        self.result.as_ref()
    }

    pub(crate) fn record(&mut self, candidates: Vec<ExtractedVersion>, result: ResolutionResult) {
        self.candidates = candidates;
        self.result = Some(result);
    }

    /// Current resolution state
    ///
    /// A version assumed by a route (the client sent none) reports as
    /// [`ResolutionState::Resolved`].
    pub fn state(&self) -> ResolutionState {
        match &self.result {
            Some(ResolutionResult::Ambiguous(_)) => ResolutionState::Ambiguous,
            Some(ResolutionResult::Invalid(_)) => ResolutionState::Invalid,
            _ if self.api_version.is_some() => ResolutionState::Resolved,
            _ => ResolutionState::Unspecified,
        }
    }

    /// Effective API version of the request
    pub fn api_version(&self) -> Option<&ApiVersion> {
        self.api_version.as_ref()
    }

    /// Attach the effective API version.
    ///
    /// Attaching the same version twice is a no-op. Attaching a different one
    /// marks the request ambiguous and fails.
    pub fn set_api_version(&mut self, version: ApiVersion) -> Result<()> {
        match &self.api_version {
            Some(current) if *current != version => {
                let tokens = vec![current.to_string(), version.to_string()];
                self.result = Some(ResolutionResult::Ambiguous(tokens.clone()));
                Err(VersioningError::AmbiguousVersion { tokens })
            }
            Some(_) => Ok(()),
            None => {
                self.api_version = Some(version);
                Ok(())
            }
        }
    }

    /// `apiVersion` route value of the matched route, echoed by URL generation
    pub fn route_api_version(&self) -> Option<&str> {
        self.route_api_version.as_deref()
    }

    pub(crate) fn set_route_api_version(&mut self, value: &str) {
        if self.route_api_version.is_none() {
            self.route_api_version = Some(value.to_string());
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_new_context_is_unspecified() {
        let context = RequestVersionContext::default();
        assert_eq!(context.state(), ResolutionState::Unspecified);
        assert!(context.result().is_none());
        assert!(context.api_version().is_none());
    }

    #[test]
    fn test_setting_same_version_twice_is_fine() {
        let mut context = RequestVersionContext::default();
        context.set_api_version(ApiVersion::v1()).unwrap();
        context.set_api_version(ApiVersion::new(1, 0)).unwrap();

        assert_eq!(context.state(), ResolutionState::Resolved);
        assert_eq!(context.api_version(), Some(&ApiVersion::v1()));
    }

    #[test]
    fn test_setting_different_version_is_ambiguous() {
        let mut context = RequestVersionContext::default();
        context.set_api_version(ApiVersion::v1()).unwrap();

        let err = context.set_api_version(ApiVersion::v2()).unwrap_err();
        assert_eq!(
            err,
            VersioningError::AmbiguousVersion {
                tokens: vec!["1.0".to_string(), "2.0".to_string()]
            }
        );
        assert_eq!(context.state(), ResolutionState::Ambiguous);
        // the first version stays attached
        assert_eq!(context.api_version(), Some(&ApiVersion::v1()));
    }

    #[test]
    fn test_route_api_version_keeps_first_value() {
        let mut context = RequestVersionContext::default();
        context.set_route_api_version("1");
        context.set_route_api_version("2");
        assert_eq!(context.route_api_version(), Some("1"));
    }
}
