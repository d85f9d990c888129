//! Requested version resolution

use crate::context::ResolutionResult;
use crate::logging;
use crate::options::InvalidTokenPolicy;
use crate::request::VersionedRequest;
use crate::strategy::{ExtractedVersion, VersionStrategy};
use crate::version::ApiVersion;

/// Resolves the API version a request asks for
///
/// Every configured strategy contributes raw tokens; the tokens are then
/// parsed and reconciled into one [`ResolutionResult`]. The result is
/// memoized on the request, so later calls are free.
#[derive(Debug, Clone)]
pub struct VersionResolver {
    /// Strategies in priority order
    strategies: Vec<VersionStrategy>,
    invalid_tokens: InvalidTokenPolicy,
}

impl VersionResolver {
    /// Create a resolver reading the `api-version` query parameter
    pub fn new() -> Self {
        Self::with_strategy(VersionStrategy::query())
    }

    /// Create a resolver with a single strategy
    pub fn with_strategy(strategy: VersionStrategy) -> Self {
        Self::with_strategies(vec![strategy])
    }

    /// Create a resolver with multiple strategies
    ///
    /// Strategies are reordered by priority; the relative order of strategies
    /// with the same priority is kept.
    pub fn with_strategies(mut strategies: Vec<VersionStrategy>) -> Self {
        strategies.sort_by_key(VersionStrategy::priority);
        Self {
            strategies,
            invalid_tokens: InvalidTokenPolicy::default(),
        }
    }

    /// Add a strategy
    pub fn add_strategy(mut self, strategy: VersionStrategy) -> Self {
        if !self.strategies.contains(&strategy) {
            self.strategies.push(strategy);
            self.strategies.sort_by_key(VersionStrategy::priority);
        }
        self
    }

    /// Set the invalid token policy
    pub fn invalid_tokens(mut self, policy: InvalidTokenPolicy) -> Self {
        self.invalid_tokens = policy;
        self
    }

    /// Configured strategies, in evaluation order
    pub fn strategies(&self) -> &[VersionStrategy] {
        &self.strategies
    }

    /// Invalid token policy in effect
    pub fn invalid_token_policy(&self) -> InvalidTokenPolicy {
        self.invalid_tokens
    }

    /// Read every raw token from the request without resolving
    pub fn read(&self, request: &VersionedRequest) -> Vec<ExtractedVersion> {
        let mut candidates = Vec::new();
        for strategy in &self.strategies {
            strategy.read(request, &mut candidates);
        }
        candidates
    }

    /// Reconcile raw tokens into a result
    pub fn evaluate(&self, candidates: &[ExtractedVersion]) -> ResolutionResult {
        if candidates.is_empty() {
            return ResolutionResult::Unspecified;
        }

        let mut distinct: Vec<(ApiVersion, &str)> = Vec::new();
        let mut first_invalid: Option<&str> = None;

        for candidate in candidates {
            match candidate.token.parse::<ApiVersion>() {
                Ok(version) => {
                    if !distinct.iter().any(|(seen, _)| *seen == version) {
                        distinct.push((version, candidate.token.as_str()));
                    }
                }
                Err(_) => {
                    first_invalid.get_or_insert(candidate.token.as_str());
                }
            }
        }

        if distinct.len() > 1 {
            let tokens = distinct.iter().map(|(_, raw)| raw.to_string()).collect();
            return ResolutionResult::Ambiguous(tokens);
        }

        match (distinct.pop(), first_invalid) {
            (None, Some(token)) => ResolutionResult::Invalid(token.to_string()),
            (Some(_), Some(token)) if self.invalid_tokens == InvalidTokenPolicy::Reject => {
                ResolutionResult::Invalid(token.to_string())
            }
            (Some((version, _)), _) => ResolutionResult::Resolved(version),
            (None, None) => ResolutionResult::Unspecified,
        }
    }

    /// Resolve the requested version, memoizing the result on the request.
    ///
    /// A resolved version is also attached to the request as its effective
    /// version.
    pub fn resolve(&self, request: &mut VersionedRequest) -> ResolutionResult {
        if let Some(result) = request.version_context().result() {
            return result.clone();
        }

        let candidates = self.read(request);
        let result = self.evaluate(&candidates);

        match &result {
            ResolutionResult::Ambiguous(tokens) => logging::api_version_ambiguous(tokens),
            ResolutionResult::Invalid(token) => logging::api_version_invalid(token),
            _ => {}
        }

        let context = request.version_context_mut();
        context.record(candidates, result.clone());
        if let ResolutionResult::Resolved(version) = result {
            // a conflicting version already attached turns the result ambiguous
            let _ = context.set_api_version(version);
        }

        context
            .result()
            .cloned()
            .unwrap_or(ResolutionResult::Unspecified)
    }
}

impl Default for VersionResolver {
    fn default() -> Self {
        Self::new()
    }
}
