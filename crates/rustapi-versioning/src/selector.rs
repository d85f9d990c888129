//! Version-aware action selection

use crate::error::{Result, VersioningError};
use crate::logging;
use crate::model::ActionDescriptor;
use crate::version::ApiVersion;

/// Picks the one action that serves a request
///
/// Candidates have already been filtered by path and method. Actions that
/// explicitly declare the requested version are preferred over
/// version-neutral ones; only the best non-empty tier is considered.
#[derive(Debug, Clone, Copy, Default)]
pub struct ActionSelector;

impl ActionSelector {
    /// Create a selector
    pub fn new() -> Self {
        Self
    }

    /// Select the best candidate for `version`.
    ///
    /// Returns `Ok(None)` when no candidate serves the version.
    ///
    /// # Errors
    ///
    /// [`VersioningError::AmbiguousAction`] when the winning tier holds more
    /// than one action.
    pub fn select<'a>(
        &self,
        candidates: &[&'a ActionDescriptor],
        version: Option<&ApiVersion>,
    ) -> Result<Option<&'a ActionDescriptor>> {
        let declared: Vec<&'a ActionDescriptor> = match version {
            Some(version) => candidates
                .iter()
                .copied()
                .filter(|a| a.versions.declares(version))
                .collect(),
            None => Vec::new(),
        };

        let tier = if declared.is_empty() {
            candidates
                .iter()
                .copied()
                .filter(|a| a.versions.is_version_neutral())
                .collect()
        } else {
            declared
        };

        match tier.as_slice() {
            [] => Ok(None),
            [action] => Ok(Some(*action)),
            _ => {
                let mut actions: Vec<String> = tier.iter().map(|a| a.name.clone()).collect();
                actions.sort();
                logging::ambiguous_actions(&actions.join(", "));
                Err(VersioningError::AmbiguousAction { actions })
            }
        }
    }
}
