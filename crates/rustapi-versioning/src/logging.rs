//! Structured log events emitted while resolving and dispatching
#![allow(unused_variables)]

use crate::tracing_macros::{trace_debug, trace_error, trace_info};
use crate::version::ApiVersion;

pub(crate) fn ambiguous_actions(action_names: &str) {
    trace_error!(
        ambiguous_actions = action_names,
        "Request matched multiple actions resulting in ambiguity"
    );
}

pub(crate) fn constraint_mismatch(
    route_name: &str,
    route_version: &ApiVersion,
    requested: &ApiVersion,
) {
    trace_debug!(
        route = route_name,
        route_version = %route_version,
        requested = %requested,
        "Route did not match the requested API version"
    );
}

pub(crate) fn api_version_unspecified(path: &str, default: &ApiVersion) {
    trace_info!(
        path = path,
        default_version = %default,
        "Request did not specify an API version and no candidate route could assume the default"
    );
}

pub(crate) fn api_version_unmatched(version: &ApiVersion, path: &str, candidates: &str) {
    trace_info!(
        api_version = %version,
        path = path,
        candidates = candidates,
        "Candidate actions were found, but none matched the requested API version"
    );
}

pub(crate) fn api_version_unsupported(version: &ApiVersion, path: &str) {
    trace_info!(
        api_version = %version,
        path = path,
        "Resource exists, but not for the requested API version"
    );
}

pub(crate) fn api_version_invalid(token: &str) {
    trace_info!(
        api_version = token,
        "Request contained an API version that is not valid"
    );
}

pub(crate) fn api_version_ambiguous(tokens: &[String]) {
    trace_info!(
        api_versions = %tokens.join(", "),
        "Request contained multiple distinct API versions"
    );
}

pub(crate) fn route_matched(route_name: &str, version: &ApiVersion, action: &str) {
    trace_debug!(
        route = route_name,
        api_version = %version,
        action = action,
        "Request dispatched"
    );
}
