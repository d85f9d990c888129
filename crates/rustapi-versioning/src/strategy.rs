//! Version extraction strategies
//!
//! Each strategy reads raw version tokens from one location of a request.
//! Strategies never parse or validate tokens and never touch the request, so
//! they can run any number of times with the same outcome.

use crate::request::VersionedRequest;
use http::header::{ACCEPT, CONTENT_TYPE};
use serde::{Deserialize, Serialize};
use std::fmt;

/// Placeholder marking the version inside a path pattern
const VERSION_PLACEHOLDER: &str = "{version}";

/// Strategy for extracting API version tokens from requests
///
/// Strategies always run in priority order: query string, URL path, header,
/// media type parameter.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum VersionStrategy {
    /// Extract version from query parameter
    ///
    /// Example: ?api-version=1.0
    Query {
        /// Query parameter name, compared case-insensitively
        param: String,
    },

    /// Extract version from URL path
    ///
    /// The pattern should include `{version}` placeholder and is anchored at
    /// the start of the path. Other `{name}` placeholders match any segment.
    /// Example: "/v{version}/" or "/{tenant}/api/{version}/"
    Path {
        /// Pattern for matching version in path
        pattern: String,
    },

    /// Extract version from HTTP header
    ///
    /// Example: X-API-Version: 1.0
    Header {
        /// Header name to read version from
        name: String,
    },

    /// Extract version from a media type parameter of `Accept` or `Content-Type`
    ///
    /// Example: Accept: application/json;v=2.0
    MediaType {
        /// Media type parameter name
        parameter: String,
    },
}

impl VersionStrategy {
    /// Create a query parameter versioning strategy
    ///
    /// Default parameter: "api-version"
    pub fn query() -> Self {
        Self::Query {
            param: "api-version".to_string(),
        }
    }

    /// Create a query strategy with custom parameter name
    pub fn query_with_param(param: impl Into<String>) -> Self {
        Self::Query {
            param: param.into(),
        }
    }

    /// Create a path-based versioning strategy
    ///
    /// Default pattern: "/v{version}/"
    pub fn path() -> Self {
        Self::Path {
            pattern: "/v{version}/".to_string(),
        }
    }

    /// Create a path strategy with custom pattern
    pub fn path_with_pattern(pattern: impl Into<String>) -> Self {
        Self::Path {
            pattern: pattern.into(),
        }
    }

    /// Create a header-based versioning strategy
    ///
    /// Default header: "X-API-Version"
    pub fn header() -> Self {
        Self::Header {
            name: "X-API-Version".to_string(),
        }
    }

    /// Create a header strategy with custom header name
    pub fn header_with_name(name: impl Into<String>) -> Self {
        Self::Header { name: name.into() }
    }

    /// Create a media type parameter versioning strategy
    ///
    /// Default parameter: "v"
    pub fn media_type() -> Self {
        Self::MediaType {
            parameter: "v".to_string(),
        }
    }

    /// Create a media type strategy with custom parameter name
    pub fn media_type_with_parameter(parameter: impl Into<String>) -> Self {
        Self::MediaType {
            parameter: parameter.into(),
        }
    }

    /// Where this strategy reads from
    pub fn source(&self) -> VersionSource {
        match self {
            Self::Query { .. } => VersionSource::Query,
            Self::Path { .. } => VersionSource::Path,
            Self::Header { .. } => VersionSource::Header,
            Self::MediaType { .. } => VersionSource::MediaType,
        }
    }

    /// Evaluation priority; lower runs first
    pub fn priority(&self) -> u8 {
        self.source() as u8
    }

    /// Append every raw token this strategy finds in `request` to `out`
    pub fn read(&self, request: &VersionedRequest, out: &mut Vec<ExtractedVersion>) {
        let source = self.source();
        let mut push = |token: &str| {
            let token = token.trim();
            if !token.is_empty() {
                out.push(ExtractedVersion {
                    token: token.to_string(),
                    source,
                });
            }
        };

        match self {
            Self::Query { param } => {
                if let Some(query) = request.query_string() {
                    for (name, value) in parse_query(query) {
                        if name.eq_ignore_ascii_case(param) {
                            push(value.as_str());
                        }
                    }
                }
            }
            Self::Path { pattern } => {
                if let Some(token) = extract_path_token(request.path(), pattern) {
                    push(token);
                }
            }
            Self::Header { name } => {
                for value in request.headers().get_all(name.as_str()) {
                    if let Ok(value) = value.to_str() {
                        value.split(',').for_each(&mut push);
                    }
                }
            }
            Self::MediaType { parameter } => {
                for header in [ACCEPT, CONTENT_TYPE] {
                    for value in request.headers().get_all(header) {
                        if let Ok(value) = value.to_str() {
                            for token in media_type_parameters(value, parameter) {
                                push(token);
                            }
                        }
                    }
                }
            }
        }
    }
}

impl Default for VersionStrategy {
    fn default() -> Self {
        Self::query()
    }
}

fn parse_query(query: &str) -> Vec<(String, String)> {
    serde_urlencoded::from_str(query).unwrap_or_default()
}

/// Extract the raw version token from path using an anchored pattern
///
/// Literals compare ASCII case-insensitively. Any `{name}` other than
/// `{version}` matches one non-empty segment.
fn extract_path_token<'a>(path: &'a str, pattern: &str) -> Option<&'a str> {
    let mut path_segments = path.split('/').filter(|s| !s.is_empty());

    for pattern_segment in pattern.split('/').filter(|s| !s.is_empty()) {
        let segment = path_segments.next()?;

        if let Some((before, after)) = pattern_segment.split_once(VERSION_PLACEHOLDER) {
            let token = strip_affixes(segment, before, after)?;
            // only segments that look like a version count as a candidate
            return looks_like_version(token).then_some(token);
        }

        let matched = match placeholder_affixes(pattern_segment) {
            Some((before, after)) => strip_affixes(segment, before, after).is_some(),
            None => segment.eq_ignore_ascii_case(pattern_segment),
        };
        if !matched {
            return None;
        }
    }

    None
}

/// Literal text around the `{...}` of a pattern segment
fn placeholder_affixes(segment: &str) -> Option<(&str, &str)> {
    let open = segment.find('{')?;
    let close = open + segment[open..].find('}')?;
    Some((&segment[..open], &segment[close + 1..]))
}

/// Strip `before` and `after` ignoring ASCII case; the rest must be non-empty
fn strip_affixes<'a>(segment: &'a str, before: &str, after: &str) -> Option<&'a str> {
    let split = segment.len().checked_sub(after.len())?;
    if split <= before.len() {
        return None;
    }
    let head = segment.get(..before.len())?;
    let tail = segment.get(split..)?;

    (head.eq_ignore_ascii_case(before) && tail.eq_ignore_ascii_case(after))
        .then(|| &segment[before.len()..split])
}

/// A digit, or a `v` followed by a digit
fn looks_like_version(token: &str) -> bool {
    let digits = token.strip_prefix(['v', 'V']).unwrap_or(token);
    digits.starts_with(|c: char| c.is_ascii_digit())
}

/// Values of `parameter` across every media type in a header value
fn media_type_parameters<'a>(
    header_value: &'a str,
    parameter: &'a str,
) -> impl Iterator<Item = &'a str> + 'a {
    header_value
        .split(',')
        .flat_map(|media_type| media_type.split(';').skip(1))
        .filter_map(move |param| {
            let (name, value) = param.split_once('=')?;
            name.trim()
                .eq_ignore_ascii_case(parameter)
                .then(|| value.trim().trim_matches('"'))
        })
}

/// Raw version token read from a request
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct ExtractedVersion {
    /// The raw, unparsed token
    pub token: String,
    /// Source of the token
    pub source: VersionSource,
}

/// Source from which a version token was extracted
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, PartialOrd, Ord)]
pub enum VersionSource {
    /// Extracted from query parameter
    Query = 0,
    /// Extracted from URL path
    Path = 1,
    /// Extracted from HTTP header
    Header = 2,
    /// Extracted from a media type parameter
    MediaType = 3,
}

impl fmt::Display for VersionSource {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        let name = match self {
            Self::Query => "query string",
            Self::Path => "url path",
            Self::Header => "header",
            Self::MediaType => "media type",
        };
        f.write_str(name)
    }
}
