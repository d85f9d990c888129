//! Route prefixes and resource path matching
//!
//! A route URL is split in two: a prefix owned by the route table
//! (`api/v{apiVersion}`) and the service path below it, which a
//! [`PathMatcher`] checks against the resources a route serves.

use crate::error::RouteTableError;
use crate::request::VersionedRequest;
use crate::route_values::{
    RouteValues, API_VERSION, METADATA_PATH, RESOURCE_TEMPLATE, SERVICE_PATH,
};
use crate::version::ApiVersion;
use matchit::Router as MatchitRouter;

/// Why a route is being evaluated
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum RouteDirection {
    /// Matching an incoming request URL
    UriResolution,
    /// Building a URL for a link
    UriGeneration,
}

/// Checks the service path of a request against the resources of a route
///
/// Matchers may add route values (template parameters) on success. Every
/// matcher must accept [`RouteDirection::UriGeneration`].
pub trait PathMatcher: Send + Sync + 'static {
    /// Whether the route's resources match
    fn matches(
        &self,
        request: &VersionedRequest,
        values: &mut RouteValues,
        direction: RouteDirection,
    ) -> bool;
}

impl<F> PathMatcher for F
where
    F: Fn(&VersionedRequest, &mut RouteValues, RouteDirection) -> bool + Send + Sync + 'static,
{
    fn matches(
        &self,
        request: &VersionedRequest,
        values: &mut RouteValues,
        direction: RouteDirection,
    ) -> bool {
        self(request, values, direction)
    }
}

#[derive(Debug, Clone, PartialEq, Eq)]
enum PrefixSegment {
    Literal(String),
    Capture {
        name: String,
        before: String,
        after: String,
    },
}

/// Parsed route prefix template such as `api` or `api/v{apiVersion}`
///
/// Literal segments compare ASCII case-insensitively. Each segment may hold
/// at most one `{name}` capture. An `{apiVersion}` capture only matches a
/// parseable version.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct RoutePrefix {
    template: String,
    segments: Vec<PrefixSegment>,
}

impl RoutePrefix {
    /// Parse a prefix template
    pub fn parse(template: &str) -> Result<Self, RouteTableError> {
        let template = template.trim_matches('/');
        let invalid = |reason: &str| RouteTableError::InvalidPrefix {
            prefix: template.to_string(),
            reason: reason.to_string(),
        };

        let mut segments = Vec::new();
        let mut names: Vec<&str> = Vec::new();

        for segment in template.split('/').filter(|s| !s.is_empty()) {
            let Some(open) = segment.find('{') else {
                if segment.contains('}') {
                    return Err(invalid("unbalanced '}'"));
                }
                segments.push(PrefixSegment::Literal(segment.to_string()));
                continue;
            };

            let close = segment[open..]
                .find('}')
                .map(|i| open + i)
                .ok_or_else(|| invalid("unbalanced '{'"))?;
            let name = &segment[open + 1..close];
            let (before, after) = (&segment[..open], &segment[close + 1..]);

            if name.is_empty() {
                return Err(invalid("empty parameter name"));
            }
            if name.contains('{') || after.contains('{') || after.contains('}') {
                return Err(invalid("a segment may hold only one parameter"));
            }
            if names.contains(&name) {
                return Err(invalid("duplicate parameter name"));
            }
            names.push(name);

            segments.push(PrefixSegment::Capture {
                name: name.to_string(),
                before: before.to_string(),
                after: after.to_string(),
            });
        }

        Ok(Self {
            template: template.to_string(),
            segments,
        })
    }

    /// The normalized template, without leading or trailing slashes
    pub fn template(&self) -> &str {
        &self.template
    }

    /// Whether the prefix captures `apiVersion`
    pub fn has_api_version(&self) -> bool {
        self.segments
            .iter()
            .any(|s| matches!(s, PrefixSegment::Capture { name, .. } if name == API_VERSION))
    }

    /// Path strategy pattern that reads the `apiVersion` segment of this prefix
    pub fn version_pattern(&self) -> Option<String> {
        let mut pattern = String::new();
        for segment in &self.segments {
            pattern.push('/');
            match segment {
                PrefixSegment::Literal(literal) => pattern.push_str(literal),
                PrefixSegment::Capture {
                    name,
                    before,
                    after,
                } => {
                    let is_version = name == API_VERSION;
                    pattern.push_str(before);
                    pattern.push_str(if is_version { "{version}" } else { "{*}" });
                    pattern.push_str(after);
                    if is_version {
                        pattern.push('/');
                        return Some(pattern);
                    }
                }
            }
        }
        None
    }

    /// Match the start of `path` against this prefix.
    ///
    /// Returns the captured values plus [`SERVICE_PATH`]: null when nothing
    /// follows the prefix, the remaining path otherwise.
    pub fn match_path(&self, path: &str) -> Option<RouteValues> {
        let mut values = RouteValues::new();
        let mut rest = path.trim_start_matches('/');

        for segment in &self.segments {
            let (current, tail) = rest.split_once('/').unwrap_or((rest, ""));
            if current.is_empty() {
                return None;
            }

            match segment {
                PrefixSegment::Literal(literal) => {
                    if !current.eq_ignore_ascii_case(literal) {
                        return None;
                    }
                }
                PrefixSegment::Capture {
                    name,
                    before,
                    after,
                } => {
                    let value = strip_prefix_ignore_case(current, before)
                        .and_then(|v| strip_suffix_ignore_case(v, after))
                        .filter(|v| !v.is_empty())?;
                    if name == API_VERSION && value.parse::<ApiVersion>().is_err() {
                        return None;
                    }
                    values.insert(name.as_str(), value);
                }
            }

            rest = tail.trim_start_matches('/');
        }

        let service_path = rest.trim_end_matches('/');
        if service_path.is_empty() {
            values.insert_null(SERVICE_PATH);
        } else {
            values.insert(SERVICE_PATH, service_path);
        }

        Some(values)
    }

    /// Build the prefix part of a URL, `None` when a capture has no value
    pub fn generate(&self, values: &RouteValues) -> Option<String> {
        let mut url = String::new();
        for segment in &self.segments {
            url.push('/');
            match segment {
                PrefixSegment::Literal(literal) => url.push_str(literal),
                PrefixSegment::Capture {
                    name,
                    before,
                    after,
                } => {
                    url.push_str(before);
                    url.push_str(values.get(name)?);
                    url.push_str(after);
                }
            }
        }
        Some(url)
    }
}

fn strip_prefix_ignore_case<'a>(value: &'a str, prefix: &str) -> Option<&'a str> {
    let head = value.get(..prefix.len())?;
    head.eq_ignore_ascii_case(prefix)
        .then(|| &value[prefix.len()..])
}

fn strip_suffix_ignore_case<'a>(value: &'a str, suffix: &str) -> Option<&'a str> {
    let split = value.len().checked_sub(suffix.len())?;
    let tail = value.get(split..)?;
    tail.eq_ignore_ascii_case(suffix).then(|| &value[..split])
}

/// Path matcher backed by a radix tree of resource templates
///
/// The service root and `$metadata` always match. Other service paths match
/// when one of the registered templates does; its parameters and
/// [`RESOURCE_TEMPLATE`] are added to the route values.
///
/// ```
/// use rustapi_versioning::ResourcePathMatcher;
///
/// let matcher = ResourcePathMatcher::new()
///     .resource("orders")
///     .and_then(|m| m.resource("orders/{id}"))
///     .unwrap();
/// assert_eq!(matcher.templates(), ["orders", "orders/{id}"]);
/// ```
#[derive(Clone)]
pub struct ResourcePathMatcher {
    router: MatchitRouter<String>,
    templates: Vec<String>,
}

impl ResourcePathMatcher {
    /// Create a matcher serving only the service root and metadata
    pub fn new() -> Self {
        Self {
            router: MatchitRouter::new(),
            templates: Vec::new(),
        }
    }

    /// Add a resource template such as `orders/{id}`
    pub fn resource(mut self, template: &str) -> Result<Self, RouteTableError> {
        let template = normalize_template(template);
        let matchit_path = format!("/{}", convert_path_params(&template));

        self.router
            .insert(matchit_path, template.clone())
            .map_err(|e| RouteTableError::InvalidTemplate {
                template: template.clone(),
                reason: e.to_string(),
            })?;
        self.templates.push(template);
        Ok(self)
    }

    /// Registered templates, in insertion order
    pub fn templates(&self) -> &[String] {
        &self.templates
    }

    fn match_service_path(&self, service_path: &str, values: &mut RouteValues) -> bool {
        if service_path.eq_ignore_ascii_case(METADATA_PATH) {
            return true;
        }

        let path = format!("/{}", service_path);
        match self.router.at(&path) {
            Ok(matched) => {
                for (name, value) in matched.params.iter() {
                    values.insert(name, value);
                }
                values.insert(RESOURCE_TEMPLATE, matched.value.as_str());
                true
            }
            Err(_) => false,
        }
    }
}

impl Default for ResourcePathMatcher {
    fn default() -> Self {
        Self::new()
    }
}

impl PathMatcher for ResourcePathMatcher {
    fn matches(
        &self,
        request: &VersionedRequest,
        values: &mut RouteValues,
        direction: RouteDirection,
    ) -> bool {
        if direction == RouteDirection::UriGeneration {
            return true;
        }

        match values.lookup(SERVICE_PATH) {
            Some(None) => true,
            Some(Some(service_path)) => {
                let service_path = service_path.to_string();
                self.match_service_path(&service_path, values)
            }
            None => {
                let path = request.path().trim_matches('/');
                path.is_empty() || self.match_service_path(path, values)
            }
        }
    }
}

impl std::fmt::Debug for ResourcePathMatcher {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("ResourcePathMatcher")
            .field("templates", &self.templates)
            .finish()
    }
}

/// Trim slashes so templates compare equal however they were written
pub(crate) fn normalize_template(template: &str) -> String {
    template
        .split('/')
        .filter(|s| !s.is_empty())
        .collect::<Vec<_>>()
        .join("/")
}

/// Convert {param} style to :param (and {*rest} to *rest) for matchit
fn convert_path_params(path: &str) -> String {
    let mut result = String::with_capacity(path.len());
    let mut chars = path.chars().peekable();

    while let Some(ch) = chars.next() {
        match ch {
            '{' => {
                if chars.peek() == Some(&'*') {
                    chars.next();
                    result.push('*');
                } else {
                    result.push(':');
                }
            }
            '}' => {}
            _ => result.push(ch),
        }
    }

    result
}
