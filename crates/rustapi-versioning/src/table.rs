//! Versioned route table
//!
//! The table is assembled once through [`RouteTableBuilder`] and is read-only
//! afterwards, so it can be shared between threads behind an `Arc`. All
//! per-request state lives on the [`VersionedRequest`].
//!
//! Dispatch runs in a fixed order:
//!
//! 1. versioned routes, in registration order
//! 2. a route that accepted the version but has no action for it: 404
//! 3. catch-all routes: the path exists for other versions, so 400
//! 4. an invalid version on a known prefix: 400
//! 5. anything else: 404

use crate::constraint::{UnversionedRouteConstraint, VersionedRouteConstraint};
use crate::context::ResolutionResult;
use crate::error::{Result, RouteTableError, VersioningError};
use crate::logging;
use crate::model::{ActionDescriptor, ApiVersionModel};
use crate::options::{InvalidTokenPolicy, VersioningOptions};
use crate::path::{PathMatcher, RouteDirection, RoutePrefix};
use crate::report::ErrorReporter;
use crate::request::VersionedRequest;
use crate::resolver::VersionResolver;
use crate::route_values::{RouteValues, API_VERSION, RESOURCE_TEMPLATE, SERVICE_PATH};
use crate::selector::ActionSelector;
use crate::strategy::VersionStrategy;
use crate::tracing_macros::trace_debug;
use crate::version::ApiVersion;
use http::Method;
use std::collections::HashSet;
use std::sync::Arc;

/// Successful dispatch of a request
#[derive(Debug, Clone)]
pub struct RouteMatch<'a> {
    /// Name of the matched route
    pub route_name: &'a str,
    /// Effective API version; `None` for a version-neutral action reached
    /// without a version
    pub api_version: Option<ApiVersion>,
    /// Selected action
    pub action: &'a ActionDescriptor,
    /// Route values produced while matching
    pub values: RouteValues,
}

#[derive(Debug)]
struct VersionedRoute {
    name: String,
    prefix: RoutePrefix,
    constraint: VersionedRouteConstraint,
    /// Indices of the actions this route admits
    actions: Vec<usize>,
    metadata: Vec<ActionDescriptor>,
}

#[derive(Debug)]
struct UnversionedRoute {
    name: String,
    prefix: RoutePrefix,
    constraint: UnversionedRouteConstraint,
}

enum PendingRoute {
    Versioned {
        name: String,
        prefix: RoutePrefix,
        version: ApiVersion,
        matcher: Arc<dyn PathMatcher>,
    },
    Unversioned {
        name: String,
        prefix: RoutePrefix,
        constraint: UnversionedRouteConstraint,
    },
}

impl PendingRoute {
    fn name(&self) -> &str {
        match self {
            Self::Versioned { name, .. } | Self::Unversioned { name, .. } => name,
        }
    }

    fn prefix(&self) -> &RoutePrefix {
        match self {
            Self::Versioned { prefix, .. } | Self::Unversioned { prefix, .. } => prefix,
        }
    }
}

/// Builder for [`VersionedRouteTable`]
///
/// ```
/// use rustapi_versioning::{
///     ActionDescriptor, ApiVersion, ApiVersionModel, ResourcePathMatcher, RouteTableBuilder,
///     VersioningOptions,
/// };
/// use http::Method;
///
/// let orders = ResourcePathMatcher::new().resource("orders").unwrap();
/// let table = RouteTableBuilder::new(VersioningOptions::default())
///     .action(ActionDescriptor::new(
///         "Orders.Get",
///         Method::GET,
///         "orders",
///         ApiVersionModel::new([ApiVersion::v1()]),
///     ))
///     .map_versioned_route("odata", "api", ApiVersion::v1(), orders)
///     .build()
///     .unwrap();
///
/// let mut request = http::Request::get("/api/orders?api-version=1.0")
///     .body(())
///     .unwrap()
///     .into();
/// let matched = table.dispatch(&mut request).unwrap();
/// assert_eq!(matched.action.name, "Orders.Get");
/// ```
pub struct RouteTableBuilder {
    options: VersioningOptions,
    resolver: VersionResolver,
    actions: Vec<ActionDescriptor>,
    routes: Vec<PendingRoute>,
    metadata_convention: bool,
    error: Option<RouteTableError>,
}

impl RouteTableBuilder {
    /// Create a builder
    ///
    /// The service document and metadata convention is on by default.
    pub fn new(options: VersioningOptions) -> Self {
        Self {
            options,
            resolver: VersionResolver::default(),
            actions: Vec::new(),
            routes: Vec::new(),
            metadata_convention: true,
            error: None,
        }
    }

    /// Set the version resolver
    ///
    /// A `Path` strategy is added for every prefix that captures
    /// `{apiVersion}`. A `Reject` policy in the options overrides the
    /// resolver's own policy.
    pub fn resolver(mut self, resolver: VersionResolver) -> Self {
        self.resolver = resolver;
        self
    }

    /// Register an action
    pub fn action(mut self, action: ActionDescriptor) -> Self {
        self.actions.push(action);
        self
    }

    /// Register several actions
    pub fn actions(mut self, actions: impl IntoIterator<Item = ActionDescriptor>) -> Self {
        self.actions.extend(actions);
        self
    }

    /// Answer service document and `$metadata` requests with built-in actions
    pub fn metadata_convention(mut self, enabled: bool) -> Self {
        self.metadata_convention = enabled;
        self
    }

    /// Map a route serving one API version.
    ///
    /// Registers `name` plus the catch-all `"{name}-Unversioned"`.
    pub fn map_versioned_route(
        mut self,
        name: &str,
        prefix: &str,
        api_version: ApiVersion,
        matcher: impl PathMatcher,
    ) -> Self {
        let Some(prefix) = self.parse_prefix(prefix) else {
            return self;
        };
        let matcher: Arc<dyn PathMatcher> = Arc::new(matcher);

        self.routes.push(PendingRoute::Versioned {
            name: name.to_string(),
            prefix: prefix.clone(),
            version: api_version.clone(),
            matcher: Arc::clone(&matcher),
        });
        self.routes.push(PendingRoute::Unversioned {
            name: format!("{}-Unversioned", name),
            prefix,
            constraint: UnversionedRouteConstraint::for_version(matcher, api_version),
        });
        self
    }

    /// Map one route per API version under a shared prefix.
    ///
    /// Registers `"{name}-{version}"` for every version plus one shared
    /// catch-all `"{name}-Unversioned"`.
    pub fn map_versioned_routes(
        mut self,
        name: &str,
        prefix: &str,
        models: impl IntoIterator<Item = (ApiVersion, Arc<dyn PathMatcher>)>,
    ) -> Self {
        let Some(prefix) = self.parse_prefix(prefix) else {
            return self;
        };

        let mut matchers = Vec::new();
        for (version, matcher) in models {
            matchers.push(Arc::clone(&matcher));
            self.routes.push(PendingRoute::Versioned {
                name: format!("{}-{}", name, version),
                prefix: prefix.clone(),
                version,
                matcher,
            });
        }

        self.routes.push(PendingRoute::Unversioned {
            name: format!("{}-Unversioned", name),
            prefix,
            constraint: UnversionedRouteConstraint::new(matchers),
        });
        self
    }

    fn parse_prefix(&mut self, prefix: &str) -> Option<RoutePrefix> {
        match RoutePrefix::parse(prefix) {
            Ok(prefix) => Some(prefix),
            Err(err) => {
                self.error.get_or_insert(err);
                None
            }
        }
    }

    /// Build the table
    ///
    /// # Errors
    ///
    /// The first invalid prefix, or a route name registered twice.
    pub fn build(self) -> std::result::Result<VersionedRouteTable, RouteTableError> {
        if let Some(err) = self.error {
            return Err(err);
        }

        let mut names = HashSet::new();
        for route in &self.routes {
            if !names.insert(route.name()) {
                return Err(RouteTableError::DuplicateRoute(route.name().to_string()));
            }
        }

        let mut resolver = self.resolver;
        if self.options.invalid_tokens == InvalidTokenPolicy::Reject {
            resolver = resolver.invalid_tokens(InvalidTokenPolicy::Reject);
        }
        for route in &self.routes {
            if let Some(pattern) = route.prefix().version_pattern() {
                resolver = resolver.add_strategy(VersionStrategy::path_with_pattern(pattern));
            }
        }

        let actions = self.actions;
        let mut routes = Vec::new();
        let mut catch_alls = Vec::new();

        for route in self.routes {
            match route {
                PendingRoute::Versioned {
                    name,
                    prefix,
                    version,
                    matcher,
                } => {
                    let admitted = actions
                        .iter()
                        .enumerate()
                        .filter(|(_, action)| action.versions.maps_to(&version))
                        .map(|(index, _)| index)
                        .collect();
                    let metadata = if self.metadata_convention {
                        vec![
                            ActionDescriptor::metadata(&version, true),
                            ActionDescriptor::metadata(&version, false),
                        ]
                    } else {
                        Vec::new()
                    };

                    trace_debug!(
                        route = %name,
                        prefix = prefix.template(),
                        api_version = %version,
                        "Registered versioned route"
                    );
                    routes.push(VersionedRoute {
                        constraint: VersionedRouteConstraint::new(version, name.clone(), matcher),
                        name,
                        prefix,
                        actions: admitted,
                        metadata,
                    });
                }
                PendingRoute::Unversioned {
                    name,
                    prefix,
                    constraint,
                } => catch_alls.push(UnversionedRoute {
                    name,
                    prefix,
                    constraint,
                }),
            }
        }

        let versions = ApiVersionModel::aggregate(actions.iter().map(|a| &a.versions));
        let reporter = ErrorReporter::new(&self.options).with_versions(&versions);

        Ok(VersionedRouteTable {
            options: self.options,
            resolver,
            selector: ActionSelector::new(),
            actions,
            routes,
            catch_alls,
            versions,
            reporter,
        })
    }
}

/// Immutable table of versioned routes
#[derive(Debug)]
pub struct VersionedRouteTable {
    options: VersioningOptions,
    resolver: VersionResolver,
    selector: ActionSelector,
    actions: Vec<ActionDescriptor>,
    routes: Vec<VersionedRoute>,
    catch_alls: Vec<UnversionedRoute>,
    versions: ApiVersionModel,
    reporter: ErrorReporter,
}

impl VersionedRouteTable {
    /// Options of this table
    pub fn options(&self) -> &VersioningOptions {
        &self.options
    }

    /// Resolver used for every request
    pub fn resolver(&self) -> &VersionResolver {
        &self.resolver
    }

    /// Registered actions
    pub fn actions(&self) -> &[ActionDescriptor] {
        &self.actions
    }

    /// Names of every route, versioned routes first
    pub fn route_names(&self) -> impl Iterator<Item = &str> {
        self.routes
            .iter()
            .map(|r| r.name.as_str())
            .chain(self.catch_alls.iter().map(|r| r.name.as_str()))
    }

    /// Versions served by at least one action, without the deprecated ones
    pub fn supported_versions(&self) -> Vec<ApiVersion> {
        self.versions.supported_versions()
    }

    /// Versions only served as deprecated
    pub fn deprecated_versions(&self) -> &[ApiVersion] {
        self.versions.deprecated_versions()
    }

    /// Reporter turning dispatch errors into responses
    pub fn error_reporter(&self) -> &ErrorReporter {
        &self.reporter
    }

    /// Find the route and action serving `request`.
    ///
    /// # Errors
    ///
    /// Every [`VersioningError`] variant; see the module documentation for the
    /// order in which they are decided.
    pub fn dispatch<'t>(&'t self, request: &mut VersionedRequest) -> Result<RouteMatch<'t>> {
        let resolution = self.resolver.resolve(request);
        if let ResolutionResult::Ambiguous(tokens) = &resolution {
            return Err(VersioningError::AmbiguousVersion {
                tokens: tokens.clone(),
            });
        }

        let path = request.path().to_string();
        let method = request.method().clone();
        let mut prefix_matched = false;
        let mut unmatched: Option<(ApiVersion, String)> = None;

        for route in &self.routes {
            let Some(mut values) = route.prefix.match_path(&path) else {
                continue;
            };
            prefix_matched = true;

            if !route.constraint.matches(
                request,
                &mut values,
                RouteDirection::UriResolution,
                &self.resolver,
                &self.options,
            )? {
                continue;
            }

            let candidates = self.candidates(route, &values, &method);
            let api_version = request.api_version().cloned();
            match self.selector.select(&candidates, api_version.as_ref())? {
                Some(action) => {
                    let route_version = route.constraint.api_version();
                    logging::route_matched(&route.name, route_version, &action.name);
                    return Ok(RouteMatch {
                        route_name: &route.name,
                        api_version,
                        action,
                        values,
                    });
                }
                None => {
                    unmatched.get_or_insert_with(|| {
                        let names: Vec<&str> = self
                            .actions
                            .iter()
                            .filter(|a| a.serves(&method) && matches_template(a, &values))
                            .map(|a| a.name.as_str())
                            .collect();
                        (route.constraint.api_version().clone(), names.join(", "))
                    });
                }
            }
        }

        if let Some((version, candidates)) = unmatched {
            logging::api_version_unmatched(&version, &path, &candidates);
            return Err(VersioningError::UnmatchedVersion { version, path });
        }

        for route in &self.catch_alls {
            let Some(values) = route.prefix.match_path(&path) else {
                continue;
            };
            prefix_matched = true;

            if !route.constraint.matches(
                request,
                &values,
                RouteDirection::UriResolution,
                &self.resolver,
            )? {
                continue;
            }

            if !matches!(resolution, ResolutionResult::Invalid(_)) {
                if let Some(found) = self.dispatch_version_neutral(request, &path, &method)? {
                    return Ok(found);
                }
            }

            return Err(match resolution {
                ResolutionResult::Unspecified => {
                    logging::api_version_unspecified(&path, &self.options.default_api_version);
                    VersioningError::UnspecifiedVersion { path }
                }
                ResolutionResult::Resolved(version) => {
                    logging::api_version_unsupported(&version, &path);
                    VersioningError::UnsupportedVersion { version, path }
                }
                ResolutionResult::Invalid(token) => VersioningError::InvalidVersionFormat { token },
                ResolutionResult::Ambiguous(tokens) => VersioningError::AmbiguousVersion { tokens },
            });
        }

        match resolution {
            ResolutionResult::Invalid(token) if prefix_matched => {
                Err(VersioningError::InvalidVersionFormat { token })
            }
            _ => Err(VersioningError::RouteNotFound { path }),
        }
    }

    /// Dispatch to a version-neutral action, whatever the requested version
    fn dispatch_version_neutral<'t>(
        &'t self,
        request: &VersionedRequest,
        path: &str,
        method: &Method,
    ) -> Result<Option<RouteMatch<'t>>> {
        for route in &self.routes {
            let Some(mut values) = route.prefix.match_path(path) else {
                continue;
            };
            let matcher = route.constraint.path_matcher();
            if !matcher.matches(request, &mut values, RouteDirection::UriResolution) {
                continue;
            }

            let candidates: Vec<&ActionDescriptor> = self
                .candidates(route, &values, method)
                .into_iter()
                .filter(|a| a.versions.is_version_neutral())
                .collect();
            if let Some(action) = self.selector.select(&candidates, None)? {
                return Ok(Some(RouteMatch {
                    route_name: &route.name,
                    api_version: request.api_version().cloned(),
                    action,
                    values,
                }));
            }
        }
        Ok(None)
    }

    /// Actions of `route` answering `method` at the matched resource
    fn candidates<'t>(
        &'t self,
        route: &'t VersionedRoute,
        values: &RouteValues,
        method: &Method,
    ) -> Vec<&'t ActionDescriptor> {
        let mut found: Vec<&ActionDescriptor> = route
            .actions
            .iter()
            .filter_map(|&index| self.actions.get(index))
            .filter(|a| a.serves(method) && matches_template(a, values))
            .collect();

        if found.is_empty() && values.is_service_document_or_metadata() {
            found.extend(
                route
                    .metadata
                    .iter()
                    .filter(|a| a.serves(method) && matches_template(a, values)),
            );
        }
        found
    }

    /// Generate a URL for the named route.
    ///
    /// `{apiVersion}` is taken from `values` when present, otherwise from the
    /// version the request was routed with. The service path, if any, is
    /// appended to the prefix.
    pub fn url_for(
        &self,
        request: &mut VersionedRequest,
        route_name: &str,
        values: &RouteValues,
    ) -> Option<String> {
        let mut values = values.clone();

        if let Some(route) = self.routes.iter().find(|r| r.name == route_name) {
            fill_api_version(&route.prefix, request, &mut values);
            let matched = route
                .constraint
                .matches(
                    request,
                    &mut values,
                    RouteDirection::UriGeneration,
                    &self.resolver,
                    &self.options,
                )
                .ok()?;
            return matched.then(|| build_url(&route.prefix, &values)).flatten();
        }

        let route = self.catch_alls.iter().find(|r| r.name == route_name)?;
        fill_api_version(&route.prefix, request, &mut values);
        let matched = route
            .constraint
            .matches(
                request,
                &values,
                RouteDirection::UriGeneration,
                &self.resolver,
            )
            .ok()?;
        matched.then(|| build_url(&route.prefix, &values)).flatten()
    }
}

fn matches_template(action: &ActionDescriptor, values: &RouteValues) -> bool {
    let template = values
        .get(RESOURCE_TEMPLATE)
        .or_else(|| values.get(SERVICE_PATH))
        .unwrap_or("");
    action.template.eq_ignore_ascii_case(template)
}

fn fill_api_version(prefix: &RoutePrefix, request: &VersionedRequest, values: &mut RouteValues) {
    if !prefix.has_api_version() || values.contains_key(API_VERSION) {
        return;
    }
    let context = request.version_context();
    let version = context
        .route_api_version()
        .map(str::to_string)
        .or_else(|| context.api_version().map(ToString::to_string));
    if let Some(version) = version {
        values.insert(API_VERSION, version);
    }
}

fn build_url(prefix: &RoutePrefix, values: &RouteValues) -> Option<String> {
    let mut url = prefix.generate(values)?;
    if let Some(service_path) = values.get(SERVICE_PATH) {
        let service_path = service_path.trim_matches('/');
        if !service_path.is_empty() {
            url.push('/');
            url.push_str(service_path);
        }
    }
    if url.is_empty() {
        url.push('/');
    }
    Some(url)
}
