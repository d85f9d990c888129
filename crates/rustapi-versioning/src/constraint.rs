//! Version-aware route constraints
//!
//! A [`VersionedRouteConstraint`] binds a route to one API version. The
//! companion [`UnversionedRouteConstraint`] catches requests whose path exists
//! but whose version does not, so they can be answered with a 400 rather than
//! a 404.

use crate::context::ResolutionResult;
use crate::error::{Result, VersioningError};
use crate::logging;
use crate::options::VersioningOptions;
use crate::path::{PathMatcher, RouteDirection};
use crate::request::VersionedRequest;
use crate::resolver::VersionResolver;
use crate::route_values::{RouteValues, API_VERSION};
use crate::version::ApiVersion;
use std::fmt;
use std::sync::Arc;

/// Route constraint admitting requests for exactly one API version
#[derive(Clone)]
pub struct VersionedRouteConstraint {
    api_version: ApiVersion,
    route_name: String,
    path_matcher: Arc<dyn PathMatcher>,
}

impl VersionedRouteConstraint {
    /// Create a constraint binding `route_name` to `api_version`
    pub fn new(
        api_version: ApiVersion,
        route_name: impl Into<String>,
        path_matcher: Arc<dyn PathMatcher>,
    ) -> Self {
        Self {
            api_version,
            route_name: route_name.into(),
            path_matcher,
        }
    }

    /// Version this route serves
    pub fn api_version(&self) -> &ApiVersion {
        &self.api_version
    }

    /// Name of the constrained route
    pub fn route_name(&self) -> &str {
        &self.route_name
    }

    /// Matcher for the route's resources
    pub fn path_matcher(&self) -> &Arc<dyn PathMatcher> {
        &self.path_matcher
    }

    /// Decide whether the route matches the request.
    ///
    /// URL generation is never filtered by version. For resolution, a request
    /// with an explicit version matches only the route bound to it; a request
    /// without one matches the default version's route when the default may
    /// be assumed, or when it targets the service document or metadata.
    ///
    /// An `apiVersion` route value names a version too: the route never
    /// matches when it differs from the route's version.
    ///
    /// # Errors
    ///
    /// [`VersioningError::AmbiguousVersion`] when the request names more than
    /// one version, or when assuming the default conflicts with a version
    /// already attached to the request.
    pub fn matches(
        &self,
        request: &mut VersionedRequest,
        values: &mut RouteValues,
        direction: RouteDirection,
        resolver: &VersionResolver,
        options: &VersioningOptions,
    ) -> Result<bool> {
        if direction == RouteDirection::UriGeneration {
            return Ok(self.path_matcher.matches(request, values, direction));
        }

        let requested = match resolver.resolve(request) {
            ResolutionResult::Ambiguous(tokens) => {
                return Err(VersioningError::AmbiguousVersion { tokens })
            }
            ResolutionResult::Invalid(_) => return Ok(false),
            ResolutionResult::Resolved(requested) => Some(requested),
            ResolutionResult::Unspecified => None,
        };

        let captured = values
            .get(API_VERSION)
            .and_then(|token| token.parse::<ApiVersion>().ok());
        let mut named = captured.iter().chain(&requested);
        if let Some(other) = named.find(|v| **v != self.api_version) {
            logging::constraint_mismatch(&self.route_name, &self.api_version, other);
            return Ok(false);
        }

        // the url names no version at all
        if requested.is_none() && captured.is_none() {
            if self.api_version != options.default_api_version {
                return Ok(false);
            }
            if !options.assume_default_version_when_unspecified
                && !values.is_service_document_or_metadata()
            {
                return Ok(false);
            }
        }

        if !self.path_matcher.matches(request, values, direction) {
            return Ok(false);
        }

        let context = request.version_context_mut();
        if requested.is_none() {
            context.set_api_version(self.api_version.clone())?;
        }
        if let Some(route_version) = values.get(API_VERSION) {
            context.set_route_api_version(route_version);
        }
        Ok(true)
    }
}

impl fmt::Debug for VersionedRouteConstraint {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("VersionedRouteConstraint")
            .field("api_version", &self.api_version)
            .field("route_name", &self.route_name)
            .finish_non_exhaustive()
    }
}

/// Catch-all constraint for a path that exists under some other version
#[derive(Clone)]
pub struct UnversionedRouteConstraint {
    path_matchers: Vec<Arc<dyn PathMatcher>>,
    api_version: Option<ApiVersion>,
}

impl UnversionedRouteConstraint {
    /// Catch-all over every matcher of a set of versioned routes
    pub fn new(path_matchers: Vec<Arc<dyn PathMatcher>>) -> Self {
        Self {
            path_matchers,
            api_version: None,
        }
    }

    /// Catch-all companion of a single route serving `api_version`
    pub fn for_version(path_matcher: Arc<dyn PathMatcher>, api_version: ApiVersion) -> Self {
        Self {
            path_matchers: vec![path_matcher],
            api_version: Some(api_version),
        }
    }

    /// Matchers of the guarded routes
    pub fn path_matchers(&self) -> &[Arc<dyn PathMatcher>] {
        &self.path_matchers
    }

    /// Whether any guarded route serves the path, whatever the version.
    ///
    /// A single-route catch-all never matches the version its route serves.
    /// Route values are left untouched.
    pub fn matches(
        &self,
        request: &mut VersionedRequest,
        values: &RouteValues,
        direction: RouteDirection,
        resolver: &VersionResolver,
    ) -> Result<bool> {
        if direction == RouteDirection::UriGeneration {
            return Ok(true);
        }

        match resolver.resolve(request) {
            ResolutionResult::Ambiguous(tokens) => {
                return Err(VersioningError::AmbiguousVersion { tokens })
            }
            ResolutionResult::Resolved(requested)
                if self.api_version.as_ref() == Some(&requested) =>
            {
                return Ok(false)
            }
            _ => {}
        }

        let request = &*request;
        Ok(self.path_matchers.iter().any(|matcher| {
            let mut scratch = values.clone();
            matcher.matches(request, &mut scratch, direction)
        }))
    }
}

impl fmt::Debug for UnversionedRouteConstraint {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("UnversionedRouteConstraint")
            .field("routes", &self.path_matchers.len())
            .field("api_version", &self.api_version)
            .finish()
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::path::ResourcePathMatcher;
    use crate::route_values::SERVICE_PATH;
    use crate::strategy::VersionStrategy;

    fn orders() -> Arc<dyn PathMatcher> {
        Arc::new(ResourcePathMatcher::new().resource("orders").unwrap())
    }

    fn request(uri: &str) -> VersionedRequest {
        http::Request::get(uri).body(()).unwrap().into()
    }

    fn values(service_path: Option<&str>) -> RouteValues {
        let mut values = RouteValues::new();
        match service_path {
            Some(path) => values.insert(SERVICE_PATH, path),
            None => values.insert_null(SERVICE_PATH),
        }
        values
    }

    fn catches(catch_all: &UnversionedRouteConstraint, uri: &str, service_path: &str) -> bool {
        let mut req = request(uri);
        catch_all
            .matches(
                &mut req,
                &values(Some(service_path)),
                RouteDirection::UriResolution,
                &VersionResolver::new(),
            )
            .unwrap()
    }

    fn resolve(
        constraint: &VersionedRouteConstraint,
        request: &mut VersionedRequest,
        values: &mut RouteValues,
        options: &VersioningOptions,
    ) -> Result<bool> {
        constraint.matches(
            request,
            values,
            RouteDirection::UriResolution,
            &VersionResolver::new(),
            options,
        )
    }

    #[test]
    fn test_explicit_version_must_equal_route_version() {
        let v1 = VersionedRouteConstraint::new(ApiVersion::v1(), "odata-1.0", orders());
        let v2 = VersionedRouteConstraint::new(ApiVersion::v2(), "odata-2.0", orders());
        let options = VersioningOptions::default();

        let mut req = request("/api/orders?api-version=2.0");
        assert!(!resolve(&v1, &mut req, &mut values(Some("orders")), &options).unwrap());
        assert!(resolve(&v2, &mut req, &mut values(Some("orders")), &options).unwrap());
    }

    #[test]
    fn test_explicit_version_still_needs_path_match() {
        let v1 = VersionedRouteConstraint::new(ApiVersion::v1(), "odata", orders());
        let mut req = request("/api/customers?api-version=1.0");

        assert!(!resolve(
            &v1,
            &mut req,
            &mut values(Some("customers")),
            &VersioningOptions::default()
        )
        .unwrap());
    }

    #[test]
    fn test_unspecified_matches_metadata_with_default() {
        let v1 = VersionedRouteConstraint::new(ApiVersion::v1(), "odata", orders());
        let options = VersioningOptions::default();

        let mut req = request("/api/$metadata");
        assert!(resolve(&v1, &mut req, &mut values(Some("$metadata")), &options).unwrap());
        assert_eq!(req.api_version(), Some(&ApiVersion::v1()));

        let mut req = request("/api");
        assert!(resolve(&v1, &mut req, &mut values(None), &options).unwrap());
    }

    #[test]
    fn test_unspecified_resource_needs_assumed_default() {
        let v1 = VersionedRouteConstraint::new(ApiVersion::v1(), "odata", orders());

        let mut req = request("/api/orders");
        let strict = VersioningOptions::default();
        assert!(!resolve(&v1, &mut req, &mut values(Some("orders")), &strict).unwrap());
        assert!(req.api_version().is_none());

        let mut req = request("/api/orders");
        let lenient = VersioningOptions::default().assume_default_version_when_unspecified(true);
        assert!(resolve(&v1, &mut req, &mut values(Some("orders")), &lenient).unwrap());
        assert_eq!(req.api_version(), Some(&ApiVersion::v1()));
    }

    #[test]
    fn test_unspecified_never_matches_non_default_route() {
        let v2 = VersionedRouteConstraint::new(ApiVersion::v2(), "odata", orders());
        let options = VersioningOptions::default().assume_default_version_when_unspecified(true);

        let mut req = request("/api/$metadata");
        assert!(!resolve(&v2, &mut req, &mut values(Some("$metadata")), &options).unwrap());
    }

    #[test]
    fn test_ambiguous_version_is_an_error() {
        let v1 = VersionedRouteConstraint::new(ApiVersion::v1(), "odata", orders());
        let resolver = VersionResolver::with_strategies(vec![
            VersionStrategy::query(),
            VersionStrategy::header(),
        ]);
        let mut req: VersionedRequest = http::Request::get("/api/orders?api-version=1.0")
            .header("x-api-version", "2.0")
            .body(())
            .unwrap()
            .into();

        let err = v1
            .matches(
                &mut req,
                &mut values(Some("orders")),
                RouteDirection::UriResolution,
                &resolver,
                &VersioningOptions::default(),
            )
            .unwrap_err();
        assert!(matches!(err, VersioningError::AmbiguousVersion { .. }));
    }

    #[test]
    fn test_invalid_version_never_matches() {
        let v1 = VersionedRouteConstraint::new(ApiVersion::v1(), "odata", orders());
        let mut req = request("/api/orders?api-version=latest");

        assert!(!resolve(
            &v1,
            &mut req,
            &mut values(Some("orders")),
            &VersioningOptions::default()
        )
        .unwrap());
    }

    #[test]
    fn test_generation_ignores_version() {
        let v2 = VersionedRouteConstraint::new(ApiVersion::v2(), "odata", orders());
        let mut req = request("/api/orders?api-version=1.0");

        let matched = v2.matches(
            &mut req,
            &mut values(Some("customers")),
            RouteDirection::UriGeneration,
            &VersionResolver::new(),
            &VersioningOptions::default(),
        );
        assert_eq!(matched, Ok(true));
    }

    #[test]
    fn test_route_api_version_is_recorded() {
        let v1 = VersionedRouteConstraint::new(ApiVersion::v1(), "odata", orders());
        let strategy = VersionStrategy::path_with_pattern("/api/v{version}/");
        let resolver = VersionResolver::with_strategy(strategy);
        let mut req = request("/api/v1/orders");
        let mut route_values = values(Some("orders"));
        route_values.insert(API_VERSION, "1");

        let matched = v1.matches(
            &mut req,
            &mut route_values,
            RouteDirection::UriResolution,
            &resolver,
            &VersioningOptions::default(),
        );
        assert_eq!(matched, Ok(true));
        assert_eq!(req.version_context().route_api_version(), Some("1"));
    }

    #[test]
    fn test_captured_version_overrides_assumed_default() {
        let v1 = VersionedRouteConstraint::new(ApiVersion::v1(), "odata-1.0", orders());
        let v2 = VersionedRouteConstraint::new(ApiVersion::v2(), "odata-2.0", orders());
        let lenient = VersioningOptions::default().assume_default_version_when_unspecified(true);
        let strict = VersioningOptions::default();

        let captured = || {
            let mut route_values = values(Some("orders"));
            route_values.insert(API_VERSION, "v2");
            route_values
        };

        // the resolver reads only the query string, so the request looks unversioned
        let mut req = request("/tenant/v2/orders");
        assert!(!resolve(&v1, &mut req, &mut captured(), &lenient).unwrap());
        assert!(req.api_version().is_none());

        assert!(resolve(&v2, &mut req, &mut captured(), &strict).unwrap());
        assert_eq!(req.api_version(), Some(&ApiVersion::v2()));
        assert_eq!(req.version_context().route_api_version(), Some("v2"));
    }

    #[test]
    fn test_single_route_catch_all_skips_own_version() {
        let catch_all = UnversionedRouteConstraint::for_version(orders(), ApiVersion::v1());

        assert!(!catches(&catch_all, "/api/orders?api-version=1.0", "orders"));
        assert!(catches(&catch_all, "/api/orders?api-version=3.0", "orders"));
    }

    #[test]
    fn test_shared_catch_all_requires_known_path() {
        let catch_all = UnversionedRouteConstraint::new(vec![orders(), orders()]);

        assert!(catches(&catch_all, "/api/orders", "orders"));
        assert!(!catches(&catch_all, "/api/customers", "customers"));
    }
}
