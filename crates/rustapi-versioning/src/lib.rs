//! # rustapi-versioning
//!
//! API version negotiation and version-aware route dispatch.
//!
//! A request may name the API version it wants in the query string
//! (`?api-version=2.0`), a URL segment (`/api/v2/orders`), a header
//! (`X-API-Version: 2.0`) or a media type parameter
//! (`Accept: application/json;v=2.0`). This crate:
//!
//! - resolves those tokens into one [`ApiVersion`], rejecting conflicting ones
//! - matches the request against routes that each serve one version
//! - picks the action serving that version, preferring explicit declarations
//!   over version-neutral actions
//! - turns every failure into a typed [`VersioningError`] with a fixed HTTP
//!   status, rendered by [`ErrorReporter`]
//!
//! ## Example
//!
//! ```rust
//! use rustapi_versioning::{
//!     ActionDescriptor, ApiVersion, ApiVersionModel, PathMatcher, ResourcePathMatcher,
//!     RouteTableBuilder, VersioningError, VersioningOptions,
//! };
//! use http::{Method, StatusCode};
//! use std::sync::Arc;
//!
//! let v1: Arc<dyn PathMatcher> = Arc::new(ResourcePathMatcher::new().resource("orders").unwrap());
//! let v2: Arc<dyn PathMatcher> = Arc::new(ResourcePathMatcher::new().resource("orders").unwrap());
//!
//! let table = RouteTableBuilder::new(VersioningOptions::default())
//!     .action(ActionDescriptor::new(
//!         "OrdersV1.Get",
//!         Method::GET,
//!         "orders",
//!         ApiVersionModel::new([ApiVersion::v1()]),
//!     ))
//!     .action(ActionDescriptor::new(
//!         "OrdersV2.Get",
//!         Method::GET,
//!         "orders",
//!         ApiVersionModel::new([ApiVersion::v2()]),
//!     ))
//!     .map_versioned_routes("odata", "api", [(ApiVersion::v1(), v1), (ApiVersion::v2(), v2)])
//!     .build()
//!     .unwrap();
//!
//! let mut request = http::Request::get("/api/orders?api-version=2.0")
//!     .body(())
//!     .unwrap()
//!     .into();
//! assert_eq!(table.dispatch(&mut request).unwrap().action.name, "OrdersV2.Get");
//!
//! // the resource exists, but the client did not say which version it wants
//! let mut request = http::Request::get("/api/orders").body(()).unwrap().into();
//! let err = table.dispatch(&mut request).unwrap_err();
//! assert!(matches!(err, VersioningError::UnspecifiedVersion { .. }));
//!
//! let response = table.error_reporter().into_response(err);
//! assert_eq!(response.status(), StatusCode::BAD_REQUEST);
//! ```
//!
//! ## Feature Flags
//!
//! - `tracing` (default): structured log events through `tracing`
//! - `config`: load [`VersioningOptions`] from `API_VERSIONING_*` environment
//!   variables

// Tracing macros must be declared before the modules that use them
mod tracing_macros;

mod constraint;
mod context;
mod error;
mod logging;
mod model;
mod options;
mod path;
mod report;
mod request;
mod resolver;
mod route_values;
mod selector;
mod strategy;
mod table;
mod version;

pub use constraint::{UnversionedRouteConstraint, VersionedRouteConstraint};
pub use context::{RequestVersionContext, ResolutionResult, ResolutionState};
pub use error::{Result, RouteTableError, VersioningError};
pub use model::{ActionDescriptor, ApiVersionModel};
#[cfg(feature = "config")]
pub use options::ConfigError;
pub use options::{InvalidTokenPolicy, VersioningOptions};
pub use path::{PathMatcher, ResourcePathMatcher, RouteDirection, RoutePrefix};
pub use report::{ErrorReporter, Response, API_DEPRECATED_VERSIONS, API_SUPPORTED_VERSIONS};
pub use request::VersionedRequest;
pub use resolver::VersionResolver;
pub use route_values::{RouteValues, API_VERSION, METADATA_PATH, RESOURCE_TEMPLATE, SERVICE_PATH};
pub use selector::ActionSelector;
pub use strategy::{ExtractedVersion, VersionSource, VersionStrategy};
pub use table::{RouteMatch, RouteTableBuilder, VersionedRouteTable};
pub use version::{ApiVersion, VersionParseError};
