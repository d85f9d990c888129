//! Request wrapper carrying per-request version state

use crate::context::RequestVersionContext;
use crate::version::ApiVersion;
use http::{request::Parts, Extensions, HeaderMap, Method, Uri};

/// HTTP request as seen by the versioning engine
///
/// Wraps the already-parsed request head supplied by the host framework and
/// owns the [`RequestVersionContext`] for the duration of dispatch. The body
/// is never needed and is dropped on conversion.
pub struct VersionedRequest {
    parts: Parts,
    context: RequestVersionContext,
}

impl VersionedRequest {
    /// Create a new request from parts
    pub fn new(parts: Parts) -> Self {
        Self {
            parts,
            context: RequestVersionContext::default(),
        }
    }

    /// Get the HTTP method
    pub fn method(&self) -> &Method {
        &self.parts.method
    }

    /// Get the URI
    pub fn uri(&self) -> &Uri {
        &self.parts.uri
    }

    /// Get the headers
    pub fn headers(&self) -> &HeaderMap {
        &self.parts.headers
    }

    /// Get request extensions
    pub fn extensions(&self) -> &Extensions {
        &self.parts.extensions
    }

    /// Get mutable extensions
    pub fn extensions_mut(&mut self) -> &mut Extensions {
        &mut self.parts.extensions
    }

    /// Get the request path
    pub fn path(&self) -> &str {
        self.parts.uri.path()
    }

    /// Get the query string
    pub fn query_string(&self) -> Option<&str> {
        self.parts.uri.query()
    }

    /// Version state of this request
    pub fn version_context(&self) -> &RequestVersionContext {
        &self.context
    }

    /// Mutable version state of this request
    pub fn version_context_mut(&mut self) -> &mut RequestVersionContext {
        &mut self.context
    }

    /// Effective API version, once resolved or assumed
    pub fn api_version(&self) -> Option<&ApiVersion> {
        self.context.api_version()
    }

    /// Give back the request head together with its version state
    pub fn into_parts(self) -> (Parts, RequestVersionContext) {
        (self.parts, self.context)
    }
}

impl<B> From<http::Request<B>> for VersionedRequest {
    fn from(request: http::Request<B>) -> Self {
        let (parts, _body) = request.into_parts();
        Self::new(parts)
    }
}

impl std::fmt::Debug for VersionedRequest {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("VersionedRequest")
            .field("method", &self.parts.method)
            .field("uri", &self.parts.uri)
            .field("context", &self.context)
            .finish()
    }
}
