//! Translation of versioning errors into HTTP responses

use crate::error::VersioningError;
use crate::model::ApiVersionModel;
use crate::options::VersioningOptions;
use crate::version::ApiVersion;
use bytes::Bytes;
use http::{header, HeaderMap, HeaderValue};
use http_body_util::Full;
use serde::Serialize;

/// Header listing the supported API versions
pub const API_SUPPORTED_VERSIONS: &str = "api-supported-versions";

/// Header listing the deprecated API versions
pub const API_DEPRECATED_VERSIONS: &str = "api-deprecated-versions";

/// HTTP response type produced by the reporter
pub type Response = http::Response<Full<Bytes>>;

/// JSON error response body
#[derive(Debug, Serialize)]
pub(crate) struct ErrorResponse {
    pub error: ErrorBody,
}

#[derive(Debug, Serialize)]
pub(crate) struct ErrorBody {
    #[serde(rename = "type")]
    pub error_type: &'static str,
    pub message: String,
}

impl From<&VersioningError> for ErrorResponse {
    fn from(err: &VersioningError) -> Self {
        Self {
            error: ErrorBody {
                error_type: err.error_type(),
                message: err.to_string(),
            },
        }
    }
}

/// Builds error responses and advertises API versions
#[derive(Debug, Clone, Default)]
pub struct ErrorReporter {
    report_api_versions: bool,
    supported: Vec<ApiVersion>,
    deprecated: Vec<ApiVersion>,
}

impl ErrorReporter {
    /// Create a reporter honoring `options.report_api_versions`
    pub fn new(options: &VersioningOptions) -> Self {
        Self {
            report_api_versions: options.report_api_versions,
            ..Self::default()
        }
    }

    /// Versions to advertise
    pub fn with_versions(mut self, model: &ApiVersionModel) -> Self {
        self.supported = model.supported_versions();
        self.deprecated = model.deprecated_versions().to_vec();
        self
    }

    /// Convert `err` into a JSON error response
    pub fn into_response(&self, err: VersioningError) -> Response {
        let body = serde_json::to_vec(&ErrorResponse::from(&err)).unwrap_or_else(|_| {
            br#"{"error":{"type":"internal_error","message":"Failed to serialize error"}}"#.to_vec()
        });

        let mut response = http::Response::new(Full::new(Bytes::from(body)));
        *response.status_mut() = err.status();
        response.headers_mut().insert(
            header::CONTENT_TYPE,
            HeaderValue::from_static("application/json"),
        );
        self.report_versions(response.headers_mut());
        response
    }

    /// Add the supported and deprecated version headers, when enabled
    pub fn report_versions(&self, headers: &mut HeaderMap) {
        if !self.report_api_versions {
            return;
        }
        for (name, versions) in [
            (API_SUPPORTED_VERSIONS, &self.supported),
            (API_DEPRECATED_VERSIONS, &self.deprecated),
        ] {
            if versions.is_empty() {
                continue;
            }
            let list = versions
                .iter()
                .map(ToString::to_string)
                .collect::<Vec<_>>()
                .join(", ");
            if let Ok(value) = HeaderValue::from_str(&list) {
                headers.insert(name, value);
            }
        }
    }
}
