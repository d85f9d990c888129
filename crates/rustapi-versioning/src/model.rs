//! Version metadata of actions

use crate::path::normalize_template;
use crate::route_values::METADATA_PATH;
use crate::version::ApiVersion;
use http::Method;

/// API versions an action (or a group of actions) serves
///
/// Either a set of declared versions, some of which may be deprecated, or
/// version-neutral: serving every version, including none at all.
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct ApiVersionModel {
    declared: Vec<ApiVersion>,
    deprecated: Vec<ApiVersion>,
    neutral: bool,
}

impl ApiVersionModel {
    /// Model declaring the given versions
    pub fn new(versions: impl IntoIterator<Item = ApiVersion>) -> Self {
        let mut declared: Vec<ApiVersion> = versions.into_iter().collect();
        declared.sort();
        declared.dedup();
        Self {
            declared,
            deprecated: Vec::new(),
            neutral: false,
        }
    }

    /// Version-neutral model
    pub fn neutral() -> Self {
        Self {
            neutral: true,
            ..Self::default()
        }
    }

    /// Declare `version` as deprecated
    ///
    /// A deprecated version is still served. Neutral models ignore this.
    pub fn deprecate(mut self, version: ApiVersion) -> Self {
        if self.neutral {
            return self;
        }
        if let Err(index) = self.declared.binary_search(&version) {
            self.declared.insert(index, version.clone());
        }
        if let Err(index) = self.deprecated.binary_search(&version) {
            self.deprecated.insert(index, version);
        }
        self
    }

    /// Whether the model is version-neutral
    pub fn is_version_neutral(&self) -> bool {
        self.neutral
    }

    /// Whether `version` is explicitly declared
    pub fn declares(&self, version: &ApiVersion) -> bool {
        self.declared.binary_search(version).is_ok()
    }

    /// Whether a route bound to `version` may dispatch to this model's actions
    pub fn maps_to(&self, version: &ApiVersion) -> bool {
        self.neutral || self.declares(version)
    }

    /// Whether a request for `version` (or for no version) may be served
    pub fn admits(&self, version: Option<&ApiVersion>) -> bool {
        self.neutral || version.is_some_and(|v| self.declares(v))
    }

    /// Every declared version, sorted
    pub fn declared_versions(&self) -> &[ApiVersion] {
        &self.declared
    }

    /// Declared versions that are not deprecated, sorted
    pub fn supported_versions(&self) -> Vec<ApiVersion> {
        self.declared
            .iter()
            .filter(|v| self.deprecated.binary_search(v).is_err())
            .cloned()
            .collect()
    }

    /// Deprecated versions, sorted
    pub fn deprecated_versions(&self) -> &[ApiVersion] {
        &self.deprecated
    }

    /// Combine the models of several actions.
    ///
    /// Version-neutral models contribute nothing. A version still supported by
    /// any model is not reported as deprecated.
    pub fn aggregate<'a>(models: impl IntoIterator<Item = &'a ApiVersionModel>) -> Self {
        let mut supported = Vec::new();
        let mut deprecated = Vec::new();

        for model in models.into_iter().filter(|m| !m.neutral) {
            supported.extend(model.supported_versions());
            deprecated.extend(model.deprecated.iter().cloned());
        }

        deprecated.retain(|v| !supported.contains(v));
        deprecated
            .into_iter()
            .fold(Self::new(supported), Self::deprecate)
    }
}

impl FromIterator<ApiVersion> for ApiVersionModel {
    fn from_iter<I: IntoIterator<Item = ApiVersion>>(iter: I) -> Self {
        Self::new(iter)
    }
}

/// An endpoint a versioned route can dispatch to
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct ActionDescriptor {
    /// Unique, human readable name (e.g. `OrdersController.Get`)
    pub name: String,
    /// HTTP method served; `GET` actions also answer `HEAD`
    pub method: Method,
    /// Resource template below the route prefix, without surrounding slashes;
    /// empty for the service root
    pub template: String,
    /// Versions served
    pub versions: ApiVersionModel,
}

impl ActionDescriptor {
    /// Create an action
    pub fn new(
        name: impl Into<String>,
        method: Method,
        template: &str,
        versions: ApiVersionModel,
    ) -> Self {
        Self {
            name: name.into(),
            method,
            template: normalize_template(template),
            versions,
        }
    }

    /// Whether the action answers `method`
    pub fn serves(&self, method: &Method) -> bool {
        self.method == *method || (*method == Method::HEAD && self.method == Method::GET)
    }

    /// Built-in service document or metadata action of a route bound to `version`
    pub(crate) fn metadata(version: &ApiVersion, service_root: bool) -> Self {
        let (name, template) = if service_root {
            ("ServiceDocument", "")
        } else {
            ("Metadata", METADATA_PATH)
        };
        Self::new(
            format!("{}-{}", name, version),
            Method::GET,
            template,
            ApiVersionModel::new([version.clone()]),
        )
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn v(s: &str) -> ApiVersion {
        s.parse().unwrap()
    }

    #[test]
    fn test_declared_versions_are_sorted_and_unique() {
        let model = ApiVersionModel::new([v("2.0"), v("1.0"), v("2")]);
        assert_eq!(model.declared_versions(), &[v("1.0"), v("2.0")]);
        assert!(model.declares(&v("1")));
        assert!(!model.declares(&v("3.0")));
    }

    #[test]
    fn test_neutral_model_admits_everything() {
        let model = ApiVersionModel::neutral();
        assert!(model.is_version_neutral());
        assert!(model.admits(None));
        assert!(model.admits(Some(&v("42.0"))));
        assert!(model.maps_to(&v("7.1")));
        assert!(model.supported_versions().is_empty());
    }

    #[test]
    fn test_versioned_model_needs_a_version() {
        let model = ApiVersionModel::new([v("1.0")]);
        assert!(!model.admits(None));
        assert!(model.admits(Some(&v("1.0"))));
        assert!(!model.maps_to(&v("2.0")));
    }

    #[test]
    fn test_deprecated_versions_are_still_served() {
        let model = ApiVersionModel::new([v("2.0")]).deprecate(v("1.0"));

        assert!(model.admits(Some(&v("1.0"))));
        assert_eq!(model.supported_versions(), vec![v("2.0")]);
        assert_eq!(model.deprecated_versions(), &[v("1.0")]);
    }

    #[test]
    fn test_aggregate() {
        let orders = ApiVersionModel::new([v("2.0")]).deprecate(v("1.0"));
        let customers = ApiVersionModel::new([v("1.0"), v("3.0")]);
        let neutral = ApiVersionModel::neutral();

        let all = ApiVersionModel::aggregate([&orders, &customers, &neutral]);
        assert_eq!(all.supported_versions(), vec![v("1.0"), v("2.0"), v("3.0")]);
        assert!(all.deprecated_versions().is_empty());

        let only_orders = ApiVersionModel::aggregate([&orders]);
        assert_eq!(only_orders.supported_versions(), vec![v("2.0")]);
        assert_eq!(only_orders.deprecated_versions(), &[v("1.0")]);
    }

    #[test]
    fn test_action_descriptor() {
        let action = ActionDescriptor::new(
            "Orders.Get",
            Method::GET,
            "/orders/{id}/",
            ApiVersionModel::new([v("1.0")]),
        );
        assert_eq!(action.template, "orders/{id}");
        assert!(action.serves(&Method::GET));
        assert!(action.serves(&Method::HEAD));
        assert!(!action.serves(&Method::POST));

        let metadata = ActionDescriptor::metadata(&v("2.0"), false);
        assert_eq!(metadata.template, METADATA_PATH);
        assert_eq!(metadata.name, "Metadata-2.0");
    }
}
