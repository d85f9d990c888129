//! Route value bag with optimized storage
//!
//! Route values are the named values produced while matching a request
//! against a route: prefix captures such as `apiVersion`, the remaining
//! service path, and parameters of the resource template. A value may be
//! explicitly null, which is how the service root is represented.

use smallvec::SmallVec;

/// Maximum number of route values to store on the stack.
pub const STACK_VALUES_CAPACITY: usize = 4;

/// Route value holding the path below the route prefix.
///
/// Null when the request targets the service root.
pub const SERVICE_PATH: &str = "servicePath";

/// Route value captured from an `{apiVersion}` prefix segment.
pub const API_VERSION: &str = "apiVersion";

/// Route value naming the resource template matched by the path matcher.
pub const RESOURCE_TEMPLATE: &str = "resourceTemplate";

/// Well-known service path of the metadata document.
pub const METADATA_PATH: &str = "$metadata";

/// Ordered collection of route values.
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct RouteValues {
    inner: SmallVec<[(String, Option<String>); STACK_VALUES_CAPACITY]>,
}

impl RouteValues {
    /// Create an empty collection.
    #[inline]
    pub fn new() -> Self {
        Self {
            inner: SmallVec::new(),
        }
    }

    /// Insert a value, replacing any existing value with the same name.
    pub fn insert(&mut self, key: impl Into<String>, value: impl Into<String>) {
        self.set(key.into(), Some(value.into()));
    }

    /// Insert an explicitly null value.
    pub fn insert_null(&mut self, key: impl Into<String>) {
        self.set(key.into(), None);
    }

    fn set(&mut self, key: String, value: Option<String>) {
        match self.inner.iter_mut().find(|(k, _)| *k == key) {
            Some(slot) => slot.1 = value,
            None => self.inner.push((key, value)),
        }
    }

    /// Get a non-null value by key.
    #[inline]
    pub fn get(&self, key: &str) -> Option<&str> {
        self.lookup(key).flatten()
    }

    /// Look up a key, distinguishing "absent" (`None`) from "null" (`Some(None)`).
    #[inline]
    pub fn lookup(&self, key: &str) -> Option<Option<&str>> {
        self.inner
            .iter()
            .find(|(k, _)| k == key)
            .map(|(_, v)| v.as_deref())
    }

    /// Check if a key exists, null or not.
    #[inline]
    pub fn contains_key(&self, key: &str) -> bool {
        self.inner.iter().any(|(k, _)| k == key)
    }

    /// Remove a value, returning it if it was present.
    pub fn remove(&mut self, key: &str) -> Option<Option<String>> {
        let index = self.inner.iter().position(|(k, _)| k == key)?;
        Some(self.inner.remove(index).1)
    }

    /// Whether these values address the service document or the metadata document.
    ///
    /// True when the service path is present and either null or `$metadata`,
    /// compared ASCII case-insensitively like resource paths.
    pub fn is_service_document_or_metadata(&self) -> bool {
        match self.lookup(SERVICE_PATH) {
            Some(None) => true,
            Some(Some(path)) => path.eq_ignore_ascii_case(METADATA_PATH),
            None => false,
        }
    }

    /// Check if the collection is empty.
    #[inline]
    pub fn is_empty(&self) -> bool {
        self.inner.is_empty()
    }

    /// Get the number of values.
    #[inline]
    pub fn len(&self) -> usize {
        self.inner.len()
    }

    /// Iterate over name/value pairs.
    pub fn iter(&self) -> impl Iterator<Item = (&str, Option<&str>)> {
        self.inner.iter().map(|(k, v)| (k.as_str(), v.as_deref()))
    }

    /// Copy every value from `other`, overwriting values with the same name.
    pub fn extend_from(&mut self, other: &RouteValues) {
        for (key, value) in &other.inner {
            self.set(key.clone(), value.clone());
        }
    }
}

impl<'a> FromIterator<(&'a str, &'a str)> for RouteValues {
    fn from_iter<I: IntoIterator<Item = (&'a str, &'a str)>>(iter: I) -> Self {
        let mut values = Self::new();
        for (key, value) in iter {
            values.insert(key, value);
        }
        values
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_small_values_on_stack() {
        let mut values = RouteValues::new();
        values.insert("id", "42");
        values.insert_null(SERVICE_PATH);

        assert_eq!(values.get("id"), Some("42"));
        assert_eq!(values.lookup(SERVICE_PATH), Some(None));
        assert_eq!(values.get(SERVICE_PATH), None);
        assert!(values.contains_key(SERVICE_PATH));
        assert!(!values.inner.spilled());
    }

    #[test]
    fn test_insert_replaces_existing() {
        let mut values = RouteValues::new();
        values.insert("id", "1");
        values.insert("id", "2");

        assert_eq!(values.len(), 1);
        assert_eq!(values.get("id"), Some("2"));
    }

    #[test]
    fn test_service_document_detection() {
        let mut values = RouteValues::new();
        assert!(!values.is_service_document_or_metadata());

        values.insert_null(SERVICE_PATH);
        assert!(values.is_service_document_or_metadata());

        values.insert(SERVICE_PATH, METADATA_PATH);
        assert!(values.is_service_document_or_metadata());

        values.insert(SERVICE_PATH, "$Metadata");
        assert!(values.is_service_document_or_metadata());

        values.insert(SERVICE_PATH, "orders/1");
        assert!(!values.is_service_document_or_metadata());
    }

    #[test]
    fn test_from_iterator_and_remove() {
        let mut values: RouteValues = [("a", "1"), ("b", "2")].into_iter().collect();

        assert_eq!(values.remove("a"), Some(Some("1".to_string())));
        assert_eq!(values.remove("a"), None);
        assert_eq!(values.len(), 1);
    }
}
