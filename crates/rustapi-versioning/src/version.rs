//! API version type and parsing
//!
//! An [`ApiVersion`] is a `major.minor` pair with an optional status label,
//! rendered canonically as `"{major}.{minor}[-status]"`.
//!
//! Status labels compare ASCII case-insensitively (`1.0-Beta == 1.0-beta`) and
//! keep their original casing for display. For the same `major.minor`, a
//! version without a status sorts after every version carrying one, so
//! pre-release labels order below the release they precede.

use serde::{de, Deserialize, Deserializer, Serialize, Serializer};
use std::cmp::Ordering;
use std::fmt;
use std::hash::{Hash, Hasher};
use std::str::FromStr;
use thiserror::Error;

/// API version
///
/// Supports formats like:
/// - `1`, `v1` (major only, minor defaults to 0)
/// - `1.0`, `v1.2` (major.minor)
/// - `1.0-beta`, `2-rc1` (with status label)
#[derive(Debug, Clone)]
pub struct ApiVersion {
    major: u32,
    minor: u32,
    status: Option<String>,
}

impl ApiVersion {
    /// Create a new version without a status label
    pub fn new(major: u32, minor: u32) -> Self {
        Self {
            major,
            minor,
            status: None,
        }
    }

    /// Create a version with only a major number
    pub fn major(major: u32) -> Self {
        Self::new(major, 0)
    }

    /// Create a version carrying a status label such as `beta` or `rc1`
    pub fn with_status(
        major: u32,
        minor: u32,
        status: impl Into<String>,
    ) -> Result<Self, VersionParseError> {
        let status = status.into();
        validate_status(&status)?;
        Ok(Self {
            major,
            minor,
            status: Some(status),
        })
    }

    /// Create version 1.0
    pub fn v1() -> Self {
        Self::new(1, 0)
    }

    /// Create version 2.0
    pub fn v2() -> Self {
        Self::new(2, 0)
    }

    /// Major version number
    pub fn major_version(&self) -> u32 {
        self.major
    }

    /// Minor version number
    pub fn minor_version(&self) -> u32 {
        self.minor
    }

    /// Status label, if any
    pub fn status(&self) -> Option<&str> {
        self.status.as_deref()
    }

    /// Format as path segment (e.g., "v1", "v1.2", "v2.0-beta")
    pub fn as_path_segment(&self) -> String {
        match &self.status {
            Some(status) => format!("v{}.{}-{}", self.major, self.minor, status),
            None if self.minor == 0 => format!("v{}", self.major),
            None => format!("v{}.{}", self.major, self.minor),
        }
    }
}

impl Default for ApiVersion {
    fn default() -> Self {
        Self::v1()
    }
}

impl fmt::Display for ApiVersion {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{}.{}", self.major, self.minor)?;
        if let Some(status) = &self.status {
            write!(f, "-{}", status)?;
        }
        Ok(())
    }
}

impl FromStr for ApiVersion {
    type Err = VersionParseError;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        let input = s.trim();
        if input.is_empty() {
            return Err(VersionParseError::Empty);
        }

        // Remove optional 'v' prefix
        let body = input
            .strip_prefix('v')
            .or_else(|| input.strip_prefix('V'))
            .unwrap_or(input);

        let (numbers, status) = match body.split_once('-') {
            Some((numbers, status)) => (numbers, Some(status)),
            None => (body, None),
        };

        if let Some(status) = status {
            validate_status(status)?;
        }

        let mut parts = numbers.split('.');
        let major = parse_number(parts.next().unwrap_or_default(), input)?;
        let minor = match parts.next() {
            Some(part) => parse_number(part, input)?,
            None => 0,
        };

        if parts.next().is_some() {
            return Err(VersionParseError::InvalidFormat(input.to_string()));
        }

        Ok(Self {
            major,
            minor,
            status: status.map(str::to_string),
        })
    }
}

fn parse_number(part: &str, input: &str) -> Result<u32, VersionParseError> {
    if part.is_empty() || !part.bytes().all(|b| b.is_ascii_digit()) {
        return Err(VersionParseError::InvalidNumber(input.to_string()));
    }
    part.parse()
        .map_err(|_| VersionParseError::InvalidNumber(input.to_string()))
}

fn validate_status(status: &str) -> Result<(), VersionParseError> {
    if status.is_empty() || !status.bytes().all(|b| b.is_ascii_alphanumeric()) {
        return Err(VersionParseError::InvalidStatus(status.to_string()));
    }
    Ok(())
}

fn compare_status(a: &Option<String>, b: &Option<String>) -> Ordering {
    match (a, b) {
        (None, None) => Ordering::Equal,
        (None, Some(_)) => Ordering::Greater,
        (Some(_), None) => Ordering::Less,
        (Some(a), Some(b)) => a
            .bytes()
            .map(|c| c.to_ascii_lowercase())
            .cmp(b.bytes().map(|c| c.to_ascii_lowercase())),
    }
}

impl PartialEq for ApiVersion {
    fn eq(&self, other: &Self) -> bool {
        self.cmp(other) == Ordering::Equal
    }
}

impl Eq for ApiVersion {}

impl Hash for ApiVersion {
    fn hash<H: Hasher>(&self, state: &mut H) {
        self.major.hash(state);
        self.minor.hash(state);
        match &self.status {
            Some(status) => {
                state.write_u8(1);
                for byte in status.bytes() {
                    state.write_u8(byte.to_ascii_lowercase());
                }
            }
            None => state.write_u8(0),
        }
    }
}

impl PartialOrd for ApiVersion {
    fn partial_cmp(&self, other: &Self) -> Option<Ordering> {
        Some(self.cmp(other))
    }
}

impl Ord for ApiVersion {
    fn cmp(&self, other: &Self) -> Ordering {
        self.major
            .cmp(&other.major)
            .then_with(|| self.minor.cmp(&other.minor))
            .then_with(|| compare_status(&self.status, &other.status))
    }
}

impl Serialize for ApiVersion {
    fn serialize<S: Serializer>(&self, serializer: S) -> Result<S::Ok, S::Error> {
        serializer.collect_str(self)
    }
}

impl<'de> Deserialize<'de> for ApiVersion {
    fn deserialize<D: Deserializer<'de>>(deserializer: D) -> Result<Self, D::Error> {
        let raw = String::deserialize(deserializer)?;
        raw.parse().map_err(de::Error::custom)
    }
}

/// Error type for version parsing
#[derive(Debug, Clone, PartialEq, Eq, Error)]
pub enum VersionParseError {
    /// Empty version string
    #[error("empty version string")]
    Empty,
    /// Invalid number in version string
    #[error("invalid number in version '{0}'")]
    InvalidNumber(String),
    /// More components than `major.minor`
    #[error("invalid version format '{0}'")]
    InvalidFormat(String),
    /// Status label is empty or not alphanumeric
    #[error("invalid version status '{0}'")]
    InvalidStatus(String),
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::collections::HashSet;

    #[test]
    fn test_version_parsing() {
        assert_eq!("1".parse::<ApiVersion>().unwrap(), ApiVersion::major(1));
        assert_eq!("v1".parse::<ApiVersion>().unwrap(), ApiVersion::major(1));
        assert_eq!("1.2".parse::<ApiVersion>().unwrap(), ApiVersion::new(1, 2));
        assert_eq!("V2".parse::<ApiVersion>().unwrap(), ApiVersion::major(2));
        assert_eq!(
            "2.0-beta".parse::<ApiVersion>().unwrap(),
            ApiVersion::with_status(2, 0, "beta").unwrap()
        );
        assert_eq!(
            "3-rc1".parse::<ApiVersion>().unwrap(),
            ApiVersion::with_status(3, 0, "rc1").unwrap()
        );
    }

    #[test]
    fn test_version_parsing_errors() {
        assert_eq!("".parse::<ApiVersion>(), Err(VersionParseError::Empty));
        assert!("x".parse::<ApiVersion>().is_err());
        assert!("v".parse::<ApiVersion>().is_err());
        assert!("1.".parse::<ApiVersion>().is_err());
        assert!("+1.0".parse::<ApiVersion>().is_err());
        assert!(matches!(
            "1.2.3".parse::<ApiVersion>(),
            Err(VersionParseError::InvalidFormat(_))
        ));
        assert!(matches!(
            "1.0-".parse::<ApiVersion>(),
            Err(VersionParseError::InvalidStatus(_))
        ));
        assert!(matches!(
            "1.0-be.ta".parse::<ApiVersion>(),
            Err(VersionParseError::InvalidStatus(_))
        ));
    }

    #[test]
    fn test_version_comparison() {
        assert!(ApiVersion::new(2, 0) > ApiVersion::new(1, 0));
        assert!(ApiVersion::new(1, 1) > ApiVersion::new(1, 0));
        assert!(ApiVersion::with_status(1, 0, "alpha").unwrap() < ApiVersion::new(1, 0));
        assert!(
            ApiVersion::with_status(1, 0, "alpha").unwrap()
                < ApiVersion::with_status(1, 0, "beta").unwrap()
        );
    }

    #[test]
    fn test_status_is_case_insensitive() {
        let upper = ApiVersion::with_status(1, 0, "Beta").unwrap();
        let lower = ApiVersion::with_status(1, 0, "beta").unwrap();

        assert_eq!(upper, lower);
        assert_eq!(upper.cmp(&lower), Ordering::Equal);

        let set: HashSet<_> = [upper.clone(), lower].into_iter().collect();
        assert_eq!(set.len(), 1);

        // original casing is preserved for display
        assert_eq!(upper.to_string(), "1.0-Beta");
    }

    #[test]
    fn test_version_display() {
        assert_eq!(ApiVersion::new(1, 2).to_string(), "1.2");
        assert_eq!(ApiVersion::major(3).to_string(), "3.0");
        assert_eq!(
            ApiVersion::with_status(2, 1, "rc1").unwrap().to_string(),
            "2.1-rc1"
        );
    }

    #[test]
    fn test_version_as_path_segment() {
        assert_eq!(ApiVersion::major(1).as_path_segment(), "v1");
        assert_eq!(ApiVersion::new(1, 2).as_path_segment(), "v1.2");
        assert_eq!(
            ApiVersion::with_status(2, 0, "beta").unwrap().as_path_segment(),
            "v2.0-beta"
        );
    }

    #[test]
    fn test_version_serde() {
        let version = ApiVersion::with_status(2, 1, "beta").unwrap();
        let json = serde_json::to_string(&version).unwrap();
        assert_eq!(json, "\"2.1-beta\"");

        let back: ApiVersion = serde_json::from_str(&json).unwrap();
        assert_eq!(back, version);

        assert!(serde_json::from_str::<ApiVersion>("\"nope\"").is_err());
    }
}
