//! Semantic version triples.

use regex::Regex;
use serde::de::{self, Visitor};
use serde::{Deserialize, Deserializer, Serialize, Serializer};
use std::fmt;
use std::str::FromStr;
use std::sync::LazyLock;

static VERSION_REGEX: LazyLock<Regex> =
    LazyLock::new(|| Regex::new(r"(\d+)\.(\d+)(?:\.(\d+))?").unwrap());

/// A `major.minor.patch` version.
///
/// Ordering is lexicographic over the three components, so
/// `3.10.0 > 3.9.18`.
#[derive(Debug, Clone, Copy, PartialEq, Eq, PartialOrd, Ord, Hash)]
pub struct Version {
    pub major: u64,
    pub minor: u64,
    pub patch: u64,
}

impl Version {
    /// Create a version from its components.
    pub const fn new(major: u64, minor: u64, patch: u64) -> Self {
        Self {
            major,
            minor,
            patch,
        }
    }

    /// Find the first `X.Y[.Z]` triple in free-form tool output.
    ///
    /// ```
    /// use tracker_setup::runtime::Version;
    ///
    /// let v = Version::extract("Python 3.10.4").unwrap();
    /// assert_eq!(v, Version::new(3, 10, 4));
    /// ```
    pub fn extract(text: &str) -> Option<Self> {
        let caps = VERSION_REGEX.captures(text)?;
        let part = |i: usize| -> Option<u64> {
            match caps.get(i) {
                Some(m) => m.as_str().parse().ok(),
                None => Some(0),
            }
        };
        Some(Self::new(part(1)?, part(2)?, part(3)?))
    }

    /// Whether this version satisfies `minimum` (equal counts).
    pub fn satisfies(&self, minimum: &Version) -> bool {
        self >= minimum
    }
}

impl fmt::Display for Version {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{}.{}.{}", self.major, self.minor, self.patch)
    }
}

impl FromStr for Version {
    type Err = String;

    /// Parse `X`, `X.Y` or `X.Y.Z`; missing components are zero.
    fn from_str(s: &str) -> Result<Self, Self::Err> {
        let trimmed = s.trim().trim_start_matches('v');
        let parts: Vec<&str> = trimmed.split('.').collect();
        if parts.is_empty() || parts.len() > 3 || parts.iter().any(|p| p.is_empty()) {
            return Err(format!("invalid version '{}': expected X.Y.Z", s));
        }

        let mut nums = [0u64; 3];
        for (i, part) in parts.iter().enumerate() {
            nums[i] = part
                .parse()
                .map_err(|_| format!("invalid version '{}': '{}' is not a number", s, part))?;
        }

        Ok(Self::new(nums[0], nums[1], nums[2]))
    }
}

impl Serialize for Version {
    fn serialize<S: Serializer>(&self, serializer: S) -> Result<S::Ok, S::Error> {
        serializer.serialize_str(&self.to_string())
    }
}

impl<'de> Deserialize<'de> for Version {
    fn deserialize<D: Deserializer<'de>>(deserializer: D) -> Result<Self, D::Error> {
        deserializer.deserialize_any(VersionVisitor)
    }
}

struct VersionVisitor;

impl Visitor<'_> for VersionVisitor {
    type Value = Version;

    fn expecting(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str("a quoted version string such as \"3.8.0\"")
    }

    fn visit_str<E: de::Error>(self, v: &str) -> Result<Version, E> {
        v.parse().map_err(E::custom)
    }

    fn visit_u64<E: de::Error>(self, v: u64) -> Result<Version, E> {
        Ok(Version::new(v, 0, 0))
    }

    fn visit_i64<E: de::Error>(self, v: i64) -> Result<Version, E> {
        u64::try_from(v)
            .map(|major| Version::new(major, 0, 0))
            .map_err(|_| E::invalid_value(de::Unexpected::Signed(v), &self))
    }

    // `3.10` as a YAML float is 3.1; refuse rather than guess.
    fn visit_f64<E: de::Error>(self, v: f64) -> Result<Version, E> {
        Err(E::invalid_type(de::Unexpected::Float(v), &self))
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn parses_full_triple() {
        assert_eq!("3.10.4".parse::<Version>(), Ok(Version::new(3, 10, 4)));
    }

    #[test]
    fn missing_components_default_to_zero() {
        assert_eq!("3.8".parse::<Version>(), Ok(Version::new(3, 8, 0)));
        assert_eq!("3".parse::<Version>(), Ok(Version::new(3, 0, 0)));
    }

    #[test]
    fn rejects_garbage() {
        assert!("".parse::<Version>().is_err());
        assert!("abc".parse::<Version>().is_err());
        assert!("3..1".parse::<Version>().is_err());
        assert!("1.2.3.4".parse::<Version>().is_err());
    }

    #[test]
    fn ordering_is_numeric_not_lexical() {
        assert!(Version::new(3, 10, 0) > Version::new(3, 9, 18));
        assert!(Version::new(4, 0, 0) > Version::new(3, 99, 99));
    }

    #[test]
    fn equal_to_minimum_satisfies() {
        let min = Version::new(3, 8, 0);
        assert!(Version::new(3, 8, 0).satisfies(&min));
    }

    #[test]
    fn one_patch_below_minimum_fails() {
        let min = Version::new(3, 8, 1);
        assert!(!Version::new(3, 8, 0).satisfies(&min));
        assert!(Version::new(3, 8, 2).satisfies(&min));
    }

    #[test]
    fn extracts_from_banner() {
        assert_eq!(
            Version::extract("Python 3.10.4\n"),
            Some(Version::new(3, 10, 4))
        );
        assert_eq!(
            Version::extract("Python 3.13.0rc1"),
            Some(Version::new(3, 13, 0))
        );
        assert_eq!(Version::extract("Python 3.9"), Some(Version::new(3, 9, 0)));
    }

    #[test]
    fn extract_returns_none_without_version() {
        assert_eq!(Version::extract("command not found"), None);
        assert_eq!(Version::extract(""), None);
    }

    #[test]
    fn display_roundtrips_through_parse() {
        let v = Version::new(3, 12, 1);
        assert_eq!(v.to_string().parse::<Version>(), Ok(v));
    }

    #[test]
    fn deserializes_from_quoted_string() {
        let v: Version = serde_yaml::from_str("\"3.10\"").unwrap();
        assert_eq!(v, Version::new(3, 10, 0));
    }

    #[test]
    fn deserializes_from_integer() {
        let v: Version = serde_yaml::from_str("3").unwrap();
        assert_eq!(v, Version::new(3, 0, 0));
    }

    #[test]
    fn rejects_unquoted_float() {
        let err = serde_yaml::from_str::<Version>("3.10").unwrap_err();
        assert!(err.to_string().contains("quoted version"));
    }
}
