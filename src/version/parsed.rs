use regex::Regex;
use std::cmp::Ordering;
use std::fmt;
use std::str::FromStr;
use std::sync::LazyLock;

static RE_VERSION: LazyLock<Regex> =
    LazyLock::new(|| Regex::new(r"^([0-9]+)\.([0-9]+)\.([0-9]+)(?:-(.+))?$").unwrap());

/// A strict `major.minor.patch[-prerelease]` version.
///
/// Partial versions (`5`, `5.1`) and a leading `v` are rejected here; those
/// belong to range syntax.
#[derive(Debug, Clone, PartialEq, Eq, Hash)]
pub struct ParsedVersion {
    pub major: u64,
    pub minor: u64,
    pub patch: u64,
    pub prerelease: Option<String>,
}

/// Returned when a string is not a strict version.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct NotAVersion(pub String);

impl fmt::Display for NotAVersion {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "not a version: {}", self.0)
    }
}

impl std::error::Error for NotAVersion {}

impl ParsedVersion {
    pub fn new(major: u64, minor: u64, patch: u64) -> Self {
        Self {
            major,
            minor,
            patch,
            prerelease: None,
        }
    }

    pub fn with_prerelease(mut self, prerelease: impl Into<String>) -> Self {
        self.prerelease = Some(prerelease.into());
        self
    }

    pub fn parse(s: &str) -> Result<Self, NotAVersion> {
        let caps = RE_VERSION
            .captures(s)
            .ok_or_else(|| NotAVersion(s.to_string()))?;

        // Components wider than u64 are rejected rather than wrapped.
        let component = |idx: usize| {
            caps[idx]
                .parse::<u64>()
                .map_err(|_| NotAVersion(s.to_string()))
        };

        Ok(Self {
            major: component(1)?,
            minor: component(2)?,
            patch: component(3)?,
            prerelease: caps.get(4).map(|m| m.as_str().to_string()),
        })
    }

    pub fn is_prerelease(&self) -> bool {
        self.prerelease.is_some()
    }

    /// Precedence order used by every range comparison.
    ///
    /// Numeric components decide first. At an equal `major.minor.patch` a
    /// prerelease sorts below the release, and two prereleases are equal
    /// whatever their suffixes say. The suffix is never split into
    /// dot-separated identifiers, so this is coarser than full semver
    /// precedence; findings depend on exactly this behaviour.
    pub fn compare(&self, other: &Self) -> Ordering {
        self.major
            .cmp(&other.major)
            .then(self.minor.cmp(&other.minor))
            .then(self.patch.cmp(&other.patch))
            .then_with(|| match (&self.prerelease, &other.prerelease) {
                (None, None) | (Some(_), Some(_)) => Ordering::Equal,
                (Some(_), None) => Ordering::Less,
                (None, Some(_)) => Ordering::Greater,
            })
    }
}

impl FromStr for ParsedVersion {
    type Err = NotAVersion;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        Self::parse(s)
    }
}

impl fmt::Display for ParsedVersion {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{}.{}.{}", self.major, self.minor, self.patch)?;
        if let Some(pre) = &self.prerelease {
            write!(f, "-{}", pre)?;
        }
        Ok(())
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use proptest::prelude::*;

    #[test]
    fn test_parse_release() {
        let v = ParsedVersion::parse("5.11.3").unwrap();
        assert_eq!(v, ParsedVersion::new(5, 11, 3));
        assert!(!v.is_prerelease());
    }

    #[test]
    fn test_parse_prerelease_keeps_whole_suffix() {
        let v = ParsedVersion::parse("1.0.0-beta.2-rc").unwrap();
        assert_eq!(v.prerelease.as_deref(), Some("beta.2-rc"));
        assert_eq!(v.to_string(), "1.0.0-beta.2-rc");
    }

    #[test]
    fn test_parse_rejects_non_versions() {
        for input in ["", "5", "5.11", "v5.11.3", "5.11.3-", "latest", "5.x.0", " 5.11.3", "^5.0.0"] {
            assert!(ParsedVersion::parse(input).is_err(), "{input:?} should not parse");
        }
    }

    #[test]
    fn test_parse_wide_components() {
        let v = ParsedVersion::parse("4294967296.0.18446744073709551615").unwrap();
        assert_eq!(v.major, 4_294_967_296);
        assert_eq!(v.patch, u64::MAX);

        // One past u64::MAX must not wrap around to zero.
        assert!(ParsedVersion::parse("0.0.18446744073709551616").is_err());
    }

    #[test]
    fn test_compare_numeric_components() {
        let v = |s: &str| ParsedVersion::parse(s).unwrap();
        assert_eq!(v("1.2.3").compare(&v("1.2.3")), Ordering::Equal);
        assert_eq!(v("2.0.0").compare(&v("1.99.99")), Ordering::Greater);
        assert_eq!(v("1.10.0").compare(&v("1.9.0")), Ordering::Greater);
        assert_eq!(v("1.2.3").compare(&v("1.2.10")), Ordering::Less);
    }

    #[test]
    fn test_compare_prerelease_below_release() {
        let v = |s: &str| ParsedVersion::parse(s).unwrap();
        assert_eq!(v("1.0.0-alpha").compare(&v("1.0.0")), Ordering::Less);
        assert_eq!(v("1.0.0").compare(&v("1.0.0-alpha")), Ordering::Greater);
        assert_eq!(v("1.0.1-alpha").compare(&v("1.0.0")), Ordering::Greater);
    }

    #[test]
    fn test_compare_prereleases_ignore_suffix() {
        let v = |s: &str| ParsedVersion::parse(s).unwrap();
        assert_eq!(v("1.0.0-alpha").compare(&v("1.0.0-beta")), Ordering::Equal);
        assert_eq!(v("1.0.0-rc.10").compare(&v("1.0.0-rc.2")), Ordering::Equal);
        // Equality still looks at the suffix.
        assert_ne!(v("1.0.0-alpha"), v("1.0.0-beta"));
    }

    #[test]
    fn test_compare_agrees_with_semver_for_releases() {
        let samples = ["0.0.0", "0.0.1", "0.1.0", "0.10.2", "1.0.0", "1.2.3", "1.10.0", "2.0.0", "10.0.0"];
        for a in samples {
            for b in samples {
                let ours = ParsedVersion::parse(a).unwrap().compare(&ParsedVersion::parse(b).unwrap());
                let theirs = semver::Version::parse(a).unwrap().cmp(&semver::Version::parse(b).unwrap());
                assert_eq!(ours, theirs, "{a} vs {b}");
            }
        }
    }

    #[test]
    fn test_parse_rejects_non_ascii_digits() {
        assert!(ParsedVersion::parse("\u{663}.0.0").is_err());
        assert!(ParsedVersion::parse("1.\u{ff10}.0").is_err());
    }

    proptest! {
        #[test]
        fn test_compare_is_reflexive(
            major in any::<u64>(),
            minor in any::<u64>(),
            patch in any::<u64>(),
            pre in proptest::option::of("[0-9A-Za-z][0-9A-Za-z.-]{0,11}"),
        ) {
            let text = match &pre {
                Some(pre) => format!("{major}.{minor}.{patch}-{pre}"),
                None => format!("{major}.{minor}.{patch}"),
            };
            let v = ParsedVersion::parse(&text).unwrap();
            prop_assert_eq!(v.compare(&v), Ordering::Equal);
        }

        #[test]
        fn test_compare_matches_semver_on_releases(
            a in (0u64..50, 0u64..50, 0u64..50),
            b in (0u64..50, 0u64..50, 0u64..50),
        ) {
            let ours = ParsedVersion::new(a.0, a.1, a.2).compare(&ParsedVersion::new(b.0, b.1, b.2));
            let theirs = semver::Version::new(a.0, a.1, a.2).cmp(&semver::Version::new(b.0, b.1, b.2));
            prop_assert_eq!(ours, theirs);
            prop_assert_eq!(
                ParsedVersion::new(b.0, b.1, b.2).compare(&ParsedVersion::new(a.0, a.1, a.2)),
                ours.reverse()
            );
        }
    }
}
