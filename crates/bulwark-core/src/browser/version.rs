use std::fmt;
use std::str::FromStr;
use thiserror::Error;

/// A two-part `major.minor` version.
///
/// Ordering is lexicographic on `(major, minor)`.
#[derive(Debug, Clone, Copy, PartialEq, Eq, PartialOrd, Ord, Hash)]
pub struct Version {
    /// Major component.
    pub major: u32,
    /// Minor component.
    pub minor: u32,
}

/// Error returned when a version string is malformed.
#[derive(Debug, Clone, Error, PartialEq, Eq)]
#[error("Invalid version '{0}': expected 'major' or 'major.minor'")]
pub struct VersionParseError(pub String);

impl Version {
    /// Creates a version.
    #[must_use]
    pub const fn new(major: u32, minor: u32) -> Self {
        Self { major, minor }
    }
}

impl FromStr for Version {
    type Err = VersionParseError;

    /// Parses `"X.Y"` or `"X"` (read as `X.0`).
    fn from_str(s: &str) -> Result<Self, Self::Err> {
        let err = || VersionParseError(s.to_string());
        let trimmed = s.trim();
        let (major, minor) = match trimmed.split_once('.') {
            Some((major, minor)) => (major, minor),
            None => (trimmed, "0"),
        };
        let digits = |part: &str| !part.is_empty() && part.bytes().all(|b| b.is_ascii_digit());
        if !digits(major) || !digits(minor) {
            return Err(err());
        }
        Ok(Self {
            major: major.parse().map_err(|_| err())?,
            minor: minor.parse().map_err(|_| err())?,
        })
    }
}

impl fmt::Display for Version {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{}.{}", self.major, self.minor)
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_parse() {
        assert_eq!("3.6".parse(), Ok(Version::new(3, 6)));
        assert_eq!("57".parse(), Ok(Version::new(57, 0)));
        assert_eq!(" 10.15 ".parse(), Ok(Version::new(10, 15)));
    }

    #[test]
    fn test_parse_rejects_garbage() {
        for input in ["", "x", "3.", ".6", "3.6.1", "3.a", "-1.0", "99999999999.0"] {
            assert!(input.parse::<Version>().is_err(), "accepted {input:?}");
        }
    }

    #[test]
    fn test_ordering_is_lexicographic() {
        assert!(Version::new(3, 5) < Version::new(3, 6));
        assert!(Version::new(3, 10) > Version::new(3, 6));
        assert!(Version::new(2, 99) < Version::new(3, 0));
    }
}
