use super::client::ClientVersion;
use super::version::{Version, VersionParseError};
use std::fmt;
use thiserror::Error;

/// Version condition of a [`BrowserRule`].
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum VersionPredicate {
    /// Matches exactly this version (`"X.Y"`).
    ExactMatch(Version),
    /// Matches any version up to and including this one (`"<=X.Y"`).
    LessThanOrEqual(Version),
    /// Matches any version with this major component (`"X.x"`).
    MajorRange(u32),
}

impl VersionPredicate {
    /// Parses a configured version string.
    pub fn parse(spec: &str) -> Result<Self, RuleParseError> {
        let spec = spec.trim();
        if spec.is_empty() {
            return Err(RuleParseError::EmptyVersion);
        }

        if let Some(max) = spec.strip_prefix("<=") {
            return Ok(Self::LessThanOrEqual(max.parse()?));
        }

        if let Some(major) = spec
            .strip_suffix(".x")
            .or_else(|| spec.strip_suffix(".X"))
        {
            let major = major
                .trim()
                .parse::<u32>()
                .map_err(|_| RuleParseError::InvalidMajor(spec.to_string()))?;
            return Ok(Self::MajorRange(major));
        }

        Ok(Self::ExactMatch(spec.parse()?))
    }

    /// Returns `true` if `version` satisfies the predicate.
    #[must_use]
    pub fn matches(&self, version: Version) -> bool {
        match *self {
            Self::ExactMatch(expected) => version == expected,
            Self::LessThanOrEqual(max) => version <= max,
            Self::MajorRange(major) => version.major == major,
        }
    }
}

impl fmt::Display for VersionPredicate {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Self::ExactMatch(v) => write!(f, "{v}"),
            Self::LessThanOrEqual(v) => write!(f, "<={v}"),
            Self::MajorRange(major) => write!(f, "{major}.x"),
        }
    }
}

/// Errors raised while parsing a configured browser rule.
#[derive(Debug, Clone, Error, PartialEq, Eq)]
pub enum RuleParseError {
    /// The vendor name was blank.
    #[error("Browser rule has an empty vendor")]
    EmptyVendor,

    /// The version string was blank.
    #[error("Browser rule has an empty version")]
    EmptyVersion,

    /// The major component of a `X.x` range was not a number.
    #[error("Invalid major version range '{0}'")]
    InvalidMajor(String),

    /// The version itself was malformed.
    #[error(transparent)]
    Version(#[from] VersionParseError),
}

/// A vendor paired with a version predicate.
///
/// ```
/// use bulwark_core::browser::{BrowserRule, ClientVersion};
///
/// let rule = BrowserRule::parse("Firefox", "57.x").unwrap();
/// let client = ClientVersion::parse("Firefox 57.1").unwrap();
/// assert!(rule.matches(&client));
/// ```
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct BrowserRule {
    vendor: String,
    predicate: VersionPredicate,
}

impl BrowserRule {
    /// Creates a rule from its parts.
    #[must_use]
    pub fn new(vendor: impl Into<String>, predicate: VersionPredicate) -> Self {
        Self {
            vendor: vendor.into(),
            predicate,
        }
    }

    /// Parses a rule from a vendor name and a configured version string.
    pub fn parse(vendor: &str, version_spec: &str) -> Result<Self, RuleParseError> {
        let vendor = vendor.trim();
        if vendor.is_empty() {
            return Err(RuleParseError::EmptyVendor);
        }
        Ok(Self::new(vendor, VersionPredicate::parse(version_spec)?))
    }

    /// Vendor this rule applies to.
    #[must_use]
    pub fn vendor(&self) -> &str {
        &self.vendor
    }

    /// Version predicate.
    #[must_use]
    pub fn predicate(&self) -> VersionPredicate {
        self.predicate
    }

    /// Returns `true` when the vendor matches (ignoring case) and the
    /// predicate holds.
    #[must_use]
    pub fn matches(&self, client: &ClientVersion) -> bool {
        self.vendor.eq_ignore_ascii_case(&client.vendor) && self.predicate.matches(client.version)
    }
}

impl fmt::Display for BrowserRule {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{} {}", self.vendor, self.predicate)
    }
}
