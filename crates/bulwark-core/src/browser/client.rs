use super::version::Version;
use regex::Regex;
use std::fmt;
use std::sync::OnceLock;
use thiserror::Error;

/// Product tokens for well-known browser families, most specific first.
///
/// Chromium derivatives also advertise `Chrome/` and `Safari/`, so they have
/// to be recognised before those two.
const FAMILIES: &[(&str, &str)] = &[
    ("Edge", r"(?i)\b(?:Edg|Edge|EdgA|EdgiOS)[/ ](\d+)(?:\.(\d+))?"),
    ("Opera", r"(?i)\b(?:OPR|Opera)[/ ](\d+)(?:\.(\d+))?"),
    ("Firefox", r"(?i)\b(?:Firefox|FxiOS)[/ ](\d+)(?:\.(\d+))?"),
    ("Chrome", r"(?i)\b(?:Chrome|CriOS)[/ ](\d+)(?:\.(\d+))?"),
    ("Internet Explorer", r"(?i)(?:\bMSIE |\bTrident/.*?\brv:)(\d+)(?:\.(\d+))?"),
    ("Safari", r"(?i)\bVersion/(\d+)(?:\.(\d+))?.*\bSafari\b"),
];

/// Leading `Vendor/X.Y` or `Vendor X.Y` token for everything else.
const GENERIC: &str = r"^\s*([A-Za-z][A-Za-z0-9 _-]*?)[/ ]v?(\d+)(?:\.(\d+))?";

fn family_patterns() -> &'static [(&'static str, Regex)] {
    static PATTERNS: OnceLock<Vec<(&'static str, Regex)>> = OnceLock::new();
    PATTERNS.get_or_init(|| {
        FAMILIES
            .iter()
            .map(|(name, pattern)| (*name, Regex::new(pattern).expect("valid regex")))
            .collect()
    })
}

fn generic_pattern() -> &'static Regex {
    static PATTERN: OnceLock<Regex> = OnceLock::new();
    PATTERN.get_or_init(|| Regex::new(GENERIC).expect("valid regex"))
}

/// Why a client identifier could not be read.
#[derive(Debug, Clone, Error, PartialEq, Eq)]
pub enum ClientParseError {
    /// No client identification was sent.
    #[error("No client identification present")]
    Empty,

    /// No vendor and version could be found.
    #[error("Unrecognized client identification '{0}'")]
    Unrecognized(String),
}

/// Vendor family and version read from a client identifier.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct ClientVersion {
    /// Vendor family, e.g. `Firefox`.
    pub vendor: String,
    /// Major and minor version.
    pub version: Version,
}

impl ClientVersion {
    /// Creates a client version from its parts.
    #[must_use]
    pub fn new(vendor: impl Into<String>, version: Version) -> Self {
        Self {
            vendor: vendor.into(),
            version,
        }
    }

    /// Reads vendor and version from a `User-Agent` style string.
    ///
    /// ```
    /// use bulwark_core::browser::{ClientVersion, Version};
    ///
    /// let ua = "Mozilla/5.0 (X11; Linux x86_64; rv:57.0) Gecko/20100101 Firefox/57.0";
    /// let client = ClientVersion::parse(ua).unwrap();
    /// assert_eq!(client.vendor, "Firefox");
    /// assert_eq!(client.version, Version::new(57, 0));
    /// ```
    pub fn parse(identifier: &str) -> Result<Self, ClientParseError> {
        let identifier = identifier.trim();
        if identifier.is_empty() {
            return Err(ClientParseError::Empty);
        }

        for (family, pattern) in family_patterns() {
            if let Some(caps) = pattern.captures(identifier) {
                if let Some(version) = version_from(caps.get(1), caps.get(2)) {
                    return Ok(Self::new(*family, version));
                }
            }
        }

        generic_pattern()
            .captures(identifier)
            .and_then(|caps| {
                let vendor = caps.get(1)?.as_str().trim();
                let version = version_from(caps.get(2), caps.get(3))?;
                Some(Self::new(vendor, version))
            })
            .ok_or_else(|| ClientParseError::Unrecognized(identifier.to_string()))
    }
}

fn version_from(major: Option<regex::Match<'_>>, minor: Option<regex::Match<'_>>) -> Option<Version> {
    let major = major?.as_str().parse().ok()?;
    let minor = match minor {
        Some(m) => m.as_str().parse().ok()?,
        None => 0,
    };
    Some(Version::new(major, minor))
}

impl fmt::Display for ClientVersion {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{} {}", self.vendor, self.version)
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn parse(ua: &str) -> ClientVersion {
        ClientVersion::parse(ua).unwrap()
    }

    #[test]
    fn test_short_form() {
        assert_eq!(parse("Firefox 57.1"), ClientVersion::new("Firefox", Version::new(57, 1)));
        assert_eq!(parse("Firefox/3.6"), ClientVersion::new("Firefox", Version::new(3, 6)));
    }

    #[test]
    fn test_real_user_agents() {
        let chrome = "Mozilla/5.0 (Windows NT 10.0; Win64; x64) AppleWebKit/537.36 \
                      (KHTML, like Gecko) Chrome/120.0.6099.109 Safari/537.36";
        assert_eq!(parse(chrome), ClientVersion::new("Chrome", Version::new(120, 0)));

        let edge = "Mozilla/5.0 (Windows NT 10.0; Win64; x64) AppleWebKit/537.36 \
                    (KHTML, like Gecko) Chrome/120.0.0.0 Safari/537.36 Edg/120.0.2210.91";
        assert_eq!(parse(edge).vendor, "Edge");

        let safari = "Mozilla/5.0 (Macintosh; Intel Mac OS X 10_15_7) AppleWebKit/605.1.15 \
                      (KHTML, like Gecko) Version/17.2 Safari/605.1.15";
        assert_eq!(parse(safari), ClientVersion::new("Safari", Version::new(17, 2)));

        let ie = "Mozilla/5.0 (Windows NT 6.1; Trident/7.0; rv:11.0) like Gecko";
        assert_eq!(parse(ie), ClientVersion::new("Internet Explorer", Version::new(11, 0)));
    }

    #[test]
    fn test_generic_vendor() {
        assert_eq!(parse("curl/8.4.0"), ClientVersion::new("curl", Version::new(8, 4)));
        assert_eq!(parse("Netscape 4"), ClientVersion::new("Netscape", Version::new(4, 0)));
    }

    #[test]
    fn test_failures() {
        assert_eq!(ClientVersion::parse(""), Err(ClientParseError::Empty));
        assert_eq!(ClientVersion::parse("   "), Err(ClientParseError::Empty));
        assert!(matches!(
            ClientVersion::parse("Firefox"),
            Err(ClientParseError::Unrecognized(_))
        ));
        assert!(matches!(
            ClientVersion::parse("???"),
            Err(ClientParseError::Unrecognized(_))
        ));
    }
}
