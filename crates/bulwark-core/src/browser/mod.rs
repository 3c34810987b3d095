//! Browser rule engine.
//!
//! Reads the vendor family and `major.minor` version from a client
//! identifier (normally the `User-Agent` header) and checks it against an
//! ordered list of [`BrowserRule`]s. The first matching rule marks the client
//! as invalid; a client that matches no rule is valid.
//!
//! Evaluation fails closed: a missing identifier, or one whose version
//! cannot be read, is invalid.
//!
//! # Configured rules
//!
//! | Version string | Predicate |
//! |---|---|
//! | `"<=3.6"` | [`VersionPredicate::LessThanOrEqual`] |
//! | `"57.x"` | [`VersionPredicate::MajorRange`] |
//! | `"45.0"` | [`VersionPredicate::ExactMatch`] |
//!
//! Malformed entries are logged and dropped when the rule set is built.

mod client;
mod rule;
mod version;

pub use client::{ClientParseError, ClientVersion};
pub use rule::{BrowserRule, RuleParseError, VersionPredicate};
pub use version::{Version, VersionParseError};

/// Ordered, immutable list of browser rules.
///
/// # Example
///
/// ```
/// use bulwark_core::browser::BrowserRuleSet;
///
/// let rules = BrowserRuleSet::from_config([("Firefox", vec!["<=3.6", "57.x"])]);
/// assert!(rules.evaluate("Firefox 3.5"));
/// assert!(rules.evaluate("Firefox 57.9"));
/// assert!(!rules.evaluate("Firefox 58.0"));
/// assert!(rules.evaluate(""));
/// ```
#[derive(Debug, Clone, Default)]
pub struct BrowserRuleSet {
    rules: Vec<BrowserRule>,
}

impl BrowserRuleSet {
    /// Creates a rule set from already parsed rules.
    #[must_use]
    pub fn new(rules: Vec<BrowserRule>) -> Self {
        Self { rules }
    }

    /// Builds a rule set from `(vendor, versions)` configuration entries.
    ///
    /// Every version string becomes one rule, in configured order. Entries
    /// that fail to parse are logged and skipped.
    pub fn from_config<I, V, S>(entries: I) -> Self
    where
        I: IntoIterator<Item = (V, Vec<S>)>,
        V: AsRef<str>,
        S: AsRef<str>,
    {
        let mut rules = Vec::new();
        for (vendor, versions) in entries {
            let vendor = vendor.as_ref();
            for spec in versions {
                match BrowserRule::parse(vendor, spec.as_ref()) {
                    Ok(rule) => rules.push(rule),
                    Err(error) => tracing::warn!(
                        vendor = %vendor,
                        version = %spec.as_ref(),
                        error = %error,
                        "Dropping malformed browser rule"
                    ),
                }
            }
        }
        tracing::debug!(rule_count = rules.len(), "Browser rules loaded");
        Self { rules }
    }

    /// Returns `true` if the client identified by `identifier` is invalid.
    #[must_use]
    pub fn evaluate(&self, identifier: &str) -> bool {
        match Self::detect(identifier) {
            Some(client) => self.matching_rule(&client).is_some(),
            None => true,
        }
    }

    /// Reads the vendor and version from `identifier`, if it carries one.
    #[must_use]
    pub fn detect(identifier: &str) -> Option<ClientVersion> {
        match ClientVersion::parse(identifier) {
            Ok(client) => Some(client),
            Err(error) => {
                tracing::debug!(error = %error, "Client identification rejected");
                None
            }
        }
    }

    /// Returns the first rule matching `client`.
    #[must_use]
    pub fn matching_rule(&self, client: &ClientVersion) -> Option<&BrowserRule> {
        self.rules.iter().find(|rule| rule.matches(client))
    }

    /// Loaded rules in evaluation order.
    #[must_use]
    pub fn rules(&self) -> &[BrowserRule] {
        &self.rules
    }

    /// Number of loaded rules.
    #[must_use]
    pub fn len(&self) -> usize {
        self.rules.len()
    }

    /// Returns `true` if no rules are loaded.
    #[must_use]
    pub fn is_empty(&self) -> bool {
        self.rules.is_empty()
    }
}
