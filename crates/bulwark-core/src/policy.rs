//! Access policy shared by all requests.

use crate::allow_list::AllowList;
use crate::browser::BrowserRuleSet;
use std::sync::Arc;

/// Allow-list and browser rules, built once at startup.
///
/// Cloning is cheap; all clones share the same read-only data.
#[derive(Debug, Clone, Default)]
pub struct AccessPolicy {
    inner: Arc<PolicyInner>,
}

#[derive(Debug, Default)]
struct PolicyInner {
    allow_list: AllowList,
    browser_rules: BrowserRuleSet,
}

impl AccessPolicy {
    /// Creates a policy.
    #[must_use]
    pub fn new(allow_list: AllowList, browser_rules: BrowserRuleSet) -> Self {
        Self {
            inner: Arc::new(PolicyInner {
                allow_list,
                browser_rules,
            }),
        }
    }

    /// The IP allow-list.
    #[must_use]
    pub fn allow_list(&self) -> &AllowList {
        &self.inner.allow_list
    }

    /// The browser rules.
    #[must_use]
    pub fn browser_rules(&self) -> &BrowserRuleSet {
        &self.inner.browser_rules
    }
}
