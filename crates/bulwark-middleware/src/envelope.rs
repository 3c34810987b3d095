//! JSON bodies written by the pipeline.
//!
//! | Envelope | Status | `type` |
//! |---|---|---|
//! | [`SuccessEnvelope`] | 200 | `Content Response` |
//! | [`AccessDeniedEnvelope`] | 403 | `Access Denied` |
//! | [`UnsupportedBrowserEnvelope`] | 400 | `Unsupported Browser` |
//! | [`FaultEnvelope`] | 500 | - |

use chrono::{SecondsFormat, Utc};
use serde::Serialize;
use std::net::IpAddr;

/// Shown in envelopes when the remote address is unknown.
pub const UNKNOWN_ADDRESS: &str = "Unknown";

/// Generic `details` text for faults in production.
pub const GENERIC_FAULT_DETAILS: &str = "Please contact support for more information.";

/// Support contacts and links included in rejection envelopes.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct SupportInfo {
    /// Support contact address.
    pub contact: String,
    /// Documentation for the IP access policy.
    pub access_policy_url: String,
    /// Documentation for supported browsers.
    pub browser_support_url: String,
    /// Browsers suggested to rejected clients.
    pub alternative_browsers: Vec<String>,
}

impl Default for SupportInfo {
    fn default() -> Self {
        Self {
            contact: "support@example.com".to_string(),
            access_policy_url: "https://example.com/access-policy".to_string(),
            browser_support_url: "https://example.com/browser-support".to_string(),
            alternative_browsers: ["Google Chrome", "Microsoft Edge", "Safari", "Brave"]
                .into_iter()
                .map(String::from)
                .collect(),
        }
    }
}

/// Current UTC time in RFC 3339 form.
#[must_use]
pub fn timestamp() -> String {
    Utc::now().to_rfc3339_opts(SecondsFormat::Millis, true)
}

/// Address as shown to clients.
#[must_use]
pub fn display_address(address: Option<IpAddr>) -> String {
    address.map_or_else(|| UNKNOWN_ADDRESS.to_string(), |ip| ip.to_string())
}

/// Request facts echoed back to the client.
#[derive(Debug, Clone, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct RequestInfo {
    /// Remote address or `Unknown`.
    pub ip_address: String,
    /// When the response was produced.
    pub timestamp: String,
}

// ============================================================================
// Success
// ============================================================================

/// Default payload for supported clients on non-API paths.
#[derive(Debug, Clone, Serialize)]
pub struct SuccessEnvelope {
    /// Always `success`.
    pub status: &'static str,
    /// Always `Content Response`.
    #[serde(rename = "type")]
    pub kind: &'static str,
    /// Message and request facts.
    pub details: SuccessDetails,
    /// Producer description.
    pub metadata: SuccessMetadata,
}

/// `details` of a [`SuccessEnvelope`].
#[derive(Debug, Clone, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct SuccessDetails {
    /// Fixed message.
    pub message: &'static str,
    /// When the response was produced.
    pub timestamp: String,
    /// Client facts.
    pub request_info: ClientRequestInfo,
}

/// Client facts echoed in a [`SuccessEnvelope`].
#[derive(Debug, Clone, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct ClientRequestInfo {
    /// Raw client identifier.
    pub user_agent: String,
    /// Remote address or `Unknown`.
    pub ip_address: String,
}

/// `metadata` of a [`SuccessEnvelope`].
#[derive(Debug, Clone, Serialize)]
pub struct SuccessMetadata {
    /// Producing component.
    pub source: &'static str,
    /// Description of the response.
    pub description: &'static str,
}

impl SuccessEnvelope {
    /// Builds the envelope for a client.
    #[must_use]
    pub fn new(user_agent: &str, address: Option<IpAddr>) -> Self {
        Self {
            status: "success",
            kind: "Content Response",
            details: SuccessDetails {
                message: "Sample message for non-Mozilla browsers.",
                timestamp: timestamp(),
                request_info: ClientRequestInfo {
                    user_agent: user_agent.to_string(),
                    ip_address: display_address(address),
                },
            },
            metadata: SuccessMetadata {
                source: "ContentMiddleware",
                description: "This response is generated for supported clients.",
            },
        }
    }
}

// ============================================================================
// Access denied
// ============================================================================

/// Body returned when the remote address is not allowed.
#[derive(Debug, Clone, Serialize)]
pub struct AccessDeniedEnvelope {
    /// Always `error`.
    pub status: &'static str,
    /// Always `Access Denied`.
    #[serde(rename = "type")]
    pub kind: &'static str,
    /// Message and request facts.
    pub details: AccessDeniedDetails,
    /// What the client can do next.
    pub suggestions: AccessDeniedSuggestions,
}

/// `details` of an [`AccessDeniedEnvelope`].
#[derive(Debug, Clone, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct AccessDeniedDetails {
    /// Fixed message.
    pub message: &'static str,
    /// Request facts.
    pub request_info: RequestInfo,
}

/// `suggestions` of an [`AccessDeniedEnvelope`].
#[derive(Debug, Clone, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct AccessDeniedSuggestions {
    /// Fixed advice.
    pub next_steps: &'static str,
    /// Support contact.
    pub support_contact: String,
    /// Policy documentation.
    pub documentation: String,
}

impl AccessDeniedEnvelope {
    /// Builds the envelope for a rejected address.
    #[must_use]
    pub fn new(address: Option<IpAddr>, support: &SupportInfo) -> Self {
        Self {
            status: "error",
            kind: "Access Denied",
            details: AccessDeniedDetails {
                message: "Your IP address is not allowed to access this resource.",
                request_info: RequestInfo {
                    ip_address: display_address(address),
                    timestamp: timestamp(),
                },
            },
            suggestions: AccessDeniedSuggestions {
                next_steps: "If you believe this is a mistake, please contact support.",
                support_contact: support.contact.clone(),
                documentation: support.access_policy_url.clone(),
            },
        }
    }
}

// ============================================================================
// Unsupported browser
// ============================================================================

/// Body returned when the client browser is rejected.
#[derive(Debug, Clone, Serialize)]
pub struct UnsupportedBrowserEnvelope {
    /// Always `error`.
    pub status: &'static str,
    /// Always `Unsupported Browser`.
    #[serde(rename = "type")]
    pub kind: &'static str,
    /// Message, browser and request facts.
    pub details: UnsupportedBrowserDetails,
    /// Alternatives and contacts.
    pub suggestions: UnsupportedBrowserSuggestions,
}

/// `details` of an [`UnsupportedBrowserEnvelope`].
#[derive(Debug, Clone, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct UnsupportedBrowserDetails {
    /// Fixed message.
    pub message: &'static str,
    /// What was sent and what was detected.
    pub browser_info: BrowserInfo,
    /// Request facts.
    pub request_info: RequestInfo,
}

/// Browser facts of an [`UnsupportedBrowserEnvelope`].
#[derive(Debug, Clone, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct BrowserInfo {
    /// Raw client identifier.
    pub user_agent: String,
    /// Detected vendor family, or `Unknown`.
    pub detected_browser: String,
}

/// `suggestions` of an [`UnsupportedBrowserEnvelope`].
#[derive(Debug, Clone, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct UnsupportedBrowserSuggestions {
    /// Browsers the client could switch to.
    pub alternative_browsers: Vec<String>,
    /// Support contact.
    pub support_contact: String,
    /// Browser support documentation.
    pub documentation: String,
}

impl UnsupportedBrowserEnvelope {
    /// Builds the envelope for a rejected client.
    #[must_use]
    pub fn new(
        user_agent: &str,
        detected_browser: Option<&str>,
        address: Option<IpAddr>,
        support: &SupportInfo,
    ) -> Self {
        Self {
            status: "error",
            kind: "Unsupported Browser",
            details: UnsupportedBrowserDetails {
                message: "Your Browser is not supported by this application.",
                browser_info: BrowserInfo {
                    user_agent: user_agent.to_string(),
                    detected_browser: detected_browser.unwrap_or("Unknown").to_string(),
                },
                request_info: RequestInfo {
                    ip_address: display_address(address),
                    timestamp: timestamp(),
                },
            },
            suggestions: UnsupportedBrowserSuggestions {
                alternative_browsers: support.alternative_browsers.clone(),
                support_contact: support.contact.clone(),
                documentation: support.browser_support_url.clone(),
            },
        }
    }
}

// ============================================================================
// Fault
// ============================================================================

/// Body returned by the error boundary.
#[derive(Debug, Clone, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct FaultEnvelope {
    /// Always `error`.
    pub status: &'static str,
    /// Numeric fault code.
    pub error_code: i32,
    /// Fixed message.
    pub message: &'static str,
    /// Fault description or [`GENERIC_FAULT_DETAILS`].
    pub details: String,
    /// When the response was produced.
    pub timestamp: String,
}

impl FaultEnvelope {
    /// Builds the envelope.
    #[must_use]
    pub fn new(error_code: i32, details: String) -> Self {
        Self {
            status: "error",
            error_code,
            message: "An unexpected error occurred.",
            details,
            timestamp: timestamp(),
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use serde_json::Value;

    fn to_json<T: Serialize>(value: &T) -> Value {
        serde_json::to_value(value).unwrap()
    }

    #[test]
    fn test_access_denied_shape() {
        let json = to_json(&AccessDeniedEnvelope::new(None, &SupportInfo::default()));
        assert_eq!(json["status"], "error");
        assert_eq!(json["type"], "Access Denied");
        assert_eq!(json["details"]["requestInfo"]["ipAddress"], "Unknown");
        assert_eq!(json["suggestions"]["supportContact"], "support@example.com");
        assert_eq!(
            json["suggestions"]["documentation"],
            "https://example.com/access-policy"
        );
    }

    #[test]
    fn test_unsupported_browser_shape() {
        let json = to_json(&UnsupportedBrowserEnvelope::new(
            "Firefox 3.5",
            Some("Firefox"),
            Some("10.0.0.1".parse().unwrap()),
            &SupportInfo::default(),
        ));
        assert_eq!(json["type"], "Unsupported Browser");
        assert_eq!(json["details"]["browserInfo"]["detectedBrowser"], "Firefox");
        assert_eq!(json["details"]["requestInfo"]["ipAddress"], "10.0.0.1");
        assert_eq!(json["suggestions"]["alternativeBrowsers"][0], "Google Chrome");
    }

    #[test]
    fn test_success_shape() {
        let json = to_json(&SuccessEnvelope::new("Chrome/120.0", None));
        assert_eq!(json["status"], "success");
        assert_eq!(json["type"], "Content Response");
        assert_eq!(json["details"]["requestInfo"]["userAgent"], "Chrome/120.0");
        assert_eq!(json["metadata"]["source"], "ContentMiddleware");
    }

    #[test]
    fn test_fault_shape() {
        let json = to_json(&FaultEnvelope::new(2001, GENERIC_FAULT_DETAILS.to_string()));
        assert_eq!(json["errorCode"], 2001);
        assert_eq!(json["message"], "An unexpected error occurred.");
        assert!(json["timestamp"].is_string());
    }
}
