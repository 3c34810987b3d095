//! Fault types for the Bulwark pipeline.
//!
//! Two kinds of failure escape a pipeline stage and travel up to the error
//! boundary:
//!
//! | Variant | Raised by | Default code |
//! |---|---|---|
//! | [`PipelineFault::Configuration`] | a short-circuit stage whose producer stage never ran | 2001 (IP), 1001 (browser) |
//! | [`PipelineFault::Unhandled`] | anything else (handler failures, converted panics) | 5000 |
//!
//! Rejections of a blocked address or an unsupported browser are *not*
//! faults. They are answered inside the short-circuit stage and never reach
//! this type.

use thiserror::Error;

/// Result type for pipeline stages.
pub type FaultResult<T> = Result<T, PipelineFault>;

/// Code carried by a configuration fault raised when the IP flag is missing.
pub const IP_FLAG_MISSING_CODE: i32 = 2001;

/// Code carried by a configuration fault raised when the browser flag is missing.
pub const BROWSER_FLAG_MISSING_CODE: i32 = 1001;

/// Code reported for faults that do not carry one.
pub const DEFAULT_FAULT_CODE: i32 = 5000;

/// A failure that escapes a pipeline stage.
///
/// # Example
///
/// ```
/// use bulwark_core::{PipelineFault, IP_FLAG_MISSING_CODE};
///
/// let fault = PipelineFault::missing_ip_flag("ip_short_circuit");
/// assert_eq!(fault.code(), IP_FLAG_MISSING_CODE);
/// assert!(fault.is_configuration());
/// ```
#[derive(Error, Debug)]
pub enum PipelineFault {
    /// A stage ran before the stage that produces its input.
    #[error("Pipeline misconfigured: stage '{stage}' found no '{flag}' flag in the request context")]
    Configuration {
        /// Name of the stage that detected the problem.
        stage: &'static str,
        /// Name of the missing context flag.
        flag: &'static str,
        /// Reserved numeric code for the missing flag.
        code: i32,
    },

    /// Any other failure.
    #[error("Unhandled failure: {message}")]
    Unhandled {
        /// Human-readable description.
        message: String,
        /// Optional numeric code; [`DEFAULT_FAULT_CODE`] is reported when absent.
        code: Option<i32>,
        /// The underlying error, if any.
        #[source]
        source: Option<anyhow::Error>,
    },
}

impl PipelineFault {
    /// Fault raised when the IP short-circuit runs without an IP check.
    #[must_use]
    pub fn missing_ip_flag(stage: &'static str) -> Self {
        Self::Configuration {
            stage,
            flag: "blocked_ip",
            code: IP_FLAG_MISSING_CODE,
        }
    }

    /// Fault raised when the browser short-circuit runs without a browser check.
    #[must_use]
    pub fn missing_browser_flag(stage: &'static str) -> Self {
        Self::Configuration {
            stage,
            flag: "browser_invalid",
            code: BROWSER_FLAG_MISSING_CODE,
        }
    }

    /// Creates an unhandled fault without a code.
    #[must_use]
    pub fn unhandled(message: impl Into<String>) -> Self {
        Self::Unhandled {
            message: message.into(),
            code: None,
            source: None,
        }
    }

    /// Creates an unhandled fault carrying an explicit code.
    #[must_use]
    pub fn unhandled_with_code(message: impl Into<String>, code: i32) -> Self {
        Self::Unhandled {
            message: message.into(),
            code: Some(code),
            source: None,
        }
    }

    /// Wraps an arbitrary error as an unhandled fault.
    #[must_use]
    pub fn from_error(message: impl Into<String>, source: impl Into<anyhow::Error>) -> Self {
        Self::Unhandled {
            message: message.into(),
            code: None,
            source: Some(source.into()),
        }
    }

    /// Returns the numeric code reported for this fault.
    #[must_use]
    pub fn code(&self) -> i32 {
        match self {
            Self::Configuration { code, .. } => *code,
            Self::Unhandled { code, .. } => code.unwrap_or(DEFAULT_FAULT_CODE),
        }
    }

    /// Returns `true` for ordering/configuration defects.
    #[must_use]
    pub fn is_configuration(&self) -> bool {
        matches!(self, Self::Configuration { .. })
    }

    /// Full description including the source chain.
    ///
    /// This is what non-production environments show in the `details` field
    /// of the failure envelope.
    #[must_use]
    pub fn describe(&self) -> String {
        let mut description = self.to_string();
        let mut source = std::error::Error::source(self);
        while let Some(cause) = source {
            description.push_str(": ");
            description.push_str(&cause.to_string());
            source = cause.source();
        }
        description
    }
}
