//! Hosting environment selection.

use serde::{Deserialize, Serialize};
use std::fmt;
use std::str::FromStr;
use thiserror::Error;

/// The hosting environment a process runs in.
///
/// The environment selects the pipeline order: `Development` runs a thin
/// chain without access control, `Staging` and `Production` run the full
/// guarded chain.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
pub enum Environment {
    /// Local development.
    Development,
    /// Pre-production.
    Staging,
    /// Production.
    Production,
}

/// Returned when an environment name is not recognized.
#[derive(Debug, Clone, Error, PartialEq, Eq)]
#[error("Unknown environment '{0}' (expected Development, Staging or Production)")]
pub struct UnknownEnvironment(pub String);

impl Environment {
    /// Returns the canonical name.
    #[must_use]
    pub const fn as_str(&self) -> &'static str {
        match self {
            Self::Development => "Development",
            Self::Staging => "Staging",
            Self::Production => "Production",
        }
    }

    /// Returns `true` for environments that run the guarded chain.
    #[must_use]
    pub const fn is_guarded(&self) -> bool {
        matches!(self, Self::Staging | Self::Production)
    }

    /// Returns `true` if fault descriptions may be shown to clients by default.
    ///
    /// Only `Development` does; `Staging` is treated as production-like.
    #[must_use]
    pub const fn exposes_fault_details(&self) -> bool {
        matches!(self, Self::Development)
    }
}

impl FromStr for Environment {
    type Err = UnknownEnvironment;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        match s.trim().to_ascii_lowercase().as_str() {
            "development" | "dev" => Ok(Self::Development),
            "staging" => Ok(Self::Staging),
            "production" | "prod" => Ok(Self::Production),
            _ => Err(UnknownEnvironment(s.to_string())),
        }
    }
}

impl fmt::Display for Environment {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}
