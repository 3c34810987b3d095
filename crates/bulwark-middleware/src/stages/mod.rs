//! Pipeline stages.
//!
//! ## Guarded order (Staging, Production)
//!
//! 1. [`error_boundary`] - convert uncaught faults into a 500 envelope
//! 2. [`response_finalization`] - write the single payload after unwinding
//! 3. [`ip_check`] - set `blocked_ip`
//! 4. [`browser_check`] - set `browser_invalid`
//! 5. [`ip_short_circuit`] - reject blocked addresses (403)
//! 6. [`browser_short_circuit`] - reject unsupported browsers (400)
//! 7. [`content`] - synthesize or capture the success payload
//!
//! ## Development order
//!
//! [`response_finalization`] then [`content`].

pub mod browser_check;
pub mod browser_short_circuit;
pub mod content;
pub mod error_boundary;
pub mod ip_check;
pub mod ip_short_circuit;
pub mod response_finalization;

// Re-export main types
pub use browser_check::BrowserCheckMiddleware;
pub use browser_short_circuit::BrowserShortCircuitMiddleware;
pub use content::ContentMiddleware;
pub use error_boundary::ErrorBoundaryMiddleware;
pub use ip_check::IpCheckMiddleware;
pub use ip_short_circuit::IpShortCircuitMiddleware;
pub use response_finalization::ResponseFinalizationMiddleware;
