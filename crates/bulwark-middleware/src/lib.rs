//! # Bulwark Middleware
//!
//! The access-control pipeline at the heart of Bulwark.
//!
//! Every request runs through an ordered chain of stages that share a typed
//! [`RequestContext`]. Producer stages record decisions as flags, consumer
//! stages act on them, and the response is written exactly once after the
//! chain unwinds.
//!
//! ## Pipeline Stages
//!
//! ```text
//! Request → ErrorBoundary → Finalization → IpCheck → BrowserCheck
//!                                                         ↓
//!           Content ← BrowserShortCircuit ← IpShortCircuit
//!              ↓ (/api paths)
//!           Endpoint
//! ```
//!
//! | Stage | Reads | Writes | Short-circuits |
//! |-------|-------|--------|----------------|
//! | IP check | remote address | `blocked_ip` | never |
//! | IP short-circuit | `blocked_ip` | `error_payload`, 403 | when blocked |
//! | Browser check | client identifier | `browser_invalid` | never |
//! | Browser short-circuit | `browser_invalid` | `error_payload`, 400 | when invalid |
//! | Content | path | `content` | never |
//! | Response finalization | `error_payload`, `content` | response body | after unwind |
//! | Error boundary | faults, panics | 500 envelope | - |
//!
//! A short-circuit stage that finds its flag unset raises a configuration
//! fault (code 2001 for IP, 1001 for browser), which the error boundary
//! reports as a 500.
//!
//! ## Example
//!
//! ```
//! use bulwark_middleware::pipeline::Stage;
//! use bulwark_core::Environment;
//!
//! let order = Stage::order_for(Environment::Production);
//! assert_eq!(order.len(), 7);
//! assert_eq!(order[0].name(), "error_boundary");
//! assert_eq!(order[6].name(), "content");
//! ```

#![doc(html_root_url = "https://docs.rs/bulwark-middleware/0.1.0")]
#![warn(missing_docs)]
#![forbid(unsafe_code)]

pub mod context;
pub mod envelope;
pub mod middleware;
pub mod pipeline;
pub mod response;
pub mod stages;
pub mod types;

// Re-export main types at crate root
pub use context::RequestContext;
pub use envelope::SupportInfo;
pub use middleware::{BoxFuture, Endpoint, Middleware, Next, NotFoundEndpoint};
pub use pipeline::{Pipeline, PipelineBuilder, PipelineSettings, Stage};
pub use response::{CaptureGuard, ResponseWriter};
pub use types::{RemoteAddr, Request, Response, ResponseExt};
