//! # Bulwark Server
//!
//! hyper-based HTTP server for the Bulwark access-control pipeline.
//!
//! - HTTP/1.1, with optional HTTP/2 via `hyper-util`'s auto connection builder
//! - Peer address attached to each request as [`bulwark_middleware::RemoteAddr`]
//! - Body size limit (413) and per-request timeout (504)
//! - Graceful shutdown on SIGINT/SIGTERM with a bounded drain
//! - A sample REST endpoint ([`RestApi`]) mounted under `/api/rest`
//!
//! ## Example
//!
//! ```rust,ignore
//! use bulwark_core::{AccessPolicy, Environment};
//! use bulwark_middleware::{Pipeline, PipelineSettings};
//! use bulwark_server::{RestApi, Server, ServerConfig};
//!
//! #[tokio::main]
//! async fn main() -> Result<(), Box<dyn std::error::Error>> {
//!     let policy = AccessPolicy::default();
//!     let pipeline = Pipeline::for_environment(
//!         policy.clone(),
//!         PipelineSettings::new(Environment::Production),
//!         RestApi::new(policy),
//!     );
//!
//!     Server::new(ServerConfig::default(), pipeline).run().await?;
//!     Ok(())
//! }
//! ```

#![doc(html_root_url = "https://docs.rs/bulwark-server/0.1.0")]
#![warn(missing_docs)]
#![forbid(unsafe_code)]

pub mod api;
mod config;
mod error;
mod router;
mod server;
mod shutdown;

pub use api::{Product, RestApi, API_BASE};
pub use config::{
    ServerConfig, ServerConfigBuilder, DEFAULT_HTTP_ADDR, DEFAULT_MAX_BODY_SIZE,
    DEFAULT_REQUEST_TIMEOUT_SECS, DEFAULT_SHUTDOWN_TIMEOUT_SECS,
};
pub use error::ServerError;
pub use router::{RouteMatch, Router};
pub use server::Server;
pub use shutdown::ShutdownSignal;
