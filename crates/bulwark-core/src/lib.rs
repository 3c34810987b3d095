//! # Bulwark Core
//!
//! Core types for the Bulwark access-control pipeline.
//!
//! - [`PipelineFault`] - failures that escape a stage and reach the error boundary
//! - [`Environment`] - hosting environment, which selects the pipeline order
//! - [`browser`] - browser rule engine
//! - [`allow_list`] - IP allow-list
//! - [`AccessPolicy`] - allow-list and browser rules shared by all requests
//! - [`RequestId`] - UUID v7 request identifier

#![doc(html_root_url = "https://docs.rs/bulwark-core/0.1.0")]
#![warn(missing_docs)]
#![forbid(unsafe_code)]

pub mod allow_list;
pub mod browser;
mod environment;
mod error;
mod policy;
mod request_id;

pub use allow_list::AllowList;
pub use browser::BrowserRuleSet;
pub use environment::{Environment, UnknownEnvironment};
pub use error::{
    FaultResult, PipelineFault, BROWSER_FLAG_MISSING_CODE, DEFAULT_FAULT_CODE,
    IP_FLAG_MISSING_CODE,
};
pub use policy::AccessPolicy;
pub use request_id::RequestId;
