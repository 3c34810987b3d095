//! Core middleware trait and continuation types.
//!
//! Every pipeline stage implements [`Middleware`]. A stage receives the
//! mutable [`RequestContext`] and a [`Next`] continuation. Calling
//! [`Next::run`] executes the rest of the chain; returning without calling
//! it short-circuits the pipeline.
//!
//! The chain ends in an [`Endpoint`], the downstream handler that writes
//! its output through the context's response writer.
//!
//! # Example
//!
//! ```ignore
//! use bulwark_middleware::{BoxFuture, Middleware, Next, RequestContext};
//! use bulwark_core::FaultResult;
//!
//! struct LoggingMiddleware;
//!
//! impl Middleware for LoggingMiddleware {
//!     fn name(&self) -> &'static str {
//!         "logging"
//!     }
//!
//!     fn process<'a>(
//!         &'a self,
//!         ctx: &'a mut RequestContext,
//!         next: Next<'a>,
//!     ) -> BoxFuture<'a, FaultResult<()>> {
//!         Box::pin(async move {
//!             tracing::info!(path = %ctx.path(), "before");
//!             next.run(ctx).await?;
//!             tracing::info!(status = %ctx.response().status(), "after");
//!             Ok(())
//!         })
//!     }
//! }
//! ```

use crate::context::RequestContext;
use bulwark_core::FaultResult;
use std::future::Future;
use std::pin::Pin;

/// A boxed, sendable future.
pub type BoxFuture<'a, T> = Pin<Box<dyn Future<Output = T> + Send + 'a>>;

/// A pipeline stage.
///
/// # Invariants
///
/// - A stage calls `next.run()` at most once
/// - Only the error boundary may swallow an `Err` returned by `next.run()`
pub trait Middleware: Send + Sync + 'static {
    /// Returns the unique name of this stage, used in logs and tests.
    fn name(&self) -> &'static str;

    /// Processes the request.
    fn process<'a>(
        &'a self,
        ctx: &'a mut RequestContext,
        next: Next<'a>,
    ) -> BoxFuture<'a, FaultResult<()>>;
}

/// The downstream handler at the end of the chain.
pub trait Endpoint: Send + Sync + 'static {
    /// Handles the request, writing output through `ctx.response()`.
    fn call<'a>(&'a self, ctx: &'a mut RequestContext) -> BoxFuture<'a, FaultResult<()>>;
}

/// Endpoint that writes nothing, so the request finalizes as not found.
#[derive(Debug, Clone, Copy, Default)]
pub struct NotFoundEndpoint;

impl Endpoint for NotFoundEndpoint {
    fn call<'a>(&'a self, _ctx: &'a mut RequestContext) -> BoxFuture<'a, FaultResult<()>> {
        Box::pin(async { Ok(()) })
    }
}

/// Continuation that runs the remainder of the chain.
///
/// Consumed by [`Next::run`], so it can be invoked at most once.
pub struct Next<'a> {
    inner: NextInner<'a>,
}

enum NextInner<'a> {
    Chain {
        middleware: &'a dyn Middleware,
        next: Box<Next<'a>>,
    },
    Endpoint(&'a dyn Endpoint),
}

impl<'a> Next<'a> {
    /// Creates a continuation that invokes `middleware`, then `next`.
    pub(crate) fn new(middleware: &'a dyn Middleware, next: Next<'a>) -> Self {
        Self {
            inner: NextInner::Chain {
                middleware,
                next: Box::new(next),
            },
        }
    }

    /// Creates a terminal continuation that invokes the endpoint.
    pub fn endpoint(endpoint: &'a dyn Endpoint) -> Self {
        Self {
            inner: NextInner::Endpoint(endpoint),
        }
    }

    /// Runs the next stage or the endpoint.
    pub async fn run(self, ctx: &mut RequestContext) -> FaultResult<()> {
        match self.inner {
            NextInner::Chain { middleware, next } => middleware.process(ctx, *next).await,
            NextInner::Endpoint(endpoint) => endpoint.call(ctx).await,
        }
    }
}
