//! Response finalization stage.
//!
//! Runs the rest of the chain first, then writes exactly one payload to the
//! wire:
//!
//! 1. `error_payload`, if a short-circuit stage produced one
//! 2. otherwise `content`
//! 3. otherwise nothing, with status 404

use crate::{
    context::RequestContext,
    middleware::{BoxFuture, Middleware, Next},
};
use bulwark_core::FaultResult;
use http::StatusCode;

/// Writes the final payload after the chain unwinds.
#[derive(Debug, Clone, Copy, Default)]
pub struct ResponseFinalizationMiddleware;

impl ResponseFinalizationMiddleware {
    /// Creates the stage.
    #[must_use]
    pub fn new() -> Self {
        Self
    }
}

impl Middleware for ResponseFinalizationMiddleware {
    fn name(&self) -> &'static str {
        "response_finalization"
    }

    fn process<'a>(
        &'a self,
        ctx: &'a mut RequestContext,
        next: Next<'a>,
    ) -> BoxFuture<'a, FaultResult<()>> {
        Box::pin(async move {
            next.run(ctx).await?;

            debug_assert!(!ctx.response().is_capturing());
            if let Some(payload) = ctx.error_payload() {
                ctx.response().write(payload);
            } else if let Some(content) = ctx.content() {
                ctx.response().write(content);
            } else {
                tracing::debug!(path = %ctx.path(), "No payload produced; responding 404");
                ctx.response_mut().set_status(StatusCode::NOT_FOUND);
            }
            Ok(())
        })
    }
}
