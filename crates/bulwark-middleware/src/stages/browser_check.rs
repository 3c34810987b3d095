//! Browser check stage.

use crate::{
    context::RequestContext,
    middleware::{BoxFuture, Middleware, Next},
};
use bulwark_core::{AccessPolicy, FaultResult};

/// Sets `browser_invalid` from the browser rules.
///
/// `true` means the client must be rejected. Never short-circuits.
#[derive(Debug, Clone)]
pub struct BrowserCheckMiddleware {
    policy: AccessPolicy,
}

impl BrowserCheckMiddleware {
    /// Creates the stage.
    #[must_use]
    pub fn new(policy: AccessPolicy) -> Self {
        Self { policy }
    }
}

impl Middleware for BrowserCheckMiddleware {
    fn name(&self) -> &'static str {
        "browser_check"
    }

    fn process<'a>(
        &'a self,
        ctx: &'a mut RequestContext,
        next: Next<'a>,
    ) -> BoxFuture<'a, FaultResult<()>> {
        Box::pin(async move {
            let invalid = self.policy.browser_rules().evaluate(ctx.client_identifier());
            tracing::debug!(
                user_agent = %ctx.client_identifier(),
                invalid,
                "Browser check"
            );
            ctx.set_browser_invalid(invalid);
            next.run(ctx).await
        })
    }
}
