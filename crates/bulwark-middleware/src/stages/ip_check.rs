//! IP check stage.
//!
//! Records whether the remote address is on the allow-list. Never
//! short-circuits; the decision is acted on by
//! [`IpShortCircuitMiddleware`](super::IpShortCircuitMiddleware).

use crate::{
    context::RequestContext,
    middleware::{BoxFuture, Middleware, Next},
};
use bulwark_core::{allow_list, AccessPolicy, FaultResult};

/// Sets `blocked_ip` from the allow-list.
#[derive(Debug, Clone)]
pub struct IpCheckMiddleware {
    policy: AccessPolicy,
}

impl IpCheckMiddleware {
    /// Creates the stage.
    #[must_use]
    pub fn new(policy: AccessPolicy) -> Self {
        Self { policy }
    }
}

impl Middleware for IpCheckMiddleware {
    fn name(&self) -> &'static str {
        "ip_check"
    }

    fn process<'a>(
        &'a self,
        ctx: &'a mut RequestContext,
        next: Next<'a>,
    ) -> BoxFuture<'a, FaultResult<()>> {
        Box::pin(async move {
            let address = ctx.remote_address();
            let blocked = !self.policy.allow_list().is_allowed(address);
            tracing::debug!(
                remote_address = %allow_list::normalize(address),
                blocked,
                "IP check"
            );
            ctx.set_blocked_ip(blocked);
            next.run(ctx).await
        })
    }
}
