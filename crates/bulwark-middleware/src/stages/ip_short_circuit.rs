//! IP short-circuit stage.
//!
//! Ends the chain with a 403 when the IP check marked the address as
//! blocked. Running without a preceding IP check is a pipeline
//! misconfiguration and raises a configuration fault (code 2001).

use crate::{
    context::RequestContext,
    envelope::{AccessDeniedEnvelope, SupportInfo},
    middleware::{BoxFuture, Middleware, Next},
    types::APPLICATION_JSON,
};
use bulwark_core::{FaultResult, PipelineFault};
use http::StatusCode;

/// Rejects requests whose `blocked_ip` flag is set.
#[derive(Debug, Clone, Default)]
pub struct IpShortCircuitMiddleware {
    support: SupportInfo,
}

impl IpShortCircuitMiddleware {
    /// Creates the stage.
    #[must_use]
    pub fn new(support: SupportInfo) -> Self {
        Self { support }
    }
}

impl Middleware for IpShortCircuitMiddleware {
    fn name(&self) -> &'static str {
        "ip_short_circuit"
    }

    fn process<'a>(
        &'a self,
        ctx: &'a mut RequestContext,
        next: Next<'a>,
    ) -> BoxFuture<'a, FaultResult<()>> {
        Box::pin(async move {
            match ctx.blocked_ip() {
                None => Err(PipelineFault::missing_ip_flag(self.name())),
                Some(false) => next.run(ctx).await,
                Some(true) => {
                    let envelope = AccessDeniedEnvelope::new(ctx.remote_address(), &self.support);
                    let payload = serde_json::to_string(&envelope).map_err(|e| {
                        PipelineFault::from_error("failed to serialize access denied envelope", e)
                    })?;

                    tracing::info!(
                        remote_address = %envelope.details.request_info.ip_address,
                        "Request rejected: IP address not allowed"
                    );
                    metrics::counter!("bulwark_rejections_total", "reason" => "ip_blocked")
                        .increment(1);

                    ctx.set_error_payload(payload);
                    let response = ctx.response_mut();
                    response.set_status(StatusCode::FORBIDDEN);
                    response.set_content_type(APPLICATION_JSON);
                    Ok(())
                }
            }
        })
    }
}
