//! Browser short-circuit stage.
//!
//! Ends the chain with a 400 when the browser check marked the client as
//! invalid. Running without a preceding browser check raises a
//! configuration fault (code 1001).

use crate::{
    context::RequestContext,
    envelope::{SupportInfo, UnsupportedBrowserEnvelope},
    middleware::{BoxFuture, Middleware, Next},
    types::APPLICATION_JSON,
};
use bulwark_core::browser::BrowserRuleSet;
use bulwark_core::{FaultResult, PipelineFault};
use http::StatusCode;

/// Rejects requests whose `browser_invalid` flag is set.
#[derive(Debug, Clone, Default)]
pub struct BrowserShortCircuitMiddleware {
    support: SupportInfo,
}

impl BrowserShortCircuitMiddleware {
    /// Creates the stage.
    #[must_use]
    pub fn new(support: SupportInfo) -> Self {
        Self { support }
    }
}

impl Middleware for BrowserShortCircuitMiddleware {
    fn name(&self) -> &'static str {
        "browser_short_circuit"
    }

    fn process<'a>(
        &'a self,
        ctx: &'a mut RequestContext,
        next: Next<'a>,
    ) -> BoxFuture<'a, FaultResult<()>> {
        Box::pin(async move {
            match ctx.browser_invalid() {
                None => Err(PipelineFault::missing_browser_flag(self.name())),
                Some(false) => next.run(ctx).await,
                Some(true) => {
                    let detected = BrowserRuleSet::detect(ctx.client_identifier());
                    let envelope = UnsupportedBrowserEnvelope::new(
                        ctx.client_identifier(),
                        detected.as_ref().map(|client| client.vendor.as_str()),
                        ctx.remote_address(),
                        &self.support,
                    );
                    let payload = serde_json::to_string(&envelope).map_err(|e| {
                        PipelineFault::from_error("failed to serialize unsupported browser envelope", e)
                    })?;

                    tracing::info!(
                        user_agent = %ctx.client_identifier(),
                        detected_browser = %envelope.details.browser_info.detected_browser,
                        "Request rejected: unsupported browser"
                    );
                    metrics::counter!("bulwark_rejections_total", "reason" => "browser_unsupported")
                        .increment(1);

                    ctx.set_error_payload(payload);
                    let response = ctx.response_mut();
                    response.set_status(StatusCode::BAD_REQUEST);
                    response.set_content_type(APPLICATION_JSON);
                    Ok(())
                }
            }
        })
    }
}
