//! Content generation stage.
//!
//! For API paths the downstream endpoint runs inside an output capture and
//! whatever it writes becomes the context's `content`. For every other path
//! the stage answers directly with the default success envelope.
//!
//! ```text
//! /api/...   capture → Endpoint → content = captured bytes
//! otherwise  content = SuccessEnvelope (endpoint not called)
//! ```

use crate::{
    context::RequestContext,
    envelope::SuccessEnvelope,
    middleware::{BoxFuture, Middleware, Next},
    types::APPLICATION_JSON,
};
use bulwark_core::{FaultResult, PipelineFault};
use http::StatusCode;

/// Default prefix of paths served by the downstream endpoint.
pub const DEFAULT_API_PREFIX: &str = "/api";

/// Produces the success payload.
#[derive(Debug, Clone)]
pub struct ContentMiddleware {
    api_prefix: String,
}

impl Default for ContentMiddleware {
    fn default() -> Self {
        Self::new()
    }
}

impl ContentMiddleware {
    /// Creates the stage with the default `/api` prefix.
    #[must_use]
    pub fn new() -> Self {
        Self {
            api_prefix: DEFAULT_API_PREFIX.to_string(),
        }
    }

    /// Sets the path prefix routed to the downstream endpoint.
    #[must_use]
    pub fn api_prefix(mut self, prefix: impl Into<String>) -> Self {
        self.api_prefix = prefix.into();
        self
    }

    /// Returns `true` if `path` is served by the downstream endpoint.
    ///
    /// The prefix must end on a segment boundary: `/api` and `/api/x` match,
    /// `/apiary` does not.
    #[must_use]
    pub fn is_api_path(&self, path: &str) -> bool {
        let prefix = self.api_prefix.as_str();
        let Some(head) = path.get(..prefix.len()) else {
            return false;
        };
        if !head.eq_ignore_ascii_case(prefix) {
            return false;
        }
        let rest = &path[prefix.len()..];
        rest.is_empty() || rest.starts_with('/') || prefix.ends_with('/')
    }
}

impl Middleware for ContentMiddleware {
    fn name(&self) -> &'static str {
        "content"
    }

    fn process<'a>(
        &'a self,
        ctx: &'a mut RequestContext,
        next: Next<'a>,
    ) -> BoxFuture<'a, FaultResult<()>> {
        Box::pin(async move {
            if self.is_api_path(ctx.path()) {
                let capture = ctx.response().capture();
                next.run(ctx).await?;
                let captured = capture.finish();

                tracing::debug!(bytes = captured.len(), "Captured endpoint output");
                if !captured.is_empty() {
                    ctx.set_content(String::from_utf8_lossy(&captured).into_owned());
                }
                return Ok(());
            }

            let envelope = SuccessEnvelope::new(ctx.client_identifier(), ctx.remote_address());
            let payload = serde_json::to_string(&envelope)
                .map_err(|e| PipelineFault::from_error("failed to serialize content envelope", e))?;

            ctx.set_content(payload);
            let response = ctx.response_mut();
            response.set_status(StatusCode::OK);
            response.set_content_type(APPLICATION_JSON);
            Ok(())
        })
    }
}
