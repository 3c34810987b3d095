//! Error boundary stage.
//!
//! The outermost stage of guarded pipelines. Any [`PipelineFault`] returned
//! by the rest of the chain, and any panic raised while running it, is
//! turned into a 500 response:
//!
//! ```json
//! {
//!   "status": "error",
//!   "errorCode": 2001,
//!   "message": "An unexpected error occurred.",
//!   "details": "...",
//!   "timestamp": "2024-01-01T00:00:00.000Z"
//! }
//! ```
//!
//! `details` carries the fault description only when details are exposed;
//! otherwise a generic support message is shown.

use crate::{
    context::RequestContext,
    envelope::{FaultEnvelope, GENERIC_FAULT_DETAILS},
    middleware::{BoxFuture, Middleware, Next},
    types::APPLICATION_JSON,
};
use bulwark_core::{FaultResult, PipelineFault};
use futures_util::FutureExt;
use http::StatusCode;
use std::any::Any;
use std::panic::AssertUnwindSafe;

/// Converts uncaught faults into a structured 500 response.
#[derive(Debug, Clone, Copy, Default)]
pub struct ErrorBoundaryMiddleware {
    expose_details: bool,
}

impl ErrorBoundaryMiddleware {
    /// Creates the stage with fault details hidden.
    #[must_use]
    pub fn new() -> Self {
        Self::default()
    }

    /// Sets whether fault descriptions are shown to clients.
    ///
    /// **Warning**: only enable this outside production.
    #[must_use]
    pub fn expose_details(mut self, expose: bool) -> Self {
        self.expose_details = expose;
        self
    }

    fn write_fault(&self, ctx: &mut RequestContext, fault: &PipelineFault) {
        let code = fault.code();
        tracing::error!(
            request_id = %ctx.request_id(),
            error_code = code,
            error = %fault.describe(),
            "Unhandled pipeline fault"
        );
        metrics::counter!("bulwark_faults_total", "code" => code.to_string()).increment(1);

        let details = if self.expose_details {
            fault.describe()
        } else {
            GENERIC_FAULT_DETAILS.to_string()
        };
        // Serializing plain strings and integers cannot fail.
        let body = serde_json::to_string(&FaultEnvelope::new(code, details)).unwrap_or_default();

        let response = ctx.response_mut();
        response.reset();
        response.set_status(StatusCode::INTERNAL_SERVER_ERROR);
        response.set_content_type(APPLICATION_JSON);
        response.write(body);
    }
}

fn panic_message(payload: &(dyn Any + Send)) -> String {
    if let Some(message) = payload.downcast_ref::<&str>() {
        (*message).to_string()
    } else if let Some(message) = payload.downcast_ref::<String>() {
        message.clone()
    } else {
        "panic with non-string payload".to_string()
    }
}

impl Middleware for ErrorBoundaryMiddleware {
    fn name(&self) -> &'static str {
        "error_boundary"
    }

    fn process<'a>(
        &'a self,
        ctx: &'a mut RequestContext,
        next: Next<'a>,
    ) -> BoxFuture<'a, FaultResult<()>> {
        Box::pin(async move {
            let outcome = AssertUnwindSafe(next.run(ctx)).catch_unwind().await;
            let fault = match outcome {
                Ok(Ok(())) => return Ok(()),
                Ok(Err(fault)) => fault,
                Err(panic) => PipelineFault::unhandled(format!(
                    "panic during request processing: {}",
                    panic_message(panic.as_ref())
                )),
            };
            self.write_fault(ctx, &fault);
            Ok(())
        })
    }
}
