//! Environment-dependent middleware pipeline.
//!
//! The pipeline is an ordered list of stages ending in an [`Endpoint`].
//! Each request runs through nested [`Next`] continuations built from that
//! list, outermost stage first.
//!
//! ## Orders
//!
//! | Environment | Order |
//! |---|---|
//! | Development | ResponseFinalization → Content |
//! | Staging, Production | ErrorBoundary → ResponseFinalization → IpCheck → BrowserCheck → IpShortCircuit → BrowserShortCircuit → Content |
//!
//! The order is a pure function of the [`Environment`]; see
//! [`Stage::order_for`].

use crate::context::RequestContext;
use crate::envelope::SupportInfo;
use crate::middleware::{Endpoint, Middleware, Next, NotFoundEndpoint};
use crate::stages::{
    content::DEFAULT_API_PREFIX, BrowserCheckMiddleware, BrowserShortCircuitMiddleware,
    ContentMiddleware, ErrorBoundaryMiddleware, IpCheckMiddleware, IpShortCircuitMiddleware,
    ResponseFinalizationMiddleware,
};
use crate::types::{Request, Response, ResponseExt, REQUEST_ID_HEADER};
use bulwark_core::{AccessPolicy, Environment, FaultResult};
use http::{HeaderValue, StatusCode};
use std::fmt;
use std::sync::Arc;
use tracing::Instrument;

/// A type-erased middleware that can be stored in a vector.
pub type BoxedMiddleware = Arc<dyn Middleware>;

/// Pipeline stage identifiers.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum Stage {
    /// Converts uncaught faults into a 500 envelope.
    ErrorBoundary,
    /// Writes the single payload after the chain unwinds.
    ResponseFinalization,
    /// Sets `blocked_ip`.
    IpCheck,
    /// Sets `browser_invalid`.
    BrowserCheck,
    /// Rejects blocked addresses.
    IpShortCircuit,
    /// Rejects unsupported browsers.
    BrowserShortCircuit,
    /// Produces the success payload.
    Content,
}

impl Stage {
    /// Development order.
    pub const DEVELOPMENT_ORDER: [Stage; 2] = [Self::ResponseFinalization, Self::Content];

    /// Staging and production order.
    pub const GUARDED_ORDER: [Stage; 7] = [
        Self::ErrorBoundary,
        Self::ResponseFinalization,
        Self::IpCheck,
        Self::BrowserCheck,
        Self::IpShortCircuit,
        Self::BrowserShortCircuit,
        Self::Content,
    ];

    /// Returns the stage order for an environment.
    #[must_use]
    pub fn order_for(environment: Environment) -> &'static [Stage] {
        match environment {
            Environment::Development => &Self::DEVELOPMENT_ORDER,
            Environment::Staging | Environment::Production => &Self::GUARDED_ORDER,
        }
    }

    /// Returns the stage name, matching [`Middleware::name`].
    #[must_use]
    pub const fn name(self) -> &'static str {
        match self {
            Self::ErrorBoundary => "error_boundary",
            Self::ResponseFinalization => "response_finalization",
            Self::IpCheck => "ip_check",
            Self::BrowserCheck => "browser_check",
            Self::IpShortCircuit => "ip_short_circuit",
            Self::BrowserShortCircuit => "browser_short_circuit",
            Self::Content => "content",
        }
    }

    fn instantiate(self, policy: &AccessPolicy, settings: &PipelineSettings) -> BoxedMiddleware {
        match self {
            Self::ErrorBoundary => Arc::new(
                ErrorBoundaryMiddleware::new().expose_details(settings.expose_fault_details),
            ),
            Self::ResponseFinalization => Arc::new(ResponseFinalizationMiddleware::new()),
            Self::IpCheck => Arc::new(IpCheckMiddleware::new(policy.clone())),
            Self::BrowserCheck => Arc::new(BrowserCheckMiddleware::new(policy.clone())),
            Self::IpShortCircuit => {
                Arc::new(IpShortCircuitMiddleware::new(settings.support.clone()))
            }
            Self::BrowserShortCircuit => {
                Arc::new(BrowserShortCircuitMiddleware::new(settings.support.clone()))
            }
            Self::Content => {
                Arc::new(ContentMiddleware::new().api_prefix(settings.api_prefix.clone()))
            }
        }
    }
}

/// Settings applied when building stages.
#[derive(Debug, Clone)]
pub struct PipelineSettings {
    /// Environment that selects the order.
    pub environment: Environment,
    /// Whether the error boundary shows fault descriptions.
    pub expose_fault_details: bool,
    /// Support information for rejection envelopes.
    pub support: SupportInfo,
    /// Path prefix routed to the endpoint.
    pub api_prefix: String,
}

impl PipelineSettings {
    /// Settings with environment-derived defaults.
    #[must_use]
    pub fn new(environment: Environment) -> Self {
        Self {
            environment,
            expose_fault_details: environment.exposes_fault_details(),
            support: SupportInfo::default(),
            api_prefix: DEFAULT_API_PREFIX.to_string(),
        }
    }

    /// Overrides fault detail exposure.
    #[must_use]
    pub fn expose_fault_details(mut self, expose: bool) -> Self {
        self.expose_fault_details = expose;
        self
    }

    /// Sets the support information.
    #[must_use]
    pub fn support(mut self, support: SupportInfo) -> Self {
        self.support = support;
        self
    }
}

/// The request pipeline.
///
/// # Example
///
/// ```
/// use bulwark_core::{AccessPolicy, Environment};
/// use bulwark_middleware::middleware::NotFoundEndpoint;
/// use bulwark_middleware::pipeline::{Pipeline, PipelineSettings};
///
/// let pipeline = Pipeline::for_environment(
///     AccessPolicy::default(),
///     PipelineSettings::new(Environment::Development),
///     NotFoundEndpoint,
/// );
/// assert_eq!(pipeline.stage_names(), vec!["response_finalization", "content"]);
/// ```
pub struct Pipeline {
    stages: Vec<BoxedMiddleware>,
    endpoint: Arc<dyn Endpoint>,
}

impl fmt::Debug for Pipeline {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("Pipeline")
            .field("stages", &self.stage_names())
            .finish_non_exhaustive()
    }
}

impl Pipeline {
    /// Creates a builder for a custom order.
    #[must_use]
    pub fn builder(policy: AccessPolicy, settings: PipelineSettings) -> PipelineBuilder {
        PipelineBuilder::new(policy, settings)
    }

    /// Builds the standard pipeline for `settings.environment`.
    #[must_use]
    pub fn for_environment<E: Endpoint>(
        policy: AccessPolicy,
        settings: PipelineSettings,
        endpoint: E,
    ) -> Self {
        let order = Stage::order_for(settings.environment);
        tracing::info!(
            environment = %settings.environment,
            stages = ?order.iter().map(|s| s.name()).collect::<Vec<_>>(),
            "Pipeline configured"
        );
        PipelineBuilder::new(policy, settings)
            .stages(order)
            .endpoint(endpoint)
            .build()
    }

    /// Handles one request end to end.
    ///
    /// This is the single entry point used by the server.
    pub async fn handle(&self, request: Request) -> Response {
        let mut ctx = RequestContext::from_request(request).await;
        let span = tracing::info_span!(
            "request",
            request_id = %ctx.request_id(),
            method = %ctx.method(),
            path = %ctx.path(),
        );

        async move {
            match self.run(&mut ctx).await {
                Ok(()) => {
                    tracing::debug!(
                        status = ctx.response().status().as_u16(),
                        elapsed_ms = ctx.elapsed().as_millis() as u64,
                        "Request completed"
                    );
                    ctx.into_response()
                }
                Err(fault) => {
                    // Only reachable in chains without an error boundary.
                    tracing::error!(
                        error_code = fault.code(),
                        error = %fault.describe(),
                        "Fault escaped the pipeline"
                    );
                    let mut response = Response::text(
                        StatusCode::INTERNAL_SERVER_ERROR,
                        "Internal Server Error",
                    );
                    if let Ok(value) = HeaderValue::from_str(&ctx.request_id().to_string()) {
                        response.headers_mut().insert(REQUEST_ID_HEADER, value);
                    }
                    response
                }
            }
        }
        .instrument(span)
        .await
    }

    /// Runs the chain against an existing context.
    pub async fn run(&self, ctx: &mut RequestContext) -> FaultResult<()> {
        self.build_chain().run(ctx).await
    }

    fn build_chain(&self) -> Next<'_> {
        let mut next = Next::endpoint(self.endpoint.as_ref());
        for middleware in self.stages.iter().rev() {
            next = Next::new(middleware.as_ref(), next);
        }
        next
    }

    /// Returns the names of all stages in order.
    #[must_use]
    pub fn stage_names(&self) -> Vec<&'static str> {
        self.stages.iter().map(|mw| mw.name()).collect()
    }

    /// Returns the number of stages.
    #[must_use]
    pub fn stage_count(&self) -> usize {
        self.stages.len()
    }
}

/// Builder for a [`Pipeline`] with an explicit stage order.
pub struct PipelineBuilder {
    policy: AccessPolicy,
    settings: PipelineSettings,
    stages: Vec<BoxedMiddleware>,
    endpoint: Arc<dyn Endpoint>,
}

impl PipelineBuilder {
    /// Creates an empty builder.
    #[must_use]
    pub fn new(policy: AccessPolicy, settings: PipelineSettings) -> Self {
        Self {
            policy,
            settings,
            stages: Vec::new(),
            endpoint: Arc::new(NotFoundEndpoint),
        }
    }

    /// Appends a standard stage.
    #[must_use]
    pub fn stage(mut self, stage: Stage) -> Self {
        let middleware = stage.instantiate(&self.policy, &self.settings);
        self.stages.push(middleware);
        self
    }

    /// Appends standard stages in order.
    #[must_use]
    pub fn stages(self, stages: &[Stage]) -> Self {
        stages.iter().fold(self, |builder, stage| builder.stage(*stage))
    }

    /// Appends a custom middleware.
    #[must_use]
    pub fn middleware<M: Middleware>(mut self, middleware: M) -> Self {
        self.stages.push(Arc::new(middleware));
        self
    }

    /// Sets the downstream endpoint.
    #[must_use]
    pub fn endpoint<E: Endpoint>(mut self, endpoint: E) -> Self {
        self.endpoint = Arc::new(endpoint);
        self
    }

    /// Builds the pipeline.
    #[must_use]
    pub fn build(self) -> Pipeline {
        Pipeline {
            stages: self.stages,
            endpoint: self.endpoint,
        }
    }
}
