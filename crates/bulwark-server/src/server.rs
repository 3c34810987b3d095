//! HTTP server driving the access-control pipeline.
//!
//! Each accepted connection is served by hyper on its own task. For every
//! request the server:
//!
//! 1. records the peer address as a [`RemoteAddr`] request extension
//! 2. collects the body, refusing anything over `max_body_size` with 413
//!    (up front when `Content-Length` already exceeds it)
//! 3. hands the request to [`Pipeline::handle`]
//!
//! Steps 2 and 3 share the request timeout. When it elapses the pipeline
//! future is dropped and the client gets 504.
//!
//! # Example
//!
//! ```rust,ignore
//! use bulwark_server::{RestApi, Server, ServerConfig};
//!
//! let pipeline = Pipeline::for_environment(policy.clone(), settings, RestApi::new(policy));
//! Server::new(ServerConfig::default(), pipeline).run().await?;
//! ```

use std::convert::Infallible;
use std::net::{IpAddr, SocketAddr};
use std::sync::Arc;
use std::time::{Duration, Instant};

use bulwark_middleware::types::REQUEST_ID_HEADER;
use bulwark_middleware::{Pipeline, RemoteAddr, Response, ResponseExt};
use bulwark_telemetry::{record_request, InFlightGuard};
use http::StatusCode;
use http_body_util::{BodyExt, Full, LengthLimitError, Limited};
use hyper::body::{Body, Incoming};
use hyper::service::service_fn;
use hyper_util::rt::{TokioExecutor, TokioIo};
use hyper_util::server::conn::auto;
use tokio::net::{TcpListener, TcpStream};
use tokio::task::JoinSet;

use crate::config::ServerConfig;
use crate::error::ServerError;
use crate::shutdown::ShutdownSignal;

/// The Bulwark HTTP server.
pub struct Server {
    config: ServerConfig,
    pipeline: Arc<Pipeline>,
}

/// State shared by every connection task.
struct RequestHandler {
    pipeline: Arc<Pipeline>,
    request_timeout: Duration,
    max_body_size: usize,
}

impl Server {
    /// Creates a server for `pipeline`.
    #[must_use]
    pub fn new(config: ServerConfig, pipeline: impl Into<Arc<Pipeline>>) -> Self {
        Self {
            config,
            pipeline: pipeline.into(),
        }
    }

    /// Returns the server configuration.
    #[must_use]
    pub fn config(&self) -> &ServerConfig {
        &self.config
    }

    /// Binds the configured address.
    ///
    /// # Errors
    ///
    /// Returns `ServerError::InvalidAddress` for an unparsable address and
    /// `ServerError::Bind` if the socket cannot be bound.
    pub async fn bind(&self) -> Result<TcpListener, ServerError> {
        let addr = self
            .config
            .socket_addr()
            .map_err(|e| ServerError::InvalidAddress {
                addr: self.config.http_addr().to_string(),
                reason: e.to_string(),
            })?;

        TcpListener::bind(addr)
            .await
            .map_err(|source| ServerError::Bind { addr, source })
    }

    /// Runs until SIGINT or SIGTERM.
    ///
    /// # Errors
    ///
    /// See [`Server::bind`].
    pub async fn run(self) -> Result<(), ServerError> {
        let shutdown = ShutdownSignal::with_os_signals();
        self.run_with_shutdown(shutdown).await
    }

    /// Runs until `shutdown` is triggered.
    ///
    /// # Errors
    ///
    /// See [`Server::bind`].
    pub async fn run_with_shutdown(self, shutdown: ShutdownSignal) -> Result<(), ServerError> {
        let listener = self.bind().await?;
        self.serve(listener, shutdown).await
    }

    /// Serves connections from an already bound listener.
    ///
    /// After `shutdown` fires the listener is closed, open connections are
    /// asked to finish their current request, and any still running after
    /// the shutdown timeout are aborted.
    ///
    /// # Errors
    ///
    /// Returns `ServerError::Io` if the listener address cannot be read.
    pub async fn serve(
        self,
        listener: TcpListener,
        shutdown: ShutdownSignal,
    ) -> Result<(), ServerError> {
        let local_addr = listener.local_addr()?;
        tracing::info!(
            addr = %local_addr,
            http2 = self.config.http2_enabled(),
            stages = ?self.pipeline.stage_names(),
            "Server listening"
        );

        let handler = Arc::new(RequestHandler {
            pipeline: Arc::clone(&self.pipeline),
            request_timeout: self.config.request_timeout(),
            max_body_size: self.config.max_body_size(),
        });
        let http2 = self.config.http2_enabled();
        let mut connections = JoinSet::new();

        loop {
            tokio::select! {
                () = shutdown.wait() => break,
                accepted = listener.accept() => match accepted {
                    Ok((stream, peer)) => {
                        connections.spawn(serve_connection(
                            stream,
                            peer,
                            Arc::clone(&handler),
                            shutdown.clone(),
                            http2,
                        ));
                    }
                    Err(error) => {
                        tracing::warn!(error = %error, "Failed to accept connection");
                    }
                },
                Some(joined) = connections.join_next(), if !connections.is_empty() => {
                    log_connection_exit(joined);
                }
            }
        }

        drop(listener);
        tracing::info!(
            open_connections = connections.len(),
            timeout_secs = self.config.shutdown_timeout().as_secs(),
            "Shutting down; draining connections"
        );

        let drained = tokio::time::timeout(self.config.shutdown_timeout(), async {
            while let Some(joined) = connections.join_next().await {
                log_connection_exit(joined);
            }
        })
        .await;

        if drained.is_err() {
            tracing::warn!(
                remaining = connections.len(),
                "Shutdown timeout elapsed; aborting connections"
            );
            connections.abort_all();
        }

        tracing::info!("Server stopped");
        Ok(())
    }
}

fn log_connection_exit(joined: Result<(), tokio::task::JoinError>) {
    if let Err(error) = joined {
        if error.is_panic() {
            tracing::error!(error = %error, "Connection task panicked");
        }
    }
}

async fn serve_connection(
    stream: TcpStream,
    peer: SocketAddr,
    handler: Arc<RequestHandler>,
    shutdown: ShutdownSignal,
    http2: bool,
) {
    let remote = peer.ip();
    let service = service_fn(move |request| {
        let handler = Arc::clone(&handler);
        async move { Ok::<_, Infallible>(handler.handle(request, remote).await) }
    });

    let mut builder = auto::Builder::new(TokioExecutor::new());
    if !http2 {
        builder = builder.http1_only();
    }

    let conn = builder.serve_connection(TokioIo::new(stream), service);
    tokio::pin!(conn);

    let result = tokio::select! {
        result = conn.as_mut() => result,
        () = shutdown.wait() => {
            conn.as_mut().graceful_shutdown();
            conn.await
        }
    };

    if let Err(error) = result {
        tracing::debug!(peer = %peer, error = %error, "Connection closed with error");
    }
}

impl RequestHandler {
    async fn handle(&self, request: http::Request<Incoming>, remote: IpAddr) -> Response {
        let started = Instant::now();
        let _in_flight = InFlightGuard::new();
        let method = request.method().clone();
        let path = request.uri().path().to_owned();

        let response =
            match tokio::time::timeout(self.request_timeout, self.process(request, remote)).await {
                Ok(response) => response,
                Err(_) => {
                    tracing::warn!(
                        method = %method,
                        path = %path,
                        timeout_ms = duration_ms(self.request_timeout),
                        "Request timed out"
                    );
                    Response::text(StatusCode::GATEWAY_TIMEOUT, "Request timed out")
                }
            };

        let elapsed = started.elapsed();
        let status = response.status().as_u16();
        record_request(status, elapsed);

        let request_id = response
            .headers()
            .get(REQUEST_ID_HEADER)
            .and_then(|value| value.to_str().ok())
            .unwrap_or("-");
        bulwark_telemetry::log_request_complete!(
            request_id,
            method,
            path,
            status,
            duration_ms(elapsed)
        );

        response
    }

    async fn process(&self, request: http::Request<Incoming>, remote: IpAddr) -> Response {
        let (mut parts, body) = request.into_parts();
        parts.extensions.insert(RemoteAddr(remote));

        let limit = u64::try_from(self.max_body_size).unwrap_or(u64::MAX);
        if body.size_hint().lower() > limit {
            tracing::info!(
                remote_address = %remote,
                limit = self.max_body_size,
                "Declared request body too large"
            );
            return Response::text(StatusCode::PAYLOAD_TOO_LARGE, "Request body too large");
        }

        let body = match Limited::new(body, self.max_body_size).collect().await {
            Ok(collected) => collected.to_bytes(),
            Err(error) if error.downcast_ref::<LengthLimitError>().is_some() => {
                tracing::info!(
                    remote_address = %remote,
                    limit = self.max_body_size,
                    "Request body too large"
                );
                return Response::text(StatusCode::PAYLOAD_TOO_LARGE, "Request body too large");
            }
            Err(error) => {
                tracing::debug!(remote_address = %remote, error = %error, "Failed to read request body");
                return Response::text(StatusCode::BAD_REQUEST, "Failed to read request body");
            }
        };

        self.pipeline
            .handle(http::Request::from_parts(parts, Full::new(body)))
            .await
    }
}

fn duration_ms(duration: Duration) -> u64 {
    u64::try_from(duration.as_millis()).unwrap_or(u64::MAX)
}
