//! HTTP server implementation.
//!
//! Built on Hyper and Tokio. Each connection is served by HTTP/1.1; each
//! request body is buffered (up to a limit) and then passed through the
//! middleware [`Pipeline`] to the [`Router`].
//!
//! # Example
//!
//! ```rust,ignore
//! use vibefeeder_server::{Router, Server};
//!
//! #[tokio::main]
//! async fn main() -> Result<(), Box<dyn std::error::Error>> {
//!     let server = Server::builder()
//!         .address("0.0.0.0:8080")
//!         .router(Router::new())
//!         .bind()
//!         .await?;
//!     server.run().await?;
//!     Ok(())
//! }
//! ```

use std::convert::Infallible;
use std::net::SocketAddr;
use std::sync::Arc;
use std::time::Duration;

use bytes::Bytes;
use http_body_util::{BodyExt, LengthLimitError, Limited};
use hyper::body::Incoming;
use hyper::server::conn::http1;
use hyper::service::service_fn;
use hyper_util::rt::TokioIo;
use thiserror::Error;
use tokio::net::{TcpListener, TcpStream};
use tokio_util::sync::CancellationToken;
use tokio_util::task::TaskTracker;
use vibefeeder_middleware::{
    MiddlewareContext, OversizedBody, Pipeline, PipelineConfig, Request, Response,
    UnreadableBody, DEFAULT_BODY_LIMIT,
};

use crate::router::Router;
use crate::shutdown::ShutdownSignal;

const DEFAULT_ADDRESS: &str = "127.0.0.1:8080";
const DEFAULT_SHUTDOWN_TIMEOUT: Duration = Duration::from_secs(10);

/// Errors starting or running the server.
#[derive(Debug, Error)]
pub enum ServerError {
    /// The listen address could not be bound.
    #[error("failed to bind to {address}: {source}")]
    Bind {
        /// The address that was requested.
        address: String,
        /// The underlying error.
        #[source]
        source: std::io::Error,
    },

    /// I/O error while serving.
    #[error("I/O error: {0}")]
    Io(#[from] std::io::Error),
}

/// The request path shared by the server and in-process clients.
///
/// Builds the middleware context for a buffered request and runs it through
/// the pipeline and router. Every request receives a cancellation token
/// derived from the service's root token, so cancelling the root (on a
/// forced shutdown) cancels all in-flight requests.
#[derive(Clone)]
pub struct AppService {
    pipeline: Arc<Pipeline>,
    router: Arc<Router>,
    root: CancellationToken,
}

impl std::fmt::Debug for AppService {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("AppService")
            .field("stages", &self.pipeline.stage_names())
            .field("router", &self.router)
            .finish_non_exhaustive()
    }
}

impl AppService {
    /// Creates the service.
    #[must_use]
    pub fn new(pipeline: Pipeline, router: Router) -> Self {
        Self {
            pipeline: Arc::new(pipeline),
            router: Arc::new(router),
            root: CancellationToken::new(),
        }
    }

    /// Returns the pipeline.
    #[must_use]
    pub fn pipeline(&self) -> &Pipeline {
        &self.pipeline
    }

    /// Returns the router.
    #[must_use]
    pub fn router(&self) -> &Router {
        &self.router
    }

    /// Returns the token every request token is derived from.
    #[must_use]
    pub fn root_token(&self) -> &CancellationToken {
        &self.root
    }

    /// Handles one buffered request.
    pub async fn call(&self, request: Request, remote_addr: Option<SocketAddr>) -> Response {
        self.call_with_token(request, remote_addr, self.root.child_token())
            .await
    }

    async fn call_with_token(
        &self,
        request: Request,
        remote_addr: Option<SocketAddr>,
        token: CancellationToken,
    ) -> Response {
        let ctx = self.context(remote_addr, token);
        let router = Arc::clone(&self.router);
        self.pipeline
            .process(ctx, request, move |ctx, request| router.dispatch(ctx, request))
            .await
    }

    /// Responds to a request whose body could not be read.
    fn context(&self, remote_addr: Option<SocketAddr>, token: CancellationToken) -> MiddlewareContext {
        let mut ctx = MiddlewareContext::new();
        if let Some(addr) = remote_addr {
            ctx.set_remote_addr(addr);
        }
        ctx.set_cancellation_token(token);
        ctx
    }

    /// Buffers a hyper request and handles it.
    async fn serve_hyper(
        &self,
        request: http::Request<Incoming>,
        remote_addr: SocketAddr,
        max_body_bytes: usize,
    ) -> Response {
        let (parts, body) = request.into_parts();
        let request = match Limited::new(body, max_body_bytes).collect().await {
            Ok(collected) => http::Request::from_parts(parts, collected.to_bytes()),
            Err(e) => {
                let mut request = http::Request::from_parts(parts, Bytes::new());
                if e.is::<LengthLimitError>() {
                    request.extensions_mut().insert(OversizedBody);
                } else {
                    request.extensions_mut().insert(UnreadableBody {
                        reason: e.to_string(),
                    });
                }
                request
            }
        };

        // Dropping the future (client went away) cancels the request.
        let token = self.root.child_token();
        let guard = token.clone().drop_guard();
        let response = self.call_with_token(request, Some(remote_addr), token).await;
        guard.disarm();
        response
    }
}

/// A bound HTTP server.
pub struct Server {
    listener: TcpListener,
    service: AppService,
    shutdown_timeout: Duration,
    max_body_bytes: usize,
}

impl std::fmt::Debug for Server {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("Server")
            .field("local_addr", &self.listener.local_addr().ok())
            .field("shutdown_timeout", &self.shutdown_timeout)
            .field("max_body_bytes", &self.max_body_bytes)
            .finish_non_exhaustive()
    }
}

impl Server {
    /// Creates a server builder.
    #[must_use]
    pub fn builder() -> ServerBuilder {
        ServerBuilder::new()
    }

    /// Returns the address the server is listening on.
    pub fn local_addr(&self) -> Result<SocketAddr, ServerError> {
        Ok(self.listener.local_addr()?)
    }

    /// Returns the request service.
    #[must_use]
    pub fn service(&self) -> &AppService {
        &self.service
    }

    /// Serves until SIGINT or SIGTERM.
    pub async fn run(self) -> Result<(), ServerError> {
        self.serve(ShutdownSignal::with_os_signals()).await
    }

    /// Serves until `shutdown` is triggered.
    ///
    /// After the signal, the listener is closed and open connections get
    /// the shutdown timeout to finish. Requests still running after that
    /// are cancelled through their context.
    pub async fn serve(self, shutdown: ShutdownSignal) -> Result<(), ServerError> {
        let addr = self.local_addr()?;
        tracing::info!(address = %addr, "Server listening");

        let Self {
            listener,
            service,
            shutdown_timeout,
            max_body_bytes,
        } = self;
        let service = Arc::new(service);
        let tracker = TaskTracker::new();

        loop {
            tokio::select! {
                result = listener.accept() => match result {
                    Ok((stream, remote_addr)) => {
                        let service = Arc::clone(&service);
                        let shutdown = shutdown.clone();
                        tracker.spawn(async move {
                            if let Err(e) = serve_connection(stream, remote_addr, service, max_body_bytes, shutdown).await {
                                tracing::debug!(remote_addr = %remote_addr, error = %e, "Connection error");
                            }
                        });
                    }
                    Err(e) => {
                        tracing::error!(error = %e, "Failed to accept connection");
                    }
                },
                () = shutdown.recv() => {
                    tracing::info!("Shutdown signal received, stopping server");
                    break;
                }
            }
        }
        drop(listener);
        tracker.close();

        tracing::info!(
            timeout = ?shutdown_timeout,
            connections = tracker.len(),
            "Waiting for connections to close"
        );
        tokio::select! {
            () = tracker.wait() => {
                tracing::info!("All connections closed");
            }
            () = tokio::time::sleep(shutdown_timeout) => {
                tracing::warn!(
                    connections = tracker.len(),
                    "Shutdown timeout reached, cancelling in-flight requests"
                );
                service.root_token().cancel();
            }
        }

        tracing::info!("Server stopped");
        Ok(())
    }
}

async fn serve_connection(
    stream: TcpStream,
    remote_addr: SocketAddr,
    service: Arc<AppService>,
    max_body_bytes: usize,
    shutdown: ShutdownSignal,
) -> Result<(), hyper::Error> {
    let io = TokioIo::new(stream);
    let handler = service_fn(move |request: http::Request<Incoming>| {
        let service = Arc::clone(&service);
        async move {
            Ok::<_, Infallible>(service.serve_hyper(request, remote_addr, max_body_bytes).await)
        }
    });

    let conn = http1::Builder::new().serve_connection(io, handler);
    tokio::pin!(conn);

    tokio::select! {
        result = conn.as_mut() => result,
        () = shutdown.recv() => {
            conn.as_mut().graceful_shutdown();
            conn.await
        }
    }
}

/// Builder for a [`Server`].
///
/// ```rust
/// use std::time::Duration;
/// use vibefeeder_server::{Router, Server};
///
/// let builder = Server::builder()
///     .address("127.0.0.1:0")
///     .shutdown_timeout(Duration::from_secs(5))
///     .router(Router::new());
/// ```
pub struct ServerBuilder {
    address: String,
    shutdown_timeout: Duration,
    max_body_bytes: usize,
    pipeline: Option<Pipeline>,
    router: Router,
}

impl std::fmt::Debug for ServerBuilder {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("ServerBuilder")
            .field("address", &self.address)
            .field("shutdown_timeout", &self.shutdown_timeout)
            .field("max_body_bytes", &self.max_body_bytes)
            .field("stages", &self.pipeline.as_ref().map(Pipeline::stage_names))
            .field("router", &self.router)
            .finish()
    }
}

impl Default for ServerBuilder {
    fn default() -> Self {
        Self {
            address: DEFAULT_ADDRESS.to_string(),
            shutdown_timeout: DEFAULT_SHUTDOWN_TIMEOUT,
            max_body_bytes: DEFAULT_BODY_LIMIT,
            pipeline: None,
            router: Router::new(),
        }
    }
}

impl ServerBuilder {
    /// Creates a builder with default settings.
    #[must_use]
    pub fn new() -> Self {
        Self::default()
    }

    /// Sets the listen address, e.g. `0.0.0.0:8080`.
    #[must_use]
    pub fn address(mut self, address: impl Into<String>) -> Self {
        self.address = address.into();
        self
    }

    /// Sets how long shutdown waits for open connections.
    #[must_use]
    pub fn shutdown_timeout(mut self, timeout: Duration) -> Self {
        self.shutdown_timeout = timeout;
        self
    }

    /// Sets how many body bytes are read before a request is marked
    /// [`OversizedBody`].
    #[must_use]
    pub fn max_body_bytes(mut self, limit: usize) -> Self {
        self.max_body_bytes = limit;
        self
    }

    /// Sets the middleware pipeline. Defaults to the standard pipeline.
    #[must_use]
    pub fn pipeline(mut self, pipeline: Pipeline) -> Self {
        self.pipeline = Some(pipeline);
        self
    }

    /// Sets the router.
    #[must_use]
    pub fn router(mut self, router: Router) -> Self {
        self.router = router;
        self
    }

    /// Builds the request service without binding.
    #[must_use]
    pub fn into_service(self) -> AppService {
        let pipeline = self
            .pipeline
            .unwrap_or_else(|| Pipeline::standard(PipelineConfig::default()));
        AppService::new(pipeline, self.router)
    }

    /// Binds the listen address.
    pub async fn bind(self) -> Result<Server, ServerError> {
        let listener = TcpListener::bind(&self.address)
            .await
            .map_err(|source| ServerError::Bind {
                address: self.address.clone(),
                source,
            })?;
        let shutdown_timeout = self.shutdown_timeout;
        let max_body_bytes = self.max_body_bytes;
        Ok(Server {
            listener,
            service: self.into_service(),
            shutdown_timeout,
            max_body_bytes,
        })
    }
}
