//! # VibeFeeder Server
//!
//! HTTP serving for VibeFeeder:
//!
//! - [`Server`]: Hyper HTTP/1.1 accept loop with graceful shutdown
//! - [`AppService`]: the buffered request path through the middleware
//!   pipeline and [`Router`], shared with in-process test clients
//! - [`HealthCheck`]: the `/healthz` report
//! - [`StaticFiles`]: static assets from disk or, with the `embed` feature,
//!   from the binary
//!
//! ## Example
//!
//! ```rust,ignore
//! use vibefeeder_server::{HealthCheck, Router, Server};
//!
//! #[tokio::main]
//! async fn main() -> Result<(), Box<dyn std::error::Error>> {
//!     let health = std::sync::Arc::new(HealthCheck::new());
//!     let router = Router::new().get("/healthz", move |_ctx, _req| {
//!         let health = health.clone();
//!         async move { Ok(health.check().await.into_response()) }
//!     });
//!
//!     Server::builder()
//!         .address("0.0.0.0:8080")
//!         .router(router)
//!         .bind()
//!         .await?
//!         .run()
//!         .await?;
//!     Ok(())
//! }
//! ```

#![doc(html_root_url = "https://docs.rs/vibefeeder-server/0.1.0")]
#![warn(missing_docs)]
#![forbid(unsafe_code)]

pub mod health;
pub mod router;
pub mod server;
pub mod shutdown;
pub mod static_files;

pub use health::{FnProbe, HealthCheck, HealthProbe, HealthReport};
pub use router::{RouteHandler, Router};
pub use server::{AppService, Server, ServerBuilder, ServerError};
pub use shutdown::ShutdownSignal;
#[cfg(feature = "embed")]
pub use static_files::EmbeddedProvider;
pub use static_files::{AssetMode, DiskProvider, StaticAsset, StaticFiles, StaticProvider, STATIC_PREFIX};
