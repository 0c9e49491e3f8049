//! # VibeFeeder
//!
//! Server-rendered HTMX web application. This crate wires the workspace
//! together and ships the `vibefeeder` binary.
//!
//! ## Request flow
//!
//! ```text
//! Request → RequestLogger → Recover → BodyLimit → SecurityHeaders
//!         → CustomHeaders → Csrf → Router → handler
//!                                              ↓
//! Response ← ErrorHandler (JSON / page / HTMX fragment) ←┘
//! ```
//!
//! ## Example
//!
//! ```rust,ignore
//! use vibefeeder::prelude::*;
//!
//! let config = ConfigLoader::new().with_env().load()?;
//! let state = AppState::new(HealthCheck::new());
//! let server = Server::builder()
//!     .address(&config.server.address)
//!     .pipeline(app::pipeline(&config, state.renderer.clone()))
//!     .router(app::static_files(&config).mount(app::router(&state)))
//!     .bind()
//!     .await?;
//! server.run().await?;
//! ```

#![doc(html_root_url = "https://docs.rs/vibefeeder/0.1.0")]
#![warn(missing_docs)]
#![forbid(unsafe_code)]

pub mod app;

pub use vibefeeder_config as config;
pub use vibefeeder_core as core;
pub use vibefeeder_extract as extract;
pub use vibefeeder_middleware as middleware;
pub use vibefeeder_server as server;
pub use vibefeeder_telemetry as telemetry;
pub use vibefeeder_validate as validate;
pub use vibefeeder_view as view;

pub use app::AppState;

/// Common imports for handlers and bootstrap code.
pub mod prelude {
    pub use crate::app::{self, AppState};

    pub use vibefeeder_config::{ConfigLoader, VibefeederConfig};
    pub use vibefeeder_core::{
        csrf_token, parse_field_errors, AppError, AppResult, ErrorMessage, FieldErrors, HttpError,
        RequestContext, ServiceError,
    };
    pub use vibefeeder_extract::{Cookies, Form, FromRequest, Query, ValidatedForm};
    pub use vibefeeder_middleware::{Pipeline, PipelineConfig, Request, Response, ResponseExt};
    pub use vibefeeder_server::{HealthCheck, HealthProbe, Router, Server};
    pub use vibefeeder_validate::{Validate, Validator};
    pub use vibefeeder_view::{component_fn, Component, Renderer};
}
