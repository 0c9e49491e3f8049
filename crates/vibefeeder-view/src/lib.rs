//! # Vibefeeder View
//!
//! Server-side HTML as typed values.
//!
//! - [`Component`] - anything that can render itself into a byte buffer
//!   given the request's [`RequestContext`](vibefeeder_core::RequestContext)
//! - [`Renderer`] - renders a component through a pooled scratch buffer and
//!   flushes to the sink only on success
//! - [`pages`] - the layout, home page, error page and form helpers
//! - [`AssetManifest`] - content-hash query strings for static assets

#![doc(html_root_url = "https://docs.rs/vibefeeder-view/0.1.0")]
#![warn(missing_docs)]
#![forbid(unsafe_code)]

mod assets;
mod component;
pub mod pages;
mod pool;
mod renderer;

pub use assets::{asset_url, install_manifest, AssetManifest, ManifestError};
pub use component::{component_fn, html_escape, Component, FnComponent, RenderError};
pub use pool::{BufferPool, PooledBuffer};
pub use renderer::{HtmlResponse, Renderer};
