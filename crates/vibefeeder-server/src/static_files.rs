//! Static asset serving.
//!
//! Assets come from a [`StaticProvider`]: [`DiskProvider`] reads a
//! directory (development), [`EmbeddedProvider`] reads files compiled into
//! the binary (`embed` feature, production). [`StaticFiles`] turns an asset
//! into a response with the cache policy of the selected mode:
//!
//! | Mode        | Request              | `Cache-Control`                         |
//! |-------------|----------------------|-----------------------------------------|
//! | Development | any                  | `no-cache`                              |
//! | Production  | with `?v=` parameter | `public, max-age=31536000, immutable`   |
//! | Production  | without              | `public, max-age=3600, must-revalidate` |
//! | either      | icon                 | `public, max-age=604800`                |

use std::path::{Component, Path, PathBuf};
use std::sync::Arc;
use std::time::SystemTime;

use bytes::Bytes;
use http::{header, HeaderValue, Method, StatusCode};
use http_body_util::Full;
use vibefeeder_core::{AppError, HttpError, RequestContext};
use vibefeeder_middleware::{Request, Response};

use crate::router::Router;

/// URL prefix under which assets are served.
pub const STATIC_PREFIX: &str = "/static/";

const CACHE_VERSIONED: &str = "public, max-age=31536000, immutable";
const CACHE_UNVERSIONED: &str = "public, max-age=3600, must-revalidate";
const CACHE_DEVELOPMENT: &str = "no-cache";
const CACHE_ICON: &str = "public, max-age=604800";

/// Site icons served from the provider root, with their content types.
pub const ICONS: [(&str, &str); 3] = [
    ("/favicon.ico", "image/x-icon"),
    ("/icon.svg", "image/svg+xml"),
    ("/apple-touch-icon.png", "image/png"),
];

/// A file ready to be served.
#[derive(Debug, Clone)]
pub struct StaticAsset {
    /// File contents.
    pub contents: Bytes,
    /// Value for `Content-Type`.
    pub content_type: String,
    /// Modification time, when known.
    pub last_modified: Option<SystemTime>,
}

/// Source of static assets.
///
/// `path` is relative to the provider root, uses forward slashes and has no
/// leading slash (`css/app.css`).
pub trait StaticProvider: Send + Sync {
    /// Opens the asset at `path`, or `None` if there is no such asset.
    fn open(&self, path: &str) -> Option<StaticAsset>;
}

/// Rejects empty, absolute, parent and hidden segments.
fn is_safe_path(path: &str) -> bool {
    !path.is_empty()
        && !path.contains('\\')
        && Path::new(path).components().all(|component| match component {
            Component::Normal(name) => !name.to_string_lossy().starts_with('.'),
            _ => false,
        })
}

fn content_type_for(path: &str) -> String {
    mime_guess::from_path(path)
        .first_or_octet_stream()
        .essence_str()
        .to_string()
}

/// Serves files from a directory.
#[derive(Debug, Clone)]
pub struct DiskProvider {
    root: PathBuf,
}

impl DiskProvider {
    /// Creates a provider rooted at `root`.
    pub fn new(root: impl Into<PathBuf>) -> Self {
        Self { root: root.into() }
    }

    /// The root directory.
    #[must_use]
    pub fn root(&self) -> &Path {
        &self.root
    }
}

impl StaticProvider for DiskProvider {
    fn open(&self, path: &str) -> Option<StaticAsset> {
        if !is_safe_path(path) {
            return None;
        }
        let full = self.root.join(path);
        let metadata = std::fs::metadata(&full).ok()?;
        if !metadata.is_file() {
            return None;
        }
        let contents = match std::fs::read(&full) {
            Ok(contents) => contents,
            Err(e) => {
                tracing::warn!(path = %full.display(), error = %e, "Failed to read static file");
                return None;
            }
        };
        Some(StaticAsset {
            contents: Bytes::from(contents),
            content_type: content_type_for(path),
            last_modified: metadata.modified().ok(),
        })
    }
}

/// Serves files compiled into the binary with `rust-embed`.
///
/// ```rust,ignore
/// #[derive(rust_embed::RustEmbed)]
/// #[folder = "static/"]
/// struct Assets;
///
/// let provider = EmbeddedProvider::<Assets>::new();
/// ```
#[cfg(feature = "embed")]
#[derive(Debug, Clone, Copy, Default)]
pub struct EmbeddedProvider<E> {
    _assets: std::marker::PhantomData<fn() -> E>,
}

#[cfg(feature = "embed")]
impl<E: rust_embed::RustEmbed> EmbeddedProvider<E> {
    /// Creates a provider over the embedded folder `E`.
    #[must_use]
    pub fn new() -> Self {
        Self {
            _assets: std::marker::PhantomData,
        }
    }
}

#[cfg(feature = "embed")]
impl<E: rust_embed::RustEmbed> StaticProvider for EmbeddedProvider<E> {
    fn open(&self, path: &str) -> Option<StaticAsset> {
        if !is_safe_path(path) {
            return None;
        }
        let file = E::get(path)?;
        let last_modified = file
            .metadata
            .last_modified()
            .map(|secs| SystemTime::UNIX_EPOCH + std::time::Duration::from_secs(secs));
        let contents = match file.data {
            std::borrow::Cow::Borrowed(data) => Bytes::from_static(data),
            std::borrow::Cow::Owned(data) => Bytes::from(data),
        };
        Some(StaticAsset {
            contents,
            content_type: content_type_for(path),
            last_modified,
        })
    }
}

/// Which cache policy assets are served with.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default)]
pub enum AssetMode {
    /// Always revalidate.
    #[default]
    Development,
    /// Long-lived caching for versioned URLs.
    Production,
}

/// Serves assets from a provider with the cache policy of a mode.
#[derive(Clone)]
pub struct StaticFiles {
    provider: Arc<dyn StaticProvider>,
    mode: AssetMode,
}

impl std::fmt::Debug for StaticFiles {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("StaticFiles").field("mode", &self.mode).finish_non_exhaustive()
    }
}

impl StaticFiles {
    /// Creates the server for `provider`.
    pub fn new(provider: impl StaticProvider + 'static, mode: AssetMode) -> Self {
        Self {
            provider: Arc::new(provider),
            mode,
        }
    }

    /// Returns the cache mode.
    #[must_use]
    pub fn mode(&self) -> AssetMode {
        self.mode
    }

    /// Serves the asset for a `/static/...` request.
    pub fn serve(&self, request: &Request) -> Result<Response, AppError> {
        let path = request.uri().path();
        let relative = path.strip_prefix(STATIC_PREFIX).unwrap_or(path);
        let asset = self
            .provider
            .open(relative)
            .ok_or_else(|| HttpError::not_found(format!("asset {path} not found")))?;

        let cache_control = match self.mode {
            AssetMode::Development => CACHE_DEVELOPMENT,
            AssetMode::Production if has_version(request) => CACHE_VERSIONED,
            AssetMode::Production => CACHE_UNVERSIONED,
        };
        Ok(asset_response(request.method(), asset, None, cache_control))
    }

    /// Serves one of the [`ICONS`] from the provider root.
    pub fn serve_icon(&self, request: &Request) -> Result<Response, AppError> {
        let path = request.uri().path();
        let (_, content_type) = ICONS
            .iter()
            .find(|(icon, _)| *icon == path)
            .ok_or_else(|| HttpError::not_found(format!("{path} is not an icon")))?;
        let asset = self
            .provider
            .open(path.trim_start_matches('/'))
            .ok_or_else(|| HttpError::not_found(format!("icon {path} not found")))?;
        Ok(asset_response(request.method(), asset, Some(content_type), CACHE_ICON))
    }

    /// Adds the `/static/` prefix route and the icon routes to `router`.
    #[must_use]
    pub fn mount(self, router: Router) -> Router {
        let files = Arc::new(self);

        let assets = Arc::clone(&files);
        let mut router = router.prefix(Method::GET, STATIC_PREFIX, move |_ctx: RequestContext, request| {
            let result = assets.serve(&request);
            async move { result }
        });

        for (icon, _) in ICONS {
            let files = Arc::clone(&files);
            router = router.get(icon, move |_ctx: RequestContext, request| {
                let result = files.serve_icon(&request);
                async move { result }
            });
        }
        router
    }
}

fn has_version(request: &Request) -> bool {
    request
        .uri()
        .query()
        .is_some_and(|query| query.split('&').any(|pair| pair.starts_with("v=") && pair.len() > 2))
}

fn asset_response(
    method: &Method,
    asset: StaticAsset,
    content_type: Option<&str>,
    cache_control: &'static str,
) -> Response {
    let content_type = content_type.map_or(asset.content_type, str::to_string);
    let length = asset.contents.len();
    let body = if *method == Method::HEAD {
        Bytes::new()
    } else {
        asset.contents
    };

    let mut builder = http::Response::builder()
        .status(StatusCode::OK)
        .header(header::CONTENT_TYPE, content_type)
        .header(header::CONTENT_LENGTH, length)
        .header(header::CACHE_CONTROL, HeaderValue::from_static(cache_control));
    if let Some(modified) = asset.last_modified {
        builder = builder.header(header::LAST_MODIFIED, httpdate::fmt_http_date(modified));
    }
    builder
        .body(Full::new(body))
        .expect("failed to build static file response")
}
