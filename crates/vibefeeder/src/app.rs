//! Application wiring: pipeline, routes and static assets.

use std::sync::Arc;

use http::StatusCode;
use vibefeeder_config::VibefeederConfig;
use vibefeeder_core::{HttpError, RequestContext};
use vibefeeder_middleware::{ErrorHandler, Pipeline, PipelineConfig, Response, ResponseExt};
use vibefeeder_server::{AppService, AssetMode, HealthCheck, Router, StaticFiles};
use vibefeeder_validate::Validator;
use vibefeeder_view::pages::HomePage;
use vibefeeder_view::{AssetManifest, ManifestError, Renderer};

#[cfg(feature = "embed")]
#[derive(rust_embed::RustEmbed)]
#[folder = "static/"]
struct EmbeddedAssets;

/// State shared by the route handlers.
#[derive(Clone)]
pub struct AppState {
    /// Page renderer, sharing one buffer pool.
    pub renderer: Renderer,
    /// Form validator, built once at startup.
    pub validator: Arc<Validator>,
    /// Probes reported by `/healthz`.
    pub health: Arc<HealthCheck>,
}

impl std::fmt::Debug for AppState {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("AppState")
            .field("probes", &self.health.probe_count())
            .finish_non_exhaustive()
    }
}

impl AppState {
    /// Creates the state with the given health probes.
    #[must_use]
    pub fn new(health: HealthCheck) -> Self {
        Self {
            renderer: Renderer::new(),
            validator: Arc::new(Validator::new()),
            health: Arc::new(health),
        }
    }
}

/// The standard pipeline configured from `config`.
#[must_use]
pub fn pipeline(config: &VibefeederConfig, renderer: Renderer) -> Pipeline {
    let pipeline_config = PipelineConfig {
        body_limit: config.server.max_body_bytes,
        secure_cookies: config.auth.cookie_secure,
        ..PipelineConfig::default()
    };
    Pipeline::standard_with_handler(pipeline_config, Arc::new(ErrorHandler::new(renderer)))
}

/// The application routes, without static assets.
///
/// | Route | Handler |
/// |-------|---------|
/// | `GET /` | home page |
/// | `GET /healthz` | health report |
/// | `GET /metrics` | Prometheus metrics, 404 when no recorder is installed |
#[must_use]
pub fn router(state: &AppState) -> Router {
    let home = state.renderer.clone();
    let health = Arc::clone(&state.health);

    Router::new()
        .get("/", move |ctx: RequestContext, _req| {
            let result = home.html(StatusCode::OK, &HomePage, &ctx);
            async move { result }
        })
        .get("/healthz", move |_ctx, _req| {
            let health = Arc::clone(&health);
            async move { Ok(health.check().await.into_response()) }
        })
        .get("/metrics", |_ctx, _req| async {
            vibefeeder_telemetry::render_metrics()
                .map(|body| Response::text(StatusCode::OK, body))
                .ok_or_else(|| HttpError::not_found("metrics are disabled").into())
        })
}

/// Static assets: embedded with production caching under the `embed`
/// feature, otherwise read from `static.dir` without caching.
#[must_use]
pub fn static_files(config: &VibefeederConfig) -> StaticFiles {
    #[cfg(feature = "embed")]
    {
        let _ = config;
        StaticFiles::new(
            vibefeeder_server::EmbeddedProvider::<EmbeddedAssets>::new(),
            AssetMode::Production,
        )
    }
    #[cfg(not(feature = "embed"))]
    {
        StaticFiles::new(
            vibefeeder_server::DiskProvider::new(config.assets.dir.clone()),
            AssetMode::Development,
        )
    }
}

/// Loads the asset manifest, if the build has one.
///
/// Embedded builds read `manifest.json` from the embedded folder; disk
/// builds read `static.manifest` and treat a missing file as no manifest.
pub fn load_manifest(config: &VibefeederConfig) -> Result<Option<AssetManifest>, ManifestError> {
    #[cfg(feature = "embed")]
    {
        use rust_embed::RustEmbed;
        let _ = config;
        EmbeddedAssets::get("manifest.json")
            .map(|file| AssetManifest::from_json(&file.data))
            .transpose()
    }
    #[cfg(not(feature = "embed"))]
    {
        if config.assets.manifest.is_file() {
            AssetManifest::load(&config.assets.manifest).map(Some)
        } else {
            Ok(None)
        }
    }
}

/// Builds the full request service.
#[must_use]
pub fn service(config: &VibefeederConfig, state: &AppState) -> AppService {
    let router = static_files(config).mount(router(state));
    AppService::new(pipeline(config, state.renderer.clone()), router)
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_pipeline_follows_config() {
        let mut config = VibefeederConfig::default();
        config.server.max_body_bytes = 1024;
        let pipeline = pipeline(&config, Renderer::new());
        assert_eq!(
            pipeline.stage_names(),
            vec![
                "request_logger",
                "recover",
                "body_limit",
                "security_headers",
                "custom_headers",
                "csrf"
            ]
        );
    }

    #[test]
    fn test_router_has_app_routes() {
        let router = router(&AppState::new(HealthCheck::new()));
        assert!(router.has_route(&http::Method::GET, "/"));
        assert!(router.has_route(&http::Method::GET, "/healthz"));
        assert!(router.has_route(&http::Method::HEAD, "/healthz"));
        assert!(!router.has_route(&http::Method::POST, "/healthz"));
    }

    #[cfg(not(feature = "embed"))]
    #[test]
    fn test_missing_manifest_is_none() {
        let mut config = VibefeederConfig::default();
        config.assets.manifest = "/nonexistent/manifest.json".into();
        assert!(load_manifest(&config).unwrap().is_none());
    }
}
