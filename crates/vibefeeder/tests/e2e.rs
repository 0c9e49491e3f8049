//! End-to-end behavior of the assembled application.

mod support;

use std::sync::Arc;

use http::StatusCode;
use parking_lot::Mutex;
use serde::Deserialize;
use tracing::Level;
use vibefeeder::app::{self, AppState};
use vibefeeder_config::VibefeederConfig;
use vibefeeder_core::{AppError, RequestContext};
use vibefeeder_extract::ValidatedForm;
use vibefeeder_middleware::{Response, ResponseExt};
use vibefeeder_server::{AppService, FnProbe, HealthCheck};
use vibefeeder_test::TestClient;
use vibefeeder_validate::Validate;
use vibefeeder_view::{component_fn, RenderError};

use support::capture_logs;

#[derive(Deserialize, Validate)]
struct Signup {
    #[validate(rules = "required,email", rename = "Email")]
    email: String,
    #[validate(rules = "required,strongpassword", rename = "Password")]
    password: String,
    #[validate(rules = "required,http_url", rename = "URL")]
    url: String,
}

fn config() -> VibefeederConfig {
    let mut config = VibefeederConfig::default();
    config.assets.dir = concat!(env!("CARGO_MANIFEST_DIR"), "/static").into();
    config
}

fn client_with(health: HealthCheck, sink: Arc<Mutex<Vec<u8>>>) -> TestClient {
    let config = config();
    let state = AppState::new(health);

    let validator = Arc::clone(&state.validator);
    let renderer = state.renderer.clone();
    let router = app::static_files(&config)
        .mount(app::router(&state))
        .post("/signup", move |_ctx, req| {
            let result = ValidatedForm::<Signup>::extract(&req, &validator)
                .map(|form| Response::text(StatusCode::OK, format!("welcome {}", form.0.email)));
            async move { result }
        })
        .get("/broken", move |ctx: RequestContext, _req| {
            let failing = component_fn(|_, out| {
                out.extend_from_slice(b"<p>half a page");
                Err(RenderError::component("feed list unavailable"))
            });
            let result = renderer
                .render(&mut *sink.lock(), "broken", &failing, &ctx)
                .map(|()| Response::text(StatusCode::OK, "unreachable"));
            async move { result }
        })
        .get("/panic", |_ctx, _req| async {
            if true {
                panic!("handler bug");
            }
            Ok::<_, AppError>(Response::text(StatusCode::OK, "unreachable"))
        });

    TestClient::new(AppService::new(
        app::pipeline(&config, state.renderer.clone()),
        router,
    ))
}

fn client() -> TestClient {
    client_with(HealthCheck::new(), Arc::default())
}

#[tokio::test]
async fn healthz_reports_healthy() {
    let response = client().get("/healthz").send().await;
    response.assert_status(StatusCode::OK);
    assert_eq!(response.body().as_ref(), br#"{"status":"healthy"}"#);
}

#[tokio::test]
async fn healthz_reports_failing_probe() {
    let health = HealthCheck::new().with_probe(FnProbe::new("database", || {
        Err("database unreachable".to_string())
    }));
    let response = client_with(health, Arc::default()).get("/healthz").send().await;

    response.assert_status(StatusCode::SERVICE_UNAVAILABLE);
    let body: serde_json::Value = response.json().unwrap();
    assert_eq!(body["status"], "unhealthy");
    assert_eq!(body["error"], "database unreachable");
}

#[tokio::test]
async fn post_without_csrf_is_forbidden_and_logged_once() {
    let client = client();
    let (records, _guard) = capture_logs();

    let response = client
        .post("/signup")
        .form(&[("email", "a@example.com")])
        .send()
        .await;

    response.assert_status(StatusCode::FORBIDDEN);
    let requests = records.http_requests();
    assert_eq!(requests.len(), 1);
    assert_eq!(requests[0].level, Level::WARN);
    assert_eq!(requests[0].field("method"), Some("POST"));
    assert_eq!(requests[0].field("status"), Some("403"));
    assert_eq!(requests[0].field("uri"), Some("/signup"));
}

#[tokio::test]
async fn log_level_follows_status() {
    let client = client();
    let (records, _guard) = capture_logs();

    client.get("/").send().await.assert_status(StatusCode::OK);
    client.get("/missing").send().await.assert_status(StatusCode::NOT_FOUND);
    client.get("/broken").send().await.assert_status(StatusCode::INTERNAL_SERVER_ERROR);

    let levels: Vec<Level> = records.http_requests().iter().map(|r| r.level).collect();
    assert_eq!(levels, vec![Level::INFO, Level::WARN, Level::ERROR]);
}

#[tokio::test]
async fn error_field_logged_only_for_failures() {
    let client = client();
    let (records, _guard) = capture_logs();

    client.get("/").send().await.assert_status(StatusCode::OK);
    client.get("/missing").send().await.assert_status(StatusCode::NOT_FOUND);

    let requests = records.http_requests();
    assert_eq!(requests.len(), 2);
    assert_eq!(requests[0].field("status"), Some("200"));
    assert_eq!(requests[0].field("error"), None);
    assert!(requests[1].field("error").is_some_and(|e| !e.is_empty()));
}

#[tokio::test]
async fn validation_failure_returns_field_map() {
    let client = client();
    client.get("/").send().await;

    let response = client
        .post("/signup")
        .csrf()
        .form(&[
            ("email", "invalid-email"),
            ("password", "weak"),
            ("url", "ftp://x"),
        ])
        .send()
        .await;

    response.assert_status(StatusCode::BAD_REQUEST);
    let body: serde_json::Value = response.json().unwrap();
    assert_eq!(body["status"], "error");
    assert_eq!(body["fields"]["Email"], "Must be a valid email address");
    assert_eq!(
        body["fields"]["Password"],
        "Make password longer or add numbers and symbols"
    );
    assert_eq!(body["fields"]["URL"], "Must be a valid HTTP or HTTPS URL");
    assert_eq!(body["fields"].as_object().unwrap().len(), 3);
}

#[tokio::test]
async fn valid_form_with_csrf_token_succeeds() {
    let client = client();
    client.get("/").send().await;
    let token = client.csrf_token().unwrap();

    let response = client
        .post("/signup")
        .form(&[
            ("csrf_token", token.as_str()),
            ("email", "reader@example.com"),
            ("password", "correct-Horse-battery-staple-42"),
            ("url", "https://example.com/feed.xml"),
        ])
        .send()
        .await;

    response.assert_status(StatusCode::OK);
    response.assert_body_contains("welcome reader@example.com");
}

#[tokio::test]
async fn render_failure_writes_nothing_and_returns_generic_error() {
    let sink = Arc::new(Mutex::new(Vec::new()));
    let client = client_with(HealthCheck::new(), Arc::clone(&sink));

    let response = client.get("/broken").send().await;
    response.assert_status(StatusCode::INTERNAL_SERVER_ERROR);
    assert!(sink.lock().is_empty());

    let body: serde_json::Value = response.json().unwrap();
    assert_eq!(
        body["error"],
        "An unexpected error occurred. Please try again later."
    );
    assert!(!response.text().unwrap().contains("feed list unavailable"));

    let page = client.get("/broken").accept_html().send().await;
    page.assert_status(StatusCode::INTERNAL_SERVER_ERROR);
    page.assert_body_contains("Internal Server Error");
    assert!(!page.text().unwrap().contains("half a page"));
}

#[tokio::test]
async fn panics_become_500() {
    let response = client().get("/panic").send().await;
    response.assert_status(StatusCode::INTERNAL_SERVER_ERROR);
    assert!(!response.text().unwrap().contains("handler bug"));
}

#[tokio::test]
async fn error_responses_carry_security_headers() {
    let response = client().get("/nope").accept_html().send().await;

    response.assert_status(StatusCode::NOT_FOUND);
    response.assert_header("x-frame-options", "DENY");
    response.assert_header("x-content-type-options", "nosniff");
    response.assert_header("referrer-policy", "strict-origin-when-cross-origin");
    assert!(response.header("content-security-policy").is_some());
    assert!(response.header("permissions-policy").is_some());
    assert!(response.content_type().unwrap().starts_with("text/html"));
    response.assert_body_contains("Not Found");
}

#[tokio::test]
async fn htmx_errors_render_fragment() {
    let response = client().get("/nope").accept_html().htmx().send().await;

    response.assert_status(StatusCode::NOT_FOUND);
    let body = response.text().unwrap();
    assert!(body.starts_with("<div id=\"global-errors\" hx-swap-oob=\"true\">"));
    assert!(!body.contains("<html"));
}

#[tokio::test]
async fn home_page_embeds_csrf_token() {
    let client = client();
    let response = client.get("/").send().await;

    response.assert_status(StatusCode::OK);
    let token = response.cookie("csrf_token").unwrap().to_string();
    response.assert_body_contains(format!("&quot;X-CSRF-Token&quot;:&quot;{token}&quot;"));
    response.assert_body_contains("/static/css/app.css");
}

#[tokio::test]
async fn static_assets_are_served_from_disk() {
    let response = client().get("/static/css/app.css").send().await;
    response.assert_status(StatusCode::OK);
    response.assert_header("cache-control", "no-cache");
    assert!(response.content_type().unwrap().starts_with("text/css"));

    client()
        .get("/static/../Cargo.toml")
        .send()
        .await
        .assert_status(StatusCode::NOT_FOUND);
}
