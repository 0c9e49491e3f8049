//! End-to-end tests over a real TCP socket.

use std::sync::Arc;
use std::time::Duration;

use bytes::Bytes;
use http::StatusCode;
use parking_lot::Mutex;
use tokio::io::{AsyncReadExt, AsyncWriteExt};
use tokio::net::TcpStream;
use vibefeeder_middleware::{Pipeline, PipelineConfig, Response, ResponseExt};
use tracing::field::{Field, Visit};
use tracing::{Event, Level, Subscriber};
use tracing_subscriber::layer::{Context, SubscriberExt};
use tracing_subscriber::Layer;
use vibefeeder_server::{
    AssetMode, DiskProvider, HealthCheck, Router, Server, ShutdownSignal, StaticFiles,
};

/// Request log records seen by [`RequestLogs`]: level and `status` field.
#[derive(Clone, Default)]
struct RequestLogs(Arc<Mutex<Vec<(Level, String)>>>);

#[derive(Default)]
struct StatusVisitor {
    message: String,
    status: String,
}

impl Visit for StatusVisitor {
    fn record_debug(&mut self, field: &Field, value: &dyn std::fmt::Debug) {
        match field.name() {
            "message" => self.message = format!("{value:?}"),
            "status" => self.status = format!("{value:?}"),
            _ => {}
        }
    }
}

impl<S: Subscriber> Layer<S> for RequestLogs {
    fn on_event(&self, event: &Event<'_>, _ctx: Context<'_, S>) {
        let mut visitor = StatusVisitor::default();
        event.record(&mut visitor);
        if visitor.message == "HTTP request" {
            self.0.lock().push((*event.metadata().level(), visitor.status));
        }
    }
}

async fn start(router: Router, config: PipelineConfig) -> (std::net::SocketAddr, ShutdownSignal) {
    let server = Server::builder()
        .address("127.0.0.1:0")
        .shutdown_timeout(Duration::from_millis(200))
        .max_body_bytes(config.body_limit + 1)
        .pipeline(Pipeline::standard(config))
        .router(router)
        .bind()
        .await
        .unwrap();
    let addr = server.local_addr().unwrap();
    let shutdown = ShutdownSignal::new();
    tokio::spawn(server.serve(shutdown.clone()));
    (addr, shutdown)
}

async fn roundtrip(addr: std::net::SocketAddr, raw: &str) -> String {
    let mut stream = TcpStream::connect(addr).await.unwrap();
    stream.write_all(raw.as_bytes()).await.unwrap();
    let mut out = Vec::new();
    tokio::time::timeout(Duration::from_secs(5), stream.read_to_end(&mut out))
        .await
        .unwrap()
        .unwrap();
    String::from_utf8_lossy(&out).into_owned()
}

fn app() -> Router {
    let health = std::sync::Arc::new(HealthCheck::new());
    let fixtures = concat!(env!("CARGO_MANIFEST_DIR"), "/tests/fixtures/static");
    let router = Router::new()
        .get("/healthz", move |_ctx, _req| {
            let health = health.clone();
            async move { Ok(health.check().await.into_response()) }
        })
        .post("/echo", |_ctx, req: http::Request<Bytes>| async move {
            let body = String::from_utf8_lossy(req.body()).into_owned();
            Ok(Response::text(StatusCode::OK, body))
        });
    StaticFiles::new(DiskProvider::new(fixtures), AssetMode::Production).mount(router)
}

fn without_csrf() -> PipelineConfig {
    PipelineConfig {
        csrf: false,
        ..PipelineConfig::default()
    }
}

#[tokio::test]
async fn healthz_over_tcp() {
    let (addr, shutdown) = start(app(), PipelineConfig::default()).await;

    let response = roundtrip(addr, "GET /healthz HTTP/1.1\r\nHost: test\r\nConnection: close\r\n\r\n").await;
    assert!(response.starts_with("HTTP/1.1 200 OK"), "{response}");
    assert!(response.contains(r#"{"status":"healthy"}"#));
    assert!(response.to_ascii_lowercase().contains("x-frame-options: deny"));
    assert!(response.to_ascii_lowercase().contains("set-cookie: csrf_token="));

    shutdown.trigger();
}

#[tokio::test]
async fn static_assets_over_tcp() {
    let (addr, shutdown) = start(app(), without_csrf()).await;

    let response = roundtrip(
        addr,
        "GET /static/css/app.css?v=12345678 HTTP/1.1\r\nHost: test\r\nConnection: close\r\n\r\n",
    )
    .await;
    let lower = response.to_ascii_lowercase();
    assert!(response.starts_with("HTTP/1.1 200 OK"), "{response}");
    assert!(lower.contains("cache-control: public, max-age=31536000, immutable"));
    assert!(lower.contains("content-type: text/css"));
    assert!(response.ends_with("body { margin: 0; }\n"));

    let icon = roundtrip(addr, "GET /icon.svg HTTP/1.1\r\nHost: test\r\nConnection: close\r\n\r\n").await;
    assert!(icon.starts_with("HTTP/1.1 200 OK"), "{icon}");
    assert!(icon.to_ascii_lowercase().contains("cache-control: public, max-age=604800"));

    shutdown.trigger();
}

#[tokio::test]
async fn post_without_csrf_token_is_forbidden() {
    let (addr, shutdown) = start(app(), PipelineConfig::default()).await;

    let response = roundtrip(
        addr,
        "POST /echo HTTP/1.1\r\nHost: test\r\nContent-Type: text/plain\r\nContent-Length: 2\r\nConnection: close\r\n\r\nhi",
    )
    .await;
    assert!(response.starts_with("HTTP/1.1 403"), "{response}");
    assert!(response.contains("missing csrf token"));

    shutdown.trigger();
}

#[tokio::test]
async fn oversized_body_is_rejected() {
    let config = PipelineConfig {
        body_limit: 8,
        ..without_csrf()
    };
    let (addr, shutdown) = start(app(), config).await;

    let body = "x".repeat(64);
    let raw = format!(
        "POST /echo HTTP/1.1\r\nHost: test\r\nTransfer-Encoding: chunked\r\nConnection: close\r\n\r\n{:x}\r\n{body}\r\n0\r\n\r\n",
        body.len()
    );
    let response = roundtrip(addr, &raw).await;
    assert!(response.starts_with("HTTP/1.1 413"), "{response}");

    shutdown.trigger();
}

#[tokio::test]
async fn unknown_route_is_404() {
    let (addr, shutdown) = start(app(), without_csrf()).await;

    let response = roundtrip(addr, "GET /nope HTTP/1.1\r\nHost: test\r\nConnection: close\r\n\r\n").await;
    assert!(response.starts_with("HTTP/1.1 404"), "{response}");
    assert!(response.contains(r#""status":"error""#));

    shutdown.trigger();
}

#[tokio::test]
async fn malformed_chunked_body_goes_through_pipeline() {
    let logs = RequestLogs::default();
    let _guard = tracing::subscriber::set_default(tracing_subscriber::registry().with(logs.clone()));
    let (addr, shutdown) = start(app(), without_csrf()).await;

    let response = roundtrip(
        addr,
        "POST /echo HTTP/1.1\r\nHost: test\r\nTransfer-Encoding: chunked\r\nConnection: close\r\n\r\nZZZ\r\nhi\r\n0\r\n\r\n",
    )
    .await;
    assert!(response.starts_with("HTTP/1.1 400"), "{response}");
    assert!(response.contains("failed to read request body"));

    shutdown.trigger();
    assert_eq!(*logs.0.lock(), vec![(Level::WARN, "400".to_string())]);
}
