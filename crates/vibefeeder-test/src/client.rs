//! In-process test client.

use std::collections::BTreeMap;
use std::net::SocketAddr;

use http::{header, Method};
use parking_lot::Mutex;
use vibefeeder_middleware::{CSRF_COOKIE, CSRF_HEADER};
use vibefeeder_server::AppService;

use crate::error::TestError;
use crate::request::TestRequestBuilder;
use crate::response::{parse_set_cookie, TestResponse};

/// Sends requests straight into an [`AppService`] without a socket.
///
/// The client behaves like a browser with a cookie jar: cookies set by a
/// response are sent with later requests, so a `GET` followed by a
/// [`csrf`](TestClientRequest::csrf) `POST` passes CSRF protection.
///
/// # Example
///
/// ```rust
/// use http::StatusCode;
/// use vibefeeder_middleware::{Pipeline, PipelineConfig, Response, ResponseExt};
/// use vibefeeder_server::{AppService, Router};
/// use vibefeeder_test::TestClient;
///
/// let router = Router::new()
///     .get("/", |_ctx, _req| async { Ok(Response::text(StatusCode::OK, "home")) })
///     .post("/", |_ctx, _req| async { Ok(Response::text(StatusCode::OK, "saved")) });
/// let client = TestClient::new(AppService::new(
///     Pipeline::standard(PipelineConfig::default()),
///     router,
/// ));
///
/// tokio_test::block_on(async {
///     client.post("/").send().await.assert_status(StatusCode::FORBIDDEN);
///
///     client.get("/").send().await.assert_status(StatusCode::OK);
///     client.post("/").csrf().send().await.assert_status(StatusCode::OK);
/// });
/// ```
#[derive(Debug)]
pub struct TestClient {
    service: AppService,
    remote_addr: SocketAddr,
    cookies: Mutex<BTreeMap<String, String>>,
}

impl TestClient {
    /// Creates a client for `service`.
    #[must_use]
    pub fn new(service: AppService) -> Self {
        Self {
            service,
            remote_addr: SocketAddr::from(([127, 0, 0, 1], 40_000)),
            cookies: Mutex::new(BTreeMap::new()),
        }
    }

    /// Sets the peer address requests appear to come from.
    #[must_use]
    pub fn with_remote_addr(mut self, addr: SocketAddr) -> Self {
        self.remote_addr = addr;
        self
    }

    /// Returns the service under test.
    #[must_use]
    pub fn service(&self) -> &AppService {
        &self.service
    }

    /// Returns a cookie from the jar.
    #[must_use]
    pub fn cookie(&self, name: &str) -> Option<String> {
        self.cookies.lock().get(name).cloned()
    }

    /// Returns the CSRF token issued so far.
    #[must_use]
    pub fn csrf_token(&self) -> Option<String> {
        self.cookie(CSRF_COOKIE)
    }

    /// Empties the cookie jar.
    pub fn clear_cookies(&self) {
        self.cookies.lock().clear();
    }

    /// Starts a `GET` request.
    pub fn get(&self, uri: impl AsRef<str>) -> TestClientRequest<'_> {
        self.request(Method::GET, uri)
    }

    /// Starts a `POST` request.
    pub fn post(&self, uri: impl AsRef<str>) -> TestClientRequest<'_> {
        self.request(Method::POST, uri)
    }

    /// Starts a request with any method.
    pub fn request(&self, method: Method, uri: impl AsRef<str>) -> TestClientRequest<'_> {
        TestClientRequest {
            client: self,
            builder: TestRequestBuilder::new(method, uri),
        }
    }

    fn cookie_header(&self) -> Option<String> {
        let cookies = self.cookies.lock();
        if cookies.is_empty() {
            return None;
        }
        Some(
            cookies
                .iter()
                .map(|(name, value)| format!("{name}={value}"))
                .collect::<Vec<_>>()
                .join("; "),
        )
    }

    fn store_cookies(&self, response: &TestResponse) {
        let mut jar = self.cookies.lock();
        for (name, value) in response.set_cookies().filter_map(parse_set_cookie) {
            if value.is_empty() {
                jar.remove(name);
            } else {
                jar.insert(name.to_string(), value.to_string());
            }
        }
    }
}

/// A request bound to a [`TestClient`].
#[must_use]
#[derive(Debug)]
pub struct TestClientRequest<'a> {
    client: &'a TestClient,
    builder: TestRequestBuilder,
}

impl TestClientRequest<'_> {
    /// Sets a header.
    pub fn header(mut self, name: impl AsRef<str>, value: impl AsRef<str>) -> Self {
        self.builder = self.builder.header(name, value);
        self
    }

    /// Prefers an HTML response.
    pub fn accept_html(mut self) -> Self {
        self.builder = self.builder.accept("text/html");
        self
    }

    /// Marks the request as an HTMX request.
    pub fn htmx(mut self) -> Self {
        self.builder = self.builder.htmx();
        self
    }

    /// Sends the jar's CSRF token in the `X-CSRF-Token` header.
    pub fn csrf(mut self) -> Self {
        if let Some(token) = self.client.csrf_token() {
            self.builder = self.builder.header(CSRF_HEADER, token);
        }
        self
    }

    /// Sets the raw body.
    pub fn body(mut self, body: impl Into<bytes::Bytes>) -> Self {
        self.builder = self.builder.body(body);
        self
    }

    /// Sets an urlencoded form body.
    pub fn form<T: serde::Serialize + ?Sized>(mut self, value: &T) -> Self {
        self.builder = self.builder.form(value);
        self
    }

    /// Sets a JSON body.
    pub fn json<T: serde::Serialize>(mut self, value: &T) -> Self {
        self.builder = self.builder.json(value);
        self
    }

    /// Sends the request.
    ///
    /// # Panics
    ///
    /// Panics if the request could not be built.
    pub async fn send(self) -> TestResponse {
        match self.try_send().await {
            Ok(response) => response,
            Err(e) => panic!("failed to send test request: {e}"),
        }
    }

    /// Sends the request, reporting build failures.
    pub async fn try_send(self) -> Result<TestResponse, TestError> {
        let client = self.client;
        let mut builder = self.builder;
        if !builder.has_header(&header::COOKIE) {
            if let Some(cookies) = client.cookie_header() {
                builder = builder.header(header::COOKIE.as_str(), cookies);
            }
        }

        let request = builder.build()?;
        let response = client
            .service
            .call(request, Some(client.remote_addr))
            .await;
        let response = TestResponse::from_response(response).await;
        client.store_cookies(&response);
        Ok(response)
    }
}
