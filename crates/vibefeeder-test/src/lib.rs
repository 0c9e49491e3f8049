//! # VibeFeeder Test
//!
//! In-memory HTTP testing for VibeFeeder. Requests run through the real
//! middleware pipeline and router of an [`AppService`](vibefeeder_server::AppService)
//! without binding a port.
//!
//! ```rust,ignore
//! let client = TestClient::new(app());
//! client.get("/").send().await.assert_status(StatusCode::OK);
//! client
//!     .post("/feeds")
//!     .csrf()
//!     .form(&[("url", "https://example.com/rss")])
//!     .send()
//!     .await
//!     .assert_status(StatusCode::SEE_OTHER);
//! ```

#![doc(html_root_url = "https://docs.rs/vibefeeder-test/0.1.0")]
#![warn(missing_docs)]
#![forbid(unsafe_code)]

mod client;
mod error;
mod request;
mod response;

pub use client::{TestClient, TestClientRequest};
pub use error::TestError;
pub use request::TestRequestBuilder;
pub use response::TestResponse;
