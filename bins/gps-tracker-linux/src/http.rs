//! HTTP client for the host build.
//!
//! The tracker core is synchronous, so the client owns a current-thread
//! tokio runtime and blocks on it for each request. Requests go through
//! hyper's client with connection pooling disabled, so every POST opens
//! and closes its own connection. Only plain `http://` URLs are supported.

use std::time::Duration;

use gps_tracker_core::report::{HttpClient, HttpError, HttpResponse};
use http_body_util::{BodyExt, Full};
use hyper::body::Bytes;
use hyper::{Request, Uri};
use hyper_util::client::legacy::connect::HttpConnector;
use hyper_util::client::legacy::Client;
use hyper_util::rt::TokioExecutor;
use tokio::runtime::{Builder, Runtime};
use tracing::debug;

/// Default timeout for a whole request, connect included.
pub const REQUEST_TIMEOUT: Duration = Duration::from_secs(10);

fn transport_error(e: impl std::fmt::Display) -> HttpError {
    HttpError::Transport(e.to_string())
}

/// Parse `url` and check it is something this client can reach.
fn parse_url(url: &str) -> Result<Uri, HttpError> {
    let invalid = || HttpError::InvalidUrl(url.to_string());

    let uri: Uri = url.parse().map_err(|_| invalid())?;
    if uri.scheme_str() != Some("http") {
        return Err(invalid());
    }
    match uri.host() {
        Some(host) if !host.is_empty() => Ok(uri),
        _ => Err(invalid()),
    }
}

/// Blocking HTTP client backed by a private tokio runtime.
pub struct TokioHttpClient {
    runtime: Runtime,
    client: Client<HttpConnector, Full<Bytes>>,
    timeout: Duration,
}

impl TokioHttpClient {
    pub fn new() -> std::io::Result<Self> {
        Self::with_timeout(REQUEST_TIMEOUT)
    }

    pub fn with_timeout(timeout: Duration) -> std::io::Result<Self> {
        let runtime = Builder::new_current_thread().enable_all().build()?;
        let client = {
            let _guard = runtime.enter();
            Client::builder(TokioExecutor::new())
                .pool_max_idle_per_host(0)
                .build_http()
        };
        Ok(Self {
            runtime,
            client,
            timeout,
        })
    }

    async fn send(&self, request: Request<Full<Bytes>>) -> Result<HttpResponse, HttpError> {
        let response = self.client.request(request).await.map_err(transport_error)?;
        let status = response.status().as_u16();
        let body = response
            .into_body()
            .collect()
            .await
            .map_err(transport_error)?
            .to_bytes();

        Ok(HttpResponse {
            status,
            body: String::from_utf8_lossy(&body).into_owned(),
        })
    }
}

impl HttpClient for TokioHttpClient {
    fn post(
        &mut self,
        url: &str,
        headers: &[(&str, &str)],
        body: &[u8],
    ) -> Result<HttpResponse, HttpError> {
        let uri = parse_url(url)?;
        debug!("POST {} ({} bytes)", url, body.len());

        let mut builder = Request::post(uri);
        for (name, value) in headers {
            builder = builder.header(*name, *value);
        }
        let request = builder
            .body(Full::new(Bytes::copy_from_slice(body)))
            .map_err(transport_error)?;

        self.runtime
            .block_on(tokio::time::timeout(self.timeout, self.send(request)))
            .map_err(|_| {
                HttpError::Transport(format!("request timed out after {:?}", self.timeout))
            })?
    }
}
