//! HTTP client for ESP32.
//!
//! Each POST opens a fresh `EspHttpConnection`, which is dropped (and the
//! socket closed) before [`EspHttpClient::post`] returns.

use std::time::Duration;

use embedded_svc::http::client::Client;
use embedded_svc::io::{Read, Write};
use esp_idf_svc::http::client::{Configuration, EspHttpConnection};
use gps_tracker_core::report::{HttpClient, HttpError, HttpResponse};
use log::{debug, warn};

/// Default socket timeout for one request.
pub const REQUEST_TIMEOUT: Duration = Duration::from_secs(10);

/// Upper bound on the response body kept in memory.
pub const MAX_RESPONSE_BODY: usize = 2048;

fn transport_error(e: impl std::fmt::Display) -> HttpError {
    HttpError::Transport(e.to_string())
}

/// ESP-IDF HTTP(S) client.
#[derive(Debug, Clone)]
pub struct EspHttpClient {
    timeout: Duration,
}

impl EspHttpClient {
    pub fn new() -> Self {
        Self {
            timeout: REQUEST_TIMEOUT,
        }
    }

    pub fn with_timeout(timeout: Duration) -> Self {
        Self { timeout }
    }
}

impl Default for EspHttpClient {
    fn default() -> Self {
        Self::new()
    }
}

impl HttpClient for EspHttpClient {
    fn post(
        &mut self,
        url: &str,
        headers: &[(&str, &str)],
        body: &[u8],
    ) -> Result<HttpResponse, HttpError> {
        if !(url.starts_with("http://") || url.starts_with("https://")) {
            return Err(HttpError::InvalidUrl(url.to_string()));
        }

        let connection = EspHttpConnection::new(&Configuration {
            timeout: Some(self.timeout),
            crt_bundle_attach: Some(esp_idf_svc::sys::esp_crt_bundle_attach),
            ..Default::default()
        })
        .map_err(transport_error)?;
        let mut client = Client::wrap(connection);

        let content_length = body.len().to_string();
        let mut request_headers: Vec<(&str, &str)> = headers.to_vec();
        request_headers.push(("Content-Length", &content_length));

        debug!("POST {} ({} bytes)", url, body.len());
        let mut request = client
            .post(url, &request_headers)
            .map_err(transport_error)?;
        request.write_all(body).map_err(transport_error)?;
        request.flush().map_err(transport_error)?;

        let mut response = request.submit().map_err(transport_error)?;
        let status = response.status();

        let mut received = Vec::new();
        let mut chunk = [0u8; 256];
        loop {
            let n = response.read(&mut chunk).map_err(transport_error)?;
            if n == 0 {
                break;
            }
            let room = MAX_RESPONSE_BODY - received.len();
            received.extend_from_slice(&chunk[..n.min(room)]);
            if n > room {
                warn!("Response body truncated to {} bytes", MAX_RESPONSE_BODY);
                break;
            }
        }

        Ok(HttpResponse {
            status,
            body: String::from_utf8_lossy(&received).into_owned(),
        })
    }
}
