//! Posting tracking reports.
//!
//! A report is one HTTP POST of the JSON payload to the tracking endpoint.
//! Delivery is best effort: failures are logged and never retried.

use gps_tracker_protocol::{encode_report, tracking_url, CodecError, ReportPayload, CONTENT_TYPE_JSON};
use thiserror::Error;
use tracing::{debug, error, info, warn};

use crate::network::LinkStatus;

/// Errors raised by an HTTP client.
#[derive(Debug, Error)]
pub enum HttpError {
    /// The URL could not be used (bad scheme, no host...).
    #[error("Invalid URL: {0}")]
    InvalidUrl(String),

    /// Connecting, sending or receiving failed.
    #[error("HTTP transport error: {0}")]
    Transport(String),
}

/// Why a report could not be sent.
#[derive(Debug, Error)]
pub enum ReportError {
    #[error(transparent)]
    Encode(#[from] CodecError),

    #[error(transparent)]
    Http(#[from] HttpError),
}

/// Status and body of an HTTP response.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct HttpResponse {
    pub status: u16,
    pub body: String,
}

impl HttpResponse {
    pub fn is_success(&self) -> bool {
        (200..300).contains(&self.status)
    }
}

/// Platform HTTP client.
///
/// One call opens the connection, sends the request, reads the whole
/// response and closes the connection again, on success and on error.
pub trait HttpClient {
    fn post(
        &mut self,
        url: &str,
        headers: &[(&str, &str)],
        body: &[u8],
    ) -> Result<HttpResponse, HttpError>;
}

/// Result of a single report attempt.
#[derive(Debug)]
pub enum ReportOutcome {
    /// The link was down; nothing was sent.
    Skipped,
    /// The server answered (any status).
    Sent(HttpResponse),
    /// The request could not be completed.
    Failed(ReportError),
}

/// Sends the tracking report over an [`HttpClient`].
#[derive(Debug)]
pub struct Reporter<H> {
    http: H,
    payload: ReportPayload,
}

impl<H: HttpClient> Reporter<H> {
    /// Reporter sending [`ReportPayload::fixed`].
    pub fn new(http: H) -> Self {
        Self::with_payload(http, ReportPayload::fixed())
    }

    pub fn with_payload(http: H, payload: ReportPayload) -> Self {
        Self { http, payload }
    }

    pub fn payload(&self) -> &ReportPayload {
        &self.payload
    }

    pub fn http(&self) -> &H {
        &self.http
    }

    /// POST the report to `host`'s tracking endpoint.
    ///
    /// Does nothing but log when `link` is down.
    pub fn post_report<L: LinkStatus + ?Sized>(&mut self, host: &str, link: &L) -> ReportOutcome {
        if !link.is_connected() {
            error!("Error in WiFi connection");
            return ReportOutcome::Skipped;
        }

        debug!(
            "Reporting position {}, {}",
            self.payload.latitude(),
            self.payload.longitude()
        );

        match self.send(host) {
            Ok(response) => {
                info!("{}", response.status);
                info!("{}", response.body);
                if !response.is_success() {
                    warn!("Tracking endpoint answered with status {}", response.status);
                } else if response.body.is_empty() {
                    warn!("Tracking endpoint answered with an empty body");
                }
                ReportOutcome::Sent(response)
            }
            Err(e) => {
                error!("Failed to post report: {}", e);
                ReportOutcome::Failed(e)
            }
        }
    }

    fn send(&mut self, host: &str) -> Result<HttpResponse, ReportError> {
        let url = tracking_url(host);
        let body = encode_report(&self.payload)?;
        let response = self
            .http
            .post(&url, &[("Content-Type", CONTENT_TYPE_JSON)], body.as_bytes())?;
        Ok(response)
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use pretty_assertions::assert_eq;

    #[derive(Debug, Clone, PartialEq)]
    struct RecordedRequest {
        url: String,
        headers: Vec<(String, String)>,
        body: Vec<u8>,
    }

    /// Client that records requests and replays a canned result.
    struct RecordingClient {
        requests: Vec<RecordedRequest>,
        response: Result<HttpResponse, String>,
    }

    impl RecordingClient {
        fn answering(status: u16, body: &str) -> Self {
            Self {
                requests: Vec::new(),
                response: Ok(HttpResponse {
                    status,
                    body: body.to_string(),
                }),
            }
        }

        fn failing(message: &str) -> Self {
            Self {
                requests: Vec::new(),
                response: Err(message.to_string()),
            }
        }
    }

    impl HttpClient for RecordingClient {
        fn post(
            &mut self,
            url: &str,
            headers: &[(&str, &str)],
            body: &[u8],
        ) -> Result<HttpResponse, HttpError> {
            self.requests.push(RecordedRequest {
                url: url.to_string(),
                headers: headers
                    .iter()
                    .map(|(k, v)| (k.to_string(), v.to_string()))
                    .collect(),
                body: body.to_vec(),
            });
            self.response.clone().map_err(HttpError::Transport)
        }
    }

    struct Link(bool);

    impl LinkStatus for Link {
        fn is_connected(&self) -> bool {
            self.0
        }
    }

    #[test]
    fn test_no_request_when_link_down() {
        let mut reporter = Reporter::new(RecordingClient::answering(200, "ok"));

        let outcome = reporter.post_report("http://h", &Link(false));

        assert!(matches!(outcome, ReportOutcome::Skipped));
        assert!(reporter.http().requests.is_empty());
    }

    #[test]
    fn test_posts_fixed_payload() {
        let mut reporter = Reporter::new(RecordingClient::answering(201, "{\"id\":7}"));

        let outcome = reporter.post_report("http://example.com", &Link(true));

        match outcome {
            ReportOutcome::Sent(response) => {
                assert_eq!(response.status, 201);
                assert_eq!(response.body, "{\"id\":7}");
            }
            other => panic!("Expected Sent, got {:?}", other),
        }

        let requests = &reporter.http().requests;
        assert_eq!(requests.len(), 1);
        assert_eq!(requests[0].url, "http://example.com/api/v1/driver/tracking");
        assert_eq!(
            requests[0].headers,
            vec![("Content-Type".to_string(), "application/json".to_string())]
        );

        let body: serde_json::Value = serde_json::from_slice(&requests[0].body).unwrap();
        assert_eq!(body["driver"]["name"], "Albert");
        assert_eq!(body["vehicle"]["brand"], "Dacia");
        assert_eq!(body["timestamp"], 1538205371);
    }

    #[test]
    fn test_error_status_is_still_sent() {
        let mut reporter = Reporter::new(RecordingClient::answering(500, ""));

        let outcome = reporter.post_report("http://h", &Link(true));

        match outcome {
            ReportOutcome::Sent(response) => assert!(!response.is_success()),
            other => panic!("Expected Sent, got {:?}", other),
        }
    }

    #[test]
    fn test_transport_failure_is_not_retried() {
        let mut reporter = Reporter::new(RecordingClient::failing("connection refused"));

        let outcome = reporter.post_report("http://h", &Link(true));

        assert!(matches!(
            outcome,
            ReportOutcome::Failed(ReportError::Http(HttpError::Transport(_)))
        ));
        assert_eq!(reporter.http().requests.len(), 1);
    }

    #[test]
    fn test_custom_payload() {
        let mut payload = ReportPayload::fixed();
        payload.driver.name = "d1".to_string();
        let mut reporter = Reporter::with_payload(RecordingClient::answering(200, "ok"), payload);

        reporter.post_report("http://h", &Link(true));

        let body: serde_json::Value =
            serde_json::from_slice(&reporter.http().requests[0].body).unwrap();
        assert_eq!(body["driver"]["name"], "d1");
    }

    #[test]
    fn test_success_range() {
        let response = |status| HttpResponse {
            status,
            body: String::new(),
        };
        assert!(response(200).is_success());
        assert!(response(299).is_success());
        assert!(!response(199).is_success());
        assert!(!response(300).is_success());
        assert!(!response(404).is_success());
    }
}
