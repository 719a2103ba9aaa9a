//! JSON codec and endpoint addressing for tracking reports.

use crate::messages::ReportPayload;
use thiserror::Error;

/// Path of the tracking endpoint, appended to the configured host.
pub const TRACKING_PATH: &str = "/api/v1/driver/tracking";

/// Content type of every report request.
pub const CONTENT_TYPE_JSON: &str = "application/json";

/// Errors that can occur during report encoding.
#[derive(Debug, Error)]
pub enum CodecError {
    /// JSON serialization failed.
    #[error("Failed to encode report: {0}")]
    Json(#[from] serde_json::Error),
}

/// Build the tracking URL for a configured host.
///
/// The host is used verbatim as the URL prefix, scheme included, so
/// `"http://example.com"` yields `"http://example.com/api/v1/driver/tracking"`.
pub fn tracking_url(host: &str) -> String {
    format!("{}{}", host, TRACKING_PATH)
}

/// Encode a report to the compact JSON request body.
pub fn encode_report(payload: &ReportPayload) -> Result<String, CodecError> {
    serde_json::to_string(payload).map_err(CodecError::from)
}
