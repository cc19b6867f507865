//! Wire DTOs and errors for the leads REST API.
//!
//! DESIGN
//! ======
//! Every endpoint wraps its payload in `{ success, data }`. Records are kept
//! close to what the backend sends (`_id`, camelCase, optional fields) and are
//! translated into display-ready `Lead` values by `state::leads`.

#[cfg(test)]
#[path = "types_test.rs"]
mod tests;

use serde::{Deserialize, Serialize};

// =============================================================================
// ERROR
// =============================================================================

/// Errors produced by leads API calls.
///
/// The variants follow the failure taxonomy of the backend: connectivity,
/// non-success status, and a `success: false` envelope. Users see one generic
/// message for all of them (see [`ApiError::user_message`]).
#[derive(Debug, Clone, PartialEq, Eq, thiserror::Error)]
pub enum ApiError {
    /// The HTTP request could not be sent or the body could not be read.
    #[error("request failed: {0}")]
    Request(String),

    /// The backend returned a non-2xx status.
    #[error("unexpected response status {status}")]
    Status { status: u16, body: String },

    /// The backend answered with `success: false`.
    #[error("backend reported failure")]
    Envelope,

    /// The response body was not the expected JSON shape.
    #[error("response parse failed: {0}")]
    Decode(String),

    /// The underlying HTTP client could not be constructed.
    #[error("HTTP client build failed: {0}")]
    HttpClientBuild(String),
}

impl ApiError {
    /// Grepable error code for logs.
    #[must_use]
    pub fn error_code(&self) -> &'static str {
        match self {
            Self::Request(_) => "E_API_REQUEST",
            Self::Status { .. } => "E_API_STATUS",
            Self::Envelope => "E_API_ENVELOPE",
            Self::Decode(_) => "E_API_DECODE",
            Self::HttpClientBuild(_) => "E_HTTP_CLIENT_BUILD",
        }
    }

    /// Whether repeating the same request could plausibly succeed.
    #[must_use]
    pub fn retryable(&self) -> bool {
        matches!(self, Self::Request(_) | Self::Status { status: 429 | 500..=599, .. })
    }

    /// The single message shown to users for any API failure.
    #[must_use]
    pub fn user_message(base_url: &str) -> String {
        format!("Could not connect to backend ({})", backend_label(base_url))
    }
}

/// `host:port` for display, falling back to the raw string.
fn backend_label(base_url: &str) -> String {
    let Ok(parsed) = url::Url::parse(base_url) else {
        return base_url.to_owned();
    };
    match (parsed.host_str(), parsed.port()) {
        (Some(host), Some(port)) => format!("{host}:{port}"),
        (Some(host), None) => host.to_owned(),
        _ => base_url.to_owned(),
    }
}

// =============================================================================
// ENVELOPES
// =============================================================================

/// `{ success, data }` response wrapper.
#[derive(Debug, Clone, Deserialize)]
pub struct Envelope<T> {
    pub success: bool,
    pub data: Option<T>,
}

/// Acknowledgement for mutation endpoints. Only `success` is consulted.
#[derive(Debug, Clone, Deserialize)]
struct Ack {
    success: bool,
}

/// Decode an enveloped payload, mapping `success: false` to [`ApiError::Envelope`].
///
/// # Errors
///
/// Returns an error if the body is not an envelope, reports failure, or lacks `data`.
pub fn parse_envelope<T>(body: &str) -> Result<T, ApiError>
where
    T: serde::de::DeserializeOwned,
{
    let envelope: Envelope<T> = serde_json::from_str(body).map_err(|e| ApiError::Decode(e.to_string()))?;
    if !envelope.success {
        return Err(ApiError::Envelope);
    }
    envelope
        .data
        .ok_or_else(|| ApiError::Decode("envelope has no data".to_owned()))
}

/// Interpret a mutation response body.
///
/// Bodies that are not JSON (or carry no `success` flag) count as success
/// because the status code already said so; an explicit `success: false`
/// is a failure.
///
/// # Errors
///
/// Returns [`ApiError::Envelope`] when the body reports `success: false`.
pub fn parse_ack(body: &str) -> Result<(), ApiError> {
    match serde_json::from_str::<Ack>(body) {
        Ok(Ack { success: false }) => Err(ApiError::Envelope),
        _ => Ok(()),
    }
}

// =============================================================================
// RECORDS
// =============================================================================

/// A lead as returned by `GET /api/leads` and `GET /api/leads/{id}`.
///
/// List responses carry the summary fields; detail responses add contact
/// and feedback fields.
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct RemoteLead {
    /// Backend document identifier.
    #[serde(rename = "_id")]
    pub id: String,
    #[serde(default)]
    pub company: String,
    pub industry: Option<String>,
    /// Match score in `[0, 100]`; may arrive as an integer or a float.
    pub match_score: Option<f64>,
    /// Status in whatever case the backend stores (usually lowercase).
    pub status: Option<String>,
    pub company_size: Option<String>,
    pub location: Option<String>,
    pub created_at: Option<String>,
    pub last_updated: Option<String>,
    pub phone: Option<String>,
    pub email: Option<String>,
    /// Feedback entries: plain tag strings, or objects from older records.
    pub feedback: Option<Vec<serde_json::Value>>,
    pub reason: Option<String>,
    pub source: Option<String>,
    pub product: Option<String>,
}

/// Body of `PUT /api/leads/{id}/status`.
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct StatusUpdateBody<'a> {
    pub status: &'a str,
}

/// Body of `POST /api/leads/{id}/feedback`.
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct FeedbackBody<'a> {
    pub feedback: &'a [String],
}
