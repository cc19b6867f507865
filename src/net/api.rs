//! Leads REST API client.
//!
//! DESIGN
//! ======
//! `LeadApi` is the seam between the engine and the backend so the engine
//! can be driven by an in-memory fake in tests. `HttpLeadApi` is the real
//! implementation over `reqwest`.
//!
//! ERROR HANDLING
//! ==============
//! Transport errors, non-2xx statuses, and `success: false` envelopes are all
//! returned as `ApiError`; nothing here retries. Callers decide whether a
//! failure is surfaced, logged, or rolled back.

#[cfg(test)]
#[path = "api_test.rs"]
mod tests;

use std::time::Duration;

use url::Url;

use super::types::{ApiError, FeedbackBody, RemoteLead, StatusUpdateBody, parse_ack, parse_envelope};
use crate::config::HttpTimeouts;
use crate::state::query::RemoteQuery;

// =============================================================================
// TRAIT
// =============================================================================

/// Operations the engine needs from the leads backend.
#[async_trait::async_trait]
pub trait LeadApi: Send + Sync {
    /// `GET /api/leads` with the given filter parameters.
    ///
    /// # Errors
    ///
    /// Returns an [`ApiError`] on transport failure, non-2xx status, or a failed envelope.
    async fn list_leads(&self, query: &RemoteQuery) -> Result<Vec<RemoteLead>, ApiError>;

    /// `GET /api/leads/{id}`.
    ///
    /// # Errors
    ///
    /// Returns an [`ApiError`] on transport failure, non-2xx status, or a failed envelope.
    async fn get_lead(&self, id: &str) -> Result<RemoteLead, ApiError>;

    /// `PUT /api/leads/{id}/status` with `{ status }`.
    ///
    /// # Errors
    ///
    /// Returns an [`ApiError`] if the update was not acknowledged.
    async fn update_status(&self, id: &str, status: &str) -> Result<(), ApiError>;

    /// `POST /api/leads/{id}/feedback` with `{ feedback: [..] }`.
    ///
    /// # Errors
    ///
    /// Returns an [`ApiError`] if the submission was not acknowledged.
    async fn submit_feedback(&self, id: &str, feedback: &[String]) -> Result<(), ApiError>;
}

// =============================================================================
// HTTP IMPLEMENTATION
// =============================================================================

pub struct HttpLeadApi {
    http: reqwest::Client,
    base_url: Url,
}

impl HttpLeadApi {
    /// Build a client against `base_url` (e.g. `http://127.0.0.1:5001`).
    ///
    /// # Errors
    ///
    /// Returns an error if the base URL cannot be parsed or the HTTP client fails to build.
    pub fn new(base_url: &str, timeouts: HttpTimeouts) -> Result<Self, ApiError> {
        let base_url = Url::parse(base_url).map_err(|e| ApiError::HttpClientBuild(e.to_string()))?;
        let http = reqwest::Client::builder()
            .timeout(Duration::from_secs(timeouts.request_secs))
            .connect_timeout(Duration::from_secs(timeouts.connect_secs))
            .build()
            .map_err(|e| ApiError::HttpClientBuild(e.to_string()))?;
        Ok(Self { http, base_url })
    }

    async fn send(&self, request: reqwest::RequestBuilder) -> Result<String, ApiError> {
        let response = request
            .send()
            .await
            .map_err(|e| ApiError::Request(e.to_string()))?;

        let status = response.status().as_u16();
        let text = response
            .text()
            .await
            .map_err(|e| ApiError::Request(e.to_string()))?;
        if !(200..300).contains(&status) {
            return Err(ApiError::Status { status, body: text });
        }
        Ok(text)
    }
}

#[async_trait::async_trait]
impl LeadApi for HttpLeadApi {
    async fn list_leads(&self, query: &RemoteQuery) -> Result<Vec<RemoteLead>, ApiError> {
        let url = leads_url(&self.base_url, query)?;
        let text = self.send(self.http.get(url)).await?;
        parse_envelope(&text)
    }

    async fn get_lead(&self, id: &str) -> Result<RemoteLead, ApiError> {
        let url = lead_url(&self.base_url, id, None)?;
        let text = self.send(self.http.get(url)).await?;
        parse_envelope(&text)
    }

    async fn update_status(&self, id: &str, status: &str) -> Result<(), ApiError> {
        let url = lead_url(&self.base_url, id, Some("status"))?;
        let text = self
            .send(self.http.put(url).json(&StatusUpdateBody { status }))
            .await?;
        parse_ack(&text)
    }

    async fn submit_feedback(&self, id: &str, feedback: &[String]) -> Result<(), ApiError> {
        let url = lead_url(&self.base_url, id, Some("feedback"))?;
        let text = self
            .send(self.http.post(url).json(&FeedbackBody { feedback }))
            .await?;
        parse_ack(&text)
    }
}

// =============================================================================
// ENDPOINTS
// =============================================================================

fn with_segments(base: &Url, segments: &[&str]) -> Result<Url, ApiError> {
    let mut url = base.clone();
    url.path_segments_mut()
        .map_err(|()| ApiError::Request(format!("base URL cannot hold a path: {base}")))?
        .pop_if_empty()
        .extend(segments);
    Ok(url)
}

/// `{base}/api/leads?{query}`; the `?` is omitted when no filter is active.
fn leads_url(base: &Url, query: &RemoteQuery) -> Result<Url, ApiError> {
    let mut url = with_segments(base, &["api", "leads"])?;
    if !query.is_empty() {
        url.query_pairs_mut().extend_pairs(query.pairs());
    }
    Ok(url)
}

/// `{base}/api/leads/{id}[/{action}]` with `id` percent-encoded as one segment.
fn lead_url(base: &Url, id: &str, action: Option<&str>) -> Result<Url, ApiError> {
    match action {
        Some(action) => with_segments(base, &["api", "leads", id, action]),
        None => with_segments(base, &["api", "leads", id]),
    }
}
