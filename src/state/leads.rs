//! Display-ready lead records and the sorted inbox view.
//!
//! DESIGN
//! ======
//! Remote records are translated once, on arrival: the confidence tier is
//! recomputed from the score (the backend's value is never trusted), status
//! strings are title-cased, and missing optional fields get display
//! defaults. The sorted view is a pure function of the cache and the filter
//! criteria, rebuilt on every read instead of being maintained incrementally.

#[cfg(test)]
#[path = "leads_test.rs"]
mod tests;

use std::cmp::Ordering;
use std::fmt;

use serde::{Deserialize, Serialize};
use time::OffsetDateTime;
use time::format_description::well_known::Rfc3339;

use super::filters::FilterCriteria;
use crate::net::types::RemoteLead;

pub const DEFAULT_INDUSTRY: &str = "Technology";
pub const DEFAULT_COMPANY_SIZE: &str = "Medium";
pub const DEFAULT_LOCATION: &str = "International";
pub const DEFAULT_REASON: &str = "AI Signal Detected";
pub const DEFAULT_SOURCE: &str = "CRM Backend";
pub const DEFAULT_PRODUCT: &str = "B2B Solutions";

/// Number of leads flagged as "top" at the head of the sorted view.
pub const TOP_LEAD_COUNT: usize = 3;

// =============================================================================
// CONFIDENCE
// =============================================================================

/// Coarse bucket over the match score.
#[derive(Clone, Copy, Debug, PartialEq, Eq, Hash, Serialize)]
pub enum ConfidenceTier {
    High,
    Medium,
    Low,
}

impl ConfidenceTier {
    /// `> 85` is High, `> 70` is Medium, everything else Low.
    ///
    /// Applied to the raw backend score, before rounding. Missing or
    /// non-finite scores are Low.
    #[must_use]
    pub fn from_match_score(raw: Option<f64>) -> Self {
        let raw = raw.filter(|s| s.is_finite()).unwrap_or(0.0);
        if raw > 85.0 {
            Self::High
        } else if raw > 70.0 {
            Self::Medium
        } else {
            Self::Low
        }
    }

    #[must_use]
    pub fn label(self) -> &'static str {
        match self {
            Self::High => "High",
            Self::Medium => "Medium",
            Self::Low => "Low",
        }
    }
}

impl fmt::Display for ConfidenceTier {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.label())
    }
}

// =============================================================================
// STATUS
// =============================================================================

/// Lead workflow status.
///
/// Transitions are unrestricted: any status may be set from any other.
/// Values outside the four known ones are kept (title-cased) in `Other`.
#[derive(Clone, Debug, PartialEq, Eq, PartialOrd, Ord, Hash)]
pub enum LeadStatus {
    New,
    Contacted,
    Qualified,
    Closed,
    Other(String),
}

impl LeadStatus {
    pub const KNOWN: [LeadStatus; 4] = [Self::New, Self::Contacted, Self::Qualified, Self::Closed];

    /// Normalize a raw status string (`"new"`, `" QUALIFIED "`) to a status.
    #[must_use]
    pub fn parse(raw: &str) -> Self {
        let normalized = title_case(raw.trim());
        match normalized.as_str() {
            "New" => Self::New,
            "Contacted" => Self::Contacted,
            "Qualified" => Self::Qualified,
            "Closed" => Self::Closed,
            _ => Self::Other(normalized),
        }
    }

    #[must_use]
    pub fn label(&self) -> &str {
        match self {
            Self::New => "New",
            Self::Contacted => "Contacted",
            Self::Qualified => "Qualified",
            Self::Closed => "Closed",
            Self::Other(s) => s,
        }
    }

    /// Lowercase form the backend stores.
    #[must_use]
    pub fn wire_value(&self) -> String {
        self.label().to_lowercase()
    }

    #[must_use]
    pub fn is_new(&self) -> bool {
        matches!(self, Self::New)
    }
}

impl fmt::Display for LeadStatus {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.label())
    }
}

impl Serialize for LeadStatus {
    fn serialize<S: serde::Serializer>(&self, serializer: S) -> Result<S::Ok, S::Error> {
        serializer.serialize_str(self.label())
    }
}

impl<'de> Deserialize<'de> for LeadStatus {
    fn deserialize<D: serde::Deserializer<'de>>(deserializer: D) -> Result<Self, D::Error> {
        let raw = String::deserialize(deserializer)?;
        Ok(Self::parse(&raw))
    }
}

/// Uppercase the first character and lowercase the rest.
#[must_use]
pub fn title_case(raw: &str) -> String {
    let mut chars = raw.chars();
    match chars.next() {
        Some(first) => first
            .to_uppercase()
            .chain(chars.flat_map(char::to_lowercase))
            .collect(),
        None => String::new(),
    }
}

// =============================================================================
// LEAD
// =============================================================================

/// A lead as shown in the inbox.
///
/// Contact and feedback fields stay empty until the detail view loads them.
#[derive(Clone, Debug, PartialEq)]
pub struct Lead {
    pub id: String,
    /// Company name.
    pub name: String,
    pub industry: String,
    /// Match score in `[0, 100]`.
    pub score: u8,
    /// Derived from the unrounded backend score.
    pub confidence: ConfidenceTier,
    pub status: LeadStatus,
    pub company_size: String,
    pub location: String,
    pub last_updated: Option<OffsetDateTime>,
    pub reason: String,
    pub source: String,
    pub product: String,
    pub phone: Option<String>,
    pub email: Option<String>,
    pub feedback: Vec<String>,
}

impl Lead {
    /// Translate a backend record, filling display defaults for missing fields.
    #[must_use]
    pub fn from_remote(remote: RemoteLead) -> Self {
        let score = clamp_score(remote.match_score);
        let last_updated = parse_timestamp(remote.created_at.as_deref().or(remote.last_updated.as_deref()));
        Self {
            id: remote.id,
            name: remote.company,
            industry: non_empty_or(remote.industry, DEFAULT_INDUSTRY),
            score,
            confidence: ConfidenceTier::from_match_score(remote.match_score),
            status: remote.status.as_deref().map_or(LeadStatus::New, LeadStatus::parse),
            company_size: non_empty_or(remote.company_size, DEFAULT_COMPANY_SIZE),
            location: non_empty_or(remote.location, DEFAULT_LOCATION),
            last_updated,
            reason: non_empty_or(remote.reason, DEFAULT_REASON),
            source: non_empty_or(remote.source, DEFAULT_SOURCE),
            product: non_empty_or(remote.product, DEFAULT_PRODUCT),
            phone: remote.phone,
            email: remote.email,
            feedback: remote
                .feedback
                .unwrap_or_default()
                .iter()
                .filter_map(feedback_text)
                .collect(),
        }
    }

    /// Overlay fields from a detail response onto this (possibly partial) lead.
    ///
    /// Fields absent from the detail response keep their current values.
    pub fn merge_detail(&mut self, detail: RemoteLead) {
        if !detail.company.is_empty() {
            self.name = detail.company;
        }
        if let Some(industry) = detail.industry.filter(|s| !s.is_empty()) {
            self.industry = industry;
        }
        if detail.match_score.is_some() {
            self.score = clamp_score(detail.match_score);
            self.confidence = ConfidenceTier::from_match_score(detail.match_score);
        }
        if let Some(status) = detail.status.as_deref() {
            self.status = LeadStatus::parse(status);
        }
        if let Some(size) = detail.company_size.filter(|s| !s.is_empty()) {
            self.company_size = size;
        }
        if let Some(location) = detail.location.filter(|s| !s.is_empty()) {
            self.location = location;
        }
        if let Some(ts) = parse_timestamp(detail.created_at.as_deref().or(detail.last_updated.as_deref())) {
            self.last_updated = Some(ts);
        }
        if let Some(reason) = detail.reason.filter(|s| !s.is_empty()) {
            self.reason = reason;
        }
        if let Some(source) = detail.source.filter(|s| !s.is_empty()) {
            self.source = source;
        }
        if let Some(product) = detail.product.filter(|s| !s.is_empty()) {
            self.product = product;
        }
        if detail.phone.is_some() {
            self.phone = detail.phone;
        }
        if detail.email.is_some() {
            self.email = detail.email;
        }
        if let Some(feedback) = detail.feedback {
            self.feedback = feedback.iter().filter_map(feedback_text).collect();
        }
    }
}

fn non_empty_or(value: Option<String>, default: &str) -> String {
    value
        .filter(|s| !s.trim().is_empty())
        .unwrap_or_else(|| default.to_owned())
}

#[allow(clippy::cast_possible_truncation, clippy::cast_sign_loss)]
fn clamp_score(raw: Option<f64>) -> u8 {
    raw.filter(|s| s.is_finite())
        .map_or(0, |s| s.round().clamp(0.0, 100.0) as u8)
}

fn parse_timestamp(raw: Option<&str>) -> Option<OffsetDateTime> {
    OffsetDateTime::parse(raw?, &Rfc3339).ok()
}

/// Feedback entries are tag strings; older records store `{ text }` objects.
fn feedback_text(value: &serde_json::Value) -> Option<String> {
    match value {
        serde_json::Value::String(s) => Some(s.clone()),
        serde_json::Value::Object(map) => ["text", "tag", "label"]
            .iter()
            .find_map(|key| map.get(*key).and_then(|v| v.as_str()))
            .map(str::to_owned),
        _ => None,
    }
}

// =============================================================================
// SORTED VIEW
// =============================================================================

/// Inbox order: `New` before everything else, then descending score.
#[must_use]
pub fn compare_for_display(a: &Lead, b: &Lead) -> Ordering {
    b.status
        .is_new()
        .cmp(&a.status.is_new())
        .then_with(|| b.score.cmp(&a.score))
}

/// Stable sort into inbox order.
pub fn sort_for_display(leads: &mut [Lead]) {
    leads.sort_by(compare_for_display);
}

/// The list a renderer draws: filtered, sorted, with the top entries flagged.
#[derive(Clone, Debug, Default, PartialEq)]
pub struct LeadView {
    pub leads: Vec<Lead>,
    /// IDs of the first [`TOP_LEAD_COUNT`] leads in `leads`.
    pub top_ids: Vec<String>,
    /// Size of the unfiltered cache.
    pub total: usize,
}

impl LeadView {
    /// Derive the view from the cache, applying `criteria` locally as of `now`.
    #[must_use]
    pub fn build(cache: &[Lead], criteria: &FilterCriteria, now: OffsetDateTime) -> Self {
        let mut leads: Vec<Lead> = cache
            .iter()
            .filter(|lead| criteria.matches(lead, now))
            .cloned()
            .collect();
        sort_for_display(&mut leads);
        let top_ids = leads
            .iter()
            .take(TOP_LEAD_COUNT)
            .map(|lead| lead.id.clone())
            .collect();
        Self { leads, top_ids, total: cache.len() }
    }

    #[must_use]
    pub fn showing(&self) -> usize {
        self.leads.len()
    }

    #[must_use]
    pub fn is_top(&self, id: &str) -> bool {
        self.top_ids.iter().any(|top| top == id)
    }

    /// IDs of every visible lead, in display order.
    #[must_use]
    pub fn ids(&self) -> Vec<String> {
        self.leads.iter().map(|lead| lead.id.clone()).collect()
    }

    /// Heading text: `"N total leads"` or `"Showing N of M leads"`.
    #[must_use]
    pub fn summary(&self) -> String {
        if self.showing() == self.total {
            format!("{} total leads", self.total)
        } else {
            format!("Showing {} of {} leads", self.showing(), self.total)
        }
    }
}
