//! Filter criteria <-> URL query string.
//!
//! DESIGN
//! ======
//! Only fields that differ from their default are written, so an unfiltered
//! inbox has an empty query and any written query parses back to an equal
//! `FilterCriteria` once its sets are in `list_value` form. Sets are written
//! comma-joined in sorted order so the output is deterministic. The same
//! parameter mapping is sent to the backend as the list query.
//!
//! Parameters this module does not own (e.g. the one-shot `view` directive)
//! are preserved when the query is rewritten.

#[cfg(test)]
#[path = "query_test.rs"]
mod tests;

use url::form_urlencoded;

use super::filters::{
    CompanySize, Confidence, FilterCriteria, LastUpdated, SCORE_MAX, SCORE_MIN, ScoreRange, list_value,
};
use super::leads::LeadStatus;

pub const PARAM_INDUSTRY: &str = "industry";
pub const PARAM_STATUS: &str = "status";
pub const PARAM_MIN_SCORE: &str = "minScore";
pub const PARAM_MAX_SCORE: &str = "maxScore";
pub const PARAM_SEARCH: &str = "search";
pub const PARAM_CONFIDENCE: &str = "confidence";
pub const PARAM_COMPANY_SIZE: &str = "companySize";
pub const PARAM_LOCATION: &str = "location";
pub const PARAM_LAST_UPDATED: &str = "lastUpdated";
pub const PARAM_VIEW: &str = "view";

/// Parameters owned by the filter criteria, in the order they are written.
pub const FILTER_PARAMS: [&str; 9] = [
    PARAM_INDUSTRY,
    PARAM_STATUS,
    PARAM_MIN_SCORE,
    PARAM_MAX_SCORE,
    PARAM_SEARCH,
    PARAM_CONFIDENCE,
    PARAM_COMPANY_SIZE,
    PARAM_LOCATION,
    PARAM_LAST_UPDATED,
];

// =============================================================================
// SERIALIZE
// =============================================================================

/// Query parameters for the non-default fields of a criteria value.
///
/// Used both for the shareable URL and for `GET /api/leads`.
#[derive(Clone, Debug, Default, PartialEq, Eq)]
pub struct RemoteQuery {
    pairs: Vec<(&'static str, String)>,
}

impl RemoteQuery {
    #[must_use]
    pub fn from_criteria(criteria: &FilterCriteria) -> Self {
        let mut pairs = Vec::new();
        if !criteria.industries.is_empty() {
            pairs.push((PARAM_INDUSTRY, join(criteria.industries.iter().map(String::as_str))));
        }
        if !criteria.statuses.is_empty() {
            pairs.push((PARAM_STATUS, join(criteria.statuses.iter().map(LeadStatus::label))));
        }
        if criteria.score_range.min() != SCORE_MIN {
            pairs.push((PARAM_MIN_SCORE, criteria.score_range.min().to_string()));
        }
        if criteria.score_range.max() != SCORE_MAX {
            pairs.push((PARAM_MAX_SCORE, criteria.score_range.max().to_string()));
        }
        if !criteria.keyword.is_empty() {
            pairs.push((PARAM_SEARCH, criteria.keyword.clone()));
        }
        if criteria.confidence != Confidence::All {
            pairs.push((PARAM_CONFIDENCE, criteria.confidence.label().to_owned()));
        }
        if criteria.company_size != CompanySize::All {
            pairs.push((PARAM_COMPANY_SIZE, criteria.company_size.label().to_owned()));
        }
        if !criteria.location.is_empty() {
            pairs.push((PARAM_LOCATION, criteria.location.clone()));
        }
        if criteria.last_updated != LastUpdated::All {
            pairs.push((PARAM_LAST_UPDATED, criteria.last_updated.label().to_owned()));
        }
        Self { pairs }
    }

    #[must_use]
    pub fn pairs(&self) -> &[(&'static str, String)] {
        &self.pairs
    }

    #[must_use]
    pub fn is_empty(&self) -> bool {
        self.pairs.is_empty()
    }

    #[must_use]
    pub fn get(&self, key: &str) -> Option<&str> {
        self.pairs
            .iter()
            .find(|(k, _)| *k == key)
            .map(|(_, v)| v.as_str())
    }

    /// Form-encoded query string without a leading `?`.
    #[must_use]
    pub fn to_query_string(&self) -> String {
        form_urlencoded::Serializer::new(String::new())
            .extend_pairs(self.pairs.iter())
            .finish()
    }
}

fn join<'a>(items: impl Iterator<Item = &'a str>) -> String {
    items.collect::<Vec<_>>().join(",")
}

/// Serialize criteria to a query string (empty for default criteria).
#[must_use]
pub fn to_query_string(criteria: &FilterCriteria) -> String {
    RemoteQuery::from_criteria(criteria).to_query_string()
}

// =============================================================================
// PARSE
// =============================================================================

fn decode(query: &str) -> Vec<(String, String)> {
    let query = query.strip_prefix('?').unwrap_or(query);
    form_urlencoded::parse(query.as_bytes())
        .map(|(k, v)| (k.into_owned(), v.into_owned()))
        .collect()
}

fn split_list(raw: &str) -> impl Iterator<Item = &str> {
    raw.split(',').filter_map(list_value)
}

/// Build criteria from a query string, with defaults for absent or invalid values.
///
/// A leading `?` is accepted. Unknown parameters are ignored; for repeated
/// parameters the last occurrence wins.
#[must_use]
pub fn parse_query(query: &str) -> FilterCriteria {
    let mut criteria = FilterCriteria::default();
    let mut min_score = i64::from(SCORE_MIN);
    let mut max_score = i64::from(SCORE_MAX);

    for (key, value) in decode(query) {
        match key.as_str() {
            PARAM_INDUSTRY => criteria.industries = split_list(&value).map(str::to_owned).collect(),
            PARAM_STATUS => criteria.statuses = split_list(&value).map(LeadStatus::parse).collect(),
            PARAM_MIN_SCORE => min_score = value.trim().parse().unwrap_or(i64::from(SCORE_MIN)),
            PARAM_MAX_SCORE => max_score = value.trim().parse().unwrap_or(i64::from(SCORE_MAX)),
            PARAM_SEARCH => criteria.keyword = value,
            PARAM_CONFIDENCE => criteria.confidence = value.parse().unwrap_or_default(),
            PARAM_COMPANY_SIZE => criteria.company_size = value.parse().unwrap_or_default(),
            PARAM_LOCATION => criteria.location = value,
            PARAM_LAST_UPDATED => criteria.last_updated = value.parse().unwrap_or_default(),
            _ => {}
        }
    }

    criteria.score_range = ScoreRange::new(min_score, max_score);
    criteria
}

// =============================================================================
// REWRITE
// =============================================================================

/// Replace the filter parameters in `current` with those of `criteria`.
///
/// Parameters the criteria do not own keep their position and value.
#[must_use]
pub fn rewrite_query(current: &str, criteria: &FilterCriteria) -> String {
    let kept = decode(current)
        .into_iter()
        .filter(|(k, _)| !FILTER_PARAMS.contains(&k.as_str()));
    let filters = RemoteQuery::from_criteria(criteria);

    let mut out = form_urlencoded::Serializer::new(String::new());
    out.extend_pairs(kept);
    out.extend_pairs(filters.pairs().iter());
    out.finish()
}

/// Value of the one-shot `view=<leadId>` directive, if present and non-empty.
#[must_use]
pub fn view_param(query: &str) -> Option<String> {
    decode(query)
        .into_iter()
        .rev()
        .find(|(k, v)| k == PARAM_VIEW && !v.is_empty())
        .map(|(_, v)| v)
}

/// Remove every occurrence of `param`, re-encoding the rest in order.
#[must_use]
pub fn strip_param(query: &str, param: &str) -> String {
    let mut out = form_urlencoded::Serializer::new(String::new());
    out.extend_pairs(decode(query).into_iter().filter(|(k, _)| k != param));
    out.finish()
}
