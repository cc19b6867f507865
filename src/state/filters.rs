//! Filter criteria for the lead inbox.
//!
//! DESIGN
//! ======
//! One `FilterCriteria` value per session. Every field has a neutral default
//! ("no constraint"); a field counts as active exactly when it differs from
//! that default, which drives both the active-filter badge and which query
//! parameters get written to the URL.
//!
//! The score range is its own type so the `min <= max`, `0..=100` invariant
//! cannot be broken through field access.

#[cfg(test)]
#[path = "filters_test.rs"]
mod tests;

use std::collections::BTreeSet;
use std::fmt;
use std::str::FromStr;

use time::OffsetDateTime;

use super::leads::{ConfidenceTier, Lead, LeadStatus};

pub const SCORE_MIN: u8 = 0;
pub const SCORE_MAX: u8 = 100;

const SECONDS_PER_DAY: f64 = 86_400.0;

// =============================================================================
// SCORE RANGE
// =============================================================================

/// Inclusive score bounds with `SCORE_MIN <= min <= max <= SCORE_MAX`.
#[derive(Clone, Copy, Debug, PartialEq, Eq)]
pub struct ScoreRange {
    min: u8,
    max: u8,
}

impl Default for ScoreRange {
    fn default() -> Self {
        Self { min: SCORE_MIN, max: SCORE_MAX }
    }
}

impl ScoreRange {
    /// Clamp both bounds into range; reversed bounds are swapped.
    #[must_use]
    pub fn new(min: i64, max: i64) -> Self {
        let a = clamp_bound(min);
        let b = clamp_bound(max);
        Self { min: a.min(b), max: a.max(b) }
    }

    #[must_use]
    pub fn min(self) -> u8 {
        self.min
    }

    #[must_use]
    pub fn max(self) -> u8 {
        self.max
    }

    /// Move the lower bound; if it crosses `max`, `max` follows.
    #[must_use]
    pub fn with_min(self, value: i64) -> Self {
        let min = clamp_bound(value);
        Self { min, max: self.max.max(min) }
    }

    /// Move the upper bound; if it crosses `min`, `min` follows.
    #[must_use]
    pub fn with_max(self, value: i64) -> Self {
        let max = clamp_bound(value);
        Self { min: self.min.min(max), max }
    }

    #[must_use]
    pub fn contains(self, score: u8) -> bool {
        (self.min..=self.max).contains(&score)
    }

    #[must_use]
    pub fn is_full(self) -> bool {
        self == Self::default()
    }
}

#[allow(clippy::cast_possible_truncation, clippy::cast_sign_loss)]
fn clamp_bound(value: i64) -> u8 {
    value.clamp(i64::from(SCORE_MIN), i64::from(SCORE_MAX)) as u8
}

// =============================================================================
// ENUMERATED FILTERS
// =============================================================================

/// Returned by `FromStr` for enumerated filter values.
#[derive(Debug, Clone, PartialEq, Eq, thiserror::Error)]
#[error("unknown {field} value: {value}")]
pub struct UnknownValue {
    pub field: &'static str,
    pub value: String,
}

macro_rules! labelled_enum {
    ($name:ident, $field:literal, { $($variant:ident => $label:literal),+ $(,)? }) => {
        impl $name {
            pub const ALL: &'static [$name] = &[$($name::$variant),+];

            #[must_use]
            pub fn label(self) -> &'static str {
                match self {
                    $($name::$variant => $label),+
                }
            }
        }

        impl fmt::Display for $name {
            fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
                f.write_str(self.label())
            }
        }

        impl FromStr for $name {
            type Err = UnknownValue;

            fn from_str(s: &str) -> Result<Self, Self::Err> {
                let trimmed = s.trim();
                Self::ALL
                    .iter()
                    .copied()
                    .find(|v| v.label().eq_ignore_ascii_case(trimmed))
                    .ok_or_else(|| UnknownValue { field: $field, value: s.to_owned() })
            }
        }

        impl serde::Serialize for $name {
            fn serialize<S: serde::Serializer>(&self, serializer: S) -> Result<S::Ok, S::Error> {
                serializer.serialize_str(self.label())
            }
        }

        impl<'de> serde::Deserialize<'de> for $name {
            fn deserialize<D: serde::Deserializer<'de>>(deserializer: D) -> Result<Self, D::Error> {
                let raw = <String as serde::Deserialize>::deserialize(deserializer)?;
                raw.parse().map_err(serde::de::Error::custom)
            }
        }
    };
}

#[derive(Clone, Copy, Debug, Default, PartialEq, Eq)]
pub enum Confidence {
    #[default]
    All,
    High,
    Medium,
    Low,
}

labelled_enum!(Confidence, "confidence", { All => "All", High => "High", Medium => "Medium", Low => "Low" });

impl Confidence {
    #[must_use]
    pub fn matches(self, tier: ConfidenceTier) -> bool {
        match self {
            Self::All => true,
            Self::High => tier == ConfidenceTier::High,
            Self::Medium => tier == ConfidenceTier::Medium,
            Self::Low => tier == ConfidenceTier::Low,
        }
    }
}

#[derive(Clone, Copy, Debug, Default, PartialEq, Eq)]
pub enum CompanySize {
    #[default]
    All,
    Small,
    Medium,
    Large,
}

labelled_enum!(CompanySize, "companySize", { All => "All", Small => "Small", Medium => "Medium", Large => "Large" });

impl CompanySize {
    #[must_use]
    pub fn matches(self, size: &str) -> bool {
        self == Self::All || self.label() == size
    }
}

#[derive(Clone, Copy, Debug, Default, PartialEq, Eq)]
pub enum LastUpdated {
    #[default]
    All,
    Today,
    Last7Days,
    Last30Days,
}

labelled_enum!(LastUpdated, "lastUpdated", {
    All => "All",
    Today => "Today",
    Last7Days => "Last 7 days",
    Last30Days => "Last 30 days",
});

impl LastUpdated {
    /// Elapsed days between `updated` and `now`, floored, decide the match.
    ///
    /// Flooring puts a timestamp up to a day in the future at day `-1`, so it
    /// fails `Today`. A lead without a timestamp only passes the `All` window.
    #[must_use]
    pub fn matches(self, updated: Option<OffsetDateTime>, now: OffsetDateTime) -> bool {
        if self == Self::All {
            return true;
        }
        let Some(updated) = updated else {
            return false;
        };
        #[allow(clippy::cast_possible_truncation)]
        let days = ((now - updated).as_seconds_f64() / SECONDS_PER_DAY).floor() as i64;
        match self {
            Self::All => true,
            Self::Today => days == 0,
            Self::Last7Days => days <= 7,
            Self::Last30Days => days <= 30,
        }
    }
}

// =============================================================================
// CRITERIA
// =============================================================================

/// Identifies one criteria field, for per-field reset and badge counting.
#[derive(Clone, Copy, Debug, PartialEq, Eq, Hash)]
pub enum FilterField {
    Industries,
    ScoreRange,
    Confidence,
    Statuses,
    CompanySize,
    Location,
    LastUpdated,
    Keyword,
}

impl FilterField {
    pub const ALL: [FilterField; 8] = [
        Self::Industries,
        Self::ScoreRange,
        Self::Confidence,
        Self::Statuses,
        Self::CompanySize,
        Self::Location,
        Self::LastUpdated,
        Self::Keyword,
    ];
}

/// Normalized form of one industry or status value: trimmed, non-empty and
/// comma-free.
///
/// Sets are written comma-joined to the query string, so a value that fails
/// this check could not be read back and is refused.
#[must_use]
pub fn list_value(raw: &str) -> Option<&str> {
    let trimmed = raw.trim();
    (!trimmed.is_empty() && !trimmed.contains(',')).then_some(trimmed)
}

/// The user's current constraints on the inbox.
///
/// Set members are kept in `list_value` form; `normalize` restores that after
/// the sets are edited directly.
#[derive(Clone, Debug, Default, PartialEq, Eq)]
pub struct FilterCriteria {
    /// Empty means any industry.
    pub industries: BTreeSet<String>,
    pub score_range: ScoreRange,
    pub confidence: Confidence,
    /// Empty means any status.
    pub statuses: BTreeSet<LeadStatus>,
    pub company_size: CompanySize,
    /// Case-insensitive substring of the lead location.
    pub location: String,
    pub last_updated: LastUpdated,
    /// Case-insensitive substring of company name or industry.
    pub keyword: String,
}

impl FilterCriteria {
    #[must_use]
    pub fn is_default(&self) -> bool {
        self.active_fields().is_empty()
    }

    #[must_use]
    pub fn is_active(&self, field: FilterField) -> bool {
        match field {
            FilterField::Industries => !self.industries.is_empty(),
            FilterField::ScoreRange => !self.score_range.is_full(),
            FilterField::Confidence => self.confidence != Confidence::All,
            FilterField::Statuses => !self.statuses.is_empty(),
            FilterField::CompanySize => self.company_size != CompanySize::All,
            FilterField::Location => !self.location.is_empty(),
            FilterField::LastUpdated => self.last_updated != LastUpdated::All,
            FilterField::Keyword => !self.keyword.is_empty(),
        }
    }

    #[must_use]
    pub fn active_fields(&self) -> Vec<FilterField> {
        FilterField::ALL
            .into_iter()
            .filter(|f| self.is_active(*f))
            .collect()
    }

    /// Number of fields that differ from their default.
    #[must_use]
    pub fn active_filter_count(&self) -> usize {
        self.active_fields().len()
    }

    /// Reset one field to its default.
    pub fn clear_field(&mut self, field: FilterField) {
        match field {
            FilterField::Industries => self.industries.clear(),
            FilterField::ScoreRange => self.score_range = ScoreRange::default(),
            FilterField::Confidence => self.confidence = Confidence::All,
            FilterField::Statuses => self.statuses.clear(),
            FilterField::CompanySize => self.company_size = CompanySize::All,
            FilterField::Location => self.location.clear(),
            FilterField::LastUpdated => self.last_updated = LastUpdated::All,
            FilterField::Keyword => self.keyword.clear(),
        }
    }

    /// Add the industry if absent, remove it if present.
    ///
    /// The value is trimmed first; empty or comma-bearing values are ignored.
    pub fn toggle_industry(&mut self, industry: &str) {
        let Some(industry) = list_value(industry) else {
            return;
        };
        if !self.industries.remove(industry) {
            self.industries.insert(industry.to_owned());
        }
    }

    /// Add the status if absent, remove it if present.
    ///
    /// `Other` labels are re-parsed so they compare equal to what the query
    /// string reads back; empty or comma-bearing labels are ignored.
    pub fn toggle_status(&mut self, status: LeadStatus) {
        let Some(status) = list_value(status.label()).map(LeadStatus::parse) else {
            return;
        };
        if !self.statuses.remove(&status) {
            self.statuses.insert(status);
        }
    }

    /// Bring directly edited sets back to `list_value` form, dropping values
    /// that cannot be represented.
    pub fn normalize(&mut self) {
        let industries = std::mem::take(&mut self.industries);
        self.industries = industries
            .iter()
            .filter_map(|industry| list_value(industry))
            .map(str::to_owned)
            .collect();
        let statuses = std::mem::take(&mut self.statuses);
        self.statuses = statuses
            .iter()
            .filter_map(|status| list_value(status.label()))
            .map(LeadStatus::parse)
            .collect();
    }

    /// Whether `lead` passes every active constraint.
    #[must_use]
    pub fn matches(&self, lead: &Lead, now: OffsetDateTime) -> bool {
        (self.industries.is_empty() || self.industries.contains(&lead.industry))
            && self.score_range.contains(lead.score)
            && self.confidence.matches(lead.confidence)
            && (self.statuses.is_empty() || self.statuses.contains(&lead.status))
            && self.company_size.matches(&lead.company_size)
            && contains_ignore_case(&lead.location, &self.location)
            && (contains_ignore_case(&lead.name, &self.keyword) || contains_ignore_case(&lead.industry, &self.keyword))
            && self.last_updated.matches(lead.last_updated, now)
    }
}

fn contains_ignore_case(haystack: &str, needle: &str) -> bool {
    needle.is_empty() || haystack.to_lowercase().contains(&needle.to_lowercase())
}

// =============================================================================
// SAVED FILTERS
// =============================================================================

/// A named, immutable criteria snapshot. Applying one overwrites the live criteria.
#[derive(Clone, Debug, PartialEq, Eq)]
pub struct SavedFilter {
    pub id: u32,
    pub name: String,
    pub criteria: FilterCriteria,
}

/// The fixed quick-filter list shown above the filter panel.
#[must_use]
pub fn builtin_saved_filters() -> Vec<SavedFilter> {
    let manufacturing = FilterCriteria {
        industries: BTreeSet::from(["Steel Manufacturing".to_owned()]),
        score_range: ScoreRange::new(85, 100),
        confidence: Confidence::High,
        statuses: BTreeSet::from([LeadStatus::New]),
        ..FilterCriteria::default()
    };
    let new_high_priority = FilterCriteria {
        score_range: ScoreRange::new(80, 100),
        confidence: Confidence::High,
        statuses: BTreeSet::from([LeadStatus::New]),
        last_updated: LastUpdated::Today,
        ..FilterCriteria::default()
    };
    vec![
        SavedFilter { id: 1, name: "High Score – Manufacturing".to_owned(), criteria: manufacturing },
        SavedFilter { id: 2, name: "New High Priority".to_owned(), criteria: new_high_priority },
    ]
}
