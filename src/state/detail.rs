//! State of the lead detail panel.

#[cfg(test)]
#[path = "detail_test.rs"]
mod tests;

use super::leads::{Lead, LeadStatus};
use crate::net::types::RemoteLead;

/// The open detail view: a lead that starts as the cached partial record and
/// is filled in when the detail request lands.
#[derive(Clone, Debug, PartialEq)]
pub struct DetailView {
    pub lead: Lead,
    /// A detail request is in flight.
    pub loading: bool,
    /// Feedback was accepted for this lead during the current opening.
    pub feedback_submitted: bool,
}

impl DetailView {
    #[must_use]
    pub fn open(lead: Lead) -> Self {
        Self { lead, loading: false, feedback_submitted: false }
    }

    #[must_use]
    pub fn id(&self) -> &str {
        &self.lead.id
    }

    pub fn begin_load(&mut self) {
        self.loading = true;
    }

    /// Merge a detail response and clear the loading flag.
    pub fn apply(&mut self, detail: RemoteLead) {
        self.lead.merge_detail(detail);
        self.loading = false;
    }

    /// Keep the partial data; only the loading flag changes.
    pub fn fail(&mut self) {
        self.loading = false;
    }

    pub fn set_status(&mut self, status: LeadStatus) {
        self.lead.status = status;
    }
}
