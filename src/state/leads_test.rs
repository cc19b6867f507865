use super::*;
use crate::state::filters::{FilterCriteria, ScoreRange};
use time::macros::datetime;

fn lead(id: &str, score: u8, status: LeadStatus) -> Lead {
    Lead::from_remote(RemoteLead {
        id: id.into(),
        company: format!("{id} Corp"),
        match_score: Some(f64::from(score)),
        status: Some(status.wire_value()),
        ..RemoteLead::default()
    })
}

const NOW: OffsetDateTime = datetime!(2026-03-10 12:00 UTC);

// =============================================================================
// Confidence / status
// =============================================================================

#[test]
fn confidence_tier_thresholds() {
    assert_eq!(ConfidenceTier::from_match_score(Some(86.0)), ConfidenceTier::High);
    assert_eq!(ConfidenceTier::from_match_score(Some(85.0)), ConfidenceTier::Medium);
    assert_eq!(ConfidenceTier::from_match_score(Some(71.0)), ConfidenceTier::Medium);
    assert_eq!(ConfidenceTier::from_match_score(Some(70.0)), ConfidenceTier::Low);
    assert_eq!(ConfidenceTier::from_match_score(None), ConfidenceTier::Low);
    assert_eq!(ConfidenceTier::from_match_score(Some(f64::NAN)), ConfidenceTier::Low);
    assert_eq!(ConfidenceTier::from_match_score(Some(100.0)).to_string(), "High");
}

#[test]
fn confidence_tier_uses_unrounded_score() {
    let high = Lead::from_remote(RemoteLead { id: "a".into(), match_score: Some(85.4), ..RemoteLead::default() });
    assert_eq!(high.score, 85);
    assert_eq!(high.confidence, ConfidenceTier::High);

    let medium = Lead::from_remote(RemoteLead { id: "b".into(), match_score: Some(70.4), ..RemoteLead::default() });
    assert_eq!(medium.score, 70);
    assert_eq!(medium.confidence, ConfidenceTier::Medium);

    let mut merged = lead("c", 10, LeadStatus::New);
    merged.merge_detail(RemoteLead { id: "c".into(), match_score: Some(85.2), ..RemoteLead::default() });
    assert_eq!(merged.score, 85);
    assert_eq!(merged.confidence, ConfidenceTier::High);
}

#[test]
fn title_case_normalizes() {
    assert_eq!(title_case("new"), "New");
    assert_eq!(title_case("QUALIFIED"), "Qualified");
    assert_eq!(title_case(""), "");
}

#[test]
fn status_parse_known_and_other() {
    assert_eq!(LeadStatus::parse(" contacted "), LeadStatus::Contacted);
    assert_eq!(LeadStatus::parse("CLOSED"), LeadStatus::Closed);
    assert_eq!(LeadStatus::parse("archived"), LeadStatus::Other("Archived".into()));
    assert_eq!(LeadStatus::Qualified.wire_value(), "qualified");
    assert_eq!(LeadStatus::Other("Archived".into()).wire_value(), "archived");
}

// =============================================================================
// from_remote / merge_detail
// =============================================================================

#[test]
fn from_remote_fills_defaults() {
    let lead = Lead::from_remote(RemoteLead { id: "a".into(), company: "Acme".into(), ..RemoteLead::default() });
    assert_eq!(lead.score, 0);
    assert_eq!(lead.confidence, ConfidenceTier::Low);
    assert_eq!(lead.status, LeadStatus::New);
    assert_eq!(lead.industry, DEFAULT_INDUSTRY);
    assert_eq!(lead.company_size, DEFAULT_COMPANY_SIZE);
    assert_eq!(lead.location, DEFAULT_LOCATION);
    assert_eq!(lead.reason, DEFAULT_REASON);
    assert!(lead.last_updated.is_none());
    assert!(lead.feedback.is_empty());
}

#[test]
fn from_remote_clamps_and_recomputes_tier() {
    let lead = Lead::from_remote(RemoteLead { id: "a".into(), match_score: Some(140.2), ..RemoteLead::default() });
    assert_eq!(lead.score, 100);
    assert_eq!(lead.confidence, ConfidenceTier::High);

    let lead = Lead::from_remote(RemoteLead { id: "b".into(), match_score: Some(-3.0), ..RemoteLead::default() });
    assert_eq!(lead.score, 0);
}

#[test]
fn from_remote_parses_timestamp_and_feedback() {
    let lead = Lead::from_remote(RemoteLead {
        id: "a".into(),
        last_updated: Some("2026-03-09T08:30:00Z".into()),
        feedback: Some(vec![serde_json::json!("Good fit"), serde_json::json!({"text": "Call back"}), serde_json::json!(3)]),
        ..RemoteLead::default()
    });
    assert_eq!(lead.last_updated, Some(datetime!(2026-03-09 08:30 UTC)));
    assert_eq!(lead.feedback, vec!["Good fit".to_owned(), "Call back".to_owned()]);
}

#[test]
fn merge_detail_overlays_present_fields_only() {
    let mut lead = lead("a", 60, LeadStatus::New);
    lead.location = "Berlin".into();

    lead.merge_detail(RemoteLead {
        id: "a".into(),
        match_score: Some(90.0),
        status: Some("qualified".into()),
        email: Some("ops@a.test".into()),
        feedback: Some(vec![serde_json::json!("Hot")]),
        ..RemoteLead::default()
    });

    assert_eq!(lead.name, "a Corp");
    assert_eq!(lead.location, "Berlin");
    assert_eq!(lead.score, 90);
    assert_eq!(lead.confidence, ConfidenceTier::High);
    assert_eq!(lead.status, LeadStatus::Qualified);
    assert_eq!(lead.email.as_deref(), Some("ops@a.test"));
    assert_eq!(lead.feedback, vec!["Hot".to_owned()]);
}

// =============================================================================
// Sorting / view
// =============================================================================

#[test]
fn sort_by_descending_score() {
    let mut leads = vec![lead("a", 40, LeadStatus::Contacted), lead("b", 95, LeadStatus::Contacted)];
    sort_for_display(&mut leads);
    let scores: Vec<u8> = leads.iter().map(|l| l.score).collect();
    assert_eq!(scores, vec![95, 40]);
}

#[test]
fn new_status_sorts_before_higher_score() {
    let mut leads = vec![lead("q", 99, LeadStatus::Qualified), lead("n", 10, LeadStatus::New)];
    sort_for_display(&mut leads);
    assert_eq!(leads[0].id, "n");
    assert_eq!(leads[1].id, "q");
}

#[test]
fn sort_is_stable_for_ties() {
    let mut leads = vec![
        lead("first", 50, LeadStatus::Closed),
        lead("second", 50, LeadStatus::Contacted),
    ];
    sort_for_display(&mut leads);
    assert_eq!(leads[0].id, "first");
}

#[test]
fn view_flags_top_three() {
    let cache: Vec<Lead> = [10, 80, 55, 95, 70]
        .iter()
        .enumerate()
        .map(|(i, s)| lead(&format!("l{i}"), *s, LeadStatus::Contacted))
        .collect();
    let view = LeadView::build(&cache, &FilterCriteria::default(), NOW);

    assert_eq!(view.top_ids, vec!["l3".to_owned(), "l1".to_owned(), "l4".to_owned()]);
    assert!(view.is_top("l1"));
    assert!(!view.is_top("l2"));
    assert_eq!(view.summary(), "5 total leads");
}

#[test]
fn view_with_fewer_than_three_leads_flags_all() {
    let cache = vec![lead("a", 10, LeadStatus::New), lead("b", 20, LeadStatus::New)];
    let view = LeadView::build(&cache, &FilterCriteria::default(), NOW);
    assert_eq!(view.top_ids.len(), 2);
}

#[test]
fn view_applies_filters_and_reports_summary() {
    let cache = vec![lead("a", 30, LeadStatus::New), lead("b", 90, LeadStatus::New), lead("c", 75, LeadStatus::New)];
    let criteria = FilterCriteria { score_range: ScoreRange::new(70, 100), ..FilterCriteria::default() };
    let view = LeadView::build(&cache, &criteria, NOW);

    assert_eq!(view.ids(), vec!["b".to_owned(), "c".to_owned()]);
    assert_eq!(view.total, 3);
    assert_eq!(view.summary(), "Showing 2 of 3 leads");
}

#[test]
fn empty_cache_gives_empty_view() {
    let view = LeadView::build(&[], &FilterCriteria::default(), NOW);
    assert!(view.leads.is_empty());
    assert!(view.top_ids.is_empty());
    assert_eq!(view.summary(), "0 total leads");
}
