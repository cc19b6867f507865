use super::*;
use std::collections::BTreeSet;

fn sample_criteria() -> FilterCriteria {
    let mut criteria = FilterCriteria {
        score_range: ScoreRange::new(70, 95),
        confidence: Confidence::High,
        company_size: CompanySize::Large,
        location: "New York".into(),
        last_updated: LastUpdated::Last7Days,
        keyword: "acme & sons".into(),
        ..FilterCriteria::default()
    };
    criteria.toggle_industry("Steel Manufacturing");
    criteria.toggle_industry("Logistics");
    criteria.toggle_status(LeadStatus::Qualified);
    criteria.toggle_status(LeadStatus::New);
    criteria
}

// =============================================================================
// Serialize
// =============================================================================

#[test]
fn default_criteria_serialize_to_empty_query() {
    assert_eq!(to_query_string(&FilterCriteria::default()), "");
    assert!(RemoteQuery::from_criteria(&FilterCriteria::default()).is_empty());
}

#[test]
fn only_non_default_fields_are_written() {
    let criteria = FilterCriteria { score_range: ScoreRange::new(0, 80), ..FilterCriteria::default() };
    assert_eq!(to_query_string(&criteria), "maxScore=80");
}

#[test]
fn sets_are_written_sorted() {
    let query = RemoteQuery::from_criteria(&sample_criteria());
    assert_eq!(query.get(PARAM_INDUSTRY), Some("Logistics,Steel Manufacturing"));
    assert_eq!(query.get(PARAM_STATUS), Some("New,Qualified"));
    assert_eq!(query.get(PARAM_LAST_UPDATED), Some("Last 7 days"));
    assert_eq!(query.get(PARAM_VIEW), None);
}

#[test]
fn criteria_round_trip_through_query() {
    let criteria = sample_criteria();
    assert_eq!(parse_query(&to_query_string(&criteria)), criteria);
}

#[test]
fn edge_list_values_round_trip_through_query() {
    let mut criteria = FilterCriteria::default();
    for industry in ["Acme, Inc", " Retail", "", "R&D + Labs", "100% Organic"] {
        criteria.toggle_industry(industry);
    }
    for status in ["archived", "On hold", "a,b", " "] {
        criteria.toggle_status(LeadStatus::Other(status.into()));
    }

    assert_eq!(
        criteria.industries,
        BTreeSet::from(["100% Organic".to_owned(), "R&D + Labs".to_owned(), "Retail".to_owned()])
    );
    assert_eq!(
        criteria.statuses,
        BTreeSet::from([LeadStatus::Other("Archived".into()), LeadStatus::Other("On hold".into())])
    );
    assert_eq!(parse_query(&to_query_string(&criteria)), criteria);
}

#[test]
fn normalized_criteria_round_trip_through_query() {
    let mut criteria = FilterCriteria {
        industries: BTreeSet::from(["Acme, Inc".to_owned(), " Retail".to_owned(), String::new()]),
        statuses: BTreeSet::from([LeadStatus::Other("closed".into()), LeadStatus::Other("x,y".into())]),
        ..sample_criteria()
    };
    criteria.normalize();
    assert_eq!(parse_query(&to_query_string(&criteria)), criteria);
}

// =============================================================================
// Parse
// =============================================================================

#[test]
fn parse_empty_query_gives_defaults() {
    assert_eq!(parse_query(""), FilterCriteria::default());
    assert_eq!(parse_query("?"), FilterCriteria::default());
}

#[test]
fn parse_accepts_leading_question_mark_and_normalizes_status() {
    let criteria = parse_query("?status=new,contacted&industry=Retail");
    assert_eq!(criteria.statuses, BTreeSet::from([LeadStatus::New, LeadStatus::Contacted]));
    assert_eq!(criteria.industries, BTreeSet::from(["Retail".to_owned()]));
}

#[test]
fn parse_invalid_values_fall_back_to_defaults() {
    let criteria = parse_query("minScore=abc&maxScore=&confidence=Extreme&companySize=Huge&lastUpdated=yesterday");
    assert_eq!(criteria, FilterCriteria::default());
}

#[test]
fn parse_clamps_and_orders_scores() {
    let criteria = parse_query("minScore=90&maxScore=40");
    assert_eq!(criteria.score_range, ScoreRange::new(40, 90));

    let criteria = parse_query("minScore=-5&maxScore=400");
    assert!(criteria.score_range.is_full());
}

#[test]
fn parse_ignores_unknown_and_empty_list_items() {
    let criteria = parse_query("view=abc&industry=,Retail,,&foo=bar");
    assert_eq!(criteria.industries, BTreeSet::from(["Retail".to_owned()]));
    assert_eq!(criteria.active_filter_count(), 1);
}

#[test]
fn parse_last_occurrence_wins() {
    let criteria = parse_query("search=one&search=two");
    assert_eq!(criteria.keyword, "two");
}

// =============================================================================
// Rewrite / directives
// =============================================================================

#[test]
fn rewrite_preserves_unowned_params() {
    let criteria = FilterCriteria { keyword: "steel".into(), ..FilterCriteria::default() };
    let query = rewrite_query("view=65c1&search=old&minScore=30", &criteria);
    assert_eq!(query, "view=65c1&search=steel");
}

#[test]
fn rewrite_with_default_criteria_drops_filter_params() {
    assert_eq!(rewrite_query("?industry=Retail", &FilterCriteria::default()), "");
}

#[test]
fn view_param_reads_directive() {
    assert_eq!(view_param("?search=x&view=65c1"), Some("65c1".to_owned()));
    assert_eq!(view_param("view="), None);
    assert_eq!(view_param("search=x"), None);
}

#[test]
fn strip_param_removes_only_that_param() {
    assert_eq!(strip_param("view=65c1&search=steel", PARAM_VIEW), "search=steel");
    assert_eq!(strip_param("view=65c1", PARAM_VIEW), "");
}
