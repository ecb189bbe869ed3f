use super::*;

const NOW: i64 = 1_700_000_000_000;

fn sample_draft() -> ReportDraft {
    ReportDraft {
        product_name: "Tomate (1kg)".to_owned(),
        price: 150,
        category: Category::Food,
        city: "Alger".to_owned(),
        commune: None,
        latitude: 36.75,
        longitude: 3.06,
        reporter_id: "user-1".to_owned(),
        reporter_name: Some("Ahmed B.".to_owned()),
        timestamp: 0,
        is_abnormal: false,
    }
}

#[test]
fn category_parse_is_case_insensitive_and_lossy_defaults_to_food() {
    assert_eq!(Category::parse("Fuel"), Some(Category::Fuel));
    assert_eq!(Category::parse(" services "), Some(Category::Services));
    assert_eq!(Category::parse("toys"), None);
    assert_eq!(Category::parse_lossy("toys"), Category::Food);
}

#[test]
fn category_all_round_trips_through_as_str() {
    for category in Category::ALL {
        assert_eq!(Category::parse(category.as_str()), Some(category));
    }
}

#[test]
fn parse_report_normalizes_optional_fields() {
    let value = serde_json::json!({
        "id": "r1",
        "productName": "Lait (1L)",
        "price": 25.4,
        "category": "beverages",
        "city": "Oran",
        "commune": "",
        "latitude": 35.69,
        "longitude": -0.63,
        "reporterId": 17,
        "reporterName": null,
        "timestamp": "2024-01-01T00:00:00Z",
        "upvotes": 3
    });
    let report = parse_report(&value, NOW).expect("report");
    assert_eq!(report.id, "r1");
    assert_eq!(report.price, 25);
    assert_eq!(report.category, Category::Beverages);
    assert_eq!(report.commune, None);
    assert_eq!(report.reporter_id, "17");
    assert_eq!(report.reporter_name, None);
    assert_eq!(report.timestamp, 1_704_067_200_000);
    assert_eq!(report.upvotes, 3);
    assert_eq!(report.downvotes, 0);
    assert!(!report.is_abnormal);
    assert_eq!(report.origin, Origin::Confirmed);
}

#[test]
fn parse_report_requires_coordinates() {
    let value = serde_json::json!({"id": "r1", "productName": "Pain", "price": 10, "latitude": 36.0});
    let err = parse_report(&value, NOW).expect_err("longitude missing");
    assert!(matches!(err, WireError::MissingField("longitude")));
}

#[test]
fn parse_report_list_skips_malformed_rows() {
    let body = serde_json::json!({
        "reports": [
            {"id": "a", "productName": "Pain", "price": 10, "latitude": 36.0, "longitude": 3.0},
            {"id": "b", "productName": "Pain"},
            {"id": "c", "productName": "Huile (5L)", "price": 650, "latitude": 35.0, "longitude": 1.0, "category": "unknown"}
        ]
    });
    let reports = parse_report_list(&body, NOW);
    assert_eq!(reports.len(), 2);
    assert_eq!(reports[0].id, "a");
    assert_eq!(reports[0].timestamp, NOW);
    assert_eq!(reports[1].category, Category::Food);
}

#[test]
fn parse_report_list_accepts_bare_array_and_missing_key() {
    let body = serde_json::json!([{"id": "a", "productName": "Pain", "price": 10, "latitude": 36.0, "longitude": 3.0}]);
    assert_eq!(parse_report_list(&body, NOW).len(), 1);
    assert!(parse_report_list(&serde_json::json!({}), NOW).is_empty());
}

#[test]
fn encode_draft_uses_camel_case_and_omits_absent_optionals() {
    let body = encode_draft(&sample_draft());
    assert_eq!(body["productName"], "Tomate (1kg)");
    assert_eq!(body["category"], "food");
    assert_eq!(body["reporterName"], "Ahmed B.");
    assert_eq!(body["timestamp"], "1970-01-01T00:00:00Z");
    assert_eq!(body["isAbnormal"], false);
    assert!(body.get("commune").is_none());
}

#[test]
fn from_draft_zeroes_counters() {
    let report = PriceReport::from_draft(sample_draft(), "price-1".to_owned(), Origin::Local);
    assert_eq!(report.upvotes, 0);
    assert_eq!(report.downvotes, 0);
    assert_eq!(report.origin, Origin::Local);
    assert_eq!(report.city, "Alger");
}

#[test]
fn vote_body_and_counts() {
    assert_eq!(vote_body(VoteDirection::Down), serde_json::json!({"voteType": "down"}));
    let counts = parse_vote_counts(&serde_json::json!({"upvotes": 5, "downvotes": 1})).expect("counts");
    assert_eq!(counts, VoteCounts { upvotes: 5, downvotes: 1 });
    assert!(parse_vote_counts(&serde_json::json!({"upvotes": 5})).is_err());
}

#[test]
fn vote_direction_parse() {
    assert_eq!(VoteDirection::parse("UP"), Some(VoteDirection::Up));
    assert_eq!(VoteDirection::parse("sideways"), None);
}
