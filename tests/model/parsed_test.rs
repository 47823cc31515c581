use plasma_query::model::{
    Intent, ParsedQuery, QuantityRange, QuantityType, Strategy, TemporalConstraint,
};

#[test]
fn test_empty_query() {
    let q = ParsedQuery::empty("hello");
    assert!(q.is_empty());
    assert_eq!(q.intent, Intent::Search);
    assert_eq!(q.confidence, 0.0);
    assert_eq!(q.original_query, "hello");
    assert_eq!(q.strategy, Strategy::Deterministic);
}

#[test]
fn test_add_keyword_dedupes() {
    let mut q = ParsedQuery::empty("");
    q.add_keyword("Tokamak");
    q.add_keyword("tokamak");
    q.add_keyword("  ");
    q.add_keyword("ITER");
    assert_eq!(q.keywords, vec!["Tokamak", "ITER"]);
    assert!(!q.is_empty());
}

#[test]
fn test_range_infinite_bound_is_dropped() {
    let r = QuantityRange::new(QuantityType::Temperature, Some(f64::INFINITY), Some(5.0), "keV")
        .unwrap();
    assert_eq!(r.min_value(), None);
    assert_eq!(r.max_value(), Some(5.0));
    assert!(!r.is_closed());
}

#[test]
fn test_json_shape() {
    let mut q = ParsedQuery::empty("temperature above 10 keV");
    q.add_range(QuantityRange::new(QuantityType::Temperature, Some(10.0), None, "keV").unwrap());
    q.temporal_constraint = Some(TemporalConstraint::Year(2021));
    q.set_confidence(0.5);

    let value = serde_json::to_value(&q).unwrap();
    assert_eq!(value["intent"], "search");
    assert_eq!(value["temporal_constraint"], "2021");
    assert_eq!(value["strategy"], "deterministic");
    let range = &value["parameters"]["temperature"];
    assert_eq!(range["type"], "temperature");
    assert_eq!(range["min_value"], 10.0);
    assert!(range["max_value"].is_null());
    assert_eq!(range["unit"], "keV");
    assert_eq!(range["normalized_min"], 10.0);
    assert!(value.get("raw_response").is_none());
}

#[test]
fn test_json_round_trip_recomputes_normalized() {
    let json = r#"{
        "intent": "statistics",
        "parameters": {
            "density": {"type": "density", "min_value": 1e13, "max_value": null, "unit": "cm^-3", "normalized_min": 42.0}
        },
        "keywords": ["stellarator"],
        "temporal_constraint": "recent",
        "confidence": 0.7,
        "original_query": "q"
    }"#;
    let q: ParsedQuery = serde_json::from_str(json).unwrap();
    assert_eq!(q.intent, Intent::Statistics);
    assert_eq!(q.temporal_constraint, Some(TemporalConstraint::Recent));
    assert_eq!(q.strategy, Strategy::Deterministic);
    let density = q.range(QuantityType::Density).unwrap();
    assert_eq!(density.normalized_min(), Some(1e19));
}

#[test]
fn test_json_rejects_boundless_range() {
    let json = r#"{
        "intent": "search",
        "parameters": {"density": {"type": "density", "unit": "m^-3"}},
        "keywords": [],
        "temporal_constraint": null,
        "confidence": 0.1,
        "original_query": "q"
    }"#;
    assert!(serde_json::from_str::<ParsedQuery>(json).is_err());
}

#[test]
fn test_json_rejects_bad_temporal() {
    let json = r#"{
        "intent": "search",
        "parameters": {},
        "keywords": [],
        "temporal_constraint": "yesterday",
        "confidence": 0.1,
        "original_query": "q"
    }"#;
    assert!(serde_json::from_str::<ParsedQuery>(json).is_err());
}

#[test]
fn test_intent_names() {
    assert_eq!(Intent::from_name("Stats"), Some(Intent::Statistics));
    assert_eq!(Intent::from_name("comparison"), Some(Intent::Compare));
    assert_eq!(Intent::from_name("summarize"), None);
    assert_eq!(Intent::Compare.name(), "compare");
}
