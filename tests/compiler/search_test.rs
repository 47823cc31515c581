use insta::assert_snapshot;
use plasma_query::compiler::{compile, compile_with, MissingDatePolicy, QueryKind, ResultOrder};
use plasma_query::model::{Intent, ParsedQuery, QuantityRange, QuantityType, TemporalConstraint};
use plasma_query::parser::PatternExtractor;

#[path = "../common/mod.rs"]
mod common;

use common::{fixed_options, validate_sparql};

fn with_range(
    quantity: QuantityType,
    min: Option<f64>,
    max: Option<f64>,
    unit: &str,
) -> ParsedQuery {
    let mut parsed = ParsedQuery::empty("");
    parsed.add_range(QuantityRange::new(quantity, min, max, unit).unwrap());
    parsed
}

// ----------------------------------------------------------------------------
// Snapshots
// ----------------------------------------------------------------------------

#[test]
fn test_empty_query() {
    let sparql = compile(&ParsedQuery::empty(""), 20);
    validate_sparql(&sparql).unwrap();
    assert_snapshot!(sparql, @r###"
    PREFIX : <http://example.org/plasma#>
    PREFIX paper: <http://example.org/plasma/paper/>
    PREFIX xsd: <http://www.w3.org/2001/XMLSchema#>

    SELECT DISTINCT ?paper ?title ?authors ?publicationDate
    WHERE {
      ?paper a :Paper ;
        :title ?title .
      OPTIONAL { ?paper :authors ?authors . }
      OPTIONAL { ?paper :publicationDate ?publicationDate . }
    }
    ORDER BY ?title
    LIMIT 20
    "###);
}

#[test]
fn test_temperature_lower_bound() {
    let parsed = with_range(QuantityType::Temperature, Some(10.0), None, "keV");
    let sparql = compile_with(&parsed, &fixed_options()).sparql;
    validate_sparql(&sparql).unwrap();
    assert_snapshot!(sparql, @r###"
    PREFIX : <http://example.org/plasma#>
    PREFIX paper: <http://example.org/plasma/paper/>
    PREFIX xsd: <http://www.w3.org/2001/XMLSchema#>

    SELECT DISTINCT ?paper ?title ?authors ?publicationDate ?tempValue ?tempUnit ?tempNormalized
    WHERE {
      ?paper a :Paper ;
        :title ?title .
      OPTIONAL { ?paper :authors ?authors . }
      OPTIONAL { ?paper :publicationDate ?publicationDate . }
      ?paper :reports ?tempMeas .
      ?tempMeas :measuresParameter ?temp .
      ?temp a :Temperature ;
        :value ?tempValue ;
        :unitString ?tempUnit ;
        :normalizedValue ?tempNormalized .
      FILTER(?tempNormalized >= 10.0)
    }
    ORDER BY ?title
    LIMIT 20
    "###);
}

#[test]
fn test_keywords_and_year() {
    let parsed = PatternExtractor::new().extract("tokamak results published in 2021");
    let sparql = compile_with(&parsed, &fixed_options()).sparql;
    validate_sparql(&sparql).unwrap();
    assert_snapshot!(sparql, @r###"
    PREFIX : <http://example.org/plasma#>
    PREFIX paper: <http://example.org/plasma/paper/>
    PREFIX xsd: <http://www.w3.org/2001/XMLSchema#>

    SELECT DISTINCT ?paper ?title ?authors ?publicationDate
    WHERE {
      ?paper a :Paper ;
        :title ?title .
      OPTIONAL { ?paper :authors ?authors . }
      OPTIONAL { ?paper :publicationDate ?publicationDate . }
      FILTER(STRSTARTS(STR(?publicationDate), "2021"))
      OPTIONAL { ?paper :abstract ?abstract . }
      FILTER(REGEX(?title, "tokamak", "i") || REGEX(COALESCE(?abstract, ""), "tokamak", "i"))
    }
    ORDER BY DESC(?publicationDate) ?title
    LIMIT 20
    "###);
}

// ----------------------------------------------------------------------------
// Filters
// ----------------------------------------------------------------------------

#[test]
fn test_density_range_uses_normalized_values() {
    let parsed = with_range(QuantityType::Density, Some(1e13), Some(1e14), "cm^-3");
    let sparql = compile_with(&parsed, &fixed_options()).sparql;
    validate_sparql(&sparql).unwrap();
    assert!(sparql.contains("?dens a :Density ;"));
    assert!(sparql.contains("FILTER(?densNormalized >= 1e19 && ?densNormalized <= 1e20)"));
    assert!(sparql.contains("?densValue ?densUnit ?densNormalized"));
}

#[test]
fn test_upper_bound_only() {
    let parsed = with_range(QuantityType::Temperature, None, Some(0.5), "MeV");
    let sparql = compile_with(&parsed, &fixed_options()).sparql;
    assert!(sparql.contains("FILTER(?tempNormalized <= 500.0)"));
    assert!(!sparql.contains(">="));
}

#[test]
fn test_two_quantities_are_joined() {
    let mut parsed = with_range(QuantityType::Temperature, Some(5.0), None, "keV");
    parsed.add_range(
        QuantityRange::new(QuantityType::Density, Some(1e19), None, "m^-3").unwrap(),
    );
    let sparql = compile_with(&parsed, &fixed_options()).sparql;
    validate_sparql(&sparql).unwrap();
    assert!(sparql.contains("?paper :reports ?tempMeas ."));
    assert!(sparql.contains("?paper :reports ?densMeas ."));
    assert!(sparql.contains("FILTER(?tempNormalized >= 5.0)"));
    assert!(sparql.contains("FILTER(?densNormalized >= 1e19)"));
}

#[test]
fn test_recent_uses_reference_date() {
    let mut parsed = ParsedQuery::empty("");
    parsed.temporal_constraint = Some(TemporalConstraint::Recent);
    let sparql = compile_with(&parsed, &fixed_options()).sparql;
    validate_sparql(&sparql).unwrap();
    assert!(sparql.contains("FILTER(STR(?publicationDate) >= \"2022-06-02\")"));
    assert!(sparql.contains("ORDER BY DESC(?publicationDate) ?title"));
}

#[test]
fn test_recent_window_is_configurable() {
    let mut parsed = ParsedQuery::empty("");
    parsed.temporal_constraint = Some(TemporalConstraint::Recent);
    let options = fixed_options().with_recent_days(30);
    let sparql = compile_with(&parsed, &options).sparql;
    assert!(sparql.contains("\"2024-05-02\""));
}

#[test]
fn test_missing_dates_can_be_included() {
    let mut parsed = ParsedQuery::empty("");
    parsed.temporal_constraint = Some(TemporalConstraint::Year(2020));
    let options = fixed_options().with_missing_dates(MissingDatePolicy::Include);
    let sparql = compile_with(&parsed, &options).sparql;
    validate_sparql(&sparql).unwrap();
    assert!(sparql.contains(
        "FILTER(!BOUND(?publicationDate) || STRSTARTS(STR(?publicationDate), \"2020\"))"
    ));
}

#[test]
fn test_keywords_are_escaped() {
    let mut parsed = ParsedQuery::empty("");
    parsed.add_keyword("d-t");
    parsed.add_keyword("quote\"mark");
    let sparql = compile_with(&parsed, &fixed_options()).sparql;
    validate_sparql(&sparql).unwrap();
    assert!(sparql.contains(r#"REGEX(?title, "d\\-t|quote\"mark", "i")"#));
}

#[test]
fn test_title_only_keyword_matching() {
    let mut parsed = ParsedQuery::empty("");
    parsed.add_keyword("stellarator");
    let options = fixed_options().with_match_abstract(false);
    let sparql = compile_with(&parsed, &options).sparql;
    validate_sparql(&sparql).unwrap();
    assert!(!sparql.contains("?abstract"));
    assert!(sparql.contains("FILTER(REGEX(?title, \"stellarator\", \"i\"))"));
}

// ----------------------------------------------------------------------------
// Shape
// ----------------------------------------------------------------------------

#[test]
fn test_limit() {
    let parsed = ParsedQuery::empty("");
    assert!(compile(&parsed, 5).ends_with("LIMIT 5"));
    assert!(compile(&parsed, 0).ends_with("LIMIT 1"));
}

#[test]
fn test_newest_first_order() {
    let options = fixed_options().with_order(ResultOrder::NewestFirst);
    let sparql = compile_with(&ParsedQuery::empty(""), &options).sparql;
    assert!(sparql.contains("ORDER BY DESC(?publicationDate) ?title"));
}

#[test]
fn test_compare_compiles_as_search() {
    let mut parsed = with_range(QuantityType::Temperature, Some(1.0), None, "keV");
    parsed.intent = Intent::Compare;
    let output = compile_with(&parsed, &fixed_options());
    assert_eq!(output.kind, QueryKind::Search);
    assert!(output.sparql.starts_with("PREFIX"));
    assert!(output.sparql.contains("SELECT DISTINCT ?paper"));
}

#[test]
fn test_output_ast_matches_text() {
    let parsed = with_range(QuantityType::Density, Some(1e19), None, "m^-3");
    let output = compile_with(&parsed, &fixed_options());
    assert_eq!(output.query.to_sparql(), output.sparql);
    assert_eq!(output.query.limit, Some(20));
    assert!(output.query.distinct);
}

#[test]
fn test_compile_is_deterministic() {
    let parsed =
        PatternExtractor::new().extract("recent tokamak papers with density above 10^19 m^-3");
    let options = fixed_options();
    assert_eq!(
        compile_with(&parsed, &options).sparql,
        compile_with(&parsed, &options).sparql
    );
}
