use insta::assert_snapshot;
use plasma_query::compiler::{compile_with, QueryKind};
use plasma_query::model::{Intent, ParsedQuery, QuantityRange, QuantityType, TemporalConstraint};
use plasma_query::parser::PatternExtractor;

#[path = "../common/mod.rs"]
mod common;

use common::{fixed_options, validate_sparql};

fn statistics_query() -> ParsedQuery {
    let mut parsed = ParsedQuery::empty("");
    parsed.intent = Intent::Statistics;
    parsed
}

#[test]
fn test_aggregates_over_quantity() {
    let mut parsed = statistics_query();
    parsed.add_range(
        QuantityRange::new(QuantityType::Temperature, Some(5.0), None, "keV").unwrap(),
    );
    parsed.add_keyword("tokamak");

    let output = compile_with(&parsed, &fixed_options());
    assert_eq!(output.kind, QueryKind::Statistics);
    validate_sparql(&output.sparql).unwrap();
    assert_snapshot!(output.sparql, @r###"
    PREFIX : <http://example.org/plasma#>
    PREFIX paper: <http://example.org/plasma/paper/>
    PREFIX xsd: <http://www.w3.org/2001/XMLSchema#>

    SELECT (COUNT(DISTINCT ?paper) AS ?paperCount) (COUNT(?tempNormalized) AS ?measurementCount) (AVG(?tempNormalized) AS ?avgValue) (MIN(?tempNormalized) AS ?minValue) (MAX(?tempNormalized) AS ?maxValue)
    WHERE {
      ?paper a :Paper ;
        :title ?title .
      ?paper :reports ?tempMeas .
      ?tempMeas :measuresParameter ?temp .
      ?temp a :Temperature ;
        :value ?tempValue ;
        :unitString ?tempUnit ;
        :normalizedValue ?tempNormalized .
      FILTER(?tempNormalized >= 5.0)
      OPTIONAL { ?paper :abstract ?abstract . }
      FILTER(REGEX(?title, "tokamak", "i") || REGEX(COALESCE(?abstract, ""), "tokamak", "i"))
    }
    LIMIT 20
    "###);
}

#[test]
fn test_paper_count_without_quantity() {
    let mut parsed = statistics_query();
    parsed.add_keyword("stellarator");
    let sparql = compile_with(&parsed, &fixed_options()).sparql;
    validate_sparql(&sparql).unwrap();
    assert!(sparql.contains("SELECT (COUNT(DISTINCT ?paper) AS ?paperCount)\nWHERE {"));
    assert!(!sparql.contains("AVG("));
    assert!(!sparql.contains("ORDER BY"));
}

#[test]
fn test_statistics_with_date_filter() {
    let mut parsed = statistics_query();
    parsed.temporal_constraint = Some(TemporalConstraint::Year(2022));
    let sparql = compile_with(&parsed, &fixed_options()).sparql;
    validate_sparql(&sparql).unwrap();
    assert!(sparql.contains("OPTIONAL { ?paper :publicationDate ?publicationDate . }"));
    assert!(sparql.contains("FILTER(STRSTARTS(STR(?publicationDate), \"2022\"))"));
}

#[test]
fn test_aggregates_follow_first_quantity() {
    let mut parsed = statistics_query();
    parsed.add_range(
        QuantityRange::new(QuantityType::Density, Some(1e19), None, "m^-3").unwrap(),
    );
    parsed.add_range(
        QuantityRange::new(QuantityType::Temperature, Some(1.0), None, "keV").unwrap(),
    );
    let sparql = compile_with(&parsed, &fixed_options()).sparql;
    validate_sparql(&sparql).unwrap();
    // Quantities are ordered temperature, density.
    assert!(sparql.contains("(AVG(?tempNormalized) AS ?avgValue)"));
    assert!(!sparql.contains("AVG(?densNormalized)"));
    assert!(sparql.contains("FILTER(?densNormalized >= 1e19)"));
}

#[test]
fn test_extracted_statistics_query() {
    let parsed =
        PatternExtractor::new().extract("average density above 10^19 m^-3 in stellarators");
    assert_eq!(parsed.intent, Intent::Statistics);
    let output = compile_with(&parsed, &fixed_options());
    assert_eq!(output.kind, QueryKind::Statistics);
    validate_sparql(&output.sparql).unwrap();
    assert!(output.sparql.contains("(AVG(?densNormalized) AS ?avgValue)"));
    assert!(output.sparql.contains("\"stellarator\""));
}
