use plasma_query::model::{Intent, QuantityType, Strategy, TemporalConstraint};
use plasma_query::parser::PatternExtractor;
use proptest::prelude::*;

#[path = "../common/mod.rs"]
mod common;

use common::approx_eq;

fn extract(text: &str) -> plasma_query::model::ParsedQuery {
    PatternExtractor::new().extract(text)
}

// ----------------------------------------------------------------------------
// Ranges
// ----------------------------------------------------------------------------

#[test]
fn test_power_of_ten_range() {
    let parsed = extract("10^16 to 10^18 m^-3");
    let density = parsed.range(QuantityType::Density).unwrap();
    assert_eq!(density.min_value(), Some(1e16));
    assert_eq!(density.max_value(), Some(1e18));
    assert_eq!(density.unit(), "m^-3");
    assert_eq!(density.normalized_min(), Some(1e16));
    assert_eq!(density.normalized_max(), Some(1e18));
    assert!(parsed.keywords.is_empty());
    assert_eq!(parsed.strategy, Strategy::Deterministic);
}

#[test]
fn test_lower_bound() {
    let parsed = extract("temperature above 10 keV");
    let temp = parsed.range(QuantityType::Temperature).unwrap();
    assert_eq!(temp.min_value(), Some(10.0));
    assert_eq!(temp.max_value(), None);
    assert_eq!(temp.unit(), "keV");
    assert_eq!(temp.normalized_min(), Some(10.0));
    assert_eq!(parsed.intent, Intent::Search);
}

#[test]
fn test_electronvolts_normalize_to_kev() {
    let parsed = extract("temperature above 1000 eV");
    let temp = parsed.range(QuantityType::Temperature).unwrap();
    assert_eq!(temp.min_value(), Some(1000.0));
    assert_eq!(temp.unit(), "eV");
    assert!(approx_eq(temp.normalized_min().unwrap(), 1.0));
}

#[test]
fn test_between_and() {
    let parsed = extract("temperature between 5 and 10 keV");
    let temp = parsed.range(QuantityType::Temperature).unwrap();
    assert_eq!(temp.min_value(), Some(5.0));
    assert_eq!(temp.max_value(), Some(10.0));
}

#[test]
fn test_upper_bound_with_inferred_unit() {
    let parsed = extract("temperature below 500");
    let temp = parsed.range(QuantityType::Temperature).unwrap();
    assert_eq!(temp.min_value(), None);
    assert_eq!(temp.max_value(), Some(500.0));
    assert_eq!(temp.unit(), "keV");
    assert!(parsed.confidence < 0.5);
}

#[test]
fn test_bare_number_without_context_is_ignored() {
    let parsed = extract("ITER has 18 coils");
    assert!(parsed.parameters.is_empty());
}

#[test]
fn test_mantissa_notation() {
    let parsed = extract("density of 2.5 x 10^19 m^-3");
    let density = parsed.range(QuantityType::Density).unwrap();
    assert_eq!(density.min_value(), Some(2.5e19));
    assert_eq!(density.max_value(), None);
}

#[test]
fn test_cgs_density() {
    let parsed = extract("density above 10^13 cm^-3");
    let density = parsed.range(QuantityType::Density).unwrap();
    assert_eq!(density.unit(), "cm^-3");
    assert!(approx_eq(density.normalized_min().unwrap(), 1e19));
}

#[test]
fn test_mixed_units_use_the_second_unit() {
    let parsed = extract("density from 10^13 cm^-3 to 10^20 m^-3");
    let density = parsed.range(QuantityType::Density).unwrap();
    assert_eq!(density.unit(), "m^-3");
    assert!(approx_eq(density.min_value().unwrap(), 1e19));
    assert_eq!(density.max_value(), Some(1e20));
}

#[test]
fn test_two_quantities() {
    let parsed = extract("temperatures over 2 MeV and density below 10^20 m^-3");
    let temp = parsed.range(QuantityType::Temperature).unwrap();
    assert_eq!(temp.min_value(), Some(2.0));
    assert!(approx_eq(temp.normalized_min().unwrap(), 2000.0));
    let density = parsed.range(QuantityType::Density).unwrap();
    assert_eq!(density.max_value(), Some(1e20));
    assert_eq!(density.min_value(), None);
    assert!(parsed.keywords.is_empty());
}

#[test]
fn test_first_range_per_quantity_wins() {
    let parsed = extract("temperature above 5 keV or above 20 keV");
    let temp = parsed.range(QuantityType::Temperature).unwrap();
    assert_eq!(temp.min_value(), Some(5.0));
    assert_eq!(parsed.parameters.len(), 1);
}

#[test]
fn test_one_sided_comparator_does_not_pair() {
    let parsed = extract("temperature above 5 keV and 2 MW of heating");
    let temp = parsed.range(QuantityType::Temperature).unwrap();
    assert_eq!(temp.min_value(), Some(5.0));
    assert_eq!(temp.max_value(), None);
    assert_eq!(temp.unit(), "keV");

    let parsed = extract("temperature above 5 keV and 3 tokamaks");
    let temp = parsed.range(QuantityType::Temperature).unwrap();
    assert_eq!((temp.min_value(), temp.max_value()), (Some(5.0), None));

    let parsed = extract("density below 1e19 m^-3 and 2 papers");
    let density = parsed.range(QuantityType::Density).unwrap();
    assert_eq!((density.min_value(), density.max_value()), (None, Some(1e19)));
}

#[test]
fn test_comparator_after_value() {
    let parsed = extract("temperature of 10 keV or less");
    let temp = parsed.range(QuantityType::Temperature).unwrap();
    assert_eq!((temp.min_value(), temp.max_value()), (None, Some(10.0)));

    let parsed = extract("density 10^19 m^-3 or higher");
    let density = parsed.range(QuantityType::Density).unwrap();
    assert_eq!((density.min_value(), density.max_value()), (Some(1e19), None));

    let parsed = extract("temperature 500 or lower");
    let temp = parsed.range(QuantityType::Temperature).unwrap();
    assert_eq!(temp.max_value(), Some(500.0));
    assert_eq!(temp.unit(), "keV");
    assert!(parsed.keywords.is_empty());
}

#[test]
fn test_kelvin_range_is_not_a_year() {
    let parsed = extract("temperature from 1900 to 2000 K");
    assert_eq!(parsed.temporal_constraint, None);
    let temp = parsed.range(QuantityType::Temperature).unwrap();
    assert_eq!(temp.min_value(), Some(1900.0));
    assert_eq!(temp.max_value(), Some(2000.0));
    assert_eq!(temp.unit(), "K");
}

#[test]
fn test_reversed_bounds_are_swapped() {
    let parsed = extract("temperature between 10 and 5 keV");
    let temp = parsed.range(QuantityType::Temperature).unwrap();
    assert_eq!(temp.min_value(), Some(5.0));
    assert_eq!(temp.max_value(), Some(10.0));
}

#[test]
fn test_spelled_out_unit() {
    let parsed = extract("plasmas with 5e19 per cubic meter");
    let density = parsed.range(QuantityType::Density).unwrap();
    assert_eq!(density.min_value(), Some(5e19));
    assert_eq!(parsed.keywords, vec!["plasma"]);
}

// ----------------------------------------------------------------------------
// Keywords, intent, dates
// ----------------------------------------------------------------------------

#[test]
fn test_keyword_fallback() {
    let parsed = extract("papers about tokamak");
    assert_eq!(parsed.keywords, vec!["tokamak"]);
    assert!(parsed.parameters.is_empty());
    assert_eq!(parsed.temporal_constraint, None);
}

#[test]
fn test_keywords_are_singular_and_unique() {
    let parsed = extract("Tokamaks and tokamak disruptions");
    assert_eq!(parsed.keywords, vec!["tokamak", "disruption"]);
}

#[test]
fn test_recent() {
    let parsed = extract("recent stellarator papers");
    assert_eq!(parsed.temporal_constraint, Some(TemporalConstraint::Recent));
    assert_eq!(parsed.keywords, vec!["stellarator"]);
}

#[test]
fn test_year() {
    let parsed = extract("tokamak results published in 2021");
    assert_eq!(parsed.temporal_constraint, Some(TemporalConstraint::Year(2021)));
    assert_eq!(parsed.keywords, vec!["tokamak"]);
    assert!(parsed.parameters.is_empty());
}

#[test]
fn test_statistics_intent() {
    let parsed = extract("average temperature in tokamaks");
    assert_eq!(parsed.intent, Intent::Statistics);
    assert_eq!(parsed.keywords, vec!["tokamak"]);
}

#[test]
fn test_compare_intent() {
    let parsed = extract("compare density in JET versus ASDEX");
    assert_eq!(parsed.intent, Intent::Compare);
    assert_eq!(parsed.keywords, vec!["jet", "asdex"]);
}

#[test]
fn test_empty_text() {
    let parsed = extract("");
    assert!(parsed.is_empty());
    assert_eq!(parsed.confidence, 0.1);
    assert_eq!(parsed.original_query, "");
}

#[test]
fn test_confidence_for_stated_units() {
    let parsed = extract("temperature above 10 keV");
    assert_eq!(parsed.confidence, 0.5);
}

// ----------------------------------------------------------------------------
// Properties
// ----------------------------------------------------------------------------

proptest! {
    #[test]
    fn prop_extract_is_total(text in "\\PC{0,64}") {
        let parsed = extract(&text);
        prop_assert!((0.0..=1.0).contains(&parsed.confidence));
        prop_assert_eq!(&parsed.original_query, &text);
        for range in parsed.parameters.values() {
            prop_assert!(range.min_value().is_some() || range.max_value().is_some());
            if let (Some(lo), Some(hi)) = (range.min_value(), range.max_value()) {
                prop_assert!(lo <= hi);
            }
        }
    }

    #[test]
    fn prop_extract_is_deterministic(text in "[a-z0-9 ^.-]{0,48}") {
        prop_assert_eq!(extract(&text), extract(&text));
    }

    #[test]
    fn prop_lower_bound_phrase(value in 1u32..100_000, unit in prop::sample::select(vec!["keV", "eV", "MeV", "K"])) {
        let parsed = extract(&format!("temperature above {} {}", value, unit));
        let temp = parsed.range(QuantityType::Temperature).unwrap();
        prop_assert_eq!(temp.min_value(), Some(f64::from(value)));
        prop_assert_eq!(temp.unit(), unit);
    }
}
