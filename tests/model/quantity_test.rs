use plasma_query::model::QuantityType;
use proptest::prelude::*;

#[path = "../common/mod.rs"]
mod common;

use common::approx_eq;

#[test]
fn test_temperature_conversions() {
    let t = QuantityType::Temperature;
    assert_eq!(t.normalize(10.0, "keV"), 10.0);
    assert!(approx_eq(t.normalize(1000.0, "eV"), 1.0));
    assert!(approx_eq(t.normalize(2.0, "MeV"), 2000.0));
    // 1 keV is roughly 11.6 million kelvin
    assert!((t.normalize(11_604_518.0, "K") - 1.0).abs() < 1e-6);
}

#[test]
fn test_density_conversions() {
    let d = QuantityType::Density;
    assert_eq!(d.normalize(1e19, "m^-3"), 1e19);
    assert!(approx_eq(d.normalize(1e13, "cm^-3"), 1e19));
    assert!(approx_eq(d.normalize(1e13, "/cc"), 1e19));
}

#[test]
fn test_for_unit() {
    assert_eq!(QuantityType::for_unit("keV"), Some(QuantityType::Temperature));
    assert_eq!(QuantityType::for_unit("kelvin"), Some(QuantityType::Temperature));
    assert_eq!(QuantityType::for_unit("cm-3"), Some(QuantityType::Density));
    assert_eq!(QuantityType::for_unit("per cubic meter"), Some(QuantityType::Density));
    assert_eq!(QuantityType::for_unit("tesla"), None);
}

#[test]
fn test_unknown_unit_passes_through() {
    assert_eq!(QuantityType::Temperature.normalize(7.5, "furlongs"), 7.5);
    assert_eq!(QuantityType::Density.denormalize(7.5, "furlongs"), 7.5);
}

#[test]
fn test_serde_names() {
    assert_eq!(
        serde_json::to_string(&QuantityType::Temperature).unwrap(),
        "\"temperature\""
    );
    let q: QuantityType = serde_json::from_str("\"density\"").unwrap();
    assert_eq!(q, QuantityType::Density);
}

#[test]
fn test_display() {
    assert_eq!(QuantityType::Density.to_string(), "density");
}

fn unit_strategy() -> impl Strategy<Value = (QuantityType, &'static str)> {
    let units: Vec<(QuantityType, &'static str)> = QuantityType::ALL
        .iter()
        .flat_map(|q| q.conversions().iter().map(move |c| (*q, c.unit)))
        .collect();
    proptest::sample::select(units)
}

proptest! {
    #[test]
    fn prop_normalize_round_trips((quantity, unit) in unit_strategy(), value in -1e6f64..1e6f64) {
        let back = quantity.denormalize(quantity.normalize(value, unit), unit);
        prop_assert!((back - value).abs() <= 1e-6 * value.abs().max(1.0));
    }

    #[test]
    fn prop_normalize_is_monotonic((quantity, unit) in unit_strategy(), a in 0f64..1e6f64, b in 0f64..1e6f64) {
        let (lo, hi) = if a <= b { (a, b) } else { (b, a) };
        prop_assert!(quantity.normalize(lo, unit) <= quantity.normalize(hi, unit));
    }
}
