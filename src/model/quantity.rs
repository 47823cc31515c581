//! Physical quantities and their unit tables.
//!
//! Every quantity the system can filter on is a variant of [`QuantityType`].
//! Each variant owns a canonical unit and a table of affine conversions into
//! it, so adding a quantity is a compile error everywhere it must be handled.

use std::fmt;

use serde::{Deserialize, Serialize};

/// Boltzmann constant in keV per kelvin.
const BOLTZMANN_KEV_PER_K: f64 = 8.617_333_262e-8;

/// A conversion from one unit into its quantity's canonical unit.
///
/// `canonical = value * scale + offset`
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct UnitConversion {
    /// Preferred spelling of the unit.
    pub unit: &'static str,
    /// Other accepted spellings, lower-case.
    pub aliases: &'static [&'static str],
    pub scale: f64,
    pub offset: f64,
}

impl UnitConversion {
    const fn linear(unit: &'static str, aliases: &'static [&'static str], scale: f64) -> Self {
        Self {
            unit,
            aliases,
            scale,
            offset: 0.0,
        }
    }

    /// Whether `unit` names this conversion (case-insensitive).
    pub fn matches(&self, unit: &str) -> bool {
        let key = unit_key(unit);
        self.unit.to_lowercase() == key || self.aliases.iter().any(|a| *a == key)
    }

    /// Every accepted spelling, preferred one first.
    pub fn spellings(&self) -> impl Iterator<Item = &'static str> {
        std::iter::once(self.unit).chain(self.aliases.iter().copied())
    }

    pub fn normalize(&self, value: f64) -> f64 {
        value * self.scale + self.offset
    }

    pub fn denormalize(&self, value: f64) -> f64 {
        (value - self.offset) / self.scale
    }
}

static TEMPERATURE_UNITS: &[UnitConversion] = &[
    UnitConversion::linear("keV", &["kev"], 1.0),
    UnitConversion::linear("eV", &["ev"], 1e-3),
    UnitConversion::linear("MeV", &["mev"], 1e3),
    UnitConversion::linear("K", &["k", "kelvin"], BOLTZMANN_KEV_PER_K),
    UnitConversion {
        unit: "°C",
        aliases: &["°c", "degc", "celsius"],
        scale: BOLTZMANN_KEV_PER_K,
        offset: 273.15 * BOLTZMANN_KEV_PER_K,
    },
];

static DENSITY_UNITS: &[UnitConversion] = &[
    UnitConversion::linear(
        "m^-3",
        &[
            "m-3",
            "m^{-3}",
            "/m^3",
            "/m3",
            "per cubic meter",
            "per cubic metre",
        ],
        1.0,
    ),
    UnitConversion::linear(
        "cm^-3",
        &[
            "cm-3",
            "cm^{-3}",
            "/cm^3",
            "/cm3",
            "/cc",
            "per cubic centimeter",
            "per cubic centimetre",
        ],
        1e6,
    ),
];

/// A measurable physical quantity.
///
/// Serialized as its lower-case name (`"temperature"`, `"density"`).
#[derive(Debug, Clone, Copy, PartialEq, Eq, PartialOrd, Ord, Hash, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum QuantityType {
    Temperature,
    Density,
}

impl QuantityType {
    pub const ALL: [QuantityType; 2] = [QuantityType::Temperature, QuantityType::Density];

    pub fn name(&self) -> &'static str {
        match self {
            QuantityType::Temperature => "temperature",
            QuantityType::Density => "density",
        }
    }

    /// Words in free text that refer to this quantity.
    pub fn vocabulary(&self) -> &'static [&'static str] {
        match self {
            QuantityType::Temperature => &["temperature", "temperatures", "temp", "temps"],
            QuantityType::Density => &["density", "densities"],
        }
    }

    /// Look up a quantity by name or vocabulary word.
    pub fn from_name(name: &str) -> Option<QuantityType> {
        let key = name.trim().to_lowercase();
        Self::ALL
            .into_iter()
            .find(|q| q.vocabulary().contains(&key.as_str()))
    }

    pub fn canonical_unit(&self) -> &'static str {
        match self {
            QuantityType::Temperature => "keV",
            QuantityType::Density => "m^-3",
        }
    }

    pub fn conversions(&self) -> &'static [UnitConversion] {
        match self {
            QuantityType::Temperature => TEMPERATURE_UNITS,
            QuantityType::Density => DENSITY_UNITS,
        }
    }

    pub fn lookup_unit(&self, unit: &str) -> Option<&'static UnitConversion> {
        self.conversions().iter().find(|c| c.matches(unit))
    }

    /// The quantity a unit string belongs to, if any.
    pub fn for_unit(unit: &str) -> Option<QuantityType> {
        Self::ALL
            .into_iter()
            .find(|q| q.lookup_unit(unit).is_some())
    }

    /// Convert `value` in `unit` to the canonical unit.
    ///
    /// Unknown units pass through unchanged.
    pub fn normalize(&self, value: f64, unit: &str) -> f64 {
        match self.lookup_unit(unit) {
            Some(conversion) => conversion.normalize(value),
            None => value,
        }
    }

    /// Convert a canonical `value` back into `unit`.
    pub fn denormalize(&self, value: f64, unit: &str) -> f64 {
        match self.lookup_unit(unit) {
            Some(conversion) => conversion.denormalize(value),
            None => value,
        }
    }
}

impl fmt::Display for QuantityType {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.name())
    }
}

/// Lower-case, trim and collapse inner whitespace.
fn unit_key(unit: &str) -> String {
    unit.split_whitespace()
        .collect::<Vec<_>>()
        .join(" ")
        .to_lowercase()
}
