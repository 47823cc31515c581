//! The structured form of a free-text query.

use std::collections::BTreeMap;
use std::fmt;
use std::str::FromStr;

use serde::{Deserialize, Serialize};

use super::quantity::QuantityType;

// ============================================================================
// Intent
// ============================================================================

/// What the user wants back.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum Intent {
    /// Find matching documents.
    #[default]
    Search,
    /// Aggregate values of a quantity.
    Statistics,
    /// Put values side by side. Compiles as a search.
    Compare,
}

impl Intent {
    pub fn name(&self) -> &'static str {
        match self {
            Intent::Search => "search",
            Intent::Statistics => "statistics",
            Intent::Compare => "compare",
        }
    }

    pub fn from_name(name: &str) -> Option<Intent> {
        match name.trim().to_lowercase().as_str() {
            "search" => Some(Intent::Search),
            "statistics" | "stats" => Some(Intent::Statistics),
            "compare" | "comparison" => Some(Intent::Compare),
            _ => None,
        }
    }
}

// ============================================================================
// Temporal constraint
// ============================================================================

/// Error for a temporal constraint string that is neither `recent` nor a year.
#[derive(Debug, Clone, PartialEq, Eq, thiserror::Error)]
#[error("Unrecognised temporal constraint: {0}")]
pub struct InvalidTemporalConstraint(pub String);

/// Restriction on publication date.
///
/// Serialized as `"recent"` or a four-digit year such as `"2023"`.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(try_from = "String", into = "String")]
pub enum TemporalConstraint {
    /// Published within the configured recency window.
    Recent,
    /// Published in the given calendar year.
    Year(i32),
}

impl FromStr for TemporalConstraint {
    type Err = InvalidTemporalConstraint;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        let trimmed = s.trim();
        if trimmed.eq_ignore_ascii_case("recent") {
            return Ok(TemporalConstraint::Recent);
        }
        if trimmed.len() == 4 && trimmed.bytes().all(|b| b.is_ascii_digit()) {
            if let Ok(year) = trimmed.parse() {
                return Ok(TemporalConstraint::Year(year));
            }
        }
        Err(InvalidTemporalConstraint(s.to_string()))
    }
}

impl TryFrom<String> for TemporalConstraint {
    type Error = InvalidTemporalConstraint;

    fn try_from(value: String) -> Result<Self, Self::Error> {
        value.parse()
    }
}

impl From<TemporalConstraint> for String {
    fn from(value: TemporalConstraint) -> Self {
        value.to_string()
    }
}

impl fmt::Display for TemporalConstraint {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            TemporalConstraint::Recent => f.write_str("recent"),
            TemporalConstraint::Year(year) => write!(f, "{:04}", year),
        }
    }
}

// ============================================================================
// Quantity range
// ============================================================================

/// A bound on one quantity, in the stated unit and in the canonical unit.
///
/// Only constructed through [`QuantityRange::new`], which guarantees at least
/// one finite bound, `min <= max`, and normalized values for every raw value.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(try_from = "RangeRepr")]
pub struct QuantityRange {
    #[serde(rename = "type")]
    quantity: QuantityType,
    min_value: Option<f64>,
    max_value: Option<f64>,
    unit: String,
    normalized_min: Option<f64>,
    normalized_max: Option<f64>,
}

impl QuantityRange {
    /// Build a range, normalizing both bounds.
    ///
    /// Non-finite bounds are discarded and reversed bounds swapped. Returns
    /// `None` when no bound survives.
    pub fn new(
        quantity: QuantityType,
        min_value: Option<f64>,
        max_value: Option<f64>,
        unit: impl Into<String>,
    ) -> Option<Self> {
        let unit = unit.into().trim().to_string();
        let finite = |v: Option<f64>| v.filter(|v| v.is_finite());
        let (mut min_value, mut max_value) = (finite(min_value), finite(max_value));
        if let (Some(lo), Some(hi)) = (min_value, max_value) {
            if lo > hi {
                min_value = Some(hi);
                max_value = Some(lo);
            }
        }

        let normalized = |v: Option<f64>| v.map(|v| quantity.normalize(v, &unit));
        let (mut normalized_min, mut normalized_max) =
            (normalized(min_value), normalized(max_value));

        // A bound that overflows during conversion is unusable.
        if normalized_min.is_some_and(|v| !v.is_finite()) {
            min_value = None;
            normalized_min = None;
        }
        if normalized_max.is_some_and(|v| !v.is_finite()) {
            max_value = None;
            normalized_max = None;
        }

        if min_value.is_none() && max_value.is_none() {
            return None;
        }

        Some(Self {
            quantity,
            min_value,
            max_value,
            unit,
            normalized_min,
            normalized_max,
        })
    }

    pub fn quantity(&self) -> QuantityType {
        self.quantity
    }

    pub fn min_value(&self) -> Option<f64> {
        self.min_value
    }

    pub fn max_value(&self) -> Option<f64> {
        self.max_value
    }

    pub fn unit(&self) -> &str {
        &self.unit
    }

    pub fn normalized_min(&self) -> Option<f64> {
        self.normalized_min
    }

    pub fn normalized_max(&self) -> Option<f64> {
        self.normalized_max
    }

    /// Whether the stated unit appears in the quantity's conversion table.
    pub fn has_known_unit(&self) -> bool {
        self.quantity.lookup_unit(&self.unit).is_some()
    }

    /// Both bounds present.
    pub fn is_closed(&self) -> bool {
        self.min_value.is_some() && self.max_value.is_some()
    }
}

/// Wire shape of a range; normalized values are recomputed on load.
#[derive(Deserialize)]
struct RangeRepr {
    #[serde(rename = "type")]
    quantity: QuantityType,
    #[serde(default)]
    min_value: Option<f64>,
    #[serde(default)]
    max_value: Option<f64>,
    unit: String,
}

impl TryFrom<RangeRepr> for QuantityRange {
    type Error = String;

    fn try_from(repr: RangeRepr) -> Result<Self, Self::Error> {
        QuantityRange::new(repr.quantity, repr.min_value, repr.max_value, repr.unit)
            .ok_or_else(|| format!("{} range has no finite bound", repr.quantity))
    }
}

// ============================================================================
// Parsed query
// ============================================================================

/// Which extraction strategy produced a [`ParsedQuery`].
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum Strategy {
    Delegated,
    #[default]
    Deterministic,
}

/// Structured representation of a free-text query.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct ParsedQuery {
    pub intent: Intent,
    /// At most one range per quantity.
    pub parameters: BTreeMap<QuantityType, QuantityRange>,
    pub keywords: Vec<String>,
    pub temporal_constraint: Option<TemporalConstraint>,
    /// Heuristic trust in the extraction, in `[0, 1]`.
    pub confidence: f64,
    pub original_query: String,
    #[serde(default)]
    pub strategy: Strategy,
    /// Raw delegate output, kept for debugging.
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub raw_response: Option<String>,
}

impl ParsedQuery {
    /// A query that extracted nothing.
    pub fn empty(original_query: impl Into<String>) -> Self {
        Self {
            intent: Intent::Search,
            parameters: BTreeMap::new(),
            keywords: Vec::new(),
            temporal_constraint: None,
            confidence: 0.0,
            original_query: original_query.into(),
            strategy: Strategy::Deterministic,
            raw_response: None,
        }
    }

    /// Nothing to filter on.
    pub fn is_empty(&self) -> bool {
        self.parameters.is_empty() && self.keywords.is_empty() && self.temporal_constraint.is_none()
    }

    /// Add a range unless one already exists for its quantity.
    ///
    /// Returns `false` when the range was ignored.
    pub fn add_range(&mut self, range: QuantityRange) -> bool {
        match self.parameters.entry(range.quantity()) {
            std::collections::btree_map::Entry::Occupied(_) => false,
            std::collections::btree_map::Entry::Vacant(slot) => {
                slot.insert(range);
                true
            }
        }
    }

    /// Add a keyword, skipping blanks and case-insensitive duplicates.
    pub fn add_keyword(&mut self, keyword: &str) {
        let keyword = keyword.trim();
        if keyword.is_empty()
            || self
                .keywords
                .iter()
                .any(|k| k.eq_ignore_ascii_case(keyword))
        {
            return;
        }
        self.keywords.push(keyword.to_string());
    }

    pub fn range(&self, quantity: QuantityType) -> Option<&QuantityRange> {
        self.parameters.get(&quantity)
    }

    /// Set the confidence, clamped to `[0, 1]`.
    pub fn set_confidence(&mut self, confidence: f64) {
        self.confidence = if confidence.is_nan() {
            0.0
        } else {
            confidence.clamp(0.0, 1.0)
        };
    }
}
