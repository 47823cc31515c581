//! The fixed graph schema queries are compiled against.
//!
//! ```text
//! :Paper ──:reports──► measurement ──:measuresParameter──► parameter
//!                                                           a :Temperature | :Density
//!                                                           :value, :unitString, :normalizedValue
//! ```
//!
//! Nothing here is discovered at runtime; a schema change means a code change.

use crate::model::QuantityType;
use crate::sparql::{GraphPattern, Prefix, Term, TriplesBlock};

pub const PLASMA_NS: &str = "http://example.org/plasma#";
pub const PAPER_NS: &str = "http://example.org/plasma/paper/";
pub const XSD_NS: &str = "http://www.w3.org/2001/XMLSchema#";

/// Class of document nodes.
pub const PAPER_CLASS: &str = "Paper";

/// Variable every document pattern binds.
pub const PAPER_VAR: &str = "paper";

/// Prefix declarations emitted at the top of every query.
pub fn prefixes() -> Vec<Prefix> {
    vec![
        Prefix::new("", PLASMA_NS),
        Prefix::new("paper", PAPER_NS),
        Prefix::new("xsd", XSD_NS),
    ]
}

// =============================================================================
// Document fields
// =============================================================================

/// Whether every document carries a field.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Presence {
    Always,
    Optional,
}

/// Properties of a `:Paper` node.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum DocumentField {
    Title,
    ArxivId,
    Authors,
    PublicationDate,
    Abstract,
    PdfUrl,
}

impl DocumentField {
    pub const ALL: [DocumentField; 6] = [
        DocumentField::Title,
        DocumentField::ArxivId,
        DocumentField::Authors,
        DocumentField::PublicationDate,
        DocumentField::Abstract,
        DocumentField::PdfUrl,
    ];

    /// Local name of the predicate in the `:` namespace.
    pub fn predicate(self) -> &'static str {
        match self {
            DocumentField::Title => "title",
            DocumentField::ArxivId => "arxivId",
            DocumentField::Authors => "authors",
            DocumentField::PublicationDate => "publicationDate",
            DocumentField::Abstract => "abstract",
            DocumentField::PdfUrl => "pdfUrl",
        }
    }

    /// Variable the field is bound to.
    pub fn var(self) -> &'static str {
        self.predicate()
    }

    pub fn presence(self) -> Presence {
        match self {
            DocumentField::Title => Presence::Always,
            DocumentField::ArxivId
            | DocumentField::Authors
            | DocumentField::PublicationDate
            | DocumentField::Abstract
            | DocumentField::PdfUrl => Presence::Optional,
        }
    }
}

/// `?paper a :Paper ; :title ?title .`
///
/// Only fields with [`Presence::Always`] may join this block.
pub fn document_pattern() -> GraphPattern {
    let mut block = TriplesBlock::new(Term::var(PAPER_VAR)).a(Term::local(PAPER_CLASS));
    for field in DocumentField::ALL {
        if field.presence() == Presence::Always {
            block = block.property(Term::local(field.predicate()), Term::var(field.var()));
        }
    }
    block.into()
}

/// Bind `field` to its variable, inside `OPTIONAL { }` unless every document has it.
pub fn document_field_pattern(field: DocumentField) -> GraphPattern {
    let block = TriplesBlock::new(Term::var(PAPER_VAR))
        .property(Term::local(field.predicate()), Term::var(field.var()));
    match field.presence() {
        Presence::Always => block.into(),
        Presence::Optional => GraphPattern::optional(block),
    }
}

// =============================================================================
// Measurements
// =============================================================================

/// Class of parameter nodes for `quantity`.
pub fn parameter_class(quantity: QuantityType) -> &'static str {
    match quantity {
        QuantityType::Temperature => "Temperature",
        QuantityType::Density => "Density",
    }
}

/// Prefix shared by all variables of one quantity's measurement pattern.
pub fn var_stem(quantity: QuantityType) -> &'static str {
    match quantity {
        QuantityType::Temperature => "temp",
        QuantityType::Density => "dens",
    }
}

/// Variable names used by one quantity's measurement pattern.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct MeasurementVars {
    pub measurement: String,
    pub parameter: String,
    pub value: String,
    pub unit: String,
    pub normalized: String,
}

impl MeasurementVars {
    pub fn for_quantity(quantity: QuantityType) -> Self {
        let stem = var_stem(quantity);
        Self {
            measurement: format!("{}Meas", stem),
            parameter: stem.to_string(),
            value: format!("{}Value", stem),
            unit: format!("{}Unit", stem),
            normalized: format!("{}Normalized", stem),
        }
    }
}

/// Triples linking `?paper` to a parameter of `quantity`:
///
/// ```text
/// ?paper :reports ?tempMeas .
/// ?tempMeas :measuresParameter ?temp .
/// ?temp a :Temperature ;
///   :value ?tempValue ;
///   :unitString ?tempUnit ;
///   :normalizedValue ?tempNormalized .
/// ```
pub fn measurement_patterns(quantity: QuantityType) -> Vec<GraphPattern> {
    let vars = MeasurementVars::for_quantity(quantity);
    vec![
        TriplesBlock::new(Term::var(PAPER_VAR))
            .property(Term::local("reports"), Term::var(&vars.measurement))
            .into(),
        TriplesBlock::new(Term::var(&vars.measurement))
            .property(Term::local("measuresParameter"), Term::var(&vars.parameter))
            .into(),
        TriplesBlock::new(Term::var(&vars.parameter))
            .a(Term::local(parameter_class(quantity)))
            .property(Term::local("value"), Term::var(&vars.value))
            .property(Term::local("unitString"), Term::var(&vars.unit))
            .property(Term::local("normalizedValue"), Term::var(&vars.normalized))
            .into(),
    ]
}
