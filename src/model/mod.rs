//! Core data types shared by the parser and the compiler.
//!
//! - [`quantity`] - the closed set of physical quantities and unit tables
//! - [`parsed`] - [`ParsedQuery`] and its parts

pub mod parsed;
pub mod quantity;

pub use parsed::{
    Intent, InvalidTemporalConstraint, ParsedQuery, QuantityRange, Strategy, TemporalConstraint,
};
pub use quantity::{QuantityType, UnitConversion};
