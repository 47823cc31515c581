//! # plasma-query
//!
//! Plain-language queries about plasma physics papers, compiled to SPARQL.
//!
//! ## Architecture
//!
//! ```text
//! ┌─────────────────────────────────────────────────────────┐
//! │                     Free-text query                      │
//! │      "tokamak papers with temperature above 10 keV"      │
//! └─────────────────────────────────────────────────────────┘
//!                          │
//!                          ▼ [parser: delegate, else patterns]
//! ┌─────────────────────────────────────────────────────────┐
//! │                      ParsedQuery                         │
//! │   (intent, quantity ranges, keywords, temporal filter)   │
//! └─────────────────────────────────────────────────────────┘
//!                          │
//!                          ▼ [compiler]
//! ┌─────────────────────────────────────────────────────────┐
//! │                 SelectQuery (SPARQL AST)                 │
//! └─────────────────────────────────────────────────────────┘
//!                          │
//!                          ▼ [sparql tokens]
//! ┌─────────────────────────────────────────────────────────┐
//! │                      SPARQL text                         │
//! └─────────────────────────────────────────────────────────┘
//! ```
//!
//! [`pipeline::QueryPipeline`] wires the stages together with an optional
//! cache of parsed queries and settings loaded by [`config::Settings`].

pub mod cache;
pub mod compiler;
pub mod config;
pub mod model;
pub mod parser;
pub mod pipeline;
pub mod sparql;

/// Re-exports for convenient usage.
pub mod prelude {
    pub use crate::compiler::{
        compile, compile_with, CompileOptions, CompileOutput, MissingDatePolicy, QueryKind,
        ResultOrder,
    };
    pub use crate::model::{
        Intent, ParsedQuery, QuantityRange, QuantityType, Strategy, TemporalConstraint,
    };
    pub use crate::parser::{Delegate, DelegateError, OpenAiDelegate, QueryParser};
    pub use crate::pipeline::{PipelineOutput, QueryPipeline};
    pub use crate::sparql::{SelectQuery, Token, TokenStream};
}

pub use compiler::{compile, compile_with, CompileOptions};
pub use model::{ParsedQuery, QuantityType};
pub use parser::QueryParser;
pub use pipeline::QueryPipeline;
