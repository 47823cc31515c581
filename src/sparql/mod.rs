//! SPARQL generation module.
//!
//! A small typed builder for the subset of SPARQL 1.1 SELECT queries the
//! compiler emits:
//!
//! - [`query`] - SELECT query builder
//! - [`pattern`] - triples, OPTIONAL groups and FILTERs
//! - [`expr`] - Expression AST and builder DSL
//! - [`token`] - Token types for SPARQL generation

pub mod expr;
pub mod pattern;
pub mod query;
pub mod token;


pub use expr::{
    all_of, any_of, avg, bound, coalesce, count, count_distinct, func, lit_float, lit_int,
    lit_str, max, min, regex, str_, strstarts, var, BinaryOperator, Expr, ExprExt, Literal,
    UnaryOperator,
};
pub use pattern::{GraphPattern, Term, TriplesBlock};
pub use query::{OrderByExpr, Prefix, Projection, SelectQuery, SortDir};
pub use token::{Token, TokenStream};
