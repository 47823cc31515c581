//! Compilation from [`ParsedQuery`] to SPARQL.
//!
//! ```text
//! ParsedQuery → choose builder (search | statistics) → SelectQuery AST → tokens → SPARQL
//! ```
//!
//! Compilation is pure and total: every `ParsedQuery`, including the empty
//! one, yields a query with a `LIMIT` clause. Result rows are not unique per
//! paper (one row per matching measurement); callers de-duplicate.
//!
//! # Example
//!
//! ```
//! use plasma_query::compiler::compile;
//! use plasma_query::model::ParsedQuery;
//!
//! let sparql = compile(&ParsedQuery::empty(""), 20);
//! assert!(sparql.ends_with("LIMIT 20"));
//! ```

pub mod filters;
pub mod schema;
mod search;
mod statistics;

use chrono::{Local, NaiveDate};
use serde::{Deserialize, Serialize};

use crate::model::{Intent, ParsedQuery};
use crate::sparql::SelectQuery;

/// Default number of rows requested.
pub const DEFAULT_LIMIT: u32 = 20;

/// Default width of the "recent" window.
pub const DEFAULT_RECENT_DAYS: u32 = 730;

// ============================================================================
// Options
// ============================================================================

/// What a date filter does with papers that have no publication date.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum MissingDatePolicy {
    /// Undated papers fail the filter.
    #[default]
    Exclude,
    /// Undated papers pass the filter.
    Include,
}

/// Row order of search results.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default)]
pub enum ResultOrder {
    /// By title.
    #[default]
    Title,
    /// By publication date descending, then title.
    NewestFirst,
}

/// Options for compilation.
#[derive(Debug, Clone)]
pub struct CompileOptions {
    /// Row limit, at least 1.
    pub limit: u32,
    /// Reference date for "recent".
    pub today: NaiveDate,
    pub recent_days: u32,
    pub missing_dates: MissingDatePolicy,
    pub order: ResultOrder,
    /// Match keywords against abstracts as well as titles.
    pub match_abstract: bool,
}

impl Default for CompileOptions {
    fn default() -> Self {
        Self {
            limit: DEFAULT_LIMIT,
            today: Local::now().date_naive(),
            recent_days: DEFAULT_RECENT_DAYS,
            missing_dates: MissingDatePolicy::default(),
            order: ResultOrder::default(),
            match_abstract: true,
        }
    }
}

impl CompileOptions {
    /// Set the row limit. Zero is raised to 1.
    pub fn with_limit(mut self, limit: u32) -> Self {
        self.limit = limit.max(1);
        self
    }

    /// Set the reference date.
    pub fn with_today(mut self, today: NaiveDate) -> Self {
        self.today = today;
        self
    }

    pub fn with_recent_days(mut self, days: u32) -> Self {
        self.recent_days = days;
        self
    }

    pub fn with_missing_dates(mut self, policy: MissingDatePolicy) -> Self {
        self.missing_dates = policy;
        self
    }

    pub fn with_order(mut self, order: ResultOrder) -> Self {
        self.order = order;
        self
    }

    pub fn with_match_abstract(mut self, enabled: bool) -> Self {
        self.match_abstract = enabled;
        self
    }

    fn effective_limit(&self) -> u64 {
        u64::from(self.limit.max(1))
    }
}

// ============================================================================
// Result Types
// ============================================================================

/// Which builder produced a query.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize)]
#[serde(rename_all = "lowercase")]
pub enum QueryKind {
    Search,
    Statistics,
}

/// Result of compiling a [`ParsedQuery`].
#[derive(Debug, Clone)]
pub struct CompileOutput {
    /// The generated SPARQL string.
    pub sparql: String,

    /// The query AST (for further manipulation if needed).
    pub query: SelectQuery,

    pub kind: QueryKind,
}

// ============================================================================
// Entry Points
// ============================================================================

/// Compile `parsed` with default options and the given row limit.
pub fn compile(parsed: &ParsedQuery, limit: u32) -> String {
    compile_with(parsed, &CompileOptions::default().with_limit(limit)).sparql
}

/// Compile `parsed` with explicit options.
pub fn compile_with(parsed: &ParsedQuery, options: &CompileOptions) -> CompileOutput {
    let (query, kind) = match parsed.intent {
        Intent::Statistics => (statistics::build(parsed, options), QueryKind::Statistics),
        Intent::Search | Intent::Compare => (search::build(parsed, options), QueryKind::Search),
    };

    tracing::debug!(
        kind = ?kind,
        parameters = parsed.parameters.len(),
        keywords = parsed.keywords.len(),
        "compiled query"
    );

    CompileOutput {
        sparql: query.to_sparql(),
        query,
        kind,
    }
}

// ============================================================================
// Tests
// ============================================================================
