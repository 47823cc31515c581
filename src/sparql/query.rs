//! Query builder - construct SPARQL SELECT queries with a fluent API.

use super::expr::Expr;
use super::pattern::GraphPattern;
use super::token::{Token, TokenStream};

// =============================================================================
// Prefix Declarations
// =============================================================================

/// A `PREFIX name: <iri>` declaration.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Prefix {
    pub name: String,
    pub iri: String,
}

impl Prefix {
    pub fn new(name: &str, iri: &str) -> Self {
        Self {
            name: name.into(),
            iri: iri.into(),
        }
    }

    pub fn to_tokens(&self) -> TokenStream {
        let mut ts = TokenStream::new();
        ts.push(Token::Prefix)
            .space()
            .push(Token::PrefixedName {
                prefix: self.name.clone(),
                local: String::new(),
            })
            .space()
            .push(Token::Iri(self.iri.clone()));
        ts
    }
}

// =============================================================================
// Projection
// =============================================================================

/// A SELECT list item.
#[derive(Debug, Clone, PartialEq)]
#[must_use = "builders have no effect until used"]
pub enum Projection {
    /// `?name`
    Var(String),
    /// `(expr AS ?alias)`
    Expr { expr: Expr, alias: String },
}

impl Projection {
    pub fn var(name: &str) -> Self {
        Projection::Var(name.into())
    }

    /// Name of the variable this item binds.
    pub fn binding(&self) -> &str {
        match self {
            Projection::Var(name) => name,
            Projection::Expr { alias, .. } => alias,
        }
    }

    pub fn to_tokens(&self) -> TokenStream {
        let mut ts = TokenStream::new();
        match self {
            Projection::Var(name) => {
                ts.var(name.clone());
            }
            Projection::Expr { expr, alias } => {
                ts.lparen()
                    .append(&expr.to_tokens())
                    .space()
                    .push(Token::As)
                    .space()
                    .var(alias.clone())
                    .rparen();
            }
        }
        ts
    }
}

// =============================================================================
// ORDER BY
// =============================================================================

/// Sort direction.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default)]
pub enum SortDir {
    #[default]
    Asc,
    Desc,
}

/// An ORDER BY condition.
#[derive(Debug, Clone, PartialEq)]
#[must_use = "builders have no effect until used"]
pub struct OrderByExpr {
    pub expr: Expr,
    pub dir: Option<SortDir>,
}

impl OrderByExpr {
    pub fn new(expr: Expr) -> Self {
        Self { expr, dir: None }
    }

    pub fn asc(expr: Expr) -> Self {
        Self {
            expr,
            dir: Some(SortDir::Asc),
        }
    }

    pub fn desc(expr: Expr) -> Self {
        Self {
            expr,
            dir: Some(SortDir::Desc),
        }
    }

    pub fn to_tokens(&self) -> TokenStream {
        let mut ts = TokenStream::new();
        match self.dir {
            None => {
                ts.append(&self.expr.to_tokens());
            }
            Some(dir) => {
                ts.push(match dir {
                    SortDir::Asc => Token::Asc,
                    SortDir::Desc => Token::Desc,
                })
                .lparen()
                .append(&self.expr.to_tokens())
                .rparen();
            }
        }
        ts
    }
}

// =============================================================================
// Query Builder
// =============================================================================

/// A SPARQL SELECT query.
#[derive(Debug, Clone, Default, PartialEq)]
#[must_use = "SelectQuery has no effect until converted with to_sparql() or to_tokens()"]
pub struct SelectQuery {
    pub prefixes: Vec<Prefix>,
    pub distinct: bool,
    /// Empty means `SELECT *`.
    pub projection: Vec<Projection>,
    pub where_clause: Vec<GraphPattern>,
    pub order_by: Vec<OrderByExpr>,
    pub limit: Option<u64>,
    pub offset: Option<u64>,
}

impl SelectQuery {
    /// Create a new empty query.
    pub fn new() -> Self {
        Self::default()
    }

    /// Declare a prefix.
    pub fn prefix(mut self, prefix: Prefix) -> Self {
        self.prefixes.push(prefix);
        self
    }

    /// Add DISTINCT.
    pub fn distinct(mut self) -> Self {
        self.distinct = true;
        self
    }

    /// Set the SELECT list.
    pub fn select(mut self, items: Vec<Projection>) -> Self {
        self.projection = items;
        self
    }

    /// Append one pattern to the WHERE clause.
    pub fn pattern(mut self, pattern: impl Into<GraphPattern>) -> Self {
        self.where_clause.push(pattern.into());
        self
    }

    /// Append several patterns to the WHERE clause.
    pub fn patterns(mut self, patterns: impl IntoIterator<Item = GraphPattern>) -> Self {
        self.where_clause.extend(patterns);
        self
    }

    /// Append a FILTER to the WHERE clause.
    pub fn filter(self, condition: Expr) -> Self {
        self.pattern(GraphPattern::Filter(condition))
    }

    /// Set the ORDER BY clause.
    pub fn order_by(mut self, exprs: Vec<OrderByExpr>) -> Self {
        self.order_by = exprs;
        self
    }

    /// Set LIMIT.
    pub fn limit(mut self, limit: u64) -> Self {
        self.limit = Some(limit);
        self
    }

    /// Set OFFSET.
    pub fn offset(mut self, offset: u64) -> Self {
        self.offset = Some(offset);
        self
    }

    /// Convert to token stream.
    pub fn to_tokens(&self) -> TokenStream {
        let mut ts = TokenStream::new();

        // PREFIX
        for prefix in &self.prefixes {
            ts.append(&prefix.to_tokens()).newline();
        }
        if !self.prefixes.is_empty() {
            ts.newline();
        }

        // SELECT
        ts.push(Token::Select);
        if self.distinct {
            ts.space().push(Token::Distinct);
        }
        if self.projection.is_empty() {
            ts.space().push(Token::Star);
        }
        for item in &self.projection {
            ts.space().append(&item.to_tokens());
        }

        // WHERE
        ts.newline().push(Token::Where).space().push(Token::LBrace);
        for pattern in &self.where_clause {
            ts.newline().append(&pattern.to_tokens(1));
        }
        ts.newline().push(Token::RBrace);

        // ORDER BY
        if !self.order_by.is_empty() {
            ts.newline().push(Token::OrderBy);
            for order_expr in &self.order_by {
                ts.space().append(&order_expr.to_tokens());
            }
        }

        // LIMIT / OFFSET
        if let Some(limit) = self.limit {
            ts.newline()
                .push(Token::Limit)
                .space()
                .push(Token::LitInt(limit as i64));
        }
        if let Some(offset) = self.offset {
            ts.newline()
                .push(Token::Offset)
                .space()
                .push(Token::LitInt(offset as i64));
        }

        ts
    }

    /// Generate the SPARQL string.
    pub fn to_sparql(&self) -> String {
        self.to_tokens().serialize()
    }
}

impl std::fmt::Display for SelectQuery {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        write!(f, "{}", self.to_sparql())
    }
}

// =============================================================================
// Tests
// =============================================================================
