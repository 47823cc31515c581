//! Graph patterns - the body of a WHERE clause.

use super::expr::Expr;
use super::token::{Token, TokenStream};

// =============================================================================
// Terms
// =============================================================================

/// A subject, predicate or object position in a triple.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum Term {
    Var(String),
    Prefixed { prefix: String, local: String },
    Iri(String),
    /// `a`, only meaningful as a predicate
    A,
}

impl Term {
    pub fn var(name: &str) -> Self {
        Term::Var(name.into())
    }

    /// A name in the default (empty) prefix: `:local`.
    pub fn local(local: &str) -> Self {
        Term::Prefixed {
            prefix: String::new(),
            local: local.into(),
        }
    }

    pub fn to_token(&self) -> Token {
        match self {
            Term::Var(name) => Token::Var(name.clone()),
            Term::Prefixed { prefix, local } => Token::PrefixedName {
                prefix: prefix.clone(),
                local: local.clone(),
            },
            Term::Iri(iri) => Token::Iri(iri.clone()),
            Term::A => Token::A,
        }
    }
}

// =============================================================================
// Triples
// =============================================================================

/// Triples sharing one subject, rendered with `;` between predicate lists.
#[derive(Debug, Clone, PartialEq)]
#[must_use = "builders have no effect until used"]
pub struct TriplesBlock {
    pub subject: Term,
    pub properties: Vec<(Term, Term)>,
}

impl TriplesBlock {
    pub fn new(subject: Term) -> Self {
        Self {
            subject,
            properties: vec![],
        }
    }

    /// Add `predicate object`.
    pub fn property(mut self, predicate: Term, object: Term) -> Self {
        self.properties.push((predicate, object));
        self
    }

    /// Add `a class`.
    pub fn a(self, class: Term) -> Self {
        self.property(Term::A, class)
    }

    pub fn to_tokens(&self, depth: usize) -> TokenStream {
        let mut ts = TokenStream::new();
        ts.indent(depth).push(self.subject.to_token());
        for (i, (predicate, object)) in self.properties.iter().enumerate() {
            if i > 0 {
                ts.space()
                    .push(Token::Semicolon)
                    .newline()
                    .indent(depth + 1);
            } else {
                ts.space();
            }
            ts.push(predicate.to_token()).space().push(object.to_token());
        }
        ts.space().push(Token::Dot);
        ts
    }

    fn is_single(&self) -> bool {
        self.properties.len() == 1
    }
}

// =============================================================================
// Graph Patterns
// =============================================================================

/// One element of a group graph pattern.
#[derive(Debug, Clone, PartialEq)]
pub enum GraphPattern {
    Triples(TriplesBlock),
    Optional(Vec<GraphPattern>),
    Filter(Expr),
}

impl GraphPattern {
    /// `OPTIONAL { block }`
    pub fn optional(block: TriplesBlock) -> Self {
        GraphPattern::Optional(vec![GraphPattern::Triples(block)])
    }

    pub fn to_tokens(&self, depth: usize) -> TokenStream {
        let mut ts = TokenStream::new();
        match self {
            GraphPattern::Triples(block) => {
                ts.append(&block.to_tokens(depth));
            }

            GraphPattern::Optional(inner) => {
                ts.indent(depth)
                    .push(Token::Optional)
                    .space()
                    .push(Token::LBrace);
                match inner.as_slice() {
                    // Short single-triple groups stay on one line.
                    [GraphPattern::Triples(block)] if block.is_single() => {
                        ts.space().append(&block.to_tokens(0)).space();
                    }
                    _ => {
                        for pattern in inner {
                            ts.newline().append(&pattern.to_tokens(depth + 1));
                        }
                        ts.newline().indent(depth);
                    }
                }
                ts.push(Token::RBrace);
            }

            GraphPattern::Filter(expr) => {
                ts.indent(depth)
                    .push(Token::Filter)
                    .lparen()
                    .append(&expr.to_tokens())
                    .rparen();
            }
        }
        ts
    }
}

impl From<TriplesBlock> for GraphPattern {
    fn from(block: TriplesBlock) -> Self {
        GraphPattern::Triples(block)
    }
}
