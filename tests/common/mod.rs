//! Shared helpers for integration tests.

#![allow(dead_code)]

use std::sync::atomic::{AtomicUsize, Ordering};
use std::time::Duration;

use async_trait::async_trait;
use chrono::NaiveDate;
use plasma_query::compiler::CompileOptions;
use plasma_query::parser::{Delegate, DelegateError, DelegateResult};

/// Validate SPARQL syntax by parsing it with spargebra.
pub fn validate_sparql(sparql: &str) -> Result<(), String> {
    spargebra::Query::parse(sparql, None)
        .map(|_| ())
        .map_err(|e| format!("{}\n\n{}", e, sparql))
}

/// Options pinned to a fixed date so output is stable.
pub fn fixed_options() -> CompileOptions {
    CompileOptions::default().with_today(NaiveDate::from_ymd_opt(2024, 6, 1).unwrap())
}

pub fn approx_eq(a: f64, b: f64) -> bool {
    if a == b {
        return true;
    }
    ((a - b) / b.abs().max(f64::MIN_POSITIVE)).abs() < 1e-9
}

/// What a [`MockDelegate`] does when called.
#[derive(Debug, Clone)]
pub enum MockReply {
    Text(String),
    Fail,
    /// Answer with the text after sleeping.
    Slow(Duration, String),
}

/// Scripted delegate that counts its calls.
#[derive(Debug)]
pub struct MockDelegate {
    reply: MockReply,
    calls: AtomicUsize,
}

impl MockDelegate {
    pub fn answering(text: &str) -> Self {
        Self::new(MockReply::Text(text.to_string()))
    }

    pub fn failing() -> Self {
        Self::new(MockReply::Fail)
    }

    pub fn slow(delay: Duration, text: &str) -> Self {
        Self::new(MockReply::Slow(delay, text.to_string()))
    }

    fn new(reply: MockReply) -> Self {
        Self {
            reply,
            calls: AtomicUsize::new(0),
        }
    }

    pub fn calls(&self) -> usize {
        self.calls.load(Ordering::SeqCst)
    }
}

#[async_trait]
impl Delegate for MockDelegate {
    fn name(&self) -> &str {
        "mock"
    }

    async fn complete(&self, _prompt: &str) -> DelegateResult<String> {
        self.calls.fetch_add(1, Ordering::SeqCst);
        match &self.reply {
            MockReply::Text(text) => Ok(text.clone()),
            MockReply::Fail => Err(DelegateError::Network("connection refused".into())),
            MockReply::Slow(delay, text) => {
                tokio::time::sleep(*delay).await;
                Ok(text.clone())
            }
        }
    }
}
