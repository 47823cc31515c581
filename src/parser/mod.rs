//! Free text to [`ParsedQuery`].
//!
//! Two strategies share one return type:
//!
//! ```text
//! text ──► delegate (optional, bounded by a timeout) ──► interpret_response ──┐
//!   │                        │ any error                                      ├─► ParsedQuery
//!   └────────────────────────┴──────────► PatternExtractor::extract ──────────┘
//! ```
//!
//! [`QueryParser::parse`] never fails: delegate problems are logged and the
//! deterministic strategy answers instead.

pub mod delegate;
pub mod numeric;
pub mod openai;
pub mod patterns;

use std::sync::Arc;
use std::time::Duration;

use tracing::{debug, warn};

pub use delegate::{
    build_prompt, interpret_response, Delegate, DelegateError, DelegateResult, DEFAULT_CONFIDENCE,
};
pub use numeric::parse_number;
pub use openai::OpenAiDelegate;
pub use patterns::PatternExtractor;

use crate::model::ParsedQuery;

/// Default bound on one delegate call.
pub const DEFAULT_DELEGATE_TIMEOUT: Duration = Duration::from_millis(2000);

/// Parses free-text queries.
#[derive(Clone)]
pub struct QueryParser {
    delegate: Option<Arc<dyn Delegate>>,
    patterns: PatternExtractor,
    timeout: Duration,
}

impl Default for QueryParser {
    fn default() -> Self {
        Self::deterministic()
    }
}

impl std::fmt::Debug for QueryParser {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("QueryParser")
            .field("delegate", &self.delegate.as_ref().map(|d| d.name().to_string()))
            .field("timeout", &self.timeout)
            .finish()
    }
}

impl QueryParser {
    /// A parser that only pattern-matches.
    pub fn deterministic() -> Self {
        Self {
            delegate: None,
            patterns: PatternExtractor::new(),
            timeout: DEFAULT_DELEGATE_TIMEOUT,
        }
    }

    /// A parser that asks `delegate` first.
    pub fn with_delegate(delegate: Arc<dyn Delegate>) -> Self {
        Self {
            delegate: Some(delegate),
            ..Self::deterministic()
        }
    }

    /// Set the bound on one delegate call.
    pub fn with_timeout(mut self, timeout: Duration) -> Self {
        self.timeout = timeout;
        self
    }

    pub fn has_delegate(&self) -> bool {
        self.delegate.is_some()
    }

    pub fn timeout(&self) -> Duration {
        self.timeout
    }

    /// Which strategy configuration produced a parse. Cached parses are only
    /// shared between parsers with the same scope.
    pub fn cache_scope(&self) -> String {
        match &self.delegate {
            Some(delegate) => format!("delegated:{}", delegate.fingerprint()),
            None => "deterministic".to_string(),
        }
    }

    /// Parse `text`, trying the delegate first when one is configured.
    pub async fn parse(&self, text: &str) -> ParsedQuery {
        let Some(delegate) = &self.delegate else {
            return self.parse_deterministic(text);
        };
        if text.trim().is_empty() {
            return self.parse_deterministic(text);
        }

        match self.parse_delegated(delegate.as_ref(), text).await {
            Ok(parsed) => {
                debug!(
                    delegate = delegate.name(),
                    parameters = parsed.parameters.len(),
                    "delegated extraction succeeded"
                );
                parsed
            }
            Err(err) => {
                warn!(
                    delegate = delegate.name(),
                    error = %err,
                    "delegated extraction failed, using patterns"
                );
                self.parse_deterministic(text)
            }
        }
    }

    /// Parse `text` with pattern matching only. Pure.
    pub fn parse_deterministic(&self, text: &str) -> ParsedQuery {
        self.patterns.extract(text)
    }

    async fn parse_delegated(
        &self,
        delegate: &dyn Delegate,
        text: &str,
    ) -> DelegateResult<ParsedQuery> {
        let prompt = build_prompt(text);
        let raw = tokio::time::timeout(self.timeout, delegate.complete(&prompt))
            .await
            .map_err(|_| DelegateError::Timeout)??;
        interpret_response(text, &raw)
    }
}
