//! Parser, compiler and cache wired together.
//!
//! ```text
//! text ─► cache hit? ──yes──────────────────────┐
//!            │ no                               ▼
//!            └─► QueryParser::parse ─► put ─► compile_with ─► PipelineOutput
//! ```
//!
//! The cache is optional and best-effort: its errors are logged, never
//! returned. Entries are scoped by [`QueryParser::cache_scope`], and a
//! pattern fallback is never stored while a delegate is configured, so a
//! transient delegate failure does not outlive its request.

use std::sync::Arc;

use tracing::{debug, info, warn};

use crate::cache::{CacheResult, QueryCache};
use crate::compiler::{compile_with, CompileOptions, CompileOutput};
use crate::config::Settings;
use crate::model::{ParsedQuery, Strategy};
use crate::parser::{DelegateResult, OpenAiDelegate, QueryParser};

/// Result of one pipeline run.
#[derive(Debug, Clone)]
pub struct PipelineOutput {
    pub parsed: ParsedQuery,
    pub compiled: CompileOutput,
    /// The parse came from the cache.
    pub cache_hit: bool,
}

/// Free text in, SPARQL out.
#[derive(Debug)]
pub struct QueryPipeline {
    parser: QueryParser,
    options: CompileOptions,
    cache: Option<QueryCache>,
    max_limit: u32,
}

impl QueryPipeline {
    pub fn new(parser: QueryParser, options: CompileOptions) -> Self {
        Self {
            parser,
            options,
            cache: None,
            max_limit: u32::MAX,
        }
    }

    /// Attach a cache of parsed queries.
    pub fn with_cache(mut self, cache: QueryCache) -> Self {
        self.cache = Some(cache);
        self
    }

    /// Replace the compile options.
    pub fn with_options(mut self, options: CompileOptions) -> Self {
        self.options = options;
        self
    }

    /// Cap limits requested through [`QueryPipeline::run_with_limit`].
    pub fn with_max_limit(mut self, max_limit: u32) -> Self {
        self.max_limit = max_limit.max(1);
        self
    }

    /// Build a pipeline from settings.
    ///
    /// The delegate is attached when enabled and a credential resolves; the
    /// cache is opened when enabled. A cache that cannot be opened is logged
    /// and skipped.
    pub fn from_settings(settings: &Settings) -> DelegateResult<Self> {
        let parser = match settings.delegate.resolved_api_key() {
            Some(key) => {
                let delegate = OpenAiDelegate::with_endpoint(
                    key,
                    &settings.delegate.endpoint,
                    &settings.delegate.model,
                    settings.delegate.timeout(),
                )?;
                info!(model = %settings.delegate.model, "delegated extraction enabled");
                QueryParser::with_delegate(Arc::new(delegate))
                    .with_timeout(settings.delegate.timeout())
            }
            None => {
                debug!("no delegate credential, using pattern extraction only");
                QueryParser::deterministic()
            }
        };

        let mut pipeline = Self::new(parser, settings.compiler.compile_options())
            .with_max_limit(settings.compiler.max_limit);

        if settings.cache.enabled {
            match open_cache(settings) {
                Ok(cache) => pipeline = pipeline.with_cache(cache),
                Err(err) => warn!(error = %err, "query cache unavailable"),
            }
        }

        Ok(pipeline)
    }

    pub fn parser(&self) -> &QueryParser {
        &self.parser
    }

    pub fn options(&self) -> &CompileOptions {
        &self.options
    }

    pub fn cache(&self) -> Option<&QueryCache> {
        self.cache.as_ref()
    }

    /// Parse (or fetch from the cache) and compile `text`.
    pub async fn run(&self, text: &str) -> PipelineOutput {
        self.run_with_options(text, &self.options).await
    }

    /// Like [`QueryPipeline::run`] with a different row limit, capped at the
    /// configured maximum.
    pub async fn run_with_limit(&self, text: &str, limit: u32) -> PipelineOutput {
        let options = self.options.clone().with_limit(limit.min(self.max_limit));
        self.run_with_options(text, &options).await
    }

    /// Parse (or fetch from the cache) only.
    pub async fn parse(&self, text: &str) -> (ParsedQuery, bool) {
        if let Some(parsed) = self.cached(text) {
            return (parsed, true);
        }
        let parsed = self.parser.parse(text).await;
        self.store(text, &parsed);
        (parsed, false)
    }

    async fn run_with_options(&self, text: &str, options: &CompileOptions) -> PipelineOutput {
        let (parsed, cache_hit) = self.parse(text).await;
        let compiled = compile_with(&parsed, options);
        PipelineOutput {
            parsed,
            compiled,
            cache_hit,
        }
    }

    fn cached(&self, text: &str) -> Option<ParsedQuery> {
        let cache = self.cache.as_ref()?;
        match cache.get_scoped(&self.parser.cache_scope(), text) {
            Ok(Some(mut parsed)) => {
                debug!("cache hit");
                // Keys ignore surrounding whitespace; report this caller's text.
                parsed.original_query = text.to_string();
                Some(parsed)
            }
            Ok(None) => None,
            Err(err) => {
                warn!(error = %err, "cache lookup failed");
                None
            }
        }
    }

    fn store(&self, text: &str, parsed: &ParsedQuery) {
        // Nothing useful to remember for blank input.
        if text.trim().is_empty() {
            return;
        }
        if self.parser.has_delegate() && parsed.strategy == Strategy::Deterministic {
            debug!("not caching pattern fallback");
            return;
        }
        if let Some(cache) = &self.cache {
            if let Err(err) = cache.put_scoped(&self.parser.cache_scope(), text, parsed) {
                warn!(error = %err, "cache store failed");
            }
        }
    }
}

/// Open the cache the settings describe, falling back to the default location
/// when the configured path cannot be expanded.
pub fn open_cache(settings: &Settings) -> CacheResult<QueryCache> {
    let policy = settings.cache.policy();
    match settings.cache.resolved_path() {
        Ok(Some(path)) => QueryCache::open(path, policy),
        Ok(None) => QueryCache::open_default(policy),
        Err(err) => {
            warn!(error = %err, "cache path could not be expanded, using the default location");
            QueryCache::open_default(policy)
        }
    }
}
