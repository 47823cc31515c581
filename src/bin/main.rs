//! plasmaq CLI - turn plain-language paper queries into SPARQL
//!
//! Usage:
//!   plasmaq parse <QUERY> [--no-delegate] [--output text|json]
//!   plasmaq compile <QUERY> [--limit N] [--no-delegate] [--newest-first] [--output sparql|json|verbose]
//!   plasmaq prompt <QUERY>
//!   plasmaq cache stats|clear|purge
//!
//! Examples:
//!   plasmaq compile "tokamak papers with temperature above 10 keV"
//!   plasmaq compile "density 10^19 to 10^20 m^-3 published in 2021" --output verbose
//!   plasmaq parse "recent stellarator results" --no-delegate --output json

use clap::{Parser, Subcommand, ValueEnum};
use plasma_query::compiler::ResultOrder;
use plasma_query::config::Settings;
use plasma_query::parser::build_prompt;
use plasma_query::pipeline::{open_cache, PipelineOutput, QueryPipeline};
use std::path::PathBuf;
use std::process::ExitCode;
use tracing_subscriber::{fmt, prelude::*, EnvFilter};

#[derive(Parser)]
#[command(name = "plasmaq")]
#[command(about = "plasmaq - compile plain-language plasma physics paper queries to SPARQL")]
#[command(version)]
struct Cli {
    /// Path to a config file (overrides the default search)
    #[arg(short, long, global = true)]
    config: Option<PathBuf>,

    /// Log debug output to stderr
    #[arg(short, long, global = true)]
    verbose: bool,

    #[command(subcommand)]
    command: Commands,
}

#[derive(Subcommand)]
enum Commands {
    /// Extract structured parameters from a query
    Parse {
        /// The query text
        query: String,

        /// Skip the delegate and use pattern matching only
        #[arg(long)]
        no_delegate: bool,

        /// Output format
        #[arg(short, long, default_value = "text")]
        output: ParseFormat,
    },

    /// Compile a query to SPARQL
    Compile {
        /// The query text
        query: String,

        /// Maximum number of rows (capped by compiler.max_limit)
        #[arg(short, long)]
        limit: Option<u32>,

        /// Skip the delegate and use pattern matching only
        #[arg(long)]
        no_delegate: bool,

        /// Order results by publication date, newest first
        #[arg(long)]
        newest_first: bool,

        /// Output format
        #[arg(short, long, default_value = "sparql")]
        output: CompileFormat,
    },

    /// Print the prompt sent to the delegate for a query
    Prompt {
        /// The query text
        query: String,
    },

    /// Inspect or clear the parsed-query cache
    Cache {
        #[command(subcommand)]
        action: CacheAction,
    },
}

#[derive(Subcommand)]
enum CacheAction {
    /// Show entry counts and size
    Stats,
    /// Remove every entry
    Clear,
    /// Remove expired entries
    Purge,
}

#[derive(Clone, ValueEnum)]
enum ParseFormat {
    /// Human-readable summary
    Text,
    /// ParsedQuery as JSON
    Json,
}

#[derive(Clone, ValueEnum)]
enum CompileFormat {
    /// Output SPARQL only
    Sparql,
    /// Parsed query and SPARQL as JSON
    Json,
    /// Output SPARQL with comments
    Verbose,
}

#[tokio::main]
async fn main() -> ExitCode {
    let cli = Cli::parse();
    init_tracing(cli.verbose);

    let settings = match load_settings(cli.config.as_ref()) {
        Ok(s) => s,
        Err(code) => return code,
    };

    match cli.command {
        Commands::Parse {
            query,
            no_delegate,
            output,
        } => cmd_parse(settings, &query, no_delegate, output).await,
        Commands::Compile {
            query,
            limit,
            no_delegate,
            newest_first,
            output,
        } => cmd_compile(settings, &query, limit, no_delegate, newest_first, output).await,
        Commands::Prompt { query } => cmd_prompt(&query),
        Commands::Cache { action } => cmd_cache(&settings, action),
    }
}

fn init_tracing(verbose: bool) {
    let default_level = if verbose { "debug" } else { "warn" };
    tracing_subscriber::registry()
        .with(fmt::layer().with_writer(std::io::stderr))
        .with(EnvFilter::try_from_default_env().unwrap_or_else(|_| EnvFilter::new(default_level)))
        .init();
}

fn load_settings(path: Option<&PathBuf>) -> Result<Settings, ExitCode> {
    let result = match path {
        Some(path) => Settings::from_file(path),
        None => Settings::load(),
    };
    result.map_err(|e| {
        eprintln!("Configuration error: {}", e);
        ExitCode::FAILURE
    })
}

fn build_pipeline(mut settings: Settings, no_delegate: bool) -> Result<QueryPipeline, ExitCode> {
    if no_delegate {
        settings.delegate.enabled = false;
    }
    QueryPipeline::from_settings(&settings).map_err(|e| {
        eprintln!("Delegate error: {}", e);
        ExitCode::FAILURE
    })
}

async fn cmd_parse(
    settings: Settings,
    query: &str,
    no_delegate: bool,
    output: ParseFormat,
) -> ExitCode {
    let pipeline = match build_pipeline(settings, no_delegate) {
        Ok(p) => p,
        Err(code) => return code,
    };

    let (parsed, cache_hit) = pipeline.parse(query).await;

    match output {
        ParseFormat::Json => match serde_json::to_string_pretty(&parsed) {
            Ok(json) => println!("{}", json),
            Err(e) => {
                eprintln!("Serialization error: {}", e);
                return ExitCode::FAILURE;
            }
        },
        ParseFormat::Text => {
            println!("Query:      {}", parsed.original_query);
            println!("Intent:     {}", parsed.intent.name());
            println!(
                "Strategy:   {:?}{}",
                parsed.strategy,
                if cache_hit { " (cached)" } else { "" }
            );
            println!("Confidence: {:.2}", parsed.confidence);
            if parsed.parameters.is_empty() {
                println!("Parameters: none");
            } else {
                println!("Parameters:");
                for (quantity, range) in &parsed.parameters {
                    println!(
                        "  - {}: {} .. {} {} (normalized {} .. {} {})",
                        quantity,
                        format_bound(range.min_value()),
                        format_bound(range.max_value()),
                        range.unit(),
                        format_bound(range.normalized_min()),
                        format_bound(range.normalized_max()),
                        quantity.canonical_unit(),
                    );
                }
            }
            if !parsed.keywords.is_empty() {
                println!("Keywords:   {}", parsed.keywords.join(", "));
            }
            if let Some(temporal) = parsed.temporal_constraint {
                println!("Temporal:   {}", temporal);
            }
        }
    }

    ExitCode::SUCCESS
}

fn format_bound(value: Option<f64>) -> String {
    value.map_or_else(|| "*".to_string(), |v| v.to_string())
}

async fn cmd_compile(
    settings: Settings,
    query: &str,
    limit: Option<u32>,
    no_delegate: bool,
    newest_first: bool,
    output: CompileFormat,
) -> ExitCode {
    let mut pipeline = match build_pipeline(settings, no_delegate) {
        Ok(p) => p,
        Err(code) => return code,
    };
    if newest_first {
        let options = pipeline.options().clone().with_order(ResultOrder::NewestFirst);
        pipeline = pipeline.with_options(options);
    }

    let result = match limit {
        Some(limit) => pipeline.run_with_limit(query, limit).await,
        None => pipeline.run(query).await,
    };

    match output {
        CompileFormat::Sparql => {
            println!("{}", result.compiled.sparql);
        }
        CompileFormat::Json => {
            let value = serde_json::json!({
                "parsed": result.parsed,
                "kind": result.compiled.kind,
                "cache_hit": result.cache_hit,
                "sparql": result.compiled.sparql,
            });
            match serde_json::to_string_pretty(&value) {
                Ok(json) => println!("{}", json),
                Err(e) => {
                    eprintln!("Serialization error: {}", e);
                    return ExitCode::FAILURE;
                }
            }
        }
        CompileFormat::Verbose => print_verbose(&result),
    }

    ExitCode::SUCCESS
}

fn print_verbose(result: &PipelineOutput) {
    let parsed = &result.parsed;
    println!("# plasmaq compiled SPARQL");
    println!("# Query: {}", parsed.original_query.replace('\n', " "));
    println!("# Intent: {} ({:?})", parsed.intent.name(), result.compiled.kind);
    println!(
        "# Strategy: {:?}{}",
        parsed.strategy,
        if result.cache_hit { " (cached)" } else { "" }
    );
    println!("# Confidence: {:.2}", parsed.confidence);
    for (quantity, range) in &parsed.parameters {
        println!(
            "# {}: {} .. {} {}",
            quantity,
            format_bound(range.normalized_min()),
            format_bound(range.normalized_max()),
            quantity.canonical_unit()
        );
    }
    if !parsed.keywords.is_empty() {
        println!("# Keywords: {}", parsed.keywords.join(", "));
    }
    println!("# Rows are one per matching measurement; de-duplicate by ?paper.");
    println!();
    println!("{}", result.compiled.sparql);
}

fn cmd_prompt(query: &str) -> ExitCode {
    println!("{}", build_prompt(query));
    ExitCode::SUCCESS
}

fn cmd_cache(settings: &Settings, action: CacheAction) -> ExitCode {
    let cache = match open_cache(settings) {
        Ok(c) => c,
        Err(e) => {
            eprintln!("Cache error: {}", e);
            return ExitCode::FAILURE;
        }
    };

    let result = match action {
        CacheAction::Stats => cache.stats().map(|stats| {
            println!("Entries:  {}", stats.entry_count);
            println!("Expired:  {}", stats.expired_count);
            println!("Size:     {} bytes", stats.total_size_bytes);
        }),
        CacheAction::Clear => cache
            .clear()
            .map(|n| println!("Removed {} entries", n)),
        CacheAction::Purge => cache
            .purge_expired()
            .map(|n| println!("Removed {} expired entries", n)),
    };

    match result {
        Ok(()) => ExitCode::SUCCESS,
        Err(e) => {
            eprintln!("Cache error: {}", e);
            ExitCode::FAILURE
        }
    }
}
