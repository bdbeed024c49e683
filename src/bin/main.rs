//! rqmeta CLI - Inspect annotated SPARQL queries
//!
//! Usage:
//!   rqmeta inspect <file> [--endpoint <url>] [--offline]
//!   rqmeta decorators <file>
//!   rqmeta params <file> [--endpoint <url>] [--offline]
//!
//! Examples:
//!   rqmeta inspect queries/books_by_genre.rq
//!   rqmeta inspect queries/books.json --endpoint https://dbpedia.org/sparql
//!   RUST_LOG=rqmeta=debug rqmeta params queries/books_by_genre.rq --offline

use clap::{Parser, Subcommand};
use rqmeta::config::Settings;
use rqmeta::decorator::extract_decorators;
use rqmeta::endpoint::RequestContext;
use rqmeta::introspect::{Introspector, QueryMetadata};
use rqmeta::loader::FsQuerySource;
use std::path::PathBuf;
use std::process::ExitCode;
use std::sync::Arc;
use std::time::Duration;
use tracing_subscriber::EnvFilter;

#[derive(Parser)]
#[command(name = "rqmeta")]
#[command(about = "rqmeta - Derive API metadata from annotated SPARQL queries")]
#[command(version)]
struct Cli {
    /// Configuration file (defaults to RQMETA_CONFIG, ./rqmeta.toml, then the user config dir)
    #[arg(short, long, global = true)]
    config: Option<PathBuf>,

    #[command(subcommand)]
    command: Commands,
}

#[derive(clap::Args)]
struct IntrospectArgs {
    /// Path to the query file (.rq, .sparql or .json)
    file: PathBuf,

    /// Endpoint to use, overriding decorators and endpoint.txt
    #[arg(short, long)]
    endpoint: Option<String>,

    /// Do not contact the endpoint for enumerations
    #[arg(long)]
    offline: bool,

    /// Give up after this many seconds
    #[arg(long, default_value = "60")]
    deadline: u64,
}

#[derive(Subcommand)]
enum Commands {
    /// Print the full query metadata as JSON
    Inspect(IntrospectArgs),

    /// Print the decorator block of a query as JSON
    Decorators {
        /// Path to the query file
        file: PathBuf,
    },

    /// List the parameters derived from a query
    Params(IntrospectArgs),
}

#[tokio::main]
async fn main() -> ExitCode {
    tracing_subscriber::fmt()
        .with_env_filter(
            EnvFilter::try_from_default_env().unwrap_or_else(|_| EnvFilter::new("rqmeta=info")),
        )
        .with_writer(std::io::stderr)
        .init();

    let cli = Cli::parse();

    let settings = match &cli.config {
        Some(path) => Settings::from_file(path),
        None => Settings::load(),
    };
    let settings = match settings {
        Ok(s) => Arc::new(s),
        Err(e) => {
            eprintln!("Configuration error: {}", e);
            return ExitCode::FAILURE;
        }
    };

    match cli.command {
        Commands::Inspect(args) => cmd_inspect(settings, args).await,
        Commands::Decorators { file } => cmd_decorators(file),
        Commands::Params(args) => cmd_params(settings, args).await,
    }
}

async fn cmd_inspect(settings: Arc<Settings>, args: IntrospectArgs) -> ExitCode {
    let Some(metadata) = introspect(settings, &args).await else {
        return ExitCode::FAILURE;
    };

    match serde_json::to_string_pretty(&metadata) {
        Ok(json) => {
            println!("{}", json);
            ExitCode::SUCCESS
        }
        Err(e) => {
            eprintln!("Error serializing metadata: {}", e);
            ExitCode::FAILURE
        }
    }
}

fn cmd_decorators(file: PathBuf) -> ExitCode {
    let raw = match FsQuerySource::new(&file).load() {
        Ok(raw) => raw,
        Err(e) => {
            eprintln!("Error loading query: {}", e);
            return ExitCode::FAILURE;
        }
    };

    let mut decorators = extract_decorators(&raw).into_map();
    decorators.remove(rqmeta::decorator::QUERY_KEY);

    match serde_json::to_string_pretty(&decorators) {
        Ok(json) => {
            println!("{}", json);
            ExitCode::SUCCESS
        }
        Err(e) => {
            eprintln!("Error serializing decorators: {}", e);
            ExitCode::FAILURE
        }
    }
}

async fn cmd_params(settings: Arc<Settings>, args: IntrospectArgs) -> ExitCode {
    let Some(metadata) = introspect(settings, &args).await else {
        return ExitCode::FAILURE;
    };

    println!("File: {}", args.file.display());
    println!("Type: {}", metadata.query_type);
    println!();

    let Some(parameters) = &metadata.parameters else {
        println!("No parameters.");
        return ExitCode::SUCCESS;
    };
    if parameters.is_empty() {
        println!("No parameters.");
        return ExitCode::SUCCESS;
    }

    println!("Parameters:");
    for param in parameters.values() {
        let mut details = vec![param.param_type.to_string()];
        details.push(if param.required { "required" } else { "optional" }.to_string());
        if let Some(lang) = &param.lang {
            details.push(format!("lang={}", lang));
        }
        if let Some(datatype) = &param.datatype {
            details.push(format!("datatype={}", datatype));
        }
        if let Some(format) = &param.format {
            details.push(format!("format={}", format));
        }
        if let Some(default) = &param.default {
            details.push(format!("default={}", default));
        }
        println!("  - {} ({}) [{}]", param.name, param.original, details.join(", "));
        if let Some(values) = &param.enumeration {
            println!("      enum: {}", values.join(", "));
        }
    }

    ExitCode::SUCCESS
}

async fn introspect(settings: Arc<Settings>, args: &IntrospectArgs) -> Option<QueryMetadata> {
    let source = FsQuerySource::new(&args.file);
    let raw = match source.load() {
        Ok(raw) => raw,
        Err(e) => {
            eprintln!("Error loading query: {}", e);
            return None;
        }
    };

    let introspector = if args.offline {
        Introspector::offline(settings)
    } else {
        match Introspector::from_settings(settings) {
            Ok(i) => i,
            Err(e) => {
                eprintln!("Error setting up endpoint client: {}", e);
                return None;
            }
        }
    };

    let request = RequestContext {
        endpoint: args.endpoint.clone(),
    };

    match introspector
        .introspect_within(
            Duration::from_secs(args.deadline),
            &raw,
            &request,
            Some(&source),
        )
        .await
    {
        Ok(metadata) => Some(metadata),
        Err(e) => {
            eprintln!("Introspection error: {}", e);
            None
        }
    }
}
