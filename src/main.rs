use anyhow::{Context, Result};
use clap::{Parser, Subcommand, ValueEnum};
use scholar_aggregator::config::{find_config_file, load_config, AppConfig};
use scholar_aggregator::models::{Filters, SearchRequest, SearchResult};
use scholar_aggregator::utils::render_table;
use scholar_aggregator::{server, Aggregator, SourceRegistry};
use std::io::{IsTerminal, Read};
use std::net::SocketAddr;
use std::path::PathBuf;
use std::sync::Arc;
use tracing_subscriber::{layer::SubscriberExt, util::SubscriberInitExt, EnvFilter};

/// Scholar Aggregator - search PubMed, arXiv and IEEE Xplore with one query
#[derive(Parser, Debug)]
#[command(name = "scholar-aggregator")]
#[command(version = scholar_aggregator::VERSION)]
#[command(about = "Search PubMed, arXiv and IEEE Xplore with one query", long_about = None)]
#[command(propagate_version = true)]
struct Cli {
    /// Enable verbose logging (-v for debug, -vv for trace)
    #[arg(long, short, global = true, action = clap::ArgAction::Count)]
    verbose: u8,

    /// Only log errors
    #[arg(long, short, global = true)]
    quiet: bool,

    /// Log line format
    #[arg(long, global = true, value_enum, default_value_t = LogFormat::Text)]
    log_format: LogFormat,

    /// Configuration file path
    #[arg(long, global = true)]
    config: Option<PathBuf>,

    #[command(subcommand)]
    command: Commands,
}

#[derive(ValueEnum, Clone, Copy, Debug, PartialEq, Eq)]
enum LogFormat {
    Text,
    Json,
}

/// Output format for results
#[derive(ValueEnum, Clone, Copy, Debug, PartialEq, Eq)]
enum OutputFormat {
    /// Table on a terminal, JSON otherwise
    Auto,
    /// Table format (human-readable)
    Table,
    /// JSON format (machine-readable)
    Json,
}

#[derive(Subcommand, Debug)]
enum Commands {
    /// Search the selected sources
    #[command(alias = "s")]
    Search {
        /// Free-text search terms
        query: String,

        /// Source to search; repeat for several (default: all)
        #[arg(long = "source", short, value_parser = ["pubmed", "arxiv", "ieee"])]
        sources: Vec<String>,

        /// Total number of results, split evenly across sources
        #[arg(long, short, default_value_t = 10)]
        max_results: usize,

        /// Author filter
        #[arg(long, short)]
        author: Option<String>,

        /// Journal / publication title filter
        #[arg(long, short)]
        journal: Option<String>,

        /// Earliest publication year
        #[arg(long)]
        year_from: Option<String>,

        /// Latest publication year
        #[arg(long)]
        year_to: Option<String>,

        /// Publication type filter (PubMed only)
        #[arg(long)]
        article_type: Option<String>,

        /// Output format
        #[arg(long, short, value_enum, default_value_t = OutputFormat::Auto)]
        output: OutputFormat,
    },

    /// Run a JSON search payload read from a file or stdin
    Query {
        /// Payload file (default: stdin)
        #[arg(long, short)]
        file: Option<PathBuf>,

        /// Output format
        #[arg(long, short, value_enum, default_value_t = OutputFormat::Json)]
        output: OutputFormat,
    },

    /// List available sources and the filters they accept
    #[command(alias = "ls")]
    Sources,

    /// Serve the search endpoint over HTTP
    Serve {
        /// Host to bind to (default from configuration)
        #[arg(long)]
        host: Option<String>,

        /// Port to bind to (default from configuration)
        #[arg(long, short)]
        port: Option<u16>,
    },

    /// Print the effective configuration with credentials masked
    Config,
}

fn init_tracing(cli: &Cli) {
    let level = match (cli.quiet, cli.verbose) {
        (true, _) => "error",
        (false, 0) => "info",
        (false, 1) => "debug",
        _ => "trace",
    };

    let filter = EnvFilter::try_from_default_env().unwrap_or_else(|_| {
        EnvFilter::new(format!("scholar_aggregator={level},tower_http={level}"))
    });
    let registry = tracing_subscriber::registry().with(filter);

    // stdout is reserved for results
    match cli.log_format {
        LogFormat::Text => registry
            .with(tracing_subscriber::fmt::layer().with_writer(std::io::stderr))
            .init(),
        LogFormat::Json => registry
            .with(tracing_subscriber::fmt::layer().json().with_writer(std::io::stderr))
            .init(),
    }
}

fn resolve_config(cli: &Cli) -> Result<AppConfig> {
    let path = match &cli.config {
        Some(path) => Some(path.clone()),
        None => find_config_file(),
    };

    if let Some(path) = &path {
        tracing::info!("Using config file: {}", path.display());
    }

    load_config(path.as_deref()).context("Failed to load configuration")
}

fn print_result(result: &SearchResult, output: OutputFormat) -> Result<()> {
    let table = match output {
        OutputFormat::Auto => std::io::stdout().is_terminal(),
        OutputFormat::Table => true,
        OutputFormat::Json => false,
    };

    if table {
        println!("{}", render_table(result));
        for error in &result.errors {
            eprintln!("error: {}", error);
        }
    } else {
        println!("{}", serde_json::to_string_pretty(result)?);
    }

    Ok(())
}

fn read_payload(file: Option<&PathBuf>) -> Result<String> {
    match file {
        Some(path) => std::fs::read_to_string(path)
            .with_context(|| format!("Failed to read {}", path.display())),
        None => {
            let mut payload = String::new();
            std::io::stdin()
                .read_to_string(&mut payload)
                .context("Failed to read payload from stdin")?;
            Ok(payload)
        }
    }
}

#[tokio::main]
async fn main() -> Result<()> {
    let cli = Cli::parse();
    init_tracing(&cli);

    let config = resolve_config(&cli)?;
    let registry = SourceRegistry::from_config(&config).context("Failed to set up sources")?;
    let aggregator = Arc::new(Aggregator::new(Arc::new(registry)));

    match cli.command {
        Commands::Search {
            query,
            sources,
            max_results,
            author,
            journal,
            year_from,
            year_to,
            article_type,
            output,
        } => {
            let mut request = SearchRequest::new(query).max_results(max_results).filters(Filters {
                author,
                journal,
                year_from,
                year_to,
                article_type,
            }
            .normalized());
            if !sources.is_empty() {
                request = request.sources(sources);
            }

            let result = aggregator.search(&request).await?;
            print_result(&result, output)?;
        }

        Commands::Query { file, output } => {
            let payload = read_payload(file.as_ref())?;
            let request = SearchRequest::from_json(&payload)?;
            let result = aggregator.search(&request).await?;
            print_result(&result, output)?;
        }

        Commands::Sources => {
            for source in aggregator.registry().all() {
                println!(
                    "{:<8} {:<12} filters: {}",
                    source.id(),
                    source.name(),
                    source.supported_filters().names().join(", ")
                );
            }
        }

        Commands::Serve { host, port } => {
            let host = host.unwrap_or(config.server.host.clone());
            let port = port.unwrap_or(config.server.port);
            let addr: SocketAddr = format!("{}:{}", host, port)
                .parse()
                .with_context(|| format!("Invalid listen address {}:{}", host, port))?;

            server::serve(addr, aggregator).await?;
        }

        Commands::Config => {
            print!("{}", config.redacted().to_toml()?);
        }
    }

    Ok(())
}
