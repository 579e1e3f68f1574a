//! CRP Ingest - civic records ingestion tool

use anyhow::Result;
use clap::Parser;
use crp_common::logging::{init_logging, LogConfig, LogLevel};
use crp_ingest::config::{build_adapter, load_sources_config, SourceConfig};
use crp_ingest::pipeline::{IngestionPipeline, PipelineConfig, RunStats};
use std::path::Path;
use tracing::{error, info};

#[derive(Parser, Debug)]
#[command(name = "crp-ingest")]
#[command(author, version, about = "Civic records ingestion tool")]
struct Cli {
    #[command(subcommand)]
    command: Command,

    /// Verbose output
    #[arg(short, long)]
    verbose: bool,
}

#[derive(Parser, Debug)]
enum Command {
    /// Ingest every enabled source (or a single one)
    Run {
        /// Sources configuration file
        #[arg(short, long, default_value = "sources.yaml")]
        config: String,

        /// Only run the source with this id
        #[arg(short, long)]
        source: Option<String>,

        /// Concurrent item fetches per source
        #[arg(long)]
        concurrency: Option<usize>,

        /// Earliest meeting date to ingest (YYYY-MM-DD)
        #[arg(long)]
        from: Option<String>,

        /// Latest meeting date to ingest (YYYY-MM-DD)
        #[arg(long)]
        to: Option<String>,
    },

    /// List configured sources
    Sources {
        /// Sources configuration file
        #[arg(short, long, default_value = "sources.yaml")]
        config: String,
    },
}

#[tokio::main]
async fn main() -> Result<()> {
    dotenvy::dotenv().ok();
    let cli = Cli::parse();

    // Initialize logging based on verbose flag; environment takes precedence
    let log_level = if cli.verbose {
        LogLevel::Debug
    } else {
        LogLevel::Info
    };
    let log_config = LogConfig {
        level: log_level,
        log_file_prefix: "crp-ingest".to_string(),
        ..LogConfig::default()
    }
    .from_env()?;
    init_logging(&log_config)?;

    match cli.command {
        Command::Run {
            config,
            source,
            concurrency,
            from,
            to,
        } => {
            run_sources(
                Path::new(&config),
                source.as_deref(),
                concurrency,
                from.as_deref(),
                to.as_deref(),
            )
            .await?;
        },
        Command::Sources { config } => {
            let sources = load_sources_config(Path::new(&config))?;
            for source in &sources.sources {
                info!(
                    id = %source.id,
                    kind = %source.kind,
                    enabled = source.enabled,
                    cadence = %source.cadence,
                    base_url = %source.base_url,
                    "configured source"
                );
            }
        },
    }

    Ok(())
}

async fn run_sources(
    config_path: &Path,
    only: Option<&str>,
    concurrency: Option<usize>,
    from: Option<&str>,
    to: Option<&str>,
) -> Result<()> {
    let sources = load_sources_config(config_path)?;

    let selected: Vec<&SourceConfig> = sources
        .sources
        .iter()
        .filter(|s| only.map_or(s.enabled, |id| s.id == id))
        .collect();
    if selected.is_empty() {
        anyhow::bail!("no matching enabled sources in {}", config_path.display());
    }

    let mut pipeline_config = PipelineConfig::default();
    if let Some(n) = concurrency {
        pipeline_config.fetch_concurrency = n.max(1);
    }
    let pipeline = IngestionPipeline::new(pipeline_config);

    let mut totals = RunStats::default();
    let mut unavailable = 0usize;
    for source in selected {
        info!(source_id = %source.id, "starting ingestion run");
        let adapter = build_adapter(source, from, to);
        match pipeline.run(adapter.as_ref()).await {
            Ok(stats) => totals.merge(&stats),
            // one unreachable source must not stop the remaining runs
            Err(err) => {
                unavailable += 1;
                error!(source_id = %source.id, error = %err, "source unavailable, continuing");
            },
        }
    }

    info!(
        inserted = totals.inserted,
        duplicates = totals.duplicates,
        errors = totals.errors,
        skipped = totals.skipped,
        quarantined = pipeline.quarantine().len(),
        sources_unavailable = unavailable,
        "ingestion complete"
    );
    Ok(())
}
