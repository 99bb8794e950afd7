use clap::Parser;
use genre_cluster::config::{ClusterConfig, OutputMode};
use genre_cluster::dispatcher::InputSource;
use genre_cluster::error::ClusterError;
use genre_cluster::topology::{NodeOutcome, Role, open_sink, run_local, run_node};
use genre_cluster::transform::TransformRegistry;
use std::path::PathBuf;
use std::sync::Arc;
use tracing_subscriber::EnvFilter;

#[derive(Parser, Debug)]
#[command(name = "genre-cluster")]
#[command(about = "Rewrites a genre-tagged corpus through one worker per genre")]
#[command(version)]
struct Args {
    /// Corpus to process (required for the dispatcher)
    input: Option<PathBuf>,

    /// Rank of this process in a multi-process group; omit to run the whole group locally
    #[arg(long, requires = "group_size")]
    rank: Option<usize>,

    /// Number of processes in the group (1 dispatcher + 1 worker per genre)
    #[arg(long, requires = "rank")]
    group_size: Option<usize>,

    /// Address the workers listen on
    #[arg(long, env = "GENRE_CLUSTER_HOST")]
    host: Option<String>,

    /// Worker of rank R listens on base_port + R
    #[arg(long, env = "GENRE_CLUSTER_BASE_PORT")]
    base_port: Option<u16>,

    /// Lines per chunk handed to the worker pool
    #[arg(long)]
    chunk_lines: Option<usize>,

    /// Chunks rewritten concurrently by each worker
    #[arg(long)]
    pool_size: Option<usize>,

    /// Write the output next to the input file instead of stdout
    #[arg(long)]
    to_file: bool,

    /// TOML configuration file
    #[arg(long)]
    config: Option<PathBuf>,
}

impl Args {
    fn resolve_config(&self) -> Result<ClusterConfig, ClusterError> {
        let mut config = match &self.config {
            Some(path) => ClusterConfig::load(path)?,
            None => ClusterConfig::default(),
        };

        if let Some(host) = &self.host {
            config.host = host.clone();
        }
        if let Some(base_port) = self.base_port {
            config.base_port = base_port;
        }
        if let Some(chunk_lines) = self.chunk_lines {
            config.chunk_lines = chunk_lines;
        }
        if let Some(pool_size) = self.pool_size {
            config.pool_size = Some(pool_size);
        }
        if self.to_file {
            config.output = OutputMode::File;
        }

        Ok(config)
    }
}

#[tokio::main]
async fn main() {
    // stdout carries the corpus, so logs go to stderr.
    tracing_subscriber::fmt()
        .with_env_filter(
            EnvFilter::try_from_default_env().unwrap_or_else(|_| EnvFilter::new("info")),
        )
        .with_writer(std::io::stderr)
        .init();

    let args = Args::parse();

    if let Err(e) = run(args).await {
        tracing::debug!("Run failed: {:?}", e);
        eprintln!("{:#}", e);
        std::process::exit(1);
    }
}

async fn run(args: Args) -> anyhow::Result<()> {
    let config = args.resolve_config()?;
    let registry = Arc::new(TransformRegistry::standard());

    let (Some(rank), Some(group_size)) = (args.rank, args.group_size) else {
        let input = args.input.ok_or_else(|| {
            ClusterError::Startup(format!("{}: Input file not provided", Role::Dispatcher))
        })?;

        tracing::info!(
            "Running {} genres locally over {:?}",
            registry.len(),
            input
        );

        let source = InputSource::file(&input);
        source.validate()?;
        let sink = open_sink(&config, &input).await?;
        let (_, report) = run_local(registry, &config, source, sink).await?;

        tracing::info!("Done: {} units written", report.units);
        return Ok(());
    };

    match run_node(rank, group_size, registry, &config, args.input).await? {
        NodeOutcome::Dispatched(report) => {
            tracing::info!("Done: {} units written", report.units);
        }
        NodeOutcome::Served { tag, stats } => {
            tracing::info!(
                "Done: served {} units ({} lines) of '{}'",
                stats.units,
                stats.lines,
                tag
            );
        }
    }

    Ok(())
}
