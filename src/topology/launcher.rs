//! Role bootstrap.
//!
//! Two ways to bring a group up:
//! - **Local**: every role runs as a task of one process, connected by
//!   in-memory channels.
//! - **Node**: this process runs the single role assigned to its rank. Workers
//!   listen on `base_port + rank`; the dispatcher connects to each of them.

use super::types::{Role, RoleTable};
use crate::channel::{Channel, local_pair};
use crate::config::{ClusterConfig, OutputMode};
use crate::dispatcher::{DispatchReport, Dispatcher, InputSource};
use crate::error::{ClusterError, Result};
use crate::transform::TransformRegistry;
use crate::unit::Tag;
use crate::worker::{ChunkPool, Worker, WorkerStats};

use std::collections::HashMap;
use std::path::{Path, PathBuf};
use std::sync::Arc;
use tokio::io::AsyncWrite;
use tokio::net::{TcpListener, TcpStream};
use tokio::task::JoinSet;

pub type OutputSink = Box<dyn AsyncWrite + Send + Unpin>;

/// What a node did before exiting.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum NodeOutcome {
    Dispatched(DispatchReport),
    Served { tag: Tag, stats: WorkerStats },
}

/// Fails if file output is configured and its path resolves to the input.
pub async fn check_output_path(config: &ClusterConfig, input: &Path) -> Result<()> {
    if config.output != OutputMode::File {
        return Ok(());
    }

    let path = config.output_path(input);
    if same_file(&path, input).await {
        return Err(ClusterError::Startup(format!(
            "output file {:?} would overwrite the input",
            path
        )));
    }
    Ok(())
}

/// Opens standard output or the sibling output file, per configuration.
pub async fn open_sink(config: &ClusterConfig, input: &Path) -> Result<OutputSink> {
    check_output_path(config, input).await?;

    match config.output {
        OutputMode::Stdout => Ok(Box::new(tokio::io::stdout())),
        OutputMode::File => {
            let path = config.output_path(input);
            let file = tokio::fs::File::create(&path).await?;
            tracing::info!("Writing output to {:?}", path);
            Ok(Box::new(file))
        }
    }
}

async fn same_file(left: &Path, right: &Path) -> bool {
    if left == right {
        return true;
    }

    match (
        tokio::fs::canonicalize(left).await,
        tokio::fs::canonicalize(right).await,
    ) {
        (Ok(left), Ok(right)) => left == right,
        _ => false,
    }
}

fn chunk_pool(config: &ClusterConfig) -> ChunkPool {
    ChunkPool::new(config.chunk_lines, config.pool_size())
}

/// Runs the dispatcher and one worker per genre inside this process.
pub async fn run_local<W>(
    registry: Arc<TransformRegistry>,
    config: &ClusterConfig,
    source: InputSource,
    sink: W,
) -> Result<(W, DispatchReport)>
where
    W: AsyncWrite + Unpin + Send + 'static,
{
    let table = RoleTable::from_registry(&registry);
    let mut channels = HashMap::new();
    let mut workers = JoinSet::new();

    for entry in registry.entries() {
        let (dispatcher_end, worker_end) =
            local_pair("dispatcher", entry.tag.as_str(), config.conversation);
        channels.insert(entry.tag.clone(), dispatcher_end);

        let worker = Worker::new(entry.clone(), worker_end, chunk_pool(config));
        let tag = entry.tag.clone();
        workers.spawn(async move { (tag, worker.run().await) });
    }

    tracing::info!(
        "Local group started: {} roles ({} workers)",
        table.group_size(),
        workers.len()
    );

    let dispatcher = Dispatcher::new(registry, source);
    let outcome = match dispatcher.run(channels, sink).await {
        Ok(outcome) => outcome,
        Err(e) => {
            workers.abort_all();
            return Err(e);
        }
    };

    while let Some(joined) = workers.join_next().await {
        match joined {
            Ok((tag, Ok(stats))) => {
                tracing::debug!("Worker '{}' exited after {} units", tag, stats.units);
            }
            Ok((tag, Err(e))) => {
                tracing::debug!("Worker '{}' failed: {}", tag, e);
                return Err(e);
            }
            Err(e) => return Err(ClusterError::Task(format!("worker task failed: {}", e))),
        }
    }

    Ok(outcome)
}

/// Runs the role assigned to `rank` in a multi-process group.
pub async fn run_node(
    rank: usize,
    group_size: usize,
    registry: Arc<TransformRegistry>,
    config: &ClusterConfig,
    input: Option<PathBuf>,
) -> Result<NodeOutcome> {
    let table = RoleTable::from_registry(&registry);
    table.validate_group_size(group_size)?;
    let role = table.role(rank)?.clone();

    tracing::info!("Rank {} of {} is {}", rank, group_size, role);

    match role {
        Role::Dispatcher => {
            let input = input.ok_or_else(|| {
                ClusterError::Startup(format!("{}: Input file not provided", role))
            })?;
            let source = InputSource::file(&input);
            source.validate()?;
            check_output_path(config, &input).await?;

            let mut channels = HashMap::new();
            for (worker_rank, tag) in table.workers() {
                let addr = config.worker_addr(worker_rank)?;
                let channel = Channel::<TcpStream>::connect(
                    addr,
                    format!("dispatcher->{}", tag),
                    config.conversation,
                    config.connect_attempts,
                    config.connect_backoff(),
                )
                .await?;
                channels.insert(tag.clone(), channel);
            }

            let sink = open_sink(config, &input).await?;
            let (_, report) = Dispatcher::new(registry, source).run(channels, sink).await?;
            Ok(NodeOutcome::Dispatched(report))
        }
        Role::Worker { tag, name } => {
            let entry = registry
                .get(tag.as_str())
                .cloned()
                .ok_or_else(|| ClusterError::Startup(format!("'{}' is not registered", tag)))?;

            let addr = config.worker_addr(rank)?;
            let listener = TcpListener::bind(addr).await.map_err(|e| {
                ClusterError::Startup(format!("{} worker cannot bind {}: {}", name, addr, e))
            })?;
            tracing::info!("{} worker listening on {}", name, addr);

            let channel = Channel::<TcpStream>::accept(
                &listener,
                format!("{}->dispatcher", tag),
                config.conversation,
            )
            .await?;

            let stats = Worker::new(entry, channel, chunk_pool(config)).run().await?;
            Ok(NodeOutcome::Served { tag, stats })
        }
    }
}
