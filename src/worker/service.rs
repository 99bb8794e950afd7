//! Genre worker.
//!
//! Serves one genre for the lifetime of the group: receives a unit from the
//! dispatcher, rewrites its body through the chunk pool, and sends the result
//! back on the same channel. The dispatcher never has more than one unit in
//! flight per genre, so the loop is strictly request then reply.

use super::pool::ChunkPool;
use crate::channel::Channel;
use crate::error::{ClusterError, Result};
use crate::transform::TagEntry;
use crate::unit::Unit;

use tokio::io::{AsyncRead, AsyncWrite};

/// Totals reported when the dispatcher closes the conversation.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq)]
pub struct WorkerStats {
    pub units: usize,
    pub lines: usize,
}

pub struct Worker<S> {
    entry: TagEntry,
    channel: Channel<S>,
    pool: ChunkPool,
}

impl<S> Worker<S>
where
    S: AsyncRead + AsyncWrite + Unpin,
{
    pub fn new(entry: TagEntry, channel: Channel<S>, pool: ChunkPool) -> Self {
        Self {
            entry,
            channel,
            pool,
        }
    }

    /// Serves units until the terminator arrives.
    pub async fn run(mut self) -> Result<WorkerStats> {
        tracing::info!(
            "{} worker serving '{}' (pool size {}, {} lines per chunk)",
            self.entry.role,
            self.entry.tag,
            self.pool.size(),
            self.pool.chunk_lines()
        );

        let mut stats = WorkerStats::default();

        while let Some(unit) = self.channel.receive_unit().await? {
            let line_count = unit.lines.len();
            let reply = self.process(unit).await?;
            self.channel.send_unit(&reply).await?;

            stats.units += 1;
            stats.lines += line_count;
            tracing::debug!(
                "{} worker replied to unit #{} ({} lines)",
                self.entry.role,
                stats.units,
                line_count
            );
        }

        tracing::info!(
            "{} worker finished: {} units, {} lines",
            self.entry.role,
            stats.units,
            stats.lines
        );

        Ok(stats)
    }

    /// Rewrites the body of `unit`; the header is kept verbatim.
    pub async fn process(&self, unit: Unit) -> Result<Unit> {
        if unit.header != self.entry.tag.as_str() {
            return Err(ClusterError::protocol(
                self.channel.endpoint(),
                format!(
                    "unit '{}' routed to the '{}' worker",
                    unit.header, self.entry.tag
                ),
            ));
        }

        let lines = self
            .pool
            .run(unit.lines, self.entry.transform.clone())
            .await?;

        Ok(Unit::new(unit.header, lines))
    }
}
