//! Ordered emission state shared by the reader tasks.
//!
//! The dispatcher owns one `EmissionContext` per run and hands every reader an
//! `Arc` to it. The order ledger is written once, by the designated reader,
//! before the first barrier rendezvous; after that it is read-only. During
//! emission the barrier pair guarantees a single writer per step: the
//! designated reader publishes the current tag, everyone rendezvous, the owner
//! of that tag writes, everyone rendezvous again.

use crate::error::{ClusterError, Result};
use crate::unit::{Tag, Unit};

use std::sync::OnceLock;
use std::sync::atomic::{AtomicUsize, Ordering};
use tokio::io::{AsyncWrite, AsyncWriteExt};
use tokio::sync::{Barrier, Mutex, RwLock};

/// Genres of every unit in input encounter order.
#[derive(Debug, Default)]
pub struct OrderLedger {
    entries: OnceLock<Vec<Tag>>,
}

impl OrderLedger {
    pub fn new() -> Self {
        Self::default()
    }

    /// Publishes the ledger. It can only be written once per run.
    pub fn seal(&self, entries: Vec<Tag>) -> Result<()> {
        self.entries
            .set(entries)
            .map_err(|_| ClusterError::Task("order ledger sealed twice".to_string()))
    }

    pub fn entries(&self) -> Result<&[Tag]> {
        self.entries
            .get()
            .map(Vec::as_slice)
            .ok_or_else(|| ClusterError::Task("order ledger read before it was sealed".to_string()))
    }
}

pub struct EmissionContext<W> {
    barrier: Barrier,
    participants: usize,
    ledger: OrderLedger,
    current: RwLock<Option<Tag>>,
    sink: Mutex<W>,
    emitted: AtomicUsize,
}

impl<W> EmissionContext<W>
where
    W: AsyncWrite + Unpin + Send,
{
    pub fn new(participants: usize, sink: W) -> Self {
        Self {
            barrier: Barrier::new(participants),
            participants,
            ledger: OrderLedger::new(),
            current: RwLock::new(None),
            sink: Mutex::new(sink),
            emitted: AtomicUsize::new(0),
        }
    }

    pub fn participants(&self) -> usize {
        self.participants
    }

    pub fn ledger(&self) -> &OrderLedger {
        &self.ledger
    }

    /// Blocks until every reader task has arrived.
    pub async fn rendezvous(&self) {
        self.barrier.wait().await;
    }

    pub async fn set_current(&self, tag: &Tag) {
        *self.current.write().await = Some(tag.clone());
    }

    pub async fn current(&self) -> Option<Tag> {
        self.current.read().await.clone()
    }

    /// Writes one unit, followed by a blank separator line unless it is the last.
    pub async fn emit(&self, unit: &Unit, separator: bool) -> Result<()> {
        let mut rendered = String::new();
        unit.render_into(&mut rendered);
        if separator {
            rendered.push('\n');
        }

        let mut sink = self.sink.lock().await;
        sink.write_all(rendered.as_bytes()).await?;
        self.emitted.fetch_add(1, Ordering::SeqCst);

        Ok(())
    }

    pub fn emitted(&self) -> usize {
        self.emitted.load(Ordering::SeqCst)
    }

    /// Flushes and returns the sink once the run is over.
    pub async fn into_sink(self) -> Result<W> {
        let mut sink = self.sink.into_inner();
        sink.flush().await?;
        Ok(sink)
    }
}
