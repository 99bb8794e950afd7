//! The dispatcher role.
//!
//! Spawns one reader per registered genre, each bound to the channel of the
//! worker owning that genre, and waits for all of them. The first reader to
//! fail aborts the others: a failed reader would otherwise leave its peers
//! parked on the barrier forever.

use super::emission::EmissionContext;
use super::input::InputSource;
use super::reader::Reader;
use crate::channel::Channel;
use crate::error::{ClusterError, Result};
use crate::transform::TransformRegistry;
use crate::unit::Tag;

use std::collections::HashMap;
use std::sync::Arc;
use tokio::io::{AsyncRead, AsyncWrite};
use tokio::task::JoinSet;

/// Summary of a finished run.
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct DispatchReport {
    /// Units written to the sink, equal to the ledger length.
    pub units: usize,
    /// Units written per genre, in registry order.
    pub per_tag: Vec<(Tag, usize)>,
}

pub struct Dispatcher {
    registry: Arc<TransformRegistry>,
    source: InputSource,
}

impl Dispatcher {
    pub fn new(registry: Arc<TransformRegistry>, source: InputSource) -> Self {
        Self { registry, source }
    }

    /// Processes the whole corpus and writes it, in input order, to `sink`.
    ///
    /// `channels` must hold exactly one channel per registered genre.
    pub async fn run<S, W>(
        &self,
        mut channels: HashMap<Tag, Channel<S>>,
        sink: W,
    ) -> Result<(W, DispatchReport)>
    where
        S: AsyncRead + AsyncWrite + Unpin + Send + 'static,
        W: AsyncWrite + Unpin + Send + 'static,
    {
        self.source.validate()?;

        if self.registry.is_empty() {
            return Err(ClusterError::Startup("no genres registered".to_string()));
        }
        if channels.len() != self.registry.len() {
            return Err(ClusterError::Startup(format!(
                "expected {} worker channels, got {}",
                self.registry.len(),
                channels.len()
            )));
        }

        let context = Arc::new(EmissionContext::new(self.registry.len(), sink));
        let mut readers = JoinSet::new();

        for (position, entry) in self.registry.entries().iter().enumerate() {
            let channel = channels.remove(&entry.tag).ok_or_else(|| {
                ClusterError::Startup(format!("no worker channel for '{}'", entry.tag))
            })?;

            let reader = Reader {
                tag: entry.tag.clone(),
                designated: position == 0,
                channel,
                source: self.source.clone(),
                registry: self.registry.clone(),
                context: context.clone(),
            };

            let tag = entry.tag.clone();
            readers.spawn(async move { (tag, reader.run().await) });
        }

        tracing::info!(
            "Dispatcher started {} readers ({} barrier participants)",
            readers.len(),
            context.participants()
        );

        let mut written: HashMap<Tag, usize> = HashMap::new();
        while let Some(joined) = readers.join_next().await {
            match joined {
                Ok((tag, Ok(count))) => {
                    tracing::debug!("Reader '{}' wrote {} units", tag, count);
                    written.insert(tag, count);
                }
                Ok((tag, Err(e))) => {
                    tracing::debug!("Reader '{}' failed, aborting run: {}", tag, e);
                    readers.abort_all();
                    return Err(e);
                }
                Err(e) => {
                    readers.abort_all();
                    return Err(ClusterError::Task(format!("reader task failed: {}", e)));
                }
            }
        }

        let report = DispatchReport {
            units: context.emitted(),
            per_tag: self
                .registry
                .tags()
                .map(|tag| (tag.clone(), written.get(tag).copied().unwrap_or(0)))
                .collect(),
        };

        let context = Arc::try_unwrap(context).map_err(|_| {
            ClusterError::Task("emission context still shared after all readers finished".to_string())
        })?;
        let sink = context.into_sink().await?;

        tracing::info!("Dispatcher emitted {} units", report.units);
        Ok((sink, report))
    }
}
