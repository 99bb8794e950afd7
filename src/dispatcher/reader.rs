//! Per-genre reader task.
//!
//! Each reader scans the whole corpus, round-trips the units of its own genre
//! through that genre's worker, and keeps the replies in a local FIFO. Once the
//! scan is over it joins the other readers in the barrier-gated emission.

use super::emission::EmissionContext;
use super::input::{InputSource, UnitScanner};
use crate::channel::Channel;
use crate::error::{ClusterError, Result};
use crate::transform::TransformRegistry;
use crate::unit::{Tag, Unit};

use std::collections::VecDeque;
use std::sync::Arc;
use tokio::io::{AsyncRead, AsyncWrite};

pub struct Reader<S, W> {
    pub tag: Tag,
    /// The designated reader records the order ledger and publishes the
    /// current emission tag.
    pub designated: bool,
    pub channel: Channel<S>,
    pub source: InputSource,
    pub registry: Arc<TransformRegistry>,
    pub context: Arc<EmissionContext<W>>,
}

impl<S, W> Reader<S, W>
where
    S: AsyncRead + AsyncWrite + Unpin,
    W: AsyncWrite + Unpin + Send,
{
    /// Runs scan, routing and emission; returns how many units this reader wrote.
    pub async fn run(mut self) -> Result<usize> {
        let queue = self.route().await?;

        tracing::debug!(
            "Reader '{}' finished scanning with {} processed units",
            self.tag,
            queue.len()
        );

        let Reader {
            tag,
            designated,
            context,
            ..
        } = self;
        emit_in_order(&tag, designated, &context, queue).await
    }

    async fn route(&mut self) -> Result<VecDeque<Unit>> {
        let reader = self.source.open().await?;
        let mut scanner = UnitScanner::new(reader, self.registry.clone(), self.source.clone());
        let mut queue = VecDeque::new();
        let mut order = Vec::new();

        while let Some(unit) = scanner.next_unit().await? {
            if self.designated {
                order.push(unit.tag());
            }

            if unit.header != self.tag.as_str() {
                continue;
            }

            let reply = self.channel.round_trip(&unit).await?;
            self.check_reply(&unit, &reply)?;

            tracing::trace!("Reader '{}' queued unit #{}", self.tag, queue.len() + 1);
            queue.push_back(reply);
        }

        self.channel.send_end().await?;

        if self.designated {
            tracing::debug!("Order ledger holds {} units", order.len());
            self.context.ledger().seal(order)?;
        }

        Ok(queue)
    }

    fn check_reply(&self, sent: &Unit, reply: &Unit) -> Result<()> {
        if reply.header != sent.header {
            return Err(ClusterError::protocol(
                self.channel.endpoint(),
                format!("reply header '{}' does not match '{}'", reply.header, sent.header),
            ));
        }

        if reply.lines.len() != sent.lines.len() {
            return Err(ClusterError::protocol(
                self.channel.endpoint(),
                format!(
                    "reply has {} lines, expected {}",
                    reply.lines.len(),
                    sent.lines.len()
                ),
            ));
        }

        Ok(())
    }
}

/// Barrier-gated emission, run by every reader together.
async fn emit_in_order<W>(
    tag: &Tag,
    designated: bool,
    context: &EmissionContext<W>,
    mut queue: VecDeque<Unit>,
) -> Result<usize>
where
    W: AsyncWrite + Unpin + Send,
{
    // Nobody reads the ledger until the designated reader has sealed it.
    context.rendezvous().await;

    let ledger = context.ledger().entries()?;
    let mut written = 0;

    for (idx, current) in ledger.iter().enumerate() {
        if designated {
            context.set_current(current).await;
        }

        context.rendezvous().await;

        if context.current().await.as_ref() == Some(tag) {
            let unit = queue.pop_front().ok_or_else(|| {
                ClusterError::Task(format!(
                    "reader '{}' has no unit left for ledger position {}",
                    tag, idx
                ))
            })?;
            context.emit(&unit, idx + 1 < ledger.len()).await?;
            written += 1;
        }

        context.rendezvous().await;
    }

    if !queue.is_empty() {
        return Err(ClusterError::Task(format!(
            "reader '{}' still holds {} units after emission",
            tag,
            queue.len()
        )));
    }

    Ok(written)
}
