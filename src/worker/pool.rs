//! Bounded chunk pool.
//!
//! A unit's body is cut into contiguous chunks of at most `chunk_lines` lines.
//! Each chunk is rewritten on the blocking thread pool; a semaphore caps how many
//! chunks are in flight at once. Chunks own disjoint line ranges, so the only
//! synchronization is the permit and the ordered join at the end.

use crate::error::{ClusterError, Result};
use crate::transform::TransformFn;

use std::sync::Arc;
use tokio::sync::Semaphore;

/// Lines per chunk unless configured otherwise.
pub const DEFAULT_CHUNK_LINES: usize = 20;

/// One less than the available hardware parallelism, never below one.
pub fn default_pool_size() -> usize {
    std::thread::available_parallelism()
        .map(|n| n.get())
        .unwrap_or(1)
        .saturating_sub(1)
        .max(1)
}

pub struct ChunkPool {
    chunk_lines: usize,
    size: usize,
    permits: Arc<Semaphore>,
}

impl ChunkPool {
    pub fn new(chunk_lines: usize, size: usize) -> Self {
        let chunk_lines = chunk_lines.max(1);
        let size = size.max(1);

        Self {
            chunk_lines,
            size,
            permits: Arc::new(Semaphore::new(size)),
        }
    }

    pub fn size(&self) -> usize {
        self.size
    }

    pub fn chunk_lines(&self) -> usize {
        self.chunk_lines
    }

    /// Splits `lines` into chunks, preserving order.
    pub fn split(&self, lines: Vec<String>) -> Vec<Vec<String>> {
        let mut chunks = Vec::with_capacity(lines.len().div_ceil(self.chunk_lines));
        let mut remaining = lines.into_iter();

        loop {
            let chunk: Vec<String> = remaining.by_ref().take(self.chunk_lines).collect();
            if chunk.is_empty() {
                break;
            }
            chunks.push(chunk);
        }

        chunks
    }

    /// Rewrites every line with `transform`, at most `size` chunks at a time.
    ///
    /// The output has the same length and order as the input.
    pub async fn run(&self, lines: Vec<String>, transform: TransformFn) -> Result<Vec<String>> {
        let line_count = lines.len();
        let chunks = self.split(lines);
        let mut handles = Vec::with_capacity(chunks.len());

        tracing::trace!(
            "Processing {} lines in {} chunks (pool size {})",
            line_count,
            chunks.len(),
            self.size
        );

        for mut chunk in chunks {
            let permit = self
                .permits
                .clone()
                .acquire_owned()
                .await
                .map_err(|e| ClusterError::Task(format!("chunk pool closed: {}", e)))?;
            let transform = transform.clone();

            handles.push(tokio::task::spawn_blocking(move || {
                let _permit = permit;
                for line in chunk.iter_mut() {
                    *line = transform(line);
                }
                chunk
            }));
        }

        let mut transformed = Vec::with_capacity(line_count);
        for handle in handles {
            let chunk = handle
                .await
                .map_err(|e| ClusterError::Task(format!("chunk task failed: {}", e)))?;
            transformed.extend(chunk);
        }

        Ok(transformed)
    }
}

impl Default for ChunkPool {
    fn default() -> Self {
        Self::new(DEFAULT_CHUNK_LINES, default_pool_size())
    }
}
