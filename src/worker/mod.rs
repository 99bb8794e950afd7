//! Worker Module
//!
//! One worker process (or task, in local mode) per genre.
//!
//! ## Lifecycle
//! 1. **Receive**: Block on the channel until the dispatcher sends a unit.
//! 2. **Chunk**: Cut the body into fixed-size line chunks.
//! 3. **Transform**: Rewrite chunks on a bounded pool of blocking tasks.
//! 4. **Reply**: Reassemble header and lines, send them back on the same channel.
//! 5. **Stop**: Exit when the terminator frame arrives.
//!
//! ## Submodules
//! - **`pool`**: The semaphore-bounded chunk pool.
//! - **`service`**: The receive/reply loop.

pub mod pool;
pub mod service;

pub use pool::{ChunkPool, DEFAULT_CHUNK_LINES, default_pool_size};
pub use service::{Worker, WorkerStats};
