//! Genre Cluster Library
//!
//! This library crate defines the modules of a tag-routed text corpus processor.
//! It serves as the foundation for the binary executable (`main.rs`).
//!
//! A corpus is a sequence of units: a header line naming a genre, followed by body
//! lines up to a blank line. One dispatcher routes every unit to the worker of its
//! genre, and writes the rewritten units back out in their original input order.
//!
//! ## Architecture Modules
//! - **`unit`**: The unit and genre tag types, and their wire encoding.
//! - **`transform`**: The per-genre line rewriting rules and the registry that binds
//!   each genre to its rule and role name.
//! - **`channel`**: Framed point-to-point messaging over TCP or in-memory pipes.
//! - **`worker`**: The genre worker loop and the bounded chunk pool it rewrites
//!   bodies with.
//! - **`dispatcher`**: Input scanning, per-genre reader tasks, and barrier-gated
//!   ordered emission.
//! - **`topology`**: Rank to role assignment and group bootstrap.
//! - **`config`**: Runtime configuration (TOML file plus defaults).
//! - **`error`**: The crate-wide error type.

pub mod channel;
pub mod config;
pub mod dispatcher;
pub mod error;
pub mod topology;
pub mod transform;
pub mod unit;
pub mod worker;

pub use error::{ClusterError, Result};
