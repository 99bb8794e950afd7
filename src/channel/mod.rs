//! Channel Module
//!
//! Reliable, ordered, blocking transport between the dispatcher and one worker.
//!
//! ## Submodules
//! - **`frame`**: The length-prefixed wire format. Payload size travels with the
//!   payload, so a receiver always knows how much to read, and the terminator
//!   is a distinct frame kind rather than an empty payload.
//! - **`transport`**: The `Channel` itself, generic over the byte stream, plus
//!   TCP connect/accept helpers and in-process pairs.

pub mod frame;
pub mod transport;

pub use frame::Frame;
pub use transport::{Channel, local_pair};
