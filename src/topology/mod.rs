//! Topology Module
//!
//! Decides which role a process plays and wires the channels between roles.
//!
//! ## Submodules
//! - **`types`**: `Role` and the validated rank -> role `RoleTable`, derived from
//!   the transform registry so the worker count always equals the genre count.
//! - **`launcher`**: Brings up a whole group in one process, or a single node of a
//!   multi-process group over TCP.

pub mod launcher;
pub mod types;

pub use launcher::{NodeOutcome, OutputSink, check_output_path, open_sink, run_local, run_node};
pub use types::{DISPATCHER_RANK, Role, RoleTable};

#[cfg(test)]
mod tests;
