//! Dispatcher Module
//!
//! The coordinating role: owns the input corpus, routes units to the workers by
//! genre, and writes the transformed corpus back out in its original order.
//!
//! ## Architecture Overview
//! 1. **Scan**: One reader task per genre scans the full input independently and
//!    picks out the units of its own genre.
//! 2. **Round trip**: Each picked unit is sent to that genre's worker; the reader
//!    blocks until the reply arrives and queues it locally.
//! 3. **Ledger**: The designated reader (first genre in the registry) also records
//!    the genre of every unit it sees, in encounter order.
//! 4. **Emission**: All readers walk the ledger together. For every position the
//!    designated reader publishes the current genre, a barrier makes it visible,
//!    the owning reader writes its next queued unit, and a second barrier holds
//!    everyone until the write is done.
//!
//! ## Submodules
//! - **`input`**: Input sources and unit segmentation.
//! - **`emission`**: Order ledger, barrier and sink shared by the readers.
//! - **`reader`**: The per-genre reader task.
//! - **`service`**: Startup, task supervision and the run report.

pub mod emission;
pub mod input;
pub mod reader;
pub mod service;

pub use emission::{EmissionContext, OrderLedger};
pub use input::{InputSource, UnitScanner};
pub use service::{DispatchReport, Dispatcher};
