//! Transform Module
//!
//! Pure, stateless line rewrites, one per genre.
//!
//! ## Submodules
//! - **`rules`**: The word-level rewrites themselves (doubling, alternating case,
//!   title case, periodic reverse).
//! - **`registry`**: Maps header names to rewrites; the registry size decides how
//!   many workers the group has.

pub mod registry;
pub mod rules;

pub use registry::{TagEntry, TransformFn, TransformRegistry};
