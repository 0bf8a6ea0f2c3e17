//! Foundational types shared by every Ember crate.
//!
//! - [`errors`]: the engine-wide error type and `Result` alias
//! - [`vfs`]: the virtual filesystem all asset bytes are read through
//! - [`interner`]: global string interning for marker and node names

pub mod errors;
pub mod interner;
pub mod vfs;

pub use errors::{EmberError, Result};
pub use interner::Symbol;
pub use vfs::{DirectoryVfs, MemoryVfs, Vfs, normalize_path};
