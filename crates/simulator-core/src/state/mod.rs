//! Architectural state owned by a simulator instance.

/// Register identifiers and the register file.
pub mod registers;
/// Trap classification attached to retired instructions.
pub mod trap;

pub use registers::{RegisterFile, RegisterId};
pub use trap::Trap;
