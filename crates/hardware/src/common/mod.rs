//! Common utilities and types used throughout the hart control-plane core.
//!
//! This module provides fundamental building blocks shared across all
//! components of the core. It includes:
//! 1. **Address Types:** Strong types for virtual and physical addresses.
//! 2. **Constants:** Delegation bit positions and AIA priority-array shape.
//! 3. **Memory Access:** Definitions for categorizing memory operations (Fetch/Read/Write).
//! 4. **Error Handling:** Trap representations and core-internal error types.

/// Address type definitions (physical and virtual addresses).
pub mod addr;

/// Delegation bit positions and AIA priority-array constants.
pub mod constants;

/// Memory access type definitions.
pub mod data;

/// Error types and trap definitions.
pub mod error;

pub use addr::{PhysAddr, VirtAddr};
pub use data::AccessType;
pub use error::{CoreError, CsrAccessFault, Trap};

