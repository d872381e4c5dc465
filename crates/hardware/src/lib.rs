//! RISC-V hart control-plane core.
//!
//! This crate implements the privilege-mode, CSR, trap, and debug control
//! plane of a RISC-V hart:
//! 1. **Common:** address types, access-type classification, traps and
//!    core-internal errors.
//! 2. **Config:** boot-time hart configuration (ISA, interrupt, debug).
//! 3. **Collab:** named collaborator interfaces for everything this crate
//!    treats as external (memory domain, decoder, morph/JIT, CSR bus,
//!    per-hart extension hooks, net ports).
//! 4. **Core:** the architectural components (CSR registry, mode manager,
//!    interrupt controller, trap engine, trigger engine, debug module) and
//!    the `Hart` that assembles them into the per-hart state machine a
//!    driving pipeline advances one instruction at a time.

/// Collaborator interfaces this crate consumes from or exposes to external
/// components (memory domain, decoder, morph/JIT, CSR bus, net ports).
pub mod collab;
/// Common types shared across the crate (addresses, access types, errors).
pub mod common;
/// Boot-time hart configuration.
pub mod config;
/// Architectural control-plane components and the `Hart` state machine.
pub mod core;

/// Root configuration type; use `HartConfig::default()` or deserialize from JSON.
pub use crate::config::HartConfig;
/// The per-hart control-plane state machine.
pub use crate::core::Hart;
