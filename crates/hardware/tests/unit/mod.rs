//! # Unit Components
//!
//! This module serves as the central hub for the various control-plane
//! components under test: shared data structures, boot-time configuration,
//! and the architectural core itself (CSR registry, mode manager, interrupt
//! controller, trap engine, trigger engine, debug module).

/// Unit tests for common RISC-V data structures.
///
/// This module includes tests for address arithmetic and other shared data
/// structures used across the control plane.
pub mod common;

/// Unit tests for boot-time hart configuration and its JSON deserialization.
pub mod config;

/// Core definitions and fundamental logic for the architectural core.
///
/// This module provides tests for the CSR registry, mode manager, interrupt
/// controller, trap engine, trigger engine, and debug module.
pub mod core;
