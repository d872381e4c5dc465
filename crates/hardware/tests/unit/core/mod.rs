//! Unit tests for the architectural core: the XLEN & Mode Manager, the
//! Interrupt Controller, the Trigger Engine, the Debug Module, the Trap
//! Engine, the CSR Registry, and the [`Hart`] state machine that
//! assembles them.
//!
//! [`Hart`]: riscv_hart_core::core::hart::Hart

/// Tests for the standalone architectural sub-engines (`core/arch/`).
pub mod arch;

/// Tests for the CSR Registry as exercised through [`Hart::csr_read`]/
/// `csr_write` (`core/arch/csr/`, `core/hart/csr.rs`).
///
/// [`Hart::csr_read`]: riscv_hart_core::core::hart::Hart::csr_read
pub mod csr;

/// Tests for the [`Hart`] state machine itself: suspension points, net
/// ports, the fetch-hook priority checklist, and snapshot/restore.
///
/// [`Hart`]: riscv_hart_core::core::hart::Hart
pub mod hart;
