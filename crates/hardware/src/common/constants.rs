//! Global architectural constants.
//!
//! Shared bit positions and masks used by the interrupt controller and trap
//! engine. Memory-layout and instruction-decode constants belong to the
//! external memory/decode collaborators and are not duplicated here.

/// Bit mask indicating that a trap cause (`xcause`) represents an interrupt.
pub const CAUSE_INTERRUPT_BIT: u64 = 1 << 63;

/// Bit position for supervisor software interrupt delegation in `mideleg`.
pub const DELEG_SSIP_BIT: u64 = 1;
/// Bit position for machine software interrupt delegation in `mideleg`.
pub const DELEG_MSIP_BIT: u64 = 3;
/// Bit position for supervisor timer interrupt delegation in `mideleg`.
pub const DELEG_STIP_BIT: u64 = 5;
/// Bit position for machine timer interrupt delegation in `mideleg`.
pub const DELEG_MTIP_BIT: u64 = 7;
/// Bit position for supervisor external interrupt delegation in `mideleg`.
pub const DELEG_SEIP_BIT: u64 = 9;
/// Bit position for machine external interrupt delegation in `mideleg`.
pub const DELEG_MEIP_BIT: u64 = 11;
/// Bit position for VS-mode software interrupt in `hideleg`/`mip`.
pub const DELEG_VSSIP_BIT: u64 = 2;
/// Bit position for VS-mode timer interrupt in `hideleg`/`mip`.
pub const DELEG_VSTIP_BIT: u64 = 6;
/// Bit position for VS-mode external interrupt in `hideleg`/`mip`.
pub const DELEG_VSEIP_BIT: u64 = 10;
/// Bit position for supervisor guest external interrupt in `mip`.
pub const DELEG_SGEIP_BIT: u64 = 12;

/// Number of entries in an AIA per-privilege interrupt-priority array
/// (`miprio`/`siprio`/`vsiprio`), one per architectural cause 0..63.
pub const AIA_IPRIO_NUM: usize = 64;

/// Default `xiprio` value used for a cause with no explicit priority write,
/// per the Smaia specification ("the default priority is 1 less than the
/// number of the lowest-numbered standard local interrupt").
pub const AIA_IPRIO_DEFAULT: u8 = 0;
