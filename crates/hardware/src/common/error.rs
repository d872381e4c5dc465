//! Trap and core-internal error definitions.
//!
//! This module defines the error handling used throughout the hart. It provides:
//! 1. **Trap Representation:** every architectural exception and interrupt cause
//!    that can be delivered to software through the Trap Engine.
//! 2. **Core Errors:** failures that never reach guest software (bad boot-time
//!    configuration, malformed remap tables) and abort emulation instead.

use thiserror::Error;

/// Architectural trap delivered to software through the Trap Engine.
///
/// Each synchronous exception carries the faulting address or instruction
/// encoding; interrupts carry none since their cause number already
/// identifies the source. `cause()` returns the `mcause`/`scause`
/// `ExceptionCode` field (without the interrupt bit, which the Trap Engine
/// sets separately).
#[derive(Clone, Copy, Debug, PartialEq, Eq, Error)]
pub enum Trap {
    /// Instruction address misaligned. Faulting virtual address.
    #[error("instruction address misaligned ({0:#x})")]
    InstructionAddressMisaligned(u64),
    /// Instruction access fault. Faulting virtual address.
    #[error("instruction access fault ({0:#x})")]
    InstructionAccessFault(u64),
    /// Illegal instruction. Raw encoding, or 0 if not yet decoded.
    #[error("illegal instruction ({0:#010x})")]
    IllegalInstruction(u32),
    /// Breakpoint, from `ebreak` or a trigger with `action=0`.
    #[error("breakpoint at {0:#x}")]
    Breakpoint(u64),
    /// Load address misaligned. Faulting virtual address.
    #[error("load address misaligned ({0:#x})")]
    LoadAddressMisaligned(u64),
    /// Load access fault. Faulting virtual address.
    #[error("load access fault ({0:#x})")]
    LoadAccessFault(u64),
    /// Store/AMO address misaligned. Faulting virtual address.
    #[error("store/amo address misaligned ({0:#x})")]
    StoreAmoAddressMisaligned(u64),
    /// Store/AMO access fault. Faulting virtual address.
    #[error("store/amo access fault ({0:#x})")]
    StoreAmoAccessFault(u64),
    /// `ecall` from U-mode.
    #[error("environment call from U-mode")]
    EnvironmentCallFromUMode,
    /// `ecall` from S/HS-mode.
    #[error("environment call from S-mode")]
    EnvironmentCallFromSMode,
    /// `ecall` from VS-mode.
    #[error("environment call from VS-mode")]
    EnvironmentCallFromVSMode,
    /// `ecall` from M-mode.
    #[error("environment call from M-mode")]
    EnvironmentCallFromMMode,
    /// Instruction page fault. Faulting virtual address.
    #[error("instruction page fault ({0:#x})")]
    InstructionPageFault(u64),
    /// Load page fault. Faulting virtual address.
    #[error("load page fault ({0:#x})")]
    LoadPageFault(u64),
    /// Store/AMO page fault. Faulting virtual address.
    #[error("store/amo page fault ({0:#x})")]
    StoreAmoPageFault(u64),
    /// Instruction guest-page fault (two-stage translation, H extension).
    #[error("instruction guest-page fault ({0:#x})")]
    InstructionGuestPageFault(u64),
    /// Load guest-page fault.
    #[error("load guest-page fault ({0:#x})")]
    LoadGuestPageFault(u64),
    /// Virtual instruction exception (legal CSR, blocked only because mode is virtual).
    #[error("virtual instruction ({0:#010x})")]
    VirtualInstruction(u32),
    /// Store/AMO guest-page fault.
    #[error("store/amo guest-page fault ({0:#x})")]
    StoreAmoGuestPageFault(u64),
    /// Interrupt cause, already resolved by the Interrupt Controller. Holds
    /// the raw `ExceptionCode` (without the interrupt bit).
    #[error("interrupt cause {0}")]
    Interrupt(u64),
}

impl Trap {
    /// The `ExceptionCode` field this trap writes into `xcause`, without the
    /// interrupt bit (the Trap Engine sets that bit itself for `Interrupt`).
    #[must_use]
    pub const fn code(self) -> u64 {
        match self {
            Self::InstructionAddressMisaligned(_) => 0,
            Self::InstructionAccessFault(_) => 1,
            Self::IllegalInstruction(_) => 2,
            Self::Breakpoint(_) => 3,
            Self::LoadAddressMisaligned(_) => 4,
            Self::LoadAccessFault(_) => 5,
            Self::StoreAmoAddressMisaligned(_) => 6,
            Self::StoreAmoAccessFault(_) => 7,
            Self::EnvironmentCallFromUMode => 8,
            Self::EnvironmentCallFromSMode => 9,
            Self::EnvironmentCallFromVSMode => 10,
            Self::EnvironmentCallFromMMode => 11,
            Self::InstructionPageFault(_) => 12,
            Self::LoadPageFault(_) => 13,
            Self::StoreAmoPageFault(_) => 15,
            Self::InstructionGuestPageFault(_) => 20,
            Self::VirtualInstruction(_) => 22,
            Self::LoadGuestPageFault(_) => 21,
            Self::StoreAmoGuestPageFault(_) => 23,
            Self::Interrupt(cause) => cause,
        }
    }

    /// The value that should be latched into `xtval` for this trap, or 0 if
    /// the hart is configured to zero `tval` on every entry.
    #[must_use]
    pub const fn tval(self) -> u64 {
        match self {
            Self::InstructionAddressMisaligned(a)
            | Self::InstructionAccessFault(a)
            | Self::Breakpoint(a)
            | Self::LoadAddressMisaligned(a)
            | Self::LoadAccessFault(a)
            | Self::StoreAmoAddressMisaligned(a)
            | Self::StoreAmoAccessFault(a)
            | Self::InstructionPageFault(a)
            | Self::LoadPageFault(a)
            | Self::StoreAmoPageFault(a)
            | Self::InstructionGuestPageFault(a)
            | Self::LoadGuestPageFault(a)
            | Self::StoreAmoGuestPageFault(a) => a,
            Self::IllegalInstruction(i) | Self::VirtualInstruction(i) => i as u64,
            Self::EnvironmentCallFromUMode
            | Self::EnvironmentCallFromSMode
            | Self::EnvironmentCallFromVSMode
            | Self::EnvironmentCallFromMMode
            | Self::Interrupt(_) => 0,
        }
    }

    /// Whether this trap is an interrupt (sets `xcause.Interrupt`).
    #[must_use]
    pub const fn is_interrupt(self) -> bool {
        matches!(self, Self::Interrupt(_))
    }
}

/// Internal failure that never reaches guest software.
///
/// These abort the surrounding emulation session rather than being delivered
/// as an architectural trap.
#[derive(Clone, Debug, PartialEq, Eq, Error)]
pub enum CoreError {
    /// Boot-time configuration was self-contradictory (e.g. an extension
    /// requires a feature the configuration disables).
    #[error("fatal configuration error: {0}")]
    FatalConfig(String),
    /// A CSR remap entry referenced a CSR name that is not implemented.
    #[error("csr remap: unknown csr name {0:?}")]
    UnknownRemapName(String),
    /// A CSR remap entry's address could not be parsed.
    #[error("csr remap: malformed address {0:?}")]
    MalformedRemapAddress(String),
    /// A trigger index passed by a debug-module caller is out of range.
    #[error("trigger index {0} out of range (have {1})")]
    TriggerIndexOutOfRange(usize, usize),
}

/// Outcome of a CSR Registry access-control check (§4.1 step 1-2), prior to
/// invoking storage or a callback. Kept distinct from [`Trap`] so the
/// registry can report *why* an access was rejected without committing to
/// which architectural trap variant results; the caller (the CSR dispatch
/// in `Hart`) maps each reason onto `IllegalInstruction`/`VirtualInstruction`.
#[derive(Clone, Copy, Debug, PartialEq, Eq)]
pub enum CsrAccessFault {
    /// The CSR does not exist, is write-only-and-accessed-as-read, or the
    /// decoded minimum mode exceeds the current privilege.
    Illegal,
    /// The CSR exists and would be legal in non-virtual operation, but the
    /// current mode is virtual and the CSR is the non-virtual counterpart
    /// of a hypervisor-aliased register, or an `Smstateen`/`henvcfg` bit
    /// gates it at the hypervisor level.
    Virtual,
}
