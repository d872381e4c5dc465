//! Hart configuration.
//!
//! Boot-time configuration for the control-plane core, deserializable from
//! JSON via `serde`. Mirrors the nested-sub-config pattern used throughout
//! this crate's ancestry: every leaf has a named default in the [`defaults`]
//! module and a `#[serde(default)]` struct, so a caller can deserialize a
//! partial document and get architecturally sane values for everything
//! else.
//!
//! ```
//! use riscv_hart_core::config::HartConfig;
//!
//! let cfg = HartConfig::default();
//! assert_eq!(cfg.isa.xlen, 64);
//! assert!(cfg.isa.has_extension('i'));
//! ```

use serde::{Deserialize, Serialize};

/// Default values used across this module's `#[serde(default)]` structs.
pub mod defaults {
    /// Default XLEN: RV64.
    pub const XLEN: u8 = 64;
    /// Default implemented extension letters.
    pub const EXTENSIONS: &str = "imafdc";
    /// Default privileged-spec version, as `(major, minor)`.
    pub const PRIV_SPEC: (u8, u8) = (1, 12);
    /// Default number of Sdtrig trigger slots.
    pub const TRIGGER_COUNT: usize = 4;
    /// Default reset vector.
    pub const RESET_VECTOR: u64 = 0x8000_0000;
    /// Default NMI exception vector (RNMI).
    pub const NMI_EXCEPTION_ADDRESS: u64 = 0;
    /// Default debug exception redirect address.
    pub const DEXC_ADDRESS: u64 = 0x800;
    /// Default `wfi`-under-`mstatus.TW`/`hstatus.VTW` timeout, in cycles.
    /// Zero means the trap is taken immediately rather than after a delay.
    pub const WFI_TW_TIMEOUT_CYCLES: u64 = 0;
    /// Default unconditional `wrs.sto` timeout, in cycles.
    pub const WRS_STO_TIMEOUT_CYCLES: u64 = 1024;
}

/// ISA/extension configuration: what this hart implements.
#[derive(Clone, Debug, PartialEq, Eq, Serialize, Deserialize)]
#[serde(default)]
pub struct IsaConfig {
    /// Native integer width: 32, 64, or 128.
    pub xlen: u8,
    /// Lower-case extension letters this hart implements (`misa.Extensions`;
    /// multi-letter extensions are named in `extra_extensions`).
    pub extensions: String,
    /// Multi-letter extension names this hart implements (`"Sstc"`,
    /// `"Smstateen"`, `"Zicbom"`, `"Zicboz"`, `"Smepmp"`, `"Ssaia"`, `"Smaia"`,
    /// `"Smrnmi"`, `"Sdtrig"`, `"Sdext"`, …).
    pub extra_extensions: Vec<String>,
    /// Privileged specification version implemented, `(major, minor)`.
    pub priv_spec: (u8, u8),
    /// `true` if S/HS mode is implemented.
    pub has_supervisor: bool,
    /// `true` if U-mode is implemented.
    pub has_user: bool,
    /// `true` if the H extension (two-stage translation, VS/VU) is implemented.
    pub has_hypervisor: bool,
}

impl Default for IsaConfig {
    fn default() -> Self {
        Self {
            xlen: defaults::XLEN,
            extensions: defaults::EXTENSIONS.to_string(),
            extra_extensions: vec!["Sstc".to_string(), "Sdtrig".to_string(), "Sdext".to_string()],
            priv_spec: defaults::PRIV_SPEC,
            has_supervisor: true,
            has_user: true,
            has_hypervisor: false,
        }
    }
}

impl IsaConfig {
    /// `true` if lower-case extension letter `c` is implemented.
    #[must_use]
    pub fn has_extension(&self, c: char) -> bool {
        self.extensions.contains(c.to_ascii_lowercase())
    }

    /// `true` if multi-letter extension `name` is implemented (case-insensitive).
    #[must_use]
    pub fn has_extra(&self, name: &str) -> bool {
        self.extra_extensions.iter().any(|e| e.eq_ignore_ascii_case(name))
    }
}

/// Interrupt-subsystem configuration: which of basic/CLIC/AIA are active
/// and how the NMI path behaves.
#[derive(Clone, Debug, PartialEq, Eq, Serialize, Deserialize)]
#[serde(default)]
pub struct InterruptConfig {
    /// `true` if the CLIC is active (internally or via an external collaborator).
    pub clic_enabled: bool,
    /// `true` if Smaia/Ssaia (AIA) per-cause priority arrays are active.
    pub aia_enabled: bool,
    /// Number of CLIC interrupt levels, if `clic_enabled`.
    pub clic_levels: u16,
    /// `true` if Smrnmi (resumable NMI) is implemented.
    pub rnmi_enabled: bool,
    /// Address jumped to on NMI entry when `rnmi_enabled` is false (fixed vector).
    pub nmi_exception_address: u64,
    /// `true` if `xtval`/`xtval2` are always written zero instead of the
    /// faulting address (a conformant, if less diagnostic, implementation choice).
    pub tval_zero: bool,
}

impl Default for InterruptConfig {
    fn default() -> Self {
        Self {
            clic_enabled: false,
            aia_enabled: false,
            clic_levels: 256,
            rnmi_enabled: false,
            nmi_exception_address: defaults::NMI_EXCEPTION_ADDRESS,
            tval_zero: false,
        }
    }
}

/// Debug-module configuration.
#[derive(Clone, Copy, Debug, PartialEq, Eq, Serialize, Deserialize)]
#[serde(default)]
pub struct DebugConfig {
    /// Number of Sdtrig trigger slots implemented.
    pub trigger_count: usize,
    /// Policy applied to an exception raised while already in debug mode.
    pub dm_exception_policy: crate::core::arch::debug::DmExceptionPolicy,
    /// Redirect address used by [`crate::core::arch::debug::DmExceptionPolicy::RedirectToDexcAddress`].
    pub dexc_address: u64,
    /// Priority ordering between a pending debug trigger-after event and the
    /// following instruction's interrupt check (§9 open question); one of
    /// the four modes the distilled source leaves implementer-defined.
    pub debug_priority: DebugPriority,
}

impl Default for DebugConfig {
    fn default() -> Self {
        Self {
            trigger_count: defaults::TRIGGER_COUNT,
            dm_exception_policy: crate::core::arch::debug::DmExceptionPolicy::Ignore,
            dexc_address: defaults::DEXC_ADDRESS,
            debug_priority: DebugPriority::TriggerBeforeInterrupt,
        }
    }
}

/// The four orderings between a pending debug-trigger-after event and the
/// following instruction's interrupt check.
#[derive(Clone, Copy, Debug, PartialEq, Eq, Serialize, Deserialize)]
pub enum DebugPriority {
    /// The trigger-after event is always serviced before any interrupt check.
    TriggerBeforeInterrupt,
    /// Interrupts are checked first; the trigger-after event is deferred
    /// until no interrupt is pending.
    InterruptBeforeTrigger,
    /// Whichever condition armed first wins ties; otherwise trigger-first.
    FirstArmedWins,
    /// A trigger-after event is merged into the same boundary as a pending
    /// NMI and serviced atomically.
    MergedWithNmi,
}

/// Top-level hart configuration.
#[derive(Clone, Debug, PartialEq, Eq, Serialize, Deserialize)]
#[serde(default)]
pub struct HartConfig {
    /// ISA/extension configuration.
    pub isa: IsaConfig,
    /// Interrupt-subsystem configuration.
    pub interrupt: InterruptConfig,
    /// Debug-module configuration.
    pub debug: DebugConfig,
    /// Reset vector (PC on cold reset).
    pub reset_vector: u64,
    /// `true` if the exclusive (LR/SC) reservation survives a trap instead
    /// of being cleared on every trap entry (§5 "Shared resources").
    pub preserve_reservation_across_trap: bool,
    /// Optional boot-time CSR address remap string, parsed by
    /// [`crate::core::arch::csr::CsrRegistry::apply_remap`].
    pub csr_remap: Option<String>,
    /// Cycles a `wfi` trapped by `mstatus.TW`/`hstatus.VTW` is allowed to
    /// park before the Illegal/VirtualInstruction trap is delivered
    /// (§5 "Cancellation/timeout"). Zero traps immediately.
    pub wfi_tw_timeout_cycles: u64,
    /// Cycles an unconditional `wrs.sto` parks before timing out
    /// regardless of `mstatus.TW` (§5).
    pub wrs_sto_timeout_cycles: u64,
}

impl Default for HartConfig {
    fn default() -> Self {
        Self {
            isa: IsaConfig::default(),
            interrupt: InterruptConfig::default(),
            debug: DebugConfig::default(),
            reset_vector: defaults::RESET_VECTOR,
            preserve_reservation_across_trap: false,
            csr_remap: None,
            wfi_tw_timeout_cycles: defaults::WFI_TW_TIMEOUT_CYCLES,
            wrs_sto_timeout_cycles: defaults::WRS_STO_TIMEOUT_CYCLES,
        }
    }
}
