//! Debug Module Interface (Sdext).
//!
//! Implements the `Running`/`Debug` state machine: entry causes with their
//! `dcsr.cause` encodings, the single-step timer/rearm behavior, and the
//! `dret` resumption (§4.6).

use serde::{Deserialize, Serialize};

use crate::core::arch::mode::PrivilegeMode;

/// `dcsr.cause` encodings (§8 invariant 7).
#[derive(Clone, Copy, Debug, PartialEq, Eq)]
pub enum EntryCause {
    /// `ebreak` executed and enabled for the current mode by `dcsr.ebreakX`.
    Ebreak = 1,
    /// A matched trigger with `action=1`.
    Trigger = 2,
    /// External `haltreq`.
    Haltreq = 3,
    /// Single-step expiry.
    Step = 4,
    /// `resethaltreq` sampled at reset.
    Resethaltreq = 5,
}

impl EntryCause {
    /// The 3-bit value written to `dcsr.cause`.
    #[must_use]
    pub const fn encoding(self) -> u8 {
        self as u8
    }

    /// Inverse of [`Self::encoding`], for snapshot restore.
    #[must_use]
    pub const fn decode(bits: u8) -> Option<Self> {
        match bits {
            1 => Some(Self::Ebreak),
            2 => Some(Self::Trigger),
            3 => Some(Self::Haltreq),
            4 => Some(Self::Step),
            5 => Some(Self::Resethaltreq),
            _ => None,
        }
    }
}

/// How the debug module reacts to a would-be exception raised while the
/// hart is already in debug mode (§4.6 "Integration with trap engine").
#[derive(Clone, Copy, Debug, PartialEq, Eq, Default, Serialize, Deserialize)]
pub enum DmExceptionPolicy {
    /// The exception is silently dropped.
    #[default]
    Ignore,
    /// Control jumps to the configured `dexc_address`.
    RedirectToDexcAddress,
    /// The exception is delivered as a normal trap, even in debug mode.
    Trap,
}

/// Flat, persistable view of a [`DebugModule`] (§6 "Persisted state").
#[derive(Clone, Debug, Serialize, Deserialize)]
pub struct DebugSnapshot {
    pub in_debug: bool,
    pub cause: Option<u8>,
    pub resume_mode: u8,
    pub resume_virt: bool,
    pub dpc: u64,
    pub dscratch: [u64; 2],
    pub step: bool,
    pub stepie: bool,
    pub ebreak_enable: [bool; 5],
    pub step_armed: bool,
    pub dm_exception_policy: DmExceptionPolicy,
    pub dexc_address: u64,
}

/// Running/Debug state machine.
#[derive(Clone, Debug)]
pub struct DebugModule {
    in_debug: bool,
    cause: Option<EntryCause>,
    /// Privilege mode and virtualization to resume into on `dret`, captured
    /// at entry (`dcsr.prv`/`dcsr.v`).
    resume_mode: PrivilegeMode,
    resume_virt: bool,
    /// `dpc`: PC to resume at.
    pub dpc: u64,
    /// `dscratch0`/`dscratch1`: debugger scratch registers.
    pub dscratch: [u64; 2],
    /// `dcsr.step`: single-step enable.
    pub step: bool,
    /// `dcsr.stepie`: whether interrupts are taken during a stepped instruction.
    pub stepie: bool,
    /// `dcsr.ebreakm/s/u/vs/vu`: per-mode `ebreak`-enters-debug enable.
    pub ebreak_enable: [bool; 5],
    /// One-shot timer armed by [`Self::arm_step`], consumed by
    /// [`Self::step_expired`] at the next instruction boundary.
    step_armed: bool,
    /// Policy applied when an exception occurs while already in debug mode.
    pub dm_exception_policy: DmExceptionPolicy,
    /// Address to redirect to under [`DmExceptionPolicy::RedirectToDexcAddress`].
    pub dexc_address: u64,
}

impl DebugModule {
    /// Builds a module in the `Running` state.
    #[must_use]
    pub fn new(dm_exception_policy: DmExceptionPolicy, dexc_address: u64) -> Self {
        Self {
            in_debug: false,
            cause: None,
            resume_mode: PrivilegeMode::M,
            resume_virt: false,
            dpc: 0,
            dscratch: [0; 2],
            step: false,
            stepie: false,
            ebreak_enable: [false; 5],
            step_armed: false,
            dm_exception_policy,
            dexc_address,
        }
    }

    /// `true` while the hart is halted in debug mode.
    #[must_use]
    pub const fn in_debug_mode(&self) -> bool {
        self.in_debug
    }

    /// The cause of the most recent debug-mode entry.
    #[must_use]
    pub const fn cause(&self) -> Option<EntryCause> {
        self.cause
    }

    /// Whether `ebreak` in `mode` should enter debug mode rather than
    /// raising [`crate::common::error::Trap::Breakpoint`].
    #[must_use]
    pub fn ebreak_enters_debug(&self, mode: PrivilegeMode) -> bool {
        self.ebreak_enable[ebreak_index(mode)]
    }

    /// Sets the `dcsr.ebreakX` bit for `mode` (`X` one of m/s/u/vs/vu).
    pub fn set_ebreak_enable(&mut self, mode: PrivilegeMode, enabled: bool) {
        self.ebreak_enable[ebreak_index(mode)] = enabled;
    }

    /// `Running -> Debug` transition. `pc` is the instruction boundary to
    /// resume from; `mode`/`virt` are the pre-entry privilege, captured for
    /// `dret`.
    pub fn enter(&mut self, cause: EntryCause, pc: u64, mode: PrivilegeMode, virt: bool) {
        tracing::info!(?cause, pc = format!("{pc:#x}"), ?mode, "debug module: entering debug mode");
        self.in_debug = true;
        self.cause = Some(cause);
        self.dpc = pc;
        self.resume_mode = mode;
        self.resume_virt = virt;
        self.step_armed = false;
    }

    /// `Debug -> Running` transition on `dret`. Returns the mode/virt/pc to
    /// resume into; the hart promotes an unimplemented `resume_mode` to the
    /// minimum implemented mode and rearms the step timer if `dcsr.step=1`.
    pub fn exit(&mut self) -> (PrivilegeMode, bool, u64) {
        tracing::info!(resume_mode = ?self.resume_mode, "debug module: exiting debug mode");
        self.in_debug = false;
        if self.step {
            self.step_armed = true;
        }
        (self.resume_mode, self.resume_virt, self.dpc)
    }

    /// Arms the one-instruction step timer when `dcsr.step=1` and stepping
    /// is not masked by `dcsr.stepie`'s interrupt-visibility rule. Called at
    /// entry to every non-debug instruction.
    pub fn arm_step(&mut self) {
        if self.step {
            self.step_armed = true;
        }
    }

    /// `true` if a previously-armed step timer has expired (i.e. one
    /// instruction has retired since arming), consumed at the next fetch
    /// boundary as "step pending".
    #[must_use]
    pub const fn step_expired(&self) -> bool {
        self.step_armed
    }

    /// Consumes the step-expiry flag, returning whether it had fired.
    pub fn take_step_expired(&mut self) -> bool {
        std::mem::take(&mut self.step_armed)
    }

    /// `true` while a single step is in flight and `dcsr.stepie=0`, which
    /// masks interrupt delivery for the duration of the stepped instruction
    /// (§4.6 "Interaction with the Interrupt Controller").
    #[must_use]
    pub const fn step_expired_or_stepping_masked(&self) -> bool {
        self.step_armed && !self.stepie
    }

    /// Captures the full module state, including the private fields
    /// `snapshot`/`restore` is the only sanctioned way to reach.
    #[must_use]
    pub fn snapshot(&self) -> DebugSnapshot {
        DebugSnapshot {
            in_debug: self.in_debug,
            cause: self.cause.map(EntryCause::encoding),
            resume_mode: self.resume_mode.full_repr(),
            resume_virt: self.resume_virt,
            dpc: self.dpc,
            dscratch: self.dscratch,
            step: self.step,
            stepie: self.stepie,
            ebreak_enable: self.ebreak_enable,
            step_armed: self.step_armed,
            dm_exception_policy: self.dm_exception_policy,
            dexc_address: self.dexc_address,
        }
    }

    /// Restores a module previously captured by [`Self::snapshot`].
    pub fn restore(&mut self, snap: DebugSnapshot) {
        self.in_debug = snap.in_debug;
        self.cause = snap.cause.and_then(EntryCause::decode);
        self.resume_mode = PrivilegeMode::from_full_repr(snap.resume_mode);
        self.resume_virt = snap.resume_virt;
        self.dpc = snap.dpc;
        self.dscratch = snap.dscratch;
        self.step = snap.step;
        self.stepie = snap.stepie;
        self.ebreak_enable = snap.ebreak_enable;
        self.step_armed = snap.step_armed;
        self.dm_exception_policy = snap.dm_exception_policy;
        self.dexc_address = snap.dexc_address;
    }
}

/// Index into `ebreak_enable`/per-mode debug arrays: M, S/HS, U, VS, VU,
/// distinct from [`PrivilegeMode::encoding`] (which collapses HS/VS and
/// U/VU to the same 2-bit `mstatus.MPP`-style value).
const fn ebreak_index(mode: PrivilegeMode) -> usize {
    match mode {
        PrivilegeMode::M => 0,
        PrivilegeMode::Hs => 1,
        PrivilegeMode::U => 2,
        PrivilegeMode::Vs => 3,
        PrivilegeMode::Vu => 4,
    }
}
