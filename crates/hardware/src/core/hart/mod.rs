//! The Hart: assembles the CSR Registry, Mode Manager, Interrupt
//! Controller, Trap Engine, Trigger Engine, and Debug Module into the
//! per-hart state machine a consuming pipeline drives one instruction at a
//! time (§2, §3, §5).
//!
//! Split the way the teacher crate splits its `Cpu`: this module owns the
//! struct and construction/reset; [`csr`] implements the read/write
//! dispatch for every CSR this crate computes itself; [`trap`] implements
//! entry/return and the instruction-boundary `fetch_hook`; [`snapshot`]
//! implements persistence (§6).

pub mod bits;
mod csr;
mod snapshot;
mod trap;

pub use snapshot::HartSnapshot;
pub use trap::FetchDecision;

use crate::collab::{ExtensionHooks, NetPorts};
use crate::common::error::{CoreError, Trap};
use crate::config::HartConfig;
use crate::core::arch::csr::CsrRegistry;
use crate::core::arch::debug::DebugModule;
use crate::core::arch::interrupt::InterruptController;
use crate::core::arch::mode::{ArchKey, ModeManager, PrivilegeMode};
use crate::core::arch::trigger::TriggerEngine;

/// Bitset of reasons the hart is halted and not retiring instructions
/// (§3 `disable`). Modeled as a plain `u8` bitset rather than the
/// `bitflags` crate, matching the rest of this crate's hand-rolled
/// bit-constant style.
#[derive(Clone, Copy, Debug, Default, PartialEq, Eq)]
pub struct DisableReasons(u8);

impl DisableReasons {
    /// Halted because `reset` net is asserted.
    pub const RESET: Self = Self(1 << 0);
    /// Halted in `wfi`.
    pub const WFI: Self = Self(1 << 1);
    /// Halted in `wrs.nto`/`wrs.sto`.
    pub const WRS: Self = Self(1 << 2);
    /// Halted in debug mode.
    pub const DEBUG: Self = Self(1 << 3);

    /// The empty set (hart running).
    #[must_use]
    pub const fn none() -> Self {
        Self(0)
    }

    #[must_use]
    pub const fn contains(self, other: Self) -> bool {
        self.0 & other.0 == other.0
    }

    #[must_use]
    pub const fn is_empty(self) -> bool {
        self.0 == 0
    }

    pub fn insert(&mut self, other: Self) {
        self.0 |= other.0;
    }

    pub fn remove(&mut self, other: Self) {
        self.0 &= !other.0;
    }

    /// Raw bitset value, for persistence.
    #[must_use]
    pub const fn bits(self) -> u8 {
        self.0
    }

    /// Inverse of [`Self::bits`].
    #[must_use]
    pub const fn from_bits(bits: u8) -> Self {
        Self(bits)
    }
}

/// AIA (Smaia/Ssaia) per-privilege interrupt-priority arrays, one 8-bit
/// priority per architectural cause 0..63, matching the shape described by
/// `riscvAIATypes.h` in the original source this spec distills (§3 `aia`).
#[derive(Clone, Copy, Debug, serde::Serialize, serde::Deserialize)]
pub struct AiaState {
    pub miprio: [u8; 64],
    pub siprio: [u8; 64],
    pub vsiprio: [u8; 64],
    /// `miselect`/`siselect`/`vsiselect`: selects which indirect-CSR
    /// window `mireg`/`sireg`/`vsireg` exposes.
    pub miselect: u64,
    pub siselect: u64,
    pub vsiselect: u64,
}

impl Default for AiaState {
    fn default() -> Self {
        Self {
            miprio: [crate::common::constants::AIA_IPRIO_DEFAULT; 64],
            siprio: [crate::common::constants::AIA_IPRIO_DEFAULT; 64],
            vsiprio: [crate::common::constants::AIA_IPRIO_DEFAULT; 64],
            miselect: 0,
            siselect: 0,
            vsiselect: 0,
        }
    }
}

/// The per-hart control-plane state machine.
pub struct Hart {
    pub(crate) config: HartConfig,

    pub(crate) mode: PrivilegeMode,
    pub(crate) virt: bool,
    pub(crate) pc: u64,
    mode_mgr: ModeManager,

    pub(crate) csrs: CsrRegistry,

    // Trap setup / handling, unprivileged-to-machine.
    pub(crate) mstatus: u64,
    pub(crate) misa: u64,
    pub(crate) medeleg: u64,
    pub(crate) mideleg: u64,
    pub(crate) hedeleg: u64,
    pub(crate) hideleg: u64,
    pub(crate) sedeleg: u64,
    pub(crate) sideleg: u64,
    pub(crate) mie: u64,
    pub(crate) mtvec: u64,
    pub(crate) stvec: u64,
    pub(crate) vstvec: u64,
    pub(crate) mscratch: u64,
    pub(crate) sscratch: u64,
    pub(crate) vsscratch: u64,
    pub(crate) mepc: u64,
    pub(crate) sepc: u64,
    pub(crate) vsepc: u64,
    pub(crate) mcause: u64,
    pub(crate) scause: u64,
    pub(crate) vscause: u64,
    pub(crate) mtval: u64,
    pub(crate) stval: u64,
    pub(crate) vstval: u64,
    pub(crate) mtval2: u64,
    pub(crate) mtinst: u64,
    pub(crate) htval: u64,
    pub(crate) htinst: u64,
    pub(crate) hstatus: u64,
    pub(crate) vsstatus: u64,

    // Address translation (opaque: mode field only, no page-table walk).
    pub(crate) satp: u64,
    pub(crate) vsatp: u64,
    pub(crate) hgatp: u64,

    // Counters / inhibit.
    pub(crate) mcounteren: u64,
    pub(crate) scounteren: u64,
    pub(crate) hcounteren: u64,
    pub(crate) mcountinhibit: u64,
    pub(crate) base_cycles: u64,
    pub(crate) base_instrs: u64,
    pub(crate) mtime: u64,

    // Environment configuration / Smepmp.
    pub(crate) menvcfg: u64,
    pub(crate) henvcfg: u64,
    pub(crate) senvcfg: u64,
    pub(crate) mseccfg: u64,

    // Sstc.
    pub(crate) stimecmp: u64,
    pub(crate) vstimecmp: u64,

    // Smrnmi.
    pub(crate) mnscratch: u64,
    pub(crate) mnepc: u64,
    pub(crate) mncause: u64,
    pub(crate) mnstatus: u64,

    // Smstateen.
    pub(crate) mstateen0: u64,
    pub(crate) hstateen0: u64,
    pub(crate) sstateen0: u64,

    // PMP / Smepmp.
    pub(crate) pmpcfg: [u8; 64],
    pub(crate) pmpaddr: [u64; 64],

    // AIA virtual-interrupt injection and priority arrays.
    pub(crate) mvien: u64,
    pub(crate) mvip: u64,
    pub(crate) hvien: u64,
    pub(crate) hvip: u64,
    pub(crate) hvictl: u64,
    pub(crate) hviprio: [u64; 2],
    pub(crate) hgeie: u64,
    pub(crate) hgeip: u64,
    pub(crate) htimedelta: u64,
    pub(crate) aia: AiaState,
    pub(crate) mintstatus_mil: u8,
    pub(crate) sintstatus_sil: u8,
    pub(crate) mintthresh: u8,
    pub(crate) sintthresh: u8,

    // Interrupt sources (§3 `ip[]`, `swip`, `svie`).
    pub(crate) ip: u64,
    pub(crate) swip: u64,
    pub(crate) svie: bool,

    pub(crate) interrupt_ctrl: InterruptController,
    /// Last CLIC-selected interrupt presented via [`Self::present_clic`]
    /// (§3 `clic_sel`), held until the next `present_clic` call replaces or
    /// clears it; every [`Self::interrupt_inputs`] snapshot reads from here
    /// instead of defaulting to `None` so it survives unrelated refreshes.
    pub(crate) clic_sel: Option<crate::core::arch::interrupt::ClicPresented>,
    pub(crate) triggers: TriggerEngine,
    pub(crate) pending_trigger: Option<crate::core::arch::trigger::TriggerVerdict>,
    pub(crate) debug: DebugModule,

    pub(crate) exclusive_tag: Option<u64>,
    pub(crate) disable: DisableReasons,
    pub(crate) net: NetPorts,
    pub(crate) tselect: usize,

    /// Cycle deadline for a `wfi` parked under `mstatus.TW`/`hstatus.VTW`
    /// (§5 "Cancellation/timeout").
    wfi_tw_deadline: Option<u64>,
    /// Cycle deadline for an unconditional `wrs.sto` timeout.
    wrs_sto_deadline: Option<u64>,
    /// A trap armed by a WFI/WRS timeout expiry, delivered at the next
    /// instruction boundary with "fetch trap" priority (lowest, §5).
    pending_timeout_trap: Option<Trap>,

    extension_hooks: Vec<Box<dyn ExtensionHooks>>,
}

impl Hart {
    /// Builds a freshly cold-reset hart from `config`.
    #[must_use]
    pub fn new(config: HartConfig) -> Self {
        let mut csrs = CsrRegistry::new();
        csr::register_defaults(&mut csrs, &config);

        let xlen64 = config.isa.xlen == 64;
        let misa = csr::reset_misa(&config, xlen64);
        let mstatus = if xlen64 {
            (2u64 << bits::MSTATUS_UXL_SHIFT) | (2u64 << bits::MSTATUS_SXL_SHIFT)
        } else {
            0
        };

        let mut hart = Self {
            config: config.clone(),
            mode: PrivilegeMode::M,
            virt: false,
            pc: config.reset_vector,
            mode_mgr: ModeManager::new(),
            csrs,
            mstatus,
            misa,
            medeleg: 0,
            mideleg: 0,
            hedeleg: 0,
            hideleg: 0,
            sedeleg: 0,
            sideleg: 0,
            mie: 0,
            mtvec: 0,
            stvec: 0,
            vstvec: 0,
            mscratch: 0,
            sscratch: 0,
            vsscratch: 0,
            mepc: 0,
            sepc: 0,
            vsepc: 0,
            mcause: 0,
            scause: 0,
            vscause: 0,
            mtval: 0,
            stval: 0,
            vstval: 0,
            mtval2: 0,
            mtinst: 0,
            htval: 0,
            htinst: 0,
            hstatus: 0,
            vsstatus: 0,
            satp: 0,
            vsatp: 0,
            hgatp: 0,
            mcounteren: 0,
            scounteren: 0,
            hcounteren: 0,
            mcountinhibit: 0,
            base_cycles: 0,
            base_instrs: 0,
            mtime: 0,
            menvcfg: 0,
            henvcfg: 0,
            senvcfg: 0,
            mseccfg: 0,
            stimecmp: u64::MAX,
            vstimecmp: u64::MAX,
            mnscratch: 0,
            mnepc: 0,
            mncause: 0,
            mnstatus: bits::MNSTATUS_NMIE,
            mstateen0: u64::MAX,
            hstateen0: u64::MAX,
            sstateen0: u64::MAX,
            pmpcfg: [0; 64],
            pmpaddr: [0; 64],
            mvien: 0,
            mvip: 0,
            hvien: 0,
            hvip: 0,
            hvictl: 0,
            hviprio: [0; 2],
            hgeie: 0,
            hgeip: 0,
            htimedelta: 0,
            aia: AiaState::default(),
            mintstatus_mil: 0,
            sintstatus_sil: 0,
            mintthresh: 0,
            sintthresh: 0,
            ip: 0,
            swip: 0,
            svie: false,
            interrupt_ctrl: InterruptController::default(),
            clic_sel: None,
            triggers: TriggerEngine::new(config.debug.trigger_count),
            pending_trigger: None,
            debug: DebugModule::new(config.debug.dm_exception_policy, config.debug.dexc_address),
            exclusive_tag: None,
            disable: DisableReasons::none(),
            net: NetPorts::default(),
            tselect: 0,
            wfi_tw_deadline: None,
            wrs_sto_deadline: None,
            pending_timeout_trap: None,
            extension_hooks: Vec::new(),
        };
        hart.refresh_arch();
        hart
    }

    /// Registers an extension's hook set; invoked in registration order at
    /// every relevant point for the lifetime of the hart (§6).
    pub fn register_extension(&mut self, hooks: Box<dyn ExtensionHooks>) {
        self.extension_hooks.push(hooks);
    }

    /// Current privilege mode.
    #[must_use]
    pub const fn mode(&self) -> PrivilegeMode {
        self.mode
    }

    /// `true` if the current mode is one of the virtual (VS/VU) pair.
    #[must_use]
    pub const fn is_virtual(&self) -> bool {
        self.virt
    }

    /// Current PC.
    #[must_use]
    pub const fn pc(&self) -> u64 {
        self.pc
    }

    /// Sets the PC; used by a driving pipeline after a non-trapping
    /// instruction retires.
    pub fn set_pc(&mut self, pc: u64) {
        self.pc = pc;
    }

    /// The composite "current architecture" key last published (§4.2).
    #[must_use]
    pub fn arch_key(&self) -> ArchKey {
        self.mode_mgr.current().unwrap_or(ArchKey::reset(self.config.isa.xlen == 64, self.config.isa.has_extension('c')))
    }

    /// `true` while the hart is halted in debug mode.
    #[must_use]
    pub const fn in_debug_mode(&self) -> bool {
        self.debug.in_debug_mode()
    }

    /// `true` while the hart is halted for any reason (reset/WFI/WRS/debug).
    #[must_use]
    pub const fn is_halted(&self) -> bool {
        !self.disable.is_empty()
    }

    /// Effective XLEN (32 or 64) for `mode`.
    #[must_use]
    pub fn xlen_for(&self, mode: PrivilegeMode) -> u32 {
        if self.mode_mgr.xlen_mask() & (1 << (mode as u8)) != 0 {
            64
        } else {
            32
        }
    }

    /// Recomputes `current_arch`/`xlen_mask` from present CSR state (§4.2)
    /// and, if the key changed, notifies the morph/JIT collaborator.
    /// Called after every `misa`/`mstatus`/`hstatus`/`vsstatus`/`satp`/
    /// `hgatp` write and on every mode transition.
    pub fn refresh_arch(&mut self) -> bool {
        let inputs = crate::core::arch::mode::ModeInputs {
            misa_mxl: (self.misa & bits::MISA_MXL) >> bits::MISA_MXL_SHIFT,
            mstatus_sxl: (self.mstatus & bits::MSTATUS_SXL) >> bits::MSTATUS_SXL_SHIFT,
            mstatus_uxl: (self.mstatus & bits::MSTATUS_UXL) >> bits::MSTATUS_UXL_SHIFT,
            hstatus_vsxl: (self.hstatus & bits::HSTATUS_VSXL) >> bits::HSTATUS_VSXL_SHIFT,
            vsstatus_uxl: (self.vsstatus & bits::MSTATUS_UXL) >> bits::MSTATUS_UXL_SHIFT,
            compressed: self.misa & (1 << 2) != 0,
            fp_enabled: if self.virt { self.vsstatus & bits::MSTATUS_FS != 0 } else { self.mstatus & bits::MSTATUS_FS != 0 },
            vec_enabled: if self.virt { self.vsstatus & bits::MSTATUS_VS != 0 } else { self.mstatus & bits::MSTATUS_VS != 0 },
            big_endian: self.effective_big_endian(),
            vm_enabled: self.vm_enabled(),
            mode: self.mode,
        };
        let (_, changed) = self.mode_mgr.refresh(inputs);
        changed
    }

    fn vm_enabled(&self) -> bool {
        let satp_mode = (self.satp & bits::SATP_MODE_MASK) >> bits::SATP_MODE_SHIFT;
        let hgatp_mode = (self.hgatp & bits::HGATP_MODE_MASK) >> bits::HGATP_MODE_SHIFT;
        satp_mode != bits::SATP_MODE_BARE || (self.virt && hgatp_mode != bits::SATP_MODE_BARE)
    }

    fn effective_big_endian(&self) -> bool {
        match self.mode.demote_virtual() {
            PrivilegeMode::M => self.mstatus & bits::MSTATUS_MBE != 0,
            PrivilegeMode::Hs if self.virt => self.hstatus & bits::HSTATUS_VSBE != 0,
            PrivilegeMode::Hs => self.mstatus & bits::MSTATUS_SBE != 0,
            _ => self.mstatus & bits::MSTATUS_UBE != 0,
        }
    }

    /// `mcycle`/`cycle`: cumulative cycle count (§3 `base_cycles`).
    #[must_use]
    pub const fn mcycle(&self) -> u64 {
        self.base_cycles
    }

    /// `minstret`/`instret`: cumulative retired-instruction count.
    #[must_use]
    pub const fn minstret(&self) -> u64 {
        self.base_instrs
    }

    /// Advances the cycle counter by one, respecting `mcountinhibit.CY`.
    /// Called once per host cycle by the driving pipeline. Also expires the
    /// `wfi`/`wrs.sto` timeout timers, if armed (§5 "Cancellation/timeout").
    pub fn tick_cycle(&mut self) {
        if self.mcountinhibit & 1 == 0 {
            self.base_cycles += 1;
        }
        if self.wfi_tw_deadline.is_some_and(|d| self.base_cycles >= d) && self.disable.contains(DisableReasons::WFI) {
            self.wfi_tw_deadline = None;
            self.disable.remove(DisableReasons::WFI);
            self.pending_timeout_trap = Some(Trap::IllegalInstruction(0));
        }
        if self.wrs_sto_deadline.is_some_and(|d| self.base_cycles >= d) && self.disable.contains(DisableReasons::WRS) {
            self.wrs_sto_deadline = None;
            self.disable.remove(DisableReasons::WRS);
            self.pending_timeout_trap = Some(Trap::IllegalInstruction(0));
        }
    }

    fn tw_trap(&self) -> Option<Trap> {
        if self.mode == PrivilegeMode::M {
            return None;
        }
        if self.mstatus & bits::MSTATUS_TW != 0 {
            return Some(Trap::IllegalInstruction(0));
        }
        if self.virt && self.hstatus & bits::HSTATUS_VTW != 0 {
            return Some(Trap::VirtualInstruction(0));
        }
        None
    }

    /// `wfi`: cooperatively halts the hart (§5 "Suspension points"). If
    /// `mstatus.TW`/`hstatus.VTW` traps WFI from the current mode, either
    /// traps immediately or arms a configurable timeout, per
    /// [`HartConfig::wfi_tw_timeout_cycles`] (§5 "Cancellation/timeout").
    pub fn wfi(&mut self) {
        if let Some(trap) = self.tw_trap() {
            if self.config.wfi_tw_timeout_cycles == 0 {
                self.pending_timeout_trap = Some(trap);
                return;
            }
            self.wfi_tw_deadline = Some(self.base_cycles + self.config.wfi_tw_timeout_cycles);
        }
        self.disable.insert(DisableReasons::WFI);
    }

    /// `wrs.nto`: cooperatively halts the hart, subject to the same
    /// `mstatus.TW`/`hstatus.VTW` trapping rule as `wfi` (no independent
    /// timeout).
    pub fn wrs_nto(&mut self) {
        if let Some(trap) = self.tw_trap() {
            self.pending_timeout_trap = Some(trap);
            return;
        }
        self.disable.insert(DisableReasons::WRS);
    }

    /// `wrs.sto`: cooperatively halts the hart with its own unconditional
    /// timeout, independent of `mstatus.TW` (§5).
    pub fn wrs_sto(&mut self) {
        self.wrs_sto_deadline = Some(self.base_cycles + self.config.wrs_sto_timeout_cycles);
        self.disable.insert(DisableReasons::WRS);
    }

    /// Drives the external `nmi` net port (§6); a rising edge arms NMI
    /// entry at the next instruction boundary. `cause`/`addr` latch
    /// `nmi_cause`/`nmi_addr`.
    pub fn drive_nmi(&mut self, level: bool, cause: u64, addr: u64) {
        self.net.nmi = level;
        self.net.nmi_cause = cause;
        self.net.nmi_addr = addr;
    }

    /// Drives the external `haltreq` net port (§6), sampled by
    /// [`Self::fetch_hook`] at the next instruction boundary.
    pub fn drive_haltreq(&mut self, level: bool) {
        self.net.haltreq = level;
    }

    /// Drives the external `resethaltreq` net port (§6), sampled on the
    /// next falling edge of `reset`.
    pub fn drive_resethaltreq(&mut self, level: bool) {
        self.net.resethaltreq = level;
    }

    /// Drives the external `reset` net port (§6). A high level halts the
    /// hart immediately; the falling edge performs a cold reset and, if
    /// `resethaltreq` was latched, immediately re-enters debug mode with
    /// [`crate::core::arch::debug::EntryCause::Resethaltreq`].
    pub fn drive_reset(&mut self, level: bool) {
        let falling_edge = self.net.reset && !level;
        self.net.reset = level;
        if level {
            self.disable.insert(DisableReasons::RESET);
            return;
        }
        if falling_edge {
            let resethaltreq = self.net.resethaltreq;
            self.cold_reset();
            if resethaltreq && self.config.isa.has_extra("Sdext") {
                self.debug.enter(crate::core::arch::debug::EntryCause::Resethaltreq, self.pc, self.mode, self.virt);
                self.disable.insert(DisableReasons::DEBUG);
            }
        }
    }

    /// Advances the retired-instruction counter by one and arms the
    /// single-step timer, respecting `mcountinhibit.IR`. Called once per
    /// retired instruction (including one stepped in debug mode) by the
    /// driving pipeline.
    pub fn retire_instruction(&mut self) {
        if self.mcountinhibit & (1 << 2) == 0 {
            self.base_instrs += 1;
        }
        self.debug.arm_step();
        if let Some(verdict) = self.triggers.on_instruction_retired(self.mode) {
            self.pending_trigger = Some(verdict);
        }
    }

    /// Atomically updates the externally-sourced pending-interrupt bits
    /// and re-evaluates the Interrupt Controller (§5 "Shared resources").
    pub fn drive_ip(&mut self, bit: u64, level: bool) {
        if level {
            self.ip |= 1 << bit;
        } else {
            self.ip &= !(1 << bit);
        }
        self.refresh_pending_and_enabled();
    }

    /// Drives the `mtime` net port and re-derives `STIP`/`VSTIP` from
    /// `stimecmp`/`vstimecmp` if Sstc is active.
    pub fn drive_mtime(&mut self, mtime: u64) {
        self.mtime = mtime;
        self.refresh_pending_and_enabled();
    }

    fn stimecmp_pending(&self) -> bool {
        self.menvcfg & bits::ENVCFG_STCE != 0 && self.mtime >= self.stimecmp
    }

    fn vstimecmp_pending(&self) -> bool {
        self.henvcfg & bits::ENVCFG_STCE != 0 && self.mtime.wrapping_add(self.htimedelta) >= self.vstimecmp
    }

    /// Composed `mip` (§3: "the disjunction visible to software").
    #[must_use]
    pub fn mip(&self) -> u64 {
        let mut v = self.ip | self.swip;
        if self.stimecmp_pending() {
            v |= 1 << 5;
        }
        if self.vstimecmp_pending() {
            v |= 1 << 6;
        }
        v
    }

    fn pending_sources(&self) -> crate::core::arch::interrupt::PendingSources {
        crate::core::arch::interrupt::PendingSources {
            ip: self.ip,
            swip: self.swip,
            stimecmp_tip: self.stimecmp_pending(),
            vstimecmp_tip: self.vstimecmp_pending(),
        }
    }

    fn interrupt_inputs(&self) -> crate::core::arch::interrupt::InterruptInputs {
        crate::core::arch::interrupt::InterruptInputs {
            mie: self.mie,
            mideleg: self.mideleg,
            hideleg: self.hideleg,
            sideleg: self.sideleg,
            mvien: self.mvien,
            hvien: self.hvien,
            mvip_virtual: self.mvip,
            hvip_virtual: self.hvip,
            hvictl_vti: self.hvictl & (1 << 30) != 0,
            hvictl_iid: ((self.hvictl >> 16) & 0xFFF) as u16,
            hvictl_iprio: (self.hvictl & 0xFF) as u8,
            mstatus_mie: self.mstatus & bits::MSTATUS_MIE != 0,
            mstatus_sie: self.mstatus & bits::MSTATUS_SIE != 0,
            vsstatus_sie: self.vsstatus & bits::MSTATUS_SIE != 0,
            current_mode: self.mode,
            clic_enabled: self.config.interrupt.clic_enabled,
            clic: self.clic_sel,
            mintstatus_mil: self.mintstatus_mil,
            mintthresh: self.mintthresh,
            sintstatus_sil: self.sintstatus_sil,
            sintthresh: self.sintthresh,
            xiprio: self.aia.miprio,
            step_masks_interrupts: self.debug.step_expired_or_stepping_masked(),
        }
    }

    /// Recomputes the highest-priority pending-and-enabled interrupt
    /// (§4.3), restarting the hart from WFI/WRS if a locally-enabled
    /// interrupt newly became pending, and emitting a trace event if the
    /// result differs from the previous one (§3 `pend_enab`, §5).
    pub fn refresh_pending_and_enabled(&mut self) {
        let sources = self.pending_sources();
        let inputs = self.interrupt_inputs();

        if (self.disable.contains(DisableReasons::WFI) || self.disable.contains(DisableReasons::WRS))
            && InterruptController::any_pending_and_locally_enabled(sources, &inputs)
        {
            self.disable.remove(DisableReasons::WFI);
            self.disable.remove(DisableReasons::WRS);
        }

        let _ = self.interrupt_ctrl.refresh(sources, &inputs);
    }

    /// The most recently computed pending-and-enabled interrupt, without
    /// recomputing.
    #[must_use]
    pub fn pending_interrupt(&self) -> Option<crate::core::arch::interrupt::PendingInterrupt> {
        self.interrupt_ctrl.current()
    }

    /// Presents a CLIC-selected interrupt from an external CLIC
    /// implementation (§3 `clic_sel`), re-evaluating immediately. Routed
    /// through [`Self::refresh_pending_and_enabled`] so a CLIC interrupt
    /// presented while the hart is parked in `wfi`/`wrs` clears the
    /// suspension the same way a standard pending-bit change does.
    pub fn present_clic(&mut self, presented: Option<crate::core::arch::interrupt::ClicPresented>) {
        self.clic_sel = presented;
        self.refresh_pending_and_enabled();
    }

    /// Parses and installs a boot-time CSR remap table (§4.1, §6).
    ///
    /// # Errors
    /// See [`CsrRegistry::apply_remap`].
    pub fn apply_csr_remap(&mut self, spec: &str) -> Result<(), CoreError> {
        self.csrs.apply_remap(spec)
    }

    fn notify_extensions_trap(&mut self, cause: u64, target: PrivilegeMode) {
        for hook in &mut self.extension_hooks {
            hook.on_trap(cause, target);
        }
    }

    fn custom_handler_pc(&self, architectural_pc: u64, cause: u64, is_interrupt: bool) -> u64 {
        for hook in &self.extension_hooks {
            if let Some(pc) = hook.custom_handler_pc(architectural_pc, cause, is_interrupt) {
                return pc;
            }
        }
        architectural_pc
    }

    /// Cold reset (§3 "Lifecycle"): restores architectural defaults.
    /// Extension-registered CSR descriptors and trigger slot count persist.
    pub fn cold_reset(&mut self) {
        let config = self.config.clone();
        let hooks = std::mem::take(&mut self.extension_hooks);
        let mut fresh = Self::new(config);
        fresh.extension_hooks = hooks;
        *self = fresh;
    }
}
