//! Trap Engine: entry/return procedures and the instruction-boundary
//! priority checklist (§4.4, §5).
//!
//! Generalizes the teacher's `cpu/trap.rs` `trap()`/`do_mret()`/`do_sret()`
//! (direct-mode check, delegation-gated target selection, `xepc`/`xcause`/
//! `xtval` capture, `mstatus` `xPIE`/`xPP`/`xIE` bit shuffle) from the fixed
//! M/S pair to the full M/HS/VS/U privilege lattice, plus CLIC vectoring,
//! Smrnmi, and Sdtrig/Sdext integration.

use crate::common::error::Trap;
use crate::core::arch::debug::EntryCause;
use crate::core::arch::mode::PrivilegeMode;
use crate::core::arch::trap::{align_pc, exception_target, vector_pc, VectorMode};
use crate::core::arch::trigger::{Action, Timing};
use crate::core::hart::bits::*;
use crate::core::hart::Hart;

/// Outcome of one [`Hart::fetch_hook`] call, telling the driving pipeline
/// whether it may proceed to fetch the next instruction at the current PC.
#[derive(Clone, Copy, Debug, PartialEq, Eq)]
pub enum FetchDecision {
    /// No pending event; fetch normally.
    Run,
    /// The hart is halted (reset, WFI, WRS, or already in debug mode); do
    /// not fetch.
    Halted,
    /// A trap was delivered; the PC now points at the handler.
    Trapped,
    /// The hart entered debug mode; the PC is frozen at `dpc`.
    EnteredDebug,
}

impl Hart {
    /// The priority-ordered instruction-boundary check (§5): debug halt
    /// requests, step-pending, a pending Sdtrig `after` event, NMI, then a
    /// pending interrupt, in that order, ahead of ordinary fetch.
    pub fn fetch_hook(&mut self) -> FetchDecision {
        if self.disable.contains(crate::core::hart::DisableReasons::RESET) {
            return FetchDecision::Halted;
        }
        if self.in_debug_mode() {
            return FetchDecision::Halted;
        }
        if self.net.haltreq {
            self.enter_debug(EntryCause::Haltreq);
            return FetchDecision::EnteredDebug;
        }
        if self.debug.take_step_expired() {
            self.enter_debug(EntryCause::Step);
            return FetchDecision::EnteredDebug;
        }
        if let Some(verdict) = self.pending_trigger.take() {
            return self.deliver_trigger(verdict);
        }
        if self.net.nmi && self.mnstatus & MNSTATUS_NMIE != 0 {
            self.enter_nmi();
            return FetchDecision::Trapped;
        }
        if self.pending_interrupt().is_some() {
            self.deliver_interrupt();
            return FetchDecision::Trapped;
        }
        if self.disable.contains(crate::core::hart::DisableReasons::WFI)
            || self.disable.contains(crate::core::hart::DisableReasons::WRS)
        {
            return FetchDecision::Halted;
        }
        if let Some(trap) = self.pending_timeout_trap.take() {
            self.deliver_exception(trap);
            return FetchDecision::Trapped;
        }
        FetchDecision::Run
    }

    /// Called by a driving pipeline before executing a fetched instruction,
    /// evaluating address/execute-direction Sdtrig triggers (§4.5
    /// "before" timing).
    pub fn trigger_fetch_check(&mut self, cycle: u64, va: u64) -> Option<Action> {
        let verdict = self.triggers.evaluate(cycle, crate::common::data::AccessType::Fetch, self.mode, va, None, 4)?;
        if verdict.timing == Timing::Before {
            self.triggers.clear_hit(verdict.chain_tail);
            Some(verdict.action)
        } else {
            self.pending_trigger = Some(verdict);
            None
        }
    }

    /// Called by a driving pipeline for a load/store's address and, once
    /// known, its data value (§4.5).
    pub fn trigger_data_check(
        &mut self,
        cycle: u64,
        access: crate::common::data::AccessType,
        va: u64,
        data: Option<u64>,
        size: u32,
    ) -> Option<Action> {
        let verdict = self.triggers.evaluate(cycle, access, self.mode, va, data, size)?;
        if verdict.timing == Timing::Before {
            self.triggers.clear_hit(verdict.chain_tail);
            Some(verdict.action)
        } else {
            self.pending_trigger = Some(verdict);
            None
        }
    }

    fn deliver_trigger(&mut self, verdict: crate::core::arch::trigger::TriggerVerdict) -> FetchDecision {
        self.triggers.clear_hit(verdict.chain_tail);
        match verdict.action {
            Action::DebugEntry => {
                self.enter_debug(EntryCause::Trigger);
                FetchDecision::EnteredDebug
            }
            Action::Breakpoint => {
                self.deliver_exception(Trap::Breakpoint(self.pc));
                FetchDecision::Trapped
            }
        }
    }

    /// Delivers a synchronous exception (§4.4 steps 1-8).
    pub fn deliver_exception(&mut self, trap: Trap) {
        if self.debug.in_debug_mode() {
            match self.debug.dm_exception_policy {
                crate::core::arch::debug::DmExceptionPolicy::Ignore => return,
                crate::core::arch::debug::DmExceptionPolicy::RedirectToDexcAddress => {
                    self.pc = self.debug.dexc_address;
                    return;
                }
                crate::core::arch::debug::DmExceptionPolicy::Trap => {}
            }
        }

        self.triggers.mark_icount_pending_on_trap();
        if let Some(v) = self.triggers.on_exception(trap.code()) {
            self.triggers.clear_hit(v.chain_tail);
            if v.action == Action::DebugEntry {
                self.enter_debug(EntryCause::Trigger);
                return;
            }
        }

        if trap.code() == 3 && !self.debug.in_debug_mode() && self.debug.ebreak_enters_debug(self.mode) {
            self.enter_debug(EntryCause::Ebreak);
            return;
        }

        let target = exception_target(trap.code(), self.mode.demote_virtual(), self.medeleg, self.hedeleg);
        let target = if self.virt && target == PrivilegeMode::Hs { PrivilegeMode::Vs } else { target };
        let tval = if self.config.interrupt.tval_zero { 0 } else { trap.tval() };
        self.enter_common(trap.code(), false, tval, target);
    }

    fn deliver_interrupt(&mut self) {
        let Some(pending) = self.pending_interrupt() else { return };
        self.triggers.mark_icount_pending_on_trap();
        if let Some(v) = self.triggers.on_interrupt(pending.cause) {
            self.triggers.clear_hit(v.chain_tail);
            if v.action == Action::DebugEntry {
                self.enter_debug(EntryCause::Trigger);
                return;
            }
        }
        self.enter_common(pending.cause, true, 0, pending.target);
    }

    fn enter_common(&mut self, cause_code: u64, is_interrupt: bool, tval: u64, target: PrivilegeMode) {
        let cause = cause_code | (u64::from(is_interrupt) << 63);
        let compressed = self.misa & (1 << 2) != 0;

        match target {
            PrivilegeMode::M => {
                self.mepc = self.pc;
                self.mcause = cause;
                self.mtval = tval;
                let mie = self.mstatus & MSTATUS_MIE != 0;
                self.mstatus = (self.mstatus & !(MSTATUS_MPIE | MSTATUS_MIE | MSTATUS_MPP | MSTATUS_MPV | MSTATUS_GVA))
                    | (u64::from(mie) << 7)
                    | (u64::from(self.mode.encoding()) << MSTATUS_MPP_SHIFT)
                    | (u64::from(self.virt) << 39);
                self.mode = PrivilegeMode::M;
                self.virt = false;
                self.pc = align_pc(self.handler_pc(self.mtvec, cause_code, is_interrupt), compressed);
            }
            PrivilegeMode::Hs => {
                self.sepc = self.pc;
                self.scause = cause;
                self.stval = tval;
                let sie = self.mstatus & MSTATUS_SIE != 0;
                self.mstatus = (self.mstatus & !(MSTATUS_SPIE | MSTATUS_SIE | MSTATUS_SPP))
                    | (u64::from(sie) << 5)
                    | (u64::from(self.mode == PrivilegeMode::Hs) << 8);
                self.hstatus = (self.hstatus & !(HSTATUS_SPV | HSTATUS_GVA))
                    | (u64::from(self.virt) << 7)
                    | (u64::from(self.virt) << 6);
                self.mode = PrivilegeMode::Hs;
                self.virt = false;
                self.pc = align_pc(self.handler_pc(self.stvec, cause_code, is_interrupt), compressed);
            }
            PrivilegeMode::Vs => {
                self.vsepc = self.pc;
                self.vscause = cause;
                self.vstval = tval;
                let sie = self.vsstatus & MSTATUS_SIE != 0;
                self.vsstatus = (self.vsstatus & !(MSTATUS_SPIE | MSTATUS_SIE | MSTATUS_SPP))
                    | (u64::from(sie) << 5)
                    | (u64::from(self.mode == PrivilegeMode::Vs) << 8);
                self.mode = PrivilegeMode::Vs;
                self.virt = true;
                self.pc = align_pc(self.handler_pc(self.vstvec, cause_code, is_interrupt), compressed);
            }
            PrivilegeMode::U | PrivilegeMode::Vu => unreachable!("exception_target never selects U/VU"),
        }

        if !self.config.preserve_reservation_across_trap {
            self.exclusive_tag = None;
        }
        self.pc = self.custom_handler_pc(self.pc, cause_code, is_interrupt);
        self.notify_extensions_trap(cause_code, target);
        self.refresh_pending_and_enabled();
    }

    fn handler_pc(&self, tvec: u64, cause: u64, is_interrupt: bool) -> u64 {
        let clic_mode = self.config.interrupt.clic_enabled && tvec & 0x40 != 0;
        let mode = VectorMode::decode(tvec & 0x3, clic_mode);
        vector_pc(mode, tvec, cause, is_interrupt)
    }

    /// Smrnmi entry: captures `mnepc`/`mncause`/`mnstatus`, clears `NMIE`,
    /// and redirects to `mnvec`/`nmiexc_addr` (§4.4 "RNMI").
    fn enter_nmi(&mut self) {
        self.mnepc = self.pc;
        self.mncause = self.net.nmi_cause;
        self.mnstatus = (self.mnstatus & !(MNSTATUS_NMIE | MNSTATUS_MNPP | MNSTATUS_MNPV))
            | (u64::from(self.mode.encoding()) << MNSTATUS_MNPP_SHIFT)
            | (u64::from(self.virt) << 7);
        self.mode = PrivilegeMode::M;
        self.virt = false;
        self.pc = if self.config.interrupt.rnmi_enabled {
            self.net.nmi_addr
        } else {
            self.config.interrupt.nmi_exception_address
        };
        if !self.config.preserve_reservation_across_trap {
            self.exclusive_tag = None;
        }
        self.refresh_pending_and_enabled();
    }

    /// `mret`/`sret`/`mnret`: restores mode/virt/PC from the saved context
    /// for the mode the instruction was executed from.
    ///
    /// # Errors
    /// [`Trap::IllegalInstruction`] if `from` is not implemented or the
    /// current mode lacks the privilege to execute the return.
    pub fn xret(&mut self, from: PrivilegeMode) -> Result<u64, Trap> {
        if self.mode.demote_virtual().privilege_rank() < from.demote_virtual().privilege_rank() {
            return Err(Trap::IllegalInstruction(0));
        }
        match from {
            PrivilegeMode::M => {
                let mpp = (self.mstatus & MSTATUS_MPP) >> MSTATUS_MPP_SHIFT;
                let mpv = self.mstatus & MSTATUS_MPV != 0;
                let mpie = self.mstatus & MSTATUS_MPIE != 0;
                self.mstatus = (self.mstatus & !(MSTATUS_MIE | MSTATUS_MPP | MSTATUS_MPV | MSTATUS_MPRV))
                    | (u64::from(mpie) << 3)
                    | (1 << 7)
                    | if PrivilegeMode::decode(mpp as u8, mpv).demote_virtual() != PrivilegeMode::M { 0 } else { self.mstatus & MSTATUS_MPRV };
                self.mode = PrivilegeMode::decode(mpp as u8, mpv);
                self.virt = mpv && (mpp as u8) != 3;
                self.pc = self.mepc;
            }
            PrivilegeMode::Hs => {
                let spp = self.mstatus & MSTATUS_SPP != 0;
                let spie = self.mstatus & MSTATUS_SPIE != 0;
                let spv = self.hstatus & HSTATUS_SPV != 0;
                self.mstatus = (self.mstatus & !(MSTATUS_SIE | MSTATUS_SPP))
                    | (u64::from(spie) << 1)
                    | (1 << 5);
                self.mode = PrivilegeMode::decode(u8::from(spp), spv);
                self.virt = spv;
                self.pc = self.sepc;
            }
            PrivilegeMode::Vs => {
                let spp = self.vsstatus & MSTATUS_SPP != 0;
                let spie = self.vsstatus & MSTATUS_SPIE != 0;
                self.vsstatus = (self.vsstatus & !(MSTATUS_SIE | MSTATUS_SPP))
                    | (u64::from(spie) << 1)
                    | (1 << 5);
                self.mode = if spp { PrivilegeMode::Vs } else { PrivilegeMode::Vu };
                self.virt = true;
                self.pc = self.vsepc;
            }
            PrivilegeMode::U | PrivilegeMode::Vu => return Err(Trap::IllegalInstruction(0)),
        }
        self.refresh_arch();
        self.refresh_pending_and_enabled();
        Ok(self.pc)
    }

    /// `mnret`: Smrnmi resumption, restoring mode/virt/PC from
    /// `mnepc`/`mnstatus` and setting `NMIE` so a further NMI can be taken.
    ///
    /// # Errors
    /// [`Trap::IllegalInstruction`] if not executed from M-mode.
    pub fn mnret(&mut self) -> Result<u64, Trap> {
        if self.mode != PrivilegeMode::M {
            return Err(Trap::IllegalInstruction(0));
        }
        let mnpp = (self.mnstatus & MNSTATUS_MNPP) >> MNSTATUS_MNPP_SHIFT;
        let mnpv = self.mnstatus & MNSTATUS_MNPV != 0;
        self.mnstatus |= MNSTATUS_NMIE;
        self.mode = PrivilegeMode::decode(mnpp as u8, mnpv);
        self.virt = mnpv && mnpp as u8 != 3;
        self.pc = self.mnepc;
        self.refresh_arch();
        self.refresh_pending_and_enabled();
        Ok(self.pc)
    }

    fn enter_debug(&mut self, cause: EntryCause) {
        if !self.config.isa.has_extra("Sdext") {
            return;
        }
        self.debug.enter(cause, self.pc, self.mode, self.virt);
        self.disable.insert(crate::core::hart::DisableReasons::DEBUG);
    }

    /// `dret`: resumes from debug mode, restoring mode/virt/PC captured at
    /// entry.
    pub fn dret(&mut self) {
        let (mode, virt, pc) = self.debug.exit();
        self.mode = mode;
        self.virt = virt;
        self.pc = pc;
        self.disable.remove(crate::core::hart::DisableReasons::DEBUG);
        self.refresh_arch();
        self.refresh_pending_and_enabled();
    }
}
