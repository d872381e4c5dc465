//! Trigger Engine (Sdtrig).
//!
//! Implements hardware address/data/instruction-count/exception/interrupt
//! triggers with chaining, before/after timing, and action selection
//! between a breakpoint exception and debug-mode entry (§4.5). Per-access
//! evaluation entry points mirror the shape of the original per-access-type
//! hooks (execute/load-address/load-value/store, plus after/interrupt/
//! exception/NMI) rather than one method per instruction encoding width,
//! since instruction decode is outside this crate.

use serde::{Deserialize, Serialize};

use crate::common::data::AccessType;
use crate::core::arch::mode::PrivilegeMode;

/// Match encoding for address/data triggers (`tdata1.match`), §4.5.
#[derive(Clone, Copy, Debug, PartialEq, Eq, Serialize, Deserialize)]
pub enum MatchKind {
    /// Exact equality against `tdata2`.
    Equal,
    /// Naturally-aligned power-of-two range.
    Napot,
    /// Greater-than-or-equal.
    Ge,
    /// Less-than.
    Lt,
    /// Low half of the compare value matches `tdata2`'s low half.
    LowHalf,
    /// High half of the compare value matches `tdata2`'s high half.
    HighHalf,
    /// Negation of `Equal`.
    NotEqual,
}

/// What a matching trigger (or chain) does.
#[derive(Clone, Copy, Debug, PartialEq, Eq, Serialize, Deserialize)]
pub enum Action {
    /// Raises [`crate::common::error::Trap::Breakpoint`].
    Breakpoint,
    /// Enters debug mode via [`crate::core::arch::debug::EntryCause::Trigger`].
    DebugEntry,
}

/// Before vs after instruction-timing for a trigger's action.
#[derive(Clone, Copy, Debug, PartialEq, Eq, Serialize, Deserialize)]
pub enum Timing {
    /// Fires before the triggering instruction executes.
    Before,
    /// Fires after the triggering instruction completes, as a synchronous
    /// event handled at the start of the next instruction.
    After,
}

/// Discriminated trigger type (`tdata1.type`).
#[derive(Clone, Copy, Debug, PartialEq, Eq, Serialize, Deserialize)]
pub enum TriggerKind {
    /// Unused slot.
    None,
    /// Legacy address/data match (`mcontrol`, type 2).
    AddrData,
    /// Address/data match with extended `size`/`select` fields (`mcontrol6`, type 6).
    AddrData6,
    /// Instruction-count single-step trigger (`icount`, type 3).
    InstructionCount { count: u16, pending: bool },
    /// Interrupt-cause trigger (`itrigger`, type 4).
    Interrupt,
    /// Exception-cause trigger (`etrigger`, type 5).
    Exception,
}

/// One trigger slot's unpacked state (§3 `triggers[]`).
#[derive(Clone, Copy, Debug, Serialize, Deserialize)]
pub struct TriggerSlot {
    pub kind: TriggerKind,
    /// Debug-mode-only bit; can only be set while the hart is in debug mode.
    pub dmode: bool,
    pub action: Action,
    pub timing: Timing,
    /// Privilege modes this trigger is armed for (bit per [`PrivilegeMode::encoding`]
    /// value, plus a separate virtual-mode bit per RISC-V `vu`/`vs` fields).
    pub modes: u8,
    pub modes_virtual: u8,
    /// `true` if this trigger continues a chain with the next-higher index.
    pub chain: bool,
    /// Match kind for address/data triggers.
    pub match_kind: MatchKind,
    /// `select`: compare address (`false`) or data value (`true`).
    pub select_data: bool,
    /// Access direction mask: bit0=load, bit1=store, bit2=execute.
    pub access_mask: u8,
    /// `tdata2`: compare value.
    pub compare: u64,
    /// Cycle this trigger last matched, for chain-same-cycle verification.
    pub match_cycle: Option<u64>,
    /// Whether this trigger has fired and is latched (`tdata1.hit`).
    pub hit: bool,
}

impl Default for TriggerSlot {
    fn default() -> Self {
        Self {
            kind: TriggerKind::None,
            dmode: false,
            action: Action::Breakpoint,
            timing: Timing::Before,
            modes: 0,
            modes_virtual: 0,
            chain: false,
            match_kind: MatchKind::Equal,
            select_data: false,
            access_mask: 0,
            compare: 0,
            match_cycle: None,
            hit: false,
        }
    }
}

/// Result of evaluating all triggers against one memory/fetch access.
#[derive(Clone, Copy, Debug, PartialEq, Eq)]
pub struct TriggerVerdict {
    pub action: Action,
    pub timing: Timing,
    /// Index of the last trigger in the firing chain, used to report
    /// `mcontrol.hit`/`tval` from the right slot.
    pub chain_tail: usize,
}

/// Owns the fixed-size trigger array and implements match/chain/action
/// computation. Holds no privilege-mode or CSR state of its own; callers
/// supply the current cycle and access context per call.
#[derive(Clone, Debug)]
pub struct TriggerEngine {
    slots: Vec<TriggerSlot>,
    /// `tcontrol.mte`: M-mode breakpoint-action triggers are suppressed
    /// unless this is set (§4.5 "M-mode gating").
    pub m_mode_enabled: bool,
}

impl TriggerEngine {
    /// Builds an engine with `count` trigger slots, all initially `None`.
    #[must_use]
    pub fn new(count: usize) -> Self {
        Self { slots: vec![TriggerSlot::default(); count], m_mode_enabled: false }
    }

    /// Number of implemented trigger slots.
    #[must_use]
    pub fn len(&self) -> usize {
        self.slots.len()
    }

    /// `true` if no triggers are implemented.
    #[must_use]
    pub fn is_empty(&self) -> bool {
        self.slots.is_empty()
    }

    /// Read access to one slot, for `tdata1`/`tdata2` readback.
    #[must_use]
    pub fn slot(&self, i: usize) -> Option<&TriggerSlot> {
        self.slots.get(i)
    }

    /// All implemented slots in order, for persistence (§6).
    #[must_use]
    pub fn slots(&self) -> &[TriggerSlot] {
        &self.slots
    }

    /// Mutable access to one slot, guarded by the `tdata1` write contract
    /// (§4.5): rejects setting `dmode=1` outside debug mode, and rejects it
    /// when the predecessor chains into this slot with `dmode=0`.
    pub fn write_slot(
        &mut self,
        i: usize,
        in_debug_mode: bool,
        f: impl FnOnce(&mut TriggerSlot),
    ) -> bool {
        if i >= self.slots.len() {
            return false;
        }
        let wants_dmode = {
            let mut probe = self.slots[i];
            f(&mut probe);
            probe.dmode
        };
        if wants_dmode && !in_debug_mode {
            return false;
        }
        if wants_dmode && i > 0 && !self.slots[i - 1].dmode && self.slots[i - 1].chain {
            return false;
        }
        f(&mut self.slots[i]);
        true
    }

    /// Overwrites a slot unconditionally, bypassing the `dmode` write
    /// contract enforced by [`Self::write_slot`]. Used only by snapshot
    /// restore, where the captured state is already known-consistent.
    pub fn restore_slot(&mut self, i: usize, slot: TriggerSlot) {
        if i < self.slots.len() {
            self.slots[i] = slot;
        }
    }

    /// Evaluates all enabled triggers against one access and returns the
    /// highest-priority verdict, if any chain fired. `data` is `None` for
    /// fetch/address-only evaluation.
    pub fn evaluate(
        &mut self,
        cycle: u64,
        access: AccessType,
        mode: PrivilegeMode,
        va: u64,
        data: Option<u64>,
        size: u32,
    ) -> Option<TriggerVerdict> {
        let access_bit = match access {
            AccessType::Read => 0b001,
            AccessType::Write => 0b010,
            AccessType::Fetch => 0b100,
        };
        let mode_bit = 1u8 << mode.demote_virtual().encoding();

        for i in 0..self.slots.len() {
            let armed = {
                let s = &self.slots[i];
                matches!(s.kind, TriggerKind::AddrData | TriggerKind::AddrData6)
                    && (s.access_mask & access_bit != 0)
                    && (if mode.is_virtual() { s.modes_virtual & mode_bit != 0 } else { s.modes & mode_bit != 0 })
            };
            if !armed {
                continue;
            }
            let compare_value = if self.slots[i].select_data { data.unwrap_or(0) } else { va };
            if matches(self.slots[i].match_kind, compare_value, self.slots[i].compare, size) {
                self.slots[i].match_cycle = Some(cycle);
            }
        }

        let mut best: Option<TriggerVerdict> = None;
        let mut i = 0;
        while i < self.slots.len() {
            if self.slots[i].match_cycle != Some(cycle) || !chain_head(&self.slots, i) {
                i += 1;
                continue;
            }
            let mut j = i;
            let mut all_matched = true;
            let mut timing = self.slots[i].timing;
            while self.slots[j].chain {
                if j + 1 >= self.slots.len() {
                    all_matched = false;
                    break;
                }
                if self.slots[j + 1].match_cycle != Some(cycle) || self.slots[j + 1].timing != timing {
                    all_matched = false;
                }
                j += 1;
                timing = self.slots[j].timing;
            }
            if all_matched {
                let action = self.slots[i].action;
                if action == Action::Breakpoint && mode == PrivilegeMode::M && !self.m_mode_enabled {
                    i = j + 1;
                    continue;
                }
                for slot in &mut self.slots[i..=j] {
                    slot.hit = true;
                }
                let verdict = TriggerVerdict { action, timing, chain_tail: j };
                best = Some(match best {
                    Some(prev) if prev.timing == Timing::Before => prev,
                    _ => verdict,
                });
            }
            i = j + 1;
        }
        best
    }

    /// Evaluates `icount` triggers after an instruction retires: each
    /// matching one decrements `count`, firing (and disarming, clearing
    /// `modes`/`pending`) when it reaches zero.
    pub fn on_instruction_retired(&mut self, mode: PrivilegeMode) -> Option<TriggerVerdict> {
        let mode_bit = 1u8 << mode.demote_virtual().encoding();
        for (i, slot) in self.slots.iter_mut().enumerate() {
            if let TriggerKind::InstructionCount { count, pending } = &mut slot.kind {
                let armed = if mode.is_virtual() { slot.modes_virtual & mode_bit != 0 } else { slot.modes & mode_bit != 0 };
                if !armed || *count == 0 {
                    continue;
                }
                *count -= 1;
                if *count == 0 {
                    *pending = true;
                    slot.modes = 0;
                    slot.modes_virtual = 0;
                    slot.hit = true;
                    return Some(TriggerVerdict { action: slot.action, timing: Timing::Before, chain_tail: i });
                }
            }
        }
        None
    }

    /// Sets the `icount` `pending` bit on every implemented `icount`
    /// trigger when the current instruction is about to trap, so the
    /// trigger matches the first instruction of the handler (§4.5).
    pub fn mark_icount_pending_on_trap(&mut self) {
        for slot in &mut self.slots {
            if let TriggerKind::InstructionCount { pending, .. } = &mut slot.kind {
                *pending = true;
            }
        }
    }

    /// Evaluates `etrigger` slots against an exception's cause code.
    pub fn on_exception(&mut self, ecode: u64) -> Option<TriggerVerdict> {
        self.on_cause(TriggerKind::Exception, ecode)
    }

    /// Evaluates `itrigger` slots against an interrupt's cause code.
    pub fn on_interrupt(&mut self, ecode: u64) -> Option<TriggerVerdict> {
        self.on_cause(TriggerKind::Interrupt, ecode)
    }

    fn on_cause(&mut self, want: TriggerKind, ecode: u64) -> Option<TriggerVerdict> {
        for (i, slot) in self.slots.iter_mut().enumerate() {
            if slot.kind == want && slot.compare & (1 << ecode) != 0 {
                slot.hit = true;
                return Some(TriggerVerdict { action: slot.action, timing: Timing::Before, chain_tail: i });
            }
        }
        None
    }

    /// Evaluates any trigger activated after the previous instruction
    /// completes (the `after`-timing half of [`Self::evaluate`]'s chains,
    /// consumed at the next instruction boundary by the Trap Engine).
    #[must_use]
    pub fn any_after_pending(&self) -> bool {
        self.slots.iter().any(|s| s.hit && s.timing == Timing::After)
    }

    /// Clears latched `hit` state for slots whose action has been consumed,
    /// called once the Trap Engine has delivered the corresponding event.
    pub fn clear_hit(&mut self, chain_tail: usize) {
        let mut i = chain_tail;
        self.slots[i].hit = false;
        while i > 0 && self.slots[i - 1].chain {
            i -= 1;
            self.slots[i].hit = false;
        }
    }
}

fn chain_head(slots: &[TriggerSlot], i: usize) -> bool {
    i == 0 || !slots[i - 1].chain
}

fn matches(kind: MatchKind, value: u64, compare: u64, size: u32) -> bool {
    let half = size.max(1) * 4;
    match kind {
        MatchKind::Equal => value == compare,
        MatchKind::NotEqual => value != compare,
        MatchKind::Ge => value >= compare,
        MatchKind::Lt => value < compare,
        MatchKind::Napot => {
            let range = (!compare).trailing_zeros().min(63);
            let base = compare & !((1u64 << range) - 1);
            value >= base && value < base + (1u64 << range)
        }
        MatchKind::LowHalf => (value & ((1u64 << half) - 1)) == (compare & ((1u64 << half) - 1)),
        MatchKind::HighHalf => (value >> half) == (compare >> half),
    }
}
