//! Persistence (§6 "Persisted state"): a flat, serializable capture of every
//! piece of architectural state the Hart owns, plus `Hart::snapshot`/
//! `Hart::restore`.
//!
//! `HartSnapshot` is a plain data struct rather than a direct derive on
//! `Hart` itself, since `Hart` holds non-serializable collaborator state
//! (`extension_hooks`, `NetPorts`) that has no business surviving a
//! save/restore cycle — those are rebuilt by the caller around the restored
//! architectural state.

use std::collections::HashMap;

use serde::{Deserialize, Serialize};

use crate::core::arch::debug::DebugSnapshot;
use crate::core::arch::mode::PrivilegeMode;
use crate::core::arch::trigger::TriggerSlot;
use crate::core::hart::{AiaState, DisableReasons, Hart};

/// A complete, serializable snapshot of one hart's architectural state.
///
/// Width is canonicalized to the hart's current `misa.MXL` on
/// [`Hart::snapshot`]: every general CSR-shaped field is masked to 32 bits
/// when `MXL` reads 32, so a snapshot taken mid-execution never captures
/// garbage in bits the architecture says are not there. [`Hart::restore`]
/// does not need to re-widen anything — the stored `u64` already holds the
/// canonical value for whichever width it was saved at, and `misa` itself
/// (never masked) tells the restored hart what that width was.
#[derive(Clone, Debug, Serialize, Deserialize)]
pub struct HartSnapshot {
    mode: u8,
    virt: bool,
    pc: u64,

    mstatus: u64,
    misa: u64,
    medeleg: u64,
    mideleg: u64,
    hedeleg: u64,
    hideleg: u64,
    sedeleg: u64,
    sideleg: u64,
    mie: u64,
    mtvec: u64,
    stvec: u64,
    vstvec: u64,
    mscratch: u64,
    sscratch: u64,
    vsscratch: u64,
    mepc: u64,
    sepc: u64,
    vsepc: u64,
    mcause: u64,
    scause: u64,
    vscause: u64,
    mtval: u64,
    stval: u64,
    vstval: u64,
    mtval2: u64,
    mtinst: u64,
    htval: u64,
    htinst: u64,
    hstatus: u64,
    vsstatus: u64,

    satp: u64,
    vsatp: u64,
    hgatp: u64,

    mcounteren: u64,
    scounteren: u64,
    hcounteren: u64,
    mcountinhibit: u64,
    base_cycles: u64,
    base_instrs: u64,
    mtime: u64,

    menvcfg: u64,
    henvcfg: u64,
    senvcfg: u64,
    mseccfg: u64,

    stimecmp: u64,
    vstimecmp: u64,

    mnscratch: u64,
    mnepc: u64,
    mncause: u64,
    mnstatus: u64,

    mstateen0: u64,
    hstateen0: u64,
    sstateen0: u64,

    pmpcfg: [u8; 64],
    pmpaddr: [u64; 64],

    mvien: u64,
    mvip: u64,
    hvien: u64,
    hvip: u64,
    hvictl: u64,
    hviprio: [u64; 2],
    hgeie: u64,
    hgeip: u64,
    htimedelta: u64,
    aia: AiaState,
    mintstatus_mil: u8,
    sintstatus_sil: u8,
    mintthresh: u8,
    sintthresh: u8,

    ip: u64,
    swip: u64,
    svie: bool,

    triggers: Vec<TriggerSlot>,
    triggers_m_mode_enabled: bool,
    debug: DebugSnapshot,

    exclusive_tag: Option<u64>,
    disable: u8,
    tselect: usize,
    /// `(id, level, priv_mode as full_repr, shv)`, or `None` if no CLIC
    /// interrupt was presented at snapshot time.
    clic_sel: Option<(u64, u8, u8, bool)>,

    csr_storage: HashMap<u32, u64>,
}

fn mxl_is_32(misa: u64) -> bool {
    (misa >> 62) & 0b11 == 1
}

fn canon(misa: u64, v: u64) -> u64 {
    if mxl_is_32(misa) {
        v & 0xFFFF_FFFF
    } else {
        v
    }
}

impl Hart {
    /// Captures the complete architectural state of this hart (§6). Does
    /// not capture boot-time `config`, registered extension hooks, or the
    /// external [`crate::collab::NetPorts`] wiring — those belong to
    /// whoever owns the hart across a restore, not to the hart's own
    /// architectural state.
    #[must_use]
    pub fn snapshot(&self) -> HartSnapshot {
        let m = self.misa;
        let c = |v: u64| canon(m, v);
        HartSnapshot {
            mode: self.mode.full_repr(),
            virt: self.virt,
            pc: c(self.pc),

            mstatus: c(self.mstatus),
            misa: self.misa,
            medeleg: c(self.medeleg),
            mideleg: c(self.mideleg),
            hedeleg: c(self.hedeleg),
            hideleg: c(self.hideleg),
            sedeleg: c(self.sedeleg),
            sideleg: c(self.sideleg),
            mie: c(self.mie),
            mtvec: c(self.mtvec),
            stvec: c(self.stvec),
            vstvec: c(self.vstvec),
            mscratch: c(self.mscratch),
            sscratch: c(self.sscratch),
            vsscratch: c(self.vsscratch),
            mepc: c(self.mepc),
            sepc: c(self.sepc),
            vsepc: c(self.vsepc),
            mcause: c(self.mcause),
            scause: c(self.scause),
            vscause: c(self.vscause),
            mtval: c(self.mtval),
            stval: c(self.stval),
            vstval: c(self.vstval),
            mtval2: c(self.mtval2),
            mtinst: c(self.mtinst),
            htval: c(self.htval),
            htinst: c(self.htinst),
            hstatus: c(self.hstatus),
            vsstatus: c(self.vsstatus),

            satp: c(self.satp),
            vsatp: c(self.vsatp),
            hgatp: c(self.hgatp),

            mcounteren: self.mcounteren,
            scounteren: self.scounteren,
            hcounteren: self.hcounteren,
            mcountinhibit: self.mcountinhibit,
            base_cycles: self.base_cycles,
            base_instrs: self.base_instrs,
            mtime: self.mtime,

            menvcfg: c(self.menvcfg),
            henvcfg: c(self.henvcfg),
            senvcfg: c(self.senvcfg),
            mseccfg: c(self.mseccfg),

            stimecmp: self.stimecmp,
            vstimecmp: self.vstimecmp,

            mnscratch: c(self.mnscratch),
            mnepc: c(self.mnepc),
            mncause: c(self.mncause),
            mnstatus: c(self.mnstatus),

            mstateen0: self.mstateen0,
            hstateen0: self.hstateen0,
            sstateen0: self.sstateen0,

            pmpcfg: self.pmpcfg,
            pmpaddr: self.pmpaddr,

            mvien: c(self.mvien),
            mvip: c(self.mvip),
            hvien: c(self.hvien),
            hvip: c(self.hvip),
            hvictl: c(self.hvictl),
            hviprio: self.hviprio,
            hgeie: self.hgeie,
            hgeip: self.hgeip,
            htimedelta: self.htimedelta,
            aia: self.aia,
            mintstatus_mil: self.mintstatus_mil,
            sintstatus_sil: self.sintstatus_sil,
            mintthresh: self.mintthresh,
            sintthresh: self.sintthresh,

            ip: self.ip,
            swip: self.swip,
            svie: self.svie,

            triggers: self.triggers.slots().to_vec(),
            triggers_m_mode_enabled: self.triggers.m_mode_enabled,
            debug: self.debug.snapshot(),

            exclusive_tag: self.exclusive_tag,
            disable: self.disable.bits(),
            tselect: self.tselect,
            clic_sel: self.clic_sel.map(|c| (c.id, c.level, c.priv_mode.full_repr(), c.shv)),

            csr_storage: self.csrs.snapshot_storage(),
        }
    }

    /// Restores architectural state previously captured by
    /// [`Self::snapshot`]. The hart must already be constructed with a
    /// [`crate::config::HartConfig`] compatible with the snapshot (same trigger count,
    /// same extension-registered CSRs); mismatched trigger counts are
    /// truncated/zero-extended rather than rejected, since a narrowing
    /// reconfiguration across a restore is a caller error this crate has
    /// no way to detect from the flat snapshot alone.
    pub fn restore(&mut self, snap: HartSnapshot) {
        self.mode = PrivilegeMode::from_full_repr(snap.mode);
        self.virt = snap.virt;
        self.pc = snap.pc;

        self.mstatus = snap.mstatus;
        self.misa = snap.misa;
        self.medeleg = snap.medeleg;
        self.mideleg = snap.mideleg;
        self.hedeleg = snap.hedeleg;
        self.hideleg = snap.hideleg;
        self.sedeleg = snap.sedeleg;
        self.sideleg = snap.sideleg;
        self.mie = snap.mie;
        self.mtvec = snap.mtvec;
        self.stvec = snap.stvec;
        self.vstvec = snap.vstvec;
        self.mscratch = snap.mscratch;
        self.sscratch = snap.sscratch;
        self.vsscratch = snap.vsscratch;
        self.mepc = snap.mepc;
        self.sepc = snap.sepc;
        self.vsepc = snap.vsepc;
        self.mcause = snap.mcause;
        self.scause = snap.scause;
        self.vscause = snap.vscause;
        self.mtval = snap.mtval;
        self.stval = snap.stval;
        self.vstval = snap.vstval;
        self.mtval2 = snap.mtval2;
        self.mtinst = snap.mtinst;
        self.htval = snap.htval;
        self.htinst = snap.htinst;
        self.hstatus = snap.hstatus;
        self.vsstatus = snap.vsstatus;

        self.satp = snap.satp;
        self.vsatp = snap.vsatp;
        self.hgatp = snap.hgatp;

        self.mcounteren = snap.mcounteren;
        self.scounteren = snap.scounteren;
        self.hcounteren = snap.hcounteren;
        self.mcountinhibit = snap.mcountinhibit;
        self.base_cycles = snap.base_cycles;
        self.base_instrs = snap.base_instrs;
        self.mtime = snap.mtime;

        self.menvcfg = snap.menvcfg;
        self.henvcfg = snap.henvcfg;
        self.senvcfg = snap.senvcfg;
        self.mseccfg = snap.mseccfg;

        self.stimecmp = snap.stimecmp;
        self.vstimecmp = snap.vstimecmp;

        self.mnscratch = snap.mnscratch;
        self.mnepc = snap.mnepc;
        self.mncause = snap.mncause;
        self.mnstatus = snap.mnstatus;

        self.mstateen0 = snap.mstateen0;
        self.hstateen0 = snap.hstateen0;
        self.sstateen0 = snap.sstateen0;

        self.pmpcfg = snap.pmpcfg;
        self.pmpaddr = snap.pmpaddr;

        self.mvien = snap.mvien;
        self.mvip = snap.mvip;
        self.hvien = snap.hvien;
        self.hvip = snap.hvip;
        self.hvictl = snap.hvictl;
        self.hviprio = snap.hviprio;
        self.hgeie = snap.hgeie;
        self.hgeip = snap.hgeip;
        self.htimedelta = snap.htimedelta;
        self.aia = snap.aia;
        self.mintstatus_mil = snap.mintstatus_mil;
        self.sintstatus_sil = snap.sintstatus_sil;
        self.mintthresh = snap.mintthresh;
        self.sintthresh = snap.sintthresh;

        self.ip = snap.ip;
        self.swip = snap.swip;
        self.svie = snap.svie;

        self.triggers.m_mode_enabled = snap.triggers_m_mode_enabled;
        for (i, slot) in snap.triggers.into_iter().enumerate() {
            self.triggers.restore_slot(i, slot);
        }
        self.debug.restore(snap.debug);

        self.exclusive_tag = snap.exclusive_tag;
        self.disable = DisableReasons::from_bits(snap.disable);
        self.tselect = snap.tselect;
        self.clic_sel = snap.clic_sel.map(|(id, level, priv_mode, shv)| crate::core::arch::interrupt::ClicPresented {
            id,
            level,
            priv_mode: PrivilegeMode::from_full_repr(priv_mode),
            shv,
        });

        self.csrs.restore_storage(snap.csr_storage);

        self.refresh_arch();
        self.refresh_pending_and_enabled();
    }
}
