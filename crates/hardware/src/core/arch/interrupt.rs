//! Interrupt Controller.
//!
//! Computes, whenever pending or enable state changes, the single
//! highest-priority interrupt that is locally pending, globally enabled,
//! and delegated to the correct target privilege. Supports basic
//! (CLINT-style), CLIC, and AIA sources concurrently (§4.3).

use crate::core::arch::mode::PrivilegeMode;

/// Standard interrupt cause numbers (`mip`/`mie` bit positions), shared by
/// the basic delegation path and the AIA `xiprio` arrays.
#[derive(Clone, Copy, Debug, PartialEq, Eq, PartialOrd, Ord, Hash)]
#[repr(u8)]
pub enum Cause {
    /// Supervisor software interrupt.
    Ssi = 1,
    /// Virtual supervisor software interrupt.
    Vssi = 2,
    /// Machine software interrupt.
    Msi = 3,
    /// Supervisor timer interrupt.
    Sti = 5,
    /// Virtual supervisor timer interrupt.
    Vsti = 6,
    /// Machine timer interrupt.
    Mti = 7,
    /// Supervisor external interrupt.
    Sei = 9,
    /// Virtual supervisor external interrupt.
    Vsei = 10,
    /// Machine external interrupt.
    Mei = 11,
    /// Supervisor guest external interrupt.
    Sgei = 12,
}

impl Cause {
    /// Fixed major-priority rank used when two candidates tie on target
    /// mode: MEI > MSI > MTI > SEI > SSI > STI > SGEI > VS-equivalents,
    /// per §4.3. Lower numeric rank wins.
    #[must_use]
    pub const fn major_rank(self) -> u8 {
        match self {
            Self::Mei => 0,
            Self::Msi => 1,
            Self::Mti => 2,
            Self::Sei => 3,
            Self::Ssi => 4,
            Self::Sti => 5,
            Self::Sgei => 6,
            Self::Vsei => 7,
            Self::Vssi => 8,
            Self::Vsti => 9,
        }
    }

    /// Bit position within `mip`/`mie`/`hip`/`hie` etc.
    #[must_use]
    pub const fn bit(self) -> u64 {
        1u64 << (self as u8)
    }
}

/// The single highest-priority interrupt currently pending and enabled, as
/// last computed by [`InterruptController::refresh`].
#[derive(Clone, Copy, Debug, PartialEq, Eq)]
pub struct PendingInterrupt {
    /// Architectural cause number (without the interrupt bit).
    pub cause: u64,
    /// Mode the Trap Engine should transition to.
    pub target: PrivilegeMode,
    /// `Smaia` minor priority used to break ties among same-major-rank causes.
    pub minor_priority: u8,
    /// `true` if this is a CLIC-presented interrupt, which bypasses the
    /// basic per-mode global-enable rule.
    pub from_clic: bool,
}

/// Level/edge-latched pending-interrupt sources feeding the controller:
/// externally-driven (`ip`), software-written (`swip`), and the S-mode
/// virtual-interrupt enable (`svie`, Smaia).
#[derive(Clone, Copy, Debug, Default, PartialEq, Eq)]
pub struct PendingSources {
    /// Externally-sourced pending bits (one per net port in §6's table).
    pub ip: u64,
    /// Software-written pending bits (`sip`/`hvip` writable subset).
    pub swip: u64,
    /// `menvcfg.STCE`/`henvcfg.STCE`-derived `STIP`/`VSTIP`, computed by
    /// the Sstc comparator rather than latched here.
    pub stimecmp_tip: bool,
    /// Sstc VS-level derived timer pending.
    pub vstimecmp_tip: bool,
}

/// CLIC-presented interrupt, supplied by an external CLIC collaborator or
/// an internally-implemented one (§4.3 "CLIC mode").
#[derive(Clone, Copy, Debug, PartialEq, Eq)]
pub struct ClicPresented {
    /// Cause/interrupt-id presented by the CLIC.
    pub id: u64,
    /// CLIC interrupt level (compared against `xintstatus`/`xintthresh`).
    pub level: u8,
    /// Target privilege mode.
    pub priv_mode: PrivilegeMode,
    /// Selective Hardware Vectoring bit.
    pub shv: bool,
}

/// Inputs the Interrupt Controller reads every time it refreshes. All
/// fields are snapshots of CSR/config state owned by [`crate::core::hart::Hart`];
/// the controller itself holds no CSR storage.
#[derive(Clone, Copy, Debug, Default)]
pub struct InterruptInputs {
    pub mie: u64,
    pub mideleg: u64,
    pub hideleg: u64,
    pub sideleg: u64,
    pub mvien: u64,
    pub hvien: u64,
    pub mvip_virtual: u64,
    pub hvip_virtual: u64,
    pub hvictl_vti: bool,
    pub hvictl_iid: u16,
    pub hvictl_iprio: u8,
    pub mstatus_mie: bool,
    pub mstatus_sie: bool,
    pub vsstatus_sie: bool,
    pub current_mode: PrivilegeMode,
    pub clic_enabled: bool,
    pub clic: Option<ClicPresented>,
    pub mintstatus_mil: u8,
    pub mintthresh: u8,
    pub sintstatus_sil: u8,
    pub sintthresh: u8,
    pub xiprio: [u8; 64],
    pub step_masks_interrupts: bool,
}

/// Pure function computing the Interrupt Controller's output from a
/// snapshot of inputs; holds no state of its own beyond the last result,
/// which [`crate::core::hart::Hart`] uses for "did it change" tracing.
#[derive(Clone, Copy, Debug, Default)]
pub struct InterruptController {
    last: Option<PendingInterrupt>,
}

impl InterruptController {
    /// Computes `ip = mie & mip & ~disable_mask` where `mip` is built from
    /// `ip | swip | derived-timer-pending`, then runs the full §4.3
    /// pending/priority/enable pipeline, updating and returning the new
    /// result.
    pub fn refresh(
        &mut self,
        sources: PendingSources,
        inputs: &InterruptInputs,
    ) -> Option<PendingInterrupt> {
        if inputs.step_masks_interrupts {
            self.last = None;
            return None;
        }

        let mip = sources.ip
            | sources.swip
            | (u64::from(sources.stimecmp_tip) << Cause::Sti as u8)
            | (u64::from(sources.vstimecmp_tip) << Cause::Vsti as u8);
        let pending = inputs.mie & mip;

        let m_set = pending & !inputs.mideleg;
        let s_set = pending & inputs.mideleg & !(inputs.hideleg | inputs.sideleg);
        let vs_basic = shift_vs_to_s(pending & inputs.hideleg);
        let vs_from_mvien = shift_vs_to_s(inputs.mvip_virtual & inputs.mvien & inputs.hideleg);
        let vs_from_hvien = shift_vs_to_s(inputs.hvip_virtual & inputs.hvien);
        let mut vs_set = vs_basic | vs_from_mvien | vs_from_hvien;

        if inputs.hvictl_vti && inputs.hvictl_iid != 9 {
            vs_set |= 1u64 << inputs.hvictl_iid;
        }

        let candidate = best_of(m_set, PrivilegeMode::M, &inputs.xiprio)
            .into_iter()
            .chain(best_of(s_set, PrivilegeMode::Hs, &inputs.xiprio))
            .chain(best_of(vs_set, PrivilegeMode::Vs, &inputs.xiprio))
            .max_by(|a, b| {
                rank_of(a.cause).cmp(&rank_of(b.cause)).reverse().then(a.minor_priority.cmp(&b.minor_priority))
            });

        let basic_result = candidate.filter(|c| globally_enabled(c, inputs));

        let result = if let Some(clic) = inputs.clic.filter(|_| inputs.clic_enabled) {
            if clic_accepted(&clic, inputs) {
                Some(PendingInterrupt {
                    cause: clic.id,
                    target: clic.priv_mode,
                    minor_priority: 0,
                    from_clic: true,
                })
            } else {
                basic_result
            }
        } else {
            basic_result
        };

        if result != self.last {
            tracing::debug!(?result, "interrupt controller: pending/enabled changed");
        }
        self.last = result;
        result
    }

    /// The last computed result without recomputing.
    #[must_use]
    pub const fn current(&self) -> Option<PendingInterrupt> {
        self.last
    }

    /// `true` if any locally-enabled interrupt is pending, ignoring the
    /// global `xIE` gate. Used to wake a hart parked in `wfi`, which must
    /// wake on a merely locally-enabled interrupt even if globally masked
    /// (§9 "two predicates, not one").
    #[must_use]
    pub fn any_pending_and_locally_enabled(sources: PendingSources, inputs: &InterruptInputs) -> bool {
        let mip = sources.ip
            | sources.swip
            | (u64::from(sources.stimecmp_tip) << Cause::Sti as u8)
            | (u64::from(sources.vstimecmp_tip) << Cause::Vsti as u8);
        (inputs.mie & mip) != 0 || inputs.clic.is_some()
    }
}

fn shift_vs_to_s(bits: u64) -> u64 {
    // VSSIP/VSTIP/VSEIP (bits 2/6/10) re-alias to SSIP/STIP/SEIP (1/5/9)
    // positions for software running in VS, per §4.3 step 2.
    let mut out = 0;
    if bits & Cause::Vssi.bit() != 0 {
        out |= Cause::Ssi.bit();
    }
    if bits & Cause::Vsti.bit() != 0 {
        out |= Cause::Sti.bit();
    }
    if bits & Cause::Vsei.bit() != 0 {
        out |= Cause::Sei.bit();
    }
    out
}

const fn rank_of(cause: u64) -> u8 {
    match cause {
        x if x == Cause::Mei as u64 => Cause::Mei.major_rank(),
        x if x == Cause::Msi as u64 => Cause::Msi.major_rank(),
        x if x == Cause::Mti as u64 => Cause::Mti.major_rank(),
        x if x == Cause::Sei as u64 => Cause::Sei.major_rank(),
        x if x == Cause::Ssi as u64 => Cause::Ssi.major_rank(),
        x if x == Cause::Sti as u64 => Cause::Sti.major_rank(),
        x if x == Cause::Sgei as u64 => Cause::Sgei.major_rank(),
        _ => 255,
    }
}

fn best_of(set: u64, target: PrivilegeMode, xiprio: &[u8; 64]) -> Option<PendingInterrupt> {
    if set == 0 {
        return None;
    }
    (0..64)
        .filter(|b| set & (1 << b) != 0)
        .map(|b| PendingInterrupt {
            cause: b,
            target,
            minor_priority: xiprio.get(b as usize).copied().unwrap_or(0),
            from_clic: false,
        })
        .max_by(|a, b| rank_of(a.cause).cmp(&rank_of(b.cause)).reverse().then(a.minor_priority.cmp(&b.minor_priority)))
}

fn globally_enabled(candidate: &PendingInterrupt, inputs: &InterruptInputs) -> bool {
    use std::cmp::Ordering;
    use PrivilegeMode::{Hs, M, Vs};
    let current_rank = inputs.current_mode.privilege_rank();
    match candidate.target {
        // M is always the highest rank, so every other mode is unconditionally
        // "below M" here; only a hart already running in M gates on MIE.
        M => inputs.mstatus_mie || current_rank < M.privilege_rank(),
        // Rank-based, not virtual-gated: Vs ranks below Hs (a guest is less
        // privileged than the hypervisor supervising it), so an HS-targeted
        // interrupt must preempt Vu/U/Vs exactly as it preempts U, without
        // excluding V-mode altogether (§4.3).
        Hs => match current_rank.cmp(&Hs.privilege_rank()) {
            Ordering::Less => true,
            Ordering::Equal => inputs.mstatus_sie,
            Ordering::Greater => false,
        },
        // VS-targeted interrupts are only ever enabled while running in
        // V-mode (§4.3 "To VS: ... in V mode"); Vu always ranks below Vs.
        Vs => {
            inputs.current_mode.is_virtual()
                && match current_rank.cmp(&Vs.privilege_rank()) {
                    Ordering::Less => true,
                    Ordering::Equal => inputs.vsstatus_sie,
                    Ordering::Greater => false,
                }
        }
        _ => false,
    }
}

fn clic_accepted(clic: &ClicPresented, inputs: &InterruptInputs) -> bool {
    let ie = match clic.priv_mode {
        PrivilegeMode::M => inputs.mstatus_mie,
        PrivilegeMode::Hs => inputs.mstatus_sie,
        PrivilegeMode::Vs => inputs.vsstatus_sie,
        _ => false,
    };
    if !ie {
        return false;
    }
    inputs.current_mode.privilege_rank() < clic.priv_mode.privilege_rank()
        || (clic.level > inputs.mintstatus_mil && clic.level > inputs.mintthresh)
        || (clic.level > inputs.sintstatus_sil && clic.level > inputs.sintthresh)
}
