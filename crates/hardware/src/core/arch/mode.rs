//! Privilege modes and the composite architecture key.
//!
//! This module defines the five privilege levels the control-plane core
//! tracks and the "current architecture" key published on every mode or
//! width change so an external JIT can key translated code on it.

use std::fmt;

/// RISC-V privilege mode, including the virtualized (H-extension) pair.
///
/// `Hs`/`Vs`/`Vu` exist only once the H extension is implemented; a hart
/// without H never reports `virt == true`.
///
/// The discriminants below are chosen for `mstatus.MPP`/`dcsr.prv`-style
/// packing ([`Self::encoding`]) and persistence ([`Self::full_repr`]), not
/// for ordering: deriving `Ord` on this enum would order by discriminant
/// (`U(0) < Hs(1) < M(3) < Vu(4) < Vs(5)`), which is not the privilege
/// lattice. Code that needs "is the current mode less privileged than X"
/// must compare [`Self::privilege_rank`] instead.
#[derive(Clone, Copy, Debug, PartialEq, Eq, Hash)]
pub enum PrivilegeMode {
    /// User mode, non-virtualized.
    U = 0,
    /// Virtual user mode (guest application under a hypervisor).
    Vu = 4,
    /// Supervisor mode, non-virtualized (called HS once H is implemented).
    Hs = 1,
    /// Virtual supervisor mode (guest OS under a hypervisor).
    Vs = 5,
    /// Machine mode. Always non-virtualized.
    M = 3,
}

impl PrivilegeMode {
    /// Whether this mode runs with `mstatus.MPRV`-independent two-stage
    /// translation active, i.e. is one of the `V`-mode pair.
    #[must_use]
    pub const fn is_virtual(self) -> bool {
        matches!(self, Self::Vs | Self::Vu)
    }

    /// The non-virtual counterpart of this mode (`Vs -> Hs`, `Vu -> U`,
    /// others unchanged). Used when mapping a CSR's non-virtual alias.
    #[must_use]
    pub const fn demote_virtual(self) -> Self {
        match self {
            Self::Vs => Self::Hs,
            Self::Vu => Self::U,
            m => m,
        }
    }

    /// Numeric encoding used in `mstatus.MPP`/`dcsr.prv` (2 bits: U=0, S=1, M=3).
    #[must_use]
    pub const fn encoding(self) -> u8 {
        match self {
            Self::U | Self::Vu => 0,
            Self::Hs | Self::Vs => 1,
            Self::M => 3,
        }
    }

    /// Decodes a 2-bit privilege encoding plus a virtual flag into a mode.
    /// Unsupported encodings (2) promote to the next mode up, matching the
    /// address-decoded-mode promotion rule used by the CSR registry.
    #[must_use]
    pub const fn decode(bits: u8, virt: bool) -> Self {
        match (bits, virt) {
            (3, _) => Self::M,
            (1, false) => Self::Hs,
            (1, true) => Self::Vs,
            (0, false) => Self::U,
            (0, true) => Self::Vu,
            _ => Self::M,
        }
    }

    /// Privilege rank for "is this mode less/more privileged than X"
    /// comparisons (§4.3's per-target global-enable rule), lowest to
    /// highest: `Vu < U < Vs < Hs < M`. A virtual mode ranks one step below
    /// its non-virtual counterpart — from the hypervisor's point of view a
    /// guest running in `Vs`/`Vu` is less privileged than `Hs`/`U`, so an
    /// `Hs`-targeted interrupt must always preempt `Vs`, and an
    /// `M`-targeted interrupt must always preempt every other mode.
    /// Comparisons across the `{Vu, U}` vs `{Vs, Hs}` level only matter
    /// when both sides share the same `is_virtual()`-ness or one side is
    /// `M`; callers mixing levels (e.g. is a `Vs`-target interrupt
    /// deliverable to `U`) guard on [`Self::is_virtual`] separately, as
    /// `to VS`/`to VU` targets are only ever enabled in V-mode.
    #[must_use]
    pub const fn privilege_rank(self) -> u8 {
        match self {
            Self::Vu => 0,
            Self::U => 1,
            Self::Vs => 2,
            Self::Hs => 3,
            Self::M => 4,
        }
    }

    /// Full discriminant-preserving encoding, distinct from
    /// [`Self::encoding`] (which collapses the virtual/non-virtual pairs to
    /// the same 2-bit `mstatus.MPP` value). Used by persistence, where the
    /// virtual/non-virtual distinction must round-trip exactly.
    #[must_use]
    pub const fn full_repr(self) -> u8 {
        self as u8
    }

    /// Inverse of [`Self::full_repr`].
    #[must_use]
    pub const fn from_full_repr(bits: u8) -> Self {
        match bits {
            1 => Self::Hs,
            3 => Self::M,
            4 => Self::Vu,
            5 => Self::Vs,
            _ => Self::U,
        }
    }

    /// Human-readable mode name.
    #[must_use]
    pub const fn name(self) -> &'static str {
        match self {
            Self::U => "U",
            Self::Hs => "HS",
            Self::M => "M",
            Self::Vs => "VS",
            Self::Vu => "VU",
        }
    }
}

impl fmt::Display for PrivilegeMode {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{}", self.name())
    }
}

/// Composite "current architecture" key (§3, §4.2): everything a consuming
/// JIT needs to decide whether cached decoded/morphed code for the current
/// PC is still valid. Recomputed by [`crate::core::arch::ModeManager::refresh`]
/// on every write that can affect it.
#[derive(Clone, Copy, Debug, PartialEq, Eq, Hash)]
pub struct ArchKey {
    /// Current privilege mode.
    pub mode: PrivilegeMode,
    /// `true` when the current mode runs at XLEN=64, `false` for XLEN=32.
    pub xlen64: bool,
    /// `true` when address translation is enabled (`satp.MODE`/`hgatp.MODE` != Bare).
    pub vm_enabled: bool,
    /// `misa.C` snapshot: whether 16-bit instruction fetch/decode is legal.
    pub compressed: bool,
    /// `mstatus.FS`/`vsstatus.FS` dirty-enable snapshot (0 = off).
    pub fp_enabled: bool,
    /// `mstatus.VS` dirty-enable snapshot for the vector extension.
    pub vec_enabled: bool,
    /// Little- vs big-endian data access for the current mode (`mstatus.*BE`).
    pub big_endian: bool,
}

impl ArchKey {
    /// The key for a freshly reset hart: M-mode, XLEN=64, VM off, all
    /// extensions present but dirty-state off, little-endian.
    #[must_use]
    pub const fn reset(xlen64: bool, compressed: bool) -> Self {
        Self {
            mode: PrivilegeMode::M,
            xlen64,
            vm_enabled: false,
            compressed,
            fp_enabled: false,
            vec_enabled: false,
            big_endian: false,
        }
    }
}

/// 2-bit WARL encoding shared by `misa.MXL`, `mstatus.{SXL,UXL}`,
/// `hstatus.VSXL` and `vsstatus.UXL`: only 1 (XLEN=32) and 2 (XLEN=64) are
/// legal; any other write reverts to the previous value (§3 invariant).
#[must_use]
pub const fn xlen_field_legal(bits: u64) -> bool {
    bits == 1 || bits == 2
}

/// Snapshot of every CSR field that feeds the "current architecture" key
/// (§4.2): the Mode Manager is a pure function of these, never owns CSR
/// storage itself.
#[derive(Clone, Copy, Debug)]
pub struct ModeInputs {
    /// `misa.MXL`, as a 2-bit WARL field (1 or 2).
    pub misa_mxl: u64,
    /// `mstatus.SXL`.
    pub mstatus_sxl: u64,
    /// `mstatus.UXL`.
    pub mstatus_uxl: u64,
    /// `hstatus.VSXL`.
    pub hstatus_vsxl: u64,
    /// `vsstatus.UXL`.
    pub vsstatus_uxl: u64,
    /// `misa.C`.
    pub compressed: bool,
    /// `mstatus.FS`/`vsstatus.FS` (whichever is current) != 0.
    pub fp_enabled: bool,
    /// `mstatus.VS`/`vsstatus.VS` (whichever is current) != 0.
    pub vec_enabled: bool,
    /// Big-endian data access for the current mode (`mstatus.MBE`/`SBE`/`UBE`).
    pub big_endian: bool,
    /// `satp.MODE != Bare`, OR'd with `hgatp.MODE != Bare` while virtual
    /// (§4.2 "OR in the VM flag").
    pub vm_enabled: bool,
    pub mode: PrivilegeMode,
}

/// XLEN & Mode Manager (§4.2). Owns `xlen_mask` (one bit per
/// [`PrivilegeMode`] discriminant, set ⇒ XLEN=64) and the last-published
/// [`ArchKey`], recomputing both from a [`ModeInputs`] snapshot on every
/// write that can affect them.
#[derive(Clone, Copy, Debug, Default)]
pub struct ModeManager {
    xlen_mask: u8,
    key: Option<ArchKey>,
}

impl ModeManager {
    /// An empty manager; the first [`Self::refresh`] call populates it.
    #[must_use]
    pub const fn new() -> Self {
        Self { xlen_mask: 0, key: None }
    }

    /// One bit per mode, set when that mode's effective XLEN is 64.
    #[must_use]
    pub const fn xlen_mask(&self) -> u8 {
        self.xlen_mask
    }

    /// The last published key, or `None` before the first refresh.
    #[must_use]
    pub const fn current(&self) -> Option<ArchKey> {
        self.key
    }

    /// Recomputes `xlen_mask` and the [`ArchKey`] from `inputs`. Returns
    /// `(new_key, changed)`; `changed` tells the caller whether to flush
    /// translated-block caches and whether the MPRV/endianness-triggered
    /// data-domain flush (performed by the caller via [`crate::collab::MemoryDomain`])
    /// is needed.
    pub fn refresh(&mut self, inputs: ModeInputs) -> (ArchKey, bool) {
        let mxl64 = inputs.misa_mxl == 2;
        let sxl64 = if xlen_field_legal(inputs.mstatus_sxl) { inputs.mstatus_sxl == 2 } else { mxl64 };
        let uxl64 = if xlen_field_legal(inputs.mstatus_uxl) { inputs.mstatus_uxl == 2 } else { mxl64 };
        let vsxl64 = if xlen_field_legal(inputs.hstatus_vsxl) { inputs.hstatus_vsxl == 2 } else { mxl64 };
        let vuxl64 = if xlen_field_legal(inputs.vsstatus_uxl) { inputs.vsstatus_uxl == 2 } else { mxl64 };

        let mut mask = 0u8;
        mask |= u8::from(mxl64) << (PrivilegeMode::M as u8);
        mask |= u8::from(sxl64) << (PrivilegeMode::Hs as u8);
        mask |= u8::from(uxl64) << (PrivilegeMode::U as u8);
        mask |= u8::from(vsxl64) << (PrivilegeMode::Vs as u8);
        mask |= u8::from(vuxl64) << (PrivilegeMode::Vu as u8);
        self.xlen_mask = mask;

        let xlen64 = mask & (1 << (inputs.mode as u8)) != 0;
        let new_key = ArchKey {
            mode: inputs.mode,
            xlen64,
            vm_enabled: inputs.vm_enabled,
            compressed: inputs.compressed,
            fp_enabled: inputs.fp_enabled,
            vec_enabled: inputs.vec_enabled,
            big_endian: inputs.big_endian,
        };
        let changed = self.key != Some(new_key);
        if changed {
            tracing::debug!(?new_key, "mode manager: current_arch changed");
        }
        self.key = Some(new_key);
        (new_key, changed)
    }
}
