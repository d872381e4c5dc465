//! Bit-field layout constants for the CSRs [`super::Hart`] computes itself
//! (`CsrAccess::Special` in the registry) rather than treating as plain
//! masked storage. Named and grouped the way `core::arch::csr::addr`
//! groups addresses.

// mstatus / sstatus / vsstatus (the latter two are masked views of the
// same field layout, restricted to the bits each view exposes).
pub const MSTATUS_SIE: u64 = 1 << 1;
pub const MSTATUS_MIE: u64 = 1 << 3;
pub const MSTATUS_SPIE: u64 = 1 << 5;
pub const MSTATUS_UBE: u64 = 1 << 6;
pub const MSTATUS_MPIE: u64 = 1 << 7;
pub const MSTATUS_SPP: u64 = 1 << 8;
pub const MSTATUS_VS: u64 = 0x3 << 9;
pub const MSTATUS_MPP_SHIFT: u32 = 11;
pub const MSTATUS_MPP: u64 = 0x3 << MSTATUS_MPP_SHIFT;
pub const MSTATUS_FS: u64 = 0x3 << 13;
pub const MSTATUS_XS: u64 = 0x3 << 15;
pub const MSTATUS_MPRV: u64 = 1 << 17;
pub const MSTATUS_SUM: u64 = 1 << 18;
pub const MSTATUS_MXR: u64 = 1 << 19;
pub const MSTATUS_TVM: u64 = 1 << 20;
pub const MSTATUS_TW: u64 = 1 << 21;
pub const MSTATUS_TSR: u64 = 1 << 22;
pub const MSTATUS_UXL_SHIFT: u32 = 32;
pub const MSTATUS_UXL: u64 = 0x3 << MSTATUS_UXL_SHIFT;
pub const MSTATUS_SXL_SHIFT: u32 = 34;
pub const MSTATUS_SXL: u64 = 0x3 << MSTATUS_SXL_SHIFT;
pub const MSTATUS_SBE: u64 = 1 << 36;
pub const MSTATUS_MBE: u64 = 1 << 37;
pub const MSTATUS_MPV: u64 = 1 << 39;
pub const MSTATUS_GVA: u64 = 1 << 38;
pub const MSTATUS_SD: u64 = 1 << 63;

/// The subset of `mstatus` bits readable/writable through `sstatus`.
pub const SSTATUS_MASK: u64 = MSTATUS_SIE
    | MSTATUS_SPIE
    | MSTATUS_UBE
    | MSTATUS_SPP
    | MSTATUS_VS
    | MSTATUS_FS
    | MSTATUS_XS
    | MSTATUS_SUM
    | MSTATUS_MXR
    | MSTATUS_UXL
    | MSTATUS_SD;

/// `vsstatus` has the same layout as `sstatus` (it is `mstatus`-shaped,
/// viewed from VS rather than HS).
pub const VSSTATUS_MASK: u64 = SSTATUS_MASK;

// hstatus.
pub const HSTATUS_VSBE: u64 = 1 << 5;
pub const HSTATUS_GVA: u64 = 1 << 6;
pub const HSTATUS_SPV: u64 = 1 << 7;
pub const HSTATUS_SPVP: u64 = 1 << 8;
pub const HSTATUS_HU: u64 = 1 << 9;
pub const HSTATUS_VGEIN_SHIFT: u32 = 12;
pub const HSTATUS_VGEIN: u64 = 0x3F << HSTATUS_VGEIN_SHIFT;
pub const HSTATUS_VTVM: u64 = 1 << 20;
pub const HSTATUS_VTW: u64 = 1 << 21;
pub const HSTATUS_VTSR: u64 = 1 << 22;
pub const HSTATUS_VSXL_SHIFT: u32 = 32;
pub const HSTATUS_VSXL: u64 = 0x3 << HSTATUS_VSXL_SHIFT;

// misa.
pub const MISA_MXL_SHIFT: u32 = 62;
pub const MISA_MXL: u64 = 0x3 << MISA_MXL_SHIFT;

// mseccfg (Smepmp).
pub const MSECCFG_MML: u64 = 1 << 0;
pub const MSECCFG_MMWP: u64 = 1 << 1;
pub const MSECCFG_RLB: u64 = 1 << 2;

// menvcfg / henvcfg / senvcfg (shared layout; senvcfg lacks the high bits).
pub const ENVCFG_FIOM: u64 = 1 << 0;
pub const ENVCFG_CBIE_SHIFT: u32 = 4;
pub const ENVCFG_CBIE: u64 = 0x3 << ENVCFG_CBIE_SHIFT;
pub const ENVCFG_CBCFE: u64 = 1 << 6;
pub const ENVCFG_CBZE: u64 = 1 << 7;
pub const ENVCFG_PBMTE: u64 = 1 << 62;
pub const ENVCFG_STCE: u64 = 1 << 63;

// mnstatus (Smrnmi).
pub const MNSTATUS_NMIE: u64 = 1 << 3;
pub const MNSTATUS_MNPV: u64 = 1 << 7;
pub const MNSTATUS_MNPP_SHIFT: u32 = 11;
pub const MNSTATUS_MNPP: u64 = 0x3 << MNSTATUS_MNPP_SHIFT;

// dcsr (Sdext). Field positions are an internally-consistent layout for
// this crate; see DESIGN.md for the rationale (the ratified encoding has
// shifted across debug-spec revisions and the spec text does not pin one).
pub const DCSR_PRV: u64 = 0x3;
pub const DCSR_STEP: u64 = 1 << 2;
pub const DCSR_NMIP: u64 = 1 << 3;
pub const DCSR_MPRVEN: u64 = 1 << 4;
pub const DCSR_V: u64 = 1 << 5;
pub const DCSR_CAUSE_SHIFT: u32 = 6;
pub const DCSR_CAUSE: u64 = 0x7 << DCSR_CAUSE_SHIFT;
pub const DCSR_STOPTIME: u64 = 1 << 9;
pub const DCSR_STOPCOUNT: u64 = 1 << 10;
pub const DCSR_STEPIE: u64 = 1 << 11;
pub const DCSR_EBREAKU: u64 = 1 << 12;
pub const DCSR_EBREAKS: u64 = 1 << 13;
pub const DCSR_EBREAKVU: u64 = 1 << 14;
pub const DCSR_EBREAKVS: u64 = 1 << 15;
pub const DCSR_EBREAKM: u64 = 1 << 16;
pub const DCSR_XDEBUGVER_SHIFT: u32 = 28;
pub const DCSR_XDEBUGVER: u64 = 0xF << DCSR_XDEBUGVER_SHIFT;
/// `external debug support exists` per the Sdext 1.0 encoding.
pub const DCSR_XDEBUGVER_1P0: u64 = 4 << DCSR_XDEBUGVER_SHIFT;

// tdata1 (shared `mcontrol`/`mcontrol6`/`icount`/`itrigger`/`etrigger` header).
pub const TDATA1_TYPE_SHIFT: u32 = 60;
pub const TDATA1_DMODE: u64 = 1 << 59;

// satp / vsatp / hgatp MODE field (Sv32/39/48/57; opaque to this crate —
// only the mode value is modeled, no page-table walk).
pub const SATP_MODE_SHIFT: u32 = 60;
pub const SATP_MODE_MASK: u64 = 0xF << SATP_MODE_SHIFT;
pub const SATP_MODE_BARE: u64 = 0;
pub const SATP_MODE_SV39: u64 = 8;
pub const SATP_MODE_SV48: u64 = 9;
pub const SATP_MODE_SV57: u64 = 10;
pub const HGATP_MODE_SHIFT: u32 = 60;
pub const HGATP_MODE_MASK: u64 = 0xF << HGATP_MODE_SHIFT;
