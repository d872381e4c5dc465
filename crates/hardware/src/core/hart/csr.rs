//! CSR read/write dispatch.
//!
//! Registers every implemented CSR's access-control descriptor and
//! implements the value-producing half of the four-step algorithm (§4.1)
//! for the CSRs this crate gives side-effecting ("Special") semantics,
//! generalizing the match-per-address dispatch the teacher's `cpu/csr.rs`
//! uses for `MSTATUS`/`MISA`/`SATP`/PMP to the full privileged-register set
//! this crate implements.

use crate::common::error::CsrAccessFault;
use crate::config::HartConfig;
use crate::core::arch::csr::addr;
use crate::core::arch::csr::{CsrAccess, CsrDescriptor, CsrRegistry};
use crate::core::arch::mode::{xlen_field_legal, PrivilegeMode};
use crate::core::hart::bits::*;
use crate::core::hart::Hart;

const RW: u64 = u64::MAX;

/// Registers descriptors for every CSR this crate assigns distinct
/// semantics to. Plain identification/context registers are `Storage`
/// (always read as zero, writes ignored via a zero mask); everything with
/// hart-computed semantics is `Special`.
pub(crate) fn register_defaults(csrs: &mut CsrRegistry, config: &HartConfig) {
    use CsrAccess::{Special, Storage};

    let ro = |name, a| CsrDescriptor::new(name, a, 0, Storage);
    csrs.register(ro("mvendorid", addr::MVENDORID));
    csrs.register(ro("marchid", addr::MARCHID));
    csrs.register(ro("mimpid", addr::MIMPID));
    csrs.register(ro("mhartid", addr::MHARTID));
    csrs.register(ro("mconfigptr", addr::MCONFIGPTR));
    csrs.register(CsrDescriptor::new("scontext", addr::SCONTEXT, RW, Storage));
    csrs.register(CsrDescriptor::new("hcontext", addr::HCONTEXT, RW, Storage));
    csrs.register(CsrDescriptor::new("mcontext", addr::MCONTEXT, RW, Storage));
    csrs.register(ro("tinfo", addr::TINFO));

    for (name, a) in [
        ("mstatus", addr::MSTATUS),
        ("misa", addr::MISA),
        ("medeleg", addr::MEDELEG),
        ("mideleg", addr::MIDELEG),
        ("mie", addr::MIE),
        ("mtvec", addr::MTVEC),
        ("mcounteren", addr::MCOUNTEREN),
        ("mscratch", addr::MSCRATCH),
        ("mepc", addr::MEPC),
        ("mcause", addr::MCAUSE),
        ("mtval", addr::MTVAL),
        ("mip", addr::MIP),
        ("mtinst", addr::MTINST),
        ("mtval2", addr::MTVAL2),
        ("menvcfg", addr::MENVCFG),
        ("mseccfg", addr::MSECCFG),
        ("mcountinhibit", addr::MCOUNTINHIBIT),
        ("mnscratch", addr::MNSCRATCH),
        ("mnepc", addr::MNEPC),
        ("mncause", addr::MNCAUSE),
        ("mnstatus", addr::MNSTATUS),
        ("stimecmp", addr::STIMECMP),
        ("vstimecmp", addr::VSTIMECMP),
        ("sstatus", addr::SSTATUS),
        ("sie", addr::SIE),
        ("stvec", addr::STVEC),
        ("scounteren", addr::SCOUNTEREN),
        ("senvcfg", addr::SENVCFG),
        ("sscratch", addr::SSCRATCH),
        ("sepc", addr::SEPC),
        ("scause", addr::SCAUSE),
        ("stval", addr::STVAL),
        ("sip", addr::SIP),
        ("satp", addr::SATP),
        ("hstatus", addr::HSTATUS),
        ("hedeleg", addr::HEDELEG),
        ("hideleg", addr::HIDELEG),
        ("hie", addr::HIE),
        ("htimedelta", addr::HTIMEDELTA),
        ("hcounteren", addr::HCOUNTEREN),
        ("hgeie", addr::HGEIE),
        ("htval", addr::HTVAL),
        ("hip", addr::HIP),
        ("hvip", addr::HVIP),
        ("htinst", addr::HTINST),
        ("hgeip", addr::HGEIP),
        ("henvcfg", addr::HENVCFG),
        ("hgatp", addr::HGATP),
        ("vsstatus", addr::VSSTATUS),
        ("vsie", addr::VSIE),
        ("vstvec", addr::VSTVEC),
        ("vsscratch", addr::VSSCRATCH),
        ("vsepc", addr::VSEPC),
        ("vscause", addr::VSCAUSE),
        ("vstval", addr::VSTVAL),
        ("vsip", addr::VSIP),
        ("vsatp", addr::VSATP),
        ("miselect", addr::MISELECT),
        ("mireg", addr::MIREG),
        ("mtopei", addr::MTOPEI),
        ("mtopi", addr::MTOPI),
        ("mvien", addr::MVIEN),
        ("mvip", addr::MVIP),
        ("siselect", addr::SISELECT),
        ("sireg", addr::SIREG),
        ("stopei", addr::STOPEI),
        ("stopi", addr::STOPI),
        ("hvien", addr::HVIEN),
        ("hvictl", addr::HVICTL),
        ("hviprio1", addr::HVIPRIO1),
        ("hviprio2", addr::HVIPRIO2),
        ("vsiselect", addr::VSISELECT),
        ("vsireg", addr::VSIREG),
        ("vstopei", addr::VSTOPEI),
        ("vstopi", addr::VSTOPI),
        ("tselect", addr::TSELECT),
        ("tdata1", addr::TDATA1),
        ("tdata2", addr::TDATA2),
        ("tdata3", addr::TDATA3),
        ("tcontrol", addr::TCONTROL),
        ("dcsr", addr::DCSR),
        ("dpc", addr::DPC),
        ("dscratch0", addr::DSCRATCH0),
        ("dscratch1", addr::DSCRATCH1),
        ("cycle", addr::CYCLE),
        ("time", addr::TIME),
        ("instret", addr::INSTRET),
        ("mcycle", addr::MCYCLE),
        ("minstret", addr::MINSTRET),
        ("mstateen0", addr::MSTATEEN0),
        ("hstateen0", addr::HSTATEEN0),
        ("sstateen0", addr::SSTATEEN0),
    ] {
        csrs.register(CsrDescriptor::new(name, a, RW, Special));
    }

    for i in 0..addr::PMPCFG_COUNT {
        csrs.register(CsrDescriptor::new("pmpcfg", addr::PMPCFG_BASE + i, RW, Special));
    }
    for i in 0..addr::PMPADDR_COUNT {
        csrs.register(CsrDescriptor::new("pmpaddr", addr::PMPADDR_BASE + i, RW, Special));
    }

    if config.isa.has_extra("Smstateen") {
        csrs.register(
            CsrDescriptor::new("sstatus.gated", addr::SSTATUS, RW, Special).with_stateen(63),
        );
    }
}

/// The reset value of `misa`: `MXL` from the configured XLEN, one bit per
/// configured single-letter extension, `U`/`S` bits from `has_user`/
/// `has_supervisor`.
pub(crate) fn reset_misa(config: &HartConfig, xlen64: bool) -> u64 {
    let mxl = if xlen64 { 2u64 } else { 1u64 };
    let mut bits = (mxl << MISA_MXL_SHIFT) & MISA_MXL;
    for c in config.isa.extensions.chars() {
        if c.is_ascii_alphabetic() {
            bits |= 1u64 << (c.to_ascii_lowercase() as u8 - b'a');
        }
    }
    if config.isa.has_supervisor {
        bits |= 1 << (b's' - b'a');
    }
    if config.isa.has_user {
        bits |= 1 << (b'u' - b'a');
    }
    if config.isa.has_hypervisor {
        bits |= 1 << (b'h' - b'a');
    }
    bits
}

impl Hart {
    /// Whether `mode`/`virt` is at least as privileged as `min`, accounting
    /// for the fact that an unimplemented mode promotes to the next one up
    /// (§4.1 step 1).
    fn current_ge_min(&self, min: PrivilegeMode) -> bool {
        let effective_min = match min {
            PrivilegeMode::Hs if !self.config.isa.has_supervisor => PrivilegeMode::M,
            PrivilegeMode::U if !self.config.isa.has_user => PrivilegeMode::Hs,
            m => m,
        };
        self.mode.demote_virtual().privilege_rank() >= effective_min.privilege_rank()
    }

    fn stateen_allows(&self, bit: u8) -> bool {
        if self.mode == PrivilegeMode::M {
            return true;
        }
        let m_ok = self.mstateen0 & (1 << bit) != 0;
        if self.mode.demote_virtual() == PrivilegeMode::Hs && !self.virt {
            return m_ok;
        }
        let h_ok = self.hstateen0 & (1 << bit) != 0;
        m_ok && h_ok
    }

    fn map_fault(&self, fault: CsrAccessFault) -> crate::common::error::Trap {
        match fault {
            CsrAccessFault::Illegal => crate::common::error::Trap::IllegalInstruction(0),
            CsrAccessFault::Virtual => crate::common::error::Trap::VirtualInstruction(0),
        }
    }

    /// Reads the CSR at `addr` for the current privilege/virtualization
    /// state.
    ///
    /// # Errors
    /// The architectural trap corresponding to an illegal or virtual-trapped
    /// access.
    pub fn csr_read(&mut self, address: u32) -> Result<u64, crate::common::error::Trap> {
        let ge_min = self
            .csrs
            .descriptor(address)
            .is_some_and(|d| self.current_ge_min(d.min_mode));
        let access = self
            .csrs
            .check_access(address, self.virt, ge_min, false, |b| self.stateen_allows(b))
            .map_err(|f| self.map_fault(f))?
            .access;

        Ok(match access {
            CsrAccess::Storage => self.csrs.read_storage(address),
            CsrAccess::External => 0,
            CsrAccess::Special => self.read_special(address),
        })
    }

    /// Writes `value` to the CSR at `addr`.
    ///
    /// # Errors
    /// The architectural trap corresponding to an illegal, read-only, or
    /// virtual-trapped access.
    pub fn csr_write(&mut self, address: u32, value: u64) -> Result<(), crate::common::error::Trap> {
        let ge_min = self
            .csrs
            .descriptor(address)
            .is_some_and(|d| self.current_ge_min(d.min_mode));
        let access = self
            .csrs
            .check_access(address, self.virt, ge_min, true, |b| self.stateen_allows(b))
            .map_err(|f| self.map_fault(f))?
            .access;

        match access {
            CsrAccess::Storage => self.csrs.write_storage(address, value),
            CsrAccess::External => {}
            CsrAccess::Special => self.write_special(address, value),
        }
        if matches!(
            address,
            addr::MSTATUS | addr::SSTATUS | addr::VSSTATUS | addr::HSTATUS | addr::MISA | addr::SATP | addr::VSATP | addr::HGATP
        ) {
            self.refresh_arch();
        }
        Ok(())
    }

    #[allow(clippy::too_many_lines)]
    fn read_special(&mut self, address: u32) -> u64 {
        match address {
            addr::MSTATUS => self.mstatus,
            addr::SSTATUS => (self.mstatus & SSTATUS_MASK) | if self.mstatus & MSTATUS_SD != 0 { MSTATUS_SD } else { 0 },
            addr::VSSTATUS => self.vsstatus,
            addr::MISA => self.misa,
            addr::MEDELEG => self.medeleg,
            addr::MIDELEG => self.mideleg,
            addr::HEDELEG => self.hedeleg,
            addr::HIDELEG => self.hideleg,
            addr::MIE => self.mie,
            addr::SIE => self.mie & self.mideleg & !(self.hideleg | self.sideleg),
            addr::VSIE => shift_s_to_vs(self.mie & self.hideleg),
            addr::HIE => self.mie & self.hideleg,
            addr::MIP => self.mip(),
            addr::SIP => self.mip() & self.mideleg & !(self.hideleg | self.sideleg),
            addr::VSIP => shift_s_to_vs(self.mip() & self.hideleg),
            addr::HIP => self.mip() & self.hideleg,
            addr::MTVEC => self.mtvec,
            addr::STVEC => self.stvec,
            addr::VSTVEC => self.vstvec,
            addr::MCOUNTEREN => self.mcounteren,
            addr::SCOUNTEREN => self.scounteren,
            addr::HCOUNTEREN => self.hcounteren,
            addr::MCOUNTINHIBIT => self.mcountinhibit,
            addr::MSCRATCH => self.mscratch,
            addr::SSCRATCH => self.sscratch,
            addr::VSSCRATCH => self.vsscratch,
            addr::MEPC => self.mepc,
            addr::SEPC => self.sepc,
            addr::VSEPC => self.vsepc,
            addr::MCAUSE => self.mcause,
            addr::SCAUSE => self.scause,
            addr::VSCAUSE => self.vscause,
            addr::MTVAL => self.mtval,
            addr::STVAL => self.stval,
            addr::VSTVAL => self.vstval,
            addr::MTVAL2 => self.mtval2,
            addr::MTINST => self.mtinst,
            addr::HTVAL => self.htval,
            addr::HTINST => self.htinst,
            addr::HSTATUS => self.hstatus,
            addr::HGEIE => self.hgeie,
            addr::HGEIP => self.hgeip,
            addr::HTIMEDELTA => self.htimedelta,
            addr::SATP => self.satp,
            addr::VSATP => self.vsatp,
            addr::HGATP => self.hgatp,
            addr::MENVCFG => self.menvcfg,
            addr::HENVCFG => self.henvcfg,
            addr::SENVCFG => self.senvcfg,
            addr::MSECCFG => self.mseccfg,
            addr::STIMECMP => self.stimecmp,
            addr::VSTIMECMP => self.vstimecmp,
            addr::MNSCRATCH => self.mnscratch,
            addr::MNEPC => self.mnepc,
            addr::MNCAUSE => self.mncause,
            addr::MNSTATUS => self.mnstatus,
            addr::MSTATEEN0 => self.mstateen0,
            addr::HSTATEEN0 => self.hstateen0,
            addr::SSTATEEN0 => self.sstateen0,
            addr::MVIEN => self.mvien,
            addr::MVIP => self.mvip,
            addr::HVIEN => self.hvien,
            addr::HVIP => self.hvip,
            addr::HVICTL => self.hvictl,
            addr::HVIPRIO1 => self.hviprio[0],
            addr::HVIPRIO2 => self.hviprio[1],
            addr::MISELECT => self.aia.miselect,
            addr::SISELECT => self.aia.siselect,
            addr::VSISELECT => self.aia.vsiselect,
            addr::MIREG => self.iprio_read(self.aia.miselect, &{ self.aia.miprio }),
            addr::SIREG => self.iprio_read(self.aia.siselect, &{ self.aia.siprio }),
            addr::VSIREG => self.iprio_read(self.aia.vsiselect, &{ self.aia.vsiprio }),
            addr::MTOPEI | addr::STOPEI | addr::VSTOPEI => 0,
            addr::MTOPI | addr::STOPI | addr::VSTOPI => self
                .pending_interrupt()
                .map_or(0, |p| (p.cause << 16) | u64::from(p.minor_priority)),
            addr::TSELECT => self.tselect as u64,
            addr::TDATA1 => self.read_tdata1(),
            addr::TDATA2 => self.triggers.slot(self.tselect).map_or(0, |s| s.compare),
            addr::TDATA3 => 0,
            addr::TCONTROL => u64::from(self.triggers.m_mode_enabled) << 3,
            addr::DCSR => self.read_dcsr(),
            addr::DPC => self.debug.dpc,
            addr::DSCRATCH0 => self.debug.dscratch[0],
            addr::DSCRATCH1 => self.debug.dscratch[1],
            addr::CYCLE | addr::MCYCLE => self.mcycle(),
            addr::TIME => self.mtime,
            addr::INSTRET | addr::MINSTRET => self.minstret(),
            _ if (addr::PMPCFG_BASE..addr::PMPCFG_BASE + addr::PMPCFG_COUNT).contains(&address) => {
                u64::from(self.pmpcfg[(address - addr::PMPCFG_BASE) as usize * 8])
            }
            _ if (addr::PMPADDR_BASE..addr::PMPADDR_BASE + addr::PMPADDR_COUNT).contains(&address) => {
                self.pmpaddr[(address - addr::PMPADDR_BASE) as usize]
            }
            _ => 0,
        }
    }

    #[allow(clippy::too_many_lines)]
    fn write_special(&mut self, address: u32, value: u64) {
        match address {
            addr::MSTATUS => self.mstatus = sanitize_mstatus(self.mstatus, value),
            addr::SSTATUS => self.mstatus = sanitize_mstatus(self.mstatus, (self.mstatus & !SSTATUS_MASK) | (value & SSTATUS_MASK)),
            addr::VSSTATUS => self.vsstatus = sanitize_mstatus(self.vsstatus, value),
            addr::MISA => {
                let keep_mxl = self.misa & MISA_MXL;
                let wanted_mxl = value & MISA_MXL;
                let mxl = if xlen_field_legal(wanted_mxl >> MISA_MXL_SHIFT) { wanted_mxl } else { keep_mxl };
                let mut new_misa = mxl | (value & !MISA_MXL & self.misa_implemented_mask());
                let c_bit = 1u64 << 2;
                if self.misa & c_bit != 0 && new_misa & c_bit == 0 && self.pc & 3 != 0 {
                    // A hart whose PC is not 4-byte aligned is mid-stream of
                    // compressed instructions; dropping C here would strand
                    // the fetch unit, so the write is ignored for this bit.
                    new_misa |= c_bit;
                }
                self.misa = new_misa;
            }
            addr::MEDELEG => self.medeleg = value & !(1 << 11),
            addr::MIDELEG => self.mideleg = value,
            addr::HEDELEG => self.hedeleg = value,
            addr::HIDELEG => self.hideleg = value,
            addr::MIE => self.mie = value,
            addr::SIE => self.mie = (self.mie & !(self.mideleg & !(self.hideleg | self.sideleg))) | (value & self.mideleg & !(self.hideleg | self.sideleg)),
            addr::VSIE => self.mie = (self.mie & !self.hideleg) | (shift_vs_to_s_bits(value) & self.hideleg),
            addr::HIE => self.mie = (self.mie & !self.hideleg) | (value & self.hideleg),
            addr::MIP => self.swip = (self.swip & !writable_swip_mask()) | (value & writable_swip_mask()),
            addr::SIP => {
                let mask = self.mideleg & !(self.hideleg | self.sideleg) & writable_swip_mask();
                self.swip = (self.swip & !mask) | (value & mask);
            }
            addr::VSIP => {
                let mask = self.hideleg & writable_swip_mask();
                self.swip = (self.swip & !mask) | (shift_vs_to_s_bits(value) & mask);
            }
            addr::HIP => {
                let mask = self.hideleg & writable_swip_mask();
                self.swip = (self.swip & !mask) | (value & mask);
            }
            addr::MTVEC => self.mtvec = value,
            addr::STVEC => self.stvec = value,
            addr::VSTVEC => self.vstvec = value,
            addr::MCOUNTEREN => self.mcounteren = value,
            addr::SCOUNTEREN => self.scounteren = value,
            addr::HCOUNTEREN => self.hcounteren = value,
            addr::MCOUNTINHIBIT => self.mcountinhibit = value,
            addr::MSCRATCH => self.mscratch = value,
            addr::SSCRATCH => self.sscratch = value,
            addr::VSSCRATCH => self.vsscratch = value,
            addr::MEPC => self.mepc = align_epc(value, self.misa),
            addr::SEPC => self.sepc = align_epc(value, self.misa),
            addr::VSEPC => self.vsepc = align_epc(value, self.misa),
            addr::MCAUSE => self.mcause = value,
            addr::SCAUSE => self.scause = value,
            addr::VSCAUSE => self.vscause = value,
            addr::MTVAL => self.mtval = value,
            addr::STVAL => self.stval = value,
            addr::VSTVAL => self.vstval = value,
            addr::MTVAL2 => self.mtval2 = value,
            addr::MTINST => self.mtinst = value,
            addr::HTVAL => self.htval = value,
            addr::HTINST => self.htinst = value,
            addr::HSTATUS => self.hstatus = value,
            addr::HGEIE => self.hgeie = value,
            addr::HTIMEDELTA => self.htimedelta = value,
            addr::SATP => self.satp = sanitize_atp(value),
            addr::VSATP => self.vsatp = sanitize_atp(value),
            addr::HGATP => self.hgatp = sanitize_atp(value),
            addr::MENVCFG => self.menvcfg = value,
            addr::HENVCFG => self.henvcfg = value,
            addr::SENVCFG => self.senvcfg = value,
            addr::MSECCFG => {
                let sticky = (self.mseccfg | value) & (MSECCFG_MML | MSECCFG_MMWP);
                self.mseccfg = (value & !(MSECCFG_MML | MSECCFG_MMWP)) | sticky;
            }
            addr::STIMECMP => self.stimecmp = value,
            addr::VSTIMECMP => self.vstimecmp = value,
            addr::MNSCRATCH => self.mnscratch = value,
            addr::MNEPC => self.mnepc = value,
            addr::MNCAUSE => self.mncause = value,
            // `mnstatus.nmie`: software may set it but never clear it by writing
            // 0; only `mnret`-driven hardware entry clears it (Smrnmi).
            addr::MNSTATUS => self.mnstatus = value | (self.mnstatus & MNSTATUS_NMIE),
            addr::MSTATEEN0 => self.mstateen0 = value,
            addr::HSTATEEN0 => self.hstateen0 = value,
            addr::SSTATEEN0 => self.sstateen0 = value,
            addr::MVIEN => self.mvien = value,
            addr::MVIP => self.mvip = value,
            addr::HVIEN => self.hvien = value,
            addr::HVIP => self.hvip = value,
            addr::HVICTL => self.hvictl = value,
            addr::HVIPRIO1 => self.hviprio[0] = value,
            addr::HVIPRIO2 => self.hviprio[1] = value,
            addr::MISELECT => self.aia.miselect = value,
            addr::SISELECT => self.aia.siselect = value,
            addr::VSISELECT => self.aia.vsiselect = value,
            addr::MIREG => self.iprio_write(self.aia.miselect, value, Aia::M),
            addr::SIREG => self.iprio_write(self.aia.siselect, value, Aia::S),
            addr::VSIREG => self.iprio_write(self.aia.vsiselect, value, Aia::Vs),
            addr::TSELECT => {
                if (value as usize) < self.triggers.len() {
                    self.tselect = value as usize;
                }
            }
            addr::TDATA1 => self.write_tdata1(value),
            addr::TDATA2 => {
                let tselect = self.tselect;
                let in_debug = self.in_debug_mode();
                self.triggers.write_slot(tselect, in_debug, |s| s.compare = value);
            }
            addr::TCONTROL => self.triggers.m_mode_enabled = value & (1 << 3) != 0,
            addr::DCSR => self.write_dcsr(value),
            addr::DPC => self.debug.dpc = value,
            addr::DSCRATCH0 => self.debug.dscratch[0] = value,
            addr::DSCRATCH1 => self.debug.dscratch[1] = value,
            _ if (addr::PMPCFG_BASE..addr::PMPCFG_BASE + addr::PMPCFG_COUNT).contains(&address) => {
                let base = (address - addr::PMPCFG_BASE) as usize * 8;
                for (i, byte) in value.to_le_bytes().into_iter().enumerate() {
                    if base + i < self.pmpcfg.len() && !self.pmp_locked(base + i) {
                        self.pmpcfg[base + i] = byte;
                    }
                }
            }
            _ if (addr::PMPADDR_BASE..addr::PMPADDR_BASE + addr::PMPADDR_COUNT).contains(&address) => {
                let i = (address - addr::PMPADDR_BASE) as usize;
                if !self.pmp_locked(i) {
                    self.pmpaddr[i] = value;
                }
            }
            _ => {}
        }
    }

    fn pmp_locked(&self, i: usize) -> bool {
        self.pmpcfg[i] & 0x80 != 0
    }

    fn misa_implemented_mask(&self) -> u64 {
        self.config.isa.extensions.chars().filter(|c| c.is_ascii_alphabetic()).fold(0u64, |acc, c| acc | 1u64 << (c.to_ascii_lowercase() as u8 - b'a'))
            | 1 << (b's' - b'a')
            | 1 << (b'u' - b'a')
            | 1 << (b'h' - b'a')
    }

    fn iprio_read(&self, selector: u64, table: &[u8; 64]) -> u64 {
        aia_index(selector).map_or(0, |i| u64::from(table[i]))
    }

    fn iprio_write(&mut self, selector: u64, value: u64, which: Aia) {
        let Some(i) = aia_index(selector) else { return };
        #[allow(clippy::cast_possible_truncation)]
        let byte = value as u8;
        match which {
            Aia::M => self.aia.miprio[i] = byte,
            Aia::S => self.aia.siprio[i] = byte,
            Aia::Vs => self.aia.vsiprio[i] = byte,
        }
    }

    /// Packs one trigger slot into `tdata1`. `type`/`dmode` sit at their
    /// architectural bit positions (§4.5); the remaining fields this crate
    /// unpacks per slot (`action`, `timing`, `chain`, `match`, `select`,
    /// the access mask, `modes`/`modes_virtual`, and `icount`'s `count`/
    /// `pending`) have no single standard layout across `mcontrol`,
    /// `mcontrol6`, `icount`, `itrigger`, and `etrigger`, so this crate
    /// gives them one internally-consistent packing rather than chasing
    /// five divergent real encodings (cf. the `dcsr` layout decision).
    fn read_tdata1(&self) -> u64 {
        let Some(slot) = self.triggers.slot(self.tselect) else { return 0 };
        let kind_bits: u64 = match slot.kind {
            crate::core::arch::trigger::TriggerKind::None => 0,
            crate::core::arch::trigger::TriggerKind::AddrData => 2,
            crate::core::arch::trigger::TriggerKind::AddrData6 => 6,
            crate::core::arch::trigger::TriggerKind::InstructionCount { .. } => 3,
            crate::core::arch::trigger::TriggerKind::Interrupt => 4,
            crate::core::arch::trigger::TriggerKind::Exception => 5,
        };
        let match_bits: u64 = match slot.match_kind {
            crate::core::arch::trigger::MatchKind::Equal => 0,
            crate::core::arch::trigger::MatchKind::Napot => 1,
            crate::core::arch::trigger::MatchKind::Ge => 2,
            crate::core::arch::trigger::MatchKind::Lt => 3,
            crate::core::arch::trigger::MatchKind::LowHalf => 4,
            crate::core::arch::trigger::MatchKind::HighHalf => 5,
            crate::core::arch::trigger::MatchKind::NotEqual => 6,
        };
        let (count, pending) = match slot.kind {
            crate::core::arch::trigger::TriggerKind::InstructionCount { count, pending } => (u64::from(count), pending),
            _ => (0, false),
        };
        (kind_bits << TDATA1_TYPE_SHIFT)
            | (u64::from(slot.dmode) << 59)
            | (count << 32)
            | (u64::from(slot.modes_virtual) << 24)
            | (u64::from(pending) << 23)
            | (u64::from(slot.timing == crate::core::arch::trigger::Timing::After) << 22)
            | (u64::from(slot.action == crate::core::arch::trigger::Action::DebugEntry) << 21)
            | (match_bits << 13)
            | (u64::from(slot.select_data) << 12)
            | (u64::from(slot.access_mask) << 9)
            | (u64::from(slot.modes) << 1)
            | (u64::from(slot.chain) << 20)
            | u64::from(slot.hit)
    }

    fn write_tdata1(&mut self, value: u64) {
        let tselect = self.tselect;
        let in_debug = self.in_debug_mode();
        let kind_bits = value >> TDATA1_TYPE_SHIFT;
        let match_bits = (value >> 13) & 0b111;
        self.triggers.write_slot(tselect, in_debug, |s| {
            s.dmode = value & TDATA1_DMODE != 0;
            s.kind = match kind_bits {
                2 => crate::core::arch::trigger::TriggerKind::AddrData,
                6 => crate::core::arch::trigger::TriggerKind::AddrData6,
                3 => crate::core::arch::trigger::TriggerKind::InstructionCount {
                    count: ((value >> 32) & 0xFFFF) as u16,
                    pending: value & (1 << 23) != 0,
                },
                4 => crate::core::arch::trigger::TriggerKind::Interrupt,
                5 => crate::core::arch::trigger::TriggerKind::Exception,
                _ => crate::core::arch::trigger::TriggerKind::None,
            };
            s.action = if value & (1 << 21) != 0 { crate::core::arch::trigger::Action::DebugEntry } else { crate::core::arch::trigger::Action::Breakpoint };
            s.timing = if value & (1 << 22) != 0 { crate::core::arch::trigger::Timing::After } else { crate::core::arch::trigger::Timing::Before };
            s.chain = value & (1 << 20) != 0;
            s.match_kind = match match_bits {
                1 => crate::core::arch::trigger::MatchKind::Napot,
                2 => crate::core::arch::trigger::MatchKind::Ge,
                3 => crate::core::arch::trigger::MatchKind::Lt,
                4 => crate::core::arch::trigger::MatchKind::LowHalf,
                5 => crate::core::arch::trigger::MatchKind::HighHalf,
                6 => crate::core::arch::trigger::MatchKind::NotEqual,
                _ => crate::core::arch::trigger::MatchKind::Equal,
            };
            s.select_data = value & (1 << 12) != 0;
            s.access_mask = ((value >> 9) & 0b111) as u8;
            s.modes = ((value >> 1) & 0xFF) as u8;
            s.modes_virtual = ((value >> 24) & 0xFF) as u8;
        });
    }

    fn read_dcsr(&self) -> u64 {
        let ebreak = &self.debug.ebreak_enable;
        let mut v = DCSR_XDEBUGVER_1P0;
        v |= self.mode.demote_virtual().encoding() as u64 & DCSR_PRV;
        v |= u64::from(self.debug.step) << 2;
        v |= u64::from(self.virt) << 5;
        v |= u64::from(self.debug.stepie) << 11;
        v |= u64::from(ebreak[2]) << 12;
        v |= u64::from(ebreak[1]) << 13;
        v |= u64::from(ebreak[4]) << 14;
        v |= u64::from(ebreak[3]) << 15;
        v |= u64::from(ebreak[0]) << 16;
        if let Some(cause) = self.debug.cause() {
            v |= (cause.encoding() as u64) << DCSR_CAUSE_SHIFT;
        }
        v
    }

    fn write_dcsr(&mut self, value: u64) {
        self.debug.step = value & DCSR_STEP != 0;
        self.debug.stepie = value & DCSR_STEPIE != 0;
        self.debug.set_ebreak_enable(PrivilegeMode::U, value & DCSR_EBREAKU != 0);
        self.debug.set_ebreak_enable(PrivilegeMode::Hs, value & DCSR_EBREAKS != 0);
        self.debug.set_ebreak_enable(PrivilegeMode::Vu, value & DCSR_EBREAKVU != 0);
        self.debug.set_ebreak_enable(PrivilegeMode::Vs, value & DCSR_EBREAKVS != 0);
        self.debug.set_ebreak_enable(PrivilegeMode::M, value & DCSR_EBREAKM != 0);
    }
}

#[derive(Clone, Copy)]
enum Aia {
    M,
    S,
    Vs,
}

/// Maps an `miselect`/`siselect`/`vsiselect` value onto the `xiprio` array
/// index it addresses (Smaia's `0x30..0x3F` indirect-priority window).
fn aia_index(selector: u64) -> Option<usize> {
    if (0x30..=0x3F).contains(&selector) {
        Some(((selector - 0x30) * 2) as usize)
    } else {
        None
    }
}

fn shift_s_to_vs(bits: u64) -> u64 {
    let mut out = 0;
    if bits & (1 << 1) != 0 {
        out |= 1 << 2;
    }
    if bits & (1 << 5) != 0 {
        out |= 1 << 6;
    }
    if bits & (1 << 9) != 0 {
        out |= 1 << 10;
    }
    out
}

fn shift_vs_to_s_bits(bits: u64) -> u64 {
    let mut out = 0;
    if bits & (1 << 2) != 0 {
        out |= 1 << 1;
    }
    if bits & (1 << 6) != 0 {
        out |= 1 << 5;
    }
    if bits & (1 << 10) != 0 {
        out |= 1 << 9;
    }
    out
}

const fn writable_swip_mask() -> u64 {
    1 << 1 | 1 << 2 | 1 << 9
}

fn sanitize_mstatus(old: u64, mut value: u64) -> u64 {
    let keep = old & (MSTATUS_UXL | MSTATUS_SXL);
    value &= !(MSTATUS_UXL | MSTATUS_SXL);
    let uxl = if xlen_field_legal((value >> MSTATUS_UXL_SHIFT) & 0x3) { value & MSTATUS_UXL } else { keep & MSTATUS_UXL };
    let sxl = if xlen_field_legal((value >> MSTATUS_SXL_SHIFT) & 0x3) { value & MSTATUS_SXL } else { keep & MSTATUS_SXL };
    let dirty = value & (MSTATUS_FS | MSTATUS_VS | MSTATUS_XS);
    let sd = u64::from(dirty != 0 && (value & MSTATUS_FS == MSTATUS_FS || value & MSTATUS_VS == MSTATUS_VS || value & MSTATUS_XS == MSTATUS_XS)) << 63;
    value | uxl | sxl | sd
}

fn sanitize_atp(value: u64) -> u64 {
    let mode = (value & SATP_MODE_MASK) >> SATP_MODE_SHIFT;
    if matches!(mode, 0 | 8 | 9 | 10) {
        value
    } else {
        value & !SATP_MODE_MASK
    }
}

fn align_epc(value: u64, misa: u64) -> u64 {
    crate::core::arch::trap::align_pc(value, misa & (1 << 2) != 0)
}
