//! Collaborator interfaces (§6).
//!
//! This crate implements only the control-plane core: the CSR registry, the
//! interrupt/trap/trigger engines, and the debug-mode state machine.
//! Instruction decode/morph, the memory-domain/PMP data checker, vector/FP/
//! crypto datapaths, TLB page-table walking, an externally-implemented CLIC
//! priority picker, and the binary loader/CLI are all external collaborators,
//! named here as trait objects [`Hart`](crate::core::hart::Hart) calls into
//! rather than code this crate owns.

use crate::common::addr::{PhysAddr, VirtAddr};
use crate::common::data::AccessType;
use crate::common::error::Trap;
use crate::core::arch::mode::{ArchKey, PrivilegeMode};

/// The memory-domain collaborator: data/fetch access, executability/mapped
/// checks, and the write-callback hook the Trap Engine uses to clear an
/// LR/SC reservation when the watched region is written (§5 "Shared
/// resources"), plus the CLIC-vectored-fetch data read (§4.4 step 8).
pub trait MemoryDomain {
    /// Reads `size` bytes (1/2/4/8) at `addr` under the given access
    /// direction and effective privilege (which may differ from the
    /// current mode under `mstatus.MPRV`).
    ///
    /// # Errors
    /// An access/page fault matching the requested [`AccessType`].
    fn read_n(&mut self, addr: VirtAddr, size: u32, access: AccessType, effective_priv: PrivilegeMode) -> Result<u64, Trap>;

    /// Writes `size` bytes (1/2/4/8) of `value` at `addr`.
    ///
    /// # Errors
    /// A store/AMO access or page fault.
    fn write_n(&mut self, addr: VirtAddr, size: u32, value: u64, effective_priv: PrivilegeMode) -> Result<(), Trap>;

    /// `true` if `addr` is executable under the current translation state.
    fn is_executable(&self, addr: VirtAddr) -> bool;

    /// `true` if `addr` is backed by mapped memory or MMIO.
    fn is_mapped(&self, addr: PhysAddr) -> bool;

    /// Registers a callback invoked whenever `addr` is written by anyone
    /// (including DMA/other harts), used to invalidate an LR/SC reservation
    /// set on that address.
    fn add_write_callback(&mut self, addr: PhysAddr, callback: Box<dyn FnMut(PhysAddr) + Send>);
}

/// Instruction metadata the Decoder collaborator supplies, used only to
/// build the `xtinst` load/store-fault syndrome (§4.4 step 5); decode
/// itself is out of scope.
#[derive(Clone, Copy, Debug, PartialEq, Eq, Default)]
pub struct InstrInfo {
    /// Raw 16- or 32-bit encoding.
    pub raw: u32,
    /// `true` if this was a 16-bit (compressed) encoding.
    pub compressed: bool,
    /// Decoded syndrome value for `xtinst`, pre-computed by the decoder
    /// per the Privileged spec's "transformed instruction" encoding.
    pub tinst_syndrome: u64,
}

/// The instruction-decode collaborator.
pub trait Decoder {
    /// Decodes the instruction at `pc`, for `xtinst` syndrome construction.
    fn decode(&self, pc: VirtAddr) -> InstrInfo;
}

/// The morph/JIT collaborator this crate publishes translated-block
/// invalidation and interrupt-check emission requests to (§4.2, §6).
pub trait MorphJit {
    /// Invalidates every cached translation, called when a mode/width
    /// change makes the old [`ArchKey`] unreachable again in a way that
    /// reuses its bit pattern (rare; most changes just key on the new
    /// value and leave old entries to age out).
    fn flush_all_dicts(&mut self);

    /// Marks cached code translated under `key` as valid (`true`) or stale
    /// (`false`) without a full flush.
    fn set_block_mask(&mut self, key: ArchKey, value: bool);

    /// Requests that the next emitted block include an interrupt check at
    /// its boundary (called after `refresh_pending_and_enabled` produces a
    /// non-empty result while running).
    fn emit_interrupt_check(&mut self);

    /// Requests that the next emitted block raise
    /// [`Trap::IllegalInstruction`] unconditionally (used when a CSR write
    /// disables an extension whose code is already resident).
    fn emit_illegal_instruction(&mut self);
}

/// Per-hart extension callbacks, installed at boot in registration order
/// and invoked in that order at each relevant point (§6 "Extension
/// registry"). A hart with no extension modules beyond the baseline
/// implementation installs none.
pub trait ExtensionHooks {
    /// Overrides NMI handling; returning `true` means the extension
    /// consumed the NMI and the core's default handling is skipped.
    fn custom_nmi(&mut self, hart_cause: u64) -> bool {
        let _ = hart_cause;
        false
    }

    /// Returns a priority override for `cause`, if this extension assigns
    /// one outside the standard Smaia `xiprio` mechanism.
    fn custom_interrupt_priority(&self, cause: u64) -> Option<u8> {
        let _ = cause;
        None
    }

    /// Returns an override for the trap handler PC, given the
    /// architecturally-computed one, if this extension redirects entry.
    ///
    /// This is the hook a CLIC-vectored deployment uses to resolve the
    /// real handler address: the core computes only the `xtvt[]` table
    /// base for [`crate::core::arch::trap::VectorMode::ClicVectored`] (it
    /// owns no [`MemoryDomain`] to walk the table itself), so an extension
    /// that does own one reads `xtvt[cause]` here and returns the fetched
    /// pointer, using `cause`/`is_interrupt` to index the right entry.
    fn custom_handler_pc(&self, architectural_pc: u64, cause: u64, is_interrupt: bool) -> Option<u64> {
        let _ = (architectural_pc, cause, is_interrupt);
        None
    }

    /// Notified after every trap entry, for tracing/statistics extensions.
    fn on_trap(&mut self, cause: u64, target: PrivilegeMode) {
        let _ = (cause, target);
    }

    /// Allows an extension to suppress a trigger's access-fault check
    /// (e.g. a custom PMP variant that pre-validates the access itself).
    fn suppress_trigger_fault(&self, va: VirtAddr) -> bool {
        let _ = va;
        false
    }
}

/// An external CSR bus: memory-mapped CSR implementations that supersede
/// the registry's internal storage/callback for a given address (§4.1 step
/// 3, §6 "CSR bus").
pub trait CsrBus {
    /// `true` if `addr` (CSR number, bus address = `addr << 4`) is serviced
    /// externally rather than by the in-crate registry.
    fn is_mapped(&self, addr: u32) -> bool;

    /// Reads the externally-serviced CSR at `addr`.
    fn read(&mut self, addr: u32) -> u64;

    /// Writes `value` to the externally-serviced CSR at `addr`.
    fn write(&mut self, addr: u32, value: u64);
}

/// Level/edge-sensitive net ports driven by the surrounding system (§6).
/// Plain data, not a trait: [`crate::core::hart::Hart`]'s `drive_nmi`/
/// `drive_haltreq`/`drive_resethaltreq`/`drive_reset`/`drive_ip`/
/// `drive_mtime` methods consume these values and perform the "atomic
/// update + refresh" rule the spec requires for `ip[]`-affecting ports.
#[derive(Clone, Copy, Debug, Default)]
pub struct NetPorts {
    /// `reset`: high halts the hart; falling edge triggers a cold reset.
    pub reset: bool,
    /// `nmi`: rising edge (or level, if latched) sets `dcsr.nmip`.
    pub nmi: bool,
    /// Latched NMI cause code, sampled when `nmi` rises.
    pub nmi_cause: u64,
    /// Latched NMI resume address (`mnepc` on entry, informational).
    pub nmi_addr: u64,
    /// Address jumped to on NMI entry when RNMI is not implemented.
    pub nmiexc_addr: u64,
    /// Reset vector, latched at boot/reset.
    pub reset_addr: u64,
    /// External monotonic time counter (`mtime`).
    pub mtime: u64,
    /// CLIC-presented interrupt id, if `irq_i` is asserted.
    pub irq_id_i: u16,
    pub irq_lev_i: u8,
    pub irq_sec_i: bool,
    pub irq_shv_i: bool,
    pub irq_i: bool,
    /// AIA external-interrupt priority inputs.
    pub miprio: u8,
    pub siprio: u8,
    pub vsiprio: u8,
    /// Debug halt requests.
    pub haltreq: bool,
    pub resethaltreq: bool,
    /// Test-harness controls.
    pub deferint: bool,
    pub restart_wfi: bool,
    pub illegalinstr: bool,
}
