//! Control and Status Register (CSR) Registry.
//!
//! Implements the CSR Registry component: a sparse map from 12-bit CSR
//! address to a descriptor giving architectural preconditions, storage
//! masks, and `Smstateen` gating, plus the four-step access algorithm and
//! boot-time address remapping. CSRs whose semantics reach beyond a plain
//! masked read/write (`mstatus`, `misa`, `satp`, triggers, debug registers,
//! the AIA indirect-CSR window, …) are marked [`CsrAccess::Special`]; the
//! registry only arbitrates *whether* the access is legal for those, and
//! leaves the value itself to [`crate::core::hart::Hart`], which is the
//! only component with enough cross-cutting state to compute it.

pub mod addr;

use std::collections::HashMap;

use crate::common::error::{CoreError, CsrAccessFault};
use crate::core::arch::mode::PrivilegeMode;

/// How a CSR address is serviced once access control has passed.
#[derive(Clone, Copy, Debug, PartialEq, Eq)]
pub enum CsrAccess {
    /// Plain storage cell in the registry, masked on write.
    Storage,
    /// Side-effecting register whose read/write is implemented by the hart
    /// (mode transitions, derived fields, indirect windows, …).
    Special,
    /// Serviced by an external CSR bus collaborator (§6) rather than
    /// internal storage; the registry only validates access control.
    External,
}

/// Static metadata for one CSR address.
#[derive(Clone, Debug)]
pub struct CsrDescriptor {
    /// Mnemonic name, used by remap parsing and diagnostics.
    pub name: &'static str,
    /// 12-bit CSR address.
    pub addr: u32,
    /// Minimum privilege mode required, decoded from address bits `[9:8]`
    /// (0=U, 1=S/H, 3=M) and promoted up if this hart doesn't implement it.
    pub min_mode: PrivilegeMode,
    /// `true` if this address belongs to the hypervisor-aliased block
    /// (`0x2xx`/`0x6xx`/`0xExx`), which resolves against VS rather than HS.
    pub hypervisor: bool,
    /// Read-only, decoded from address bits `[11:10] == 0b11`.
    pub read_only: bool,
    /// Write mask applied to [`CsrAccess::Storage`] writes. Ignored for
    /// `Special`/`External`.
    pub write_mask: u64,
    /// `Smstateen0` bit gating this CSR from a lower mode, if any.
    pub stateen_bit: Option<u8>,
    /// How the value is produced once access control passes.
    pub access: CsrAccess,
}

impl CsrDescriptor {
    const fn decode_min_mode(a: u32) -> (PrivilegeMode, bool) {
        let top = (a >> 8) & 0x3;
        match top {
            0 => (PrivilegeMode::U, false),
            1 => (PrivilegeMode::Hs, is_hypervisor_block(a)),
            3 => (PrivilegeMode::M, false),
            _ => (PrivilegeMode::M, false),
        }
    }

    const fn decode_read_only(a: u32) -> bool {
        (a >> 10) & 0x3 == 0b11
    }

    /// Builds a descriptor, deriving `min_mode`/`hypervisor`/`read_only`
    /// from the address per §4.1.
    #[must_use]
    pub const fn new(name: &'static str, a: u32, write_mask: u64, access: CsrAccess) -> Self {
        let (min_mode, hypervisor) = Self::decode_min_mode(a);
        Self {
            name,
            addr: a,
            min_mode,
            hypervisor,
            read_only: Self::decode_read_only(a),
            write_mask,
            stateen_bit: None,
            access,
        }
    }

    /// Builder-style setter for the `Smstateen0` gating bit.
    #[must_use]
    pub const fn with_stateen(mut self, bit: u8) -> Self {
        self.stateen_bit = Some(bit);
        self
    }
}

const fn is_hypervisor_block(a: u32) -> bool {
    matches!(a >> 8, 0x2 | 0x6 | 0xE)
}

/// Sparse CSR address space: descriptors plus storage for plain
/// [`CsrAccess::Storage`] registers, and an optional boot-time address
/// remap table.
#[derive(Debug, Default)]
pub struct CsrRegistry {
    descriptors: HashMap<u32, CsrDescriptor>,
    storage: HashMap<u32, u64>,
    remap: HashMap<u32, u32>,
}

impl CsrRegistry {
    /// Builds an empty registry with no descriptors registered.
    #[must_use]
    pub fn new() -> Self {
        Self::default()
    }

    /// Registers a descriptor, initializing its storage to zero if it is a
    /// [`CsrAccess::Storage`] CSR. Extensions call this at boot; later
    /// registrations for the same address overwrite earlier ones, which is
    /// how an extension module can refine a previously-registered CSR.
    pub fn register(&mut self, desc: CsrDescriptor) {
        if desc.access == CsrAccess::Storage {
            self.storage.entry(desc.addr).or_insert(0);
        }
        tracing::debug!(name = desc.name, addr = format!("{:#x}", desc.addr), "csr registered");
        self.descriptors.insert(desc.addr, desc);
    }

    /// Parses and installs a boot-time remap table: `"name1=0xADDR,
    /// name2=0xADDR, ..."`, whitespace stripped, unknown names ignored
    /// (logged, not rejected) per §6.
    ///
    /// # Errors
    /// Returns [`CoreError::MalformedRemapAddress`] if an address segment
    /// does not parse as a `0x`-prefixed hex number.
    pub fn apply_remap(&mut self, spec: &str) -> Result<(), CoreError> {
        for entry in spec.split(',') {
            let entry = entry.trim();
            if entry.is_empty() {
                continue;
            }
            let Some((name, addr_str)) = entry.split_once('=') else {
                continue;
            };
            let name = name.trim();
            let addr_str = addr_str.trim();
            let Some(hex) = addr_str.strip_prefix("0x").or_else(|| addr_str.strip_prefix("0X"))
            else {
                return Err(CoreError::MalformedRemapAddress(addr_str.to_string()));
            };
            let new_addr = u32::from_str_radix(hex, 16)
                .map_err(|_| CoreError::MalformedRemapAddress(addr_str.to_string()))?;
            let Some(old_addr) = self.descriptors.values().find(|d| d.name == name).map(|d| d.addr)
            else {
                tracing::warn!(name, "csr remap: unknown name ignored");
                continue;
            };
            self.remap.insert(old_addr, new_addr);
        }
        Ok(())
    }

    fn resolve(&self, addr: u32) -> u32 {
        self.remap.get(&addr).copied().unwrap_or(addr)
    }

    /// Looks up the descriptor at `addr`, following any remap.
    #[must_use]
    pub fn descriptor(&self, addr: u32) -> Option<&CsrDescriptor> {
        self.descriptors.get(&self.resolve(addr))
    }

    /// Access-control check (§4.1 steps 1-2), independent of the value.
    ///
    /// `mode`/`virt` is the accessing privilege; `current_ge_min` encodes
    /// "mode is at least as privileged as the CSR's minimum mode" taking
    /// virtualization into account, computed by the caller since only the
    /// Mode Manager knows the hart's implemented-mode set used for
    /// promotion.
    ///
    /// # Errors
    /// [`CsrAccessFault::Illegal`] if the CSR is absent, is read-only and
    /// being written, or `current_ge_min` is false. [`CsrAccessFault::Virtual`]
    /// if the CSR exists, would be legal non-virtually, but is gated at the
    /// hypervisor level for the current virtual mode.
    pub fn check_access(
        &self,
        addr: u32,
        virt: bool,
        current_ge_min: bool,
        is_write: bool,
        stateen_allows: impl Fn(u8) -> bool,
    ) -> Result<&CsrDescriptor, CsrAccessFault> {
        let Some(desc) = self.descriptor(addr) else {
            return Err(CsrAccessFault::Illegal);
        };
        if is_write && desc.read_only {
            return Err(CsrAccessFault::Illegal);
        }
        if !current_ge_min {
            return Err(if virt && desc.hypervisor {
                CsrAccessFault::Virtual
            } else {
                CsrAccessFault::Illegal
            });
        }
        if let Some(bit) = desc.stateen_bit {
            if !stateen_allows(bit) {
                return Err(if virt { CsrAccessFault::Virtual } else { CsrAccessFault::Illegal });
            }
        }
        Ok(desc)
    }

    /// Raw storage read for a [`CsrAccess::Storage`] CSR. Returns 0 for an
    /// address with no storage entry (e.g. a `Special`/`External` CSR
    /// queried by mistake — callers are expected to have already branched
    /// on `CsrAccess`).
    #[must_use]
    pub fn read_storage(&self, addr: u32) -> u64 {
        self.storage.get(&self.resolve(addr)).copied().unwrap_or(0)
    }

    /// Raw storage write for a [`CsrAccess::Storage`] CSR, applying the
    /// descriptor's `write_mask`: `new = (old & !mask) | (value & mask)`.
    pub fn write_storage(&mut self, addr: u32, value: u64) {
        let addr = self.resolve(addr);
        let mask = self.descriptors.get(&addr).map_or(u64::MAX, |d| d.write_mask);
        let old = self.storage.get(&addr).copied().unwrap_or(0);
        self.storage.insert(addr, (old & !mask) | (value & mask));
    }

    /// Iterates all registered descriptors, for introspection/save-restore.
    pub fn iterate(&self) -> impl Iterator<Item = &CsrDescriptor> {
        self.descriptors.values()
    }

    /// A full snapshot of [`CsrAccess::Storage`] CSR contents, keyed by
    /// resolved (post-remap) address, for persistence (§6).
    #[must_use]
    pub fn snapshot_storage(&self) -> HashMap<u32, u64> {
        self.storage.clone()
    }

    /// Restores [`CsrAccess::Storage`] CSR contents from a snapshot taken
    /// by [`Self::snapshot_storage`].
    pub fn restore_storage(&mut self, snapshot: HashMap<u32, u64>) {
        self.storage = snapshot;
    }
}
