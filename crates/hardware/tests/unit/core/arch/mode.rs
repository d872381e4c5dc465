//! # Privilege Mode and Mode Manager Tests
//!
//! Unit tests for [`PrivilegeMode`] encoding/decoding and the XLEN & Mode
//! Manager's architecture-key recomputation.

use riscv_hart_core::core::arch::mode::{ArchKey, ModeInputs, ModeManager, PrivilegeMode};

#[test]
fn encoding_collapses_virtual_pairs_onto_their_non_virtual_counterpart() {
    assert_eq!(PrivilegeMode::U.encoding(), 0);
    assert_eq!(PrivilegeMode::Vu.encoding(), 0);
    assert_eq!(PrivilegeMode::Hs.encoding(), 1);
    assert_eq!(PrivilegeMode::Vs.encoding(), 1);
    assert_eq!(PrivilegeMode::M.encoding(), 3);
}

#[test]
fn decode_round_trips_through_encoding_for_non_virtual_modes() {
    assert_eq!(PrivilegeMode::decode(0, false), PrivilegeMode::U);
    assert_eq!(PrivilegeMode::decode(1, false), PrivilegeMode::Hs);
    assert_eq!(PrivilegeMode::decode(3, false), PrivilegeMode::M);
}

#[test]
fn decode_honors_the_virtual_flag() {
    assert_eq!(PrivilegeMode::decode(0, true), PrivilegeMode::Vu);
    assert_eq!(PrivilegeMode::decode(1, true), PrivilegeMode::Vs);
    // M is never virtual, regardless of the flag.
    assert_eq!(PrivilegeMode::decode(3, true), PrivilegeMode::M);
}

#[test]
fn decode_unsupported_encoding_promotes_to_machine() {
    assert_eq!(PrivilegeMode::decode(2, false), PrivilegeMode::M);
    assert_eq!(PrivilegeMode::decode(2, true), PrivilegeMode::M);
}

#[test]
fn full_repr_round_trips_for_every_mode() {
    for mode in [PrivilegeMode::U, PrivilegeMode::Vu, PrivilegeMode::Hs, PrivilegeMode::Vs, PrivilegeMode::M] {
        assert_eq!(PrivilegeMode::from_full_repr(mode.full_repr()), mode);
    }
}

#[test]
fn from_full_repr_unknown_bits_default_to_user() {
    assert_eq!(PrivilegeMode::from_full_repr(255), PrivilegeMode::U);
}

#[test]
fn is_virtual_flags_only_vs_and_vu() {
    assert!(PrivilegeMode::Vs.is_virtual());
    assert!(PrivilegeMode::Vu.is_virtual());
    assert!(!PrivilegeMode::Hs.is_virtual());
    assert!(!PrivilegeMode::U.is_virtual());
    assert!(!PrivilegeMode::M.is_virtual());
}

#[test]
fn demote_virtual_maps_virtual_modes_to_their_non_virtual_counterpart() {
    assert_eq!(PrivilegeMode::Vs.demote_virtual(), PrivilegeMode::Hs);
    assert_eq!(PrivilegeMode::Vu.demote_virtual(), PrivilegeMode::U);
    assert_eq!(PrivilegeMode::Hs.demote_virtual(), PrivilegeMode::Hs);
    assert_eq!(PrivilegeMode::M.demote_virtual(), PrivilegeMode::M);
}

#[test]
fn name_and_display_agree() {
    for mode in [PrivilegeMode::U, PrivilegeMode::Vu, PrivilegeMode::Hs, PrivilegeMode::Vs, PrivilegeMode::M] {
        assert_eq!(format!("{mode}"), mode.name());
    }
    assert_eq!(PrivilegeMode::Vu.name(), "VU");
    assert_eq!(PrivilegeMode::Vs.name(), "VS");
}

#[test]
fn privilege_rank_orders_non_virtual_modes() {
    assert!(PrivilegeMode::U.privilege_rank() < PrivilegeMode::Hs.privilege_rank());
    assert!(PrivilegeMode::Hs.privilege_rank() < PrivilegeMode::M.privilege_rank());
    assert!(PrivilegeMode::U.privilege_rank() < PrivilegeMode::M.privilege_rank());
}

fn base_inputs(mode: PrivilegeMode) -> ModeInputs {
    ModeInputs {
        misa_mxl: 2,
        mstatus_sxl: 2,
        mstatus_uxl: 2,
        hstatus_vsxl: 2,
        vsstatus_uxl: 2,
        compressed: true,
        fp_enabled: false,
        vec_enabled: false,
        big_endian: false,
        vm_enabled: false,
        mode,
    }
}

#[test]
fn fresh_manager_has_no_current_key() {
    let mgr = ModeManager::new();
    assert!(mgr.current().is_none());
    assert_eq!(mgr.xlen_mask(), 0);
}

#[test]
fn refresh_publishes_a_key_matching_the_inputs() {
    let mut mgr = ModeManager::new();
    let (key, changed) = mgr.refresh(base_inputs(PrivilegeMode::M));
    assert!(changed, "first refresh is always a change from the empty state");
    assert_eq!(key.mode, PrivilegeMode::M);
    assert!(key.xlen64);
    assert!(key.compressed);
    assert!(!key.vm_enabled);
    assert_eq!(mgr.current(), Some(key));
}

#[test]
fn refresh_reports_unchanged_when_the_key_is_identical() {
    let mut mgr = ModeManager::new();
    let inputs = base_inputs(PrivilegeMode::Hs);
    let (first, _) = mgr.refresh(inputs);
    let (second, changed) = mgr.refresh(inputs);
    assert_eq!(first, second);
    assert!(!changed);
}

#[test]
fn refresh_reports_changed_when_mode_differs() {
    let mut mgr = ModeManager::new();
    mgr.refresh(base_inputs(PrivilegeMode::M));
    let (_, changed) = mgr.refresh(base_inputs(PrivilegeMode::U));
    assert!(changed);
}

#[test]
fn illegal_xlen_field_falls_back_to_misa_mxl() {
    let mut mgr = ModeManager::new();
    let mut inputs = base_inputs(PrivilegeMode::Hs);
    // mstatus.SXL = 0 is not a legal WARL value (only 1 or 2), so S-mode's
    // effective width should fall back to misa.MXL (2 => XLEN64).
    inputs.mstatus_sxl = 0;
    let (key, _) = mgr.refresh(inputs);
    assert!(key.xlen64);
}

#[test]
fn xlen_mask_has_one_bit_per_mode_keyed_by_effective_width() {
    let mut mgr = ModeManager::new();
    let mut inputs = base_inputs(PrivilegeMode::M);
    inputs.mstatus_uxl = 1; // U-mode pinned to XLEN32
    mgr.refresh(inputs);
    let mask = mgr.xlen_mask();
    assert_eq!(mask & (1 << (PrivilegeMode::M as u8)), 1 << (PrivilegeMode::M as u8));
    assert_eq!(mask & (1 << (PrivilegeMode::U as u8)), 0);
}

#[test]
fn vm_enabled_and_endianness_flow_through_to_the_key() {
    let mut mgr = ModeManager::new();
    let mut inputs = base_inputs(PrivilegeMode::Hs);
    inputs.vm_enabled = true;
    inputs.big_endian = true;
    let (key, _) = mgr.refresh(inputs);
    assert!(key.vm_enabled);
    assert!(key.big_endian);
}

#[test]
fn reset_key_is_machine_mode_with_vm_off() {
    let key = ArchKey::reset(true, true);
    assert_eq!(key.mode, PrivilegeMode::M);
    assert!(key.xlen64);
    assert!(!key.vm_enabled);
    assert!(!key.fp_enabled);
    assert!(!key.vec_enabled);
    assert!(!key.big_endian);
}
