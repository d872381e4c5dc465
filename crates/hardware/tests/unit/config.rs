//! # Configuration Tests
//!
//! Tests for `HartConfig` and its nested sub-configs: defaults, extension
//! queries, and JSON deserialization of partial documents.

use riscv_hart_core::config::{DebugPriority, HartConfig, IsaConfig, InterruptConfig, defaults};
use riscv_hart_core::core::arch::debug::DmExceptionPolicy;

#[test]
fn hart_config_default() {
    let cfg = HartConfig::default();
    assert_eq!(cfg.isa.xlen, 64);
    assert_eq!(cfg.reset_vector, defaults::RESET_VECTOR);
    assert!(!cfg.preserve_reservation_across_trap);
    assert_eq!(cfg.csr_remap, None);
}

#[test]
fn isa_config_defaults() {
    let isa = IsaConfig::default();
    assert_eq!(isa.xlen, 64);
    assert_eq!(isa.extensions, "imafdc");
    assert_eq!(isa.priv_spec, (1, 12));
    assert!(isa.has_supervisor);
    assert!(isa.has_user);
    assert!(!isa.has_hypervisor);
    assert!(isa.extra_extensions.iter().any(|e| e == "Sdtrig"));
    assert!(isa.extra_extensions.iter().any(|e| e == "Sdext"));
    assert!(isa.extra_extensions.iter().any(|e| e == "Sstc"));
}

#[test]
fn isa_config_has_extension_is_case_insensitive_on_input() {
    let isa = IsaConfig::default();
    assert!(isa.has_extension('i'));
    assert!(isa.has_extension('I'));
    assert!(isa.has_extension('m'));
    assert!(!isa.has_extension('v'));
}

#[test]
fn isa_config_has_extra_is_case_insensitive() {
    let isa = IsaConfig::default();
    assert!(isa.has_extra("Sdtrig"));
    assert!(isa.has_extra("sdtrig"));
    assert!(isa.has_extra("SDTRIG"));
    assert!(!isa.has_extra("Zknd"));
}

#[test]
fn interrupt_config_defaults() {
    let ic = InterruptConfig::default();
    assert!(!ic.clic_enabled);
    assert!(!ic.aia_enabled);
    assert_eq!(ic.clic_levels, 256);
    assert!(!ic.rnmi_enabled);
    assert_eq!(ic.nmi_exception_address, defaults::NMI_EXCEPTION_ADDRESS);
    assert!(!ic.tval_zero);
}

#[test]
fn debug_config_defaults() {
    let cfg = HartConfig::default();
    assert_eq!(cfg.debug.trigger_count, defaults::TRIGGER_COUNT);
    assert_eq!(cfg.debug.dm_exception_policy, DmExceptionPolicy::Ignore);
    assert_eq!(cfg.debug.dexc_address, defaults::DEXC_ADDRESS);
    assert_eq!(cfg.debug.debug_priority, DebugPriority::TriggerBeforeInterrupt);
}

#[test]
fn json_deserialization_partial_document_fills_defaults() {
    let json = r#"{ "isa": { "xlen": 32 } }"#;
    let cfg: HartConfig = serde_json::from_str(json).unwrap();
    assert_eq!(cfg.isa.xlen, 32);
    // untouched fields fall back to their named defaults.
    assert_eq!(cfg.isa.extensions, "imafdc");
    assert_eq!(cfg.reset_vector, defaults::RESET_VECTOR);
    assert_eq!(cfg.debug.trigger_count, defaults::TRIGGER_COUNT);
}

#[test]
fn json_deserialization_empty_document_is_fully_defaulted() {
    let cfg: HartConfig = serde_json::from_str("{}").unwrap();
    assert_eq!(cfg, HartConfig::default());
}

#[test]
fn json_deserialization_hypervisor_and_extra_extensions() {
    let json = r#"{
        "isa": {
            "xlen": 64,
            "extensions": "imafdch",
            "extra_extensions": ["Smaia", "Ssaia", "Smstateen"],
            "has_hypervisor": true
        }
    }"#;
    let cfg: HartConfig = serde_json::from_str(json).unwrap();
    assert!(cfg.isa.has_hypervisor);
    assert!(cfg.isa.has_extension('h'));
    assert!(cfg.isa.has_extra("Smaia"));
    assert!(cfg.isa.has_extra("ssaia"));
    assert!(!cfg.isa.has_extra("Sdtrig"));
}

#[test]
fn json_deserialization_interrupt_config() {
    let json = r#"{
        "interrupt": {
            "clic_enabled": true,
            "clic_levels": 16,
            "aia_enabled": true,
            "rnmi_enabled": true,
            "nmi_exception_address": 4096,
            "tval_zero": true
        }
    }"#;
    let cfg: HartConfig = serde_json::from_str(json).unwrap();
    assert!(cfg.interrupt.clic_enabled);
    assert_eq!(cfg.interrupt.clic_levels, 16);
    assert!(cfg.interrupt.aia_enabled);
    assert!(cfg.interrupt.rnmi_enabled);
    assert_eq!(cfg.interrupt.nmi_exception_address, 4096);
    assert!(cfg.interrupt.tval_zero);
}

#[test]
fn json_deserialization_debug_priority_variants() {
    for (name, expected) in [
        ("TriggerBeforeInterrupt", DebugPriority::TriggerBeforeInterrupt),
        ("InterruptBeforeTrigger", DebugPriority::InterruptBeforeTrigger),
        ("FirstArmedWins", DebugPriority::FirstArmedWins),
        ("MergedWithNmi", DebugPriority::MergedWithNmi),
    ] {
        let json = format!(r#"{{ "debug": {{ "debug_priority": "{name}" }} }}"#);
        let cfg: HartConfig = serde_json::from_str(&json).unwrap();
        assert_eq!(cfg.debug.debug_priority, expected);
    }
}

#[test]
fn json_deserialization_csr_remap_round_trips() {
    let json = r#"{ "csr_remap": "0x7c0=0x3a0" }"#;
    let cfg: HartConfig = serde_json::from_str(json).unwrap();
    assert_eq!(cfg.csr_remap.as_deref(), Some("0x7c0=0x3a0"));
}

#[test]
fn json_deserialization_reset_vector_and_reservation_flag() {
    let json = r#"{ "reset_vector": 0, "preserve_reservation_across_trap": true }"#;
    let cfg: HartConfig = serde_json::from_str(json).unwrap();
    assert_eq!(cfg.reset_vector, 0);
    assert!(cfg.preserve_reservation_across_trap);
}

#[test]
fn hart_config_serializes_and_round_trips_through_json() {
    let cfg = HartConfig::default();
    let json = serde_json::to_string(&cfg).unwrap();
    let restored: HartConfig = serde_json::from_str(&json).unwrap();
    assert_eq!(cfg, restored);
}
