//! Unit tests for system-wide constants.
//!
//! This module verifies that global constants are defined with correct
//! values and maintain expected mathematical relationships.

use riscv_hart_core::common::constants::*;

#[test]
fn cause_interrupt_bit_is_msb() {
    assert_eq!(CAUSE_INTERRUPT_BIT, 1u64 << 63, "interrupt bit should be MSB (bit 63)");

    let exception_code = 5u64;
    let interrupt_code = CAUSE_INTERRUPT_BIT | exception_code;
    assert_eq!(interrupt_code & CAUSE_INTERRUPT_BIT, CAUSE_INTERRUPT_BIT);
    assert_eq!(exception_code & CAUSE_INTERRUPT_BIT, 0);
}

#[test]
fn delegation_bit_positions_are_distinct_and_match_spec() {
    let bits = [
        DELEG_SSIP_BIT,
        DELEG_MSIP_BIT,
        DELEG_STIP_BIT,
        DELEG_MTIP_BIT,
        DELEG_SEIP_BIT,
        DELEG_MEIP_BIT,
        DELEG_VSSIP_BIT,
        DELEG_VSTIP_BIT,
        DELEG_VSEIP_BIT,
        DELEG_SGEIP_BIT,
    ];
    for (i, &bit1) in bits.iter().enumerate() {
        for (j, &bit2) in bits.iter().enumerate() {
            if i != j {
                assert_ne!(bit1, bit2, "delegation bits should be unique");
            }
        }
    }

    assert_eq!(DELEG_SSIP_BIT, 1);
    assert_eq!(DELEG_MSIP_BIT, 3);
    assert_eq!(DELEG_STIP_BIT, 5);
    assert_eq!(DELEG_MTIP_BIT, 7);
    assert_eq!(DELEG_SEIP_BIT, 9);
    assert_eq!(DELEG_MEIP_BIT, 11);
    assert_eq!(DELEG_VSSIP_BIT, 2);
    assert_eq!(DELEG_VSTIP_BIT, 6);
    assert_eq!(DELEG_VSEIP_BIT, 10);
    assert_eq!(DELEG_SGEIP_BIT, 12);
}

#[test]
fn aia_iprio_array_shape() {
    assert_eq!(AIA_IPRIO_NUM, 64, "one priority entry per architectural cause 0..63");
    assert_eq!(AIA_IPRIO_DEFAULT, 0);
}
