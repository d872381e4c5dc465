//! Unit tests for trap and core-internal error types.

use riscv_hart_core::common::error::{CoreError, CsrAccessFault, Trap};

#[test]
fn trap_display_is_human_readable() {
    assert_eq!(format!("{}", Trap::InstructionAddressMisaligned(0x8000_0001)), "instruction address misaligned (0x80000001)");
    assert_eq!(format!("{}", Trap::Breakpoint(0x8000_0000)), "breakpoint at 0x80000000");
    assert_eq!(format!("{}", Trap::EnvironmentCallFromUMode), "environment call from U-mode");
}

#[test]
fn trap_code_matches_exception_code_field() {
    assert_eq!(Trap::InstructionAddressMisaligned(0).code(), 0);
    assert_eq!(Trap::InstructionAccessFault(0).code(), 1);
    assert_eq!(Trap::IllegalInstruction(0).code(), 2);
    assert_eq!(Trap::Breakpoint(0).code(), 3);
    assert_eq!(Trap::LoadAddressMisaligned(0).code(), 4);
    assert_eq!(Trap::LoadAccessFault(0).code(), 5);
    assert_eq!(Trap::StoreAmoAddressMisaligned(0).code(), 6);
    assert_eq!(Trap::StoreAmoAccessFault(0).code(), 7);
    assert_eq!(Trap::EnvironmentCallFromUMode.code(), 8);
    assert_eq!(Trap::EnvironmentCallFromSMode.code(), 9);
    assert_eq!(Trap::EnvironmentCallFromVSMode.code(), 10);
    assert_eq!(Trap::EnvironmentCallFromMMode.code(), 11);
    assert_eq!(Trap::InstructionPageFault(0).code(), 12);
    assert_eq!(Trap::LoadPageFault(0).code(), 13);
    assert_eq!(Trap::StoreAmoPageFault(0).code(), 15);
    assert_eq!(Trap::InstructionGuestPageFault(0).code(), 20);
    assert_eq!(Trap::LoadGuestPageFault(0).code(), 21);
    assert_eq!(Trap::VirtualInstruction(0).code(), 22);
    assert_eq!(Trap::StoreAmoGuestPageFault(0).code(), 23);
    assert_eq!(Trap::Interrupt(7).code(), 7);
}

#[test]
fn trap_tval_carries_faulting_address_or_encoding() {
    assert_eq!(Trap::LoadAccessFault(0xDEAD_BEEF).tval(), 0xDEAD_BEEF);
    assert_eq!(Trap::IllegalInstruction(0x1234_5678).tval(), 0x1234_5678);
    assert_eq!(Trap::EnvironmentCallFromMMode.tval(), 0);
    assert_eq!(Trap::Interrupt(5).tval(), 0);
}

#[test]
fn only_interrupt_variant_reports_is_interrupt() {
    assert!(Trap::Interrupt(5).is_interrupt());
    assert!(!Trap::Breakpoint(0).is_interrupt());
    assert!(!Trap::EnvironmentCallFromMMode.is_interrupt());
}

#[test]
fn trap_equality_and_clone() {
    let a = Trap::IllegalInstruction(0x1234);
    let b = Trap::IllegalInstruction(0x1234);
    let c = Trap::IllegalInstruction(0x5678);
    assert_eq!(a, b);
    assert_ne!(a, c);
    assert_eq!(a, a.clone());
}

#[test]
fn trap_implements_error() {
    let trap = Trap::IllegalInstruction(0);
    let _: &dyn std::error::Error = &trap;
}

#[test]
fn core_error_display() {
    let err = CoreError::UnknownRemapName("mfoo".to_string());
    assert!(format!("{err}").contains("mfoo"));

    let err = CoreError::TriggerIndexOutOfRange(4, 4);
    assert!(format!("{err}").contains('4'));
}

#[test]
fn csr_access_fault_variants_are_distinct() {
    assert_ne!(CsrAccessFault::Illegal, CsrAccessFault::Virtual);
}
