//! # CSR Access Control Tests
//!
//! Unit tests for the four-step CSR access algorithm as exercised through
//! [`riscv_hart_core::core::hart::Hart::csr_read`]/`csr_write`: initialization,
//! read/write round-tripping, and the architectural constraints on
//! `satp`/PMP and read-only registers.

use riscv_hart_core::config::HartConfig;
use riscv_hart_core::core::arch::csr::addr;
use riscv_hart_core::core::hart::Hart;

fn hart() -> Hart {
    Hart::new(HartConfig::default())
}

#[test]
fn machine_info_registers_are_read_only_zero() {
    let mut h = hart();
    assert_eq!(h.csr_read(addr::MVENDORID).unwrap(), 0);
    assert_eq!(h.csr_read(addr::MARCHID).unwrap(), 0);
    assert_eq!(h.csr_read(addr::MIMPID).unwrap(), 0);
    assert_eq!(h.csr_read(addr::MHARTID).unwrap(), 0);
}

#[test]
fn writing_a_read_only_csr_traps_illegal() {
    let mut h = hart();
    let err = h.csr_write(addr::MVENDORID, 0xDEAD).unwrap_err();
    assert_eq!(err.code(), 2, "illegal instruction");
}

#[test]
fn mstatus_write_and_read_round_trips() {
    let mut h = hart();
    h.csr_write(addr::MSTATUS, 1 << 3).unwrap(); // MIE
    assert_ne!(h.csr_read(addr::MSTATUS).unwrap() & (1 << 3), 0);
}

#[test]
fn mie_write_and_read_round_trips() {
    let mut h = hart();
    h.csr_write(addr::MIE, 0x888).unwrap();
    assert_eq!(h.csr_read(addr::MIE).unwrap(), 0x888);
}

#[test]
fn mepc_write_and_read_round_trips() {
    let mut h = hart();
    h.csr_write(addr::MEPC, 0x8000_1234).unwrap();
    assert_eq!(h.csr_read(addr::MEPC).unwrap(), 0x8000_1234);
}

#[test]
fn mepc_write_clears_the_low_bit_when_compressed_not_implemented() {
    // Default ISA config implements "c", so odd epc values are legal;
    // mepc alignment only strips the low bit when misa.C is absent.
    let mut h = hart();
    h.csr_write(addr::MEPC, 0x8000_0001).unwrap();
    assert_eq!(h.csr_read(addr::MEPC).unwrap(), 0x8000_0001);
}

#[test]
fn mcause_write_and_read_round_trips() {
    let mut h = hart();
    let interrupt_timer = 0x8000_0000_0000_0007;
    h.csr_write(addr::MCAUSE, interrupt_timer).unwrap();
    assert_eq!(h.csr_read(addr::MCAUSE).unwrap(), interrupt_timer);
}

#[test]
fn supervisor_csrs_round_trip() {
    let mut h = hart();
    h.csr_write(addr::STVEC, 0x8000_0000).unwrap();
    h.csr_write(addr::SSCRATCH, 0xDEAD).unwrap();
    h.csr_write(addr::SEPC, 0x1000).unwrap();
    h.csr_write(addr::SCAUSE, 15).unwrap();
    h.csr_write(addr::STVAL, 0xBEEF).unwrap();

    assert_eq!(h.csr_read(addr::STVEC).unwrap(), 0x8000_0000);
    assert_eq!(h.csr_read(addr::SSCRATCH).unwrap(), 0xDEAD);
    assert_eq!(h.csr_read(addr::SEPC).unwrap(), 0x1000);
    assert_eq!(h.csr_read(addr::SCAUSE).unwrap(), 15);
    assert_eq!(h.csr_read(addr::STVAL).unwrap(), 0xBEEF);
}

#[test]
fn satp_mode_sv39_is_preserved() {
    let mut h = hart();
    let sv39_satp = (8u64 << 60) | 0x1_2345;
    h.csr_write(addr::SATP, sv39_satp).unwrap();
    let read_back = h.csr_read(addr::SATP).unwrap();
    assert_eq!((read_back >> 60) & 0xF, 8);
    assert_eq!(read_back & 0xFFF_FFFF_FFFF, 0x1_2345);
}

#[test]
fn satp_mode_bare_is_preserved() {
    let mut h = hart();
    h.csr_write(addr::SATP, 0).unwrap();
    assert_eq!(h.csr_read(addr::SATP).unwrap() >> 60, 0);
}

#[test]
fn satp_invalid_mode_is_rejected_and_becomes_bare() {
    let mut h = hart();
    // Mode value 5 is not a legal satp.MODE (only Bare/Sv39/Sv48/Sv57).
    let invalid_satp = (5u64 << 60) | 0xABC;
    h.csr_write(addr::SATP, invalid_satp).unwrap();
    let read_back = h.csr_read(addr::SATP).unwrap();
    assert_eq!(read_back >> 60, 0, "invalid mode should fall back to bare");
    assert_eq!(read_back & 0xFFF_FFFF_FFFF, 0xABC, "PPN field is untouched");
}

#[test]
fn unknown_csr_address_traps_illegal_on_read_and_write() {
    let mut h = hart();
    assert_eq!(h.csr_read(0x999).unwrap_err().code(), 2);
    assert_eq!(h.csr_write(0x999, 0xDEAD).unwrap_err().code(), 2);
}

#[test]
fn user_mode_csr_access_from_machine_mode_succeeds() {
    let mut h = hart();
    // cycle (0xC00) has min_mode U; M-mode is always >= any min_mode.
    assert!(h.csr_read(addr::CYCLE).is_ok());
}

#[test]
fn pmp_register_round_trips_when_unlocked() {
    let mut h = hart();
    h.csr_write(addr::PMPADDR_BASE, 0x1234_5678).unwrap();
    assert_eq!(h.csr_read(addr::PMPADDR_BASE).unwrap(), 0x1234_5678);
}

#[test]
fn pmp_locked_entry_ignores_further_writes() {
    let mut h = hart();
    // cfg byte bit 7 is the L (lock) bit.
    h.csr_write(addr::PMPCFG_BASE, 0x80).unwrap();
    h.csr_write(addr::PMPADDR_BASE, 0xAAAA).unwrap();
    assert_eq!(h.csr_read(addr::PMPADDR_BASE).unwrap(), 0, "locked entry rejects the write");
}
