//! # Hart State Machine Tests
//!
//! Unit tests for the [`Hart`] itself: the `wfi`/`wrs` suspension points,
//! net-port drivers, the `fetch_hook` instruction-boundary priority
//! checklist, and snapshot/restore round-tripping.
//!
//! [`Hart`]: riscv_hart_core::core::hart::Hart

use riscv_hart_core::core::arch::csr::addr;
use riscv_hart_core::core::hart::bits;
use riscv_hart_core::core::hart::FetchDecision;

use crate::common::default_hart;

#[test]
fn wfi_halts_the_hart() {
    let mut h = default_hart();
    assert!(!h.is_halted());
    h.wfi();
    assert!(h.is_halted());
}

#[test]
fn pending_and_enabled_interrupt_wakes_a_wfi_parked_hart() {
    let mut h = default_hart();
    h.wfi();
    assert!(h.is_halted());

    h.csr_write(addr::MSTATUS, bits::MSTATUS_MIE).unwrap();
    h.csr_write(addr::MIE, 1 << 7).unwrap(); // MTIE
    h.drive_ip(7, true);

    assert!(!h.is_halted(), "a locally pending+enabled interrupt must restart a wfi-parked hart");
}

#[test]
fn reset_net_halts_and_cold_resets_on_falling_edge() {
    let mut h = default_hart();
    h.csr_write(addr::MSTATUS, bits::MSTATUS_MIE).unwrap();
    h.drive_reset(true);
    assert!(h.is_halted());
    h.drive_reset(false);
    assert!(!h.is_halted());
    assert_eq!(h.csr_read(addr::MSTATUS).unwrap() & bits::MSTATUS_MIE, 0, "cold reset clears mstatus.MIE");
}

#[test]
fn fetch_hook_runs_normally_with_nothing_pending() {
    let mut h = default_hart();
    assert_eq!(h.fetch_hook(), FetchDecision::Run);
}

#[test]
fn fetch_hook_reports_halted_while_reset_is_asserted() {
    let mut h = default_hart();
    h.drive_reset(true);
    assert_eq!(h.fetch_hook(), FetchDecision::Halted);
}

#[test]
fn fetch_hook_delivers_a_pending_interrupt_before_fetching() {
    let mut h = default_hart();
    h.csr_write(addr::MSTATUS, bits::MSTATUS_MIE).unwrap();
    h.csr_write(addr::MTVEC, 0x8000_0000).unwrap();
    h.csr_write(addr::MIE, 1 << 7).unwrap();
    h.drive_ip(7, true);

    assert_eq!(h.fetch_hook(), FetchDecision::Trapped);
    assert_eq!(h.pc(), 0x8000_0000);
    assert_ne!(h.csr_read(addr::MCAUSE).unwrap() & (1 << 63), 0, "interrupt bit must be set in mcause");
}

#[test]
fn fetch_hook_prefers_haltreq_over_a_pending_interrupt() {
    let mut h = default_hart();
    h.csr_write(addr::MSTATUS, bits::MSTATUS_MIE).unwrap();
    h.csr_write(addr::MIE, 1 << 7).unwrap();
    h.drive_ip(7, true);
    h.drive_haltreq(true);

    assert_eq!(h.fetch_hook(), FetchDecision::EnteredDebug);
    assert!(h.in_debug_mode());
}

#[test]
fn snapshot_restore_round_trips_csr_state() {
    let mut h = default_hart();
    h.csr_write(addr::MTVEC, 0x8000_0004).unwrap();
    h.csr_write(addr::MEDELEG, (1 << 8) | (1 << 13)).unwrap();
    h.set_pc(0x1234);

    let snap = h.snapshot();

    let mut restored = default_hart();
    restored.restore(snap);

    assert_eq!(restored.pc(), 0x1234);
    assert_eq!(restored.csr_read(addr::MTVEC).unwrap(), 0x8000_0004);
    assert_eq!(restored.csr_read(addr::MEDELEG).unwrap(), (1 << 8) | (1 << 13));
}

#[test]
fn snapshot_round_trips_through_json() {
    let mut h = default_hart();
    h.csr_write(addr::MIE, 0xFFFF).unwrap();
    let snap = h.snapshot();

    let json = serde_json::to_string(&snap).unwrap();
    let decoded: riscv_hart_core::core::hart::HartSnapshot = serde_json::from_str(&json).unwrap();

    let mut restored = default_hart();
    restored.restore(decoded);
    assert_eq!(restored.csr_read(addr::MIE).unwrap(), 0xFFFF);
}
