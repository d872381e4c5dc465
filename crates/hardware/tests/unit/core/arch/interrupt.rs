//! # Interrupt Controller Tests
//!
//! Unit tests for [`InterruptController::refresh`]'s basic/AIA/CLIC
//! pending-priority-enable pipeline and the `any_pending_and_locally_enabled`
//! predicate used to wake a hart parked in `wfi`.

use riscv_hart_core::core::arch::interrupt::{
    Cause, ClicPresented, InterruptController, InterruptInputs, PendingSources,
};
use riscv_hart_core::core::arch::mode::PrivilegeMode;

fn base_inputs(mode: PrivilegeMode) -> InterruptInputs {
    InterruptInputs {
        mie: u64::MAX,
        mstatus_mie: true,
        mstatus_sie: true,
        vsstatus_sie: true,
        current_mode: mode,
        ..InterruptInputs::default()
    }
}

#[test]
fn nothing_pending_yields_none() {
    let mut ctrl = InterruptController::default();
    let result = ctrl.refresh(PendingSources::default(), &base_inputs(PrivilegeMode::U));
    assert!(result.is_none());
}

#[test]
fn machine_timer_interrupt_targets_machine_mode() {
    let mut ctrl = InterruptController::default();
    let sources = PendingSources { ip: Cause::Mti.bit(), ..PendingSources::default() };
    let result = ctrl.refresh(sources, &base_inputs(PrivilegeMode::U)).unwrap();
    assert_eq!(result.cause, Cause::Mti as u64);
    assert_eq!(result.target, PrivilegeMode::M);
}

#[test]
fn delegated_supervisor_timer_interrupt_targets_hs_mode() {
    let mut ctrl = InterruptController::default();
    let sources = PendingSources { ip: Cause::Sti.bit(), ..PendingSources::default() };
    let mut inputs = base_inputs(PrivilegeMode::U);
    inputs.mideleg = Cause::Sti.bit();
    let result = ctrl.refresh(sources, &inputs).unwrap();
    assert_eq!(result.cause, Cause::Sti as u64);
    assert_eq!(result.target, PrivilegeMode::Hs);
}

#[test]
fn mei_outranks_msi_and_mti_on_major_rank() {
    let mut ctrl = InterruptController::default();
    let sources = PendingSources { ip: Cause::Mei.bit() | Cause::Msi.bit() | Cause::Mti.bit(), ..PendingSources::default() };
    let result = ctrl.refresh(sources, &base_inputs(PrivilegeMode::U)).unwrap();
    assert_eq!(result.cause, Cause::Mei as u64);
}

#[test]
fn global_mstatus_mie_clear_masks_a_machine_target_interrupt() {
    let mut ctrl = InterruptController::default();
    let sources = PendingSources { ip: Cause::Mti.bit(), ..PendingSources::default() };
    let mut inputs = base_inputs(PrivilegeMode::M);
    inputs.mstatus_mie = false;
    assert!(ctrl.refresh(sources, &inputs).is_none());
}

#[test]
fn interrupt_to_a_higher_current_mode_is_always_masked() {
    // A pending, delegated S-mode interrupt while already running in
    // M-mode never traps, regardless of sstatus.SIE.
    let mut ctrl = InterruptController::default();
    let sources = PendingSources { ip: Cause::Sti.bit(), ..PendingSources::default() };
    let mut inputs = base_inputs(PrivilegeMode::M);
    inputs.mideleg = Cause::Sti.bit();
    assert!(ctrl.refresh(sources, &inputs).is_none());
}

#[test]
fn stimecmp_derived_timer_pending_is_honored_without_an_ip_bit() {
    let mut ctrl = InterruptController::default();
    let sources = PendingSources { stimecmp_tip: true, ..PendingSources::default() };
    let mut inputs = base_inputs(PrivilegeMode::U);
    inputs.mideleg = Cause::Sti.bit();
    let result = ctrl.refresh(sources, &inputs).unwrap();
    assert_eq!(result.cause, Cause::Sti as u64);
}

#[test]
fn step_masks_interrupts_suppresses_everything() {
    let mut ctrl = InterruptController::default();
    let sources = PendingSources { ip: Cause::Mei.bit(), ..PendingSources::default() };
    let mut inputs = base_inputs(PrivilegeMode::U);
    inputs.step_masks_interrupts = true;
    assert!(ctrl.refresh(sources, &inputs).is_none());
}

#[test]
fn clic_presented_interrupt_is_accepted_when_globally_enabled() {
    let mut ctrl = InterruptController::default();
    let mut inputs = base_inputs(PrivilegeMode::U);
    inputs.clic_enabled = true;
    inputs.clic = Some(ClicPresented { id: 20, level: 5, priv_mode: PrivilegeMode::M, shv: false });
    let result = ctrl.refresh(PendingSources::default(), &inputs).unwrap();
    assert!(result.from_clic);
    assert_eq!(result.cause, 20);
}

#[test]
fn clic_interrupt_at_or_below_threshold_does_not_preempt() {
    let mut ctrl = InterruptController::default();
    let mut inputs = base_inputs(PrivilegeMode::M);
    inputs.clic_enabled = true;
    inputs.mintstatus_mil = 10;
    inputs.mintthresh = 10;
    inputs.sintstatus_sil = 10;
    inputs.sintthresh = 10;
    inputs.clic = Some(ClicPresented { id: 20, level: 5, priv_mode: PrivilegeMode::M, shv: false });
    assert!(ctrl.refresh(PendingSources::default(), &inputs).is_none());
}

#[test]
fn any_pending_and_locally_enabled_ignores_the_global_ie_gate() {
    let sources = PendingSources { ip: Cause::Mti.bit(), ..PendingSources::default() };
    let mut inputs = base_inputs(PrivilegeMode::M);
    inputs.mstatus_mie = false;
    assert!(
        InterruptController::any_pending_and_locally_enabled(sources, &inputs),
        "a wfi-parked hart must wake on local pend/enable even with mstatus.MIE clear"
    );
}

#[test]
fn any_pending_and_locally_enabled_is_false_with_nothing_pending() {
    let inputs = base_inputs(PrivilegeMode::M);
    assert!(!InterruptController::any_pending_and_locally_enabled(PendingSources::default(), &inputs));
}

#[test]
fn vs_level_interrupt_requires_hideleg_delegation() {
    let mut ctrl = InterruptController::default();
    let sources = PendingSources { ip: Cause::Vsti.bit(), ..PendingSources::default() };
    let mut inputs = base_inputs(PrivilegeMode::Vu);
    inputs.mideleg = Cause::Vsti.bit();
    inputs.hideleg = Cause::Vsti.bit();
    let result = ctrl.refresh(sources, &inputs).unwrap();
    assert_eq!(result.target, PrivilegeMode::Vs);
    assert_eq!(result.cause, Cause::Sti as u64, "VSTI re-aliases onto the STI bit position for VS-mode software");
}
