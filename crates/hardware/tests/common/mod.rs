//! Shared test infrastructure: small [`Hart`] construction helpers reused
//! across the unit test tree, so individual test modules don't each
//! hand-roll the same boot-time configuration variants.

use riscv_hart_core::config::HartConfig;
use riscv_hart_core::core::hart::Hart;

/// A hart with every default extension implemented (M/S/U, Sstc, Sdtrig,
/// Sdext).
pub fn default_hart() -> Hart {
    Hart::new(HartConfig::default())
}

/// A hart with hypervisor (H) support enabled, for VS/VU-mode scenarios.
pub fn hypervisor_hart() -> Hart {
    let mut config = HartConfig::default();
    config.isa.has_hypervisor = true;
    Hart::new(config)
}

/// A hart with supervisor and user mode both disabled, i.e. M-mode only.
pub fn machine_only_hart() -> Hart {
    let mut config = HartConfig::default();
    config.isa.has_supervisor = false;
    config.isa.has_user = false;
    Hart::new(config)
}
