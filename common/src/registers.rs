//! Register ids understood by the Systemair `/mread` / `/mwrite` interface.

/// Fan speed code. Also doubles as the on/off register: 0 is off,
/// anything above 0 is running.
pub const REG_SPEED: &str = "1130";

/// Timer register used by revised firmware for refresh duration and
/// remaining minutes.
pub const REG_TIMER_REVISED: &str = "1103";
/// Timer register on units that expose it at the alternate address.
pub const REG_TIMER_ALTERNATE: &str = "1110";

// Auxiliary parameters written only by the legacy refresh payload.
pub const REG_REFRESH_MODE: &str = "1161";
pub const REG_REFRESH_RUNTIME: &str = "2000";
pub const REG_REFRESH_PRESET: &str = "2504";
pub const REG_REFRESH_AUX: &str = "16100";
