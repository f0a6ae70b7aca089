//! Centralized care and tuning constants for the Petcare state layer.
//!
//! These values define the arithmetic behind every care action. Keeping them
//! together means gameplay balance only changes through reviewed code, not
//! through runtime configuration.

// Storage ------------------------------------------------------------------
pub const DEFAULT_STORAGE_KEY: &str = "@pet_care_game:pet";

// Stat bounds --------------------------------------------------------------
pub const STAT_MIN: u8 = 0;
pub const STAT_MAX: u8 = 100;

// Care actions -------------------------------------------------------------
pub const FEED_DEFAULT_AMOUNT: u8 = 25;
pub const BATHE_DEFAULT_AMOUNT: u8 = 30;
pub const PLAY_HUNGER_COST: u8 = 20;
pub const BATHE_HUNGER_COST: u8 = 10;

// Decay --------------------------------------------------------------------
pub const DECAY_INTERVAL_MS: u64 = 60_000;
pub const DECAY_STEP: u8 = 1;

// Age ----------------------------------------------------------------------
pub const MILLIS_PER_WEEK: i64 = 7 * 24 * 60 * 60 * 1000;
pub const AGE_MIN: u8 = 1;
pub const AGE_MAX: u8 = 19;
