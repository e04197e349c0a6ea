//! Application-level configuration constants.

// Persistence
pub const STORAGE_KEY: &str = "reaction-trainer-settings";

// Default values for settings
pub const DEFAULT_MIN: i64 = 1;
pub const DEFAULT_MAX: i64 = 4;
pub const DEFAULT_INTERVAL_SEC: f64 = 5.0;
pub const DEFAULT_FONT_SCALE: f64 = 1.0;

// Min/Max limits
pub const MIN_INTERVAL_SEC: f64 = 0.25;
pub const MAX_INTERVAL_SEC: f64 = 3600.0;
pub const MIN_FONT_SCALE: f64 = 0.5;
pub const MAX_FONT_SCALE: f64 = 3.0;
pub const FONT_SCALE_STEP: f64 = 0.1;

/// Stimulus colors. Consecutive ticks never reuse the same entry.
pub const PALETTE: [&str; 4] = ["#ef4444", "#22c55e", "#3b82f6", "#eab308"];

// Display before the first tick
pub const IDLE_SYMBOL: &str = "—";
pub const IDLE_COLOR: &str = "#2a2f3c";

// Beep envelope (seconds relative to the audio clock)
pub const BEEP_FREQUENCY_HZ: f32 = 880.0;
pub const BEEP_FLOOR_GAIN: f32 = 0.0001;
pub const BEEP_PEAK_GAIN: f32 = 0.4;
pub const BEEP_ATTACK_SEC: f64 = 0.01;
pub const BEEP_DECAY_SEC: f64 = 0.15;
pub const BEEP_STOP_SEC: f64 = 0.16;
