use crate::record::SwVersion;

/// Interval in milliseconds an external timer should wait between two ticks.
pub const PROPAGATION_DELAY_MS: u64 = 1;

/// Number of ticks a pressed button keeps its output HIGH.
pub const BUTTON_HOLD_TICKS: u32 = 10;

pub const DEFAULT_CLOCK_TOGGLE_TICKS: u32 = 100;
pub const DEFAULT_CLOCK_PULSE_TICKS: u32 = 2;

pub const DEFAULT_GATE_INPUT_COUNT: u8 = 2;
pub const MIN_GATE_INPUT_COUNT: u8 = 1;
pub const MAX_GATE_INPUT_COUNT: u8 = 16;
pub const MAX_BIT_WIDTH: u8 = 8;

/// Grid distance between two neighbouring pins of the default pin layout.
pub const PIN_SPACING: i32 = 1;

/// Horizontal distance from the input column to the output column of the default pin layout.
pub const COMPONENT_WIDTH: i32 = 2;

pub const CURRENT_VERSION: SwVersion = SwVersion::new(0, 1, 0);

/// Oldest engine version able to simulate what this engine saves.
pub const COMPATIBLE_VERSION: SwVersion = SwVersion::new(0, 1, 0);
