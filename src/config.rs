//! Compile-time configuration for the board and the model.

/// Model input width in pixels
pub const INPUT_WIDTH: usize = 96;
/// Model input height in pixels
pub const INPUT_HEIGHT: usize = 96;
/// Interleaved colour channels per pixel (R, G, B)
pub const INPUT_CHANNELS: usize = 3;
/// Total number of floats in the model input
pub const INPUT_LEN: usize = INPUT_WIDTH * INPUT_HEIGHT * INPUT_CHANNELS;

/// Number of flower classes the model scores
pub const CLASS_COUNT: usize = 5;

/// Full capture + classify passes per trigger. Only the last one is acted upon.
pub const CAPTURE_ATTEMPTS: usize = 2;

pub const DEBOUNCE_MS: u32 = 50; // Re-check delay for the button
pub const RELEASE_POLL_MS: u32 = 10; // Main loop tick while waiting on the button

/// The trigger button is wired to ground with the internal pull-up enabled
pub const TRIGGER_ACTIVE_LOW: bool = true;
/// The pump relay is switched on by a high GPIO level
pub const PUMP_ACTIVE_LOW: bool = false;

/*** Camera bus ***/
pub const SPI_HZ: u32 = 8_000_000;
pub const I2C_HZ: u32 = 100_000;
pub const CAPTURE_TIMEOUT_MS: u32 = 1000;
