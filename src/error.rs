use embedded_hal::{digital, i2c, spi};
use thiserror::Error;

use crate::frame::PixelFormat;

/// Camera bring-up and transfer failures.
/// Failing `init` is fatal; failures during a capture only abort that capture.
#[derive(Debug, Error, Clone, Copy, PartialEq, Eq)]
#[cfg_attr(feature = "defmt", derive(defmt::Format))]
pub enum CameraError {
    #[error("camera SPI bus error: {0:?}")]
    Spi(spi::ErrorKind),
    #[error("camera I2C bus error: {0:?}")]
    I2c(i2c::ErrorKind),
    #[error("SPI link test failed, read back {read:#04x}")]
    LinkTest { read: u8 },
    #[error("unexpected sensor id {id:#06x}")]
    SensorId { id: u16 },
    #[error("unsupported camera configuration")]
    UnsupportedConfig,
    #[error("capture did not complete in time")]
    CaptureTimeout,
    #[error("FIFO holds {actual} bytes, frame needs {expected}")]
    ShortFrame { expected: usize, actual: usize },
}

/// The classifier could not produce scores for the current input.
#[derive(Debug, Error, Clone, Copy, PartialEq, Eq)]
#[cfg_attr(feature = "defmt", derive(defmt::Format))]
pub enum InferenceError {
    #[error("model invocation failed")]
    Invoke,
    #[error("model produced no output")]
    NoOutput,
}

#[derive(Debug, Error, Clone, Copy, PartialEq, Eq)]
#[cfg_attr(feature = "defmt", derive(defmt::Format))]
pub enum PumpError {
    #[error("pump pin error: {0:?}")]
    Pin(digital::ErrorKind),
}

/// Everything that can abort a single trigger's capture sequence.
/// All of these are recoverable: the main loop logs them and goes back to idle.
#[derive(Debug, Error, Clone, Copy, PartialEq)]
#[cfg_attr(feature = "defmt", derive(defmt::Format))]
pub enum PipelineError {
    #[error("camera capture failed")]
    Capture,
    #[error("frame {width}x{height} is smaller than the model input")]
    FrameTooSmall { width: usize, height: usize },
    #[error("frame buffer holds {actual} samples, expected {expected}")]
    FrameTruncated { expected: usize, actual: usize },
    #[error("unsupported pixel format {0:?}")]
    UnsupportedFormat(PixelFormat),
    #[error("inference failed: {0}")]
    Inference(#[from] InferenceError),
    #[error("classifier scores are empty or malformed")]
    InvalidScores,
    #[error("watering failed: {0}")]
    Pump(#[from] PumpError),
}
