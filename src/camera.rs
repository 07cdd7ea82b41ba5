use crate::config::{INPUT_HEIGHT, INPUT_WIDTH};
use crate::error::CameraError;
use crate::frame::{PixelFormat, RawFrame};

/// When the driver fills its frame buffer.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
#[cfg_attr(feature = "defmt", derive(defmt::Format))]
pub enum GrabMode {
    /// Grab a new frame only once the buffer has been handed back
    WhenEmpty,
    /// Keep overwriting the buffer with the newest frame
    Latest,
}

/// Capture settings handed to `Camera::init`.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
#[cfg_attr(feature = "defmt", derive(defmt::Format))]
pub struct CameraConfig {
    pub width: usize,
    pub height: usize,
    pub format: PixelFormat,
    pub fb_count: u8,
    pub grab_mode: GrabMode,
}

impl Default for CameraConfig {
    fn default() -> Self {
        CameraConfig {
            width: INPUT_WIDTH,
            height: INPUT_HEIGHT,
            format: PixelFormat::Rgb565,
            fb_count: 1,
            grab_mode: GrabMode::WhenEmpty,
        }
    }
}

/// A camera with a single frame buffer that is lent out per capture.
pub trait Camera {
    fn init(&mut self, config: &CameraConfig) -> Result<(), CameraError>;

    /// Grabs one frame. `None` if the capture failed or the buffer is still lent out.
    fn capture_frame(&mut self) -> Option<RawFrame>;

    /// Hands the frame buffer back to the driver
    fn release_frame(&mut self, frame: RawFrame);
}

impl<C: Camera + ?Sized> Camera for &mut C {
    fn init(&mut self, config: &CameraConfig) -> Result<(), CameraError> {
        (**self).init(config)
    }

    fn capture_frame(&mut self) -> Option<RawFrame> {
        (**self).capture_frame()
    }

    fn release_frame(&mut self, frame: RawFrame) {
        (**self).release_frame(frame)
    }
}

/// A captured frame that goes back to its camera when dropped.
pub struct FrameGuard<'a, C: Camera> {
    camera: &'a mut C,
    frame: RawFrame,
}

impl<'a, C: Camera> FrameGuard<'a, C> {
    /// Captures a frame
    /// param camera: camera to capture from and release to
    /// returns None if the camera produced no frame
    pub fn capture(camera: &'a mut C) -> Option<Self> {
        let frame = camera.capture_frame()?;
        Some(FrameGuard { camera, frame })
    }

    pub fn frame(&self) -> &RawFrame {
        &self.frame
    }
}

impl<C: Camera> Drop for FrameGuard<'_, C> {
    fn drop(&mut self) {
        let frame = core::mem::take(&mut self.frame);
        self.camera.release_frame(frame);
    }
}
