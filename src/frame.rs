use crate::config::{INPUT_HEIGHT, INPUT_WIDTH};
use crate::error::PipelineError;
use crate::inference::TensorInput;
use crate::pixel::rgb565_to_rgb888;

/// Pixel encoding of a captured frame.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
#[cfg_attr(feature = "defmt", derive(defmt::Format))]
pub enum PixelFormat {
    Rgb565,
    Jpeg,
}

/// A frame lent out by the camera driver.
/// `buf` is the driver's own frame buffer and must go back through
/// `Camera::release_frame` before the next capture.
#[derive(Debug)]
pub struct RawFrame {
    pub width: usize,
    pub height: usize,
    pub format: PixelFormat,
    pub buf: &'static mut [u16],
}

impl Default for RawFrame {
    fn default() -> Self {
        RawFrame {
            width: 0,
            height: 0,
            format: PixelFormat::Rgb565,
            buf: &mut [],
        }
    }
}

/// Top-left corner of the model window inside a frame
/// Horizontally centered, vertically flush with the bottom edge.
/// param width: frame width
/// param height: frame height
/// returns (startx, starty)
pub fn crop_origin(width: usize, height: usize) -> Result<(usize, usize), PipelineError> {
    if width < INPUT_WIDTH || height < INPUT_HEIGHT {
        return Err(PipelineError::FrameTooSmall { width, height });
    }
    Ok(((width - INPUT_WIDTH) / 2, height - INPUT_HEIGHT))
}

/// Copies the model window of a frame into the model input
/// Values stay in 0..=255, written in row-major scan order.
/// param frame: captured RGB565 frame
/// param tensor: model input, overwritten completely
pub fn load_frame<T>(frame: &RawFrame, tensor: &mut T) -> Result<(), PipelineError>
where
    T: TensorInput + ?Sized,
{
    if frame.format != PixelFormat::Rgb565 {
        return Err(PipelineError::UnsupportedFormat(frame.format));
    }
    let (startx, starty) = crop_origin(frame.width, frame.height)?;
    let actual = frame.buf.len();
    let expected = frame.width.checked_mul(frame.height).unwrap_or(usize::MAX);
    if actual < expected {
        return Err(PipelineError::FrameTruncated { expected, actual });
    }

    let mut post = 0;
    for y in 0..INPUT_HEIGHT {
        let row = (starty + y) * frame.width + startx;
        for &color in &frame.buf[row..row + INPUT_WIDTH] {
            tensor.write_pixel(post, rgb565_to_rgb888(color));
            post += 1;
        }
    }
    Ok(())
}
