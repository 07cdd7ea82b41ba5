use crate::config::{CLASS_COUNT, INPUT_CHANNELS, INPUT_HEIGHT, INPUT_LEN, INPUT_WIDTH};
use crate::error::InferenceError;
use crate::pixel::Rgb888;

/// Raw class scores, indexed like `ClassLabel`.
pub type OutputVector = [f32; CLASS_COUNT];

/// Model input: 96x96 pixels, RGB interleaved, values in 0..=255.
/// Lives as long as the classifier and is overwritten on every capture.
pub struct InputTensor {
    data: [f32; INPUT_LEN],
}

impl InputTensor {
    pub const fn new() -> Self {
        InputTensor { data: [0.0; INPUT_LEN] }
    }

    pub fn as_slice(&self) -> &[f32] {
        &self.data
    }
}

impl TensorInput for InputTensor {
    fn write_pixel(&mut self, post: usize, px: Rgb888) {
        let at = post * INPUT_CHANNELS;
        self.data[at] = f32::from(px.r);
        self.data[at + 1] = f32::from(px.g);
        self.data[at + 2] = f32::from(px.b);
    }
}

impl Default for InputTensor {
    fn default() -> Self {
        Self::new()
    }
}

/// The model window kept as 8-bit RGB, a quarter the size of `InputTensor`.
///
/// For targets that cannot hold a float tensor next to the model's own
/// working memory. The float conversion happens when the model is fed.
pub struct PixelStage {
    pixels: [[u8; INPUT_CHANNELS]; INPUT_WIDTH * INPUT_HEIGHT],
}

impl PixelStage {
    pub const fn new() -> Self {
        PixelStage {
            pixels: [[0; INPUT_CHANNELS]; INPUT_WIDTH * INPUT_HEIGHT],
        }
    }

    /// Channel values at a window position, as model floats
    /// param row: 0..INPUT_HEIGHT
    /// param col: 0..INPUT_WIDTH
    pub fn get(&self, row: usize, col: usize) -> [f32; INPUT_CHANNELS] {
        self.pixels[row * INPUT_WIDTH + col].map(f32::from)
    }
}

impl TensorInput for PixelStage {
    fn write_pixel(&mut self, post: usize, px: Rgb888) {
        self.pixels[post] = [px.r, px.g, px.b];
    }
}

impl Default for PixelStage {
    fn default() -> Self {
        Self::new()
    }
}

/// Somewhere the cropped 96x96 window can be written to.
///
/// Positions are row-major: `post = y * INPUT_WIDTH + x`. Channel values
/// stay in 0..=255.
pub trait TensorInput {
    fn write_pixel(&mut self, post: usize, px: Rgb888);
}

/// A fixed, pre-trained flower classifier.
///
/// The classifier owns its input and its last output. A caller fills
/// `input()`, calls `predict()`, then reads `output()`.
pub trait Classifier {
    type Input: TensorInput + ?Sized;

    fn input(&mut self) -> &mut Self::Input;

    /// Runs the model over the current input
    fn predict(&mut self) -> Result<(), InferenceError>;

    /// Scores from the most recent successful `predict()`
    fn output(&self) -> &OutputVector;
}

impl<M: Classifier + ?Sized> Classifier for &mut M {
    type Input = M::Input;

    fn input(&mut self) -> &mut Self::Input {
        (**self).input()
    }

    fn predict(&mut self) -> Result<(), InferenceError> {
        (**self).predict()
    }

    fn output(&self) -> &OutputVector {
        (**self).output()
    }
}
