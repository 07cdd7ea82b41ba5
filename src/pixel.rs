/// One pixel expanded to 8 bits per channel.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default)]
#[cfg_attr(feature = "defmt", derive(defmt::Format))]
pub struct Rgb888 {
    pub r: u8,
    pub g: u8,
    pub b: u8,
}

/// Expands one packed RGB565 sample to RGB888
/// The sample is the camera's big-endian pixel read as a little-endian word,
/// so its two bytes are swapped back before the fields are pulled out.
/// Low bits are zero-filled; there is no rounding.
/// param color: packed sample as stored in the frame buffer
/// returns the expanded pixel
pub const fn rgb565_to_rgb888(color: u16) -> Rgb888 {
    let lb = (color >> 8) as u8;
    let hb = (color & 0xFF) as u8;

    Rgb888 {
        r: (lb & 0x1F) << 3,
        g: ((hb & 0x07) << 5) | ((lb & 0xE0) >> 3),
        b: hb & 0xF8,
    }
}
