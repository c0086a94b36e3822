//! Pixel formats of the render path.
//!
//! The renderer draws 32-bit pixels (blue, green, red, alpha in memory). The
//! panel takes 24-bit red, green, blue on the wire. Draw buffers are packed
//! in place right before they are transferred.

/// Bytes per rendered pixel
pub const SOURCE_BYTES_PER_PIXEL: usize = 4;
/// Bytes per pixel on the wire
pub const WIRE_BYTES_PER_PIXEL: usize = 3;

/// 32-bit render target pixel
#[repr(C)]
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq)]
pub struct Bgra8888 {
    pub blue: u8,
    pub green: u8,
    pub red: u8,
    pub alpha: u8,
}

impl Bgra8888 {
    pub const fn rgb(red: u8, green: u8, blue: u8) -> Self {
        Self {
            blue,
            green,
            red,
            alpha: 0xFF,
        }
    }

    pub const fn to_bytes(self) -> [u8; SOURCE_BYTES_PER_PIXEL] {
        [self.blue, self.green, self.red, self.alpha]
    }
}

/// Rewrites the first `pixel_count` 32-bit pixels of `buf` as 24-bit RGB in
/// the same memory and returns the packed bytes.
///
/// Pixel `i` is read completely before its 3 output bytes are written at
/// `3 * i`, which never reaches beyond source byte `4 * i`, so no source
/// pixel is overwritten before it has been read. A count larger than the
/// buffer holds is cut to the whole pixels available.
pub fn pack_rgb888_in_place(buf: &mut [u8], pixel_count: usize) -> &[u8] {
    let count = pixel_count.min(buf.len() / SOURCE_BYTES_PER_PIXEL);
    for i in 0..count {
        let src = i * SOURCE_BYTES_PER_PIXEL;
        let [blue, green, red] = [buf[src], buf[src + 1], buf[src + 2]];
        let dst = i * WIRE_BYTES_PER_PIXEL;
        buf[dst] = red;
        buf[dst + 1] = green;
        buf[dst + 2] = blue;
    }
    &buf[..count * WIRE_BYTES_PER_PIXEL]
}

#[cfg(feature = "slint")]
mod target {
    use super::Bgra8888;
    use slint::platform::software_renderer::{PremultipliedRgbaColor, TargetPixel};

    fn blend_channel(dst: u8, src: u8, inverse_alpha: u16) -> u8 {
        ((u16::from(dst) * inverse_alpha / 255) as u8).saturating_add(src)
    }

    impl TargetPixel for Bgra8888 {
        fn blend(&mut self, color: PremultipliedRgbaColor) {
            let inverse_alpha = u16::from(u8::MAX - color.alpha);
            self.red = blend_channel(self.red, color.red, inverse_alpha);
            self.green = blend_channel(self.green, color.green, inverse_alpha);
            self.blue = blend_channel(self.blue, color.blue, inverse_alpha);
            self.alpha = blend_channel(self.alpha, color.alpha, inverse_alpha);
        }

        fn from_rgb(red: u8, green: u8, blue: u8) -> Self {
            Bgra8888::rgb(red, green, blue)
        }
    }
}
