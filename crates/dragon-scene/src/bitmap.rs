//! Owned RGBA bitmaps and the few pixel operations objects need.

use crate::surface::Texture;
use dragon_core::Rgb;
use image::{Rgba, RgbaImage};

/// Alpha threshold above which an image pixel counts as solid for hit tests.
pub const HIT_ALPHA_THRESHOLD: u8 = 50;

/// A decoded bitmap together with the texture uploaded from it.
#[derive(Debug, Clone)]
pub struct RenderedBitmap {
    pub bitmap: RgbaImage,
    pub texture: Texture,
}

impl RenderedBitmap {
    /// Uploads `bitmap`; `None` when it has no pixels.
    pub fn new(bitmap: RgbaImage) -> Option<Self> {
        let texture = Texture::from_image(&bitmap)?;
        Some(Self { bitmap, texture })
    }

    /// Returns a recolored copy: every pixel gets `color` while keeping its
    /// own alpha, so anti-aliased glyph edges survive the recolor.
    pub fn remap_rgb_preserving_alpha(&self, color: Rgb) -> Option<Self> {
        Self::new(remap_rgb_preserving_alpha(&self.bitmap, color))
    }

    pub fn width(&self) -> u32 {
        self.bitmap.width()
    }

    pub fn height(&self) -> u32 {
        self.bitmap.height()
    }
}

/// Rewrites RGB of every pixel to `color`, keeping per-pixel alpha.
pub fn remap_rgb_preserving_alpha(bitmap: &RgbaImage, color: Rgb) -> RgbaImage {
    let mut out = bitmap.clone();
    for px in out.pixels_mut() {
        *px = Rgba([color.r, color.g, color.b, px[3]]);
    }
    out
}

/// Alpha at `(x, y)`, `None` outside the bitmap.
pub fn alpha_at(bitmap: &RgbaImage, x: i64, y: i64) -> Option<u8> {
    if x < 0 || y < 0 || x >= bitmap.width() as i64 || y >= bitmap.height() as i64 {
        return None;
    }
    Some(bitmap.get_pixel(x as u32, y as u32)[3])
}
