//! Services that turn names on disk into bitmaps.
//!
//! Screen objects ask an [`AssetLoader`] for their pixels so the scene can be
//! exercised without fonts or image files; [`FsAssetLoader`] is the real one.

use crate::animation::{decode_gif_file, GifAnimation};
use crate::font_manager;
use dragon_core::{AssetError, Rgb};
use image::{Rgba, RgbaImage};
use rusttype::{point as rt_point, Scale};
use std::path::{Path, PathBuf};
use tracing::debug;

/// A block of text to rasterize.
#[derive(Debug, Clone, PartialEq)]
pub struct TextRequest {
    pub text: String,
    pub font_name: String,
    pub font_size: f32,
    pub color: Rgb,
}

/// Decoding services required by the screen objects.
pub trait AssetLoader {
    /// Renders `request` into a tightly cropped bitmap whose alpha carries the
    /// glyph coverage.
    fn render_text(&self, request: &TextRequest) -> Result<RgbaImage, AssetError>;

    fn load_image(&self, path: &Path) -> Result<RgbaImage, AssetError>;

    fn load_gif(&self, path: &Path) -> Result<GifAnimation, AssetError>;
}

/// Loader backed by the file system, rusttype and the system font database.
#[derive(Debug, Clone, Default)]
pub struct FsAssetLoader {
    font_dir: Option<PathBuf>,
}

impl FsAssetLoader {
    pub fn new() -> Self {
        Self::default()
    }

    /// Fonts named by file are looked for in `dir` before the system fonts.
    pub fn with_font_dir(dir: impl Into<PathBuf>) -> Self {
        Self {
            font_dir: Some(dir.into()),
        }
    }

    pub fn font_dir(&self) -> Option<&Path> {
        self.font_dir.as_deref()
    }
}

impl AssetLoader for FsAssetLoader {
    fn render_text(&self, request: &TextRequest) -> Result<RgbaImage, AssetError> {
        let font = font_manager::get_font(self.font_dir.as_deref(), &request.font_name)
            .ok_or_else(|| AssetError::FontNotFound {
                name: request.font_name.clone(),
            })?;

        let scale = Scale::uniform(request.font_size);
        let v_metrics = font.v_metrics(scale);
        let glyphs: Vec<_> = font
            .layout(&request.text, scale, rt_point(0.0, v_metrics.ascent))
            .collect();

        let boxes: Vec<_> = glyphs.iter().filter_map(|g| g.pixel_bounding_box()).collect();
        let (Some(min_x), Some(max_x)) = (
            boxes.iter().map(|b| b.min.x).min(),
            boxes.iter().map(|b| b.max.x).max(),
        ) else {
            return Err(AssetError::Empty {
                what: format!("text {:?}", request.text),
            });
        };
        let min_y = boxes.iter().map(|b| b.min.y).min().unwrap_or(0);
        let max_y = boxes.iter().map(|b| b.max.y).max().unwrap_or(0);

        let width = (max_x - min_x).max(0) as u32;
        let height = (max_y - min_y).max(0) as u32;
        if width == 0 || height == 0 {
            return Err(AssetError::Empty {
                what: format!("text {:?}", request.text),
            });
        }

        let color = request.color;
        let mut bitmap = RgbaImage::from_pixel(width, height, Rgba([color.r, color.g, color.b, 0]));
        for glyph in &glyphs {
            if let Some(bounding_box) = glyph.pixel_bounding_box() {
                glyph.draw(|gx, gy, v| {
                    let px = gx as i32 + bounding_box.min.x - min_x;
                    let py = gy as i32 + bounding_box.min.y - min_y;
                    if px < 0 || py < 0 || px >= width as i32 || py >= height as i32 {
                        return;
                    }
                    let alpha = (v.clamp(0.0, 1.0) * 255.0) as u8;
                    let pixel = bitmap.get_pixel_mut(px as u32, py as u32);
                    // overlapping glyph edges keep the stronger coverage
                    pixel[3] = pixel[3].max(alpha);
                });
            }
        }

        debug!(
            "Rendered {:?} with {} at {}px ({}x{})",
            request.text, request.font_name, request.font_size, width, height
        );
        Ok(bitmap)
    }

    fn load_image(&self, path: &Path) -> Result<RgbaImage, AssetError> {
        let reader = image::ImageReader::open(path).map_err(|e| AssetError::Unreadable {
            path: path.display().to_string(),
            reason: e.to_string(),
        })?;
        let decoded = reader
            .with_guessed_format()
            .map_err(|e| AssetError::Unreadable {
                path: path.display().to_string(),
                reason: e.to_string(),
            })?
            .decode()
            .map_err(|e| AssetError::Undecodable {
                path: path.display().to_string(),
                reason: e.to_string(),
            })?;

        let bitmap = decoded.to_rgba8();
        if bitmap.width() == 0 || bitmap.height() == 0 {
            return Err(AssetError::Empty {
                what: path.display().to_string(),
            });
        }
        Ok(bitmap)
    }

    fn load_gif(&self, path: &Path) -> Result<GifAnimation, AssetError> {
        decode_gif_file(path)
    }
}
