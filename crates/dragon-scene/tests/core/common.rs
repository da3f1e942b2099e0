//! Test doubles: an in-memory asset loader and a surface that records calls.

use dragon_core::{AssetError, Point, Rect, Rgb, Rgba};
use dragon_scene::{AssetLoader, GifAnimation, Surface, TextRequest, Texture, TextureQuad};
use image::RgbaImage;
use std::collections::HashMap;
use std::path::{Path, PathBuf};

/// Glyph cell size used by [`FakeLoader::render_text`].
pub const GLYPH_W: u32 = 10;
pub const GLYPH_H: u32 = 20;

#[derive(Default)]
pub struct FakeLoader {
    pub images: HashMap<PathBuf, RgbaImage>,
    pub gifs: HashMap<PathBuf, GifAnimation>,
}

impl FakeLoader {
    pub fn with_image(mut self, path: &str, image: RgbaImage) -> Self {
        self.images.insert(PathBuf::from(path), image);
        self
    }

    pub fn with_gif(mut self, path: &str, gif: GifAnimation) -> Self {
        self.gifs.insert(PathBuf::from(path), gif);
        self
    }
}

impl AssetLoader for FakeLoader {
    /// Every character becomes a solid `GLYPH_W x GLYPH_H` block, except
    /// spaces which stay transparent.
    fn render_text(&self, request: &TextRequest) -> Result<RgbaImage, AssetError> {
        if request.font_name == "missing.ttf" {
            return Err(AssetError::FontNotFound {
                name: request.font_name.clone(),
            });
        }
        let chars: Vec<char> = request.text.chars().collect();
        if chars.is_empty() {
            return Err(AssetError::Empty {
                what: "text".into(),
            });
        }
        let Rgb { r, g, b } = request.color;
        let mut img = RgbaImage::new(chars.len() as u32 * GLYPH_W, GLYPH_H);
        for (i, c) in chars.iter().enumerate() {
            let alpha = if *c == ' ' { 0 } else { 255 };
            for x in 0..GLYPH_W {
                for y in 0..GLYPH_H {
                    // soft edge on the first row to check alpha survives recolors
                    let a = if y == 0 { alpha / 2 } else { alpha };
                    img.put_pixel(i as u32 * GLYPH_W + x, y, image::Rgba([r, g, b, a]));
                }
            }
        }
        Ok(img)
    }

    fn load_image(&self, path: &Path) -> Result<RgbaImage, AssetError> {
        self.images
            .get(path)
            .cloned()
            .ok_or_else(|| AssetError::Unreadable {
                path: path.display().to_string(),
                reason: "not found".into(),
            })
    }

    fn load_gif(&self, path: &Path) -> Result<GifAnimation, AssetError> {
        self.gifs
            .get(path)
            .cloned()
            .ok_or_else(|| AssetError::Unreadable {
                path: path.display().to_string(),
                reason: "not found".into(),
            })
    }
}

#[derive(Debug, Clone, PartialEq)]
pub enum Call {
    Clear,
    Texture {
        size: (u32, u32),
        quad: TextureQuad,
        alpha: f32,
    },
    Triangles {
        vertices: usize,
        indices: usize,
        color: Rgba,
    },
    Blit {
        size: (u32, u32),
        dest: Rect,
    },
    StrokeRect {
        rect: Rect,
        color: Rgba,
    },
}

pub struct RecordingSurface {
    pub width: u32,
    pub height: u32,
    pub calls: Vec<Call>,
}

impl RecordingSurface {
    pub fn new(width: u32, height: u32) -> Self {
        Self {
            width,
            height,
            calls: Vec::new(),
        }
    }

    pub fn textures(&self) -> Vec<&Call> {
        self.calls
            .iter()
            .filter(|c| matches!(c, Call::Texture { .. }))
            .collect()
    }

    pub fn count(&self, pred: impl Fn(&Call) -> bool) -> usize {
        self.calls.iter().filter(|c| pred(c)).count()
    }
}

impl Surface for RecordingSurface {
    fn size(&self) -> (u32, u32) {
        (self.width, self.height)
    }

    fn clear(&mut self) {
        self.calls.push(Call::Clear);
    }

    fn draw_texture(&mut self, texture: &Texture, quad: &TextureQuad, alpha: f32) {
        self.calls.push(Call::Texture {
            size: (texture.width(), texture.height()),
            quad: *quad,
            alpha,
        });
    }

    fn fill_triangles(&mut self, vertices: &[Point], indices: &[u32], color: Rgba) {
        self.calls.push(Call::Triangles {
            vertices: vertices.len(),
            indices: indices.len(),
            color,
        });
    }

    fn blit(&mut self, texture: &Texture, dest: Rect) {
        self.calls.push(Call::Blit {
            size: (texture.width(), texture.height()),
            dest,
        });
    }

    fn stroke_rect(&mut self, rect: Rect, color: Rgba) {
        self.calls.push(Call::StrokeRect { rect, color });
    }
}

/// An opaque `w x h` bitmap.
pub fn solid_image(w: u32, h: u32) -> RgbaImage {
    RgbaImage::from_pixel(w, h, image::Rgba([10, 20, 30, 255]))
}
