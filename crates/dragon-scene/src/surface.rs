//! Render surface abstraction and its tiny-skia implementation.
//!
//! Objects never touch pixels of the output directly: they hand textures,
//! filled geometry and rectangles to a [`Surface`]. [`PixmapSurface`] renders
//! into an off-screen RGBA pixmap; tests plug in a recording surface.

use dragon_core::{Point, Rect, Rgba};
use image::RgbaImage;
use std::fmt;
use std::path::Path;
use std::rc::Rc;
use tiny_skia::{
    ColorU8, FillRule, FilterQuality, IntSize, Paint, PathBuilder, Pixmap, PixmapPaint, Stroke,
    Transform,
};

/// An immutable, cheaply clonable GPU-style texture (premultiplied RGBA).
#[derive(Clone)]
pub struct Texture(Rc<Pixmap>);

impl Texture {
    /// Uploads a straight-alpha bitmap. Returns `None` for empty bitmaps.
    pub fn from_image(image: &RgbaImage) -> Option<Texture> {
        let size = IntSize::from_wh(image.width(), image.height())?;
        let mut data = Vec::with_capacity(image.as_raw().len());
        for px in image.pixels() {
            let c = ColorU8::from_rgba(px[0], px[1], px[2], px[3]).premultiply();
            data.extend_from_slice(&[c.red(), c.green(), c.blue(), c.alpha()]);
        }
        Pixmap::from_vec(data, size).map(|p| Texture(Rc::new(p)))
    }

    pub fn width(&self) -> u32 {
        self.0.width()
    }

    pub fn height(&self) -> u32 {
        self.0.height()
    }

    pub fn pixmap(&self) -> &Pixmap {
        &self.0
    }

    /// True when both handles point at the same upload.
    pub fn same_as(&self, other: &Texture) -> bool {
        Rc::ptr_eq(&self.0, &other.0)
    }
}

impl fmt::Debug for Texture {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "Texture({}x{})", self.width(), self.height())
    }
}

/// Where and how a texture lands on the surface.
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct TextureQuad {
    /// Surface point the texture's pivot is drawn at.
    pub anchor: Point,
    /// Pivot inside the texture, in texture pixels.
    pub pivot: Point,
    pub scale: f32,
    /// Degrees, clockwise.
    pub rotation: f32,
    pub flip_horizontal: bool,
}

impl TextureQuad {
    /// Texture-to-surface transform: pivot to origin, flip and scale,
    /// rotate, then move to the anchor.
    pub fn transform(&self) -> Transform {
        let flip = if self.flip_horizontal { -1.0 } else { 1.0 };
        Transform::from_translate(-self.pivot.x, -self.pivot.y)
            .post_scale(flip * self.scale, self.scale)
            .post_rotate(self.rotation)
            .post_translate(self.anchor.x, self.anchor.y)
    }
}

/// Rendering target used by screen objects.
pub trait Surface {
    fn size(&self) -> (u32, u32);

    /// Clears to fully transparent.
    fn clear(&mut self);

    /// Draws a transformed texture with an overall opacity in `0..=1`.
    fn draw_texture(&mut self, texture: &Texture, quad: &TextureQuad, alpha: f32);

    /// Fills triangles (`indices` taken three at a time) with a flat color.
    fn fill_triangles(&mut self, vertices: &[Point], indices: &[u32], color: Rgba);

    /// Copies a texture into `dest`, stretching if sizes differ.
    fn blit(&mut self, texture: &Texture, dest: Rect);

    /// Strokes a one pixel rectangle outline.
    fn stroke_rect(&mut self, rect: Rect, color: Rgba);
}

/// Off-screen surface backed by a tiny-skia pixmap.
pub struct PixmapSurface {
    pixmap: Pixmap,
}

impl PixmapSurface {
    pub fn new(width: u32, height: u32) -> Option<Self> {
        Pixmap::new(width, height).map(|pixmap| Self { pixmap })
    }

    pub fn pixmap(&self) -> &Pixmap {
        &self.pixmap
    }

    /// Straight-alpha RGBA value of one pixel, `None` outside the surface.
    pub fn pixel(&self, x: u32, y: u32) -> Option<Rgba> {
        let c = self.pixmap.pixel(x, y)?.demultiply();
        Some(Rgba::new(c.red(), c.green(), c.blue(), c.alpha()))
    }

    pub fn save_png(&self, path: &Path) -> Result<(), String> {
        self.pixmap.save_png(path).map_err(|e| e.to_string())
    }
}

impl Surface for PixmapSurface {
    fn size(&self) -> (u32, u32) {
        (self.pixmap.width(), self.pixmap.height())
    }

    fn clear(&mut self) {
        self.pixmap.fill(tiny_skia::Color::TRANSPARENT);
    }

    fn draw_texture(&mut self, texture: &Texture, quad: &TextureQuad, alpha: f32) {
        let paint = PixmapPaint {
            opacity: alpha.clamp(0.0, 1.0),
            quality: FilterQuality::Bilinear,
            ..Default::default()
        };
        self.pixmap
            .draw_pixmap(0, 0, texture.pixmap().as_ref(), &paint, quad.transform(), None);
    }

    fn fill_triangles(&mut self, vertices: &[Point], indices: &[u32], color: Rgba) {
        let mut pb = PathBuilder::new();
        for tri in indices.chunks_exact(3) {
            let corners: Option<Vec<&Point>> =
                tri.iter().map(|&i| vertices.get(i as usize)).collect();
            let Some(corners) = corners else {
                continue;
            };
            pb.move_to(corners[0].x, corners[0].y);
            pb.line_to(corners[1].x, corners[1].y);
            pb.line_to(corners[2].x, corners[2].y);
            pb.close();
        }

        let Some(path) = pb.finish() else {
            return;
        };
        let mut paint = Paint::default();
        paint.set_color_rgba8(color.r, color.g, color.b, color.a);
        paint.anti_alias = true;
        self.pixmap
            .fill_path(&path, &paint, FillRule::Winding, Transform::identity(), None);
    }

    fn blit(&mut self, texture: &Texture, dest: Rect) {
        if dest.is_empty() {
            return;
        }
        let sx = dest.w / texture.width() as f32;
        let sy = dest.h / texture.height() as f32;
        let transform = Transform::from_scale(sx, sy).post_translate(dest.x, dest.y);
        self.pixmap.draw_pixmap(
            0,
            0,
            texture.pixmap().as_ref(),
            &PixmapPaint::default(),
            transform,
            None,
        );
    }

    fn stroke_rect(&mut self, rect: Rect, color: Rgba) {
        // Half-pixel inset keeps a 1px stroke on pixel centres.
        let Some(r) = tiny_skia::Rect::from_xywh(
            rect.x + 0.5,
            rect.y + 0.5,
            (rect.w - 1.0).max(0.0),
            (rect.h - 1.0).max(0.0),
        ) else {
            return;
        };
        let path = PathBuilder::from_rect(r);
        let mut paint = Paint::default();
        paint.set_color_rgba8(color.r, color.g, color.b, color.a);
        paint.anti_alias = false;
        let stroke = Stroke {
            width: 1.0,
            ..Default::default()
        };
        self.pixmap
            .stroke_path(&path, &paint, &stroke, Transform::identity(), None);
    }
}
