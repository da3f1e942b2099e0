//! Hatch-line background generator.
//!
//! A family of parallel lines `-sin(a)*x + cos(a)*y = c` is laid across a
//! rectangle at a fixed spacing and clipped to it. Wide solid lines become
//! filled quads; thin or dashed lines are stepped pixel by pixel onto an
//! off-screen bitmap, with a per-line random dash phase.

use crate::record::{
    DEFAULT_DASH_GAP, DEFAULT_DASH_LEN, DEFAULT_LINE_ANGLE, DEFAULT_LINE_COLOR,
    DEFAULT_LINE_SPACING, DEFAULT_LINE_WIDTH,
};
use crate::surface::{Surface, Texture};
use dragon_core::{IntRect, Point, Rgb};
use image::{Rgba, RgbaImage};
use rand::rngs::StdRng;
use rand::{Rng, SeedableRng};

const EPS: f64 = 1e-6;

/// Coincident intersections closer than this collapse into one.
const DEDUP_DISTANCE: f64 = 1e-3;

/// One clipped hatch line, in area-local coordinates.
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct Segment {
    pub start: Point,
    pub end: Point,
}

impl Segment {
    pub fn length(&self) -> f32 {
        self.start.distance_to(&self.end)
    }
}

/// Visual parameters of the line layer.
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct HatchStyle {
    /// Stroke width in pixels; zero disables the layer.
    pub width: u32,
    pub color: Rgb,
    pub dashed: bool,
    pub dash_len: u32,
    pub gap_len: u32,
    /// Degrees.
    pub angle: f32,
    /// Pixels between neighbouring lines.
    pub spacing: f32,
}

impl Default for HatchStyle {
    fn default() -> Self {
        Self {
            width: DEFAULT_LINE_WIDTH,
            color: DEFAULT_LINE_COLOR,
            dashed: true,
            dash_len: DEFAULT_DASH_LEN,
            gap_len: DEFAULT_DASH_GAP,
            angle: DEFAULT_LINE_ANGLE,
            spacing: DEFAULT_LINE_SPACING,
        }
    }
}

/// Computes the clipped line family for a `width` x `height` area.
///
/// Returns nothing for an empty area or a non-positive spacing. Lines that
/// only touch a corner, or run outside the area, are dropped.
pub fn hatch_segments(width: f32, height: f32, angle_deg: f32, spacing: f32) -> Vec<Segment> {
    if width <= 0.0 || height <= 0.0 || spacing <= 0.0 || !spacing.is_finite() {
        return Vec::new();
    }
    let w = width as f64;
    let h = height as f64;
    let (sin, cos) = (angle_deg as f64).to_radians().sin_cos();
    let constant = |x: f64, y: f64| -sin * x + cos * y;

    let corners = [
        constant(0.0, 0.0),
        constant(w, 0.0),
        constant(0.0, h),
        constant(w, h),
    ];
    let c_min = corners.iter().copied().fold(f64::INFINITY, f64::min);
    let c_max = corners.iter().copied().fold(f64::NEG_INFINITY, f64::max);
    let step = spacing as f64;
    let count = ((c_max - c_min) / step).ceil().max(0.0) as usize;

    let mut segments = Vec::with_capacity(count);
    for k in 0..count {
        let c = c_min + k as f64 * step;
        if let Some(segment) = clip_line(sin, cos, c, w, h) {
            segments.push(segment);
        }
    }
    segments
}

fn clip_line(sin: f64, cos: f64, c: f64, w: f64, h: f64) -> Option<Segment> {
    let mut hits: Vec<(f64, f64)> = Vec::with_capacity(4);
    let within = |v: f64, max: f64| v >= -EPS && v <= max + EPS;

    if cos.abs() > EPS {
        // left and right edges
        for x in [0.0, w] {
            let y = (c + sin * x) / cos;
            if within(y, h) {
                hits.push((x, y.clamp(0.0, h)));
            }
        }
    }
    if sin.abs() > EPS {
        // top and bottom edges
        for y in [0.0, h] {
            let x = (cos * y - c) / sin;
            if within(x, w) {
                hits.push((x.clamp(0.0, w), y));
            }
        }
    }

    hits.sort_by(|a, b| a.0.total_cmp(&b.0).then(a.1.total_cmp(&b.1)));
    hits.dedup_by(|a, b| (a.0 - b.0).hypot(a.1 - b.1) < DEDUP_DISTANCE);
    if hits.len() < 2 {
        return None;
    }

    let (a, b) = (hits[0], hits[1]);
    if (a.0 - b.0).hypot(a.1 - b.1) < DEDUP_DISTANCE {
        return None;
    }
    Some(Segment {
        start: Point::new(a.0 as f32, a.1 as f32),
        end: Point::new(b.0 as f32, b.1 as f32),
    })
}

/// Builds two triangles per segment, `width` wide around the centerline and
/// shifted by `origin`.
pub fn segment_quads(segments: &[Segment], width: f32, origin: Point) -> (Vec<Point>, Vec<u32>) {
    let mut vertices = Vec::with_capacity(segments.len() * 4);
    let mut indices = Vec::with_capacity(segments.len() * 6);
    let half = width / 2.0;

    for seg in segments {
        let len = seg.length();
        if len <= 0.0 {
            continue;
        }
        let nx = -(seg.end.y - seg.start.y) / len * half;
        let ny = (seg.end.x - seg.start.x) / len * half;
        let start = seg.start + origin;
        let end = seg.end + origin;

        let base = vertices.len() as u32;
        vertices.extend_from_slice(&[
            start.offset_by(nx, ny),
            start.offset_by(-nx, -ny),
            end.offset_by(nx, ny),
            end.offset_by(-nx, -ny),
        ]);
        indices.extend_from_slice(&[base, base + 1, base + 2, base + 1, base + 3, base + 2]);
    }
    (vertices, indices)
}

/// Dash/gap cycle in pixels.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct DashPattern {
    pub dash: u32,
    pub gap: u32,
}

impl DashPattern {
    fn period(&self) -> u32 {
        self.dash + self.gap
    }

    fn draws(&self, counter: u32) -> bool {
        self.gap == 0 || counter % self.period() < self.dash
    }
}

/// Steps from `from` to `to` (both inclusive) and paints the pixels the
/// pattern selects. `counter` is the dash phase of the first pixel.
pub fn stroke_bresenham(
    canvas: &mut RgbaImage,
    from: (i32, i32),
    to: (i32, i32),
    pattern: Option<DashPattern>,
    mut counter: u32,
    color: Rgba<u8>,
) {
    let (mut x, mut y) = from;
    let dx = (to.0 - x).abs();
    let dy = -(to.1 - y).abs();
    let sx = if x < to.0 { 1 } else { -1 };
    let sy = if y < to.1 { 1 } else { -1 };
    let mut err = dx + dy;
    let (w, h) = (canvas.width() as i32, canvas.height() as i32);

    loop {
        let paint = pattern.is_none_or(|p| p.draws(counter));
        if paint && x >= 0 && y >= 0 && x < w && y < h {
            canvas.put_pixel(x as u32, y as u32, color);
        }
        counter = counter.wrapping_add(1);

        if x == to.0 && y == to.1 {
            break;
        }
        let e2 = 2 * err;
        if e2 >= dy {
            err += dy;
            x += sx;
        }
        if e2 <= dx {
            err += dx;
            y += sy;
        }
    }
}

/// Rasterizes the segments into a `width` x `height` bitmap.
///
/// Lines wider than one pixel are drawn as `line_width` parallel strokes
/// offset across the dominant axis. In dashed mode every segment starts at a
/// random dash phase and each extra stroke gets its own jitter of up to a
/// quarter dash, all drawn from `seed`.
pub fn rasterize_lines(
    width: u32,
    height: u32,
    segments: &[Segment],
    style: &HatchStyle,
    color: Rgba<u8>,
    seed: u64,
) -> RgbaImage {
    let mut canvas = RgbaImage::new(width, height);
    let pattern = (style.dashed && style.dash_len + style.gap_len > 0).then_some(DashPattern {
        dash: style.dash_len,
        gap: style.gap_len,
    });
    let mut rng = StdRng::seed_from_u64(seed);

    for seg in segments {
        let from = (seg.start.x.round() as i32, seg.start.y.round() as i32);
        let to = (seg.end.x.round() as i32, seg.end.y.round() as i32);
        let x_major = (to.0 - from.0).abs() >= (to.1 - from.1).abs();
        let phase = pattern.map_or(0, |p| rng.gen_range(0..p.period()));

        for d in 0..style.width.max(1) as i32 {
            let jitter = match pattern {
                Some(p) if d > 0 => rng.gen_range(0..=p.dash / 4),
                _ => 0,
            };
            let (ox, oy) = if x_major { (0, d) } else { (d, 0) };
            stroke_bresenham(
                &mut canvas,
                (from.0 + ox, from.1 + oy),
                (to.0 + ox, to.1 + oy),
                pattern,
                phase + jitter,
                color,
            );
        }
    }
    canvas
}

/// Draws the line layer over `area`.
///
/// `alpha` is the layer opacity in `0..=1`; `seed` fixes the dash phases so
/// that repeated draws within one idle period look the same.
pub fn draw_hatch(surface: &mut dyn Surface, area: IntRect, style: &HatchStyle, alpha: f32, seed: u64) {
    if style.width == 0 || area.is_empty() {
        return;
    }
    let segments = hatch_segments(area.w as f32, area.h as f32, style.angle, style.spacing);
    if segments.is_empty() {
        return;
    }
    let a = (alpha.clamp(0.0, 1.0) * 255.0).round() as u8;

    if style.dashed || style.width == 1 {
        let color = Rgba([style.color.r, style.color.g, style.color.b, a]);
        let canvas = rasterize_lines(area.w as u32, area.h as u32, &segments, style, color, seed);
        if let Some(texture) = Texture::from_image(&canvas) {
            surface.blit(&texture, area.to_rect());
        }
    } else {
        let origin = Point::new(area.x as f32, area.y as f32);
        let (vertices, indices) = segment_quads(&segments, style.width as f32, origin);
        surface.fill_triangles(&vertices, &indices, style.color.with_alpha(a));
    }
}
