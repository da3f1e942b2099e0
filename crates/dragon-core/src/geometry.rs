//! Transform and hit-test primitives shared by every screen object.
//!
//! Coordinates are surface pixels with the y axis pointing down, so a
//! positive rotation angle turns clockwise on screen.

use serde::{Deserialize, Serialize};

/// A 2D point in surface coordinates.
#[derive(Debug, Clone, Copy, PartialEq, Default, Serialize, Deserialize)]
pub struct Point {
    pub x: f32,
    pub y: f32,
}

impl Point {
    /// Creates a new point with the given X and Y coordinates.
    pub const fn new(x: f32, y: f32) -> Self {
        Self { x, y }
    }

    /// Calculates the distance to another point.
    pub fn distance_to(&self, other: &Point) -> f32 {
        ((self.x - other.x).powi(2) + (self.y - other.y).powi(2)).sqrt()
    }

    pub fn offset_by(&self, dx: f32, dy: f32) -> Point {
        Point::new(self.x + dx, self.y + dy)
    }
}

impl std::ops::Sub for Point {
    type Output = Point;

    fn sub(self, rhs: Point) -> Point {
        Point::new(self.x - rhs.x, self.y - rhs.y)
    }
}

impl std::ops::Add for Point {
    type Output = Point;

    fn add(self, rhs: Point) -> Point {
        Point::new(self.x + rhs.x, self.y + rhs.y)
    }
}

/// Rotates `point` about `pivot` by `angle_deg` degrees (clockwise on screen).
///
/// The arithmetic runs in double precision and the result is narrowed back
/// to `f32`, so repeated rotations around the cursor do not drift as fast as
/// they would in single precision.
pub fn rotate_point(pivot: Point, point: Point, angle_deg: f64) -> Point {
    let phi = angle_deg.to_radians();
    let dx = point.x as f64 - pivot.x as f64;
    let dy = point.y as f64 - pivot.y as f64;
    let (sin_phi, cos_phi) = phi.sin_cos();

    Point {
        x: (pivot.x as f64 + dx * cos_phi - dy * sin_phi) as f32,
        y: (pivot.y as f64 + dx * sin_phi + dy * cos_phi) as f32,
    }
}

/// Axis-aligned rectangle with floating point origin and size.
#[derive(Debug, Clone, Copy, PartialEq, Default)]
pub struct Rect {
    pub x: f32,
    pub y: f32,
    pub w: f32,
    pub h: f32,
}

impl Rect {
    pub const fn new(x: f32, y: f32, w: f32, h: f32) -> Self {
        Self { x, y, w, h }
    }

    /// Half-open containment test, matching pixel semantics: the right and
    /// bottom edges are outside.
    pub fn contains(&self, p: Point) -> bool {
        p.x >= self.x && p.x < self.x + self.w && p.y >= self.y && p.y < self.y + self.h
    }

    pub fn is_empty(&self) -> bool {
        self.w <= 0.0 || self.h <= 0.0
    }

    pub fn center(&self) -> Point {
        Point::new(self.x + self.w / 2.0, self.y + self.h / 2.0)
    }

    /// Returns the rectangle shrunk by `d` on every side.
    pub fn inset(&self, d: f32) -> Rect {
        Rect::new(self.x + d, self.y + d, self.w - 2.0 * d, self.h - 2.0 * d)
    }
}

/// Integer rectangle used for work areas and GIF dirty regions.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default, Serialize, Deserialize)]
pub struct IntRect {
    pub x: i32,
    pub y: i32,
    pub w: i32,
    pub h: i32,
}

impl IntRect {
    pub const fn new(x: i32, y: i32, w: i32, h: i32) -> Self {
        Self { x, y, w, h }
    }

    pub fn is_empty(&self) -> bool {
        self.w <= 0 || self.h <= 0
    }

    pub fn to_rect(self) -> Rect {
        Rect::new(self.x as f32, self.y as f32, self.w as f32, self.h as f32)
    }

    pub fn center(&self) -> Point {
        self.to_rect().center()
    }

    /// Intersection with another rectangle, `None` when they do not overlap.
    pub fn intersect(&self, other: &IntRect) -> Option<IntRect> {
        let x0 = self.x.max(other.x);
        let y0 = self.y.max(other.y);
        let x1 = (self.x + self.w).min(other.x + other.w);
        let y1 = (self.y + self.h).min(other.y + other.h);
        if x1 > x0 && y1 > y0 {
            Some(IntRect::new(x0, y0, x1 - x0, y1 - y0))
        } else {
            None
        }
    }
}

/// Integer bounding box of an object's bitmap plus the offset of its anchor.
///
/// The anchor (the object's `position`) sits at `(cx, cy)` inside the
/// unscaled bitmap; for all current objects that is the bitmap centre.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default)]
pub struct Extent {
    pub w: i32,
    pub h: i32,
    pub cx: i32,
    pub cy: i32,
}

impl Extent {
    /// Extent anchored at the bitmap centre.
    pub fn centered(w: u32, h: u32) -> Self {
        let w = w as i32;
        let h = h as i32;
        Self {
            w,
            h,
            cx: w / 2,
            cy: h / 2,
        }
    }

    pub fn is_empty(&self) -> bool {
        self.w <= 0 || self.h <= 0
    }
}

/// The placement shared by every screen object: where it is, how big, how
/// it is turned.
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct Placement {
    pub position: Point,
    pub extent: Extent,
    pub scale: f32,
    pub rotation: f32,
}

impl Placement {
    /// The scaled, unrotated rectangle of the object anchored at `anchor`.
    pub fn bounds_at(&self, anchor: Point) -> Rect {
        Rect::new(
            anchor.x - self.extent.cx as f32 * self.scale,
            anchor.y - self.extent.cy as f32 * self.scale,
            self.extent.w as f32 * self.scale,
            self.extent.h as f32 * self.scale,
        )
    }

    /// Maps `pt` into the object's unrotated frame.
    pub fn to_local(&self, pt: Point) -> Point {
        if self.rotation != 0.0 {
            rotate_point(self.position, pt, -(self.rotation as f64))
        } else {
            pt
        }
    }

    /// Bounding-rectangle hit test honouring rotation.
    ///
    /// Returns the point in the object's local frame when it lies inside, so
    /// callers can layer per-pixel tests on top.
    pub fn hit(&self, pt: Point) -> Option<Point> {
        if self.extent.is_empty() || self.scale <= 0.0 {
            return None;
        }
        let local = self.to_local(pt);
        self.bounds_at(self.position).contains(local).then_some(local)
    }

    /// Convenience wrapper around [`Placement::hit`].
    pub fn hit_test(&self, pt: Point) -> bool {
        self.hit(pt).is_some()
    }
}

/// Rounds to a fixed number of decimals, used when persisting floats.
pub fn round_to_precision(value: f64, decimals: i32) -> f64 {
    let factor = 10f64.powi(decimals);
    (value * factor).round() / factor
}
