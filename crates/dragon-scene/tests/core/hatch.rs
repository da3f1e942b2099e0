use super::common::{Call, RecordingSurface};
use dragon_core::{IntRect, Point, Rect, Rgb};
use dragon_scene::hatch::draw_hatch;
use dragon_scene::{hatch_segments, HatchStyle, Segment};
use proptest::prelude::*;

const TOL: f32 = 1e-3;

fn on_boundary(p: Point, w: f32, h: f32) -> bool {
    let inside = p.x >= -TOL && p.x <= w + TOL && p.y >= -TOL && p.y <= h + TOL;
    let edge = p.x.abs() < TOL
        || (p.x - w).abs() < TOL
        || p.y.abs() < TOL
        || (p.y - h).abs() < TOL;
    inside && edge
}

#[test]
fn test_horizontal_family_spans_full_width() {
    let segs = hatch_segments(100.0, 100.0, 0.0, 10.0);
    assert_eq!(segs.len(), 10);
    for (i, Segment { start, end }) in segs.iter().enumerate() {
        assert!(start.x.abs() < TOL);
        assert!((end.x - 100.0).abs() < TOL);
        assert!((start.y - end.y).abs() < TOL);
        assert!((start.y - i as f32 * 10.0).abs() < TOL);
    }
}

#[test]
fn test_diagonal_endpoints_lie_on_boundary() {
    let segs = hatch_segments(100.0, 100.0, 45.0, 10.0);
    assert!(!segs.is_empty());
    for s in &segs {
        assert!(on_boundary(s.start, 100.0, 100.0), "{:?}", s.start);
        assert!(on_boundary(s.end, 100.0, 100.0), "{:?}", s.end);
        assert!(s.length() > 0.0);
    }
}

#[test]
fn test_negative_angle_covers_area() {
    let segs = hatch_segments(200.0, 50.0, -30.0, 8.0);
    assert!(segs.len() > 10);
    for s in &segs {
        assert!(on_boundary(s.start, 200.0, 50.0));
        assert!(on_boundary(s.end, 200.0, 50.0));
    }
}

proptest! {
    #[test]
    fn segments_always_end_on_the_boundary(
        w in 1.0f32..800.0,
        h in 1.0f32..800.0,
        angle in -360.0f32..360.0,
        spacing in 2.0f32..50.0,
    ) {
        for s in hatch_segments(w, h, angle, spacing) {
            prop_assert!(on_boundary(s.start, w, h));
            prop_assert!(on_boundary(s.end, w, h));
            prop_assert!(s.length() > 0.0);
        }
    }
}

fn style(width: u32, dashed: bool) -> HatchStyle {
    HatchStyle {
        width,
        color: Rgb::BLUE,
        dashed,
        ..HatchStyle::default()
    }
}

#[test]
fn test_wide_solid_lines_are_geometry() {
    let mut surface = RecordingSurface::new(100, 100);
    let area = IntRect::new(0, 0, 100, 100);
    let n = hatch_segments(100.0, 100.0, 45.0, 10.0).len();

    draw_hatch(&mut surface, area, &style(3, false), 0.5, 1);

    assert_eq!(surface.calls.len(), 1);
    match &surface.calls[0] {
        Call::Triangles {
            vertices,
            indices,
            color,
        } => {
            assert_eq!(*vertices, n * 4);
            assert_eq!(*indices, n * 6);
            assert_eq!(color.rgb(), Rgb::BLUE);
            assert_eq!(color.a, 128);
        }
        other => panic!("unexpected call {other:?}"),
    }
}

#[test]
fn test_dashed_and_hairlines_are_blitted_once() {
    let area = IntRect::new(10, 20, 64, 48);
    for (width, dashed) in [(1, false), (1, true), (4, true)] {
        let mut surface = RecordingSurface::new(100, 100);
        draw_hatch(&mut surface, area, &style(width, dashed), 1.0, 7);
        assert_eq!(
            surface.calls,
            vec![Call::Blit {
                size: (64, 48),
                dest: Rect::new(10.0, 20.0, 64.0, 48.0)
            }]
        );
    }
}

#[test]
fn test_zero_width_or_empty_area_draws_nothing() {
    let mut surface = RecordingSurface::new(100, 100);
    draw_hatch(&mut surface, IntRect::new(0, 0, 100, 100), &style(0, true), 1.0, 0);
    draw_hatch(&mut surface, IntRect::new(0, 0, 0, 100), &style(2, false), 1.0, 0);
    assert!(surface.calls.is_empty());
}
