use super::common::{solid_image, FakeLoader, RecordingSurface, GLYPH_H, GLYPH_W};
use dragon_core::{
    CursorStyle, IntRect, InputEvent, Key, Modifiers, MouseButton, Point, Rgb, UpdateLevel,
};
use dragon_scene::objects::OPACITY_STEP;
use dragon_scene::{
    AnimatedGif, Animated, Disposal, DrawParams, GifAnimation, GifFrame, ImageObject, ImageSource,
    Interaction, ObjectBase, ObjectRecord, SceneObject, ScreenObject, Signature,
};
use image::RgbaImage;
use std::path::Path;

const IMAGE_PATH: &str = "/pics/half.png";
const GIF_PATH: &str = "/pics/spin.gif";

/// 40x20, left half nearly transparent, right half opaque.
fn half_transparent() -> RgbaImage {
    RgbaImage::from_fn(40, 20, |x, _| {
        let a = if x < 20 { 30 } else { 255 };
        image::Rgba([200, 100, 50, a])
    })
}

fn loader() -> FakeLoader {
    FakeLoader::default()
        .with_image(IMAGE_PATH, half_transparent())
        .with_image("/pics/solid.png", solid_image(10, 10))
        .with_gif(GIF_PATH, two_frame_gif())
}

fn two_frame_gif() -> GifAnimation {
    let frame = |index: u8, delay_ms: u32| GifFrame {
        left: 0,
        top: 0,
        width: 8,
        height: 8,
        palette: None,
        indices: vec![index; 64],
        delay_ms,
        transparent: None,
        disposal: Disposal::DoNotDispose,
    };
    GifAnimation {
        width: 8,
        height: 8,
        global_palette: Some(vec![[255, 0, 0], [0, 0, 255]]),
        background_index: None,
        frames: vec![frame(0, 40), frame(1, 120)],
    }
}

fn image_at(x: f32, y: f32, loader: &FakeLoader) -> ImageObject {
    ImageObject::new(
        ImageSource::from_path(Path::new(IMAGE_PATH)),
        false,
        ObjectBase::new(Point::new(x, y)),
        loader,
    )
}

fn edit_ctx(current: u64) -> Interaction {
    Interaction {
        layout_mode: true,
        current,
        ..Default::default()
    }
}

fn wheel(x: f32, y: f32, delta: f32, modifiers: Modifiers) -> InputEvent {
    InputEvent::Wheel {
        pos: Point::new(x, y),
        delta,
        modifiers,
    }
}

fn key(key: Key) -> InputEvent {
    InputEvent::KeyDown {
        key,
        modifiers: Modifiers::NONE,
    }
}

#[test]
fn test_image_hit_ignores_faint_pixels() {
    let loader = loader();
    let image = image_at(100.0, 100.0, &loader);
    assert!(image.valid());
    // bounds are (80, 90, 40, 20)
    assert!(!image.hit_test(Point::new(85.0, 100.0)));
    assert!(image.hit_test(Point::new(110.0, 100.0)));
    assert!(!image.hit_test(Point::new(130.0, 100.0)));
}

#[test]
fn test_flip_key_mirrors_hit_area() {
    let loader = loader();
    let mut image = image_at(100.0, 100.0, &loader);
    let mut ctx = edit_ctx(1);
    ctx.cursor = Point::new(110.0, 100.0);

    let response = image.handle_event(&key(Key::Char('f')), &mut ctx);
    assert_eq!(response.update, UpdateLevel::SettingsChanged);
    assert!(image.flip_horizontal());
    assert!(image.hit_test(Point::new(85.0, 100.0)));
    assert!(!image.hit_test(Point::new(110.0, 100.0)));
}

#[test]
fn test_drag_moves_anchor_on_release() {
    let loader = loader();
    let mut image = image_at(100.0, 100.0, &loader);
    let mut ctx = edit_ctx(7);

    let down = InputEvent::ButtonDown {
        pos: Point::new(110.0, 100.0),
        button: MouseButton::Left,
    };
    assert_eq!(
        image.handle_event(&down, &mut ctx).update,
        UpdateLevel::ViewChanged
    );
    assert_eq!(ctx.capture, Some(7));

    let motion = InputEvent::PointerMotion {
        pos: Point::new(150.0, 120.0),
    };
    assert_eq!(
        image.handle_event(&motion, &mut ctx).update,
        UpdateLevel::ViewChanged
    );
    assert_eq!(image.base().position, Point::new(100.0, 100.0));
    assert_eq!(ctx.drag_anchor(), Point::new(140.0, 120.0));

    let up = InputEvent::ButtonUp {
        pos: Point::new(150.0, 120.0),
        button: MouseButton::Left,
    };
    assert_eq!(
        image.handle_event(&up, &mut ctx).update,
        UpdateLevel::SettingsChanged
    );
    assert_eq!(image.base().position, Point::new(140.0, 120.0));
    assert!(!ctx.is_captured());
}

#[test]
fn test_press_outside_layout_mode_is_ignored() {
    let loader = loader();
    let mut image = image_at(100.0, 100.0, &loader);
    let mut ctx = Interaction::default();
    let down = InputEvent::ButtonDown {
        pos: Point::new(110.0, 100.0),
        button: MouseButton::Left,
    };
    assert!(!image.handle_event(&down, &mut ctx).handled);
    assert!(!ctx.is_captured());
}

#[test]
fn test_hover_requests_pointer_cursor() {
    let loader = loader();
    let mut image = image_at(100.0, 100.0, &loader);
    let mut ctx = edit_ctx(1);
    let motion = InputEvent::PointerMotion {
        pos: Point::new(110.0, 100.0),
    };
    let response = image.handle_event(&motion, &mut ctx);
    assert!(response.handled);
    assert_eq!(response.update, UpdateLevel::None);
    assert_eq!(ctx.cursor_style, CursorStyle::Pointer);
}

#[test]
fn test_wheel_gestures() {
    let loader = loader();
    let mut image = image_at(100.0, 100.0, &loader);
    let mut ctx = edit_ctx(1);

    image.handle_event(&wheel(110.0, 100.0, -1.0, Modifiers::NONE), &mut ctx);
    assert!((image.base().opacity - (1.0 - OPACITY_STEP)).abs() < 1e-6);

    image.handle_event(&wheel(110.0, 100.0, 1.0, Modifiers::SHIFT), &mut ctx);
    assert!((image.base().scale - 1.1).abs() < 1e-5);
    // the point under the cursor stays put
    assert!((image.base().position.x - 99.0).abs() < 1e-4);

    let response = image.handle_event(&wheel(110.0, 100.0, 1.0, Modifiers::CTRL), &mut ctx);
    assert_eq!(response.update, UpdateLevel::SettingsChanged);
    assert!((image.base().rotation - 5.0).abs() < 1e-6);

    // wheel over nothing
    let miss = image.handle_event(&wheel(500.0, 500.0, 1.0, Modifiers::NONE), &mut ctx);
    assert!(!miss.handled);
}

#[test]
fn test_delete_under_cursor() {
    let loader = loader();
    let mut image = image_at(100.0, 100.0, &loader);
    let mut ctx = edit_ctx(1);

    ctx.cursor = Point::new(0.0, 0.0);
    assert!(!image.handle_event(&key(Key::Delete), &mut ctx).handled);

    ctx.cursor = Point::new(110.0, 100.0);
    assert!(image.handle_event(&key(Key::Delete), &mut ctx).handled);
    assert!(!image.valid());
    assert!(image.to_record().is_none());
    assert!(!image.hit_test(Point::new(110.0, 100.0)));
}

#[test]
fn test_missing_image_is_invalid() {
    let loader = FakeLoader::default();
    let image = image_at(0.0, 0.0, &loader);
    assert!(!image.valid());
    assert!(image.to_record().is_none());

    let mut surface = RecordingSurface::new(10, 10);
    let params = DrawParams {
        global_alpha: 1.0,
        idle_ticks: 0,
    };
    image.draw(Point::default(), &params, &mut surface);
    assert!(surface.calls.is_empty());
}

#[test]
fn test_signature_recolor_keeps_alpha() {
    let loader = loader();
    let mut signature = Signature::new(
        "ab",
        "any.ttf",
        40.0,
        Rgb::BLACK,
        ObjectBase::new(Point::new(50.0, 50.0)),
        &loader,
    );
    assert_eq!(signature.base().extent.w, 2 * GLYPH_W as i32);
    assert_eq!(signature.base().extent.h, GLYPH_H as i32);

    let mut ctx = edit_ctx(1);
    ctx.cursor = Point::new(50.0, 50.0);
    let response = signature.handle_event(&key(Key::Char('r')), &mut ctx);
    assert_eq!(response.update, UpdateLevel::SettingsChanged);
    assert_eq!(signature.font_color(), Rgb::RED);

    let bitmap = &signature.bitmap().unwrap().bitmap;
    assert_eq!(bitmap.get_pixel(0, 0), &image::Rgba([255, 0, 0, 127]));
    assert_eq!(bitmap.get_pixel(3, 5), &image::Rgba([255, 0, 0, 255]));
}

#[test]
fn test_signature_with_missing_font_is_inert() {
    let loader = loader();
    let signature = Signature::new(
        "hello",
        "missing.ttf",
        40.0,
        Rgb::BLACK,
        ObjectBase::new(Point::new(50.0, 50.0)),
        &loader,
    );
    assert!(!signature.valid());
    assert!(signature.to_record().is_none());
    assert!(!signature.hit_test(Point::new(50.0, 50.0)));
}

#[test]
fn test_record_round_trip_keeps_pose() {
    let loader = loader();
    let mut base = ObjectBase::new(Point::new(123.456_78, 45.678_91));
    base.scale = 1.234_567;
    base.rotation = 33.3;
    base.opacity = 0.42;
    let image = ImageObject::new(
        ImageSource::from_path(Path::new(IMAGE_PATH)),
        true,
        base,
        &loader,
    );

    let record = image.to_record().unwrap();
    let value = record.to_value().unwrap();
    let parsed = ObjectRecord::from_value(value).unwrap();
    let restored = SceneObject::from_record(
        &parsed,
        &loader,
        Path::new("/elsewhere"),
        IntRect::new(0, 0, 800, 600),
        0,
    );

    assert_eq!(restored.type_name(), "Image");
    let (a, b) = (image.base(), restored.base());
    assert!((a.position.x - b.position.x).abs() < 1e-3);
    assert!((a.position.y - b.position.y).abs() < 1e-3);
    assert!((a.scale - b.scale).abs() < 1e-3);
    assert!((a.rotation - b.rotation).abs() < 1e-3);
    assert!((a.opacity - b.opacity).abs() < 1e-3);
    match restored {
        SceneObject::Image(restored) => {
            assert!(restored.flip_horizontal());
            assert_eq!(restored.source().name, "half.png");
        }
        other => panic!("restored as {}", other.type_name()),
    }
}

#[test]
fn test_animated_gif_advances_and_draws_current_frame() {
    let loader = loader();
    let mut gif = AnimatedGif::new(
        ImageSource::from_path(Path::new(GIF_PATH)),
        false,
        true,
        ObjectBase::new(Point::new(20.0, 20.0)),
        &loader,
        1_000,
    );
    assert!(gif.valid());
    assert_eq!(gif.base().extent.w, 8);
    assert!(gif.last_change_ms() <= 1_000);
    assert!(gif.last_change_ms() > 1_000 - 500);
    assert_eq!(gif.current_delay_ms(), 40);

    assert!(gif.advance_frame());
    assert_eq!(gif.current_delay_ms(), 120);
    assert_eq!(gif.player().unwrap().current_frame(), 1);

    let mut surface = RecordingSurface::new(50, 50);
    let params = DrawParams {
        global_alpha: 1.0,
        idle_ticks: 0,
    };
    gif.draw(gif.base().position, &params, &mut surface);
    assert_eq!(surface.textures().len(), 1);

    assert!(gif.hit_test(Point::new(20.0, 20.0)));
    match gif.to_record() {
        Some(ObjectRecord::AnimatedGif(r)) => assert!(r.cache_frames),
        other => panic!("unexpected record {other:?}"),
    }
}

#[test]
fn test_animated_gif_without_file_is_invalid() {
    let loader = FakeLoader::default();
    let gif = AnimatedGif::new(
        ImageSource::from_path(Path::new("/nope.gif")),
        false,
        true,
        ObjectBase::new(Point::default()),
        &loader,
        0,
    );
    assert!(!gif.valid());
    assert!(gif.player().is_none());
    assert_eq!(gif.last_change_ms(), 0);
}
