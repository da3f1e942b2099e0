use super::common::{solid_image, Call, FakeLoader, RecordingSurface};
use dragon_core::{
    CursorStyle, IntRect, InputEvent, Key, Modifiers, MouseButton, Point, Rect, Rgb, UpdateLevel,
};
use dragon_scene::{
    coalesce_motion, DefaultObjects, Disposal, GifAnimation, GifFrame, Scene, SceneObject,
    ScreenObject, TextDefaults, LINES_ID,
};
use serde_json::json;
use std::path::{Path, PathBuf};

const AREA: IntRect = IntRect::new(0, 0, 200, 100);

fn loader() -> FakeLoader {
    FakeLoader::default()
        .with_image("/pics/a.png", solid_image(10, 10))
        .with_image("/pics/logo.png", solid_image(40, 30))
        .with_gif("/pics/spin.gif", gif())
}

fn gif() -> GifAnimation {
    let frame = |index: u8, delay_ms: u32| GifFrame {
        left: 0,
        top: 0,
        width: 4,
        height: 4,
        palette: None,
        indices: vec![index; 16],
        delay_ms,
        transparent: None,
        disposal: Disposal::Unspecified,
    };
    GifAnimation {
        width: 4,
        height: 4,
        global_palette: Some(vec![[0, 0, 0], [255, 255, 255]]),
        background_index: None,
        frames: vec![frame(0, 40), frame(1, 120)],
    }
}

fn scene() -> Scene {
    Scene::new(AREA, Box::new(loader()))
}

fn edit_scene() -> Scene {
    let mut scene = scene();
    scene.set_layout_mode(true);
    scene
}

fn drop_png(scene: &mut Scene, x: f32, y: f32) -> u64 {
    scene
        .drop_file(Point::new(x, y), Path::new("/pics/a.png"), 0)
        .expect("png drop accepted")
}

fn press(x: f32, y: f32) -> InputEvent {
    InputEvent::ButtonDown {
        pos: Point::new(x, y),
        button: MouseButton::Left,
    }
}

fn release(x: f32, y: f32) -> InputEvent {
    InputEvent::ButtonUp {
        pos: Point::new(x, y),
        button: MouseButton::Left,
    }
}

fn motion(x: f32, y: f32) -> InputEvent {
    InputEvent::PointerMotion {
        pos: Point::new(x, y),
    }
}

fn key(key: Key) -> InputEvent {
    InputEvent::KeyDown {
        key,
        modifiers: Modifiers::NONE,
    }
}

fn position(scene: &Scene, id: u64) -> Point {
    scene.object(id).unwrap().base().position
}

#[test]
fn test_new_scene_holds_only_lines() {
    let scene = scene();
    assert_eq!(scene.len(), 1);
    let (id, object) = scene.objects().next().unwrap();
    assert_eq!(id, LINES_ID);
    assert_eq!(object.type_name(), "Lines");
    assert!(!object.is_selectable());
}

#[test]
fn test_top_most_object_wins_overlap() {
    let mut scene = edit_scene();
    let bottom = drop_png(&mut scene, 50.0, 50.0);
    let top = drop_png(&mut scene, 53.0, 53.0);

    scene.handle_event(&press(51.0, 51.0), 0);
    assert_eq!(scene.capture(), Some(top));

    scene.handle_event(&motion(61.0, 51.0), 0);
    scene.handle_event(&release(61.0, 51.0), 0);
    assert_eq!(scene.capture(), None);
    assert_eq!(position(&scene, top), Point::new(63.0, 53.0));
    assert_eq!(position(&scene, bottom), Point::new(50.0, 50.0));
    assert!(scene.is_dirty());
}

#[test]
fn test_capture_follows_pointer_off_the_object() {
    let mut scene = edit_scene();
    let id = drop_png(&mut scene, 50.0, 50.0);

    scene.handle_event(&press(50.0, 50.0), 0);
    // far outside the bitmap, still delivered to the captured object
    let response = scene.handle_event(&motion(150.0, 90.0), 0);
    assert_eq!(response.update, UpdateLevel::ViewChanged);
    let response = scene.handle_event(&release(150.0, 90.0), 0);
    assert_eq!(response.update, UpdateLevel::SettingsChanged);
    assert_eq!(position(&scene, id), Point::new(150.0, 90.0));
}

#[test]
fn test_drag_preview_hides_lines_and_uses_drag_anchor() {
    let mut scene = edit_scene();
    let id = drop_png(&mut scene, 50.0, 50.0);
    scene.handle_event(&press(50.0, 50.0), 0);
    scene.handle_event(&motion(80.0, 60.0), 0);

    let mut surface = RecordingSurface::new(200, 100);
    scene.draw(&mut surface);

    assert_eq!(surface.count(|c| matches!(c, Call::Blit { .. })), 0);
    match surface.textures().as_slice() {
        [Call::Texture { quad, .. }] => assert_eq!(quad.anchor, Point::new(80.0, 60.0)),
        other => panic!("unexpected draws {other:?}"),
    }
    // the object itself has not moved yet
    assert_eq!(position(&scene, id), Point::new(50.0, 50.0));
    assert!(!scene.needs_redraw());
}

#[test]
fn test_edit_frame_is_six_inset_rings() {
    let mut scene = edit_scene();
    let mut surface = RecordingSurface::new(200, 100);
    scene.draw(&mut surface);

    let rings: Vec<(Rect, u8)> = surface
        .calls
        .iter()
        .filter_map(|c| match c {
            Call::StrokeRect { rect, color } => {
                assert_eq!((color.r, color.g, color.b), (0, 200, 0));
                Some((*rect, color.a))
            }
            _ => None,
        })
        .collect();
    assert_eq!(rings.len(), 6);
    for (i, (rect, alpha)) in rings.iter().enumerate() {
        let inset = i as f32;
        assert_eq!(*alpha as usize, 50 + 41 * i);
        assert_eq!(
            *rect,
            Rect::new(inset, inset, 200.0 - 2.0 * inset, 100.0 - 2.0 * inset)
        );
    }

    scene.set_layout_mode(false);
    let mut surface = RecordingSurface::new(200, 100);
    scene.draw(&mut surface);
    assert_eq!(surface.count(|c| matches!(c, Call::StrokeRect { .. })), 0);
}

#[test]
fn test_edit_frame_follows_offset_work_area() {
    let area = IntRect::new(0, 10, 200, 90);
    let mut scene = Scene::new(area, Box::new(loader()));
    scene.lines_mut().unwrap().style_mut().dashed = true;
    scene.set_layout_mode(true);

    let mut surface = RecordingSurface::new(200, 100);
    scene.draw(&mut surface);

    let blit = surface.calls.iter().find_map(|c| match c {
        Call::Blit { dest, .. } => Some(*dest),
        _ => None,
    });
    assert_eq!(blit, Some(area.to_rect()));
    let outer = surface.calls.iter().find_map(|c| match c {
        Call::StrokeRect { rect, .. } => Some(*rect),
        _ => None,
    });
    assert_eq!(outer, Some(area.to_rect()));
}

#[test]
fn test_hidden_scene_draws_nothing() {
    let mut scene = scene();
    drop_png(&mut scene, 50.0, 50.0);
    scene.handle_event(&key(Key::Char('h')), 0);
    assert!(scene.hidden());

    let mut surface = RecordingSurface::new(200, 100);
    scene.draw(&mut surface);
    assert_eq!(surface.calls, vec![Call::Clear]);

    scene.set_layout_mode(true);
    let mut surface = RecordingSurface::new(200, 100);
    scene.draw(&mut surface);
    assert_eq!(surface.textures().len(), 0);
    assert_eq!(surface.count(|c| matches!(c, Call::StrokeRect { .. })), 6);
}

#[test]
fn test_lines_receive_unclaimed_keys() {
    let mut scene = edit_scene();
    drop_png(&mut scene, 50.0, 50.0);
    scene.handle_event(&motion(150.0, 80.0), 0);

    let response = scene.handle_event(&key(Key::Char('3')), 0);
    assert_eq!(response.update, UpdateLevel::SettingsChanged);
    assert_eq!(scene.lines().unwrap().style().width, 3);

    scene.handle_event(&key(Key::Char('g')), 0);
    assert_eq!(scene.lines().unwrap().style().color, Rgb::GREEN);

    let dashed = scene.lines().unwrap().style().dashed;
    scene.handle_event(&key(Key::Char('d')), 0);
    assert_eq!(scene.lines().unwrap().style().dashed, !dashed);
}

#[test]
fn test_global_keys() {
    let mut scene = scene();
    scene.handle_event(&key(Key::Left), 0);
    assert_eq!(scene.global_alpha(), 238);
    scene.handle_event(&key(Key::Right), 0);
    scene.handle_event(&key(Key::Right), 0);
    assert_eq!(scene.global_alpha(), 255);

    scene.handle_event(&key(Key::Space), 0);
    assert!(scene.layout_mode());
    scene.handle_event(&key(Key::Enter), 0);
    assert!(!scene.layout_mode());

    assert!(!scene.quit_requested());
    scene.handle_event(&key(Key::Char('X')), 0);
    assert!(scene.quit_requested());
}

#[test]
fn test_wheel_on_empty_space_dims_only_in_layout_mode() {
    let wheel = InputEvent::Wheel {
        pos: Point::new(150.0, 80.0),
        delta: -1.0,
        modifiers: Modifiers::NONE,
    };

    let mut scene = scene();
    assert!(!scene.handle_event(&wheel, 0).handled);
    assert_eq!(scene.global_alpha(), 255);

    scene.set_layout_mode(true);
    scene.handle_event(&wheel, 0);
    assert_eq!(scene.global_alpha(), 250);
}

#[test]
fn test_hover_sets_and_resets_cursor() {
    let mut scene = edit_scene();
    drop_png(&mut scene, 50.0, 50.0);
    scene.handle_event(&motion(50.0, 50.0), 0);
    assert_eq!(scene.cursor_style(), CursorStyle::Pointer);
    scene.handle_event(&motion(150.0, 80.0), 0);
    assert_eq!(scene.cursor_style(), CursorStyle::Default);
}

#[test]
fn test_drops() {
    let mut scene = scene();
    let id = scene
        .drop_file(Point::new(10.0, 10.0), Path::new("/pics/spin.gif"), 0)
        .unwrap();
    assert_eq!(scene.animated_ids(), &[id]);
    assert_eq!(scene.object(id).unwrap().type_name(), "AnimatedGif");

    assert!(scene
        .drop_file(Point::default(), Path::new("/pics/a.txt"), 0)
        .is_none());
    assert!(scene
        .drop_file(Point::default(), Path::new("/pics/gone.png"), 0)
        .is_none());

    let response = scene.handle_event(
        &InputEvent::DropText {
            pos: Point::new(100.0, 50.0),
            text: "Here be dragons".into(),
        },
        0,
    );
    assert_eq!(response.update, UpdateLevel::SettingsChanged);
    assert!(scene.drop_text(Point::default(), "   ").is_none());
    assert_eq!(scene.len(), 3);

    let (_, signature) = scene.objects().last().unwrap();
    assert_eq!(signature.type_name(), "Signature");
    assert_eq!(signature.base().scale, 1.0);
}

#[test]
fn test_tick_advances_animation_and_reports_timeout() {
    let mut scene = scene();
    scene.lines_mut().unwrap().style_mut().width = 0;
    let id = scene
        .drop_file(Point::new(10.0, 10.0), Path::new("/pics/spin.gif"), 1_000)
        .unwrap();

    scene.draw(&mut RecordingSurface::new(200, 100));
    assert!(!scene.needs_redraw());

    // the start offset is under a second, so the first frame is due
    let outcome = scene.tick(2_000);
    assert!(outcome.redraw);
    assert_eq!(outcome.timeout_ms, Some(120));
    let SceneObject::AnimatedGif(gif) = scene.object(id).unwrap() else {
        panic!("expected animation");
    };
    assert_eq!(gif.player().unwrap().current_frame(), 1);

    scene.set_hidden(true);
    assert_eq!(scene.tick(3_000).timeout_ms, None);
}

#[test]
fn test_idle_timer_runs_only_for_shimmering_lines() {
    let mut scene = scene();
    scene.set_idle_delay_ms(600);

    let outcome = scene.tick(1_000);
    assert_eq!(outcome.timeout_ms, Some(600));
    assert_eq!(scene.idle_ticks(), 1_000);

    assert_eq!(scene.tick(1_200).timeout_ms, Some(400));
    assert_eq!(scene.idle_ticks(), 1_000);

    scene.lines_mut().unwrap().style_mut().dashed = false;
    assert_eq!(scene.tick(5_000).timeout_ms, None);
}

#[test]
fn test_records_round_trip() {
    let mut scene = scene();
    scene.set_text_defaults(TextDefaults {
        font_color: Rgb::RED,
        ..TextDefaults::default()
    });
    drop_png(&mut scene, 30.0, 40.0);
    scene.drop_text(Point::new(70.0, 20.0), "sig");
    scene.lines_mut().unwrap().style_mut().angle = 30.0;

    let records = scene.records();
    assert_eq!(records.len(), 3);
    assert_eq!(records[0]["type"], "Lines");
    assert_eq!(records[1]["type"], "Image");
    assert_eq!(records[2]["type"], "Signature");

    let mut restored = Scene::new(AREA, Box::new(loader()));
    assert_eq!(restored.load_records(&records, 0), 3);
    assert_eq!(restored.len(), 3);
    assert_eq!(restored.lines().unwrap().style().angle, 30.0);
    assert_eq!(restored.records(), records);
}

#[test]
fn test_bad_records_are_skipped() {
    let mut scene = scene();
    let records = vec![
        json!({"type": "Image", "x": 10, "y": 10, "image_full_path": "/pics/a.png"}),
        json!({"type": "Image", "x": 10, "y": 10, "scale": "big"}),
        json!({"type": "Teapot", "x": 1, "y": 1}),
        json!({"x": 1, "y": 1}),
        json!({"type": "Image", "x": 10, "y": 10, "image_full_path": "/pics/gone.png"}),
    ];
    assert_eq!(scene.load_records(&records, 0), 1);
    assert_eq!(scene.len(), 2);
}

#[test]
fn test_records_without_position_are_centred() {
    let mut scene = scene();
    scene.set_base_dir("/pics");
    let records = vec![
        json!({"type": "Image", "image_name": "a.png"}),
        json!({"image_full_path": "/pics/spin.gif", "x": -5, "y": 20}),
    ];
    assert_eq!(scene.load_records(&records, 0), 2);

    let objects: Vec<_> = scene.objects().skip(1).map(|(_, o)| o).collect();
    assert_eq!(objects[0].type_name(), "Image");
    assert_eq!(objects[0].base().position, Point::new(100.0, 50.0));
    assert_eq!(objects[1].type_name(), "AnimatedGif");
    assert_eq!(objects[1].base().position, Point::new(100.0, 20.0));
    assert_eq!(scene.animated_ids().len(), 1);
}

#[test]
fn test_purge_deleted() {
    let mut scene = edit_scene();
    let keep = drop_png(&mut scene, 20.0, 20.0);
    let doomed = scene
        .drop_file(Point::new(150.0, 50.0), Path::new("/pics/spin.gif"), 0)
        .unwrap();

    scene.handle_event(&motion(150.0, 50.0), 0);
    scene.handle_event(&key(Key::Delete), 0);
    assert!(!scene.object(doomed).unwrap().valid());
    assert_eq!(scene.records().len(), 2);

    assert_eq!(scene.purge_deleted(), 1);
    assert!(scene.object(doomed).is_none());
    assert!(scene.object(keep).is_some());
    assert!(scene.animated_ids().is_empty());
}

#[test]
fn test_focus_lost_cancels_drag() {
    let mut scene = edit_scene();
    let id = drop_png(&mut scene, 50.0, 50.0);
    scene.handle_event(&press(50.0, 50.0), 0);
    scene.handle_event(&motion(90.0, 90.0), 0);

    scene.handle_event(&InputEvent::FocusLost, 0);
    assert_eq!(scene.capture(), None);
    scene.handle_event(&release(90.0, 90.0), 0);
    assert_eq!(position(&scene, id), Point::new(50.0, 50.0));
}

#[test]
fn test_drag_survives_leaving_layout_mode() {
    let mut scene = edit_scene();
    let id = drop_png(&mut scene, 50.0, 50.0);
    scene.handle_event(&press(50.0, 50.0), 0);
    scene.handle_event(&motion(90.0, 90.0), 0);

    scene.handle_event(&key(Key::Space), 0);
    assert!(!scene.layout_mode());
    assert_eq!(scene.capture(), Some(id));
    assert_eq!(scene.cursor_style(), CursorStyle::Default);

    let response = scene.handle_event(&motion(120.0, 80.0), 0);
    assert!(response.handled);
    assert_eq!(response.update, UpdateLevel::ViewChanged);
    let response = scene.handle_event(&release(120.0, 80.0), 0);
    assert!(response.handled);
    assert_eq!(response.update, UpdateLevel::SettingsChanged);
    assert_eq!(scene.capture(), None);
    assert_eq!(position(&scene, id), Point::new(120.0, 80.0));

    // once released, presses outside layout mode are ignored again
    assert!(!scene.handle_event(&press(120.0, 80.0), 0).handled);
}

#[test]
fn test_settings_change_drops_cached_gif_frames() {
    let mut scene = edit_scene();
    let gif_id = scene
        .drop_file(Point::new(10.0, 10.0), Path::new("/pics/spin.gif"), 0)
        .unwrap();
    drop_png(&mut scene, 150.0, 50.0);

    // the start offset is under a second, so this reaches frame 1
    scene.tick(1_000);
    let cached = |scene: &Scene| {
        let SceneObject::AnimatedGif(gif) = scene.object(gif_id).unwrap() else {
            panic!("expected animation");
        };
        let player = gif.player().unwrap();
        assert!(player.cache_frames());
        player.frames().iter().filter(|f| f.cached.is_some()).count()
    };
    assert_eq!(cached(&scene), 2);

    // a wheel over the image changes its opacity
    let wheel = InputEvent::Wheel {
        pos: Point::new(150.0, 50.0),
        delta: -1.0,
        modifiers: Modifiers::NONE,
    };
    let response = scene.handle_event(&wheel, 0);
    assert_eq!(response.update, UpdateLevel::SettingsChanged);
    assert_eq!(cached(&scene), 0);

    // a view-only redraw keeps the cache
    scene.tick(2_000);
    assert_eq!(cached(&scene), 1);
    scene.handle_event(&motion(60.0, 60.0), 0);
    assert_eq!(cached(&scene), 1);
}

#[test]
fn test_dispatch_all_coalesces_motion() {
    let events = vec![
        motion(1.0, 1.0),
        motion(2.0, 2.0),
        key(Key::Left),
        motion(3.0, 3.0),
        motion(4.0, 4.0),
        motion(5.0, 5.0),
    ];
    assert_eq!(
        coalesce_motion(events.clone()),
        vec![motion(2.0, 2.0), key(Key::Left), motion(5.0, 5.0)]
    );

    let mut scene = scene();
    assert_eq!(scene.dispatch_all(events, 0), UpdateLevel::SettingsChanged);
    assert_eq!(scene.global_alpha(), 238);
}

#[test]
fn test_default_objects_placement() {
    let mut scene = scene();
    scene.add_default_objects(
        &DefaultObjects {
            text: "Dragon".into(),
            text_style: TextDefaults::default(),
            text_rotation: 10.0,
            text_opacity: 0.5,
            logo: PathBuf::from("/pics/logo.png"),
            logo_scale: 0.5,
            logo_opacity: 1.0,
        },
        0,
    );
    let objects: Vec<_> = scene.objects().skip(1).map(|(_, o)| o).collect();
    assert_eq!(objects.len(), 2);

    let logo = objects[0].base();
    let expected = Point::new(200.0 * 5.0 / 6.0, 20.0);
    assert!((logo.position.x - expected.x).abs() < 1e-4);
    assert_eq!(logo.position.y, expected.y);
    assert_eq!(logo.scale, 0.5);

    // 0.6 of the scaled logo height below it
    let text = objects[1].base();
    assert_eq!(objects[1].type_name(), "Signature");
    assert!((text.position.y - (20.0 + 0.6 * 15.0)).abs() < 1e-4);
    assert_eq!(text.rotation, 10.0);
    assert_eq!(text.opacity, 0.5);
}
