use dragon_core::IntRect;
use dragon_scene::{decode_gif, Disposal, FramePlayer, GifAnimation, GifFrame};
use image::Rgba;
use std::borrow::Cow;

const RED: Rgba<u8> = Rgba([255, 0, 0, 255]);
const BLUE: Rgba<u8> = Rgba([0, 0, 255, 255]);
const CLEAR: Rgba<u8> = Rgba([0, 0, 0, 0]);

fn frame(rect: IntRect, index: u8, disposal: Disposal) -> GifFrame {
    GifFrame {
        left: rect.x as u32,
        top: rect.y as u32,
        width: rect.w as u32,
        height: rect.h as u32,
        palette: None,
        indices: vec![index; (rect.w * rect.h) as usize],
        delay_ms: 80,
        transparent: None,
        disposal,
    }
}

fn three_frames(background_index: Option<u8>) -> GifAnimation {
    GifAnimation {
        width: 10,
        height: 10,
        global_palette: Some(vec![[255, 0, 0], [0, 255, 0], [0, 0, 255], [255, 255, 255]]),
        background_index,
        frames: vec![
            frame(IntRect::new(0, 0, 10, 10), 0, Disposal::DoNotDispose),
            frame(IntRect::new(2, 2, 4, 4), 1, Disposal::RestoreBackground),
            frame(IntRect::new(0, 0, 1, 1), 2, Disposal::Unspecified),
        ],
    }
}

#[test]
fn test_restore_to_background_clears_exactly_previous_rect() {
    let mut player = FramePlayer::new(three_frames(None), true);
    player.advance();
    assert_eq!(player.canvas().get_pixel(3, 3), &Rgba([0, 255, 0, 255]));
    assert_eq!(player.recent_disposal(), Disposal::RestoreBackground);
    assert_eq!(player.previous_rect(), Some(IntRect::new(2, 2, 4, 4)));

    player.advance();
    assert_eq!(player.current_frame(), 2);
    for y in 0..10 {
        for x in 0..10 {
            let expected = if (x, y) == (0, 0) {
                BLUE
            } else if (2..6).contains(&x) && (2..6).contains(&y) {
                CLEAR
            } else {
                RED
            };
            assert_eq!(player.canvas().get_pixel(x, y), &expected, "pixel {x},{y}");
        }
    }
}

#[test]
fn test_restore_uses_background_color_when_defined() {
    let mut player = FramePlayer::new(three_frames(Some(3)), false);
    player.advance();
    player.advance();
    assert_eq!(player.canvas().get_pixel(4, 4), &Rgba([255, 255, 255, 255]));
    assert_eq!(player.canvas().get_pixel(7, 7), &RED);
}

#[test]
fn test_cached_textures_reused_on_loop() {
    let mut player = FramePlayer::new(three_frames(None), true);
    let first = player.texture().cloned().unwrap();
    player.advance();
    player.advance();
    player.advance();
    assert_eq!(player.current_frame(), 0);
    assert!(player.texture().unwrap().same_as(&first));

    player.invalidate();
    assert!(player.frames().iter().all(|f| f.cached.is_none()));
    player.advance();
    assert!(player.frames()[1].cached.is_some());
}

#[test]
fn test_no_cache_mode_keeps_nothing() {
    let mut player = FramePlayer::new(three_frames(None), false);
    player.advance();
    assert!(player.frames().iter().all(|f| f.cached.is_none()));
    assert!(player.texture().is_some());
}

#[test]
fn test_missing_palette_produces_no_frame() {
    let mut anim = three_frames(None);
    anim.global_palette = None;
    let player = FramePlayer::new(anim, true);
    assert!(player.texture().is_none());
    assert_eq!(player.canvas().get_pixel(0, 0), &CLEAR);
}

fn encode(frames: &[gif::Frame<'_>]) -> Vec<u8> {
    let mut bytes = Vec::new();
    {
        let palette = [0u8, 0, 0, 255, 255, 255, 255, 0, 0];
        let mut encoder = gif::Encoder::new(&mut bytes, 4, 4, &palette).unwrap();
        for f in frames {
            encoder.write_frame(f).unwrap();
        }
    }
    bytes
}

#[test]
fn test_decode_reads_timing_disposal_and_transparency() {
    let first = vec![1u8; 16];
    let second = vec![2u8; 4];
    let bytes = encode(&[
        gif::Frame {
            width: 4,
            height: 4,
            delay: 7,
            dispose: gif::DisposalMethod::Keep,
            buffer: Cow::Borrowed(&first),
            ..gif::Frame::default()
        },
        gif::Frame {
            left: 1,
            top: 2,
            width: 2,
            height: 2,
            delay: 0,
            transparent: Some(2),
            dispose: gif::DisposalMethod::Background,
            buffer: Cow::Borrowed(&second),
            ..gif::Frame::default()
        },
    ]);

    let anim = decode_gif(bytes.as_slice(), "test.gif").unwrap();
    assert_eq!((anim.width, anim.height), (4, 4));
    assert_eq!(anim.frames.len(), 2);
    assert!(anim.global_palette.as_ref().map_or(0, Vec::len) >= 3);

    let f0 = &anim.frames[0];
    assert_eq!(f0.delay_ms, 70);
    assert_eq!(f0.disposal, Disposal::DoNotDispose);
    assert_eq!(f0.indices, first);

    let f1 = &anim.frames[1];
    assert_eq!(f1.delay_ms, 100);
    assert_eq!((f1.left, f1.top, f1.width, f1.height), (1, 2, 2, 2));
    assert_eq!(f1.transparent, Some(2));
    assert_eq!(f1.disposal, Disposal::RestoreBackground);

    // the transparent second frame leaves frame one visible
    let mut player = FramePlayer::new(anim, true);
    player.advance();
    assert_eq!(player.canvas().get_pixel(1, 2), &Rgba([255, 255, 255, 255]));
}
