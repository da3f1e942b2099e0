//! Animated GIF decoding and frame compositing.
//!
//! A [`GifAnimation`] is the indexed-color container as decoded from disk.
//! A [`FramePlayer`] owns the persistent RGBA canvas and turns one indexed
//! frame at a time into a texture, honouring disposal and transparency and
//! optionally caching the texture of every frame for looping playback.

use crate::surface::Texture;
use dragon_core::{AssetError, IntRect};
use image::{Rgba, RgbaImage};
use std::fs::File;
use std::io::{BufReader, Read};
use std::path::Path;
use tracing::{debug, warn};

/// Delay used for frames that declare none (or zero).
pub const DEFAULT_FRAME_DELAY_MS: u32 = 100;

/// What to do with a frame's area before the next frame is drawn.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default)]
pub enum Disposal {
    /// No instruction: the next frame draws over.
    #[default]
    Unspecified,
    /// Leave the frame in place.
    DoNotDispose,
    /// Fill the frame's rectangle with the background.
    RestoreBackground,
}

impl From<gif::DisposalMethod> for Disposal {
    fn from(method: gif::DisposalMethod) -> Self {
        match method {
            gif::DisposalMethod::Keep => Disposal::DoNotDispose,
            gif::DisposalMethod::Background => Disposal::RestoreBackground,
            // restore-to-previous is not supported; it composites like "any"
            gif::DisposalMethod::Any | gif::DisposalMethod::Previous => Disposal::Unspecified,
        }
    }
}

/// RGB palette entries.
pub type Palette = Vec<[u8; 3]>;

/// One indexed frame of an animation.
#[derive(Debug, Clone, PartialEq)]
pub struct GifFrame {
    pub left: u32,
    pub top: u32,
    pub width: u32,
    pub height: u32,
    /// Frame-local palette, overriding the global one.
    pub palette: Option<Palette>,
    /// `width * height` palette indices, row major.
    pub indices: Vec<u8>,
    pub delay_ms: u32,
    pub transparent: Option<u8>,
    pub disposal: Disposal,
}

impl GifFrame {
    pub fn rect(&self) -> IntRect {
        IntRect::new(
            self.left as i32,
            self.top as i32,
            self.width as i32,
            self.height as i32,
        )
    }
}

/// A decoded indexed-color animation.
#[derive(Debug, Clone, PartialEq)]
pub struct GifAnimation {
    pub width: u32,
    pub height: u32,
    pub global_palette: Option<Palette>,
    pub background_index: Option<u8>,
    pub frames: Vec<GifFrame>,
}

fn palette_from_bytes(bytes: &[u8]) -> Palette {
    bytes.chunks_exact(3).map(|c| [c[0], c[1], c[2]]).collect()
}

/// Opens and decodes a GIF file.
pub fn decode_gif_file(path: &Path) -> Result<GifAnimation, AssetError> {
    let name = path.display().to_string();
    let file = File::open(path).map_err(|e| AssetError::Unreadable {
        path: name.clone(),
        reason: e.to_string(),
    })?;
    decode_gif(BufReader::new(file), &name)
}

/// Decodes a GIF stream into indexed frames; `name` is used in errors.
pub fn decode_gif<R: Read>(reader: R, name: &str) -> Result<GifAnimation, AssetError> {
    let undecodable = |e: gif::DecodingError| AssetError::Undecodable {
        path: name.to_string(),
        reason: e.to_string(),
    };

    let mut options = gif::DecodeOptions::new();
    options.set_color_output(gif::ColorOutput::Indexed);
    let mut decoder = options.read_info(reader).map_err(undecodable)?;

    let width = decoder.width() as u32;
    let height = decoder.height() as u32;
    let global_palette = decoder.global_palette().map(palette_from_bytes);
    let background_index = decoder.bg_color().and_then(|i| u8::try_from(i).ok());

    let mut frames = Vec::new();
    while let Some(frame) = decoder.read_next_frame().map_err(undecodable)? {
        let delay_ms = match u32::from(frame.delay) * 10 {
            0 => DEFAULT_FRAME_DELAY_MS,
            ms => ms,
        };
        frames.push(GifFrame {
            left: frame.left as u32,
            top: frame.top as u32,
            width: frame.width as u32,
            height: frame.height as u32,
            palette: frame.palette.as_deref().map(palette_from_bytes),
            indices: frame.buffer.to_vec(),
            delay_ms,
            transparent: frame.transparent,
            disposal: frame.dispose.into(),
        });
    }

    if frames.is_empty() || width == 0 || height == 0 {
        return Err(AssetError::Empty {
            what: name.to_string(),
        });
    }

    debug!(
        "Decoded {} ({}x{}, {} frames)",
        name,
        width,
        height,
        frames.len()
    );

    Ok(GifAnimation {
        width,
        height,
        global_palette,
        background_index,
        frames,
    })
}

/// Per-frame playback record.
#[derive(Debug, Clone)]
pub struct FrameRecord {
    pub delay_ms: u32,
    pub transparent: Option<u8>,
    pub disposal: Disposal,
    /// Texture produced the last time this frame was composited, while still
    /// valid.
    pub cached: Option<Texture>,
}

/// Maps palette indices to canvas colors; `None` marks "do not write".
type ColorLut = [Option<[u8; 4]>; 256];

fn build_lut(palette: &[[u8; 3]], transparent: Option<u8>) -> ColorLut {
    let mut lut: ColorLut = [None; 256];
    for (i, rgb) in palette.iter().take(256).enumerate() {
        lut[i] = Some([rgb[0], rgb[1], rgb[2], 255]);
    }
    if let Some(t) = transparent {
        lut[t as usize] = None;
    }
    lut
}

/// The decode-and-composite state machine of one animation.
#[derive(Debug)]
pub struct FramePlayer {
    animation: GifAnimation,
    canvas: RgbaImage,
    frames: Vec<FrameRecord>,
    current: usize,
    recent_disposal: Disposal,
    previous_rect: Option<IntRect>,
    cache_frames: bool,
    texture: Option<Texture>,
}

impl FramePlayer {
    /// Creates the canvas (fully transparent) and composites frame 0.
    pub fn new(animation: GifAnimation, cache_frames: bool) -> Self {
        let canvas = RgbaImage::new(animation.width, animation.height);
        let frames = animation
            .frames
            .iter()
            .map(|f| FrameRecord {
                delay_ms: f.delay_ms,
                transparent: f.transparent,
                disposal: f.disposal,
                cached: None,
            })
            .collect();

        let mut player = Self {
            animation,
            canvas,
            frames,
            current: 0,
            recent_disposal: Disposal::Unspecified,
            previous_rect: None,
            cache_frames,
            texture: None,
        };
        player.render_frame();
        player
    }

    pub fn frame_count(&self) -> usize {
        self.frames.len()
    }

    pub fn current_frame(&self) -> usize {
        self.current
    }

    pub fn current_delay_ms(&self) -> u32 {
        self.frames
            .get(self.current)
            .map_or(DEFAULT_FRAME_DELAY_MS, |f| f.delay_ms)
    }

    pub fn recent_disposal(&self) -> Disposal {
        self.recent_disposal
    }

    pub fn previous_rect(&self) -> Option<IntRect> {
        self.previous_rect
    }

    pub fn frames(&self) -> &[FrameRecord] {
        &self.frames
    }

    pub fn canvas(&self) -> &RgbaImage {
        &self.canvas
    }

    pub fn texture(&self) -> Option<&Texture> {
        self.texture.as_ref()
    }

    pub fn cache_frames(&self) -> bool {
        self.cache_frames
    }

    pub fn size(&self) -> (u32, u32) {
        (self.animation.width, self.animation.height)
    }

    /// Steps to the next frame (wrapping) and composites it.
    pub fn advance(&mut self) -> bool {
        if self.frames.is_empty() {
            return false;
        }
        self.current = (self.current + 1) % self.frames.len();
        self.render_frame()
    }

    /// Drops every cached frame texture; the next pass over each frame
    /// composites it again.
    pub fn invalidate(&mut self) {
        for record in &mut self.frames {
            record.cached = None;
        }
    }

    /// Background used by restore-to-background disposal.
    fn background(&self) -> Rgba<u8> {
        let previous_transparent = self
            .current
            .checked_sub(1)
            .or_else(|| self.frames.len().checked_sub(1))
            .and_then(|i| self.frames.get(i))
            .and_then(|f| f.transparent);

        self.animation
            .background_index
            .filter(|bg| Some(*bg) != previous_transparent)
            .and_then(|bg| {
                self.animation
                    .global_palette
                    .as_ref()
                    .and_then(|p| p.get(bg as usize))
            })
            .map_or(Rgba([0, 0, 0, 0]), |c| Rgba([c[0], c[1], c[2], 255]))
    }

    fn canvas_rect(&self) -> IntRect {
        IntRect::new(0, 0, self.canvas.width() as i32, self.canvas.height() as i32)
    }

    /// Composites the current frame into the canvas and refreshes the texture.
    ///
    /// Returns `false` when nothing could be produced; the state is left as
    /// it was in that case.
    pub fn render_frame(&mut self) -> bool {
        let index = self.current;
        let Some(record) = self.frames.get(index) else {
            return false;
        };

        if self.cache_frames {
            if let Some(cached) = &record.cached {
                self.texture = Some(cached.clone());
                self.recent_disposal = record.disposal;
                self.previous_rect = Some(self.animation.frames[index].rect());
                return true;
            }
        }

        if self.canvas.width() != self.animation.width
            || self.canvas.height() != self.animation.height
        {
            warn!("Animation canvas does not match the logical screen, frame skipped");
            return false;
        }

        let frame = &self.animation.frames[index];
        let Some(palette) = frame
            .palette
            .as_ref()
            .or(self.animation.global_palette.as_ref())
        else {
            warn!("Frame {} has no palette", index);
            return false;
        };
        if frame.indices.len() < (frame.width as usize) * (frame.height as usize) {
            warn!("Frame {} raster is truncated", index);
            return false;
        }

        if self.recent_disposal == Disposal::RestoreBackground {
            if let Some(rect) = self.previous_rect.and_then(|r| r.intersect(&self.canvas_rect())) {
                let bg = self.background();
                for y in rect.y..rect.y + rect.h {
                    for x in rect.x..rect.x + rect.w {
                        self.canvas.put_pixel(x as u32, y as u32, bg);
                    }
                }
            }
        }

        let lut = build_lut(palette, frame.transparent);
        let canvas_w = self.canvas.width();
        let canvas_h = self.canvas.height();
        for row in 0..frame.height {
            let cy = frame.top + row;
            if cy >= canvas_h {
                break;
            }
            let line = &frame.indices[(row * frame.width) as usize..][..frame.width as usize];
            for (col, &idx) in line.iter().enumerate() {
                let cx = frame.left + col as u32;
                if cx >= canvas_w {
                    break;
                }
                if let Some(rgba) = lut[idx as usize] {
                    self.canvas.put_pixel(cx, cy, Rgba(rgba));
                }
            }
        }

        let texture = Texture::from_image(&self.canvas);
        let record = &mut self.frames[index];
        record.cached = if self.cache_frames {
            texture.clone()
        } else {
            None
        };
        self.texture = texture;
        self.previous_rect = Some(frame.rect());
        self.recent_disposal = frame.disposal;
        true
    }
}
