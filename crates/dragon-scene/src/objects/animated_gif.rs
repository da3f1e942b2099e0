use super::image_object::{handle_flip_key, image_quad, Flippable, ImageSource};
use super::{
    bitmap_hit, effective_alpha, handle_pose_event, Animated, DrawParams, Interaction, ObjectBase,
    ScreenObject,
};
use crate::animation::{FramePlayer, DEFAULT_FRAME_DELAY_MS};
use crate::assets::AssetLoader;
use crate::record::{ImageRecord, ObjectRecord};
use crate::surface::Surface;
use dragon_core::{EventResponse, Extent, InputEvent, Point};
use rand::Rng;
use std::path::Path;
use tracing::{debug, warn};

/// Animations placed together start up to this far apart so they do not
/// tick in lockstep.
pub const START_OFFSET_MAX_MS: u64 = 500;

/// An image whose pixels come from a looping GIF timeline.
#[derive(Debug)]
pub struct AnimatedGif {
    base: ObjectBase,
    source: ImageSource,
    flip_horizontal: bool,
    cache_frames: bool,
    player: Option<FramePlayer>,
    last_change_ms: u64,
}

impl AnimatedGif {
    pub fn new(
        source: ImageSource,
        flip_horizontal: bool,
        cache_frames: bool,
        base: ObjectBase,
        loader: &dyn AssetLoader,
        now_ms: u64,
    ) -> Self {
        let player = match loader.load_gif(&source.full_path) {
            Ok(animation) => {
                let player = FramePlayer::new(animation, cache_frames);
                if player.texture().is_some() {
                    debug!("{} has {} frames", source.name, player.frame_count());
                    Some(player)
                } else {
                    warn!("Animation {} produced no first frame", source.name);
                    None
                }
            }
            Err(e) => {
                warn!("Animation {} is inert: {}", source.name, e);
                None
            }
        };

        let mut base = base;
        base.extent = player.as_ref().map_or(Extent::default(), |p| {
            let (w, h) = p.size();
            Extent::centered(w, h)
        });
        let offset = rand::thread_rng().gen_range(0..START_OFFSET_MAX_MS);

        Self {
            base,
            source,
            flip_horizontal,
            cache_frames,
            player,
            last_change_ms: now_ms.saturating_sub(offset),
        }
    }

    pub fn from_record(
        record: &ImageRecord,
        loader: &dyn AssetLoader,
        base_dir: &Path,
        now_ms: u64,
    ) -> Self {
        let source = ImageSource::resolve(
            &record.image_name,
            record.image_full_path.as_deref(),
            base_dir,
        );
        Self::new(
            source,
            record.flip_horizontal,
            record.cache_frames,
            ObjectBase::from_pose(&record.pose),
            loader,
            now_ms,
        )
    }

    pub fn player(&self) -> Option<&FramePlayer> {
        self.player.as_ref()
    }

    pub fn source(&self) -> &ImageSource {
        &self.source
    }

    pub fn flip_horizontal(&self) -> bool {
        self.flip_horizontal
    }
}

impl Flippable for AnimatedGif {
    fn toggle_flip(&mut self) {
        self.flip_horizontal = !self.flip_horizontal;
    }
}

impl Animated for AnimatedGif {
    fn last_change_ms(&self) -> u64 {
        self.last_change_ms
    }

    fn set_last_change_ms(&mut self, now_ms: u64) {
        self.last_change_ms = now_ms;
    }

    fn current_delay_ms(&self) -> u32 {
        self.player
            .as_ref()
            .map_or(DEFAULT_FRAME_DELAY_MS, FramePlayer::current_delay_ms)
    }

    fn advance_frame(&mut self) -> bool {
        self.player.as_mut().is_some_and(FramePlayer::advance)
    }
}

impl ScreenObject for AnimatedGif {
    fn type_name(&self) -> &'static str {
        "AnimatedGif"
    }

    fn base(&self) -> &ObjectBase {
        &self.base
    }

    fn base_mut(&mut self) -> &mut ObjectBase {
        &mut self.base
    }

    fn valid(&self) -> bool {
        self.player.is_some() && !self.base.deleted
    }

    fn to_record(&self) -> Option<ObjectRecord> {
        if !self.valid() {
            return None;
        }
        Some(ObjectRecord::AnimatedGif(ImageRecord {
            pose: self.base.pose(),
            image_name: self.source.name.clone(),
            image_full_path: Some(self.source.full_path.clone()),
            flip_horizontal: self.flip_horizontal,
            cache_frames: self.cache_frames,
        }))
    }

    fn hit_test(&self, pt: Point) -> bool {
        match self.player.as_ref().filter(|_| self.valid()) {
            Some(p) => bitmap_hit(&self.base, p.canvas(), self.flip_horizontal, pt),
            None => false,
        }
    }

    fn handle_event(&mut self, event: &InputEvent, ctx: &mut Interaction) -> EventResponse {
        if let Some(response) = handle_pose_event(self, event, ctx) {
            return response;
        }
        handle_flip_key(self, event, ctx)
    }

    fn draw(&self, anchor: Point, params: &DrawParams, surface: &mut dyn Surface) {
        let Some(texture) = self
            .player
            .as_ref()
            .filter(|_| self.valid())
            .and_then(FramePlayer::texture)
        else {
            return;
        };
        surface.draw_texture(
            texture,
            &image_quad(&self.base, anchor, self.flip_horizontal),
            effective_alpha(self.base.opacity, params.global_alpha),
        );
    }

    fn settings_changed(&mut self) {
        if let Some(player) = self.player.as_mut() {
            player.invalidate();
        }
    }
}
