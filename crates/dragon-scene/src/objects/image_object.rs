use super::{
    bitmap_hit, effective_alpha, handle_pose_event, DrawParams, Interaction, ObjectBase,
    ScreenObject,
};
use crate::assets::AssetLoader;
use crate::bitmap::RenderedBitmap;
use crate::record::{ImageRecord, ObjectRecord};
use crate::surface::{Surface, TextureQuad};
use dragon_core::{EventResponse, Extent, InputEvent, Point};
use std::path::{Path, PathBuf};
use tracing::warn;

/// Where an image came from: the name shown to the user and the file read.
#[derive(Debug, Clone, PartialEq, Eq, Default)]
pub struct ImageSource {
    pub name: String,
    pub full_path: PathBuf,
}

impl ImageSource {
    /// Uses the recorded full path when present, otherwise `base_dir/name`.
    pub fn resolve(name: &str, full_path: Option<&Path>, base_dir: &Path) -> Self {
        let full_path = full_path
            .map(Path::to_path_buf)
            .unwrap_or_else(|| base_dir.join(name));
        let name = if name.is_empty() {
            full_path
                .file_name()
                .map(|n| n.to_string_lossy().into_owned())
                .unwrap_or_default()
        } else {
            name.to_string()
        };
        Self { name, full_path }
    }

    pub fn from_path(path: &Path) -> Self {
        Self::resolve("", Some(path), Path::new(""))
    }
}

/// A static bitmap.
#[derive(Debug)]
pub struct ImageObject {
    base: ObjectBase,
    source: ImageSource,
    flip_horizontal: bool,
    rendered: Option<RenderedBitmap>,
}

impl ImageObject {
    pub fn new(
        source: ImageSource,
        flip_horizontal: bool,
        base: ObjectBase,
        loader: &dyn AssetLoader,
    ) -> Self {
        let rendered = match loader.load_image(&source.full_path) {
            Ok(bitmap) => RenderedBitmap::new(bitmap),
            Err(e) => {
                warn!("Image {} is inert: {}", source.name, e);
                None
            }
        };
        let mut base = base;
        base.extent = rendered
            .as_ref()
            .map_or(Extent::default(), |r| Extent::centered(r.width(), r.height()));

        Self {
            base,
            source,
            flip_horizontal,
            rendered,
        }
    }

    pub fn from_record(record: &ImageRecord, loader: &dyn AssetLoader, base_dir: &Path) -> Self {
        let source = ImageSource::resolve(
            &record.image_name,
            record.image_full_path.as_deref(),
            base_dir,
        );
        Self::new(
            source,
            record.flip_horizontal,
            ObjectBase::from_pose(&record.pose),
            loader,
        )
    }

    pub fn source(&self) -> &ImageSource {
        &self.source
    }

    pub fn flip_horizontal(&self) -> bool {
        self.flip_horizontal
    }
}

impl ScreenObject for ImageObject {
    fn type_name(&self) -> &'static str {
        "Image"
    }

    fn base(&self) -> &ObjectBase {
        &self.base
    }

    fn base_mut(&mut self) -> &mut ObjectBase {
        &mut self.base
    }

    fn valid(&self) -> bool {
        self.rendered.is_some() && !self.base.deleted
    }

    fn to_record(&self) -> Option<ObjectRecord> {
        if !self.valid() {
            return None;
        }
        Some(ObjectRecord::Image(ImageRecord {
            pose: self.base.pose(),
            image_name: self.source.name.clone(),
            image_full_path: Some(self.source.full_path.clone()),
            flip_horizontal: self.flip_horizontal,
            cache_frames: true,
        }))
    }

    fn hit_test(&self, pt: Point) -> bool {
        match self.rendered.as_ref().filter(|_| self.valid()) {
            Some(r) => bitmap_hit(&self.base, &r.bitmap, self.flip_horizontal, pt),
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
        let Some(rendered) = self.rendered.as_ref().filter(|_| self.valid()) else {
            return;
        };
        surface.draw_texture(
            &rendered.texture,
            &image_quad(&self.base, anchor, self.flip_horizontal),
            effective_alpha(self.base.opacity, params.global_alpha),
        );
    }
}

/// Mirror toggles shared by static and animated images.
pub(super) trait Flippable: ScreenObject {
    fn toggle_flip(&mut self);
}

impl Flippable for ImageObject {
    fn toggle_flip(&mut self) {
        self.flip_horizontal = !self.flip_horizontal;
    }
}

/// `F` over the image mirrors it.
pub(super) fn handle_flip_key(
    object: &mut dyn Flippable,
    event: &InputEvent,
    ctx: &Interaction,
) -> EventResponse {
    if !ctx.layout_mode || !object.valid() {
        return EventResponse::IGNORED;
    }
    match event {
        InputEvent::KeyDown { key, .. } if key.is_char('f') && object.hit_test(ctx.cursor) => {
            object.toggle_flip();
            EventResponse::settings_changed()
        }
        _ => EventResponse::IGNORED,
    }
}

pub(super) fn image_quad(base: &ObjectBase, anchor: Point, flip_horizontal: bool) -> TextureQuad {
    TextureQuad {
        anchor,
        pivot: Point::new(base.extent.cx as f32, base.extent.cy as f32),
        scale: base.scale,
        rotation: base.rotation,
        flip_horizontal,
    }
}
