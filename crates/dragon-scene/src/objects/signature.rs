use super::{effective_alpha, handle_pose_event, DrawParams, Interaction, ObjectBase, ScreenObject};
use crate::assets::{AssetLoader, TextRequest};
use crate::bitmap::RenderedBitmap;
use crate::record::{ObjectRecord, SignatureRecord, DEFAULT_FONT_COLOR};
use crate::surface::{Surface, TextureQuad};
use dragon_core::{color_from_key, color_or, EventResponse, Extent, InputEvent, Point, Rgb};
use tracing::warn;

/// Decorative text rendered once into a glyph bitmap.
#[derive(Debug)]
pub struct Signature {
    base: ObjectBase,
    text: String,
    font_name: String,
    font_size: f32,
    font_color: Rgb,
    rendered: Option<RenderedBitmap>,
}

impl Signature {
    pub fn new(
        text: impl Into<String>,
        font_name: impl Into<String>,
        font_size: f32,
        font_color: Rgb,
        base: ObjectBase,
        loader: &dyn AssetLoader,
    ) -> Self {
        let mut signature = Self {
            base,
            text: text.into(),
            font_name: font_name.into(),
            font_size,
            font_color,
            rendered: None,
        };
        signature.render(loader);
        signature
    }

    pub fn from_record(record: &SignatureRecord, loader: &dyn AssetLoader) -> Self {
        Self::new(
            record.text.clone(),
            record.font_name.clone(),
            record.font_size,
            color_or(record.font_color.as_ref(), DEFAULT_FONT_COLOR),
            ObjectBase::from_pose(&record.pose),
            loader,
        )
    }

    fn render(&mut self, loader: &dyn AssetLoader) {
        let request = TextRequest {
            text: self.text.clone(),
            font_name: self.font_name.clone(),
            font_size: self.font_size,
            color: self.font_color,
        };
        self.rendered = match loader.render_text(&request) {
            Ok(bitmap) => RenderedBitmap::new(bitmap),
            Err(e) => {
                warn!("Signature {:?} is inert: {}", self.text, e);
                None
            }
        };
        self.base.extent = self
            .rendered
            .as_ref()
            .map_or(Extent::default(), |r| Extent::centered(r.width(), r.height()));
    }

    pub fn text(&self) -> &str {
        &self.text
    }

    pub fn font_color(&self) -> Rgb {
        self.font_color
    }

    pub fn bitmap(&self) -> Option<&RenderedBitmap> {
        self.rendered.as_ref()
    }

    /// Repaints the glyphs in `color` without re-rendering the font.
    pub fn recolor(&mut self, color: Rgb) -> bool {
        let Some(recolored) = self
            .rendered
            .as_ref()
            .and_then(|r| r.remap_rgb_preserving_alpha(color))
        else {
            return false;
        };
        self.rendered = Some(recolored);
        self.font_color = color;
        true
    }
}

impl ScreenObject for Signature {
    fn type_name(&self) -> &'static str {
        "Signature"
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
        Some(ObjectRecord::Signature(SignatureRecord {
            pose: self.base.pose(),
            text: self.text.clone(),
            font_name: self.font_name.clone(),
            font_size: self.font_size,
            font_color: Some(self.font_color.into()),
        }))
    }

    fn handle_event(&mut self, event: &InputEvent, ctx: &mut Interaction) -> EventResponse {
        if let Some(response) = handle_pose_event(self, event, ctx) {
            return response;
        }
        if !ctx.layout_mode || !self.valid() {
            return EventResponse::IGNORED;
        }

        if let InputEvent::KeyDown { key, .. } = event {
            if let Some(color) = key.char().and_then(color_from_key) {
                if self.hit_test(ctx.cursor) && self.recolor(color) {
                    return EventResponse::settings_changed();
                }
            }
        }
        EventResponse::IGNORED
    }

    fn draw(&self, anchor: Point, params: &DrawParams, surface: &mut dyn Surface) {
        let Some(rendered) = self.rendered.as_ref().filter(|_| self.valid()) else {
            return;
        };
        let quad = TextureQuad {
            anchor,
            pivot: Point::new(self.base.extent.cx as f32, self.base.extent.cy as f32),
            scale: self.base.scale,
            rotation: self.base.rotation,
            flip_horizontal: false,
        };
        surface.draw_texture(
            &rendered.texture,
            &quad,
            effective_alpha(self.base.opacity, params.global_alpha),
        );
    }
}
