//! Screen objects: the user-manipulable items of the overlay.
//!
//! Every object implements [`ScreenObject`]; the scene stores them as the
//! closed [`SceneObject`] enum. Signature and image variants share the
//! transform/drag event policy implemented by [`handle_pose_event`].

mod animated_gif;
mod image_object;
mod lines;
mod signature;

pub use animated_gif::AnimatedGif;
pub use image_object::{ImageObject, ImageSource};
pub use lines::{LinePattern, MAX_LINE_SPACING, MAX_LINE_WIDTH, MIN_LINE_SPACING};
pub use signature::Signature;

use crate::assets::AssetLoader;
use crate::bitmap::{alpha_at, HIT_ALPHA_THRESHOLD};
use crate::record::{ObjectRecord, PoseRecord};
use crate::surface::Surface;
use dragon_core::{
    rotate_point, CursorStyle, EventResponse, Extent, InputEvent, IntRect, Key, MouseButton,
    Placement, Point, UpdateLevel,
};
use image::RgbaImage;
use std::path::Path;

/// Identifier handed out by the scene, stable for the object's lifetime.
pub type ObjectId = u64;

/// Degrees turned per wheel notch with Ctrl held.
pub const ROTATE_STEP_DEG: f32 = 5.0;
/// Scale factor per wheel notch with Shift held.
pub const SCALE_STEP: f32 = 1.1;
/// Opacity change per wheel notch.
pub const OPACITY_STEP: f32 = 5.0 / 255.0;

/// Blends an object's own opacity with the global dimmer.
///
/// The result never drops below 0.1, so a faded object stays findable.
pub fn effective_alpha(object_opacity: f32, global_opacity: f32) -> f32 {
    (object_opacity * 0.5 + global_opacity * 0.8 + 0.1).min(1.0)
}

/// Transform state common to all objects.
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct ObjectBase {
    pub position: Point,
    pub extent: Extent,
    pub scale: f32,
    /// Degrees, clockwise.
    pub rotation: f32,
    /// `0..=1`.
    pub opacity: f32,
    pub deleted: bool,
}

impl ObjectBase {
    pub fn new(position: Point) -> Self {
        Self {
            position,
            extent: Extent::default(),
            scale: 1.0,
            rotation: 0.0,
            opacity: 1.0,
            deleted: false,
        }
    }

    pub fn from_pose(pose: &PoseRecord) -> Self {
        Self {
            position: Point::new(pose.x, pose.y),
            extent: Extent::default(),
            scale: if pose.scale > 0.0 { pose.scale } else { 1.0 },
            rotation: pose.rotate,
            opacity: pose.alpha.clamp(0.0, 1.0),
            deleted: false,
        }
    }

    pub fn pose(&self) -> PoseRecord {
        PoseRecord {
            x: self.position.x,
            y: self.position.y,
            scale: self.scale,
            rotate: self.rotation,
            alpha: self.opacity,
        }
        .rounded()
    }

    pub fn placement(&self) -> Placement {
        Placement {
            position: self.position,
            extent: self.extent,
            scale: self.scale,
            rotation: self.rotation,
        }
    }

    /// Turns the object by `degrees` about `pivot`; the anchor moves with it.
    pub fn rotate_about(&mut self, pivot: Point, degrees: f32) {
        self.position = rotate_point(pivot, self.position, degrees as f64);
        self.rotation = (self.rotation + degrees) % 360.0;
    }

    /// Scales by `factor` keeping the point under `pivot` fixed.
    pub fn scale_about(&mut self, pivot: Point, factor: f32) {
        self.scale *= factor;
        self.position.x += (self.position.x - pivot.x) * (factor - 1.0);
        self.position.y += (self.position.y - pivot.y) * (factor - 1.0);
    }

    pub fn adjust_opacity(&mut self, delta: f32) {
        self.opacity = (self.opacity + delta).clamp(0.0, 1.0);
    }
}

/// Transient interaction state owned by the scene and lent to the object
/// currently receiving an event.
#[derive(Debug, Clone, Copy, PartialEq, Default)]
pub struct Interaction {
    pub layout_mode: bool,
    /// Last known pointer position, used by key events.
    pub cursor: Point,
    /// Object holding the mouse capture.
    pub capture: Option<ObjectId>,
    /// Latest pointer position of the drag in progress.
    pub drag_origin: Point,
    /// Pointer minus anchor at the moment the drag began.
    pub drag_offset: Point,
    pub cursor_style: CursorStyle,
    /// The object the event is being offered to.
    pub current: ObjectId,
}

impl Interaction {
    pub fn is_captured(&self) -> bool {
        self.capture.is_some()
    }

    pub fn holds_capture(&self) -> bool {
        self.capture == Some(self.current)
    }

    /// Where the dragged object's anchor currently is.
    pub fn drag_anchor(&self) -> Point {
        self.drag_origin - self.drag_offset
    }

    pub fn release(&mut self) {
        self.capture = None;
        self.drag_offset = Point::default();
    }
}

/// Per-pass drawing inputs.
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct DrawParams {
    /// Global opacity in `0..=1`.
    pub global_alpha: f32,
    /// Start of the current idle period; seeds the dash jitter.
    pub idle_ticks: u64,
}

/// Something that advances through frames on a timer.
pub trait Animated {
    fn last_change_ms(&self) -> u64;
    fn set_last_change_ms(&mut self, now_ms: u64);
    fn current_delay_ms(&self) -> u32;
    /// Moves to the next frame; `false` when nothing was produced.
    fn advance_frame(&mut self) -> bool;
}

/// The contract every screen object fulfils.
pub trait ScreenObject {
    /// Stable discriminator written as the record `type`.
    fn type_name(&self) -> &'static str;

    fn base(&self) -> &ObjectBase;

    fn base_mut(&mut self) -> &mut ObjectBase;

    /// True when the visual resource loaded and the object is not deleted.
    fn valid(&self) -> bool;

    /// The persisted form, `None` when the object is not valid.
    fn to_record(&self) -> Option<ObjectRecord>;

    fn hit_test(&self, pt: Point) -> bool {
        self.valid() && self.base().placement().hit_test(pt)
    }

    fn handle_event(&mut self, event: &InputEvent, ctx: &mut Interaction) -> EventResponse;

    /// Draws with the object's anchor at `anchor`.
    fn draw(&self, anchor: Point, params: &DrawParams, surface: &mut dyn Surface);

    fn is_selectable(&self) -> bool {
        true
    }

    /// Called after any event that changed persisted state.
    fn settings_changed(&mut self) {}
}

/// Applies the wheel, drag and delete gestures shared by the selectable
/// objects. Returns `None` for events it leaves to the object.
pub fn handle_pose_event(
    object: &mut dyn ScreenObject,
    event: &InputEvent,
    ctx: &mut Interaction,
) -> Option<EventResponse> {
    if !object.valid() {
        return None;
    }

    // An in-flight drag resolves whatever the mode.
    match event {
        InputEvent::PointerMotion { pos } if ctx.holds_capture() => {
            ctx.drag_origin = *pos;
            return Some(EventResponse::view_changed());
        }
        InputEvent::ButtonUp { pos, .. } if ctx.holds_capture() => {
            ctx.drag_origin = *pos;
            object.base_mut().position = ctx.drag_anchor();
            ctx.release();
            return Some(EventResponse::settings_changed());
        }
        _ => {}
    }

    if !ctx.layout_mode {
        return None;
    }

    match event {
        InputEvent::PointerMotion { pos } => {
            if !ctx.is_captured() && object.hit_test(*pos) {
                ctx.cursor_style = CursorStyle::Pointer;
                return Some(EventResponse::consumed(UpdateLevel::None));
            }
            None
        }
        InputEvent::ButtonDown {
            pos,
            button: MouseButton::Left,
        } if !ctx.is_captured() && object.hit_test(*pos) => {
            ctx.capture = Some(ctx.current);
            ctx.drag_origin = *pos;
            ctx.drag_offset = *pos - object.base().position;
            Some(EventResponse::view_changed())
        }
        InputEvent::Wheel {
            pos,
            delta,
            modifiers,
        } if object.hit_test(*pos) => {
            let notch = if *delta < 0.0 { -1.0 } else { 1.0 };
            let base = object.base_mut();
            if modifiers.ctrl {
                base.rotate_about(*pos, ROTATE_STEP_DEG * notch);
            } else if modifiers.shift {
                base.scale_about(*pos, SCALE_STEP.powf(*delta));
            } else {
                base.adjust_opacity(OPACITY_STEP * notch);
            }
            Some(EventResponse::settings_changed())
        }
        InputEvent::KeyDown {
            key: Key::Delete, ..
        } if object.hit_test(ctx.cursor) => {
            object.base_mut().deleted = true;
            Some(EventResponse::settings_changed())
        }
        _ => None,
    }
}

/// Per-pixel hit test against the bitmap an object draws.
///
/// Only pixels with alpha above [`HIT_ALPHA_THRESHOLD`] count.
pub fn bitmap_hit(base: &ObjectBase, bitmap: &RgbaImage, flip_horizontal: bool, pt: Point) -> bool {
    let placement = base.placement();
    let Some(local) = placement.hit(pt) else {
        return false;
    };
    let bounds = placement.bounds_at(base.position);
    let mut bx = ((local.x - bounds.x) / base.scale).floor() as i64;
    let by = ((local.y - bounds.y) / base.scale).floor() as i64;
    if flip_horizontal {
        bx = bitmap.width() as i64 - 1 - bx;
    }
    alpha_at(bitmap, bx, by).is_some_and(|a| a > HIT_ALPHA_THRESHOLD)
}

/// Every kind of screen object the scene can hold.
#[derive(Debug)]
pub enum SceneObject {
    Signature(Signature),
    Image(ImageObject),
    AnimatedGif(AnimatedGif),
    Lines(LinePattern),
}

impl SceneObject {
    /// Builds an object from its persisted record.
    ///
    /// Resource failures still produce an (invalid) object; the caller
    /// decides whether to keep it. `base_dir` resolves relative image names
    /// and `area` is the work area for the line layer.
    pub fn from_record(
        record: &ObjectRecord,
        loader: &dyn AssetLoader,
        base_dir: &Path,
        area: IntRect,
        now_ms: u64,
    ) -> Self {
        match record {
            ObjectRecord::Signature(r) => SceneObject::Signature(Signature::from_record(r, loader)),
            ObjectRecord::Image(r) => {
                SceneObject::Image(ImageObject::from_record(r, loader, base_dir))
            }
            ObjectRecord::AnimatedGif(r) => {
                SceneObject::AnimatedGif(AnimatedGif::from_record(r, loader, base_dir, now_ms))
            }
            ObjectRecord::Lines(r) => SceneObject::Lines(LinePattern::from_record(r, area)),
        }
    }

    /// The animation capability, for objects that have one.
    pub fn animation_mut(&mut self) -> Option<&mut dyn Animated> {
        match self {
            SceneObject::AnimatedGif(gif) => Some(gif),
            _ => None,
        }
    }

    pub fn is_animated(&self) -> bool {
        matches!(self, SceneObject::AnimatedGif(_))
    }

    pub fn as_lines(&self) -> Option<&LinePattern> {
        match self {
            SceneObject::Lines(lines) => Some(lines),
            _ => None,
        }
    }

    pub fn as_lines_mut(&mut self) -> Option<&mut LinePattern> {
        match self {
            SceneObject::Lines(lines) => Some(lines),
            _ => None,
        }
    }

    fn inner(&self) -> &dyn ScreenObject {
        match self {
            SceneObject::Signature(o) => o,
            SceneObject::Image(o) => o,
            SceneObject::AnimatedGif(o) => o,
            SceneObject::Lines(o) => o,
        }
    }

    fn inner_mut(&mut self) -> &mut dyn ScreenObject {
        match self {
            SceneObject::Signature(o) => o,
            SceneObject::Image(o) => o,
            SceneObject::AnimatedGif(o) => o,
            SceneObject::Lines(o) => o,
        }
    }
}

impl ScreenObject for SceneObject {
    fn type_name(&self) -> &'static str {
        self.inner().type_name()
    }

    fn base(&self) -> &ObjectBase {
        self.inner().base()
    }

    fn base_mut(&mut self) -> &mut ObjectBase {
        self.inner_mut().base_mut()
    }

    fn valid(&self) -> bool {
        self.inner().valid()
    }

    fn to_record(&self) -> Option<ObjectRecord> {
        self.inner().to_record()
    }

    fn hit_test(&self, pt: Point) -> bool {
        self.inner().hit_test(pt)
    }

    fn handle_event(&mut self, event: &InputEvent, ctx: &mut Interaction) -> EventResponse {
        self.inner_mut().handle_event(event, ctx)
    }

    fn draw(&self, anchor: Point, params: &DrawParams, surface: &mut dyn Surface) {
        self.inner().draw(anchor, params, surface)
    }

    fn is_selectable(&self) -> bool {
        self.inner().is_selectable()
    }

    fn settings_changed(&mut self) {
        self.inner_mut().settings_changed()
    }
}
