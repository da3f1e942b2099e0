//! Scene orchestration.
//!
//! The scene owns the ordered object list (index 0 is the bottom, the line
//! layer always sits there), routes input events top-most first with mouse
//! capture, and drives the frame and idle timers.

use crate::assets::AssetLoader;
use crate::hatch::HatchStyle;
use crate::objects::{
    AnimatedGif, DrawParams, ImageObject, ImageSource, Interaction, LinePattern, ObjectBase,
    ObjectId, SceneObject, ScreenObject, Signature,
};
use crate::record::{ObjectRecord, DEFAULT_FONT_COLOR, DEFAULT_FONT_NAME, DEFAULT_FONT_SIZE};
use crate::surface::Surface;
use dragon_core::{
    CursorStyle, EventResponse, InputEvent, IntRect, Key, Point, Rgb, Rgba, UpdateLevel,
};
use serde_json::Value;
use std::path::{Path, PathBuf};
use tracing::{debug, info, warn};

/// Global opacity step for the wheel outside any object.
pub const WHEEL_ALPHA_STEP: u8 = 5;
/// Global opacity step for the Left/Right keys.
pub const KEY_ALPHA_STEP: u8 = 17;
pub const DEFAULT_IDLE_DELAY_MS: u64 = 600;

/// File extensions accepted from drops.
pub const DROPPABLE_EXTENSIONS: [&str; 5] = ["jpg", "jpeg", "gif", "bmp", "png"];

/// The line layer's fixed id.
pub const LINES_ID: ObjectId = 0;

const FRAME_RINGS: u8 = 6;
const FRAME_GREEN: u8 = 200;

/// Text settings applied to dropped and default signatures.
#[derive(Debug, Clone, PartialEq)]
pub struct TextDefaults {
    pub font_name: String,
    pub font_size: f32,
    pub font_color: Rgb,
    pub scale: f32,
}

impl Default for TextDefaults {
    fn default() -> Self {
        Self {
            font_name: DEFAULT_FONT_NAME.to_string(),
            font_size: DEFAULT_FONT_SIZE,
            font_color: DEFAULT_FONT_COLOR,
            scale: 1.0,
        }
    }
}

/// The objects placed on a fresh scene.
#[derive(Debug, Clone, PartialEq)]
pub struct DefaultObjects {
    pub text: String,
    pub text_style: TextDefaults,
    /// Degrees.
    pub text_rotation: f32,
    pub text_opacity: f32,
    pub logo: PathBuf,
    pub logo_scale: f32,
    pub logo_opacity: f32,
}

/// What the host should do after [`Scene::tick`].
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default)]
pub struct TickOutcome {
    /// A redraw is pending.
    pub redraw: bool,
    /// Longest the host may sleep before ticking again; `None` waits for
    /// input only.
    pub timeout_ms: Option<u64>,
}

/// Keeps only the last of each run of consecutive pointer-motion events.
pub fn coalesce_motion(events: impl IntoIterator<Item = InputEvent>) -> Vec<InputEvent> {
    let mut out: Vec<InputEvent> = Vec::new();
    for event in events {
        if event.is_motion() && out.last().is_some_and(InputEvent::is_motion) {
            if let Some(last) = out.last_mut() {
                *last = event;
            }
        } else {
            out.push(event);
        }
    }
    out
}

fn is_droppable(path: &Path) -> bool {
    path.extension()
        .and_then(|e| e.to_str())
        .map(|e| e.to_ascii_lowercase())
        .is_some_and(|e| DROPPABLE_EXTENSIONS.contains(&e.as_str()))
}

fn is_gif(path: &Path) -> bool {
    path.extension()
        .and_then(|e| e.to_str())
        .is_some_and(|e| e.eq_ignore_ascii_case("gif"))
}

/// The overlay's object collection and interaction state.
pub struct Scene {
    objects: Vec<(ObjectId, SceneObject)>,
    next_id: ObjectId,
    /// Ids of animated objects, registered when added.
    animated: Vec<ObjectId>,
    interaction: Interaction,
    loader: Box<dyn AssetLoader>,
    work_area: IntRect,
    base_dir: PathBuf,
    text_defaults: TextDefaults,
    global_alpha: u8,
    hidden: bool,
    quit_requested: bool,
    needs_redraw: bool,
    dirty: bool,
    idle_ticks: u64,
    idle_delay_ms: u64,
}

impl std::fmt::Debug for Scene {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("Scene")
            .field("objects", &self.objects.len())
            .field("work_area", &self.work_area)
            .field("layout_mode", &self.interaction.layout_mode)
            .field("global_alpha", &self.global_alpha)
            .finish()
    }
}

impl Scene {
    /// Creates a scene holding only the line layer.
    pub fn new(work_area: IntRect, loader: Box<dyn AssetLoader>) -> Self {
        Self {
            objects: vec![(
                LINES_ID,
                SceneObject::Lines(LinePattern::new(HatchStyle::default(), work_area)),
            )],
            next_id: 1,
            animated: Vec::new(),
            interaction: Interaction::default(),
            loader,
            work_area,
            base_dir: PathBuf::new(),
            text_defaults: TextDefaults::default(),
            global_alpha: 255,
            hidden: false,
            quit_requested: false,
            needs_redraw: true,
            dirty: false,
            idle_ticks: 0,
            idle_delay_ms: DEFAULT_IDLE_DELAY_MS,
        }
    }

    /// Directory relative image names are resolved against.
    pub fn set_base_dir(&mut self, dir: impl Into<PathBuf>) {
        self.base_dir = dir.into();
    }

    pub fn set_text_defaults(&mut self, defaults: TextDefaults) {
        self.text_defaults = defaults;
    }

    pub fn set_idle_delay_ms(&mut self, delay: u64) {
        self.idle_delay_ms = delay;
    }

    pub fn work_area(&self) -> IntRect {
        self.work_area
    }

    pub fn set_work_area(&mut self, area: IntRect) {
        self.work_area = area;
        if let Some(lines) = self.lines_mut() {
            lines.set_area(area);
        }
        self.needs_redraw = true;
    }

    /// Objects bottom to top.
    pub fn objects(&self) -> impl Iterator<Item = (ObjectId, &SceneObject)> {
        self.objects.iter().map(|(id, o)| (*id, o))
    }

    pub fn object(&self, id: ObjectId) -> Option<&SceneObject> {
        self.objects.iter().find(|(i, _)| *i == id).map(|(_, o)| o)
    }

    pub fn object_mut(&mut self, id: ObjectId) -> Option<&mut SceneObject> {
        self.objects
            .iter_mut()
            .find(|(i, _)| *i == id)
            .map(|(_, o)| o)
    }

    pub fn len(&self) -> usize {
        self.objects.len()
    }

    pub fn is_empty(&self) -> bool {
        self.objects.is_empty()
    }

    pub fn lines(&self) -> Option<&LinePattern> {
        self.objects.first().and_then(|(_, o)| o.as_lines())
    }

    pub fn lines_mut(&mut self) -> Option<&mut LinePattern> {
        self.objects.first_mut().and_then(|(_, o)| o.as_lines_mut())
    }

    pub fn animated_ids(&self) -> &[ObjectId] {
        &self.animated
    }

    /// Adds an object on top and returns its id. A line layer replaces the
    /// current one instead.
    pub fn add(&mut self, object: SceneObject) -> ObjectId {
        if let SceneObject::Lines(mut lines) = object {
            lines.set_area(self.work_area);
            match self.objects.first_mut() {
                Some((_, slot @ SceneObject::Lines(_))) => *slot = SceneObject::Lines(lines),
                _ => self.objects.insert(0, (LINES_ID, SceneObject::Lines(lines))),
            }
            self.needs_redraw = true;
            return LINES_ID;
        }

        let id = self.next_id;
        self.next_id += 1;
        if object.is_animated() {
            self.animated.push(id);
        }
        debug!("Added {} #{}", object.type_name(), id);
        self.objects.push((id, object));
        self.needs_redraw = true;
        id
    }

    /// Drops soft-deleted objects for good.
    pub fn purge_deleted(&mut self) -> usize {
        let before = self.objects.len();
        let removed: Vec<ObjectId> = self
            .objects
            .iter()
            .filter(|(_, o)| o.base().deleted && o.is_selectable())
            .map(|(id, _)| *id)
            .collect();
        self.objects.retain(|(id, _)| !removed.contains(id));
        self.animated.retain(|id| !removed.contains(id));
        if self
            .interaction
            .capture
            .is_some_and(|id| removed.contains(&id))
        {
            self.interaction.release();
        }
        before - self.objects.len()
    }

    pub fn layout_mode(&self) -> bool {
        self.interaction.layout_mode
    }

    /// Switches edit mode. A drag in progress survives leaving it and is
    /// still resolved by the next button release.
    pub fn set_layout_mode(&mut self, on: bool) {
        self.interaction.layout_mode = on;
        if !on {
            self.interaction.cursor_style = CursorStyle::Default;
        }
        self.needs_redraw = true;
    }

    pub fn global_alpha(&self) -> u8 {
        self.global_alpha
    }

    pub fn set_global_alpha(&mut self, alpha: u8) {
        self.global_alpha = alpha;
        self.needs_redraw = true;
    }

    pub fn hidden(&self) -> bool {
        self.hidden
    }

    pub fn set_hidden(&mut self, hidden: bool) {
        self.hidden = hidden;
        self.needs_redraw = true;
    }

    pub fn quit_requested(&self) -> bool {
        self.quit_requested
    }

    pub fn cursor_style(&self) -> CursorStyle {
        self.interaction.cursor_style
    }

    pub fn capture(&self) -> Option<ObjectId> {
        self.interaction.capture
    }

    pub fn needs_redraw(&self) -> bool {
        self.needs_redraw
    }

    /// True once something persisted has changed since the last save.
    pub fn is_dirty(&self) -> bool {
        self.dirty
    }

    pub fn mark_saved(&mut self) {
        self.dirty = false;
    }

    pub fn idle_ticks(&self) -> u64 {
        self.idle_ticks
    }

    /// Coalesces pointer motion, then handles each event in order.
    pub fn dispatch_all(
        &mut self,
        events: impl IntoIterator<Item = InputEvent>,
        now_ms: u64,
    ) -> UpdateLevel {
        coalesce_motion(events)
            .iter()
            .map(|e| self.handle_event(e, now_ms).update)
            .max()
            .unwrap_or_default()
    }

    /// Routes one event: the capturing object first, then objects top-most
    /// first until one handles it, then the scene-wide controls.
    pub fn handle_event(&mut self, event: &InputEvent, now_ms: u64) -> EventResponse {
        match event {
            InputEvent::FocusLost => {
                self.interaction.release();
                return self.apply(EventResponse::view_changed());
            }
            InputEvent::FocusGained | InputEvent::WindowRestored => {
                return self.apply(EventResponse::view_changed());
            }
            _ => {}
        }

        if let Some(pos) = event.position() {
            self.interaction.cursor = pos;
        }
        if event.is_motion() && self.interaction.layout_mode && !self.interaction.is_captured() {
            self.interaction.cursor_style = CursorStyle::Default;
        }

        let mut response = self.dispatch_to_objects(event);
        if !response.handled {
            response = self.handle_global(event, now_ms);
        }
        self.apply(response)
    }

    fn dispatch_to_objects(&mut self, event: &InputEvent) -> EventResponse {
        let drag_event = matches!(
            event,
            InputEvent::PointerMotion { .. } | InputEvent::ButtonUp { .. }
        );
        if let (Some(captured), true) = (self.interaction.capture, drag_event) {
            self.interaction.current = captured;
            let interaction = &mut self.interaction;
            if let Some((_, object)) = self.objects.iter_mut().find(|(id, _)| *id == captured) {
                return object.handle_event(event, interaction);
            }
            // the captured object is gone
            interaction.release();
        }

        for (id, object) in self.objects.iter_mut().rev() {
            if object.base().deleted {
                continue;
            }
            self.interaction.current = *id;
            let response = object.handle_event(event, &mut self.interaction);
            if response.handled {
                return response;
            }
        }
        EventResponse::IGNORED
    }

    fn handle_global(&mut self, event: &InputEvent, now_ms: u64) -> EventResponse {
        match event {
            InputEvent::Wheel { delta, .. } if self.interaction.layout_mode => {
                self.global_alpha = if *delta < 0.0 {
                    self.global_alpha.saturating_sub(WHEEL_ALPHA_STEP)
                } else {
                    self.global_alpha.saturating_add(WHEEL_ALPHA_STEP)
                };
                EventResponse::settings_changed()
            }
            InputEvent::KeyDown { key, .. } => match key {
                Key::Left => {
                    self.global_alpha = self.global_alpha.saturating_sub(KEY_ALPHA_STEP);
                    EventResponse::settings_changed()
                }
                Key::Right => {
                    self.global_alpha = self.global_alpha.saturating_add(KEY_ALPHA_STEP);
                    EventResponse::settings_changed()
                }
                Key::Space | Key::Enter => {
                    let on = !self.interaction.layout_mode;
                    self.set_layout_mode(on);
                    info!("Layout mode {}", if on { "on" } else { "off" });
                    EventResponse::view_changed()
                }
                Key::Char(c) if c.eq_ignore_ascii_case(&'h') => {
                    self.hidden = !self.hidden;
                    EventResponse::settings_changed()
                }
                Key::Char(c) if c.eq_ignore_ascii_case(&'x') => {
                    self.quit_requested = true;
                    EventResponse::consumed(UpdateLevel::None)
                }
                _ => EventResponse::IGNORED,
            },
            InputEvent::DropText { pos, text } => {
                if self.drop_text(*pos, text).is_some() {
                    EventResponse::settings_changed()
                } else {
                    EventResponse::IGNORED
                }
            }
            InputEvent::DropFile { pos, path } => {
                if self.drop_file(*pos, path, now_ms).is_some() {
                    EventResponse::settings_changed()
                } else {
                    EventResponse::IGNORED
                }
            }
            _ => EventResponse::IGNORED,
        }
    }

    fn apply(&mut self, response: EventResponse) -> EventResponse {
        if response.update >= UpdateLevel::ViewChanged {
            self.needs_redraw = true;
        }
        if response.update >= UpdateLevel::SettingsChanged {
            self.dirty = true;
            for id in &self.animated {
                if let Some((_, object)) = self.objects.iter_mut().find(|(i, _)| i == id) {
                    object.settings_changed();
                }
            }
        }
        response
    }

    /// Adds dropped text as a signature at `pos`.
    pub fn drop_text(&mut self, pos: Point, text: &str) -> Option<ObjectId> {
        if text.trim().is_empty() {
            return None;
        }
        let mut base = ObjectBase::new(pos);
        base.scale = self.text_defaults.scale;
        let signature = Signature::new(
            text,
            self.text_defaults.font_name.clone(),
            self.text_defaults.font_size,
            self.text_defaults.font_color,
            base,
            self.loader.as_ref(),
        );
        self.add_if_valid(SceneObject::Signature(signature))
    }

    /// Adds a dropped image or animation at `pos`. Unsupported or
    /// undecodable files are discarded.
    pub fn drop_file(&mut self, pos: Point, path: &Path, now_ms: u64) -> Option<ObjectId> {
        if !is_droppable(path) {
            debug!("Ignoring drop of {}", path.display());
            return None;
        }
        let source = ImageSource::from_path(path);
        let base = ObjectBase::new(pos);
        let object = if is_gif(path) {
            SceneObject::AnimatedGif(AnimatedGif::new(
                source,
                false,
                true,
                base,
                self.loader.as_ref(),
                now_ms,
            ))
        } else {
            SceneObject::Image(ImageObject::new(source, false, base, self.loader.as_ref()))
        };
        self.add_if_valid(object)
    }

    fn add_if_valid(&mut self, object: SceneObject) -> Option<ObjectId> {
        if !object.valid() {
            warn!("Discarding {} that failed to load", object.type_name());
            return None;
        }
        Some(self.add(object))
    }

    /// Places the logo and the signature text on an empty scene.
    pub fn add_default_objects(&mut self, defaults: &DefaultObjects, now_ms: u64) {
        let area = self.work_area.to_rect();
        let logo_pos = Point::new(area.x + area.w * 5.0 / 6.0, area.y + area.h / 5.0);

        let mut logo_base = ObjectBase::new(logo_pos);
        logo_base.scale = defaults.logo_scale;
        logo_base.opacity = defaults.logo_opacity.clamp(0.0, 1.0);
        let path = if defaults.logo.is_absolute() {
            defaults.logo.clone()
        } else {
            self.base_dir.join(&defaults.logo)
        };
        let source = ImageSource::from_path(&path);
        let logo = if is_gif(&path) {
            SceneObject::AnimatedGif(AnimatedGif::new(
                source,
                false,
                true,
                logo_base,
                self.loader.as_ref(),
                now_ms,
            ))
        } else {
            SceneObject::Image(ImageObject::new(source, false, logo_base, self.loader.as_ref()))
        };
        let logo_h = logo.base().extent.h as f32 * defaults.logo_scale;
        self.add_if_valid(logo);

        let mut text_base = ObjectBase::new(logo_pos.offset_by(0.0, 0.6 * logo_h));
        text_base.scale = defaults.text_style.scale;
        text_base.rotation = defaults.text_rotation;
        text_base.opacity = defaults.text_opacity.clamp(0.0, 1.0);
        let signature = Signature::new(
            defaults.text.clone(),
            defaults.text_style.font_name.clone(),
            defaults.text_style.font_size,
            defaults.text_style.font_color,
            text_base,
            self.loader.as_ref(),
        );
        self.add_if_valid(SceneObject::Signature(signature));
    }

    /// Persisted records of every valid object, bottom to top.
    pub fn records(&self) -> Vec<Value> {
        self.objects
            .iter()
            .filter_map(|(_, o)| o.to_record())
            .filter_map(|r| match r.to_value() {
                Ok(v) => Some(v),
                Err(e) => {
                    warn!("{}", e);
                    None
                }
            })
            .collect()
    }

    /// Loads persisted records. Malformed records and objects whose
    /// resources fail to load are skipped; returns how many were added.
    pub fn load_records(&mut self, values: &[Value], now_ms: u64) -> usize {
        let center = self.work_area.center();
        let mut loaded = 0;
        for value in values {
            let mut value = value.clone();
            if let Some(map) = value.as_object_mut() {
                // missing or negative coordinates mean "centre of the screen"
                for (key, fallback) in [("x", center.x), ("y", center.y)] {
                    if map.get(key).and_then(Value::as_f64).is_none_or(|v| v < 0.0) {
                        map.insert(key.into(), Value::from(fallback));
                    }
                }
            }

            let record = match ObjectRecord::from_value(value) {
                Ok(record) => record,
                Err(e) => {
                    warn!("Skipping object: {}", e);
                    continue;
                }
            };
            let object = SceneObject::from_record(
                &record,
                self.loader.as_ref(),
                &self.base_dir,
                self.work_area,
                now_ms,
            );
            if self.add_if_valid(object).is_some() {
                loaded += 1;
            }
        }
        info!("Loaded {} of {} objects", loaded, values.len());
        loaded
    }

    /// Advances animations and the idle timer.
    pub fn tick(&mut self, now_ms: u64) -> TickOutcome {
        let mut timeout: Option<u64> = None;
        let mut propose = |t: u64| timeout = Some(timeout.map_or(t, |cur: u64| cur.min(t)));

        if !self.hidden && self.lines().is_some_and(LinePattern::shimmers) {
            let elapsed = now_ms.saturating_sub(self.idle_ticks);
            if elapsed >= self.idle_delay_ms {
                self.idle_ticks = now_ms;
                self.needs_redraw = true;
                propose(self.idle_delay_ms);
            } else {
                propose(self.idle_delay_ms - elapsed);
            }
        }

        if !self.hidden {
            for id in &self.animated {
                let Some((_, object)) = self.objects.iter_mut().find(|(i, _)| i == id) else {
                    continue;
                };
                if !object.valid() {
                    continue;
                }
                let Some(animation) = object.animation_mut() else {
                    continue;
                };
                let elapsed = now_ms.saturating_sub(animation.last_change_ms());
                let delay = animation.current_delay_ms() as u64;
                if elapsed >= delay {
                    if animation.advance_frame() {
                        self.needs_redraw = true;
                    }
                    animation.set_last_change_ms(now_ms);
                    propose(animation.current_delay_ms() as u64);
                } else {
                    propose(delay - elapsed);
                }
            }
        }

        TickOutcome {
            redraw: self.needs_redraw,
            timeout_ms: timeout,
        }
    }

    /// Renders the whole scene and clears the redraw flag. A hidden scene
    /// shows only the edit frame.
    pub fn draw(&mut self, surface: &mut dyn Surface) {
        surface.clear();
        self.needs_redraw = false;
        if !self.hidden {
            self.draw_objects(surface);
        }
        if self.interaction.layout_mode {
            self.draw_edit_frame(surface);
        }
    }

    fn draw_objects(&self, surface: &mut dyn Surface) {
        let params = DrawParams {
            global_alpha: self.global_alpha as f32 / 255.0,
            idle_ticks: self.idle_ticks,
        };
        let dragging = self.interaction.is_captured();

        for (id, object) in &self.objects {
            if !object.valid() {
                continue;
            }
            if dragging && !object.is_selectable() {
                continue;
            }
            let anchor = if self.interaction.capture == Some(*id) {
                self.interaction.drag_anchor()
            } else {
                object.base().position
            };
            object.draw(anchor, &params, surface);
        }
    }

    fn draw_edit_frame(&self, surface: &mut dyn Surface) {
        let mut rect = self.work_area.to_rect();
        for i in 0..FRAME_RINGS {
            surface.stroke_rect(rect, Rgba::new(0, FRAME_GREEN, 0, 50 + i * 41));
            rect = rect.inset(1.0);
        }
    }
}
