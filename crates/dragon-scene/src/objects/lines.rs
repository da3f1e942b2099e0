use super::{DrawParams, Interaction, ObjectBase, ScreenObject};
use crate::hatch::{draw_hatch, HatchStyle};
use crate::record::{LinesRecord, ObjectRecord, DEFAULT_LINE_COLOR, DEFAULT_LINE_SPACING};
use crate::surface::Surface;
use dragon_core::{color_from_key, color_or, EventResponse, InputEvent, IntRect, Point};

pub const MIN_LINE_SPACING: f32 = 2.0;
pub const MAX_LINE_SPACING: f32 = 50.0;
/// Widest line selectable from the keyboard.
pub const MAX_LINE_WIDTH: u32 = 5;
const ANGLE_STEP_DEG: f32 = 5.0;
const SPACING_STEP: f32 = 1.0;

/// The hatch-line background covering the work area. Not selectable; it
/// takes the line keys nobody else claimed.
#[derive(Debug)]
pub struct LinePattern {
    base: ObjectBase,
    style: HatchStyle,
    area: IntRect,
}

impl LinePattern {
    pub fn new(style: HatchStyle, area: IntRect) -> Self {
        let mut style = style;
        style.spacing = clamp_spacing(style.spacing);
        Self {
            base: ObjectBase::new(Point::new(area.x as f32, area.y as f32)),
            style,
            area,
        }
    }

    pub fn from_record(record: &LinesRecord, area: IntRect) -> Self {
        let style = HatchStyle {
            width: record.width,
            color: color_or(record.color.as_ref(), DEFAULT_LINE_COLOR),
            dashed: record.dashed,
            dash_len: record.dashed_len,
            gap_len: record.dashed_gap,
            angle: record.line_angle,
            spacing: record.line_spacing,
        };
        let mut lines = Self::new(style, area);
        lines.base.opacity = record.pose.alpha.clamp(0.0, 1.0);
        lines
    }

    pub fn style(&self) -> &HatchStyle {
        &self.style
    }

    pub fn style_mut(&mut self) -> &mut HatchStyle {
        &mut self.style
    }

    pub fn area(&self) -> IntRect {
        self.area
    }

    pub fn set_area(&mut self, area: IntRect) {
        self.area = area;
        self.base.position = Point::new(area.x as f32, area.y as f32);
    }

    pub fn set_spacing(&mut self, spacing: f32) {
        self.style.spacing = clamp_spacing(spacing);
    }

    /// True when the layer changes between idle periods.
    pub fn shimmers(&self) -> bool {
        self.style.dashed && self.style.gap_len > 0 && self.style.width > 0
    }

    fn apply_key(&mut self, c: char) -> bool {
        if let Some(color) = color_from_key(c) {
            self.style.color = color;
            return true;
        }
        match c {
            '0'..='5' => {
                self.style.width = c.to_digit(10).unwrap_or(0).min(MAX_LINE_WIDTH);
            }
            'd' => self.style.dashed = !self.style.dashed,
            '[' => self.style.angle = (self.style.angle - ANGLE_STEP_DEG) % 360.0,
            ']' => self.style.angle = (self.style.angle + ANGLE_STEP_DEG) % 360.0,
            '-' => self.set_spacing(self.style.spacing - SPACING_STEP),
            '+' | '=' => self.set_spacing(self.style.spacing + SPACING_STEP),
            _ => return false,
        }
        true
    }
}

fn clamp_spacing(spacing: f32) -> f32 {
    if spacing.is_finite() {
        spacing.clamp(MIN_LINE_SPACING, MAX_LINE_SPACING)
    } else {
        DEFAULT_LINE_SPACING
    }
}

impl ScreenObject for LinePattern {
    fn type_name(&self) -> &'static str {
        "Lines"
    }

    fn base(&self) -> &ObjectBase {
        &self.base
    }

    fn base_mut(&mut self) -> &mut ObjectBase {
        &mut self.base
    }

    fn valid(&self) -> bool {
        !self.base.deleted
    }

    fn to_record(&self) -> Option<ObjectRecord> {
        if !self.valid() {
            return None;
        }
        Some(ObjectRecord::Lines(LinesRecord {
            pose: self.base.pose(),
            width: self.style.width,
            color: Some(self.style.color.into()),
            dashed: self.style.dashed,
            dashed_len: self.style.dash_len,
            dashed_gap: self.style.gap_len,
            line_angle: self.style.angle,
            line_spacing: self.style.spacing,
        }))
    }

    fn hit_test(&self, _pt: Point) -> bool {
        false
    }

    fn handle_event(&mut self, event: &InputEvent, ctx: &mut Interaction) -> EventResponse {
        if !ctx.layout_mode || !self.valid() {
            return EventResponse::IGNORED;
        }
        match event {
            InputEvent::KeyDown { key, modifiers } if !modifiers.ctrl => {
                match key.char() {
                    Some(c) if self.apply_key(c) => EventResponse::settings_changed(),
                    _ => EventResponse::IGNORED,
                }
            }
            _ => EventResponse::IGNORED,
        }
    }

    fn draw(&self, _anchor: Point, params: &DrawParams, surface: &mut dyn Surface) {
        if !self.valid() || self.style.width == 0 {
            return;
        }
        let alpha = params.global_alpha * self.base.opacity;
        draw_hatch(surface, self.area, &self.style, alpha, params.idle_ticks);
    }

    fn is_selectable(&self) -> bool {
        false
    }
}
