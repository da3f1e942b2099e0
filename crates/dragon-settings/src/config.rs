//! Overlay settings
//!
//! The settings file is a single flat mapping: an `info` header, the global
//! dimmer and visibility, the line layer, the defaults used for the logo and
//! the signature text, and the list of persisted object records.

use crate::error::{SettingsError, SettingsResult};
use dragon_core::{IntRect, Rgb};
use dragon_scene::objects::{MAX_LINE_SPACING, MAX_LINE_WIDTH, MIN_LINE_SPACING};
use dragon_scene::record::{
    DEFAULT_DASH_GAP, DEFAULT_DASH_LEN, DEFAULT_FONT_COLOR, DEFAULT_FONT_NAME, DEFAULT_FONT_SIZE,
    DEFAULT_LINE_ANGLE, DEFAULT_LINE_COLOR, DEFAULT_LINE_SPACING, DEFAULT_LINE_WIDTH,
};
use dragon_scene::{DefaultObjects, HatchStyle, TextDefaults};
use serde::{Deserialize, Serialize};
use serde_json::Value;
use std::path::{Path, PathBuf};

/// Settings format written by this version.
pub const FORMAT_VERSION: &str = "0.3";

/// Signature text used when neither the settings nor the text file supply one.
pub const DEFAULT_SIGNATURE: &str = "Dragon Signature";

/// Header identifying the file.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct SettingsInfo {
    pub description: String,
    pub version: String,
    pub comment: String,
    /// RFC 3339 time of the last save.
    #[serde(skip_serializing_if = "Option::is_none")]
    pub saved: Option<String>,
}

impl Default for SettingsInfo {
    fn default() -> Self {
        Self {
            description: "Dragon setup file".to_string(),
            version: FORMAT_VERSION.to_string(),
            comment: "Generated by Dragon; may be edited by hand.".to_string(),
            saved: None,
        }
    }
}

/// Everything persisted between sessions.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct OverlaySettings {
    pub info: SettingsInfo,
    /// `[x, y, w, h]`; every non-negative component overrides the usable
    /// screen area reported by the host.
    pub screen_rect_init: [i32; 4],
    /// Pixels removed from the bottom of the work area.
    pub crop_bottom: u32,
    pub hidden: bool,
    /// Global dimmer, `0..=255`.
    pub alpha: u8,
    pub idle_delay_ms: u64,
    pub line_width: u32,
    pub line_color: Rgb,
    pub line_dashed: bool,
    pub line_dashed_len: u32,
    pub line_dashed_gap: u32,
    /// Degrees.
    pub line_angle: f32,
    pub line_spacing: f32,
    /// File next to the settings holding the signature text.
    pub text_file_name: String,
    pub text_content: String,
    pub text_font_name: String,
    pub text_font_color: Rgb,
    pub text_font_size: f32,
    pub text_scale: f32,
    pub text_rotate: f32,
    pub text_alpha: u8,
    pub logo_file_name: String,
    pub logo_scale: f32,
    pub logo_alpha: u8,
    /// Persisted object records, bottom to top.
    pub objects: Vec<Value>,
}

impl Default for OverlaySettings {
    fn default() -> Self {
        Self {
            info: SettingsInfo::default(),
            screen_rect_init: [-1, -1, -1, -1],
            crop_bottom: 0,
            hidden: false,
            alpha: 136,
            idle_delay_ms: 600,
            line_width: DEFAULT_LINE_WIDTH,
            line_color: DEFAULT_LINE_COLOR,
            line_dashed: true,
            line_dashed_len: DEFAULT_DASH_LEN,
            line_dashed_gap: DEFAULT_DASH_GAP,
            line_angle: DEFAULT_LINE_ANGLE,
            line_spacing: DEFAULT_LINE_SPACING,
            text_file_name: "signature.txt".to_string(),
            text_content: String::new(),
            text_font_name: DEFAULT_FONT_NAME.to_string(),
            text_font_color: DEFAULT_FONT_COLOR,
            text_font_size: DEFAULT_FONT_SIZE,
            text_scale: 0.4,
            text_rotate: 0.0,
            text_alpha: 255,
            logo_file_name: "dragon.png".to_string(),
            logo_scale: 0.2,
            logo_alpha: 255,
            objects: Vec::new(),
        }
    }
}

impl OverlaySettings {
    /// Create settings with defaults
    pub fn new() -> Self {
        Self::default()
    }

    /// Validate settings
    pub fn validate(&self) -> SettingsResult<()> {
        let positive = [
            ("text_font_size", self.text_font_size),
            ("text_scale", self.text_scale),
            ("logo_scale", self.logo_scale),
        ];
        for (key, value) in positive {
            if !(value.is_finite() && value > 0.0) {
                return Err(SettingsError::InvalidSetting {
                    key: key.to_string(),
                    reason: format!("must be > 0, got {}", value),
                });
            }
        }
        if !self.line_angle.is_finite() || !self.line_spacing.is_finite() {
            return Err(SettingsError::InvalidSetting {
                key: "line_angle".to_string(),
                reason: "line geometry must be finite".to_string(),
            });
        }
        Ok(())
    }

    /// Pulls line values back into the ranges the keyboard controls use.
    pub fn clamp_ranges(&mut self) {
        self.line_width = self.line_width.min(MAX_LINE_WIDTH);
        self.line_spacing = self.line_spacing.clamp(MIN_LINE_SPACING, MAX_LINE_SPACING);
    }

    /// The work area: `usable` with the `screen_rect_init` overrides applied
    /// and `crop_bottom` taken off.
    pub fn work_area(&self, usable: IntRect) -> IntRect {
        let pick = |value: i32, fallback: i32| if value >= 0 { value } else { fallback };
        let [x, y, w, h] = self.screen_rect_init;
        let h = pick(h, usable.h) - self.crop_bottom as i32;
        IntRect::new(
            pick(x, usable.x),
            pick(y, usable.y),
            pick(w, usable.w),
            h.max(0),
        )
    }

    pub fn hatch_style(&self) -> HatchStyle {
        HatchStyle {
            width: self.line_width,
            color: self.line_color,
            dashed: self.line_dashed,
            dash_len: self.line_dashed_len,
            gap_len: self.line_dashed_gap,
            angle: self.line_angle,
            spacing: self.line_spacing,
        }
    }

    pub fn set_hatch_style(&mut self, style: &HatchStyle) {
        self.line_width = style.width;
        self.line_color = style.color;
        self.line_dashed = style.dashed;
        self.line_dashed_len = style.dash_len;
        self.line_dashed_gap = style.gap_len;
        self.line_angle = style.angle;
        self.line_spacing = style.spacing;
    }

    /// Text style for dropped text, which always starts at scale 1.
    pub fn text_defaults(&self) -> TextDefaults {
        TextDefaults {
            font_name: self.text_font_name.clone(),
            font_size: self.text_font_size,
            font_color: self.text_font_color,
            scale: 1.0,
        }
    }

    /// The logo and signature placed on a scene without records. A relative
    /// logo name is resolved against `base_dir`.
    pub fn default_objects(&self, base_dir: &Path) -> DefaultObjects {
        let logo = PathBuf::from(&self.logo_file_name);
        DefaultObjects {
            text: self.text_content.clone(),
            text_style: TextDefaults {
                scale: self.text_scale,
                ..self.text_defaults()
            },
            text_rotation: self.text_rotate,
            text_opacity: self.text_alpha as f32 / 255.0,
            logo: if logo.is_absolute() {
                logo
            } else {
                base_dir.join(logo)
            },
            logo_scale: self.logo_scale,
            logo_opacity: self.logo_alpha as f32 / 255.0,
        }
    }

    /// Fills an empty `text_content` from the first line of
    /// `text_file_name` in `base_dir`, falling back to
    /// [`DEFAULT_SIGNATURE`]. Signature records without text get it too.
    pub fn resolve_text_content(&mut self, base_dir: &Path) {
        if self.text_content.is_empty() {
            self.text_content = self
                .read_text_file(base_dir)
                .unwrap_or_else(|| DEFAULT_SIGNATURE.to_string());
        }

        for record in &mut self.objects {
            let Some(map) = record.as_object_mut() else {
                continue;
            };
            let is_signature = map.get("type").and_then(Value::as_str) == Some("Signature");
            let has_text = map
                .get("text")
                .and_then(Value::as_str)
                .is_some_and(|t| !t.is_empty());
            if is_signature && !has_text {
                map.insert("text".into(), Value::from(self.text_content.clone()));
            }
        }
    }

    fn read_text_file(&self, base_dir: &Path) -> Option<String> {
        if self.text_file_name.is_empty() {
            return None;
        }
        let path = base_dir.join(&self.text_file_name);
        let content = std::fs::read_to_string(&path).ok()?;
        let line = content.lines().next()?.trim_end_matches('\r');
        tracing::debug!("Signature text read from {}", path.display());
        Some(line.to_string())
    }
}
