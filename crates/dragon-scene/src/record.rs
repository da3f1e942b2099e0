//! Persisted form of screen objects.
//!
//! Each object is stored as a flat JSON mapping tagged by `type`. Records are
//! read one at a time so that a single malformed entry only drops that
//! object.

use dragon_core::{round_to_precision, ColorValue, RecordError, Rgb};
use serde::{Deserialize, Serialize};
use serde_json::Value;
use std::path::PathBuf;

pub const DEFAULT_FONT_NAME: &str = "Freeman-Regular.TTF";
pub const DEFAULT_FONT_SIZE: f32 = 78.0;
pub const DEFAULT_FONT_COLOR: Rgb = Rgb::new(0x70, 0x92, 0xBE);

pub const DEFAULT_LINE_WIDTH: u32 = 1;
pub const DEFAULT_LINE_COLOR: Rgb = Rgb::BLACK;
pub const DEFAULT_DASH_LEN: u32 = 10;
pub const DEFAULT_DASH_GAP: u32 = 10;
pub const DEFAULT_LINE_ANGLE: f32 = 45.0;
pub const DEFAULT_LINE_SPACING: f32 = 10.0;

fn default_scale() -> f32 {
    1.0
}

fn default_alpha() -> f32 {
    1.0
}

fn default_true() -> bool {
    true
}

fn default_font_name() -> String {
    DEFAULT_FONT_NAME.to_string()
}

fn default_font_size() -> f32 {
    DEFAULT_FONT_SIZE
}

fn default_line_width() -> u32 {
    DEFAULT_LINE_WIDTH
}

fn default_dash_len() -> u32 {
    DEFAULT_DASH_LEN
}

fn default_dash_gap() -> u32 {
    DEFAULT_DASH_GAP
}

fn default_line_angle() -> f32 {
    DEFAULT_LINE_ANGLE
}

fn default_line_spacing() -> f32 {
    DEFAULT_LINE_SPACING
}

fn rounded(v: f32) -> f32 {
    round_to_precision(v as f64, 4) as f32
}

/// Position, scale, rotation and opacity shared by every record.
#[derive(Debug, Clone, Copy, PartialEq, Serialize, Deserialize)]
pub struct PoseRecord {
    pub x: f32,
    pub y: f32,
    #[serde(default = "default_scale")]
    pub scale: f32,
    #[serde(default)]
    pub rotate: f32,
    /// Opacity in `0..=1`.
    #[serde(default = "default_alpha")]
    pub alpha: f32,
}

impl PoseRecord {
    /// Copy with every float rounded to four decimals for storage.
    pub fn rounded(&self) -> Self {
        Self {
            x: rounded(self.x),
            y: rounded(self.y),
            scale: rounded(self.scale),
            rotate: rounded(self.rotate),
            alpha: rounded(self.alpha),
        }
    }
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct SignatureRecord {
    #[serde(flatten)]
    pub pose: PoseRecord,
    #[serde(default)]
    pub text: String,
    #[serde(default = "default_font_name")]
    pub font_name: String,
    #[serde(default = "default_font_size")]
    pub font_size: f32,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub font_color: Option<ColorValue>,
}

/// Shared by static images and animations.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct ImageRecord {
    #[serde(flatten)]
    pub pose: PoseRecord,
    #[serde(default)]
    pub image_name: String,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub image_full_path: Option<PathBuf>,
    #[serde(default)]
    pub flip_horizontal: bool,
    #[serde(default = "default_true")]
    pub cache_frames: bool,
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct LinesRecord {
    #[serde(flatten)]
    pub pose: PoseRecord,
    #[serde(default = "default_line_width")]
    pub width: u32,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub color: Option<ColorValue>,
    #[serde(default = "default_true")]
    pub dashed: bool,
    #[serde(default = "default_dash_len")]
    pub dashed_len: u32,
    #[serde(default = "default_dash_gap")]
    pub dashed_gap: u32,
    #[serde(default = "default_line_angle")]
    pub line_angle: f32,
    #[serde(default = "default_line_spacing")]
    pub line_spacing: f32,
}

/// A persisted screen object.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(tag = "type")]
pub enum ObjectRecord {
    Signature(SignatureRecord),
    Image(ImageRecord),
    AnimatedGif(ImageRecord),
    Lines(LinesRecord),
}

impl ObjectRecord {
    pub const TYPE_NAMES: [&'static str; 4] = ["Signature", "Image", "AnimatedGif", "Lines"];

    pub fn type_name(&self) -> &'static str {
        match self {
            ObjectRecord::Signature(_) => "Signature",
            ObjectRecord::Image(_) => "Image",
            ObjectRecord::AnimatedGif(_) => "AnimatedGif",
            ObjectRecord::Lines(_) => "Lines",
        }
    }

    pub fn pose(&self) -> &PoseRecord {
        match self {
            ObjectRecord::Signature(r) => &r.pose,
            ObjectRecord::Image(r) | ObjectRecord::AnimatedGif(r) => &r.pose,
            ObjectRecord::Lines(r) => &r.pose,
        }
    }

    pub fn to_value(&self) -> Result<Value, RecordError> {
        serde_json::to_value(self).map_err(|e| RecordError::Malformed {
            kind: self.type_name().to_string(),
            reason: e.to_string(),
        })
    }

    /// Reads one record, accepting the older shapes normalized by
    /// [`normalize_legacy`].
    pub fn from_value(mut value: Value) -> Result<Self, RecordError> {
        normalize_legacy(&mut value);

        let kind = match value.get("type") {
            Some(Value::String(kind)) => kind.clone(),
            Some(other) => return Err(RecordError::UnknownType(other.to_string())),
            None => return Err(RecordError::MissingType),
        };
        if !Self::TYPE_NAMES.contains(&kind.as_str()) {
            return Err(RecordError::UnknownType(kind));
        }

        serde_json::from_value(value).map_err(|e| RecordError::Malformed {
            kind,
            reason: e.to_string(),
        })
    }
}

/// Brings older record shapes up to date in place:
/// an untyped record with `image_full_path` becomes an `Image` (or
/// `AnimatedGif` for `.gif` files), and an `alpha` above 1 is read as the
/// 0..255 byte scale.
pub fn normalize_legacy(value: &mut Value) {
    let Some(map) = value.as_object_mut() else {
        return;
    };

    if !map.contains_key("type") {
        if let Some(path) = map.get("image_full_path").and_then(Value::as_str) {
            let kind = if path.to_ascii_lowercase().ends_with(".gif") {
                "AnimatedGif"
            } else {
                "Image"
            };
            map.insert("type".into(), Value::from(kind));
        }
    }

    if let Some(alpha) = map.get("alpha").and_then(Value::as_f64) {
        if alpha > 1.0 {
            map.insert("alpha".into(), Value::from((alpha / 255.0).min(1.0)));
        }
    }
}
