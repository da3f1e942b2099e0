//! Settings Persistence
//!
//! Reads and writes the settings file. JSON is the native format; a path
//! ending in `.toml` is read and written as TOML instead. Files of the
//! current format version are read directly, older v0.2 files are migrated
//! and anything else falls back to defaults.

use crate::config::{OverlaySettings, FORMAT_VERSION};
use crate::error::{SettingsError, SettingsResult};
use dragon_core::Rgb;
use dragon_scene::objects::{MAX_LINE_SPACING, MIN_LINE_SPACING};
use serde_json::{json, Map, Value};
use std::path::{Path, PathBuf};
use tracing::{debug, info, warn};

const SETTINGS_FILE_NAME: &str = "dragon.settings";

/// On-disk encoding of the settings file.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum SettingsFormat {
    Json,
    Toml,
}

impl SettingsFormat {
    /// Picks the format from the file extension.
    pub fn from_path(path: &Path) -> SettingsResult<Self> {
        match path.extension().and_then(|e| e.to_str()) {
            Some(ext) if ext.eq_ignore_ascii_case("toml") => Ok(Self::Toml),
            None => Ok(Self::Json),
            Some(ext)
                if ext.eq_ignore_ascii_case("json") || ext.eq_ignore_ascii_case("settings") =>
            {
                Ok(Self::Json)
            }
            Some(ext) => Err(SettingsError::UnsupportedFormat(ext.to_string())),
        }
    }
}

/// `<user>_dragon.settings` for the current user, from `USER` or `USERNAME`.
pub fn settings_file_name() -> String {
    let user = std::env::var("USER")
        .or_else(|_| std::env::var("USERNAME"))
        .ok();
    settings_file_name_for(user.as_deref())
}

/// Settings file name for `user`; plain `dragon.settings` when unknown.
pub fn settings_file_name_for(user: Option<&str>) -> String {
    match user.map(str::trim).filter(|u| !u.is_empty()) {
        Some(user) => format!("{}_{}", user, SETTINGS_FILE_NAME),
        None => SETTINGS_FILE_NAME.to_string(),
    }
}

/// Platform config directory for the overlay.
pub fn default_settings_dir() -> SettingsResult<PathBuf> {
    dirs::config_dir()
        .map(|dir| dir.join("dragon"))
        .ok_or_else(|| SettingsError::ConfigDirectory("no config directory".to_string()))
}

/// Load settings from file
pub fn load_from_file(path: &Path) -> SettingsResult<OverlaySettings> {
    let format = SettingsFormat::from_path(path)?;
    let content = std::fs::read_to_string(path)?;
    let settings = parse_settings(&content, format)?;
    info!("Settings read from {}", path.display());
    Ok(settings)
}

/// Save settings to file, stamping `info.saved`.
pub fn save_to_file(settings: &OverlaySettings, path: &Path) -> SettingsResult<()> {
    let format = SettingsFormat::from_path(path)?;
    settings.validate()?;

    let mut stamped = settings.clone();
    stamped.info.version = FORMAT_VERSION.to_string();
    stamped.info.saved = Some(chrono::Local::now().to_rfc3339());

    let content = match format {
        SettingsFormat::Json => serde_json::to_string_pretty(&stamped)?,
        SettingsFormat::Toml => toml::to_string_pretty(&stamped)?,
    };

    if let Some(parent) = path.parent().filter(|p| !p.as_os_str().is_empty()) {
        std::fs::create_dir_all(parent)?;
    }
    std::fs::write(path, content)
        .map_err(|e| SettingsError::SaveError(format!("{}: {}", path.display(), e)))?;
    info!("Settings written to {}", path.display());
    Ok(())
}

/// Parses settings text of the given format, migrating older layouts.
pub fn parse_settings(content: &str, format: SettingsFormat) -> SettingsResult<OverlaySettings> {
    let value: Value = match format {
        SettingsFormat::Json => serde_json::from_str(content)?,
        SettingsFormat::Toml => toml::from_str(content)?,
    };
    if !value.is_object() {
        return Err(SettingsError::LoadError(
            "settings must be a mapping".to_string(),
        ));
    }

    let version = value
        .get("info")
        .and_then(|info| info.get("version"))
        .and_then(Value::as_str)
        .map(str::to_string);

    let mut settings = match version.as_deref() {
        Some(FORMAT_VERSION) => read_current(value)?,
        None | Some("0.2") => {
            info!("Migrating v0.2 settings");
            migrate_v0_2(&value)
        }
        Some(other) => {
            warn!(
                "Settings file version mismatch, should be \"{}\" but is \"{}\". Using default settings.",
                FORMAT_VERSION, other
            );
            OverlaySettings::default()
        }
    };
    settings.clamp_ranges();
    settings
        .validate()
        .map_err(|e| SettingsError::LoadError(e.to_string()))?;
    Ok(settings)
}

fn read_current(mut value: Value) -> SettingsResult<OverlaySettings> {
    if let Some(map) = value.as_object_mut() {
        convert_slope(map);
    }
    Ok(serde_json::from_value(value)?)
}

/// Replaces `line_slope_dx`/`line_slope_dy` with `line_angle` and
/// `line_spacing` unless those are already present.
fn convert_slope(map: &mut Map<String, Value>) {
    let dx = map.remove("line_slope_dx").and_then(|v| v.as_f64());
    let dy = map.remove("line_slope_dy").and_then(|v| v.as_f64());
    if dx.is_none() && dy.is_none() {
        return;
    }
    if map.contains_key("line_angle") || map.contains_key("line_spacing") {
        return;
    }

    let (dx, dy) = (dx.unwrap_or(10.0), dy.unwrap_or(10.0));
    let Some((angle, spacing)) = slope_to_angle_spacing(dx, dy) else {
        return;
    };
    debug!(
        "Line slope ({}, {}) becomes angle {:.2} spacing {:.2}",
        dx, dy, angle, spacing
    );
    map.insert("line_angle".into(), json!(angle));
    map.insert("line_spacing".into(), json!(spacing));
}

/// Converts a line slope step into an angle in degrees and the distance
/// between neighbouring lines. `None` for a zero slope.
pub fn slope_to_angle_spacing(dx: f64, dy: f64) -> Option<(f32, f32)> {
    let spacing = match (dx == 0.0, dy == 0.0) {
        (true, true) => return None,
        (true, false) => dy.abs(),
        (false, true) => dx.abs(),
        (false, false) => (dx * dy).abs() / dx.hypot(dy),
    };
    let angle = dy.atan2(dx).to_degrees();
    let spacing = (spacing as f32).clamp(MIN_LINE_SPACING, MAX_LINE_SPACING);
    Some((angle as f32, spacing))
}

fn get_f32(j: &Value, key: &str) -> Option<f32> {
    j.get(key).and_then(Value::as_f64).map(|v| v as f32)
}

fn get_u32(j: &Value, key: &str) -> Option<u32> {
    j.get(key)
        .and_then(Value::as_u64)
        .map(|v| v.min(u32::MAX as u64) as u32)
}

fn get_string(j: &Value, key: &str) -> Option<String> {
    j.get(key).and_then(Value::as_str).map(str::to_string)
}

fn get_bool(j: &Value, key: &str) -> Option<bool> {
    match j.get(key)? {
        Value::Bool(b) => Some(*b),
        Value::Number(n) => n.as_i64().map(|v| v != 0),
        _ => None,
    }
}

fn get_color(j: &Value, key: &str) -> Option<Rgb> {
    let value = j.get(key)?;
    match serde_json::from_value(value.clone()) {
        Ok(color) => Some(color),
        Err(e) => {
            warn!("Ignoring {}: {}", key, e);
            None
        }
    }
}

fn get_pair(j: &Value, key: &str) -> Option<(f64, f64)> {
    let pair = j.get(key)?.as_array()?;
    Some((pair.first()?.as_f64()?, pair.get(1)?.as_f64()?))
}

/// Reads the v0.2 layout, turning `textPos`/`logoPos` into object records.
pub fn migrate_v0_2(j: &Value) -> OverlaySettings {
    let mut s = OverlaySettings::default();

    if let Some(alpha) = j.get("alpha").and_then(Value::as_u64) {
        s.alpha = alpha.min(255) as u8;
    }
    s.hidden = get_bool(j, "hidden").unwrap_or(s.hidden);
    s.line_width = get_u32(j, "line_width").unwrap_or(s.line_width);
    s.line_color = get_color(j, "line_color").unwrap_or(s.line_color);
    s.line_dashed = get_bool(j, "line_dashed").unwrap_or(s.line_dashed);
    s.line_dashed_gap = get_u32(j, "line_dashed_gap").unwrap_or(s.line_dashed_gap);
    s.line_dashed_len = get_u32(j, "line_dashed_len").unwrap_or(s.line_dashed_len);
    s.logo_file_name = get_string(j, "logo_filename").unwrap_or(s.logo_file_name);
    s.logo_scale = get_f32(j, "logo_scale").unwrap_or(s.logo_scale);
    s.text_content = get_string(j, "text_content").unwrap_or(s.text_content);
    s.text_file_name = get_string(j, "text_file_name").unwrap_or(s.text_file_name);
    s.text_font_color = get_color(j, "text_font_color").unwrap_or(s.text_font_color);
    s.text_font_name = get_string(j, "text_font_name").unwrap_or(s.text_font_name);
    s.text_font_size = get_f32(j, "text_font_size").unwrap_or(s.text_font_size);
    s.text_rotate = get_f32(j, "text_rotate").unwrap_or(s.text_rotate);
    s.text_scale = get_f32(j, "text_scale").unwrap_or(s.text_scale);

    if let Some((x, y)) = get_pair(j, "textPos") {
        s.objects.push(json!({
            "type": "Signature",
            "x": x,
            "y": y,
            "text": s.text_content,
            "font_name": s.text_font_name,
            "font_size": s.text_font_size,
            "font_color": s.text_font_color.to_hex(),
            "scale": s.text_scale,
            "rotate": s.text_rotate,
        }));
    }

    if let Some((x, y)) = get_pair(j, "logoPos") {
        let logo = PathBuf::from(&s.logo_file_name);
        let name = logo
            .file_name()
            .map(|n| n.to_string_lossy().into_owned())
            .unwrap_or_default();
        let mut record = json!({
            "type": "Image",
            "x": x,
            "y": y,
            "image_name": name,
            "scale": s.logo_scale,
            "rotate": 0,
        });
        if logo.is_absolute() {
            record["image_full_path"] = json!(logo);
        }
        s.objects.push(record);
    }

    s
}
