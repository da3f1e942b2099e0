//! Dragon Settings Crate
//!
//! Loads and saves the overlay settings file, migrates older layouts and
//! hands the result to the scene.

pub mod config;
pub mod error;
pub mod persistence;
pub mod session;

pub use config::{OverlaySettings, SettingsInfo, DEFAULT_SIGNATURE, FORMAT_VERSION};
pub use error::{SettingsError, SettingsResult};
pub use persistence::{
    default_settings_dir, load_from_file, parse_settings, save_to_file, settings_file_name,
    SettingsFormat,
};
pub use session::SettingsSession;
