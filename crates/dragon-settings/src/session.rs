//! One run of the overlay against its settings file.
//!
//! The session owns the loaded settings, seeds the scene from them, copies
//! the scene state back when it changed and writes the file only when
//! something actually changed since it was read.

use crate::config::OverlaySettings;
use crate::error::SettingsResult;
use crate::persistence::{load_from_file, save_to_file};
use dragon_core::IntRect;
use dragon_scene::{AssetLoader, LinePattern, Scene, SceneObject};
use std::path::{Path, PathBuf};
use tracing::{info, warn};

#[derive(Debug)]
pub struct SettingsSession {
    path: PathBuf,
    base_dir: PathBuf,
    settings: OverlaySettings,
    /// True until the first change; a virgin session never writes.
    virgin: bool,
}

impl SettingsSession {
    /// Opens `path`, using defaults when the file does not exist. Assets and
    /// the signature text file are looked up next to it.
    pub fn open(path: impl Into<PathBuf>) -> SettingsResult<Self> {
        let path = path.into();
        let base_dir = path
            .parent()
            .map(Path::to_path_buf)
            .unwrap_or_default();

        let mut settings = if path.exists() {
            load_from_file(&path)?
        } else {
            info!("No settings at {}, using defaults", path.display());
            OverlaySettings::default()
        };
        settings.resolve_text_content(&base_dir);

        Ok(Self {
            path,
            base_dir,
            settings,
            virgin: true,
        })
    }

    /// A session over already-loaded settings.
    pub fn with_settings(path: impl Into<PathBuf>, settings: OverlaySettings) -> Self {
        let path = path.into();
        let base_dir = path
            .parent()
            .map(Path::to_path_buf)
            .unwrap_or_default();
        Self {
            path,
            base_dir,
            settings,
            virgin: true,
        }
    }

    pub fn path(&self) -> &Path {
        &self.path
    }

    pub fn base_dir(&self) -> &Path {
        &self.base_dir
    }

    pub fn settings(&self) -> &OverlaySettings {
        &self.settings
    }

    pub fn settings_mut(&mut self) -> &mut OverlaySettings {
        self.virgin = false;
        &mut self.settings
    }

    pub fn is_virgin(&self) -> bool {
        self.virgin
    }

    /// Builds the scene for a host whose usable screen area is `usable`:
    /// global state, the line layer, then the stored objects or, when there
    /// are none, the default logo and signature.
    pub fn build_scene(
        &self,
        usable: IntRect,
        loader: Box<dyn AssetLoader>,
        now_ms: u64,
    ) -> Scene {
        let s = &self.settings;
        let area = s.work_area(usable);
        let mut scene = Scene::new(area, loader);
        scene.set_base_dir(&self.base_dir);
        scene.set_global_alpha(s.alpha);
        scene.set_hidden(s.hidden);
        scene.set_idle_delay_ms(s.idle_delay_ms);
        scene.set_text_defaults(s.text_defaults());
        scene.add(SceneObject::Lines(LinePattern::new(s.hatch_style(), area)));

        let loaded = scene.load_records(&s.objects, now_ms);
        if loaded == 0 {
            if !s.objects.is_empty() {
                warn!("None of the {} stored objects could be loaded", s.objects.len());
            }
            scene.add_default_objects(&s.default_objects(&self.base_dir), now_ms);
        }
        scene
    }

    /// Copies the scene's persisted state into the settings if the scene
    /// changed since the last sync. Returns whether anything was copied.
    pub fn sync_from_scene(&mut self, scene: &mut Scene) -> bool {
        if !scene.is_dirty() {
            return false;
        }
        let s = &mut self.settings;
        s.alpha = scene.global_alpha();
        s.hidden = scene.hidden();
        if let Some(lines) = scene.lines() {
            s.set_hatch_style(lines.style());
        }
        s.objects = scene.records();
        scene.mark_saved();
        self.virgin = false;
        true
    }

    /// Writes the settings unless nothing changed since loading. Returns
    /// whether the file was written.
    pub fn save(&self) -> SettingsResult<bool> {
        if self.virgin {
            return Ok(false);
        }
        save_to_file(&self.settings, &self.path)?;
        Ok(true)
    }
}
