//! # Dragon
//!
//! A transparent desktop overlay holding a few user-arranged objects:
//! - Signature text rendered from a TrueType font
//! - Static images and looping animated GIFs
//! - A procedural hatch-line background, solid or dashed
//!
//! ## Architecture
//!
//! Dragon is organized as a workspace with multiple crates:
//!
//! 1. **dragon-core** - Geometry, colors, input events, errors
//! 2. **dragon-scene** - Screen objects, GIF engine, hatch lines, the scene
//! 3. **dragon-settings** - Settings file, migration, scene seeding
//! 4. **dragon-overlay** - This facade and the headless renderer binary

pub use dragon_core::{
    AssetError, ColorError, CursorStyle, Error, EventResponse, InputEvent, IntRect, Key,
    Modifiers, MouseButton, Point, RecordError, Result, Rgb, Rgba, UpdateLevel,
};
pub use dragon_scene::{
    AssetLoader, FsAssetLoader, PixmapSurface, Scene, SceneObject, ScreenObject, Surface,
    TickOutcome,
};
pub use dragon_settings::{OverlaySettings, SettingsError, SettingsSession};

use anyhow::Context;
use std::path::Path;

/// Library version
pub const VERSION: &str = env!("CARGO_PKG_VERSION");

/// Initialize logging with the default configuration
///
/// Sets up structured logging with:
/// - Console output with pretty formatting
/// - RUST_LOG environment variable support
pub fn init_logging() -> anyhow::Result<()> {
    use tracing_subscriber::fmt;
    use tracing_subscriber::prelude::*;
    use tracing_subscriber::EnvFilter;

    let env_filter = EnvFilter::from_default_env().add_directive(tracing::Level::INFO.into());

    let fmt_layer = fmt::layer()
        .with_writer(std::io::stdout)
        .with_target(true)
        .with_level(true)
        .with_thread_ids(true)
        .with_thread_names(true)
        .with_line_number(true)
        .pretty();

    tracing_subscriber::registry()
        .with(env_filter)
        .with(fmt_layer)
        .try_init()
        .context("logging already initialized")?;

    Ok(())
}

/// Advances the scene to `at_ms` and draws it onto a fresh surface the
/// size of its work area.
pub fn render_frame(scene: &mut Scene, at_ms: u64) -> anyhow::Result<PixmapSurface> {
    let area = scene.work_area();
    let mut surface = PixmapSurface::new(area.w.max(1) as u32, area.h.max(1) as u32)
        .with_context(|| format!("cannot allocate a {}x{} surface", area.w, area.h))?;
    let outcome = scene.tick(at_ms);
    tracing::debug!("Tick at {} ms: {:?}", at_ms, outcome);
    scene.draw(&mut surface);
    Ok(surface)
}

/// Renders the scene at `at_ms` into a PNG file.
pub fn render_to_png(scene: &mut Scene, at_ms: u64, output: &Path) -> anyhow::Result<()> {
    let surface = render_frame(scene, at_ms)?;
    surface
        .save_png(output)
        .map_err(|e| anyhow::anyhow!("cannot write {}: {}", output.display(), e))?;
    tracing::info!("Frame written to {}", output.display());
    Ok(())
}
