use anyhow::Context;
use clap::Parser;
use dragon_overlay::{init_logging, render_to_png, FsAssetLoader, IntRect, SettingsSession};
use std::path::PathBuf;

/// Renders the Dragon overlay headlessly from its settings file.
#[derive(Parser, Debug)]
#[command(name = "dragon-overlay", version, about)]
struct Cli {
    /// Settings file; defaults to `<user>_dragon.settings` in the config directory
    #[arg(long, value_name = "PATH")]
    settings: Option<PathBuf>,

    /// PNG to write
    #[arg(long, value_name = "PNG", default_value = "overlay.png")]
    output: PathBuf,

    /// Usable screen width
    #[arg(long, default_value_t = 1920)]
    width: i32,

    /// Usable screen height
    #[arg(long, default_value_t = 1080)]
    height: i32,

    /// Directory searched for fonts before the system fonts
    #[arg(long, value_name = "DIR")]
    fonts: Option<PathBuf>,

    /// Scene time of the rendered frame, in milliseconds
    #[arg(long, value_name = "MS", default_value_t = 0)]
    at_ms: u64,

    /// Draw in layout mode, with the edit frame
    #[arg(long)]
    layout: bool,
}

fn main() -> anyhow::Result<()> {
    init_logging()?;
    let cli = Cli::parse();

    let path = match cli.settings {
        Some(path) => path,
        None => dragon_settings::default_settings_dir()?
            .join(dragon_settings::settings_file_name()),
    };
    let mut session = SettingsSession::open(&path)
        .with_context(|| format!("reading settings from {}", path.display()))?;

    let loader = match cli.fonts.as_ref() {
        Some(dir) => FsAssetLoader::with_font_dir(dir),
        None => FsAssetLoader::new(),
    };
    let usable = IntRect::new(0, 0, cli.width, cli.height);
    let mut scene = session.build_scene(usable, Box::new(loader), 0);
    scene.set_layout_mode(cli.layout);

    render_to_png(&mut scene, cli.at_ms, &cli.output)?;

    if session.sync_from_scene(&mut scene) && session.save()? {
        tracing::info!("Settings saved to {}", session.path().display());
    }
    Ok(())
}
