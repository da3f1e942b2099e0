use fontdb::{Database, Family, Query, Stretch, Style, Weight};
use rusttype::Font;
use std::{
    collections::HashMap,
    fs,
    path::{Path, PathBuf},
    sync::{Mutex, OnceLock},
};
use tracing::debug;

#[derive(Clone, Eq, PartialEq, Hash)]
struct FontKey {
    dir: Option<PathBuf>,
    name: String,
}

fn db() -> &'static Database {
    static DB: OnceLock<Database> = OnceLock::new();
    DB.get_or_init(|| {
        let mut db = Database::new();
        db.load_system_fonts();
        db
    })
}

/// Looks a font up by file name in `font_dir`, then by family name among the
/// system fonts. Loaded fonts live for the rest of the process.
pub fn get_font(font_dir: Option<&Path>, name: &str) -> Option<&'static Font<'static>> {
    static CACHE: OnceLock<Mutex<HashMap<FontKey, &'static Font<'static>>>> = OnceLock::new();
    let cache = CACHE.get_or_init(|| Mutex::new(HashMap::new()));

    let key = FontKey {
        dir: font_dir.map(Path::to_path_buf),
        name: name.to_string(),
    };

    if let Some(font) = cache.lock().unwrap_or_else(|p| p.into_inner()).get(&key) {
        return Some(font);
    }

    let loaded = font_dir
        .and_then(|dir| load_font_file(&dir.join(name)))
        .or_else(|| load_font_from_system(name))?;
    let font_ref: &'static Font<'static> = Box::leak(Box::new(loaded));

    cache
        .lock()
        .unwrap_or_else(|p| p.into_inner())
        .insert(key, font_ref);
    Some(font_ref)
}

fn load_font_file(path: &Path) -> Option<Font<'static>> {
    let bytes = fs::read(path).ok()?;
    debug!("Loaded font file {}", path.display());
    Font::try_from_vec(bytes)
}

fn load_font_from_system(name: &str) -> Option<Font<'static>> {
    // "Freeman-Regular.TTF" is looked up as the family "Freeman"
    let stem = Path::new(name)
        .file_stem()
        .and_then(|s| s.to_str())
        .unwrap_or(name);
    let family = stem.split('-').next().unwrap_or(stem).trim();

    let families: Vec<Family<'_>> = match family {
        "" | "Sans" => vec![Family::SansSerif],
        "Serif" => vec![Family::Serif],
        "Monospace" => vec![Family::Monospace],
        other => vec![Family::Name(other)],
    };

    let query = Query {
        families: &families,
        weight: Weight::NORMAL,
        stretch: Stretch::Normal,
        style: Style::Normal,
    };

    let id = db().query(&query)?;
    let face = db().face(id)?;

    match &face.source {
        fontdb::Source::File(path) => load_font_file(path),
        fontdb::Source::SharedFile(path, _) => load_font_file(path),
        fontdb::Source::Binary(bytes) => Font::try_from_vec(bytes.as_ref().as_ref().to_vec()),
    }
}
