//! # Dragon Scene
//!
//! The scene and animation engine of the Dragon overlay: the screen objects
//! the user arranges on the desktop, the animated GIF compositor and the
//! hatch-line background generator.
//!
//! ## Core Components
//!
//! - **Objects**: Signature text, static images, animated GIFs and the
//!   line layer, all behind the [`ScreenObject`] contract
//! - **Animation**: Indexed-frame decoding, disposal and per-frame caching
//! - **Hatch**: Clipped parallel line families, solid or dashed
//! - **Scene**: Z-ordered dispatch with mouse capture, timers and
//!   persistence records
//!
//! ## Architecture
//!
//! ```text
//! Scene (dispatch, timers, records)
//!   ├── Signature ── AssetLoader::render_text
//!   ├── ImageObject ── AssetLoader::load_image
//!   ├── AnimatedGif ── FramePlayer ── AssetLoader::load_gif
//!   └── LinePattern ── hatch
//!
//! Surface (PixmapSurface: tiny-skia)
//! ```
//!
//! ## Usage
//!
//! ```rust,ignore
//! use dragon_core::IntRect;
//! use dragon_scene::{FsAssetLoader, PixmapSurface, Scene};
//!
//! let mut scene = Scene::new(IntRect::new(0, 0, 800, 600), Box::new(FsAssetLoader::new()));
//! scene.load_records(&records, 0);
//! let mut surface = PixmapSurface::new(800, 600).unwrap();
//! scene.draw(&mut surface);
//! ```

pub mod animation;
pub mod assets;
pub mod bitmap;
pub mod font_manager;
pub mod hatch;
pub mod objects;
pub mod record;
pub mod scene;
pub mod surface;

pub use animation::{
    decode_gif, decode_gif_file, Disposal, FramePlayer, FrameRecord, GifAnimation, GifFrame,
    DEFAULT_FRAME_DELAY_MS,
};
pub use assets::{AssetLoader, FsAssetLoader, TextRequest};
pub use bitmap::{RenderedBitmap, HIT_ALPHA_THRESHOLD};
pub use hatch::{hatch_segments, HatchStyle, Segment};
pub use objects::{
    effective_alpha, AnimatedGif, Animated, DrawParams, ImageObject, ImageSource, Interaction,
    LinePattern, ObjectBase, ObjectId, SceneObject, ScreenObject, Signature,
};
pub use record::{ImageRecord, LinesRecord, ObjectRecord, PoseRecord, SignatureRecord};
pub use scene::{coalesce_motion, DefaultObjects, Scene, TextDefaults, TickOutcome, LINES_ID};
pub use surface::{PixmapSurface, Surface, Texture, TextureQuad};
