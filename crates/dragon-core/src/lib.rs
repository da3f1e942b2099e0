//! # Dragon Core
//!
//! Core types shared by the overlay crates: transform and hit-test
//! primitives, colors, the input event model and the error types.

pub mod color;
pub mod error;
pub mod geometry;
pub mod input;

pub use color::{color_from_key, color_or, ColorValue, Rgb, Rgba};
pub use error::{AssetError, ColorError, Error, RecordError, Result};
pub use geometry::{rotate_point, round_to_precision, Extent, IntRect, Placement, Point, Rect};
pub use input::{
    CursorStyle, EventResponse, InputEvent, Key, Modifiers, MouseButton, UpdateLevel,
};
