//! Error handling for the Dragon overlay
//!
//! Provides the error types shared by all crates:
//! - Color errors (parsing `#RRGGBB` strings)
//! - Asset errors (fonts, images and animations that fail to load)
//! - Record errors (malformed persisted objects)
//!
//! All error types use `thiserror` for ergonomic error handling.

use thiserror::Error;

/// Color parsing error type
///
/// Returned by the color utilities. Callers are expected to substitute a
/// default color instead of propagating this further.
#[derive(Error, Debug, Clone, PartialEq, Eq)]
pub enum ColorError {
    /// The string is not of the form `#RRGGBB`
    #[error("Invalid hex color format: {0}")]
    InvalidHex(String),

    /// A packed integer color does not fit in 24 bits
    #[error("Color integer out of RGB bounds: {0:#X}")]
    OutOfRange(u32),
}

/// Asset error type
///
/// Represents a font, image or animation that could not be turned into a
/// bitmap. The owning object becomes permanently inert.
#[derive(Error, Debug, Clone)]
pub enum AssetError {
    /// The file does not exist or could not be read
    #[error("Cannot read \"{path}\": {reason}")]
    Unreadable {
        /// The file that was requested.
        path: String,
        /// The underlying I/O failure.
        reason: String,
    },

    /// The file was read but its contents could not be decoded
    #[error("Cannot decode \"{path}\": {reason}")]
    Undecodable {
        /// The file that was requested.
        path: String,
        /// The decoder's complaint.
        reason: String,
    },

    /// No font matched the requested name
    #[error("Font not found: {name}")]
    FontNotFound {
        /// The requested font name.
        name: String,
    },

    /// Rendering produced no pixels (empty text, zero-sized image)
    #[error("Nothing to render for {what}")]
    Empty {
        /// What was being rendered.
        what: String,
    },
}

/// Persisted record error type
#[derive(Error, Debug, Clone)]
pub enum RecordError {
    /// The record has no usable `type` discriminator
    #[error("Record has no type")]
    MissingType,

    /// The discriminator names an object kind this build does not know
    #[error("Unknown object type: {0}")]
    UnknownType(String),

    /// A field is missing or has the wrong shape
    #[error("Malformed {kind} record: {reason}")]
    Malformed {
        /// The object kind being read.
        kind: String,
        /// What was wrong.
        reason: String,
    },
}

/// Main error type
///
/// Aggregates the domain errors so callers can use a single `Result`.
#[derive(Error, Debug)]
pub enum Error {
    /// Color error
    #[error(transparent)]
    Color(#[from] ColorError),

    /// Asset error
    #[error(transparent)]
    Asset(#[from] AssetError),

    /// Record error
    #[error(transparent)]
    Record(#[from] RecordError),

    /// I/O error
    #[error("I/O error: {0}")]
    Io(#[from] std::io::Error),

    /// JSON error
    #[error("JSON error: {0}")]
    Json(#[from] serde_json::Error),

    /// Generic error
    #[error("{0}")]
    Other(String),
}

impl Error {
    /// Create a generic error with a message
    pub fn other(msg: impl Into<String>) -> Self {
        Error::Other(msg.into())
    }
}

/// Result type using the main Error type
pub type Result<T> = std::result::Result<T, Error>;
