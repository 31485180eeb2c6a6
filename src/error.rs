//! Error types for stamping metadata into images.
//!
//! Each variant names the step that failed and carries the file (or
//! directory) it failed on, so a single log line is enough to tell which
//! phase of the edit went wrong.

use std::path::PathBuf;
use thiserror::Error;

/// Errors raised while preparing the stamp values or editing a file.
#[derive(Error, Debug)]
pub enum StampError {
    /// The literal capture time could not be parsed.
    #[error("Invalid timestamp {value:?}: {source}")]
    Timestamp {
        value: String,
        source: chrono::ParseError,
    },

    /// A GPS coordinate has an invalid hemisphere or rational.
    #[error("Invalid GPS coordinate: {0}")]
    Coordinate(String),

    /// The directory could not be listed.
    #[error("Failed to list directory {path}: {source}")]
    ListDir {
        path: PathBuf,
        source: walkdir::Error,
    },

    /// The image file could not be read.
    #[error("Failed to read {path}: {source}")]
    Read {
        path: PathBuf,
        source: std::io::Error,
    },

    /// The file is not a well-formed JPEG.
    #[error("Failed to parse JPEG {path}: {message}")]
    Parse { path: PathBuf, message: String },

    /// The metadata directory serialized to an unusable EXIF block.
    #[error("Failed to encode EXIF for {path}: {message}")]
    Encode { path: PathBuf, message: String },

    /// Writing the JPEG back to disk failed.
    #[error("Failed to write {path}: {source}")]
    Write {
        path: PathBuf,
        source: std::io::Error,
    },

    /// The metadata written in the first phase could not be read back.
    #[error("Failed to extract EXIF from {path}: {message}")]
    Extract { path: PathBuf, message: String },
}

impl StampError {
    /// Short name of the step that failed.
    pub fn step(&self) -> &'static str {
        match self {
            Self::Timestamp { .. } => "parse timestamp",
            Self::Coordinate(_) => "build coordinate",
            Self::ListDir { .. } => "list directory",
            Self::Read { .. } => "read file",
            Self::Parse { .. } => "parse jpeg",
            Self::Encode { .. } => "encode exif",
            Self::Write { .. } => "write jpeg",
            Self::Extract { .. } => "extract exif",
        }
    }
}

/// Convenience alias for results carrying a [`StampError`].
pub type Result<T> = std::result::Result<T, StampError>;
