//! EXIF reading and writing.
//!
//! - [`stamp_file`] — write the capture time and GPS position into a JPEG
//! - [`read_exif`] — read those fields back
//!
//! The JPEG container is handled by `img-parts`, the EXIF directories by
//! `little_exif` (write) and `nom-exif` (read).

mod gps;
mod reader;
mod writer;

pub use gps::{GpsDegrees, Hemisphere, Rational};
pub use reader::{ExifData, read_exif};
pub use writer::stamp_file;
