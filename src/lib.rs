//! # exif-stamp
//!
//! Stamp a fixed capture time and GPS position into the EXIF metadata of
//! every JPEG in a directory.
//!
//! Each image gets `DateTimeOriginal = 2023:03:17 12:00:00` and a GPS
//! position of 8°28'44" S, 115°26'17" E. Images without an EXIF block get a
//! new one, marked with a `ProcessingSoftware` tag.
//!
//! ## Quick Start
//!
//! ```rust,no_run
//! use exif_stamp::config::Stamp;
//! use exif_stamp::pipeline::stamp_directory;
//!
//! fn main() -> anyhow::Result<()> {
//!     let stamp = Stamp::fixed()?;
//!     let cwd = std::env::current_dir()?;
//!
//!     for result in stamp_directory(&cwd, &stamp)? {
//!         if let Some(ref err) = result.error {
//!             eprintln!("Error processing {}: {err}", result.path.display());
//!         }
//!     }
//!     Ok(())
//! }
//! ```
//!
//! ## Lower-Level Usage
//!
//! ```rust,no_run
//! use exif_stamp::config::Stamp;
//! use exif_stamp::exif::{read_exif, stamp_file};
//! use std::path::Path;
//!
//! fn main() -> anyhow::Result<()> {
//!     let path = Path::new("photo.jpg");
//!     stamp_file(path, &Stamp::fixed()?)?;
//!
//!     let data = read_exif(path)?;
//!     println!("GPS: {:?}, {:?}", data.gps_latitude, data.gps_longitude);
//!     Ok(())
//! }
//! ```
//!
//! ## Modules
//!
//! - [`config`] — the values stamped into each file
//! - [`error`] — error type naming the failing step
//! - [`exif`] — EXIF reading and writing
//! - [`pipeline`] — file filtering, directory listing and the per-file driver

pub mod config;
pub mod error;
pub mod exif;
pub mod pipeline;
