use nom_exif::*;
use std::path::Path;

use crate::error::{Result, StampError};

/// The stamped fields as read back from an image.
#[derive(Debug, Clone, Default, PartialEq)]
pub struct ExifData {
    pub date_time_original: Option<String>,
    pub has_gps: bool,
    pub gps_latitude: Option<f64>,
    pub gps_latitude_ref: Option<char>,
    pub gps_longitude: Option<f64>,
    pub gps_longitude_ref: Option<char>,
}

/// Read the capture time and GPS position from an image file.
///
/// A file without any EXIF yields [`ExifData::default`].
pub fn read_exif(path: &Path) -> Result<ExifData> {
    let mut parser = MediaParser::new();
    let ms = MediaSource::file_path(path).map_err(|e| StampError::Extract {
        path: path.to_path_buf(),
        message: e.to_string(),
    })?;

    let iter: ExifIter = match parser.parse(ms) {
        Ok(iter) => iter,
        Err(_) => {
            log::debug!("No EXIF data found in {}", path.display());
            return Ok(ExifData::default());
        }
    };

    // Parse GPS info before converting to Exif (consumes the iterator)
    let gps_info = iter.parse_gps_info().ok().flatten();
    let exif: Exif = iter.into();

    let mut data = ExifData::default();

    if let Some(val) = exif.get(ExifTag::DateTimeOriginal) {
        data.date_time_original = entry_to_string(val);
    }

    if let Some(gps) = gps_info {
        data.has_gps = true;
        data.gps_latitude = Some(latlng_to_decimal(&gps.latitude, gps.latitude_ref));
        data.gps_latitude_ref = Some(gps.latitude_ref);
        data.gps_longitude = Some(latlng_to_decimal(&gps.longitude, gps.longitude_ref));
        data.gps_longitude_ref = Some(gps.longitude_ref);
    }

    Ok(data)
}

fn entry_to_string(val: &EntryValue) -> Option<String> {
    let s = val.to_string();
    let s = s.trim().trim_matches('"').to_string();
    if s.is_empty() { None } else { Some(s) }
}

/// Convert a nom-exif LatLng (3 URationals: deg, min, sec) to decimal degrees.
fn latlng_to_decimal(latlng: &LatLng, reference: char) -> f64 {
    let degrees = latlng.0.0 as f64 / latlng.0.1 as f64;
    let minutes = latlng.1.0 as f64 / latlng.1.1 as f64;
    let seconds = latlng.2.0 as f64 / latlng.2.1 as f64;

    let coord = degrees + minutes / 60.0 + seconds / 3600.0;

    if reference == 'S' || reference == 'W' {
        -coord
    } else {
        coord
    }
}
