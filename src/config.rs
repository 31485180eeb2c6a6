use chrono::{DateTime, Utc};

use crate::error::{Result, StampError};
use crate::exif::{GpsDegrees, Rational};

/// Capture time written into every file, RFC 3339.
pub const CAPTURED_AT: &str = "2023-03-17T12:00:00Z";

/// Value of the `ProcessingSoftware` marker seeded into files that had no
/// EXIF block.
pub const PROCESSING_SOFTWARE: &str = "github.com/haikoschol/check-exif";

/// EXIF canonical timestamp layout (`DateTimeOriginal` and friends).
pub const EXIF_TIMESTAMP_FORMAT: &str = "%Y:%m:%d %H:%M:%S";

/// The values stamped into each image.
///
/// There is no configuration file or command line: the binary always uses
/// [`Stamp::fixed`]. [`Stamp::new`] exists so other values can be stamped
/// from library code.
///
/// # Example
///
/// ```rust
/// use exif_stamp::config::Stamp;
///
/// let stamp = Stamp::fixed().unwrap();
/// assert_eq!(stamp.exif_timestamp(), "2023:03:17 12:00:00");
/// assert_eq!(stamp.latitude.orientation.as_char(), 'S');
/// ```
#[derive(Debug, Clone, PartialEq)]
pub struct Stamp {
    /// Written to `DateTimeOriginal`.
    pub captured_at: DateTime<Utc>,
    /// Written to `ProcessingSoftware` when a fresh EXIF block is created.
    pub processing_software: String,
    /// `GPSLatitude` + `GPSLatitudeRef`.
    pub latitude: GpsDegrees,
    /// `GPSLongitude` + `GPSLongitudeRef`.
    pub longitude: GpsDegrees,
}

impl Stamp {
    /// The literal capture time and position: 2023-03-17 12:00 UTC at
    /// 8°28'44" S, 115°26'17" E.
    pub fn fixed() -> Result<Self> {
        let captured_at = parse_timestamp(CAPTURED_AT)?;

        let latitude = GpsDegrees::from_rationals(
            'S',
            [Rational::whole(8), Rational::whole(28), Rational::whole(44)],
        )?;
        let longitude = GpsDegrees::from_rationals(
            'E',
            [Rational::whole(115), Rational::whole(26), Rational::whole(17)],
        )?;

        Self::new(captured_at, PROCESSING_SOFTWARE, latitude, longitude)
    }

    /// Build a stamp from custom values. The latitude must lie north or
    /// south, the longitude east or west.
    pub fn new(
        captured_at: DateTime<Utc>,
        processing_software: impl Into<String>,
        latitude: GpsDegrees,
        longitude: GpsDegrees,
    ) -> Result<Self> {
        if !latitude.orientation.is_latitude() {
            return Err(StampError::Coordinate(format!(
                "latitude reference must be N or S, got {}",
                latitude.orientation
            )));
        }
        if !longitude.orientation.is_longitude() {
            return Err(StampError::Coordinate(format!(
                "longitude reference must be E or W, got {}",
                longitude.orientation
            )));
        }

        Ok(Self {
            captured_at,
            processing_software: processing_software.into(),
            latitude,
            longitude,
        })
    }

    /// The capture time as EXIF writes it, e.g. `2023:03:17 12:00:00`.
    pub fn exif_timestamp(&self) -> String {
        self.captured_at.format(EXIF_TIMESTAMP_FORMAT).to_string()
    }
}

/// Parse an RFC 3339 timestamp into UTC.
pub fn parse_timestamp(value: &str) -> Result<DateTime<Utc>> {
    DateTime::parse_from_rfc3339(value)
        .map(|t| t.with_timezone(&Utc))
        .map_err(|source| StampError::Timestamp {
            value: value.to_string(),
            source,
        })
}
