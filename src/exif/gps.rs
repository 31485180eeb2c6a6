use std::fmt;

use little_exif::rational::uR64;

use crate::error::{Result, StampError};

/// An unsigned EXIF rational (`RATIONAL`, two u32 values).
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct Rational {
    pub numerator: u32,
    pub denominator: u32,
}

impl Rational {
    pub const fn new(numerator: u32, denominator: u32) -> Self {
        Self { numerator, denominator }
    }

    /// A whole number over 1.
    pub const fn whole(value: u32) -> Self {
        Self::new(value, 1)
    }

    pub fn to_f64(self) -> f64 {
        self.numerator as f64 / self.denominator as f64
    }
}

/// Compass half a coordinate lies in, as written to `GPSLatitudeRef` /
/// `GPSLongitudeRef`.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Hemisphere {
    North,
    South,
    East,
    West,
}

impl Hemisphere {
    pub fn from_char(c: char) -> Option<Self> {
        match c.to_ascii_uppercase() {
            'N' => Some(Self::North),
            'S' => Some(Self::South),
            'E' => Some(Self::East),
            'W' => Some(Self::West),
            _ => None,
        }
    }

    pub fn as_char(self) -> char {
        match self {
            Self::North => 'N',
            Self::South => 'S',
            Self::East => 'E',
            Self::West => 'W',
        }
    }

    pub fn is_latitude(self) -> bool {
        matches!(self, Self::North | Self::South)
    }

    pub fn is_longitude(self) -> bool {
        matches!(self, Self::East | Self::West)
    }

    /// Sign applied to the decimal form of a coordinate in this hemisphere.
    fn sign(self) -> f64 {
        match self {
            Self::South | Self::West => -1.0,
            Self::North | Self::East => 1.0,
        }
    }
}

impl fmt::Display for Hemisphere {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{}", self.as_char())
    }
}

/// One GPS coordinate as EXIF stores it: degrees, minutes and seconds
/// rationals plus the hemisphere reference.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct GpsDegrees {
    pub orientation: Hemisphere,
    pub degrees: Rational,
    pub minutes: Rational,
    pub seconds: Rational,
}

impl GpsDegrees {
    /// Build a coordinate from a hemisphere letter and a
    /// degrees/minutes/seconds triple.
    pub fn from_rationals(orientation: char, dms: [Rational; 3]) -> Result<Self> {
        let orientation = Hemisphere::from_char(orientation).ok_or_else(|| {
            StampError::Coordinate(format!("unknown hemisphere {orientation:?}"))
        })?;

        if let Some(zero) = dms.iter().find(|r| r.denominator == 0) {
            return Err(StampError::Coordinate(format!(
                "zero denominator in {}/{}",
                zero.numerator, zero.denominator
            )));
        }

        let [degrees, minutes, seconds] = dms;
        Ok(Self {
            orientation,
            degrees,
            minutes,
            seconds,
        })
    }

    /// The `RATIONAL[3]` value of `GPSLatitude` / `GPSLongitude`.
    pub fn exif_rationals(&self) -> Vec<uR64> {
        [self.degrees, self.minutes, self.seconds]
            .into_iter()
            .map(|r| uR64 {
                nominator: r.numerator,
                denominator: r.denominator,
            })
            .collect()
    }

    /// The one-letter `GPSLatitudeRef` / `GPSLongitudeRef` value.
    pub fn exif_ref(&self) -> String {
        self.orientation.to_string()
    }

    /// Signed decimal degrees (negative south and west).
    pub fn decimal(&self) -> f64 {
        let value =
            self.degrees.to_f64() + self.minutes.to_f64() / 60.0 + self.seconds.to_f64() / 3600.0;
        value * self.orientation.sign()
    }
}

impl fmt::Display for GpsDegrees {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(
            f,
            "{}°{}'{}\" {}",
            self.degrees.to_f64(),
            self.minutes.to_f64(),
            self.seconds.to_f64(),
            self.orientation
        )
    }
}
