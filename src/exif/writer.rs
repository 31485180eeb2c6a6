use img_parts::jpeg::{Jpeg, JpegSegment};
use img_parts::{Bytes, ImageEXIF};
use little_exif::exif_tag::ExifTag;
use little_exif::filetype::FileExtension;
use little_exif::ifd::ExifTagGroup;
use little_exif::metadata::Metadata;
use std::cell::Cell;
use std::fs::OpenOptions;
use std::io::Write;
use std::path::Path;
use std::sync::Once;

use super::gps::GpsDegrees;
use crate::config::Stamp;
use crate::error::{Result, StampError};

// IFD0 tag with no typed little_exif variant
const TAG_PROCESSING_SOFTWARE: u16 = 0x000B;

// little_exif as_u8_vec(JPEG) returns: [APP1 marker 2B][length 2B][Exif\0\0 6B][TIFF data]
// An img-parts APP1 segment holds everything after the length field.
const JPEG_SEGMENT_HEADER: usize = 4;
const JPEG_EXIF_OVERHEAD: usize = JPEG_SEGMENT_HEADER + EXIF_PREFIX.len();

const EXIF_PREFIX: &[u8] = b"Exif\0\0";
const MARKER_APP1: u8 = 0xE1;

thread_local! {
    static QUIET_PANICS: Cell<bool> = const { Cell::new(false) };
}
static PANIC_HOOK: Once = Once::new();

/// Stamp the capture time and GPS position into one JPEG, in place.
///
/// Two phases, each ending with a full rewrite of the file:
/// 1. Load (or create) the EXIF block and set `DateTimeOriginal`.
/// 2. Re-read the EXIF block from disk and set the four GPS fields.
///
/// A file whose EXIF block is missing gets a fresh one seeded with the
/// `ProcessingSoftware` marker. Tags the stamp does not touch, in any IFD,
/// are carried over. Any failure stops processing of this file; nothing is
/// rolled back.
pub fn stamp_file(path: &Path, stamp: &Stamp) -> Result<()> {
    stamp_timestamp(path, stamp)?;
    stamp_location(path, stamp)?;
    Ok(())
}

/// Phase 1: `DateTimeOriginal`.
fn stamp_timestamp(path: &Path, stamp: &Stamp) -> Result<()> {
    let file_bytes = read_file(path)?;
    let mut jpeg = parse_jpeg(path, &file_bytes)?;

    let mut metadata = get_or_create_metadata(path, &file_bytes, &jpeg, stamp);
    metadata.set_tag(ExifTag::DateTimeOriginal(stamp.exif_timestamp()));
    log::debug!("  DateTimeOriginal: {}", stamp.exif_timestamp());

    set_exif(path, &mut jpeg, &metadata)?;
    write_jpeg(path, jpeg)
}

/// Phase 2: GPS latitude/longitude and their references.
fn stamp_location(path: &Path, stamp: &Stamp) -> Result<()> {
    // Derived from what phase 1 put on disk, not from its in-memory state.
    let file_bytes = read_file(path)?;
    let mut jpeg = parse_jpeg(path, &file_bytes)?;

    let mut metadata = read_metadata(&file_bytes).map_err(|message| StampError::Extract {
        path: path.to_path_buf(),
        message,
    })?;

    for tag in gps_tags(&stamp.latitude, &stamp.longitude) {
        metadata.set_tag(tag);
    }
    log::debug!("  GPS: {}, {}", stamp.latitude, stamp.longitude);

    set_exif(path, &mut jpeg, &metadata)?;
    write_jpeg(path, jpeg)
}

fn read_file(path: &Path) -> Result<Vec<u8>> {
    std::fs::read(path).map_err(|source| StampError::Read {
        path: path.to_path_buf(),
        source,
    })
}

/// Split the file into JPEG segments.
fn parse_jpeg(path: &Path, file_bytes: &[u8]) -> Result<Jpeg> {
    Jpeg::from_bytes(Bytes::copy_from_slice(file_bytes)).map_err(|e| StampError::Parse {
        path: path.to_path_buf(),
        message: e.to_string(),
    })
}

/// Serialize the segments back over the file: truncate, then write.
fn write_jpeg(path: &Path, jpeg: Jpeg) -> Result<()> {
    let output = jpeg.encoder().bytes();

    let mut options = OpenOptions::new();
    options.write(true).create(true).truncate(true);
    #[cfg(unix)]
    {
        use std::os::unix::fs::OpenOptionsExt;
        options.mode(0o755);
    }

    let to_write_error = |source| StampError::Write {
        path: path.to_path_buf(),
        source,
    };
    let mut file = options.open(path).map_err(to_write_error)?;
    file.write_all(&output).map_err(to_write_error)?;
    file.flush().map_err(to_write_error)?;

    log::debug!("Wrote {} bytes to {}", output.len(), path.display());
    Ok(())
}

/// Use the file's existing EXIF block, or start a fresh one carrying only the
/// processing-software marker.
#[allow(clippy::ptr_arg)]
fn get_or_create_metadata(
    path: &Path,
    file_bytes: &Vec<u8>,
    jpeg: &Jpeg,
    stamp: &Stamp,
) -> Metadata {
    if jpeg.exif().is_some() {
        match read_metadata(file_bytes) {
            Ok(metadata) => return metadata,
            Err(e) => log::warn!(
                "Replacing unreadable EXIF block in {}: {e}",
                path.display()
            ),
        }
    } else {
        log::debug!("No EXIF block in {}, creating one", path.display());
    }

    let mut metadata = Metadata::new();
    metadata.set_tag(ExifTag::UnknownSTRING(
        stamp.processing_software.clone(),
        TAG_PROCESSING_SOFTWARE,
        ExifTagGroup::GENERIC,
    ));
    metadata
}

/// Load EXIF metadata from the bytes of a whole JPEG file using little_exif.
///
/// little_exif can panic on malformed input; a panic is reported as an
/// ordinary load failure. A block with no tags counts as missing.
#[allow(clippy::ptr_arg)]
fn read_metadata(file_bytes: &Vec<u8>) -> std::result::Result<Metadata, String> {
    install_quiet_panic_hook();
    QUIET_PANICS.with(|quiet| quiet.set(true));
    let result =
        std::panic::catch_unwind(|| Metadata::new_from_vec(file_bytes, FileExtension::JPEG));
    QUIET_PANICS.with(|quiet| quiet.set(false));

    match result {
        Ok(Ok(m)) => {
            let tag_count = (&m).into_iter().count();
            if tag_count == 0 {
                Err("little_exif loaded empty metadata".to_string())
            } else {
                log::debug!("little_exif loaded {tag_count} existing EXIF tags");
                Ok(m)
            }
        }
        Ok(Err(e)) => Err(format!("little_exif could not parse EXIF: {e}")),
        Err(_) => Err("little_exif panicked parsing EXIF".to_string()),
    }
}

/// Install a process-wide panic hook, once, that stays silent while the
/// current thread is inside `read_metadata` and defers to the previous hook
/// everywhere else. Swapping hooks per call would race with other threads.
fn install_quiet_panic_hook() {
    PANIC_HOOK.call_once(|| {
        let previous = std::panic::take_hook();
        std::panic::set_hook(Box::new(move |info| {
            if !QUIET_PANICS.with(Cell::get) {
                previous(info);
            }
        }));
    });
}

/// Replace the EXIF APP1 segment with the serialized metadata.
fn set_exif(path: &Path, jpeg: &mut Jpeg, metadata: &Metadata) -> Result<()> {
    let exif_bytes = metadata
        .as_u8_vec(FileExtension::JPEG)
        .map_err(|e| StampError::Encode {
            path: path.to_path_buf(),
            message: e.to_string(),
        })?;
    if exif_bytes.len() <= JPEG_EXIF_OVERHEAD {
        return Err(StampError::Encode {
            path: path.to_path_buf(),
            message: format!("EXIF block is only {} bytes", exif_bytes.len()),
        });
    }
    let contents = Bytes::copy_from_slice(&exif_bytes[JPEG_SEGMENT_HEADER..]);

    // Keep the EXIF segment where it was, or put it right after APP0 for a
    // new block. img-parts' own set_exif() always inserts at index 3, which
    // lands after other APP segments and panics on very short files.
    let segments = jpeg.segments_mut();
    let target_pos = find_exif_segment_pos(segments).unwrap_or(1);
    segments.retain(|s| !is_exif_segment(s));
    let target_pos = target_pos.min(segments.len());
    segments.insert(target_pos, JpegSegment::new_with_contents(MARKER_APP1, contents));

    Ok(())
}

fn is_exif_segment(segment: &JpegSegment) -> bool {
    segment.marker() == MARKER_APP1 && segment.contents().starts_with(EXIF_PREFIX)
}

/// Position of the EXIF APP1 segment (marker 0xE1, contents `Exif\0\0...`).
fn find_exif_segment_pos(segments: &[JpegSegment]) -> Option<usize> {
    segments.iter().position(is_exif_segment)
}

/// The four GPS IFD tags for a latitude/longitude pair.
fn gps_tags(lat: &GpsDegrees, lon: &GpsDegrees) -> Vec<ExifTag> {
    vec![
        ExifTag::GPSLatitudeRef(lat.exif_ref()),
        ExifTag::GPSLatitude(lat.exif_rationals()),
        ExifTag::GPSLongitudeRef(lon.exif_ref()),
        ExifTag::GPSLongitude(lon.exif_rationals()),
    ]
}
