use std::path::{Path, PathBuf};
use walkdir::WalkDir;

use crate::config::Stamp;
use crate::error::{Result, StampError};
use crate::exif::{self, stamp_file};

/// Supported image suffixes, matched case-insensitively on the file name.
const IMAGE_SUFFIXES: &[&str] = &[".jpg", ".jpeg"];

/// Outcome of stamping a single image.
#[derive(Debug)]
pub struct ProcessResult {
    pub path: PathBuf,
    /// `None` when both phases were written.
    pub error: Option<String>,
}

/// Check whether a directory entry name denotes a supported image.
///
/// ```rust
/// use exif_stamp::pipeline::is_supported_media;
///
/// assert!(is_supported_media("IMG_01.JPG"));
/// assert!(is_supported_media("photo.jpeg"));
/// assert!(!is_supported_media("notes.txt"));
/// ```
pub fn is_supported_media(name: &str) -> bool {
    let name = name.to_lowercase();
    IMAGE_SUFFIXES.iter().any(|suffix| name.ends_with(suffix))
}

/// List the supported images directly inside `dir`.
///
/// Not recursive. Entries come back sorted by file name; directories (and
/// links to directories) and unsupported names are skipped.
///
/// Failing to open `dir` itself aborts the listing. An entry that cannot be
/// read is logged and skipped. Symlinks are listed as-is, so a dangling link
/// with a supported name fails later, when the file is stamped.
pub fn collect_images(dir: &Path) -> Result<Vec<PathBuf>> {
    let mut images = Vec::new();

    for entry in WalkDir::new(dir).min_depth(1).max_depth(1).sort_by_file_name() {
        let entry = match entry {
            Ok(entry) => entry,
            Err(source) if source.depth() == 0 => {
                return Err(StampError::ListDir {
                    path: dir.to_path_buf(),
                    source,
                });
            }
            Err(e) => {
                log::warn!("Skipping unreadable entry in {}: {e}", dir.display());
                continue;
            }
        };

        // Follows the link, unlike `entry.file_type()`.
        if entry.path().is_dir() {
            continue;
        }
        if !is_supported_media(&entry.file_name().to_string_lossy()) {
            continue;
        }
        images.push(entry.into_path());
    }

    Ok(images)
}

/// Stamp one image, logging the outcome.
pub fn process_image(path: &Path, stamp: &Stamp) -> ProcessResult {
    let error = match stamp_file(path, stamp) {
        Ok(()) => {
            log::info!("Stamped {}", path.display());
            if log::log_enabled!(log::Level::Debug) {
                match exif::read_exif(path) {
                    Ok(data) => log::debug!("  Read back: {data:?}"),
                    Err(e) => log::debug!("  Read back failed: {e}"),
                }
            }
            None
        }
        Err(e) => {
            log::error!("stamp_file() [{}]: {e}", e.step());
            Some(e.to_string())
        }
    };

    ProcessResult {
        path: path.to_path_buf(),
        error,
    }
}

/// Stamp every supported image directly inside `dir`.
///
/// The directory is listed in full before any file is touched, so a listing
/// failure leaves everything as it was. Per-file failures are logged and do
/// not stop the run.
///
/// ```rust,no_run
/// use exif_stamp::config::Stamp;
/// use exif_stamp::pipeline::stamp_directory;
///
/// let stamp = Stamp::fixed().unwrap();
/// let results = stamp_directory("./photos".as_ref(), &stamp).unwrap();
/// for r in results.iter().filter(|r| r.error.is_some()) {
///     eprintln!("skipped {}", r.path.display());
/// }
/// ```
pub fn stamp_directory(dir: &Path, stamp: &Stamp) -> Result<Vec<ProcessResult>> {
    let images = collect_images(dir)?;
    log::debug!("Found {} image(s) in {}", images.len(), dir.display());

    Ok(images
        .iter()
        .map(|path| process_image(path, stamp))
        .collect())
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::cell::RefCell;
    use std::fs;
    use std::sync::Once;
    use tempfile::TempDir;

    fn write_test_jpeg(path: &Path) {
        image::RgbImage::from_pixel(8, 8, image::Rgb([200, 10, 10]))
            .save_with_format(path, image::ImageFormat::Jpeg)
            .unwrap();
    }

    // Records this crate's log lines per thread, so parallel tests don't
    // see each other's output.
    struct CaptureLogger;

    thread_local! {
        static CAPTURED: RefCell<Vec<(log::Level, String)>> = const { RefCell::new(Vec::new()) };
    }

    impl log::Log for CaptureLogger {
        fn enabled(&self, metadata: &log::Metadata) -> bool {
            metadata.target().starts_with("exif_stamp")
        }

        fn log(&self, record: &log::Record) {
            if self.enabled(record.metadata()) {
                CAPTURED.with(|c| c.borrow_mut().push((record.level(), record.args().to_string())));
            }
        }

        fn flush(&self) {}
    }

    static LOGGER: CaptureLogger = CaptureLogger;
    static INIT_LOGGER: Once = Once::new();

    fn capture_logs<T>(f: impl FnOnce() -> T) -> (T, Vec<(log::Level, String)>) {
        INIT_LOGGER.call_once(|| {
            log::set_logger(&LOGGER).unwrap();
            log::set_max_level(log::LevelFilter::Info);
        });
        CAPTURED.with(|c| c.borrow_mut().clear());
        let out = f();
        (out, CAPTURED.with(|c| c.borrow_mut().drain(..).collect()))
    }

    fn lines_at(logs: &[(log::Level, String)], level: log::Level) -> Vec<&str> {
        logs.iter()
            .filter(|(l, _)| *l == level)
            .map(|(_, msg)| msg.as_str())
            .collect()
    }

    // ── is_supported_media ───────────────────────────────────────────

    #[test]
    fn supported_media_names() {
        assert!(is_supported_media("IMG_01.JPG"));
        assert!(is_supported_media("photo.jpeg"));
        assert!(is_supported_media("photo.JpEg"));
        assert!(is_supported_media("archive.tar.jpg"));
        assert!(is_supported_media(".jpg"));
    }

    #[test]
    fn unsupported_media_names() {
        assert!(!is_supported_media("notes.txt"));
        assert!(!is_supported_media("image.png"));
        assert!(!is_supported_media("noext"));
        assert!(!is_supported_media("jpg"));
        assert!(!is_supported_media("photo.jpg.bak"));
    }

    // ── collect_images ───────────────────────────────────────────────

    #[test]
    fn collect_images_filters_and_sorts() {
        let dir = TempDir::new().unwrap();
        fs::write(dir.path().join("b.JPG"), b"fake").unwrap();
        fs::write(dir.path().join("a.jpeg"), b"fake").unwrap();
        fs::write(dir.path().join("c.png"), b"fake").unwrap();
        fs::write(dir.path().join("readme.txt"), b"fake").unwrap();

        let images = collect_images(dir.path()).unwrap();
        let names: Vec<_> = images
            .iter()
            .map(|p| p.file_name().unwrap().to_string_lossy().into_owned())
            .collect();
        assert_eq!(names, vec!["a.jpeg", "b.JPG"]);
        assert!(images.iter().all(|p| p.starts_with(dir.path())));
    }

    #[test]
    fn collect_images_is_not_recursive() {
        let dir = TempDir::new().unwrap();
        let sub = dir.path().join("album.jpg");
        fs::create_dir(&sub).unwrap();
        fs::write(sub.join("inner.jpg"), b"fake").unwrap();

        let images = collect_images(dir.path()).unwrap();
        assert!(images.is_empty());
    }

    #[test]
    #[cfg(unix)]
    fn collect_images_skips_linked_directories() {
        let dir = TempDir::new().unwrap();
        let album = dir.path().join("album");
        fs::create_dir(&album).unwrap();
        std::os::unix::fs::symlink(&album, dir.path().join("album.jpg")).unwrap();

        assert!(collect_images(dir.path()).unwrap().is_empty());
    }

    #[test]
    #[cfg(unix)]
    fn collect_images_lists_dangling_links_without_failing() {
        let dir = TempDir::new().unwrap();
        std::os::unix::fs::symlink(dir.path().join("gone.txt"), dir.path().join("a.txt")).unwrap();
        std::os::unix::fs::symlink(dir.path().join("gone.jpg"), dir.path().join("b.jpg")).unwrap();
        fs::write(dir.path().join("c.jpg"), b"fake").unwrap();

        let images = collect_images(dir.path()).unwrap();
        let names: Vec<_> = images
            .iter()
            .map(|p| p.file_name().unwrap().to_string_lossy().into_owned())
            .collect();
        assert_eq!(names, vec!["b.jpg", "c.jpg"]);
    }

    #[test]
    fn collect_images_empty_dir() {
        let dir = TempDir::new().unwrap();
        assert!(collect_images(dir.path()).unwrap().is_empty());
    }

    #[test]
    fn collect_images_nonexistent_dir() {
        let dir = TempDir::new().unwrap();
        let err = collect_images(&dir.path().join("missing")).unwrap_err();
        assert!(matches!(err, StampError::ListDir { .. }));
    }

    // ── stamp_directory ──────────────────────────────────────────────

    #[test]
    fn stamp_directory_continues_after_failure() {
        let dir = TempDir::new().unwrap();
        fs::write(dir.path().join("a_broken.jpg"), b"not an image").unwrap();
        write_test_jpeg(&dir.path().join("b_good.jpg"));
        fs::write(dir.path().join("notes.txt"), b"keep me").unwrap();

        let (results, logs) =
            capture_logs(|| stamp_directory(dir.path(), &Stamp::fixed().unwrap()).unwrap());

        let errors = lines_at(&logs, log::Level::Error);
        assert_eq!(errors.len(), 1, "{logs:?}");
        assert!(errors[0].starts_with("stamp_file() [parse jpeg]"), "{}", errors[0]);
        assert!(errors[0].contains("a_broken.jpg"));
        let infos = lines_at(&logs, log::Level::Info);
        assert_eq!(infos.len(), 1, "{logs:?}");
        assert!(infos[0].contains("b_good.jpg"));

        assert_eq!(results.len(), 2);
        assert!(results[0].path.ends_with("a_broken.jpg"));
        assert!(results[0].error.is_some());
        assert!(results[1].path.ends_with("b_good.jpg"));
        assert!(results[1].error.is_none(), "{:?}", results[1].error);

        assert_eq!(fs::read(dir.path().join("a_broken.jpg")).unwrap(), b"not an image");
        assert_eq!(fs::read(dir.path().join("notes.txt")).unwrap(), b"keep me");
        assert!(exif::read_exif(&dir.path().join("b_good.jpg")).unwrap().has_gps);
    }

    #[test]
    #[cfg(unix)]
    fn stamp_directory_survives_dangling_links() {
        let dir = TempDir::new().unwrap();
        std::os::unix::fs::symlink(dir.path().join("gone.txt"), dir.path().join("a.txt")).unwrap();
        std::os::unix::fs::symlink(dir.path().join("gone.jpg"), dir.path().join("b.jpg")).unwrap();
        write_test_jpeg(&dir.path().join("c.jpg"));

        let (results, logs) =
            capture_logs(|| stamp_directory(dir.path(), &Stamp::fixed().unwrap()).unwrap());

        assert_eq!(results.len(), 2);
        assert!(results[0].path.ends_with("b.jpg"));
        assert!(results[0].error.is_some());
        assert!(results[1].error.is_none(), "{:?}", results[1].error);
        assert!(exif::read_exif(&dir.path().join("c.jpg")).unwrap().has_gps);

        let errors = lines_at(&logs, log::Level::Error);
        assert_eq!(errors.len(), 1, "{logs:?}");
        assert!(errors[0].starts_with("stamp_file() [read file]"), "{}", errors[0]);
    }

    #[test]
    fn stamp_directory_fails_before_touching_files() {
        let dir = TempDir::new().unwrap();
        let missing = dir.path().join("missing");

        let err = stamp_directory(&missing, &Stamp::fixed().unwrap()).unwrap_err();
        assert_eq!(err.step(), "list directory");
    }
}
