use anyhow::{Context, Result};

use exif_stamp::{config, pipeline};

fn main() {
    env_logger::Builder::from_env(env_logger::Env::default().default_filter_or("info"))
        .format_timestamp(None)
        .init();

    if let Err(e) = run() {
        log::error!("{e:#}");
        std::process::exit(1);
    }
}

fn run() -> Result<()> {
    let stamp = config::Stamp::fixed().context("Failed to build stamp values")?;

    let cwd = std::env::current_dir().context("Failed to determine working directory")?;
    log::debug!(
        "Stamping {} at {}, {}",
        stamp.exif_timestamp(),
        stamp.latitude,
        stamp.longitude
    );

    // Per-file failures are already logged; only listing failures are fatal.
    pipeline::stamp_directory(&cwd, &stamp)
        .with_context(|| format!("Failed to process {}", cwd.display()))?;

    Ok(())
}
