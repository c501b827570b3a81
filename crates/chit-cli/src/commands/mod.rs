//! CLI subcommands.

pub mod batch;
pub mod config;
pub mod process;

use std::fs;
use std::path::Path;

use chit_core::models::config::ChitConfig;

pub(crate) fn load_config(path: Option<&str>) -> anyhow::Result<ChitConfig> {
    Ok(match path {
        Some(p) => ChitConfig::from_file(Path::new(p))?,
        None => ChitConfig::default(),
    })
}

/// Read an image file, enforcing the inbound size cap and checking that
/// the bytes decode as a supported image format.
pub(crate) fn read_image(path: &Path, config: &ChitConfig) -> anyhow::Result<Vec<u8>> {
    if !path.exists() {
        anyhow::bail!("Input file not found: {}", path.display());
    }
    let data = fs::read(path)?;
    if data.len() > config.services.max_image_bytes {
        anyhow::bail!(
            "Image is {} bytes; cap is {} bytes: {}",
            data.len(),
            config.services.max_image_bytes,
            path.display()
        );
    }
    image::guess_format(&data)
        .map_err(|_| anyhow::anyhow!("Unsupported image format: {}", path.display()))?;
    Ok(data)
}
