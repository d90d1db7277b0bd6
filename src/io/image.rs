//! PNG loading and saving for the image filters

use crate::io::error::{Result, ToolError, WithPath};
use image::{GrayImage, RgbImage};
use std::path::Path;

fn open(path: &Path) -> Result<image::DynamicImage> {
    image::open(path).map_err(|source| ToolError::ImageLoad {
        path: path.to_path_buf(),
        source,
    })
}

/// Load an image as 8-bit greyscale
///
/// # Errors
///
/// Returns an error if the file cannot be opened or decoded
pub fn load_gray(path: &Path) -> Result<GrayImage> {
    Ok(open(path)?.to_luma8())
}

/// Load an image as 8-bit RGB, discarding any alpha channel
///
/// # Errors
///
/// Returns an error if the file cannot be opened or decoded
pub fn load_rgb(path: &Path) -> Result<RgbImage> {
    Ok(open(path)?.to_rgb8())
}

/// Save a greyscale image, creating parent directories first
///
/// # Errors
///
/// Returns an error if a parent directory cannot be created or the image
/// cannot be encoded
pub fn save_gray(image: &GrayImage, path: &Path) -> Result<()> {
    if let Some(parent) = path.parent().filter(|parent| !parent.as_os_str().is_empty()) {
        std::fs::create_dir_all(parent).with_path(parent, "create directory")?;
    }
    image.save(path).map_err(|source| ToolError::ImageExport {
        path: path.to_path_buf(),
        source,
    })
}
