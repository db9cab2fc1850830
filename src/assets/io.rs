use std::path::{Path, PathBuf};

use base64::Engine;
use image::{ColorType, ImageFormat};

use crate::errors::{Result, TesseraError};
use crate::resources::Image;

/// Source of scene-adjacent files (buffers, images).
///
/// Loaders never touch the filesystem for auxiliary files directly; they go
/// through a reader so tests and tools can substitute their own storage.
pub trait AssetReader: Send + Sync {
    /// Reads the raw bytes at `path`.
    fn read_bytes(&self, path: &Path) -> Result<Vec<u8>>;

    /// Loads and decodes the image at `uri`, relative to `base_path`.
    fn load_image(&self, base_path: &Path, uri: &str) -> Result<Image> {
        let bytes = self.read_bytes(&base_path.join(uri))?;
        decode_image(&bytes)
    }
}

/// Local file reader.
#[derive(Debug, Clone, Copy, Default)]
pub struct FileAssetReader;

impl AssetReader for FileAssetReader {
    fn read_bytes(&self, path: &Path) -> Result<Vec<u8>> {
        Ok(std::fs::read(path)?)
    }
}

/// Decodes an encoded image (PNG, JPEG, ...) held in memory.
pub fn decode_image(bytes: &[u8]) -> Result<Image> {
    let img = image::load_from_memory(bytes)?;
    Ok(Image::from_dynamic(img))
}

/// Encodes `image` as PNG at `path`.
///
/// Single-channel images are written as 8-bit grey, everything else as RGBA8.
pub fn save_image_png(image: &Image, path: &Path) -> Result<()> {
    if image.is_empty() {
        return Err(TesseraError::ImageError(format!(
            "refusing to write empty image to {}",
            path.display()
        )));
    }
    if image.bytes_per_pixel == 1 {
        image::save_buffer_with_format(path, &image.data, image.width, image.height, ColorType::L8, ImageFormat::Png)?;
    } else {
        let rgba = image.to_rgba8();
        image::save_buffer_with_format(path, &rgba, image.width, image.height, ColorType::Rgba8, ImageFormat::Png)?;
    }
    Ok(())
}

/// Directory containing `path`, used to resolve relative URIs.
///
/// A bare file name yields an empty path, which joins as the current
/// directory.
#[must_use]
pub fn base_path_of(path: &Path) -> PathBuf {
    path.parent().map(Path::to_path_buf).unwrap_or_default()
}

/// Decodes a base64 `data:` URI. Returns `Ok(None)` for any other URI.
pub fn decode_data_uri(uri: &str) -> Result<Option<Vec<u8>>> {
    let Some(rest) = uri.strip_prefix("data:") else {
        return Ok(None);
    };
    let (_mime, payload) = rest
        .split_once(";base64,")
        .ok_or_else(|| TesseraError::DataUriError(format!("only base64 data URIs are supported: {}", truncate(uri))))?;
    let bytes = base64::engine::general_purpose::STANDARD.decode(payload)?;
    Ok(Some(bytes))
}

/// Creates `dir` (and its parents) unless it already exists.
pub fn ensure_dir(dir: &Path) -> Result<()> {
    if dir.as_os_str().is_empty() || dir.is_dir() {
        return Ok(());
    }
    std::fs::create_dir_all(dir)?;
    Ok(())
}

fn truncate(s: &str) -> &str {
    match s.char_indices().nth(48) {
        Some((idx, _)) => &s[..idx],
        None => s,
    }
}
