//! Texture and material deduplication
//!
//! Textures are deduplicated by source key, never by content. A texture that
//! fails to load is not registered; the caller leaves that slot empty and the
//! rest of the scene loads normally. Materials are deduplicated by exact
//! field equality with a linear scan, which stays cheap for the tens to low
//! hundreds of materials a level carries.

use std::path::Path;

use crate::assets::io::AssetReader;
use crate::assets::level::{LevelAssets, PackedRoughnessMetallic};
use crate::errors::{Result, TesseraError};
use crate::resources::{Image, Material};

/// Placeholder for the missing half of a packed metallic/roughness key.
const MISSING_MAP: &str = "<none>";

/// Source key of a packed metallic/roughness texture: the two source paths
/// concatenated, roughness first.
#[must_use]
pub fn combined_source_key(roughness: Option<&str>, metallic: Option<&str>) -> String {
    format!(
        "{}{}",
        roughness.unwrap_or(MISSING_MAP),
        metallic.unwrap_or(MISSING_MAP)
    )
}

impl LevelAssets {
    /// Returns the texture registered under `source_key`, loading it through
    /// `reader` on first use.
    ///
    /// Load failures are logged and yield `None`.
    pub fn resolve_or_add_texture(
        &mut self,
        reader: &dyn AssetReader,
        source_key: &str,
        base_path: &Path,
    ) -> Option<u32> {
        self.resolve_or_insert_texture_with(source_key, || reader.load_image(base_path, source_key))
    }

    /// Like [`resolve_or_add_texture`](Self::resolve_or_add_texture) with a
    /// custom loader, used for embedded and converted images.
    pub fn resolve_or_insert_texture_with(
        &mut self,
        source_key: &str,
        load: impl FnOnce() -> Result<Image>,
    ) -> Option<u32> {
        if let Some(&index) = self.texture_source_keys.get(source_key) {
            return Some(index);
        }

        let image = match load() {
            Ok(image) if !image.is_empty() => image,
            Ok(_) => {
                log::warn!("Texture \"{source_key}\" decoded to an empty image, skipping");
                return None;
            }
            Err(err) => {
                log::warn!("Could not load texture \"{source_key}\": {err}");
                return None;
            }
        };

        let index = self.textures.len() as u32;
        log::debug!(
            "Loaded texture \"{source_key}\" ({}x{}, {} bpp) as #{index}",
            image.width,
            image.height,
            image.bytes_per_pixel
        );
        self.textures.push(image);
        self.texture_source_keys.insert(source_key.to_string(), index);
        Some(index)
    }

    /// Resolves separate single-channel roughness and metallic maps to one
    /// packed two-channel texture (byte 0 metallic, byte 1 roughness).
    ///
    /// When only one map is given, or one fails to load, the missing channel
    /// is filled with 255 so the scalar factor alone governs it. The result
    /// records which channels came from a loaded map. Two loaded maps with
    /// different sizes, or a map with more than one channel, is a structural
    /// error.
    pub fn resolve_or_add_roughness_metallic(
        &mut self,
        reader: &dyn AssetReader,
        roughness: Option<&str>,
        metallic: Option<&str>,
        base_path: &Path,
    ) -> Result<Option<PackedRoughnessMetallic>> {
        if roughness.is_none() && metallic.is_none() {
            return Ok(None);
        }
        let key = combined_source_key(roughness, metallic);
        if let Some(&index) = self.texture_source_keys.get(&key) {
            let entry = self.packed_channels.get(&index).copied().unwrap_or(PackedRoughnessMetallic {
                index,
                roughness: roughness.is_some(),
                metallic: metallic.is_some(),
            });
            return Ok(Some(entry));
        }

        let load = |path: Option<&str>| -> Option<Image> {
            let path = path?;
            match reader.load_image(base_path, path) {
                Ok(image) if !image.is_empty() => Some(image),
                Ok(_) => None,
                Err(err) => {
                    log::warn!("Could not load texture \"{path}\": {err}");
                    None
                }
            }
        };
        let rough_img = load(roughness);
        let metal_img = load(metallic);

        let mismatch = |reason: String| TesseraError::MismatchedRoughnessMetallic {
            roughness: roughness.unwrap_or(MISSING_MAP).to_string(),
            metallic: metallic.unwrap_or(MISSING_MAP).to_string(),
            reason,
        };
        for img in [&rough_img, &metal_img].into_iter().flatten() {
            if img.bytes_per_pixel != 1 {
                return Err(mismatch(format!("expected 1 byte per pixel, found {}", img.bytes_per_pixel)));
            }
        }

        let (has_roughness, has_metallic) = (rough_img.is_some(), metal_img.is_some());
        let packed = match (rough_img, metal_img) {
            (None, None) => return Ok(None),
            (Some(r), Some(m)) => {
                if (r.width, r.height) != (m.width, m.height) {
                    return Err(mismatch(format!(
                        "roughness is {}x{}, metallic is {}x{}",
                        r.width, r.height, m.width, m.height
                    )));
                }
                Image::pack_metallic_roughness(&m.data, &r.data, r.width, r.height)
            }
            (Some(r), None) => {
                let full = vec![255u8; r.data.len()];
                Image::pack_metallic_roughness(&full, &r.data, r.width, r.height)
            }
            (None, Some(m)) => {
                let full = vec![255u8; m.data.len()];
                Image::pack_metallic_roughness(&m.data, &full, m.width, m.height)
            }
        };

        let Some(index) = self.resolve_or_insert_texture_with(&key, || Ok(packed)) else {
            return Ok(None);
        };
        let entry = PackedRoughnessMetallic { index, roughness: has_roughness, metallic: has_metallic };
        self.packed_channels.insert(index, entry);
        Ok(Some(entry))
    }

    /// Returns the index of a material equal to `material`, appending it if
    /// none exists.
    pub fn resolve_or_add_material(&mut self, material: Material) -> u32 {
        if let Some(index) = self.materials.iter().position(|m| *m == material) {
            return index as u32;
        }
        self.materials.push(material);
        (self.materials.len() - 1) as u32
    }
}
