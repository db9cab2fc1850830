//! PBR material description
//!
//! Colours and scalar factors are stored quantised to `u8`; two materials are
//! equal exactly when every field matches. Texture slots hold indices into the
//! level's global texture table.

use glam::{Vec3, Vec4};

/// Identifies one of the five texture slots of a [`Material`].
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum TextureSlot {
    Albedo,
    /// Packed two-channel texture: byte 0 metallic, byte 1 roughness.
    MetallicRoughness,
    Normal,
    Occlusion,
    Emissive,
}

impl TextureSlot {
    pub const ALL: [TextureSlot; 5] = [
        TextureSlot::Albedo,
        TextureSlot::MetallicRoughness,
        TextureSlot::Normal,
        TextureSlot::Occlusion,
        TextureSlot::Emissive,
    ];
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub struct Material {
    pub albedo: [u8; 4],
    pub emissive: [u8; 3],
    pub roughness: u8,
    pub metallic: u8,

    pub albedo_tex: Option<u32>,
    pub metallic_roughness_tex: Option<u32>,
    pub normal_tex: Option<u32>,
    pub occlusion_tex: Option<u32>,
    pub emissive_tex: Option<u32>,
}

impl Default for Material {
    fn default() -> Self {
        Self {
            albedo: [255, 255, 255, 255],
            emissive: [0, 0, 0],
            roughness: 255,
            metallic: 0,
            albedo_tex: None,
            metallic_roughness_tex: None,
            normal_tex: None,
            occlusion_tex: None,
            emissive_tex: None,
        }
    }
}

impl Material {
    /// Sentinel used by [`packed_texture_indices`](Self::packed_texture_indices)
    /// for an empty slot.
    pub const NO_TEXTURE: u32 = u32::MAX;

    #[must_use]
    pub fn texture(&self, slot: TextureSlot) -> Option<u32> {
        match slot {
            TextureSlot::Albedo => self.albedo_tex,
            TextureSlot::MetallicRoughness => self.metallic_roughness_tex,
            TextureSlot::Normal => self.normal_tex,
            TextureSlot::Occlusion => self.occlusion_tex,
            TextureSlot::Emissive => self.emissive_tex,
        }
    }

    pub fn texture_mut(&mut self, slot: TextureSlot) -> &mut Option<u32> {
        match slot {
            TextureSlot::Albedo => &mut self.albedo_tex,
            TextureSlot::MetallicRoughness => &mut self.metallic_roughness_tex,
            TextureSlot::Normal => &mut self.normal_tex,
            TextureSlot::Occlusion => &mut self.occlusion_tex,
            TextureSlot::Emissive => &mut self.emissive_tex,
        }
    }

    /// Texture indices in [`TextureSlot::ALL`] order, with empty slots set to
    /// [`NO_TEXTURE`](Self::NO_TEXTURE).
    #[must_use]
    pub fn packed_texture_indices(&self) -> [u32; 5] {
        TextureSlot::ALL.map(|slot| self.texture(slot).unwrap_or(Self::NO_TEXTURE))
    }

    pub fn set_albedo(&mut self, color: Vec4) {
        self.albedo = color.to_array().map(unorm8);
    }

    pub fn set_emissive(&mut self, color: Vec3) {
        self.emissive = color.to_array().map(unorm8);
    }

    #[must_use]
    pub fn albedo_factor(&self) -> Vec4 {
        Vec4::from_array(self.albedo.map(unorm8_to_f32))
    }

    #[must_use]
    pub fn emissive_factor(&self) -> Vec3 {
        Vec3::from_array(self.emissive.map(unorm8_to_f32))
    }
}

/// Quantises a `[0, 1]` value to `u8` with rounding.
#[inline]
#[must_use]
pub fn unorm8(value: f32) -> u8 {
    (value.clamp(0.0, 1.0) * 255.0 + 0.5) as u8
}

#[inline]
#[must_use]
pub fn unorm8_to_f32(value: u8) -> f32 {
    f32::from(value) * (1.0 / 255.0)
}
