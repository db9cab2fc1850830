use image::DynamicImage;

/// Decoded pixel data, tightly packed row by row.
///
/// `bytes_per_pixel` is 1 for single-channel images, 2 for the packed
/// metallic/roughness layout (byte 0 metallic, byte 1 roughness) and 4 for
/// RGBA.
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct Image {
    pub width: u32,
    pub height: u32,
    pub bytes_per_pixel: u8,
    pub data: Vec<u8>,
}

impl Image {
    #[must_use]
    pub fn new(width: u32, height: u32, bytes_per_pixel: u8, data: Vec<u8>) -> Self {
        debug_assert_eq!(
            data.len(),
            width as usize * height as usize * bytes_per_pixel as usize,
            "image data size does not match its dimensions"
        );
        Self { width, height, bytes_per_pixel, data }
    }

    #[inline]
    #[must_use]
    pub fn pixel_count(&self) -> usize {
        self.width as usize * self.height as usize
    }

    #[inline]
    #[must_use]
    pub fn is_empty(&self) -> bool {
        self.data.is_empty()
    }

    /// Converts a decoded image, keeping grey images single-channel and
    /// expanding everything else to RGBA.
    #[must_use]
    pub fn from_dynamic(img: DynamicImage) -> Self {
        let (width, height) = (img.width(), img.height());
        if matches!(img, DynamicImage::ImageLuma8(_) | DynamicImage::ImageLuma16(_)) {
            return Self::new(width, height, 1, img.into_luma8().into_raw());
        }
        Self::new(width, height, 4, img.into_rgba8().into_raw())
    }

    /// Packs separate single-channel metallic and roughness images into one
    /// two-channel image. Both inputs must be 1 byte per pixel and share
    /// dimensions; the caller validates this.
    #[must_use]
    pub fn pack_metallic_roughness(metallic: &[u8], roughness: &[u8], width: u32, height: u32) -> Self {
        let data = metallic
            .iter()
            .zip(roughness)
            .flat_map(|(&m, &r)| [m, r])
            .collect();
        Self::new(width, height, 2, data)
    }

    /// Expands the pixel data to RGBA8.
    ///
    /// The two-channel layout maps to the glTF metallic/roughness convention:
    /// roughness in green, metallic in blue.
    #[must_use]
    pub fn to_rgba8(&self) -> Vec<u8> {
        match self.bytes_per_pixel {
            1 => self.data.iter().flat_map(|&l| [l, l, l, 255]).collect(),
            2 => self
                .data
                .chunks_exact(2)
                .flat_map(|px| [0, px[1], px[0], 255])
                .collect(),
            3 => self
                .data
                .chunks_exact(3)
                .flat_map(|px| [px[0], px[1], px[2], 255])
                .collect(),
            _ => self.data.clone(),
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn packs_metallic_then_roughness() {
        let img = Image::pack_metallic_roughness(&[1, 2], &[10, 20], 2, 1);
        assert_eq!(img.bytes_per_pixel, 2);
        assert_eq!(img.data, vec![1, 10, 2, 20]);
    }

    #[test]
    fn two_channel_expands_to_gltf_layout() {
        let img = Image::new(1, 1, 2, vec![7, 9]);
        assert_eq!(img.to_rgba8(), vec![0, 9, 7, 255]);
    }
}
