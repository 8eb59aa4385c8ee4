use std::path::Path;

use crate::TerrainError;

/// Decoded 8-bit heightmap. Only the first (red) channel of each texel is kept.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Heightmap {
    width: u32,
    height: u32,
    texels: Vec<u8>,
}

impl Heightmap {
    /// Decode an image file and keep channel 0 of its RGB conversion.
    pub fn open(path: impl AsRef<Path>) -> Result<Self, TerrainError> {
        let path = path.as_ref();
        let rgb = image::open(path)
            .map_err(|source| TerrainError::ImageLoad {
                path: path.to_path_buf(),
                source,
            })?
            .to_rgb8();
        let (width, height) = rgb.dimensions();
        let texels = rgb.pixels().map(|p| p.0[0]).collect();
        tracing::debug!(path = %path.display(), width, height, "heightmap decoded");
        Self::from_red_channel(width, height, texels)
    }

    /// Build from row-major channel-0 values (`width * height` bytes).
    pub fn from_red_channel(width: u32, height: u32, texels: Vec<u8>) -> Result<Self, TerrainError> {
        if width == 0 || height == 0 {
            return Err(TerrainError::InvalidConfig(format!(
                "heightmap must not be empty, got {width}x{height}"
            )));
        }
        let expected = width as usize * height as usize;
        if texels.len() != expected {
            return Err(TerrainError::InvalidConfig(format!(
                "heightmap {width}x{height} needs {expected} texels, got {}",
                texels.len()
            )));
        }
        Ok(Self {
            width,
            height,
            texels,
        })
    }

    pub fn width(&self) -> u32 {
        self.width
    }

    pub fn height(&self) -> u32 {
        self.height
    }

    /// Texel value at `(x, y)`, `y` counted from the first row of the image.
    /// `None` outside the image.
    pub fn texel(&self, x: u32, y: u32) -> Option<u8> {
        if x >= self.width || y >= self.height {
            return None;
        }
        self.texels.get(self.index(x, y)).copied()
    }

    fn index(&self, x: u32, y: u32) -> usize {
        y as usize * self.width as usize + x as usize
    }

    /// Nearest-neighbour lookup for grid vertex `(x, z)` of an
    /// `x_slices` by `z_slices` grid. Coordinates are truncated, not rounded.
    pub fn sample_grid(&self, x: u32, z: u32, x_slices: u32, z_slices: u32) -> u8 {
        let img_x = (x as f32 / x_slices as f32 * (self.width - 1) as f32) as u32;
        let img_y = (z as f32 / z_slices as f32 * (self.height - 1) as f32) as u32;
        self.texels[self.index(img_x.min(self.width - 1), img_y.min(self.height - 1))]
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn rejects_mismatched_texel_count() {
        assert!(Heightmap::from_red_channel(2, 2, vec![0; 3]).is_err());
        assert!(Heightmap::from_red_channel(0, 2, vec![]).is_err());
    }

    #[test]
    fn sample_grid_hits_corners() {
        let map = Heightmap::from_red_channel(3, 2, vec![1, 2, 3, 4, 5, 6]).unwrap();
        assert_eq!(map.sample_grid(0, 0, 4, 4), 1);
        assert_eq!(map.sample_grid(4, 0, 4, 4), 3);
        assert_eq!(map.sample_grid(0, 4, 4, 4), 4);
        assert_eq!(map.sample_grid(4, 4, 4, 4), 6);
    }

    #[test]
    fn texel_outside_image_is_none() {
        let map = Heightmap::from_red_channel(3, 2, vec![1, 2, 3, 4, 5, 6]).unwrap();
        assert_eq!(map.texel(2, 1), Some(6));
        // x past the row end must not wrap into the next row.
        assert_eq!(map.texel(3, 0), None);
        assert_eq!(map.texel(0, 2), None);
        assert_eq!(map.texel(u32::MAX, u32::MAX), None);
    }

    #[test]
    fn sample_grid_truncates() {
        // 0.75 * 2 = 1.5 -> texel 1, not 2
        let map = Heightmap::from_red_channel(3, 1, vec![10, 20, 30]).unwrap();
        assert_eq!(map.sample_grid(3, 0, 4, 1), 20);
    }

    #[test]
    fn open_reads_red_channel() {
        let dir = tempfile::tempdir().unwrap();
        let path = dir.path().join("h.png");
        let img = image::RgbImage::from_fn(2, 2, |x, y| image::Rgb([(x * 100 + y * 10) as u8, 255, 7]));
        img.save(&path).unwrap();

        let map = Heightmap::open(&path).unwrap();
        assert_eq!((map.width(), map.height()), (2, 2));
        assert_eq!(map.texel(1, 0), Some(100));
        assert_eq!(map.texel(0, 1), Some(10));
        assert_eq!(map.texel(1, 1), Some(110));
    }

    #[test]
    fn open_missing_file_is_image_error() {
        let err = Heightmap::open("/definitely/not/here.png").unwrap_err();
        assert!(matches!(err, TerrainError::ImageLoad { .. }));
    }
}
