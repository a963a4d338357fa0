//! An image is just a grid of numbers: a small editable greyscale matrix.

use image::{DynamicImage, GrayImage, Luma, RgbaImage};

pub const SIZE: usize = 8;

#[derive(Clone, Debug, PartialEq, Eq)]
pub struct PixelMatrix {
    cells: GrayImage,
}

impl Default for PixelMatrix {
    fn default() -> Self {
        Self::circle(2.0)
    }
}

impl PixelMatrix {
    /// White disc of `radius` cells around the grid centre on black.
    pub fn circle(radius: f32) -> Self {
        let center = SIZE as f32 / 2.0 - 0.5;
        let cells = GrayImage::from_fn(SIZE as u32, SIZE as u32, |x, y| {
            let d = (x as f32 - center).hypot(y as f32 - center);
            Luma([if d <= radius { 255 } else { 0 }])
        });
        Self { cells }
    }

    /// Cell value, or 0 outside the grid.
    pub fn get(&self, row: usize, col: usize) -> u8 {
        self.cells
            .get_pixel_checked(col as u32, row as u32)
            .map_or(0, |p| p.0[0])
    }

    /// Stores `value` clamped to 0..=255. Out-of-range cells are ignored.
    pub fn set(&mut self, row: usize, col: usize, value: i64) {
        if let Some(cell) = self.cells.get_pixel_mut_checked(col as u32, row as u32) {
            *cell = Luma([value.clamp(0, 255) as u8]);
        }
    }

    /// Opaque grey pixels.
    pub fn to_rgba(&self) -> RgbaImage {
        DynamicImage::ImageLuma8(self.cells.clone()).into_rgba8()
    }
}
