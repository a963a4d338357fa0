//! Persistent signal image.

use image::{Rgba, RgbaImage};

use crate::config::{RasterConfig, ScanConfig};
use crate::signal::SignalSample;

/// RGBA8 signal image.
#[derive(Clone, Debug, PartialEq)]
pub struct RasterImage {
    buffer: RgbaImage,
    /// Bumped on every write so hosts can skip re-uploading unchanged images.
    version: u64,
}

impl RasterImage {
    pub fn new(width: usize, height: usize) -> Self {
        Self {
            buffer: RgbaImage::new(width as u32, height as u32),
            version: 0,
        }
    }

    pub fn width(&self) -> usize {
        self.buffer.width() as usize
    }

    pub fn height(&self) -> usize {
        self.buffer.height() as usize
    }

    pub fn buffer(&self) -> &RgbaImage {
        &self.buffer
    }

    pub fn version(&self) -> u64 {
        self.version
    }

    pub fn get(&self, x: usize, y: usize) -> Option<[u8; 4]> {
        let (x, y) = (u32::try_from(x).ok()?, u32::try_from(y).ok()?);
        self.buffer.get_pixel_checked(x, y).map(|p| p.0)
    }

    /// Writes one pixel; out-of-range addresses are ignored.
    pub fn put(&mut self, x: usize, y: usize, rgba: [u8; 4]) {
        let (Ok(x), Ok(y)) = (u32::try_from(x), u32::try_from(y)) else {
            return;
        };
        if let Some(pixel) = self.buffer.get_pixel_mut_checked(x, y) {
            *pixel = Rgba(rgba);
            self.version += 1;
        }
    }

    /// Back to fully transparent black.
    pub fn clear(&mut self) {
        self.buffer.fill(0);
        self.version += 1;
    }

    pub fn is_blank(&self) -> bool {
        self.buffer.pixels().all(|p| p.0 == [0; 4])
    }
}

/// Maps samples from the logical scan domain onto a `RasterImage`.
#[derive(Clone, Copy, Debug)]
pub struct RasterCompositor {
    domain_width: f32,
    domain_height: f32,
    intensity_scale: f32,
}

impl RasterCompositor {
    pub fn new(scan: &ScanConfig, raster: &RasterConfig) -> Self {
        Self {
            domain_width: scan.width,
            domain_height: scan.height,
            intensity_scale: raster.intensity_scale,
        }
    }

    /// Log-compressed brightness of a signal, before clamping.
    pub fn intensity(&self, signal: f32) -> f32 {
        (signal + 1.0).ln() * self.intensity_scale
    }

    /// Green-on-black heat-map colour for a signal, fully opaque.
    pub fn color(&self, signal: f32) -> [u8; 4] {
        let i = self.intensity(signal);
        [channel(i * 0.25), channel(i), channel(i * 0.25), 255]
    }

    pub fn pixel_of(&self, sample: &SignalSample, image: &RasterImage) -> (usize, usize) {
        let px = (sample.x / self.domain_width * image.width() as f32).floor();
        let py = (sample.y / self.domain_height * image.height() as f32).floor();
        (px.max(0.0) as usize, py.max(0.0) as usize)
    }

    /// Paints every sample in order. A later sample replaces whatever an
    /// earlier one wrote at the same pixel.
    pub fn paint(&self, samples: &[SignalSample], image: &mut RasterImage) {
        for sample in samples {
            let (x, y) = self.pixel_of(sample, image);
            image.put(x, y, self.color(sample.signal));
        }
    }
}

fn channel(v: f32) -> u8 {
    v.round().clamp(0.0, 255.0) as u8
}

#[cfg(test)]
mod tests {
    use super::*;

    fn compositor() -> RasterCompositor {
        RasterCompositor::new(&ScanConfig::default(), &RasterConfig::default())
    }

    fn sample(x: f32, y: f32, signal: f32) -> SignalSample {
        SignalSample { x, y, signal }
    }

    #[test]
    fn last_write_wins() {
        let c = compositor();
        let mut image = RasterImage::new(400, 200);
        c.paint(&[sample(100.0, 50.0, 10.0), sample(100.0, 50.0, 50.0)], &mut image);

        let g = (51.0f32.ln() * 30.0).round() as u8;
        let r = (51.0f32.ln() * 30.0 * 0.25).round() as u8;
        assert_eq!(image.get(100, 50), Some([r, g, r, 255]));
    }

    #[test]
    fn domain_scales_to_buffer() {
        let c = compositor();
        let mut image = RasterImage::new(100, 50);
        c.paint(&[sample(398.0, 190.0, 5.0)], &mut image);
        assert_eq!(image.get(99, 47).map(|p| p[3]), Some(255));
        assert_eq!(c.pixel_of(&sample(0.0, 0.0, 1.0), &image), (0, 0));
    }

    #[test]
    fn large_signals_clamp_to_white_green() {
        let c = RasterCompositor::new(
            &ScanConfig::default(),
            &RasterConfig {
                intensity_scale: 100.0,
                ..RasterConfig::default()
            },
        );
        assert_eq!(c.color(1.0e6), [255, 255, 255, 255]);
        assert_eq!(c.color(0.0), [0, 0, 0, 255]);
    }

    #[test]
    fn buffer_matches_the_raster_size() {
        let c = compositor();
        let mut image = RasterImage::new(400, 200);
        let before = image.version();
        c.paint(&[sample(399.0, 199.0, 5.0)], &mut image);
        assert_eq!(image.buffer().dimensions(), (400, 200));
        assert_eq!(image.buffer().get_pixel(399, 199).0, c.color(5.0));
        assert_eq!(image.version(), before + 1);
        assert_eq!(image.get(400, 0), None);
    }

    #[test]
    fn clear_blanks_the_image() {
        let mut image = RasterImage::new(4, 4);
        image.put(1, 1, [1, 2, 3, 255]);
        assert!(!image.is_blank());
        image.clear();
        assert!(image.is_blank());
        image.put(10, 10, [9, 9, 9, 9]);
        assert!(image.is_blank());
    }
}
