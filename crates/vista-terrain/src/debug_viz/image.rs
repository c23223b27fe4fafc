//! A 2D debug image represented as a flat array of RGBA pixels.

use std::collections::HashSet;

use crate::color::Rgb;

/// Top-down terrain preview, stored as row-major RGBA pixels.
#[derive(Clone, Debug, PartialEq)]
pub struct DebugImage {
    /// Image width in pixels.
    pub width: u32,
    /// Image height in pixels.
    pub height: u32,
    /// Pixel data in row-major RGBA format. Length = `width * height * 4`.
    pub pixels: Vec<u8>,
}

impl DebugImage {
    /// Create an opaque black image with the given dimensions.
    pub fn new(width: u32, height: u32) -> Self {
        let mut pixels = vec![0; width as usize * height as usize * 4];
        for px in pixels.chunks_exact_mut(4) {
            px[3] = 255;
        }
        Self {
            width,
            height,
            pixels,
        }
    }

    fn offset(&self, x: u32, y: u32) -> Option<usize> {
        (x < self.width && y < self.height)
            .then(|| (y as usize * self.width as usize + x as usize) * 4)
    }

    /// Set a pixel. Out-of-bounds writes are ignored.
    pub fn set_pixel(&mut self, x: u32, y: u32, rgba: [u8; 4]) {
        if let Some(idx) = self.offset(x, y) {
            self.pixels[idx..idx + 4].copy_from_slice(&rgba);
        }
    }

    /// Set an opaque pixel from a linear color.
    pub fn set_color(&mut self, x: u32, y: u32, color: Rgb) {
        self.set_pixel(x, y, color.to_rgba8());
    }

    pub fn get_pixel(&self, x: u32, y: u32) -> Option<[u8; 4]> {
        self.offset(x, y).map(|idx| {
            [
                self.pixels[idx],
                self.pixels[idx + 1],
                self.pixels[idx + 2],
                self.pixels[idx + 3],
            ]
        })
    }

    /// Returns `(width, height)`.
    pub fn dimensions(&self) -> (u32, u32) {
        (self.width, self.height)
    }

    /// Count the number of unique colors (ignoring alpha) in the image.
    pub fn unique_color_count(&self) -> usize {
        self.pixels
            .chunks_exact(4)
            .map(|c| (c[0], c[1], c[2]))
            .collect::<HashSet<_>>()
            .len()
    }
}
