use image::{Rgba, RgbaImage};

use crate::imaging::{ImagingError, fit_cover};

/// Static wall background, already fitted to the canvas. Read-only while
/// rendering.
#[derive(Clone, Debug)]
pub struct WallTexture {
    image: RgbaImage,
}

impl WallTexture {
    /// Scale-to-cover `src` onto a `w`×`h` canvas.
    pub fn fit(src: &RgbaImage, w: usize, h: usize) -> Result<Self, ImagingError> {
        Ok(Self {
            image: fit_cover(src, w as u32, h as u32)?,
        })
    }

    /// Flat single-colour wall (tests, missing textures).
    pub fn solid(w: usize, h: usize, rgb: [u8; 3]) -> Self {
        Self {
            image: RgbaImage::from_pixel(w as u32, h as u32, Rgba([rgb[0], rgb[1], rgb[2], 255])),
        }
    }

    #[inline]
    pub fn width(&self) -> usize {
        self.image.width() as usize
    }

    #[inline]
    pub fn height(&self) -> usize {
        self.image.height() as usize
    }

    /// Texel at `(x, y)`; coordinates are clamped to the texture.
    #[inline]
    pub fn sample(&self, x: usize, y: usize) -> [u8; 4] {
        let x = x.min(self.width().saturating_sub(1)) as u32;
        let y = y.min(self.height().saturating_sub(1)) as u32;
        self.image.get_pixel(x, y).0
    }

    pub fn image(&self) -> &RgbaImage {
        &self.image
    }
}
