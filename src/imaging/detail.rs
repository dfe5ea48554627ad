use image::{Rgba, RgbaImage, imageops::FilterType};

use super::{ImagingError, ensure_non_empty};

/// Close-up of part of a photograph: upscale by `scale`, then keep an
/// original-sized window whose top-left corner sits at the fractional
/// position `(x0, y0)` of the upscaled image.
#[derive(Clone, Copy, Debug, PartialEq)]
pub struct Detail {
    pub scale: f32,
    pub x0: f32,
    pub y0: f32,
}

impl Default for Detail {
    fn default() -> Self {
        Self {
            scale: 2.0,
            x0: 0.1,
            y0: 0.1,
        }
    }
}

/// Apply `d` to `src` with bicubic (Catmull-Rom) resampling.
///
/// The window is clamped so it never reads past the upscaled image.
pub fn detail(src: &RgbaImage, d: Detail) -> Result<RgbaImage, ImagingError> {
    let (w, h) = src.dimensions();
    ensure_non_empty(w, h)?;
    if !d.scale.is_finite() || d.scale < 1.0 {
        return Err(ImagingError::BadDetail(d.scale));
    }

    let big_w = ((w as f32 * d.scale) as u32).max(w);
    let big_h = ((h as f32 * d.scale) as u32).max(h);
    let big = image::imageops::resize(src, big_w, big_h, FilterType::CatmullRom);

    let ox = ((d.x0.clamp(0.0, 1.0) * big_w as f32) as u32).min(big_w - w);
    let oy = ((d.y0.clamp(0.0, 1.0) * big_h as f32) as u32).min(big_h - h);

    Ok(RgbaImage::from_fn(w, h, |x, y| {
        let p = big.get_pixel(x + ox, y + oy);
        Rgba([p[0], p[1], p[2], 255])
    }))
}
