use image::RgbaImage;

/// Attenuation at radial distance `d` from the image centre.
///
/// `1.0` inside the inner radius `inner`, then a linear fall to `0.5` at
/// `diagonal`. Clamped to `[0, 1]`.
#[inline]
pub fn vignette_factor(d: f64, inner: f64, diagonal: f64) -> f64 {
    if d <= inner || diagonal <= inner {
        return 1.0;
    }
    (1.0 - 0.5 * (d - inner) / (diagonal - inner)).clamp(0.0, 1.0)
}

/// Darken `img` radially in place. Pixels within `min(w, h) / 2` of the
/// centre are left untouched; alpha is forced to 255.
pub fn apply_vignette(img: &mut RgbaImage) {
    let (w, h) = img.dimensions();
    let (half_w, half_h) = (w / 2, h / 2);
    let inner = half_w.min(half_h) as f64;
    let outer = half_w.max(half_h) as f64;
    let diagonal = (inner * inner + outer * outer).sqrt();

    for (x, y, p) in img.enumerate_pixels_mut() {
        let dx = x as f64 - half_w as f64;
        let dy = y as f64 - half_h as f64;
        let f = vignette_factor((dx * dx + dy * dy).sqrt(), inner, diagonal);
        if f < 1.0 {
            for c in &mut p.0[..3] {
                *c = (*c as f64 * f) as u8;
            }
        }
        p[3] = 255;
    }
}
