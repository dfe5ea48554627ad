use image::{Rgba, RgbaImage};

use super::{ImagingError, ensure_non_empty};

/// Centred sub-rectangle of a source image matching a target aspect.
#[derive(Clone, Copy, Debug, PartialEq)]
pub struct CropWindow {
    pub x: u32,
    pub y: u32,
    pub w: u32,
    pub h: u32,
    /// target / source scale along the axis that is kept whole.
    pub ratio: f32,
}

/// Largest centred window of a `src_w`×`src_h` image with the aspect of
/// `target_w`×`target_h`. The axis that is too long gets trimmed evenly on
/// both sides.
pub fn crop_window(
    src_w: u32,
    src_h: u32,
    target_w: u32,
    target_h: u32,
) -> Result<CropWindow, ImagingError> {
    ensure_non_empty(src_w, src_h)?;
    ensure_non_empty(target_w, target_h)?;

    let src_aspect = src_w as f32 / src_h as f32;
    let target_aspect = target_w as f32 / target_h as f32;

    let win = if src_aspect > target_aspect {
        // too wide: keep the full height
        let w = (src_h as f32 * target_aspect) as u32;
        CropWindow {
            x: (src_w - w.min(src_w)) / 2,
            y: 0,
            w: w.min(src_w),
            h: src_h,
            ratio: target_h as f32 / src_h as f32,
        }
    } else {
        // too tall (or exact): keep the full width
        let h = (src_w as f32 / target_aspect) as u32;
        CropWindow {
            x: 0,
            y: (src_h - h.min(src_h)) / 2,
            w: src_w,
            h: h.min(src_h),
            ratio: target_w as f32 / src_w as f32,
        }
    };

    if win.w == 0 || win.h == 0 {
        return Err(ImagingError::Degenerate {
            src_w,
            src_h,
            target_w,
            target_h,
        });
    }
    Ok(win)
}

/// Centre-crop `src` to the aspect of the picture window. The result keeps
/// the source resolution; scaling into the frame happens during extraction.
pub fn crop_to_frame(
    src: &RgbaImage,
    target_w: u32,
    target_h: u32,
) -> Result<RgbaImage, ImagingError> {
    let win = crop_window(src.width(), src.height(), target_w, target_h)?;
    Ok(RgbaImage::from_fn(win.w, win.h, |x, y| {
        let p = src.get_pixel(x + win.x, y + win.y);
        Rgba([p[0], p[1], p[2], 255])
    }))
}

/// Scale `src` to cover a `w`×`h` target and centre-crop the overflow
/// (nearest sampling).
pub fn fit_cover(src: &RgbaImage, w: u32, h: u32) -> Result<RgbaImage, ImagingError> {
    let win = crop_window(src.width(), src.height(), w, h)?;
    let (max_x, max_y) = (src.width() - 1, src.height() - 1);
    Ok(RgbaImage::from_fn(w, h, |x, y| {
        let sx = ((win.x as f32 + x as f32 / win.ratio) as u32).min(max_x);
        let sy = ((win.y as f32 + y as f32 / win.ratio) as u32).min(max_y);
        let p = src.get_pixel(sx, sy);
        Rgba([p[0], p[1], p[2], 255])
    }))
}

#[cfg(test)]
mod tests {
    use super::*;

    fn gradient(w: u32, h: u32) -> RgbaImage {
        RgbaImage::from_fn(w, h, |x, y| Rgba([x as u8, y as u8, 7, 10]))
    }

    #[test]
    fn crop_keeps_target_aspect_within_one_pixel() {
        let sources = [(640, 480), (480, 640), (1000, 1000), (17, 301), (999, 3)];
        let targets = [(528, 551), (1365, 590), (299, 517), (438, 438), (1, 1)];
        for &(sw, sh) in &sources {
            for &(tw, th) in &targets {
                let out = crop_to_frame(&gradient(sw, sh), tw, th).unwrap();
                let (nw, nh) = (out.width() as f32, out.height() as f32);
                let aspect = tw as f32 / th as f32;
                assert!(
                    (nw - nh * aspect).abs() <= 1.0 || (nh - nw / aspect).abs() <= 1.0,
                    "{sw}x{sh} -> {tw}x{th} gave {nw}x{nh}"
                );
                assert!(out.width() <= sw && out.height() <= sh);
            }
        }
    }

    #[test]
    fn crop_is_centred_and_opaque() {
        let src = gradient(100, 50);
        let out = crop_to_frame(&src, 1, 1).unwrap();
        assert_eq!(out.dimensions(), (50, 50));
        assert_eq!(out.get_pixel(0, 0), &Rgba([25, 0, 7, 255]));
    }

    #[test]
    fn degenerate_crop_is_an_error() {
        let err = crop_to_frame(&gradient(1, 100), 100, 1).unwrap_err();
        assert!(matches!(err, ImagingError::Degenerate { .. }));
        assert_eq!(
            crop_to_frame(&gradient(0, 4), 2, 2).unwrap_err(),
            ImagingError::Empty(0, 4)
        );
    }

    #[test]
    fn fit_cover_fills_target_exactly() {
        let src = gradient(200, 100);
        let out = fit_cover(&src, 50, 50).unwrap();
        assert_eq!(out.dimensions(), (50, 50));
        // left edge of the cover window starts half-way into the trimmed width
        assert_eq!(out.get_pixel(0, 0)[0], 50);
        assert!(out.pixels().all(|p| p[3] == 255));
    }
}
