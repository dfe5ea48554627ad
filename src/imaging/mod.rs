//! Source-image preparation ahead of point extraction.
//!
//! * [`detail`] – optional bicubic close-up of part of the photograph.
//! * [`crop_to_frame`] – centre crop to the picture window's aspect.
//! * [`apply_vignette`] – radial darkening towards the corners.
//! * [`fit_cover`] – scale-to-cover fitting used for the wall texture.
//!
//! Every function works on decoded `RgbaImage`s and forces alpha to 255.

mod crop;
mod detail;
mod vignette;

pub use crop::{CropWindow, crop_to_frame, crop_window, fit_cover};
pub use detail::{Detail, detail};
pub use vignette::{apply_vignette, vignette_factor};

use thiserror::Error;

#[derive(Error, Debug, PartialEq)]
pub enum ImagingError {
    /// Source or requested size has a zero dimension.
    #[error("image size {0}x{1} has a zero dimension")]
    Empty(u32, u32),

    /// Cropping to the requested aspect would leave no pixels.
    #[error("cropping {src_w}x{src_h} to aspect {target_w}:{target_h} leaves nothing")]
    Degenerate {
        src_w: u32,
        src_h: u32,
        target_w: u32,
        target_h: u32,
    },

    #[error("detail scale {0} must be finite and >= 1")]
    BadDetail(f32),
}

pub(crate) fn ensure_non_empty(w: u32, h: u32) -> Result<(), ImagingError> {
    if w == 0 || h == 0 {
        return Err(ImagingError::Empty(w, h));
    }
    Ok(())
}
