//! Rendering abstraction layer.
//!
//! *The engine never touches a pixel or a depth sample directly.* It hands
//! the point set to a type implementing [`Renderer`], which runs the fixed
//! pass sequence:
//!
//! 1. `begin_frame` – seed canvas and depth maps from wall and frame
//!    geometry,
//! 2. `draw_spheres` – splat every point into the camera (colour + depth),
//! 3. `draw_light` – splat every point into one light's depth plane,
//! 4. `composite_shadows` – darken camera pixels occluded from a light,
//! 5. `end_frame` – loan the finished canvas to the caller.
//!
//! [`RendererExt::draw_frame`] strings them together in that order; a frame
//! is only complete after all of them ran.

mod depth;
pub mod software;

pub use depth::{Channel, DepthBuffer};
pub use software::Software;

use image::RgbaImage;
use thiserror::Error;

use crate::cloud::Point;
use crate::scene::WallTexture;

#[derive(Error, Debug, PartialEq)]
pub enum RenderError {
    #[error("could not allocate {what} for a {width}x{height} canvas")]
    Allocation {
        what: &'static str,
        width: usize,
        height: usize,
    },

    #[error("wall texture is {got_w}x{got_h} but the canvas is {width}x{height}")]
    WallSize {
        got_w: usize,
        got_h: usize,
        width: usize,
        height: usize,
    },
}

/// A renderer owning its canvas and depth maps for the whole run.
pub trait Renderer {
    /// Reset canvas and depth maps for a new frame and seed the frame
    /// geometry.
    fn begin_frame(&mut self, wall: &WallTexture) -> Result<(), RenderError>;

    /// Camera pass: colour and depth.
    fn draw_spheres(&mut self, points: &[Point]);

    /// Light pass for `channel` (`Light1` or `Light2`): depth only.
    fn draw_light(&mut self, channel: Channel, points: &[Point]);

    /// Darken camera pixels that either light cannot see.
    fn composite_shadows(&mut self);

    /// Finish the frame and **loan** the canvas to `submit`.
    fn end_frame<F, T>(&mut self, submit: F) -> T
    where
        F: FnOnce(&RgbaImage) -> T;
}

/// Convenience blanket-impl with a one-liner `draw_frame` adaptor.
pub trait RendererExt: Renderer {
    fn draw_frame<F, T>(
        &mut self,
        wall: &WallTexture,
        points: &[Point],
        submit: F,
    ) -> Result<T, RenderError>
    where
        F: FnOnce(&RgbaImage) -> T,
    {
        self.begin_frame(wall)?;
        self.draw_spheres(points);
        for ch in Channel::LIGHTS {
            self.draw_light(ch, points);
        }
        self.composite_shadows();
        Ok(self.end_frame(submit))
    }
}
impl<T: Renderer + ?Sized> RendererExt for T {}
