//! ---------------------------------------------------------------------------
//! CPU backend for the depth-buffered sphere renderer
//!
//! * Canvas is an `RgbaImage` (R, G, B, A bytes) of the full wall size.
//! * Depth maps follow the "largest z wins" rule of [`DepthBuffer`].
//! * The splat kernels run data-parallel with `rayon`: splat centres are
//!   projected in parallel, binned into horizontal bands, and every band is
//!   rasterised by exactly one worker, so each pixel has a single writer.
//!
//! [`DepthBuffer`]: crate::renderer::DepthBuffer
//! ---------------------------------------------------------------------------

mod renderer;
mod reset;
mod shadows;
mod splat;

pub use renderer::Software;
