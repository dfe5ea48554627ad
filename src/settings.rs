use thiserror::Error;

use crate::{imaging::Detail, scene::SceneParameters};

#[derive(Error, Debug, PartialEq)]
pub enum SettingsError {
    #[error("lattice spacing must be a finite value >= 1, got {0}")]
    BadCoarse(f32),

    #[error("sphere radius {radius} does not fit a {fx}x{fy} frame")]
    BadRadius { radius: f32, fx: i32, fy: i32 },

    #[error("settings zoom {settings} differs from the scene zoom {scene}")]
    ZoomMismatch { settings: f32, scene: f32 },
}

/// Knobs shared by extraction and rendering.
///
/// `Default` reproduces the gallery look: radius-4 spheres on a 5 px
/// honeycomb, remeshed towards 6-unit edges over ten passes.
#[derive(Clone, Debug, PartialEq)]
pub struct RenderSettings {
    /// Sphere radius in un-zoomed pixels.
    pub radius: f32,
    /// Lattice spacing in source-image pixels.
    pub coarse: f32,
    /// Must equal the zoom the scene was resolved at.
    pub zoom: f32,
    /// Remesh target edge length in canvas units.
    pub target_edge_length: f32,
    pub remesh_iterations: usize,
    /// Optional close-up applied to each source before cropping.
    pub detail: Option<Detail>,
    /// Seed for the frame-bevel jitter.
    pub seed: u64,
}

impl Default for RenderSettings {
    fn default() -> Self {
        Self {
            radius: 4.0,
            coarse: 5.0,
            zoom: 1.0,
            target_edge_length: 6.0,
            remesh_iterations: 10,
            detail: None,
            seed: 0x5EED,
        }
    }
}

impl RenderSettings {
    /// Sphere radius in canvas pixels.
    #[inline]
    pub fn canvas_radius(&self) -> f32 {
        (self.zoom * self.radius).trunc()
    }

    /// Check the settings against the scene they will render.
    ///
    /// The lattice needs a spacing of at least one source pixel, and the
    /// radius inset on both sides must leave some of the frame to map onto.
    pub fn validate(&self, scene: &SceneParameters) -> Result<(), SettingsError> {
        if self.zoom != scene.zoom {
            return Err(SettingsError::ZoomMismatch {
                settings: self.zoom,
                scene: scene.zoom,
            });
        }
        if !(self.coarse.is_finite() && self.coarse >= 1.0) {
            return Err(SettingsError::BadCoarse(self.coarse));
        }
        let inset = 2.0 * self.canvas_radius();
        let span = scene.fx.min(scene.fy) as f32;
        if !(self.radius.is_finite() && self.radius >= 0.0 && inset < span) {
            return Err(SettingsError::BadRadius {
                radius: self.radius,
                fx: scene.fx,
                fy: scene.fy,
            });
        }
        Ok(())
    }
}
