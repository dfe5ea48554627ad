use image::RgbaImage;
use log::{debug, warn};
use std::time::Instant;

use super::splat::{BandBins, Splat};
use crate::{
    cloud::Point,
    renderer::{Channel, DepthBuffer, RenderError, Renderer},
    scene::{SceneParameters, WallTexture},
    settings::RenderSettings,
};

/// Render context: owns the canvas, the three depth planes and the splat
/// staging buffers. Allocated once per run, reused for every frame.
pub struct Software {
    pub(super) scene: SceneParameters,
    pub(super) radius: i32,
    pub(super) depth: DepthBuffer,
    pub(super) canvas: RgbaImage,
    pub(super) splats: Vec<Splat>,
    pub(super) bins: BandBins,
    pub(super) rng: fastrand::Rng,
}

impl Software {
    pub fn new(scene: SceneParameters, settings: &RenderSettings) -> Result<Self, RenderError> {
        let (w, h) = (scene.cx, scene.cy);
        let depth = DepthBuffer::new(w, h)?;

        let mut bytes = Vec::new();
        bytes
            .try_reserve_exact(4 * w * h)
            .map_err(|_| RenderError::Allocation {
                what: "canvas",
                width: w,
                height: h,
            })?;
        bytes.resize(4 * w * h, 0);
        let canvas =
            RgbaImage::from_raw(w as u32, h as u32, bytes).ok_or(RenderError::Allocation {
                what: "canvas",
                width: w,
                height: h,
            })?;

        let capacity = worst_case_points(&scene, settings);
        let mut splats = Vec::new();
        splats
            .try_reserve_exact(capacity)
            .map_err(|_| RenderError::Allocation {
                what: "splat staging",
                width: w,
                height: h,
            })?;
        debug!("render context {w}x{h}, room for {capacity} points");

        Ok(Self {
            radius: settings.canvas_radius() as i32,
            bins: BandBins::new(h),
            rng: fastrand::Rng::with_seed(settings.seed),
            scene,
            depth,
            canvas,
            splats,
        })
    }

    pub fn scene(&self) -> &SceneParameters {
        &self.scene
    }

    pub fn depth(&self) -> &DepthBuffer {
        &self.depth
    }

    pub fn canvas(&self) -> &RgbaImage {
        &self.canvas
    }

    /// Project `points` through `channel`'s viewpoint into the staging
    /// buffer and rebin it.
    pub(super) fn stage(&mut self, channel: Channel, points: &[Point]) {
        if points.len() > self.splats.capacity() {
            warn!(
                "{} points exceed the reserved {}; growing staging buffer",
                points.len(),
                self.splats.capacity()
            );
        }
        let view = self.scene.viewpoints()[channel.index()];
        Splat::project_all(points, &view, &mut self.splats);
        self.bins.fill(&self.splats, self.radius);
    }
}

/// Upper bound on the lattice size for this frame window, doubled to leave
/// the remesher room to split.
fn worst_case_points(scene: &SceneParameters, settings: &RenderSettings) -> usize {
    let (px, py) = scene.frame_source_size();
    let coarse = settings.coarse.max(1.0);
    let per_row = px as f32 / coarse + 1.0;
    let rows = py as f32 / (coarse * 3f32.sqrt() / 2.0) + 1.0;
    2 * (per_row * rows) as usize + 1
}

/*──────────────────────── Renderer trait impl ────────────────────────*/
impl Renderer for Software {
    fn begin_frame(&mut self, wall: &WallTexture) -> Result<(), RenderError> {
        let (w, h) = (self.scene.cx, self.scene.cy);
        if wall.width() != self.scene.cx0 + w || wall.height() != self.scene.cy0 + h {
            return Err(RenderError::WallSize {
                got_w: wall.width(),
                got_h: wall.height(),
                width: w,
                height: h,
            });
        }
        let t0 = Instant::now();
        self.classify_pixels(wall);
        self.seed_frame_edges();
        debug!("reset in {:.1} ms", t0.elapsed().as_secs_f64() * 1e3);
        Ok(())
    }

    fn draw_spheres(&mut self, points: &[Point]) {
        let t0 = Instant::now();
        self.stage(Channel::Camera, points);
        self.splat_spheres();
        debug!(
            "sphere pass: {} points in {:.1} ms",
            points.len(),
            t0.elapsed().as_secs_f64() * 1e3
        );
    }

    fn draw_light(&mut self, channel: Channel, points: &[Point]) {
        debug_assert_ne!(channel, Channel::Camera, "light pass needs a light channel");
        let t0 = Instant::now();
        self.stage(channel, points);
        self.splat_depth(channel);
        debug!(
            "{channel:?} pass in {:.1} ms",
            t0.elapsed().as_secs_f64() * 1e3
        );
    }

    fn composite_shadows(&mut self) {
        let t0 = Instant::now();
        self.shade_occluded();
        debug!("shadows in {:.1} ms", t0.elapsed().as_secs_f64() * 1e3);
    }

    fn end_frame<F, T>(&mut self, submit: F) -> T
    where
        F: FnOnce(&RgbaImage) -> T,
    {
        submit(&self.canvas)
    }
}

/*──────────────────────────────── Tests ───────────────────────────────*/
