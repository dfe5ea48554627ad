//! Point-cloud extraction: photograph → luminance-relief point set.
//!
//! 1. honeycomb lattice over the prepared image, depth from luminance,
//! 2. isotropic remesh to even out density ([`Refiner`]),
//! 3. compact, then back-sample each vertex's colour from the image.
//!
//! Vertices whose inverse mapping misses the image are dropped silently.

mod lattice;
mod mesh;
mod remesh;

pub use lattice::{FrameMapping, honeycomb, luminance};
pub use mesh::{EdgeKey, Topology, TriMesh, TriangleId, VertexId, edge_key};
pub use remesh::{EdgeConstraint, IsotropicRemesher, Refiner};

use glam::Vec3;
use image::RgbaImage;
use log::debug;

use crate::scene::SceneParameters;
use crate::settings::RenderSettings;

/// One luminance-derived sample ("thing"), rendered as a sphere.
#[derive(Clone, Copy, Debug, PartialEq)]
pub struct Point {
    pub id: u32,
    pub pos: Vec3,
    pub color: [u8; 3],
}

/// Vertex counts at each extraction stage.
#[derive(Clone, Copy, Debug, Default, PartialEq, Eq)]
pub struct ExtractReport {
    pub lattice_vertices: usize,
    pub remeshed_vertices: usize,
    pub points: usize,
}

/// Builds the per-frame point set. Generic over the remeshing algorithm.
pub struct Extractor<R: Refiner = IsotropicRemesher> {
    refiner: R,
    coarse: f32,
    radius: f32,
    target_edge_length: f32,
}

impl Extractor<IsotropicRemesher> {
    pub fn new(settings: &RenderSettings) -> Self {
        let refiner = IsotropicRemesher {
            iterations: settings.remesh_iterations,
            ..Default::default()
        };
        Self::with_refiner(refiner, settings)
    }
}

impl<R: Refiner> Extractor<R> {
    pub fn with_refiner(refiner: R, settings: &RenderSettings) -> Self {
        Self {
            refiner,
            coarse: settings.coarse,
            radius: settings.canvas_radius(),
            target_edge_length: settings.target_edge_length,
        }
    }

    /// Replace `points` with the cloud extracted from `pixels`.
    ///
    /// `pixels` is the cropped, vignetted source, sized like the picture
    /// window in un-zoomed pixels. Ids follow emission order.
    pub fn extract(
        &self,
        pixels: &RgbaImage,
        scene: &SceneParameters,
        points: &mut Vec<Point>,
    ) -> ExtractReport {
        points.clear();
        let (px, py) = pixels.dimensions();
        if px == 0 || py == 0 {
            return ExtractReport::default();
        }

        let mapping = FrameMapping::new(scene, self.radius, px, py);
        let lattice = honeycomb(pixels, &mapping, self.coarse);
        let lattice_vertices = lattice.vertex_count();

        let mesh = self
            .refiner
            .refine(lattice, self.target_edge_length)
            .compact();
        let remeshed_vertices = mesh.vertex_count();

        for (_, pos) in mesh.vertices() {
            let Some((x, y)) = mapping.to_pixel(pos.x, pos.y) else {
                continue;
            };
            let p = pixels.get_pixel(x, y);
            points.push(Point {
                id: points.len() as u32,
                pos,
                color: [p[0], p[1], p[2]],
            });
        }

        debug!(
            "extracted {} points ({lattice_vertices} lattice, {remeshed_vertices} remeshed)",
            points.len()
        );
        ExtractReport {
            lattice_vertices,
            remeshed_vertices,
            points: points.len(),
        }
    }
}
