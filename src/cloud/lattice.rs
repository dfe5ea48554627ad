use glam::{Vec3, vec3};
use image::RgbaImage;

use super::mesh::{TriMesh, VertexId};
use crate::scene::SceneParameters;

/// Perceptual luminance of an RGB triple, `0 ..= 255`.
#[inline]
pub fn luminance(rgb: [u8; 3]) -> f32 {
    0.299 * rgb[0] as f32 + 0.587 * rgb[1] as f32 + 0.114 * rgb[2] as f32
}

/// Maps source-image pixels into the picture window and back.
///
/// The window is inset by the sphere radius on every side so that sphere
/// surfaces stay inside the frame. Depth comes from luminance: black sits on
/// the recess floor (`zfar`), white one radius short of the canvas depth.
#[derive(Clone, Copy, Debug)]
pub struct FrameMapping {
    fx0: f32,
    fy0: f32,
    ratio_x: f32,
    ratio_y: f32,
    radius: f32,
    px: u32,
    py: u32,
    zfar: f32,
    depth_span: f32,
}

impl FrameMapping {
    pub fn new(scene: &SceneParameters, radius: f32, px: u32, py: u32) -> Self {
        Self {
            fx0: scene.fx0 as f32,
            fy0: scene.fy0 as f32,
            ratio_x: (scene.fx as f32 - 2.0 * radius) / px as f32,
            ratio_y: (scene.fy as f32 - 2.0 * radius) / py as f32,
            radius,
            px,
            py,
            zfar: scene.zfar,
            depth_span: scene.cz - radius,
        }
    }

    /// Frame (canvas) position of source pixel coordinate `(x, y)`.
    #[inline]
    pub fn to_frame(&self, x: f32, y: f32) -> (f32, f32) {
        (
            self.fx0 + self.radius + x * self.ratio_x,
            self.fy0 + self.radius + y * self.ratio_y,
        )
    }

    /// Source pixel under frame position `(xf, yf)`, or `None` when it falls
    /// outside the image.
    #[inline]
    pub fn to_pixel(&self, xf: f32, yf: f32) -> Option<(u32, u32)> {
        let x = ((xf - self.fx0 - self.radius) / self.ratio_x).floor();
        let y = ((yf - self.fy0 - self.radius) / self.ratio_y).floor();
        let inside = x >= 0.0 && y >= 0.0 && x < self.px as f32 && y < self.py as f32;
        inside.then_some((x as u32, y as u32))
    }

    /// Depth of a surface sample with luminance `lum`.
    #[inline]
    pub fn depth(&self, lum: f32) -> f32 {
        self.zfar + self.depth_span * lum / 255.0
    }
}

/// Sample `pixels` on a honeycomb lattice and stitch the samples into a
/// triangle mesh.
///
/// Rows are `coarse · √3/2` apart; odd rows start half a step in, so each
/// pair of rows triangulates into alternating left/right diagonals.
/// A spacing that is not a positive finite number yields an empty mesh.
pub fn honeycomb(pixels: &RgbaImage, mapping: &FrameMapping, coarse: f32) -> TriMesh {
    if !(coarse.is_finite() && coarse > 0.0) {
        return TriMesh::default();
    }
    let (px, py) = pixels.dimensions();
    let step_x = coarse;
    let step_y = coarse * 3f32.sqrt() / 2.0;

    let est = ((px as f32 / step_x + 1.0) * (py as f32 / step_y + 1.0)) as usize;
    let mut mesh = TriMesh::with_capacity(est, 2 * est);

    /* 1. sample rows ---------------------------------------------------*/
    let (mut even_len, mut odd_len, mut rows) = (0u32, 0u32, 0u32);
    let mut y = 0.0f32;
    while y < py as f32 {
        let odd = rows % 2 == 1;
        let mut x = if odd { step_x / 2.0 } else { 0.0 };
        let mut len = 0;
        while x < px as f32 {
            mesh.append_vertex(sample(pixels, mapping, x, y));
            len += 1;
            x += step_x;
        }
        if odd {
            odd_len = len;
        } else {
            even_len = len;
        }
        rows += 1;
        y += step_y;
    }

    /* 2. stitch row pairs ---------------------------------------------*/
    let pair = even_len + odd_len;
    for j in 0..rows.saturating_sub(1) {
        let base = (j / 2) * pair;
        if j % 2 == 0 {
            // even row on top, odd row below
            for i in 0..even_len.saturating_sub(1) {
                let top_left: VertexId = base + i;
                let top_right = top_left + 1;
                let bottom_left = base + even_len + i;
                let bottom_right = bottom_left + 1;
                if i < odd_len {
                    mesh.append_triangle([top_left, bottom_left, top_right]);
                }
                if i + 1 < odd_len {
                    mesh.append_triangle([top_right, bottom_left, bottom_right]);
                }
            }
        } else {
            // odd row on top, next even row below
            for i in 0..odd_len.saturating_sub(1) {
                let top_left: VertexId = base + even_len + i;
                let top_right = top_left + 1;
                let bottom_left = base + pair + i;
                let bottom_right = bottom_left + 1;
                mesh.append_triangle([top_left, bottom_left, bottom_right]);
                if i + 1 < even_len {
                    mesh.append_triangle([top_left, bottom_right, top_right]);
                }
            }
        }
    }
    mesh
}

fn sample(pixels: &RgbaImage, mapping: &FrameMapping, x: f32, y: f32) -> Vec3 {
    let p = pixels.get_pixel(x as u32, y as u32);
    let (xf, yf) = mapping.to_frame(x, y);
    vec3(xf, yf, mapping.depth(luminance([p[0], p[1], p[2]])))
}

#[cfg(test)]
mod tests {
    use super::*;
    use image::Rgba;

    fn scene() -> SceneParameters {
        SceneParameters::from_preset("wall06", 1.0).unwrap()
    }

    #[test]
    fn luminance_weights() {
        assert!((luminance([255, 255, 255]) - 255.0).abs() < 1e-3);
        assert_eq!(luminance([0, 0, 0]), 0.0);
        assert!(luminance([0, 255, 0]) > luminance([255, 0, 0]));
        assert!(luminance([255, 0, 0]) > luminance([0, 0, 255]));
    }

    #[test]
    fn mapping_round_trips_pixels() {
        let s = scene();
        let m = FrameMapping::new(&s, 4.0, 264, 275);
        for &(x, y) in &[(0u32, 0u32), (10, 20), (263, 274), (100, 5)] {
            let (xf, yf) = m.to_frame(x as f32 + 0.5, y as f32 + 0.5);
            assert_eq!(m.to_pixel(xf, yf), Some((x, y)));
        }
        assert_eq!(m.to_pixel(s.fx0 as f32, s.fy0 as f32), None);
        assert_eq!(m.to_pixel((s.fx0 + s.fx) as f32, 200.0), None);
    }

    #[test]
    fn frame_positions_stay_inside_inset_window() {
        let s = scene();
        let m = FrameMapping::new(&s, 4.0, 50, 40);
        let img = RgbaImage::from_pixel(50, 40, Rgba([128, 128, 128, 255]));
        let mesh = honeycomb(&img, &m, 5.0);
        for (_, p) in mesh.vertices() {
            assert!(p.x >= s.fx0 as f32 + 4.0 && p.x < (s.fx0 + s.fx) as f32 - 4.0);
            assert!(p.y >= s.fy0 as f32 + 4.0 && p.y < (s.fy0 + s.fy) as f32 - 4.0);
        }
    }

    #[test]
    fn lattice_rows_alternate_and_triangulate() {
        let s = scene();
        let img = RgbaImage::from_pixel(20, 10, Rgba([0, 0, 0, 255]));
        let m = FrameMapping::new(&s, 4.0, 20, 10);
        let mesh = honeycomb(&img, &m, 5.0);
        // rows at y = 0, 4.33, 8.66 ; even rows x = 0,5,10,15 ; odd x = 2.5 .. 17.5
        assert_eq!(mesh.vertex_count(), 4 + 4 + 4);
        assert_eq!(mesh.triangle_count(), 6 + 6);
        assert!(mesh.vertices().all(|(_, p)| p.z == s.zfar));
        let n = mesh.max_vertex_id() as u32;
        assert!(mesh.triangles().all(|(_, t)| t.iter().all(|&v| v < n)));
    }

    #[test]
    fn degenerate_spacing_gives_an_empty_lattice() {
        let s = scene();
        let img = RgbaImage::from_pixel(20, 10, Rgba([0, 0, 0, 255]));
        let m = FrameMapping::new(&s, 4.0, 20, 10);
        for coarse in [0.0, -5.0, f32::NAN, f32::INFINITY] {
            let mesh = honeycomb(&img, &m, coarse);
            assert_eq!(mesh.vertex_count(), 0, "coarse {coarse}");
            assert_eq!(mesh.triangle_count(), 0, "coarse {coarse}");
        }
    }
}
