//! Sphere and light kernels.
//!
//! Every point becomes a disc of radius `r` whose surface bulges towards the
//! viewer by `sqrt(r² − d²)`. Work is split into horizontal bands of
//! [`BAND_ROWS`] rows; each band owns its canvas and depth rows and walks the
//! splats touching it in emission order, so ties resolve the same way a
//! sequential loop would (the earlier point keeps the pixel).

use rayon::prelude::*;

use super::Software;
use crate::{cloud::Point, renderer::Channel, scene::Viewpoint};

pub(super) const BAND_ROWS: usize = 16;

/// A point after projection through one viewpoint.
#[derive(Clone, Copy, Debug, PartialEq)]
pub(crate) struct Splat {
    pub cx: i32,
    pub cy: i32,
    pub z: f32,
    pub color: [u8; 3],
}

impl Splat {
    /// Project `points` in parallel, reusing `out`'s allocation.
    pub(super) fn project_all(points: &[Point], view: &Viewpoint, out: &mut Vec<Splat>) {
        points
            .par_iter()
            .map(|p| {
                let (cx, cy) = view.pixel(p.pos);
                Splat {
                    cx,
                    cy,
                    z: p.pos.z,
                    color: p.color,
                }
            })
            .collect_into_vec(out);
    }
}

/// Splat indices per band, rebuilt every pass without reallocating.
#[derive(Debug)]
pub(crate) struct BandBins {
    height: usize,
    bands: Vec<Vec<u32>>,
}

impl BandBins {
    pub(super) fn new(height: usize) -> Self {
        Self {
            height,
            bands: vec![Vec::new(); height.div_ceil(BAND_ROWS)],
        }
    }

    pub(super) fn fill(&mut self, splats: &[Splat], radius: i32) {
        self.bands.iter_mut().for_each(Vec::clear);
        let last = self.height as i32 - 1;
        for (i, s) in splats.iter().enumerate() {
            let (top, bottom) = (s.cy - radius, s.cy + radius);
            if bottom < 0 || top > last {
                continue;
            }
            let first = top.max(0) as usize / BAND_ROWS;
            let end = bottom.min(last) as usize / BAND_ROWS;
            for band in &mut self.bands[first..=end] {
                band.push(i as u32);
            }
        }
    }

    #[cfg(test)]
    pub(super) fn band(&self, b: usize) -> &[u32] {
        &self.bands[b]
    }
}

/// Walk the disc of `s` restricted to rows `y0..y0 + rows` and hand every
/// covered pixel's band-local index and surface depth to `put`.
#[inline]
fn disc(
    s: &Splat,
    radius: i32,
    width: usize,
    y0: usize,
    rows: usize,
    mut put: impl FnMut(usize, f32),
) {
    let r2 = radius * radius;
    let (ylo, yhi) = (y0 as i32, (y0 + rows) as i32);
    for dy in -radius..=radius {
        let y = s.cy + dy;
        if y < ylo || y >= yhi {
            continue;
        }
        for dx in -radius..=radius {
            let d2 = dx * dx + dy * dy;
            if d2 > r2 {
                continue;
            }
            let x = s.cx + dx;
            if x < 0 || x as usize >= width {
                continue;
            }
            let surface = s.z + ((r2 - d2) as f32).sqrt();
            put(x as usize + (y - ylo) as usize * width, surface);
        }
    }
}

impl Software {
    /// Camera kernel: colour and depth.
    pub(super) fn splat_spheres(&mut self) {
        let width = self.scene.cx;
        if width == 0 {
            return;
        }
        let radius = self.radius;
        let splats = &self.splats;
        let canvas: &mut [u8] = &mut self.canvas;
        let depth = self.depth.plane_mut(Channel::Camera);

        canvas
            .par_chunks_mut(BAND_ROWS * width * 4)
            .zip(depth.par_chunks_mut(BAND_ROWS * width))
            .zip(self.bins.bands.par_iter())
            .enumerate()
            .for_each(|(b, ((rgba, z), bin))| {
                let rows = z.len() / width;
                for &i in bin {
                    let s = &splats[i as usize];
                    disc(s, radius, width, b * BAND_ROWS, rows, |k, surface| {
                        if surface > z[k] {
                            z[k] = surface;
                            let px = &mut rgba[k * 4..k * 4 + 4];
                            px[..3].copy_from_slice(&s.color);
                            px[3] = 255;
                        }
                    });
                }
            });
    }

    /// Light kernel: depth only.
    pub(super) fn splat_depth(&mut self, channel: Channel) {
        let width = self.scene.cx;
        if width == 0 {
            return;
        }
        let radius = self.radius;
        let splats = &self.splats;
        let depth = self.depth.plane_mut(channel);

        depth
            .par_chunks_mut(BAND_ROWS * width)
            .zip(self.bins.bands.par_iter())
            .enumerate()
            .for_each(|(b, (z, bin))| {
                let rows = z.len() / width;
                for &i in bin {
                    let s = &splats[i as usize];
                    disc(s, radius, width, b * BAND_ROWS, rows, |k, surface| {
                        if surface > z[k] {
                            z[k] = surface;
                        }
                    });
                }
            });
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::{
        renderer::Renderer,
        scene::{SceneParameters, WallTexture},
        settings::RenderSettings,
    };
    use glam::vec3;

    fn seeded() -> Software {
        let scene = SceneParameters::from_preset("wall06", 1.0).unwrap();
        let wall = WallTexture::solid(scene.cx, scene.cy, [90, 90, 90]);
        let mut sw = Software::new(scene, &RenderSettings::default()).unwrap();
        sw.begin_frame(&wall).unwrap();
        sw
    }

    fn point(id: u32, x: f32, y: f32, z: f32, color: [u8; 3]) -> Point {
        Point {
            id,
            pos: vec3(x, y, z),
            color,
        }
    }

    #[test]
    fn bins_cover_every_touched_band() {
        let mut bins = BandBins::new(40);
        let s = |cy| Splat {
            cx: 5,
            cy,
            z: 0.0,
            color: [0; 3],
        };
        bins.fill(&[s(15), s(0), s(39), s(-10), s(60)], 4);
        assert_eq!(bins.band(0), &[0, 1]);
        assert_eq!(bins.band(1), &[0]);
        assert_eq!(bins.band(2), &[2]);
    }

    #[test]
    fn disc_respects_band_and_radius() {
        let s = Splat {
            cx: 2,
            cy: 3,
            z: 1.0,
            color: [0; 3],
        };
        let mut hits = Vec::new();
        disc(&s, 2, 10, 0, 4, |k, z| hits.push((k, z)));
        // rows 1..=3 visible, row 4 and 5 belong to the next band
        assert!(hits.iter().all(|&(k, _)| k < 40));
        let centre = hits.iter().find(|&&(k, _)| k == 3 * 10 + 2).unwrap();
        assert_eq!(centre.1, 3.0);
        assert_eq!(hits.len(), 1 + 3 + 5);
    }

    #[test]
    fn sphere_pass_paints_the_nearest_surface() {
        let mut sw = seeded();
        // Three points on one camera ray.
        let cam = sw.scene.camera;
        let on_ray = |id, z, color| Point {
            id,
            pos: cam.unproject(600.5, 300.5, z),
            color,
        };
        sw.draw_spheres(&[
            on_ray(0, -100.0, [255, 0, 0]),
            on_ray(1, -50.0, [0, 255, 0]),
            on_ray(2, -150.0, [0, 0, 255]),
        ]);
        assert_eq!(sw.canvas.get_pixel(600, 300).0, [0, 255, 0, 255]);
        assert_eq!(sw.depth.get(Channel::Camera, 600, 300), Some(-46.0));
    }

    #[test]
    fn equal_depth_keeps_the_earlier_point() {
        let mut sw = seeded();
        sw.draw_spheres(&[
            point(0, 600.0, 300.0, -20.0, [1, 2, 3]),
            point(1, 600.0, 300.0, -20.0, [9, 9, 9]),
        ]);
        let (px, py) = sw.scene.camera.pixel(vec3(600.0, 300.0, -20.0));
        assert_eq!(sw.canvas.get_pixel(px as u32, py as u32).0, [1, 2, 3, 255]);
    }

    #[test]
    fn light_pass_touches_depth_only() {
        let mut sw = seeded();
        let canvas = sw.canvas.clone();
        let camera = sw.depth.plane(Channel::Camera).to_vec();
        let p = point(0, 600.0, 300.0, -30.0, [255, 255, 255]);
        sw.draw_light(Channel::Light2, &[p]);
        assert_eq!(sw.canvas, canvas);
        assert_eq!(sw.depth.plane(Channel::Camera), &camera[..]);
        let (lx, ly) = sw.scene.light2.pixel(p.pos);
        assert_eq!(sw.depth.get(Channel::Light2, lx, ly), Some(-26.0));
    }

    #[test]
    fn discs_straddling_a_band_edge_are_whole() {
        let mut sw = seeded();
        // Wall-plane points project onto themselves.
        let y = (BAND_ROWS * 20) as f32;
        sw.draw_light(Channel::Light1, &[point(0, 600.0, y, 0.0, [0; 3])]);
        for dy in -4..=4 {
            let z = sw.depth.get(Channel::Light1, 600, y as i32 + dy).unwrap();
            assert!(z >= 0.0, "row offset {dy}");
        }
    }
}
