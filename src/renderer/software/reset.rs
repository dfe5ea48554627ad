//! Frame seeding: wall background, recess placeholder and the bevel
//! silhouette in all three depth maps.

use glam::{Vec3, vec3};
use rayon::prelude::*;

use super::Software;
use crate::{renderer::Channel, scene::WallTexture};

/// Placeholder darkening of the recess before any point lands in it.
const RECESS_DIM: f32 = 0.2;

/// Bevel shading: base grey, jitter span, Lambert weight per light.
const BEVEL_BASE: i32 = 64;
const BEVEL_JITTER: i32 = 40;
const BEVEL_LAMBERT: f32 = 32.0;

impl Software {
    /* 1. Pass A: per-pixel classification ----------------------------*/
    pub(super) fn classify_pixels(&mut self, wall: &WallTexture) {
        let scene = &self.scene;
        let width = scene.cx;
        let (zfar, cx0, cy0) = (scene.zfar, scene.cx0, scene.cy0);

        // Frame corners carried down to the recess floor.
        let (x1, y1) = scene
            .camera
            .pixel(vec3(scene.fx0 as f32, scene.fy0 as f32, zfar));
        let (x2, y2) = scene.camera.pixel(vec3(
            (scene.fx0 + scene.fx) as f32,
            (scene.fy0 + scene.fy) as f32,
            zfar,
        ));

        let canvas: &mut [u8] = &mut self.canvas;
        let camera = self.depth.plane_mut(Channel::Camera);
        if width == 0 {
            return;
        }

        canvas
            .par_chunks_mut(width * 4)
            .zip(camera.par_chunks_mut(width))
            .enumerate()
            .for_each(|(y, (row, depth))| {
                let yi = y as i32;
                for (x, (px, z)) in row.chunks_exact_mut(4).zip(depth.iter_mut()).enumerate() {
                    let xi = x as i32;
                    let texel = wall.sample(cx0 + x, cy0 + y);
                    let (d, dim) = if !scene.in_frame(xi, yi) {
                        (0.0, false)
                    } else if xi < x1 || xi > x2 || yi < y1 || yi > y2 {
                        (zfar, false)
                    } else {
                        (zfar, true)
                    };
                    *z = d;
                    for c in 0..3 {
                        px[c] = if dim {
                            (texel[c] as f32 * RECESS_DIM) as u8
                        } else {
                            texel[c]
                        };
                    }
                    px[3] = 255;
                }
            });

        self.depth.replicate(Channel::Camera);
    }

    /* 2. Pass B: bevel silhouette -------------------------------------*/
    pub(super) fn seed_frame_edges(&mut self) {
        let (fx0, fy0, fx, fy) = (self.scene.fx0, self.scene.fy0, self.scene.fx, self.scene.fy);
        let floor = self.scene.zfar.ceil() as i32;

        for zi in (floor..=0).rev() {
            let z = zi as f32;
            for y in fy0..=fy0 + fy {
                self.register_edge(vec3(fx0 as f32, y as f32, z), Vec3::X);
                self.register_edge(vec3((fx0 + fx) as f32, y as f32, z), Vec3::NEG_X);
            }
            for x in fx0..=fx0 + fx {
                self.register_edge(vec3(x as f32, fy0 as f32, z), Vec3::Y);
                self.register_edge(vec3(x as f32, (fy0 + fy) as f32, z), Vec3::NEG_Y);
            }
        }
    }

    /// Push one bevel point through every viewpoint. The camera shades the
    /// pixel it uncovers when the frame is solid; lights only take depth.
    fn register_edge(&mut self, p: Vec3, normal: Vec3) {
        let views = self.scene.viewpoints();
        for ch in Channel::ALL {
            let (x, y) = views[ch.index()].pixel(p);
            let Some(i) = self.depth.raise(ch, x, y, p.z) else {
                continue;
            };
            if ch == Channel::Camera && self.scene.solid {
                self.shade_bevel(i, p, normal);
            }
        }
    }

    fn shade_bevel(&mut self, i: usize, p: Vec3, normal: Vec3) {
        let lambert: f32 = [self.scene.light1, self.scene.light2]
            .iter()
            .map(|l| BEVEL_LAMBERT * (normal.dot(l.direction_from(p)) - 1.0))
            .sum();

        let canvas: &mut [u8] = &mut self.canvas;
        let px = &mut canvas[i * 4..i * 4 + 4];
        for c in &mut px[..3] {
            let jitter = self.rng.i32(0..BEVEL_JITTER);
            *c = ((BEVEL_BASE + jitter) as f32 + lambert).clamp(0.0, 255.0) as u8;
        }
        px[3] = 255;
    }
}
