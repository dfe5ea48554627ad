use rayon::prelude::*;

use super::Software;
use crate::renderer::{Channel, DepthBuffer};

/// Darkening per unit of occluder height, relative to the depth extent.
const SHADOW_WEIGHT: f32 = 64.0;

impl Software {
    /// Recover the camera-visible world point behind every pixel and darken
    /// it by how far each light's nearest surface stands above it.
    pub(super) fn shade_occluded(&mut self) {
        let width = self.scene.cx;
        if width == 0 {
            return;
        }
        let Software {
            scene,
            depth,
            canvas,
            ..
        } = self;
        let depth: &DepthBuffer = depth;
        let eye = scene.camera;
        let lights = [(Channel::Light1, scene.light1), (Channel::Light2, scene.light2)];
        let camera = depth.plane(Channel::Camera);
        let k = SHADOW_WEIGHT / scene.cz;

        let canvas: &mut [u8] = canvas;
        canvas
            .par_chunks_mut(width * 4)
            .enumerate()
            .for_each(|(y, row)| {
                for (x, px) in row.chunks_exact_mut(4).enumerate() {
                    let z = camera[x + y * width];
                    let world = eye.unproject(x as f32, y as f32, z);

                    let mut shadow = 0.0;
                    for (ch, view) in &lights {
                        let (lx, ly) = view.pixel(world);
                        let Some(occluder) = depth.get(*ch, lx, ly) else {
                            continue;
                        };
                        if occluder > z {
                            shadow -= k * (occluder - z);
                        }
                    }

                    for c in &mut px[..3] {
                        *c = (*c as f32 + shadow).clamp(0.0, 255.0) as u8;
                    }
                    px[3] = 255;
                }
            });
    }
}
