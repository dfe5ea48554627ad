use glam::vec3;
use once_cell::sync::Lazy;
use std::collections::HashMap;
use thiserror::Error;

use super::Viewpoint;

/// Depth-axis extent of the canvas at zoom 1 (one luminance step per unit).
pub const DEPTH_UNITS: f32 = 256.0;

/// One row of the preset table.
///
/// Layout: `{ wall_w, wall_h, frame_x0, frame_y0, frame_w, frame_h,
/// focal, far, camera_height, l1x, l1y, l1z, l2x, l2y, l2z, solid }`.
///
/// * `focal` and `far` are multiples of the depth extent `cz`.
/// * camera height and light x/y are fractions of the canvas size.
/// * light z factors are fractions of the focal distance.
type PresetRow = [f32; 16];

#[rustfmt::skip]
const PRESETS: &[(&str, PresetRow)] = &[
    ("wall01", [1365., 768., 500., 30., 512., 650., 5., -0., 0.66, 0.2, 0.2, 1., 0.33, 0.33, 1., 1.]),
    ("wall02", [1365., 768., 100., 0., 512., 615., 3., -0.75, 0.55, 0.7, 0.1, 1., 0.99, 0.5, 0.6, 1.]),
    ("wall03", [768., 1365., 99., 192., 472., 722., 3., -0.5, 0.5, 0.7, 0.1, 1., 0.99, 0.5, 0.6, 1.]),
    ("wall04", [1365., 768., 730., 110., 438., 438., 7., -0.75, 0.4, 0.4, 0., 0.5, 0.99, 0.5, 0.3, 1.]),
    ("wall05", [1365., 768., 0., 65., 1365., 590., 3.7, -1., 0.6, 0.4, 0.1, 0.4, 0.6, 0.1, 0.1, 0.]),
    ("wall06", [1365., 768., 418., 79., 528., 551., 6., -0.75, 0.55, 0.1, 0.2, 0.5, 0., 0.5, 0.6, 1.]),
    ("wall07", [1365., 768., 316., 18., 732., 732., 6., -0.75, 0.5, 0., 0., 0.5, 0., 0.5, 0.6, 1.]),
    ("wall08", [1365., 768., 0., 0., 1365., 620., 11., -1., 0.4, 0.9, 0., 1., 0.99, 0.5, 0.6, 1.]),
    ("wall10", [1365., 768., 0., 20., 1315., 600., 3.7, -1., 0.63, 0.9, 0., 1., 0.99, 0.5, 0.6, 1.]),
    ("wall11", [1365., 768., 0., 0., 1335., 630., 12., -1., 0.4, 0.9, 0., 1., 0.99, 0.5, 0.6, 1.]),
    ("wall12", [1365., 768., 366., 65., 635., 533., 3., -0.5, 0.5, 0.99, 0., 1., 0.99, 0.1, 0.6, 1.]),
    ("wall13", [768., 1365., 243., 710., 299., 517., 3., -0.5, 0.9, 0., 0., 1., 0.99, 0.5, 0.6, 1.]),
    ("wall14", [1365., 768., 393., 140., 546., 399., 5., -0.75, 0.5, 0.9, 0.1, 1., 0.9, 0.1, 1., 1.]),
    ("wall20", [1365., 768., 518., 95., 355., 369., 7., -0.75, 0.5, 0.9, 0.1, 1., 0.4, 0.1, 1., 1.]),
    ("wall21", [1365., 768., 459., 49., 447., 555., 8., -0.75, 0.6, 0.7, 0., 0.8, 0., 0.5, 0.6, 1.]),
];

static BY_NAME: Lazy<HashMap<&'static str, &'static PresetRow>> =
    Lazy::new(|| PRESETS.iter().map(|(name, row)| (*name, row)).collect());

/// Names of every known preset, in table order.
pub fn preset_names() -> impl Iterator<Item = &'static str> {
    PRESETS.iter().map(|(name, _)| *name)
}

#[derive(Error, Debug, PartialEq)]
pub enum SceneError {
    #[error("no parameters found for preset `{0}`")]
    UnknownPreset(String),

    #[error("zoom factor {0} must be finite and >= 1")]
    BadZoom(f32),
}

/// Absolute camera, light, canvas and frame geometry for one wall.
///
/// Every pixel-space field is the preset value scaled by `zoom`, so raising
/// the zoom raises raster precision without changing the composition.
///
/// Depth axis: `0` is the wall plane, `zfar < 0` is the bottom of the frame
/// recess and the viewer side is positive.
#[derive(Clone, Debug, PartialEq)]
pub struct SceneParameters {
    pub preset: &'static str,
    pub zoom: f32,

    /* wall (screen) size */
    pub wx: usize,
    pub wy: usize,

    /* canvas, including the shadow area around the frame */
    pub cx0: usize,
    pub cy0: usize,
    pub cx: usize,
    pub cy: usize,
    pub cz: f32,

    /* picture window inside the canvas */
    pub fx0: i32,
    pub fy0: i32,
    pub fx: i32,
    pub fy: i32,

    pub zfocal: f32,
    pub zfar: f32,
    pub znear: f32,

    pub camera: Viewpoint,
    pub light1: Viewpoint,
    pub light2: Viewpoint,

    /// Draw the shaded frame bevel.
    pub solid: bool,
}

impl SceneParameters {
    /// Resolve `name` from the preset table at the given `zoom`.
    pub fn from_preset(name: &str, zoom: f32) -> Result<Self, SceneError> {
        if !zoom.is_finite() || zoom < 1.0 {
            return Err(SceneError::BadZoom(zoom));
        }
        let (&preset, &p) = BY_NAME
            .get_key_value(name)
            .ok_or_else(|| SceneError::UnknownPreset(name.to_string()))?;

        let px = |v: f32| (zoom * v) as i32;

        let wx = px(p[0]) as usize;
        let wy = px(p[1]) as usize;
        let cx = wx;
        let cy = wy;
        let cz = (zoom * DEPTH_UNITS).trunc();
        let zfocal = cz * p[6];
        let zfar = cz * p[7];
        let (cxf, cyf) = (cx as f32, cy as f32);

        Ok(Self {
            preset,
            zoom,
            wx,
            wy,
            cx0: 0,
            cy0: 0,
            cx,
            cy,
            cz,
            fx0: px(p[2]),
            fy0: px(p[3]),
            fx: px(p[4]),
            fy: px(p[5]),
            zfocal,
            zfar,
            znear: cz + zfar,
            camera: Viewpoint::new(vec3(0.5 * cxf, p[8] * cyf, zfocal)),
            light1: Viewpoint::new(vec3(p[9] * cxf, p[10] * cyf, p[11] * zfocal)),
            light2: Viewpoint::new(vec3(p[12] * cxf, p[13] * cyf, p[14] * zfocal)),
            solid: p[15] > 0.0,
        })
    }

    /// Camera, light 1, light 2, in depth-channel order.
    #[inline]
    pub fn viewpoints(&self) -> [Viewpoint; 3] {
        [self.camera, self.light1, self.light2]
    }

    /// True if canvas pixel `(x, y)` lies inside the picture window.
    #[inline]
    pub fn in_frame(&self, x: i32, y: i32) -> bool {
        x >= self.fx0 && x < self.fx0 + self.fx && y >= self.fy0 && y < self.fy0 + self.fy
    }

    /// Size of the source image the extractor expects, in un-zoomed pixels.
    pub fn frame_source_size(&self) -> (u32, u32) {
        (
            (self.fx as f32 / self.zoom) as u32,
            (self.fy as f32 / self.zoom) as u32,
        )
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn resolves_wall06_at_zoom_one() {
        let p = SceneParameters::from_preset("wall06", 1.0).unwrap();
        assert_eq!((p.wx, p.wy), (1365, 768));
        assert_eq!((p.cx, p.cy), (1365, 768));
        assert_eq!((p.fx0, p.fy0, p.fx, p.fy), (418, 79, 528, 551));
        assert_eq!(p.cz, 256.0);
        assert_eq!(p.zfocal, 1536.0);
        assert_eq!(p.zfar, -192.0);
        assert_eq!(p.znear, 64.0);
        assert!(p.solid);
        assert_eq!(p.camera.pos(), vec3(682.5, 0.55 * 768.0, 1536.0));
        assert!(p.zfar < 0.0 && p.znear > 0.0);
    }

    #[test]
    fn zoom_scales_pixel_fields_uniformly() {
        let one = SceneParameters::from_preset("wall04", 1.0).unwrap();
        let two = SceneParameters::from_preset("wall04", 2.0).unwrap();
        assert_eq!(two.cx, 2 * one.cx);
        assert_eq!(two.fx0, 2 * one.fx0);
        assert_eq!(two.fy, 2 * one.fy);
        assert_eq!(two.cz, 2.0 * one.cz);
        assert_eq!(two.zfar, 2.0 * one.zfar);
        assert_eq!(two.frame_source_size(), one.frame_source_size());
    }

    #[test]
    fn unknown_preset_is_rejected() {
        let err = SceneParameters::from_preset("wall99", 1.0).unwrap_err();
        assert_eq!(err, SceneError::UnknownPreset("wall99".into()));
    }

    #[test]
    fn zoom_below_one_is_rejected() {
        assert_eq!(
            SceneParameters::from_preset("wall06", 0.5).unwrap_err(),
            SceneError::BadZoom(0.5)
        );
    }

    #[test]
    fn solid_flag_follows_table() {
        assert!(!SceneParameters::from_preset("wall05", 1.0).unwrap().solid);
        assert_eq!(preset_names().count(), 15);
    }

    #[test]
    fn in_frame_is_half_open() {
        let p = SceneParameters::from_preset("wall06", 1.0).unwrap();
        assert!(p.in_frame(418, 79));
        assert!(p.in_frame(418 + 527, 79 + 550));
        assert!(!p.in_frame(418 + 528, 100));
        assert!(!p.in_frame(417, 100));
    }
}
