use super::RenderError;

/// Which viewpoint a depth plane belongs to.
#[derive(Clone, Copy, Debug, PartialEq, Eq, Hash)]
pub enum Channel {
    Camera = 0,
    Light1 = 1,
    Light2 = 2,
}

impl Channel {
    pub const ALL: [Channel; 3] = [Channel::Camera, Channel::Light1, Channel::Light2];
    pub const LIGHTS: [Channel; 2] = [Channel::Light1, Channel::Light2];

    #[inline]
    pub fn index(self) -> usize {
        self as usize
    }
}

/// Per-pixel depth for the camera and both lights.
///
/// Values are world `z` of the registered surface. Every viewpoint sits on
/// the positive side of the wall, so the **largest** value is the surface
/// nearest that viewpoint and wins every update.
#[derive(Clone, Debug)]
pub struct DepthBuffer {
    width: usize,
    height: usize,
    planes: [Vec<f32>; 3],
}

impl DepthBuffer {
    /// Allocate all three planes up front; failure is fatal for the run.
    pub fn new(width: usize, height: usize) -> Result<Self, RenderError> {
        let len = width * height;
        let plane = || -> Result<Vec<f32>, RenderError> {
            let mut v = Vec::new();
            v.try_reserve_exact(len).map_err(|_| RenderError::Allocation {
                what: "depth plane",
                width,
                height,
            })?;
            v.resize(len, 0.0);
            Ok(v)
        };
        Ok(Self {
            width,
            height,
            planes: [plane()?, plane()?, plane()?],
        })
    }

    #[inline]
    pub fn width(&self) -> usize {
        self.width
    }

    #[inline]
    pub fn height(&self) -> usize {
        self.height
    }

    /// Flat index of `(x, y)`, `None` off-canvas.
    #[inline]
    pub fn index(&self, x: i32, y: i32) -> Option<usize> {
        let inside = x >= 0 && y >= 0 && (x as usize) < self.width && (y as usize) < self.height;
        inside.then(|| x as usize + y as usize * self.width)
    }

    #[inline]
    pub fn get(&self, ch: Channel, x: i32, y: i32) -> Option<f32> {
        self.index(x, y).map(|i| self.planes[ch.index()][i])
    }

    #[inline]
    pub fn plane(&self, ch: Channel) -> &[f32] {
        &self.planes[ch.index()]
    }

    #[inline]
    pub fn plane_mut(&mut self, ch: Channel) -> &mut [f32] {
        &mut self.planes[ch.index()]
    }

    /// Store `z` at `(x, y)` if it lies nearer the viewpoint than what is
    /// there. Returns the flat index when the value was raised.
    #[inline]
    pub fn raise(&mut self, ch: Channel, x: i32, y: i32, z: f32) -> Option<usize> {
        let i = self.index(x, y)?;
        let slot = &mut self.planes[ch.index()][i];
        if z > *slot {
            *slot = z;
            Some(i)
        } else {
            None
        }
    }

    /// Copy one plane over the others (Pass A seeds all three identically).
    pub fn replicate(&mut self, from: Channel) {
        let [a, b, c] = &mut self.planes;
        match from {
            Channel::Camera => {
                b.copy_from_slice(a);
                c.copy_from_slice(a);
            }
            Channel::Light1 => {
                a.copy_from_slice(b);
                c.copy_from_slice(b);
            }
            Channel::Light2 => {
                a.copy_from_slice(c);
                b.copy_from_slice(c);
            }
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn raise_keeps_the_largest_value() {
        let mut d = DepthBuffer::new(4, 3).unwrap();
        assert_eq!(d.raise(Channel::Light1, 1, 2, -5.0), None);
        assert_eq!(d.raise(Channel::Light1, 1, 2, 7.0), Some(9));
        assert_eq!(d.raise(Channel::Light1, 1, 2, 3.0), None);
        assert_eq!(d.get(Channel::Light1, 1, 2), Some(7.0));
        assert_eq!(d.get(Channel::Camera, 1, 2), Some(0.0));
    }

    #[test]
    fn off_canvas_is_ignored() {
        let mut d = DepthBuffer::new(4, 3).unwrap();
        assert_eq!(d.raise(Channel::Camera, -1, 0, 1.0), None);
        assert_eq!(d.raise(Channel::Camera, 4, 0, 1.0), None);
        assert_eq!(d.get(Channel::Camera, 0, 3), None);
    }

    #[test]
    fn replicate_copies_plane() {
        let mut d = DepthBuffer::new(2, 2).unwrap();
        d.plane_mut(Channel::Camera).fill(-3.0);
        d.replicate(Channel::Camera);
        assert!(d.plane(Channel::Light2).iter().all(|&z| z == -3.0));
    }
}
