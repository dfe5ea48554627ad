use glam::{Vec2, Vec3, vec2, vec3};

/// A point of view on the wall: the camera or one of the two lights.
///
/// All three share one projection model: a world point is carried along the
/// ray from the viewpoint onto the wall plane `z = 0`, and the hit position is
/// its pixel on the canvas. There is no rotation and no focal scaling; the
/// viewpoint's height above the wall does all the perspective work.
#[derive(Clone, Copy, Debug, PartialEq)]
pub struct Viewpoint {
    pos: Vec3,
}

impl Viewpoint {
    pub fn new(pos: Vec3) -> Self {
        Self { pos }
    }

    #[inline]
    pub fn pos(&self) -> Vec3 {
        self.pos
    }

    /// Wall-plane position of world point `p` as seen from here.
    #[inline]
    pub fn project(&self, p: Vec3) -> Vec2 {
        let o = self.pos;
        vec2(
            o.x + (p.x - o.x) * (0.0 - o.z) / (p.z - o.z),
            o.y + (p.y - o.y) * (0.0 - o.z) / (p.z - o.z),
        )
    }

    /// Integer pixel of `p` (truncated towards zero, like the splat kernels).
    #[inline]
    pub fn pixel(&self, p: Vec3) -> (i32, i32) {
        let s = self.project(p);
        (s.x as i32, s.y as i32)
    }

    /// Inverse of [`project`](Self::project): the world point at depth `z`
    /// whose projection lands on wall position `(xp, yp)`.
    #[inline]
    pub fn unproject(&self, xp: f32, yp: f32, z: f32) -> Vec3 {
        let o = self.pos;
        vec3(
            o.x + (xp - o.x) * (z - o.z) / (0.0 - o.z),
            o.y + (yp - o.y) * (z - o.z) / (0.0 - o.z),
            z,
        )
    }

    /// Unit vector from `p` towards this viewpoint.
    #[inline]
    pub fn direction_from(&self, p: Vec3) -> Vec3 {
        (self.pos - p).normalize_or_zero()
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn wall_plane_points_project_onto_themselves() {
        let v = Viewpoint::new(vec3(100.0, 50.0, 1000.0));
        let p = vec3(321.0, 12.0, 0.0);
        assert!((v.project(p) - p.truncate()).length() < 1e-4);
    }

    #[test]
    fn recessed_points_shrink_towards_the_viewpoint() {
        let v = Viewpoint::new(vec3(0.0, 0.0, 1000.0));
        // z = -1000 is twice as far as the wall, so offsets halve.
        let s = v.project(vec3(200.0, -80.0, -1000.0));
        assert!((s - vec2(100.0, -40.0)).length() < 1e-4);
    }

    #[test]
    fn unproject_inverts_project() {
        let v = Viewpoint::new(vec3(682.5, 422.4, 1536.0));
        let p = vec3(500.0, 300.0, -120.0);
        let s = v.project(p);
        let back = v.unproject(s.x, s.y, p.z);
        assert!((back - p).length() < 1e-2);
    }

    #[test]
    fn direction_points_at_viewpoint() {
        let v = Viewpoint::new(vec3(0.0, 0.0, 10.0));
        assert_eq!(v.direction_from(Vec3::ZERO), Vec3::Z);
    }
}
