//! Isotropic remeshing used to even out point density.
//!
//! One [`IsotropicRemesher`] pass runs four stages, each on a fresh
//! [`Topology`] snapshot:
//!
//! 1. split edges longer than `max_factor · target`,
//! 2. collapse edges shorter than `min_factor · target`,
//! 3. flip edges that bring vertex valences closer to 6 (4 on the boundary),
//! 4. uniform Laplacian smoothing of interior vertices.
//!
//! Within a stage every edit marks the triangles (or vertices) it touched;
//! later candidates overlapping them wait for the next pass. With the
//! default ten passes that converges well for lattice-sized inputs.

use bitflags::bitflags;
use glam::Vec3;
use log::debug;

use super::mesh::{EdgeKey, Topology, TriMesh, TriangleId, VertexId, edge_key, opposite};

/// Mesh refinement seam: anything that turns a mesh into a better-spaced
/// mesh at roughly `target_edge_length`.
pub trait Refiner {
    fn refine(&self, mesh: TriMesh, target_edge_length: f32) -> TriMesh;
}

bitflags! {
    /// Operations an edge refuses.
    #[derive(Debug, Clone, Copy, PartialEq, Eq)]
    pub struct EdgeConstraint: u8 {
        const NO_SPLIT    = 0x01;
        const NO_COLLAPSE = 0x02;
        const NO_FLIP     = 0x04;
    }
}

#[derive(Clone, Debug)]
pub struct IsotropicRemesher {
    pub iterations: usize,
    pub min_factor: f32,
    pub max_factor: f32,
    /// Laplacian step in `[0, 1]`.
    pub smooth_speed: f32,
    pub enable_splits: bool,
    pub enable_collapses: bool,
    pub enable_flips: bool,
    pub enable_smoothing: bool,
    /// Pin boundary vertices and forbid collapsing/flipping open edges.
    pub preserve_boundary: bool,
}

impl Default for IsotropicRemesher {
    fn default() -> Self {
        Self {
            iterations: 10,
            min_factor: 0.7,
            max_factor: 1.3,
            smooth_speed: 0.5,
            enable_splits: true,
            enable_collapses: true,
            enable_flips: true,
            enable_smoothing: true,
            preserve_boundary: true,
        }
    }
}

impl Refiner for IsotropicRemesher {
    fn refine(&self, mut mesh: TriMesh, target_edge_length: f32) -> TriMesh {
        let min_len = target_edge_length * self.min_factor;
        let max_len = target_edge_length * self.max_factor;
        for pass in 0..self.iterations {
            let stats = self.pass(&mut mesh, min_len, max_len);
            debug!(
                "remesh pass {pass}: {} splits, {} collapses, {} flips, {} vertices",
                stats.splits,
                stats.collapses,
                stats.flips,
                mesh.vertex_count()
            );
        }
        mesh
    }
}

#[derive(Default, Debug, Clone, Copy)]
struct PassStats {
    splits: usize,
    collapses: usize,
    flips: usize,
}

impl IsotropicRemesher {
    fn pass(&self, mesh: &mut TriMesh, min_len: f32, max_len: f32) -> PassStats {
        let mut stats = PassStats::default();
        if self.enable_splits {
            stats.splits = self.split_long_edges(mesh, max_len);
        }
        if self.enable_collapses {
            stats.collapses = self.collapse_short_edges(mesh, min_len, max_len);
        }
        if self.enable_flips {
            stats.flips = self.flip_edges(mesh);
        }
        if self.enable_smoothing {
            self.smooth(mesh);
        }
        stats
    }

    fn constraint(&self, topo: &Topology, key: EdgeKey) -> EdgeConstraint {
        if self.preserve_boundary && topo.is_boundary_edge(key) {
            EdgeConstraint::NO_COLLAPSE | EdgeConstraint::NO_FLIP
        } else {
            EdgeConstraint::empty()
        }
    }

    /*──────────────────────── splits ─────────────────────────────*/

    fn split_long_edges(&self, mesh: &mut TriMesh, max_len: f32) -> usize {
        let topo = Topology::build(mesh);
        let max_sq = max_len * max_len;

        let mut candidates: Vec<(f32, EdgeKey)> = topo
            .edges
            .keys()
            .filter(|&&k| !self.constraint(&topo, k).contains(EdgeConstraint::NO_SPLIT))
            .map(|&(a, b)| (mesh.position(a).distance_squared(mesh.position(b)), (a, b)))
            .filter(|(len_sq, _)| *len_sq > max_sq)
            .collect();
        // longest first, ties broken by id for reproducible output
        candidates.sort_by(|x, y| y.0.total_cmp(&x.0).then(x.1.cmp(&y.1)));

        let mut touched = vec![false; mesh.max_triangle_id()];
        let mut count = 0;
        for (_, (a, b)) in candidates {
            let tris = &topo.edges[&(a, b)];
            if tris.iter().any(|&t| touched[t as usize]) {
                continue;
            }
            let m = mesh.append_vertex(mesh.position(a).lerp(mesh.position(b), 0.5));
            for &t in tris {
                touched[t as usize] = true;
                let tri = mesh.triangle(t);
                let Some(i) = (0..3).find(|&i| edge_key(tri[i], tri[(i + 1) % 3]) == (a, b))
                else {
                    continue;
                };
                let (p, q, r) = (tri[i], tri[(i + 1) % 3], tri[(i + 2) % 3]);
                mesh.set_triangle(t, [p, m, r]);
                mesh.append_triangle([m, q, r]);
                touched.push(true);
            }
            count += 1;
        }
        count
    }

    /*──────────────────────── collapses ──────────────────────────*/

    fn collapse_short_edges(&self, mesh: &mut TriMesh, min_len: f32, max_len: f32) -> usize {
        let topo = Topology::build(mesh);
        let min_sq = min_len * min_len;

        let mut candidates: Vec<(f32, EdgeKey)> = topo
            .edges
            .keys()
            .filter(|&&k| !self.constraint(&topo, k).contains(EdgeConstraint::NO_COLLAPSE))
            .map(|&(a, b)| (mesh.position(a).distance_squared(mesh.position(b)), (a, b)))
            .filter(|(len_sq, _)| *len_sq < min_sq)
            .collect();
        // shortest first
        candidates.sort_by(|x, y| x.0.total_cmp(&y.0).then(x.1.cmp(&y.1)));

        let mut touched = vec![false; mesh.max_triangle_id()];
        let mut count = 0;
        for (_, (a, b)) in candidates {
            let ring_a = &topo.vertex_tris[a as usize];
            let ring_b = &topo.vertex_tris[b as usize];
            if ring_a.iter().chain(ring_b).any(|&t| touched[t as usize]) {
                continue;
            }
            let Some((keep, gone, target)) = self.collapse_target(mesh, &topo, a, b) else {
                continue;
            };
            if !Self::collapse_is_valid(mesh, &topo, keep, gone, target, max_len) {
                continue;
            }

            for &t in ring_a.iter().chain(ring_b) {
                touched[t as usize] = true;
            }
            for &t in &topo.vertex_tris[gone as usize] {
                let tri = mesh.triangle(t);
                if tri.contains(&keep) {
                    mesh.remove_triangle(t);
                } else {
                    mesh.set_triangle(t, tri.map(|v| if v == gone { keep } else { v }));
                }
            }
            mesh.set_position(keep, target);
            mesh.remove_vertex(gone);
            count += 1;
        }
        count
    }

    /// Which end survives and where it goes; `None` if the edge must stay.
    fn collapse_target(
        &self,
        mesh: &TriMesh,
        topo: &Topology,
        a: VertexId,
        b: VertexId,
    ) -> Option<(VertexId, VertexId, Vec3)> {
        let (ba, bb) = (topo.boundary[a as usize], topo.boundary[b as usize]);
        if !self.preserve_boundary {
            return Some((a, b, mesh.position(a).lerp(mesh.position(b), 0.5)));
        }
        match (ba, bb) {
            (false, false) => Some((a, b, mesh.position(a).lerp(mesh.position(b), 0.5))),
            (true, false) => Some((a, b, mesh.position(a))),
            (false, true) => Some((b, a, mesh.position(b))),
            (true, true) => None,
        }
    }

    /// Link condition, no over-long edges and no inverted faces.
    fn collapse_is_valid(
        mesh: &TriMesh,
        topo: &Topology,
        keep: VertexId,
        gone: VertexId,
        target: Vec3,
        max_len: f32,
    ) -> bool {
        let ring_keep = topo.neighbours(mesh, keep);
        let ring_gone = topo.neighbours(mesh, gone);
        let shared = ring_keep.iter().filter(|v| ring_gone.contains(v)).count();
        let edge_tris = topo
            .edges
            .get(&edge_key(keep, gone))
            .map_or(0, |t| t.len());
        if shared != edge_tris {
            return false;
        }

        let max_sq = max_len * max_len;
        if ring_gone
            .iter()
            .chain(&ring_keep)
            .filter(|&&v| v != keep && v != gone)
            .any(|&v| mesh.position(v).distance_squared(target) > max_sq)
        {
            return false;
        }

        let moved = |v: VertexId| {
            if v == keep || v == gone {
                target
            } else {
                mesh.position(v)
            }
        };
        let surviving = topo.vertex_tris[keep as usize]
            .iter()
            .chain(&topo.vertex_tris[gone as usize])
            .filter(|&&t| {
                let tri = mesh.triangle(t);
                !(tri.contains(&keep) && tri.contains(&gone))
            });
        for &t in surviving {
            let before = mesh.face_normal(t);
            let [p, q, r] = mesh.triangle(t).map(moved);
            let after = (q - p).cross(r - p);
            if after.length_squared() <= f32::EPSILON || before.dot(after) <= 0.0 {
                return false;
            }
        }
        true
    }

    /*──────────────────────── flips ──────────────────────────────*/

    fn flip_edges(&self, mesh: &mut TriMesh) -> usize {
        let topo = Topology::build(mesh);
        let valence: Vec<i32> = (0..mesh.max_vertex_id() as VertexId)
            .map(|v| topo.neighbours(mesh, v).len() as i32)
            .collect();
        let target = |v: VertexId| if topo.boundary[v as usize] { 4 } else { 6 };

        let mut keys: Vec<EdgeKey> = topo.edges.keys().copied().collect();
        keys.sort_unstable();

        let mut dirty = vec![false; mesh.max_vertex_id()];
        let mut count = 0;
        for (a, b) in keys {
            if self.constraint(&topo, (a, b)).contains(EdgeConstraint::NO_FLIP) {
                continue;
            }
            let tris = &topo.edges[&(a, b)];
            if tris.len() != 2 {
                continue;
            }
            let (t1, t2) = (tris[0], tris[1]);
            let (Some((c, fwd1)), Some((d, fwd2))) = (
                opposite(mesh.triangle(t1), a, b),
                opposite(mesh.triangle(t2), a, b),
            ) else {
                continue;
            };
            // inconsistent winding: leave it alone
            if fwd1 == fwd2 || c == d {
                continue;
            }
            if [a, b, c, d].iter().any(|&v| dirty[v as usize]) {
                continue;
            }
            if topo.edges.contains_key(&edge_key(c, d)) {
                continue;
            }

            let dev = |v: VertexId, delta: i32| {
                let e = valence[v as usize] + delta - target(v);
                e * e
            };
            let before = dev(a, 0) + dev(b, 0) + dev(c, 0) + dev(d, 0);
            let after = dev(a, -1) + dev(b, -1) + dev(c, 1) + dev(d, 1);
            if after >= before {
                continue;
            }

            // orient so t1 runs a → b with apex c and t2 runs b → a with apex d
            let (a, b, c, d, t1, t2) = if fwd1 {
                (a, b, c, d, t1, t2)
            } else {
                (a, b, d, c, t2, t1)
            };
            let new1 = [c, a, d];
            let new2 = [c, d, b];
            if !Self::flip_is_valid(mesh, t1, t2, new1, new2) {
                continue;
            }
            mesh.set_triangle(t1, new1);
            mesh.set_triangle(t2, new2);
            for v in [a, b, c, d] {
                dirty[v as usize] = true;
            }
            count += 1;
        }
        count
    }

    fn flip_is_valid(
        mesh: &TriMesh,
        t1: TriangleId,
        t2: TriangleId,
        new1: [VertexId; 3],
        new2: [VertexId; 3],
    ) -> bool {
        let reference = mesh.face_normal(t1) + mesh.face_normal(t2);
        [new1, new2].iter().all(|tri| {
            let [p, q, r] = tri.map(|v| mesh.position(v));
            let n = (q - p).cross(r - p);
            n.length_squared() > f32::EPSILON && n.dot(reference) > 0.0
        })
    }

    /*──────────────────────── smoothing ──────────────────────────*/

    fn smooth(&self, mesh: &mut TriMesh) {
        let topo = Topology::build(mesh);
        let t = self.smooth_speed.clamp(0.0, 1.0);
        let updates: Vec<(VertexId, Vec3)> = mesh
            .vertices()
            .filter(|&(v, _)| !(self.preserve_boundary && topo.boundary[v as usize]))
            .filter_map(|(v, p)| {
                let ring = topo.neighbours(mesh, v);
                if ring.is_empty() {
                    return None;
                }
                let centroid =
                    ring.iter().map(|&u| mesh.position(u)).sum::<Vec3>() / ring.len() as f32;
                Some((v, p.lerp(centroid, t)))
            })
            .collect();
        for (v, p) in updates {
            mesh.set_position(v, p);
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use glam::vec3;

    /// Flat `n`×`n` grid of squares, each split into two triangles.
    fn grid(n: u32, spacing: f32, z: f32) -> TriMesh {
        let mut m = TriMesh::default();
        for y in 0..=n {
            for x in 0..=n {
                m.append_vertex(vec3(x as f32 * spacing, y as f32 * spacing, z));
            }
        }
        let id = |x: u32, y: u32| y * (n + 1) + x;
        for y in 0..n {
            for x in 0..n {
                m.append_triangle([id(x, y), id(x + 1, y), id(x + 1, y + 1)]);
                m.append_triangle([id(x, y), id(x + 1, y + 1), id(x, y + 1)]);
            }
        }
        m
    }

    fn max_edge(m: &TriMesh) -> f32 {
        m.triangles()
            .flat_map(|(_, t)| (0..3).map(move |i| (t[i], t[(i + 1) % 3])))
            .map(|(a, b)| m.position(a).distance(m.position(b)))
            .fold(0.0, f32::max)
    }

    fn boundary_positions(m: &TriMesh) -> Vec<Vec3> {
        let topo = Topology::build(m);
        m.vertices()
            .filter(|(v, _)| topo.boundary[*v as usize])
            .map(|(_, p)| p)
            .collect()
    }

    #[test]
    fn coarse_mesh_gets_refined() {
        let m = grid(4, 20.0, 0.0);
        let before = m.vertex_count();
        let out = IsotropicRemesher::default().refine(m, 6.0).compact();
        assert!(out.vertex_count() > before);
        assert!(max_edge(&out) < 20.0 * std::f32::consts::SQRT_2);
    }

    #[test]
    fn honeycomb_edges_settle_near_the_target_length() {
        use crate::cloud::{FrameMapping, honeycomb};
        use crate::scene::SceneParameters;
        use image::{Rgba, RgbaImage};

        let scene = SceneParameters::from_preset("wall06", 1.0).unwrap();
        let img = RgbaImage::from_pixel(80, 80, Rgba([0, 0, 0, 255]));
        let mapping = FrameMapping::new(&scene, 4.0, 80, 80);
        let lattice = honeycomb(&img, &mapping, 5.0);
        assert!(max_edge(&lattice) > 30.0);

        let target = 6.0;
        let out = IsotropicRemesher::default().refine(lattice, target).compact();
        let lengths: Vec<f32> = Topology::build(&out)
            .edges
            .keys()
            .map(|&(a, b)| out.position(a).distance(out.position(b)))
            .collect();
        let in_band = lengths
            .iter()
            .filter(|&&l| (0.7 * target..=1.3 * target).contains(&l))
            .count();
        assert!(
            in_band as f32 >= 0.9 * lengths.len() as f32,
            "{in_band} of {} edges in band",
            lengths.len()
        );
        assert!(lengths.iter().all(|&l| l < 1.6 * target));
    }

    #[test]
    fn dense_mesh_gets_decimated() {
        let m = grid(12, 1.0, 0.0);
        let before = m.vertex_count();
        let out = IsotropicRemesher::default().refine(m, 6.0).compact();
        assert!(out.vertex_count() < before, "{} !< {before}", out.vertex_count());
        assert!(out.triangle_count() > 0);
    }

    #[test]
    fn boundary_vertices_are_kept_in_place() {
        let m = grid(6, 3.0, 0.0);
        let original = boundary_positions(&m);
        let out = IsotropicRemesher::default().refine(m, 6.0).compact();
        let after: Vec<Vec3> = out.vertices().map(|(_, p)| p).collect();
        for p in original {
            assert!(after.iter().any(|q| q.distance(p) < 1e-5), "lost boundary vertex {p}");
        }
    }

    #[test]
    fn flat_surface_stays_flat() {
        let out = IsotropicRemesher::default()
            .refine(grid(5, 9.0, -128.0), 6.0)
            .compact();
        assert!(out.vertices().all(|(_, p)| (p.z + 128.0).abs() < 1e-3));
    }

    #[test]
    fn compacted_output_has_no_dangling_indices() {
        let out = IsotropicRemesher::default()
            .refine(grid(10, 2.0, 0.0), 6.0)
            .compact();
        let n = out.max_vertex_id() as u32;
        assert_eq!(out.vertex_count(), n as usize);
        assert!(out.triangles().all(|(_, t)| t.iter().all(|&v| v < n)));
    }

    #[test]
    fn disabled_operations_leave_mesh_alone() {
        let remesher = IsotropicRemesher {
            enable_splits: false,
            enable_collapses: false,
            enable_flips: false,
            enable_smoothing: false,
            ..Default::default()
        };
        let m = grid(3, 50.0, 1.0);
        let out = remesher.refine(m.clone(), 6.0);
        assert_eq!(out.vertex_count(), m.vertex_count());
        assert_eq!(out.triangle_count(), m.triangle_count());
    }

    #[test]
    fn boundary_edges_refuse_collapse_and_flip() {
        let m = grid(1, 1.0, 0.0);
        let topo = Topology::build(&m);
        let r = IsotropicRemesher::default();
        let c = r.constraint(&topo, edge_key(0, 1));
        assert!(c.contains(EdgeConstraint::NO_COLLAPSE | EdgeConstraint::NO_FLIP));
        assert!(!c.contains(EdgeConstraint::NO_SPLIT));
        assert!(r.constraint(&topo, edge_key(0, 3)).is_empty());
    }
}
