//! Minimal indexed triangle mesh with tombstoned deletes.
//!
//! Ids stay stable while editing (deleted slots are only flagged dead);
//! [`TriMesh::compact`] produces the dense copy handed on to point emission.

use glam::Vec3;
use smallvec::SmallVec;
use std::collections::HashMap;

pub type VertexId = u32;
pub type TriangleId = u32;

/// Undirected edge key, smaller id first.
pub type EdgeKey = (VertexId, VertexId);

#[inline]
pub fn edge_key(a: VertexId, b: VertexId) -> EdgeKey {
    if a < b { (a, b) } else { (b, a) }
}

#[derive(Clone, Debug, Default)]
pub struct TriMesh {
    positions: Vec<Vec3>,
    vertex_alive: Vec<bool>,
    triangles: Vec<[VertexId; 3]>,
    triangle_alive: Vec<bool>,
}

impl TriMesh {
    pub fn with_capacity(vertices: usize, triangles: usize) -> Self {
        Self {
            positions: Vec::with_capacity(vertices),
            vertex_alive: Vec::with_capacity(vertices),
            triangles: Vec::with_capacity(triangles),
            triangle_alive: Vec::with_capacity(triangles),
        }
    }

    /*──────────────────────── construction ────────────────────────*/

    pub fn append_vertex(&mut self, p: Vec3) -> VertexId {
        self.positions.push(p);
        self.vertex_alive.push(true);
        (self.positions.len() - 1) as VertexId
    }

    /// Append a triangle. Winding is kept as given.
    pub fn append_triangle(&mut self, tri: [VertexId; 3]) -> TriangleId {
        debug_assert!(tri.iter().all(|&v| self.is_vertex(v)));
        self.triangles.push(tri);
        self.triangle_alive.push(true);
        (self.triangles.len() - 1) as TriangleId
    }

    /*──────────────────────── queries ─────────────────────────────*/

    /// Number of live vertices.
    pub fn vertex_count(&self) -> usize {
        self.vertex_alive.iter().filter(|&&a| a).count()
    }

    /// Number of live triangles.
    pub fn triangle_count(&self) -> usize {
        self.triangle_alive.iter().filter(|&&a| a).count()
    }

    /// One past the largest vertex id ever issued.
    #[inline]
    pub fn max_vertex_id(&self) -> usize {
        self.positions.len()
    }

    #[inline]
    pub fn max_triangle_id(&self) -> usize {
        self.triangles.len()
    }

    #[inline]
    pub fn is_vertex(&self, v: VertexId) -> bool {
        self.vertex_alive
            .get(v as usize)
            .copied()
            .unwrap_or(false)
    }

    #[inline]
    pub fn is_triangle(&self, t: TriangleId) -> bool {
        self.triangle_alive
            .get(t as usize)
            .copied()
            .unwrap_or(false)
    }

    #[inline]
    pub fn position(&self, v: VertexId) -> Vec3 {
        self.positions[v as usize]
    }

    #[inline]
    pub fn triangle(&self, t: TriangleId) -> [VertexId; 3] {
        self.triangles[t as usize]
    }

    /// Live vertices as `(id, position)`.
    pub fn vertices(&self) -> impl Iterator<Item = (VertexId, Vec3)> + '_ {
        self.positions
            .iter()
            .zip(&self.vertex_alive)
            .enumerate()
            .filter(|(_, (_, alive))| **alive)
            .map(|(i, (p, _))| (i as VertexId, *p))
    }

    /// Live triangles as `(id, corners)`.
    pub fn triangles(&self) -> impl Iterator<Item = (TriangleId, [VertexId; 3])> + '_ {
        self.triangles
            .iter()
            .zip(&self.triangle_alive)
            .enumerate()
            .filter(|(_, (_, alive))| **alive)
            .map(|(i, (t, _))| (i as TriangleId, *t))
    }

    /// Unnormalised face normal (twice the area).
    pub fn face_normal(&self, t: TriangleId) -> Vec3 {
        let [a, b, c] = self.triangle(t).map(|v| self.position(v));
        (b - a).cross(c - a)
    }

    /*──────────────────────── edits ───────────────────────────────*/

    #[inline]
    pub fn set_position(&mut self, v: VertexId, p: Vec3) {
        self.positions[v as usize] = p;
    }

    #[inline]
    pub fn set_triangle(&mut self, t: TriangleId, tri: [VertexId; 3]) {
        self.triangles[t as usize] = tri;
    }

    pub fn remove_triangle(&mut self, t: TriangleId) {
        self.triangle_alive[t as usize] = false;
    }

    pub fn remove_vertex(&mut self, v: VertexId) {
        self.vertex_alive[v as usize] = false;
    }

    /// Dense copy: live vertices renumbered in id order, dead slots dropped,
    /// triangles remapped.
    pub fn compact(&self) -> TriMesh {
        let mut remap = vec![VertexId::MAX; self.positions.len()];
        let mut out = TriMesh::with_capacity(self.vertex_count(), self.triangle_count());
        for (v, p) in self.vertices() {
            remap[v as usize] = out.append_vertex(p);
        }
        for (_, tri) in self.triangles() {
            let mapped = tri.map(|v| remap[v as usize]);
            if mapped.iter().all(|&v| v != VertexId::MAX) {
                out.append_triangle(mapped);
            }
        }
        out
    }
}

/*──────────────────────── adjacency snapshot ──────────────────────*/

/// Edge → incident triangles and vertex → incident triangles, built once per
/// remesh stage. Stale after edits; callers lock what they touch.
pub struct Topology {
    pub edges: HashMap<EdgeKey, SmallVec<[TriangleId; 2]>>,
    pub vertex_tris: Vec<SmallVec<[TriangleId; 8]>>,
    /// Vertex lies on an open (or non-manifold) edge.
    pub boundary: Vec<bool>,
}

impl Topology {
    pub fn build(mesh: &TriMesh) -> Self {
        let mut edges: HashMap<EdgeKey, SmallVec<[TriangleId; 2]>> =
            HashMap::with_capacity(mesh.max_triangle_id() * 3 / 2 + 1);
        let mut vertex_tris = vec![SmallVec::new(); mesh.max_vertex_id()];

        for (t, tri) in mesh.triangles() {
            for i in 0..3 {
                edges
                    .entry(edge_key(tri[i], tri[(i + 1) % 3]))
                    .or_default()
                    .push(t);
                vertex_tris[tri[i] as usize].push(t);
            }
        }

        let mut boundary = vec![false; mesh.max_vertex_id()];
        for (&(a, b), tris) in &edges {
            if tris.len() != 2 {
                boundary[a as usize] = true;
                boundary[b as usize] = true;
            }
        }

        Self {
            edges,
            vertex_tris,
            boundary,
        }
    }

    #[inline]
    pub fn is_boundary_edge(&self, key: EdgeKey) -> bool {
        self.edges.get(&key).is_none_or(|t| t.len() != 2)
    }

    /// Distinct one-ring neighbours of `v`.
    pub fn neighbours(&self, mesh: &TriMesh, v: VertexId) -> SmallVec<[VertexId; 12]> {
        let mut out: SmallVec<[VertexId; 12]> = SmallVec::new();
        for &t in &self.vertex_tris[v as usize] {
            for u in mesh.triangle(t) {
                if u != v && !out.contains(&u) {
                    out.push(u);
                }
            }
        }
        out
    }
}

/// Vertex opposite edge `(a, b)` in `tri`, plus whether the triangle runs
/// `a → b` (true) or `b → a` (false).
pub fn opposite(tri: [VertexId; 3], a: VertexId, b: VertexId) -> Option<(VertexId, bool)> {
    for i in 0..3 {
        let (p, q, r) = (tri[i], tri[(i + 1) % 3], tri[(i + 2) % 3]);
        if p == a && q == b {
            return Some((r, true));
        }
        if p == b && q == a {
            return Some((r, false));
        }
    }
    None
}
