// SPDX-License-Identifier: MIT
//
// Copyright (c) 2025 Alexandre Severino
//
// Permission is hereby granted, free of charge, to any person obtaining a copy
// of this software and associated documentation files (the "Software"), to deal
// in the Software without restriction, including without limitation the rights
// to use, copy, modify, merge, publish, distribute, sublicense, and/or sell
// copies of the Software, and to permit persons to whom the Software is
// furnished to do so, subject to the following conditions:
//
// The above copyright notice and this permission notice shall be included in
// all copies or substantial portions of the Software.
//
// THE SOFTWARE IS PROVIDED "AS IS", WITHOUT WARRANTY OF ANY KIND, EXPRESS OR
// IMPLIED, INCLUDING BUT NOT LIMITED TO THE WARRANTIES OF MERCHANTABILITY,
// FITNESS FOR A PARTICULAR PURPOSE AND NONINFRINGEMENT. IN NO EVENT SHALL THE
// AUTHORS OR COPYRIGHT HOLDERS BE LIABLE FOR ANY CLAIM, DAMAGES OR OTHER
// LIABILITY, WHETHER IN AN ACTION OF CONTRACT, TORT OR OTHERWISE, ARISING FROM,
// OUT OF OR IN CONNECTION WITH THE SOFTWARE OR THE USE OR OTHER DEALINGS IN THE
// SOFTWARE.

use ahash::AHashMap;
use log::debug;

use crate::{
    drainage::scan::ScanPool,
    error::{DrainageError, Result},
    geometry::Point3,
    kernel::{self, Orientation},
    mesh::{
        basic_types::{Feature, FeatureKind, Tin, TinState, Tolerances},
        face::Face,
        half_edge::HalfEdge,
        vertex::Vertex,
    },
};

impl Default for Tin {
    fn default() -> Self {
        Self::new()
    }
}

impl Tin {
    pub fn new() -> Self {
        Self {
            vertices: Vec::new(),
            half_edges: Vec::new(),
            faces: Vec::new(),
            edge_map: AHashMap::new(),
            features: Vec::new(),
            tolerances: Tolerances::default(),
            state: TinState::Empty,
            scans: ScanPool::default(),
        }
    }

    /// A point cloud with no triangles. Drainage queries on it fail with
    /// `NotTriangulated`.
    pub fn from_points(points: Vec<Point3>) -> Self {
        let mut tin = Self::new();
        for p in points {
            tin.add_vertex(p);
        }
        tin
    }

    pub fn with_tolerances(mut self, tolerances: Tolerances) -> Self {
        self.tolerances = tolerances;
        self
    }

    /// Builds a triangulated TIN from an indexed triangle list. Triangle
    /// winding is normalised to anticlockwise; degenerate triangles,
    /// non-manifold edges and holes in the hull are rejected.
    pub fn from_triangles(points: Vec<Point3>, triangles: &[[usize; 3]]) -> Result<Self> {
        if triangles.is_empty() {
            return Err(DrainageError::InvalidTriangulation(
                "no triangles".to_string(),
            ));
        }
        let mut tin = Self::from_points(points);
        let n = tin.vertices.len();

        for (i, tri) in triangles.iter().enumerate() {
            let [a, mut b, mut c] = *tri;
            for &v in tri {
                if v >= n {
                    return Err(DrainageError::InvalidVertex(v));
                }
            }
            if a == b || b == c || a == c {
                return Err(DrainageError::InvalidTriangulation(format!(
                    "triangle {i} repeats a vertex"
                )));
            }
            match kernel::orientation(
                &tin.vertices[a].position,
                &tin.vertices[b].position,
                &tin.vertices[c].position,
            ) {
                Orientation::Collinear => {
                    return Err(DrainageError::InvalidTriangulation(format!(
                        "triangle {i} is degenerate"
                    )));
                }
                Orientation::Clockwise => std::mem::swap(&mut b, &mut c),
                Orientation::CounterClockwise => {}
            }
            tin.add_triangle(a, b, c).map_err(|_| {
                DrainageError::InvalidTriangulation(format!(
                    "triangle {i} reuses a directed edge (non-manifold or inconsistent)"
                ))
            })?;
        }

        tin.create_border_half_edges();
        tin.build_boundary_loops()?;
        tin.seed_vertices();
        tin.state = TinState::Triangulated;
        tin.validate()?;
        debug!(
            "built TIN: {} vertices, {} faces, {} half-edges",
            tin.vertices.len(),
            tin.faces.len(),
            tin.half_edges.len()
        );
        Ok(tin)
    }

    /// Regular grid of `nx` by `ny` cells, each split along its
    /// (i, j)-(i+1, j+1) diagonal. Vertex `(i, j)` has index `j * (nx + 1) + i`.
    pub fn from_grid<F>(nx: usize, ny: usize, spacing: f64, f: F) -> Result<Self>
    where
        F: Fn(f64, f64) -> f64,
    {
        if nx == 0 || ny == 0 || !(spacing > 0.0) {
            return Err(DrainageError::InvalidTriangulation(format!(
                "grid {nx}x{ny} with spacing {spacing}"
            )));
        }
        let stride = nx + 1;
        let mut points = Vec::with_capacity(stride * (ny + 1));
        for j in 0..=ny {
            for i in 0..=nx {
                let x = i as f64 * spacing;
                let y = j as f64 * spacing;
                points.push(Point3::xyz(x, y, f(x, y)));
            }
        }
        let mut triangles = Vec::with_capacity(2 * nx * ny);
        for j in 0..ny {
            for i in 0..nx {
                let v00 = j * stride + i;
                let v10 = v00 + 1;
                let v01 = v00 + stride;
                let v11 = v01 + 1;
                triangles.push([v00, v10, v11]);
                triangles.push([v00, v11, v01]);
            }
        }
        Self::from_triangles(points, &triangles)
    }

    pub(crate) fn add_vertex(&mut self, position: Point3) -> usize {
        let idx = self.vertices.len();
        self.vertices.push(Vertex::new(position));
        if self.state == TinState::Empty {
            self.state = TinState::Points;
        }
        idx
    }

    /// Adds an anticlockwise face a→b→c with interior half-edges only.
    fn add_triangle(&mut self, a: usize, b: usize, c: usize) -> Result<usize> {
        for (u, v) in [(a, b), (b, c), (c, a)] {
            if self.edge_map.contains_key(&(u, v)) {
                return Err(DrainageError::MissingEdge(u, v));
            }
        }
        let face_idx = self.faces.len();
        let base = self.half_edges.len();
        for (i, (u, v)) in [(a, b), (b, c), (c, a)].into_iter().enumerate() {
            let mut he = HalfEdge::new(v);
            he.face = Some(face_idx);
            he.next = base + (i + 1) % 3;
            he.prev = base + (i + 2) % 3;
            self.half_edges.push(he);
            self.edge_map.insert((u, v), base + i);
        }
        self.faces.push(Face::new(base));
        Ok(face_idx)
    }

    /// Pairs every interior half-edge with its reverse, creating a border
    /// half-edge where the reverse has no face.
    fn create_border_half_edges(&mut self) {
        let interior = self.half_edges.len();
        for h in 0..interior {
            if self.half_edges[h].twin != usize::MAX {
                continue;
            }
            let from = self.half_edges[self.half_edges[h].prev].vertex;
            let to = self.half_edges[h].vertex;
            match self.edge_map.get(&(to, from)) {
                Some(&r) => {
                    self.half_edges[h].twin = r;
                    self.half_edges[r].twin = h;
                }
                None => {
                    let b = self.half_edges.len();
                    let mut border = HalfEdge::new(from);
                    border.twin = h;
                    self.half_edges.push(border);
                    self.half_edges[h].twin = b;
                    self.edge_map.insert((to, from), b);
                }
            }
        }
    }

    /// Links border half-edges into loops. For a border edge ending at `v`
    /// its successor is the border edge leaving `v`, found by rotating
    /// anticlockwise through the interior spokes of `v`.
    pub(crate) fn build_boundary_loops(&mut self) -> Result<()> {
        let borders: Vec<usize> = (0..self.half_edges.len())
            .filter(|&h| self.half_edges[h].is_border())
            .collect();
        let limit = self.half_edges.len();

        for &b in &borders {
            let mut t = self.half_edges[b].twin;
            let mut steps = 0usize;
            let found = loop {
                let cand = self.half_edges[self.half_edges[t].prev].twin;
                if self.half_edges[cand].is_border() {
                    break cand;
                }
                t = cand;
                steps += 1;
                if steps > limit {
                    return Err(DrainageError::InvalidTriangulation(
                        "could not close a boundary loop".to_string(),
                    ));
                }
            };
            self.half_edges[b].next = found;
            self.half_edges[found].prev = b;
        }
        Ok(())
    }

    fn seed_vertices(&mut self) {
        for h in 0..self.half_edges.len() {
            let origin = self.half_edges[self.half_edges[h].twin].vertex;
            let seed = &mut self.vertices[origin].half_edge;
            match *seed {
                None => *seed = Some(h),
                // prefer the border spoke so ring walks on the hull start
                // just inside the hull
                Some(_) if self.half_edges[h].is_border() => *seed = Some(h),
                Some(_) => {}
            }
        }
    }

    pub fn state(&self) -> TinState {
        self.state
    }

    pub fn is_triangulated(&self) -> bool {
        self.state == TinState::Triangulated
    }

    pub(crate) fn require_triangulated(&self) -> Result<()> {
        if self.is_triangulated() {
            Ok(())
        } else {
            Err(DrainageError::NotTriangulated)
        }
    }

    pub fn vertex_count(&self) -> usize {
        self.vertices.len()
    }

    pub fn face_count(&self) -> usize {
        self.faces.len()
    }

    pub fn position(&self, v: usize) -> &Point3 {
        &self.vertices[v].position
    }

    pub fn is_void(&self, f: usize) -> bool {
        self.faces[f].void
    }

    pub fn is_drain(&self, v: usize) -> bool {
        self.vertices[v].drain
    }

    pub fn set_void(&mut self, face: usize, void: bool) -> Result<()> {
        let f = self
            .faces
            .get_mut(face)
            .ok_or(DrainageError::InvalidFace(face))?;
        f.void = void;
        Ok(())
    }

    pub fn mark_drain(&mut self, v: usize) -> Result<()> {
        let vertex = self
            .vertices
            .get_mut(v)
            .ok_or(DrainageError::InvalidVertex(v))?;
        vertex.drain = true;
        Ok(())
    }

    /// Records a polyline feature over existing mesh edges.
    pub fn add_feature(&mut self, kind: FeatureKind, vertices: Vec<usize>) -> Result<usize> {
        for w in vertices.windows(2) {
            if !self.has_edge(w[0], w[1]) {
                return Err(DrainageError::MissingEdge(w[0], w[1]));
            }
        }
        self.features.push(Feature { kind, vertices });
        Ok(self.features.len() - 1)
    }

    pub fn features_of_kind(&self, kind: FeatureKind) -> impl Iterator<Item = &Feature> + '_ {
        self.features.iter().filter(move |f| f.kind == kind)
    }

    /// Checks the half-edge invariants: twin/next/prev consistency, closed
    /// triangular faces, manifold vertex fans and a single hull loop.
    pub fn validate(&self) -> Result<()> {
        self.require_triangulated()?;
        let bad = |msg: String| Err(DrainageError::InvalidTriangulation(msg));

        for (h, he) in self.half_edges.iter().enumerate() {
            if he.twin >= self.half_edges.len() || self.half_edges[he.twin].twin != h {
                return bad(format!("half-edge {h} has a broken twin"));
            }
            if he.twin == h {
                return bad(format!("half-edge {h} is its own twin"));
            }
            if self.half_edges[he.next].prev != h || self.half_edges[he.prev].next != h {
                return bad(format!("half-edge {h} has broken next/prev links"));
            }
            let origin = self.half_edges[he.twin].vertex;
            if self.edge_map.get(&(origin, he.vertex)) != Some(&h) {
                return bad(format!("half-edge {h} missing from the edge map"));
            }
        }

        for (f, face) in self.faces.iter().enumerate() {
            let h0 = face.half_edge;
            let h1 = self.half_edges[h0].next;
            let h2 = self.half_edges[h1].next;
            if self.half_edges[h2].next != h0 {
                return bad(format!("face {f} is not a triangle"));
            }
            for h in [h0, h1, h2] {
                if self.half_edges[h].face != Some(f) {
                    return bad(format!("face {f} has a foreign half-edge {h}"));
                }
            }
            let [a, b, c] = self.face_vertices(f);
            if !kernel::orientation(
                &self.vertices[a].position,
                &self.vertices[b].position,
                &self.vertices[c].position,
            )
            .is_ccw()
            {
                return bad(format!("face {f} is not anticlockwise"));
            }
        }

        let mut outgoing = vec![0usize; self.vertices.len()];
        for he in &self.half_edges {
            outgoing[self.half_edges[he.twin].vertex] += 1;
        }
        for (v, vertex) in self.vertices.iter().enumerate() {
            match vertex.half_edge {
                None if outgoing[v] == 0 => {
                    return bad(format!("vertex {v} is not part of the triangulation"));
                }
                None => return bad(format!("vertex {v} has no seed half-edge")),
                Some(_) => {
                    if self.outgoing_ccw(v).len() != outgoing[v] {
                        return bad(format!("vertex {v} has a non-manifold fan"));
                    }
                }
            }
        }

        let borders = self.half_edges.iter().filter(|he| he.is_border()).count();
        let first = self.half_edges.iter().position(|he| he.is_border());
        if let Some(start) = first {
            let mut len = 1usize;
            let mut cur = self.half_edges[start].next;
            while cur != start {
                len += 1;
                cur = self.half_edges[cur].next;
                if len > borders {
                    break;
                }
            }
            if len != borders {
                return bad("hull is not a single closed loop".to_string());
            }
        }
        Ok(())
    }
}
