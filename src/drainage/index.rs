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

//! Per-pass enumeration of triangles and edges.
//!
//! Catchment ids are `usize` values: a vertex index for runoff ending at a
//! point, `vertex_count + edge_offset` for runoff ending on an edge. Edge
//! offsets depend on the mesh, so an index is rebuilt after every edit.

use std::collections::VecDeque;

use ahash::AHashMap;
use log::debug;

use crate::{
    drainage::{fence::ActiveFence, flow, tracer::Terminus},
    error::Result,
    mesh::Tin,
};

#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, PartialOrd, Ord)]
pub struct CatchmentId(pub usize);

impl CatchmentId {
    pub const UNDETERMINED: CatchmentId = CatchmentId(usize::MAX);

    pub fn is_determined(self) -> bool {
        self != Self::UNDETERMINED
    }
}

impl Default for CatchmentId {
    fn default() -> Self {
        Self::UNDETERMINED
    }
}

/// Where a catchment drains, refined by what surrounds the terminus.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum SumpLineType {
    None,
    InteriorPoint,
    InteriorEdge,
    PointOnHull,
    EdgeOnHull,
    /// Next to a void region that reaches the hull.
    PointOnVoid,
    EdgeOnVoid,
    /// Next to an enclosed void, on land that reaches the hull.
    PointOnHole,
    EdgeOnHole,
    /// On land enclosed by void.
    PointOnIsland,
    EdgeOnIsland,
    /// A vertex marked as a drain.
    DrainPoint,
}

impl SumpLineType {
    /// Whether the boundary refiner knows how to handle this terminus.
    pub fn is_supported(self) -> bool {
        !matches!(
            self,
            SumpLineType::None
                | SumpLineType::PointOnHole
                | SumpLineType::EdgeOnHole
                | SumpLineType::PointOnIsland
                | SumpLineType::EdgeOnIsland
        )
    }
}

#[derive(Debug, Clone, PartialEq)]
pub struct TriangleRecord {
    pub face: usize,
    pub vertices: [usize; 3],
    /// Void on the mesh or excluded by the fence.
    pub is_void: bool,
    pub is_flat: bool,
    pub catchment: CatchmentId,
    /// Catchments reached from the three edge samples.
    pub samples: [CatchmentId; 3],
    /// Edge samples agreeing with `catchment`.
    pub votes: u8,
}

impl TriangleRecord {
    pub fn is_traceable(&self) -> bool {
        !self.is_void && !self.is_flat
    }

    /// Coloured, but no edge sample agrees: the triangle straddles a divide.
    pub fn is_zero_vote(&self) -> bool {
        self.catchment.is_determined() && self.votes == 0
    }

    /// The sample taken next to the edge `a -> b` of this triangle.
    pub fn sample_near(&self, a: usize, b: usize) -> Option<CatchmentId> {
        let vs = self.vertices;
        (0..3)
            .find(|&i| vs[i] == a && vs[(i + 1) % 3] == b)
            .map(|i| self.samples[i])
    }
}

#[derive(Debug, Clone)]
pub struct TriangleIndex {
    records: Vec<TriangleRecord>,
    blocked: Vec<bool>,
    edges: Vec<(usize, usize)>,
    edge_offsets: AHashMap<(usize, usize), usize>,
    vertex_count: usize,
    component: Vec<usize>,
    component_hull: Vec<bool>,
}

impl TriangleIndex {
    pub fn build(tin: &Tin, flat_tol: f64, fence: Option<&ActiveFence>) -> Result<Self> {
        tin.require_triangulated()?;
        let records: Vec<TriangleRecord> = (0..tin.face_count())
            .map(|f| {
                let is_void = tin.is_void(f) || fence.is_some_and(|fence| fence.excludes(tin, f));
                TriangleRecord {
                    face: f,
                    vertices: tin.face_vertices(f),
                    is_void,
                    is_flat: flow::is_flat(&tin.face_points(f), flat_tol),
                    catchment: CatchmentId::UNDETERMINED,
                    samples: [CatchmentId::UNDETERMINED; 3],
                    votes: 0,
                }
            })
            .collect();
        let blocked = records.iter().map(|r| r.is_void).collect();

        let mut edges = Vec::new();
        let mut edge_offsets = AHashMap::new();
        for h in 0..tin.half_edges.len() {
            let (a, b) = (tin.origin(h), tin.target(h));
            if a < b {
                edge_offsets.insert((a, b), edges.len());
                edges.push((a, b));
            }
        }

        let mut index = Self {
            records,
            blocked,
            edges,
            edge_offsets,
            vertex_count: tin.vertex_count(),
            component: Vec::new(),
            component_hull: Vec::new(),
        };
        index.label_components(tin);
        debug!(
            "triangle index: {} faces, {} edges, {} components",
            index.records.len(),
            index.edges.len(),
            index.component_hull.len()
        );
        Ok(index)
    }

    /// Splits faces into connected void and land components and records
    /// which of them reach the hull.
    fn label_components(&mut self, tin: &Tin) {
        let n = self.records.len();
        self.component = vec![usize::MAX; n];
        self.component_hull.clear();
        let mut queue = VecDeque::new();
        for seed in 0..n {
            if self.component[seed] != usize::MAX {
                continue;
            }
            let id = self.component_hull.len();
            let kind = self.blocked[seed];
            let mut on_hull = false;
            self.component[seed] = id;
            queue.push_back(seed);
            while let Some(f) = queue.pop_front() {
                for h in tin.face_half_edges(f) {
                    match tin.face_across(h) {
                        None => on_hull = true,
                        Some(g) if self.blocked[g] == kind && self.component[g] == usize::MAX => {
                            self.component[g] = id;
                            queue.push_back(g);
                        }
                        Some(_) => {}
                    }
                }
            }
            self.component_hull.push(on_hull);
        }
    }

    pub fn records(&self) -> &[TriangleRecord] {
        &self.records
    }

    pub fn record(&self, f: usize) -> &TriangleRecord {
        &self.records[f]
    }

    pub fn record_mut(&mut self, f: usize) -> &mut TriangleRecord {
        &mut self.records[f]
    }

    pub fn len(&self) -> usize {
        self.records.len()
    }

    pub fn is_empty(&self) -> bool {
        self.records.is_empty()
    }

    /// Void-or-fenced flag per face, the mask every trace runs against.
    pub fn blocked(&self) -> &[bool] {
        &self.blocked
    }

    pub fn catchment(&self, f: usize) -> CatchmentId {
        self.records[f].catchment
    }

    pub fn vertex_count(&self) -> usize {
        self.vertex_count
    }

    pub fn edge_count(&self) -> usize {
        self.edges.len()
    }

    pub fn edge_offset(&self, a: usize, b: usize) -> Option<usize> {
        self.edge_offsets.get(&(a.min(b), a.max(b))).copied()
    }

    pub fn encode(&self, terminus: Terminus) -> CatchmentId {
        match terminus {
            Terminus::Point(v) => CatchmentId(v),
            Terminus::Edge(a, b) => self
                .edge_offset(a, b)
                .map_or(CatchmentId::UNDETERMINED, |off| {
                    CatchmentId(self.vertex_count + off)
                }),
        }
    }

    pub fn decode(&self, id: CatchmentId) -> Option<Terminus> {
        if !id.is_determined() {
            return None;
        }
        if id.0 < self.vertex_count {
            return Some(Terminus::Point(id.0));
        }
        let (a, b) = *self.edges.get(id.0 - self.vertex_count)?;
        Some(Terminus::Edge(a, b))
    }

    pub fn sump_type(&self, tin: &Tin, id: CatchmentId) -> SumpLineType {
        let Some(terminus) = self.decode(id) else {
            return SumpLineType::None;
        };
        match terminus {
            Terminus::Point(v) => {
                if tin.is_drain(v) {
                    return SumpLineType::DrainPoint;
                }
                let faces = tin.faces_around_vertex(v);
                match self.boundary_kind(&faces) {
                    Some(Boundary::Void) => SumpLineType::PointOnVoid,
                    Some(Boundary::Hole) => SumpLineType::PointOnHole,
                    Some(Boundary::Island) => SumpLineType::PointOnIsland,
                    None if tin.is_hull_vertex(v) => SumpLineType::PointOnHull,
                    None => SumpLineType::InteriorPoint,
                }
            }
            Terminus::Edge(a, b) => {
                let faces: Vec<usize> = [tin.left_face(a, b), tin.right_face(a, b)]
                    .into_iter()
                    .flatten()
                    .collect();
                match self.boundary_kind(&faces) {
                    Some(Boundary::Void) => SumpLineType::EdgeOnVoid,
                    Some(Boundary::Hole) => SumpLineType::EdgeOnHole,
                    Some(Boundary::Island) => SumpLineType::EdgeOnIsland,
                    None if tin.is_hull_edge(a, b) => SumpLineType::EdgeOnHull,
                    None => SumpLineType::InteriorEdge,
                }
            }
        }
    }

    fn boundary_kind(&self, faces: &[usize]) -> Option<Boundary> {
        let void = faces.iter().find(|&&f| self.blocked[f])?;
        if self.component_hull[self.component[*void]] {
            return Some(Boundary::Void);
        }
        let land_on_hull = faces
            .iter()
            .filter(|&&f| !self.blocked[f])
            .any(|&f| self.component_hull[self.component[f]]);
        Some(if land_on_hull {
            Boundary::Hole
        } else {
            Boundary::Island
        })
    }

    /// Plan area of traceable (non-void, non-flat) triangles.
    pub fn traceable_area(&self, tin: &Tin) -> f64 {
        self.records
            .iter()
            .filter(|r| r.is_traceable())
            .map(|r| tin.face_area(r.face))
            .sum()
    }

    pub fn zero_votes(&self, id: CatchmentId) -> usize {
        self.records
            .iter()
            .filter(|r| r.catchment == id && r.is_zero_vote())
            .count()
    }

    /// Triangles of `id` whose edge samples only partly agree with it.
    pub fn partial_votes(&self, id: CatchmentId) -> usize {
        self.records
            .iter()
            .filter(|r| r.catchment == id && r.votes > 0 && r.votes < 3)
            .count()
    }

    pub fn undetermined(&self) -> usize {
        self.records
            .iter()
            .filter(|r| r.is_traceable() && !r.catchment.is_determined())
            .count()
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
enum Boundary {
    Void,
    Hole,
    Island,
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn ids_round_trip_through_terminus() {
        let tin = Tin::from_grid(2, 2, 1.0, |x, y| x * y).unwrap();
        let index = TriangleIndex::build(&tin, 1e-9, None).unwrap();
        assert_eq!(index.edge_count(), 16);
        let id = index.encode(Terminus::Edge(4, 1));
        assert!(id.0 >= tin.vertex_count());
        assert_eq!(index.decode(id), Some(Terminus::Edge(1, 4)));
        assert_eq!(index.decode(CatchmentId(3)), Some(Terminus::Point(3)));
        assert_eq!(index.decode(CatchmentId::UNDETERMINED), None);
    }

    #[test]
    fn enclosed_void_is_a_hole() {
        let mut tin = Tin::from_grid(3, 3, 1.0, |_, _| 0.0).unwrap();
        // both triangles of the centre cell
        for f in 0..tin.face_count() {
            let c = tin.face_centroid(f);
            if (1.0..2.0).contains(&c.x()) && (1.0..2.0).contains(&c.y()) {
                tin.set_void(f, true).unwrap();
            }
        }
        let index = TriangleIndex::build(&tin, 1e-9, None).unwrap();
        assert_eq!(index.sump_type(&tin, CatchmentId(5)), SumpLineType::PointOnHole);
        assert_eq!(index.sump_type(&tin, CatchmentId(0)), SumpLineType::PointOnHull);
        assert!(!SumpLineType::PointOnHole.is_supported());
    }

    #[test]
    fn void_reaching_hull_is_a_void_boundary() {
        let mut tin = Tin::from_grid(2, 1, 1.0, |_, _| 0.0).unwrap();
        let f = tin.locate(1.8, 0.2).unwrap();
        tin.set_void(f, true).unwrap();
        let index = TriangleIndex::build(&tin, 1e-9, None).unwrap();
        assert_eq!(index.sump_type(&tin, CatchmentId(2)), SumpLineType::PointOnVoid);
        assert_eq!(index.sump_type(&tin, CatchmentId(0)), SumpLineType::PointOnHull);
    }
}
