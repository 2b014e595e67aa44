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

//! Maximum-ascent line insertion.
//!
//! From a start vertex the line repeatedly takes the steepest uphill
//! direction: along an edge when an edge is steepest, otherwise across the
//! triangle whose ascent points into its wedge, cutting the opposite edge
//! with a new vertex unless the crossing snaps to an existing one.

use log::trace;

use crate::{
    drainage::{
        fence::ActiveFence,
        flow::{self, BaseFlow, SideFlow},
    },
    error::{DrainageError, Result},
    geometry::Point3,
    kernel,
    mesh::{FeatureKind, Tin},
};

#[derive(Debug, Clone, Copy, PartialEq)]
pub enum AscentStart {
    Vertex(usize),
    /// Point on edge a-b at parameter `u` from `a`.
    EdgePoint { a: usize, b: usize, u: f64 },
    /// Where the descent from the apex of the triangle left of `a -> b`
    /// crosses the base.
    TriangleBase { a: usize, b: usize },
}

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum AscentStop {
    /// No uphill direction left.
    Peak,
    /// The steepest way up runs along a ridge, or the last crossing was a
    /// ridge edge.
    Ridge,
    /// Reached a vertex of an earlier ascent line.
    Merged,
    Hull,
    StepLimit,
    /// The inserter's budget of new vertices ran out.
    VertexLimit,
}

#[derive(Debug, Clone, PartialEq)]
pub struct AscentLine {
    pub vertices: Vec<usize>,
    pub stop: AscentStop,
    /// Vertices created by edge splits.
    pub inserted: usize,
}

enum Climb {
    To(usize, Option<AscentStop>),
    Stop(AscentStop),
}

/// Crossings closer than this fraction of the crossed edge to one of its
/// ends snap to that end instead of splitting off a sliver.
const MIN_SPLIT_PARAM: f64 = 0.02;

pub struct AscentInserter<'a> {
    flat_tol: f64,
    fence: Option<&'a ActiveFence>,
    max_steps: Option<usize>,
    max_new_vertices: usize,
}

impl<'a> AscentInserter<'a> {
    pub fn new(flat_tol: f64, fence: Option<&'a ActiveFence>) -> Self {
        Self {
            flat_tol,
            fence,
            max_steps: None,
            max_new_vertices: usize::MAX,
        }
    }

    /// Caps the climb length and the number of vertices one line may add.
    /// Without a step cap the climb is bounded by the current mesh size.
    pub fn with_limits(mut self, max_steps: usize, max_new_vertices: usize) -> Self {
        self.max_steps = Some(max_steps);
        self.max_new_vertices = max_new_vertices;
        self
    }

    fn blocked(&self, tin: &Tin, f: usize) -> bool {
        tin.is_void(f) || self.fence.is_some_and(|fence| fence.excludes(tin, f))
    }

    fn is_ridge(&self, tin: &Tin, a: usize, b: usize) -> bool {
        let blocked = |f: usize| self.blocked(tin, f);
        let (left, _) = flow::side_flow(tin, a, b, self.flat_tol, blocked);
        let (right, _) = flow::side_flow(tin, b, a, self.flat_tol, blocked);
        left == SideFlow::Away && right == SideFlow::Away
    }

    fn on_ascent_line(tin: &Tin, v: usize) -> bool {
        tin.features_of_kind(FeatureKind::AscentLine)
            .any(|f| f.vertices.contains(&v))
    }

    /// Whether `p` lies within the line tolerance of a segment of an
    /// existing ascent line.
    pub fn touches_ascent_line(tin: &Tin, p: &Point3) -> bool {
        let tol = tin.tolerances.line;
        tin.features_of_kind(FeatureKind::AscentLine).any(|f| {
            f.vertices.windows(2).any(|w| {
                kernel::point_on_segment(p, tin.position(w[0]), tin.position(w[1]), tol)
            })
        })
    }

    /// Inserts one ascent line and records it as an `AscentLine` feature.
    /// Every step must be at or above the previous elevation; a step down is
    /// reported as `AscentDescended` and ends the insertion.
    pub fn insert(&self, tin: &mut Tin, start: AscentStart) -> Result<AscentLine> {
        tin.require_triangulated()?;
        let mut inserted = 0;
        let Some(first) = self.resolve_start(tin, start, &mut inserted)? else {
            trace!("ascent start {start:?} lies on an existing ascent line");
            return Ok(AscentLine {
                vertices: Vec::new(),
                stop: AscentStop::Merged,
                inserted: 0,
            });
        };
        let mut line = AscentLine {
            vertices: vec![first],
            stop: AscentStop::StepLimit,
            inserted: 0,
        };
        if Self::on_ascent_line(tin, first) {
            line.stop = AscentStop::Merged;
            line.inserted = inserted;
            return Ok(line);
        }

        let max_steps = self
            .max_steps
            .unwrap_or_else(|| 4 * (tin.vertex_count() + tin.face_count()) + 16);
        let mut cur = first;
        for _ in 0..max_steps {
            let (next, stop_after) = match self.climb(tin, cur, &mut inserted)? {
                Climb::Stop(stop) => {
                    line.stop = stop;
                    break;
                }
                Climb::To(next, stop_after) => (next, stop_after),
            };
            let (from, to) = (tin.position(cur).z(), tin.position(next).z());
            if to < from - self.flat_tol {
                return Err(DrainageError::AscentDescended { from, to });
            }
            if line.vertices.contains(&next) {
                line.stop = AscentStop::Peak;
                break;
            }
            line.vertices.push(next);
            cur = next;
            if let Some(stop) = stop_after {
                line.stop = stop;
                break;
            }
            if Self::on_ascent_line(tin, next) {
                line.stop = AscentStop::Merged;
                break;
            }
            if tin.is_hull_vertex(next) {
                line.stop = AscentStop::Hull;
                break;
            }
        }

        line.inserted = inserted;
        if line.vertices.len() >= 2 {
            tin.add_feature(FeatureKind::AscentLine, line.vertices.clone())?;
        }
        trace!(
            "ascent line of {} vertices ({} new), stopped: {:?}",
            line.vertices.len(),
            line.inserted,
            line.stop
        );
        Ok(line)
    }

    /// The vertex the line starts from, splitting an edge when the start
    /// is inside one. `None` when the start point already lies on an
    /// ascent line.
    fn resolve_start(
        &self,
        tin: &mut Tin,
        start: AscentStart,
        inserted: &mut usize,
    ) -> Result<Option<usize>> {
        match start {
            AscentStart::Vertex(v) => {
                if v >= tin.vertex_count() {
                    return Err(DrainageError::InvalidVertex(v));
                }
                Ok(Some(v))
            }
            AscentStart::EdgePoint { a, b, u } => {
                if !tin.has_edge(a, b) {
                    return Err(DrainageError::MissingEdge(a, b));
                }
                let (pa, pb) = (*tin.position(a), *tin.position(b));
                let len = pa.planar_distance(&pb);
                let tol = tin.tolerances.point;
                if u * len <= tol {
                    Ok(Some(a))
                } else if (1.0 - u) * len <= tol {
                    Ok(Some(b))
                } else if Self::touches_ascent_line(tin, &pa.lerp(&pb, u)) {
                    Ok(None)
                } else if self.max_new_vertices == 0 {
                    // no budget for the split: start from the nearer end
                    Ok(Some(if u < 0.5 { a } else { b }))
                } else {
                    *inserted += 1;
                    tin.split_edge(a, b, u).map(Some)
                }
            }
            AscentStart::TriangleBase { a, b } => {
                match flow::classify_base(tin, a, b, self.flat_tol) {
                    None => Err(DrainageError::MissingEdge(a, b)),
                    Some(BaseFlow::ThroughVertex(v)) => Ok(Some(v)),
                    Some(BaseFlow::AcrossBase) => {
                        let u = self.base_crossing(tin, a, b)?;
                        self.resolve_start(tin, AscentStart::EdgePoint { a, b, u }, inserted)
                    }
                    Some(_) => {
                        self.resolve_start(tin, AscentStart::EdgePoint { a, b, u: 0.5 }, inserted)
                    }
                }
            }
        }
    }

    /// Parameter where the apex descent crosses the base, kept away from the
    /// base vertices.
    fn base_crossing(&self, tin: &Tin, a: usize, b: usize) -> Result<f64> {
        let f = tin.left_face(a, b).ok_or(DrainageError::MissingEdge(a, b))?;
        let c = tin.apex_left(a, b).ok_or(DrainageError::MissingEdge(a, b))?;
        let Some(g) = tin.face_gradient(f, self.flat_tol) else {
            return Ok(0.5);
        };
        let hit = kernel::ray_segment_intersection(
            tin.position(c),
            g.descent_dir(),
            tin.position(a),
            tin.position(b),
        );
        Ok(hit.map_or(0.5, |hit| hit.s.clamp(0.1, 0.9)))
    }

    fn climb(&self, tin: &mut Tin, cur: usize, inserted: &mut usize) -> Result<Climb> {
        enum Way {
            Edge(usize),
            Face(usize, usize),
        }
        let pv = *tin.position(cur);
        let mut best: Option<(f64, Way)> = None;
        for h in tin.outgoing_cw(cur) {
            let n = tin.target(h);
            if tin.position(n).z() - pv.z() > self.flat_tol {
                let rise = -tin.edge_fall(cur, n);
                if best.as_ref().is_none_or(|(s, _)| rise > *s) {
                    best = Some((rise, Way::Edge(n)));
                }
            }
            let Some(f) = tin.face_of(h) else {
                continue;
            };
            if self.blocked(tin, f) {
                continue;
            }
            let Some(g) = tin.face_gradient(f, self.flat_tol) else {
                continue;
            };
            let n2 = tin.target(tin.rot_ccw_around_vertex(h));
            if flow::in_wedge(&pv, tin.position(n), tin.position(n2), g.ascent_dir())
                && best.as_ref().is_none_or(|(s, _)| g.slope > *s)
            {
                best = Some((g.slope, Way::Face(n, n2)));
            }
        }

        let Some((_, way)) = best else {
            return Ok(Climb::Stop(AscentStop::Peak));
        };
        match way {
            Way::Edge(n) => {
                if self.is_ridge(tin, cur, n) {
                    Ok(Climb::Stop(AscentStop::Ridge))
                } else {
                    Ok(Climb::To(n, None))
                }
            }
            Way::Face(n, n2) => {
                let f = tin.left_face(cur, n).ok_or(DrainageError::MissingEdge(cur, n))?;
                let Some(g) = tin.face_gradient(f, self.flat_tol) else {
                    return Ok(Climb::Stop(AscentStop::Peak));
                };
                let dir = g.ascent_dir();
                let (pn, pn2) = (*tin.position(n), *tin.position(n2));
                let ridge = self.is_ridge(tin, n, n2);
                let stop = ridge.then_some(AscentStop::Ridge);
                let tol = tin.tolerances;

                for v in [n, n2] {
                    if kernel::distance_to_line(tin.position(v), &pv, dir) <= tol.line {
                        return Ok(Climb::To(v, stop));
                    }
                }
                let Some(hit) = kernel::ray_segment_intersection(&pv, dir, &pn, &pn2) else {
                    return Ok(Climb::Stop(AscentStop::Peak));
                };
                let s = hit.s.clamp(0.0, 1.0);
                let q = pn.lerp(&pn2, s);
                if s < MIN_SPLIT_PARAM || q.planar_distance(&pn) <= tol.point {
                    return Ok(Climb::To(n, stop));
                }
                if s > 1.0 - MIN_SPLIT_PARAM || q.planar_distance(&pn2) <= tol.point {
                    return Ok(Climb::To(n2, stop));
                }
                if Self::touches_ascent_line(tin, &q) {
                    return Ok(Climb::Stop(AscentStop::Merged));
                }
                if *inserted >= self.max_new_vertices {
                    return Ok(Climb::Stop(AscentStop::VertexLimit));
                }
                let m = tin.split_edge(n, n2, s)?;
                *inserted += 1;
                Ok(Climb::To(m, stop))
            }
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn ascent_on_a_plane_cuts_across_triangles() {
        // rises toward +x, so the line runs along y = 0.5 from the left hull
        let mut tin = Tin::from_grid(3, 1, 1.0, |x, _| x).unwrap();
        let inserter = AscentInserter::new(1e-9, None);
        let line = inserter
            .insert(&mut tin, AscentStart::EdgePoint { a: 0, b: 4, u: 0.5 })
            .unwrap();
        tin.validate().unwrap();
        assert_eq!(line.stop, AscentStop::Hull);
        let zs: Vec<f64> = line.vertices.iter().map(|&v| tin.position(v).z()).collect();
        assert!(zs.windows(2).all(|w| w[1] >= w[0]));
        assert!((zs[zs.len() - 1] - 3.0).abs() < 1e-9);
        for &v in &line.vertices {
            assert!((tin.position(v).y() - 0.5).abs() < 1e-9);
        }
        assert_eq!(tin.features_of_kind(FeatureKind::AscentLine).count(), 1);
    }

    #[test]
    fn ascent_stops_on_existing_line() {
        let mut tin = Tin::from_grid(3, 2, 1.0, |x, _| x).unwrap();
        let inserter = AscentInserter::new(1e-9, None);
        inserter.insert(&mut tin, AscentStart::Vertex(4)).unwrap();
        let again = inserter.insert(&mut tin, AscentStart::Vertex(4)).unwrap();
        assert_eq!(again.stop, AscentStop::Merged);
        assert_eq!(again.inserted, 0);
    }

    #[test]
    fn peak_vertex_has_no_line() {
        let mut tin = Tin::from_grid(2, 2, 1.0, |x, y| -((x - 1.0).powi(2) + (y - 1.0).powi(2))).unwrap();
        let inserter = AscentInserter::new(1e-9, None);
        let line = inserter.insert(&mut tin, AscentStart::Vertex(4)).unwrap();
        assert_eq!(line.stop, AscentStop::Peak);
        assert_eq!(line.vertices, vec![4]);
        assert!(tin.features.is_empty());
    }
}
