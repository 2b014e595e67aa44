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

//! Steepest-descent walk from a start position to the place its runoff ends.

use ahash::AHashSet;
use log::trace;

use crate::{
    config::DrainageConfig,
    drainage::{
        flow::{self, SideFlow},
        pond,
    },
    error::Result,
    geometry::Point3,
    kernel::{self, Orientation},
    mesh::Tin,
};

/// Where runoff terminates.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, PartialOrd, Ord)]
pub enum Terminus {
    Point(usize),
    /// Level edge, smaller vertex index first.
    Edge(usize, usize),
}

impl Terminus {
    pub fn edge(a: usize, b: usize) -> Self {
        Terminus::Edge(a.min(b), a.max(b))
    }

    /// A vertex on the terminus. Vertex indices survive mesh edits, so this
    /// is how a catchment is found again after refinement.
    pub fn anchor(&self) -> usize {
        match *self {
            Terminus::Point(v) | Terminus::Edge(v, _) => v,
        }
    }

    pub fn position(&self, tin: &Tin) -> Point3 {
        match *self {
            Terminus::Point(v) => *tin.position(v),
            Terminus::Edge(a, b) => tin.position(a).midpoint(tin.position(b)),
        }
    }
}

#[derive(Debug, Clone, Copy, PartialEq)]
pub enum TracePosition {
    InTriangle { face: usize, at: Point3 },
    OnEdge { a: usize, b: usize, at: Point3 },
    OnVertex(usize),
}

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum TraceOutcome {
    Sump(Terminus),
    /// Runoff entered a void or fenced-out triangle.
    Void,
    /// The step guard tripped.
    StepLimit,
    /// The walk came back to a vertex it had already left.
    Cycle(usize),
    /// No exit could be found from a triangle (numerically degenerate).
    Stalled,
}

impl TraceOutcome {
    pub fn terminus(&self) -> Option<Terminus> {
        match *self {
            TraceOutcome::Sump(t) => Some(t),
            _ => None,
        }
    }
}

enum Step {
    Move(TracePosition),
    Done(TraceOutcome),
}

#[derive(Default)]
struct Walk {
    visited: AHashSet<usize>,
    /// False lows and pond vertices the walk has climbed out of.
    bypassed: AHashSet<usize>,
    low_z: Option<f64>,
}

pub struct LowPointTracer<'a> {
    tin: &'a Tin,
    blocked: &'a [bool],
    flat_tol: f64,
    false_low_depth: f64,
    max_pond_depth: f64,
    max_steps: usize,
}

impl<'a> LowPointTracer<'a> {
    /// `blocked` marks void or fenced-out faces by index.
    pub fn new(tin: &'a Tin, blocked: &'a [bool], cfg: &DrainageConfig) -> Self {
        Self {
            tin,
            blocked,
            flat_tol: cfg.flat_tolerance,
            false_low_depth: cfg.false_low_depth,
            max_pond_depth: cfg.max_pond_depth,
            max_steps: 8 * (tin.vertex_count() + tin.face_count()) + 64,
        }
    }

    pub fn max_steps(&self) -> usize {
        self.max_steps
    }

    fn is_blocked(&self, f: usize) -> bool {
        self.tin.faces[f].void || self.blocked.get(f).copied().unwrap_or(false)
    }

    /// Traces from `(x, y)` inside `face`, elevation taken from the face plane.
    pub fn trace_point(&self, face: usize, x: f64, y: f64) -> Result<TraceOutcome> {
        let at = plane_point(&self.tin.face_points(face), x, y);
        self.trace(TracePosition::InTriangle { face, at })
    }

    pub fn trace(&self, start: TracePosition) -> Result<TraceOutcome> {
        let mut walk = Walk::default();
        let mut pos = start;
        for _ in 0..self.max_steps {
            let step = match pos {
                TracePosition::InTriangle { face, at } => match self.leave_triangle(face, &at) {
                    Some(next) => Step::Move(next),
                    None => Step::Done(TraceOutcome::Stalled),
                },
                TracePosition::OnEdge { a, b, at } => self.on_edge(a, b, &at, &walk),
                TracePosition::OnVertex(v) => self.at_vertex(v, &mut walk)?,
            };
            match step {
                Step::Move(next) => pos = next,
                Step::Done(outcome) => {
                    trace!("trace from {start:?} ended: {outcome:?}");
                    return Ok(outcome);
                }
            }
        }
        trace!("trace from {start:?} hit the step limit");
        Ok(TraceOutcome::StepLimit)
    }

    fn face_allowed(&self, f: usize, current: Option<usize>, walk: &Walk) -> bool {
        if self.is_blocked(f) {
            return false;
        }
        walk.bypassed.is_empty()
            || self
                .tin
                .face_vertices(f)
                .iter()
                .all(|&u| Some(u) == current || !walk.bypassed.contains(&u))
    }

    /// Follows the face's descent from `at` to the boundary of `face`.
    fn leave_triangle(&self, face: usize, at: &Point3) -> Option<TracePosition> {
        let g = self.tin.face_gradient(face, self.flat_tol)?;
        let dir = g.descent_dir();
        let tip = (at.x() + dir.0, at.y() + dir.1);
        let vs = self.tin.face_vertices(face);
        let ps = vs.map(|v| *self.tin.position(v));
        let tol = self.tin.tolerances.point;
        let side = ps.map(|p| kernel::orientation(at, &tip, &p));

        for i in 0..3 {
            let p = &ps[i];
            let ahead = (p.x() - at.x()) * dir.0 + (p.y() - at.y()) * dir.1 > 0.0;
            if side[i].is_collinear() && ahead && p.planar_distance(at) > tol {
                return Some(TracePosition::OnVertex(vs[i]));
            }
        }
        for i in 0..3 {
            let j = (i + 1) % 3;
            if side[i] != Orientation::Clockwise || side[j] != Orientation::CounterClockwise {
                continue;
            }
            let hit = kernel::ray_segment_intersection(at, dir, &ps[i], &ps[j])?;
            let q = ps[i].lerp(&ps[j], hit.s.clamp(0.0, 1.0));
            if q.planar_distance(&ps[i]) <= tol {
                return Some(TracePosition::OnVertex(vs[i]));
            }
            if q.planar_distance(&ps[j]) <= tol {
                return Some(TracePosition::OnVertex(vs[j]));
            }
            return Some(TracePosition::OnEdge {
                a: vs[i],
                b: vs[j],
                at: q,
            });
        }
        None
    }

    fn on_edge(&self, a: usize, b: usize, at: &Point3, walk: &Walk) -> Step {
        let blocked = |f: usize| self.is_blocked(f);
        let (left, left_g) = flow::side_flow(self.tin, a, b, self.flat_tol, blocked);
        let (right, right_g) = flow::side_flow(self.tin, b, a, self.flat_tol, blocked);

        let mut best: Option<(usize, f64)> = None;
        for (side, g, face) in [
            (left, left_g, self.tin.left_face(a, b)),
            (right, right_g, self.tin.right_face(a, b)),
        ] {
            if let (SideFlow::Away, Some(g), Some(f)) = (side, g, face) {
                if self.face_allowed(f, None, walk) && best.is_none_or(|(_, s)| g.slope > s) {
                    best = Some((f, g.slope));
                }
            }
        }
        if let Some((face, _)) = best {
            return Step::Move(TracePosition::InTriangle { face, at: *at });
        }
        if left == SideFlow::Blocked || right == SideFlow::Blocked {
            return Step::Done(TraceOutcome::Void);
        }
        if self.tin.is_level_edge(a, b, self.flat_tol) {
            return Step::Done(TraceOutcome::Sump(Terminus::edge(a, b)));
        }
        let lower = if self.tin.position(a).z() < self.tin.position(b).z() {
            a
        } else {
            b
        };
        Step::Move(TracePosition::OnVertex(lower))
    }

    fn at_vertex(&self, v: usize, walk: &mut Walk) -> Result<Step> {
        let tin = self.tin;
        if tin.is_drain(v) {
            return Ok(Step::Done(TraceOutcome::Sump(Terminus::Point(v))));
        }
        if !walk.visited.insert(v) {
            return Ok(Step::Done(TraceOutcome::Cycle(v)));
        }

        let pv = tin.position(v);
        let mut best: Option<(f64, TracePosition)> = None;
        let mut offer = |slope: f64, pos: TracePosition| {
            if best.is_none_or(|(s, _)| slope > s) {
                best = Some((slope, pos));
            }
        };
        for h in tin.outgoing_cw(v) {
            let n = tin.target(h);
            if !walk.bypassed.contains(&n) && pv.z() - tin.position(n).z() > self.flat_tol {
                offer(tin.edge_fall(v, n), TracePosition::OnVertex(n));
            }
            let Some(f) = tin.face_of(h) else {
                continue;
            };
            if !self.face_allowed(f, Some(v), walk) {
                continue;
            }
            let Some(g) = tin.face_gradient(f, self.flat_tol) else {
                continue;
            };
            let n2 = tin.target(tin.rot_ccw_around_vertex(h));
            if flow::in_wedge(pv, tin.position(n), tin.position(n2), g.descent_dir()) {
                offer(g.slope, TracePosition::InTriangle { face: f, at: *pv });
            }
        }
        if let Some((_, next)) = best {
            return Ok(Step::Move(next));
        }

        // local minimum
        if tin.faces_around_vertex(v).iter().any(|&f| self.is_blocked(f)) {
            return Ok(Step::Done(TraceOutcome::Void));
        }
        let low_z = *walk.low_z.get_or_insert(pv.z());
        if self.false_low_depth > 0.0 {
            let climb = tin
                .neighbors_ccw(v)
                .into_iter()
                .filter(|n| !walk.visited.contains(n) && !walk.bypassed.contains(n))
                .filter(|&n| tin.position(n).z() - low_z < self.false_low_depth);
            if let Some(n) = lowest(tin, climb) {
                trace!("bypassing false low at {v} via {n}");
                walk.bypassed.insert(v);
                return Ok(Step::Move(TracePosition::OnVertex(n)));
            }
        }
        if self.max_pond_depth > 0.0 {
            let outlet = pond::measure_pond(tin, v, self.max_pond_depth, |f| self.is_blocked(f))?;
            if let Some(outlet) = outlet.filter(|o| o.depth < self.max_pond_depth) {
                if !walk.visited.contains(&outlet.spill) {
                    trace!("pond at {v} passes through {}", outlet.spill);
                    walk.bypassed.extend(outlet.members);
                    return Ok(Step::Move(TracePosition::OnVertex(outlet.spill)));
                }
            }
        }
        let sump = if walk.bypassed.is_empty() {
            v
        } else {
            lowest(tin, walk.bypassed.iter().copied().chain([v])).unwrap_or(v)
        };
        Ok(Step::Done(TraceOutcome::Sump(Terminus::Point(sump))))
    }
}

/// Lowest vertex, ties to the smaller index.
fn lowest<I>(tin: &Tin, vertices: I) -> Option<usize>
where
    I: IntoIterator<Item = usize>,
{
    vertices.into_iter().min_by(|&a, &b| {
        tin.position(a)
            .z()
            .total_cmp(&tin.position(b).z())
            .then(a.cmp(&b))
    })
}

/// `(x, y)` lifted onto the plane through `p`.
pub fn plane_point(p: &[Point3; 3], x: f64, y: f64) -> Point3 {
    let z = match flow::plane_gradient(p) {
        Some((gx, gy)) => p[0].z() + gx * (x - p[0].x()) + gy * (y - p[0].y()),
        None => (p[0].z() + p[1].z() + p[2].z()) / 3.0,
    };
    Point3::xyz(x, y, z)
}
