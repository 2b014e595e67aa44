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

use std::f64::consts::PI;

use crate::{
    geometry::{Point3, util::normalize_angle},
    kernel::{self, Orientation},
    mesh::Tin,
};

/// Below this cosine an edge counts as parallel to a face's flow.
pub const PARALLEL_TOLERANCE: f64 = 1e-6;

/// Steepest-slope description of a sloping triangle.
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct FaceGradient {
    /// Direction of steepest rise, in `[0, 2π)`.
    pub ascent: f64,
    /// `ascent + π`, in `[0, 2π)`.
    pub descent: f64,
    /// Rise over run along the ascent direction.
    pub slope: f64,
}

impl FaceGradient {
    pub fn ascent_dir(&self) -> (f64, f64) {
        (self.ascent.cos(), self.ascent.sin())
    }

    pub fn descent_dir(&self) -> (f64, f64) {
        (self.descent.cos(), self.descent.sin())
    }
}

/// `(dz/dx, dz/dy)` of the plane through three points, `None` when the
/// points are collinear in plan.
pub fn plane_gradient(p: &[Point3; 3]) -> Option<(f64, f64)> {
    let u = p[0].vector_to(&p[1]);
    let v = p[0].vector_to(&p[2]);
    let n = u.cross(&v);
    let nz = n.coords[2];
    if nz == 0.0 || !nz.is_finite() {
        return None;
    }
    Some((-n.coords[0] / nz, -n.coords[1] / nz))
}

/// A triangle is flat when its vertex elevations differ by at most `flat_tol`.
pub fn is_flat(p: &[Point3; 3], flat_tol: f64) -> bool {
    let lo = p[0].z().min(p[1].z()).min(p[2].z());
    let hi = p[0].z().max(p[1].z()).max(p[2].z());
    hi - lo <= flat_tol
}

pub fn face_gradient(p: &[Point3; 3], flat_tol: f64) -> Option<FaceGradient> {
    if is_flat(p, flat_tol) {
        return None;
    }
    let (gx, gy) = plane_gradient(p)?;
    let slope = gx.hypot(gy);
    if slope == 0.0 {
        return None;
    }
    let ascent = normalize_angle(gy.atan2(gx));
    Some(FaceGradient {
        ascent,
        descent: normalize_angle(ascent + PI),
        slope,
    })
}

impl Tin {
    pub fn face_gradient(&self, f: usize, flat_tol: f64) -> Option<FaceGradient> {
        face_gradient(&self.face_points(f), flat_tol)
    }

    pub fn is_flat_face(&self, f: usize, flat_tol: f64) -> bool {
        is_flat(&self.face_points(f), flat_tol)
    }

    /// Drop per unit of plan distance going from `from` to `to`; negative
    /// when `to` is higher.
    pub fn edge_fall(&self, from: usize, to: usize) -> f64 {
        let p = self.position(from);
        let q = self.position(to);
        let run = p.planar_distance(q);
        if run == 0.0 {
            return 0.0;
        }
        (p.z() - q.z()) / run
    }

    pub fn is_level_edge(&self, a: usize, b: usize, flat_tol: f64) -> bool {
        (self.position(a).z() - self.position(b).z()).abs() <= flat_tol
    }
}

/// Where the descent from the apex of a triangle goes relative to its base.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum BaseFlow {
    /// The descent ray from the apex crosses the base edge.
    AcrossBase,
    /// The descent ray runs exactly through a base vertex.
    ThroughVertex(usize),
    /// Water leaves across the side edge that ends at this base vertex.
    OffSide(usize),
    /// The descent points away from the base.
    AwayFromBase,
    Flat,
}

/// Classifies the triangle left of the base `a -> b`; `None` if there is
/// no triangle there.
pub fn classify_base(tin: &Tin, a: usize, b: usize, flat_tol: f64) -> Option<BaseFlow> {
    let f = tin.left_face(a, b)?;
    let c = tin.apex_left(a, b)?;
    let Some(g) = tin.face_gradient(f, flat_tol) else {
        return Some(BaseFlow::Flat);
    };
    let apex = tin.position(c);
    let (dx, dy) = g.descent_dir();
    let tip = (apex.x() + dx, apex.y() + dy);
    let pa = tin.position(a);
    let pb = tin.position(b);
    let ahead = |p: &Point3| (p.x() - apex.x()) * dx + (p.y() - apex.y()) * dy > 0.0;

    let flow = match (
        kernel::orientation(apex, &tip, pa),
        kernel::orientation(apex, &tip, pb),
    ) {
        (Orientation::Collinear, _) if ahead(pa) => BaseFlow::ThroughVertex(a),
        (_, Orientation::Collinear) if ahead(pb) => BaseFlow::ThroughVertex(b),
        (Orientation::Clockwise, Orientation::CounterClockwise) => BaseFlow::AcrossBase,
        (Orientation::CounterClockwise, Orientation::Clockwise) => BaseFlow::AwayFromBase,
        (Orientation::CounterClockwise, _) => BaseFlow::OffSide(a),
        (Orientation::Clockwise, _) => BaseFlow::OffSide(b),
        (Orientation::Collinear, _) => BaseFlow::AwayFromBase,
    };
    Some(flow)
}

/// How the triangle left of a directed edge drains relative to that edge.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum SideFlow {
    /// Water in the triangle runs toward (and across) the edge.
    Toward,
    /// Water runs away from the edge into the triangle.
    Away,
    /// Flow runs along the edge.
    Parallel,
    Flat,
    /// Void or fenced-out triangle.
    Blocked,
    /// No triangle: the edge is on the hull.
    Hull,
}

/// Flow of the triangle left of `a -> b`, with its gradient when it has one.
pub fn side_flow<B>(
    tin: &Tin,
    a: usize,
    b: usize,
    flat_tol: f64,
    blocked: B,
) -> (SideFlow, Option<FaceGradient>)
where
    B: Fn(usize) -> bool,
{
    let Some(f) = tin.left_face(a, b) else {
        return (SideFlow::Hull, None);
    };
    if blocked(f) {
        return (SideFlow::Blocked, None);
    }
    let Some(g) = tin.face_gradient(f, flat_tol) else {
        return (SideFlow::Flat, None);
    };
    let pa = tin.position(a);
    let pb = tin.position(b);
    let ex = pb.x() - pa.x();
    let ey = pb.y() - pa.y();
    let len = ex.hypot(ey);
    if len == 0.0 {
        return (SideFlow::Parallel, Some(g));
    }
    // outward normal of a left-hand face is the right normal of a -> b
    let (dx, dy) = g.descent_dir();
    let cos = (dx * ey - dy * ex) / len;
    let flow = if cos > PARALLEL_TOLERANCE {
        SideFlow::Toward
    } else if cos < -PARALLEL_TOLERANCE {
        SideFlow::Away
    } else {
        SideFlow::Parallel
    };
    (flow, Some(g))
}

/// Whether `dir` points strictly inside the anticlockwise wedge from
/// `origin -> a` to `origin -> b` (wedge narrower than π).
pub fn in_wedge(origin: &Point3, a: &Point3, b: &Point3, dir: (f64, f64)) -> bool {
    let ax = a.x() - origin.x();
    let ay = a.y() - origin.y();
    let bx = b.x() - origin.x();
    let by = b.y() - origin.y();
    let after_a = ax * dir.1 - ay * dir.0 > 0.0;
    let before_b = dir.0 * by - dir.1 * bx > 0.0;
    after_a && before_b
}
