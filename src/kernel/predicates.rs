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

use crate::kernel::orientation::Planar;

/// Result of intersecting the ray `origin + t * dir` with segment `p -> q`.
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct RaySegmentHit {
    /// Distance along the ray in units of `dir`.
    pub t: f64,
    /// Parameter along the segment, 0 at `p` and 1 at `q`.
    pub s: f64,
}

/// Solves `origin + t * dir = p + s * (q - p)`.
///
/// Returns `None` for a ray parallel to the segment. No range checks are
/// applied to `t` or `s`; callers decide how to treat hits behind the origin
/// or beyond the segment ends.
pub fn ray_segment_intersection<O: Planar, P: Planar, Q: Planar>(
    origin: &O,
    dir: (f64, f64),
    p: &P,
    q: &Q,
) -> Option<RaySegmentHit> {
    let ex = q.px() - p.px();
    let ey = q.py() - p.py();
    let denom = dir.0 * ey - dir.1 * ex;
    if denom == 0.0 || !denom.is_finite() {
        return None;
    }
    let wx = p.px() - origin.px();
    let wy = p.py() - origin.py();
    let t = (wx * ey - wy * ex) / denom;
    let s = (wx * dir.1 - wy * dir.0) / denom;
    Some(RaySegmentHit { t, s })
}

/// Perpendicular distance from `p` to the infinite line through `a` with
/// direction `dir`.
pub fn distance_to_line<P: Planar, A: Planar>(p: &P, a: &A, dir: (f64, f64)) -> f64 {
    let len = dir.0.hypot(dir.1);
    if len == 0.0 {
        return (p.px() - a.px()).hypot(p.py() - a.py());
    }
    ((p.px() - a.px()) * dir.1 - (p.py() - a.py()) * dir.0).abs() / len
}

/// Parameter of the orthogonal projection of `p` onto `a -> b`.
pub fn segment_param<P: Planar, A: Planar, B: Planar>(p: &P, a: &A, b: &B) -> f64 {
    let ex = b.px() - a.px();
    let ey = b.py() - a.py();
    let len2 = ex * ex + ey * ey;
    if len2 == 0.0 {
        return 0.0;
    }
    ((p.px() - a.px()) * ex + (p.py() - a.py()) * ey) / len2
}

/// True when `p` lies within `tol` of segment `a -> b`.
pub fn point_on_segment<P: Planar, A: Planar, B: Planar>(p: &P, a: &A, b: &B, tol: f64) -> bool {
    let s = segment_param(p, a, b).clamp(0.0, 1.0);
    let cx = a.px() + s * (b.px() - a.px());
    let cy = a.py() + s * (b.py() - a.py());
    (p.px() - cx).hypot(p.py() - cy) <= tol
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::geometry::Point2;

    #[test]
    fn ray_hits_segment_middle() {
        let o = Point2::xy(0.0, 0.0);
        let p = Point2::xy(2.0, -1.0);
        let q = Point2::xy(2.0, 1.0);
        let hit = ray_segment_intersection(&o, (1.0, 0.0), &p, &q).unwrap();
        assert!((hit.t - 2.0).abs() < 1e-12);
        assert!((hit.s - 0.5).abs() < 1e-12);
    }

    #[test]
    fn parallel_ray_misses() {
        let o = Point2::xy(0.0, 0.0);
        let p = Point2::xy(0.0, 1.0);
        let q = Point2::xy(1.0, 1.0);
        assert!(ray_segment_intersection(&o, (1.0, 0.0), &p, &q).is_none());
    }

    #[test]
    fn point_on_segment_with_tolerance() {
        let a = Point2::xy(0.0, 0.0);
        let b = Point2::xy(1.0, 0.0);
        assert!(point_on_segment(&Point2::xy(0.5, 1e-9), &a, &b, 1e-6));
        assert!(!point_on_segment(&Point2::xy(1.5, 0.0), &a, &b, 1e-6));
        assert!((distance_to_line(&Point2::xy(0.3, 2.0), &a, (1.0, 0.0)) - 2.0).abs() < 1e-12);
    }
}
