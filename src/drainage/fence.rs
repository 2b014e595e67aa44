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

use log::debug;

use crate::{
    geometry::{Point2, polygon},
    kernel::{self, Orientation},
    mesh::Tin,
};

/// Region of interest restricting which triangles take part in a call.
#[derive(Debug, Clone, PartialEq)]
pub enum Fence {
    /// Closed ring, first point repeated at the end.
    Polygon(Vec<Point2>),
    Rectangle { min: Point2, max: Point2 },
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Default)]
pub enum FenceMode {
    /// Keep triangles lying wholly inside the fence.
    #[default]
    Inside,
    /// Keep triangles that do not touch the fence region.
    Outside,
    /// Keep triangles that overlap the fence region at all.
    Overlap,
}

#[derive(Debug, Clone, PartialEq)]
pub struct FenceSpec {
    pub fence: Fence,
    pub mode: FenceMode,
}

impl FenceSpec {
    pub fn new(fence: Fence, mode: FenceMode) -> Self {
        Self { fence, mode }
    }

    /// The fence as a closed ring, or `None` when it is malformed: fewer
    /// than three distinct points, an unclosed ring, zero area or an empty
    /// rectangle.
    pub fn ring(&self) -> Option<Vec<Point2>> {
        match &self.fence {
            Fence::Polygon(points) => {
                let (first, last) = (points.first()?, points.last()?);
                if points.len() < 4 || first != last {
                    return None;
                }
                let open = &points[..points.len() - 1];
                let mut distinct: Vec<&Point2> = Vec::with_capacity(open.len());
                for p in open {
                    if !distinct.iter().any(|q| *q == p) {
                        distinct.push(p);
                    }
                }
                if distinct.len() < 3 || polygon::signed_area_2d(points) == 0.0 {
                    return None;
                }
                Some(points.clone())
            }
            Fence::Rectangle { min, max } => {
                if !(min.x() < max.x() && min.y() < max.y()) {
                    return None;
                }
                Some(vec![
                    *min,
                    Point2::xy(max.x(), min.y()),
                    *max,
                    Point2::xy(min.x(), max.y()),
                    *min,
                ])
            }
        }
    }

    /// The fence ready for per-face tests, `None` when it is malformed.
    pub fn activate(&self) -> Option<ActiveFence> {
        match self.ring() {
            Some(ring) => Some(ActiveFence {
                ring,
                mode: self.mode,
            }),
            None => {
                debug!("fence is malformed, processing the whole mesh");
                None
            }
        }
    }

    /// Per-face exclusion mask (`true` = outside the region of interest),
    /// `None` for a malformed fence.
    pub fn face_mask(&self, tin: &Tin) -> Option<Vec<bool>> {
        let fence = self.activate()?;
        Some((0..tin.face_count()).map(|f| fence.excludes(tin, f)).collect())
    }
}

/// A validated fence ring with its mode.
#[derive(Debug, Clone)]
pub struct ActiveFence {
    ring: Vec<Point2>,
    mode: FenceMode,
}

impl ActiveFence {
    pub fn excludes(&self, tin: &Tin, f: usize) -> bool {
        let tri = tin.face_points(f).map(|p| p.planar());
        let inside = tri.map(|p| polygon::point_in_ring_2d(&p, &self.ring));
        match self.mode {
            FenceMode::Inside => !(inside.iter().all(|&i| i) && !self.crosses(&tri)),
            FenceMode::Overlap => !self.overlaps(&tri, &inside),
            FenceMode::Outside => self.overlaps(&tri, &inside),
        }
    }

    fn overlaps(&self, tri: &[Point2; 3], inside: &[bool; 3]) -> bool {
        if inside.iter().any(|&i| i) {
            return true;
        }
        let contains = |p: &Point2| {
            (0..3).all(|i| kernel::orientation(&tri[i], &tri[(i + 1) % 3], p) != Orientation::Clockwise)
        };
        self.ring.iter().any(contains) || self.crosses(tri)
    }

    fn crosses(&self, tri: &[Point2; 3]) -> bool {
        self.ring.windows(2).any(|w| {
            (0..3).any(|i| segments_cross(&tri[i], &tri[(i + 1) % 3], &w[0], &w[1]))
        })
    }
}

/// Proper crossing of two segments (touching endpoints do not count).
fn segments_cross(p1: &Point2, p2: &Point2, q1: &Point2, q2: &Point2) -> bool {
    let a = kernel::orientation(p1, p2, q1);
    let b = kernel::orientation(p1, p2, q2);
    let c = kernel::orientation(q1, q2, p1);
    let d = kernel::orientation(q1, q2, p2);
    !a.is_collinear()
        && !b.is_collinear()
        && !c.is_collinear()
        && !d.is_collinear()
        && a != b
        && c != d
}

#[cfg(test)]
mod tests {
    use super::*;

    fn grid() -> Tin {
        Tin::from_grid(4, 4, 1.0, |x, _| x).unwrap()
    }

    #[test]
    fn unclosed_polygon_is_ignored() {
        let spec = FenceSpec::new(
            Fence::Polygon(vec![
                Point2::xy(0.0, 0.0),
                Point2::xy(2.0, 0.0),
                Point2::xy(2.0, 2.0),
            ]),
            FenceMode::Inside,
        );
        assert!(spec.ring().is_none());
        assert!(spec.face_mask(&grid()).is_none());
    }

    #[test]
    fn too_few_distinct_points_is_ignored() {
        let p = Point2::xy(1.0, 1.0);
        let q = Point2::xy(2.0, 1.0);
        let spec = FenceSpec::new(Fence::Polygon(vec![p, q, p, q, p]), FenceMode::Inside);
        assert!(spec.ring().is_none());
    }

    #[test]
    fn rectangle_modes_partition_the_mesh() {
        let tin = grid();
        let fence = Fence::Rectangle {
            min: Point2::xy(-0.5, -0.5),
            max: Point2::xy(2.5, 4.5),
        };
        let inside = FenceSpec::new(fence.clone(), FenceMode::Inside)
            .face_mask(&tin)
            .unwrap();
        let outside = FenceSpec::new(fence.clone(), FenceMode::Outside)
            .face_mask(&tin)
            .unwrap();
        let overlap = FenceSpec::new(fence, FenceMode::Overlap)
            .face_mask(&tin)
            .unwrap();
        // two columns of 4 cells are inside, the third column straddles
        // the fence and the fourth is clear of it
        assert_eq!(inside.iter().filter(|&&x| !x).count(), 16);
        assert_eq!(outside.iter().filter(|&&x| !x).count(), 8);
        for f in 0..tin.face_count() {
            assert_ne!(overlap[f], outside[f]);
        }
    }
}
