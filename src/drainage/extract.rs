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

//! Turns a coloured triangle index into closed catchment polygons.

use std::collections::VecDeque;

use log::{debug, warn};

use crate::{
    drainage::index::{CatchmentId, SumpLineType, TriangleIndex},
    error::{DrainageError, Result},
    geometry::{Point2, Point3, polygon},
    mesh::Tin,
};

/// One connected region of equal catchment id.
#[derive(Debug, Clone, PartialEq)]
pub struct CatchmentPolygon {
    pub id: CatchmentId,
    pub sump: SumpLineType,
    /// Closed, anticlockwise outer ring.
    pub points: Vec<Point3>,
    /// Closed, clockwise rings of enclosed foreign regions.
    pub holes: Vec<Vec<Point3>>,
}

impl CatchmentPolygon {
    /// Plan area with holes removed.
    pub fn area(&self) -> f64 {
        polygon::signed_area(&self.points)
            + self
                .holes
                .iter()
                .map(|h| polygon::signed_area(h))
                .sum::<f64>()
    }

    pub fn contains(&self, x: f64, y: f64) -> bool {
        let p = Point2::xy(x, y);
        polygon::point_in_ring(&p, &self.points)
            && !self.holes.iter().any(|h| polygon::point_in_ring(&p, h))
    }
}

struct Extractor<'a> {
    tin: &'a Tin,
    index: &'a TriangleIndex,
    colour: Vec<CatchmentId>,
    consumed: Vec<bool>,
}

impl Extractor<'_> {
    fn colour_of(&self, f: Option<usize>) -> CatchmentId {
        f.map_or(CatchmentId::UNDETERMINED, |f| self.colour[f])
    }

    /// Interior half-edge of a coloured face whose other side differs.
    fn is_boundary(&self, h: usize) -> bool {
        let Some(f) = self.tin.face_of(h) else {
            return false;
        };
        let c = self.colour[f];
        c.is_determined() && self.colour_of(self.tin.face_across(h)) != c
    }

    /// Boundary half-edge leaving the target of `h`, found by sweeping
    /// clockwise through same-coloured faces.
    fn next_boundary(&self, h: usize) -> Option<usize> {
        let c = self.colour_of(self.tin.face_of(h));
        let mut g = self.tin.next(h);
        for _ in 0..self.tin.half_edges.len() {
            if self.colour_of(self.tin.face_across(g)) != c {
                return Some(g);
            }
            g = self.tin.next(self.tin.twin(g));
        }
        None
    }

    fn walk(&mut self, start: usize) -> Result<Vec<Point3>> {
        let id = self.colour_of(self.tin.face_of(start));
        let mut ring = Vec::new();
        let mut h = start;
        loop {
            self.consumed[h] = true;
            ring.push(*self.tin.position(self.tin.origin(h)));
            h = self
                .next_boundary(h)
                .ok_or(DrainageError::DegeneratePolygon {
                    id: id.0,
                    points: ring.len(),
                })?;
            if h == start {
                break;
            }
            if self.consumed[h] || ring.len() > self.tin.half_edges.len() {
                return Err(DrainageError::DegeneratePolygon {
                    id: id.0,
                    points: ring.len(),
                });
            }
        }
        polygon::close_ring(&mut ring);
        if ring.len() < 4 {
            return Err(DrainageError::DegeneratePolygon {
                id: id.0,
                points: ring.len(),
            });
        }
        Ok(ring)
    }

    fn components(&self) -> Vec<usize> {
        let n = self.colour.len();
        let mut comp = vec![usize::MAX; n];
        let mut next_id = 0;
        let mut queue = VecDeque::new();
        for seed in 0..n {
            if comp[seed] != usize::MAX || !self.colour[seed].is_determined() {
                continue;
            }
            comp[seed] = next_id;
            queue.push_back(seed);
            while let Some(f) = queue.pop_front() {
                for h in self.tin.face_half_edges(f) {
                    if let Some(g) = self.tin.face_across(h) {
                        if comp[g] == usize::MAX && self.colour[g] == self.colour[seed] {
                            comp[g] = next_id;
                            queue.push_back(g);
                        }
                    }
                }
            }
            next_id += 1;
        }
        comp
    }
}

/// Extracts one polygon per connected same-id region: rings touching the
/// hull are walked first, then every remaining id boundary. Outer rings come
/// out anticlockwise and holes clockwise; a ring with fewer than four points
/// after closing is an error.
pub fn extract_polygons(tin: &Tin, index: &TriangleIndex) -> Result<Vec<CatchmentPolygon>> {
    let colour = index
        .records()
        .iter()
        .map(|r| {
            if r.is_traceable() {
                r.catchment
            } else {
                CatchmentId::UNDETERMINED
            }
        })
        .collect();
    let mut ex = Extractor {
        tin,
        index,
        colour,
        consumed: vec![false; tin.half_edges.len()],
    };
    let comp = ex.components();

    let mut rings: Vec<(usize, CatchmentId, Vec<Point3>)> = Vec::new();
    let seeds = tin
        .hull_half_edges()
        .into_iter()
        .chain(0..tin.half_edges.len());
    for h in seeds {
        if ex.consumed[h] || !ex.is_boundary(h) {
            continue;
        }
        let ring = ex.walk(h)?;
        let Some(f) = tin.face_of(h) else {
            continue;
        };
        rings.push((comp[f], ex.colour[f], ring));
    }

    let mut by_comp: Vec<(usize, CatchmentId, Vec<Vec<Point3>>, Vec<Vec<Point3>>)> = Vec::new();
    for (c, id, ring) in rings {
        let pos = match by_comp.iter().position(|entry| entry.0 == c) {
            Some(pos) => pos,
            None => {
                by_comp.push((c, id, Vec::new(), Vec::new()));
                by_comp.len() - 1
            }
        };
        if polygon::signed_area(&ring) > 0.0 {
            by_comp[pos].2.push(ring);
        } else {
            by_comp[pos].3.push(ring);
        }
    }

    let mut out = Vec::new();
    for (_, id, mut outers, mut holes) in by_comp {
        if outers.is_empty() {
            // every ring came out clockwise: flip the largest into the outer
            let Some(largest) = (0..holes.len()).max_by(|&a, &b| {
                polygon::signed_area(&holes[a])
                    .abs()
                    .total_cmp(&polygon::signed_area(&holes[b]).abs())
            }) else {
                continue;
            };
            warn!("catchment {} has no anticlockwise ring, reversing one", id.0);
            let mut ring = holes.swap_remove(largest);
            polygon::reverse_ring(&mut ring);
            outers.push(ring);
        }
        let sump = ex.index.sump_type(tin, id);
        let mut polys: Vec<CatchmentPolygon> = outers
            .into_iter()
            .map(|points| CatchmentPolygon {
                id,
                sump,
                points,
                holes: Vec::new(),
            })
            .collect();
        for hole in holes {
            let inside = hole[0].midpoint(&hole[1]);
            let target = polys
                .iter()
                .position(|p| polygon::point_in_ring(&inside.planar(), &p.points))
                .unwrap_or(0);
            polys[target].holes.push(hole);
        }
        out.extend(polys);
    }
    out.sort_by_key(|p| p.id);
    debug!("extracted {} catchment polygons", out.len());
    Ok(out)
}

#[cfg(test)]
mod tests {
    use super::*;

    fn coloured(tin: &Tin, f: impl Fn(&Point3) -> usize) -> TriangleIndex {
        let mut index = TriangleIndex::build(tin, 1e-9, None).unwrap();
        for face in 0..tin.face_count() {
            let c = tin.face_centroid(face);
            index.record_mut(face).catchment = CatchmentId(f(&c));
        }
        index
    }

    #[test]
    fn single_colour_gives_hull() {
        let tin = Tin::from_grid(3, 2, 1.0, |x, y| x + y).unwrap();
        let index = coloured(&tin, |_| 0);
        let polys = extract_polygons(&tin, &index).unwrap();
        assert_eq!(polys.len(), 1);
        assert!((polys[0].area() - 6.0).abs() < 1e-12);
        assert!(polygon::is_closed(&polys[0].points));
        assert!(polys[0].holes.is_empty());
    }

    #[test]
    fn enclosed_colour_becomes_a_hole() {
        let tin = Tin::from_grid(3, 3, 1.0, |x, y| x + y).unwrap();
        let index = coloured(&tin, |c| {
            if (1.0..2.0).contains(&c.x()) && (1.0..2.0).contains(&c.y()) { 1 } else { 0 }
        });
        let polys = extract_polygons(&tin, &index).unwrap();
        assert_eq!(polys.len(), 2);
        let outer = &polys[0];
        assert_eq!(outer.holes.len(), 1);
        assert!(polygon::signed_area(&outer.holes[0]) < 0.0);
        assert!((outer.area() - 8.0).abs() < 1e-12);
        assert!((polys[1].area() - 1.0).abs() < 1e-12);
    }

    #[test]
    fn single_triangle_region_is_valid() {
        let tin = Tin::from_grid(2, 1, 1.0, |x, y| x + y).unwrap();
        let index = coloured(&tin, |c| if c.x() > 1.5 { 1 } else { 0 });
        let polys = extract_polygons(&tin, &index).unwrap();
        assert_eq!(polys.len(), 2);
        assert_eq!(polys[1].points.len(), 4);
        assert!((polys[1].area() - 0.5).abs() < 1e-12);
    }
}
