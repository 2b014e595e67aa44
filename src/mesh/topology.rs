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

use smallvec::SmallVec;

use crate::{
    geometry::{Point2, Point3, polygon},
    kernel::{self, Orientation},
    mesh::basic_types::Tin,
};

impl Tin {
    #[inline]
    pub fn target(&self, h: usize) -> usize {
        self.half_edges[h].vertex
    }

    #[inline]
    pub fn origin(&self, h: usize) -> usize {
        self.half_edges[self.half_edges[h].twin].vertex
    }

    #[inline]
    pub fn twin(&self, h: usize) -> usize {
        self.half_edges[h].twin
    }

    #[inline]
    pub fn next(&self, h: usize) -> usize {
        self.half_edges[h].next
    }

    #[inline]
    pub fn prev(&self, h: usize) -> usize {
        self.half_edges[h].prev
    }

    #[inline]
    pub fn face_of(&self, h: usize) -> Option<usize> {
        self.half_edges[h].face
    }

    /// Next outgoing half-edge anticlockwise around `origin(h)`.
    #[inline]
    pub fn rot_ccw_around_vertex(&self, h: usize) -> usize {
        self.twin(self.prev(h))
    }

    /// Next outgoing half-edge clockwise around `origin(h)`.
    #[inline]
    pub fn rot_cw_around_vertex(&self, h: usize) -> usize {
        self.next(self.twin(h))
    }

    pub fn half_edge_between(&self, a: usize, b: usize) -> Option<usize> {
        self.edge_map.get(&(a, b)).copied()
    }

    pub fn has_edge(&self, a: usize, b: usize) -> bool {
        self.edge_map.contains_key(&(a, b))
    }

    /// Face to the left of the directed edge a→b.
    pub fn left_face(&self, a: usize, b: usize) -> Option<usize> {
        self.half_edge_between(a, b).and_then(|h| self.face_of(h))
    }

    pub fn right_face(&self, a: usize, b: usize) -> Option<usize> {
        self.left_face(b, a)
    }

    /// Third vertex of the face left of a→b.
    pub fn apex_left(&self, a: usize, b: usize) -> Option<usize> {
        let h = self.half_edge_between(a, b)?;
        self.face_of(h)?;
        Some(self.target(self.next(h)))
    }

    pub fn apex_right(&self, a: usize, b: usize) -> Option<usize> {
        self.apex_left(b, a)
    }

    pub fn is_hull_edge(&self, a: usize, b: usize) -> bool {
        self.half_edge_between(a, b)
            .is_some_and(|h| self.face_of(h).is_none() || self.face_of(self.twin(h)).is_none())
    }

    pub fn is_hull_vertex(&self, v: usize) -> bool {
        self.outgoing_ccw(v)
            .iter()
            .any(|&h| self.half_edges[h].is_border())
    }

    /// Hull successor of `v` going anticlockwise (interior on the left).
    pub fn hull_next(&self, v: usize) -> Option<usize> {
        self.outgoing_ccw(v).iter().find_map(|&h| {
            let inside = self.face_of(h).is_some();
            let outside = self.face_of(self.twin(h)).is_none();
            (inside && outside).then(|| self.target(h))
        })
    }

    /// Interior-side hull half-edges in anticlockwise order.
    pub fn hull_half_edges(&self) -> Vec<usize> {
        let Some(start) = self.half_edges.iter().position(|he| he.is_border()) else {
            return Vec::new();
        };
        // border loop runs clockwise; walk it backwards to go anticlockwise
        let mut out = Vec::new();
        let mut cur = start;
        loop {
            out.push(self.twin(cur));
            cur = self.prev(cur);
            if cur == start || out.len() > self.half_edges.len() {
                break;
            }
        }
        out
    }

    pub fn hull_vertices(&self) -> Vec<usize> {
        self.hull_half_edges()
            .into_iter()
            .map(|h| self.origin(h))
            .collect()
    }

    /// Outgoing half-edges of `v` in anticlockwise order, starting from its
    /// seed (the border spoke for hull vertices).
    pub fn outgoing_ccw(&self, v: usize) -> SmallVec<[usize; 8]> {
        let mut out = SmallVec::new();
        let Some(start) = self.vertices[v].half_edge else {
            return out;
        };
        let mut h = start;
        loop {
            out.push(h);
            h = self.rot_ccw_around_vertex(h);
            if h == start || out.len() > self.half_edges.len() {
                break;
            }
        }
        out
    }

    pub fn outgoing_cw(&self, v: usize) -> SmallVec<[usize; 8]> {
        let mut out = SmallVec::new();
        let Some(start) = self.vertices[v].half_edge else {
            return out;
        };
        let mut h = start;
        loop {
            out.push(h);
            h = self.rot_cw_around_vertex(h);
            if h == start || out.len() > self.half_edges.len() {
                break;
            }
        }
        out
    }

    pub fn neighbors_ccw(&self, v: usize) -> SmallVec<[usize; 8]> {
        self.outgoing_ccw(v)
            .into_iter()
            .map(|h| self.target(h))
            .collect()
    }

    /// Neighbour of `v` that follows `n` anticlockwise.
    pub fn next_ccw(&self, v: usize, n: usize) -> Option<usize> {
        let h = self.half_edge_between(v, n)?;
        Some(self.target(self.rot_ccw_around_vertex(h)))
    }

    pub fn next_cw(&self, v: usize, n: usize) -> Option<usize> {
        let h = self.half_edge_between(v, n)?;
        Some(self.target(self.rot_cw_around_vertex(h)))
    }

    pub fn faces_around_vertex(&self, v: usize) -> SmallVec<[usize; 8]> {
        self.outgoing_ccw(v)
            .into_iter()
            .filter_map(|h| self.face_of(h))
            .collect()
    }

    pub fn face_half_edges(&self, f: usize) -> [usize; 3] {
        let h0 = self.faces[f].half_edge;
        let h1 = self.next(h0);
        [h0, h1, self.next(h1)]
    }

    /// Vertices of `f` in anticlockwise order; `v[i]` is the origin of the
    /// i-th half-edge from `face_half_edges`.
    pub fn face_vertices(&self, f: usize) -> [usize; 3] {
        self.face_half_edges(f).map(|h| self.origin(h))
    }

    pub fn face_points(&self, f: usize) -> [Point3; 3] {
        self.face_vertices(f).map(|v| self.vertices[v].position)
    }

    pub fn face_centroid(&self, f: usize) -> Point3 {
        let [a, b, c] = self.face_points(f);
        Point3::xyz(
            (a.x() + b.x() + c.x()) / 3.0,
            (a.y() + b.y() + c.y()) / 3.0,
            (a.z() + b.z() + c.z()) / 3.0,
        )
    }

    /// Plan area of `f`.
    pub fn face_area(&self, f: usize) -> f64 {
        polygon::signed_area(&self.face_points(f)).abs()
    }

    /// Face sharing the edge of `h` with `face_of(h)`.
    pub fn face_across(&self, h: usize) -> Option<usize> {
        self.face_of(self.twin(h))
    }

    /// Whether `p` lies inside `f` or on its boundary.
    pub fn face_contains(&self, f: usize, p: &Point2) -> bool {
        let [a, b, c] = self.face_points(f);
        [(a, b), (b, c), (c, a)]
            .iter()
            .all(|(u, v)| kernel::orientation(u, v, p) != Orientation::Clockwise)
    }

    /// First face containing `(x, y)`, void faces included.
    pub fn locate(&self, x: f64, y: f64) -> Option<usize> {
        let p = Point2::xy(x, y);
        (0..self.faces.len()).find(|&f| self.face_contains(f, &p))
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn square() -> Tin {
        Tin::from_grid(1, 1, 1.0, |_, _| 0.0).unwrap()
    }

    #[test]
    fn rotation_visits_every_neighbour() {
        let tin = square();
        let mut n = tin.neighbors_ccw(0).to_vec();
        n.sort_unstable();
        assert_eq!(n, vec![1, 2, 3]);
        assert_eq!(tin.outgoing_cw(0).len(), 3);
    }

    #[test]
    fn hull_walk_is_anticlockwise() {
        let tin = square();
        let hull = tin.hull_vertices();
        assert_eq!(hull.len(), 4);
        let ring: Vec<Point3> = hull.iter().map(|&v| *tin.position(v)).collect();
        assert!(polygon::signed_area(&ring) > 0.0);
        assert_eq!(tin.hull_next(0), Some(1));
    }

    #[test]
    fn apexes_of_diagonal() {
        let tin = square();
        assert_eq!(tin.apex_left(0, 3), Some(2));
        assert_eq!(tin.apex_right(0, 3), Some(1));
        assert!(!tin.is_hull_edge(0, 3));
        assert!(tin.is_hull_edge(0, 1));
        assert_eq!(tin.apex_right(0, 1), None);
    }

    #[test]
    fn locate_finds_containing_face() {
        let tin = square();
        let f = tin.locate(0.8, 0.2).unwrap();
        assert!(tin.face_vertices(f).contains(&1));
        assert_eq!(tin.locate(2.0, 2.0), None);
    }
}
