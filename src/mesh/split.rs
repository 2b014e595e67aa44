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

use crate::{
    error::{DrainageError, Result},
    mesh::{basic_types::Tin, face::Face, half_edge::HalfEdge},
};

impl Tin {
    fn push_half_edge(&mut self, target: usize, face: Option<usize>) -> usize {
        let mut he = HalfEdge::new(target);
        he.face = face;
        self.half_edges.push(he);
        self.half_edges.len() - 1
    }

    fn link(&mut self, cycle: [usize; 3]) {
        for i in 0..3 {
            let (h, n) = (cycle[i], cycle[(i + 1) % 3]);
            self.half_edges[h].next = n;
            self.half_edges[n].prev = h;
        }
    }

    fn pair(&mut self, a: usize, b: usize) {
        self.half_edges[a].twin = b;
        self.half_edges[b].twin = a;
    }

    /// Inserts a vertex on edge a-b at parameter `u` (0 at `a`, 1 at `b`),
    /// splitting the one or two faces beside it. Elevation is interpolated
    /// along the edge, new faces inherit the void flag of the face they came
    /// from and feature polylines through a-b gain the new vertex.
    pub fn split_edge(&mut self, a: usize, b: usize, u: f64) -> Result<usize> {
        self.require_triangulated()?;
        let h = self
            .half_edge_between(a, b)
            .ok_or(DrainageError::MissingEdge(a, b))?;
        if !(u > 0.0 && u < 1.0) {
            return Err(DrainageError::InvalidTriangulation(format!(
                "split parameter {u} is outside edge {a}-{b}"
            )));
        }
        let t = self.twin(h);
        let pos = self.vertices[a]
            .position
            .lerp(&self.vertices[b].position, u);
        let m = self.add_vertex(pos);

        // h: a→b becomes a→m, t: b→a becomes m→a; the far halves are new
        self.half_edges[h].vertex = m;
        let hn = self.push_half_edge(b, None);
        let tn = self.push_half_edge(m, None);
        self.pair(hn, tn);

        self.edge_map.remove(&(a, b));
        self.edge_map.remove(&(b, a));
        self.edge_map.insert((a, m), h);
        self.edge_map.insert((m, a), t);
        self.edge_map.insert((m, b), hn);
        self.edge_map.insert((b, m), tn);

        match self.face_of(h) {
            Some(f1) => {
                let n1 = self.next(h);
                let p1 = self.prev(h);
                let c = self.target(n1);
                let f3 = self.faces.len();
                self.faces.push(Face {
                    half_edge: hn,
                    void: self.faces[f1].void,
                });
                let d1 = self.push_half_edge(c, Some(f1));
                let d1t = self.push_half_edge(m, Some(f3));
                self.pair(d1, d1t);
                self.half_edges[hn].face = Some(f3);
                self.half_edges[n1].face = Some(f3);
                self.link([h, d1, p1]);
                self.link([hn, n1, d1t]);
                self.faces[f1].half_edge = h;
                self.edge_map.insert((m, c), d1);
                self.edge_map.insert((c, m), d1t);
            }
            None => {
                let after = self.next(h);
                self.half_edges[h].next = hn;
                self.half_edges[hn].prev = h;
                self.half_edges[hn].next = after;
                self.half_edges[after].prev = hn;
            }
        }

        match self.face_of(t) {
            Some(f2) => {
                let n2 = self.next(t);
                let p2 = self.prev(t);
                let d = self.target(n2);
                let f4 = self.faces.len();
                self.faces.push(Face {
                    half_edge: tn,
                    void: self.faces[f2].void,
                });
                let d2 = self.push_half_edge(m, Some(f2));
                let d2t = self.push_half_edge(d, Some(f4));
                self.pair(d2, d2t);
                self.half_edges[tn].face = Some(f4);
                self.half_edges[p2].face = Some(f4);
                self.link([t, n2, d2]);
                self.link([tn, d2t, p2]);
                self.faces[f2].half_edge = t;
                self.edge_map.insert((d, m), d2);
                self.edge_map.insert((m, d), d2t);
            }
            None => {
                let before = self.prev(t);
                self.half_edges[before].next = tn;
                self.half_edges[tn].prev = before;
                self.half_edges[tn].next = t;
                self.half_edges[t].prev = tn;
            }
        }

        if self.vertices[b].half_edge == Some(t) {
            self.vertices[b].half_edge = Some(tn);
        }
        self.vertices[m].half_edge = Some(if self.half_edges[hn].is_border() { hn } else { t });

        for feature in &mut self.features {
            let mut i = 1;
            while i < feature.vertices.len() {
                let (p, q) = (feature.vertices[i - 1], feature.vertices[i]);
                if (p, q) == (a, b) || (p, q) == (b, a) {
                    feature.vertices.insert(i, m);
                    i += 1;
                }
                i += 1;
            }
        }
        Ok(m)
    }
}
