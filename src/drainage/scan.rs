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

//! Scratch polygon state embedded in the mesh.
//!
//! Each [`Tin`] owns two link arrays, slot A and slot B, each holding one
//! `next` vertex per mesh vertex. A [`ScanSession`] borrows one slot for its
//! lifetime and uses it to represent a single evolving anticlockwise cycle
//! over mesh vertices. Opening a slot that is already held fails with
//! `ScanSlotBusy`; dropping the session clears every link it touched, on
//! success and error paths alike.

use std::cell::{RefCell, RefMut};

use ahash::AHashSet;
use log::trace;
use smallvec::SmallVec;

use crate::{
    error::{DrainageError, Result},
    geometry::{Point3, polygon},
    mesh::Tin,
};

pub const NO_LINK: usize = usize::MAX;

#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum ScanSlot {
    A,
    B,
}

impl ScanSlot {
    fn index(self) -> usize {
        match self {
            ScanSlot::A => 0,
            ScanSlot::B => 1,
        }
    }
}

#[derive(Debug, Default)]
pub(crate) struct ScanLinks {
    next: Vec<usize>,
    touched: Vec<usize>,
}

impl ScanLinks {
    fn set(&mut self, v: usize, to: usize) {
        if to != NO_LINK {
            self.touched.push(v);
        }
        self.next[v] = to;
    }

    fn reset(&mut self) {
        for v in self.touched.drain(..) {
            if let Some(slot) = self.next.get_mut(v) {
                *slot = NO_LINK;
            }
        }
    }
}

#[derive(Debug, Default)]
pub struct ScanPool {
    slots: [RefCell<ScanLinks>; 2],
}

impl Clone for ScanPool {
    // a cloned mesh starts with fresh scratch state
    fn clone(&self) -> Self {
        Self::default()
    }
}

impl ScanPool {
    pub fn is_idle(&self) -> bool {
        self.slots.iter().all(|slot| {
            slot.try_borrow()
                .map(|links| links.touched.is_empty())
                .unwrap_or(false)
        })
    }
}

impl Tin {
    /// True when no scan session is open and no link is left set.
    pub fn scans_idle(&self) -> bool {
        self.scans.is_idle()
    }
}

#[derive(Debug, Clone, Copy, Default, PartialEq, Eq)]
pub struct ExpandStats {
    pub absorbed: usize,
    /// Faces the rule accepted that could not be absorbed without pinching
    /// the cycle.
    pub rejected: usize,
    /// The cycle reached the hull.
    pub hull_contact: bool,
}

pub struct ScanSession<'t> {
    tin: &'t Tin,
    slot: ScanSlot,
    links: RefMut<'t, ScanLinks>,
    start: Option<usize>,
    faces: AHashSet<usize>,
    len: usize,
    area: f64,
}

impl<'t> ScanSession<'t> {
    pub fn open(tin: &'t Tin, slot: ScanSlot) -> Result<Self> {
        let mut links = tin.scans.slots[slot.index()]
            .try_borrow_mut()
            .map_err(|_| DrainageError::ScanSlotBusy(slot))?;
        links.next.resize(tin.vertex_count(), NO_LINK);
        trace!("scan slot {slot:?} opened");
        Ok(Self {
            tin,
            slot,
            links,
            start: None,
            faces: AHashSet::new(),
            len: 0,
            area: 0.0,
        })
    }

    pub fn slot(&self) -> ScanSlot {
        self.slot
    }

    pub fn is_empty(&self) -> bool {
        self.start.is_none()
    }

    /// A vertex known to be on the cycle.
    pub fn start(&self) -> Option<usize> {
        self.start
    }

    pub fn area(&self) -> f64 {
        self.area
    }

    pub fn len(&self) -> usize {
        self.len
    }

    pub fn faces(&self) -> &AHashSet<usize> {
        &self.faces
    }

    pub fn contains_face(&self, f: usize) -> bool {
        self.faces.contains(&f)
    }

    pub fn on_boundary(&self, v: usize) -> bool {
        self.links.next[v] != NO_LINK
    }

    pub fn next_vertex(&self, v: usize) -> Option<usize> {
        let n = self.links.next[v];
        (n != NO_LINK).then_some(n)
    }

    /// Vertices of the absorbed faces, boundary and interior.
    pub fn members(&self) -> AHashSet<usize> {
        self.faces
            .iter()
            .flat_map(|&f| self.tin.face_vertices(f))
            .collect()
    }

    pub fn start_with_face(&mut self, f: usize) -> Result<usize> {
        self.clear();
        let [a, b, c] = self.tin.face_vertices(f);
        self.links.set(a, b);
        self.links.set(b, c);
        self.links.set(c, a);
        self.faces.insert(f);
        self.len = 3;
        self.start = Some(a);
        self.verify(0.0)?;
        Ok(a)
    }

    /// Starts from the contiguous run of accepted faces around `v`.
    pub fn start_around_vertex<F>(&mut self, v: usize, mut accept: F) -> Result<Option<usize>>
    where
        F: FnMut(usize) -> bool,
    {
        let fan: SmallVec<[Option<usize>; 8]> = self
            .tin
            .outgoing_ccw(v)
            .into_iter()
            .map(|h| self.tin.face_of(h).filter(|&f| accept(f)))
            .collect();
        let k = fan.len();
        let Some(first) = (0..k)
            .find(|&i| fan[i].is_some() && fan[(i + k - 1) % k].is_none())
            .or_else(|| fan.iter().position(Option::is_some))
        else {
            return Ok(None);
        };
        let Some(f0) = fan[first] else {
            return Ok(None);
        };
        let start = self.start_with_face(f0)?;
        for j in 1..k {
            let Some(f) = fan[(first + j) % k] else {
                break;
            };
            self.absorb(f)?;
        }
        Ok(Some(self.start.unwrap_or(start)))
    }

    /// Starts from the accepted faces on either side of edge a-b.
    pub fn start_around_edge<F>(&mut self, a: usize, b: usize, mut accept: F) -> Result<Option<usize>>
    where
        F: FnMut(usize) -> bool,
    {
        let sides: SmallVec<[usize; 2]> = [self.tin.left_face(a, b), self.tin.right_face(a, b)]
            .into_iter()
            .flatten()
            .filter(|&f| accept(f))
            .collect();
        let Some(&f0) = sides.first() else {
            return Ok(None);
        };
        self.start_with_face(f0)?;
        if let Some(&f1) = sides.get(1) {
            self.absorb(f1)?;
        }
        Ok(self.start)
    }

    /// Absorbs a face sharing at least one edge with the cycle. Returns
    /// `Ok(false)` when the face is not adjacent or would pinch the cycle.
    pub fn absorb(&mut self, f: usize) -> Result<bool> {
        if self.start.is_none() || self.faces.contains(&f) {
            return Ok(false);
        }
        let vs = self.tin.face_vertices(f);
        let Some((a, b, c)) = (0..3)
            .map(|i| (vs[i], vs[(i + 1) % 3], vs[(i + 2) % 3]))
            .find(|&(a, b, _)| self.links.next[b] == a)
        else {
            return Ok(false);
        };
        let next_a = self.links.next[a];
        let next_c = self.links.next[c];

        let dropped = if next_c == NO_LINK {
            self.links.set(b, c);
            self.links.set(c, a);
            self.len += 1;
            None
        } else if next_a == c && next_c == b {
            return Ok(false);
        } else if next_a == c {
            self.links.set(b, c);
            self.links.set(a, NO_LINK);
            self.len -= 1;
            Some(a)
        } else if next_c == b {
            self.links.set(c, a);
            self.links.set(b, NO_LINK);
            self.len -= 1;
            Some(b)
        } else {
            return Ok(false);
        };

        if dropped.is_some() && dropped == self.start {
            self.start = Some(c);
        }
        self.faces.insert(f);
        let before = self.area;
        self.verify(before)?;
        Ok(true)
    }

    /// Grows the cycle across its boundary edges into every face `rule`
    /// accepts until nothing more can be absorbed.
    pub fn expand<R>(&mut self, mut rule: R) -> Result<ExpandStats>
    where
        R: FnMut(usize) -> bool,
    {
        let mut stats = ExpandStats::default();
        let mut refused = AHashSet::new();
        let mut pinched = AHashSet::new();
        loop {
            let mut progress = false;
            for (p, q) in self.boundary_edges() {
                let Some(g) = self.tin.left_face(q, p) else {
                    stats.hull_contact = true;
                    continue;
                };
                if self.faces.contains(&g) || refused.contains(&g) {
                    continue;
                }
                if !rule(g) {
                    refused.insert(g);
                    continue;
                }
                if self.absorb(g)? {
                    stats.absorbed += 1;
                    pinched.remove(&g);
                    progress = true;
                } else {
                    pinched.insert(g);
                }
            }
            if !progress {
                break;
            }
        }
        stats.rejected = pinched.len();
        Ok(stats)
    }

    /// Cycle vertices in order, starting at the start handle.
    pub fn vertices(&self) -> Vec<usize> {
        let mut out = Vec::with_capacity(self.len);
        let Some(start) = self.start else {
            return out;
        };
        let mut cur = start;
        loop {
            out.push(cur);
            cur = self.links.next[cur];
            if cur == start || cur == NO_LINK || out.len() > self.len {
                break;
            }
        }
        out
    }

    pub fn boundary_edges(&self) -> Vec<(usize, usize)> {
        let vs = self.vertices();
        (0..vs.len())
            .map(|i| (vs[i], vs[(i + 1) % vs.len()]))
            .collect()
    }

    /// Closed ring of cycle points (first == last).
    pub fn extract_points(&self) -> Vec<Point3> {
        let mut ring: Vec<Point3> = self
            .vertices()
            .into_iter()
            .map(|v| *self.tin.position(v))
            .collect();
        polygon::close_ring(&mut ring);
        ring
    }

    pub fn clear(&mut self) {
        self.links.reset();
        self.faces.clear();
        self.start = None;
        self.len = 0;
        self.area = 0.0;
    }

    fn verify(&mut self, before: f64) -> Result<()> {
        let start = self.start.ok_or(DrainageError::StartHandleLost)?;
        if self.links.next[start] == NO_LINK {
            return Err(DrainageError::StartHandleLost);
        }
        let mut ring = Vec::with_capacity(self.len);
        let mut cur = start;
        loop {
            ring.push(*self.tin.position(cur));
            cur = self.links.next[cur];
            if cur == NO_LINK || ring.len() > self.len {
                return Err(DrainageError::PolygonDisconnected);
            }
            if cur == start {
                break;
            }
        }
        if ring.len() != self.len {
            return Err(DrainageError::PolygonDisconnected);
        }
        let after = polygon::signed_area(&ring);
        let slack = 1e-9 * before.abs().max(1.0);
        if after <= 0.0 || after < before - slack {
            return Err(DrainageError::PolygonReversed { before, after });
        }
        self.area = after;
        Ok(())
    }
}

impl Drop for ScanSession<'_> {
    fn drop(&mut self) {
        self.links.reset();
        trace!("scan slot {:?} released", self.slot);
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn grid() -> Tin {
        Tin::from_grid(3, 3, 1.0, |x, y| x + y).unwrap()
    }

    #[test]
    fn second_session_on_same_slot_is_refused() {
        let tin = grid();
        let _a = ScanSession::open(&tin, ScanSlot::A).unwrap();
        assert!(matches!(
            ScanSession::open(&tin, ScanSlot::A),
            Err(DrainageError::ScanSlotBusy(ScanSlot::A))
        ));
        assert!(ScanSession::open(&tin, ScanSlot::B).is_ok());
    }

    #[test]
    fn drop_clears_links() {
        let tin = grid();
        {
            let mut s = ScanSession::open(&tin, ScanSlot::B).unwrap();
            s.start_around_vertex(5, |_| true).unwrap();
            assert!(s.on_boundary(0));
            assert!(!tin.scans_idle());
        }
        assert!(tin.scans_idle());
    }

    #[test]
    fn fan_around_interior_vertex_is_its_link_ring() {
        let tin = grid();
        let mut s = ScanSession::open(&tin, ScanSlot::A).unwrap();
        s.start_around_vertex(5, |_| true).unwrap();
        assert_eq!(s.len(), 6);
        assert!(!s.on_boundary(5));
        assert_eq!(s.faces().len(), 6);
        assert!((s.area() - 3.0).abs() < 1e-12);
        let ring = s.extract_points();
        assert_eq!(ring.first(), ring.last());
        assert!(polygon::signed_area(&ring) > 0.0);
    }

    #[test]
    fn expand_everything_reaches_hull() {
        let tin = grid();
        let mut s = ScanSession::open(&tin, ScanSlot::A).unwrap();
        let f = tin.locate(1.2, 1.7).unwrap();
        s.start_with_face(f).unwrap();
        let stats = s.expand(|_| true).unwrap();
        assert_eq!(s.faces().len(), tin.face_count());
        assert!(stats.hull_contact);
        assert_eq!(stats.rejected, 0);
        assert!((s.area() - 9.0).abs() < 1e-9);
    }

    #[test]
    fn clear_allows_reuse() {
        let tin = grid();
        let mut s = ScanSession::open(&tin, ScanSlot::A).unwrap();
        s.start_with_face(0).unwrap();
        s.clear();
        assert!(s.is_empty());
        s.start_around_edge(5, 6, |_| true).unwrap();
        assert_eq!(s.faces().len(), 2);
    }
}
