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

//! Classification of catchment boundary edges for the refiner.

use std::cmp::Ordering;

use crate::{
    drainage::{
        flow::{self, BaseFlow, SideFlow},
        index::{CatchmentId, TriangleIndex},
    },
    mesh::Tin,
};

/// Kinds in refinement priority order.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, PartialOrd, Ord)]
pub enum LineKind {
    /// Flow runs along the boundary edge.
    Flow,
    /// Boundary vertex lower than both its boundary neighbours.
    LowPoint,
    /// Water crosses the boundary from one side to the other.
    CrossFlow,
    /// Both sides drain toward the edge.
    Sump,
    /// Both sides drain away from the edge: already a true divide.
    Ridge,
}

impl LineKind {
    /// Whether an ascent line is inserted for this kind.
    pub fn is_refinable(self) -> bool {
        matches!(self, LineKind::Flow | LineKind::LowPoint | LineKind::CrossFlow)
    }
}

/// A boundary edge `a -> b` of `catchment`, which lies to its left.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct CatchmentLine {
    pub kind: LineKind,
    pub catchment: CatchmentId,
    pub a: usize,
    pub b: usize,
    pub left_apex: Option<usize>,
    pub right_apex: Option<usize>,
    /// For cross-flow lines: the edge sides ordered so that the triangle
    /// draining across the edge is on the left of `a -> b`.
    pub toward_left: bool,
}

impl CatchmentLine {
    fn key(&self) -> (LineKind, usize, usize) {
        (self.kind, self.a.min(self.b), self.a.max(self.b))
    }
}

/// Sorted, de-duplicated boundary lines.
#[derive(Debug, Clone, Default)]
pub struct LineCache {
    lines: Vec<CatchmentLine>,
}

impl LineCache {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn push(&mut self, line: CatchmentLine) {
        self.lines.push(line);
    }

    pub fn len(&self) -> usize {
        self.lines.len()
    }

    pub fn is_empty(&self) -> bool {
        self.lines.is_empty()
    }

    /// Sorts by priority then edge, and drops repeats of the same undirected
    /// edge with the same kind.
    pub fn sort_dedup(&mut self) {
        self.lines.sort_by(|x, y| match x.key().cmp(&y.key()) {
            Ordering::Equal => x.catchment.cmp(&y.catchment),
            other => other,
        });
        self.lines.dedup_by(|x, y| x.key() == y.key());
    }

    pub fn iter(&self) -> impl Iterator<Item = &CatchmentLine> + '_ {
        self.lines.iter()
    }

    pub fn refinable(&self) -> impl Iterator<Item = &CatchmentLine> + '_ {
        self.lines.iter().filter(|l| l.kind.is_refinable())
    }

    pub fn count(&self, kind: LineKind) -> usize {
        self.lines.iter().filter(|l| l.kind == kind).count()
    }
}

/// Classifies every interior boundary edge of `target` (hull and void
/// boundaries are skipped) and every low point on its boundary. Inside the
/// catchment, edges of partial-vote triangles whose edge sample reached
/// another catchment are classified too: the divide crosses those
/// triangles.
pub fn classify_boundary(
    tin: &Tin,
    index: &TriangleIndex,
    target: CatchmentId,
    flat_tol: f64,
    cache: &mut LineCache,
) {
    let blocked = |f: usize| index.blocked()[f];

    let mut boundary: Vec<(usize, usize)> = Vec::new();
    for h in 0..tin.half_edges.len() {
        let Some(f) = tin.face_of(h) else {
            continue;
        };
        let record = index.record(f);
        if record.catchment != target || !record.is_traceable() {
            continue;
        }
        let (a, b) = (tin.origin(h), tin.target(h));
        let across = tin.face_across(h);
        if across.is_some_and(|g| index.catchment(g) == target) {
            let strayed = record.votes < 3
                && record
                    .sample_near(a, b)
                    .is_some_and(|s| s.is_determined() && s != target);
            if strayed {
                cache.push(classify_edge(tin, target, a, b, flat_tol, blocked));
            }
            continue;
        }
        boundary.push((a, b));
        if across.is_none_or(blocked) {
            continue;
        }
        cache.push(classify_edge(tin, target, a, b, flat_tol, blocked));
    }

    // a boundary vertex below both of its boundary neighbours
    for &(a, b) in &boundary {
        let Some(&(p, _)) = boundary.iter().find(|&&(_, q)| q == a) else {
            continue;
        };
        let z = tin.position(a).z();
        if z < tin.position(p).z() - flat_tol
            && z < tin.position(b).z() - flat_tol
            && !tin.is_hull_vertex(a)
        {
            cache.push(CatchmentLine {
                kind: LineKind::LowPoint,
                catchment: target,
                a,
                b,
                left_apex: tin.apex_left(a, b),
                right_apex: tin.apex_right(a, b),
                toward_left: false,
            });
        }
    }
}

/// Classifies the interior edge `a -> b` from the flow on its two sides.
fn classify_edge<B>(
    tin: &Tin,
    catchment: CatchmentId,
    a: usize,
    b: usize,
    flat_tol: f64,
    blocked: B,
) -> CatchmentLine
where
    B: Fn(usize) -> bool + Copy,
{
    let (left, _) = flow::side_flow(tin, a, b, flat_tol, blocked);
    let (right, _) = flow::side_flow(tin, b, a, flat_tol, blocked);
    let kind = match (left, right) {
        (SideFlow::Flat, _) | (_, SideFlow::Flat) => LineKind::Ridge,
        (SideFlow::Away, SideFlow::Away) => LineKind::Ridge,
        (SideFlow::Toward, SideFlow::Toward) => LineKind::Sump,
        (SideFlow::Parallel, _) | (_, SideFlow::Parallel) => LineKind::Flow,
        _ => LineKind::CrossFlow,
    };
    // the apex descent decides which triangle feeds the edge; the side
    // flow only breaks the tie when neither apex drains onto it
    let feeds = |base: Option<BaseFlow>| {
        matches!(base, Some(BaseFlow::AcrossBase | BaseFlow::ThroughVertex(_)))
    };
    let toward_left = if feeds(flow::classify_base(tin, a, b, flat_tol)) {
        true
    } else if feeds(flow::classify_base(tin, b, a, flat_tol)) {
        false
    } else {
        left == SideFlow::Toward
    };
    CatchmentLine {
        kind,
        catchment,
        a,
        b,
        left_apex: tin.apex_left(a, b),
        right_apex: tin.apex_right(a, b),
        toward_left,
    }
}
