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

use std::collections::VecDeque;

use ahash::{AHashMap, AHashSet};
use log::debug;

use crate::{
    config::{CancelToken, DrainageConfig},
    drainage::{
        index::{CatchmentId, TriangleIndex},
        tracer::{LowPointTracer, Terminus},
    },
    error::Result,
    mesh::Tin,
};

/// Maps trace termini to catchment ids, merging every terminus inside one
/// level region (vertices within `flat_tol` of each other joined by level
/// edges) into a single id.
#[derive(Debug, Clone)]
pub struct SumpResolver {
    flat_tol: f64,
    by_vertex: AHashMap<usize, CatchmentId>,
}

impl SumpResolver {
    pub fn new(flat_tol: f64) -> Self {
        Self {
            flat_tol,
            by_vertex: AHashMap::new(),
        }
    }

    pub fn resolve(&mut self, tin: &Tin, index: &TriangleIndex, terminus: Terminus) -> CatchmentId {
        if let Terminus::Point(v) = terminus {
            if tin.is_drain(v) {
                return index.encode(terminus);
            }
        }
        let anchor = terminus.anchor();
        if let Some(&id) = self.by_vertex.get(&anchor) {
            return id;
        }

        let z0 = tin.position(anchor).z();
        let mut region = vec![anchor];
        let mut seen = AHashSet::from_iter([anchor]);
        let mut queue = VecDeque::from([anchor]);
        while let Some(v) = queue.pop_front() {
            for n in tin.neighbors_ccw(v) {
                if !tin.is_drain(n)
                    && (tin.position(n).z() - z0).abs() <= self.flat_tol
                    && seen.insert(n)
                {
                    region.push(n);
                    queue.push_back(n);
                }
            }
        }

        let seen = &seen;
        let id = if region.len() == 1 {
            index.encode(Terminus::Point(anchor))
        } else {
            region
                .iter()
                .flat_map(|&v| {
                    tin.neighbors_ccw(v)
                        .into_iter()
                        .filter(move |n| v < *n && seen.contains(n))
                        .filter_map(move |n| index.edge_offset(v, n).map(|off| (off, v, n)))
                })
                .min()
                .map_or(CatchmentId::UNDETERMINED, |(_, a, b)| {
                    index.encode(Terminus::edge(a, b))
                })
        };
        for v in region {
            self.by_vertex.insert(v, id);
        }
        id
    }
}

/// Result of colouring one triangle.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct FaceColour {
    pub catchment: CatchmentId,
    pub samples: [CatchmentId; 3],
    pub votes: u8,
}

/// Traces the centroid and three edge-offset samples of `face`. The centroid
/// decides; when it is undetermined a majority of the edge samples does.
pub fn colour_face(
    tin: &Tin,
    tracer: &LowPointTracer<'_>,
    resolver: &mut SumpResolver,
    index: &TriangleIndex,
    face: usize,
    sample_offset: f64,
) -> Result<FaceColour> {
    let centroid = tin.face_centroid(face);
    let mut id_at = |x: f64, y: f64| -> Result<CatchmentId> {
        Ok(tracer
            .trace_point(face, x, y)?
            .terminus()
            .map_or(CatchmentId::UNDETERMINED, |t| resolver.resolve(tin, index, t)))
    };

    let centre = id_at(centroid.x(), centroid.y())?;
    let [a, b, c] = tin.face_points(face);
    let mut samples = [CatchmentId::UNDETERMINED; 3];
    for (slot, (p, q)) in samples.iter_mut().zip([(a, b), (b, c), (c, a)]) {
        let s = p.midpoint(&q).lerp(&centroid, sample_offset);
        *slot = id_at(s.x(), s.y())?;
    }

    let catchment = if centre.is_determined() {
        centre
    } else {
        samples
            .iter()
            .copied()
            .filter(|id| id.is_determined())
            .find(|id| samples.iter().filter(|s| *s == id).count() >= 2)
            .unwrap_or(CatchmentId::UNDETERMINED)
    };
    let votes = if catchment.is_determined() {
        samples.iter().filter(|&&s| s == catchment).count() as u8
    } else {
        0
    };
    Ok(FaceColour {
        catchment,
        samples,
        votes,
    })
}

#[derive(Debug, Clone, Copy, Default, PartialEq, Eq)]
pub struct ColourStats {
    pub coloured: usize,
    pub undetermined: usize,
    pub zero_vote: usize,
    /// Void, fenced-out or flat triangles.
    pub skipped: usize,
}

/// Colours every traceable triangle of `index`, checking `cancel` once per
/// triangle.
pub fn colour_triangles(
    tin: &Tin,
    index: &mut TriangleIndex,
    cfg: &DrainageConfig,
    cancel: &CancelToken,
) -> Result<ColourStats> {
    let mut stats = ColourStats::default();
    let mut resolver = SumpResolver::new(cfg.flat_tolerance);
    let mut colours = Vec::with_capacity(index.len());
    {
        let tracer = LowPointTracer::new(tin, index.blocked(), cfg);
        for record in index.records() {
            if !record.is_traceable() {
                stats.skipped += 1;
                continue;
            }
            cancel.check()?;
            let colour = colour_face(tin, &tracer, &mut resolver, index, record.face, cfg.sample_offset)?;
            colours.push((record.face, colour));
        }
    }

    for (face, colour) in colours {
        let record = index.record_mut(face);
        record.catchment = colour.catchment;
        record.samples = colour.samples;
        record.votes = colour.votes;
        if !colour.catchment.is_determined() {
            stats.undetermined += 1;
        } else {
            stats.coloured += 1;
            if colour.votes == 0 {
                stats.zero_vote += 1;
            }
        }
    }
    debug!(
        "coloured {} triangles ({} undetermined, {} zero-vote, {} skipped)",
        stats.coloured, stats.undetermined, stats.zero_vote, stats.skipped
    );
    Ok(stats)
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn level_low_edge_is_one_catchment() {
        let tin = Tin::from_grid(4, 3, 1.0, |_, y| y).unwrap();
        let cfg = DrainageConfig::default();
        let mut index = TriangleIndex::build(&tin, cfg.flat_tolerance, None).unwrap();
        let stats = colour_triangles(&tin, &mut index, &cfg, &CancelToken::new()).unwrap();
        assert_eq!(stats.coloured, tin.face_count());
        let first = index.catchment(0);
        assert!(index.records().iter().all(|r| r.catchment == first));
        assert!(index.records().iter().all(|r| r.votes == 3));
    }

    #[test]
    fn cancelled_colouring_stops() {
        let tin = Tin::from_grid(2, 2, 1.0, |x, _| x).unwrap();
        let cfg = DrainageConfig::default();
        let mut index = TriangleIndex::build(&tin, cfg.flat_tolerance, None).unwrap();
        let cancel = CancelToken::new();
        cancel.cancel();
        assert_eq!(
            colour_triangles(&tin, &mut index, &cfg, &cancel),
            Err(crate::DrainageError::Cancelled)
        );
    }
}
