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

//! Fixed-point loop that sharpens catchment boundaries onto ridge lines.
//!
//! The first pass classifies the boundary of every catchment and inserts
//! ascent lines from its flow lines, low points and cross-flow lines, in
//! that order. Later passes only revisit catchments that are still split
//! into several polygons or hold zero-vote triangles. The loop ends when
//! none are left, when a pass fails to reduce their number, or when the
//! pass or vertex budgets run out.
//!
//! Only this strategy is implemented. The alternative refinement strategy
//! that trial-refines interim mesh clones is not.

use std::collections::BTreeMap;

use ahash::AHashSet;
use log::{debug, warn};

use crate::{
    config::{CancelToken, DrainageConfig},
    drainage::{
        ascent::{AscentInserter, AscentStart},
        colour::{ColourStats, colour_triangles},
        extract::{CatchmentPolygon, extract_polygons},
        fence::ActiveFence,
        index::{CatchmentId, TriangleIndex},
        lines::{CatchmentLine, LineCache, LineKind, classify_boundary},
    },
    error::{DrainageError, Result},
    mesh::{FeatureKind, Tin},
};

/// Coloured index and polygons for the current state of the mesh.
#[derive(Debug, Clone)]
pub struct Pass {
    pub index: TriangleIndex,
    pub polygons: Vec<CatchmentPolygon>,
    pub colour: ColourStats,
}

/// Builds the index, colours it and extracts the catchment polygons.
pub fn colour_and_extract(
    tin: &Tin,
    cfg: &DrainageConfig,
    fence: Option<&ActiveFence>,
    cancel: &CancelToken,
) -> Result<Pass> {
    let mut index = TriangleIndex::build(tin, cfg.flat_tolerance, fence)?;
    let colour = colour_triangles(tin, &mut index, cfg, cancel)?;
    let polygons = extract_polygons(tin, &index)?;
    Ok(Pass {
        index,
        polygons,
        colour,
    })
}

#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct RefineReport {
    pub iterations: usize,
    pub lines_inserted: usize,
    pub vertices_added: usize,
    /// Catchments that were refined and ended up as one clean polygon.
    pub refined: usize,
    pub not_converged: usize,
    /// Catchments left alone because their sump topology is unsupported.
    pub skipped: usize,
}

/// Convergence state of one catchment after a pass.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq)]
pub struct CatchmentHealth {
    pub polygons: usize,
    pub zero_votes: usize,
    pub partial_votes: usize,
}

impl CatchmentHealth {
    /// One polygon and no zero-vote triangles.
    pub fn is_converged(&self) -> bool {
        self.polygons <= 1 && self.zero_votes == 0
    }

    fn defects(&self) -> usize {
        self.polygons.saturating_sub(1) + self.zero_votes
    }
}

pub struct BoundaryRefiner<'a> {
    cfg: &'a DrainageConfig,
    fence: Option<&'a ActiveFence>,
    cancel: &'a CancelToken,
}

impl<'a> BoundaryRefiner<'a> {
    pub fn new(
        cfg: &'a DrainageConfig,
        fence: Option<&'a ActiveFence>,
        cancel: &'a CancelToken,
    ) -> Self {
        Self { cfg, fence, cancel }
    }

    pub fn run(&self, tin: &mut Tin) -> Result<(Pass, RefineReport)> {
        let mut report = RefineReport::default();
        let mut touched: AHashSet<usize> = AHashSet::new();
        let mut unsupported: AHashSet<usize> = AHashSet::new();
        let mut last_defects: Option<usize> = None;
        // fixed by the mesh as handed in, so growth cannot extend the climb
        let max_steps = 4 * (tin.vertex_count() + tin.face_count()) + 16;

        loop {
            self.cancel.check()?;
            let pass = colour_and_extract(tin, self.cfg, self.fence, self.cancel)?;
            let health = self.health(tin, &pass, &mut unsupported);
            report.skipped = unsupported.len();
            let open: Vec<CatchmentId> = health
                .iter()
                .filter(|(_, h)| !h.is_converged())
                .map(|(&id, _)| id)
                .collect();
            let open_anchors = anchors(&pass, &open);
            let defects: usize = health.values().map(CatchmentHealth::defects).sum();
            let first = report.iterations == 0;

            if open.is_empty() && !first {
                return Ok((pass, converged(report, &touched)));
            }
            if let Some(last) = last_defects.filter(|&last| defects >= last) {
                warn!(
                    "{} catchments not converged: refinement left {defects} defects (was {last})",
                    open.len()
                );
                return Ok((pass, give_up(report, &touched, &open_anchors)));
            }
            if report.iterations >= self.cfg.max_refine_iterations {
                warn!(
                    "{} catchments not converged after {} refinement passes",
                    open.len(),
                    report.iterations
                );
                return Ok((pass, give_up(report, &touched, &open_anchors)));
            }
            if report.vertices_added >= self.cfg.max_refine_vertices {
                warn!(
                    "{} catchments not converged: {} vertices added, the refinement budget",
                    open.len(),
                    report.vertices_added
                );
                return Ok((pass, give_up(report, &touched, &open_anchors)));
            }

            // every catchment is classified once; after that only the
            // unconverged ones
            let candidates: Vec<CatchmentId> = if first {
                health.keys().copied().collect()
            } else {
                open.clone()
            };
            let lines = self.plan(tin, &pass, &candidates);
            if lines.is_empty() {
                if open.is_empty() {
                    return Ok((pass, converged(report, &touched)));
                }
                warn!(
                    "{} catchments not converged: no ascent line left to insert",
                    open.len()
                );
                return Ok((pass, give_up(report, &touched, &open_anchors)));
            }

            let targets: Vec<CatchmentId> = lines
                .iter()
                .map(|l| l.catchment)
                .chain(open.iter().copied())
                .collect();
            touched.extend(anchors(&pass, &targets));
            report.iterations += 1;
            last_defects = Some(defects);
            if !self.insert_lines(tin, &lines, max_steps, &mut report)? {
                if open.is_empty() {
                    return Ok((pass, converged(report, &touched)));
                }
                warn!(
                    "{} catchments not converged: no ascent line could be inserted",
                    open.len()
                );
                return Ok((pass, give_up(report, &touched, &open_anchors)));
            }
        }
    }

    /// Health of every determined catchment with a supported sump.
    pub fn health(
        &self,
        tin: &Tin,
        pass: &Pass,
        unsupported: &mut AHashSet<usize>,
    ) -> BTreeMap<CatchmentId, CatchmentHealth> {
        let mut health: BTreeMap<CatchmentId, CatchmentHealth> = BTreeMap::new();
        for p in &pass.polygons {
            health.entry(p.id).or_default().polygons += 1;
        }
        health.retain(|&id, _| {
            let sump = pass.index.sump_type(tin, id);
            if sump.is_supported() {
                return true;
            }
            if unsupported.insert(id.0) {
                warn!("catchment {} drains to {sump:?}, left unrefined", id.0);
            }
            false
        });
        for (&id, h) in health.iter_mut() {
            h.zero_votes = pass.index.zero_votes(id);
            h.partial_votes = pass.index.partial_votes(id);
        }
        health
    }

    /// Refinable lines of the candidates' boundaries that no earlier ascent
    /// line covers, in priority order, at most `max_ascent_lines_per_pass`.
    pub fn plan(&self, tin: &Tin, pass: &Pass, candidates: &[CatchmentId]) -> Vec<CatchmentLine> {
        let mut cache = LineCache::new();
        for &id in candidates {
            classify_boundary(tin, &pass.index, id, self.cfg.flat_tolerance, &mut cache);
        }
        cache.sort_dedup();
        let lines: Vec<CatchmentLine> = cache
            .refinable()
            .filter(|line| !subsumed(tin, line))
            .take(self.cfg.max_ascent_lines_per_pass)
            .copied()
            .collect();
        debug!(
            "{} of {} classified lines to refine ({} flow, {} low point, {} cross-flow)",
            lines.len(),
            cache.len(),
            cache.count(LineKind::Flow),
            cache.count(LineKind::LowPoint),
            cache.count(LineKind::CrossFlow)
        );
        lines
    }

    /// Inserts an ascent line for each of `lines` while the vertex budgets
    /// last. Returns whether the mesh changed.
    fn insert_lines(
        &self,
        tin: &mut Tin,
        lines: &[CatchmentLine],
        max_steps: usize,
        report: &mut RefineReport,
    ) -> Result<bool> {
        let mut changed = false;
        let mut added = 0;
        for line in lines {
            let budget = self
                .cfg
                .max_vertices_per_pass
                .saturating_sub(added)
                .min(self.cfg.max_refine_vertices.saturating_sub(report.vertices_added));
            if budget == 0 {
                debug!("vertex budget spent, remaining ascent lines wait for the next pass");
                break;
            }
            let start = start_for(tin, line);
            let inserter = AscentInserter::new(self.cfg.flat_tolerance, self.fence)
                .with_limits(max_steps, budget);
            let before = tin.vertex_count();
            let result = inserter.insert(tin, start);
            let grown = tin.vertex_count() - before;
            added += grown;
            report.vertices_added += grown;
            changed |= grown > 0;
            match result {
                Ok(ascent) => {
                    if ascent.vertices.len() >= 2 {
                        report.lines_inserted += 1;
                        changed = true;
                    }
                }
                // an earlier line may have split the start edge, or the
                // climb went downhill: drop this line, keep the others
                Err(e @ (DrainageError::AscentDescended { .. } | DrainageError::MissingEdge(..))) => {
                    warn!("ascent line from {start:?} abandoned: {e}");
                }
                Err(e) => return Err(e),
            }
        }
        Ok(changed)
    }
}

fn anchors(pass: &Pass, ids: &[CatchmentId]) -> AHashSet<usize> {
    ids.iter()
        .filter_map(|&id| pass.index.decode(id))
        .map(|t| t.anchor())
        .collect()
}

fn converged(mut report: RefineReport, touched: &AHashSet<usize>) -> RefineReport {
    report.refined = touched.len();
    debug!("refinement converged after {} passes", report.iterations);
    report
}

fn give_up(mut report: RefineReport, touched: &AHashSet<usize>, open: &AHashSet<usize>) -> RefineReport {
    report.not_converged = open.len();
    report.refined = touched.difference(open).count();
    report
}

/// Whether earlier ascent lines already run through the line's vertices.
/// A cross-flow edge with one end on an ascent line counts, otherwise each
/// run would start another climb a little further along the same edge.
fn subsumed(tin: &Tin, line: &CatchmentLine) -> bool {
    let on_line = |v: usize| {
        tin.features_of_kind(FeatureKind::AscentLine)
            .any(|f| f.vertices.contains(&v))
    };
    match line.kind {
        LineKind::LowPoint => on_line(line.a),
        LineKind::CrossFlow => on_line(line.a) || on_line(line.b),
        _ => on_line(line.a) && on_line(line.b),
    }
}

fn start_for(tin: &Tin, line: &CatchmentLine) -> AscentStart {
    match line.kind {
        LineKind::LowPoint => AscentStart::Vertex(line.a),
        LineKind::CrossFlow if line.toward_left => AscentStart::TriangleBase {
            a: line.a,
            b: line.b,
        },
        LineKind::CrossFlow => AscentStart::TriangleBase {
            a: line.b,
            b: line.a,
        },
        _ => {
            if tin.position(line.a).z() <= tin.position(line.b).z() {
                AscentStart::Vertex(line.a)
            } else {
                AscentStart::Vertex(line.b)
            }
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn line(kind: LineKind, a: usize, b: usize) -> CatchmentLine {
        CatchmentLine {
            kind,
            catchment: CatchmentId(0),
            a,
            b,
            left_apex: None,
            right_apex: None,
            toward_left: true,
        }
    }

    #[test]
    fn cross_flow_touching_an_ascent_line_is_covered() {
        let mut tin = Tin::from_grid(2, 2, 1.0, |x, _| x).unwrap();
        tin.add_feature(FeatureKind::AscentLine, vec![3, 4]).unwrap();
        assert!(subsumed(&tin, &line(LineKind::CrossFlow, 4, 7)));
        assert!(!subsumed(&tin, &line(LineKind::Flow, 4, 7)));
        assert!(subsumed(&tin, &line(LineKind::Flow, 3, 4)));
        assert!(subsumed(&tin, &line(LineKind::LowPoint, 3, 0)));
        assert!(!subsumed(&tin, &line(LineKind::CrossFlow, 0, 1)));
    }

    #[test]
    fn health_counts_defects() {
        let split = CatchmentHealth {
            polygons: 2,
            zero_votes: 1,
            partial_votes: 4,
        };
        assert!(!split.is_converged());
        assert_eq!(split.defects(), 2);
        let partial = CatchmentHealth {
            polygons: 1,
            zero_votes: 0,
            partial_votes: 3,
        };
        assert!(partial.is_converged());
        assert_eq!(partial.defects(), 0);
    }
}
