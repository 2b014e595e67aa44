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

//! Whole-mesh catchment decomposition and single-point catchment queries.

use ahash::AHashMap;
use log::{debug, info};

use crate::{
    config::{CancelToken, DrainageConfig},
    drainage::{
        colour::{SumpResolver, colour_face},
        extract::CatchmentPolygon,
        fence::FenceSpec,
        index::{CatchmentId, TriangleIndex},
        refine::{BoundaryRefiner, RefineReport, colour_and_extract},
        scan::{ScanSession, ScanSlot},
        tracer::{LowPointTracer, TraceOutcome},
    },
    error::{DrainageError, Result},
    geometry::Point3,
    mesh::{FeatureKind, Tin},
};

/// One extracted catchment, handed to the caller's sink.
#[derive(Debug, Clone, PartialEq)]
pub struct CatchmentFeature {
    pub kind: FeatureKind,
    pub id: CatchmentId,
    pub polygon: CatchmentPolygon,
}

#[derive(Debug, Clone, Copy, Default, PartialEq, Eq)]
pub struct CatchmentSummary {
    /// Polygons emitted.
    pub catchments: usize,
    /// Traceable triangles whose runoff ended nowhere.
    pub undetermined: usize,
    pub refined: usize,
    pub not_converged: usize,
    pub mesh_vertices_added: usize,
}

#[derive(Debug, Clone, PartialEq)]
pub struct PointCatchment {
    pub determined: bool,
    /// The region grew to a closed boundary without meeting the hull or a
    /// face it could not absorb.
    pub closed: bool,
    /// Closed anticlockwise ring, empty when undetermined.
    pub boundary: Vec<Point3>,
    pub sump: Option<Point3>,
}

impl PointCatchment {
    fn undetermined() -> Self {
        Self {
            determined: false,
            closed: false,
            boundary: Vec::new(),
            sump: None,
        }
    }
}

/// Splits the mesh into catchments and emits one [`CatchmentFeature`] per
/// polygon through `sink`.
///
/// With refinement on, ascent lines are inserted into `tin` so catchment
/// boundaries follow ridges; the number of vertices this adds is reported
/// in the summary. Faces rejected by `fence` are handled like void faces for
/// this call only.
pub fn determine_catchments<F>(
    tin: &mut Tin,
    cfg: &DrainageConfig,
    fence: Option<&FenceSpec>,
    cancel: &CancelToken,
    mut sink: F,
) -> Result<CatchmentSummary>
where
    F: FnMut(CatchmentFeature),
{
    tin.require_triangulated()?;
    let active = fence.and_then(FenceSpec::activate);
    let before = tin.vertex_count();

    let (pass, report) = if cfg.refine {
        BoundaryRefiner::new(cfg, active.as_ref(), cancel).run(tin)?
    } else {
        let pass = colour_and_extract(tin, cfg, active.as_ref(), cancel)?;
        (pass, RefineReport::default())
    };

    let summary = CatchmentSummary {
        catchments: pass.polygons.len(),
        undetermined: pass.colour.undetermined,
        refined: report.refined,
        not_converged: report.not_converged,
        mesh_vertices_added: tin.vertex_count() - before,
    };
    for polygon in pass.polygons {
        sink(CatchmentFeature {
            kind: FeatureKind::Catchment,
            id: polygon.id,
            polygon,
        });
    }
    info!(
        "{} catchments ({} undetermined triangles, {} vertices added)",
        summary.catchments, summary.undetermined, summary.mesh_vertices_added
    );
    Ok(summary)
}

/// Finds the catchment containing `(x, y)` without editing the mesh.
///
/// The location is traced to its sump, then the region of faces draining to
/// the same sump is grown outward from the face under the point. Locations
/// outside the mesh, on void or flat faces, or whose runoff enters a void
/// come back undetermined.
pub fn catchment_at(tin: &Tin, x: f64, y: f64, cfg: &DrainageConfig) -> Result<PointCatchment> {
    tin.require_triangulated()?;
    let index = TriangleIndex::build(tin, cfg.flat_tolerance, None)?;
    let Some(face) = tin.locate(x, y) else {
        debug!("({x}, {y}) is outside the mesh");
        return Ok(PointCatchment::undetermined());
    };
    if !index.record(face).is_traceable() {
        return Ok(PointCatchment::undetermined());
    }

    let tracer = LowPointTracer::new(tin, index.blocked(), cfg);
    let terminus = match tracer.trace_point(face, x, y)? {
        TraceOutcome::Sump(t) => t,
        TraceOutcome::Void => return Ok(PointCatchment::undetermined()),
        TraceOutcome::StepLimit | TraceOutcome::Stalled | TraceOutcome::Cycle(_) => {
            return Err(DrainageError::NoDrainPoint);
        }
    };
    let mut resolver = SumpResolver::new(cfg.flat_tolerance);
    let target = resolver.resolve(tin, &index, terminus);

    let mut colours: AHashMap<usize, CatchmentId> = AHashMap::new();
    let mut failure = None;
    let mut session = ScanSession::open(tin, ScanSlot::A)?;
    session.start_with_face(face)?;
    let stats = session.expand(|g| {
        if failure.is_some() || !index.record(g).is_traceable() {
            return false;
        }
        if let Some(&id) = colours.get(&g) {
            return id == target;
        }
        match colour_face(tin, &tracer, &mut resolver, &index, g, cfg.sample_offset) {
            Ok(colour) => {
                colours.insert(g, colour.catchment);
                colour.catchment == target
            }
            Err(e) => {
                failure = Some(e);
                false
            }
        }
    })?;
    if let Some(e) = failure {
        return Err(e);
    }

    debug!(
        "catchment at ({x}, {y}): {} faces, {} pinched, hull contact {}",
        session.faces().len(),
        stats.rejected,
        stats.hull_contact
    );
    Ok(PointCatchment {
        determined: true,
        closed: stats.rejected == 0 && !stats.hull_contact,
        boundary: session.extract_points(),
        sump: Some(terminus.position(tin)),
    })
}
