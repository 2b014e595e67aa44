use tinflow::drainage::{
    colour::colour_triangles,
    index::{SumpLineType, TriangleIndex},
    scan::{ScanSession, ScanSlot},
    tracer::{LowPointTracer, Terminus, TraceOutcome, TracePosition},
};
use tinflow::{CancelToken, DrainageConfig, DrainageError, Tin, catchment_at};

fn pit(x: f64, y: f64) -> f64 {
    if x == 2.0 && y == 2.0 { 0.5 } else { x }
}

#[test]
fn flat_plateau_terminates_with_one_catchment() {
    let tin = Tin::from_grid(4, 3, 1.0, |x, _| (x - 2.0).max(0.0)).unwrap();
    let cfg = DrainageConfig::default();
    let mut index = TriangleIndex::build(&tin, cfg.flat_tolerance, None).unwrap();
    let stats = colour_triangles(&tin, &mut index, &cfg, &CancelToken::new()).unwrap();
    assert_eq!(stats.skipped, 12);
    assert_eq!(stats.undetermined, 0);

    let ids: Vec<_> = index
        .records()
        .iter()
        .filter(|r| r.is_traceable())
        .map(|r| r.catchment)
        .collect();
    assert_eq!(ids.len(), 12);
    assert!(ids.iter().all(|&id| id.is_determined() && id == ids[0]));
}

#[test]
fn pit_is_a_sump_without_false_low_depth() {
    let tin = Tin::from_grid(4, 4, 1.0, pit).unwrap();
    let cfg = DrainageConfig::default();
    let blocked = vec![false; tin.face_count()];
    let tracer = LowPointTracer::new(&tin, &blocked, &cfg);
    let out = tracer.trace(TracePosition::OnVertex(12)).unwrap();
    assert_eq!(out.terminus().map(|t| t.anchor()), Some(12));
}

#[test]
fn false_low_is_bypassed() {
    let tin = Tin::from_grid(4, 4, 1.0, pit).unwrap();
    let cfg = DrainageConfig::default().with_false_low_depth(1.0);
    let blocked = vec![false; tin.face_count()];
    let tracer = LowPointTracer::new(&tin, &blocked, &cfg);
    let out = tracer.trace(TracePosition::OnVertex(12)).unwrap();
    let sump = out.terminus().unwrap().position(&tin);
    assert_eq!(sump.x(), 0.0);
    assert_eq!(sump.z(), 0.0);
}

#[test]
fn shallow_pond_passes_through() {
    let tin = Tin::from_grid(4, 4, 1.0, pit).unwrap();
    let cfg = DrainageConfig::default().with_max_pond_depth(1.0);
    let blocked = vec![false; tin.face_count()];
    let tracer = LowPointTracer::new(&tin, &blocked, &cfg);
    let out = tracer.trace(TracePosition::OnVertex(12)).unwrap();
    assert_ne!(out.terminus().map(|t| t.anchor()), Some(12));
    assert!(tin.scans_idle());
}

#[test]
fn trace_stays_within_the_step_bound() {
    let tin = Tin::from_grid(5, 5, 1.0, |_, _| 1.0).unwrap();
    let cfg = DrainageConfig::default().with_false_low_depth(10.0);
    let blocked = vec![false; tin.face_count()];
    let tracer = LowPointTracer::new(&tin, &blocked, &cfg);
    let out = tracer.trace(TracePosition::OnVertex(14)).unwrap();
    // the bypass never revisits a vertex, so the walk ends well inside the guard
    assert!(matches!(out, TraceOutcome::Sump(_)), "{out:?}");
    assert!(tracer.max_steps() > tin.vertex_count());
}

#[test]
fn pond_deeper_than_the_limit_is_a_sump() {
    // the lowest rim vertex of the pit is 0.5 above it
    let tin = Tin::from_grid(4, 4, 1.0, pit).unwrap();
    let cfg = DrainageConfig::default().with_max_pond_depth(0.3);
    let blocked = vec![false; tin.face_count()];
    let tracer = LowPointTracer::new(&tin, &blocked, &cfg);
    let out = tracer.trace(TracePosition::OnVertex(12)).unwrap();
    assert_eq!(out, TraceOutcome::Sump(Terminus::Point(12)));
    assert!(tin.scans_idle());
}

#[test]
fn marked_drain_catches_runoff_on_a_slope() {
    let mut tin = Tin::from_grid(4, 4, 1.0, |x, _| x).unwrap();
    tin.mark_drain(12).unwrap();
    let cfg = DrainageConfig::default();
    let blocked = vec![false; tin.face_count()];
    let out = {
        let tracer = LowPointTracer::new(&tin, &blocked, &cfg);
        tracer.trace(TracePosition::OnVertex(14)).unwrap()
    };
    assert_eq!(out, TraceOutcome::Sump(Terminus::Point(12)));

    let index = TriangleIndex::build(&tin, cfg.flat_tolerance, None).unwrap();
    let id = index.encode(Terminus::Point(12));
    assert_eq!(index.sump_type(&tin, id), SumpLineType::DrainPoint);
    assert!(SumpLineType::DrainPoint.is_supported());
    assert_eq!(tin.mark_drain(99), Err(DrainageError::InvalidVertex(99)));
}

#[test]
fn point_query_in_a_bowl_finds_the_minimum() {
    let tin = Tin::from_grid(4, 4, 1.0, |x, y| (x - 2.0).powi(2) + (y - 2.0).powi(2)).unwrap();
    let found = catchment_at(&tin, 0.7, 3.1, &DrainageConfig::default()).unwrap();
    assert!(found.determined);
    let sump = found.sump.unwrap();
    assert_eq!((sump.x(), sump.y()), (2.0, 2.0));
    // the bowl spans the whole mesh, so the region reaches the hull
    assert!(!found.closed);
    assert_eq!(found.boundary.first(), found.boundary.last());
    assert!(found.boundary.len() >= 4);
    assert!(tin.scans_idle());
}

#[test]
fn point_query_outside_the_mesh_is_undetermined() {
    let tin = Tin::from_grid(2, 2, 1.0, |x, _| x).unwrap();
    let found = catchment_at(&tin, 5.0, 5.0, &DrainageConfig::default()).unwrap();
    assert!(!found.determined);
    assert!(found.boundary.is_empty());
    assert!(found.sump.is_none());
}

#[test]
fn point_query_needs_a_free_scan_slot() {
    let tin = Tin::from_grid(3, 3, 1.0, |_, y| y).unwrap();
    {
        let _held = ScanSession::open(&tin, ScanSlot::A).unwrap();
        assert_eq!(
            catchment_at(&tin, 1.2, 1.7, &DrainageConfig::default()),
            Err(DrainageError::ScanSlotBusy(ScanSlot::A))
        );
    }
    assert!(tin.scans_idle());
    assert!(catchment_at(&tin, 1.2, 1.7, &DrainageConfig::default()).unwrap().determined);
}
