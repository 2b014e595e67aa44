use rand::{Rng, SeedableRng, rngs::StdRng};
use tinflow::drainage::{colour::colour_triangles, extract::extract_polygons, index::TriangleIndex};
use tinflow::drainage::refine::{BoundaryRefiner, colour_and_extract};
use tinflow::geometry::polygon;
use tinflow::{
    CancelToken, CatchmentFeature, DrainageConfig, DrainageError, Fence, FenceMode, FenceSpec,
    FeatureKind, Point2, Point3, Tin, determine_catchments,
};

const EPS: f64 = 1e-9;

fn run(tin: &mut Tin, cfg: &DrainageConfig, fence: Option<&FenceSpec>) -> Vec<CatchmentFeature> {
    let mut out = Vec::new();
    determine_catchments(tin, cfg, fence, &CancelToken::new(), |f| out.push(f)).unwrap();
    out
}

fn assert_valid_ring(ring: &[Point3], anticlockwise: bool) {
    assert!(polygon::is_closed(ring));
    assert!(polygon::distinct_vertex_count(ring) >= 3);
    assert_eq!(polygon::signed_area(ring) > 0.0, anticlockwise);
}

fn two_bowls(x: f64, y: f64) -> f64 {
    let d1 = (x - 2.0).powi(2) + (y - 3.0).powi(2);
    let d2 = (x - 8.0).powi(2) + (y - 3.0).powi(2);
    d1.min(d2)
}

#[test]
fn tilted_plane_is_one_catchment_covering_the_hull() {
    let mut tin = Tin::from_grid(4, 3, 1.0, |_, y| y).unwrap();
    let features = run(&mut tin, &DrainageConfig::default(), None);
    assert_eq!(features.len(), 1);
    let feature = &features[0];
    assert_eq!(feature.kind, FeatureKind::Catchment);
    assert_eq!(feature.id, feature.polygon.id);
    assert!((feature.polygon.area() - 12.0).abs() < EPS);
    assert_valid_ring(&feature.polygon.points, true);
}

#[test]
fn bowl_is_one_catchment_covering_the_hull() {
    let mut tin = Tin::from_grid(4, 4, 1.0, |x, y| (x - 2.0).powi(2) + (y - 2.0).powi(2)).unwrap();
    let features = run(&mut tin, &DrainageConfig::default(), None);
    assert_eq!(features.len(), 1);
    assert!((features[0].polygon.area() - 16.0).abs() < EPS);
    assert!(features[0].polygon.holes.is_empty());
}

#[test]
fn two_bowls_split_along_the_ridge() {
    let mut tin = Tin::from_grid(10, 6, 1.0, two_bowls).unwrap();
    let mut features = Vec::new();
    let summary =
        determine_catchments(&mut tin, &DrainageConfig::default(), None, &CancelToken::new(), |f| {
            features.push(f)
        })
        .unwrap();
    assert_eq!(summary.catchments, 2);
    assert_eq!(summary.undetermined, 0);
    assert_eq!(features.len(), 2);
    assert_ne!(features[0].id, features[1].id);
    for f in &features {
        assert!((f.polygon.area() - 30.0).abs() < EPS);
        assert_valid_ring(&f.polygon.points, true);
    }
    let left = features.iter().find(|f| f.polygon.contains(1.5, 3.2)).unwrap();
    let right = features.iter().find(|f| f.polygon.contains(8.5, 3.2)).unwrap();
    assert_ne!(left.id, right.id);
    assert!(!left.polygon.contains(6.0, 3.2));
    assert!(!right.polygon.contains(4.0, 3.2));
}

#[test]
fn refining_a_converged_mesh_changes_nothing() {
    let mut tin = Tin::from_grid(10, 6, 1.0, two_bowls).unwrap();
    let cfg = DrainageConfig::default();
    let first = run(&mut tin, &cfg, None);
    let vertices = tin.vertex_count();
    let faces = tin.face_count();

    let summary = determine_catchments(&mut tin, &cfg, None, &CancelToken::new(), |_| {}).unwrap();
    assert_eq!(summary.mesh_vertices_added, 0);
    assert_eq!(summary.not_converged, 0);
    assert_eq!(tin.vertex_count(), vertices);
    assert_eq!(tin.face_count(), faces);
    let second = run(&mut tin, &cfg, None);
    assert_eq!(first, second);
}

#[test]
fn random_terrain_tiles_the_determined_triangles() {
    let mut rng = StdRng::seed_from_u64(0x7F10);
    let (nx, ny) = (12, 9);
    let heights: Vec<f64> = (0..(nx + 1) * (ny + 1))
        .map(|_| rng.random_range(0.0..10.0))
        .collect();
    let tin = Tin::from_grid(nx, ny, 1.0, |x, y| heights[y as usize * (nx + 1) + x as usize]).unwrap();
    let cfg = DrainageConfig::default().with_refine(false);

    let mut index = TriangleIndex::build(&tin, cfg.flat_tolerance, None).unwrap();
    colour_triangles(&tin, &mut index, &cfg, &CancelToken::new()).unwrap();
    let determined: f64 = index
        .records()
        .iter()
        .filter(|r| r.is_traceable() && r.catchment.is_determined())
        .map(|r| tin.face_area(r.face))
        .sum();

    let polygons = extract_polygons(&tin, &index).unwrap();
    assert!(!polygons.is_empty());
    let total: f64 = polygons.iter().map(|p| p.area()).sum();
    assert!((total - determined).abs() < 1e-6, "{total} vs {determined}");
    for p in &polygons {
        assert!(p.id.is_determined());
        assert_valid_ring(&p.points, true);
        for hole in &p.holes {
            assert_valid_ring(hole, false);
        }
    }
}

#[test]
fn colouring_is_deterministic() {
    let mut rng = StdRng::seed_from_u64(42);
    let heights: Vec<f64> = (0..49).map(|_| rng.random_range(0.0..5.0)).collect();
    let tin = Tin::from_grid(6, 6, 1.0, |x, y| heights[y as usize * 7 + x as usize]).unwrap();
    let cfg = DrainageConfig::default();
    let colour = || {
        let mut index = TriangleIndex::build(&tin, cfg.flat_tolerance, None).unwrap();
        colour_triangles(&tin, &mut index, &cfg, &CancelToken::new()).unwrap();
        index.records().iter().map(|r| r.catchment).collect::<Vec<_>>()
    };
    assert_eq!(colour(), colour());
}

#[test]
fn inside_fence_limits_the_catchment() {
    let mut tin = Tin::from_grid(4, 4, 1.0, |_, y| y).unwrap();
    let rect = Fence::Rectangle {
        min: Point2::xy(-0.5, -0.5),
        max: Point2::xy(2.5, 4.5),
    };
    let inside = FenceSpec::new(rect.clone(), FenceMode::Inside);
    let features = run(&mut tin, &DrainageConfig::default(), Some(&inside));
    assert_eq!(features.len(), 1);
    assert!((features[0].polygon.area() - 8.0).abs() < EPS);

    let outside = FenceSpec::new(rect, FenceMode::Outside);
    let features = run(&mut tin, &DrainageConfig::default(), Some(&outside));
    assert_eq!(features.len(), 1);
    assert!((features[0].polygon.area() - 4.0).abs() < EPS);
}

#[test]
fn overlap_fence_keeps_the_straddling_column() {
    let mut tin = Tin::from_grid(4, 4, 1.0, |_, y| y).unwrap();
    let overlap = FenceSpec::new(
        Fence::Rectangle {
            min: Point2::xy(-0.5, -0.5),
            max: Point2::xy(2.5, 4.5),
        },
        FenceMode::Overlap,
    );
    let active = overlap.activate().unwrap();
    let index = TriangleIndex::build(&tin, 1e-9, Some(&active)).unwrap();
    assert_eq!(index.blocked().iter().filter(|&&b| b).count(), 8);

    let features = run(&mut tin, &DrainageConfig::default(), Some(&overlap));
    assert_eq!(features.len(), 1);
    assert!((features[0].polygon.area() - 12.0).abs() < EPS);
    assert_valid_ring(&features[0].polygon.points, true);
}

#[test]
fn malformed_fence_processes_the_whole_mesh() {
    let mut tin = Tin::from_grid(4, 4, 1.0, |_, y| y).unwrap();
    let open = FenceSpec::new(
        Fence::Polygon(vec![Point2::xy(0.0, 0.0), Point2::xy(1.0, 0.0), Point2::xy(1.0, 1.0)]),
        FenceMode::Inside,
    );
    let features = run(&mut tin, &DrainageConfig::default(), Some(&open));
    assert_eq!(features.len(), 1);
    assert!((features[0].polygon.area() - 16.0).abs() < EPS);
}

#[test]
fn void_triangles_are_left_out() {
    let mut tin = Tin::from_grid(4, 4, 1.0, |_, y| y).unwrap();
    for f in 0..tin.face_count() {
        if tin.face_centroid(f).x() > 3.0 {
            tin.set_void(f, true).unwrap();
        }
    }
    let cfg = DrainageConfig::default().with_refine(false);
    let features = run(&mut tin, &cfg, None);
    let total: f64 = features.iter().map(|f| f.polygon.area()).sum();
    assert!((total - 12.0).abs() < EPS);
}

#[test]
fn cancelled_run_leaves_the_mesh_clean() {
    let mut tin = Tin::from_grid(4, 4, 1.0, |x, y| (x - 2.0).powi(2) + (y - 2.0).powi(2)).unwrap();
    let cancel = CancelToken::new();
    cancel.cancel();
    let mut calls = 0;
    let err = determine_catchments(&mut tin, &DrainageConfig::default(), None, &cancel, |_| calls += 1);
    assert_eq!(err, Err(DrainageError::Cancelled));
    assert_eq!(calls, 0);
    assert!(tin.scans_idle());
}

#[test]
fn untriangulated_mesh_is_rejected() {
    let mut tin = Tin::from_points(vec![
        Point3::xyz(0.0, 0.0, 0.0),
        Point3::xyz(1.0, 0.0, 0.0),
        Point3::xyz(0.0, 1.0, 1.0),
    ]);
    let err = determine_catchments(&mut tin, &DrainageConfig::default(), None, &CancelToken::new(), |_| {});
    assert_eq!(err, Err(DrainageError::NotTriangulated));
    assert_eq!(
        tinflow::catchment_at(&tin, 0.2, 0.2, &DrainageConfig::default()),
        Err(DrainageError::NotTriangulated)
    );
}

/// Two basins split by a ridge running obliquely across the grid.
fn skewed_divide(x: f64, y: f64) -> f64 {
    -(x - (2.2 + 0.3 * y)).abs() + 0.05 * (x - 3.0).powi(2) - 0.1 * y + 0.3 * (y - 2.0).powi(2)
}

fn ascent_lines_rise(tin: &Tin) -> bool {
    tin.features_of_kind(FeatureKind::AscentLine).all(|f| {
        f.vertices
            .windows(2)
            .all(|w| tin.position(w[1]).z() >= tin.position(w[0]).z() - EPS)
    })
}

#[test]
fn oblique_divide_is_refined_onto_new_vertices() {
    let mut tin = Tin::from_grid(6, 4, 1.0, skewed_divide).unwrap();
    let cfg = DrainageConfig::default();
    let mut features = Vec::new();
    let summary = determine_catchments(&mut tin, &cfg, None, &CancelToken::new(), |f| features.push(f)).unwrap();
    tin.validate().unwrap();

    assert_eq!(summary.catchments, 2);
    assert_eq!(summary.undetermined, 0);
    assert_eq!(summary.not_converged, 0);
    assert_eq!(summary.refined, 2);
    assert!(summary.mesh_vertices_added > 0);
    assert!(tin.features_of_kind(FeatureKind::AscentLine).count() > 0);
    assert!(ascent_lines_rise(&tin));
    let total: f64 = features.iter().map(|f| f.polygon.area()).sum();
    assert!((total - 24.0).abs() < 1e-6);
    for f in &features {
        assert_valid_ring(&f.polygon.points, true);
    }

    // a second run finds every cross-flow edge already covered
    let vertices = tin.vertex_count();
    let again = determine_catchments(&mut tin, &cfg, None, &CancelToken::new(), |_| {}).unwrap();
    assert_eq!(again.mesh_vertices_added, 0);
    assert_eq!(again.catchments, 2);
    assert_eq!(tin.vertex_count(), vertices);
}

#[test]
fn clean_catchments_are_still_classified_on_the_first_pass() {
    let tin = Tin::from_grid(6, 4, 1.0, skewed_divide).unwrap();
    let cfg = DrainageConfig::default();
    let cancel = CancelToken::new();
    let refiner = BoundaryRefiner::new(&cfg, None, &cancel);
    let pass = colour_and_extract(&tin, &cfg, None, &cancel).unwrap();

    let mut unsupported = Default::default();
    let health = refiner.health(&tin, &pass, &mut unsupported);
    assert_eq!(health.len(), 2);
    assert!(health.values().all(|h| h.is_converged()));
    assert!(health.values().any(|h| h.partial_votes > 0));

    let ids: Vec<_> = health.keys().copied().collect();
    let lines = refiner.plan(&tin, &pass, &ids);
    assert!(!lines.is_empty());
    assert!(lines.iter().all(|l| l.kind.is_refinable()));
}

#[test]
fn refinement_growth_is_capped() {
    let mut rng = StdRng::seed_from_u64(18);
    let n = 14;
    let heights: Vec<f64> = (0..(n + 1) * (n + 1))
        .map(|_| rng.random_range(0.0..10.0))
        .collect();
    let mut tin = Tin::from_grid(n, n, 1.0, |x, y| heights[y as usize * (n + 1) + x as usize]).unwrap();
    let vertices = tin.vertex_count();
    let cfg = DrainageConfig::default()
        .with_max_vertices_per_pass(4)
        .with_max_refine_vertices(6);

    let summary = determine_catchments(&mut tin, &cfg, None, &CancelToken::new(), |_| {}).unwrap();
    tin.validate().unwrap();
    assert!(summary.catchments > 1);
    assert!(summary.mesh_vertices_added <= 6, "{summary:?}");
    assert_eq!(tin.vertex_count(), vertices + summary.mesh_vertices_added);
    assert!(ascent_lines_rise(&tin));
}
