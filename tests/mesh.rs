use rand::{Rng, SeedableRng, rngs::StdRng};
use tinflow::{DrainageError, Point3, Tin, TinState};

fn hexagon_fan(clockwise_every_other: bool) -> Tin {
    let mut points = vec![Point3::xyz(0.0, 0.0, 0.0)];
    for k in 0..6 {
        let a = std::f64::consts::FRAC_PI_3 * k as f64;
        points.push(Point3::xyz(a.cos(), a.sin(), 1.0));
    }
    let triangles: Vec<[usize; 3]> = (1..=6)
        .map(|k| {
            let next = k % 6 + 1;
            if clockwise_every_other && k % 2 == 0 {
                [0, next, k]
            } else {
                [0, k, next]
            }
        })
        .collect();
    Tin::from_triangles(points, &triangles).unwrap()
}

#[test]
fn fan_is_a_valid_tin() {
    let tin = hexagon_fan(false);
    tin.validate().unwrap();
    assert_eq!(tin.state(), TinState::Triangulated);
    assert_eq!(tin.face_count(), 6);
    assert_eq!(tin.hull_vertices().len(), 6);
    assert!(!tin.is_hull_vertex(0));
    assert_eq!(tin.neighbors_ccw(0).len(), 6);
    for v in 1..=6 {
        assert!(tin.is_hull_vertex(v));
        assert_eq!(tin.neighbors_ccw(v).len(), 3);
    }
}

#[test]
fn mixed_winding_is_normalised() {
    let tin = hexagon_fan(true);
    tin.validate().unwrap();
    for f in 0..tin.face_count() {
        assert!(tin.face_area(f) > 0.0);
    }
}

#[test]
fn locate_finds_the_enclosing_face() {
    let tin = hexagon_fan(false);
    let f = tin.locate(0.5, 0.2).unwrap();
    assert!(tin.face_vertices(f).contains(&0));
    assert!(tin.face_vertices(f).contains(&1));
    assert!(tin.locate(2.0, 0.0).is_none());
}

#[test]
fn broken_input_is_rejected() {
    let points = vec![
        Point3::xyz(0.0, 0.0, 0.0),
        Point3::xyz(1.0, 0.0, 0.0),
        Point3::xyz(2.0, 0.0, 0.0),
        Point3::xyz(0.0, 1.0, 0.0),
    ];
    assert!(matches!(
        Tin::from_triangles(points.clone(), &[[0, 1, 2]]),
        Err(DrainageError::InvalidTriangulation(_))
    ));
    assert!(matches!(
        Tin::from_triangles(points.clone(), &[[0, 1, 3], [0, 1, 3]]),
        Err(DrainageError::InvalidTriangulation(_))
    ));
    assert!(matches!(
        Tin::from_triangles(points, &[[0, 1, 7]]),
        Err(DrainageError::InvalidVertex(7)) | Err(DrainageError::InvalidTriangulation(_))
    ));
}

#[test]
fn repeated_splits_keep_the_mesh_valid() {
    let mut tin = Tin::from_grid(4, 4, 1.0, |x, y| x * y).unwrap();
    let mut rng = StdRng::seed_from_u64(7);
    let faces = tin.face_count();
    let vertices = tin.vertex_count();
    for _ in 0..40 {
        let h = rng.random_range(0..tin.half_edges.len());
        let (a, b) = (tin.origin(h), tin.target(h));
        let u = rng.random_range(0.2..0.8);
        tin.split_edge(a, b, u).unwrap();
        tin.validate().unwrap();
    }
    assert_eq!(tin.vertex_count(), vertices + 40);
    assert!(tin.face_count() > faces);
    let area: f64 = (0..tin.face_count()).map(|f| tin.face_area(f)).sum();
    assert!((area - 16.0).abs() < 1e-9);
}

#[test]
fn missing_edge_cannot_be_split() {
    let mut tin = Tin::from_grid(2, 2, 1.0, |_, _| 0.0).unwrap();
    assert_eq!(tin.split_edge(0, 8, 0.5), Err(DrainageError::MissingEdge(0, 8)));
}
