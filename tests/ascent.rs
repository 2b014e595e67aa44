use tinflow::drainage::ascent::{AscentInserter, AscentStart, AscentStop};
use tinflow::{FeatureKind, Tin};

fn rising(tin: &Tin, vertices: &[usize]) -> bool {
    vertices
        .windows(2)
        .all(|w| tin.position(w[1]).z() >= tin.position(w[0]).z())
}

#[test]
fn ascent_line_never_descends() {
    let mut tin = Tin::from_grid(4, 4, 1.0, |x, y| x + 2.0 * y).unwrap();
    let inserter = AscentInserter::new(1e-9, None);
    let line = inserter.insert(&mut tin, AscentStart::Vertex(0)).unwrap();
    tin.validate().unwrap();

    assert!(line.vertices.len() >= 2);
    assert!(rising(&tin, &line.vertices));
    assert_eq!(line.stop, AscentStop::Hull);
    let recorded = tin.features_of_kind(FeatureKind::AscentLine).next().unwrap();
    assert_eq!(recorded.vertices, line.vertices);
}

#[test]
fn ascent_from_a_triangle_base_splits_the_base() {
    let mut tin = Tin::from_grid(3, 3, 1.0, |x, y| y + 0.3 * x).unwrap();
    let vertices = tin.vertex_count();
    let inserter = AscentInserter::new(1e-9, None);
    // base 5-6 at y = 1; the descent from apex (2, 2) crosses it at x = 1.7
    let line = inserter
        .insert(&mut tin, AscentStart::TriangleBase { a: 5, b: 6 })
        .unwrap();
    tin.validate().unwrap();

    let start = tin.position(line.vertices[0]);
    assert_eq!(line.vertices[0], vertices);
    assert!((start.x() - 1.7).abs() < 1e-9);
    assert!((start.y() - 1.0).abs() < 1e-9);
    assert!(line.inserted >= 1);
    assert_eq!(tin.vertex_count(), vertices + line.inserted);
    assert!(rising(&tin, &line.vertices));
    assert_eq!(line.stop, AscentStop::Hull);
}

#[test]
fn ascent_ends_on_a_flat_plateau() {
    // slope up to x = 2, level beyond
    let mut tin = Tin::from_grid(4, 2, 1.0, |x, _| x.min(2.0)).unwrap();
    let inserter = AscentInserter::new(1e-9, None);
    let line = inserter.insert(&mut tin, AscentStart::Vertex(6)).unwrap();
    tin.validate().unwrap();
    assert_eq!(line.stop, AscentStop::Peak);
    assert_eq!(line.vertices, vec![6, 7]);
    assert_eq!(line.inserted, 0);

    let on_top = inserter.insert(&mut tin, AscentStart::Vertex(8)).unwrap();
    assert_eq!(on_top.stop, AscentStop::Peak);
    assert_eq!(on_top.vertices, vec![8]);
    assert_eq!(tin.features_of_kind(FeatureKind::AscentLine).count(), 1);
}

#[test]
fn start_on_an_existing_line_adds_nothing() {
    let mut tin = Tin::from_grid(3, 2, 1.0, |x, _| x).unwrap();
    let inserter = AscentInserter::new(1e-9, None);
    let first = inserter.insert(&mut tin, AscentStart::Vertex(4)).unwrap();
    assert_eq!(first.vertices, vec![4, 5, 6, 7]);
    let vertices = tin.vertex_count();

    // midpoint of 5-6 lies on the first line
    let again = inserter
        .insert(&mut tin, AscentStart::EdgePoint { a: 5, b: 6, u: 0.5 })
        .unwrap();
    assert_eq!(again.stop, AscentStop::Merged);
    assert!(again.vertices.is_empty());
    assert_eq!(tin.vertex_count(), vertices);
    assert_eq!(tin.features_of_kind(FeatureKind::AscentLine).count(), 1);
}

#[test]
fn vertex_budget_stops_the_climb() {
    let mut tin = Tin::from_grid(3, 1, 1.0, |x, _| x).unwrap();
    let vertices = tin.vertex_count();
    let inserter = AscentInserter::new(1e-9, None).with_limits(100, 2);
    let line = inserter
        .insert(&mut tin, AscentStart::EdgePoint { a: 0, b: 4, u: 0.5 })
        .unwrap();
    tin.validate().unwrap();
    assert_eq!(line.stop, AscentStop::VertexLimit);
    assert_eq!(line.inserted, 2);
    assert_eq!(tin.vertex_count(), vertices + 2);
    assert!(rising(&tin, &line.vertices));
}
