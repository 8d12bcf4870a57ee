//! End-to-end scenarios through the public API: construction, break lines, contouring and
//! the degenerate-input paths.

use approx::assert_relative_eq;
use tinlink::geometry::predicates::project_onto_line;
use tinlink::prelude::*;

// =============================================================================
// HELPERS
// =============================================================================

fn grid(n: u32) -> Vec<[f64; 3]> {
    (0..n * n)
        .map(|i| {
            let (x, y) = (f64::from(i % n), f64::from(i / n));
            [x, y, x + y]
        })
        .collect()
}

/// Edges as sorted coordinate pairs, so link graphs can be compared across mutations.
fn edge_coordinates(mesh: &Mesh) -> Vec<[(f64, f64); 2]> {
    let xy = |k: VertexKey| {
        let v = mesh.vertex(k).unwrap();
        (v.x(), v.y())
    };
    let mut edges: Vec<[(f64, f64); 2]> = mesh
        .iter_edges()
        .map(|e| {
            let mut pair = [xy(e.v0()), xy(e.v1())];
            pair.sort_by(|a, b| a.0.total_cmp(&b.0).then(a.1.total_cmp(&b.1)));
            pair
        })
        .collect();
    edges.sort_by(|a, b| {
        a[0].0
            .total_cmp(&b[0].0)
            .then(a[0].1.total_cmp(&b[0].1))
            .then(a[1].0.total_cmp(&b[1].0))
            .then(a[1].1.total_cmp(&b[1].1))
    });
    edges
}

// =============================================================================
// CONSTRUCTION
// =============================================================================

#[test]
fn three_points_make_one_triangle() {
    let mesh = Mesh::new([[0.0, 0.0, 1.0], [5.0, 0.0, 2.0], [0.0, 5.0, 3.0]]).unwrap();
    assert_eq!(mesh.vertex_count(), 3);
    assert_eq!(mesh.iter_edges().count(), 3);
    assert_eq!(mesh.iter_triangles(f64::INFINITY).count(), 1);
    assert_eq!(mesh.statistics().inserted, 3);
    assert!(mesh.validate().is_ok());
}

#[test]
fn regular_grid_is_fully_triangulated() {
    let mesh = MeshBuilder::new(grid(4)).convex_boundary(true).build().unwrap();
    assert_eq!(mesh.vertex_count(), 16);
    assert_eq!(mesh.iter_triangles(f64::INFINITY).count(), 18);
    assert_eq!(mesh.boundary().len(), 12);
    assert!(mesh.validate().is_ok());

    // Every triangle has non-zero area.
    let store = mesh.link_store();
    for (a, b, c) in mesh.iter_triangles(f64::INFINITY) {
        let area = tinlink::geometry::predicates::cross(
            store.vertex(a).unwrap().point(),
            store.vertex(b).unwrap().point(),
            store.vertex(c).unwrap().point(),
        );
        assert!(area.abs() > 0.5);
    }
}

#[test]
fn collinear_points_are_degenerate() {
    let points: Vec<[f64; 2]> = (0..5).map(|i| [f64::from(i), 2.0 * f64::from(i)]).collect();
    assert!(matches!(
        Mesh::new(points),
        Err(MeshConstructionError::DegenerateGeometry { .. })
    ));
}

#[test]
fn too_few_distinct_points() {
    assert_eq!(
        Mesh::new([[1.0, 1.0], [1.0, 1.0], [2.0, 2.0]]).unwrap_err(),
        MeshConstructionError::InsufficientPoints { found: 2 }
    );
}

// =============================================================================
// BREAK LINES
// =============================================================================

#[test]
fn existing_edge_is_left_alone() {
    let mut mesh = MeshBuilder::new(grid(3)).convex_boundary(true).build().unwrap();
    let before = edge_coordinates(&mesh);
    let a = mesh.vertex_at(0.0, 0.0).unwrap();
    let b = mesh.vertex_at(1.0, 0.0).unwrap();

    let report = mesh.force_edge(a, b).unwrap();
    assert!(report.was_present());
    assert_eq!(edge_coordinates(&mesh), before);
}

#[test]
fn crossing_diagonal_is_flipped() {
    let mut mesh = Mesh::new([[0.0, 0.0], [10.0, 0.0], [10.0, 10.0], [0.0, 10.0]]).unwrap();
    let (b, d) = (mesh.vertex_for_input(1).unwrap(), mesh.vertex_for_input(3).unwrap());
    let (a, c) = (mesh.vertex_for_input(0).unwrap(), mesh.vertex_for_input(2).unwrap());
    assert!(mesh.are_linked(a, c));

    let report = mesh.force_edge(b, d).unwrap();
    assert_eq!(report.flips, 1);
    assert!(report.steiner_vertices.is_empty());
    assert!(mesh.are_linked(b, d));
    assert!(!mesh.are_linked(a, c));
    assert_eq!(mesh.iter_edges().count(), 5);
    assert!(mesh.validate().is_ok());
}

/// A fan where the constraint `A–T` crosses `P–Q` at a point where flipping is impossible:
/// the far vertex `R` sees `P–Q` from below the segment.
const STEINER_FAN: &str = "\
5 0
A 0 0 0
2
3
4
0
P 5 3 3
1
3
4
5
0
Q 5 -1 1
1
2
4
0
R 6 -3 2
1
3
2
5
0
T 10 0 10
2
4
0
";

#[test]
fn blocked_crossing_gets_a_steiner_vertex() {
    let mut mesh = Mesh::load_from_str(STEINER_FAN).unwrap();
    assert!(mesh.validate().is_ok());
    assert_eq!(mesh.iter_triangles(f64::INFINITY).count(), 4);
    let a = mesh.vertex_by_label("A").unwrap();
    let t = mesh.vertex_by_label("T").unwrap();

    let report = mesh.force_edge(a, t).unwrap();
    assert_eq!(report.path.len(), 3);
    assert_eq!(report.steiner_vertices.len(), 1);
    assert_eq!(report.flips, 1);

    let x = report.steiner_vertices[0];
    let steiner = mesh.vertex(x).unwrap();
    assert_eq!(steiner.kind(), VertexKind::Steiner);
    assert!(steiner.label().is_none());
    assert_relative_eq!(steiner.x(), 5.0, epsilon = 1e-12);
    assert_relative_eq!(steiner.y(), 0.0, epsilon = 1e-12);
    // Elevation interpolated along P–Q.
    assert_relative_eq!(steiner.z(), 1.5, epsilon = 1e-12);

    assert_eq!(report.path, vec![a, x, t]);
    assert!(mesh.are_linked(a, x) && mesh.are_linked(x, t));
    assert_eq!(mesh.steiner_vertices(), vec![x]);
    assert!(mesh.validate().is_ok());
}

#[test]
fn constraint_through_vertices_becomes_a_chain() {
    let mut mesh = MeshBuilder::new(grid(5)).convex_boundary(true).build().unwrap();
    let a = mesh.vertex_at(0.0, 0.0).unwrap();
    let b = mesh.vertex_at(4.0, 4.0).unwrap();
    let report = mesh.force_edge(a, b).unwrap();

    assert_eq!(report.path.first(), Some(&a));
    assert_eq!(report.path.last(), Some(&b));
    let (pa, pb) = (*mesh.vertex(a).unwrap().point(), *mesh.vertex(b).unwrap().point());
    for pair in report.path.windows(2) {
        assert!(mesh.are_linked(pair[0], pair[1]));
    }
    for &k in &report.path {
        let (_, distance) = project_onto_line(&pa, &pb, mesh.vertex(k).unwrap().point()).unwrap();
        assert!(distance <= 1e-9);
    }
    assert!(mesh.validate().is_ok());
}

#[test]
fn break_lines_from_the_builder() {
    let mesh = MeshBuilder::new(grid(4))
        .convex_boundary(true)
        .break_line(0, 15)
        .break_line(1, 7)
        .build()
        .unwrap();
    assert!(mesh.validate().is_ok());
    // The diagonal runs through grid vertices, so it is a chain of unit diagonals.
    for i in 0..3 {
        let from = mesh.vertex_for_input(i * 5).unwrap();
        let to = mesh.vertex_for_input(i * 5 + 5).unwrap();
        assert!(mesh.are_linked(from, to));
    }
}

#[test]
fn unknown_break_line_input_fails_construction() {
    let result = MeshBuilder::new(grid(3)).break_line(0, 42).build();
    assert!(matches!(
        result,
        Err(MeshConstructionError::Constraint {
            index: 0,
            source: ConstraintError::UnknownInput { input_index: 42 }
        })
    ));
}

// =============================================================================
// CONTOURS
// =============================================================================

#[test]
fn linear_quad_middle_level() {
    // z = 5 (x - y) + 50 spans 0..100.
    let mesh = Mesh::new([
        [0.0, 0.0, 50.0],
        [10.0, 0.0, 100.0],
        [10.0, 10.0, 50.0],
        [0.0, 10.0, 0.0],
    ])
    .unwrap();
    let mut level_50 = Vec::new();
    mesh.contours(&ContourOptions::new(10.0), |k, pts: &[(f64, f64, f64)], closed| {
        if k == 5 {
            level_50.push((pts.to_vec(), closed));
        }
    })
    .unwrap();

    assert_eq!(level_50.len(), 1);
    let (points, closed) = &level_50[0];
    assert!(!closed);
    assert_eq!(points.len(), 2);
    let boundary: Vec<(f64, f64)> = mesh
        .boundary()
        .iter()
        .map(|&k| (mesh.vertex(k).unwrap().x(), mesh.vertex(k).unwrap().y()))
        .collect();
    for &(x, y, z) in points {
        assert_relative_eq!(z, 50.0);
        assert!(boundary.contains(&(x, y)));
    }
}

#[test]
fn level_between_vertices_cuts_boundary_edges() {
    // z = 10 x; level 55 crosses the quad at x = 5.5 without touching a vertex.
    let mesh = Mesh::new([
        [0.0, 0.0, 0.0],
        [10.0, 0.0, 100.0],
        [10.0, 10.0, 100.0],
        [0.0, 10.0, 0.0],
    ])
    .unwrap();
    let mut level_55 = Vec::new();
    mesh.contours(&ContourOptions::new(5.0), |k, pts: &[(f64, f64, f64)], closed| {
        if k == 11 {
            level_55.push((pts.to_vec(), closed));
        }
    })
    .unwrap();

    assert_eq!(level_55.len(), 1);
    let (points, closed) = &level_55[0];
    assert!(!closed);
    // Bottom edge, the diagonal, top edge.
    assert_eq!(points.len(), 3);
    for &(x, _, z) in points {
        assert_relative_eq!(x, 5.5, epsilon = 1e-12);
        assert_relative_eq!(z, 55.0);
    }
    let mut ends = [points[0].1, points[2].1];
    ends.sort_by(f64::total_cmp);
    assert_relative_eq!(ends[0], 0.0, epsilon = 1e-12);
    assert_relative_eq!(ends[1], 10.0, epsilon = 1e-12);
    assert!(points[1].1 > 0.0 && points[1].1 < 10.0);
}

#[test]
fn contours_follow_the_interpolated_surface() {
    let mesh = MeshBuilder::new(grid(6)).convex_boundary(true).build().unwrap();
    let lines = mesh.contour_lines(&ContourOptions::new(0.75)).unwrap();
    assert!(!lines.is_empty());
    for line in &lines {
        for &(x, y, z) in &line.points {
            assert_relative_eq!(z, line.elevation);
            assert_relative_eq!(mesh.elevation_at(x, y).unwrap(), z, epsilon = 1e-9);
        }
    }
}

#[test]
fn sentinels_never_reach_contours() {
    let mesh = MeshBuilder::new(grid(4))
        .add_sentinels(true)
        .build()
        .unwrap();
    let extent = mesh.extent().unwrap();
    for line in mesh.contour_lines(&ContourOptions::new(1.0)).unwrap() {
        for &(x, y, _) in &line.points {
            assert!(extent.contains_xy(x, y));
        }
    }
}
