//! Property-based tests for the mesh invariants documented in src/lib.rs:
//! - Link symmetry, clockwise order, no self or duplicate links
//! - Planarity (no two edges cross)
//! - Triangle closure and winding
//! - Idempotent convexification
//! - Contour points lie on their level of the interpolated surface
//! - Persistence round trip
//! - Constraint paths are collinear linked chains
//!
//! Each property runs for three construction configurations generated with `pastey`.

use proptest::prelude::*;
use tinlink::geometry::predicates::{cross, project_onto_line, segments_cross_properly};
use tinlink::prelude::*;

// =============================================================================
// STRATEGIES AND HELPERS
// =============================================================================

// Strategy: finite planar coordinate range
fn finite_coordinate() -> impl Strategy<Value = f64> {
    (-100.0..100.0).prop_filter("must be finite", |x: &f64| x.is_finite())
}

fn elevation() -> impl Strategy<Value = f64> {
    0.0..50.0
}

fn survey(min: usize, max: usize) -> impl Strategy<Value = Vec<[f64; 3]>> {
    prop::collection::vec(
        (finite_coordinate(), finite_coordinate(), elevation()).prop_map(|(x, y, z)| [x, y, z]),
        min..=max,
    )
}

fn options(convex: bool, sentinels: bool) -> ConstructionOptions {
    ConstructionOptions::default()
        .with_convex_boundary(convex)
        .with_sentinels(sentinels)
}

fn build(points: Vec<[f64; 3]>, convex: bool, sentinels: bool) -> Option<Mesh> {
    MeshBuilder::new(points)
        .options(options(convex, sentinels))
        .build()
        .ok()
}

/// Every link of the store, sentinels included, once.
fn all_edges(mesh: &Mesh) -> Vec<(Point, Point)> {
    let store = mesh.link_store();
    store
        .iter()
        .flat_map(|(a, va)| {
            va.links()
                .iter()
                .filter(move |&&b| a < b)
                .map(move |&b| (*va.point(), *store.vertex(b).unwrap().point()))
        })
        .collect()
}

// =============================================================================
// PROPERTY GENERATION MACRO
// =============================================================================

macro_rules! gen_mesh_invariant_tests {
    ($name:ident, $convex:literal, $sentinels:literal) => {
        pastey::paste! {
            proptest! {
                #![proptest_config(ProptestConfig::with_cases(48))]

                /// Property: the link store stays consistent after construction
                #[test]
                fn [<prop_links_are_consistent_ $name>](points in survey(3, 40)) {
                    if let Some(mesh) = build(points, $convex, $sentinels) {
                        prop_assert!(mesh.validate().is_ok(), "{:?}", mesh.validate());
                        let expected = if $sentinels { 4 } else { 0 };
                        prop_assert_eq!(mesh.sentinel_count(), expected);
                    }
                }

                /// Property: no two edges cross
                #[test]
                fn [<prop_edges_do_not_cross_ $name>](points in survey(3, 30)) {
                    if let Some(mesh) = build(points, $convex, $sentinels) {
                        let edges = all_edges(&mesh);
                        for (i, (p1, p2)) in edges.iter().enumerate() {
                            for (q1, q2) in &edges[i + 1..] {
                                prop_assert!(
                                    !segments_cross_properly(p1, p2, q1, q2, 1e-9),
                                    "edges {p1}-{p2} and {q1}-{q2} cross"
                                );
                            }
                        }
                    }
                }

                /// Property: reported triangles are closed, clockwise and unique
                #[test]
                fn [<prop_triangles_are_closed_ $name>](points in survey(3, 40)) {
                    if let Some(mesh) = build(points, $convex, $sentinels) {
                        let mut seen = FastHashSet::default();
                        for (a, b, c) in mesh.iter_triangles(f64::INFINITY) {
                            prop_assert!(mesh.are_linked(a, b) && mesh.are_linked(b, c));
                            prop_assert!(mesh.are_linked(c, a));
                            let (pa, pb, pc) = (
                                mesh.vertex(a).unwrap().point(),
                                mesh.vertex(b).unwrap().point(),
                                mesh.vertex(c).unwrap().point(),
                            );
                            prop_assert!(cross(pa, pb, pc) < 0.0);
                            let mut triple = [a, b, c];
                            triple.sort();
                            prop_assert!(seen.insert(triple));
                        }
                    }
                }

                /// Property: convexification is idempotent
                #[test]
                fn [<prop_convexify_is_idempotent_ $name>](points in survey(4, 40)) {
                    if let Some(mut mesh) = build(points, $convex, $sentinels) {
                        mesh.discard_sentinels();
                        mesh.convexify_boundary();
                        prop_assert_eq!(mesh.convexify_boundary(), 0);
                        prop_assert!(mesh.validate().is_ok());
                    }
                }

                /// Property: every contour point lies on its level of the surface
                #[test]
                fn [<prop_contours_lie_on_their_level_ $name>](
                    points in survey(3, 30),
                    step in 1.0f64..10.0,
                ) {
                    if let Some(mesh) = build(points, $convex, $sentinels) {
                        let lines = mesh.contour_lines(&ContourOptions::new(step)).unwrap();
                        for line in &lines {
                            prop_assert!(line.points.len() >= 2);
                            for &(x, y, z) in &line.points {
                                prop_assert_eq!(z, line.elevation);
                                let surface = mesh.elevation_at(x, y);
                                prop_assert!(surface.is_some(), "point ({x}, {y}) off the surface");
                                let surface = surface.unwrap_or(f64::NAN);
                                prop_assert!(
                                    (surface - z).abs() <= 1e-6 * (1.0 + z.abs()),
                                    "surface {surface} at ({x}, {y}) differs from level {z}"
                                );
                            }
                        }
                    }
                }

                /// Property: save then load reproduces the saved text
                #[test]
                fn [<prop_persistence_round_trip_ $name>](points in survey(3, 40)) {
                    if let Some(mesh) = build(points, $convex, $sentinels) {
                        let text = mesh.save_to_string().unwrap();
                        let loaded = Mesh::load_from_str(&text).unwrap();
                        prop_assert_eq!(loaded.vertex_count(), mesh.vertex_count());
                        prop_assert_eq!(loaded.iter_edges().count(), mesh.iter_edges().count());
                        prop_assert_eq!(loaded.save_to_string().unwrap(), text);
                    }
                }

                /// Property: a forced edge becomes a collinear chain of links
                #[test]
                fn [<prop_constraint_path_is_collinear_ $name>](
                    points in survey(4, 30),
                    picks in (any::<prop::sample::Index>(), any::<prop::sample::Index>()),
                ) {
                    if let Some(mut mesh) = build(points, $convex, $sentinels) {
                        let keys: Vec<VertexKey> = mesh.vertices().map(|(k, _)| k).collect();
                        let a = keys[picks.0.index(keys.len())];
                        let b = keys[picks.1.index(keys.len())];
                        prop_assume!(a != b);
                        match mesh.force_edge(a, b) {
                            Ok(report) => {
                                prop_assert_eq!(report.path.first(), Some(&a));
                                prop_assert_eq!(report.path.last(), Some(&b));
                                let pa = *mesh.vertex(a).unwrap().point();
                                let pb = *mesh.vertex(b).unwrap().point();
                                for pair in report.path.windows(2) {
                                    prop_assert!(mesh.are_linked(pair[0], pair[1]));
                                }
                                for &k in &report.path {
                                    let p = mesh.vertex(k).unwrap().point();
                                    let (_, distance) = project_onto_line(&pa, &pb, p).unwrap();
                                    prop_assert!(distance <= 1e-5, "{p} off by {distance}");
                                }
                            }
                            // Non-convex meshes may legitimately block a constraint.
                            Err(_) => {}
                        }
                        prop_assert!(mesh.validate().is_ok());
                    }
                }
            }
        }
    };
}

gen_mesh_invariant_tests!(plain, false, false);
gen_mesh_invariant_tests!(convex, true, false);
gen_mesh_invariant_tests!(sentinels, false, true);
