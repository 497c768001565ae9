//! Formation of higher-order primitives from the selection.
//!
//! Two selected vertices form an edge. Three or more form one or more
//! polygons through a greedy loop walk: from an arbitrary start vertex,
//! follow a selected edge to an unvisited selected vertex when one exists,
//! otherwise synthesize an edge to the geometrically nearest vertex not yet
//! included, and when no candidates remain close the loop back to its start.
//!
//! The walk is a heuristic, not a guaranteed planar polygonization: for
//! adversarial input it can produce a self-intersecting boundary, which the
//! triangulation error path then reports and survives.

use tracing::{debug, warn};

use crate::history::{Action, PrimitiveRecord};
use crate::mesh::{EdgeId, Loop, MeshStore, PrimitiveRef, VertexId};
use crate::ops;
use crate::select::{SelectionManager, SelectionMode};

/// Form new primitives from the current selection.
///
/// The created primitives are selected in addition to the existing
/// selection. Returns the action to record; unmet preconditions (face mode,
/// or fewer than two usable vertices) are a silent no-op returning `None`.
pub fn form(store: &mut MeshStore, selection: &mut SelectionManager) -> Option<Action> {
    if selection.mode() == SelectionMode::Face {
        return None;
    }
    let previous = selection.selection().to_vec();

    // Exactly two selected primitives, both vertices: a plain edge. An
    // auto-selected connecting edge would make the count three, so this only
    // fires for two genuinely unconnected vertices.
    if selection.mode() == SelectionMode::Vertex && previous.len() == 2 {
        if let (PrimitiveRef::Vertex(a), PrimitiveRef::Vertex(b)) = (previous[0], previous[1]) {
            let e = store.add_edge(a, b);
            let edge = store.edge(e);
            let records = vec![PrimitiveRecord::Edge {
                id: e,
                a: edge.a,
                b: edge.b,
            }];
            selection.select(store, PrimitiveRef::Edge(e));
            debug!(edge = ?e, "formed edge");
            return Some(Action::Formation { records, previous });
        }
        return None;
    }

    let mut remaining = selection.selected_vertices();
    if remaining.len() < 3 {
        return None;
    }
    let selected_edges = selection.selected_edges();

    let mut records = Vec::new();
    while remaining.len() >= 3 {
        let walk = walk_loop(store, &mut remaining, &selected_edges, &mut records);
        if walk.vertices.len() < 3 {
            continue;
        }

        let loop_start = store.num_loops();
        for (i, &v) in walk.vertices.iter().enumerate() {
            store.append_loop(Loop {
                start: v,
                edge: walk.edges[i],
            });
        }
        let p = store.add_polygon(loop_start, walk.vertices.len());
        if let Err(err) = store.refresh_polygon(p) {
            warn!(polygon = ?p, %err, "formed polygon failed to triangulate");
        }

        let poly = store.polygon(p);
        records.push(PrimitiveRecord::Polygon {
            id: p,
            num_loops: poly.num_loops,
            normal: poly.normal,
            triangles: poly.triangles.clone(),
        });
        for l in store.polygon_loops(p).to_vec() {
            records.push(PrimitiveRecord::Loop {
                start: l.start,
                edge: l.edge,
            });
        }
    }

    if records.is_empty() {
        return None;
    }

    let created = ops::record_refs(&records);
    for prim in created {
        selection.select(store, prim);
    }
    debug!(created = records.len(), "formed polygons");
    Some(Action::Formation { records, previous })
}

/// Replay a [`Action::Formation`].
///
/// Undo removes the created primitives and restores the pre-formation
/// selection; redo re-inserts and re-selects them alongside it.
pub(crate) fn replay(
    store: &mut MeshStore,
    selection: &mut SelectionManager,
    records: &[PrimitiveRecord],
    previous: &[PrimitiveRef],
    is_undo: bool,
) {
    if is_undo {
        selection.clear(store);
        ops::remove_records(store, selection, records, false);
        selection.set_selection(store, previous);
    } else {
        ops::restore_records(store, records);
        selection.set_selection(store, previous);
        for prim in ops::record_refs(records) {
            selection.select(store, prim);
        }
    }
}

struct Walk {
    vertices: Vec<VertexId>,
    /// `edges[i]` connects `vertices[i]` to `vertices[(i + 1) % n]`.
    edges: Vec<EdgeId>,
}

/// Walk one closed loop out of `remaining`, consuming the vertices it visits.
///
/// Synthesized edges are recorded into `records` as they are created.
fn walk_loop(
    store: &mut MeshStore,
    remaining: &mut Vec<VertexId>,
    selected_edges: &[EdgeId],
    records: &mut Vec<PrimitiveRecord>,
) -> Walk {
    let start = remaining[0];
    let mut vertices = vec![start];
    let mut edges = Vec::new();
    let mut current = start;

    loop {
        let unvisited =
            |v: VertexId| remaining.contains(&v) && !vertices.contains(&v);

        // Prefer following an already-selected edge.
        let followed = selected_edges.iter().find_map(|&e| {
            let edge = store.edge(e);
            if edge.contains(current) && unvisited(edge.other(current)) {
                Some((e, edge.other(current)))
            } else {
                None
            }
        });

        if let Some((e, v)) = followed {
            edges.push(e);
            vertices.push(v);
            current = v;
            continue;
        }

        // No selected edge leads onward; bridge to the nearest unincluded
        // vertex (first minimal distance wins).
        let here = store.vertex(current).position;
        let mut nearest: Option<(VertexId, f64)> = None;
        for &v in remaining.iter() {
            if !unvisited(v) {
                continue;
            }
            let d = (store.vertex(v).position - here).norm();
            if nearest.map_or(true, |(_, best)| d < best) {
                nearest = Some((v, d));
            }
        }

        if let Some((v, _)) = nearest {
            let e = synthesize_edge(store, records, current, v);
            edges.push(e);
            vertices.push(v);
            current = v;
            continue;
        }

        // Nothing left: close back to the start.
        let e = synthesize_edge(store, records, current, start);
        edges.push(e);
        break;
    }

    remaining.retain(|v| !vertices.contains(v));
    Walk { vertices, edges }
}

/// Find or create the edge `a`-`b`, recording it when newly created.
fn synthesize_edge(
    store: &mut MeshStore,
    records: &mut Vec<PrimitiveRecord>,
    a: VertexId,
    b: VertexId,
) -> EdgeId {
    if let Some(e) = store.find_edge(a, b) {
        return e;
    }
    let e = store.add_edge(a, b);
    records.push(PrimitiveRecord::Edge { id: e, a, b });
    e
}

#[cfg(test)]
mod tests {
    use super::*;
    use nalgebra::Point3;

    #[test]
    fn test_two_vertices_form_edge() {
        let mut store = MeshStore::new();
        let a = store.add_vertex(Point3::origin());
        let b = store.add_vertex(Point3::new(1.0, 0.0, 0.0));
        let mut sel = SelectionManager::new();
        sel.select(&mut store, PrimitiveRef::Vertex(a));
        sel.select(&mut store, PrimitiveRef::Vertex(b));

        let action = form(&mut store, &mut sel).unwrap();
        assert_eq!(store.num_edges(), 1);
        let e = store.edge_ids().next().unwrap();
        assert!(sel.contains(PrimitiveRef::Edge(e)));
        match action {
            Action::Formation { records, .. } => assert_eq!(records.len(), 1),
            other => panic!("unexpected action {:?}", other),
        }
    }

    #[test]
    fn test_quad_edges_form_polygon() {
        // Scenario A's formation step: four selected boundary edges walk
        // into one quad polygon with no synthesized edges.
        let mut store = MeshStore::quad();
        let verts: Vec<VertexId> = store.vertex_ids().collect();
        let mut sel = SelectionManager::new();
        for &v in &verts {
            sel.select(&mut store, PrimitiveRef::Vertex(v));
        }
        sel.change_mode(&mut store, SelectionMode::Edge);

        let action = form(&mut store, &mut sel).unwrap();
        assert_eq!(store.num_polygons(), 1);
        assert_eq!(store.num_edges(), 4, "no edges synthesized");
        let p = store.polygon_ids().next().unwrap();
        assert_eq!(store.polygon(p).num_loops, 4);
        assert_eq!(store.polygon(p).triangles.len(), 6);
        match action {
            // One polygon and its four loops.
            Action::Formation { records, .. } => assert_eq!(records.len(), 5),
            other => panic!("unexpected action {:?}", other),
        }
    }

    #[test]
    fn test_isolated_vertices_synthesize_edges() {
        let mut store = MeshStore::new();
        let a = store.add_vertex(Point3::new(0.0, 0.0, 0.0));
        let b = store.add_vertex(Point3::new(1.0, 0.0, 0.0));
        let c = store.add_vertex(Point3::new(0.5, 1.0, 0.0));
        let mut sel = SelectionManager::new();
        for v in [a, b, c] {
            sel.select(&mut store, PrimitiveRef::Vertex(v));
        }

        let action = form(&mut store, &mut sel).unwrap();
        assert_eq!(store.num_edges(), 3);
        assert_eq!(store.num_polygons(), 1);
        match action {
            // Three synthesized edges, the polygon, three loops.
            Action::Formation { records, .. } => assert_eq!(records.len(), 7),
            other => panic!("unexpected action {:?}", other),
        }
    }

    #[test]
    fn test_loop_invariant_holds_after_formation() {
        // Each loop's edge connects its start to the next loop's start.
        let mut store = MeshStore::new();
        let a = store.add_vertex(Point3::new(0.0, 0.0, 0.0));
        let b = store.add_vertex(Point3::new(1.0, 0.0, 0.0));
        let c = store.add_vertex(Point3::new(1.0, 1.0, 0.0));
        let d = store.add_vertex(Point3::new(0.0, 1.0, 0.0));
        let mut sel = SelectionManager::new();
        for v in [a, b, c, d] {
            sel.select(&mut store, PrimitiveRef::Vertex(v));
        }
        form(&mut store, &mut sel).unwrap();

        let p = store.polygon_ids().next().unwrap();
        let loops = store.polygon_loops(p).to_vec();
        for i in 0..loops.len() {
            let next = loops[(i + 1) % loops.len()].start;
            assert!(store.edge(loops[i].edge).matches(loops[i].start, next));
        }
    }

    #[test]
    fn test_formation_undo_removes_synthesized_edges() {
        let mut store = MeshStore::new();
        let a = store.add_vertex(Point3::new(0.0, 0.0, 0.0));
        let b = store.add_vertex(Point3::new(1.0, 0.0, 0.0));
        let c = store.add_vertex(Point3::new(0.5, 1.0, 0.0));
        let mut sel = SelectionManager::new();
        for v in [a, b, c] {
            sel.select(&mut store, PrimitiveRef::Vertex(v));
        }
        let action = form(&mut store, &mut sel).unwrap();
        let (records, previous) = match action {
            Action::Formation { records, previous } => (records, previous),
            other => panic!("unexpected action {:?}", other),
        };

        replay(&mut store, &mut sel, &records, &previous, true);
        assert_eq!(store.num_edges(), 0);
        assert_eq!(store.num_polygons(), 0);
        assert_eq!(store.num_loops(), 0);
        assert_eq!(sel.selected_vertices().len(), 3);

        replay(&mut store, &mut sel, &records, &previous, false);
        assert_eq!(store.num_edges(), 3);
        assert_eq!(store.num_polygons(), 1);
    }

    #[test]
    fn test_wrong_preconditions_are_noop() {
        let mut store = MeshStore::quad();
        let verts: Vec<VertexId> = store.vertex_ids().collect();
        let mut sel = SelectionManager::new();

        // One vertex is not enough.
        sel.select(&mut store, PrimitiveRef::Vertex(verts[0]));
        assert!(form(&mut store, &mut sel).is_none());

        // Face mode never forms.
        sel.change_mode(&mut store, SelectionMode::Face);
        assert!(form(&mut store, &mut sel).is_none());
        assert_eq!(store.num_edges(), 4);
    }
}
