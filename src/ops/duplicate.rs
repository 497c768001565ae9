//! Duplication of selected primitives.
//!
//! Duplication is a deep copy that preserves internal connectivity: an
//! old→new vertex map is built first, then an edge map that resolves its
//! endpoints through the vertex map, then loops and polygons that resolve
//! through both. A duplicated edge therefore references duplicated vertices,
//! never originals.
//!
//! The history push is deferred. Duplication is almost always followed
//! immediately by a drag, so the pending action is held until
//! [`Editor::duplication_translation_complete`](crate::editor::Editor) fires
//! at the end of the translation modal. The action is pushed whether the drag
//! was confirmed or canceled: the duplicates exist in the mesh either way,
//! and the entry records their creation, not their movement.

use std::collections::HashMap;

use tracing::{debug, warn};

use crate::history::PrimitiveRecord;
use crate::mesh::{EdgeId, Loop, MeshStore, PrimitiveRef, VertexId};
use crate::ops;
use crate::select::SelectionManager;

/// A duplication awaiting its deferred history push.
#[derive(Debug, Clone)]
pub struct PendingDuplicate {
    /// The duplicated primitives, in restore order.
    pub records: Vec<PrimitiveRecord>,
    /// Selection before the duplicate.
    pub previous: Vec<PrimitiveRef>,
}

/// Deep-copy the current selection.
///
/// The new primitives are inserted into the store and become the selection.
/// Returns the pending action for the editor to hold, or `None` when nothing
/// copyable is selected.
pub fn duplicate(store: &mut MeshStore, selection: &mut SelectionManager) -> Option<PendingDuplicate> {
    let previous = selection.selection().to_vec();
    if previous.is_empty() {
        return None;
    }

    let mut records = Vec::new();
    let mut vert_map: HashMap<VertexId, VertexId> = HashMap::new();
    let mut edge_map: HashMap<EdgeId, EdgeId> = HashMap::new();

    // Vertices first, then edges resolving through the vertex map.
    for prim in &previous {
        if let PrimitiveRef::Vertex(v) = prim {
            ensure_vertex(store, &mut records, &mut vert_map, *v);
        }
    }
    for prim in &previous {
        if let PrimitiveRef::Edge(e) = prim {
            ensure_edge(store, &mut records, &mut vert_map, &mut edge_map, *e);
        }
    }

    // Polygons last: their loops resolve through both maps. Sub-primitives
    // the selection missed are pulled in on demand so connectivity never
    // dangles.
    for prim in &previous {
        let PrimitiveRef::Polygon(p) = prim else {
            continue;
        };
        let source_loops: Vec<Loop> = store.polygon_loops(*p).to_vec();
        let mut new_loops = Vec::with_capacity(source_loops.len());
        for l in &source_loops {
            let start = ensure_vertex(store, &mut records, &mut vert_map, l.start);
            let edge = ensure_edge(store, &mut records, &mut vert_map, &mut edge_map, l.edge);
            new_loops.push(Loop { start, edge });
        }

        let loop_start = store.num_loops();
        for l in &new_loops {
            store.append_loop(*l);
        }
        let new_poly = store.add_polygon(loop_start, new_loops.len());
        if let Err(err) = store.refresh_polygon(new_poly) {
            warn!(polygon = ?new_poly, %err, "duplicated polygon failed to triangulate");
        }

        let poly = store.polygon(new_poly);
        records.push(PrimitiveRecord::Polygon {
            id: new_poly,
            num_loops: poly.num_loops,
            normal: poly.normal,
            triangles: poly.triangles.clone(),
        });
        for l in &new_loops {
            records.push(PrimitiveRecord::Loop {
                start: l.start,
                edge: l.edge,
            });
        }
    }

    if records.is_empty() {
        return None;
    }

    let new_selection = ops::record_refs(&records);
    selection.set_selection(store, &new_selection);
    debug!(duplicated = records.len(), "duplicated selection");

    Some(PendingDuplicate { records, previous })
}

/// Replay a [`Action::Duplicate`](crate::history::Action::Duplicate).
///
/// Undo removes the duplicates and restores the pre-duplicate selection;
/// redo re-inserts them and selects them again.
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
        let refs = ops::record_refs(records);
        selection.set_selection(store, &refs);
    }
}

fn ensure_vertex(
    store: &mut MeshStore,
    records: &mut Vec<PrimitiveRecord>,
    vert_map: &mut HashMap<VertexId, VertexId>,
    v: VertexId,
) -> VertexId {
    if let Some(&dup) = vert_map.get(&v) {
        return dup;
    }
    let position = store.vertex(v).position;
    let dup = store.add_vertex(position);
    records.push(PrimitiveRecord::Vertex { id: dup, position });
    vert_map.insert(v, dup);
    dup
}

fn ensure_edge(
    store: &mut MeshStore,
    records: &mut Vec<PrimitiveRecord>,
    vert_map: &mut HashMap<VertexId, VertexId>,
    edge_map: &mut HashMap<EdgeId, EdgeId>,
    e: EdgeId,
) -> EdgeId {
    if let Some(&dup) = edge_map.get(&e) {
        return dup;
    }
    let (a, b) = {
        let edge = store.edge(e);
        (edge.a, edge.b)
    };
    let na = ensure_vertex(store, records, vert_map, a);
    let nb = ensure_vertex(store, records, vert_map, b);
    let dup = store.add_edge(na, nb);
    records.push(PrimitiveRecord::Edge {
        id: dup,
        a: na,
        b: nb,
    });
    edge_map.insert(e, dup);
    dup
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::select::SelectionMode;
    use nalgebra::Point3;

    #[test]
    fn test_duplicate_single_vertex() {
        let mut store = MeshStore::quad();
        let verts: Vec<VertexId> = store.vertex_ids().collect();
        let mut sel = SelectionManager::new();
        sel.select(&mut store, PrimitiveRef::Vertex(verts[0]));

        let pending = duplicate(&mut store, &mut sel).unwrap();
        assert_eq!(store.num_vertices(), 5);
        assert_eq!(pending.records.len(), 1);
        // Selection is exactly the new vertex.
        assert_eq!(sel.selection().len(), 1);
        assert_ne!(sel.selection()[0], PrimitiveRef::Vertex(verts[0]));
        assert!(!store.vertex(verts[0]).selected);
    }

    #[test]
    fn test_duplicated_edge_references_duplicated_vertices() {
        let mut store = MeshStore::quad();
        let edges: Vec<EdgeId> = store.edge_ids().collect();
        let mut sel = SelectionManager::new();
        sel.change_mode(&mut store, SelectionMode::Edge);
        sel.select(&mut store, PrimitiveRef::Edge(edges[0]));

        duplicate(&mut store, &mut sel).unwrap();
        assert_eq!(store.num_vertices(), 6);
        assert_eq!(store.num_edges(), 5);

        let new_edge = store.edge_ids().last().unwrap();
        let originals: Vec<VertexId> = (0..4).map(VertexId::new).collect();
        let edge = store.edge(new_edge);
        assert!(!originals.contains(&edge.a));
        assert!(!originals.contains(&edge.b));
    }

    #[test]
    fn test_duplicated_polygon_remaps_all_references() {
        let mut store = MeshStore::new();
        let corners = [
            store.add_vertex(Point3::new(0.0, 0.0, 0.0)),
            store.add_vertex(Point3::new(1.0, 0.0, 0.0)),
            store.add_vertex(Point3::new(1.0, 1.0, 0.0)),
            store.add_vertex(Point3::new(0.0, 1.0, 0.0)),
        ];
        let p = store.add_quad_face(&corners).unwrap();

        let mut sel = SelectionManager::new();
        sel.change_mode(&mut store, SelectionMode::Face);
        sel.select(&mut store, PrimitiveRef::Polygon(p));

        duplicate(&mut store, &mut sel).unwrap();
        assert_eq!(store.num_vertices(), 8);
        assert_eq!(store.num_edges(), 8);
        assert_eq!(store.num_polygons(), 2);
        assert_eq!(store.num_loops(), 8);

        // The duplicate's boundary must not reference any original primitive.
        let dup = store.polygon_ids().last().unwrap();
        assert_ne!(dup, p);
        for l in store.polygon_loops(dup) {
            assert!(!corners.contains(&l.start));
        }
        assert_eq!(store.polygon(dup).triangles.len(), 6);
    }

    #[test]
    fn test_undo_removes_duplicates() {
        let mut store = MeshStore::quad();
        let verts: Vec<VertexId> = store.vertex_ids().collect();
        let mut sel = SelectionManager::new();
        sel.select(&mut store, PrimitiveRef::Vertex(verts[0]));

        let pending = duplicate(&mut store, &mut sel).unwrap();
        replay(&mut store, &mut sel, &pending.records, &pending.previous, true);
        assert_eq!(store.num_vertices(), 4);
        // The original selection is back.
        assert!(sel.contains(PrimitiveRef::Vertex(verts[0])));

        replay(&mut store, &mut sel, &pending.records, &pending.previous, false);
        assert_eq!(store.num_vertices(), 5);
        assert!(!sel.contains(PrimitiveRef::Vertex(verts[0])));
    }

    #[test]
    fn test_duplicate_empty_selection_is_noop() {
        let mut store = MeshStore::quad();
        let mut sel = SelectionManager::new();
        assert!(duplicate(&mut store, &mut sel).is_none());
    }
}
