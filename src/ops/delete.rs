//! Cascading deletion.
//!
//! Deleting a primitive takes its dependents with it, and what depends on
//! what follows the selection mode the delete was initiated in:
//!
//! - **Vertex mode**: each selected vertex takes every edge referencing it
//!   and every polygon with a boundary loop starting at it (plus that
//!   polygon's full loop range).
//! - **Edge mode**: each selected edge takes every polygon using it through
//!   any loop; afterwards, any vertex left with no surviving edge is swept
//!   up opportunistically.
//! - **Face mode**: selected polygons and their loop ranges only.
//!
//! The cascade is collected into an ordered, deduplicated record list with
//! each polygon directly ahead of its loops, so that undo can restore in
//! record order (see [`ops`](crate::ops)).

use std::collections::HashSet;

use tracing::debug;

use crate::history::{Action, PrimitiveRecord};
use crate::mesh::{EdgeId, MeshStore, PolygonId, PrimitiveRef, VertexId};
use crate::ops;
use crate::select::{SelectionManager, SelectionMode};

/// Delete the current selection with cascade, clearing the selection.
///
/// Returns the action to record, or `None` when nothing was deleted.
pub fn delete(store: &mut MeshStore, selection: &mut SelectionManager) -> Option<Action> {
    let previous = selection.selection().to_vec();
    let mut cascade = Cascade::default();

    match selection.mode() {
        SelectionMode::Vertex => {
            for v in selection.selected_vertices() {
                cascade.add_vertex(store, v);
                for e in store.edges_touching(v) {
                    cascade.add_edge(store, e);
                }
                for p in polygons_with_loop_start(store, v) {
                    cascade.add_polygon(store, p);
                }
            }
        }
        SelectionMode::Edge => {
            for e in selection.selected_edges() {
                cascade.add_edge(store, e);
                for p in polygons_with_loop_edge(store, e) {
                    cascade.add_polygon(store, p);
                }
            }
            // Sweep vertices that no surviving edge references.
            let doomed_edges: HashSet<EdgeId> = cascade
                .seen
                .iter()
                .filter_map(|p| match p {
                    PrimitiveRef::Edge(e) => Some(*e),
                    _ => None,
                })
                .collect();
            let isolated: Vec<VertexId> = store
                .vertex_ids()
                .filter(|&v| {
                    !store
                        .edge_ids()
                        .any(|e| !doomed_edges.contains(&e) && store.edge(e).contains(v))
                })
                .collect();
            for v in isolated {
                cascade.add_vertex(store, v);
            }
        }
        SelectionMode::Face => {
            for p in selection.selected_polygons() {
                cascade.add_polygon(store, p);
            }
        }
    }

    if cascade.records.is_empty() {
        return None;
    }

    selection.clear(store);
    ops::remove_records(store, selection, &cascade.records, false);
    debug!(removed = cascade.records.len(), "deleted cascade");

    Some(Action::Delete {
        records: cascade.records,
        previous,
    })
}

/// Replay a [`Action::Delete`].
///
/// Undo restores every record (polygons come back with their loop range at
/// the tail of the loop collection) and re-applies the pre-delete selection.
/// Redo deselects any still-selected doomed primitive for the active mode,
/// re-deletes, and clears the selection.
pub(crate) fn replay(
    store: &mut MeshStore,
    selection: &mut SelectionManager,
    records: &[PrimitiveRecord],
    previous: &[PrimitiveRef],
    is_undo: bool,
) {
    if is_undo {
        ops::restore_records(store, records);
        selection.set_selection(store, previous);
    } else {
        ops::remove_records(store, selection, records, true);
        selection.clear(store);
    }
}

/// Accumulates the delete set in order, without duplicates.
#[derive(Default)]
struct Cascade {
    records: Vec<PrimitiveRecord>,
    seen: HashSet<PrimitiveRef>,
}

impl Cascade {
    fn add_vertex(&mut self, store: &MeshStore, v: VertexId) {
        if !self.seen.insert(PrimitiveRef::Vertex(v)) {
            return;
        }
        self.records.push(PrimitiveRecord::Vertex {
            id: v,
            position: store.vertex(v).position,
        });
    }

    fn add_edge(&mut self, store: &MeshStore, e: EdgeId) {
        if !self.seen.insert(PrimitiveRef::Edge(e)) {
            return;
        }
        let edge = store.edge(e);
        self.records.push(PrimitiveRecord::Edge {
            id: e,
            a: edge.a,
            b: edge.b,
        });
    }

    /// Record a polygon followed immediately by its loops, preserving the
    /// restore-order contract.
    fn add_polygon(&mut self, store: &MeshStore, p: PolygonId) {
        if !self.seen.insert(PrimitiveRef::Polygon(p)) {
            return;
        }
        let poly = store.polygon(p);
        self.records.push(PrimitiveRecord::Polygon {
            id: p,
            num_loops: poly.num_loops,
            normal: poly.normal,
            triangles: poly.triangles.clone(),
        });
        for l in store.polygon_loops(p) {
            self.records.push(PrimitiveRecord::Loop {
                start: l.start,
                edge: l.edge,
            });
        }
    }
}

fn polygons_with_loop_start(store: &MeshStore, v: VertexId) -> Vec<PolygonId> {
    store
        .polygon_ids()
        .filter(|&p| store.polygon_loops(p).iter().any(|l| l.start == v))
        .collect()
}

fn polygons_with_loop_edge(store: &MeshStore, e: EdgeId) -> Vec<PolygonId> {
    store
        .polygon_ids()
        .filter(|&p| store.polygon_loops(p).iter().any(|l| l.edge == e))
        .collect()
}
