//! Edit operations.
//!
//! Each operation reads the current selection, mutates the [`MeshStore`]
//! and/or [`SelectionManager`](crate::select::SelectionManager), and produces
//! one history action. Undo/redo re-enters through the `replay` function of
//! the operation that owns the action kind.

pub mod delete;
pub mod duplicate;
pub mod formation;
pub mod translate;

use crate::history::PrimitiveRecord;
use crate::mesh::{Loop, MeshStore, PrimitiveRef};
use crate::select::{SelectionManager, SelectionMode};

/// Restore a batch of primitive records into the store, in record order.
///
/// Polygon records must directly precede their loop records; the polygon is
/// reoccupied with its range at the loop tail and the loops append right
/// behind it.
pub(crate) fn restore_records(store: &mut MeshStore, records: &[PrimitiveRecord]) {
    for record in records {
        match record {
            PrimitiveRecord::Vertex { id, position } => store.restore_vertex(*id, *position),
            PrimitiveRecord::Edge { id, a, b } => store.restore_edge(*id, *a, *b),
            PrimitiveRecord::Polygon {
                id,
                num_loops,
                normal,
                triangles,
            } => store.restore_polygon(*id, *num_loops, *normal, triangles.clone()),
            PrimitiveRecord::Loop { start, edge } => {
                store.append_loop(Loop {
                    start: *start,
                    edge: *edge,
                });
            }
        }
    }
}

/// Remove a batch of recorded primitives from the store.
///
/// Loops are skipped; their polygon's removal drains them. With
/// `deselect_current_mode` set, a primitive matching the active selection
/// mode is deselected (with propagation) before removal, which is how a redo
/// of a deletion scrubs leftover selection state.
pub(crate) fn remove_records(
    store: &mut MeshStore,
    selection: &mut SelectionManager,
    records: &[PrimitiveRecord],
    deselect_current_mode: bool,
) {
    for record in records {
        match record {
            PrimitiveRecord::Vertex { id, .. } => {
                if deselect_current_mode && selection.mode() == SelectionMode::Vertex {
                    selection.deselect(store, PrimitiveRef::Vertex(*id));
                }
                store.remove_vertex(*id);
            }
            PrimitiveRecord::Edge { id, .. } => {
                if deselect_current_mode && selection.mode() == SelectionMode::Edge {
                    selection.deselect(store, PrimitiveRef::Edge(*id));
                }
                store.remove_edge(*id);
            }
            PrimitiveRecord::Polygon { id, .. } => {
                if deselect_current_mode && selection.mode() == SelectionMode::Face {
                    selection.deselect(store, PrimitiveRef::Polygon(*id));
                }
                store.remove_polygon(*id);
            }
            PrimitiveRecord::Loop { .. } => {}
        }
    }
}

/// The stable handles a record batch refers to, skipping loops.
pub(crate) fn record_refs(records: &[PrimitiveRecord]) -> Vec<PrimitiveRef> {
    records.iter().filter_map(|r| r.primitive_ref()).collect()
}
