//! The undo/redo action log.
//!
//! Every edit operation produces one [`Action`]: a plain data payload of
//! handles, primitive snapshots, or a numeric delta. Actions never contain
//! behavior; replaying one is the job of the component that owns the state it
//! touches, routed through the editor's single exhaustive dispatch
//! (see [`Editor::undo`](crate::editor::Editor::undo)).
//!
//! [`HistoryStack`] itself is deliberately dumb: push clears the redo stack,
//! undo and redo move one action between the two stacks and hand out a copy
//! for dispatch.

use nalgebra::{Point3, Vector3};

use crate::mesh::{EdgeId, PolygonId, PrimitiveRef, VertexId};
use crate::select::SelectionMode;

/// A snapshot of one primitive, sufficient to restore it into the store.
///
/// Records appear in action payloads in a defined order: a polygon's record
/// always directly precedes the records of its loops, so that restoring in
/// record order re-links the polygon (placed at the loop tail) with its
/// boundary.
#[derive(Debug, Clone)]
pub enum PrimitiveRecord {
    /// A vertex snapshot.
    Vertex {
        /// The slot this vertex occupies (and will be restored into).
        id: VertexId,
        /// Its position.
        position: Point3<f64>,
    },
    /// An edge snapshot.
    Edge {
        /// The slot this edge occupies.
        id: EdgeId,
        /// First endpoint.
        a: VertexId,
        /// Second endpoint.
        b: VertexId,
    },
    /// A loop snapshot. Loops have no stable handle; they are restored by
    /// appending behind their polygon's record.
    Loop {
        /// The loop's start vertex.
        start: VertexId,
        /// The edge to the next loop's start vertex.
        edge: EdgeId,
    },
    /// A polygon snapshot. The loop range is not recorded; restore is
    /// append-position (see [`MeshStore::restore_polygon`](crate::mesh::MeshStore::restore_polygon)).
    Polygon {
        /// The slot this polygon occupies.
        id: PolygonId,
        /// Number of boundary loops.
        num_loops: usize,
        /// Cached unit normal at snapshot time.
        normal: Vector3<f64>,
        /// Cached triangle fan at snapshot time.
        triangles: Vec<VertexId>,
    },
}

impl PrimitiveRecord {
    /// The handle this record restores, if the primitive kind has one.
    pub fn primitive_ref(&self) -> Option<PrimitiveRef> {
        match self {
            PrimitiveRecord::Vertex { id, .. } => Some(PrimitiveRef::Vertex(*id)),
            PrimitiveRecord::Edge { id, .. } => Some(PrimitiveRef::Edge(*id)),
            PrimitiveRecord::Loop { .. } => None,
            PrimitiveRecord::Polygon { id, .. } => Some(PrimitiveRef::Polygon(*id)),
        }
    }
}

/// One entry in the undo/redo log.
#[derive(Debug, Clone)]
pub enum Action {
    /// A selection change (click or box select).
    Select {
        /// Selection before the change.
        previous: Vec<PrimitiveRef>,
        /// Selection after the change.
        next: Vec<PrimitiveRef>,
    },
    /// A selection-mode switch, combined with the selection delta its
    /// conversion rules produced.
    ChangeMode {
        /// Mode before the switch.
        previous_mode: SelectionMode,
        /// Mode after the switch.
        next_mode: SelectionMode,
        /// Selection before the switch.
        previous: Vec<PrimitiveRef>,
        /// Selection after conversion.
        next: Vec<PrimitiveRef>,
    },
    /// A confirmed translation. Replay applies the delta (negated for undo)
    /// to the selection *at replay time*; see the crate docs for why this
    /// coupling is kept.
    Translate {
        /// Net world-space delta of the drag.
        delta: Vector3<f64>,
    },
    /// A cascading deletion.
    Delete {
        /// Everything the cascade removed, in restore order.
        records: Vec<PrimitiveRecord>,
        /// Selection before the delete.
        previous: Vec<PrimitiveRef>,
    },
    /// A confirmed duplication.
    Duplicate {
        /// The duplicated primitives, in restore order.
        records: Vec<PrimitiveRecord>,
        /// Selection before the duplicate.
        previous: Vec<PrimitiveRef>,
    },
    /// A formation (new edge, or new polygons with synthesized edges).
    Formation {
        /// The created primitives, in restore order.
        records: Vec<PrimitiveRecord>,
        /// Selection before the formation.
        previous: Vec<PrimitiveRef>,
    },
}

/// A command-pattern undo/redo stack.
#[derive(Debug, Clone, Default)]
pub struct HistoryStack {
    undo: Vec<Action>,
    redo: Vec<Action>,
}

impl HistoryStack {
    /// Create an empty history.
    pub fn new() -> Self {
        Self::default()
    }

    /// Record an action. Clears the redo stack: a new edit forks history.
    pub fn push(&mut self, action: Action) {
        self.undo.push(action);
        self.redo.clear();
    }

    /// Pop the most recent action for undoing. The action moves onto the
    /// redo stack; a copy is returned for dispatch.
    pub fn undo(&mut self) -> Option<Action> {
        let action = self.undo.pop()?;
        self.redo.push(action.clone());
        Some(action)
    }

    /// Pop the most recently undone action for redoing. The action moves
    /// back onto the undo stack; a copy is returned for dispatch.
    pub fn redo(&mut self) -> Option<Action> {
        let action = self.redo.pop()?;
        self.undo.push(action.clone());
        Some(action)
    }

    /// Number of actions available to undo.
    pub fn undo_depth(&self) -> usize {
        self.undo.len()
    }

    /// Number of actions available to redo.
    pub fn redo_depth(&self) -> usize {
        self.redo.len()
    }
}
