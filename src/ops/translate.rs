//! Translation of the selection, as a drag state machine.
//!
//! A drag, whether driven by the gizmo or the grab hotkey, never accumulates
//! increments. The start position of every affected vertex is captured once
//! at drag begin; each update resets the vertices to those starts and applies
//! the full constrained delta from scratch. Changing the axis constraint
//! mid-drag therefore re-projects the whole unconstrained motion instead of
//! freezing components at whatever they were when the constraint changed,
//! and cancel restores the exact starting positions with no rounding drift.

use nalgebra::{Point3, Vector3};
use tracing::debug;

use crate::mesh::{MeshStore, VertexId};
use crate::select::SelectionManager;

/// A world axis.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Axis {
    /// The world x axis.
    X,
    /// The world y axis.
    Y,
    /// The world z axis.
    Z,
}

/// Constraint applied to a translation delta.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default)]
pub enum AxisConstraint {
    /// No constraint; the delta passes through unchanged.
    #[default]
    Free,
    /// Motion restricted to a single axis.
    Axis(Axis),
    /// Motion restricted to the plane perpendicular to an axis.
    Plane(Axis),
}

impl AxisConstraint {
    /// The component mask this constraint keeps.
    pub fn mask(self) -> Vector3<f64> {
        match self {
            AxisConstraint::Free => Vector3::new(1.0, 1.0, 1.0),
            AxisConstraint::Axis(Axis::X) => Vector3::new(1.0, 0.0, 0.0),
            AxisConstraint::Axis(Axis::Y) => Vector3::new(0.0, 1.0, 0.0),
            AxisConstraint::Axis(Axis::Z) => Vector3::new(0.0, 0.0, 1.0),
            AxisConstraint::Plane(Axis::X) => Vector3::new(0.0, 1.0, 1.0),
            AxisConstraint::Plane(Axis::Y) => Vector3::new(1.0, 0.0, 1.0),
            AxisConstraint::Plane(Axis::Z) => Vector3::new(1.0, 1.0, 0.0),
        }
    }

    /// Apply the mask component-wise.
    fn constrain(self, delta: Vector3<f64>) -> Vector3<f64> {
        delta.component_mul(&self.mask())
    }
}

#[derive(Debug)]
struct DragState {
    /// Affected vertices with their positions at drag begin.
    starts: Vec<(VertexId, Point3<f64>)>,
    /// Pivot position at drag begin.
    origin: Point3<f64>,
    /// Unconstrained delta accumulated over the whole drag.
    raw: Vector3<f64>,
    /// The constrained delta currently applied to the mesh.
    applied: Vector3<f64>,
    constraint: AxisConstraint,
    /// Offset from pivot to cursor at hotkey grab, so the selection does not
    /// jump to the cursor on the first update.
    grab_offset: Vector3<f64>,
    hotkey: bool,
}

/// Drag state machine for moving the selection.
#[derive(Debug)]
pub struct Translation {
    pivot: Point3<f64>,
    drag: Option<DragState>,
}

impl Default for Translation {
    fn default() -> Self {
        Self::new()
    }
}

impl Translation {
    /// Create an idle translation state.
    pub fn new() -> Self {
        Self {
            pivot: Point3::origin(),
            drag: None,
        }
    }

    /// Where the gizmo sits: the centroid of the affected vertices.
    #[inline]
    pub fn pivot(&self) -> Point3<f64> {
        self.pivot
    }

    /// Is a drag in progress?
    #[inline]
    pub fn is_active(&self) -> bool {
        self.drag.is_some()
    }

    /// Is the active drag the hotkey modal (as opposed to a gizmo drag)?
    pub fn is_hotkey(&self) -> bool {
        self.drag.as_ref().is_some_and(|d| d.hotkey)
    }

    /// Reposition the pivot after the selection or the mesh changed.
    ///
    /// Called on every selection edit and after every undo/redo dispatch. A
    /// no-op while a drag is in progress.
    pub fn sync_to_selection(&mut self, store: &MeshStore, selection: &SelectionManager) {
        if self.drag.is_some() {
            return;
        }
        let verts = affected_vertices(store, selection);
        if verts.is_empty() {
            return;
        }
        let mut sum = Vector3::zeros();
        for &v in &verts {
            sum += store.vertex(v).position.coords;
        }
        self.pivot = Point3::from(sum / verts.len() as f64);
    }

    /// Begin a gizmo drag over the current selection.
    ///
    /// A no-op when nothing movable is selected or a drag is already active.
    pub fn begin_drag(&mut self, store: &MeshStore, selection: &SelectionManager) {
        self.begin(store, selection, Vector3::zeros(), false);
    }

    /// Begin the hotkey grab modal. The cursor's offset from the pivot is
    /// remembered so the selection follows cursor motion rather than snapping
    /// onto the cursor.
    pub fn begin_hotkey(
        &mut self,
        store: &MeshStore,
        selection: &SelectionManager,
        cursor: Point3<f64>,
    ) {
        let offset = cursor - self.pivot;
        self.begin(store, selection, offset, true);
    }

    fn begin(
        &mut self,
        store: &MeshStore,
        selection: &SelectionManager,
        grab_offset: Vector3<f64>,
        hotkey: bool,
    ) {
        if self.drag.is_some() {
            return;
        }
        self.sync_to_selection(store, selection);
        let starts: Vec<(VertexId, Point3<f64>)> = affected_vertices(store, selection)
            .into_iter()
            .map(|v| (v, store.vertex(v).position))
            .collect();
        if starts.is_empty() {
            return;
        }
        debug!(vertices = starts.len(), hotkey, "translation drag begin");
        self.drag = Some(DragState {
            starts,
            origin: self.pivot,
            raw: Vector3::zeros(),
            applied: Vector3::zeros(),
            constraint: AxisConstraint::Free,
            grab_offset,
            hotkey,
        });
    }

    /// Drag the pivot to a world-space target.
    ///
    /// The unconstrained delta is recomputed from the drag origin, then the
    /// constraint mask is applied and every affected vertex is repositioned
    /// from its start.
    pub fn drag_to(&mut self, store: &mut MeshStore, target: Point3<f64>) {
        let Some(drag) = &mut self.drag else {
            return;
        };
        drag.raw = target - drag.origin;
        Self::reapply(store, drag);
        self.pivot = self.drag.as_ref().map_or(self.pivot, |d| d.origin + d.applied);
    }

    /// Feed a cursor position into the hotkey modal.
    pub fn update_hotkey(&mut self, store: &mut MeshStore, cursor: Point3<f64>) {
        let Some(offset) = self.drag.as_ref().map(|d| d.grab_offset) else {
            return;
        };
        self.drag_to(store, cursor - offset);
    }

    /// Change the axis constraint mid-drag.
    ///
    /// The full unconstrained delta is re-projected through the new mask, so
    /// switching from free motion to an x-axis constraint snaps the y and z
    /// components back to zero rather than keeping their current values.
    pub fn set_constraint(&mut self, store: &mut MeshStore, constraint: AxisConstraint) {
        let Some(drag) = &mut self.drag else {
            return;
        };
        drag.constraint = constraint;
        Self::reapply(store, drag);
        self.pivot = self.drag.as_ref().map_or(self.pivot, |d| d.origin + d.applied);
    }

    fn reapply(store: &mut MeshStore, drag: &mut DragState) {
        drag.applied = drag.constraint.constrain(drag.raw);
        let mut moved = Vec::with_capacity(drag.starts.len());
        for &(v, start) in &drag.starts {
            store.vertex_mut(v).position = start + drag.applied;
            moved.push(v);
        }
        store.refresh_polygons_touching(&moved);
    }

    /// Finish the drag, returning the net delta it applied.
    ///
    /// Returns `None` for a drag that ended where it started.
    pub fn confirm(&mut self) -> Option<Vector3<f64>> {
        let drag = self.drag.take()?;
        self.pivot = drag.origin + drag.applied;
        if drag.applied == Vector3::zeros() {
            return None;
        }
        debug!(delta = ?drag.applied, "translation confirmed");
        Some(drag.applied)
    }

    /// Abort the drag, restoring every affected vertex to its exact starting
    /// position.
    pub fn cancel(&mut self, store: &mut MeshStore) {
        let Some(drag) = self.drag.take() else {
            return;
        };
        let mut moved = Vec::with_capacity(drag.starts.len());
        for &(v, start) in &drag.starts {
            store.vertex_mut(v).position = start;
            moved.push(v);
        }
        store.refresh_polygons_touching(&moved);
        self.pivot = drag.origin;
        debug!("translation canceled");
    }
}

/// The vertices a translation moves, derived from the selection through the
/// active mode: the selected vertices themselves, the endpoints of selected
/// edges, or the boundary vertices of selected polygons. Deduplicated so a
/// vertex shared by two selected primitives moves once.
pub(crate) fn affected_vertices(store: &MeshStore, selection: &SelectionManager) -> Vec<VertexId> {
    use crate::select::SelectionMode;

    let mut verts: Vec<VertexId> = Vec::new();
    let mut push = |v: VertexId, verts: &mut Vec<VertexId>| {
        if !verts.contains(&v) {
            verts.push(v);
        }
    };
    match selection.mode() {
        SelectionMode::Vertex => {
            for v in selection.selected_vertices() {
                push(v, &mut verts);
            }
        }
        SelectionMode::Edge => {
            for e in selection.selected_edges() {
                let edge = store.edge(e);
                push(edge.a, &mut verts);
                push(edge.b, &mut verts);
            }
        }
        SelectionMode::Face => {
            for p in selection.selected_polygons() {
                for l in store.polygon_loops(p) {
                    push(l.start, &mut verts);
                }
            }
        }
    }
    verts
}

/// Replay a [`Action::Translate`](crate::history::Action::Translate).
///
/// The delta (negated for undo) is applied to whatever the selection is
/// *now*, not to the vertices the original drag moved. Replaying with a
/// different selection moves different vertices; the history entry records a
/// motion, not a set of targets.
pub(crate) fn replay(
    store: &mut MeshStore,
    selection: &SelectionManager,
    delta: Vector3<f64>,
    is_undo: bool,
) {
    let signed = if is_undo { -delta } else { delta };
    let verts = affected_vertices(store, selection);
    for &v in &verts {
        store.vertex_mut(v).position += signed;
    }
    store.refresh_polygons_touching(&verts);
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::mesh::PrimitiveRef;
    use crate::select::SelectionMode;
    use approx::assert_relative_eq;

    fn quad_selection() -> (MeshStore, SelectionManager, VertexId) {
        let mut store = MeshStore::quad();
        let v = store.vertex_ids().next().unwrap();
        let mut sel = SelectionManager::new();
        sel.select(&mut store, PrimitiveRef::Vertex(v));
        (store, sel, v)
    }

    #[test]
    fn test_drag_moves_selected_vertex() {
        let (mut store, sel, v) = quad_selection();
        let start = store.vertex(v).position;
        let mut tr = Translation::new();

        tr.begin_drag(&store, &sel);
        tr.drag_to(&mut store, tr.pivot() + Vector3::new(1.0, 2.0, 0.0));
        assert_relative_eq!(store.vertex(v).position, start + Vector3::new(1.0, 2.0, 0.0));

        let delta = tr.confirm().unwrap();
        assert_relative_eq!(delta, Vector3::new(1.0, 2.0, 0.0));
        assert!(!tr.is_active());
    }

    #[test]
    fn test_constraint_change_reprojects_whole_drag() {
        let (mut store, sel, v) = quad_selection();
        let start = store.vertex(v).position;
        let mut tr = Translation::new();

        tr.begin_drag(&store, &sel);
        tr.drag_to(&mut store, tr.pivot() + Vector3::new(3.0, 4.0, 5.0));

        // Constraining to x mid-drag zeroes y and z entirely, not just for
        // subsequent motion.
        tr.set_constraint(&mut store, AxisConstraint::Axis(Axis::X));
        assert_relative_eq!(store.vertex(v).position, start + Vector3::new(3.0, 0.0, 0.0));

        // Back to free: the full raw delta returns.
        tr.set_constraint(&mut store, AxisConstraint::Free);
        assert_relative_eq!(store.vertex(v).position, start + Vector3::new(3.0, 4.0, 5.0));
    }

    #[test]
    fn test_plane_constraint_drops_one_component() {
        let (mut store, sel, v) = quad_selection();
        let start = store.vertex(v).position;
        let mut tr = Translation::new();

        tr.begin_drag(&store, &sel);
        tr.drag_to(&mut store, tr.pivot() + Vector3::new(3.0, 4.0, 5.0));
        tr.set_constraint(&mut store, AxisConstraint::Plane(Axis::Z));
        assert_relative_eq!(store.vertex(v).position, start + Vector3::new(3.0, 4.0, 0.0));
    }

    #[test]
    fn test_cancel_restores_exact_positions() {
        let (mut store, sel, v) = quad_selection();
        let start = store.vertex(v).position;
        let mut tr = Translation::new();

        tr.begin_drag(&store, &sel);
        tr.drag_to(&mut store, tr.pivot() + Vector3::new(0.1, 0.2, 0.3));
        tr.drag_to(&mut store, tr.pivot() + Vector3::new(0.7, -0.4, 0.9));
        tr.cancel(&mut store);

        // Bit-exact, not approximately equal: cancel writes the stored
        // starts back instead of subtracting the delta.
        assert_eq!(store.vertex(v).position, start);
        assert!(!tr.is_active());
    }

    #[test]
    fn test_edge_mode_moves_both_endpoints_once() {
        let mut store = MeshStore::quad();
        let edges: Vec<_> = store.edge_ids().collect();
        let mut sel = SelectionManager::new();
        sel.change_mode(&mut store, SelectionMode::Edge);
        // Two adjacent edges share a vertex; it must move once, not twice.
        sel.select(&mut store, PrimitiveRef::Edge(edges[0]));
        sel.select(&mut store, PrimitiveRef::Edge(edges[1]));

        let verts = affected_vertices(&store, &sel);
        assert_eq!(verts.len(), 3);

        let before: Vec<_> = verts.iter().map(|&v| store.vertex(v).position).collect();
        let mut tr = Translation::new();
        tr.begin_drag(&store, &sel);
        tr.drag_to(&mut store, tr.pivot() + Vector3::new(0.0, 0.0, 1.0));
        for (i, &v) in verts.iter().enumerate() {
            assert_relative_eq!(store.vertex(v).position, before[i] + Vector3::new(0.0, 0.0, 1.0));
        }
    }

    #[test]
    fn test_hotkey_grab_offset_prevents_snapping() {
        let (mut store, sel, v) = quad_selection();
        let start = store.vertex(v).position;
        let mut tr = Translation::new();
        tr.sync_to_selection(&store, &sel);

        // Grab with the cursor one unit away from the pivot; feeding the
        // same cursor position back moves nothing.
        let cursor = tr.pivot() + Vector3::new(1.0, 0.0, 0.0);
        tr.begin_hotkey(&store, &sel, cursor);
        tr.update_hotkey(&mut store, cursor);
        assert_relative_eq!(store.vertex(v).position, start);

        tr.update_hotkey(&mut store, cursor + Vector3::new(0.0, 2.0, 0.0));
        assert_relative_eq!(store.vertex(v).position, start + Vector3::new(0.0, 2.0, 0.0));
        assert!(tr.is_hotkey());
    }

    #[test]
    fn test_replay_round_trip() {
        let (mut store, sel, v) = quad_selection();
        let start = store.vertex(v).position;
        let delta = Vector3::new(1.5, -2.0, 0.25);

        replay(&mut store, &sel, delta, false);
        assert_relative_eq!(store.vertex(v).position, start + delta);
        replay(&mut store, &sel, delta, true);
        assert_relative_eq!(store.vertex(v).position, start);
    }

    #[test]
    fn test_face_mode_refreshes_polygon_cache() {
        let mut store = MeshStore::cube();
        let p = store.polygon_ids().next().unwrap();
        let normal = store.polygon(p).normal;
        let mut sel = SelectionManager::new();
        sel.change_mode(&mut store, SelectionMode::Face);
        sel.select(&mut store, PrimitiveRef::Polygon(p));

        let mut tr = Translation::new();
        tr.begin_drag(&store, &sel);
        tr.drag_to(&mut store, tr.pivot() + Vector3::new(0.0, 0.0, 0.5));
        tr.confirm().unwrap();

        // A pure translation leaves the plane normal intact; the refresh ran
        // without corrupting the cache.
        assert_relative_eq!(store.polygon(p).normal, normal, epsilon = 1e-12);
    }
}
