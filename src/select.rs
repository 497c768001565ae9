//! Selection modes and the selection manager.
//!
//! The selection is an ordered, duplicate-free list of primitive references
//! plus a `selected` flag mirrored on each primitive in the store. Selecting
//! and deselecting propagate between vertices and edges so the selection
//! always settles at a fixed point before any operation reads it:
//!
//! - selecting a vertex (in vertex mode) auto-selects every edge whose two
//!   endpoints are now both selected;
//! - selecting an edge force-selects both of its endpoints;
//! - deselecting a vertex auto-deselects any selected edge that no longer has
//!   both endpoints selected — the edge only; its other endpoint stays
//!   selected;
//! - deselecting an edge directly force-deselects both of its endpoints.
//!
//! Propagation terminates because selecting only ever adds (and checks
//! membership first), and deselecting only ever removes.

use crate::history::Action;
use crate::mesh::{EdgeId, MeshStore, PolygonId, PrimitiveRef, VertexId};

/// Which primitive kind the user is working with.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default)]
pub enum SelectionMode {
    /// Pick and edit individual vertices.
    #[default]
    Vertex,
    /// Pick and edit edges.
    Edge,
    /// Pick and edit polygons.
    Face,
}

/// Owns the active selection set and the selection mode.
#[derive(Debug, Clone, Default)]
pub struct SelectionManager {
    mode: SelectionMode,
    selection: Vec<PrimitiveRef>,
    enabled: bool,
    /// Pre-drag state while a box select is in progress:
    /// (selection snapshot for the history action, additive base set).
    box_drag: Option<(Vec<PrimitiveRef>, Vec<PrimitiveRef>)>,
}

impl SelectionManager {
    /// Create an empty selection in vertex mode.
    pub fn new() -> Self {
        Self {
            enabled: true,
            ..Self::default()
        }
    }

    /// Current selection mode.
    #[inline]
    pub fn mode(&self) -> SelectionMode {
        self.mode
    }

    /// The active selection, in selection order.
    #[inline]
    pub fn selection(&self) -> &[PrimitiveRef] {
        &self.selection
    }

    /// Is this primitive in the selection?
    #[inline]
    pub fn contains(&self, prim: PrimitiveRef) -> bool {
        self.selection.contains(&prim)
    }

    /// Whether click selection is currently enabled. The hotkey translation
    /// modal disables it so its confirmation click is not also a pick.
    #[inline]
    pub fn is_enabled(&self) -> bool {
        self.enabled
    }

    /// Enable or disable click selection.
    pub fn set_enabled(&mut self, enabled: bool) {
        self.enabled = enabled;
    }

    /// Currently selected vertices, in selection order.
    pub fn selected_vertices(&self) -> Vec<VertexId> {
        self.selection
            .iter()
            .filter_map(|p| match p {
                PrimitiveRef::Vertex(v) => Some(*v),
                _ => None,
            })
            .collect()
    }

    /// Currently selected edges, in selection order.
    pub fn selected_edges(&self) -> Vec<EdgeId> {
        self.selection
            .iter()
            .filter_map(|p| match p {
                PrimitiveRef::Edge(e) => Some(*e),
                _ => None,
            })
            .collect()
    }

    /// Currently selected polygons, in selection order.
    pub fn selected_polygons(&self) -> Vec<PolygonId> {
        self.selection
            .iter()
            .filter_map(|p| match p {
                PrimitiveRef::Polygon(p) => Some(*p),
                _ => None,
            })
            .collect()
    }

    /// Add a primitive to the selection, with propagation.
    ///
    /// Idempotent: selecting an already-selected primitive is a no-op, which
    /// is also what bounds the propagation recursion.
    pub fn select(&mut self, store: &mut MeshStore, prim: PrimitiveRef) {
        if self.contains(prim) {
            return;
        }
        self.selection.push(prim);
        store.set_selected(prim, true);

        match prim {
            PrimitiveRef::Edge(e) => {
                let (a, b) = {
                    let edge = store.edge(e);
                    (edge.a, edge.b)
                };
                self.select(store, PrimitiveRef::Vertex(a));
                self.select(store, PrimitiveRef::Vertex(b));
            }
            PrimitiveRef::Vertex(v) => {
                if self.mode == SelectionMode::Vertex {
                    // Any edge whose endpoints are now both selected comes
                    // along for the ride.
                    let completed: Vec<EdgeId> = store
                        .edge_ids()
                        .filter(|&id| {
                            let edge = store.edge(id);
                            !edge.selected
                                && edge.contains(v)
                                && store.vertex(edge.other(v)).selected
                        })
                        .collect();
                    for id in completed {
                        self.select(store, PrimitiveRef::Edge(id));
                    }
                }
            }
            PrimitiveRef::Loop(_) | PrimitiveRef::Polygon(_) => {}
        }
    }

    /// Remove a primitive from the selection, with propagation.
    pub fn deselect(&mut self, store: &mut MeshStore, prim: PrimitiveRef) {
        if !self.contains(prim) {
            return;
        }
        self.selection.retain(|p| *p != prim);
        store.set_selected(prim, false);

        match prim {
            PrimitiveRef::Vertex(v) => {
                // Selected edges through this vertex no longer have both
                // endpoints selected. They drop out alone; cascading through
                // their other endpoint would unravel the whole connected
                // component.
                let broken: Vec<EdgeId> = store
                    .edge_ids()
                    .filter(|&id| {
                        let edge = store.edge(id);
                        edge.selected && edge.contains(v)
                    })
                    .collect();
                for id in broken {
                    self.remove_only(store, PrimitiveRef::Edge(id));
                }
            }
            PrimitiveRef::Edge(e) => {
                let (a, b) = {
                    let edge = store.edge(e);
                    (edge.a, edge.b)
                };
                self.deselect(store, PrimitiveRef::Vertex(a));
                self.deselect(store, PrimitiveRef::Vertex(b));
            }
            PrimitiveRef::Loop(_) | PrimitiveRef::Polygon(_) => {}
        }
    }

    /// Drop a primitive from the selection without propagating.
    fn remove_only(&mut self, store: &mut MeshStore, prim: PrimitiveRef) {
        if !self.contains(prim) {
            return;
        }
        self.selection.retain(|p| *p != prim);
        store.set_selected(prim, false);
    }

    /// Clear the selection. No propagation; flags are dropped directly.
    pub fn clear(&mut self, store: &mut MeshStore) {
        for prim in self.selection.drain(..) {
            store.set_selected(prim, false);
        }
    }

    /// Replace the selection: clear, then select each entry with full
    /// propagation.
    pub fn set_selection(&mut self, store: &mut MeshStore, prims: &[PrimitiveRef]) {
        self.clear(store);
        for &prim in prims {
            self.select(store, prim);
        }
    }

    /// Switch selection mode, converting the selection across the
    /// transition.
    ///
    /// Leaving vertex mode for edge mode drops "dangling" vertices that are
    /// not part of a fully selected edge. Leaving edge mode for vertex mode
    /// picks up any edge whose endpoints are both selected. The returned
    /// [`Action::ChangeMode`] combines the mode switch with the resulting
    /// selection delta.
    pub fn change_mode(&mut self, store: &mut MeshStore, next_mode: SelectionMode) -> Action {
        let previous_mode = self.mode;
        let previous = self.selection.clone();
        self.mode = next_mode;

        match (previous_mode, next_mode) {
            (SelectionMode::Vertex, SelectionMode::Edge) => {
                let dangling: Vec<VertexId> = self
                    .selected_vertices()
                    .into_iter()
                    .filter(|&v| {
                        !store
                            .edge_ids()
                            .any(|e| store.edge(e).selected && store.edge(e).contains(v))
                    })
                    .collect();
                for v in dangling {
                    self.deselect(store, PrimitiveRef::Vertex(v));
                }
            }
            (SelectionMode::Edge, SelectionMode::Vertex) => {
                let completed: Vec<EdgeId> = store
                    .edge_ids()
                    .filter(|&id| {
                        let edge = store.edge(id);
                        !edge.selected
                            && store.vertex(edge.a).selected
                            && store.vertex(edge.b).selected
                    })
                    .collect();
                for id in completed {
                    self.select(store, PrimitiveRef::Edge(id));
                }
            }
            _ => {}
        }

        Action::ChangeMode {
            previous_mode,
            next_mode,
            previous,
            next: self.selection.clone(),
        }
    }

    /// Restore a mode and selection from a history payload, without
    /// re-running the transition conversion.
    pub(crate) fn replay_mode(
        &mut self,
        store: &mut MeshStore,
        mode: SelectionMode,
        selection: &[PrimitiveRef],
    ) {
        self.mode = mode;
        self.set_selection(store, selection);
    }

    // --- Box select ---

    /// Begin a box-select drag.
    ///
    /// With `additive` set, primitives selected before the drag stay selected
    /// even when outside the box; otherwise the selection tracks the box
    /// contents exactly, frame by frame.
    pub fn begin_box_select(&mut self, additive: bool) {
        let snapshot = self.selection.clone();
        let base = if additive { snapshot.clone() } else { Vec::new() };
        self.box_drag = Some((snapshot, base));
    }

    /// Feed one frame's picking overlap into an in-progress box select.
    ///
    /// The selection is recomputed from scratch each frame (base set plus
    /// overlap, full propagation), never accumulated, so constraint artifacts
    /// cannot build up across frames.
    pub fn update_box_select(&mut self, store: &mut MeshStore, overlap: &[PrimitiveRef]) {
        let Some((_, base)) = &self.box_drag else {
            return;
        };
        let mut target = base.clone();
        for &prim in overlap {
            if !target.contains(&prim) {
                target.push(prim);
            }
        }
        self.set_selection(store, &target);
    }

    /// Finish a box-select drag, producing one combined selection action for
    /// the whole drag (or `None` if the selection ended unchanged).
    pub fn end_box_select(&mut self) -> Option<Action> {
        let (previous, _) = self.box_drag.take()?;
        if previous == self.selection {
            return None;
        }
        Some(Action::Select {
            previous,
            next: self.selection.clone(),
        })
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::mesh::MeshStore;

    fn quad_with_ids() -> (MeshStore, Vec<VertexId>, Vec<EdgeId>) {
        let store = MeshStore::quad();
        let verts = store.vertex_ids().collect();
        let edges = store.edge_ids().collect();
        (store, verts, edges)
    }

    #[test]
    fn test_selecting_both_endpoints_selects_edge() {
        let (mut store, verts, edges) = quad_with_ids();
        let mut sel = SelectionManager::new();

        sel.select(&mut store, PrimitiveRef::Vertex(verts[0]));
        assert!(!store.edge(edges[0]).selected);

        sel.select(&mut store, PrimitiveRef::Vertex(verts[1]));
        assert!(store.edge(edges[0]).selected);
        assert!(sel.contains(PrimitiveRef::Edge(edges[0])));
    }

    #[test]
    fn test_endpoint_order_does_not_matter() {
        let (mut store, verts, edges) = quad_with_ids();
        let mut sel = SelectionManager::new();

        sel.select(&mut store, PrimitiveRef::Vertex(verts[1]));
        sel.select(&mut store, PrimitiveRef::Vertex(verts[0]));
        assert!(sel.contains(PrimitiveRef::Edge(edges[0])));
    }

    #[test]
    fn test_selecting_edge_selects_endpoints() {
        let (mut store, verts, edges) = quad_with_ids();
        let mut sel = SelectionManager::new();

        sel.select(&mut store, PrimitiveRef::Edge(edges[0]));
        assert!(store.vertex(verts[0]).selected);
        assert!(store.vertex(verts[1]).selected);
    }

    #[test]
    fn test_deselecting_endpoint_deselects_edge() {
        let (mut store, verts, edges) = quad_with_ids();
        let mut sel = SelectionManager::new();

        sel.select(&mut store, PrimitiveRef::Vertex(verts[0]));
        sel.select(&mut store, PrimitiveRef::Vertex(verts[1]));
        assert!(store.edge(edges[0]).selected);

        sel.deselect(&mut store, PrimitiveRef::Vertex(verts[0]));
        assert!(!store.edge(edges[0]).selected);
        assert!(store.vertex(verts[1]).selected);
    }

    #[test]
    fn test_deselect_vertex_spares_rest_of_component() {
        // Fully select the quad outline: 4 vertices and 4 edges. Dropping
        // one vertex must take only that vertex and its two edges, not
        // unravel the component edge by edge.
        let (mut store, verts, edges) = quad_with_ids();
        let mut sel = SelectionManager::new();
        for &v in &verts {
            sel.select(&mut store, PrimitiveRef::Vertex(v));
        }
        assert_eq!(sel.selection().len(), 8);

        sel.deselect(&mut store, PrimitiveRef::Vertex(verts[0]));
        // v0 and its edges e0, e3 are gone; v1, v2, v3 and e1, e2 stay.
        assert_eq!(sel.selection().len(), 5);
        assert!(store.vertex(verts[1]).selected);
        assert!(store.vertex(verts[2]).selected);
        assert!(store.vertex(verts[3]).selected);
        assert!(!store.edge(edges[0]).selected);
        assert!(store.edge(edges[1]).selected);
        assert!(store.edge(edges[2]).selected);
        assert!(!store.edge(edges[3]).selected);
    }

    #[test]
    fn test_deselect_edge_directly_drops_endpoints() {
        let (mut store, verts, edges) = quad_with_ids();
        let mut sel = SelectionManager::new();
        sel.select(&mut store, PrimitiveRef::Edge(edges[0]));

        sel.deselect(&mut store, PrimitiveRef::Edge(edges[0]));
        assert!(sel.selection().is_empty());
        assert!(!store.vertex(verts[0]).selected);
        assert!(!store.vertex(verts[1]).selected);
    }

    #[test]
    fn test_select_is_idempotent() {
        let (mut store, verts, _) = quad_with_ids();
        let mut sel = SelectionManager::new();

        sel.select(&mut store, PrimitiveRef::Vertex(verts[0]));
        sel.select(&mut store, PrimitiveRef::Vertex(verts[0]));
        assert_eq!(sel.selection().len(), 1);
    }

    #[test]
    fn test_change_mode_drops_dangling_vertices() {
        use nalgebra::Point3;
        let (mut store, verts, edges) = quad_with_ids();
        // A lone vertex with no edges at all.
        let lone = store.add_vertex(Point3::new(5.0, 5.0, 5.0));
        let mut sel = SelectionManager::new();

        sel.select(&mut store, PrimitiveRef::Vertex(verts[0]));
        sel.select(&mut store, PrimitiveRef::Vertex(verts[1]));
        sel.select(&mut store, PrimitiveRef::Vertex(lone));
        assert!(store.edge(edges[0]).selected);

        let action = sel.change_mode(&mut store, SelectionMode::Edge);
        // The lone vertex had no selected edge, so it was dropped; the full
        // edge and its endpoints survive.
        assert!(!store.vertex(lone).selected);
        assert!(store.edge(edges[0]).selected);
        assert!(store.vertex(verts[0]).selected);
        match action {
            Action::ChangeMode {
                previous_mode,
                next_mode,
                previous,
                next,
            } => {
                assert_eq!(previous_mode, SelectionMode::Vertex);
                assert_eq!(next_mode, SelectionMode::Edge);
                assert!(previous.contains(&PrimitiveRef::Vertex(lone)));
                assert!(!next.contains(&PrimitiveRef::Vertex(lone)));
            }
            other => panic!("unexpected action {:?}", other),
        }
    }

    #[test]
    fn test_change_mode_to_vertex_completes_edges() {
        let (mut store, verts, edges) = quad_with_ids();
        let mut sel = SelectionManager::new();
        // In edge mode, endpoint selection does not cascade to edges.
        sel.change_mode(&mut store, SelectionMode::Edge);
        sel.select(&mut store, PrimitiveRef::Vertex(verts[0]));
        sel.select(&mut store, PrimitiveRef::Vertex(verts[1]));
        assert!(!store.edge(edges[0]).selected);

        sel.change_mode(&mut store, SelectionMode::Vertex);
        assert!(store.edge(edges[0]).selected);
    }

    #[test]
    fn test_box_select_additive_keeps_outsiders() {
        let (mut store, verts, _) = quad_with_ids();
        let mut sel = SelectionManager::new();

        sel.select(&mut store, PrimitiveRef::Vertex(verts[3]));
        sel.begin_box_select(true);
        sel.update_box_select(&mut store, &[PrimitiveRef::Vertex(verts[0])]);
        assert!(store.vertex(verts[3]).selected);
        assert!(store.vertex(verts[0]).selected);

        // A later frame with a smaller box: the pre-drag selection stays.
        sel.update_box_select(&mut store, &[]);
        assert!(store.vertex(verts[3]).selected);
        assert!(!store.vertex(verts[0]).selected);
        assert!(sel.end_box_select().is_none());
    }

    #[test]
    fn test_box_select_replaces_without_modifier() {
        let (mut store, verts, _) = quad_with_ids();
        let mut sel = SelectionManager::new();

        sel.select(&mut store, PrimitiveRef::Vertex(verts[3]));
        sel.begin_box_select(false);
        sel.update_box_select(&mut store, &[PrimitiveRef::Vertex(verts[0])]);
        assert!(!store.vertex(verts[3]).selected);
        assert!(store.vertex(verts[0]).selected);

        let action = sel.end_box_select().unwrap();
        match action {
            Action::Select { previous, next } => {
                assert_eq!(previous, vec![PrimitiveRef::Vertex(verts[3])]);
                assert_eq!(next, vec![PrimitiveRef::Vertex(verts[0])]);
            }
            other => panic!("unexpected action {:?}", other),
        }
    }
}
