//! The editor facade.
//!
//! [`Editor`] owns the mesh store, the selection, the history, and the
//! translation state machine, and exposes the operations a host binds its
//! input to. Hosts stay thin: they turn pointer and key events into calls
//! here (usually through a [`Picker`](crate::pick::Picker) for the pointer
//! ones) and render whatever the store contains.
//!
//! Undo and redo re-enter through [`Editor::undo`] and [`Editor::redo`],
//! which dispatch each action kind back to the component that owns the state
//! it touches. The dispatch match is exhaustive on purpose: adding an action
//! kind without teaching replay about it must not compile.

use nalgebra::Point3;
use tracing::debug;

use crate::history::{Action, HistoryStack};
use crate::mesh::{MeshStore, PrimitiveRef};
use crate::ops;
use crate::ops::duplicate::PendingDuplicate;
use crate::ops::translate::{AxisConstraint, Translation};
use crate::select::{SelectionManager, SelectionMode};

/// Owns all editing state and drives the edit operations.
#[derive(Debug)]
pub struct Editor {
    store: MeshStore,
    selection: SelectionManager,
    history: HistoryStack,
    translation: Translation,
    /// A duplication whose history push is deferred until the follow-up
    /// translation modal ends.
    pending_duplicate: Option<PendingDuplicate>,
}

impl Default for Editor {
    fn default() -> Self {
        Self::new()
    }
}

impl Editor {
    /// Create an editor seeded with the starting quad outline.
    pub fn new() -> Self {
        Self::with_store(MeshStore::quad())
    }

    /// Create an editor over an existing mesh.
    pub fn with_store(store: MeshStore) -> Self {
        Self {
            store,
            selection: SelectionManager::new(),
            history: HistoryStack::new(),
            translation: Translation::new(),
            pending_duplicate: None,
        }
    }

    /// The mesh being edited.
    #[inline]
    pub fn store(&self) -> &MeshStore {
        &self.store
    }

    /// The active selection.
    #[inline]
    pub fn selection(&self) -> &SelectionManager {
        &self.selection
    }

    /// The translation state, for gizmo placement.
    #[inline]
    pub fn translation(&self) -> &Translation {
        &self.translation
    }

    /// Current selection mode.
    #[inline]
    pub fn mode(&self) -> SelectionMode {
        self.selection.mode()
    }

    /// Depth of the undo stack.
    pub fn undo_depth(&self) -> usize {
        self.history.undo_depth()
    }

    /// Depth of the redo stack.
    pub fn redo_depth(&self) -> usize {
        self.history.redo_depth()
    }

    // --- Selection ---

    /// Handle a pick click.
    ///
    /// A plain click replaces the selection with the hit (or clears it on a
    /// miss); an additive click toggles the hit and leaves the rest alone.
    /// Ignored while selection is disabled, which is how the hotkey
    /// translation modal keeps its confirmation click from also picking.
    pub fn click_select(&mut self, hit: Option<PrimitiveRef>, additive: bool) {
        if !self.selection.is_enabled() {
            return;
        }
        let previous = self.selection.selection().to_vec();

        match hit {
            Some(prim) if additive => {
                if self.selection.contains(prim) {
                    self.selection.deselect(&mut self.store, prim);
                } else {
                    self.selection.select(&mut self.store, prim);
                }
            }
            Some(prim) => {
                self.selection.set_selection(&mut self.store, &[prim]);
            }
            None if !additive => {
                self.selection.clear(&mut self.store);
            }
            None => {}
        }

        let next = self.selection.selection().to_vec();
        if next != previous {
            self.history.push(Action::Select { previous, next });
            self.translation.sync_to_selection(&self.store, &self.selection);
        }
    }

    /// Begin a box-select drag.
    pub fn begin_box_select(&mut self, additive: bool) {
        if !self.selection.is_enabled() {
            return;
        }
        self.selection.begin_box_select(additive);
    }

    /// Feed one frame's region overlap into an in-progress box select.
    pub fn update_box_select(&mut self, overlap: &[PrimitiveRef]) {
        self.selection.update_box_select(&mut self.store, overlap);
    }

    /// Finish a box-select drag, recording one combined action for the whole
    /// drag.
    pub fn end_box_select(&mut self) {
        if let Some(action) = self.selection.end_box_select() {
            self.history.push(action);
            self.translation.sync_to_selection(&self.store, &self.selection);
        }
    }

    /// Switch selection mode, converting the selection and recording the
    /// combined switch.
    pub fn set_mode(&mut self, mode: SelectionMode) {
        if mode == self.selection.mode() {
            return;
        }
        let action = self.selection.change_mode(&mut self.store, mode);
        self.history.push(action);
        self.translation.sync_to_selection(&self.store, &self.selection);
    }

    // --- Edit operations ---

    /// Delete the selection with cascade.
    pub fn delete(&mut self) {
        if let Some(action) = ops::delete::delete(&mut self.store, &mut self.selection) {
            self.history.push(action);
            self.translation.sync_to_selection(&self.store, &self.selection);
        }
    }

    /// Duplicate the selection.
    ///
    /// The duplicates become the selection; the history push is deferred
    /// until the follow-up translation modal ends (confirmed *or* canceled:
    /// the duplicates exist either way). Hosts typically call
    /// [`Editor::begin_translate_hotkey`] right after this. If the modal is
    /// never entered, [`Editor::undo`] and [`Editor::redo`] record the
    /// duplication before touching the rest of the history.
    pub fn duplicate(&mut self) {
        if self.pending_duplicate.is_some() {
            return;
        }
        self.pending_duplicate = ops::duplicate::duplicate(&mut self.store, &mut self.selection);
    }

    /// Form new primitives (an edge or polygons) from the selection.
    pub fn form(&mut self) {
        if let Some(action) = ops::formation::form(&mut self.store, &mut self.selection) {
            self.history.push(action);
            self.translation.sync_to_selection(&self.store, &self.selection);
        }
    }

    // --- Translation ---

    /// Begin a gizmo drag over the selection.
    pub fn begin_gizmo_drag(&mut self) {
        self.translation.begin_drag(&self.store, &self.selection);
    }

    /// Drag the gizmo to a world-space target.
    pub fn drag_gizmo(&mut self, target: Point3<f64>) {
        self.translation.drag_to(&mut self.store, target);
    }

    /// Finish a gizmo drag.
    pub fn end_gizmo_drag(&mut self) {
        self.finish_translation();
    }

    /// Enter the hotkey grab modal.
    ///
    /// Click selection is disabled for the duration so the confirming click
    /// does not double as a pick.
    pub fn begin_translate_hotkey(&mut self, cursor: Point3<f64>) {
        self.translation.sync_to_selection(&self.store, &self.selection);
        self.translation.begin_hotkey(&self.store, &self.selection, cursor);
        if self.translation.is_active() {
            self.selection.set_enabled(false);
        }
    }

    /// Feed a cursor position into the hotkey modal.
    pub fn update_translate(&mut self, cursor: Point3<f64>) {
        self.translation.update_hotkey(&mut self.store, cursor);
    }

    /// Constrain the in-progress drag to an axis or plane.
    pub fn set_axis_constraint(&mut self, constraint: AxisConstraint) {
        self.translation.set_constraint(&mut self.store, constraint);
    }

    /// Confirm the in-progress drag, recording it.
    pub fn confirm_translation(&mut self) {
        self.finish_translation();
    }

    /// Abort the in-progress drag, restoring start positions exactly.
    ///
    /// A pending duplication is still recorded: cancel undoes the movement,
    /// not the copies.
    pub fn cancel_translation(&mut self) {
        self.translation.cancel(&mut self.store);
        self.selection.set_enabled(true);
        self.push_pending_duplicate();
    }

    fn finish_translation(&mut self) {
        let delta = self.translation.confirm();
        self.selection.set_enabled(true);
        if self.pending_duplicate.is_some() {
            // The duplicate entry subsumes the drag; undoing it removes the
            // copies wherever they ended up.
            self.push_pending_duplicate();
        } else if let Some(delta) = delta {
            self.history.push(Action::Translate { delta });
        }
    }

    fn push_pending_duplicate(&mut self) {
        if let Some(pending) = self.pending_duplicate.take() {
            self.history.push(Action::Duplicate {
                records: pending.records,
                previous: pending.previous,
            });
        }
    }

    // --- History ---

    /// Undo the most recent action.
    ///
    /// A duplication still awaiting its translation modal is recorded first,
    /// so the undo removes the duplicates rather than unwinding past them.
    pub fn undo(&mut self) {
        self.push_pending_duplicate();
        if let Some(action) = self.history.undo() {
            debug!(?action, "undo");
            self.dispatch(&action, true);
            self.translation.sync_to_selection(&self.store, &self.selection);
        }
    }

    /// Redo the most recently undone action.
    ///
    /// A duplication still awaiting its translation modal is recorded first;
    /// since recording forks history, the redo itself then has nothing to
    /// replay.
    pub fn redo(&mut self) {
        self.push_pending_duplicate();
        if let Some(action) = self.history.redo() {
            debug!(?action, "redo");
            self.dispatch(&action, false);
            self.translation.sync_to_selection(&self.store, &self.selection);
        }
    }

    fn dispatch(&mut self, action: &Action, is_undo: bool) {
        match action {
            Action::Select { previous, next } => {
                let target = if is_undo { previous } else { next };
                self.selection.set_selection(&mut self.store, target);
            }
            Action::ChangeMode {
                previous_mode,
                next_mode,
                previous,
                next,
            } => {
                if is_undo {
                    self.selection.replay_mode(&mut self.store, *previous_mode, previous);
                } else {
                    self.selection.replay_mode(&mut self.store, *next_mode, next);
                }
            }
            Action::Translate { delta } => {
                ops::translate::replay(&mut self.store, &self.selection, *delta, is_undo);
            }
            Action::Delete { records, previous } => {
                ops::delete::replay(&mut self.store, &mut self.selection, records, previous, is_undo);
            }
            Action::Duplicate { records, previous } => {
                ops::duplicate::replay(&mut self.store, &mut self.selection, records, previous, is_undo);
            }
            Action::Formation { records, previous } => {
                ops::formation::replay(&mut self.store, &mut self.selection, records, previous, is_undo);
            }
        }
    }
}
