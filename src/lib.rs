//! # Burin
//!
//! An interactive boundary-representation mesh editing core.
//!
//! Burin owns the data and logic of a polygonal mesh editor: the primitive
//! store, the mode-aware selection, the edit operations, and a full
//! command-pattern undo/redo log. It deliberately owns nothing else; a host
//! application supplies a camera, input events, and rendering, and talks to
//! the [`Editor`](editor::Editor) facade.
//!
//! ## Features
//!
//! - **Typed primitive store**: vertices, edges, loops, and polygons in
//!   tombstoning arenas with stable, type-safe handles
//! - **Propagating selection**: vertex/edge/face modes with automatic
//!   selection propagation between vertices and edges
//! - **Edit operations**: cascading deletion, deep-copy duplication,
//!   edge/polygon formation, and constrained translation drags
//! - **Undo/redo**: every operation is one replayable action
//! - **Picking**: ray and region picking behind a renderer-agnostic trait
//!
//! ## Quick Start
//!
//! ```
//! use burin::prelude::*;
//!
//! // The editor starts from a quad outline: four vertices, four edges.
//! let mut editor = Editor::new();
//! let verts: Vec<VertexId> = editor.store().vertex_ids().collect();
//!
//! // Shift-click every corner, switch to edge mode, and form a face.
//! for (i, &v) in verts.iter().enumerate() {
//!     editor.click_select(Some(PrimitiveRef::Vertex(v)), i > 0);
//! }
//! editor.set_mode(SelectionMode::Edge);
//! editor.form();
//! assert_eq!(editor.store().num_polygons(), 1);
//!
//! // Everything is undoable.
//! editor.undo();
//! assert_eq!(editor.store().num_polygons(), 0);
//! ```
//!
//! ## Driving the editor from input
//!
//! Pointer events go through a [`Picker`](pick::Picker):
//!
//! ```
//! use burin::prelude::*;
//! use nalgebra::{Matrix4, Point3, Vector3};
//!
//! let mut editor = Editor::with_store(MeshStore::cube());
//! let picker = FrustumPicker::new(Matrix4::identity());
//!
//! editor.set_mode(SelectionMode::Face);
//! let ray = Ray::new(Point3::new(0.1, 0.1, 5.0), Vector3::new(0.0, 0.0, -1.0));
//! let hit = picker.raycast_nearest(editor.store(), &ray, editor.mode());
//! editor.click_select(hit, false);
//! assert_eq!(editor.selection().selected_polygons().len(), 1);
//! ```

#![warn(missing_docs)]
#![warn(clippy::all)]

pub mod editor;
pub mod error;
pub mod history;
pub mod mesh;
pub mod ops;
pub mod pick;
pub mod select;

/// Prelude module for convenient imports.
///
/// This module re-exports the most commonly used types and functions:
///
/// ```
/// use burin::prelude::*;
/// ```
pub mod prelude {
    pub use crate::editor::Editor;
    pub use crate::error::{EditError, Result};
    pub use crate::history::{Action, HistoryStack, PrimitiveRecord};
    pub use crate::mesh::{EdgeId, Loop, MeshStore, PolygonId, PrimitiveRef, VertexId};
    pub use crate::ops::translate::{Axis, AxisConstraint};
    pub use crate::pick::{FrustumPicker, Picker, Ray, ScreenRect};
    pub use crate::select::{SelectionManager, SelectionMode};
}

// Re-export nalgebra types for convenience
pub use nalgebra;
