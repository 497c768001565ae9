//! Core mesh data structures.
//!
//! This module provides the boundary-representation primitive store and the
//! geometry helpers that keep its cached data consistent.
//!
//! # Overview
//!
//! The primary type is [`MeshStore`], which owns four primitive collections:
//! vertices, edges, loops, and polygons. Vertices, edges, and polygons are
//! identified by stable typed handles ([`VertexId`], [`EdgeId`],
//! [`PolygonId`]); loops are owned positionally by their polygon as a
//! contiguous `(loop_start, num_loops)` range.
//!
//! # Construction
//!
//! Stores are usually seeded from a starter shape and then edited:
//!
//! ```
//! use burin::mesh::MeshStore;
//!
//! let quad = MeshStore::quad();
//! assert_eq!(quad.num_vertices(), 4);
//! assert_eq!(quad.num_edges(), 4);
//!
//! let cube = MeshStore::cube();
//! assert_eq!(cube.num_edges(), 12);
//! ```

pub mod geometry;
mod index;
mod store;

pub use index::{EdgeId, PolygonId, PrimitiveRef, VertexId};
pub use store::{Edge, Loop, MeshStore, Polygon, Vertex};
