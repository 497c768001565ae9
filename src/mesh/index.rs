//! Index types for mesh primitives.
//!
//! This module provides type-safe handles for vertices, edges, and polygons.
//! Handles are stable for the lifetime of a [`MeshStore`](super::MeshStore):
//! removing a primitive tombstones its slot rather than shifting later
//! entries, so a handle captured inside a history action can always be
//! restored. Loops are the exception; they are addressed positionally by the
//! polygon that owns them and have no stable handle.

use std::fmt::{self, Debug};

/// A type-safe vertex handle.
#[derive(Copy, Clone, Eq, PartialEq, Ord, PartialOrd, Hash)]
#[repr(transparent)]
pub struct VertexId(u32);

/// A type-safe edge handle.
#[derive(Copy, Clone, Eq, PartialEq, Ord, PartialOrd, Hash)]
#[repr(transparent)]
pub struct EdgeId(u32);

/// A type-safe polygon handle.
#[derive(Copy, Clone, Eq, PartialEq, Ord, PartialOrd, Hash)]
#[repr(transparent)]
pub struct PolygonId(u32);

macro_rules! impl_id_type {
    ($name:ident, $display:literal) => {
        impl $name {
            /// Create a new handle from a raw slot index.
            #[inline]
            pub fn new(index: usize) -> Self {
                debug_assert!(index <= u32::MAX as usize, "index {} too large", index);
                Self(index as u32)
            }

            /// Get the raw slot index.
            #[inline]
            pub fn index(self) -> usize {
                self.0 as usize
            }
        }

        impl Debug for $name {
            fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
                write!(f, "{}({})", $display, self.0)
            }
        }

        impl From<usize> for $name {
            fn from(v: usize) -> Self {
                Self::new(v)
            }
        }
    };
}

impl_id_type!(VertexId, "V");
impl_id_type!(EdgeId, "E");
impl_id_type!(PolygonId, "P");

/// A reference to any mesh primitive.
///
/// This is the closed sum over the four primitive kinds. Every dispatch site
/// in the crate matches it exhaustively, so adding a primitive kind is a
/// compile-time event rather than a silently incomplete `switch`.
///
/// The `Loop` variant carries a positional index into the loop collection and
/// is only meaningful transiently (loop positions shift when polygons are
/// removed); selection and history payloads identify loops through their
/// owning polygon instead.
#[derive(Copy, Clone, Eq, PartialEq, Hash, Debug)]
pub enum PrimitiveRef {
    /// A vertex.
    Vertex(VertexId),
    /// An edge.
    Edge(EdgeId),
    /// A boundary loop, by current position in the loop collection.
    Loop(usize),
    /// A polygon.
    Polygon(PolygonId),
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_handle_round_trip() {
        let v = VertexId::new(42);
        assert_eq!(v.index(), 42);
        assert_eq!(format!("{:?}", v), "V(42)");
    }

    #[test]
    fn test_type_safety() {
        // Same raw value, distinct types.
        let v = VertexId::new(0);
        let e = EdgeId::new(0);
        let p = PolygonId::new(0);
        assert_eq!(v.index(), e.index());
        assert_eq!(e.index(), p.index());
    }

    #[test]
    fn test_primitive_ref_equality() {
        let a = PrimitiveRef::Vertex(VertexId::new(1));
        let b = PrimitiveRef::Vertex(VertexId::new(1));
        let c = PrimitiveRef::Edge(EdgeId::new(1));
        assert_eq!(a, b);
        assert_ne!(a, c);
    }
}
