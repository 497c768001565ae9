//! Error types for burin.
//!
//! The editing kernel is designed to degrade rather than fail: the only
//! runtime errors it produces come from polygon geometry that cannot be
//! triangulated. Operations catch these at their boundary, log them, and
//! leave the polygon's previous triangulation in place.

use thiserror::Error;

/// Result type alias using [`EditError`].
pub type Result<T> = std::result::Result<T, EditError>;

/// Errors that can occur while refreshing polygon geometry.
#[derive(Error, Debug, Clone, PartialEq, Eq)]
pub enum EditError {
    /// A polygon has fewer than three boundary loops.
    #[error("polygon has only {loops} loops, at least 3 are required")]
    DegeneratePolygon {
        /// Number of loops the polygon actually has.
        loops: usize,
    },

    /// Ear clipping could not find an ear, which happens for degenerate or
    /// self-intersecting boundaries.
    #[error("no ear found while triangulating, {remaining} boundary vertices remain")]
    NoEarFound {
        /// Number of boundary vertices still unclipped.
        remaining: usize,
    },

    /// The boundary is collinear or coincident, so no plane normal exists.
    #[error("polygon normal is undefined (collinear or coincident boundary)")]
    UndefinedNormal,
}
