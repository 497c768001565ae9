//! Arena-based primitive store.
//!
//! All mesh primitives live in the [`MeshStore`] and reference each other
//! through typed handles ([`VertexId`], [`EdgeId`], [`PolygonId`]). This
//! avoids `Rc`/`RefCell` cycles in the inherently cross-referential topology
//! graph: an edge points at two vertices, a loop points at a vertex and an
//! edge, and a polygon owns a contiguous range of the loop collection.
//!
//! # Tombstoning
//!
//! Vertices, edges, and polygons are stored in `Vec<Option<T>>` arenas.
//! Removal vacates the slot and *never reuses it*, so every handle handed out
//! stays unambiguous for the lifetime of the store. This is what lets history
//! actions hold raw handles: undoing a deletion restores the primitive into
//! exactly the slot it came from, and no later addition can have collided
//! with it.
//!
//! # Loop compaction
//!
//! Loops are different: a polygon addresses its boundary as
//! `(loop_start, num_loops)` into one dense `Vec<Loop>`. Removing a polygon
//! drains its range and shifts the `loop_start` of every polygon behind it,
//! atomically. Skipping the shift would corrupt every subsequent polygon's
//! range, so both steps live in [`MeshStore::remove_polygon`] and nowhere
//! else.

use nalgebra::{Point3, Vector3};
use tracing::warn;

use super::geometry;
use super::index::{EdgeId, PolygonId, PrimitiveRef, VertexId};
use crate::error::Result;

/// A mesh vertex: a position and a selection flag.
#[derive(Debug, Clone)]
pub struct Vertex {
    /// The 3D position of this vertex.
    pub position: Point3<f64>,
    /// Whether this vertex is currently selected.
    pub selected: bool,
}

impl Vertex {
    /// Create an unselected vertex at the given position.
    pub fn new(position: Point3<f64>) -> Self {
        Self {
            position,
            selected: false,
        }
    }
}

/// An edge between two vertices.
///
/// The endpoint order is storage order only; edges are undirected for lookup
/// purposes (see [`Edge::matches`]).
#[derive(Debug, Clone)]
pub struct Edge {
    /// First endpoint.
    pub a: VertexId,
    /// Second endpoint.
    pub b: VertexId,
    /// Whether this edge is currently selected.
    pub selected: bool,
}

impl Edge {
    /// Create an unselected edge between two vertices.
    pub fn new(a: VertexId, b: VertexId) -> Self {
        Self {
            a,
            b,
            selected: false,
        }
    }

    /// Does this edge have `v` as an endpoint?
    #[inline]
    pub fn contains(&self, v: VertexId) -> bool {
        self.a == v || self.b == v
    }

    /// Does this edge connect `a` and `b`, in either order?
    #[inline]
    pub fn matches(&self, a: VertexId, b: VertexId) -> bool {
        (self.a == a && self.b == b) || (self.a == b && self.b == a)
    }

    /// The endpoint that is not `v`.
    ///
    /// Returns `a` when `v` is not an endpoint at all; callers are expected
    /// to have checked [`Edge::contains`] first.
    #[inline]
    pub fn other(&self, v: VertexId) -> VertexId {
        if self.a == v {
            self.b
        } else {
            self.a
        }
    }
}

/// One directed traversal step of a polygon boundary: a start vertex and the
/// edge leading to the next loop's start vertex.
#[derive(Debug, Clone, Copy)]
pub struct Loop {
    /// The vertex this step starts from.
    pub start: VertexId,
    /// The edge connecting `start` to the next loop's start vertex.
    pub edge: EdgeId,
}

/// A polygon: a contiguous loop range, a cached plane normal, and a cached
/// triangle fan.
#[derive(Debug, Clone)]
pub struct Polygon {
    /// Index of this polygon's first loop in the store's loop collection.
    pub loop_start: usize,
    /// Number of loops (boundary vertices) this polygon owns.
    pub num_loops: usize,
    /// Cached unit normal; refreshed by [`MeshStore::refresh_polygon`].
    pub normal: Vector3<f64>,
    /// Cached triangle fan as loop-start vertices, three per triangle.
    pub triangles: Vec<VertexId>,
    /// Whether this polygon is currently selected.
    pub selected: bool,
}

/// Arena storage for all mesh primitives.
#[derive(Debug, Clone, Default)]
pub struct MeshStore {
    vertices: Vec<Option<Vertex>>,
    edges: Vec<Option<Edge>>,
    loops: Vec<Loop>,
    polygons: Vec<Option<Polygon>>,
}

impl MeshStore {
    /// Create an empty store.
    pub fn new() -> Self {
        Self::default()
    }

    /// Seed shape: a unit quad outline in the x-y plane.
    ///
    /// Four vertices and four boundary edges, no polygon. This is the shape
    /// the editor starts from.
    pub fn quad() -> Self {
        let mut store = Self::new();
        let v0 = store.add_vertex(Point3::new(-0.5, -0.5, 0.0));
        let v1 = store.add_vertex(Point3::new(0.5, -0.5, 0.0));
        let v2 = store.add_vertex(Point3::new(0.5, 0.5, 0.0));
        let v3 = store.add_vertex(Point3::new(-0.5, 0.5, 0.0));
        store.add_edge(v0, v1);
        store.add_edge(v1, v2);
        store.add_edge(v2, v3);
        store.add_edge(v3, v0);
        store
    }

    /// Seed shape: a unit cube.
    ///
    /// Eight vertices, twelve edges, and six quads. Faces are built through
    /// [`MeshStore::add_quad_face`], so adjacent faces share their edges
    /// rather than duplicating them.
    pub fn cube() -> Self {
        let mut store = Self::new();
        let p = |x: f64, y: f64, z: f64| Point3::new(x, y, z);
        let v = [
            store.add_vertex(p(-0.5, -0.5, -0.5)),
            store.add_vertex(p(0.5, -0.5, -0.5)),
            store.add_vertex(p(0.5, 0.5, -0.5)),
            store.add_vertex(p(-0.5, 0.5, -0.5)),
            store.add_vertex(p(-0.5, -0.5, 0.5)),
            store.add_vertex(p(0.5, -0.5, 0.5)),
            store.add_vertex(p(0.5, 0.5, 0.5)),
            store.add_vertex(p(-0.5, 0.5, 0.5)),
        ];
        // Counter-clockwise from outside, so cached normals point outward.
        let faces = [
            [v[0], v[3], v[2], v[1]], // back
            [v[4], v[5], v[6], v[7]], // front
            [v[0], v[1], v[5], v[4]], // bottom
            [v[3], v[7], v[6], v[2]], // top
            [v[0], v[4], v[7], v[3]], // left
            [v[1], v[2], v[6], v[5]], // right
        ];
        for face in faces {
            if let Err(err) = store.add_quad_face(&face) {
                warn!(%err, "cube seed face failed to triangulate");
            }
        }
        store
    }

    // --- Add primitives ---

    /// Append a vertex and return its handle.
    pub fn add_vertex(&mut self, position: Point3<f64>) -> VertexId {
        let id = VertexId::new(self.vertices.len());
        self.vertices.push(Some(Vertex::new(position)));
        id
    }

    /// Append an edge and return its handle.
    pub fn add_edge(&mut self, a: VertexId, b: VertexId) -> EdgeId {
        let id = EdgeId::new(self.edges.len());
        self.edges.push(Some(Edge::new(a, b)));
        id
    }

    /// Return the edge connecting `a` and `b` in either order, creating it if
    /// none exists.
    ///
    /// This is what keeps adjacent faces sharing edges instead of stacking
    /// duplicates.
    pub fn find_or_create_edge(&mut self, a: VertexId, b: VertexId) -> EdgeId {
        match self.find_edge(a, b) {
            Some(id) => id,
            None => self.add_edge(a, b),
        }
    }

    /// Find the edge connecting `a` and `b` in either order.
    pub fn find_edge(&self, a: VertexId, b: VertexId) -> Option<EdgeId> {
        self.edge_ids().find(|&id| self.edge(id).matches(a, b))
    }

    /// Append a loop to the end of the loop collection and return its
    /// position.
    pub fn append_loop(&mut self, l: Loop) -> usize {
        self.loops.push(l);
        self.loops.len() - 1
    }

    /// Add a polygon over an already-appended contiguous loop range.
    ///
    /// The caller must have appended exactly `num_loops` loops starting at
    /// `loop_start`, not owned by any other polygon. The cached normal and
    /// fan start empty; call [`MeshStore::refresh_polygon`].
    pub fn add_polygon(&mut self, loop_start: usize, num_loops: usize) -> PolygonId {
        debug_assert!(loop_start + num_loops <= self.loops.len());
        let id = PolygonId::new(self.polygons.len());
        self.polygons.push(Some(Polygon {
            loop_start,
            num_loops,
            normal: Vector3::zeros(),
            triangles: Vec::new(),
            selected: false,
        }));
        id
    }

    /// Build one quad face over four vertices, sharing edges with any
    /// existing faces, and refresh its normal and triangulation.
    pub fn add_quad_face(&mut self, corners: &[VertexId; 4]) -> Result<PolygonId> {
        let loop_start = self.loops.len();
        for i in 0..4 {
            let a = corners[i];
            let b = corners[(i + 1) % 4];
            let edge = self.find_or_create_edge(a, b);
            self.append_loop(Loop { start: a, edge });
        }
        let id = self.add_polygon(loop_start, 4);
        self.refresh_polygon(id)?;
        Ok(id)
    }

    // --- Remove / restore primitives ---

    /// Tombstone a vertex, returning its data for a history record.
    pub fn remove_vertex(&mut self, id: VertexId) -> Vertex {
        self.vertices[id.index()]
            .take()
            .expect("remove_vertex: stale handle")
    }

    /// Tombstone an edge, returning its data for a history record.
    pub fn remove_edge(&mut self, id: EdgeId) -> Edge {
        self.edges[id.index()]
            .take()
            .expect("remove_edge: stale handle")
    }

    /// Remove a polygon and compact the loop collection.
    ///
    /// Drains the polygon's loop range and shifts the `loop_start` of every
    /// polygon with a later range down by the drained length. These two steps
    /// are inseparable; doing one without the other corrupts every subsequent
    /// polygon.
    pub fn remove_polygon(&mut self, id: PolygonId) -> (Polygon, Vec<Loop>) {
        let poly = self.polygons[id.index()]
            .take()
            .expect("remove_polygon: stale handle");
        let drained: Vec<Loop> = self
            .loops
            .drain(poly.loop_start..poly.loop_start + poly.num_loops)
            .collect();
        for slot in &mut self.polygons {
            if let Some(other) = slot {
                if other.loop_start > poly.loop_start {
                    other.loop_start -= poly.num_loops;
                }
            }
        }
        (poly, drained)
    }

    /// Reoccupy a tombstoned vertex slot.
    pub fn restore_vertex(&mut self, id: VertexId, position: Point3<f64>) {
        let slot = &mut self.vertices[id.index()];
        debug_assert!(slot.is_none(), "restore_vertex: slot occupied");
        *slot = Some(Vertex::new(position));
    }

    /// Reoccupy a tombstoned edge slot.
    pub fn restore_edge(&mut self, id: EdgeId, a: VertexId, b: VertexId) {
        let slot = &mut self.edges[id.index()];
        debug_assert!(slot.is_none(), "restore_edge: slot occupied");
        *slot = Some(Edge::new(a, b));
    }

    /// Reoccupy a tombstoned polygon slot, with its loop range starting at
    /// the current end of the loop collection.
    ///
    /// The caller appends the polygon's loops immediately afterwards. A
    /// restored polygon keeps its topology but not its original loop
    /// position; restore is append-position by design.
    pub fn restore_polygon(
        &mut self,
        id: PolygonId,
        num_loops: usize,
        normal: Vector3<f64>,
        triangles: Vec<VertexId>,
    ) {
        let loop_start = self.loops.len();
        let slot = &mut self.polygons[id.index()];
        debug_assert!(slot.is_none(), "restore_polygon: slot occupied");
        *slot = Some(Polygon {
            loop_start,
            num_loops,
            normal,
            triangles,
            selected: false,
        });
    }

    // --- Accessors ---

    /// Get a vertex by handle. Panics on a tombstoned handle.
    #[inline]
    pub fn vertex(&self, id: VertexId) -> &Vertex {
        self.vertices[id.index()].as_ref().expect("stale vertex handle")
    }

    /// Get a mutable vertex by handle. Panics on a tombstoned handle.
    #[inline]
    pub fn vertex_mut(&mut self, id: VertexId) -> &mut Vertex {
        self.vertices[id.index()].as_mut().expect("stale vertex handle")
    }

    /// Get an edge by handle. Panics on a tombstoned handle.
    #[inline]
    pub fn edge(&self, id: EdgeId) -> &Edge {
        self.edges[id.index()].as_ref().expect("stale edge handle")
    }

    /// Get a polygon by handle. Panics on a tombstoned handle.
    #[inline]
    pub fn polygon(&self, id: PolygonId) -> &Polygon {
        self.polygons[id.index()].as_ref().expect("stale polygon handle")
    }

    /// Get a mutable polygon by handle. Panics on a tombstoned handle.
    #[inline]
    pub fn polygon_mut(&mut self, id: PolygonId) -> &mut Polygon {
        self.polygons[id.index()].as_mut().expect("stale polygon handle")
    }

    /// Is this vertex handle live (not tombstoned)?
    #[inline]
    pub fn vertex_exists(&self, id: VertexId) -> bool {
        self.vertices.get(id.index()).is_some_and(Option::is_some)
    }

    /// Is this edge handle live?
    #[inline]
    pub fn edge_exists(&self, id: EdgeId) -> bool {
        self.edges.get(id.index()).is_some_and(Option::is_some)
    }

    /// Is this polygon handle live?
    #[inline]
    pub fn polygon_exists(&self, id: PolygonId) -> bool {
        self.polygons.get(id.index()).is_some_and(Option::is_some)
    }

    /// The polygon's loop range as a slice.
    #[inline]
    pub fn polygon_loops(&self, id: PolygonId) -> &[Loop] {
        let p = self.polygon(id);
        &self.loops[p.loop_start..p.loop_start + p.num_loops]
    }

    /// The polygon's boundary vertices, in loop order.
    pub fn polygon_vertices(&self, id: PolygonId) -> Vec<VertexId> {
        self.polygon_loops(id).iter().map(|l| l.start).collect()
    }

    /// All loops, in positional order.
    #[inline]
    pub fn loops(&self) -> &[Loop] {
        &self.loops
    }

    /// Iterate over live vertex handles.
    pub fn vertex_ids(&self) -> impl Iterator<Item = VertexId> + '_ {
        self.vertices
            .iter()
            .enumerate()
            .filter_map(|(i, slot)| slot.as_ref().map(|_| VertexId::new(i)))
    }

    /// Iterate over live edge handles.
    pub fn edge_ids(&self) -> impl Iterator<Item = EdgeId> + '_ {
        self.edges
            .iter()
            .enumerate()
            .filter_map(|(i, slot)| slot.as_ref().map(|_| EdgeId::new(i)))
    }

    /// Iterate over live polygon handles.
    pub fn polygon_ids(&self) -> impl Iterator<Item = PolygonId> + '_ {
        self.polygons
            .iter()
            .enumerate()
            .filter_map(|(i, slot)| slot.as_ref().map(|_| PolygonId::new(i)))
    }

    /// Number of live vertices.
    pub fn num_vertices(&self) -> usize {
        self.vertices.iter().filter(|s| s.is_some()).count()
    }

    /// Number of live edges.
    pub fn num_edges(&self) -> usize {
        self.edges.iter().filter(|s| s.is_some()).count()
    }

    /// Number of loops.
    #[inline]
    pub fn num_loops(&self) -> usize {
        self.loops.len()
    }

    /// Number of live polygons.
    pub fn num_polygons(&self) -> usize {
        self.polygons.iter().filter(|s| s.is_some()).count()
    }

    /// Live edges that have `v` as an endpoint.
    pub fn edges_touching(&self, v: VertexId) -> Vec<EdgeId> {
        self.edge_ids().filter(|&e| self.edge(e).contains(v)).collect()
    }

    // --- Selection flags ---

    /// Set a primitive's selected flag. Tombstoned handles and loops are
    /// ignored (loops carry no flag of their own).
    pub fn set_selected(&mut self, prim: PrimitiveRef, selected: bool) {
        match prim {
            PrimitiveRef::Vertex(v) => {
                if let Some(vertex) = self.vertices.get_mut(v.index()).and_then(Option::as_mut) {
                    vertex.selected = selected;
                }
            }
            PrimitiveRef::Edge(e) => {
                if let Some(edge) = self.edges.get_mut(e.index()).and_then(Option::as_mut) {
                    edge.selected = selected;
                }
            }
            PrimitiveRef::Loop(_) => {}
            PrimitiveRef::Polygon(p) => {
                if let Some(polygon) = self.polygons.get_mut(p.index()).and_then(Option::as_mut) {
                    polygon.selected = selected;
                }
            }
        }
    }

    /// Read a primitive's selected flag. Loops and tombstoned handles read as
    /// unselected.
    pub fn is_selected(&self, prim: PrimitiveRef) -> bool {
        match prim {
            PrimitiveRef::Vertex(v) => self
                .vertices
                .get(v.index())
                .and_then(Option::as_ref)
                .is_some_and(|x| x.selected),
            PrimitiveRef::Edge(e) => self
                .edges
                .get(e.index())
                .and_then(Option::as_ref)
                .is_some_and(|x| x.selected),
            PrimitiveRef::Loop(_) => false,
            PrimitiveRef::Polygon(p) => self
                .polygons
                .get(p.index())
                .and_then(Option::as_ref)
                .is_some_and(|x| x.selected),
        }
    }

    // --- Derived geometry ---

    /// Recompute a polygon's cached normal and triangle fan.
    ///
    /// On failure the previous cache is left untouched and the error is
    /// returned for the caller to log; the editing session never dies on a
    /// bad polygon.
    pub fn refresh_polygon(&mut self, id: PolygonId) -> Result<()> {
        let starts = self.polygon_vertices(id);
        let points: Vec<Point3<f64>> = starts.iter().map(|&v| self.vertex(v).position).collect();
        let normal = geometry::normal_from_boundary(&points)?;
        let fan = geometry::triangulate_boundary(&points, &normal)?;
        let poly = self.polygon_mut(id);
        poly.normal = normal;
        poly.triangles = fan.into_iter().map(|i| starts[i]).collect();
        Ok(())
    }

    /// Refresh every polygon whose boundary includes one of `moved`.
    ///
    /// Called after vertex positions change. Failures are logged and skipped.
    pub fn refresh_polygons_touching(&mut self, moved: &[VertexId]) {
        let mut affected = Vec::new();
        for id in self.polygon_ids() {
            if self.polygon_loops(id).iter().any(|l| moved.contains(&l.start)) {
                affected.push(id);
            }
        }
        for id in affected {
            if let Err(err) = self.refresh_polygon(id) {
                warn!(polygon = ?id, %err, "polygon refresh failed, keeping previous fan");
            }
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_quad_seed() {
        let store = MeshStore::quad();
        assert_eq!(store.num_vertices(), 4);
        assert_eq!(store.num_edges(), 4);
        assert_eq!(store.num_polygons(), 0);
    }

    #[test]
    fn test_cube_shares_edges() {
        let store = MeshStore::cube();
        assert_eq!(store.num_vertices(), 8);
        assert_eq!(store.num_edges(), 12);
        assert_eq!(store.num_polygons(), 6);
        assert_eq!(store.num_loops(), 24);
        for p in store.polygon_ids() {
            assert_eq!(store.polygon(p).triangles.len(), 6);
        }
    }

    #[test]
    fn test_find_or_create_edge_is_unordered() {
        let mut store = MeshStore::new();
        let a = store.add_vertex(Point3::origin());
        let b = store.add_vertex(Point3::new(1.0, 0.0, 0.0));
        let e1 = store.find_or_create_edge(a, b);
        let e2 = store.find_or_create_edge(b, a);
        assert_eq!(e1, e2);
        assert_eq!(store.num_edges(), 1);
    }

    #[test]
    fn test_remove_polygon_compacts_loops() {
        let mut store = MeshStore::cube();
        let ids: Vec<PolygonId> = store.polygon_ids().collect();
        let first = ids[0];
        let survivors: Vec<PolygonId> = ids[1..].to_vec();
        let before: Vec<Vec<VertexId>> =
            survivors.iter().map(|&p| store.polygon_vertices(p)).collect();

        let (poly, drained) = store.remove_polygon(first);
        assert_eq!(drained.len(), poly.num_loops);
        assert_eq!(store.num_loops(), 20);

        // Every survivor still addresses its own boundary.
        for (i, &p) in survivors.iter().enumerate() {
            assert_eq!(store.polygon_vertices(p), before[i]);
            let poly = store.polygon(p);
            assert!(poly.loop_start + poly.num_loops <= store.num_loops());
        }
    }

    #[test]
    fn test_loop_ranges_never_overlap() {
        let mut store = MeshStore::cube();
        let ids: Vec<PolygonId> = store.polygon_ids().collect();
        store.remove_polygon(ids[2]);
        store.remove_polygon(ids[4]);

        let mut ranges: Vec<(usize, usize)> = store
            .polygon_ids()
            .map(|p| {
                let poly = store.polygon(p);
                (poly.loop_start, poly.loop_start + poly.num_loops)
            })
            .collect();
        ranges.sort();
        for pair in ranges.windows(2) {
            assert!(pair[0].1 <= pair[1].0, "overlapping ranges {:?}", pair);
        }
        assert_eq!(ranges.last().map(|r| r.1), Some(store.num_loops()));
    }

    #[test]
    fn test_restore_round_trip() {
        let mut store = MeshStore::quad();
        let v: Vec<VertexId> = store.vertex_ids().collect();
        let removed = store.remove_vertex(v[0]);
        assert_eq!(store.num_vertices(), 3);
        assert!(!store.vertex_exists(v[0]));

        store.restore_vertex(v[0], removed.position);
        assert_eq!(store.num_vertices(), 4);
        assert_eq!(store.vertex(v[0]).position, removed.position);
    }

    #[test]
    fn test_restored_polygon_appends_its_range() {
        let mut store = MeshStore::cube();
        let ids: Vec<PolygonId> = store.polygon_ids().collect();
        let (poly, drained) = store.remove_polygon(ids[0]);
        let boundary: Vec<VertexId> = drained.iter().map(|l| l.start).collect();

        store.restore_polygon(ids[0], poly.num_loops, poly.normal, poly.triangles.clone());
        for l in drained {
            store.append_loop(l);
        }
        assert_eq!(store.num_loops(), 24);
        // Restore is append-position: the range moved to the tail but the
        // topology is equivalent.
        assert_eq!(store.polygon(ids[0]).loop_start, 20);
        assert_eq!(store.polygon_vertices(ids[0]), boundary);
    }

    #[test]
    fn test_refresh_failure_keeps_previous_fan() {
        let mut store = MeshStore::new();
        let a = store.add_vertex(Point3::new(0.0, 0.0, 0.0));
        let b = store.add_vertex(Point3::new(1.0, 0.0, 0.0));
        let c = store.add_vertex(Point3::new(0.5, 1.0, 0.0));
        let ea = store.find_or_create_edge(a, b);
        let eb = store.find_or_create_edge(b, c);
        let ec = store.find_or_create_edge(c, a);
        let start = store.num_loops();
        store.append_loop(Loop { start: a, edge: ea });
        store.append_loop(Loop { start: b, edge: eb });
        store.append_loop(Loop { start: c, edge: ec });
        let p = store.add_polygon(start, 3);
        store.refresh_polygon(p).unwrap();
        let fan = store.polygon(p).triangles.clone();
        assert_eq!(fan.len(), 3);

        // Collapse the triangle onto a line; the refresh fails and the old
        // fan survives.
        store.vertex_mut(c).position = Point3::new(0.5, 0.0, 0.0);
        assert!(store.refresh_polygon(p).is_err());
        assert_eq!(store.polygon(p).triangles, fan);
    }
}
