//! Generated cavity fillings.
//!
//! A [`CavityPatch`] is an arena holding everything a remeshing call creates:
//! new vertices and the quads that fill the cavity. Quads reference either a
//! caller-owned boundary vertex or a new vertex through [`PatchVertex`]. The
//! caller's mesh is not touched until [`CavityPatch::commit`] hands the
//! elements over through an [`ElementSink`]; dropping the patch discards them.

use std::collections::HashMap;
use std::hash::Hash;

use nalgebra::Point3;

use super::cavity::BoundaryVertex;
use super::index::VertexId;

/// A vertex referenced by a generated quad.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum PatchVertex {
    /// Index into the patch's boundary table.
    Boundary(usize),
    /// A vertex created by the patch.
    New(VertexId),
}

/// A vertex created inside the cavity.
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct NewVertex {
    /// Position of the vertex.
    pub position: Point3<f64>,
    /// True when the vertex will not have valence 4 in the final mesh.
    pub irregular: bool,
}

/// Creation interface supplied by the caller's mesh.
///
/// [`CavityPatch::commit`] creates every new vertex through
/// [`create_vertex`](ElementSink::create_vertex) and then every quad through
/// [`create_quad`](ElementSink::create_quad), using the caller's handles.
pub trait ElementSink<H> {
    /// Create a vertex and return its handle.
    fn create_vertex(&mut self, position: Point3<f64>, irregular: bool) -> H;

    /// Create a quad from four vertex handles in cyclic order.
    fn create_quad(&mut self, vertices: [H; 4]);
}

/// New vertices and quads filling one cavity.
#[derive(Debug, Clone)]
pub struct CavityPatch<H> {
    boundary: Vec<BoundaryVertex<H>>,
    boundary_index: HashMap<H, usize>,
    vertices: Vec<NewVertex>,
    quads: Vec<[PatchVertex; 4]>,
}

impl<H: Copy + Eq + Hash> Default for CavityPatch<H> {
    fn default() -> Self {
        Self::new()
    }
}

impl<H: Copy + Eq + Hash> CavityPatch<H> {
    /// Create an empty patch.
    pub fn new() -> Self {
        Self {
            boundary: Vec::new(),
            boundary_index: HashMap::new(),
            vertices: Vec::new(),
            quads: Vec::new(),
        }
    }

    /// Register a boundary vertex, returning the same reference for a handle
    /// that was already registered.
    pub fn add_boundary(&mut self, vertex: BoundaryVertex<H>) -> PatchVertex {
        if let Some(&i) = self.boundary_index.get(&vertex.handle) {
            return PatchVertex::Boundary(i);
        }
        let i = self.boundary.len();
        self.boundary.push(vertex);
        self.boundary_index.insert(vertex.handle, i);
        PatchVertex::Boundary(i)
    }

    /// Create a new vertex.
    pub fn add_vertex(&mut self, position: Point3<f64>, irregular: bool) -> PatchVertex {
        let id = VertexId::new(self.vertices.len());
        self.vertices.push(NewVertex {
            position,
            irregular,
        });
        PatchVertex::New(id)
    }

    /// Create a quad.
    pub fn add_quad(&mut self, quad: [PatchVertex; 4]) {
        self.quads.push(quad);
    }

    /// Position of any vertex referenced by the patch.
    ///
    /// # Panics
    /// Panics if the reference does not belong to this patch.
    pub fn position(&self, v: PatchVertex) -> Point3<f64> {
        match v {
            PatchVertex::Boundary(i) => self.boundary[i].position,
            PatchVertex::New(id) => self.vertices[id.index()].position,
        }
    }

    /// Move a new vertex. Boundary vertices are caller-owned and never moved.
    pub fn set_position(&mut self, id: VertexId, position: Point3<f64>) {
        self.vertices[id.index()].position = position;
    }

    /// Boundary vertices referenced by the patch.
    pub fn boundary(&self) -> &[BoundaryVertex<H>] {
        &self.boundary
    }

    /// New vertices created by the patch.
    pub fn new_vertices(&self) -> &[NewVertex] {
        &self.vertices
    }

    /// Generated quads.
    pub fn quads(&self) -> &[[PatchVertex; 4]] {
        &self.quads
    }

    /// Number of new vertices.
    pub fn num_new_vertices(&self) -> usize {
        self.vertices.len()
    }

    /// Number of generated quads.
    pub fn num_quads(&self) -> usize {
        self.quads.len()
    }

    /// Number of new vertices flagged irregular.
    pub fn num_irregular(&self) -> usize {
        self.vertices.iter().filter(|v| v.irregular).count()
    }

    /// Reverse the vertex order of every quad.
    pub fn reverse_quads(&mut self) {
        for quad in &mut self.quads {
            quad.reverse();
        }
    }

    /// Resolve a reference to the caller's handle, given the handles assigned
    /// to new vertices.
    fn resolve(&self, v: PatchVertex, created: &[H]) -> H {
        match v {
            PatchVertex::Boundary(i) => self.boundary[i].handle,
            PatchVertex::New(id) => created[id.index()],
        }
    }

    /// Hand every new vertex and quad to the caller's mesh.
    ///
    /// Returns the handles assigned to the new vertices, in creation order.
    pub fn commit<S: ElementSink<H>>(self, sink: &mut S) -> Vec<H> {
        let created: Vec<H> = self
            .vertices
            .iter()
            .map(|v| sink.create_vertex(v.position, v.irregular))
            .collect();
        for quad in &self.quads {
            let q = quad.map(|v| self.resolve(v, &created));
            sink.create_quad(q);
        }
        created
    }
}
