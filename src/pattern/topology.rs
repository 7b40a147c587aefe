//! Quad pattern topology.
//!
//! A pattern is a small quad mesh given as a list of quads, each four vertex
//! ids in a consistent cyclic order. From it we derive:
//!
//! - deduplicated undirected edges, with the direction in which they were first
//!   met (for a boundary edge that is the direction of its only quad)
//! - **chords**: classes of edges linked by "opposite edge in a quad"; every
//!   edge of a chord must be subdivided the same number of times
//! - **sides**: maximal boundary arcs between corners, where a corner is a
//!   boundary vertex with exactly two incident edges

use std::collections::{HashMap, VecDeque};

use crate::error::{PatternError, Result};
use crate::mesh::{ChordId, EdgeId, QuadId, VertexId};

/// Immutable topology of one quad pattern.
#[derive(Debug, Clone)]
pub struct PatternTopology {
    num_vertices: usize,
    /// Edge endpoints in the direction of first traversal.
    edges: Vec<[VertexId; 2]>,
    edge_index: HashMap<(VertexId, VertexId), EdgeId>,
    quad_edges: Vec<[EdgeId; 4]>,
    quad_vertices: Vec<[VertexId; 4]>,
    vertex_edges: Vec<Vec<EdgeId>>,
    edge_quads: Vec<Vec<QuadId>>,
    on_boundary: Vec<bool>,
    valence: Vec<usize>,
    edge_chord: Vec<ChordId>,
    chords: Vec<Vec<EdgeId>>,
    sides: Vec<Vec<EdgeId>>,
}

fn sorted_pair(a: VertexId, b: VertexId) -> (VertexId, VertexId) {
    if a < b {
        (a, b)
    } else {
        (b, a)
    }
}

impl PatternTopology {
    /// Build the topology of a pattern from its quads.
    ///
    /// Fails with a structural error when the quads are empty or degenerate,
    /// when chord propagation meets an inconsistent quad, or when the boundary
    /// cannot be walked into sides.
    pub fn from_quads(quads: &[[usize; 4]]) -> Result<Self> {
        let mut topo = Self::connectivity(quads)?;
        topo.build_chords()?;
        topo.build_sides()?;
        Ok(topo)
    }

    /// Edges, incidence lists, boundary flags and valences; no chords or sides.
    fn connectivity(quads: &[[usize; 4]]) -> Result<Self> {
        if quads.is_empty() {
            return Err(PatternError::EmptyPattern);
        }
        for (qi, quad) in quads.iter().enumerate() {
            for a in 0..4 {
                for b in (a + 1)..4 {
                    if quad[a] == quad[b] {
                        return Err(PatternError::DegenerateQuad { quad: qi });
                    }
                }
            }
        }

        let num_vertices = quads.iter().flatten().max().map_or(0, |&m| m + 1);
        let mut edges: Vec<[VertexId; 2]> = Vec::with_capacity(2 * quads.len());
        let mut edge_index: HashMap<(VertexId, VertexId), EdgeId> = HashMap::new();
        let mut quad_edges = Vec::with_capacity(quads.len());
        let mut quad_vertices = Vec::with_capacity(quads.len());

        for quad in quads {
            let qv = quad.map(VertexId::new);
            let mut qe = [EdgeId::invalid(); 4];
            for le in 0..4 {
                let v1 = qv[le];
                let v2 = qv[(le + 1) % 4];
                let e = *edge_index.entry(sorted_pair(v1, v2)).or_insert_with(|| {
                    edges.push([v1, v2]);
                    EdgeId::new(edges.len() - 1)
                });
                qe[le] = e;
            }
            quad_edges.push(qe);
            quad_vertices.push(qv);
        }

        let mut vertex_edges = vec![Vec::new(); num_vertices];
        for (e, [v1, v2]) in edges.iter().enumerate() {
            vertex_edges[v1.index()].push(EdgeId::new(e));
            vertex_edges[v2.index()].push(EdgeId::new(e));
        }

        let mut edge_quads = vec![Vec::new(); edges.len()];
        for (q, qe) in quad_edges.iter().enumerate() {
            for e in qe {
                edge_quads[e.index()].push(QuadId::new(q));
            }
        }

        let mut on_boundary = vec![false; num_vertices];
        for (e, quads_of_edge) in edge_quads.iter().enumerate() {
            if quads_of_edge.len() == 1 {
                on_boundary[edges[e][0].index()] = true;
                on_boundary[edges[e][1].index()] = true;
            }
        }

        let mut valence = vec![0; num_vertices];
        for v in quad_vertices.iter().flatten() {
            valence[v.index()] += 1;
        }

        Ok(Self {
            num_vertices,
            edges,
            edge_index,
            quad_edges,
            quad_vertices,
            vertex_edges,
            edge_quads,
            on_boundary,
            valence,
            edge_chord: Vec::new(),
            chords: Vec::new(),
            sides: Vec::new(),
        })
    }

    /// Partition the edges into chords by breadth-first opposite-edge
    /// propagation.
    fn build_chords(&mut self) -> Result<()> {
        self.edge_chord = vec![ChordId::invalid(); self.edges.len()];
        self.chords.clear();

        for start in 0..self.edges.len() {
            if self.edge_chord[start].is_valid() {
                continue;
            }
            let chord = ChordId::new(self.chords.len());
            let mut members = Vec::new();
            let mut queue = VecDeque::new();
            self.edge_chord[start] = chord;
            queue.push_back(EdgeId::new(start));

            while let Some(e) = queue.pop_front() {
                members.push(e);
                for &q in &self.edge_quads[e.index()] {
                    let qe = &self.quad_edges[q.index()];
                    let le = qe.iter().position(|&x| x == e).ok_or(
                        PatternError::ChordPropagation {
                            edge: e.index(),
                            quad: q.index(),
                        },
                    )?;
                    let opposite = qe[(le + 2) % 4];
                    if self.edge_chord[opposite.index()].is_valid() {
                        continue;
                    }
                    self.edge_chord[opposite.index()] = chord;
                    queue.push_back(opposite);
                }
            }

            members.sort();
            self.chords.push(members);
        }
        Ok(())
    }

    /// Walk the boundary from the first corner, splitting it at corners.
    fn build_sides(&mut self) -> Result<()> {
        self.sides.clear();
        let start = (0..self.num_vertices)
            .find(|&v| self.is_corner(VertexId::new(v)))
            .map(VertexId::new)
            .ok_or(PatternError::NoCorner)?;

        let mut v = start;
        let mut prev: Option<EdgeId> = None;
        // A closed walk cannot take more steps than there are edges.
        for _ in 0..self.edges.len() {
            if self.is_corner(v) {
                self.sides.push(Vec::new());
            }
            let next = self.vertex_edges[v.index()].iter().copied().find(|&e| {
                Some(e) != prev && self.is_boundary_edge(e) && self.edges[e.index()][0] == v
            });
            let e = next.ok_or(PatternError::BoundaryWalk { vertex: v.index() })?;
            if let Some(side) = self.sides.last_mut() {
                side.push(e);
            }
            v = self.edges[e.index()][1];
            prev = Some(e);
            if v == start {
                return Ok(());
            }
        }
        Err(PatternError::BoundaryWalk {
            vertex: start.index(),
        })
    }

    /// Number of vertices (max id + 1).
    pub fn num_vertices(&self) -> usize {
        self.num_vertices
    }

    /// Number of undirected edges.
    pub fn num_edges(&self) -> usize {
        self.edges.len()
    }

    /// Number of quads.
    pub fn num_quads(&self) -> usize {
        self.quad_edges.len()
    }

    /// Number of chords, i.e. subdivision variables.
    pub fn num_chords(&self) -> usize {
        self.chords.len()
    }

    /// Number of boundary sides.
    pub fn num_sides(&self) -> usize {
        self.sides.len()
    }

    /// Endpoints of an edge, in the direction it was first traversed.
    pub fn edge_vertices(&self, e: EdgeId) -> [VertexId; 2] {
        self.edges[e.index()]
    }

    /// Find the edge joining two vertices.
    pub fn find_edge(&self, a: VertexId, b: VertexId) -> Option<EdgeId> {
        self.edge_index.get(&sorted_pair(a, b)).copied()
    }

    /// Edge ids of a quad in cyclic order.
    pub fn quad_edges(&self, q: QuadId) -> [EdgeId; 4] {
        self.quad_edges[q.index()]
    }

    /// Vertex ids of a quad in cyclic order.
    pub fn quad_vertices(&self, q: QuadId) -> [VertexId; 4] {
        self.quad_vertices[q.index()]
    }

    /// Edges incident to a vertex.
    pub fn vertex_edges(&self, v: VertexId) -> &[EdgeId] {
        &self.vertex_edges[v.index()]
    }

    /// Quads incident to an edge (one on the boundary, two inside).
    pub fn edge_quads(&self, e: EdgeId) -> &[QuadId] {
        &self.edge_quads[e.index()]
    }

    /// Whether an edge lies on the pattern boundary.
    pub fn is_boundary_edge(&self, e: EdgeId) -> bool {
        self.edge_quads[e.index()].len() == 1
    }

    /// Whether a vertex lies on the pattern boundary.
    pub fn is_boundary_vertex(&self, v: VertexId) -> bool {
        self.on_boundary[v.index()]
    }

    /// Whether a vertex is a corner: on the boundary with exactly two edges.
    pub fn is_corner(&self, v: VertexId) -> bool {
        self.on_boundary[v.index()] && self.vertex_edges[v.index()].len() == 2
    }

    /// Number of quads incident to a vertex.
    pub fn valence(&self, v: VertexId) -> usize {
        self.valence[v.index()]
    }

    /// Per-vertex valences.
    pub fn valences(&self) -> &[usize] {
        &self.valence
    }

    /// Chord owning an edge.
    pub fn edge_chord(&self, e: EdgeId) -> ChordId {
        self.edge_chord[e.index()]
    }

    /// Edges of a chord, sorted.
    pub fn chord_edges(&self, c: ChordId) -> &[EdgeId] {
        &self.chords[c.index()]
    }

    /// Boundary sides, each a sequence of edges in walking order.
    pub fn sides(&self) -> &[Vec<EdgeId>] {
        &self.sides
    }

    /// Number of pattern edges on each side.
    pub fn side_edge_counts(&self) -> Vec<usize> {
        self.sides.iter().map(Vec::len).collect()
    }

    /// Vertex ids iterator.
    pub fn vertex_ids(&self) -> impl Iterator<Item = VertexId> {
        (0..self.num_vertices).map(VertexId::new)
    }

    /// Edge ids iterator.
    pub fn edge_ids(&self) -> impl Iterator<Item = EdgeId> {
        (0..self.edges.len()).map(EdgeId::new)
    }

    /// Quad ids iterator.
    pub fn quad_ids(&self) -> impl Iterator<Item = QuadId> {
        (0..self.quad_edges.len()).map(QuadId::new)
    }

    /// Chord ids iterator.
    pub fn chord_ids(&self) -> impl Iterator<Item = ChordId> {
        (0..self.chords.len()).map(ChordId::new)
    }
}
