//! A minimal index-based quad mesh.
//!
//! [`QuadSoup`] stores positions and quads as plain index arrays. It is the
//! simplest [`ElementSink`] a caller can supply and is what the command-line
//! tool and the OBJ writer work with.

use std::f64::consts::TAU;

use nalgebra::Point3;

use super::cavity::{BoundaryVertex, Cavity};
use super::patch::ElementSink;
use crate::error::{PatternError, Result};

/// Vertices and quads addressed by `usize` indices.
#[derive(Debug, Clone, Default)]
pub struct QuadSoup {
    /// Vertex positions.
    pub positions: Vec<Point3<f64>>,
    /// Per-vertex irregular flag (false for vertices added directly).
    pub irregular: Vec<bool>,
    /// Quads as vertex indices in cyclic order.
    pub quads: Vec<[usize; 4]>,
}

impl QuadSoup {
    /// Create an empty soup.
    pub fn new() -> Self {
        Self::default()
    }

    /// Add a vertex and return its index.
    pub fn add_vertex(&mut self, position: Point3<f64>) -> usize {
        self.positions.push(position);
        self.irregular.push(false);
        self.positions.len() - 1
    }

    /// Number of vertices.
    pub fn num_vertices(&self) -> usize {
        self.positions.len()
    }

    /// Number of quads.
    pub fn num_quads(&self) -> usize {
        self.quads.len()
    }

    /// Boundary vertex view of an existing vertex.
    pub fn boundary_vertex(&self, index: usize) -> BoundaryVertex<usize> {
        BoundaryVertex::new(index, self.positions[index])
    }
}

impl ElementSink<usize> for QuadSoup {
    fn create_vertex(&mut self, position: Point3<f64>, irregular: bool) -> usize {
        self.positions.push(position);
        self.irregular.push(irregular);
        self.positions.len() - 1
    }

    fn create_quad(&mut self, vertices: [usize; 4]) {
        self.quads.push(vertices);
    }
}

/// Build a cavity whose boundary lies on a circle of the given radius in the
/// XY plane, counter-clockwise.
///
/// `side_sizes[s]` is the number of vertices on side `s`, corners included.
/// Corners are spread evenly around the circle and each side's vertices are
/// evenly spaced in angle. The boundary vertices are added to a fresh
/// [`QuadSoup`], which is returned together with the cavity.
pub fn circular_cavity(side_sizes: &[usize], radius: f64) -> Result<(QuadSoup, Cavity<usize>)> {
    if side_sizes.is_empty() {
        return Err(PatternError::invalid_param(
            "side_sizes",
            "[]",
            "at least one side is required",
        ));
    }
    if let Some(&bad) = side_sizes.iter().find(|&&s| s < 2) {
        return Err(PatternError::invalid_param(
            "side_sizes",
            bad,
            "every side needs at least 2 vertices",
        ));
    }
    if !(radius > 0.0) {
        return Err(PatternError::invalid_param("radius", radius, "must be positive"));
    }

    let n = side_sizes.len();
    let total: usize = side_sizes.iter().map(|s| s - 1).sum();
    let mut soup = QuadSoup::new();
    for k in 0..total {
        // Position along the loop, measured in side fractions.
        let mut rest = k;
        let mut side = 0;
        while rest >= side_sizes[side] - 1 {
            rest -= side_sizes[side] - 1;
            side += 1;
        }
        let frac = side as f64 + rest as f64 / (side_sizes[side] - 1) as f64;
        let angle = TAU * frac / n as f64;
        soup.add_vertex(Point3::new(radius * angle.cos(), radius * angle.sin(), 0.0));
    }

    let mut sides = Vec::with_capacity(n);
    let mut start = 0;
    for &size in side_sizes {
        let side = (0..size)
            .map(|k| soup.boundary_vertex((start + k) % total))
            .collect();
        sides.push(side);
        start += size - 1;
    }

    let cavity = Cavity::new(sides)?;
    Ok((soup, cavity))
}

/// Build a closed boundary loop of `n` vertices on a circle, counter-clockwise.
pub fn circular_loop(n: usize, radius: f64) -> (QuadSoup, Vec<BoundaryVertex<usize>>) {
    let mut soup = QuadSoup::new();
    let ring = (0..n)
        .map(|k| {
            let angle = TAU * k as f64 / n as f64;
            let i = soup.add_vertex(Point3::new(radius * angle.cos(), radius * angle.sin(), 0.0));
            soup.boundary_vertex(i)
        })
        .collect();
    (soup, ring)
}
