//! Laplacian relaxation of generated vertices.
//!
//! Only vertices created by a [`CavityPatch`] move; the caller's boundary
//! vertices are fixed. Each iteration moves every new vertex to the mean of
//! its neighbours across the generated quads, with all moves computed from the
//! previous iterate and applied together.
//!
//! # Example
//!
//! ```
//! use quadpatch::algo::smooth::{smooth_new_vertices, SmoothOptions};
//! use quadpatch::mesh::{circular_loop, CavityPatch};
//! use nalgebra::Point3;
//!
//! let (_, ring) = circular_loop(8, 1.0);
//! let mut patch = CavityPatch::new();
//! let b: Vec<_> = ring.iter().map(|&v| patch.add_boundary(v)).collect();
//! let c = patch.add_vertex(Point3::new(0.7, 0.2, 0.0), false);
//! patch.add_quad([b[0], b[1], b[2], c]);
//! patch.add_quad([c, b[2], b[3], b[4]]);
//! patch.add_quad([b[6], c, b[4], b[5]]);
//! patch.add_quad([b[7], b[0], c, b[6]]);
//!
//! smooth_new_vertices(&mut patch, &SmoothOptions::default());
//! assert!(patch.position(c).coords.norm() < 1e-9);
//! ```

use std::hash::Hash;

use nalgebra::{Point3, Vector3};
use rayon::prelude::*;

use crate::mesh::{CavityPatch, PatchVertex, VertexId};

/// Options for smoothing generated vertices.
#[derive(Debug, Clone)]
pub struct SmoothOptions {
    /// Number of relaxation sweeps.
    pub iterations: usize,

    /// Whether to use parallel execution (default: true).
    pub parallel: bool,
}

impl Default for SmoothOptions {
    fn default() -> Self {
        Self {
            iterations: 10,
            parallel: true,
        }
    }
}

impl SmoothOptions {
    /// Create options with the specified number of iterations.
    pub fn with_iterations(mut self, iterations: usize) -> Self {
        self.iterations = iterations;
        self
    }

    /// Set whether to use parallel execution.
    pub fn with_parallel(mut self, parallel: bool) -> Self {
        self.parallel = parallel;
        self
    }

    /// Create options for single-threaded execution.
    pub fn sequential(mut self) -> Self {
        self.parallel = false;
        self
    }
}

/// Slot of a patch vertex in a flat table: boundary vertices first.
fn slot(v: PatchVertex, num_boundary: usize) -> usize {
    match v {
        PatchVertex::Boundary(i) => i,
        PatchVertex::New(id) => num_boundary + id.index(),
    }
}

/// Neighbours of every new vertex across the patch quads, as flat slots.
fn new_vertex_neighbors<H: Copy + Eq + Hash>(patch: &CavityPatch<H>) -> Vec<Vec<usize>> {
    let nb = patch.boundary().len();
    let mut neighbors = vec![Vec::new(); patch.num_new_vertices()];
    for quad in patch.quads() {
        for k in 0..4 {
            let a = quad[k];
            let b = quad[(k + 1) % 4];
            if a == b {
                continue;
            }
            if let PatchVertex::New(id) = a {
                neighbors[id.index()].push(slot(b, nb));
            }
            if let PatchVertex::New(id) = b {
                neighbors[id.index()].push(slot(a, nb));
            }
        }
    }
    for list in &mut neighbors {
        list.sort_unstable();
        list.dedup();
    }
    neighbors
}

fn mean_position(neighbors: &[usize], positions: &[Point3<f64>], current: Point3<f64>) -> Point3<f64> {
    if neighbors.is_empty() {
        return current;
    }
    let sum: Vector3<f64> = neighbors.iter().map(|&n| positions[n].coords).sum();
    Point3::from(sum / neighbors.len() as f64)
}

/// Relax the new vertices of a patch with Laplacian smoothing.
///
/// Does nothing when `iterations` is zero or the patch created no vertices.
/// A new vertex without neighbours stays where it is.
pub fn smooth_new_vertices<H: Copy + Eq + Hash>(patch: &mut CavityPatch<H>, options: &SmoothOptions) {
    if options.iterations == 0 || patch.num_new_vertices() == 0 {
        return;
    }

    let nb = patch.boundary().len();
    let neighbors = new_vertex_neighbors(patch);
    let mut positions: Vec<Point3<f64>> = patch
        .boundary()
        .iter()
        .map(|v| v.position)
        .chain(patch.new_vertices().iter().map(|v| v.position))
        .collect();

    for _ in 0..options.iterations {
        let updated: Vec<Point3<f64>> = if options.parallel {
            neighbors
                .par_iter()
                .enumerate()
                .map(|(i, n)| mean_position(n, &positions, positions[nb + i]))
                .collect()
        } else {
            neighbors
                .iter()
                .enumerate()
                .map(|(i, n)| mean_position(n, &positions, positions[nb + i]))
                .collect()
        };
        positions[nb..].copy_from_slice(&updated);
    }

    for (i, &p) in positions[nb..].iter().enumerate() {
        patch.set_position(VertexId::new(i), p);
    }
}
