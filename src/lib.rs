//! # quadpatch
//!
//! Quad-pattern matching and cavity remeshing.
//!
//! quadpatch fills a closed polygonal hole (a *cavity*) in a quad mesh with a
//! structured block of quads. The cavity boundary is split into sides; the
//! side lengths are matched against a catalog of small quad patterns, the
//! chosen pattern is subdivided to fit, and its interior is laid out by
//! transfinite interpolation and Laplacian smoothing. Very small cavities are
//! instead matched by vertex valence against a library of disk
//! quadrangulations.
//!
//! ## Features
//!
//! - **Pattern topology**: chords and boundary sides derived from plain quad lists
//! - **Integer matching**: row-reduced side-length systems searched for a
//!   positive, balanced subdivision in every rotation and reflection
//! - **Arena output**: generated vertices and quads stay in a [`CavityPatch`]
//!   until committed to the caller's mesh through an [`ElementSink`]
//! - **Thread-safe catalogs**: built once per process on first use
//!
//! ## Quick Start
//!
//! ```
//! use quadpatch::prelude::*;
//!
//! // A cavity of four sides with 3, 4, 3 and 4 vertices on a unit circle.
//! let (mut soup, cavity) = circular_cavity(&[3, 4, 3, 4], 1.0).unwrap();
//!
//! let patch = fill_cavity(&cavity, &RemeshOptions::default())
//!     .unwrap()
//!     .expect("a regular grid fits");
//! assert_eq!(patch.num_quads(), 6);
//!
//! // Hand the new vertices and quads to the mesh.
//! patch.commit(&mut soup);
//! assert_eq!(soup.num_quads(), 6);
//! ```
//!
//! ## Matching Without Remeshing
//!
//! ```
//! use quadpatch::prelude::*;
//!
//! let catalog = PatternCatalog::global();
//! let found = find_best_pattern(catalog, &[3, 3, 3], &MatchOptions::default()).unwrap();
//! assert_eq!(found.pattern, 1);
//! assert_eq!(found.quantization, vec![1, 1, 1]);
//! ```
//!
//! [`CavityPatch`]: mesh::CavityPatch
//! [`ElementSink`]: mesh::ElementSink

#![warn(missing_docs)]
#![warn(clippy::all)]

pub mod algo;
pub mod error;
pub mod io;
pub mod mesh;
pub mod pattern;

/// Prelude module for convenient imports.
///
/// This module re-exports the most commonly used types and functions:
///
/// ```
/// use quadpatch::prelude::*;
/// ```
pub mod prelude {
    pub use crate::algo::matcher::{find_best_pattern, MatchOptions, PatternMatch};
    pub use crate::algo::remesh::{fill_cavity, remesh_cavity, RemeshOptions};
    pub use crate::algo::small_cavity::{remesh_small_cavity, SmallCavityOptions};
    pub use crate::algo::smooth::SmoothOptions;
    pub use crate::error::{PatternError, Result};
    pub use crate::mesh::{
        circular_cavity, circular_loop, BoundaryVertex, Cavity, CavityPatch, ElementSink,
        Orientation, PatchVertex, QuadSoup,
    };
    pub use crate::pattern::{DiskLibrary, PatternCatalog, PatternTopology};
}

// Re-export nalgebra types for convenience
pub use nalgebra;

#[cfg(test)]
mod tests {
    use super::prelude::*;

    #[test]
    fn test_fill_and_commit() {
        let (mut soup, cavity) = circular_cavity(&[3, 3, 3, 3], 1.0).unwrap();
        let patch = fill_cavity(&cavity, &RemeshOptions::default())
            .unwrap()
            .unwrap();
        let created = patch.commit(&mut soup);

        assert_eq!(created, vec![8]);
        assert_eq!(soup.num_vertices(), 9);
        assert_eq!(soup.num_quads(), 4);
        assert_eq!(soup.irregular.iter().filter(|&&b| b).count(), 0);

        // Every boundary vertex is used by at least one quad.
        for v in 0..8 {
            assert!(soup.quads.iter().any(|q| q.contains(&v)), "vertex {}", v);
        }
    }
}
