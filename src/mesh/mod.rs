//! Cavity-side data structures.
//!
//! This module holds everything that describes the caller's side of a
//! remeshing request and its result.
//!
//! # Overview
//!
//! - [`Cavity`] - the boundary loop of the hole to fill, split into sides of
//!   caller-owned [`BoundaryVertex`] values
//! - [`Orientation`] - a rotation, optionally of the reversed loop, used to
//!   line a cavity up with a pattern
//! - [`CavityPatch`] - the arena of new vertices and quads produced by a
//!   remeshing call, committed through an [`ElementSink`]
//! - [`QuadSoup`] - a plain index-based quad mesh implementing [`ElementSink`]
//!
//! # Index Types
//!
//! Pattern elements are identified by type-safe index wrappers:
//! [`VertexId`], [`EdgeId`], [`QuadId`] and [`ChordId`].
//!
//! # Example
//!
//! ```
//! use quadpatch::mesh::{circular_cavity, Orientation};
//!
//! let (_soup, cavity) = circular_cavity(&[3, 4, 3, 4], 1.0).unwrap();
//! assert_eq!(cavity.side_sizes(), vec![3, 4, 3, 4]);
//!
//! let mirrored = cavity.oriented_sides(Orientation::mirrored(0));
//! assert_eq!(mirrored[0].len(), 4);
//! ```

mod cavity;
mod index;
mod patch;
mod soup;

pub(crate) use cavity::centroid;
pub use cavity::{BoundaryVertex, Cavity, Orientation};
pub use index::{ChordId, EdgeId, QuadId, VertexId};
pub use patch::{CavityPatch, ElementSink, NewVertex, PatchVertex};
pub use soup::{circular_cavity, circular_loop, QuadSoup};
