//! Quad patterns and the catalogs that hold them.
//!
//! - [`PatternTopology`]: edges, chords and sides derived from a list of quads
//! - [`PatternCatalog`]: the fixed, hand-authored patterns used by the
//!   side-length matcher
//! - [`DiskLibrary`]: disk quadrangulations indexed by boundary size and
//!   boundary-valence loop, used for small cavities
//! - [`usage`]: process-wide pattern usage counters
//!
//! Both catalogs are built lazily, once per process, and are read-only
//! afterwards.
//!
//! # Example
//!
//! ```
//! use quadpatch::pattern::PatternCatalog;
//!
//! let catalog = PatternCatalog::global();
//! let regular = catalog.get(0).unwrap();
//! assert_eq!(regular.num_sides(), 4);
//! assert_eq!(regular.num_chords(), 2);
//! ```

pub mod catalog;
pub mod library;
mod topology;
pub mod usage;

pub use catalog::{CatalogEntry, PatternCatalog, FIXED_PATTERNS};
pub use library::{boundary_valence_loop, quad_valences, DiskLibrary, DiskQuadrangulation};
pub use topology::PatternTopology;
pub use usage::PatternRef;
