//! The fixed catalog of hand-authored patterns.
//!
//! Patterns must be convex and their quads consistently oriented. The
//! catalog is built once per process on first use; an entry that fails to
//! build is logged and left out, and the remaining entries keep their original
//! catalog index.

use std::sync::OnceLock;

use log::{error, info};

use super::topology::PatternTopology;

/// Quads of the hand-authored patterns, indexed by catalog number.
pub const FIXED_PATTERNS: &[&[[usize; 4]]] = &[
    // Regular quad.
    &[[0, 1, 2, 3]],
    // Triangle with one valence-3 singularity.
    &[[0, 1, 6, 5], [1, 2, 3, 6], [3, 4, 5, 6]],
    // Pentagon with one valence-5 singularity.
    &[[0, 1, 2, 3], [0, 5, 4, 1], [0, 7, 6, 5], [0, 9, 8, 7], [0, 3, 10, 9]],
    // Quad with a valence-3/valence-5 pair on the diagonal.
    &[
        [0, 1, 2, 3],
        [0, 5, 4, 1],
        [0, 7, 6, 5],
        [0, 9, 8, 7],
        [0, 3, 10, 9],
        [8, 9, 10, 11],
    ],
    // Quad with a 3/5 pair and two regular interior vertices (size transition).
    &[
        [0, 1, 2, 3],
        [0, 5, 4, 1],
        [0, 7, 6, 5],
        [0, 9, 8, 7],
        [0, 3, 10, 9],
        [9, 10, 12, 11],
        [3, 13, 12, 10],
        [8, 9, 11, 14],
        [2, 15, 13, 3],
    ],
    // Quad with two 3s and two 5s: one chord makes a U-turn.
    &[
        [0, 1, 2, 3],
        [0, 5, 4, 1],
        [0, 7, 6, 5],
        [0, 9, 8, 7],
        [0, 3, 10, 9],
        [9, 10, 12, 11],
        [9, 11, 14, 13],
        [8, 9, 13, 15],
        [6, 7, 8, 15],
    ],
    // Two corners, two valence-3 singularities inside ("eye" shape).
    &[[0, 1, 2, 3], [0, 5, 4, 1], [0, 3, 6, 5], [4, 5, 6, 7]],
];

/// A catalog entry: a built pattern and its catalog number.
#[derive(Debug, Clone)]
pub struct CatalogEntry {
    /// Index of the pattern in its source list.
    pub id: usize,
    /// The pattern topology.
    pub topology: PatternTopology,
}

/// Built patterns, read-only after construction.
#[derive(Debug, Clone, Default)]
pub struct PatternCatalog {
    entries: Vec<CatalogEntry>,
}

static GLOBAL_CATALOG: OnceLock<PatternCatalog> = OnceLock::new();

impl PatternCatalog {
    /// Build a catalog from quad lists. Entries that fail to build are skipped.
    pub fn build(sources: &[&[[usize; 4]]]) -> Self {
        info!("loading {} quad patterns", sources.len());
        let mut entries = Vec::with_capacity(sources.len());
        for (id, quads) in sources.iter().enumerate() {
            match PatternTopology::from_quads(quads) {
                Ok(topology) => entries.push(CatalogEntry { id, topology }),
                Err(e) => error!("quad pattern {} rejected: {}", id, e),
            }
        }
        Self { entries }
    }

    /// The process-wide catalog of [`FIXED_PATTERNS`], built on first access.
    ///
    /// Concurrent first calls block until a single build finishes.
    pub fn global() -> &'static PatternCatalog {
        GLOBAL_CATALOG.get_or_init(|| Self::build(FIXED_PATTERNS))
    }

    /// All entries, ordered by id.
    pub fn entries(&self) -> &[CatalogEntry] {
        &self.entries
    }

    /// Look up a pattern by catalog number.
    pub fn get(&self, id: usize) -> Option<&PatternTopology> {
        self.entries
            .iter()
            .find(|entry| entry.id == id)
            .map(|entry| &entry.topology)
    }

    /// Number of patterns that built successfully.
    pub fn len(&self) -> usize {
        self.entries.len()
    }

    /// Whether no pattern built successfully.
    pub fn is_empty(&self) -> bool {
        self.entries.is_empty()
    }
}
