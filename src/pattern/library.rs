//! Library of disk quadrangulations.
//!
//! Each record is a small quad mesh of a disk whose first `B` vertices are the
//! boundary, in boundary order. Records are grouped by boundary size and
//! indexed by their boundary-valence loop (BVL): the number of quads touching
//! each boundary vertex, in boundary order.
//!
//! # Text format
//!
//! One record per line, whitespace separated:
//!
//! ```text
//! B I Q v0_0 v0_1 v0_2 v0_3 v1_0 ... v(Q-1)_3
//! ```
//!
//! `B` is the boundary size, `I` an identifier and `Q` the quad count,
//! followed by exactly `4 * Q` vertex indices. Malformed lines are logged and
//! skipped.

use std::collections::HashMap;
use std::sync::OnceLock;

use log::{debug, info, warn};

use crate::error::PatternError;

/// Library bundled with the crate.
pub const EMBEDDED_LIBRARY: &str = include_str!("../../data/disk_quadrangulations.txt");

/// One disk quadrangulation.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct DiskQuadrangulation {
    /// Identifier from the record.
    pub id: usize,
    /// Number of boundary vertices; vertices `0..boundary_size` are boundary.
    pub boundary_size: usize,
    /// Quads as vertex indices.
    pub quads: Vec<[usize; 4]>,
    /// Number of quads incident to each vertex.
    pub valence: Vec<usize>,
}

impl DiskQuadrangulation {
    /// Create a quadrangulation and compute its valences.
    pub fn new(id: usize, boundary_size: usize, quads: Vec<[usize; 4]>) -> Self {
        let valence = quad_valences(&quads);
        Self {
            id,
            boundary_size,
            quads,
            valence,
        }
    }

    /// Total number of vertices.
    pub fn num_vertices(&self) -> usize {
        self.valence.len()
    }

    /// Valences of the boundary vertices, in boundary order.
    pub fn boundary_valence_loop(&self) -> Vec<usize> {
        boundary_valence_loop(&self.quads, self.boundary_size)
    }
}

/// Number of quads incident to each vertex (max id + 1 entries).
pub fn quad_valences(quads: &[[usize; 4]]) -> Vec<usize> {
    let mut valence = Vec::with_capacity(quads.len() * 4);
    for &v in quads.iter().flatten() {
        if v >= valence.len() {
            valence.resize(v + 1, 0);
        }
        valence[v] += 1;
    }
    valence
}

/// Number of quads incident to each of the first `boundary_size` vertices.
pub fn boundary_valence_loop(quads: &[[usize; 4]], boundary_size: usize) -> Vec<usize> {
    let mut bvl = vec![0; boundary_size];
    for &v in quads.iter().flatten() {
        if v < boundary_size {
            bvl[v] += 1;
        }
    }
    bvl
}

/// Disk quadrangulations grouped by boundary size.
#[derive(Debug, Clone, Default)]
pub struct DiskLibrary {
    by_boundary: Vec<Vec<DiskQuadrangulation>>,
    bvl_index: Vec<HashMap<Vec<usize>, Vec<usize>>>,
}

static GLOBAL_LIBRARY: OnceLock<DiskLibrary> = OnceLock::new();

impl DiskLibrary {
    /// Parse a library from text, skipping malformed lines.
    pub fn parse(text: &str) -> Self {
        let mut library = Self::default();
        let mut skipped = 0;
        for (i, line) in text.lines().enumerate() {
            if line.trim().is_empty() {
                continue;
            }
            match parse_record(i + 1, line) {
                Ok(record) => library.insert(record),
                Err(e) => {
                    warn!("{}", e);
                    skipped += 1;
                }
            }
        }
        info!(
            "{} disk quadrangulations loaded ({} lines skipped)",
            library.len(),
            skipped
        );
        library
    }

    /// Add a quadrangulation and index it by its boundary-valence loop.
    pub fn insert(&mut self, quadrangulation: DiskQuadrangulation) {
        let b = quadrangulation.boundary_size;
        if b >= self.by_boundary.len() {
            self.by_boundary.resize_with(b + 1, Vec::new);
            self.bvl_index.resize_with(b + 1, HashMap::new);
        }
        let index = self.by_boundary[b].len();
        let bvl = quadrangulation.boundary_valence_loop();
        self.bvl_index[b].entry(bvl).or_default().push(index);
        self.by_boundary[b].push(quadrangulation);
    }

    /// The process-wide library, parsed on first access.
    ///
    /// Uses the text passed to [`DiskLibrary::install_global`] if that was
    /// called first, and [`EMBEDDED_LIBRARY`] otherwise.
    pub fn global() -> &'static DiskLibrary {
        GLOBAL_LIBRARY.get_or_init(|| Self::parse(EMBEDDED_LIBRARY))
    }

    /// Install `text` as the process-wide library.
    ///
    /// Returns `false`, leaving the existing library in place, when the global
    /// library was already initialized.
    pub fn install_global(text: &str) -> bool {
        if GLOBAL_LIBRARY.get().is_some() {
            debug!("disk library already initialized, ignoring install");
            return false;
        }
        GLOBAL_LIBRARY.set(Self::parse(text)).is_ok()
    }

    /// Quadrangulations with the given boundary size.
    pub fn with_boundary_size(&self, boundary_size: usize) -> &[DiskQuadrangulation] {
        self.by_boundary
            .get(boundary_size)
            .map(Vec::as_slice)
            .unwrap_or(&[])
    }

    /// Indices (into [`with_boundary_size`](Self::with_boundary_size)) of the
    /// quadrangulations whose boundary-valence loop is exactly `bvl`.
    pub fn lookup(&self, bvl: &[usize]) -> &[usize] {
        self.bvl_index
            .get(bvl.len())
            .and_then(|index| index.get(bvl))
            .map(Vec::as_slice)
            .unwrap_or(&[])
    }

    /// Boundary sizes that have at least one quadrangulation.
    pub fn boundary_sizes(&self) -> impl Iterator<Item = usize> + '_ {
        self.by_boundary
            .iter()
            .enumerate()
            .filter(|(_, v)| !v.is_empty())
            .map(|(b, _)| b)
    }

    /// Largest boundary size in the library (0 when empty).
    pub fn max_boundary_size(&self) -> usize {
        self.boundary_sizes().last().unwrap_or(0)
    }

    /// Total number of quadrangulations.
    pub fn len(&self) -> usize {
        self.by_boundary.iter().map(Vec::len).sum()
    }

    /// Whether the library is empty.
    pub fn is_empty(&self) -> bool {
        self.len() == 0
    }
}

fn parse_record(line_no: usize, line: &str) -> Result<DiskQuadrangulation, PatternError> {
    let malformed = |reason: String| PatternError::MalformedRecord {
        line: line_no,
        reason,
    };

    let numbers: Vec<usize> = line
        .split_whitespace()
        .map(|t| {
            t.parse::<usize>()
                .map_err(|_| malformed(format!("'{}' is not a non-negative integer", t)))
        })
        .collect::<Result<_, _>>()?;

    if numbers.len() < 7 {
        return Err(malformed(format!(
            "{} tokens, a record needs at least 7",
            numbers.len()
        )));
    }
    let (b, id, q) = (numbers[0], numbers[1], numbers[2]);
    let expected = q.checked_mul(4).and_then(|n| n.checked_add(3));
    if expected != Some(numbers.len()) {
        return Err(malformed(format!(
            "B={}, I={}, Q={} does not match {} tokens",
            b,
            id,
            q,
            numbers.len()
        )));
    }
    if b < 3 {
        return Err(malformed(format!("boundary size {} is too small", b)));
    }

    let quads: Vec<[usize; 4]> = numbers[3..]
        .chunks_exact(4)
        .map(|c| [c[0], c[1], c[2], c[3]])
        .collect();
    let record = DiskQuadrangulation::new(id, b, quads);
    if record.num_vertices() < b {
        return Err(malformed(format!(
            "only {} vertices for a boundary of {}",
            record.num_vertices(),
            b
        )));
    }
    Ok(record)
}
