//! Cavity boundaries and their orientations.
//!
//! A cavity is a disk-shaped hole in the caller's mesh, described by its
//! boundary loop split into sides. Vertices on the boundary belong to the
//! caller: each carries an opaque handle `H` plus its position.

use nalgebra::{Point3, Vector3};

use crate::error::{PatternError, Result};

/// A caller-owned vertex on a cavity boundary.
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct BoundaryVertex<H> {
    /// The caller's handle for this vertex.
    pub handle: H,
    /// Position of the vertex.
    pub position: Point3<f64>,
}

impl<H> BoundaryVertex<H> {
    /// Create a boundary vertex.
    pub fn new(handle: H, position: Point3<f64>) -> Self {
        Self { handle, position }
    }
}

/// How a cyclic sequence is re-read before being matched against a pattern.
///
/// The sequence is first reversed when `mirrored` is set, then rotated left by
/// `shift`, so element `shift` of the (possibly reversed) input becomes
/// element 0.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Default)]
pub struct Orientation {
    /// Left rotation applied after the optional reversal.
    pub shift: usize,
    /// Whether the sequence is read in reverse.
    pub mirrored: bool,
}

impl Orientation {
    /// The identity orientation.
    pub fn identity() -> Self {
        Self::default()
    }

    /// A forward rotation.
    pub fn rotated(shift: usize) -> Self {
        Self {
            shift,
            mirrored: false,
        }
    }

    /// A rotation of the reversed sequence.
    pub fn mirrored(shift: usize) -> Self {
        Self {
            shift,
            mirrored: true,
        }
    }

    /// All orientations of a cycle of length `n`: every forward rotation, then
    /// every rotation of the reversed cycle.
    pub fn all(n: usize) -> impl Iterator<Item = Orientation> {
        (0..n)
            .map(Orientation::rotated)
            .chain((0..n).map(Orientation::mirrored))
    }

    /// Apply this orientation to a sequence.
    pub fn apply<T: Clone>(&self, seq: &[T]) -> Vec<T> {
        let mut out: Vec<T> = seq.to_vec();
        if self.mirrored {
            out.reverse();
        }
        if !out.is_empty() {
            let k = self.shift % out.len();
            out.rotate_left(k);
        }
        out
    }
}

/// A cavity boundary: an ordered loop of sides.
///
/// The last vertex of each side is the first vertex of the next one, and the
/// last side closes back on the first vertex of side 0.
#[derive(Debug, Clone)]
pub struct Cavity<H> {
    sides: Vec<Vec<BoundaryVertex<H>>>,
}

impl<H: Copy + Eq> Cavity<H> {
    /// Create a cavity from its sides, checking that consecutive sides share
    /// their corner vertex.
    pub fn new(sides: Vec<Vec<BoundaryVertex<H>>>) -> Result<Self> {
        if sides.is_empty() {
            return Err(PatternError::InvalidCavity("cavity has no sides".into()));
        }
        for (s, side) in sides.iter().enumerate() {
            if side.len() < 2 {
                return Err(PatternError::InvalidCavity(format!(
                    "side {} has {} vertices, at least 2 are required",
                    s,
                    side.len()
                )));
            }
        }
        let n = sides.len();
        for s in 0..n {
            let last = sides[s][sides[s].len() - 1].handle;
            let next_first = sides[(s + 1) % n][0].handle;
            if last != next_first {
                return Err(PatternError::InvalidCavity(format!(
                    "side {} does not end where side {} starts",
                    s,
                    (s + 1) % n
                )));
            }
        }
        Ok(Self { sides })
    }

    /// The sides, in boundary order.
    pub fn sides(&self) -> &[Vec<BoundaryVertex<H>>] {
        &self.sides
    }

    /// Number of sides.
    pub fn num_sides(&self) -> usize {
        self.sides.len()
    }

    /// Number of vertices on each side, corners included.
    pub fn side_sizes(&self) -> Vec<usize> {
        self.sides.iter().map(Vec::len).collect()
    }

    /// The sides as seen through `orientation`.
    ///
    /// A mirrored orientation also reverses every side so that consecutive
    /// sides still chain end-to-start.
    pub fn oriented_sides(&self, orientation: Orientation) -> Vec<Vec<BoundaryVertex<H>>> {
        let mut sides = orientation.apply(&self.sides);
        if orientation.mirrored {
            for side in &mut sides {
                side.reverse();
            }
        }
        sides
    }

    /// The boundary loop without repeated corners.
    pub fn boundary_loop(&self) -> Vec<BoundaryVertex<H>> {
        self.sides
            .iter()
            .flat_map(|side| side[..side.len() - 1].iter().copied())
            .collect()
    }

    /// Centroid of the boundary loop.
    pub fn centroid(&self) -> Point3<f64> {
        centroid(&self.boundary_loop())
    }
}

/// Centroid of a set of boundary vertices (origin when empty).
pub(crate) fn centroid<H>(vertices: &[BoundaryVertex<H>]) -> Point3<f64> {
    if vertices.is_empty() {
        return Point3::origin();
    }
    let sum: Vector3<f64> = vertices.iter().map(|v| v.position.coords).sum();
    Point3::from(sum / vertices.len() as f64)
}
