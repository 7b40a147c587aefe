//! Valence-driven filling of small cavities.
//!
//! Small holes are filled straight from the disk-quadrangulation library
//! instead of the side-length matcher. Each boundary vertex comes with the
//! number of new quads it ideally receives and the range it may receive; the
//! library candidate (in any rotation or reflection) that best meets these
//! targets while keeping interior vertices close to valence 4 wins.

use std::hash::Hash;
use std::ops::RangeInclusive;

use log::debug;
use rayon::prelude::*;

use super::smooth::{smooth_new_vertices, SmoothOptions};
use crate::error::{PatternError, Result};
use crate::mesh::{centroid, BoundaryVertex, CavityPatch, Orientation};
use crate::pattern::usage::{record_usage, PatternRef};
use crate::pattern::{DiskLibrary, DiskQuadrangulation};

/// Penalty for giving two or more quads to a vertex that ideally takes one.
const OVER_FILL_PENALTY: f64 = 1000.0;

/// Weight of the squared deviation from a boundary vertex's ideal valence.
const BOUNDARY_WEIGHT: f64 = 10.0;

/// Options for small-cavity filling.
#[derive(Debug, Clone)]
pub struct SmallCavityOptions {
    /// Smoothing applied to the generated vertices.
    pub smoothing: SmoothOptions,

    /// Whether to score library candidates in parallel (default: true).
    pub parallel: bool,
}

impl Default for SmallCavityOptions {
    fn default() -> Self {
        Self {
            smoothing: SmoothOptions::default(),
            parallel: true,
        }
    }
}

impl SmallCavityOptions {
    /// Set the smoothing options.
    pub fn with_smoothing(mut self, smoothing: SmoothOptions) -> Self {
        self.smoothing = smoothing;
        self
    }

    /// Set whether to use parallel execution.
    pub fn with_parallel(mut self, parallel: bool) -> Self {
        self.parallel = parallel;
        self
    }
}

/// The chosen library candidate for a small cavity.
#[derive(Debug, Clone, PartialEq)]
pub struct SmallCavityMatch {
    /// Index among the library entries with this boundary size.
    pub index: usize,
    /// How the cavity boundary is re-read to line up with the candidate.
    pub orientation: Orientation,
    /// Irregularity score of the candidate; lower is better.
    pub irregularity: f64,
}

/// Irregularity of a candidate with per-vertex `valence` against boundary
/// targets already lined up with the candidate's boundary.
///
/// Returns infinity when a boundary valence falls outside its allowed range.
pub fn irregularity(
    valence: &[usize],
    ideal: &[usize],
    allowed: &[RangeInclusive<usize>],
) -> f64 {
    let b = ideal.len();
    let mut score = 0.0;
    for k in 0..b {
        let actual = valence.get(k).copied().unwrap_or(0);
        if !allowed[k].contains(&actual) {
            return f64::INFINITY;
        }
        score += if ideal[k] <= 1 && actual >= 2 {
            OVER_FILL_PENALTY
        } else {
            let d = ideal[k] as f64 - actual as f64;
            BOUNDARY_WEIGHT * d * d
        };
    }
    for &v in valence.iter().skip(b) {
        let d = 4.0 - v as f64;
        score += d * d;
    }
    score
}

/// Best orientation of one candidate: lowest score, first in
/// [`Orientation::all`] order on ties. `None` when every orientation is
/// infeasible.
fn best_orientation(
    valence: &[usize],
    ideal: &[usize],
    allowed: &[RangeInclusive<usize>],
) -> Option<(Orientation, f64)> {
    let mut best: Option<(Orientation, f64)> = None;
    for orientation in Orientation::all(ideal.len()) {
        let score = irregularity(
            valence,
            &orientation.apply(ideal),
            &orientation.apply(allowed),
        );
        if score.is_finite() && best.map_or(true, |(_, s)| score < s) {
            best = Some((orientation, score));
        }
    }
    best
}

/// Pick the library candidate that best fits the boundary targets.
///
/// `ideal[k]` and `allowed[k]` describe boundary vertex `k`. Returns `None`
/// when the library has no entry for this boundary size, when the two slices
/// differ in length, or when every candidate violates an allowed range. Ties
/// go to the lowest candidate index.
pub fn match_small_cavity(
    library: &DiskLibrary,
    ideal: &[usize],
    allowed: &[RangeInclusive<usize>],
    options: &SmallCavityOptions,
) -> Option<SmallCavityMatch> {
    if ideal.len() != allowed.len() || ideal.is_empty() {
        return None;
    }
    let candidates = library.with_boundary_size(ideal.len());

    let score = |(index, candidate): (usize, &DiskQuadrangulation)| {
        best_orientation(&candidate.valence, ideal, allowed).map(|(orientation, irregularity)| {
            SmallCavityMatch {
                index,
                orientation,
                irregularity,
            }
        })
    };
    let better = |a: &SmallCavityMatch, b: &SmallCavityMatch| {
        a.irregularity
            .total_cmp(&b.irregularity)
            .then(a.index.cmp(&b.index))
    };

    let best = if options.parallel {
        candidates
            .par_iter()
            .enumerate()
            .filter_map(score)
            .min_by(better)
    } else {
        candidates.iter().enumerate().filter_map(score).min_by(better)
    };

    debug!(
        "small cavity of {} vertices: {} candidates, best {:?}",
        ideal.len(),
        candidates.len(),
        best
    );
    best
}

/// Fill a small cavity bounded by `boundary` with a library quadrangulation.
///
/// The boundary loop, `ideal` and `allowed` are indexed alike. New vertices
/// start at the boundary centroid and are then smoothed. Returns `Ok(None)`
/// when no candidate fits.
///
/// # Errors
///
/// [`InvalidCavity`](PatternError::InvalidCavity) when the three inputs
/// differ in length or the boundary is empty.
pub fn remesh_small_cavity<H: Copy + Eq + Hash>(
    library: &DiskLibrary,
    boundary: &[BoundaryVertex<H>],
    ideal: &[usize],
    allowed: &[RangeInclusive<usize>],
    options: &SmallCavityOptions,
) -> Result<Option<CavityPatch<H>>> {
    if boundary.is_empty() || boundary.len() != ideal.len() || boundary.len() != allowed.len() {
        return Err(PatternError::InvalidCavity(format!(
            "{} boundary vertices with {} ideal valences and {} allowed ranges",
            boundary.len(),
            ideal.len(),
            allowed.len()
        )));
    }
    let Some(found) = match_small_cavity(library, ideal, allowed, options) else {
        return Ok(None);
    };

    let b = boundary.len();
    let candidate = library
        .with_boundary_size(b)
        .get(found.index)
        .ok_or_else(|| {
            PatternError::InvariantViolation(format!("library has no candidate {}", found.index))
        })?;

    let oriented = found.orientation.apply(boundary);
    let start = centroid(boundary);
    let mut patch = CavityPatch::new();
    let mut vertices = Vec::with_capacity(candidate.num_vertices());
    for v in 0..candidate.num_vertices() {
        let pv = if v < b {
            patch.add_boundary(oriented[v])
        } else {
            patch.add_vertex(start, candidate.valence[v] != 4)
        };
        vertices.push(pv);
    }
    for quad in &candidate.quads {
        patch.add_quad(quad.map(|v| vertices[v]));
    }
    if found.orientation.mirrored {
        patch.reverse_quads();
    }

    smooth_new_vertices(&mut patch, &options.smoothing);
    record_usage(PatternRef::Disk {
        boundary_size: b,
        index: found.index,
    });
    Ok(Some(patch))
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::collections::{HashMap, HashSet};

    use crate::mesh::{circular_loop, QuadSoup};
    use crate::pattern::library::EMBEDDED_LIBRARY;

    fn library() -> DiskLibrary {
        DiskLibrary::parse(EMBEDDED_LIBRARY)
    }

    fn ranges(n: usize, r: RangeInclusive<usize>) -> Vec<RangeInclusive<usize>> {
        vec![r; n]
    }

    #[test]
    fn test_irregularity_terms() {
        // Quad strip: boundary valences 2,1,1,2,1,1.
        let valence = [2, 1, 1, 2, 1, 1];
        let all = ranges(6, 1..=3);
        assert_eq!(irregularity(&valence, &[2, 1, 1, 2, 1, 1], &all), 0.0);
        assert_eq!(irregularity(&valence, &[1, 1, 1, 2, 1, 1], &all), 1000.0);
        assert_eq!(irregularity(&valence, &[3, 1, 1, 2, 1, 1], &all), 10.0);
        assert!(irregularity(&valence, &[2, 1, 1, 2, 1, 1], &ranges(6, 2..=3)).is_infinite());

        // Interior vertices add their squared distance to valence 4.
        assert_eq!(irregularity(&[1, 1, 1, 1, 3, 5], &[1, 1, 1, 1], &ranges(4, 1..=3)), 2.0);
    }

    #[test]
    fn test_single_quad() {
        let m = match_small_cavity(&library(), &[1, 1, 1, 1], &ranges(4, 1..=2), &Default::default())
            .unwrap();
        assert_eq!(m.index, 0);
        assert_eq!(m.irregularity, 0.0);
        assert_eq!(m.orientation, Orientation::identity());
    }

    #[test]
    fn test_rotation_is_found() {
        let lib = library();
        let options = SmallCavityOptions::default();
        let m = match_small_cavity(&lib, &[1, 2, 1, 1, 2, 1], &ranges(6, 1..=3), &options).unwrap();
        assert_eq!((m.index, m.orientation, m.irregularity), (0, Orientation::rotated(1), 0.0));

        let m = match_small_cavity(&lib, &[2, 1, 1, 2, 1, 1], &ranges(6, 1..=3), &options).unwrap();
        assert_eq!((m.index, m.orientation), (0, Orientation::identity()));

        let m = match_small_cavity(&lib, &[1, 2, 1, 2, 1, 2, 1, 2], &ranges(8, 1..=3), &options)
            .unwrap();
        assert_eq!(m.index, 3);
        assert_eq!(m.irregularity, 0.0);
    }

    #[test]
    fn test_range_forces_penalty() {
        // Every vertex must take at least two quads, though one is ideal.
        let m = match_small_cavity(&library(), &[1, 1, 1, 1], &ranges(4, 2..=3), &Default::default())
            .unwrap();
        assert_eq!(m.index, 1);
        assert_eq!(m.irregularity, 4004.0);
    }

    #[test]
    fn test_valence_infeasibility() {
        let lib = library();
        let options = SmallCavityOptions::default();
        // Every library boundary vertex has valence at most 3.
        assert!(match_small_cavity(&lib, &[4, 4, 4, 4], &ranges(4, 4..=4), &options).is_none());
        // No entries for this boundary size.
        assert!(match_small_cavity(&lib, &[1, 1, 1, 1, 1], &ranges(5, 1..=3), &options).is_none());
        // Mismatched inputs.
        assert!(match_small_cavity(&lib, &[1, 1, 1, 1], &ranges(3, 1..=3), &options).is_none());
    }

    #[test]
    fn test_parallel_matches_sequential() {
        let lib = library();
        let ideal = [2, 2, 1, 2, 2, 1, 2, 2, 1, 1];
        let allowed = ranges(10, 1..=3);
        let par = match_small_cavity(&lib, &ideal, &allowed, &SmallCavityOptions::default());
        let seq = match_small_cavity(
            &lib,
            &ideal,
            &allowed,
            &SmallCavityOptions::default().with_parallel(false),
        );
        assert_eq!(par, seq);
        assert_eq!(par.map(|m| m.index), Some(11));
    }

    #[test]
    fn test_remesh_small_cavity_fills_loop() {
        let lib = library();
        let cases: [&[usize]; 3] = [&[1, 1, 1, 1], &[1, 2, 1, 1, 2, 1], &[1, 2, 1, 2, 1, 2, 1, 2]];
        for ideal in cases {
            let (mut soup, ring) = circular_loop(ideal.len(), 1.0);
            let allowed = ranges(ideal.len(), 1..=3);
            let patch = remesh_small_cavity(&lib, &ring, ideal, &allowed, &Default::default())
                .unwrap()
                .unwrap();
            let handles: Vec<usize> = ring.iter().map(|v| v.handle).collect();
            patch.commit(&mut soup);
            assert_fills_loop(&soup, &handles);
        }
    }

    #[test]
    fn test_remesh_small_cavity_counts() {
        let (_, ring) = circular_loop(8, 1.0);
        let patch = remesh_small_cavity(
            &library(),
            &ring,
            &[1, 2, 1, 2, 1, 2, 1, 2],
            &ranges(8, 1..=3),
            &Default::default(),
        )
        .unwrap()
        .unwrap();
        assert_eq!(patch.num_quads(), 4);
        assert_eq!(patch.num_new_vertices(), 1);
        assert_eq!(patch.num_irregular(), 0);
        // The center is pulled to the middle of the loop.
        assert!(patch.new_vertices()[0].position.coords.norm() < 1e-9);
    }

    #[test]
    fn test_mirrored_candidate_keeps_winding() {
        let lib = library();
        let ideal = [1, 2, 1, 2, 2, 1, 1, 3];
        let allowed = ranges(8, 1..=3);
        let m = match_small_cavity(&lib, &ideal, &allowed, &Default::default()).unwrap();
        assert_eq!(m.index, 2);
        assert_eq!(m.orientation, Orientation::mirrored(0));
        assert_eq!(m.irregularity, 1.0);

        let (mut soup, ring) = circular_loop(8, 1.0);
        let patch = remesh_small_cavity(&lib, &ring, &ideal, &allowed, &Default::default())
            .unwrap()
            .unwrap();
        assert_eq!(patch.num_quads(), 4);
        let handles: Vec<usize> = ring.iter().map(|v| v.handle).collect();
        patch.commit(&mut soup);
        assert_fills_loop(&soup, &handles);
    }

    #[test]
    fn test_input_length_mismatch_is_error() {
        let (_, ring) = circular_loop(4, 1.0);
        let result = remesh_small_cavity(
            &library(),
            &ring,
            &[1, 1, 1],
            &ranges(4, 1..=3),
            &Default::default(),
        );
        assert!(matches!(result, Err(PatternError::InvalidCavity(_))));
    }

    fn assert_fills_loop(soup: &QuadSoup, ring: &[usize]) {
        let mut directed: HashMap<(usize, usize), usize> = HashMap::new();
        for q in &soup.quads {
            for k in 0..4 {
                *directed.entry((q[k], q[(k + 1) % 4])).or_default() += 1;
            }
        }
        assert!(directed.values().all(|&n| n == 1));
        let open: HashSet<(usize, usize)> = directed
            .keys()
            .filter(|&&(a, b)| !directed.contains_key(&(b, a)))
            .copied()
            .collect();
        let expected: HashSet<(usize, usize)> = (0..ring.len())
            .map(|k| (ring[k], ring[(k + 1) % ring.len()]))
            .collect();
        assert_eq!(open, expected);
    }
}
