//! Filling a cavity with a subdivided quad pattern.
//!
//! Given a pattern, a quantization (segments per chord) and the cavity sides
//! lined up with the pattern sides, [`remesh`] builds the quads that fill the
//! cavity:
//!
//! 1. Each cavity side is sliced into one vertex run per pattern edge on that
//!    side.
//! 2. Every interior pattern vertex becomes a new vertex. Its starting layout
//!    is the cavity centroid, relaxed over the pattern graph with the boundary
//!    pinned.
//! 3. Every interior pattern edge gets an evenly spaced run of new vertices.
//! 4. Each pattern quad, now bounded by four runs of `n`, `m`, `n` and `m`
//!    segments, is filled with an `n × m` grid by transfinite (Coons)
//!    interpolation.
//!
//! Everything is created inside a [`CavityPatch`]; on error the patch is
//! dropped and the caller's mesh never sees a partial result.
//!
//! # Example
//!
//! ```
//! use quadpatch::algo::remesh::{fill_cavity, RemeshOptions};
//! use quadpatch::mesh::circular_cavity;
//!
//! let (mut soup, cavity) = circular_cavity(&[3, 3, 3, 3], 1.0).unwrap();
//! let patch = fill_cavity(&cavity, &RemeshOptions::default()).unwrap().unwrap();
//! assert_eq!(patch.num_quads(), 4);
//!
//! patch.commit(&mut soup);
//! assert_eq!(soup.num_vertices(), 9);
//! ```

use std::collections::HashMap;
use std::hash::Hash;

use log::debug;
use nalgebra::{Point3, Vector3};

use super::matcher::{find_best_pattern, MatchOptions, PatternMatch};
use super::smooth::{smooth_new_vertices, SmoothOptions};
use crate::error::{PatternError, Result};
use crate::mesh::{centroid, BoundaryVertex, Cavity, CavityPatch, PatchVertex, VertexId};
use crate::pattern::usage::{record_usage, PatternRef};
use crate::pattern::{PatternCatalog, PatternTopology};

/// Relaxation sweeps used to lay out interior pattern vertices.
const LAYOUT_ITERATIONS: usize = 20;

/// Options for cavity remeshing.
#[derive(Debug, Clone, Default)]
pub struct RemeshOptions {
    /// Pattern matching options.
    pub matching: MatchOptions,
    /// Smoothing applied to the generated vertices.
    pub smoothing: SmoothOptions,
}

impl RemeshOptions {
    /// Set the matching options.
    pub fn with_matching(mut self, matching: MatchOptions) -> Self {
        self.matching = matching;
        self
    }

    /// Set the smoothing options.
    pub fn with_smoothing(mut self, smoothing: SmoothOptions) -> Self {
        self.smoothing = smoothing;
        self
    }
}

// ============================================================================
// Validation
// ============================================================================

/// Check that `quantization` is usable for `pattern` with cavity sides of
/// `side_sizes` vertices, in pattern side order.
pub fn validate_quantization(
    pattern: &PatternTopology,
    quantization: &[usize],
    side_sizes: &[usize],
) -> Result<()> {
    if side_sizes.len() != pattern.num_sides() {
        return Err(PatternError::SideCountMismatch {
            pattern: pattern.num_sides(),
            cavity: side_sizes.len(),
        });
    }
    if quantization.len() != pattern.num_chords() {
        return Err(PatternError::InvariantViolation(format!(
            "{} quantization values for {} chords",
            quantization.len(),
            pattern.num_chords()
        )));
    }
    if quantization.contains(&0) {
        return Err(PatternError::InvariantViolation(
            "quantization values must be positive".into(),
        ));
    }
    for (s, side) in pattern.sides().iter().enumerate() {
        let expected = side
            .iter()
            .map(|&e| quantization[pattern.edge_chord(e).index()])
            .sum::<usize>()
            + 1;
        if side_sizes[s] != expected {
            return Err(PatternError::SideLengthMismatch {
                side: s,
                expected,
                actual: side_sizes[s],
            });
        }
    }
    Ok(())
}

// ============================================================================
// Vertex runs
// ============================================================================

/// Vertex runs keyed by the sorted pattern edge, stored from the lower to the
/// higher pattern vertex.
#[derive(Default)]
struct EdgeRuns {
    runs: HashMap<(VertexId, VertexId), Vec<PatchVertex>>,
}

impl EdgeRuns {
    /// Store a run going from `a` to `b`.
    fn insert(&mut self, a: VertexId, b: VertexId, mut run: Vec<PatchVertex>) {
        if a > b {
            run.reverse();
            self.runs.insert((b, a), run);
        } else {
            self.runs.insert((a, b), run);
        }
    }

    /// The run going from `a` to `b`.
    fn get(&self, a: VertexId, b: VertexId) -> Result<Vec<PatchVertex>> {
        let key = if a < b { (a, b) } else { (b, a) };
        let mut run = self
            .runs
            .get(&key)
            .cloned()
            .ok_or(PatternError::MissingVertexRun {
                v0: a.index(),
                v1: b.index(),
            })?;
        if a > b {
            run.reverse();
        }
        Ok(run)
    }
}

// ============================================================================
// Construction
// ============================================================================

/// Positions of all pattern vertices: boundary vertices at their anchors,
/// interior vertices relaxed from `start` over the pattern edge graph.
fn layout_pattern(
    pattern: &PatternTopology,
    anchors: &[Option<Point3<f64>>],
    start: Point3<f64>,
) -> Result<Vec<Point3<f64>>> {
    let mut positions = Vec::with_capacity(pattern.num_vertices());
    for v in pattern.vertex_ids() {
        let p = match anchors[v.index()] {
            Some(p) => p,
            None if pattern.is_boundary_vertex(v) => {
                return Err(PatternError::InvariantViolation(format!(
                    "boundary pattern vertex {} is on no side",
                    v.index()
                )))
            }
            None => start,
        };
        positions.push(p);
    }

    let interior: Vec<VertexId> = pattern
        .vertex_ids()
        .filter(|&v| !pattern.is_boundary_vertex(v))
        .collect();
    for _ in 0..LAYOUT_ITERATIONS {
        let updated: Vec<Point3<f64>> = interior
            .iter()
            .map(|&v| {
                let edges = pattern.vertex_edges(v);
                let sum: Vector3<f64> = edges
                    .iter()
                    .map(|&e| {
                        let [a, b] = pattern.edge_vertices(e);
                        let other = if a == v { b } else { a };
                        positions[other.index()].coords
                    })
                    .sum();
                Point3::from(sum / edges.len().max(1) as f64)
            })
            .collect();
        for (&v, p) in interior.iter().zip(updated) {
            positions[v.index()] = p;
        }
    }
    Ok(positions)
}

/// Fill one pattern quad bounded by four vertex runs.
///
/// `curves[k]` runs from quad corner `k` to corner `k + 1`. The grid is
/// indexed `(i, j)` with `i` along `curves[0]` and `j` along `curves[1]`.
fn fill_coons<H: Copy + Eq + Hash>(
    patch: &mut CavityPatch<H>,
    curves: &[Vec<PatchVertex>; 4],
) -> Result<()> {
    let n = curves[0].len().saturating_sub(1);
    let m = curves[1].len().saturating_sub(1);
    if n == 0 || m == 0 || curves[2].len() != n + 1 || curves[3].len() != m + 1 {
        return Err(PatternError::InvariantViolation(format!(
            "quad boundary runs of lengths {}, {}, {}, {} do not form a grid",
            curves[0].len(),
            curves[1].len(),
            curves[2].len(),
            curves[3].len()
        )));
    }

    let pts: Vec<Vec<Vector3<f64>>> = curves
        .iter()
        .map(|c| c.iter().map(|&v| patch.position(v).coords).collect())
        .collect();
    let (bottom, right, top, left) = (&pts[0], &pts[1], &pts[2], &pts[3]);
    let p00 = bottom[0];
    let p10 = bottom[n];
    let p11 = right[m];
    let p01 = top[n];

    let idx = |i: usize, j: usize| j * (n + 1) + i;
    let mut grid: Vec<Option<PatchVertex>> = vec![None; (n + 1) * (m + 1)];
    for i in 0..=n {
        grid[idx(i, 0)] = Some(curves[0][i]);
        grid[idx(i, m)] = Some(curves[2][n - i]);
    }
    for j in 0..=m {
        grid[idx(0, j)] = Some(curves[3][m - j]);
        grid[idx(n, j)] = Some(curves[1][j]);
    }

    for j in 1..m {
        let v = j as f64 / m as f64;
        for i in 1..n {
            let u = i as f64 / n as f64;
            let p = bottom[i] * (1.0 - v) + top[n - i] * v + left[m - j] * (1.0 - u) + right[j] * u
                - (p00 * ((1.0 - u) * (1.0 - v))
                    + p10 * (u * (1.0 - v))
                    + p11 * (u * v)
                    + p01 * ((1.0 - u) * v));
            grid[idx(i, j)] = Some(patch.add_vertex(Point3::from(p), false));
        }
    }

    let grid: Vec<PatchVertex> = grid
        .into_iter()
        .collect::<Option<_>>()
        .ok_or_else(|| PatternError::InvariantViolation("unfilled grid cell".into()))?;
    for j in 0..m {
        for i in 0..n {
            patch.add_quad([
                grid[idx(i, j)],
                grid[idx(i + 1, j)],
                grid[idx(i + 1, j + 1)],
                grid[idx(i, j + 1)],
            ]);
        }
    }
    Ok(())
}

/// Build the quads filling a cavity with a subdivided pattern.
///
/// `sides` must already be lined up with the pattern sides: side `s` starts
/// at the corner where pattern side `s` starts and runs the same way. Quads
/// come out with the winding of the pattern quads, which follows the order
/// of `sides`.
///
/// # Errors
///
/// [`SideCountMismatch`](PatternError::SideCountMismatch) or
/// [`SideLengthMismatch`](PatternError::SideLengthMismatch) when the sides do
/// not fit the quantization, [`MissingVertexRun`](PatternError::MissingVertexRun)
/// when a quad edge has no vertex run, and
/// [`InvariantViolation`](PatternError::InvariantViolation) on an inconsistent
/// pattern.
pub fn remesh<H: Copy + Eq + Hash>(
    pattern: &PatternTopology,
    quantization: &[usize],
    sides: &[Vec<BoundaryVertex<H>>],
) -> Result<CavityPatch<H>> {
    let side_sizes: Vec<usize> = sides.iter().map(Vec::len).collect();
    validate_quantization(pattern, quantization, &side_sizes)?;

    let mut patch = CavityPatch::new();
    let mut runs = EdgeRuns::default();
    let mut corners: Vec<Option<PatchVertex>> = vec![None; pattern.num_vertices()];
    let mut anchors: Vec<Option<Point3<f64>>> = vec![None; pattern.num_vertices()];

    for (side, vertices) in pattern.sides().iter().zip(sides) {
        let mut offset = 0;
        for &e in side {
            let [a, b] = pattern.edge_vertices(e);
            let q = quantization[pattern.edge_chord(e).index()];
            let run: Vec<PatchVertex> = vertices[offset..=offset + q]
                .iter()
                .map(|&v| patch.add_boundary(v))
                .collect();
            corners[a.index()] = Some(run[0]);
            corners[b.index()] = Some(run[q]);
            anchors[a.index()] = Some(vertices[offset].position);
            anchors[b.index()] = Some(vertices[offset + q].position);
            runs.insert(a, b, run);
            offset += q;
        }
    }

    let ring: Vec<BoundaryVertex<H>> = sides
        .iter()
        .flat_map(|side| side[..side.len() - 1].iter().copied())
        .collect();
    let layout = layout_pattern(pattern, &anchors, centroid(&ring))?;
    for v in pattern.vertex_ids() {
        if !pattern.is_boundary_vertex(v) {
            corners[v.index()] = Some(patch.add_vertex(layout[v.index()], pattern.valence(v) != 4));
        }
    }

    let corner = |v: VertexId| {
        corners[v.index()].ok_or_else(|| {
            PatternError::InvariantViolation(format!("pattern vertex {} was not placed", v.index()))
        })
    };
    for e in pattern.edge_ids().filter(|&e| !pattern.is_boundary_edge(e)) {
        let [a, b] = pattern.edge_vertices(e);
        let (start, end) = (corner(a)?, corner(b)?);
        let q = quantization[pattern.edge_chord(e).index()];
        let p0 = patch.position(start);
        let p1 = patch.position(end);
        let mut run = Vec::with_capacity(q + 1);
        run.push(start);
        for k in 1..q {
            let t = k as f64 / q as f64;
            run.push(patch.add_vertex(p0 + (p1 - p0) * t, false));
        }
        run.push(end);
        runs.insert(a, b, run);
    }

    for quad in pattern.quad_ids() {
        let qv = pattern.quad_vertices(quad);
        let curves = [
            runs.get(qv[0], qv[1])?,
            runs.get(qv[1], qv[2])?,
            runs.get(qv[2], qv[3])?,
            runs.get(qv[3], qv[0])?,
        ];
        fill_coons(&mut patch, &curves)?;
    }

    Ok(patch)
}

/// Remesh a cavity with a pattern chosen by the matcher.
///
/// The cavity is re-read through the match orientation, remeshed and
/// smoothed. For a mirrored match every quad is reversed so that the result
/// keeps the winding of the cavity's own boundary order.
pub fn remesh_cavity<H: Copy + Eq + Hash>(
    catalog: &PatternCatalog,
    cavity: &Cavity<H>,
    found: &PatternMatch,
    options: &RemeshOptions,
) -> Result<CavityPatch<H>> {
    let pattern = catalog.get(found.pattern).ok_or_else(|| {
        PatternError::InvariantViolation(format!("pattern {} is not in the catalog", found.pattern))
    })?;
    let sides = cavity.oriented_sides(found.orientation);
    let mut patch = remesh(pattern, &found.quantization, &sides)?;
    if found.orientation.mirrored {
        patch.reverse_quads();
    }
    smooth_new_vertices(&mut patch, &options.smoothing);
    record_usage(PatternRef::Fixed(found.pattern));
    debug!(
        "cavity {:?} remeshed with pattern {}: {} quads, {} new vertices ({} irregular)",
        cavity.side_sizes(),
        found.pattern,
        patch.num_quads(),
        patch.num_new_vertices(),
        patch.num_irregular()
    );
    Ok(patch)
}

/// Fill a cavity with the best pattern of the process-wide catalog.
///
/// Returns `Ok(None)` when no pattern fits the cavity.
pub fn fill_cavity<H: Copy + Eq + Hash>(
    cavity: &Cavity<H>,
    options: &RemeshOptions,
) -> Result<Option<CavityPatch<H>>> {
    let catalog = PatternCatalog::global();
    let Some(found) = find_best_pattern(catalog, &cavity.side_sizes(), &options.matching) else {
        debug!("no pattern fits cavity {:?}", cavity.side_sizes());
        return Ok(None);
    };
    remesh_cavity(catalog, cavity, &found, options).map(Some)
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::collections::{HashMap, HashSet};

    use crate::algo::matcher::solve_quantization;
    use crate::mesh::{circular_cavity, Orientation, QuadSoup};
    use crate::pattern::FIXED_PATTERNS;

    fn pattern(id: usize) -> PatternTopology {
        PatternTopology::from_quads(FIXED_PATTERNS[id]).unwrap()
    }

    /// Every directed edge is used once, and the edges without a twin are
    /// exactly the boundary loop in order.
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

    #[test]
    fn test_regular_quad_two_by_two() {
        let (mut soup, cavity) = circular_cavity(&[3, 3, 3, 3], 1.0).unwrap();
        let patch = remesh(&pattern(0), &[2, 2], cavity.sides()).unwrap();
        assert_eq!(patch.num_quads(), 4);
        assert_eq!(patch.num_new_vertices(), 1);
        assert_eq!(patch.num_irregular(), 0);
        assert!(patch.new_vertices()[0].position.coords.norm() < 1e-12);

        patch.commit(&mut soup);
        assert_eq!(soup.num_vertices(), 9);
        assert_fills_loop(&soup, &(0..8).collect::<Vec<_>>());
    }

    #[test]
    fn test_straight_sides_give_exact_grid() {
        let corners = [
            Point3::new(0.0, 0.0, 0.0),
            Point3::new(1.0, 0.0, 0.0),
            Point3::new(1.0, 1.0, 0.0),
            Point3::new(0.0, 1.0, 0.0),
        ];
        let sizes = [3, 4, 3, 4];
        let total: usize = sizes.iter().map(|s| s - 1).sum();
        let mut sides = Vec::new();
        let mut handle = 0;
        for s in 0..4 {
            let (a, b) = (corners[s], corners[(s + 1) % 4]);
            let seg = sizes[s] - 1;
            let side = (0..=seg)
                .map(|k| {
                    let t = k as f64 / seg as f64;
                    BoundaryVertex::new((handle + k) % total, a + (b - a) * t)
                })
                .collect();
            handle += seg;
            sides.push(side);
        }
        let cavity = Cavity::new(sides).unwrap();

        let patch = remesh(&pattern(0), &[2, 3], cavity.sides()).unwrap();
        assert_eq!(patch.num_quads(), 6);
        assert_eq!(patch.num_new_vertices(), 2);
        for v in patch.new_vertices() {
            let (x, y) = (v.position.x * 2.0, v.position.y * 3.0);
            assert!((x - x.round()).abs() < 1e-12 && (y - y.round()).abs() < 1e-12);
            assert!(v.position.x > 0.0 && v.position.x < 1.0);
            assert!(v.position.y > 0.0 && v.position.y < 1.0);
        }
    }

    #[test]
    fn test_quad_count_and_irregular_flags() {
        for id in 0..FIXED_PATTERNS.len() {
            let p = pattern(id);
            let sizes: Vec<usize> = p.side_edge_counts().iter().map(|n| 2 * n + 1).collect();
            let fit = solve_quantization(&p, &sizes, &MatchOptions::default()).unwrap();
            let (_, cavity) = circular_cavity(&sizes, 1.0).unwrap();
            let patch = remesh(&p, &fit.quantization, cavity.sides()).unwrap();

            let expected: usize = p
                .quad_ids()
                .map(|q| {
                    let e = p.quad_edges(q);
                    fit.quantization[p.edge_chord(e[0]).index()]
                        * fit.quantization[p.edge_chord(e[1]).index()]
                })
                .sum();
            assert_eq!(patch.num_quads(), expected, "pattern {}", id);

            let singular = p
                .vertex_ids()
                .filter(|&v| !p.is_boundary_vertex(v) && p.valence(v) != 4)
                .count();
            assert_eq!(patch.num_irregular(), singular, "pattern {}", id);
        }
    }

    #[test]
    fn test_every_orientation_fills_the_loop() {
        let catalog = PatternCatalog::build(FIXED_PATTERNS);
        let mut mirrored_cases = 0;
        for entry in catalog.entries() {
            let p = &entry.topology;
            let sizes: Vec<usize> = p.side_edge_counts().iter().map(|n| 2 * n + 1).collect();
            for orientation in Orientation::all(sizes.len()) {
                // The cavity whose oriented view has the pattern's side sizes.
                let oriented = orientation.apply(&sizes);
                let Some(fit) = solve_quantization(p, &oriented, &MatchOptions::default()) else {
                    continue;
                };
                let (mut soup, cavity) = circular_cavity(&sizes, 1.0).unwrap();
                let found = PatternMatch {
                    pattern: entry.id,
                    orientation,
                    score: fit.score,
                    quantization: fit.quantization,
                };
                let patch = remesh_cavity(&catalog, &cavity, &found, &RemeshOptions::default())
                    .unwrap();
                let ring: Vec<usize> = cavity.boundary_loop().iter().map(|v| v.handle).collect();
                patch.commit(&mut soup);
                assert_fills_loop(&soup, &ring);
                if orientation.mirrored {
                    mirrored_cases += 1;
                }
            }
        }
        assert!(mirrored_cases > 0);
    }

    #[test]
    fn test_side_mismatches_are_errors() {
        let (_, cavity) = circular_cavity(&[3, 3, 3, 3], 1.0).unwrap();
        assert!(matches!(
            remesh(&pattern(1), &[2, 2, 2], cavity.sides()),
            Err(PatternError::SideCountMismatch {
                pattern: 3,
                cavity: 4
            })
        ));
        assert!(matches!(
            remesh(&pattern(0), &[2, 3], cavity.sides()),
            Err(PatternError::SideLengthMismatch {
                side: 1,
                expected: 4,
                actual: 3
            })
        ));
        assert!(matches!(
            remesh(&pattern(0), &[2], cavity.sides()),
            Err(PatternError::InvariantViolation(_))
        ));
    }

    #[test]
    fn test_fill_cavity_without_fit() {
        let (_, cavity) = circular_cavity(&[2, 3, 3, 2], 1.0).unwrap();
        let result = fill_cavity(&cavity, &RemeshOptions::default()).unwrap();
        assert!(result.is_none());
    }

    #[test]
    fn test_fill_cavity_records_usage() {
        let (_, cavity) = circular_cavity(&[3, 3, 3], 1.0).unwrap();
        let before = crate::pattern::usage::usage_count(PatternRef::Fixed(1));
        let patch = fill_cavity(&cavity, &RemeshOptions::default()).unwrap().unwrap();
        assert_eq!(patch.num_quads(), 3);
        assert_eq!(patch.num_irregular(), 1);
        assert!(crate::pattern::usage::usage_count(PatternRef::Fixed(1)) > before);
    }
}
