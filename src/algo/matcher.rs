//! Matching cavity side lengths against quad patterns.
//!
//! A pattern fits a cavity when every chord can be given a positive number of
//! segments such that, on every side, the segments of the side's edges add up
//! to the side's length. This is a small integer linear system
//!
//! ```text
//! for each side s:   Σ_{e ∈ side s} q[chord(e)] = side_sizes[s] - 1
//! ```
//!
//! which is brought to row echelon form and then searched depth-first for a
//! strictly positive solution. The search is bounded by a trial budget and
//! prefers values close to an even split, so the first solution found is
//! usually a balanced one. Solutions are scored by `Σ √q`, which favors
//! spreading segments over many chords.

use log::debug;

use crate::algo::echelon::IntMatrix;
use crate::mesh::Orientation;
use crate::pattern::{PatternCatalog, PatternTopology};

/// Options for pattern matching.
#[derive(Debug, Clone)]
pub struct MatchOptions {
    /// Maximum number of complete positive assignments tried per system.
    pub trial_budget: usize,
}

impl Default for MatchOptions {
    fn default() -> Self {
        Self { trial_budget: 1000 }
    }
}

impl MatchOptions {
    /// Set the trial budget.
    pub fn with_trial_budget(mut self, trial_budget: usize) -> Self {
        self.trial_budget = trial_budget;
        self
    }
}

/// A solved quantization for one side ordering.
#[derive(Debug, Clone, PartialEq)]
pub struct PatternFit {
    /// `Σ √q` over the chords.
    pub score: f64,
    /// Segments per chord, all positive.
    pub quantization: Vec<usize>,
}

/// The best fit of one pattern over all orientations of the cavity sides.
#[derive(Debug, Clone, PartialEq)]
pub struct RotatedFit {
    /// `Σ √q` over the chords.
    pub score: f64,
    /// How the cavity sides were re-read to fit the pattern.
    pub orientation: Orientation,
    /// Segments per chord, all positive.
    pub quantization: Vec<usize>,
}

/// The best pattern of a catalog for a cavity.
#[derive(Debug, Clone, PartialEq)]
pub struct PatternMatch {
    /// Catalog id of the pattern.
    pub pattern: usize,
    /// How the cavity sides were re-read to fit the pattern.
    pub orientation: Orientation,
    /// `Σ √q` over the chords.
    pub score: f64,
    /// Segments per chord, all positive.
    pub quantization: Vec<usize>,
}

/// Bounded depth-first search for a positive solution of a reduced system.
struct Search<'a> {
    system: &'a IntMatrix,
    cap: i64,
    budget: usize,
    trials: usize,
}

impl Search<'_> {
    fn exhausted(&self) -> bool {
        self.trials > self.budget
    }

    /// Extend the partial assignment `x` (0 = unassigned) to a solution.
    fn solve(&mut self, x: &mut [i64]) -> bool {
        if x.iter().all(|&v| v > 0) {
            self.trials += 1;
            if self.exhausted() {
                return false;
            }
            if self.system.is_solution(x) {
                return true;
            }
        }

        let n = self.system.num_vars();
        for row in (0..self.system.num_rows()).rev() {
            let mut undetermined = Vec::new();
            let mut total = -self.system.constant(row);
            for v in 0..n {
                let a = self.system.coeff(row, v);
                if a == 0 {
                    continue;
                }
                if x[v] == 0 {
                    undetermined.push(v);
                } else {
                    total -= a * x[v];
                }
            }

            if undetermined.is_empty() {
                if total == 0 {
                    continue;
                }
                return false;
            }

            // Most constrained: largest |coefficient|, lowest index on ties.
            let Some(var) = undetermined
                .iter()
                .copied()
                .max_by_key(|&v| (self.system.coeff(row, v).abs(), std::cmp::Reverse(v)))
            else {
                return false;
            };
            let w = self.system.coeff(row, var);

            let candidates: Vec<i64> = if undetermined.len() == 1 {
                if total % w != 0 || total / w < 1 {
                    return false;
                }
                vec![total / w]
            } else {
                let all_positive = undetermined.iter().all(|&v| self.system.coeff(row, v) > 0);
                let max = if all_positive { total / w } else { self.cap };
                if max < 1 {
                    return false;
                }
                let weight: i64 = undetermined
                    .iter()
                    .map(|&v| self.system.coeff(row, v).abs())
                    .sum();
                let ideal = total as f64 / weight as f64;
                let mut values: Vec<i64> = (1..=max).collect();
                values.sort_by(|a, b| {
                    let da = (ideal - *a as f64).powi(2);
                    let db = (ideal - *b as f64).powi(2);
                    da.total_cmp(&db)
                });
                values
            };

            for value in candidates {
                x[var] = value;
                if self.solve(x) {
                    return true;
                }
                x[var] = 0;
                if self.exhausted() {
                    return false;
                }
            }
            return false;
        }
        false
    }
}

/// Solve for a quantization of `pattern` with sides of exactly
/// `side_sizes[s]` vertices, in pattern side order.
///
/// Returns `None` when the side counts differ, a side is too short for the
/// pattern edges it must hold, the system has no positive solution, or the
/// trial budget runs out first.
pub fn solve_quantization(
    pattern: &PatternTopology,
    side_sizes: &[usize],
    options: &MatchOptions,
) -> Option<PatternFit> {
    if pattern.num_sides() != side_sizes.len() {
        return None;
    }
    for (side, &size) in pattern.sides().iter().zip(side_sizes) {
        if size < side.len() + 1 {
            return None;
        }
    }

    let mut system = IntMatrix::zeros(side_sizes.len(), pattern.num_chords());
    for (s, side) in pattern.sides().iter().enumerate() {
        for &e in side {
            system.add_coeff(s, pattern.edge_chord(e).index(), 1);
        }
        system.set_constant(s, -(side_sizes[s] as i64 - 1));
    }
    system.row_echelon();

    let cap = side_sizes.iter().copied().max().unwrap_or(1) as i64 - 1;
    let mut search = Search {
        system: &system,
        cap,
        budget: options.trial_budget,
        trials: 0,
    };
    let mut x = vec![0; pattern.num_chords()];
    let found = search.solve(&mut x);
    debug!(
        "quantization of {:?}: {} after {} trials",
        side_sizes,
        if found { "found" } else { "none" },
        search.trials
    );
    if !found {
        return None;
    }

    let score = x.iter().map(|&q| (q as f64).sqrt()).sum();
    let quantization = x.iter().map(|&q| q as usize).collect();
    Some(PatternFit {
        score,
        quantization,
    })
}

/// Best fit of `pattern` over every rotation of `side_sizes` and every
/// rotation of the reversed sequence.
///
/// Only a strictly higher score replaces the current best, so ties keep the
/// first orientation in [`Orientation::all`] order.
pub fn match_with_rotations(
    pattern: &PatternTopology,
    side_sizes: &[usize],
    options: &MatchOptions,
) -> Option<RotatedFit> {
    if pattern.num_sides() != side_sizes.len() {
        return None;
    }
    let mut best: Option<RotatedFit> = None;
    for orientation in Orientation::all(side_sizes.len()) {
        let oriented = orientation.apply(side_sizes);
        let Some(fit) = solve_quantization(pattern, &oriented, options) else {
            continue;
        };
        if best.as_ref().map_or(true, |b| fit.score > b.score) {
            best = Some(RotatedFit {
                score: fit.score,
                orientation,
                quantization: fit.quantization,
            });
        }
    }
    best
}

/// Best pattern of `catalog` for a cavity with the given side sizes.
///
/// Ties keep the pattern with the lower catalog position.
pub fn find_best_pattern(
    catalog: &PatternCatalog,
    side_sizes: &[usize],
    options: &MatchOptions,
) -> Option<PatternMatch> {
    let mut best: Option<PatternMatch> = None;
    for entry in catalog.entries() {
        if entry.topology.num_sides() != side_sizes.len() {
            continue;
        }
        let Some(fit) = match_with_rotations(&entry.topology, side_sizes, options) else {
            continue;
        };
        debug!(
            "pattern {} fits {:?} with score {:.3} ({:?})",
            entry.id, side_sizes, fit.score, fit.orientation
        );
        if best.as_ref().map_or(true, |b| fit.score > b.score) {
            best = Some(PatternMatch {
                pattern: entry.id,
                orientation: fit.orientation,
                score: fit.score,
                quantization: fit.quantization,
            });
        }
    }
    best
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::pattern::FIXED_PATTERNS;

    fn pattern(id: usize) -> PatternTopology {
        PatternTopology::from_quads(FIXED_PATTERNS[id]).unwrap()
    }

    #[test]
    fn test_every_pattern_matches_itself() {
        let options = MatchOptions::default();
        for id in 0..FIXED_PATTERNS.len() {
            let p = pattern(id);
            let sizes: Vec<usize> = p.side_edge_counts().iter().map(|n| n + 1).collect();
            let fit = solve_quantization(&p, &sizes, &options).unwrap();
            assert!(fit.quantization.iter().all(|&q| q == 1), "pattern {}", id);
            assert!((fit.score - p.num_chords() as f64).abs() < 1e-12);
        }
    }

    #[test]
    fn test_regular_quad_three_vertices_per_side() {
        let fit = match_with_rotations(&pattern(0), &[3, 3, 3, 3], &MatchOptions::default())
            .unwrap();
        assert_eq!(fit.quantization, vec![2, 2]);
        assert_eq!(fit.orientation, Orientation::identity());
        assert!((fit.score - 2.0 * 2f64.sqrt()).abs() < 1e-12);
    }

    #[test]
    fn test_regular_quad_rectangle() {
        let fit = solve_quantization(&pattern(0), &[4, 6, 4, 6], &MatchOptions::default())
            .unwrap();
        assert_eq!(fit.quantization, vec![3, 5]);
    }

    #[test]
    fn test_regular_quad_infeasible() {
        let options = MatchOptions::default();
        // A side of one vertex cannot hold an edge.
        assert!(match_with_rotations(&pattern(0), &[1, 2, 1, 2], &options).is_none());
        // Opposite sides of different lengths, in every orientation.
        assert!(match_with_rotations(&pattern(0), &[2, 3, 3, 2], &options).is_none());
        // Wrong number of sides.
        assert!(match_with_rotations(&pattern(0), &[3, 3, 3], &options).is_none());
    }

    #[test]
    fn test_side_count_mismatch_is_rejected() {
        assert!(solve_quantization(&pattern(1), &[3, 3, 3, 3], &MatchOptions::default()).is_none());
    }

    #[test]
    fn test_parity_makes_triangle_infeasible() {
        // Each chord crosses two sides, so the side lengths minus one must sum
        // to an even number.
        assert!(match_with_rotations(&pattern(1), &[5, 6, 5], &MatchOptions::default()).is_none());
        assert!(match_with_rotations(&pattern(1), &[5, 5, 5], &MatchOptions::default()).is_some());
    }

    #[test]
    fn test_rotation_invariance() {
        let options = MatchOptions::default();
        for id in 0..FIXED_PATTERNS.len() {
            let p = pattern(id);
            let sizes: Vec<usize> = p
                .side_edge_counts()
                .iter()
                .enumerate()
                .map(|(k, n)| 2 * n + 1 + k % 2)
                .collect();
            let reference = match_with_rotations(&p, &sizes, &options).map(|f| f.score);
            for orientation in Orientation::all(sizes.len()) {
                let oriented = orientation.apply(&sizes);
                let score = match_with_rotations(&p, &oriented, &options).map(|f| f.score);
                match (reference, score) {
                    (Some(a), Some(b)) => assert!((a - b).abs() < 1e-12, "pattern {}", id),
                    (None, None) => {}
                    _ => panic!("pattern {} changed feasibility under {:?}", id, orientation),
                }
            }
        }
        let regular = match_with_rotations(&pattern(0), &[3, 4, 3, 4], &options).unwrap();
        assert!((regular.score - (2f64.sqrt() + 3f64.sqrt())).abs() < 1e-12);
    }

    #[test]
    fn test_zero_budget_finds_nothing() {
        let options = MatchOptions::default().with_trial_budget(0);
        assert!(solve_quantization(&pattern(0), &[2, 2, 2, 2], &options).is_none());
    }

    #[test]
    fn test_find_best_pattern() {
        let catalog = PatternCatalog::build(FIXED_PATTERNS);
        let options = MatchOptions::default();

        let m = find_best_pattern(&catalog, &[3, 3, 3, 3], &options).unwrap();
        assert_eq!(m.pattern, 0);
        assert_eq!(m.quantization, vec![2, 2]);

        let m = find_best_pattern(&catalog, &[3, 3, 3], &options).unwrap();
        assert_eq!(m.pattern, 1);
        assert_eq!(m.quantization, vec![1, 1, 1]);

        assert!(find_best_pattern(&catalog, &[3; 9], &options).is_none());
        assert!(find_best_pattern(&catalog, &[], &options).is_none());
    }
}
