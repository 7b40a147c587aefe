//! Fraction-free integer row reduction.
//!
//! Systems are stored as augmented rows `[a_0, ..., a_{n-1}, c]` standing for
//! `a · x + c = 0`. Elimination only multiplies and subtracts rows, then
//! divides each updated row by the gcd of its entries, so coefficients stay
//! small integers and no solution of the original system is lost or gained.

/// An augmented integer system `A x + c = 0`.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct IntMatrix {
    num_vars: usize,
    rows: Vec<Vec<i64>>,
}

fn gcd(mut a: i64, mut b: i64) -> i64 {
    a = a.abs();
    b = b.abs();
    while b != 0 {
        let t = a % b;
        a = b;
        b = t;
    }
    a
}

impl IntMatrix {
    /// A system with `num_rows` zero rows over `num_vars` variables.
    pub fn zeros(num_rows: usize, num_vars: usize) -> Self {
        Self {
            num_vars,
            rows: vec![vec![0; num_vars + 1]; num_rows],
        }
    }

    /// Number of variables.
    pub fn num_vars(&self) -> usize {
        self.num_vars
    }

    /// Number of rows.
    pub fn num_rows(&self) -> usize {
        self.rows.len()
    }

    /// Coefficient of variable `var` in row `row`.
    pub fn coeff(&self, row: usize, var: usize) -> i64 {
        self.rows[row][var]
    }

    /// Add `value` to the coefficient of `var` in `row`.
    pub fn add_coeff(&mut self, row: usize, var: usize, value: i64) {
        self.rows[row][var] += value;
    }

    /// Constant term of a row.
    pub fn constant(&self, row: usize) -> i64 {
        self.rows[row][self.num_vars]
    }

    /// Set the constant term of a row.
    pub fn set_constant(&mut self, row: usize, value: i64) {
        self.rows[row][self.num_vars] = value;
    }

    /// Augmented row `row`.
    pub fn row(&self, row: usize) -> &[i64] {
        &self.rows[row]
    }

    /// Evaluate `a · x + c` for one row.
    pub fn residual(&self, row: usize, x: &[i64]) -> i64 {
        let r = &self.rows[row];
        r[..self.num_vars]
            .iter()
            .zip(x)
            .map(|(a, v)| a * v)
            .sum::<i64>()
            + r[self.num_vars]
    }

    /// Whether `x` satisfies every row.
    pub fn is_solution(&self, x: &[i64]) -> bool {
        (0..self.rows.len()).all(|r| self.residual(r, x) == 0)
    }

    /// Reduce to row echelon form in place.
    ///
    /// For each column the row with the smallest nonzero absolute coefficient
    /// becomes the pivot (made positive); lower rows are eliminated with
    /// `row * pivot - pivot_row * factor`. Returns the rank.
    pub fn row_echelon(&mut self) -> usize {
        let m = self.rows.len();
        let mut rank = 0;
        for col in 0..self.num_vars {
            if rank >= m {
                break;
            }
            let pivot = (rank..m)
                .filter(|&i| self.rows[i][col] != 0)
                .min_by_key(|&i| self.rows[i][col].abs());
            let Some(pivot) = pivot else {
                continue;
            };
            self.rows.swap(rank, pivot);
            if self.rows[rank][col] < 0 {
                for a in &mut self.rows[rank] {
                    *a = -*a;
                }
            }

            let pv = self.rows[rank][col];
            for i in (rank + 1)..m {
                let f = self.rows[i][col];
                if f == 0 {
                    continue;
                }
                let (top, bottom) = self.rows.split_at_mut(i);
                let pivot_row = &top[rank];
                let row = &mut bottom[0];
                for (a, &p) in row.iter_mut().zip(pivot_row) {
                    *a = *a * pv - p * f;
                }
                let g = row.iter().fold(0, |g, &a| gcd(g, a));
                if g > 1 {
                    for a in row.iter_mut() {
                        *a /= g;
                    }
                }
            }
            rank += 1;
        }
        rank
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn system(rows: &[&[i64]]) -> IntMatrix {
        let n = rows[0].len() - 1;
        let mut m = IntMatrix::zeros(rows.len(), n);
        for (r, row) in rows.iter().enumerate() {
            for v in 0..n {
                m.add_coeff(r, v, row[v]);
            }
            m.set_constant(r, row[n]);
        }
        m
    }

    #[test]
    fn test_gcd() {
        assert_eq!(gcd(12, -18), 6);
        assert_eq!(gcd(0, 5), 5);
        assert_eq!(gcd(0, 0), 0);
    }

    #[test]
    fn test_regular_quad_system() {
        // Sides of a single quad: x0 = 2, x1 = 2, x0 = 2, x1 = 2.
        let mut m = system(&[&[1, 0, -2], &[0, 1, -2], &[1, 0, -2], &[0, 1, -2]]);
        assert_eq!(m.row_echelon(), 2);
        assert_eq!(m.row(0), &[1, 0, -2]);
        assert_eq!(m.row(1), &[0, 1, -2]);
        assert_eq!(m.row(2), &[0, 0, 0]);
        assert_eq!(m.row(3), &[0, 0, 0]);
        assert!(m.is_solution(&[2, 2]));
    }

    #[test]
    fn test_inconsistent_system_keeps_nonzero_constant() {
        // x0 = 1 and x0 = 2.
        let mut m = system(&[&[1, -1], &[1, -2]]);
        m.row_echelon();
        assert_eq!(m.row(1), &[0, -1]);
        assert!(!m.is_solution(&[1]));
    }

    #[test]
    fn test_pivot_is_smallest_and_positive() {
        let mut m = system(&[&[4, 2, -8], &[-2, 1, 0]]);
        m.row_echelon();
        assert_eq!(m.row(0), &[2, -1, 0]);
        // [0, 8, -16] reduced by its gcd.
        assert_eq!(m.row(1), &[0, 1, -2]);
        assert!(m.is_solution(&[1, 2]));
    }

    #[test]
    fn test_echelon_preserves_solutions() {
        let x = [3, 1, 2];
        let mut m = system(&[&[1, 1, 0, -4], &[0, 1, 1, -3], &[1, 0, 1, -5], &[2, 1, 1, -9]]);
        assert!(m.is_solution(&x));
        m.row_echelon();
        assert!(m.is_solution(&x));
        for r in 1..m.num_rows() {
            let lead = |row: usize| (0..m.num_vars()).find(|&v| m.coeff(row, v) != 0);
            if let (Some(a), Some(b)) = (lead(r - 1), lead(r)) {
                assert!(a < b);
            }
        }
    }
}
