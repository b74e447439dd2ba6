//! Least-squares fit of a 2nd-degree polynomial surface
//! `z = c0 + c1 x + c2 y + c3 x^2 + c4 x y + c5 y^2`.

use crate::consts::POLY2D_TERMS;
use crate::error::{Result, StarstackError};

/// Relative pivot size below which the normal equations count as singular.
const SINGULAR_PIVOT: f64 = 1e-12;

/// A fitted background surface over `(row, col)` pixel coordinates.
///
/// Coordinates are shifted and scaled to roughly `[-1, 1]` before the fit to
/// keep the normal equations well conditioned.
#[derive(Clone, Debug, PartialEq)]
pub struct Poly2D {
    pub coefficients: [f64; POLY2D_TERMS],
    row_center: f64,
    row_scale: f64,
    col_center: f64,
    col_scale: f64,
}

impl Poly2D {
    pub fn eval(&self, row: f64, col: f64) -> f64 {
        let terms = monomials(
            (col - self.col_center) / self.col_scale,
            (row - self.row_center) / self.row_scale,
        );
        terms
            .iter()
            .zip(self.coefficients.iter())
            .map(|(t, c)| t * c)
            .sum()
    }
}

#[inline]
fn monomials(x: f64, y: f64) -> [f64; POLY2D_TERMS] {
    [1.0, x, y, x * x, x * y, y * y]
}

/// Fit the surface to `(row, col, value)` samples.
///
/// Terms the sample layout cannot constrain are held at zero: squares need
/// three distinct rows (columns), linear and cross terms need two. A single
/// sample therefore yields a constant surface. Fails when there are no
/// samples, fewer samples than usable terms, or the system is singular.
pub fn fit_poly2d(samples: &[(f64, f64, f64)]) -> Result<Poly2D> {
    if samples.is_empty() {
        return Err(StarstackError::DegenerateFit("no background samples".into()));
    }

    let active = usable_terms(
        distinct(samples.iter().map(|s| s.0)),
        distinct(samples.iter().map(|s| s.1)),
    );
    let terms = active.iter().filter(|&&a| a).count();
    if samples.len() < terms {
        return Err(StarstackError::DegenerateFit(format!(
            "{} samples for {} coefficients",
            samples.len(),
            terms
        )));
    }

    let (row_center, row_scale) = center_and_scale(samples.iter().map(|s| s.0));
    let (col_center, col_scale) = center_and_scale(samples.iter().map(|s| s.1));

    let mut ata = [[0.0f64; POLY2D_TERMS]; POLY2D_TERMS];
    let mut atb = [0.0f64; POLY2D_TERMS];
    for &(row, col, value) in samples {
        let t = monomials((col - col_center) / col_scale, (row - row_center) / row_scale);
        for i in (0..POLY2D_TERMS).filter(|&i| active[i]) {
            atb[i] += t[i] * value;
            for j in (0..POLY2D_TERMS).filter(|&j| active[j]) {
                ata[i][j] += t[i] * t[j];
            }
        }
    }
    // Pin unused coefficients to zero.
    for i in (0..POLY2D_TERMS).filter(|&i| !active[i]) {
        ata[i][i] = 1.0;
    }

    let coefficients = solve_linear(ata, atb).ok_or_else(|| {
        StarstackError::DegenerateFit("sample grid does not constrain the surface".into())
    })?;

    Ok(Poly2D {
        coefficients,
        row_center,
        row_scale,
        col_center,
        col_scale,
    })
}

/// Which of `[1, x, y, x^2, xy, y^2]` can be fitted from `rows` distinct row
/// and `cols` distinct column positions.
fn usable_terms(rows: usize, cols: usize) -> [bool; POLY2D_TERMS] {
    [
        true,
        cols >= 2,
        rows >= 2,
        cols >= 3,
        rows >= 2 && cols >= 2,
        rows >= 3,
    ]
}

fn distinct(values: impl Iterator<Item = f64>) -> usize {
    let mut values: Vec<f64> = values.collect();
    values.sort_unstable_by(|a, b| a.total_cmp(b));
    values.dedup();
    values.len()
}

fn center_and_scale(values: impl Iterator<Item = f64> + Clone) -> (f64, f64) {
    let (min, max) = values
        .clone()
        .fold((f64::INFINITY, f64::NEG_INFINITY), |(lo, hi), v| {
            (lo.min(v), hi.max(v))
        });
    let center = (min + max) / 2.0;
    let scale = (max - min) / 2.0;
    (center, if scale > 0.0 { scale } else { 1.0 })
}

/// Gaussian elimination with partial pivoting. `None` when singular.
fn solve_linear(
    mut a: [[f64; POLY2D_TERMS]; POLY2D_TERMS],
    mut b: [f64; POLY2D_TERMS],
) -> Option<[f64; POLY2D_TERMS]> {
    let n = POLY2D_TERMS;
    let norm = a
        .iter()
        .flat_map(|row| row.iter())
        .fold(0.0f64, |m, v| m.max(v.abs()));
    if norm == 0.0 {
        return None;
    }

    for col in 0..n {
        let pivot = (col..n).max_by(|&i, &j| a[i][col].abs().total_cmp(&a[j][col].abs()))?;
        if a[pivot][col].abs() < SINGULAR_PIVOT * norm {
            return None;
        }
        a.swap(col, pivot);
        b.swap(col, pivot);

        for row in (col + 1)..n {
            let factor = a[row][col] / a[col][col];
            if factor == 0.0 {
                continue;
            }
            for k in col..n {
                a[row][k] -= factor * a[col][k];
            }
            b[row] -= factor * b[col];
        }
    }

    let mut x = [0.0f64; POLY2D_TERMS];
    for row in (0..n).rev() {
        let tail: f64 = ((row + 1)..n).map(|k| a[row][k] * x[k]).sum();
        x[row] = (b[row] - tail) / a[row][row];
    }
    Some(x)
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_solve_identity() {
        let mut a = [[0.0; POLY2D_TERMS]; POLY2D_TERMS];
        for (i, row) in a.iter_mut().enumerate() {
            row[i] = 2.0;
        }
        let b = [2.0, 4.0, 6.0, 8.0, 10.0, 12.0];
        let x = solve_linear(a, b).unwrap();
        for (i, v) in x.iter().enumerate() {
            assert!((v - (i as f64 + 1.0)).abs() < 1e-12);
        }
    }

    #[test]
    fn test_solve_singular() {
        let a = [[1.0; POLY2D_TERMS]; POLY2D_TERMS];
        assert!(solve_linear(a, [1.0; POLY2D_TERMS]).is_none());
    }

    #[test]
    fn test_fit_recovers_quadratic() {
        let surface = |r: f64, c: f64| 100.0 + 0.5 * c - 0.25 * r + 0.01 * c * c + 0.002 * r * c - 0.003 * r * r;
        let mut samples = Vec::new();
        for r in (0..100).step_by(10) {
            for c in (0..150).step_by(10) {
                let (r, c) = (r as f64, c as f64);
                samples.push((r, c, surface(r, c)));
            }
        }
        let poly = fit_poly2d(&samples).unwrap();
        for &(r, c) in &[(0.0, 0.0), (55.0, 77.0), (99.0, 149.0), (3.5, 120.25)] {
            assert!((poly.eval(r, c) - surface(r, c)).abs() < 1e-6);
        }
    }

    #[test]
    fn test_fit_single_row_fits_column_profile() {
        let profile = |c: f64| 50.0 + 2.0 * c - 0.05 * c * c;
        let samples: Vec<_> = (0..10)
            .map(|c| (5.0, c as f64 * 10.0, profile(c as f64 * 10.0)))
            .collect();
        let poly = fit_poly2d(&samples).unwrap();
        for c in [0.0, 35.0, 90.0] {
            assert!((poly.eval(5.0, c) - profile(c)).abs() < 1e-6);
            // No row dependence can be inferred from one row.
            assert!((poly.eval(40.0, c) - profile(c)).abs() < 1e-6);
        }
    }

    #[test]
    fn test_fit_single_sample_is_constant() {
        let poly = fit_poly2d(&[(10.0, 10.0, 1234.0)]).unwrap();
        assert!((poly.eval(0.0, 0.0) - 1234.0).abs() < 1e-9);
        assert!((poly.eval(300.0, 500.0) - 1234.0).abs() < 1e-9);
    }

    #[test]
    fn test_fit_two_rows_three_columns() {
        let surface = |r: f64, c: f64| 700.0 + 3.0 * r - 1.5 * c + 0.01 * c * c + 0.002 * r * c;
        let samples: Vec<_> = [10.0, 210.0]
            .iter()
            .flat_map(|&r| [10.0, 210.0, 410.0].map(move |c| (r, c, surface(r, c))))
            .collect();
        let poly = fit_poly2d(&samples).unwrap();
        for &(r, c) in &[(10.0, 10.0), (210.0, 410.0), (100.0, 300.0)] {
            assert!((poly.eval(r, c) - surface(r, c)).abs() < 1e-6);
        }
    }

    #[test]
    fn test_usable_terms() {
        assert_eq!(usable_terms(1, 1), [true, false, false, false, false, false]);
        assert_eq!(usable_terms(2, 3), [true, true, true, true, true, false]);
        assert_eq!(usable_terms(3, 3), [true; POLY2D_TERMS]);
    }
}
