//! Savitzky-Golay smoothing.
//!
//! Interior points are a convolution with the least-squares coefficients of
//! the centred window. The first and last half-windows are taken from a
//! polynomial fitted to the first and last full window ("interp" edges).

use crate::error::{EngineError, EngineResult, ErrorCode};
use rayon::prelude::*;

#[derive(Debug, Clone, PartialEq)]
pub struct SavitzkyGolay {
    window: usize,
    order: usize,
    coefficients: Vec<f64>,
}

impl SavitzkyGolay {
    pub fn new(window: usize, order: usize) -> EngineResult<Self> {
        if window % 2 == 0 {
            return Err(EngineError::invalid_input(format!(
                "Smoothing window must be odd, got {window}"
            )));
        }
        if window <= order {
            return Err(EngineError::invalid_input(format!(
                "Smoothing window {window} must be larger than polynomial order {order}"
            )));
        }
        let coefficients = centre_coefficients(window, order)?;
        Ok(Self {
            window,
            order,
            coefficients,
        })
    }

    pub fn window(&self) -> usize {
        self.window
    }

    pub fn order(&self) -> usize {
        self.order
    }

    pub fn coefficients(&self) -> &[f64] {
        &self.coefficients
    }

    /// Smooths `values`; the output has the same length as the input.
    pub fn apply(&self, values: &[f64]) -> EngineResult<Vec<f64>> {
        let n = values.len();
        let w = self.window;
        if n < w {
            return Err(EngineError::invalid_input(format!(
                "Smoothing window {w} is longer than the signal ({n} values)"
            )));
        }
        let half = w / 2;
        let mut out = vec![0.0; n];

        out[half..n - half]
            .par_iter_mut()
            .enumerate()
            .for_each(|(offset, slot)| {
                let window = &values[offset..offset + w];
                *slot = window
                    .iter()
                    .zip(&self.coefficients)
                    .fold(0.0, |acc, (x, c)| acc + x * c);
            });

        let ts = window_positions(w);
        let head = fit_polynomial(&ts, &values[..w], self.order)?;
        for (j, slot) in out[..half].iter_mut().enumerate() {
            *slot = evaluate(&head, ts[j]);
        }
        let tail = fit_polynomial(&ts, &values[n - w..], self.order)?;
        for (j, slot) in out[n - half..].iter_mut().enumerate() {
            *slot = evaluate(&tail, ts[half + 1 + j]);
        }
        Ok(out)
    }
}

/// Window positions centred on zero and scaled into [-1, 1].
fn window_positions(window: usize) -> Vec<f64> {
    let half = (window / 2) as f64;
    let scale = half.max(1.0);
    (0..window).map(|j| (j as f64 - half) / scale).collect()
}

fn centre_coefficients(window: usize, order: usize) -> EngineResult<Vec<f64>> {
    let ts = window_positions(window);
    let mut unit = vec![0.0; order + 1];
    unit[0] = 1.0;
    // p(0) = a0, so the weights are the rows of A (A^T A)^-1 e0
    let z = solve(normal_matrix(&ts, order), unit)?;
    Ok(ts.iter().map(|t| evaluate(&z, *t)).collect())
}

fn normal_matrix(ts: &[f64], order: usize) -> Vec<Vec<f64>> {
    let mut m = vec![vec![0.0; order + 1]; order + 1];
    for t in ts {
        for (row, m_row) in m.iter_mut().enumerate() {
            for (col, cell) in m_row.iter_mut().enumerate() {
                *cell += t.powi((row + col) as i32);
            }
        }
    }
    m
}

/// Least-squares polynomial coefficients, lowest power first.
fn fit_polynomial(ts: &[f64], ys: &[f64], order: usize) -> EngineResult<Vec<f64>> {
    let mut rhs = vec![0.0; order + 1];
    for (t, y) in ts.iter().zip(ys) {
        for (power, cell) in rhs.iter_mut().enumerate() {
            *cell += t.powi(power as i32) * y;
        }
    }
    solve(normal_matrix(ts, order), rhs)
}

fn evaluate(coefficients: &[f64], t: f64) -> f64 {
    coefficients.iter().rev().fold(0.0, |acc, c| acc * t + c)
}

/// Gaussian elimination with partial pivoting.
fn solve(mut m: Vec<Vec<f64>>, mut rhs: Vec<f64>) -> EngineResult<Vec<f64>> {
    let size = rhs.len();
    for col in 0..size {
        let pivot = (col..size)
            .max_by(|a, b| m[*a][col].abs().total_cmp(&m[*b][col].abs()))
            .unwrap_or(col);
        if m[pivot][col].abs() < f64::EPSILON {
            return Err(EngineError::new(
                ErrorCode::Internal,
                "Singular smoothing system",
            ));
        }
        m.swap(col, pivot);
        rhs.swap(col, pivot);
        for row in col + 1..size {
            let factor = m[row][col] / m[col][col];
            for k in col..size {
                m[row][k] -= factor * m[col][k];
            }
            rhs[row] -= factor * rhs[col];
        }
    }
    let mut x = vec![0.0; size];
    for row in (0..size).rev() {
        let tail: f64 = (row + 1..size).map(|k| m[row][k] * x[k]).sum();
        x[row] = (rhs[row] - tail) / m[row][row];
    }
    Ok(x)
}

#[cfg(test)]
mod tests {
    use super::*;

    fn assert_close(a: f64, b: f64) {
        assert!((a - b).abs() < 1e-9, "{a} != {b}");
    }

    #[test]
    fn five_point_cubic_coefficients() {
        let filter = SavitzkyGolay::new(5, 3).unwrap();
        let expected = [-3.0, 12.0, 17.0, 12.0, -3.0].map(|c| c / 35.0);
        for (c, e) in filter.coefficients().iter().zip(expected) {
            assert_close(*c, e);
        }
    }

    #[test]
    fn coefficients_sum_to_one() {
        let filter = SavitzkyGolay::new(101, 3).unwrap();
        assert_close(filter.coefficients().iter().sum(), 1.0);
    }

    #[test]
    fn rejects_bad_windows() {
        assert!(SavitzkyGolay::new(100, 3).is_err());
        assert!(SavitzkyGolay::new(3, 3).is_err());
        let filter = SavitzkyGolay::new(7, 3).unwrap();
        assert!(filter.apply(&[1.0; 6]).is_err());
    }

    #[test]
    fn preserves_cubic_signals_including_edges() {
        let values: Vec<f64> = (0..40)
            .map(|i| {
                let x = i as f64 / 10.0;
                0.5 - 0.2 * x + 0.1 * x * x - 0.01 * x * x * x
            })
            .collect();
        let smoothed = SavitzkyGolay::new(11, 3).unwrap().apply(&values).unwrap();
        assert_eq!(smoothed.len(), values.len());
        for (s, v) in smoothed.iter().zip(&values) {
            assert_close(*s, *v);
        }
    }

    #[test]
    fn window_equal_to_length_is_a_single_fit() {
        let values = [2.0; 5];
        let smoothed = SavitzkyGolay::new(5, 3).unwrap().apply(&values).unwrap();
        for s in smoothed {
            assert_close(s, 2.0);
        }
    }
}
