//! Softmax cross-entropy loss.
//!
//! Every variant subtracts the row maximum from the scores before
//! exponentiating, so large scores cannot overflow `exp`.

use crate::error::Result;
use crate::loss::{average_and_regularize, check_linear_inputs, check_scores};
use crate::math::matrix::Matrix;

/// Loop-based softmax loss.
///
/// `w` is D x C, `x` is N x D, `y` holds N labels in `[0, C)`.
/// Returns the mean of `-log p(y_i)` plus `0.5 * reg * sum(W^2)` and the
/// gradient with respect to `w`.
pub fn softmax_loss_naive(w: &Matrix, x: &Matrix, y: &[usize], reg: f64) -> Result<(f64, Matrix)> {
    check_linear_inputs("softmax_loss_naive", w, x, y)?;

    let num_train = x.rows;
    let num_classes = w.cols;
    let mut dw = Matrix::zeros(w.rows, w.cols);
    let mut loss = 0.0;

    for i in 0..num_train {
        let xi = x.row(i);
        let mut scores = vec![0.0; num_classes];
        for (k, &xik) in xi.iter().enumerate() {
            for (s, &wkj) in scores.iter_mut().zip(w.data[k].iter()) {
                *s += xik * wkj;
            }
        }

        let max = scores.iter().copied().fold(f64::NEG_INFINITY, f64::max);
        for s in scores.iter_mut() {
            *s -= max;
        }
        let sum_exp: f64 = scores.iter().map(|s| s.exp()).sum();
        loss -= (scores[y[i]].exp() / sum_exp).ln();

        for j in 0..num_classes {
            let p_j = scores[j].exp() / sum_exp;
            let coeff = if j == y[i] { p_j - 1.0 } else { p_j };
            for (k, &xik) in xi.iter().enumerate() {
                dw.data[k][j] += coeff * xik;
            }
        }
    }

    Ok(average_and_regularize(loss, dw, w, num_train, reg))
}

/// Matrix-form softmax loss; same contract as [`softmax_loss_naive`].
///
/// Gradient is `X^T (P - Y)` where `P` holds the class probabilities and
/// `Y` is the one-hot label indicator.
pub fn softmax_loss_vectorized(w: &Matrix, x: &Matrix, y: &[usize], reg: f64) -> Result<(f64, Matrix)> {
    check_linear_inputs("softmax_loss_vectorized", w, x, y)?;

    let num_train = x.rows;
    let probs = softmax_rows(&x.dot(w));

    let loss: f64 = y
        .iter()
        .enumerate()
        .map(|(i, &label)| -probs.data[i][label].ln())
        .sum();

    let mut indicator = Matrix::zeros(probs.rows, probs.cols);
    for (i, &label) in y.iter().enumerate() {
        indicator.data[i][label] = 1.0;
    }
    let dw = x.transpose().dot(&(probs - indicator));

    Ok(average_and_regularize(loss, dw, w, num_train, reg))
}

/// Softmax-loss primitive on an N x C score matrix.
///
/// Returns the mean cross-entropy and its gradient with respect to the scores.
pub fn softmax_loss(scores: &Matrix, y: &[usize]) -> Result<(f64, Matrix)> {
    check_scores("softmax_loss", scores, y)?;

    let n = scores.rows as f64;
    let mut dscores = softmax_rows(scores);
    let mut loss = 0.0;
    for (row, &label) in dscores.data.iter_mut().zip(y.iter()) {
        loss -= row[label].ln();
        row[label] -= 1.0;
    }

    Ok((loss / n, dscores.scale(1.0 / n)))
}

/// Row-wise softmax with the row maximum subtracted first.
pub fn softmax_rows(scores: &Matrix) -> Matrix {
    let data = scores
        .data
        .iter()
        .map(|row| {
            let max = row.iter().copied().fold(f64::NEG_INFINITY, f64::max);
            let exps: Vec<f64> = row.iter().map(|s| (s - max).exp()).collect();
            let sum: f64 = exps.iter().sum();
            exps.into_iter().map(|e| e / sum).collect()
        })
        .collect();
    Matrix {
        rows: scores.rows,
        cols: scores.cols,
        data,
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_uniform_scores_give_log_c() {
        let w = Matrix::zeros(3, 10);
        let x = Matrix::from_fn(4, 3, |i, j| (i + j) as f64);
        let (loss, _) = softmax_loss_naive(&w, &x, &[0, 3, 9, 5], 0.0).unwrap();
        assert!((loss - 10f64.ln()).abs() < 1e-12);
    }

    #[test]
    fn test_huge_scores_stay_finite() {
        let w = Matrix::from_data(vec![vec![1000.0, 0.0, -1000.0]]).unwrap();
        let x = Matrix::from_data(vec![vec![5.0], vec![-5.0]]).unwrap();
        let (l1, g1) = softmax_loss_naive(&w, &x, &[0, 2], 0.0).unwrap();
        let (l2, g2) = softmax_loss_vectorized(&w, &x, &[0, 2], 0.0).unwrap();
        assert!(l1.is_finite() && l2.is_finite());
        assert!(g1.data.iter().flatten().all(|g| g.is_finite()));
        assert!(g2.data.iter().flatten().all(|g| g.is_finite()));
    }

    #[test]
    fn test_naive_and_vectorized_agree_with_reg() {
        let w = Matrix::from_fn(3, 4, |i, j| ((i * 7 + j * 3) % 5) as f64 * 0.1 - 0.2);
        let x = Matrix::from_fn(5, 3, |i, j| ((i * 11 + j * 5) % 7) as f64 - 3.0);
        let y = [0, 1, 2, 3, 1];
        let (l1, g1) = softmax_loss_naive(&w, &x, &y, 0.5).unwrap();
        let (l2, g2) = softmax_loss_vectorized(&w, &x, &y, 0.5).unwrap();
        assert!((l1 - l2).abs() < 1e-10);
        for (a, b) in g1.data.iter().flatten().zip(g2.data.iter().flatten()) {
            assert!((a - b).abs() < 1e-10);
        }
    }

    #[test]
    fn test_score_gradient_rows_sum_to_zero() {
        let scores = Matrix::from_data(vec![vec![1.0, 2.0, 3.0], vec![0.5, -0.5, 0.0]]).unwrap();
        let (loss, dscores) = softmax_loss(&scores, &[2, 1]).unwrap();
        assert!(loss > 0.0);
        for row in &dscores.data {
            assert!(row.iter().sum::<f64>().abs() < 1e-12);
        }
    }

    #[test]
    fn test_softmax_rows_normalizes() {
        let p = softmax_rows(&Matrix::from_data(vec![vec![1.0, 1.0], vec![0.0, 800.0]]).unwrap());
        assert!((p.data[0][0] - 0.5).abs() < 1e-12);
        assert!((p.data[1][1] - 1.0).abs() < 1e-12);
    }
}
