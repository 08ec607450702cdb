//! Structured (multiclass) SVM hinge loss with a margin of 1.

use crate::error::Result;
use crate::loss::{average_and_regularize, check_linear_inputs, check_scores};
use crate::math::matrix::Matrix;

const DELTA: f64 = 1.0;

/// Loop-based SVM loss, the reference the vectorized version is checked against.
///
/// `w` is D x C, `x` is N x D, `y` holds N labels in `[0, C)`.
/// Returns the mean hinge loss plus `0.5 * reg * sum(W^2)` and its gradient
/// with respect to `w`.
pub fn svm_loss_naive(w: &Matrix, x: &Matrix, y: &[usize], reg: f64) -> Result<(f64, Matrix)> {
    check_linear_inputs("svm_loss_naive", w, x, y)?;

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

        let correct_class_score = scores[y[i]];
        for j in 0..num_classes {
            if j == y[i] {
                continue;
            }
            let margin = scores[j] - correct_class_score + DELTA;
            if margin > 0.0 {
                loss += margin;
                for (k, &xik) in xi.iter().enumerate() {
                    dw.data[k][j] += xik;
                    dw.data[k][y[i]] -= xik;
                }
            }
        }
    }

    Ok(average_and_regularize(loss, dw, w, num_train, reg))
}

/// Matrix-form SVM loss; same contract as [`svm_loss_naive`].
///
/// The gradient uses an indicator matrix `L` where `L[i][j] = 1` for every
/// violated margin and `L[i][y_i]` is minus the number of violations in row
/// `i`, so that `dW = X^T L`.
pub fn svm_loss_vectorized(w: &Matrix, x: &Matrix, y: &[usize], reg: f64) -> Result<(f64, Matrix)> {
    check_linear_inputs("svm_loss_vectorized", w, x, y)?;

    let num_train = x.rows;
    let scores = x.dot(w);
    let (loss, indicator) = hinge_terms(&scores, y);
    let dw = x.transpose().dot(&indicator);

    Ok(average_and_regularize(loss, dw, w, num_train, reg))
}

/// Hinge-loss primitive on an N x C score matrix.
///
/// Returns the mean loss and its gradient with respect to the scores.
pub fn svm_loss(scores: &Matrix, y: &[usize]) -> Result<(f64, Matrix)> {
    check_scores("svm_loss", scores, y)?;

    let inv_n = 1.0 / scores.rows as f64;
    let (loss, indicator) = hinge_terms(scores, y);
    Ok((loss * inv_n, indicator.scale(inv_n)))
}

/// Summed hinge loss and the signed violation indicator for a score matrix.
fn hinge_terms(scores: &Matrix, y: &[usize]) -> (f64, Matrix) {
    let mut loss = 0.0;
    let mut indicator = Matrix::zeros(scores.rows, scores.cols);

    for (i, (row, ind)) in scores.data.iter().zip(indicator.data.iter_mut()).enumerate() {
        let correct = row[y[i]];
        let mut violations = 0.0;
        for (j, (&s, l)) in row.iter().zip(ind.iter_mut()).enumerate() {
            if j == y[i] {
                continue;
            }
            let margin = s - correct + DELTA;
            if margin > 0.0 {
                loss += margin;
                *l = 1.0;
                violations += 1.0;
            }
        }
        ind[y[i]] = -violations;
    }

    (loss, indicator)
}
