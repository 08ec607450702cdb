pub mod svm;
pub mod softmax;
pub mod loss_type;

pub use svm::{svm_loss, svm_loss_naive, svm_loss_vectorized};
pub use softmax::{softmax_loss, softmax_loss_naive, softmax_loss_vectorized};
pub use loss_type::LossType;

use crate::error::{check_labels, NnError, Result};
use crate::math::matrix::Matrix;

/// Validates a (W, X, y) triple: W is D x C, X is N x D, y has N labels in [0, C).
pub(crate) fn check_linear_inputs(
    context: &'static str,
    w: &Matrix,
    x: &Matrix,
    y: &[usize],
) -> Result<()> {
    w.check_layout(context)?;
    x.check_layout(context)?;
    if x.rows == 0 {
        return Err(NnError::EmptyBatch { context });
    }
    if x.cols != w.rows {
        return Err(NnError::ShapeMismatch {
            context,
            expected: vec![x.rows, w.rows],
            got: vec![x.rows, x.cols],
        });
    }
    if y.len() != x.rows {
        return Err(NnError::ShapeMismatch {
            context,
            expected: vec![x.rows],
            got: vec![y.len()],
        });
    }
    check_labels(y, w.cols)
}

/// Validates an N x C score matrix against its labels.
pub(crate) fn check_scores(context: &'static str, scores: &Matrix, y: &[usize]) -> Result<()> {
    scores.check_layout(context)?;
    if scores.rows == 0 {
        return Err(NnError::EmptyBatch { context });
    }
    if y.len() != scores.rows {
        return Err(NnError::ShapeMismatch {
            context,
            expected: vec![scores.rows],
            got: vec![y.len()],
        });
    }
    check_labels(y, scores.cols)
}

/// Finishes a linear loss: averages the accumulated data term over `n`
/// examples and adds the L2 penalty `0.5 * reg * sum(W^2)` and its
/// gradient `reg * W`.
pub(crate) fn average_and_regularize(
    loss: f64,
    dw: Matrix,
    w: &Matrix,
    n: usize,
    reg: f64,
) -> (f64, Matrix) {
    let inv_n = 1.0 / n as f64;
    let loss = loss * inv_n + 0.5 * reg * w.sum_squares();
    let dw = dw.scale(inv_n) + w.scale(reg);
    (loss, dw)
}
