use serde::{Serialize, Deserialize};

use crate::error::Result;
use crate::loss::{softmax_loss_vectorized, svm_loss_vectorized};
use crate::math::matrix::Matrix;

/// Selects which loss a linear classifier trains with.
///
/// - `Svm`     — multiclass hinge loss with margin 1.
/// - `Softmax` — cross-entropy over softmax probabilities.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum LossType {
    Svm,
    Softmax,
}

impl LossType {
    /// Evaluates the vectorized loss and gradient for this loss type.
    pub fn evaluate(self, w: &Matrix, x: &Matrix, y: &[usize], reg: f64) -> Result<(f64, Matrix)> {
        match self {
            LossType::Svm     => svm_loss_vectorized(w, x, y, reg),
            LossType::Softmax => softmax_loss_vectorized(w, x, y, reg),
        }
    }
}
