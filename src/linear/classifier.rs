use rand::Rng;

use crate::error::{NnError, Result};
use crate::loss::loss_type::LossType;
use crate::math::argmax;
use crate::math::matrix::Matrix;
use crate::optim::sgd::Sgd;
use crate::train::{train_loop, TrainConfig};

/// A linear classifier `scores = X W` trained with SVM or softmax loss.
#[derive(Debug, Clone)]
pub struct LinearClassifier {
    /// D x C weights; `None` until the first call to `train`.
    pub w: Option<Matrix>,
    pub loss_type: LossType,
}

impl LinearClassifier {
    pub fn new(loss_type: LossType) -> LinearClassifier {
        LinearClassifier { w: None, loss_type }
    }

    pub fn with_weights(w: Matrix, loss_type: LossType) -> LinearClassifier {
        LinearClassifier { w: Some(w), loss_type }
    }

    fn weights(&self) -> Result<&Matrix> {
        self.w.as_ref().ok_or_else(|| NnError::InvalidConfig {
            parameter: "w",
            reason: "classifier has not been trained".to_string(),
        })
    }

    /// Vectorized loss and gradient for the current weights.
    pub fn loss(&self, x: &Matrix, y: &[usize], reg: f64) -> Result<(f64, Matrix)> {
        self.loss_type.evaluate(self.weights()?, x, y, reg)
    }

    /// Runs minibatch SGD; see [`train_loop`]. Returns the per-iteration loss history.
    pub fn train<R: Rng + ?Sized>(
        &mut self,
        x: &Matrix,
        y: &[usize],
        optimizer: &Sgd,
        reg: f64,
        config: &TrainConfig,
        rng: &mut R,
    ) -> Result<Vec<f64>> {
        train_loop(self, x, y, optimizer, reg, config, rng)
    }

    /// Highest-scoring class for every row of `x`.
    pub fn predict(&self, x: &Matrix) -> Result<Vec<usize>> {
        let w = self.weights()?;
        w.check_layout("LinearClassifier::predict")?;
        x.check_layout("LinearClassifier::predict")?;
        if x.cols != w.rows {
            return Err(NnError::ShapeMismatch {
                context: "LinearClassifier::predict",
                expected: vec![x.rows, w.rows],
                got: vec![x.rows, x.cols],
            });
        }
        Ok(x.dot(w).data.iter().map(|row| argmax(row)).collect())
    }

    /// Fraction of rows whose predicted class equals the label.
    pub fn accuracy(&self, x: &Matrix, y: &[usize]) -> Result<f64> {
        if y.len() != x.rows {
            return Err(NnError::ShapeMismatch {
                context: "LinearClassifier::accuracy",
                expected: vec![x.rows],
                got: vec![y.len()],
            });
        }
        if y.is_empty() {
            return Ok(0.0);
        }
        let correct = self
            .predict(x)?
            .iter()
            .zip(y.iter())
            .filter(|(p, l)| p == l)
            .count();
        Ok(correct as f64 / y.len() as f64)
    }
}
