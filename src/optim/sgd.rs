use crate::error::{NnError, Result};
use crate::math::matrix::Matrix;
use crate::network::params::{Grads, Params};

/// Vanilla stochastic gradient descent: `w -= learning_rate * dw`.
pub struct Sgd {
    pub learning_rate: f64,
}

impl Sgd {
    pub fn new(learning_rate: f64) -> Sgd {
        Sgd { learning_rate }
    }

    /// Applies one update to a weight matrix given its gradient.
    pub fn step_matrix(&self, weights: &mut Matrix, grad: &Matrix) {
        debug_assert_eq!(weights.shape(), grad.shape(), "gradient shape must match weights");
        for (row, grad_row) in weights.data.iter_mut().zip(grad.data.iter()) {
            for (w, g) in row.iter_mut().zip(grad_row.iter()) {
                *w -= self.learning_rate * g;
            }
        }
    }

    /// Applies one update to every parameter that has a gradient.
    ///
    /// Every gradient is checked against its parameter before anything is
    /// updated, so a mismatch leaves `params` untouched.
    pub fn step_params(&self, params: &mut Params, grads: &Grads) -> Result<()> {
        for (name, grad) in grads {
            if let Some(param) = params.get(name) {
                if param.shape != grad.shape || param.len() != grad.len() {
                    return Err(NnError::ShapeMismatch {
                        context: name.as_str(),
                        expected: param.shape.clone(),
                        got: grad.shape.clone(),
                    });
                }
            }
        }
        for (name, grad) in grads {
            if let Some(param) = params.get_mut(name) {
                for (w, g) in param.data.iter_mut().zip(grad.data.iter()) {
                    *w -= self.learning_rate * g;
                }
            }
        }
        Ok(())
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::math::tensor::Tensor;
    use crate::network::params::ParamName;

    #[test]
    fn test_step_matrix() {
        let mut w = Matrix::from_data(vec![vec![1.0, 2.0]]).unwrap();
        Sgd::new(0.5).step_matrix(&mut w, &Matrix::from_data(vec![vec![2.0, -2.0]]).unwrap());
        assert_eq!(w.data, vec![vec![0.0, 3.0]]);
    }

    #[test]
    fn test_step_params_only_touches_given_keys() {
        let mut params = Params::new();
        params.insert(ParamName::W1, Tensor::from_vec(&[2], vec![1.0, 1.0]).unwrap());
        params.insert(ParamName::B1, Tensor::from_vec(&[1], vec![4.0]).unwrap());
        let mut grads = Grads::new();
        grads.insert(ParamName::W1, Tensor::from_vec(&[2], vec![10.0, -10.0]).unwrap());

        Sgd::new(0.1).step_params(&mut params, &grads).unwrap();
        assert_eq!(params[&ParamName::W1].data, vec![0.0, 2.0]);
        assert_eq!(params[&ParamName::B1].data, vec![4.0]);
    }

    #[test]
    fn test_step_params_rejects_mismatched_gradient() {
        let mut params = Params::new();
        params.insert(ParamName::W1, Tensor::from_vec(&[3], vec![1.0, 1.0, 1.0]).unwrap());
        params.insert(ParamName::B1, Tensor::from_vec(&[1], vec![4.0]).unwrap());
        let mut grads = Grads::new();
        grads.insert(ParamName::B1, Tensor::from_vec(&[1], vec![1.0]).unwrap());
        grads.insert(ParamName::W1, Tensor::from_vec(&[2], vec![10.0, -10.0]).unwrap());

        let err = Sgd::new(0.1).step_params(&mut params, &grads).unwrap_err();
        assert!(matches!(err, NnError::ShapeMismatch { context: "W1", .. }));
        assert_eq!(params[&ParamName::W1].data, vec![1.0; 3]);
        assert_eq!(params[&ParamName::B1].data, vec![4.0]);
    }
}
