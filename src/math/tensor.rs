use rand::Rng;
use serde::{Deserialize, Serialize};

use crate::error::{NnError, Result};
use crate::math::matrix::Matrix;

/// Dense n-d array stored flat in row-major order.
///
/// Images are laid out NCHW, convolution filters as (F, C, HH, WW).
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct Tensor {
    pub shape: Vec<usize>,
    pub data: Vec<f64>,
}

impl Tensor {
    pub fn zeros(shape: &[usize]) -> Tensor {
        Tensor {
            shape: shape.to_vec(),
            data: vec![0.0; shape.iter().product()],
        }
    }

    pub fn from_vec(shape: &[usize], data: Vec<f64>) -> Result<Tensor> {
        let expected: usize = shape.iter().product();
        if expected != data.len() {
            return Err(NnError::ShapeMismatch {
                context: "Tensor::from_vec",
                expected: vec![expected],
                got: vec![data.len()],
            });
        }
        Ok(Tensor {
            shape: shape.to_vec(),
            data,
        })
    }

    /// Zero-mean Gaussian tensor with standard deviation `std_dev`.
    pub fn randn<R: Rng + ?Sized>(shape: &[usize], std_dev: f64, rng: &mut R) -> Tensor {
        let len = shape.iter().product();
        let data = (0..len)
            .map(|_| Matrix::sample_standard_normal(rng) * std_dev)
            .collect();
        Tensor {
            shape: shape.to_vec(),
            data,
        }
    }

    /// Checks that `data` holds exactly `product(shape)` values.
    pub fn check_layout(&self, context: &'static str) -> Result<()> {
        let expected: usize = self.shape.iter().product();
        if self.data.len() != expected {
            return Err(NnError::ShapeMismatch {
                context,
                expected: vec![expected],
                got: vec![self.data.len()],
            });
        }
        Ok(())
    }

    pub fn len(&self) -> usize {
        self.data.len()
    }

    pub fn is_empty(&self) -> bool {
        self.data.is_empty()
    }

    pub fn ndim(&self) -> usize {
        self.shape.len()
    }

    pub fn map<F>(&self, functor: F) -> Tensor
    where
        F: Fn(f64) -> f64,
    {
        Tensor {
            shape: self.shape.clone(),
            data: self.data.iter().map(|&x| functor(x)).collect(),
        }
    }

    pub fn sum_squares(&self) -> f64 {
        self.data.iter().map(|x| x * x).sum()
    }

    pub fn reshape(self, shape: &[usize]) -> Result<Tensor> {
        Tensor::from_vec(shape, self.data)
    }

    /// Copies a rank-2 tensor into a `Matrix`.
    pub fn to_matrix(&self) -> Result<Matrix> {
        if self.ndim() != 2 {
            return Err(NnError::ShapeMismatch {
                context: "Tensor::to_matrix",
                expected: vec![2],
                got: vec![self.ndim()],
            });
        }
        self.check_layout("Tensor::to_matrix")?;
        let cols = self.shape[1];
        let data = if cols == 0 {
            vec![Vec::new(); self.shape[0]]
        } else {
            self.data.chunks(cols).map(|row| row.to_vec()).collect()
        };
        Ok(Matrix {
            rows: self.shape[0],
            cols,
            data,
        })
    }

    /// Views an (N, d1, ..., dk) tensor as an N x (d1 * ... * dk) matrix.
    pub fn flatten_rows(&self) -> Matrix {
        let n = self.shape.first().copied().unwrap_or(0);
        let d = if n == 0 { 0 } else { self.len() / n };
        Matrix {
            rows: n,
            cols: d,
            data: (0..n).map(|i| self.data[i * d..(i + 1) * d].to_vec()).collect(),
        }
    }

    /// Offset of an NCHW coordinate in a rank-4 tensor.
    #[inline]
    pub(crate) fn idx4(&self, n: usize, c: usize, h: usize, w: usize) -> usize {
        let s = &self.shape;
        ((n * s[1] + c) * s[2] + h) * s[3] + w
    }
}

impl From<Matrix> for Tensor {
    fn from(m: Matrix) -> Tensor {
        Tensor {
            shape: vec![m.rows, m.cols],
            data: m.data.into_iter().flatten().collect(),
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_from_vec_rejects_wrong_length() {
        assert!(Tensor::from_vec(&[2, 3], vec![0.0; 5]).is_err());
        assert!(Tensor::from_vec(&[2, 3], vec![0.0; 6]).is_ok());
    }

    #[test]
    fn test_matrix_round_trip_keeps_layout() {
        let m = Matrix::from_fn(2, 3, |i, j| (10 * i + j) as f64);
        let t = Tensor::from(m.clone());
        assert_eq!(t.shape, vec![2, 3]);
        assert_eq!(t.data[4], 11.0);
        assert_eq!(t.to_matrix().unwrap(), m);
    }

    #[test]
    fn test_flatten_rows() {
        let t = Tensor::from_vec(&[2, 2, 1, 2], (0..8).map(|x| x as f64).collect()).unwrap();
        let m = t.flatten_rows();
        assert_eq!(m.shape(), (2, 4));
        assert_eq!(m.data[1], vec![4.0, 5.0, 6.0, 7.0]);
    }

    #[test]
    fn test_check_layout_rejects_short_data() {
        let t = Tensor { shape: vec![1, 1, 4, 4], data: vec![0.0; 3] };
        assert!(t.check_layout("test").is_err());
        assert!(t.to_matrix().is_err());
        assert!(Tensor::zeros(&[1, 1, 4, 4]).check_layout("test").is_ok());
    }

    #[test]
    fn test_idx4_is_row_major() {
        let t = Tensor::zeros(&[2, 3, 4, 5]);
        assert_eq!(t.idx4(1, 2, 3, 4), t.len() - 1);
        assert_eq!(t.idx4(0, 1, 0, 0), 20);
    }
}
