//! Finite-difference gradient checking.

use log::trace;
use rand::Rng;

use crate::math::matrix::Matrix;
use crate::math::tensor::Tensor;

/// Centered-difference gradient of `f` at every entry of `x`.
///
/// `x` is perturbed in place and restored before returning.
pub fn eval_numerical_gradient<F>(mut f: F, x: &mut Tensor, h: f64) -> Tensor
where
    F: FnMut(&Tensor) -> f64,
{
    let mut grad = Tensor::zeros(&x.shape);
    for i in 0..x.len() {
        let old = x.data[i];
        x.data[i] = old + h;
        let fxph = f(x);
        x.data[i] = old - h;
        let fxmh = f(x);
        x.data[i] = old;
        grad.data[i] = (fxph - fxmh) / (2.0 * h);
    }
    grad
}

/// [`eval_numerical_gradient`] for a `Matrix` argument.
pub fn eval_numerical_gradient_matrix<F>(mut f: F, x: &mut Matrix, h: f64) -> Matrix
where
    F: FnMut(&Matrix) -> f64,
{
    let mut grad = Matrix::zeros(x.rows, x.cols);
    for i in 0..x.rows {
        for j in 0..x.cols {
            let old = x.data[i][j];
            x.data[i][j] = old + h;
            let fxph = f(x);
            x.data[i][j] = old - h;
            let fxmh = f(x);
            x.data[i][j] = old;
            grad.data[i][j] = (fxph - fxmh) / (2.0 * h);
        }
    }
    grad
}

/// Compares `analytic` against centered differences at `num_checks` random
/// entries of `x` and returns the relative error of each.
///
/// An empty `x` has nothing to sample, so the result is empty.
pub fn grad_check_sparse<F, R>(
    mut f: F,
    x: &mut Matrix,
    analytic: &Matrix,
    num_checks: usize,
    h: f64,
    rng: &mut R,
) -> Vec<f64>
where
    F: FnMut(&Matrix) -> f64,
    R: Rng + ?Sized,
{
    if x.rows == 0 || x.cols == 0 {
        return Vec::new();
    }
    (0..num_checks)
        .map(|_| {
            let i = rng.gen_range(0..x.rows);
            let j = rng.gen_range(0..x.cols);
            let old = x.data[i][j];
            x.data[i][j] = old + h;
            let fxph = f(x);
            x.data[i][j] = old - h;
            let fxmh = f(x);
            x.data[i][j] = old;

            let numeric = (fxph - fxmh) / (2.0 * h);
            let exact = analytic.data[i][j];
            let err = scalar_rel_error(numeric, exact);
            trace!("({i}, {j}) numerical: {numeric:e} analytic: {exact:e}, relative error: {err:e}");
            err
        })
        .collect()
}

/// Largest elementwise relative error `|a - b| / max(1e-8, |a| + |b|)`.
pub fn rel_error(a: &[f64], b: &[f64]) -> f64 {
    a.iter()
        .zip(b.iter())
        .map(|(&x, &y)| scalar_rel_error(x, y))
        .fold(0.0, f64::max)
}

fn scalar_rel_error(a: f64, b: f64) -> f64 {
    (a - b).abs() / (a.abs() + b.abs()).max(1e-8)
}
