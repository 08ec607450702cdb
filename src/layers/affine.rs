use crate::error::{NnError, Result};
use crate::math::matrix::Matrix;
use crate::math::tensor::Tensor;

/// Values saved by [`affine_forward`] for the backward pass.
#[derive(Debug, Clone)]
pub struct AffineCache {
    x: Tensor,
    w: Matrix,
}

/// Fully connected transform `out = x.reshape(N, D) * w + b`.
///
/// `x` has shape (N, d1, ..., dk) with D = d1 * ... * dk, `w` is (D, M) and
/// `b` is (M). Returns an (N, M) tensor.
pub fn affine_forward(x: &Tensor, w: &Tensor, b: &Tensor) -> Result<(Tensor, AffineCache)> {
    x.check_layout("affine_forward")?;
    w.check_layout("affine_forward")?;
    b.check_layout("affine_forward")?;
    if w.ndim() != 2 || x.ndim() < 2 {
        return Err(NnError::ShapeMismatch {
            context: "affine_forward",
            expected: vec![2],
            got: vec![x.ndim(), w.ndim()],
        });
    }
    let x_flat = x.flatten_rows();
    let (d, m) = (w.shape[0], w.shape[1]);
    if x_flat.cols != d {
        return Err(NnError::ShapeMismatch {
            context: "affine_forward",
            expected: vec![x_flat.rows, d],
            got: vec![x_flat.rows, x_flat.cols],
        });
    }
    if b.shape != [m] {
        return Err(NnError::ShapeMismatch {
            context: "affine_forward",
            expected: vec![m],
            got: b.shape.clone(),
        });
    }

    let w = w.to_matrix()?;
    let mut out = x_flat.dot(&w);
    for row in out.data.iter_mut() {
        for (o, bias) in row.iter_mut().zip(b.data.iter()) {
            *o += bias;
        }
    }

    let cache = AffineCache { x: x.clone(), w };
    Ok((Tensor::from(out), cache))
}

/// Returns `(dx, dw, db)` with the shapes of `x`, `w` and `b`.
pub fn affine_backward(dout: &Tensor, cache: &AffineCache) -> Result<(Tensor, Tensor, Tensor)> {
    let x_flat = cache.x.flatten_rows();
    let expected = vec![x_flat.rows, cache.w.cols];
    if dout.shape != expected {
        return Err(NnError::ShapeMismatch {
            context: "affine_backward",
            expected,
            got: dout.shape.clone(),
        });
    }

    let dout = dout.to_matrix()?;
    let dx = Tensor::from(dout.dot(&cache.w.transpose())).reshape(&cache.x.shape)?;
    let dw = Tensor::from(x_flat.transpose().dot(&dout));

    let mut db = vec![0.0; dout.cols];
    for row in &dout.data {
        for (acc, g) in db.iter_mut().zip(row.iter()) {
            *acc += g;
        }
    }
    let db = Tensor::from_vec(&[dout.cols], db)?;

    Ok((dx, dw, db))
}
