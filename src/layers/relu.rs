use crate::error::{NnError, Result};
use crate::math::tensor::Tensor;

#[derive(Debug, Clone)]
pub struct ReluCache {
    x: Tensor,
}

/// Elementwise `max(0, x)`.
pub fn relu_forward(x: &Tensor) -> (Tensor, ReluCache) {
    let out = x.map(|v| if v > 0.0 { v } else { 0.0 });
    (out, ReluCache { x: x.clone() })
}

/// Passes `dout` through where the forward input was positive.
pub fn relu_backward(dout: &Tensor, cache: &ReluCache) -> Result<Tensor> {
    if dout.shape != cache.x.shape {
        return Err(NnError::ShapeMismatch {
            context: "relu_backward",
            expected: cache.x.shape.clone(),
            got: dout.shape.clone(),
        });
    }
    dout.check_layout("relu_backward")?;
    cache.x.check_layout("relu_backward")?;
    let data = dout
        .data
        .iter()
        .zip(cache.x.data.iter())
        .map(|(&g, &x)| if x > 0.0 { g } else { 0.0 })
        .collect();
    Tensor::from_vec(&dout.shape, data)
}
