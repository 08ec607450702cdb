use crate::error::{NnError, Result};
use crate::math::tensor::Tensor;

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct PoolParam {
    pub pool_height: usize,
    pub pool_width: usize,
    pub stride: usize,
}

impl PoolParam {
    /// 2x2 windows with stride 2, halving each spatial dimension.
    pub fn halving() -> PoolParam {
        PoolParam {
            pool_height: 2,
            pool_width: 2,
            stride: 2,
        }
    }

    pub fn output_dims(&self, h: usize, w: usize) -> (usize, usize) {
        (
            (h - self.pool_height) / self.stride + 1,
            (w - self.pool_width) / self.stride + 1,
        )
    }
}

/// Input shape plus, for every pooled output, the flat input offset that won.
#[derive(Debug, Clone)]
pub struct PoolCache {
    input_shape: Vec<usize>,
    output_shape: Vec<usize>,
    argmax: Vec<usize>,
}

/// Max pooling over each channel of an NCHW batch.
pub fn max_pool_forward(x: &Tensor, param: PoolParam) -> Result<(Tensor, PoolCache)> {
    x.check_layout("max_pool_forward")?;
    if x.ndim() != 4 {
        return Err(NnError::ShapeMismatch {
            context: "max_pool_forward",
            expected: vec![4],
            got: vec![x.ndim()],
        });
    }
    if param.stride == 0 || param.pool_height == 0 || param.pool_width == 0 {
        return Err(NnError::InvalidConfig {
            parameter: "pool_param",
            reason: "window and stride must be at least 1".to_string(),
        });
    }
    let (n, c, h, w) = (x.shape[0], x.shape[1], x.shape[2], x.shape[3]);
    if h < param.pool_height || w < param.pool_width {
        return Err(NnError::ShapeMismatch {
            context: "max_pool_forward",
            expected: vec![param.pool_height, param.pool_width],
            got: vec![h, w],
        });
    }

    let (h_out, w_out) = param.output_dims(h, w);
    let mut out = Tensor::zeros(&[n, c, h_out, w_out]);
    let mut argmax = vec![0; out.len()];

    for ni in 0..n {
        for ci in 0..c {
            for oh in 0..h_out {
                for ow in 0..w_out {
                    // Track argmax to route gradients during backprop.
                    let mut best = f64::NEG_INFINITY;
                    let mut best_idx = x.idx4(ni, ci, oh * param.stride, ow * param.stride);
                    for dy in 0..param.pool_height {
                        for dx in 0..param.pool_width {
                            let i = x.idx4(ni, ci, oh * param.stride + dy, ow * param.stride + dx);
                            if x.data[i] > best {
                                best = x.data[i];
                                best_idx = i;
                            }
                        }
                    }
                    let o = out.idx4(ni, ci, oh, ow);
                    out.data[o] = best;
                    argmax[o] = best_idx;
                }
            }
        }
    }

    let cache = PoolCache {
        input_shape: x.shape.clone(),
        output_shape: out.shape.clone(),
        argmax,
    };
    Ok((out, cache))
}

/// Scatters each upstream gradient onto the input element that won its window.
pub fn max_pool_backward(dout: &Tensor, cache: &PoolCache) -> Result<Tensor> {
    if dout.shape != cache.output_shape {
        return Err(NnError::ShapeMismatch {
            context: "max_pool_backward",
            expected: cache.output_shape.clone(),
            got: dout.shape.clone(),
        });
    }
    dout.check_layout("max_pool_backward")?;
    let mut dx = Tensor::zeros(&cache.input_shape);
    for (&g, &i) in dout.data.iter().zip(cache.argmax.iter()) {
        dx.data[i] += g;
    }
    Ok(dx)
}
