//! Naive 2D convolution over NCHW batches.

use crate::error::{NnError, Result};
use crate::math::tensor::Tensor;

/// Stride and zero-padding for [`conv_forward`].
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct ConvParam {
    pub stride: usize,
    pub pad: usize,
}

impl ConvParam {
    /// Stride 1 with the padding that keeps an odd `filter_size` from
    /// shrinking the input.
    pub fn same(filter_size: usize) -> ConvParam {
        ConvParam {
            stride: 1,
            pad: filter_size.saturating_sub(1) / 2,
        }
    }

    /// Output length along one spatial axis.
    pub fn output_len(&self, input: usize, filter: usize) -> usize {
        (input + 2 * self.pad - filter) / self.stride + 1
    }
}

#[derive(Debug, Clone)]
pub struct ConvCache {
    x: Tensor,
    w: Tensor,
    param: ConvParam,
}

/// Convolves `x` (N, C, H, W) with filters `w` (F, C, HH, WW) plus bias `b` (F).
///
/// Returns (N, F, H', W') with H' = 1 + (H + 2 * pad - HH) / stride.
pub fn conv_forward(x: &Tensor, w: &Tensor, b: &Tensor, param: ConvParam) -> Result<(Tensor, ConvCache)> {
    check_conv_shapes(x, w, b, param)?;

    let (n, c, h, wd) = (x.shape[0], x.shape[1], x.shape[2], x.shape[3]);
    let (f, hh, ww) = (w.shape[0], w.shape[2], w.shape[3]);
    let h_out = param.output_len(h, hh);
    let w_out = param.output_len(wd, ww);
    let mut out = Tensor::zeros(&[n, f, h_out, w_out]);

    for ni in 0..n {
        for fi in 0..f {
            for oh in 0..h_out {
                for ow in 0..w_out {
                    let mut sum = b.data[fi];
                    for ci in 0..c {
                        for kh in 0..hh {
                            let Some(ih) = padded_index(oh, kh, param, h) else { continue };
                            for kw in 0..ww {
                                let Some(iw) = padded_index(ow, kw, param, wd) else { continue };
                                sum += x.data[x.idx4(ni, ci, ih, iw)] * w.data[w.idx4(fi, ci, kh, kw)];
                            }
                        }
                    }
                    let o = out.idx4(ni, fi, oh, ow);
                    out.data[o] = sum;
                }
            }
        }
    }

    let cache = ConvCache {
        x: x.clone(),
        w: w.clone(),
        param,
    };
    Ok((out, cache))
}

/// Returns `(dx, dw, db)` for an upstream gradient shaped like the forward output.
pub fn conv_backward(dout: &Tensor, cache: &ConvCache) -> Result<(Tensor, Tensor, Tensor)> {
    let ConvCache { x, w, param } = cache;
    let (n, c, h, wd) = (x.shape[0], x.shape[1], x.shape[2], x.shape[3]);
    let (f, hh, ww) = (w.shape[0], w.shape[2], w.shape[3]);
    let h_out = param.output_len(h, hh);
    let w_out = param.output_len(wd, ww);
    let expected = vec![n, f, h_out, w_out];
    if dout.shape != expected {
        return Err(NnError::ShapeMismatch {
            context: "conv_backward",
            expected,
            got: dout.shape.clone(),
        });
    }
    dout.check_layout("conv_backward")?;

    let mut dx = Tensor::zeros(&x.shape);
    let mut dw = Tensor::zeros(&w.shape);
    let mut db = Tensor::zeros(&[f]);

    for ni in 0..n {
        for fi in 0..f {
            for oh in 0..h_out {
                for ow in 0..w_out {
                    let g = dout.data[dout.idx4(ni, fi, oh, ow)];
                    db.data[fi] += g;
                    for ci in 0..c {
                        for kh in 0..hh {
                            let Some(ih) = padded_index(oh, kh, *param, h) else { continue };
                            for kw in 0..ww {
                                let Some(iw) = padded_index(ow, kw, *param, wd) else { continue };
                                let xi = x.idx4(ni, ci, ih, iw);
                                let wi = w.idx4(fi, ci, kh, kw);
                                dw.data[wi] += g * x.data[xi];
                                dx.data[xi] += g * w.data[wi];
                            }
                        }
                    }
                }
            }
        }
    }

    Ok((dx, dw, db))
}

/// Maps an output position plus filter offset back into the unpadded input,
/// or `None` when it lands in the zero padding.
#[inline]
fn padded_index(out_pos: usize, offset: usize, param: ConvParam, len: usize) -> Option<usize> {
    (out_pos * param.stride + offset)
        .checked_sub(param.pad)
        .filter(|&i| i < len)
}

fn check_conv_shapes(x: &Tensor, w: &Tensor, b: &Tensor, param: ConvParam) -> Result<()> {
    x.check_layout("conv_forward")?;
    w.check_layout("conv_forward")?;
    b.check_layout("conv_forward")?;
    if x.ndim() != 4 || w.ndim() != 4 {
        return Err(NnError::ShapeMismatch {
            context: "conv_forward",
            expected: vec![4, 4],
            got: vec![x.ndim(), w.ndim()],
        });
    }
    if x.shape[1] != w.shape[1] {
        return Err(NnError::ShapeMismatch {
            context: "conv_forward",
            expected: vec![w.shape[1]],
            got: vec![x.shape[1]],
        });
    }
    if b.shape != [w.shape[0]] {
        return Err(NnError::ShapeMismatch {
            context: "conv_forward",
            expected: vec![w.shape[0]],
            got: b.shape.clone(),
        });
    }
    if param.stride == 0 {
        return Err(NnError::InvalidConfig {
            parameter: "stride",
            reason: "must be at least 1".to_string(),
        });
    }
    if x.shape[2] + 2 * param.pad < w.shape[2] || x.shape[3] + 2 * param.pad < w.shape[3] {
        return Err(NnError::ShapeMismatch {
            context: "conv_forward",
            expected: vec![w.shape[2], w.shape[3]],
            got: vec![x.shape[2] + 2 * param.pad, x.shape[3] + 2 * param.pad],
        });
    }
    Ok(())
}
