//! Layer primitives. Each forward returns `(output, cache)`; the paired
//! backward takes `(upstream gradient, &cache)` and returns the gradients
//! with respect to the forward inputs.

pub mod affine;
pub mod conv;
pub mod pool;
pub mod relu;

pub use affine::{affine_backward, affine_forward, AffineCache};
pub use conv::{conv_backward, conv_forward, ConvCache, ConvParam};
pub use pool::{max_pool_backward, max_pool_forward, PoolCache, PoolParam};
pub use relu::{relu_backward, relu_forward, ReluCache};
