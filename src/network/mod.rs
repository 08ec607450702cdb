pub mod convnet;
pub mod params;
pub mod spec;

pub use convnet::{LossOutput, ThreeLayerConvNet};
pub use params::{Grads, ParamName, Params};
pub use spec::{ConvNetSpec, Precision};
