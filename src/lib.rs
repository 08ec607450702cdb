pub mod error;
pub mod math;
pub mod layers;
pub mod loss;
pub mod network;
pub mod linear;
pub mod optim;
pub mod train;
pub mod gradcheck;

// Convenience re-exports
pub use error::{NnError, Result};
pub use math::matrix::Matrix;
pub use math::tensor::Tensor;
pub use loss::{
    softmax_loss, softmax_loss_naive, softmax_loss_vectorized, svm_loss, svm_loss_naive,
    svm_loss_vectorized, LossType,
};
pub use network::{ConvNetSpec, Grads, LossOutput, ParamName, Params, Precision, ThreeLayerConvNet};
pub use linear::LinearClassifier;
pub use optim::sgd::Sgd;
pub use train::{train_loop, TrainConfig};
