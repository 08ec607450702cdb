use std::collections::BTreeMap;
use std::fmt;

use serde::{Deserialize, Serialize};

use crate::math::tensor::Tensor;

/// Keys of the convnet parameter store.
#[derive(Debug, Clone, Copy, PartialEq, Eq, PartialOrd, Ord, Hash, Serialize, Deserialize)]
pub enum ParamName {
    /// Convolution filters, (F, C, HH, WW).
    W1,
    /// Convolution bias, (F).
    #[serde(rename = "b1")]
    B1,
    /// Hidden affine weight, (F * H/2 * W/2, hidden_dim).
    W2,
    #[serde(rename = "b2")]
    B2,
    /// Output affine weight, (hidden_dim, num_classes).
    W3,
    #[serde(rename = "b3")]
    B3,
}

impl ParamName {
    pub const ALL: [ParamName; 6] = [
        ParamName::W1,
        ParamName::B1,
        ParamName::W2,
        ParamName::B2,
        ParamName::W3,
        ParamName::B3,
    ];

    /// Weights carry the L2 penalty; biases do not.
    pub fn is_weight(self) -> bool {
        matches!(self, ParamName::W1 | ParamName::W2 | ParamName::W3)
    }

    pub fn as_str(self) -> &'static str {
        match self {
            ParamName::W1 => "W1",
            ParamName::B1 => "b1",
            ParamName::W2 => "W2",
            ParamName::B2 => "b2",
            ParamName::W3 => "W3",
            ParamName::B3 => "b3",
        }
    }
}

impl fmt::Display for ParamName {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

/// Named parameter tensors.
pub type Params = BTreeMap<ParamName, Tensor>;

/// Gradients keyed exactly like [`Params`].
pub type Grads = BTreeMap<ParamName, Tensor>;
