use log::debug;
use rand::Rng;
use serde::{Serialize, Deserialize};

use crate::error::{check_labels, NnError, Result};
use crate::layers::{
    affine_backward, affine_forward, conv_backward, conv_forward, max_pool_backward,
    max_pool_forward, relu_backward, relu_forward,
};
use crate::loss::softmax_loss;
use crate::math::argmax;
use crate::math::tensor::Tensor;
use crate::network::params::{Grads, ParamName, Params};
use crate::network::spec::{ConvNetSpec, Precision};

/// Result of [`ThreeLayerConvNet::loss`].
#[derive(Debug, Clone)]
pub enum LossOutput {
    /// No labels were given: class scores, (N, num_classes).
    Scores(Tensor),
    /// Labels were given: regularized loss and one gradient per parameter.
    Loss { loss: f64, grads: Grads },
}

/// A three-layer convolutional network:
///
/// conv - relu - 2x2 max pool - affine - relu - affine - softmax
///
/// Inputs are NCHW minibatches. The parameters live in a name -> tensor
/// store that an optimizer updates between calls to [`loss`](Self::loss).
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct ThreeLayerConvNet {
    spec: ConvNetSpec,
    params: Params,
}

impl ThreeLayerConvNet {
    /// Builds the network: weights ~ N(0, weight_scale^2), biases zero, every
    /// value cast to `spec.precision`.
    pub fn new<R: Rng + ?Sized>(spec: ConvNetSpec, rng: &mut R) -> Result<ThreeLayerConvNet> {
        spec.validate()?;

        let (c, _, _) = spec.input_dim;
        let f = spec.num_filters;
        let fs = spec.filter_size;
        let scale = spec.weight_scale;

        let mut params = Params::new();
        params.insert(ParamName::W1, Tensor::randn(&[f, c, fs, fs], scale, rng));
        params.insert(ParamName::B1, Tensor::zeros(&[f]));
        params.insert(
            ParamName::W2,
            Tensor::randn(&[spec.flattened_pooled_size(), spec.hidden_dim], scale, rng),
        );
        params.insert(ParamName::B2, Tensor::zeros(&[spec.hidden_dim]));
        params.insert(
            ParamName::W3,
            Tensor::randn(&[spec.hidden_dim, spec.num_classes], scale, rng),
        );
        params.insert(ParamName::B3, Tensor::zeros(&[spec.num_classes]));

        let precision = spec.precision;
        for tensor in params.values_mut() {
            *tensor = tensor.map(|v| precision.cast(v));
        }

        debug!(
            "built convnet: input {:?}, {} filters {}x{}, hidden {}, classes {}",
            spec.input_dim, f, fs, fs, spec.hidden_dim, spec.num_classes
        );
        Ok(ThreeLayerConvNet { spec, params })
    }

    pub fn spec(&self) -> &ConvNetSpec {
        &self.spec
    }

    pub fn reg(&self) -> f64 {
        self.spec.reg
    }

    pub fn precision(&self) -> Precision {
        self.spec.precision
    }

    pub fn params(&self) -> &Params {
        &self.params
    }

    /// Mutable access for optimizers. Shapes must be left unchanged.
    pub fn params_mut(&mut self) -> &mut Params {
        &mut self.params
    }

    /// Shape every parameter must have for this spec.
    pub fn expected_shape(&self, name: ParamName) -> Vec<usize> {
        let s = &self.spec;
        let (c, _, _) = s.input_dim;
        match name {
            ParamName::W1 => vec![s.num_filters, c, s.filter_size, s.filter_size],
            ParamName::B1 => vec![s.num_filters],
            ParamName::W2 => vec![s.flattened_pooled_size(), s.hidden_dim],
            ParamName::B2 => vec![s.hidden_dim],
            ParamName::W3 => vec![s.hidden_dim, s.num_classes],
            ParamName::B3 => vec![s.num_classes],
        }
    }

    fn param(&self, name: ParamName) -> Result<&Tensor> {
        let tensor = self.params.get(&name).ok_or_else(|| NnError::InvalidConfig {
            parameter: "params",
            reason: format!("missing parameter {name}"),
        })?;
        let expected = self.expected_shape(name);
        if tensor.shape != expected {
            return Err(NnError::ShapeMismatch {
                context: name.as_str(),
                expected,
                got: tensor.shape.clone(),
            });
        }
        tensor.check_layout(name.as_str())?;
        Ok(tensor)
    }

    /// Checks that the store holds exactly the six parameters at their shapes.
    pub fn check_params(&self) -> Result<()> {
        if self.params.len() != ParamName::ALL.len() {
            return Err(NnError::InvalidConfig {
                parameter: "params",
                reason: format!("expected {} parameters, found {}", ParamName::ALL.len(), self.params.len()),
            });
        }
        for name in ParamName::ALL {
            self.param(name)?;
        }
        Ok(())
    }

    fn check_input(&self, x: &Tensor) -> Result<()> {
        let (c, h, w) = self.spec.input_dim;
        if x.ndim() != 4 || x.shape[1..] != [c, h, w] {
            let n = x.shape.first().copied().unwrap_or(0);
            return Err(NnError::ShapeMismatch {
                context: "ThreeLayerConvNet::loss",
                expected: vec![n, c, h, w],
                got: x.shape.clone(),
            });
        }
        x.check_layout("ThreeLayerConvNet::loss")
    }

    /// Evaluates the network on a minibatch `x` of shape (N, C, H, W).
    ///
    /// Without labels this returns the (N, num_classes) score tensor. With
    /// labels it returns the softmax loss plus `0.5 * reg * sum(W^2)` over
    /// W1, W2 and W3, and the gradient of that loss for every parameter.
    pub fn loss(&self, x: &Tensor, y: Option<&[usize]>) -> Result<LossOutput> {
        self.check_input(x)?;
        if let Some(y) = y {
            if y.len() != x.shape[0] {
                return Err(NnError::ShapeMismatch {
                    context: "ThreeLayerConvNet::loss",
                    expected: vec![x.shape[0]],
                    got: vec![y.len()],
                });
            }
            check_labels(y, self.spec.num_classes)?;
        }

        let (w1, b1) = (self.param(ParamName::W1)?, self.param(ParamName::B1)?);
        let (w2, b2) = (self.param(ParamName::W2)?, self.param(ParamName::B2)?);
        let (w3, b3) = (self.param(ParamName::W3)?, self.param(ParamName::B3)?);

        let (conv, conv_cache) = conv_forward(x, w1, b1, self.spec.conv_param())?;
        let (relu1, relu1_cache) = relu_forward(&conv);
        let (pooled, pool_cache) = max_pool_forward(&relu1, self.spec.pool_param())?;
        let (fc1, fc1_cache) = affine_forward(&pooled, w2, b2)?;
        let (relu2, relu2_cache) = relu_forward(&fc1);
        let (scores, fc2_cache) = affine_forward(&relu2, w3, b3)?;
        debug!("convnet forward: input {:?} -> scores {:?}", x.shape, scores.shape);

        let Some(y) = y else {
            return Ok(LossOutput::Scores(scores));
        };

        let (data_loss, dscores) = softmax_loss(&scores.to_matrix()?, y)?;
        let reg = self.spec.reg;
        let mut reg_loss = 0.0;
        for name in ParamName::ALL.into_iter().filter(|n| n.is_weight()) {
            reg_loss += 0.5 * reg * self.param(name)?.sum_squares();
        }
        let loss = data_loss + reg_loss;

        let (drelu2, dw3, db3) = affine_backward(&Tensor::from(dscores), &fc2_cache)?;
        let dfc1 = relu_backward(&drelu2, &relu2_cache)?;
        let (dpooled, dw2, db2) = affine_backward(&dfc1, &fc1_cache)?;
        let drelu1 = max_pool_backward(&dpooled, &pool_cache)?;
        let dconv = relu_backward(&drelu1, &relu1_cache)?;
        let (_dx, dw1, db1) = conv_backward(&dconv, &conv_cache)?;

        let mut grads: Grads = [
            (ParamName::W1, dw1),
            (ParamName::B1, db1),
            (ParamName::W2, dw2),
            (ParamName::B2, db2),
            (ParamName::W3, dw3),
            (ParamName::B3, db3),
        ]
        .into_iter()
        .collect();
        for (name, grad) in grads.iter_mut().filter(|(n, _)| n.is_weight()) {
            add_scaled(grad, self.param(*name)?, reg);
        }

        debug!("convnet loss {loss:.6} (data {data_loss:.6}, reg {reg_loss:.6})");
        Ok(LossOutput::Loss { loss, grads })
    }

    /// Class scores for `x`, shape (N, num_classes).
    pub fn scores(&self, x: &Tensor) -> Result<Tensor> {
        match self.loss(x, None)? {
            LossOutput::Scores(scores) => Ok(scores),
            LossOutput::Loss { .. } => unreachable!("loss without labels yields scores"),
        }
    }

    /// Loss and gradients for a labelled minibatch.
    pub fn loss_and_grads(&self, x: &Tensor, y: &[usize]) -> Result<(f64, Grads)> {
        match self.loss(x, Some(y))? {
            LossOutput::Loss { loss, grads } => Ok((loss, grads)),
            LossOutput::Scores(_) => unreachable!("loss with labels yields gradients"),
        }
    }

    /// Highest-scoring class for every example.
    pub fn predict(&self, x: &Tensor) -> Result<Vec<usize>> {
        let scores = self.scores(x)?.to_matrix()?;
        Ok(scores.data.iter().map(|row| argmax(row)).collect())
    }

    /// Serializes the spec and parameters to a pretty-printed JSON file.
    pub fn save_json(&self, path: &str) -> std::io::Result<()> {
        let file = std::fs::File::create(path)?;
        let writer = std::io::BufWriter::new(file);
        serde_json::to_writer_pretty(writer, self)
            .map_err(|e| std::io::Error::new(std::io::ErrorKind::Other, e))
    }

    /// Deserializes a network written by `save_json`, rejecting parameter
    /// stores that do not fit the stored spec.
    pub fn load_json(path: &str) -> std::io::Result<ThreeLayerConvNet> {
        let file = std::fs::File::open(path)?;
        let reader = std::io::BufReader::new(file);
        let net: ThreeLayerConvNet = serde_json::from_reader(reader)
            .map_err(|e| std::io::Error::new(std::io::ErrorKind::Other, e))?;
        net.spec
            .validate()
            .and_then(|_| net.check_params())
            .map_err(|e| std::io::Error::new(std::io::ErrorKind::InvalidData, e))?;
        Ok(net)
    }
}

/// `grad += reg * weight`, elementwise.
fn add_scaled(grad: &mut Tensor, weight: &Tensor, reg: f64) {
    for (g, w) in grad.data.iter_mut().zip(weight.data.iter()) {
        *g += reg * w;
    }
}
