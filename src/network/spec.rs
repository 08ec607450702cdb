use serde::{Serialize, Deserialize};

use crate::error::{NnError, Result};
use crate::layers::{ConvParam, PoolParam};

/// Numeric precision the parameters are held at.
///
/// Storage is always `f64`; `F32` rounds every stored value through `f32`
/// so the network behaves like a single-precision one.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum Precision {
    F32,
    F64,
}

impl Precision {
    pub fn cast(self, value: f64) -> f64 {
        match self {
            Precision::F32 => value as f32 as f64,
            Precision::F64 => value,
        }
    }
}

/// Hyper-parameters of a [`ThreeLayerConvNet`](crate::network::ThreeLayerConvNet).
///
/// Every field has a default, so a JSON file only needs the values it changes.
///
/// Fields:
/// - `input_dim`    — (channels, height, width) of one input image
/// - `num_filters`  — filters in the convolutional layer
/// - `filter_size`  — side of the square filters; must be odd
/// - `hidden_dim`   — units in the hidden affine layer
/// - `num_classes`  — scores produced by the output layer
/// - `weight_scale` — standard deviation of the Gaussian weight init
/// - `reg`          — L2 regularization strength
/// - `precision`    — numeric precision of the parameters
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct ConvNetSpec {
    pub input_dim: (usize, usize, usize),
    pub num_filters: usize,
    pub filter_size: usize,
    pub hidden_dim: usize,
    pub num_classes: usize,
    pub weight_scale: f64,
    pub reg: f64,
    pub precision: Precision,
}

impl Default for ConvNetSpec {
    fn default() -> Self {
        ConvNetSpec {
            input_dim: (3, 32, 32),
            num_filters: 32,
            filter_size: 7,
            hidden_dim: 100,
            num_classes: 10,
            weight_scale: 1e-3,
            reg: 0.0,
            precision: Precision::F32,
        }
    }
}

impl ConvNetSpec {
    /// Rejects hyper-parameters the conv - pool - affine stack cannot be built from.
    pub fn validate(&self) -> Result<()> {
        let (c, h, w) = self.input_dim;
        let positive = [
            ("input_dim.channels", c),
            ("num_filters", self.num_filters),
            ("filter_size", self.filter_size),
            ("hidden_dim", self.hidden_dim),
            ("num_classes", self.num_classes),
        ];
        if let Some(&(parameter, _)) = positive.iter().find(|&&(_, v)| v == 0) {
            return Err(NnError::InvalidConfig {
                parameter,
                reason: "must be at least 1".to_string(),
            });
        }
        if h < 2 || w < 2 {
            return Err(NnError::InvalidConfig {
                parameter: "input_dim",
                reason: format!("spatial size {h}x{w} is too small for 2x2 pooling"),
            });
        }
        if self.filter_size % 2 == 0 {
            return Err(NnError::InvalidConfig {
                parameter: "filter_size",
                reason: format!("{} is even; same padding needs an odd size", self.filter_size),
            });
        }
        if !self.weight_scale.is_finite() || self.weight_scale < 0.0 {
            return Err(NnError::InvalidConfig {
                parameter: "weight_scale",
                reason: format!("{} is not a non-negative number", self.weight_scale),
            });
        }
        if !self.reg.is_finite() || self.reg < 0.0 {
            return Err(NnError::InvalidConfig {
                parameter: "reg",
                reason: format!("{} is not a non-negative number", self.reg),
            });
        }
        Ok(())
    }

    pub fn conv_param(&self) -> ConvParam {
        ConvParam::same(self.filter_size)
    }

    pub fn pool_param(&self) -> PoolParam {
        PoolParam::halving()
    }

    /// Spatial size after the size-preserving conv and the 2x2 pool.
    pub fn pooled_dims(&self) -> (usize, usize) {
        let (_, h, w) = self.input_dim;
        self.pool_param().output_dims(h, w)
    }

    /// Inputs to the hidden affine layer: num_filters * pooled height * pooled width.
    pub fn flattened_pooled_size(&self) -> usize {
        let (hp, wp) = self.pooled_dims();
        self.num_filters * hp * wp
    }

    /// Serializes the spec to a pretty-printed JSON file.
    pub fn save_json(&self, path: &str) -> std::io::Result<()> {
        let file = std::fs::File::create(path)?;
        let writer = std::io::BufWriter::new(file);
        serde_json::to_writer_pretty(writer, self)
            .map_err(|e| std::io::Error::new(std::io::ErrorKind::Other, e))
    }

    /// Deserializes a `ConvNetSpec` from a JSON file.
    pub fn load_json(path: &str) -> std::io::Result<ConvNetSpec> {
        let file = std::fs::File::open(path)?;
        let reader = std::io::BufReader::new(file);
        serde_json::from_reader(reader)
            .map_err(|e| std::io::Error::new(std::io::ErrorKind::Other, e))
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_default_flattened_size() {
        // 32x32 -> conv (same) -> pool -> 16x16, times 32 filters.
        assert_eq!(ConvNetSpec::default().flattened_pooled_size(), 32 * 16 * 16);
    }

    #[test]
    fn test_partial_json_fills_defaults() {
        let spec: ConvNetSpec = serde_json::from_str(r#"{"hidden_dim": 7, "precision": "f64"}"#).unwrap();
        assert_eq!(spec.hidden_dim, 7);
        assert_eq!(spec.num_filters, 32);
        assert_eq!(spec.precision, Precision::F64);
    }

    #[test]
    fn test_validate_rejects_even_filter() {
        let spec = ConvNetSpec { filter_size: 4, ..ConvNetSpec::default() };
        assert!(matches!(
            spec.validate(),
            Err(NnError::InvalidConfig { parameter: "filter_size", .. })
        ));
    }

    #[test]
    fn test_validate_rejects_zero_classes() {
        let spec = ConvNetSpec { num_classes: 0, ..ConvNetSpec::default() };
        assert!(spec.validate().is_err());
    }

    #[test]
    fn test_f32_cast_rounds() {
        let v = 0.1_f64;
        assert_ne!(Precision::F32.cast(v), v);
        assert_eq!(Precision::F64.cast(v), v);
    }
}
