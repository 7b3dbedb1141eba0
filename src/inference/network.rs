use serde::Deserialize;

use crate::core::imaging::ImageTensor;
use crate::inference::{ImageClassifier, InferenceError, TabularClassifier};

/// Activation applied after a dense layer
#[derive(Debug, Clone, Copy, PartialEq, Eq, Deserialize, Default)]
#[serde(rename_all = "lowercase")]
pub enum Activation {
    #[default]
    Linear,
    Relu,
    Sigmoid,
    Tanh,
}

impl Activation {
    #[inline]
    fn apply(self, x: f64) -> f64 {
        match self {
            Activation::Linear => x,
            Activation::Relu => x.max(0.0),
            Activation::Sigmoid => 1.0 / (1.0 + (-x).exp()),
            Activation::Tanh => x.tanh(),
        }
    }
}

/// Fully connected layer, `weights[unit][input]`
#[derive(Debug, Clone, Deserialize)]
pub struct DenseLayer {
    pub weights: Vec<Vec<f64>>,
    pub bias: Vec<f64>,
    #[serde(default)]
    pub activation: Activation,
}

impl DenseLayer {
    fn inputs(&self) -> usize {
        self.weights.first().map(Vec::len).unwrap_or(0)
    }

    fn forward(&self, input: &[f64]) -> Vec<f64> {
        self.weights
            .iter()
            .zip(&self.bias)
            .map(|(row, bias)| {
                let z: f64 = row.iter().zip(input).map(|(w, x)| w * x).sum::<f64>() + bias;
                self.activation.apply(z)
            })
            .collect()
    }
}

/// Stack of dense layers exported from a trained Keras model
///
/// The first unit of the final layer is read as the probability, matching
/// `model.predict(x)[0][0]`.
#[derive(Debug, Clone, Deserialize)]
#[serde(try_from = "RawSequential")]
pub struct Sequential {
    layers: Vec<DenseLayer>,
}

#[derive(Deserialize)]
struct RawSequential {
    layers: Vec<DenseLayer>,
}

impl TryFrom<RawSequential> for Sequential {
    type Error = InferenceError;

    fn try_from(raw: RawSequential) -> Result<Self, Self::Error> {
        Sequential::new(raw.layers)
    }
}

impl Sequential {
    /// Build a network, checking that consecutive layer widths line up
    pub fn new(layers: Vec<DenseLayer>) -> Result<Self, InferenceError> {
        if layers.is_empty() {
            return Err(InferenceError::InvalidModel("network has no layers".into()));
        }

        for (index, layer) in layers.iter().enumerate() {
            if layer.weights.len() != layer.bias.len() {
                return Err(InferenceError::InvalidModel(format!(
                    "layer {} has {} weight rows but {} biases",
                    index,
                    layer.weights.len(),
                    layer.bias.len()
                )));
            }
            let width = layer.inputs();
            if layer.weights.iter().any(|row| row.len() != width) {
                return Err(InferenceError::InvalidModel(format!("layer {} has ragged weights", index)));
            }
            if index > 0 && layers[index - 1].bias.len() != width {
                return Err(InferenceError::InvalidModel(format!(
                    "layer {} expects {} inputs but previous layer has {} units",
                    index,
                    width,
                    layers[index - 1].bias.len()
                )));
            }
        }

        Ok(Self { layers })
    }

    pub fn from_json(json: &str) -> Result<Self, InferenceError> {
        Ok(serde_json::from_str(json)?)
    }

    /// Width of the expected input vector
    pub fn input_size(&self) -> usize {
        self.layers[0].inputs()
    }

    pub fn forward(&self, input: &[f64]) -> Result<Vec<f64>, InferenceError> {
        if input.len() != self.input_size() {
            return Err(InferenceError::Shape {
                expected: self.input_size(),
                actual: input.len(),
            });
        }

        let mut activations = input.to_vec();
        for layer in &self.layers {
            activations = layer.forward(&activations);
        }
        Ok(activations)
    }

    fn first_output(&self, input: &[f64]) -> Result<f64, InferenceError> {
        self.forward(input)?
            .first()
            .copied()
            .ok_or_else(|| InferenceError::InvalidModel("network produced no output".into()))
    }
}

impl TabularClassifier for Sequential {
    fn predict_proba(&self, features: &[f64]) -> Result<f64, InferenceError> {
        self.first_output(features)
    }
}

/// Image classifier that average-pools the tensor before a dense network
#[derive(Debug, Clone, Deserialize)]
pub struct PooledImageClassifier {
    /// Side of the square pooling window, in pixels
    #[serde(default = "default_pool")]
    pub pool: usize,
    pub network: Sequential,
}

fn default_pool() -> usize { 1 }

impl PooledImageClassifier {
    pub fn from_json(json: &str) -> Result<Self, InferenceError> {
        let classifier: Self = serde_json::from_str(json)?;
        if classifier.pool == 0 {
            return Err(InferenceError::InvalidModel("pool size must be positive".into()));
        }
        Ok(classifier)
    }
}

impl ImageClassifier for PooledImageClassifier {
    fn predict(&self, image: &ImageTensor) -> Result<f64, InferenceError> {
        let pooled = image.average_pool(self.pool);
        let features: Vec<f64> = pooled.iter().map(|&v| v as f64).collect();
        self.network.first_output(&features)
    }
}
