use std::sync::Arc;

use log::debug;
use model::{INPUT_SIZE, ModelErr, NUM_CLASSES, NetworkModel, activations, dense};
use ndarray::ArrayView1;
use serde::{Deserialize, Serialize};

use crate::{EngineErr, ModelCache, WeightSource};

/// The classified digit and how sure the network is about it.
///
/// Serializes as `{"digit": ..., "confidence": ...}`, the same shape the prediction service
/// answers with, so either path can back the same presentation.
#[derive(Debug, Clone, Copy, PartialEq, Serialize, Deserialize)]
pub struct PredictionResult {
    /// The winning class, in `0..num_classes`.
    #[serde(rename = "digit")]
    pub class_index: usize,
    /// The winning class' probability as a percentage, in `[0, 100]`.
    pub confidence: f32,
}

/// Runs the two-layer digit classifier over rasterized drawings.
///
/// The network is fetched from its `WeightSource` on the first prediction (or on an explicit
/// `load`) and shared read-only afterwards, so an engine can serve any number of concurrent
/// predictions.
pub struct InferenceEngine<S> {
    cache: ModelCache<S>,
}

impl<S> InferenceEngine<S>
where
    S: WeightSource + Sync + 'static,
{
    /// Creates a new `InferenceEngine` for 28x28 drawings and ten digit classes.
    ///
    /// # Arguments
    /// * `source` - Where the network weights are fetched from.
    ///
    /// # Returns
    /// A new `InferenceEngine` instance. Nothing is loaded until it's needed.
    pub fn new(source: S) -> Self {
        Self::with_topology(source, INPUT_SIZE, NUM_CLASSES)
    }

    /// Creates a new `InferenceEngine` expecting a network of a different outer shape.
    ///
    /// # Arguments
    /// * `source` - Where the network weights are fetched from.
    /// * `inputs` - The input size the network's first layer must have.
    /// * `classes` - The output size the network's second layer must have.
    ///
    /// # Returns
    /// A new `InferenceEngine` instance.
    pub fn with_topology(source: S, inputs: usize, classes: usize) -> Self {
        Self {
            cache: ModelCache::new(source, (inputs, classes)),
        }
    }

    /// Loads the network now instead of on the first prediction.
    ///
    /// # Returns
    /// The loaded network or `ModelUnavailable` if it couldn't be loaded.
    pub async fn load(&self) -> Result<Arc<NetworkModel>, EngineErr> {
        self.cache.get().await.map_err(EngineErr::ModelUnavailable)
    }

    /// Whether the network has been loaded already.
    pub fn is_loaded(&self) -> bool {
        self.cache.loaded().is_some()
    }

    /// The number of weight loads this engine has started.
    pub fn load_attempts(&self) -> usize {
        self.cache.attempts()
    }

    /// Classifies a rasterized drawing.
    ///
    /// # Arguments
    /// * `input` - One intensity per pixel, row-major, as many as the network has inputs.
    ///
    /// # Returns
    /// The predicted class, `ModelUnavailable` if the network couldn't be loaded or an
    /// `Inference` error if `input` doesn't fit the network.
    pub async fn predict(&self, input: &[f32]) -> Result<PredictionResult, EngineErr> {
        let model = match self.cache.loaded() {
            Some(model) => model,
            None => {
                debug!("prediction waiting on ModelLoading");
                self.load().await?
            }
        };

        debug!(len = input.len(); "prediction Computing");
        let result = classify(&model, input)?;
        debug!(
            digit = result.class_index,
            confidence = result.confidence;
            "prediction Succeeded"
        );
        Ok(result)
    }
}

/// Runs `input` through `model`: dense, relu, dense, softmax, argmax.
///
/// # Returns
/// The most likely class with its probability as a percentage, or the `ModelErr` of the
/// first stage that rejected the input.
pub fn classify(model: &NetworkModel, input: &[f32]) -> Result<PredictionResult, ModelErr> {
    if let Some(index) = input.iter().position(|v| !v.is_finite()) {
        return Err(ModelErr::NonFinite {
            what: "input",
            index,
        });
    }

    if input.iter().any(|v| !(0.0..=1.0).contains(v)) {
        debug!("input holds intensities outside [0, 1]");
    }

    let hidden = activations::relu(dense::forward(ArrayView1::from(input), model.layer1())?);
    let logits = dense::forward(hidden.view(), model.layer2())?;
    let probs = activations::softmax(logits.view())?;
    let class_index = activations::argmax(probs.view())?;

    Ok(PredictionResult {
        class_index,
        confidence: probs[class_index] * 100.,
    })
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::BytesSource;

    const IDENTITY_2X2: &[u8] = br#"{
        "dense1": {"kernel": [1, 0, 0, 1], "bias": [0, 0], "shape": [2, 2]},
        "dense2": {"kernel": [1, 0, 0, 1], "bias": [0, 0], "shape": [2, 2]}
    }"#;

    fn identity() -> NetworkModel {
        NetworkModel::from_json(IDENTITY_2X2).unwrap()
    }

    #[test]
    fn classify_worked_example() {
        let result = classify(&identity(), &[1., 0.]).unwrap();
        assert_eq!(result.class_index, 0);
        assert!((result.confidence - 73.1).abs() < 0.05);
    }

    #[test]
    fn classify_ties_go_to_the_first_class() {
        let result = classify(&identity(), &[0., 0.]).unwrap();
        assert_eq!(result.class_index, 0);
        assert!((result.confidence - 50.).abs() < 1e-4);
    }

    #[test]
    fn classify_rejects_non_finite_input() {
        assert_eq!(
            classify(&identity(), &[0., f32::NAN]),
            Err(ModelErr::NonFinite {
                what: "input",
                index: 1
            })
        );
        assert!(classify(&identity(), &[f32::INFINITY, 0.]).is_err());
    }

    #[test]
    fn result_serializes_with_the_service_field_names() {
        let result = PredictionResult {
            class_index: 7,
            confidence: 98.5,
        };

        let json = serde_json::to_value(result).unwrap();
        assert_eq!(json, serde_json::json!({"digit": 7, "confidence": 98.5}));

        let back: PredictionResult = serde_json::from_value(json).unwrap();
        assert_eq!(back, result);
    }

    #[tokio::test]
    async fn predict_loads_lazily() {
        let engine = InferenceEngine::with_topology(BytesSource::new(IDENTITY_2X2), 2, 2);
        assert!(!engine.is_loaded());

        let result = engine.predict(&[0., 1.]).await.unwrap();
        assert_eq!(result.class_index, 1);
        assert!(engine.is_loaded());
        assert_eq!(engine.load_attempts(), 1);
    }

    #[tokio::test]
    async fn default_topology_rejects_a_tiny_network() {
        let engine = InferenceEngine::new(BytesSource::new(IDENTITY_2X2));

        let err = engine.predict(&[0.; INPUT_SIZE]).await.unwrap_err();
        assert!(matches!(err, EngineErr::ModelUnavailable(_)));
    }
}
