use log::info;
use ndarray::{Array1, Array2, ArrayView1, ArrayView2};
use serde::Deserialize;

use crate::{ModelErr, Result};

/// Side length of the square grid the network reads.
pub const GRID_SIDE: usize = 28;

/// Number of pixels in a rasterized input, `GRID_SIDE * GRID_SIDE`.
pub const INPUT_SIZE: usize = GRID_SIDE * GRID_SIDE;

/// Number of digit classes the network scores.
pub const NUM_CLASSES: usize = 10;

/// A dense layer entry as it appears in the weights document.
#[derive(Debug, Deserialize)]
struct LayerDoc {
    kernel: Vec<f32>,
    bias: Vec<f32>,
    shape: (usize, usize),
}

/// The weights document: two named dense layers, anything else is ignored.
#[derive(Debug, Deserialize)]
struct ModelDoc {
    dense1: LayerDoc,
    dense2: LayerDoc,
}

/// The immutable parameters of a single fully-connected layer.
///
/// The kernel is laid out row-major by input index: the weight connecting input feature `i`
/// to output unit `j` lives at flat offset `i * output_size + j`. This is the layout a Keras
/// `Dense` kernel of shape `(input_size, output_size)` has once flattened.
#[derive(Debug, Clone, PartialEq)]
pub struct LayerSpec {
    kernel: Array2<f32>,
    bias: Array1<f32>,
}

impl LayerSpec {
    /// Creates a new `LayerSpec` from its flat buffers.
    ///
    /// # Arguments
    /// * `kernel` - The flat, row-major weight matrix.
    /// * `bias` - One bias per output unit.
    /// * `shape` - The declared `(input_size, output_size)`.
    ///
    /// # Returns
    /// A new `LayerSpec` or `ShapeMismatch` if the buffers disagree with `shape`.
    pub fn new(kernel: Vec<f32>, bias: Vec<f32>, shape: (usize, usize)) -> Result<Self> {
        let (input_size, output_size) = shape;
        if input_size == 0 || output_size == 0 {
            return Err(ModelErr::malformed(format!(
                "layer shape must be non-zero, got [{input_size}, {output_size}]"
            )));
        }

        // A product that overflows can't match any kernel length.
        let expected = input_size.checked_mul(output_size).unwrap_or(usize::MAX);
        if kernel.len() != expected {
            return Err(ModelErr::ShapeMismatch {
                what: "kernel",
                got: kernel.len(),
                expected,
            });
        }

        if bias.len() != output_size {
            return Err(ModelErr::ShapeMismatch {
                what: "bias",
                got: bias.len(),
                expected: output_size,
            });
        }

        check_finite("kernel", &kernel)?;
        check_finite("bias", &bias)?;

        // Standard (C) order makes element (i, j) the one at offset i * output_size + j.
        let kernel =
            Array2::from_shape_vec(shape, kernel).map_err(|e| ModelErr::malformed(e.to_string()))?;

        Ok(Self {
            kernel,
            bias: Array1::from_vec(bias),
        })
    }

    pub fn input_size(&self) -> usize {
        self.kernel.nrows()
    }

    pub fn output_size(&self) -> usize {
        self.kernel.ncols()
    }

    /// The weight matrix as an `(input_size, output_size)` view.
    pub fn kernel(&self) -> ArrayView2<'_, f32> {
        self.kernel.view()
    }

    pub fn bias(&self) -> ArrayView1<'_, f32> {
        self.bias.view()
    }

    /// Returns the weight connecting input `i` to output `j`, or `None` if out of range.
    pub fn weight(&self, i: usize, j: usize) -> Option<f32> {
        self.kernel.get((i, j)).copied()
    }
}

/// A two-layer fully-connected network: `input -> layer1 -> relu -> layer2 -> softmax`.
///
/// Built once and shared read-only by every prediction afterwards.
#[derive(Debug, Clone, PartialEq)]
pub struct NetworkModel {
    layer1: LayerSpec,
    layer2: LayerSpec,
}

impl NetworkModel {
    /// Creates a new `NetworkModel` from two already validated layers.
    ///
    /// # Returns
    /// A new `NetworkModel` or `ShapeMismatch` if `layer1`'s output doesn't feed `layer2`.
    pub fn from_layers(layer1: LayerSpec, layer2: LayerSpec) -> Result<Self> {
        if layer1.output_size() != layer2.input_size() {
            return Err(ModelErr::ShapeMismatch {
                what: "dense2 input",
                got: layer2.input_size(),
                expected: layer1.output_size(),
            });
        }

        Ok(Self { layer1, layer2 })
    }

    /// Parses a weights document.
    ///
    /// The document must hold two entries, `dense1` and `dense2`, each with a flat `kernel`,
    /// a `bias` and a `shape` pair `[input_size, output_size]`.
    ///
    /// # Arguments
    /// * `bytes` - The raw JSON document.
    ///
    /// # Returns
    /// The validated model, `MalformedModel` if the document can't be read as the expected
    /// structure or `ShapeMismatch` if a declared shape is inconsistent.
    pub fn from_json(bytes: &[u8]) -> Result<Self> {
        let doc: ModelDoc = serde_json::from_slice(bytes)?;

        let layer1 = LayerSpec::new(doc.dense1.kernel, doc.dense1.bias, doc.dense1.shape)?;
        let layer2 = LayerSpec::new(doc.dense2.kernel, doc.dense2.bias, doc.dense2.shape)?;
        let model = Self::from_layers(layer1, layer2)?;

        info!(
            input = model.input_size(),
            hidden = model.hidden_size(),
            classes = model.num_classes();
            "parsed network weights"
        );
        Ok(model)
    }

    pub fn layer1(&self) -> &LayerSpec {
        &self.layer1
    }

    pub fn layer2(&self) -> &LayerSpec {
        &self.layer2
    }

    pub fn input_size(&self) -> usize {
        self.layer1.input_size()
    }

    pub fn hidden_size(&self) -> usize {
        self.layer1.output_size()
    }

    pub fn num_classes(&self) -> usize {
        self.layer2.output_size()
    }

    /// Checks the outer shape of the network against the topology a caller expects.
    ///
    /// # Returns
    /// `ShapeMismatch` naming the first side that disagrees.
    pub fn check_topology(&self, inputs: usize, classes: usize) -> Result<()> {
        if self.input_size() != inputs {
            return Err(ModelErr::ShapeMismatch {
                what: "dense1 input",
                got: self.input_size(),
                expected: inputs,
            });
        }

        if self.num_classes() != classes {
            return Err(ModelErr::ShapeMismatch {
                what: "dense2 output",
                got: self.num_classes(),
                expected: classes,
            });
        }

        Ok(())
    }
}

fn check_finite(what: &'static str, values: &[f32]) -> Result<()> {
    match values.iter().position(|v| !v.is_finite()) {
        Some(index) => Err(ModelErr::malformed(format!(
            "{what} holds a non-finite value at index {index}"
        ))),
        None => Ok(()),
    }
}
