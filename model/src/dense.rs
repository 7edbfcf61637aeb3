use ndarray::{Array1, ArrayView1};

use crate::{LayerSpec, ModelErr, Result};

/// Makes a forward pass through a dense layer.
///
/// For each output unit `j`: `out[j] = bias[j] + sum_i input[i] * kernel[i * M + j]`, where
/// `M` is the layer's output size.
///
/// # Arguments
/// * `input` - A vector of `layer.input_size()` values.
/// * `layer` - The layer's parameters.
///
/// # Returns
/// A vector of `layer.output_size()` values or `DimensionMismatch` if `input` has the wrong
/// length.
pub fn forward(input: ArrayView1<f32>, layer: &LayerSpec) -> Result<Array1<f32>> {
    if input.len() != layer.input_size() {
        return Err(ModelErr::DimensionMismatch {
            got: input.len(),
            expected: layer.input_size(),
        });
    }

    Ok(input.dot(&layer.kernel()) + &layer.bias())
}
