use ndarray::{Array1, ArrayView1};

use crate::{ModelErr, Result};

/// Elementwise rectifier, `max(0, x)`.
pub fn relu(x: Array1<f32>) -> Array1<f32> {
    x.mapv_into(|v| v.max(0.))
}

/// Normalizes `logits` into a probability distribution.
///
/// The maximum logit is subtracted before exponentiating so large scores can't overflow.
///
/// # Returns
/// The distribution, `EmptyInput` if `logits` is empty or `NonFinite` if any logit is NaN or
/// infinite.
pub fn softmax(logits: ArrayView1<f32>) -> Result<Array1<f32>> {
    if logits.is_empty() {
        return Err(ModelErr::EmptyInput { what: "softmax" });
    }

    if let Some(index) = logits.iter().position(|l| !l.is_finite()) {
        return Err(ModelErr::NonFinite {
            what: "logits",
            index,
        });
    }

    let max = logits.fold(f32::NEG_INFINITY, |m, &l| m.max(l));
    let exps = logits.mapv(|l| (l - max).exp());

    // The max element contributes exp(0) = 1, so the sum is never below 1.
    let sum = exps.sum();
    Ok(exps / sum)
}

/// Returns the index of the largest value, the first one on exact ties.
///
/// # Returns
/// The index or `EmptyInput` if `x` is empty.
pub fn argmax(x: ArrayView1<f32>) -> Result<usize> {
    let mut best: Option<(usize, f32)> = None;

    for (i, &v) in x.iter().enumerate() {
        match best {
            Some((_, b)) if v <= b => {}
            _ => best = Some((i, v)),
        }
    }

    best.map(|(i, _)| i).ok_or(ModelErr::EmptyInput { what: "argmax" })
}
