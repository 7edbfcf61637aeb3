use ndarray::{Array2, ArrayView2};
use serde::{Deserialize, Serialize};

use crate::{GRID_SIDE, ModelErr, Result};

/// An 8-bit grayscale image, row-major, `0` being background and `255` a fully drawn stroke.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct Bitmap {
    pub width: usize,
    pub height: usize,
    pub data: Vec<u8>,
}

impl Bitmap {
    /// Creates a blank `Bitmap`.
    ///
    /// # Returns
    /// The bitmap or `DimensionMismatch` if `width * height` doesn't fit in a `usize`.
    pub fn blank(width: usize, height: usize) -> Result<Self> {
        let len = pixel_count(width, height, 0)?;
        Ok(Self {
            width,
            height,
            data: vec![0; len],
        })
    }

    fn view(&self) -> Result<ArrayView2<'_, u8>> {
        if self.width == 0 || self.height == 0 {
            return Err(ModelErr::EmptyInput { what: "bitmap" });
        }

        let expected = pixel_count(self.width, self.height, self.data.len())?;
        if self.data.len() != expected {
            return Err(ModelErr::DimensionMismatch {
                got: self.data.len(),
                expected,
            });
        }

        ArrayView2::from_shape((self.height, self.width), &self.data).map_err(|_| {
            ModelErr::DimensionMismatch {
                got: self.data.len(),
                expected,
            }
        })
    }
}

/// `width * height`, or `DimensionMismatch` against `got` when the product overflows.
fn pixel_count(width: usize, height: usize, got: usize) -> Result<usize> {
    width
        .checked_mul(height)
        .ok_or(ModelErr::DimensionMismatch {
            got,
            expected: usize::MAX,
        })
}

/// Downsamples a bitmap to the `GRID_SIDE x GRID_SIDE` intensity vector the network reads.
///
/// Every output cell is the area-weighted mean of the source pixels it covers, scaled into
/// `[0, 1]`. The result is row-major.
///
/// # Returns
/// `GRID_SIDE * GRID_SIDE` intensities, `EmptyInput` for a zero-sized bitmap or
/// `DimensionMismatch` if `data` doesn't hold `width * height` pixels.
pub fn rasterize(bitmap: &Bitmap) -> Result<Vec<f32>> {
    let src = bitmap.view()?;
    let rows = coverage(bitmap.height, GRID_SIDE);
    let cols = coverage(bitmap.width, GRID_SIDE);

    let grid = Array2::from_shape_fn((GRID_SIDE, GRID_SIDE), |(r, c)| {
        let mut acc = 0.;
        let mut area = 0.;
        for &(y, wy) in &rows[r] {
            for &(x, wx) in &cols[c] {
                acc += wy * wx * src[(y, x)] as f32;
                area += wy * wx;
            }
        }
        acc / (area * 255.)
    });

    Ok(grid.into_iter().collect())
}

/// For every destination index, the source indices it overlaps and by how much.
fn coverage(src_len: usize, dst_len: usize) -> Vec<Vec<(usize, f32)>> {
    let scale = src_len as f64 / dst_len as f64;

    (0..dst_len)
        .map(|d| {
            let start = d as f64 * scale;
            let end = (d + 1) as f64 * scale;
            let first = start.floor() as usize;
            let last = (end.ceil() as usize).min(src_len);

            (first..last)
                .filter_map(|s| {
                    let overlap = end.min((s + 1) as f64) - start.max(s as f64);
                    (overlap > 0.).then_some((s, overlap as f32))
                })
                .collect()
        })
        .collect()
}
