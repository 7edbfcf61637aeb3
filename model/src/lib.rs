pub mod activations;
pub mod dense;
pub mod error;
pub mod raster;
mod weights;

pub use error::{ModelErr, Result};
pub use raster::{Bitmap, rasterize};
pub use weights::{GRID_SIDE, INPUT_SIZE, LayerSpec, NUM_CLASSES, NetworkModel};
