mod cache;
mod engine;
pub mod error;
mod source;

pub use cache::{LoadResult, ModelCache};
pub use engine::{InferenceEngine, PredictionResult, classify};
pub use error::{EngineErr, LoadErr};
pub use source::{BytesSource, FileSource, WeightSource};
