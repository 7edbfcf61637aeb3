pub mod config;
pub mod protocol;
mod service;

pub use config::{ConfigErr, ServerConfig};
pub use service::PredictionService;
