use std::{error::Error, fmt, io, sync::Arc};

use model::ModelErr;

/// Why the network weights could not be loaded.
#[derive(Debug)]
pub enum LoadErr {
    /// The weight source could not be read.
    Io(io::Error),
    /// The weights were read but don't describe a valid network.
    Model(ModelErr),
    /// The parsing task was cancelled or panicked.
    Interrupted(String),
}

impl fmt::Display for LoadErr {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            LoadErr::Io(e) => write!(f, "failed to read weights: {e}"),
            LoadErr::Model(e) => write!(f, "invalid weights: {e}"),
            LoadErr::Interrupted(msg) => write!(f, "weight parsing interrupted: {msg}"),
        }
    }
}

impl Error for LoadErr {
    fn source(&self) -> Option<&(dyn Error + 'static)> {
        match self {
            LoadErr::Io(e) => Some(e),
            LoadErr::Model(e) => Some(e),
            LoadErr::Interrupted(_) => None,
        }
    }
}

impl From<io::Error> for LoadErr {
    fn from(value: io::Error) -> Self {
        Self::Io(value)
    }
}

impl From<ModelErr> for LoadErr {
    fn from(value: ModelErr) -> Self {
        Self::Model(value)
    }
}

/// A failed prediction.
#[derive(Debug, Clone)]
pub enum EngineErr {
    /// The network isn't loaded and loading it failed. Every caller that awaited the same
    /// load shares its error.
    ModelUnavailable(Arc<LoadErr>),
    /// The model is loaded but the input couldn't be run through it.
    Inference(ModelErr),
}

impl EngineErr {
    /// A short message suitable for showing to the person who drew the digit.
    pub fn user_message(&self) -> &'static str {
        match self {
            EngineErr::ModelUnavailable(_) => "Model unavailable, try again later.",
            EngineErr::Inference(ModelErr::DimensionMismatch { .. }) => "Unexpected image size.",
            EngineErr::Inference(ModelErr::NonFinite { what: "input", .. }) => {
                "Unable to decode image."
            }
            EngineErr::Inference(_) => "Unable to classify the drawing.",
        }
    }
}

impl fmt::Display for EngineErr {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            EngineErr::ModelUnavailable(e) => write!(f, "model unavailable: {e}"),
            EngineErr::Inference(e) => write!(f, "inference failed: {e}"),
        }
    }
}

impl Error for EngineErr {
    fn source(&self) -> Option<&(dyn Error + 'static)> {
        match self {
            EngineErr::ModelUnavailable(e) => Some(e.as_ref()),
            EngineErr::Inference(e) => Some(e),
        }
    }
}

impl From<ModelErr> for EngineErr {
    fn from(value: ModelErr) -> Self {
        Self::Inference(value)
    }
}
