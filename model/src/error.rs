use std::{
    error::Error,
    fmt::{self, Display},
};

/// The result type used in the entire model crate.
pub type Result<T> = std::result::Result<T, ModelErr>;

/// The model crate's error type.
#[derive(Debug, Clone, PartialEq)]
pub enum ModelErr {
    /// The weight source could not be parsed as the expected layered document.
    MalformedModel { reason: String },
    /// A declared shape disagrees with the data it describes, or two layers don't chain.
    ShapeMismatch {
        what: &'static str,
        got: usize,
        expected: usize,
    },
    /// A vector handed to the network doesn't have the length the layer expects.
    DimensionMismatch { got: usize, expected: usize },
    /// A zero-length vector reached an operation that needs at least one element.
    EmptyInput { what: &'static str },
    /// A NaN or infinite value was found where only finite values are allowed.
    NonFinite { what: &'static str, index: usize },
}

impl ModelErr {
    pub(crate) fn malformed<S: Into<String>>(reason: S) -> Self {
        Self::MalformedModel {
            reason: reason.into(),
        }
    }
}

impl Display for ModelErr {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            ModelErr::MalformedModel { reason } => write!(f, "malformed model: {reason}"),
            ModelErr::ShapeMismatch {
                what,
                got,
                expected,
            } => write!(
                f,
                "shape mismatch for {what}: got {got}, expected {expected}"
            ),
            ModelErr::DimensionMismatch { got, expected } => write!(
                f,
                "dimension mismatch: got an input of length {got}, expected {expected}"
            ),
            ModelErr::EmptyInput { what } => write!(f, "empty input given to {what}"),
            ModelErr::NonFinite { what, index } => {
                write!(f, "non-finite value in {what} at index {index}")
            }
        }
    }
}

impl Error for ModelErr {}

impl From<serde_json::Error> for ModelErr {
    fn from(value: serde_json::Error) -> Self {
        Self::malformed(value.to_string())
    }
}
