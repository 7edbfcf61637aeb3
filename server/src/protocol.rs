//! Newline-delimited JSON messages spoken by the prediction service.
//!
//! A request is a single line holding either an already rasterized drawing,
//! `{"pixels": [...]}`, or a grayscale bitmap to rasterize first,
//! `{"bitmap": {"width": w, "height": h, "data": [...]}}`. Every request is answered with
//! one line, `{"digit": d, "confidence": c}` or `{"error": "..."}`.

use engine::PredictionResult;
use model::{Bitmap, ModelErr, rasterize};
use serde::{Deserialize, Serialize};
use serde_json::Value;

pub const UNDECODABLE_REQUEST: &str = "Unable to decode request.";
pub const MISSING_IMAGE: &str = "Missing image data.";
pub const UNDECODABLE_IMAGE: &str = "Unable to decode image.";
pub const REQUEST_TOO_LARGE: &str = "Request too large.";

/// The drawing a client wants classified.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum PredictRequest {
    Pixels(Vec<f32>),
    Bitmap(Bitmap),
}

impl PredictRequest {
    /// Parses a request line.
    ///
    /// # Returns
    /// The request or the message to answer the client with.
    pub fn parse(line: &str) -> Result<Self, &'static str> {
        let value: Value = serde_json::from_str(line).map_err(|_| UNDECODABLE_REQUEST)?;

        let has_image = value
            .as_object()
            .is_some_and(|obj| obj.contains_key("pixels") || obj.contains_key("bitmap"));
        if !has_image {
            return Err(MISSING_IMAGE);
        }

        serde_json::from_value(value).map_err(|_| UNDECODABLE_IMAGE)
    }

    /// Turns the request into the intensity vector the engine reads.
    pub fn into_pixels(self) -> Result<Vec<f32>, ModelErr> {
        match self {
            PredictRequest::Pixels(pixels) => Ok(pixels),
            PredictRequest::Bitmap(bitmap) => rasterize(&bitmap),
        }
    }
}

/// The answer to a single request.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(untagged)]
pub enum PredictReply {
    Prediction(PredictionResult),
    Error { error: String },
}

impl PredictReply {
    /// A prediction with its confidence rounded to one decimal.
    pub fn prediction(result: PredictionResult) -> Self {
        Self::Prediction(PredictionResult {
            confidence: (result.confidence * 10.).round() / 10.,
            ..result
        })
    }

    pub fn error<S: Into<String>>(msg: S) -> Self {
        Self::Error { error: msg.into() }
    }

    /// The reply as a single JSON line, without the trailing newline.
    pub fn to_line(&self) -> String {
        match serde_json::to_string(self) {
            Ok(line) => line,
            // Only reachable with a non-finite confidence, which the engine never produces.
            Err(_) => format!(r#"{{"error":"{UNDECODABLE_IMAGE}"}}"#),
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn parses_pixels() {
        let req = PredictRequest::parse(r#"{"pixels": [0, 0.5, 1]}"#).unwrap();
        assert_eq!(req, PredictRequest::Pixels(vec![0., 0.5, 1.]));
    }

    #[test]
    fn parses_bitmaps() {
        let req =
            PredictRequest::parse(r#"{"bitmap": {"width": 2, "height": 1, "data": [0, 255]}}"#)
                .unwrap();
        assert_eq!(
            req,
            PredictRequest::Bitmap(Bitmap {
                width: 2,
                height: 1,
                data: vec![0, 255]
            })
        );
    }

    #[test]
    fn classifies_parse_failures() {
        assert_eq!(PredictRequest::parse("{nope"), Err(UNDECODABLE_REQUEST));
        assert_eq!(PredictRequest::parse("{}"), Err(MISSING_IMAGE));
        assert_eq!(PredictRequest::parse("[1, 2]"), Err(MISSING_IMAGE));
        assert_eq!(
            PredictRequest::parse(r#"{"pixels": "abc"}"#),
            Err(UNDECODABLE_IMAGE)
        );
        assert_eq!(
            PredictRequest::parse(r#"{"bitmap": {"width": 1, "height": 1, "data": [300]}}"#),
            Err(UNDECODABLE_IMAGE)
        );
    }

    #[test]
    fn bitmap_requests_are_rasterized() {
        let req = PredictRequest::Bitmap(Bitmap::blank(56, 56).unwrap());
        let pixels = req.into_pixels().unwrap();
        assert_eq!(pixels.len(), model::INPUT_SIZE);
    }

    #[test]
    fn replies_round_the_confidence() {
        let reply = PredictReply::prediction(PredictionResult {
            class_index: 3,
            confidence: 97.26,
        });
        assert_eq!(reply.to_line(), r#"{"digit":3,"confidence":97.3}"#);

        let reply = PredictReply::error(MISSING_IMAGE);
        assert_eq!(reply.to_line(), r#"{"error":"Missing image data."}"#);
    }

    #[test]
    fn replies_read_back() {
        let line = r#"{"digit": 1, "confidence": 50.0}"#;
        let reply: PredictReply = serde_json::from_str(line).unwrap();
        assert_eq!(
            reply,
            PredictReply::Prediction(PredictionResult {
                class_index: 1,
                confidence: 50.
            })
        );
    }
}
