//! Response data models
//!
//! Read-only views over raw Workers AI responses. The body is decoded once when
//! the view is built; accessors never fail and fall back to empty values when a
//! field is missing or has the wrong type.

use crate::services::transport::RawResponse;
use crate::utils::error::{helpers::decoding_error, ClientResult, ErrorContext};
use bytes::Bytes;
use reqwest::header::{HeaderMap, CONTENT_TYPE};
use serde::{Deserialize, Serialize};
use serde_json::Value;
use std::ops::Deref;

/// Common envelope: `{"success", "result", "errors", "messages"}`
#[derive(Debug, Clone)]
pub struct ApiResponse {
    status: u16,
    headers: HeaderMap,
    body: Value,
}

impl ApiResponse {
    /// Decode a buffered JSON response
    pub fn from_raw(raw: RawResponse) -> ClientResult<Self> {
        let status = raw.status_code();
        let headers = raw.headers().clone();
        let bytes = raw.into_bytes()?;

        let body: Value = serde_json::from_slice(&bytes).decoding_context("Response body is not valid JSON")?;
        if !body.is_object() {
            return Err(decoding_error(format!(
                "Expected a JSON object in the response body, got {}",
                json_kind(&body)
            )));
        }

        Ok(Self { status, headers, body })
    }

    pub fn status_code(&self) -> u16 {
        self.status
    }

    pub fn headers(&self) -> &HeaderMap {
        &self.headers
    }

    /// Envelope `success` flag
    pub fn success(&self) -> bool {
        self.body["success"].as_bool().unwrap_or(false)
    }

    pub fn errors(&self) -> &[Value] {
        self.body["errors"].as_array().map(Vec::as_slice).unwrap_or(&[])
    }

    pub fn messages(&self) -> &[Value] {
        self.body["messages"].as_array().map(Vec::as_slice).unwrap_or(&[])
    }

    /// Capability-specific payload (`null` when absent)
    pub fn result(&self) -> &Value {
        &self.body["result"]
    }

    /// Whole decoded body
    pub fn body(&self) -> &Value {
        &self.body
    }

    fn result_str(&self, key: &str) -> &str {
        self.result()[key].as_str().unwrap_or("")
    }

    fn result_items(&self) -> &[Value] {
        self.result().as_array().map(Vec::as_slice).unwrap_or(&[])
    }
}

fn json_kind(value: &Value) -> &'static str {
    match value {
        Value::Null => "null",
        Value::Bool(_) => "a boolean",
        Value::Number(_) => "a number",
        Value::String(_) => "a string",
        Value::Array(_) => "an array",
        Value::Object(_) => "an object",
    }
}

fn str_field(value: &Value, key: &str) -> String {
    value[key].as_str().unwrap_or("").to_string()
}

fn f64_field(value: &Value, key: &str) -> f64 {
    value[key].as_f64().unwrap_or(0.0)
}

macro_rules! response_view {
    ($(#[$meta:meta])* $name:ident) => {
        $(#[$meta])*
        #[derive(Debug, Clone)]
        pub struct $name {
            inner: ApiResponse,
        }

        impl $name {
            pub fn from_raw(raw: RawResponse) -> ClientResult<Self> {
                Ok(Self {
                    inner: ApiResponse::from_raw(raw)?,
                })
            }

            pub fn into_inner(self) -> ApiResponse {
                self.inner
            }
        }

        impl Deref for $name {
            type Target = ApiResponse;

            fn deref(&self) -> &ApiResponse {
                &self.inner
            }
        }
    };
}

response_view! {
    /// Text generation result
    TextGenerationResponse
}

impl TextGenerationResponse {
    /// Generated text (`result.response`)
    pub fn text(&self) -> &str {
        self.result_str("response")
    }
}

response_view! {
    /// Translation result
    TranslationResponse
}

impl TranslationResponse {
    pub fn translated_text(&self) -> &str {
        self.result_str("translated_text")
    }
}

/// A transcribed word with its timing, in seconds
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct Word {
    pub word: String,
    pub start: f64,
    pub end: f64,
}

response_view! {
    /// Speech recognition result
    SpeechRecognitionResponse
}

impl SpeechRecognitionResponse {
    pub fn text(&self) -> &str {
        self.result_str("text")
    }

    pub fn word_count(&self) -> u64 {
        self.result()["word_count"].as_u64().unwrap_or(0)
    }

    pub fn words(&self) -> Vec<Word> {
        self.result()["words"]
            .as_array()
            .map(|words| {
                words
                    .iter()
                    .map(|w| Word {
                        word: str_field(w, "word"),
                        start: f64_field(w, "start"),
                        end: f64_field(w, "end"),
                    })
                    .collect()
            })
            .unwrap_or_default()
    }
}

/// Classification label with its confidence
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct Prediction {
    pub label: String,
    pub score: f64,
}

response_view! {
    /// Image classification result
    ImageClassificationResponse
}

impl ImageClassificationResponse {
    /// Predictions in server order
    pub fn predictions(&self) -> Vec<Prediction> {
        self.result_items()
            .iter()
            .map(|item| Prediction {
                label: str_field(item, "label"),
                score: f64_field(item, "score"),
            })
            .collect()
    }

    pub fn labels(&self) -> Vec<String> {
        self.result_items().iter().map(|item| str_field(item, "label")).collect()
    }

    pub fn scores(&self) -> Vec<f64> {
        self.result_items().iter().map(|item| f64_field(item, "score")).collect()
    }
}

response_view! {
    /// Image to text result
    ImageToTextResponse
}

impl ImageToTextResponse {
    pub fn description(&self) -> &str {
        self.result_str("description")
    }
}

response_view! {
    /// Summarization result
    SummarizationResponse
}

impl SummarizationResponse {
    pub fn summary(&self) -> &str {
        self.result_str("summary")
    }
}

/// Pixel coordinates of a detected object
#[derive(Debug, Clone, Copy, PartialEq, Default, Serialize, Deserialize)]
pub struct BoundingBox {
    pub xmin: f64,
    pub ymin: f64,
    pub xmax: f64,
    pub ymax: f64,
}

/// A detected object
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct Detection {
    pub label: String,
    pub score: f64,
    pub bounding_box: BoundingBox,
}

response_view! {
    /// Object detection result
    ObjectDetectionResponse
}

impl ObjectDetectionResponse {
    pub fn detections(&self) -> Vec<Detection> {
        self.result_items()
            .iter()
            .map(|item| {
                let bbox = &item["box"];
                Detection {
                    label: str_field(item, "label"),
                    score: f64_field(item, "score"),
                    bounding_box: BoundingBox {
                        xmin: f64_field(bbox, "xmin"),
                        ymin: f64_field(bbox, "ymin"),
                        xmax: f64_field(bbox, "xmax"),
                        ymax: f64_field(bbox, "ymax"),
                    },
                }
            })
            .collect()
    }
}

/// Binary image returned by text to image
#[derive(Debug, Clone)]
pub struct ImageResponse {
    status: u16,
    headers: HeaderMap,
    bytes: Bytes,
}

impl ImageResponse {
    pub fn from_raw(raw: RawResponse) -> ClientResult<Self> {
        let status = raw.status_code();
        let headers = raw.headers().clone();
        let bytes = raw.into_bytes()?;
        Ok(Self { status, headers, bytes })
    }

    pub fn status_code(&self) -> u16 {
        self.status
    }

    pub fn headers(&self) -> &HeaderMap {
        &self.headers
    }

    /// e.g. `image/png`
    pub fn content_type(&self) -> Option<&str> {
        self.headers.get(CONTENT_TYPE).and_then(|v| v.to_str().ok())
    }

    pub fn bytes(&self) -> &Bytes {
        &self.bytes
    }

    pub fn into_bytes(self) -> Bytes {
        self.bytes
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn raw(body: &'static str) -> RawResponse {
        RawResponse::buffered(200, HeaderMap::new(), body)
    }

    #[test]
    fn test_text_generation_view() {
        let view = TextGenerationResponse::from_raw(raw(
            r#"{"success":true,"result":{"response":"hi"},"errors":[],"messages":[]}"#,
        ))
        .unwrap();

        assert_eq!(view.text(), "hi");
        assert!(view.success());
        assert!(view.errors().is_empty());
        assert_eq!(view.status_code(), 200);
    }

    #[test]
    fn test_missing_result_degrades_to_empty() {
        let view = TextGenerationResponse::from_raw(raw(r#"{"success":true}"#)).unwrap();
        assert_eq!(view.text(), "");
        assert!(view.result().is_null());
    }

    #[test]
    fn test_non_object_body_is_decoding_error() {
        assert!(ApiResponse::from_raw(raw("[1,2,3]")).is_err());
        assert!(ApiResponse::from_raw(raw("not json")).is_err());
    }

    #[test]
    fn test_mistyped_fields_use_defaults() {
        let view = ImageClassificationResponse::from_raw(raw(
            r#"{"result":[{"label":"cat","score":"high"},{"score":0.2}]}"#,
        ))
        .unwrap();

        assert_eq!(view.labels(), vec!["cat".to_string(), String::new()]);
        assert_eq!(view.scores(), vec![0.0, 0.2]);
    }
}
