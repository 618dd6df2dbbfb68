//! Remote classification call
//!
//! Posts a base64 JPEG plus a fixed instruction prompt to a multimodal
//! generate-content endpoint and parses the reply down to one of three
//! gesture classes. Anything malformed or ambiguous degrades to
//! `Gesture::None`, which callers treat as a no-op.

use std::time::Duration;

use base64::engine::general_purpose::STANDARD as BASE64;
use base64::Engine as _;
use serde::Deserialize;
use serde_json::json;
use thiserror::Error;

use super::Gesture;
use crate::config::ClassifierConfig;

const PROMPT: &str = "Analyze the hand gesture in this image. \
If you see an open palm or spread fingers, return \"OPEN_PALM\". \
If you see a closed fist or gripping motion, return \"CLOSED_FIST\". \
If no hand is clearly visible or the gesture is ambiguous, return \"NONE\". \
Return ONLY JSON of the form {\"gesture\": \"...\"}.";

/// Errors from the classification call
#[derive(Debug, Error)]
pub enum ClassifyError {
    #[error("no API key configured")]
    MissingApiKey,
    #[error("request failed: {0}")]
    Request(#[from] reqwest::Error),
    #[error("service returned status {0}")]
    Status(u16),
    #[error("response carried no candidate text")]
    EmptyResponse,
}

#[derive(Deserialize)]
struct GestureJson {
    gesture: String,
}

/// Blocking client for the remote classifier
pub struct RemoteClassifier {
    http: reqwest::blocking::Client,
    endpoint: String,
    api_key: String,
}

impl RemoteClassifier {
    pub fn new(config: &ClassifierConfig) -> Result<Self, ClassifyError> {
        let api_key = config.resolve_api_key().ok_or(ClassifyError::MissingApiKey)?;

        let http = reqwest::blocking::Client::builder()
            .timeout(Duration::from_secs(config.timeout_secs.max(1)))
            .build()?;

        Ok(Self {
            http,
            endpoint: config.endpoint.clone(),
            api_key,
        })
    }

    /// Classify one JPEG frame
    pub fn classify(&self, jpeg: &[u8]) -> Result<Gesture, ClassifyError> {
        let body = json!({
            "contents": [{
                "parts": [
                    {
                        "inlineData": {
                            "mimeType": "image/jpeg",
                            "data": BASE64.encode(jpeg),
                        }
                    },
                    { "text": PROMPT },
                ]
            }],
            "generationConfig": {
                "responseMimeType": "application/json",
            }
        });

        let response = self
            .http
            .post(&self.endpoint)
            .header("x-goog-api-key", &self.api_key)
            .json(&body)
            .send()?;

        let status = response.status();
        if !status.is_success() {
            return Err(ClassifyError::Status(status.as_u16()));
        }

        let value: serde_json::Value = response.json()?;
        let text = candidate_text(&value).ok_or(ClassifyError::EmptyResponse)?;
        Ok(parse_gesture(text))
    }
}

/// Pull the first candidate's text out of a generate-content response
fn candidate_text(value: &serde_json::Value) -> Option<&str> {
    value
        .get("candidates")?
        .get(0)?
        .get("content")?
        .get("parts")?
        .get(0)?
        .get("text")?
        .as_str()
}

/// Parse the model's reply. Strict JSON first, then a substring fallback
/// for replies that wrap the JSON in prose or fencing.
pub fn parse_gesture(text: &str) -> Gesture {
    if let Ok(parsed) = serde_json::from_str::<GestureJson>(text.trim()) {
        match parsed.gesture.as_str() {
            "OPEN_PALM" => return Gesture::OpenPalm,
            "CLOSED_FIST" => return Gesture::ClosedFist,
            _ => return Gesture::None,
        }
    }

    if text.contains("OPEN_PALM") {
        Gesture::OpenPalm
    } else if text.contains("CLOSED_FIST") {
        Gesture::ClosedFist
    } else {
        Gesture::None
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_parse_strict_json() {
        assert_eq!(parse_gesture(r#"{"gesture": "OPEN_PALM"}"#), Gesture::OpenPalm);
        assert_eq!(
            parse_gesture(r#"{"gesture": "CLOSED_FIST"}"#),
            Gesture::ClosedFist
        );
        assert_eq!(parse_gesture(r#"{"gesture": "NONE"}"#), Gesture::None);
    }

    #[test]
    fn test_parse_unknown_class_is_none() {
        assert_eq!(parse_gesture(r#"{"gesture": "THUMBS_UP"}"#), Gesture::None);
    }

    #[test]
    fn test_parse_loose_fallback() {
        assert_eq!(
            parse_gesture("```json\n{\"gesture\": \"OPEN_PALM\"}\n```"),
            Gesture::OpenPalm
        );
        assert_eq!(
            parse_gesture("the gesture is CLOSED_FIST, clearly"),
            Gesture::ClosedFist
        );
    }

    #[test]
    fn test_parse_garbage_is_none() {
        assert_eq!(parse_gesture(""), Gesture::None);
        assert_eq!(parse_gesture("no hand here"), Gesture::None);
        assert_eq!(parse_gesture("{\"weather\": \"sunny\"}"), Gesture::None);
    }

    #[test]
    fn test_candidate_text_extraction() {
        let value = serde_json::json!({
            "candidates": [{
                "content": {
                    "parts": [{ "text": "{\"gesture\": \"NONE\"}" }]
                }
            }]
        });
        assert_eq!(candidate_text(&value), Some("{\"gesture\": \"NONE\"}"));

        let empty = serde_json::json!({ "candidates": [] });
        assert_eq!(candidate_text(&empty), None);
    }

    #[test]
    fn test_missing_api_key() {
        let config = ClassifierConfig {
            api_key: None,
            ..ClassifierConfig::default()
        };
        // Only meaningful when the environment carries no key either
        if config.resolve_api_key().is_none() {
            assert!(matches!(
                RemoteClassifier::new(&config),
                Err(ClassifyError::MissingApiKey)
            ));
        }
    }
}
