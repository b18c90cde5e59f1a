//! JSON bodies exchanged with the analysis service.

use serde::{Deserialize, Serialize};
use serde_json::Value;

/// `POST /upload` answer.
#[derive(Debug, Clone, Default, Deserialize, Serialize)]
pub struct UploadResponse {
    #[serde(default)]
    pub success: Option<Value>,
    #[serde(default)]
    pub status_url: Option<String>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub task_id: Option<String>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub message: Option<String>,
}

impl UploadResponse {
    /// The status path, if the upload was accepted and the path is usable.
    pub fn accepted_status_url(&self) -> Option<&str> {
        if !self.success.as_ref().is_some_and(is_truthy) {
            return None;
        }
        self.status_url.as_deref().filter(|url| !url.is_empty())
    }
}

/// `GET <status_url>` answer.
///
/// Only `status` has a fixed type; the other fields are read leniently.
#[derive(Debug, Clone, Default, Deserialize, Serialize)]
pub struct StatusResponse {
    #[serde(default)]
    pub status: Option<String>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub prediction: Option<Value>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub confidence: Option<Value>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub full_output: Option<Value>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub error: Option<Value>,
}

impl StatusResponse {
    /// Confidence as a number, accepting numeric strings.
    pub fn confidence(&self) -> Option<f64> {
        match self.confidence.as_ref()? {
            Value::Number(n) => n.as_f64(),
            Value::String(s) => s.trim().parse().ok(),
            _ => None,
        }
    }

    /// Failure message; non-string values are rendered as JSON text.
    pub fn error_message(&self) -> Option<String> {
        match self.error.as_ref()? {
            Value::Null => None,
            Value::String(s) => Some(s.clone()),
            other => Some(other.to_string()),
        }
    }
}

/// `POST /recommend` body.
#[derive(Debug, Clone, PartialEq, Deserialize, Serialize)]
pub struct RecommendRequest {
    pub skin_disease: String,
    pub allergies: Vec<String>,
}

/// Truthiness of a loosely typed JSON flag.
pub(crate) fn is_truthy(value: &Value) -> bool {
    match value {
        Value::Null => false,
        Value::Bool(flag) => *flag,
        Value::Number(n) => n.as_f64().is_some_and(|n| n != 0.0 && !n.is_nan()),
        Value::String(s) => !s.is_empty(),
        Value::Array(_) | Value::Object(_) => true,
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use serde_json::json;

    fn upload(value: Value) -> UploadResponse {
        serde_json::from_value(value).unwrap()
    }

    #[test]
    fn accepted_upload_exposes_status_url() {
        let response = upload(json!({
            "success": true,
            "message": "Image upload accepted, processing in background.",
            "task_id": "123",
            "status_url": "/result/123"
        }));
        assert_eq!(response.accepted_status_url(), Some("/result/123"));
    }

    #[test]
    fn rejected_or_incomplete_uploads_have_no_status_url() {
        assert_eq!(upload(json!({"success": false})).accepted_status_url(), None);
        assert_eq!(
            upload(json!({"success": false, "status_url": "/result/1"})).accepted_status_url(),
            None
        );
        assert_eq!(upload(json!({"success": true})).accepted_status_url(), None);
        assert_eq!(
            upload(json!({"success": true, "status_url": ""})).accepted_status_url(),
            None
        );
        assert_eq!(upload(json!({"status_url": "/result/1"})).accepted_status_url(), None);
    }

    fn status(value: Value) -> StatusResponse {
        serde_json::from_value(value).unwrap()
    }

    #[test]
    fn status_fields_of_unexpected_type_are_tolerated() {
        let response = status(json!({"status": "failed", "error": {"code": 7}, "confidence": "0.25"}));
        assert_eq!(response.error_message().as_deref(), Some(r#"{"code":7}"#));
        assert_eq!(response.confidence(), Some(0.25));

        let response = status(json!({"status": "completed", "confidence": [1], "error": null}));
        assert_eq!(response.confidence(), None);
        assert_eq!(response.error_message(), None);
    }

    #[test]
    fn truthiness_follows_loose_json_rules() {
        assert!(is_truthy(&json!(1)));
        assert!(is_truthy(&json!("yes")));
        assert!(is_truthy(&json!({})));
        assert!(!is_truthy(&json!(0)));
        assert!(!is_truthy(&json!("")));
        assert!(!is_truthy(&Value::Null));
    }
}
