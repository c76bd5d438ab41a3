use serde::de::DeserializeOwned;
use serde::{Deserialize, Serialize};
use serde_json::Value;
use std::collections::HashMap;

use crate::error::PerfdashError;

/// The result of a dashboard API call, whether it came from the network or
/// from the simulation gateway.
#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub struct ApiResponse {
    /// HTTP response status code (e.g. 200, 401).
    pub status: u16,

    /// Response headers as a flat key/value map with lowercased keys. When
    /// the server returns multiple values for the same header, only the last
    /// value is kept.
    pub headers: HashMap<String, String>,

    /// Response body decoded as UTF-8 (replacement characters for invalid
    /// sequences).
    pub body: String,

    /// Time from dispatch until the body was available, in milliseconds.
    pub elapsed_ms: u64,

    /// Number of bytes in the raw response body.
    pub size_bytes: u64,

    /// `true` when the simulation gateway produced this response.
    #[serde(default)]
    pub simulated: bool,
}

impl ApiResponse {
    /// A JSON response synthesized by the simulation gateway.
    pub fn synthetic(status: u16, body: &Value, elapsed_ms: u64) -> Self {
        let body = body.to_string();
        let mut headers = HashMap::new();
        headers.insert("content-type".to_string(), "application/json".to_string());
        Self {
            status,
            headers,
            size_bytes: body.len() as u64,
            body,
            elapsed_ms,
            simulated: true,
        }
    }

    pub fn is_success(&self) -> bool {
        (200..300).contains(&self.status)
    }

    /// Deserialize the body as JSON.
    pub fn json<T: DeserializeOwned>(&self) -> Result<T, PerfdashError> {
        Ok(serde_json::from_str(&self.body)?)
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use serde_json::json;

    #[test]
    fn synthetic_response_is_json_with_size() {
        let resp = ApiResponse::synthetic(200, &json!({"status": "ok"}), 120);
        assert_eq!(resp.status, 200);
        assert_eq!(resp.headers["content-type"], "application/json");
        assert_eq!(resp.body, r#"{"status":"ok"}"#);
        assert_eq!(resp.size_bytes, resp.body.len() as u64);
        assert_eq!(resp.elapsed_ms, 120);
        assert!(resp.simulated);
        assert!(resp.is_success());
    }

    #[test]
    fn json_decodes_body() {
        let resp = ApiResponse::synthetic(200, &json!({"data": [1, 2, 3]}), 0);
        let value: Value = resp.json().unwrap();
        assert_eq!(value["data"][2], 3);
    }

    #[test]
    fn json_on_non_json_body_is_serde_error() {
        let resp = ApiResponse {
            status: 502,
            headers: HashMap::new(),
            body: "Bad Gateway".to_string(),
            elapsed_ms: 5,
            size_bytes: 11,
            simulated: false,
        };
        assert!(!resp.is_success());
        let err = resp.json::<Value>().unwrap_err();
        assert!(matches!(err, PerfdashError::Serde(_)));
    }

    #[test]
    fn simulated_defaults_to_false_when_missing() {
        let raw = r#"{"status":204,"headers":{},"body":"","elapsed_ms":3,"size_bytes":0}"#;
        let parsed: ApiResponse = serde_json::from_str(raw).unwrap();
        assert_eq!(parsed.status, 204);
        assert!(!parsed.simulated);
    }
}
