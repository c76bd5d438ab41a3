use reqwest::Url;
use serde::{Deserialize, Serialize};
use serde_json::Value;
use std::collections::HashMap;

use crate::error::PerfdashError;

// ---------------------------------------------------------------------------
// HttpMethod
// ---------------------------------------------------------------------------

#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "UPPERCASE")]
pub enum HttpMethod {
    Get,
    Post,
    Put,
    Delete,
    Patch,
}

impl HttpMethod {
    /// Lowercase form used when matching routes.
    pub fn as_lowercase(&self) -> &'static str {
        match self {
            HttpMethod::Get => "get",
            HttpMethod::Post => "post",
            HttpMethod::Put => "put",
            HttpMethod::Delete => "delete",
            HttpMethod::Patch => "patch",
        }
    }
}

impl std::fmt::Display for HttpMethod {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        let s = match self {
            HttpMethod::Get => "GET",
            HttpMethod::Post => "POST",
            HttpMethod::Put => "PUT",
            HttpMethod::Delete => "DELETE",
            HttpMethod::Patch => "PATCH",
        };
        write!(f, "{s}")
    }
}

impl std::str::FromStr for HttpMethod {
    type Err = PerfdashError;

    /// Case-insensitive: `get`, `GET` and `Get` all parse.
    fn from_str(s: &str) -> Result<Self, Self::Err> {
        match s.trim().to_ascii_lowercase().as_str() {
            "get" => Ok(HttpMethod::Get),
            "post" => Ok(HttpMethod::Post),
            "put" => Ok(HttpMethod::Put),
            "delete" => Ok(HttpMethod::Delete),
            "patch" => Ok(HttpMethod::Patch),
            other => Err(PerfdashError::Validation(format!(
                "Unsupported HTTP method: {other}"
            ))),
        }
    }
}

// ---------------------------------------------------------------------------
// RequestBody
// ---------------------------------------------------------------------------

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(tag = "type", content = "value", rename_all = "snake_case")]
pub enum RequestBody {
    /// A JSON payload.
    Json(Value),
    /// URL-encoded form data as ordered key/value pairs.
    Form(Vec<(String, String)>),
}

impl RequestBody {
    /// The body as a JSON value; form pairs become an object of strings.
    pub fn to_json(&self) -> Value {
        match self {
            RequestBody::Json(value) => value.clone(),
            RequestBody::Form(pairs) => Value::Object(
                pairs
                    .iter()
                    .map(|(k, v)| (k.clone(), Value::String(v.clone())))
                    .collect(),
            ),
        }
    }
}

// ---------------------------------------------------------------------------
// ApiRequest
// ---------------------------------------------------------------------------

/// An outbound dashboard API call, before it is either intercepted by the
/// simulation gateway or sent over the network.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub struct ApiRequest {
    pub method: HttpMethod,

    /// Path relative to the client base URL (`/api/...`) or an absolute URL.
    pub url: String,

    /// Query parameters, appended to the URL on the wire.
    #[serde(default)]
    pub query: HashMap<String, String>,

    /// Extra HTTP headers to include in the request.
    #[serde(default)]
    pub headers: HashMap<String, String>,

    #[serde(skip_serializing_if = "Option::is_none")]
    pub body: Option<RequestBody>,
}

impl ApiRequest {
    pub fn new(method: HttpMethod, url: impl Into<String>) -> Self {
        Self {
            method,
            url: url.into(),
            query: HashMap::new(),
            headers: HashMap::new(),
            body: None,
        }
    }

    pub fn get(url: impl Into<String>) -> Self {
        Self::new(HttpMethod::Get, url)
    }

    pub fn post(url: impl Into<String>) -> Self {
        Self::new(HttpMethod::Post, url)
    }

    pub fn query(mut self, key: impl Into<String>, value: impl ToString) -> Self {
        self.query.insert(key.into(), value.to_string());
        self
    }

    pub fn header(mut self, key: impl Into<String>, value: impl Into<String>) -> Self {
        self.headers.insert(key.into(), value.into());
        self
    }

    pub fn json(mut self, value: Value) -> Self {
        self.body = Some(RequestBody::Json(value));
        self
    }

    pub fn form(mut self, pairs: Vec<(String, String)>) -> Self {
        self.body = Some(RequestBody::Form(pairs));
        self
    }

    /// The URL with any query string and fragment removed.
    pub fn path(&self) -> &str {
        normalize_path(&self.url)
    }

    /// Query parameters written inline in `url` merged with [`query`](Self::query).
    /// Entries in `query` win over inline ones with the same key.
    pub fn merged_query(&self) -> HashMap<String, String> {
        let mut merged = inline_query(&self.url);
        merged.extend(self.query.iter().map(|(k, v)| (k.clone(), v.clone())));
        merged
    }
}

// Relative paths are resolved against this before the query is parsed.
const RELATIVE_BASE: &str = "http://localhost/";

/// Decoded `?k=v` pairs of a URL or path. Unparsable URLs yield nothing.
fn inline_query(url: &str) -> HashMap<String, String> {
    if !url.contains('?') {
        return HashMap::new();
    }
    Url::parse(RELATIVE_BASE)
        .and_then(|base| base.join(url))
        .map(|parsed| parsed.query_pairs().into_owned().collect())
        .unwrap_or_default()
}

/// Strip the query string and fragment from a URL or path.
pub fn normalize_path(url: &str) -> &str {
    let end = url.find(['?', '#']).unwrap_or(url.len());
    &url[..end]
}
