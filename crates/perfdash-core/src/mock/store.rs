use std::sync::{PoisonError, RwLock};

use serde::{Deserialize, Serialize};
use serde_json::{Map, Value};
use tracing::{info, warn};

// ---------------------------------------------------------------------------
// ProxyConfig
// ---------------------------------------------------------------------------

/// Where the collection proxy forwards captured inference traffic.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub struct ProxyConfig {
    pub target_host: String,
    pub target_port: u16,
    pub api_type: String,
    #[serde(default)]
    pub custom_tokens_jsonpath: String,
    /// Keys the dashboard sent that have no dedicated field.
    #[serde(flatten)]
    pub extra: Map<String, Value>,
}

impl Default for ProxyConfig {
    fn default() -> Self {
        Self {
            target_host: "127.0.0.1".to_string(),
            target_port: 8080,
            api_type: "openai_compatible".to_string(),
            custom_tokens_jsonpath: String::new(),
            extra: Map::new(),
        }
    }
}

/// A partial [`ProxyConfig`]: only the fields that are present get applied.
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub struct ProxyConfigUpdate {
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub target_host: Option<String>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub target_port: Option<u16>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub api_type: Option<String>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub custom_tokens_jsonpath: Option<String>,
    #[serde(flatten)]
    pub extra: Map<String, Value>,
}

impl ProxyConfigUpdate {
    /// Parse an update from a request body. Bodies may arrive either as a
    /// JSON object or as a JSON string containing one.
    pub fn from_body(body: &Value) -> Result<Self, serde_json::Error> {
        match body {
            Value::String(raw) => serde_json::from_str(raw),
            other => Self::deserialize(other),
        }
    }

    fn apply_to(self, config: &mut ProxyConfig) {
        if let Some(host) = self.target_host {
            config.target_host = host;
        }
        if let Some(port) = self.target_port {
            config.target_port = port;
        }
        if let Some(api_type) = self.api_type {
            config.api_type = api_type;
        }
        if let Some(path) = self.custom_tokens_jsonpath {
            config.custom_tokens_jsonpath = path;
        }
        config.extra.extend(self.extra);
    }
}

// ---------------------------------------------------------------------------
// ConfigStore
// ---------------------------------------------------------------------------

/// Owner of the single mutable [`ProxyConfig`] record. Constructed once and
/// handed to the gateway; nothing else mutates it.
#[derive(Debug, Default)]
pub struct ConfigStore {
    config: RwLock<ProxyConfig>,
}

impl ConfigStore {
    pub fn new(initial: ProxyConfig) -> Self {
        Self {
            config: RwLock::new(initial),
        }
    }

    pub fn get(&self) -> ProxyConfig {
        self.config
            .read()
            .unwrap_or_else(PoisonError::into_inner)
            .clone()
    }

    /// Shallow merge: present fields overwrite, absent fields keep their
    /// value. Returns the merged record.
    pub fn update(&self, partial: ProxyConfigUpdate) -> ProxyConfig {
        let mut config = self.config.write().unwrap_or_else(PoisonError::into_inner);
        partial.apply_to(&mut config);
        info!(
            target_host = %config.target_host,
            target_port = config.target_port,
            "Proxy config updated"
        );
        config.clone()
    }

    /// Merge a raw request body. A missing or unparsable body leaves the
    /// record untouched.
    pub fn update_from_body(&self, body: Option<&Value>) -> ProxyConfig {
        let Some(body) = body else {
            return self.get();
        };
        match ProxyConfigUpdate::from_body(body) {
            Ok(partial) => self.update(partial),
            Err(e) => {
                warn!("Ignoring malformed proxy config update: {e}");
                self.get()
            }
        }
    }
}
