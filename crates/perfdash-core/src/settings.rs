//! Client and simulation settings.
//!
//! Both structs deserialize with defaults for every field, so a settings
//! file only needs to name what it overrides.

use std::path::Path;
use std::time::Duration;

use serde::{Deserialize, Serialize};

use crate::error::PerfdashError;
use crate::synth::catalog::DEFAULT_RECORD_TOTAL;

pub const ENV_API_BASE: &str = "PERFDASH_API_BASE";
pub const ENV_TIMEOUT_SECS: &str = "PERFDASH_TIMEOUT_SECS";
pub const ENV_USE_MOCK: &str = "PERFDASH_USE_MOCK";

// ---------------------------------------------------------------------------
// ClientSettings
// ---------------------------------------------------------------------------

#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(default, rename_all = "snake_case")]
pub struct ClientSettings {
    pub base_url: String,
    pub timeout_secs: u64,
    /// Route matching requests through the simulation gateway.
    pub use_mock: bool,
}

impl Default for ClientSettings {
    fn default() -> Self {
        Self {
            base_url: "http://localhost:8080".to_string(),
            timeout_secs: 60,
            use_mock: false,
        }
    }
}

impl ClientSettings {
    /// Defaults overridden by `PERFDASH_*` environment variables.
    pub fn from_env() -> Self {
        Self::from_lookup(|key| std::env::var(key).ok())
    }

    /// Defaults overridden by whatever `lookup` returns. Unparsable values
    /// are ignored.
    pub fn from_lookup(lookup: impl Fn(&str) -> Option<String>) -> Self {
        let mut settings = Self::default();
        if let Some(base) = lookup(ENV_API_BASE).filter(|v| !v.trim().is_empty()) {
            settings.base_url = base.trim().to_string();
        }
        if let Some(secs) = lookup(ENV_TIMEOUT_SECS).and_then(|v| v.trim().parse().ok()) {
            settings.timeout_secs = secs;
        }
        if let Some(flag) = lookup(ENV_USE_MOCK) {
            settings.use_mock = flag.trim() == "true";
        }
        settings
    }

    pub fn timeout(&self) -> Duration {
        Duration::from_secs(self.timeout_secs)
    }
}

// ---------------------------------------------------------------------------
// SimulationSettings
// ---------------------------------------------------------------------------

/// Tunables for the simulation gateway and its generators.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(default, rename_all = "snake_case")]
pub struct SimulationSettings {
    /// Lower bound of the artificial response delay (ms, inclusive).
    pub delay_min_ms: u64,
    /// Upper bound of the artificial response delay (ms, inclusive).
    pub delay_max_ms: u64,
    /// Shortest comparison series.
    pub compare_len_min: usize,
    /// Longest comparison series.
    pub compare_len_max: usize,
    /// Record count for tasks that are not in the catalog.
    pub default_record_total: u64,
}

impl Default for SimulationSettings {
    fn default() -> Self {
        Self {
            delay_min_ms: 100,
            delay_max_ms: 400,
            compare_len_min: 30,
            compare_len_max: 50,
            default_record_total: DEFAULT_RECORD_TOTAL,
        }
    }
}

impl SimulationSettings {
    /// Settings with no artificial delay, for tests and scripted use.
    pub fn instant() -> Self {
        Self {
            delay_min_ms: 0,
            delay_max_ms: 0,
            ..Self::default()
        }
    }

    pub fn validate(&self) -> Result<(), PerfdashError> {
        if self.delay_min_ms > self.delay_max_ms {
            return Err(PerfdashError::Validation(format!(
                "delay range is inverted: {} > {}",
                self.delay_min_ms, self.delay_max_ms
            )));
        }
        if self.compare_len_min == 0 || self.compare_len_min > self.compare_len_max {
            return Err(PerfdashError::Validation(format!(
                "compare length range must satisfy 1 <= min <= max, got {}..={}",
                self.compare_len_min, self.compare_len_max
            )));
        }
        Ok(())
    }

    pub fn delay_range(&self) -> (u64, u64) {
        (self.delay_min_ms, self.delay_max_ms)
    }

    pub fn compare_len_range(&self) -> (usize, usize) {
        (self.compare_len_min, self.compare_len_max)
    }

    /// Read overrides from a JSON file and validate the result.
    pub async fn from_json_file(path: impl AsRef<Path>) -> Result<Self, PerfdashError> {
        let content = tokio::fs::read_to_string(path.as_ref()).await?;
        let settings: SimulationSettings = serde_json::from_str(&content)?;
        settings.validate()?;
        Ok(settings)
    }
}
