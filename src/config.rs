//! Engine configuration.
//!
//! Loaded from JSON; every field is optional and falls back to its default.
//!
//! ```json
//! {
//!   "frame_period_ms": 16,
//!   "initial_effect": "ripple",
//!   "parameters": {
//!     "ripple": { "rippleColor": "#FF8800", "spreadSpeed": 40 }
//!   }
//! }
//! ```

use std::{collections::BTreeMap, path::Path};

use embassy_time::Duration;
use serde::{Deserialize, Serialize};
use serde_json::Value;

pub use crate::audio::AudioConfig;
use crate::error::Result;

/// Default seed for every random source.
pub const DEFAULT_SEED: u64 = 0x5EED;

/// Default tick period in milliseconds.
pub const DEFAULT_FRAME_PERIOD_MS: u64 = 16;

/// Consecutive update failures after which an effect is disabled.
pub const DEFAULT_MAX_CONSECUTIVE_FAILURES: u32 = 3;

/// Parameter overrides, `effect name -> parameter name -> value`.
pub type ParameterOverrides = BTreeMap<String, BTreeMap<String, Value>>;

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct EngineConfig {
    pub frame_period_ms: u64,
    pub max_consecutive_failures: u32,
    pub seed: u64,
    pub audio: AudioConfig,
    /// Effect activated by `start`, if any
    pub initial_effect: Option<String>,
    pub parameters: ParameterOverrides,
    /// Leave ticking to `tick_now`/`tick_at`. Only `start` spawns the
    /// ticker thread then.
    pub manual_ticks: bool,
}

impl Default for EngineConfig {
    fn default() -> Self {
        Self {
            frame_period_ms: DEFAULT_FRAME_PERIOD_MS,
            max_consecutive_failures: DEFAULT_MAX_CONSECUTIVE_FAILURES,
            seed: DEFAULT_SEED,
            audio: AudioConfig::default(),
            initial_effect: None,
            parameters: ParameterOverrides::new(),
            manual_ticks: false,
        }
    }
}

impl EngineConfig {
    pub fn from_json_str(json: &str) -> Result<Self> {
        Ok(serde_json::from_str(json)?)
    }

    pub fn from_json_file<P: AsRef<Path>>(path: P) -> Result<Self> {
        let json = std::fs::read_to_string(path)?;
        Self::from_json_str(&json)
    }

    pub fn to_json_string(&self) -> Result<String> {
        Ok(serde_json::to_string_pretty(self)?)
    }

    /// Tick period, never shorter than one millisecond
    pub fn frame_period(&self) -> Duration {
        Duration::from_millis(self.frame_period_ms.max(1))
    }

    /// Failure budget, never below one
    pub fn failure_limit(&self) -> u32 {
        self.max_consecutive_failures.max(1)
    }

    /// Record a parameter override
    #[must_use]
    pub fn with_parameter(mut self, effect: &str, parameter: &str, value: Value) -> Self {
        self.parameters
            .entry(effect.to_owned())
            .or_default()
            .insert(parameter.to_owned(), value);
        self
    }
}
