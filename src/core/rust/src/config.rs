/* src/core/rust/src/config.rs */

use std::path::Path;
use std::time::Duration;

use serde::Deserialize;

use crate::errors::RatiError;

/// Application-level defaults, usually read from `rati.toml`.
/// Every section is optional; `RatiConfig::default()` matches an empty file.
#[derive(Debug, Clone, Default, PartialEq, Deserialize)]
pub struct RatiConfig {
  #[serde(default)]
  pub remote_data: RemoteDataConfig,
  #[serde(default)]
  pub link: LinkConfig,
  #[serde(default)]
  pub root: RootConfig,
}

#[derive(Debug, Clone, PartialEq, Deserialize)]
pub struct RemoteDataConfig {
  #[serde(default = "default_debounce_wait_ms")]
  pub debounce_wait_ms: u64,
  /// Quiet period used for typed input.
  #[serde(default = "default_input_wait_ms")]
  pub input_wait_ms: u64,
  #[serde(default = "default_indicate_pending_after_ms")]
  pub indicate_pending_after_ms: u64,
  #[serde(default)]
  pub debounce_max_wait_ms: Option<u64>,
  #[serde(default)]
  pub race_guard: bool,
}

impl Default for RemoteDataConfig {
  fn default() -> Self {
    Self {
      debounce_wait_ms: default_debounce_wait_ms(),
      input_wait_ms: default_input_wait_ms(),
      indicate_pending_after_ms: default_indicate_pending_after_ms(),
      debounce_max_wait_ms: None,
      race_guard: false,
    }
  }
}

impl RemoteDataConfig {
  pub fn debounce_wait(&self) -> Duration {
    Duration::from_millis(self.debounce_wait_ms)
  }

  pub fn input_wait(&self) -> Duration {
    Duration::from_millis(self.input_wait_ms)
  }

  pub fn indicate_pending_after(&self) -> Duration {
    Duration::from_millis(self.indicate_pending_after_ms)
  }
}

#[derive(Debug, Clone, PartialEq, Deserialize)]
pub struct LinkConfig {
  #[serde(default = "default_active_class_name")]
  pub active_class_name: String,
}

impl Default for LinkConfig {
  fn default() -> Self {
    Self { active_class_name: default_active_class_name() }
  }
}

#[derive(Debug, Clone, PartialEq, Deserialize)]
pub struct RootConfig {
  /// Hold `provide()` until `init()` has run its hydration hooks.
  #[serde(default = "default_true")]
  pub wait_for_hydration: bool,
}

impl Default for RootConfig {
  fn default() -> Self {
    Self { wait_for_hydration: default_true() }
  }
}

fn default_debounce_wait_ms() -> u64 {
  100
}

fn default_input_wait_ms() -> u64 {
  350
}

fn default_indicate_pending_after_ms() -> u64 {
  200
}

fn default_active_class_name() -> String {
  "active".to_string()
}

fn default_true() -> bool {
  true
}

impl RatiConfig {
  pub fn from_toml_str(content: &str) -> Result<Self, RatiError> {
    let config: Self =
      toml::from_str(content).map_err(|e| RatiError::config(format!("invalid rati config: {e}")))?;
    config.validate()?;
    Ok(config)
  }

  pub fn validate(&self) -> Result<(), RatiError> {
    if self.remote_data.input_wait_ms == 0 {
      return Err(RatiError::config("remote_data.input_wait_ms must be greater than 0"));
    }
    if let Some(max_wait) = self.remote_data.debounce_max_wait_ms
      && max_wait < self.remote_data.debounce_wait_ms
    {
      return Err(RatiError::config(format!(
        "remote_data.debounce_max_wait_ms ({max_wait}) is shorter than debounce_wait_ms ({})",
        self.remote_data.debounce_wait_ms
      )));
    }
    if self.link.active_class_name.trim().is_empty() {
      return Err(RatiError::config("link.active_class_name must not be empty"));
    }
    Ok(())
  }
}

pub fn load_config(path: &Path) -> Result<RatiConfig, RatiError> {
  let content = std::fs::read_to_string(path)
    .map_err(|e| RatiError::config(format!("failed to read {}: {e}", path.display())))?;
  RatiConfig::from_toml_str(&content)
}
