/* src/core/rust/src/errors.rs */

use std::fmt;

pub const MISSING_CONTEXT: &str = "MISSING_CONTEXT";
pub const RESOLUTION_FAILED: &str = "RESOLUTION_FAILED";
pub const ROUTE_NOT_FOUND: &str = "ROUTE_NOT_FOUND";
pub const INVALID_ROUTE: &str = "INVALID_ROUTE";
pub const CANCELLED: &str = "CANCELLED";
pub const VALIDATION_ERROR: &str = "VALIDATION_ERROR";
pub const CONFIG_ERROR: &str = "CONFIG_ERROR";
pub const INTERNAL_ERROR: &str = "INTERNAL_ERROR";

/// Error shared by every rati subsystem.
///
/// `Clone` because one failed pending computation is observed by every
/// resolution and every coalesced caller waiting on it.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct RatiError {
  code: String,
  message: String,
}

impl RatiError {
  pub fn new(code: impl Into<String>, message: impl Into<String>) -> Self {
    Self { code: code.into(), message: message.into() }
  }

  /// A context-dependent accessor was used without its provider.
  pub fn missing_context(msg: impl Into<String>) -> Self {
    Self::new(MISSING_CONTEXT, msg)
  }

  /// A production rule failed while a view chain was being resolved.
  pub fn resolution(msg: impl Into<String>) -> Self {
    Self::new(RESOLUTION_FAILED, msg)
  }

  pub fn route_not_found(name: &str) -> Self {
    Self::new(ROUTE_NOT_FOUND, format!("No route named '{name}'"))
  }

  pub fn invalid_route(msg: impl Into<String>) -> Self {
    Self::new(INVALID_ROUTE, msg)
  }

  pub fn cancelled(reason: impl Into<String>) -> Self {
    Self::new(CANCELLED, reason)
  }

  pub fn validation(msg: impl Into<String>) -> Self {
    Self::new(VALIDATION_ERROR, msg)
  }

  pub fn config(msg: impl Into<String>) -> Self {
    Self::new(CONFIG_ERROR, msg)
  }

  pub fn internal(msg: impl Into<String>) -> Self {
    Self::new(INTERNAL_ERROR, msg)
  }

  pub fn code(&self) -> &str {
    &self.code
  }

  pub fn message(&self) -> &str {
    &self.message
  }

  pub fn is_cancelled(&self) -> bool {
    self.code == CANCELLED
  }
}

impl fmt::Display for RatiError {
  fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
    write!(f, "{}: {}", self.code, self.message)
  }
}

impl std::error::Error for RatiError {}

impl From<serde_json::Error> for RatiError {
  fn from(err: serde_json::Error) -> Self {
    Self::validation(err.to_string())
  }
}

impl From<tokio::task::JoinError> for RatiError {
  fn from(err: tokio::task::JoinError) -> Self {
    if err.is_cancelled() {
      Self::cancelled("task was aborted")
    } else {
      Self::internal(format!("task panicked: {err}"))
    }
  }
}
