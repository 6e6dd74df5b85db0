/* src/core/rust/src/remote_data/state.rs */

use serde::Serialize;

/// Observable status of a [`RemoteData`](super::RemoteData) wrapper.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq)]
pub struct RemoteDataState {
  /// A call is waiting for its timer or its result.
  pub is_pending: bool,
  /// Raised once a pending call has taken long enough to show a spinner.
  pub indicate_pending: bool,
  /// Callers waiting for the next invocation.
  pub queued: usize,
}

impl RemoteDataState {
  pub fn is_ready(&self) -> bool {
    self.queued == 0 && !self.is_pending
  }

  pub fn should_indicate_pending(&self) -> bool {
    self.is_pending && self.indicate_pending
  }

  pub fn button_props(&self) -> ButtonProps {
    ButtonProps { disabled: self.should_indicate_pending(), blocked: self.is_pending }
  }
}

/// Props for a submit button bound to a wrapper.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Serialize)]
pub struct ButtonProps {
  pub disabled: bool,
  pub blocked: bool,
}
