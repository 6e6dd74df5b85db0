/* src/core/rust/src/remote_data/options.rs */

use std::time::Duration;

use crate::config::RemoteDataConfig;

/// Quiet period before a debounced call is invoked.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq)]
pub enum DebounceWait {
  /// `remote_data.debounce_wait_ms`, 100 ms unless configured.
  #[default]
  Default,
  /// Longer wait for typed input, `remote_data.input_wait_ms`.
  Input,
  Fixed(Duration),
}

impl DebounceWait {
  pub fn resolve(self, config: &RemoteDataConfig) -> Duration {
    match self {
      Self::Default => config.debounce_wait(),
      Self::Input => config.input_wait(),
      Self::Fixed(wait) => wait,
    }
  }
}

#[derive(Debug, Clone, PartialEq, Eq)]
pub struct RemoteDataOptions {
  /// Run the first call of a burst right away instead of after the wait.
  pub is_immediate: bool,
  /// Upper bound on the time between two invocations while calls keep
  /// arriving.
  pub debounce_max_wait: Option<Duration>,
  pub debounce_wait: DebounceWait,
  /// Delay before `indicate_pending` is raised. Never earlier than the
  /// invocation itself.
  pub indicate_pending_after: Duration,
  /// Never hand out a result older than one already returned.
  pub race_guard: bool,
}

impl Default for RemoteDataOptions {
  fn default() -> Self {
    Self::from_config(&RemoteDataConfig::default())
  }
}

impl RemoteDataOptions {
  pub fn from_config(config: &RemoteDataConfig) -> Self {
    Self {
      is_immediate: false,
      debounce_max_wait: config.debounce_max_wait_ms.map(Duration::from_millis),
      debounce_wait: DebounceWait::Default,
      indicate_pending_after: config.indicate_pending_after(),
      race_guard: config.race_guard,
    }
  }

  pub fn immediate(mut self) -> Self {
    self.is_immediate = true;
    self
  }

  pub fn wait(mut self, wait: DebounceWait) -> Self {
    self.debounce_wait = wait;
    self
  }

  pub fn max_wait(mut self, max_wait: Duration) -> Self {
    self.debounce_max_wait = Some(max_wait);
    self
  }

  pub fn indicate_pending_after(mut self, delay: Duration) -> Self {
    self.indicate_pending_after = delay;
    self
  }

  pub fn race_guard(mut self) -> Self {
    self.race_guard = true;
    self
  }
}
