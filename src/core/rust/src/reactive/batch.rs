/* src/core/rust/src/reactive/batch.rs */

use std::cell::RefCell;

type Deferred = Box<dyn FnOnce()>;

#[derive(Default)]
struct BatchState {
  depth: usize,
  pending: Vec<(usize, Deferred)>,
}

thread_local! {
  static BATCH: RefCell<BatchState> = RefCell::new(BatchState::default());
}

/// Defers [`Observable`](super::Observable) notifications raised on this
/// thread until the outermost scope is dropped. Values change immediately;
/// only subscribers wait. Each cell is notified at most once per flush, with
/// its value at flush time.
pub struct BatchScope {
  _not_send: std::marker::PhantomData<*const ()>,
}

impl BatchScope {
  #[must_use]
  pub fn new() -> Self {
    BATCH.with(|state| state.borrow_mut().depth += 1);
    Self { _not_send: std::marker::PhantomData }
  }
}

impl Default for BatchScope {
  fn default() -> Self {
    Self::new()
  }
}

impl Drop for BatchScope {
  fn drop(&mut self) {
    let flushed = BATCH.with(|state| {
      let mut state = state.borrow_mut();
      state.depth -= 1;
      if state.depth == 0 { std::mem::take(&mut state.pending) } else { Vec::new() }
    });
    for (_, notify) in flushed {
      notify();
    }
  }
}

/// Run `f` inside a [`BatchScope`].
pub fn batch<R>(f: impl FnOnce() -> R) -> R {
  let _scope = BatchScope::new();
  f()
}

/// Queue `notify` if a scope is open. Returns it back when no scope is open
/// so the caller can run it immediately.
pub(super) fn defer(key: usize, notify: Deferred) -> Option<Deferred> {
  BATCH.with(|state| {
    let mut state = state.borrow_mut();
    if state.depth == 0 {
      return Some(notify);
    }
    if !state.pending.iter().any(|(pending, _)| *pending == key) {
      state.pending.push((key, notify));
    }
    None
  })
}
