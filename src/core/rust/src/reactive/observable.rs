/* src/core/rust/src/reactive/observable.rs */

use std::fmt;
use std::sync::{Arc, Weak};

use parking_lot::Mutex;
use tokio::sync::watch;

use super::batch;

type Callback<T> = Arc<dyn Fn(&T) + Send + Sync>;

struct State<T> {
  value: T,
  version: u64,
  next_id: u64,
  subscribers: Vec<(u64, Callback<T>)>,
}

struct Shared<T> {
  state: Mutex<State<T>>,
  notified: watch::Sender<u64>,
}

/// Shared, versioned value with change notification.
///
/// Clones share the same cell. Subscribers run in registration order, after
/// the internal lock is released, so a callback may read or write any cell.
pub struct Observable<T> {
  shared: Arc<Shared<T>>,
}

impl<T> Clone for Observable<T> {
  fn clone(&self) -> Self {
    Self { shared: Arc::clone(&self.shared) }
  }
}

impl<T: fmt::Debug> fmt::Debug for Observable<T> {
  fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
    let state = self.shared.state.lock();
    f.debug_struct("Observable")
      .field("value", &state.value)
      .field("version", &state.version)
      .finish()
  }
}

impl<T: Default + Clone + Send + Sync + 'static> Default for Observable<T> {
  fn default() -> Self {
    Self::new(T::default())
  }
}

impl<T: Clone + Send + Sync + 'static> Observable<T> {
  pub fn new(value: T) -> Self {
    let (notified, _) = watch::channel(0);
    Self {
      shared: Arc::new(Shared {
        state: Mutex::new(State { value, version: 0, next_id: 0, subscribers: Vec::new() }),
        notified,
      }),
    }
  }

  #[must_use]
  pub fn get(&self) -> T {
    self.shared.state.lock().value.clone()
  }

  pub fn with<R>(&self, f: impl FnOnce(&T) -> R) -> R {
    f(&self.shared.state.lock().value)
  }

  /// Number of mutations so far.
  pub fn version(&self) -> u64 {
    self.shared.state.lock().version
  }

  /// Replace the value and notify, even if it is equal to the old one.
  pub fn set(&self, value: T) {
    {
      let mut state = self.shared.state.lock();
      state.value = value;
      state.version += 1;
    }
    self.notify();
  }

  pub fn update(&self, f: impl FnOnce(&mut T)) {
    {
      let mut state = self.shared.state.lock();
      f(&mut state.value);
      state.version += 1;
    }
    self.notify();
  }

  pub fn subscribe(&self, callback: impl Fn(&T) + Send + Sync + 'static) -> Subscription {
    let id = {
      let mut state = self.shared.state.lock();
      let id = state.next_id;
      state.next_id += 1;
      state.subscribers.push((id, Arc::new(callback)));
      id
    };
    let weak: Weak<Shared<T>> = Arc::downgrade(&self.shared);
    Subscription::new(move || {
      if let Some(shared) = weak.upgrade() {
        shared.state.lock().subscribers.retain(|(sub_id, _)| *sub_id != id);
      }
    })
  }

  /// Resolves on the next notification.
  pub async fn changed(&self) {
    let mut rx = self.shared.notified.subscribe();
    // The sender lives as long as `self`, so this cannot fail.
    let _ = rx.changed().await;
  }

  /// Resolves with the value once `pred` holds, checking the current value
  /// first.
  pub async fn wait_until(&self, pred: impl Fn(&T) -> bool) -> T {
    let mut rx = self.shared.notified.subscribe();
    loop {
      {
        let state = self.shared.state.lock();
        if pred(&state.value) {
          return state.value.clone();
        }
      }
      if rx.changed().await.is_err() {
        return self.get();
      }
    }
  }

  fn notify(&self) {
    let key = Arc::as_ptr(&self.shared) as *const () as usize;
    let this = self.clone();
    if let Some(run_now) = batch::defer(key, Box::new(move || this.notify_now())) {
      run_now();
    }
  }

  fn notify_now(&self) {
    let (value, version, callbacks) = {
      let state = self.shared.state.lock();
      let callbacks: Vec<Callback<T>> =
        state.subscribers.iter().map(|(_, cb)| Arc::clone(cb)).collect();
      (state.value.clone(), state.version, callbacks)
    };
    for callback in callbacks {
      callback(&value);
    }
    self.shared.notified.send_replace(version);
  }
}

impl<T: PartialEq + Clone + Send + Sync + 'static> Observable<T> {
  /// Set only when the value differs. Returns whether it changed.
  pub fn set_if_changed(&self, value: T) -> bool {
    {
      let mut state = self.shared.state.lock();
      if state.value == value {
        return false;
      }
      state.value = value;
      state.version += 1;
    }
    self.notify();
    true
  }
}

/// Unsubscribes its callback when dropped.
#[must_use = "dropping a Subscription unsubscribes immediately"]
pub struct Subscription {
  unsubscribe: Option<Box<dyn FnOnce() + Send + Sync>>,
}

impl Subscription {
  fn new(unsubscribe: impl FnOnce() + Send + Sync + 'static) -> Self {
    Self { unsubscribe: Some(Box::new(unsubscribe)) }
  }

  /// Keep the callback registered for the lifetime of the cell.
  pub fn detach(mut self) {
    self.unsubscribe = None;
  }
}

impl Drop for Subscription {
  fn drop(&mut self) {
    if let Some(unsubscribe) = self.unsubscribe.take() {
      unsubscribe();
    }
  }
}

impl fmt::Debug for Subscription {
  fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
    f.debug_struct("Subscription").field("active", &self.unsubscribe.is_some()).finish()
  }
}

#[cfg(test)]
mod tests {
  use std::sync::atomic::{AtomicUsize, Ordering};

  use super::*;
  use crate::reactive::batch;

  fn counter(obs: &Observable<i32>) -> (Arc<AtomicUsize>, Subscription) {
    let hits = Arc::new(AtomicUsize::new(0));
    let hits_in = Arc::clone(&hits);
    let sub = obs.subscribe(move |_| {
      hits_in.fetch_add(1, Ordering::SeqCst);
    });
    (hits, sub)
  }

  #[test]
  fn set_notifies_and_bumps_version() {
    let obs = Observable::new(1);
    let (hits, _sub) = counter(&obs);
    obs.set(2);
    assert_eq!(obs.get(), 2);
    assert_eq!(obs.version(), 1);
    assert_eq!(hits.load(Ordering::SeqCst), 1);
  }

  #[test]
  fn set_if_changed_skips_equal_values() {
    let obs = Observable::new(5);
    let (hits, _sub) = counter(&obs);
    assert!(!obs.set_if_changed(5));
    assert!(obs.set_if_changed(6));
    assert_eq!(hits.load(Ordering::SeqCst), 1);
    assert_eq!(obs.version(), 1);
  }

  #[test]
  fn subscribers_receive_the_new_value_in_order() {
    let obs = Observable::new(0);
    let seen = Arc::new(Mutex::new(Vec::new()));
    let first = Arc::clone(&seen);
    let second = Arc::clone(&seen);
    let _a = obs.subscribe(move |v| first.lock().push(("a", *v)));
    let _b = obs.subscribe(move |v| second.lock().push(("b", *v)));
    obs.set(3);
    assert_eq!(*seen.lock(), vec![("a", 3), ("b", 3)]);
  }

  #[test]
  fn dropping_subscription_unsubscribes() {
    let obs = Observable::new(0);
    let (hits, sub) = counter(&obs);
    drop(sub);
    obs.set(1);
    assert_eq!(hits.load(Ordering::SeqCst), 0);
  }

  #[test]
  fn detached_subscription_stays_registered() {
    let obs = Observable::new(0);
    let (hits, sub) = counter(&obs);
    sub.detach();
    obs.set(1);
    assert_eq!(hits.load(Ordering::SeqCst), 1);
  }

  #[test]
  fn batch_defers_and_coalesces_notifications() {
    let obs = Observable::new(0);
    let (hits, _sub) = counter(&obs);
    batch(|| {
      obs.set(1);
      obs.set(2);
      assert_eq!(obs.get(), 2);
      assert_eq!(hits.load(Ordering::SeqCst), 0);
    });
    assert_eq!(hits.load(Ordering::SeqCst), 1);
  }

  #[test]
  fn nested_batches_flush_at_the_outermost_scope() {
    let obs = Observable::new(0);
    let (hits, _sub) = counter(&obs);
    let outer = crate::reactive::BatchScope::new();
    batch(|| obs.set(1));
    assert_eq!(hits.load(Ordering::SeqCst), 0);
    drop(outer);
    assert_eq!(hits.load(Ordering::SeqCst), 1);
  }

  #[test]
  fn callbacks_may_write_other_cells() {
    let source = Observable::new(0);
    let mirror = Observable::new(0);
    let target = mirror.clone();
    let _sub = source.subscribe(move |v| target.set(*v * 10));
    source.set(4);
    assert_eq!(mirror.get(), 40);
  }

  #[tokio::test]
  async fn wait_until_sees_later_writes() {
    let obs = Observable::new(0);
    let writer = obs.clone();
    tokio::spawn(async move {
      writer.set(1);
      writer.set(7);
    });
    assert_eq!(obs.wait_until(|v| *v == 7).await, 7);
  }

  #[tokio::test]
  async fn wait_until_returns_immediately_when_satisfied() {
    let obs = Observable::new(3);
    assert_eq!(obs.wait_until(|v| *v == 3).await, 3);
  }
}
