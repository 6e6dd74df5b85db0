/* src/core/rust/src/remote_data/mod.rs */

// Debounced wrapper around an asynchronous call: request coalescing,
// busy/pending indication and an optional out-of-order guard.

mod options;
mod state;


use std::future::Future;
use std::sync::Arc;
use std::time::Duration;

use parking_lot::Mutex;
use serde_json::Value;
use tokio::runtime::Handle;
use tokio::sync::oneshot;
use tokio::task::JoinHandle;
use tokio::time::Instant;
use tracing::debug;

pub use options::{DebounceWait, RemoteDataOptions};
pub use state::{ButtonProps, RemoteDataState};

use crate::config::RemoteDataConfig;
use crate::errors::RatiError;
use crate::reactive::Observable;
use crate::task::{BoxFuture, spawn_detached, spawn_eager};

type CallFn<A, T> = Arc<dyn Fn(A) -> BoxFuture<Result<T, RatiError>> + Send + Sync>;

type Reply<T> = oneshot::Sender<Result<T, RatiError>>;

struct Inner<A, T> {
  request_id: u64,
  last_invoke: Instant,
  timer_seq: u64,
  invoke_timer: Option<JoinHandle<()>>,
  indicate_timer: Option<JoinHandle<()>>,
  queue: Vec<Reply<T>>,
  latest_args: Option<A>,
  latest_result: Option<(u64, T)>,
}

impl<A, T> Inner<A, T> {
  fn abort_timers(&mut self) {
    if let Some(timer) = self.invoke_timer.take() {
      timer.abort();
    }
    if let Some(timer) = self.indicate_timer.take() {
      timer.abort();
    }
  }
}

struct Shared<A, T> {
  func: CallFn<A, T>,
  wait: Duration,
  max_wait: Option<Duration>,
  indicate_after: Duration,
  is_immediate: bool,
  race_guard: bool,
  inner: Mutex<Inner<A, T>>,
  state: Observable<RemoteDataState>,
}

enum Scheduled<A, T> {
  Now(A),
  Queued(oneshot::Receiver<Result<T, RatiError>>),
}

enum Waiter<T> {
  Invoked(BoxFuture<Result<T, RatiError>>),
  Queued(oneshot::Receiver<Result<T, RatiError>>),
}

/// A debounced, coalescing wrapper around `f`.
///
/// Every call restarts the quiet-period timer. When it fires, `f` runs once
/// with the latest arguments and every caller queued since the previous
/// invocation receives that result. With `is_immediate`, the first call of
/// a burst runs right away and later calls in the burst are served by one
/// trailing invocation. Clones share the same state.
pub struct RemoteData<A, T> {
  shared: Arc<Shared<A, T>>,
}

impl<A, T> Clone for RemoteData<A, T> {
  fn clone(&self) -> Self {
    Self { shared: Arc::clone(&self.shared) }
  }
}

impl<A, T> RemoteData<A, T>
where
  A: Send + 'static,
  T: Clone + Send + Sync + 'static,
{
  pub fn new<F, Fut>(f: F, options: RemoteDataOptions) -> Self
  where
    F: Fn(A) -> Fut + Send + Sync + 'static,
    Fut: Future<Output = Result<T, RatiError>> + Send + 'static,
  {
    Self::with_config(f, options, &RemoteDataConfig::default())
  }

  /// Like `new`, resolving named debounce waits against `config`.
  pub fn with_config<F, Fut>(f: F, options: RemoteDataOptions, config: &RemoteDataConfig) -> Self
  where
    F: Fn(A) -> Fut + Send + Sync + 'static,
    Fut: Future<Output = Result<T, RatiError>> + Send + 'static,
  {
    let func: CallFn<A, T> =
      Arc::new(move |args: A| -> BoxFuture<Result<T, RatiError>> { Box::pin(f(args)) });
    Self {
      shared: Arc::new(Shared {
        func,
        wait: options.debounce_wait.resolve(config),
        max_wait: options.debounce_max_wait,
        indicate_after: options.indicate_pending_after,
        is_immediate: options.is_immediate,
        race_guard: options.race_guard,
        inner: Mutex::new(Inner {
          request_id: 0,
          last_invoke: Instant::now(),
          timer_seq: 0,
          invoke_timer: None,
          indicate_timer: None,
          queue: Vec::new(),
          latest_args: None,
          latest_result: None,
        }),
        state: Observable::new(RemoteDataState::default()),
      }),
    }
  }

  /// Schedule a call. Bookkeeping happens now; the returned future only
  /// waits for the result. Needs a tokio runtime for its timers.
  pub fn call(&self, args: A) -> BoxFuture<Result<T, RatiError>> {
    let Ok(handle) = Handle::try_current() else {
      return Box::pin(std::future::ready(Err(RatiError::internal(
        "remote data calls need a tokio runtime",
      ))));
    };
    let shared = Arc::clone(&self.shared);

    let (request_id, scheduled, queued) = {
      let mut inner = shared.inner.lock();
      inner.request_id += 1;
      let request_id = inner.request_id;

      let call_now = shared.is_immediate && inner.invoke_timer.is_none();
      inner.abort_timers();

      let invoke_in = shared.next_invoke_timeout(&inner);
      inner.timer_seq += 1;
      let seq = inner.timer_seq;
      let timer_shared = Arc::clone(&shared);
      inner.invoke_timer = Some(handle.spawn(async move {
        tokio::time::sleep(invoke_in).await;
        timer_shared.fire(seq);
      }));

      // The spinner never shows before the call is actually made.
      let indicate_in = shared.indicate_after.max(invoke_in);
      let indicate_state = shared.state.clone();
      inner.indicate_timer = Some(handle.spawn(async move {
        tokio::time::sleep(indicate_in).await;
        if indicate_state.with(|s| s.is_pending && !s.indicate_pending) {
          indicate_state.update(|s| s.indicate_pending = true);
        }
      }));

      let scheduled = if call_now {
        Scheduled::Now(args)
      } else {
        let (tx, rx) = oneshot::channel();
        inner.queue.push(tx);
        inner.latest_args = Some(args);
        Scheduled::Queued(rx)
      };
      (request_id, scheduled, inner.queue.len())
    };

    let waiter = match scheduled {
      Scheduled::Now(args) => Waiter::Invoked(spawn_eager((shared.func)(args))),
      Scheduled::Queued(rx) => Waiter::Queued(rx),
    };
    debug!(request_id, immediate = matches!(waiter, Waiter::Invoked(_)), "remote data call");
    shared.state.update(|s| {
      s.is_pending = true;
      s.queued = queued;
    });

    Box::pin(async move {
      let result = match waiter {
        Waiter::Invoked(fut) => fut.await,
        Waiter::Queued(rx) => rx
          .await
          .unwrap_or_else(|_| Err(RatiError::cancelled("remote data wrapper was dropped"))),
      };
      shared.settle(request_id, result)
    })
  }

  /// Reject every queued caller with `reason` and clear the busy state.
  /// An invocation already in flight is not interrupted.
  pub fn cancel(&self, reason: &str) {
    let queue = {
      let mut inner = self.shared.inner.lock();
      inner.abort_timers();
      inner.latest_args = None;
      std::mem::take(&mut inner.queue)
    };
    debug!(callers = queue.len(), reason, "remote data cancelled");
    self.shared.set_busy(false, 0);
    for reply in queue {
      let _ = reply.send(Err(RatiError::cancelled(reason)));
    }
  }

  pub fn state(&self) -> &Observable<RemoteDataState> {
    &self.shared.state
  }

  pub fn is_ready(&self) -> bool {
    self.shared.state.with(RemoteDataState::is_ready)
  }

  pub fn button_props(&self) -> ButtonProps {
    self.shared.state.with(RemoteDataState::button_props)
  }

  /// Most recent result handed out. With the race guard, the result of the
  /// newest request seen so far.
  pub fn latest(&self) -> Option<T> {
    self.shared.inner.lock().latest_result.as_ref().map(|(_, value)| value.clone())
  }
}

impl<A, T> Shared<A, T>
where
  A: Send + 'static,
  T: Clone + Send + Sync + 'static,
{
  fn next_invoke_timeout(&self, inner: &Inner<A, T>) -> Duration {
    if let Some(max_wait) = self.max_wait {
      let since = inner.last_invoke.elapsed();
      if since + self.wait >= max_wait {
        return max_wait.saturating_sub(since);
      }
    }
    self.wait
  }

  /// Invoke timer callback.
  fn fire(&self, seq: u64) {
    let (queue, args) = {
      let mut inner = self.inner.lock();
      if inner.timer_seq != seq {
        return;
      }
      inner.invoke_timer = None;
      inner.last_invoke = Instant::now();
      (std::mem::take(&mut inner.queue), inner.latest_args.take())
    };
    // Nothing trails an immediate call.
    let Some(args) = args else {
      return;
    };

    debug!(callers = queue.len(), "remote data invoked");
    let result = spawn_eager((self.func)(args));
    spawn_detached(async move {
      let result = result.await;
      for reply in queue {
        let _ = reply.send(result.clone());
      }
    });
    self.state.update(|s| s.queued = 0);
  }

  fn settle(&self, request_id: u64, result: Result<T, RatiError>) -> Result<T, RatiError> {
    let (idle, result) = {
      let mut inner = self.inner.lock();
      let idle = inner.request_id == request_id && inner.queue.is_empty();
      let result = match result {
        Ok(value) => Ok(self.record(&mut inner, request_id, value)),
        Err(err) => Err(err),
      };
      (idle, result)
    };
    if idle {
      self.set_busy(false, 0);
    }
    result
  }

  fn record(&self, inner: &mut Inner<A, T>, request_id: u64, value: T) -> T {
    if self.race_guard
      && let Some((latest_id, latest)) = &inner.latest_result
      && request_id < *latest_id
    {
      debug!(request_id, latest_id, "stale result replaced");
      return latest.clone();
    }
    inner.latest_result = Some((request_id, value.clone()));
    value
  }

  fn set_busy(&self, busy: bool, queued: usize) {
    self.state.update(|s| {
      s.is_pending = busy;
      if !busy {
        s.indicate_pending = false;
      }
      s.queued = queued;
    });
  }
}

/// Wrap `f` and hand out only `key` of its object result.
pub fn remote_data_key<A, F, Fut>(
  f: F,
  key: &str,
  options: RemoteDataOptions,
) -> RemoteData<A, Value>
where
  A: Send + 'static,
  F: Fn(A) -> Fut + Send + Sync + 'static,
  Fut: Future<Output = Result<Value, RatiError>> + Send + 'static,
{
  let key = key.to_string();
  RemoteData::new(
    move |args: A| {
      let fut = f(args);
      let key = key.clone();
      async move {
        let mut value = fut.await?;
        match value.get_mut(&key) {
          Some(field) => Ok(field.take()),
          None => Err(RatiError::validation(format!("response has no key '{key}'"))),
        }
      }
    },
    options,
  )
}
