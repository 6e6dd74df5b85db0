/* src/core/rust/src/task.rs */

use std::future::Future;
use std::pin::Pin;

use futures_util::FutureExt;
use tokio::runtime::Handle;

use crate::errors::RatiError;

pub type BoxFuture<T> = Pin<Box<dyn Future<Output = T> + Send>>;

/// Start `fut` now on the ambient tokio runtime and return a handle future
/// for its output. Dropping the returned future detaches the task; it keeps
/// running to completion.
///
/// Outside a runtime the future is returned unstarted and runs when first
/// polled.
pub(crate) fn spawn_eager<T, F>(fut: F) -> BoxFuture<Result<T, RatiError>>
where
  T: Send + 'static,
  F: Future<Output = Result<T, RatiError>> + Send + 'static,
{
  match Handle::try_current() {
    Ok(handle) => {
      let join = handle.spawn(fut);
      Box::pin(join.map(|joined| match joined {
        Ok(result) => result,
        Err(err) => Err(RatiError::from(err)),
      }))
    }
    Err(_) => Box::pin(fut),
  }
}

/// Fire-and-forget on the ambient runtime. Without a runtime the future is
/// polled once; anything it has not finished by then is dropped.
pub(crate) fn spawn_detached<F>(fut: F)
where
  F: Future<Output = ()> + Send + 'static,
{
  match Handle::try_current() {
    Ok(handle) => {
      handle.spawn(fut);
    }
    Err(_) => {
      let _ = fut.now_or_never();
    }
  }
}
