/* src/core/rust/src/loader.rs */

use std::sync::Arc;
use std::sync::atomic::{AtomicU64, Ordering};

use parking_lot::Mutex;
use tracing::{debug, error};

use crate::errors::RatiError;
use crate::reactive::Observable;
use crate::task::spawn_detached;
use crate::view::{Props, ViewChain, resolve_view};

#[derive(Debug, Clone, PartialEq)]
pub enum LoadState {
  Idle,
  Loading,
  Ready(Props),
  Failed(RatiError),
}

impl LoadState {
  pub fn is_settled(&self) -> bool {
    matches!(self, Self::Ready(_) | Self::Failed(_))
  }
}

/// What a loader shows for the current parameters.
#[derive(Debug, Clone, PartialEq)]
pub enum Rendered<C> {
  Loading(C),
  Component { component: C, props: Props },
}

struct Inner {
  last_params: Mutex<Option<Props>>,
  generation: AtomicU64,
  state: Observable<LoadState>,
}

/// Resolves a route's view chain and decides between the loading
/// placeholder and the target component.
///
/// Resolution starts whenever `render` sees parameters structurally
/// different from the previous ones. Only the newest resolution may
/// publish; results of superseded ones are dropped. A failed resolution
/// keeps the placeholder on screen and is exposed through `state`.
pub struct ViewLoader<C> {
  component: C,
  view: Option<ViewChain>,
  loading: C,
  inner: Arc<Inner>,
}

impl<C: Clone> ViewLoader<C> {
  pub fn new(component: C, view: Option<ViewChain>, loading: C) -> Self {
    Self {
      component,
      view,
      loading,
      inner: Arc::new(Inner {
        last_params: Mutex::new(None),
        generation: AtomicU64::new(0),
        state: Observable::new(LoadState::Idle),
      }),
    }
  }

  pub fn state(&self) -> &Observable<LoadState> {
    &self.inner.state
  }

  /// Resolves once the latest resolution has finished.
  pub async fn settled(&self) -> LoadState {
    self.inner.state.wait_until(LoadState::is_settled).await
  }

  pub fn render(&self, params: &Props) -> Rendered<C> {
    let Some(view) = &self.view else {
      return Rendered::Component { component: self.component.clone(), props: params.clone() };
    };

    if self.params_changed(params) {
      self.start(view.clone(), params.clone());
    }

    match self.inner.state.get() {
      LoadState::Ready(props) => Rendered::Component { component: self.component.clone(), props },
      _ => Rendered::Loading(self.loading.clone()),
    }
  }

  fn params_changed(&self, params: &Props) -> bool {
    let mut last = self.inner.last_params.lock();
    if last.as_ref() == Some(params) {
      return false;
    }
    *last = Some(params.clone());
    true
  }

  fn start(&self, view: ViewChain, params: Props) {
    let generation = self.inner.generation.fetch_add(1, Ordering::SeqCst) + 1;
    self.inner.state.set(LoadState::Loading);
    debug!(generation, "view load started");

    let inner = Arc::clone(&self.inner);
    spawn_detached(async move {
      let result = resolve_view(&view, &params).await;
      if inner.generation.load(Ordering::SeqCst) != generation {
        debug!(generation, "stale view load dropped");
        return;
      }
      match result {
        Ok(props) => inner.state.set(LoadState::Ready(props)),
        Err(err) => {
          error!(generation, error = %err, "view load failed");
          inner.state.set(LoadState::Failed(err));
        }
      }
    });
  }
}

#[cfg(test)]
mod tests {
  use std::sync::atomic::AtomicUsize;
  use std::time::Duration;

  use serde_json::{Value, json};

  use super::*;
  use crate::view::{Rule, ViewDef, create_view};

  fn params(value: Value) -> Props {
    Props::from_json(value)
  }

  fn counted_view(calls: &Arc<AtomicUsize>) -> ViewChain {
    let calls = Arc::clone(calls);
    create_view(ViewDef::new().rule("q", Rule::param::<String>())).chain(ViewDef::new().rule(
      "title",
      Rule::func(move |props| {
        calls.fetch_add(1, Ordering::SeqCst);
        async move {
          let q = props.get("q").and_then(Value::as_str).unwrap_or_default().to_string();
          let delay = if q == "slow" { 500 } else { 10 };
          tokio::time::sleep(Duration::from_millis(delay)).await;
          Ok::<_, RatiError>(format!("results for {q}"))
        }
      }),
    ))
  }

  #[test]
  fn without_a_view_params_are_the_props() {
    let loader = ViewLoader::new("Page", None, "Spinner");
    let input = params(json!({ "id": "5" }));
    assert_eq!(loader.render(&input), Rendered::Component { component: "Page", props: input.clone() });
  }

  #[tokio::test(start_paused = true)]
  async fn shows_loading_until_resolved() {
    let calls = Arc::new(AtomicUsize::new(0));
    let loader = ViewLoader::new("Page", Some(counted_view(&calls)), "Spinner");
    let input = params(json!({ "q": "tea" }));

    assert_eq!(loader.render(&input), Rendered::Loading("Spinner"));
    assert_eq!(loader.state().get(), LoadState::Loading);

    loader.settled().await;
    let Rendered::Component { component, props } = loader.render(&input) else {
      panic!("expected the component");
    };
    assert_eq!(component, "Page");
    assert_eq!(props["title"], json!("results for tea"));
    assert_eq!(calls.load(Ordering::SeqCst), 1);
  }

  #[tokio::test(start_paused = true)]
  async fn equal_params_do_not_resolve_again() {
    let calls = Arc::new(AtomicUsize::new(0));
    let loader = ViewLoader::new("Page", Some(counted_view(&calls)), "Spinner");

    loader.render(&params(json!({ "q": "tea" })));
    loader.settled().await;
    loader.render(&params(json!({ "q": "tea" })));
    loader.render(&params(json!({ "q": "tea" })));
    assert_eq!(calls.load(Ordering::SeqCst), 1);

    assert_eq!(loader.render(&params(json!({ "q": "coffee" }))), Rendered::Loading("Spinner"));
    loader.settled().await;
    assert_eq!(calls.load(Ordering::SeqCst), 2);
  }

  #[tokio::test(start_paused = true)]
  async fn only_the_latest_resolution_publishes() {
    let calls = Arc::new(AtomicUsize::new(0));
    let loader = ViewLoader::new("Page", Some(counted_view(&calls)), "Spinner");

    loader.render(&params(json!({ "q": "slow" })));
    loader.render(&params(json!({ "q": "fast" })));
    loader.settled().await;
    tokio::time::sleep(Duration::from_millis(1000)).await;

    let Rendered::Component { props, .. } = loader.render(&params(json!({ "q": "fast" }))) else {
      panic!("expected the component");
    };
    assert_eq!(props["title"], json!("results for fast"));
    assert_eq!(calls.load(Ordering::SeqCst), 2);
  }

  #[tokio::test]
  async fn failures_keep_the_placeholder() {
    let view = create_view(
      ViewDef::new()
        .rule("x", Rule::func(|_| async { Err::<u8, _>(RatiError::resolution("backend down")) })),
    );
    let loader = ViewLoader::new("Page", Some(view), "Spinner");
    let input = Props::new();

    loader.render(&input);
    let LoadState::Failed(err) = loader.settled().await else {
      panic!("expected a failure");
    };
    assert_eq!(err.message(), "backend down");
    assert_eq!(loader.render(&input), Rendered::Loading("Spinner"));
  }
}
