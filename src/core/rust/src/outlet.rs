/* src/core/rust/src/outlet.rs */

use std::sync::Arc;

use parking_lot::Mutex;
use tracing::debug;

use crate::loader::{LoadState, Rendered, ViewLoader};
use crate::router::RouterStore;
use crate::view::Props;

/// Render output of a [`RouterOutlet`].
#[derive(Debug, Clone, PartialEq)]
pub enum Outlet<C> {
  /// No route matched.
  Empty,
  Loading { wrapper: C, loading: C, key: u64 },
  Ready { wrapper: C, component: C, props: Props, key: u64 },
}

impl<C> Outlet<C> {
  pub fn key(&self) -> Option<u64> {
    match self {
      Self::Empty => None,
      Self::Loading { key, .. } | Self::Ready { key, .. } => Some(*key),
    }
  }
}

/// Renders the router's active route inside its wrapper.
///
/// Routes with a view chain go through a [`ViewLoader`]; a new loader is
/// created for every render key, so each navigation starts from the
/// loading placeholder.
pub struct RouterOutlet<C> {
  router: Arc<RouterStore<C>>,
  default_wrapper: C,
  loading: C,
  loader: Mutex<Option<(u64, ViewLoader<C>)>>,
}

impl<C: Clone + Send + Sync + 'static> RouterOutlet<C> {
  pub fn new(router: Arc<RouterStore<C>>, default_wrapper: C, loading: C) -> Self {
    Self { router, default_wrapper, loading, loader: Mutex::new(None) }
  }

  pub fn router(&self) -> &Arc<RouterStore<C>> {
    &self.router
  }

  pub fn render(&self) -> Outlet<C> {
    let Some(active) = self.router.current_route() else {
      debug!("nothing to render");
      self.loader.lock().take();
      return Outlet::Empty;
    };

    let route = &active.route;
    let wrapper = route.wrapper().unwrap_or(&self.default_wrapper).clone();
    let key = active.key;
    let params = active.props();

    let Some(view) = route.view() else {
      return Outlet::Ready { wrapper, component: route.component().clone(), props: params, key };
    };

    let mut slot = self.loader.lock();
    let loader = match slot.take() {
      Some((loader_key, loader)) if loader_key == key => loader,
      _ => ViewLoader::new(route.component().clone(), Some(view.clone()), self.loading.clone()),
    };
    let rendered = loader.render(&params);
    *slot = Some((key, loader));

    match rendered {
      Rendered::Loading(loading) => Outlet::Loading { wrapper, loading, key },
      Rendered::Component { component, props } => Outlet::Ready { wrapper, component, props, key },
    }
  }

  /// Resolves once the current route's view has finished loading. Returns
  /// immediately when nothing is loading.
  pub async fn settled(&self) -> Option<LoadState> {
    let state = self.loader.lock().as_ref().map(|(_, loader)| loader.state().clone());
    match state {
      Some(state) => Some(state.wait_until(LoadState::is_settled).await),
      None => None,
    }
  }
}

#[cfg(test)]
mod tests {
  use serde_json::{Value, json};

  use super::*;
  use crate::history::MemoryHistory;
  use crate::route::{RouteTable, route};
  use crate::router::Navigator;
  use crate::view::{Rule, ViewDef, create_view};

  fn outlet_at(path: &str) -> RouterOutlet<&'static str> {
    let product = create_view(ViewDef::new().rule("id", Rule::param::<String>())).chain(
      ViewDef::new().rule(
        "title",
        Rule::map(|props| {
          let id = props.get("id").and_then(Value::as_str).unwrap_or_default();
          Ok(format!("Product {id}"))
        }),
      ),
    );
    let table = RouteTable::new(vec![
      route("/", "home", "Home").unwrap().with_wrapper("Landing"),
      route("/product/:id", "product", "Product").unwrap().with_view(product),
      route("/none", "none", "Never").unwrap(),
    ])
    .unwrap();
    let router = RouterStore::new(table, Arc::new(MemoryHistory::new(path)));
    RouterOutlet::new(router, "Fragment", "Spinner")
  }

  #[tokio::test]
  async fn empty_until_a_route_is_active() {
    let outlet = outlet_at("/");
    assert_eq!(outlet.render(), Outlet::Empty);
    tokio::task::yield_now().await;
    assert!(matches!(outlet.render(), Outlet::Ready { component: "Home", wrapper: "Landing", .. }));
  }

  #[tokio::test]
  async fn routes_without_views_get_their_params() {
    let outlet = outlet_at("/");
    tokio::task::yield_now().await;
    let Outlet::Ready { props, wrapper, .. } = outlet.render() else {
      panic!("expected a ready outlet");
    };
    assert!(props.is_empty());
    assert_eq!(wrapper, "Landing");
  }

  #[tokio::test]
  async fn views_load_behind_the_placeholder() {
    let outlet = outlet_at("/");
    tokio::task::yield_now().await;
    outlet.router().push("/product/9".into()).unwrap();

    let Outlet::Loading { wrapper, loading, key } = outlet.render() else {
      panic!("expected the placeholder");
    };
    assert_eq!((wrapper, loading), ("Fragment", "Spinner"));

    outlet.settled().await;
    let Outlet::Ready { component, props, key: ready_key, .. } = outlet.render() else {
      panic!("expected the component");
    };
    assert_eq!(component, "Product");
    assert_eq!(props["title"], json!("Product 9"));
    assert_eq!(key, ready_key);
  }

  #[tokio::test]
  async fn every_navigation_gets_a_fresh_loader() {
    let outlet = outlet_at("/product/1");
    tokio::task::yield_now().await;
    outlet.render();
    outlet.settled().await;
    let first_key = outlet.render().key();

    outlet.router().push("/product/2".into()).unwrap();
    let next = outlet.render();
    assert!(matches!(next, Outlet::Loading { .. }));
    assert_ne!(next.key(), first_key);

    outlet.settled().await;
    let Outlet::Ready { props, .. } = outlet.render() else {
      panic!("expected the component");
    };
    assert_eq!(props["title"], json!("Product 2"));
  }

  #[tokio::test]
  async fn unmatched_paths_render_nothing() {
    let outlet = outlet_at("/");
    tokio::task::yield_now().await;
    outlet.router().push("/missing".into()).unwrap();
    assert_eq!(outlet.render(), Outlet::Empty);
    assert!(outlet.settled().await.is_none());
  }
}
