/* src/core/rust/src/router.rs */

use std::sync::atomic::{AtomicU64, Ordering};
use std::sync::{Arc, Weak};

use serde_json::{Value, json};
use tracing::debug;
use uuid::Uuid;

use crate::errors::RatiError;
use crate::history::{History, ListenerId, Location};
use crate::reactive::Observable;
use crate::route::{RouteMatch, RouteRef, RouteTable, Target};
use crate::task::spawn_detached;

/// Navigation surface shared by links, redirects and store contexts,
/// independent of the component type of the route table.
pub trait Navigator: Send + Sync {
  /// Current pathname.
  fn path(&self) -> String;

  fn get_path(&self, route: &RouteRef) -> Result<String, RatiError>;

  fn target_path(&self, target: &Target) -> Result<String, RatiError>;

  /// Whether `href` points at the current path. Query, fragment and a
  /// trailing slash are ignored.
  fn is_path(&self, href: &str) -> bool;

  /// New history entry; the route reloads.
  fn push(&self, target: Target) -> Result<(), RatiError>;

  /// Same as `push`, logged as a redirect.
  fn redirect(&self, target: Target) -> Result<(), RatiError>;

  /// Rewrite the current entry without reloading the active route.
  fn replace(&self, target: Target) -> Result<(), RatiError>;
}

pub type ActiveRoute<C> = Option<Arc<RouteMatch<C>>>;

/// Tracks the history location and publishes the matching route.
///
/// `path` follows every navigation. `active_route` is replaced wholesale on
/// each navigation except when the path did not change or the navigation
/// was a `replace` issued by this store. Each published match carries the
/// navigation counter as its `key`.
pub struct RouterStore<C> {
  routes: RouteTable<C>,
  history: Arc<dyn History>,
  listener: ListenerId,
  path: Observable<String>,
  active_route: Observable<ActiveRoute<C>>,
  path_counter: AtomicU64,
  session_id: Uuid,
}

fn normalize(path: &str) -> &str {
  match path.trim_end_matches('/') {
    "" => "/",
    trimmed => trimmed,
  }
}

impl<C: Send + Sync + 'static> RouterStore<C> {
  /// Subscribe to `history`, set `path` from its current location right
  /// away and publish the first active route from a spawned task.
  pub fn new(routes: RouteTable<C>, history: Arc<dyn History>) -> Arc<Self> {
    let router = Arc::new_cyclic(|weak: &Weak<Self>| {
      let weak = weak.clone();
      let listener = history.listen(Arc::new(move |location: &Location| {
        if let Some(router) = weak.upgrade() {
          router.set_path(location);
        }
      }));
      Self {
        routes,
        history: Arc::clone(&history),
        listener,
        path: Observable::new(String::new()),
        active_route: Observable::new(None),
        path_counter: AtomicU64::new(0),
        session_id: Uuid::new_v4(),
      }
    });

    let location = router.history.location();
    if let Some(key) = router.apply_location(&location) {
      let weak = Arc::downgrade(&router);
      spawn_detached(async move {
        let Some(router) = weak.upgrade() else {
          return;
        };
        // A navigation that happened meanwhile has already published.
        if router.path_counter.load(Ordering::SeqCst) == key {
          router.publish(&location.pathname, key);
        }
      });
    }
    router
  }

  pub fn routes(&self) -> &RouteTable<C> {
    &self.routes
  }

  pub fn history(&self) -> &Arc<dyn History> {
    &self.history
  }

  /// Reactive current pathname.
  pub fn path_cell(&self) -> &Observable<String> {
    &self.path
  }

  /// Reactive active route. `None` before the first match and when no
  /// entry matches.
  pub fn active_route(&self) -> &Observable<ActiveRoute<C>> {
    &self.active_route
  }

  pub fn current_route(&self) -> ActiveRoute<C> {
    self.active_route.get()
  }

  fn set_path(&self, location: &Location) {
    if let Some(key) = self.apply_location(location) {
      self.publish(&location.pathname, key);
    }
  }

  /// Update `path` for a new location. Returns the render key when the
  /// active route has to be recomputed.
  fn apply_location(&self, location: &Location) -> Option<u64> {
    let current = self.path_counter.fetch_add(1, Ordering::SeqCst);

    if self.path.with(|path| *path == location.pathname) {
      debug!(path = %location.pathname, "same path, route kept");
      return None;
    }
    self.path.set(location.pathname.clone());

    let token = self.skip_token(current);
    if location.state_key("skip").and_then(Value::as_str) == Some(token.as_str()) {
      debug!(path = %location.pathname, "replaced path, route kept");
      return None;
    }
    Some(current + 1)
  }

  fn publish(&self, path: &str, key: u64) {
    let matched = self.routes.match_path(path, key);
    match &matched {
      Some(hit) => debug!(path, route = hit.name(), key, "route matched"),
      None => debug!(path, "no route matched"),
    }
    self.active_route.set(matched.map(Arc::new));
  }

  fn skip_token(&self, counter: u64) -> String {
    format!("{counter}/{}", self.session_id)
  }
}

impl<C: Send + Sync + 'static> Navigator for RouterStore<C> {
  fn path(&self) -> String {
    self.path.get()
  }

  fn get_path(&self, route: &RouteRef) -> Result<String, RatiError> {
    self.routes.get_path(route)
  }

  fn target_path(&self, target: &Target) -> Result<String, RatiError> {
    self.routes.target_path(target)
  }

  fn is_path(&self, href: &str) -> bool {
    let href = Location::parse(href, None);
    self.path.with(|path| normalize(path) == normalize(&href.pathname))
  }

  fn push(&self, target: Target) -> Result<(), RatiError> {
    let path = self.target_path(&target)?;
    debug!(%path, "push");
    self.history.push(&path, None);
    Ok(())
  }

  fn redirect(&self, target: Target) -> Result<(), RatiError> {
    let path = self.target_path(&target)?;
    debug!(%path, "redirect");
    self.history.push(&path, None);
    Ok(())
  }

  fn replace(&self, target: Target) -> Result<(), RatiError> {
    let path = self.target_path(&target)?;
    let token = self.skip_token(self.path_counter.load(Ordering::SeqCst));
    debug!(%path, "replace");
    self.history.replace(&path, Some(json!({ "skip": token })));
    Ok(())
  }
}

impl<C> Drop for RouterStore<C> {
  fn drop(&mut self) {
    self.history.unlisten(self.listener);
  }
}
