/* src/core/rust/src/store.rs */

use std::any::{Any, TypeId, type_name};
use std::collections::HashMap;
use std::future::Future;
use std::sync::Arc;

use tracing::debug;

use crate::config::RootConfig;
use crate::errors::RatiError;
use crate::link::{LinkContext, use_link_context};
use crate::reactive::Observable;
use crate::router::Navigator;
use crate::task::BoxFuture;

type AnyStore = Arc<dyn Any + Send + Sync>;

pub type HydrateHook = Arc<dyn Fn(GlobalStores) -> BoxFuture<Result<(), RatiError>> + Send + Sync>;

/// Application-wide stores, looked up by type. The router has its own slot
/// because links and redirects only need its navigation surface.
#[derive(Clone, Default)]
pub struct GlobalStores {
  router: Option<Arc<dyn Navigator>>,
  stores: HashMap<TypeId, AnyStore>,
}

impl GlobalStores {
  pub fn new() -> Self {
    Self::default()
  }

  pub fn with_router(mut self, router: Arc<dyn Navigator>) -> Self {
    self.router = Some(router);
    self
  }

  /// Register `store`, replacing any store of the same type.
  pub fn with_store<T: Any + Send + Sync>(mut self, store: Arc<T>) -> Self {
    self.stores.insert(TypeId::of::<T>(), store);
    self
  }

  pub fn router(&self) -> Option<&Arc<dyn Navigator>> {
    self.router.as_ref()
  }

  pub fn get<T: Any + Send + Sync>(&self) -> Option<Arc<T>> {
    let store = self.stores.get(&TypeId::of::<T>())?;
    Arc::clone(store).downcast::<T>().ok()
  }

  pub fn len(&self) -> usize {
    self.stores.len()
  }

  pub fn is_empty(&self) -> bool {
    self.stores.is_empty() && self.router.is_none()
  }
}

/// Owns the global stores and gates rendering on hydration.
pub struct RootStore {
  stores: GlobalStores,
  hooks: Vec<HydrateHook>,
  is_ready: Observable<bool>,
  config: RootConfig,
}

impl RootStore {
  pub fn new(stores: GlobalStores) -> Self {
    Self::with_config(stores, RootConfig::default())
  }

  pub fn with_config(stores: GlobalStores, config: RootConfig) -> Self {
    Self { stores, hooks: Vec::new(), is_ready: Observable::new(false), config }
  }

  /// Run `hook` during `init`, in registration order.
  pub fn on_hydrate<F, Fut>(mut self, hook: F) -> Self
  where
    F: Fn(GlobalStores) -> Fut + Send + Sync + 'static,
    Fut: Future<Output = Result<(), RatiError>> + Send + 'static,
  {
    self.hooks.push(Arc::new(move |stores: GlobalStores| -> BoxFuture<Result<(), RatiError>> {
      Box::pin(hook(stores))
    }));
    self
  }

  pub fn global_stores(&self) -> &GlobalStores {
    &self.stores
  }

  pub fn is_ready(&self) -> &Observable<bool> {
    &self.is_ready
  }

  /// Hydrate the stores, then mark the root ready. The first failing hook
  /// aborts initialisation and the root stays not ready.
  pub async fn init(&self) -> Result<(), RatiError> {
    debug!(hooks = self.hooks.len(), "hydrating stores");
    for hook in &self.hooks {
      hook(self.stores.clone()).await?;
    }
    self.is_ready.set_if_changed(true);
    debug!("stores ready");
    Ok(())
  }

  /// Context for the component tree, or `None` while hydration is pending.
  pub fn provide(&self) -> Option<StoreContext> {
    if self.config.wait_for_hydration && !self.is_ready.get() {
      return None;
    }
    Some(StoreContext { stores: self.stores.clone(), link: None })
  }
}

/// What descendants of the root can reach.
#[derive(Clone)]
pub struct StoreContext {
  stores: GlobalStores,
  link: Option<LinkContext>,
}

impl StoreContext {
  pub fn stores(&self) -> &GlobalStores {
    &self.stores
  }

  pub fn router(&self) -> Result<Arc<dyn Navigator>, RatiError> {
    self.stores.router().cloned().ok_or_else(|| {
      RatiError::missing_context("Please add a router to the global stores to use link components")
    })
  }

  pub fn store<T: Any + Send + Sync>(&self) -> Result<Arc<T>, RatiError> {
    self.stores.get::<T>().ok_or_else(|| {
      RatiError::missing_context(format!("Store {} is not registered in the global stores", type_name::<T>()))
    })
  }

  /// Child context whose contextual links point at `link`.
  pub fn with_link_context(&self, link: LinkContext) -> Self {
    Self { stores: self.stores.clone(), link: Some(link) }
  }

  pub fn link_context(&self) -> Result<&LinkContext, RatiError> {
    use_link_context(self.link.as_ref())
  }
}

/// Unwrap the context handed down from [`RootStore::provide`].
pub fn use_stores(context: Option<&StoreContext>) -> Result<&StoreContext, RatiError> {
  context.ok_or_else(|| RatiError::missing_context("Store context is undefined. Use RootStore::provide"))
}
