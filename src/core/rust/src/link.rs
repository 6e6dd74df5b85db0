/* src/core/rust/src/link.rs */

use std::sync::Arc;

use tracing::debug;

use crate::config::LinkConfig;
use crate::errors::RatiError;
use crate::route::Target;
use crate::router::Navigator;

/// Pointer event as seen by an anchor's click handler.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq)]
pub struct ClickEvent {
  /// 0 is the primary button.
  pub button: u16,
  pub meta_key: bool,
  pub alt_key: bool,
  pub ctrl_key: bool,
  pub shift_key: bool,
  pub default_prevented: bool,
}

impl ClickEvent {
  pub fn primary() -> Self {
    Self::default()
  }

  pub fn is_modified(&self) -> bool {
    self.meta_key || self.alt_key || self.ctrl_key || self.shift_key
  }

  /// Only plain primary clicks nobody has handled yet become client-side
  /// navigation. Everything else is left to the browser.
  pub fn should_intercept(&self) -> bool {
    !self.default_prevented && self.button == 0 && !self.is_modified()
  }
}

/// Content shown depending on whether the link is active.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct LinkContent {
  pub normal: String,
  pub active: String,
}

#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct LinkOptions {
  pub class_name: Option<String>,
  /// Overrides the factory's active class.
  pub active_class_name: Option<String>,
  pub content: Option<LinkContent>,
  /// Takes precedence over `content`.
  pub children: Option<String>,
}

/// A rendered link.
pub struct Anchor {
  pub href: String,
  pub class_name: String,
  pub is_active: bool,
  pub content: Option<String>,
  navigator: Arc<dyn Navigator>,
}

impl std::fmt::Debug for Anchor {
  fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
    f.debug_struct("Anchor")
      .field("href", &self.href)
      .field("class_name", &self.class_name)
      .field("is_active", &self.is_active)
      .field("content", &self.content)
      .finish()
  }
}

impl Anchor {
  /// Handle a click. Returns whether it was turned into a push, in which
  /// case the event is marked as default-prevented. A failed push leaves
  /// the event untouched.
  pub fn on_click(&self, event: &mut ClickEvent) -> Result<bool, RatiError> {
    if !event.should_intercept() {
      return Ok(false);
    }
    debug!(href = %self.href, "link clicked");
    self.navigator.push(Target::Path(self.href.clone()))?;
    event.default_prevented = true;
    Ok(true)
  }
}

/// Target shared by every contextual link below it.
#[derive(Clone)]
pub struct LinkContext {
  navigator: Arc<dyn Navigator>,
  to: Target,
}

impl LinkContext {
  pub fn new(navigator: Arc<dyn Navigator>, to: impl Into<Target>) -> Self {
    Self { navigator, to: to.into() }
  }

  pub fn href(&self) -> Result<String, RatiError> {
    self.navigator.target_path(&self.to)
  }

  pub fn is_active(&self) -> Result<bool, RatiError> {
    Ok(self.navigator.is_path(&self.href()?))
  }
}

pub fn use_link_context(context: Option<&LinkContext>) -> Result<&LinkContext, RatiError> {
  context.ok_or_else(|| {
    RatiError::missing_context("Link context is not enabled. Provide a LinkContext for contextual links")
  })
}

/// Builds anchors that share a component class.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct LinkFactory {
  component_class: Option<String>,
  active_class_name: String,
}

pub fn create_link_component(component_class: Option<&str>) -> LinkFactory {
  LinkFactory::new(component_class, &LinkConfig::default())
}

impl LinkFactory {
  pub fn new(component_class: Option<&str>, config: &LinkConfig) -> Self {
    Self {
      component_class: component_class.map(str::to_string),
      active_class_name: config.active_class_name.clone(),
    }
  }

  pub fn link(
    &self,
    navigator: &Arc<dyn Navigator>,
    to: impl Into<Target>,
    options: LinkOptions,
  ) -> Result<Anchor, RatiError> {
    let href = navigator.target_path(&to.into())?;
    let is_active = navigator.is_path(&href);
    Ok(self.anchor(Arc::clone(navigator), href, is_active, options))
  }

  /// A link whose target comes from the enclosing [`LinkContext`].
  pub fn contextual_link(
    &self,
    context: Option<&LinkContext>,
    options: LinkOptions,
  ) -> Result<Anchor, RatiError> {
    let context = use_link_context(context)?;
    let href = context.href()?;
    let is_active = context.navigator.is_path(&href);
    Ok(self.anchor(Arc::clone(&context.navigator), href, is_active, options))
  }

  fn anchor(
    &self,
    navigator: Arc<dyn Navigator>,
    href: String,
    is_active: bool,
    options: LinkOptions,
  ) -> Anchor {
    let active_class =
      is_active.then(|| options.active_class_name.clone().unwrap_or_else(|| self.active_class_name.clone()));
    let class_name = [self.component_class.clone(), options.class_name, active_class]
      .into_iter()
      .flatten()
      .filter(|class| !class.is_empty())
      .collect::<Vec<_>>()
      .join(" ");
    let content = options
      .children
      .or_else(|| options.content.map(|c| if is_active { c.active } else { c.normal }));
    Anchor { href, class_name, is_active, content, navigator }
  }
}

/// Navigates away as soon as it is rendered.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Redirect {
  pub to: Target,
}

impl Redirect {
  pub fn new(to: impl Into<Target>) -> Self {
    Self { to: to.into() }
  }

  pub fn render(&self, navigator: &dyn Navigator) -> Result<(), RatiError> {
    navigator.redirect(self.to.clone())
  }
}
