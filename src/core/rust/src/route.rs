/* src/core/rust/src/route.rs */

use std::collections::{BTreeMap, HashSet};
use std::sync::Arc;

use regex::Regex;
use tracing::warn;

use crate::errors::RatiError;
use crate::view::{Props, ViewChain};

/// Path of the catch-all entry.
pub const CATCH_ALL: &str = "*";

/// One entry of a route table.
///
/// `C` is whatever the host UI uses to name a renderable component.
#[derive(Debug, Clone)]
pub struct RouteDef<C> {
  name: String,
  path: String,
  pattern: Option<Regex>,
  component: C,
  view: Option<ViewChain>,
  wrapper: Option<C>,
}

/// Build a route entry. A `:name` placeholder runs to the end of its segment
/// and captures a non-empty value; text before it in the same segment must
/// match literally, so `/user-:id` matches `/user-5`. `*` matches every path.
pub fn route<C>(
  path: impl Into<String>,
  name: impl Into<String>,
  component: C,
) -> Result<RouteDef<C>, RatiError> {
  let path = path.into();
  let pattern = if path == CATCH_ALL { None } else { Some(compile_pattern(&path)?) };
  Ok(RouteDef { name: name.into(), path, pattern, component, view: None, wrapper: None })
}

/// Splits a segment at its first `:` into the literal prefix and the
/// placeholder name.
fn split_param(segment: &str) -> (&str, Option<&str>) {
  match segment.split_once(':') {
    Some((prefix, name)) => (prefix, Some(name)),
    None => (segment, None),
  }
}

fn is_valid_param_name(name: &str) -> bool {
  let mut chars = name.chars();
  matches!(chars.next(), Some(c) if c.is_ascii_alphabetic() || c == '_')
    && chars.all(|c| c.is_ascii_alphanumeric() || c == '_')
}

fn compile_pattern(path: &str) -> Result<Regex, RatiError> {
  let mut seen = HashSet::new();
  let mut segments = Vec::new();
  for segment in path.split('/') {
    match split_param(segment) {
      (prefix, Some(name)) => {
        if !is_valid_param_name(name) {
          return Err(RatiError::invalid_route(format!("invalid parameter ':{name}' in '{path}'")));
        }
        if !seen.insert(name) {
          return Err(RatiError::invalid_route(format!("duplicate parameter ':{name}' in '{path}'")));
        }
        segments.push(format!("{}(?P<{name}>[^/]+?)", regex::escape(prefix)));
      }
      (literal, None) => segments.push(regex::escape(literal)),
    }
  }
  let core = segments.join("/");
  // Both `/path` and `/path/` match unless the pattern already ends in a slash.
  let tail = if core.ends_with('/') { "$" } else { "/?$" };
  Regex::new(&format!("^{core}{tail}"))
    .map_err(|e| RatiError::invalid_route(format!("cannot compile '{path}': {e}")))
}

impl<C> RouteDef<C> {
  pub fn with_view(mut self, view: ViewChain) -> Self {
    self.view = Some(view);
    self
  }

  pub fn with_wrapper(mut self, wrapper: C) -> Self {
    self.wrapper = Some(wrapper);
    self
  }

  pub fn name(&self) -> &str {
    &self.name
  }

  pub fn path(&self) -> &str {
    &self.path
  }

  pub fn component(&self) -> &C {
    &self.component
  }

  pub fn view(&self) -> Option<&ViewChain> {
    self.view.as_ref()
  }

  pub fn wrapper(&self) -> Option<&C> {
    self.wrapper.as_ref()
  }

  pub fn is_catch_all(&self) -> bool {
    self.pattern.is_none()
  }

  /// Parameter names in path order.
  pub fn param_names(&self) -> Vec<&str> {
    self.path.split('/').filter_map(|segment| split_param(segment).1).collect()
  }

  /// Extracted parameters when `path` matches this entry.
  pub fn matches(&self, path: &str) -> Option<BTreeMap<String, String>> {
    let Some(pattern) = &self.pattern else {
      return Some(BTreeMap::new());
    };
    let caps = pattern.captures(path)?;
    Some(
      pattern
        .capture_names()
        .flatten()
        .filter_map(|name| caps.name(name).map(|m| (name.to_string(), m.as_str().to_string())))
        .collect(),
    )
  }

  /// Fill the path template with `params`.
  pub fn build_path(&self, params: &BTreeMap<String, String>) -> Result<String, RatiError> {
    let segments = self
      .path
      .split('/')
      .map(|segment| match split_param(segment) {
        (prefix, Some(name)) => match params.get(name) {
          Some(value) => Ok(format!("{prefix}{value}")),
          None => {
            Err(RatiError::validation(format!("route '{}' requires parameter '{name}'", self.name)))
          }
        },
        (literal, None) => Ok(literal.to_string()),
      })
      .collect::<Result<Vec<_>, _>>()?;
    Ok(segments.join("/"))
  }
}

/// A matched entry plus the parameters extracted from the path.
#[derive(Debug)]
pub struct RouteMatch<C> {
  pub route: Arc<RouteDef<C>>,
  pub params: BTreeMap<String, String>,
  /// Changes on every navigation that was not suppressed, so consumers can
  /// tell two visits of the same path apart.
  pub key: u64,
}

impl<C> Clone for RouteMatch<C> {
  fn clone(&self) -> Self {
    Self { route: Arc::clone(&self.route), params: self.params.clone(), key: self.key }
  }
}

impl<C> RouteMatch<C> {
  pub fn name(&self) -> &str {
    self.route.name()
  }

  /// Route parameters as component props.
  pub fn props(&self) -> Props {
    self
      .params
      .iter()
      .map(|(key, value)| (key.clone(), serde_json::Value::String(value.clone())))
      .collect()
  }
}

/// Named route reference with its parameters.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct RouteRef {
  pub name: String,
  pub params: BTreeMap<String, String>,
}

impl RouteRef {
  pub fn new(name: impl Into<String>) -> Self {
    Self { name: name.into(), params: BTreeMap::new() }
  }

  pub fn param(mut self, key: impl Into<String>, value: impl ToString) -> Self {
    self.params.insert(key.into(), value.to_string());
    self
  }
}

/// Where to navigate: a raw path or a named route.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum Target {
  Path(String),
  Route(RouteRef),
}

impl From<&str> for Target {
  fn from(path: &str) -> Self {
    Self::Path(path.to_string())
  }
}

impl From<String> for Target {
  fn from(path: String) -> Self {
    Self::Path(path)
  }
}

impl From<RouteRef> for Target {
  fn from(route: RouteRef) -> Self {
    Self::Route(route)
  }
}

/// Ordered routes. Table order is the only matching priority.
#[derive(Debug)]
pub struct RouteTable<C> {
  routes: Vec<Arc<RouteDef<C>>>,
}

impl<C> Clone for RouteTable<C> {
  fn clone(&self) -> Self {
    Self { routes: self.routes.clone() }
  }
}

impl<C> RouteTable<C> {
  pub fn new(routes: Vec<RouteDef<C>>) -> Result<Self, RatiError> {
    let mut names = HashSet::new();
    for route in &routes {
      if !names.insert(route.name.as_str()) {
        return Err(RatiError::invalid_route(format!("duplicate route name '{}'", route.name)));
      }
    }
    match routes.iter().position(RouteDef::is_catch_all) {
      None => warn!("route table has no catch-all entry, unmatched paths render nothing"),
      Some(index) if index + 1 != routes.len() => {
        warn!(route = %routes[index].name, "catch-all route is not last, later routes are unreachable");
      }
      Some(_) => {}
    }
    Ok(Self { routes: routes.into_iter().map(Arc::new).collect() })
  }

  pub fn routes(&self) -> &[Arc<RouteDef<C>>] {
    &self.routes
  }

  pub fn get(&self, name: &str) -> Option<&Arc<RouteDef<C>>> {
    self.routes.iter().find(|route| route.name == name)
  }

  /// First entry matching `path`, tagged with `key`.
  pub fn match_path(&self, path: &str, key: u64) -> Option<RouteMatch<C>> {
    self.routes.iter().find_map(|route| {
      route.matches(path).map(|params| RouteMatch { route: Arc::clone(route), params, key })
    })
  }

  pub fn get_path(&self, route: &RouteRef) -> Result<String, RatiError> {
    let def = self.get(&route.name).ok_or_else(|| RatiError::route_not_found(&route.name))?;
    def.build_path(&route.params)
  }

  pub fn target_path(&self, target: &Target) -> Result<String, RatiError> {
    match target {
      Target::Path(path) => Ok(path.clone()),
      Target::Route(route) => self.get_path(route),
    }
  }
}
