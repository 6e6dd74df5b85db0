/* src/core/rust/src/view/chain.rs */

use std::collections::BTreeSet;
use std::sync::Arc;

use indexmap::IndexMap;
use serde_json::Value;

use super::props::Props;
use super::rule::Rule;

/// One layer: named production rules in definition order.
#[derive(Debug, Clone, Default)]
pub struct ViewDef {
  rules: IndexMap<String, Rule>,
}

impl ViewDef {
  pub fn new() -> Self {
    Self::default()
  }

  /// Add a rule. Redefining a key replaces its rule in place.
  pub fn rule(mut self, key: impl Into<String>, rule: impl Into<Rule>) -> Self {
    self.rules.insert(key.into(), rule.into());
    self
  }

  pub fn get(&self, key: &str) -> Option<&Rule> {
    self.rules.get(key)
  }

  pub fn iter(&self) -> impl Iterator<Item = (&str, &Rule)> {
    self.rules.iter().map(|(key, rule)| (key.as_str(), rule))
  }

  pub fn keys(&self) -> impl Iterator<Item = &str> {
    self.rules.keys().map(String::as_str)
  }

  pub fn len(&self) -> usize {
    self.rules.len()
  }

  pub fn is_empty(&self) -> bool {
    self.rules.is_empty()
  }
}

impl<K: Into<String>> FromIterator<(K, Rule)> for ViewDef {
  fn from_iter<I: IntoIterator<Item = (K, Rule)>>(iter: I) -> Self {
    Self { rules: iter.into_iter().map(|(key, rule)| (key.into(), rule)).collect() }
  }
}

/// Ordered layers, root first.
///
/// Built incrementally: each chained layer may read any key produced by an
/// earlier layer. The flattened list is computed once, at construction, so
/// resolution never walks back-references.
#[derive(Debug, Clone)]
pub struct ViewChain {
  layers: Vec<Arc<ViewDef>>,
}

/// Root chain with no previous layers.
pub fn create_view(def: ViewDef) -> ViewChain {
  ViewChain { layers: vec![Arc::new(def)] }
}

/// New chain on top of `prev`. `prev` itself is left untouched and can keep
/// being used or extended in other directions.
pub fn create_view_from(prev: &ViewChain, def: ViewDef) -> ViewChain {
  prev.chain(def)
}

impl ViewChain {
  pub fn new(def: ViewDef) -> Self {
    create_view(def)
  }

  pub fn chain(&self, def: ViewDef) -> Self {
    let mut layers = self.layers.clone();
    layers.push(Arc::new(def));
    Self { layers }
  }

  /// The chain this one was built from, if any.
  pub fn prev(&self) -> Option<Self> {
    match self.layers.len() {
      0 | 1 => None,
      n => Some(Self { layers: self.layers[..n - 1].to_vec() }),
    }
  }

  /// The newest layer.
  pub fn layer(&self) -> &ViewDef {
    // A chain always has at least the layer it was created with.
    &self.layers[self.layers.len() - 1]
  }

  pub fn layers(&self) -> &[Arc<ViewDef>] {
    &self.layers
  }

  pub fn depth(&self) -> usize {
    self.layers.len()
  }

  /// Every key the resolved props will contain.
  pub fn keys(&self) -> BTreeSet<String> {
    self.layers.iter().flat_map(|layer| layer.keys().map(str::to_string)).collect()
  }

  /// Keys marked as required parameters anywhere in the chain.
  pub fn required_params(&self) -> BTreeSet<String> {
    self.param_hints().map(|(key, _)| key.to_string()).collect()
  }

  /// JTD object schema of the parameters the chain expects. When a key is
  /// marked in several layers the newest hint wins.
  pub fn params_schema(&self) -> Value {
    let mut props = serde_json::Map::new();
    for (key, schema) in self.param_hints() {
      props.insert(key.to_string(), schema.clone());
    }
    serde_json::json!({ "properties": Value::Object(props) })
  }

  /// Required parameters absent from `params`. Informational only:
  /// resolution never rejects, a missing parameter resolves to `null`.
  pub fn missing_params(&self, params: &Props) -> Vec<String> {
    self.required_params().into_iter().filter(|key| !params.contains_key(key)).collect()
  }

  fn param_hints(&self) -> impl Iterator<Item = (&str, &Value)> {
    self.layers.iter().flat_map(|layer| {
      layer.iter().filter_map(|(key, rule)| match rule {
        Rule::Param(hint) => Some((key, &hint.schema)),
        _ => None,
      })
    })
  }
}
