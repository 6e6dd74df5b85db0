/* src/core/rust/src/view/props.rs */

use std::any::Any;
use std::collections::BTreeMap;
use std::fmt;
use std::ops::Index;
use std::sync::Arc;

use serde_json::Value;

static NULL: Value = Value::Null;

/// One resolved prop: plain data, or a live store instance shared by
/// reference.
#[derive(Clone)]
pub enum PropValue {
  Json(Value),
  Store(Arc<dyn Any + Send + Sync>),
}

impl PropValue {
  pub fn store<S: Any + Send + Sync>(store: S) -> Self {
    Self::Store(Arc::new(store))
  }

  pub fn as_json(&self) -> Option<&Value> {
    match self {
      Self::Json(value) => Some(value),
      Self::Store(_) => None,
    }
  }

  pub fn downcast<S: Any + Send + Sync>(&self) -> Option<Arc<S>> {
    match self {
      Self::Store(instance) => Arc::clone(instance).downcast::<S>().ok(),
      Self::Json(_) => None,
    }
  }
}

impl fmt::Debug for PropValue {
  fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
    match self {
      Self::Json(value) => f.debug_tuple("Json").field(value).finish(),
      Self::Store(_) => f.write_str("Store(..)"),
    }
  }
}

// Stores compare by identity.
impl PartialEq for PropValue {
  fn eq(&self, other: &Self) -> bool {
    match (self, other) {
      (Self::Json(a), Self::Json(b)) => a == b,
      (Self::Store(a), Self::Store(b)) => Arc::ptr_eq(a, b),
      _ => false,
    }
  }
}

impl From<Value> for PropValue {
  fn from(value: Value) -> Self {
    Self::Json(value)
  }
}

/// Flat mapping consumed by a component.
#[derive(Debug, Clone, Default, PartialEq)]
pub struct Props {
  entries: BTreeMap<String, PropValue>,
}

impl Props {
  pub fn new() -> Self {
    Self::default()
  }

  /// Props from a JSON object. Any other value gives empty props.
  pub fn from_json(value: Value) -> Self {
    match value {
      Value::Object(map) => map.into_iter().collect(),
      _ => Self::new(),
    }
  }

  pub fn len(&self) -> usize {
    self.entries.len()
  }

  pub fn is_empty(&self) -> bool {
    self.entries.is_empty()
  }

  pub fn contains_key(&self, key: &str) -> bool {
    self.entries.contains_key(key)
  }

  /// Plain value under `key`. Stores are not visible here.
  pub fn get(&self, key: &str) -> Option<&Value> {
    self.entries.get(key).and_then(PropValue::as_json)
  }

  pub fn get_value(&self, key: &str) -> Option<&PropValue> {
    self.entries.get(key)
  }

  /// Store instance under `key`, if it is one of type `S`.
  pub fn store<S: Any + Send + Sync>(&self, key: &str) -> Option<Arc<S>> {
    self.entries.get(key).and_then(PropValue::downcast)
  }

  pub fn insert(&mut self, key: impl Into<String>, value: impl Into<PropValue>) {
    self.entries.insert(key.into(), value.into());
  }

  pub fn keys(&self) -> impl Iterator<Item = &str> {
    self.entries.keys().map(String::as_str)
  }

  pub fn iter(&self) -> impl Iterator<Item = (&str, &PropValue)> {
    self.entries.iter().map(|(key, value)| (key.as_str(), value))
  }

  /// Plain values as one JSON object; stores are left out.
  pub fn to_json(&self) -> Value {
    let map = self
      .entries
      .iter()
      .filter_map(|(key, value)| value.as_json().map(|v| (key.clone(), v.clone())))
      .collect();
    Value::Object(map)
  }
}

impl Index<&str> for Props {
  type Output = Value;

  /// Missing keys and stores index as `null`.
  fn index(&self, key: &str) -> &Value {
    self.get(key).unwrap_or(&NULL)
  }
}

impl FromIterator<(String, Value)> for Props {
  fn from_iter<I: IntoIterator<Item = (String, Value)>>(iter: I) -> Self {
    Self { entries: iter.into_iter().map(|(key, value)| (key, PropValue::Json(value))).collect() }
  }
}

impl FromIterator<(String, PropValue)> for Props {
  fn from_iter<I: IntoIterator<Item = (String, PropValue)>>(iter: I) -> Self {
    Self { entries: iter.into_iter().collect() }
  }
}

impl Extend<(String, PropValue)> for Props {
  fn extend<I: IntoIterator<Item = (String, PropValue)>>(&mut self, iter: I) {
    self.entries.extend(iter);
  }
}
