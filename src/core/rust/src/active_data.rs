/* src/core/rust/src/active_data.rs */

use serde::Serialize;
use serde::de::DeserializeOwned;
use serde_json::Value;
use tracing::debug;

use crate::errors::RatiError;
use crate::reactive::{Observable, batch};
use crate::remote_data::RemoteData;

/// Deep merge of `draft` over `original`. Objects merge key by key; any
/// other draft value, arrays included, replaces the original one.
pub fn merge_draft(original: &Value, draft: &Value) -> Value {
  match (original, draft) {
    (Value::Object(base), Value::Object(patch)) => {
      let mut merged = base.clone();
      for (key, value) in patch {
        let next = match merged.get(key) {
          Some(current) => merge_draft(current, value),
          None => value.clone(),
        };
        merged.insert(key.clone(), next);
      }
      Value::Object(merged)
    }
    (_, patch) => patch.clone(),
  }
}

fn empty_draft() -> Value {
  Value::Object(serde_json::Map::new())
}

/// Server data plus a local, editable draft layered on top of it.
#[derive(Debug, Clone)]
pub struct ActiveData {
  original: Observable<Value>,
  draft: Observable<Value>,
}

impl ActiveData {
  pub fn new(original: Value) -> Self {
    Self { original: Observable::new(original), draft: Observable::new(empty_draft()) }
  }

  pub fn create<T: Serialize>(data: &T) -> Result<Self, RatiError> {
    Ok(Self::new(serde_json::to_value(data)?))
  }

  pub fn original(&self) -> &Observable<Value> {
    &self.original
  }

  pub fn draft(&self) -> &Observable<Value> {
    &self.draft
  }

  /// Current view: the draft merged over the original.
  pub fn data(&self) -> Value {
    self.original.with(|original| self.draft.with(|draft| merge_draft(original, draft)))
  }

  pub fn get(&self, key: &str) -> Option<Value> {
    self.data().get(key).cloned()
  }

  pub fn typed<T: DeserializeOwned>(&self) -> Result<T, RatiError> {
    Ok(serde_json::from_value(self.data())?)
  }

  pub fn set_draft(&self, key: &str, value: Value) {
    self.draft.update(|draft| {
      if !draft.is_object() {
        *draft = empty_draft();
      }
      if let Some(map) = draft.as_object_mut() {
        map.insert(key.to_string(), value);
      }
    });
  }

  pub fn reset_draft(&self) {
    self.draft.set(empty_draft());
  }

  pub fn set_original(&self, original: Value) {
    self.original.set(original);
  }

  /// Make the draft permanent.
  pub fn commit(&self) {
    let merged = self.data();
    batch(|| {
      self.original.set(merged);
      self.reset_draft();
    });
  }
}

/// [`ActiveData`] loaded through a remote-data wrapper.
///
/// Give every instance its own wrapper: clones of a wrapper share their
/// debounce and pending state.
pub struct ActiveApiData<A> {
  data: ActiveData,
  loader: RemoteData<A, Value>,
}

impl<A: Send + 'static> ActiveApiData<A> {
  pub async fn create(loader: RemoteData<A, Value>, params: A) -> Result<Self, RatiError> {
    let raw = loader.call(params).await?;
    Ok(Self { data: ActiveData::new(raw), loader })
  }

  /// Fetch again and replace the original data. The draft is kept.
  pub async fn reload(&self, params: A) -> Result<(), RatiError> {
    let raw = self.loader.call(params).await?;
    debug!("active data reloaded");
    self.data.set_original(raw);
    Ok(())
  }

  pub fn active(&self) -> &ActiveData {
    &self.data
  }

  pub fn loader(&self) -> &RemoteData<A, Value> {
    &self.loader
  }
}
