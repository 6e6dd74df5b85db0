/* src/core/rust/src/view/resolve.rs */

use futures_util::future::try_join_all;
use serde_json::Value;
use tracing::{debug, trace};

use super::chain::{ViewChain, ViewDef};
use super::props::{PropValue, Props};
use super::rule::{Rule, RuleFuture};
use crate::errors::RatiError;
use crate::task::spawn_eager;

enum Slot {
  Ready(PropValue),
  Waiting(RuleFuture),
}

/// Resolve every layer of `chain`, root first, into one flat props object.
///
/// Later layers override same-named keys of earlier ones. Within a layer
/// all pending work runs concurrently. The first failure is returned; work
/// already started in that layer keeps running and its result is dropped.
/// Nothing is cached: functions and constructors run again on every call.
pub async fn resolve_view(chain: &ViewChain, params: &Props) -> Result<Props, RatiError> {
  debug!(depth = chain.depth(), "resolving view");
  let mut resolved = Props::new();

  for (index, layer) in chain.layers().iter().enumerate() {
    let values = resolve_layer(layer, &resolved, params).await.inspect_err(|err| {
      debug!(layer = index, error = %err, "view resolution failed");
    })?;
    trace!(layer = index, keys = values.len(), "layer resolved");
    resolved.extend(values);
  }

  Ok(resolved)
}

async fn resolve_layer(
  layer: &ViewDef,
  ancestors: &Props,
  params: &Props,
) -> Result<Vec<(String, PropValue)>, RatiError> {
  let mut keys = Vec::with_capacity(layer.len());
  let mut slots = Vec::with_capacity(layer.len());

  for (key, rule) in layer.iter() {
    let slot = match rule {
      Rule::Param(_) => {
        Slot::Ready(params.get_value(key).cloned().unwrap_or(PropValue::Json(Value::Null)))
      }
      Rule::Literal(value) => Slot::Ready(PropValue::Json(value.clone())),
      Rule::Pending(shared) => Slot::Waiting(Box::pin(shared.clone())),
      Rule::Constructor(construct) => Slot::Ready(construct(ancestors)?),
      Rule::Function(f) => Slot::Waiting(spawn_eager(f(ancestors))),
    };
    keys.push(key.to_string());
    slots.push(slot);
  }

  let values = try_join_all(slots.into_iter().map(|slot| async move {
    match slot {
      Slot::Ready(value) => Ok(value),
      Slot::Waiting(fut) => fut.await.map(PropValue::Json),
    }
  }))
  .await?;

  Ok(keys.into_iter().zip(values).collect())
}
