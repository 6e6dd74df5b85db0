/* src/core/rust/src/view/rule.rs */

use std::any::Any;
use std::fmt;
use std::future::Future;
use std::sync::Arc;

use futures_util::FutureExt;
use futures_util::future::Shared;
use serde::Serialize;
use serde_json::Value;

use crate::RatiType;
use crate::errors::RatiError;
use crate::task::{BoxFuture, spawn_eager};

use super::props::{PropValue, Props};

pub type RuleFuture = BoxFuture<Result<Value, RatiError>>;

/// Called with the merged results of every earlier layer.
pub type RuleFn = Arc<dyn Fn(&Props) -> RuleFuture + Send + Sync>;

/// Instantiates a store from the merged results of every earlier layer.
pub type ConstructFn = Arc<dyn Fn(&Props) -> Result<PropValue, RatiError> + Send + Sync>;

/// A store built from the results of earlier layers, the class-like rule kind.
///
/// The instance itself lands in the props under its key; read it back with
/// `Props::store`.
pub trait ViewStore: Any + Send + Sync + Sized {
  fn create(props: &Props) -> Result<Self, RatiError>;
}

/// Type hint carried by a required-parameter marker.
#[derive(Debug, Clone, PartialEq)]
pub struct ParamHint {
  pub type_name: &'static str,
  pub schema: Value,
}

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum RuleKind {
  Literal,
  Param,
  Function,
  Constructor,
  Pending,
}

/// How one key of a layer obtains its value.
#[derive(Clone)]
pub enum Rule {
  /// Passed through unchanged.
  Literal(Value),
  /// Supplied by the caller of `resolve_view` under the same key.
  Param(ParamHint),
  /// Invoked on every resolution; may be asynchronous.
  Function(RuleFn),
  /// Instantiated synchronously on every resolution.
  Constructor(ConstructFn),
  /// Started when the rule was created; every resolution shares its outcome.
  Pending(Shared<RuleFuture>),
}

impl Rule {
  pub fn literal(value: impl Into<Value>) -> Self {
    Self::Literal(value.into())
  }

  /// Required-parameter marker, the equivalent of `viewParam<T>()`.
  pub fn param<T: RatiType>() -> Self {
    Self::Param(ParamHint { type_name: std::any::type_name::<T>(), schema: T::jtd_schema() })
  }

  /// Asynchronous function of the previous layers' results.
  pub fn func<F, Fut, V>(f: F) -> Self
  where
    F: Fn(Props) -> Fut + Send + Sync + 'static,
    Fut: Future<Output = Result<V, RatiError>> + Send + 'static,
    V: Serialize + 'static,
  {
    Self::Function(Arc::new(move |props: &Props| -> RuleFuture {
      let fut = f(props.clone());
      Box::pin(async move {
        let value = fut.await?;
        serde_json::to_value(value).map_err(RatiError::from)
      })
    }))
  }

  /// Synchronous function of the previous layers' results.
  pub fn map<F, V>(f: F) -> Self
  where
    F: Fn(&Props) -> Result<V, RatiError> + Send + Sync + 'static,
    V: Serialize,
  {
    Self::Function(Arc::new(move |props: &Props| -> RuleFuture {
      let result = f(props).and_then(|v| serde_json::to_value(v).map_err(RatiError::from));
      Box::pin(std::future::ready(result))
    }))
  }

  pub fn construct<S: ViewStore>() -> Self {
    Self::Constructor(Arc::new(|props: &Props| -> Result<PropValue, RatiError> {
      S::create(props).map(PropValue::store)
    }))
  }

  /// An already-started computation. It begins running now on the ambient
  /// tokio runtime, whether or not the chain is ever resolved.
  pub fn pending<Fut, V>(fut: Fut) -> Self
  where
    Fut: Future<Output = Result<V, RatiError>> + Send + 'static,
    V: Serialize + 'static,
  {
    let started = spawn_eager(async move {
      let value = fut.await?;
      serde_json::to_value(value).map_err(RatiError::from)
    });
    Self::Pending(started.shared())
  }

  pub fn kind(&self) -> RuleKind {
    match self {
      Self::Literal(_) => RuleKind::Literal,
      Self::Param(_) => RuleKind::Param,
      Self::Function(_) => RuleKind::Function,
      Self::Constructor(_) => RuleKind::Constructor,
      Self::Pending(_) => RuleKind::Pending,
    }
  }
}

impl fmt::Debug for Rule {
  fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
    match self {
      Self::Literal(value) => f.debug_tuple("Literal").field(value).finish(),
      Self::Param(hint) => f.debug_tuple("Param").field(&hint.type_name).finish(),
      Self::Function(_) => f.write_str("Function"),
      Self::Constructor(_) => f.write_str("Constructor"),
      Self::Pending(_) => f.write_str("Pending"),
    }
  }
}

impl From<Value> for Rule {
  fn from(value: Value) -> Self {
    Self::Literal(value)
  }
}

impl From<&str> for Rule {
  fn from(value: &str) -> Self {
    Self::Literal(Value::String(value.to_string()))
  }
}
