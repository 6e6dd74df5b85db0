/* src/core/rust/src/lib.rs */

pub mod active_data;
pub mod config;
pub mod errors;
pub mod history;
pub mod link;
pub mod loader;
pub mod outlet;
pub mod reactive;
pub mod remote_data;
pub mod route;
pub mod router;
pub mod store;
mod task;
pub mod view;

// Re-exports for ergonomic use
pub use active_data::{ActiveApiData, ActiveData, merge_draft};
pub use config::{LinkConfig, RatiConfig, RemoteDataConfig, RootConfig, load_config};
pub use errors::RatiError;
pub use history::{History, Listener, ListenerId, Location, MemoryHistory};
pub use link::{
  Anchor, ClickEvent, LinkContent, LinkContext, LinkFactory, LinkOptions, Redirect,
  create_link_component, use_link_context,
};
pub use loader::{LoadState, Rendered, ViewLoader};
pub use outlet::{Outlet, RouterOutlet};
pub use rati_macros::RatiType;
pub use reactive::{BatchScope, Observable, Subscription, batch};
pub use remote_data::{
  ButtonProps, DebounceWait, RemoteData, RemoteDataOptions, RemoteDataState, remote_data_key,
};
pub use route::{RouteDef, RouteMatch, RouteRef, RouteTable, Target, route};
pub use router::{ActiveRoute, Navigator, RouterStore};
pub use store::{GlobalStores, RootStore, StoreContext, use_stores};
pub use task::BoxFuture;
pub use view::{
  ParamHint, PropValue, Props, Rule, RuleKind, ViewChain, ViewDef, ViewStore, create_view,
  create_view_from, resolve_view,
};

/// Types that can describe themselves as a JTD schema. The schema is the
/// type hint carried by `Rule::param::<T>()` markers.
/// Derive with `#[derive(RatiType)]` or implement manually.
pub trait RatiType {
  fn jtd_schema() -> serde_json::Value;
}

#[doc(hidden)]
pub mod __private {
  use serde_json::{Map, Value};

  pub use serde_json;

  /// Object schema from `(key, schema, optional)` triples.
  pub fn object_schema(fields: Vec<(&str, Value, bool)>) -> Value {
    let mut required = Map::new();
    let mut optional = Map::new();
    for (key, schema, is_optional) in fields {
      if is_optional {
        optional.insert(key.to_string(), super::nullable(schema));
      } else {
        required.insert(key.to_string(), schema);
      }
    }

    let mut schema = Map::new();
    schema.insert("properties".to_string(), Value::Object(required));
    if !optional.is_empty() {
      schema.insert("optionalProperties".to_string(), Value::Object(optional));
    }
    Value::Object(schema)
  }
}

fn nullable(mut schema: serde_json::Value) -> serde_json::Value {
  if let Some(obj) = schema.as_object_mut() {
    obj.insert("nullable".to_string(), serde_json::Value::Bool(true));
  }
  schema
}

macro_rules! impl_rati_type_primitive {
  ($rust_ty:ty, $jtd:expr) => {
    impl RatiType for $rust_ty {
      fn jtd_schema() -> serde_json::Value {
        serde_json::json!({ "type": $jtd })
      }
    }
  };
}

impl_rati_type_primitive!(String, "string");
impl_rati_type_primitive!(bool, "boolean");
impl_rati_type_primitive!(i8, "int8");
impl_rati_type_primitive!(i16, "int16");
impl_rati_type_primitive!(i32, "int32");
impl_rati_type_primitive!(u8, "uint8");
impl_rati_type_primitive!(u16, "uint16");
impl_rati_type_primitive!(u32, "uint32");
impl_rati_type_primitive!(f32, "float32");
impl_rati_type_primitive!(f64, "float64");

impl<T: RatiType> RatiType for Vec<T> {
  fn jtd_schema() -> serde_json::Value {
    serde_json::json!({ "elements": T::jtd_schema() })
  }
}

impl<T: RatiType> RatiType for Option<T> {
  fn jtd_schema() -> serde_json::Value {
    nullable(T::jtd_schema())
  }
}

#[cfg(test)]
extern crate self as rati;
