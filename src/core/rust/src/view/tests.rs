/* src/core/rust/src/view/tests.rs */

use std::sync::Arc;
use std::sync::atomic::{AtomicUsize, Ordering};
use std::time::Duration;

use serde_json::{Value, json};

use super::*;
use crate::active_data::ActiveData;
use crate::errors::{RESOLUTION_FAILED, RatiError};

fn params(value: Value) -> Props {
  Props::from_json(value)
}

struct Greeting {
  text: String,
}

impl ViewStore for Greeting {
  fn create(props: &Props) -> Result<Self, RatiError> {
    let first = props.get("first").and_then(Value::as_str).unwrap_or_default();
    let name = props.get("productName").and_then(Value::as_str).unwrap_or_default();
    Ok(Self { text: format!("~{first} {name}~") })
  }
}

struct Failing;

impl ViewStore for Failing {
  fn create(_props: &Props) -> Result<Self, RatiError> {
    Err(RatiError::resolution("store refused"))
  }
}

#[tokio::test]
async fn root_chain_yields_exactly_its_keys() {
  let chain = create_view(
    ViewDef::new()
      .rule("wow", "wow")
      .rule("count", Rule::literal(3))
      .rule("xx", Rule::func(|_| async { Ok::<_, RatiError>("x") })),
  );

  let resolved = resolve_view(&chain, &Props::new()).await.unwrap();
  assert_eq!(resolved.to_json(), json!({ "wow": "wow", "count": 3, "xx": "x" }));
}

#[tokio::test]
async fn chained_layers_merge_with_newest_winning() {
  let base = create_view(ViewDef::new().rule("a", "base").rule("b", "base"));
  let top = base.chain(ViewDef::new().rule("b", "top").rule("c", "top"));

  let resolved = resolve_view(&top, &Props::new()).await.unwrap();
  assert_eq!(resolved.to_json(), json!({ "a": "base", "b": "top", "c": "top" }));
}

#[tokio::test]
async fn functions_see_only_earlier_layers() {
  let chain = create_view(ViewDef::new().rule("productName", Rule::param::<String>()))
    .chain(ViewDef::new().rule(
      "name",
      Rule::func(|props| async move {
        let name = props.get("productName").and_then(Value::as_str).unwrap_or_default();
        Ok::<_, RatiError>(format!("product name: {name}"))
      }),
    ))
    .chain(ViewDef::new().rule("first", "1"))
    .chain(ViewDef::new().rule("xStore", Rule::construct::<Greeting>()));

  let resolved = resolve_view(&chain, &params(json!({ "productName": "tea" }))).await.unwrap();
  assert_eq!(resolved["name"], json!("product name: tea"));
  let store = resolved.store::<Greeting>("xStore").unwrap();
  assert_eq!(store.text, "~1 tea~");
}

struct Cart {
  items: ActiveData,
}

impl ViewStore for Cart {
  fn create(props: &Props) -> Result<Self, RatiError> {
    let count = props.get("count").cloned().unwrap_or(Value::Null);
    Ok(Self { items: ActiveData::new(json!({ "count": count })) })
  }
}

#[tokio::test]
async fn constructed_stores_stay_live_instances() {
  let chain = create_view(ViewDef::new().rule("count", Rule::param::<u32>()))
    .chain(ViewDef::new().rule("cart", Rule::construct::<Cart>()))
    .chain(ViewDef::new().rule(
      "label",
      Rule::map(|props: &Props| {
        let cart = props.store::<Cart>("cart").ok_or_else(|| RatiError::resolution("no cart"))?;
        Ok(format!("{} items", cart.items.get("count").unwrap_or(Value::Null)))
      }),
    ));

  let resolved = resolve_view(&chain, &params(json!({ "count": 2 }))).await.unwrap();
  assert_eq!(resolved["label"], json!("2 items"));
  assert_eq!(resolved["cart"], Value::Null);
  assert_eq!(resolved.to_json(), json!({ "count": 2, "label": "2 items" }));

  let cart = resolved.store::<Cart>("cart").unwrap();
  let seen = resolved.store::<Cart>("cart").unwrap();
  cart.items.set_draft("count", json!(5));
  assert_eq!(seen.items.get("count"), Some(json!(5)));
  assert!(resolved.store::<Greeting>("cart").is_none());
}

#[tokio::test]
async fn each_resolution_builds_a_fresh_store() {
  let chain = create_view(ViewDef::new().rule("cart", Rule::construct::<Cart>()));
  let first = resolve_view(&chain, &Props::new()).await.unwrap();
  let second = resolve_view(&chain, &Props::new()).await.unwrap();
  assert_ne!(first, second);
  assert_eq!(first, first.clone());
}

#[tokio::test]
async fn sibling_rules_do_not_see_each_other() {
  let chain = create_view(
    ViewDef::new()
      .rule("a", "1")
      .rule("b", Rule::map(|props: &Props| Ok(props.contains_key("a")))),
  );

  let resolved = resolve_view(&chain, &Props::new()).await.unwrap();
  assert_eq!(resolved["b"], json!(false));
}

#[tokio::test]
async fn params_pass_through_unchanged() {
  let chain = create_view(
    ViewDef::new().rule("productId", Rule::param::<u32>()).rule("tags", Rule::param::<Vec<String>>()),
  );

  let input = params(json!({ "productId": 12, "tags": ["a", "b"], "extra": true }));
  let resolved = resolve_view(&chain, &input).await.unwrap();
  assert_eq!(resolved.to_json(), json!({ "productId": 12, "tags": ["a", "b"] }));
}

#[tokio::test]
async fn missing_params_resolve_to_null() {
  let chain = create_view(ViewDef::new().rule("productId", Rule::param::<u32>()));
  let resolved = resolve_view(&chain, &Props::new()).await.unwrap();
  assert_eq!(resolved["productId"], Value::Null);
}

#[tokio::test]
async fn resolution_is_repeatable_but_not_cached() {
  let calls = Arc::new(AtomicUsize::new(0));
  let calls_in = Arc::clone(&calls);
  let chain = create_view(ViewDef::new().rule(
    "n",
    Rule::map(move |_| {
      calls_in.fetch_add(1, Ordering::SeqCst);
      Ok(42)
    }),
  ));

  let first = resolve_view(&chain, &Props::new()).await.unwrap();
  let second = resolve_view(&chain, &Props::new()).await.unwrap();
  assert_eq!(first, second);
  assert_eq!(calls.load(Ordering::SeqCst), 2);
}

#[tokio::test(start_paused = true)]
async fn pending_rules_start_at_definition_time() {
  let started = Arc::new(AtomicUsize::new(0));
  let started_in = Arc::clone(&started);
  let rule = Rule::pending(async move {
    started_in.fetch_add(1, Ordering::SeqCst);
    Ok::<_, RatiError>(14)
  });
  tokio::task::yield_now().await;
  assert_eq!(started.load(Ordering::SeqCst), 1);

  let chain = create_view(ViewDef::new().rule("hey", rule));
  let first = resolve_view(&chain, &Props::new()).await.unwrap();
  let second = resolve_view(&chain, &Props::new()).await.unwrap();
  assert_eq!(first["hey"], json!(14));
  assert_eq!(second["hey"], json!(14));
  assert_eq!(started.load(Ordering::SeqCst), 1);
}

#[tokio::test(start_paused = true)]
async fn layer_rules_run_concurrently() {
  let slow = |ms: u64, value: &'static str| {
    Rule::func(move |_| async move {
      tokio::time::sleep(Duration::from_millis(ms)).await;
      Ok::<_, RatiError>(value)
    })
  };
  let chain = create_view(ViewDef::new().rule("a", slow(1000, "a")).rule("b", slow(1000, "b")));

  let start = tokio::time::Instant::now();
  let resolved = resolve_view(&chain, &Props::new()).await.unwrap();
  assert_eq!(resolved.len(), 2);
  assert!(start.elapsed() < Duration::from_millis(1500));
}

#[tokio::test(start_paused = true)]
async fn failure_propagates_and_siblings_keep_running() {
  let finished = Arc::new(AtomicUsize::new(0));
  let finished_in = Arc::clone(&finished);
  let chain = create_view(
    ViewDef::new()
      .rule(
        "slow",
        Rule::func(move |_| {
          let finished = Arc::clone(&finished_in);
          async move {
            tokio::time::sleep(Duration::from_millis(500)).await;
            finished.fetch_add(1, Ordering::SeqCst);
            Ok::<_, RatiError>(1)
          }
        }),
      )
      .rule("broken", Rule::func(|_| async { Err::<u8, _>(RatiError::resolution("api down")) })),
  );

  let err = resolve_view(&chain, &Props::new()).await.unwrap_err();
  assert_eq!(err.code(), RESOLUTION_FAILED);
  assert_eq!(err.message(), "api down");

  tokio::time::sleep(Duration::from_millis(600)).await;
  assert_eq!(finished.load(Ordering::SeqCst), 1);
}

#[tokio::test]
async fn constructor_failure_fails_the_resolution() {
  let chain = create_view(ViewDef::new().rule("store", Rule::construct::<Failing>()));
  let err = resolve_view(&chain, &Props::new()).await.unwrap_err();
  assert_eq!(err.message(), "store refused");
}

#[tokio::test]
async fn later_layers_never_run_after_a_failure() {
  let ran = Arc::new(AtomicUsize::new(0));
  let ran_in = Arc::clone(&ran);
  let chain = create_view(
    ViewDef::new().rule("x", Rule::func(|_| async { Err::<u8, _>(RatiError::resolution("no")) })),
  )
  .chain(ViewDef::new().rule(
    "y",
    Rule::map(move |_| {
      ran_in.fetch_add(1, Ordering::SeqCst);
      Ok(())
    }),
  ));

  assert!(resolve_view(&chain, &Props::new()).await.is_err());
  assert_eq!(ran.load(Ordering::SeqCst), 0);
}

#[test]
fn prev_walks_back_one_layer() {
  let root = create_view(ViewDef::new().rule("a", "1"));
  let next = create_view_from(&root, ViewDef::new().rule("b", "2"));

  assert_eq!(next.depth(), 2);
  let prev = next.prev().unwrap();
  assert_eq!(prev.keys(), root.keys());
  assert!(root.prev().is_none());
  assert_eq!(next.layer().keys().collect::<Vec<_>>(), vec!["b"]);
}

#[test]
fn chaining_leaves_the_base_untouched() {
  let base = create_view(ViewDef::new().rule("a", "1"));
  let left = base.chain(ViewDef::new().rule("l", "l"));
  let right = base.chain(ViewDef::new().rule("r", "r"));

  assert_eq!(base.depth(), 1);
  assert!(left.keys().contains("l") && !left.keys().contains("r"));
  assert!(right.keys().contains("r") && !right.keys().contains("l"));
}

#[test]
fn required_params_cover_every_layer() {
  let chain = create_view(
    ViewDef::new().rule("productIdX", Rule::param::<u32>()).rule("xx", Rule::func(|_| async { Ok::<_, RatiError>("x") })),
  )
  .chain(ViewDef::new().rule("first", "1").rule("productId", Rule::param::<u32>()))
  .chain(ViewDef::new().rule("productName", Rule::param::<String>()));

  let required: Vec<String> = chain.required_params().into_iter().collect();
  assert_eq!(required, vec!["productId", "productIdX", "productName"]);

  assert_eq!(
    chain.params_schema(),
    json!({ "properties": {
      "productIdX": { "type": "uint32" },
      "productId": { "type": "uint32" },
      "productName": { "type": "string" },
    }})
  );

  let missing = chain.missing_params(&params(json!({ "productId": 1 })));
  assert_eq!(missing, vec!["productIdX", "productName"]);
}

#[test]
fn rule_kinds_are_tagged() {
  assert_eq!(Rule::literal(1).kind(), RuleKind::Literal);
  assert_eq!(Rule::param::<bool>().kind(), RuleKind::Param);
  assert_eq!(Rule::map(|_| Ok(1)).kind(), RuleKind::Function);
  assert_eq!(Rule::construct::<Greeting>().kind(), RuleKind::Constructor);
}

#[test]
fn view_def_collects_from_pairs_in_order() {
  let def: ViewDef = vec![("b", Rule::literal(1)), ("a", Rule::literal(2))].into_iter().collect();
  assert_eq!(def.keys().collect::<Vec<_>>(), vec!["b", "a"]);
  assert_eq!(def.len(), 2);
  assert!(!def.is_empty());
}
