/* src/core/rust/src/view/mod.rs */

// Declarative view chains: ordered layers of named production rules,
// resolved root-to-tip into one flat props object.

mod chain;
mod props;
mod resolve;
mod rule;

#[cfg(test)]
mod tests;

pub use chain::{ViewChain, ViewDef, create_view, create_view_from};
pub use props::{PropValue, Props};
pub use resolve::resolve_view;
pub use rule::{ConstructFn, ParamHint, Rule, RuleFn, RuleFuture, RuleKind, ViewStore};
