/* src/core/rust-macros/src/lib.rs */

mod rati_type;

use proc_macro::TokenStream;

/// Derive `rati::RatiType`, describing the type as a JTD schema.
///
/// Used as the type hint of `Rule::param::<T>()` markers so that a view
/// chain can describe the parameters it expects.
#[proc_macro_derive(RatiType, attributes(rati))]
pub fn derive_rati_type(input: TokenStream) -> TokenStream {
  let input = syn::parse_macro_input!(input as syn::DeriveInput);
  match rati_type::expand(input) {
    Ok(tokens) => tokens.into(),
    Err(e) => e.to_compile_error().into(),
  }
}
