/* src/core/rust-macros/src/rati_type.rs */

use proc_macro2::TokenStream;
use quote::quote;
use syn::{Attribute, Data, DeriveInput, Fields, LitStr, Type};

pub fn expand(input: DeriveInput) -> syn::Result<TokenStream> {
  let name = &input.ident;
  let (impl_generics, ty_generics, where_clause) = input.generics.split_for_impl();

  let body = match &input.data {
    Data::Struct(data) => expand_struct(&data.fields)?,
    Data::Enum(data) => expand_enum(data)?,
    Data::Union(_) => {
      return Err(syn::Error::new_spanned(
        &input.ident,
        "RatiType can only be derived for structs and enums",
      ));
    }
  };

  Ok(quote! {
    impl #impl_generics ::rati::RatiType for #name #ty_generics #where_clause {
      fn jtd_schema() -> ::rati::__private::serde_json::Value {
        #body
      }
    }
  })
}

/// Reads `#[rati(rename = "...")]`, the only attribute the derive understands.
fn rename_of(attrs: &[Attribute]) -> syn::Result<Option<String>> {
  let mut rename = None;
  for attr in attrs {
    if !attr.path().is_ident("rati") {
      continue;
    }
    attr.parse_nested_meta(|meta| {
      if meta.path.is_ident("rename") {
        let lit: LitStr = meta.value()?.parse()?;
        rename = Some(lit.value());
        Ok(())
      } else {
        Err(meta.error("expected `rename`"))
      }
    })?;
  }
  Ok(rename)
}

fn expand_enum(data: &syn::DataEnum) -> syn::Result<TokenStream> {
  let mut values = Vec::new();
  for variant in &data.variants {
    if !variant.fields.is_empty() {
      return Err(syn::Error::new_spanned(
        variant,
        "RatiType enum derive only supports unit variants (no fields)",
      ));
    }
    let name = match rename_of(&variant.attrs)? {
      Some(renamed) => renamed,
      None => variant.ident.to_string().to_lowercase(),
    };
    values.push(name);
  }

  Ok(quote! {
    ::rati::__private::serde_json::json!({ "enum": [#(#values),*] })
  })
}

fn expand_struct(fields: &Fields) -> syn::Result<TokenStream> {
  let Fields::Named(named) = fields else {
    return Err(syn::Error::new_spanned(fields, "RatiType requires named fields"));
  };

  let mut entries = Vec::with_capacity(named.named.len());
  for field in &named.named {
    let Some(ident) = field.ident.as_ref() else {
      return Err(syn::Error::new_spanned(field, "RatiType requires named fields"));
    };
    let key = rename_of(&field.attrs)?.unwrap_or_else(|| ident.to_string());
    // `Option<T>` fields become optional, nullable `T`.
    let (ty, optional) = match option_inner(&field.ty) {
      Some(inner) => (inner, true),
      None => (&field.ty, false),
    };
    entries.push(quote! { (#key, <#ty as ::rati::RatiType>::jtd_schema(), #optional) });
  }

  Ok(quote! {
    ::rati::__private::object_schema(vec![#(#entries),*])
  })
}

fn option_inner(ty: &Type) -> Option<&Type> {
  let Type::Path(tp) = ty else {
    return None;
  };
  let seg = tp.path.segments.last()?;
  if seg.ident != "Option" {
    return None;
  }
  let syn::PathArguments::AngleBracketed(args) = &seg.arguments else {
    return None;
  };
  match args.args.first()? {
    syn::GenericArgument::Type(inner) => Some(inner),
    _ => None,
  }
}
