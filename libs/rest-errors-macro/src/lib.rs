//! `#[derive(ErrorCode)]` for closed sets of error codes.
//!
//! ```rust,ignore
//! use rest_errors::ErrorCode;
//!
//! #[derive(ErrorCode)]
//! enum UserErrors {
//!     UserNotFound,                 // "USER_NOT_FOUND"
//!     #[error_code("user.email.taken")]
//!     EmailTaken,                   // "user.email.taken"
//! }
//! ```
//!
//! Only fieldless enums are accepted. Codes must be unique and non-empty.

use std::collections::HashMap;

use heck::ToShoutySnakeCase;
use proc_macro::TokenStream;
use proc_macro2::TokenStream as TokenStream2;
use quote::quote;
use syn::{Data, DeriveInput, Fields, LitStr, Variant, parse_macro_input};

#[proc_macro_derive(ErrorCode, attributes(error_code))]
pub fn derive_error_code(input: TokenStream) -> TokenStream {
    let input = parse_macro_input!(input as DeriveInput);

    match expand(&input) {
        Ok(tokens) => tokens.into(),
        Err(e) => e.to_compile_error().into(),
    }
}

fn expand(input: &DeriveInput) -> syn::Result<TokenStream2> {
    let Data::Enum(data) = &input.data else {
        return Err(syn::Error::new_spanned(
            &input.ident,
            "ErrorCode can only be derived for enums",
        ));
    };
    if data.variants.is_empty() {
        return Err(syn::Error::new_spanned(
            &input.ident,
            "ErrorCode needs at least one variant",
        ));
    }

    let mut seen: HashMap<String, &syn::Ident> = HashMap::new();
    let mut idents = Vec::with_capacity(data.variants.len());
    let mut codes = Vec::with_capacity(data.variants.len());

    for variant in &data.variants {
        if !matches!(variant.fields, Fields::Unit) {
            return Err(syn::Error::new_spanned(
                variant,
                "ErrorCode variants must not carry data",
            ));
        }
        let code = variant_code(variant)?;
        if let Some(first) = seen.insert(code.clone(), &variant.ident) {
            return Err(syn::Error::new_spanned(
                &variant.ident,
                format!("Duplicate error code '{code}' (also used by `{first}`)"),
            ));
        }
        idents.push(&variant.ident);
        codes.push(code);
    }

    let name = &input.ident;
    let (impl_generics, ty_generics, where_clause) = input.generics.split_for_impl();

    Ok(quote! {
        impl #impl_generics ::rest_errors::ErrorCode for #name #ty_generics #where_clause {
            fn code(&self) -> &str {
                match self {
                    #(Self::#idents => #codes,)*
                }
            }
        }
    })
}

/// `#[error_code("...")]` when present, otherwise the variant name in
/// SCREAMING_SNAKE_CASE.
fn variant_code(variant: &Variant) -> syn::Result<String> {
    let mut explicit = None;
    for attr in &variant.attrs {
        if !attr.path().is_ident("error_code") {
            continue;
        }
        if explicit.is_some() {
            return Err(syn::Error::new_spanned(attr, "Duplicate #[error_code] attribute"));
        }
        let lit: LitStr = attr.parse_args()?;
        if lit.value().trim().is_empty() {
            return Err(syn::Error::new_spanned(lit, "Empty error code"));
        }
        explicit = Some(lit.value());
    }
    Ok(explicit.unwrap_or_else(|| variant.ident.to_string().to_shouty_snake_case()))
}
