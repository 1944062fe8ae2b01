// Proc macros operate on named structs where field.ident is always Some
#![allow(clippy::unwrap_used)]

//! # mongo-derive
//!
//! Procedural macros for mapping documents onto Rust structs.
//!
//! ## Available Macros
//!
//! - `#[derive(FromDocument)]` - Build a struct from a decoded document
//! - `#[derive(ToDocument)]` - Encode a struct as a document
//!
//! Generated code refers to `::mongo_client`, so the crate using the
//! derives must depend on `mongo-client`.
//!
//! ## Example
//!
//! ```rust,ignore
//! use mongo_client::Document;
//! use mongo_derive::{FromDocument, ToDocument};
//!
//! #[derive(FromDocument, ToDocument)]
//! #[mongo(rename_all = "camelCase")]
//! struct User {
//!     #[mongo(rename = "_id")]
//!     id: i32,
//!     display_name: String,
//!     email: Option<String>,
//!     #[mongo(expando)]
//!     extra: Document,
//! }
//! ```

#![warn(missing_docs)]

use proc_macro::TokenStream;
use proc_macro2::TokenStream as TokenStream2;
use quote::{format_ident, quote};
use syn::{Attribute, Data, DeriveInput, Field, Fields, LitStr, Type, parse_macro_input};

/// Field configuration extracted from attributes.
#[derive(Default)]
struct FieldConfig {
    /// Document key, when it differs from the field name.
    rename: Option<String>,
    /// Never read or written.
    skip: bool,
    /// Use Default when the key is missing.
    default: bool,
    /// Collects keys no other field declares.
    expando: bool,
}

/// Struct-level configuration extracted from attributes.
#[derive(Default)]
struct StructConfig {
    /// Casing convention applied to every key.
    rename_all: Option<String>,
}

fn parse_field_config(attrs: &[Attribute]) -> syn::Result<FieldConfig> {
    let mut config = FieldConfig::default();

    for attr in attrs {
        if !attr.path().is_ident("mongo") {
            continue;
        }
        attr.parse_nested_meta(|meta| {
            if meta.path.is_ident("rename") {
                let lit: LitStr = meta.value()?.parse()?;
                config.rename = Some(lit.value());
            } else if meta.path.is_ident("skip") {
                config.skip = true;
            } else if meta.path.is_ident("default") {
                config.default = true;
            } else if meta.path.is_ident("expando") {
                config.expando = true;
            } else {
                return Err(meta.error("unknown mongo field attribute"));
            }
            Ok(())
        })?;
    }

    Ok(config)
}

fn parse_struct_config(attrs: &[Attribute]) -> syn::Result<StructConfig> {
    let mut config = StructConfig::default();

    for attr in attrs {
        if !attr.path().is_ident("mongo") {
            continue;
        }
        attr.parse_nested_meta(|meta| {
            if meta.path.is_ident("rename_all") {
                let lit: LitStr = meta.value()?.parse()?;
                if !RENAME_RULES.contains(&lit.value().as_str()) {
                    return Err(syn::Error::new_spanned(
                        &lit,
                        format!("rename_all must be one of {RENAME_RULES:?}"),
                    ));
                }
                config.rename_all = Some(lit.value());
            } else {
                return Err(meta.error("unknown mongo struct attribute"));
            }
            Ok(())
        })?;
    }

    Ok(config)
}

const RENAME_RULES: [&str; 5] = [
    "lowercase",
    "camelCase",
    "PascalCase",
    "snake_case",
    "SCREAMING_SNAKE_CASE",
];

/// Apply a `rename_all` rule to a snake_case field name.
fn apply_rename_all(name: &str, rule: Option<&str>) -> String {
    match rule {
        Some("lowercase") => name.replace('_', "").to_lowercase(),
        Some("camelCase") => {
            let pascal = to_pascal_case(name);
            let mut chars = pascal.chars();
            match chars.next() {
                Some(first) => first.to_lowercase().chain(chars).collect(),
                None => pascal,
            }
        }
        Some("PascalCase") => to_pascal_case(name),
        Some("SCREAMING_SNAKE_CASE") => name.to_uppercase(),
        _ => name.to_string(),
    }
}

fn to_pascal_case(name: &str) -> String {
    name.split('_')
        .filter(|part| !part.is_empty())
        .map(|part| {
            let mut chars = part.chars();
            match chars.next() {
                Some(first) => first.to_uppercase().chain(chars).collect::<String>(),
                None => String::new(),
            }
        })
        .collect()
}

/// Named fields of a struct, or an error naming the derive.
fn named_fields<'a>(
    input: &'a DeriveInput,
    derive: &str,
) -> syn::Result<impl Iterator<Item = &'a Field>> {
    match &input.data {
        Data::Struct(data) => match &data.fields {
            Fields::Named(fields) => Ok(fields.named.iter()),
            _ => Err(syn::Error::new_spanned(
                input,
                format!("{derive} can only be derived for structs with named fields"),
            )),
        },
        _ => Err(syn::Error::new_spanned(
            input,
            format!("{derive} can only be derived for structs"),
        )),
    }
}

/// A field plus its resolved configuration.
struct MappedField<'a> {
    field: &'a Field,
    config: FieldConfig,
    key: String,
}

fn mapped_fields<'a>(input: &'a DeriveInput, derive: &str) -> syn::Result<Vec<MappedField<'a>>> {
    let struct_config = parse_struct_config(&input.attrs)?;
    let mut mapped = Vec::new();
    let mut expando_seen = false;

    for field in named_fields(input, derive)? {
        let config = parse_field_config(&field.attrs)?;
        if config.expando {
            if expando_seen {
                return Err(syn::Error::new_spanned(
                    field,
                    "only one field may be marked #[mongo(expando)]",
                ));
            }
            if !is_document_type(&field.ty) {
                return Err(syn::Error::new_spanned(
                    &field.ty,
                    "#[mongo(expando)] fields must have type Document",
                ));
            }
            expando_seen = true;
        }
        let name = field.ident.as_ref().unwrap().to_string();
        let key = config
            .rename
            .clone()
            .unwrap_or_else(|| apply_rename_all(&name, struct_config.rename_all.as_deref()));
        mapped.push(MappedField { field, config, key });
    }

    Ok(mapped)
}

fn is_document_type(ty: &Type) -> bool {
    if let Type::Path(type_path) = ty {
        if let Some(segment) = type_path.path.segments.last() {
            return segment.ident == "Document";
        }
    }
    false
}

/// Derive macro for implementing `FromDocument`.
///
/// Each field is taken out of the document by key with `take_as`, so a
/// missing key fails unless the field is an `Option` or marked `default`.
/// When the client has expando properties enabled, keys left over after
/// every declared field is taken land in the `expando` field.
///
/// ## Attributes
///
/// ### Field Attributes
///
/// - `#[mongo(rename = "key")]` - Read the field from a different key
/// - `#[mongo(skip)]` - Never read; filled with `Default`
/// - `#[mongo(default)]` - Use `Default` when the key is missing
/// - `#[mongo(expando)]` - Collect undeclared keys (type `Document`)
///
/// ### Struct Attributes
///
/// - `#[mongo(rename_all = "camelCase")]` - Apply a naming convention to all keys
#[proc_macro_derive(FromDocument, attributes(mongo))]
pub fn derive_from_document(input: TokenStream) -> TokenStream {
    let input = parse_macro_input!(input as DeriveInput);
    match impl_from_document(&input) {
        Ok(tokens) => tokens.into(),
        Err(err) => err.to_compile_error().into(),
    }
}

fn impl_from_document(input: &DeriveInput) -> syn::Result<TokenStream2> {
    let name = &input.ident;
    let (impl_generics, ty_generics, where_clause) = input.generics.split_for_impl();
    let fields = mapped_fields(input, "FromDocument")?;

    let mut extractions = Vec::new();
    let mut expando = None;
    let mut initializers = Vec::new();

    for mapped in &fields {
        let field_name = mapped.field.ident.as_ref().unwrap();
        let field_type = &mapped.field.ty;
        let local = format_ident!("__field_{}", field_name);
        let key = &mapped.key;
        initializers.push(quote! { #field_name: #local });

        if mapped.config.skip {
            extractions.push(quote! {
                let #local: #field_type = ::std::default::Default::default();
            });
        } else if mapped.config.expando {
            expando = Some(quote! {
                let #local: #field_type = ::mongo_client::record::take_expando(__document, __options);
            });
        } else if mapped.config.default {
            extractions.push(quote! {
                let #local: #field_type = if __document.contains_key(#key) {
                    __document.take_as(#key)?
                } else {
                    ::std::default::Default::default()
                };
            });
        } else {
            extractions.push(quote! {
                let #local: #field_type = __document.take_as(#key)?;
            });
        }
    }

    // The expando field consumes what is left, so it is built last
    let finish = expando.unwrap_or_else(|| quote! { let _ = (__document, __options); });

    Ok(quote! {
        impl #impl_generics ::mongo_client::FromDocument for #name #ty_generics #where_clause {
            #[allow(unused_mut)]
            fn from_document(
                mut __document: ::mongo_client::Document,
                __options: ::mongo_client::MappingOptions,
            ) -> ::std::result::Result<Self, ::mongo_client::TypeError> {
                #(#extractions)*
                #finish
                ::std::result::Result::Ok(Self {
                    #(#initializers),*
                })
            }
        }
    })
}

/// Derive macro for implementing `ToDocument`.
///
/// Fields are written in declaration order; expando keys follow and never
/// overwrite a declared field.
///
/// ## Attributes
///
/// - `#[mongo(rename = "key")]` - Write the field under a different key
/// - `#[mongo(skip)]` - Don't write this field
/// - `#[mongo(expando)]` - Append this document's keys
/// - `#[mongo(rename_all = "...")]` on the struct - Naming convention for all keys
#[proc_macro_derive(ToDocument, attributes(mongo))]
pub fn derive_to_document(input: TokenStream) -> TokenStream {
    let input = parse_macro_input!(input as DeriveInput);
    match impl_to_document(&input) {
        Ok(tokens) => tokens.into(),
        Err(err) => err.to_compile_error().into(),
    }
}

fn impl_to_document(input: &DeriveInput) -> syn::Result<TokenStream2> {
    let name = &input.ident;
    let (impl_generics, ty_generics, where_clause) = input.generics.split_for_impl();
    let fields = mapped_fields(input, "ToDocument")?;

    let mut inserts = Vec::new();
    let mut expando = None;
    let mut field_count = 0usize;

    for mapped in &fields {
        let field_name = mapped.field.ident.as_ref().unwrap();
        let key = &mapped.key;

        if mapped.config.skip {
            continue;
        }
        if mapped.config.expando {
            expando = Some(quote! {
                ::mongo_client::record::merge_expando(&mut __document, &self.#field_name);
            });
            continue;
        }
        field_count += 1;
        inserts.push(quote! {
            __document.insert(#key, ::mongo_client::ToValue::to_value(&self.#field_name)?);
        });
    }

    Ok(quote! {
        impl #impl_generics ::mongo_client::ToDocument for #name #ty_generics #where_clause {
            fn to_document(&self) -> ::std::result::Result<::mongo_client::Document, ::mongo_client::TypeError> {
                let mut __document = ::mongo_client::Document::with_capacity(#field_count);
                #(#inserts)*
                #expando
                ::std::result::Result::Ok(__document)
            }
        }
    })
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_rename_rules() {
        assert_eq!(apply_rename_all("full_name", Some("camelCase")), "fullName");
        assert_eq!(apply_rename_all("full_name", Some("PascalCase")), "FullName");
        assert_eq!(
            apply_rename_all("full_name", Some("SCREAMING_SNAKE_CASE")),
            "FULL_NAME"
        );
        assert_eq!(apply_rename_all("full_name", Some("lowercase")), "fullname");
        assert_eq!(apply_rename_all("full_name", Some("snake_case")), "full_name");
        assert_eq!(apply_rename_all("id", None), "id");
    }

    #[test]
    fn test_expando_must_be_document() {
        let input: DeriveInput = syn::parse_quote! {
            struct Bad {
                #[mongo(expando)]
                extra: String,
            }
        };
        assert!(impl_from_document(&input).is_err());
    }

    #[test]
    fn test_single_expando() {
        let input: DeriveInput = syn::parse_quote! {
            struct Bad {
                #[mongo(expando)]
                a: Document,
                #[mongo(expando)]
                b: Document,
            }
        };
        assert!(impl_to_document(&input).is_err());
    }

    #[test]
    fn test_unknown_attribute_rejected() {
        let input: DeriveInput = syn::parse_quote! {
            struct Bad {
                #[mongo(flatten)]
                a: i32,
            }
        };
        assert!(impl_from_document(&input).is_err());
    }

    #[test]
    fn test_tuple_struct_rejected() {
        let input: DeriveInput = syn::parse_quote! {
            struct Bad(i32);
        };
        assert!(impl_to_document(&input).is_err());
    }
}
