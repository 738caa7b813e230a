//! Derive macros for eorm
//!
//! Provides `#[derive(Entity)]`.

use proc_macro::TokenStream;
use syn::{DeriveInput, parse_macro_input};

mod common;
mod entity;

/// Derive the `Entity` trait for a struct with named fields.
///
/// # Example
///
/// ```ignore
/// use eorm::Entity;
///
/// #[derive(Debug, Default, Entity)]
/// #[eorm(table = "users")]
/// struct User {
///     id: i64,
///     #[eorm(column = "user_name")]
///     name: String,
///     email: Option<String>,
///     #[eorm(skip)]
///     cached_score: u32,
/// }
/// ```
///
/// # Attributes
///
/// - `#[eorm(table = "name")]` - Table name (default: naming strategy applied to the type name)
/// - `#[eorm(column = "name")]` - Map field to a different column name
/// - `#[eorm(skip)]` - Leave the field unmapped (it keeps its `Default` value when scanned)
///
/// `Option<T>` fields map to nullable columns. Every mapped field type must implement
/// `Into<eorm::Value>`, `eorm::FromValue` and `Clone`.
#[proc_macro_derive(Entity, attributes(eorm))]
pub fn derive_entity(input: TokenStream) -> TokenStream {
    let input = parse_macro_input!(input as DeriveInput);
    entity::expand(input)
        .unwrap_or_else(|e| e.to_compile_error())
        .into()
}
