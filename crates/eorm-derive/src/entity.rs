//! Entity derive macro implementation

mod attrs;

use crate::common::syn_types::is_nullable;
use proc_macro2::TokenStream;
use quote::quote;
use syn::ext::IdentExt;
use syn::{Data, DeriveInput, Fields, Result};

pub fn expand(input: DeriveInput) -> Result<TokenStream> {
    let name = &input.ident;
    let (impl_generics, ty_generics, where_clause) = input.generics.split_for_impl();

    let fields = match &input.data {
        Data::Struct(data) => match &data.fields {
            Fields::Named(fields) => &fields.named,
            _ => {
                return Err(syn::Error::new_spanned(
                    &input,
                    "Entity can only be derived for structs with named fields",
                ));
            }
        },
        _ => {
            return Err(syn::Error::new_spanned(
                &input,
                "Entity can only be derived for structs",
            ));
        }
    };

    let struct_attr = attrs::struct_attr(&input.attrs)?;
    let table_name = match struct_attr.table {
        Some(table) => quote! { ::core::option::Option::Some(#table) },
        None => quote! { ::core::option::Option::None },
    };
    let entity_name = name.to_string();

    let mut defs = Vec::new();
    let mut reads = Vec::new();
    let mut writes = Vec::new();
    for field in fields {
        let attr = attrs::field_attr(&field.attrs)?;
        if attr.skip {
            continue;
        }
        let Some(ident) = field.ident.as_ref() else {
            continue;
        };
        let index = defs.len();
        let field_name = ident.unraw().to_string();

        let mut def = quote! { ::eorm::FieldDef::new(#field_name) };
        if let Some(column) = &attr.column {
            def = quote! { #def.column(#column) };
        }
        if is_nullable(&field.ty) {
            def = quote! { #def.nullable() };
        }
        defs.push(def);

        reads.push(quote! {
            ::eorm::Value::from(::core::clone::Clone::clone(&self.#ident))
        });
        writes.push(quote! {
            #index => self.#ident = ::eorm::FromValue::from_value(value)?,
        });
    }

    Ok(quote! {
        impl #impl_generics ::eorm::Entity for #name #ty_generics #where_clause {
            fn entity_name() -> &'static str {
                #entity_name
            }

            fn table_name() -> ::core::option::Option<&'static str> {
                #table_name
            }

            fn fields() -> &'static [::eorm::FieldDef] {
                const FIELDS: &[::eorm::FieldDef] = &[#(#defs),*];
                FIELDS
            }

            fn values(&self) -> ::std::vec::Vec<::eorm::Value> {
                ::std::vec![#(#reads),*]
            }

            #[allow(unused_variables)]
            fn set_value(
                &mut self,
                index: usize,
                value: ::eorm::Value,
            ) -> ::core::result::Result<(), ::eorm::ValueError> {
                match index {
                    #(#writes)*
                    _ => {}
                }
                ::core::result::Result::Ok(())
            }
        }
    })
}
