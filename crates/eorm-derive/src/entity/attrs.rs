//! Attribute parsing for the Entity derive macro.
//!
//! Handles struct-level and field-level `#[eorm(...)]` attributes.

use syn::{Attribute, LitStr, Result};

/// Struct-level `#[eorm(table = "...")]`.
#[derive(Default)]
pub(super) struct StructAttr {
    pub table: Option<String>,
}

/// Field-level `#[eorm(column = "...")]` / `#[eorm(skip)]`.
#[derive(Default)]
pub(super) struct FieldAttr {
    pub column: Option<String>,
    pub skip: bool,
}

pub(super) fn struct_attr(attrs: &[Attribute]) -> Result<StructAttr> {
    let mut out = StructAttr::default();
    for attr in attrs.iter().filter(|a| a.path().is_ident("eorm")) {
        attr.parse_nested_meta(|meta| {
            if meta.path.is_ident("table") {
                out.table = Some(non_empty(meta.value()?.parse()?)?);
                Ok(())
            } else {
                Err(meta.error("unknown eorm attribute, expected `table`"))
            }
        })?;
    }
    Ok(out)
}

pub(super) fn field_attr(attrs: &[Attribute]) -> Result<FieldAttr> {
    let mut out = FieldAttr::default();
    for attr in attrs.iter().filter(|a| a.path().is_ident("eorm")) {
        attr.parse_nested_meta(|meta| {
            if meta.path.is_ident("column") {
                out.column = Some(non_empty(meta.value()?.parse()?)?);
                Ok(())
            } else if meta.path.is_ident("skip") {
                out.skip = true;
                Ok(())
            } else {
                Err(meta.error("unknown eorm attribute, expected `column` or `skip`"))
            }
        })?;
    }
    if out.skip && out.column.is_some() {
        return Err(syn::Error::new(
            proc_macro2::Span::call_site(),
            "`skip` and `column` cannot be combined",
        ));
    }
    Ok(out)
}

fn non_empty(lit: LitStr) -> Result<String> {
    let value = lit.value();
    if value.trim().is_empty() {
        return Err(syn::Error::new_spanned(lit, "name cannot be empty"));
    }
    Ok(value)
}

#[cfg(test)]
mod tests {
    use super::*;
    use syn::parse_quote;

    fn first_field(input: syn::DeriveInput) -> syn::Field {
        match input.data {
            syn::Data::Struct(data) => data.fields.into_iter().next().unwrap(),
            _ => panic!("expected a struct"),
        }
    }

    #[test]
    fn parses_table() {
        let input: syn::DeriveInput = parse_quote! {
            #[eorm(table = "people")]
            struct Person { id: i64 }
        };
        assert_eq!(struct_attr(&input.attrs).unwrap().table.as_deref(), Some("people"));
    }

    #[test]
    fn parses_field_attrs() {
        let field = first_field(parse_quote! {
            struct User {
                #[eorm(column = "user_name")]
                name: String,
            }
        });
        let attr = field_attr(&field.attrs).unwrap();
        assert_eq!(attr.column.as_deref(), Some("user_name"));
        assert!(!attr.skip);

        let field = first_field(parse_quote! {
            struct User {
                #[eorm(skip)]
                cache: u32,
            }
        });
        assert!(field_attr(&field.attrs).unwrap().skip);
    }

    #[test]
    fn rejects_unknown_and_empty() {
        let field = first_field(parse_quote! {
            struct User {
                #[eorm(primary)]
                id: i64,
            }
        });
        assert!(field_attr(&field.attrs).is_err());

        let field = first_field(parse_quote! {
            struct User {
                #[eorm(column = "")]
                id: i64,
            }
        });
        assert!(field_attr(&field.attrs).is_err());
    }
}
