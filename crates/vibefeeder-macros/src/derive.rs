//! Expansion of `#[derive(Validate)]`.

use proc_macro2::TokenStream;
use quote::quote;
use syn::{spanned::Spanned, Data, DeriveInput, Fields, LitStr};

use crate::parse::ValidateAttrs;

/// Expands the derive into an `impl Validate` block.
pub fn expand_validate(item: TokenStream) -> syn::Result<TokenStream> {
    let input: DeriveInput = syn::parse2(item)?;

    let Data::Struct(data) = &input.data else {
        return Err(syn::Error::new(
            input.ident.span(),
            "Validate can only be derived for structs",
        ));
    };
    let Fields::Named(named) = &data.fields else {
        return Err(syn::Error::new(
            data.fields.span(),
            "Validate requires a struct with named fields",
        ));
    };

    let mut entries = Vec::new();
    for field in &named.named {
        let Some(attrs) = ValidateAttrs::from_attributes(&field.attrs)? else {
            continue;
        };
        let Some(ident) = &field.ident else {
            continue;
        };

        let key = attrs
            .rename
            .unwrap_or_else(|| ident.to_string().trim_start_matches("r#").to_string());
        let key = LitStr::new(&key, ident.span());
        let rules = LitStr::new(&attrs.rules, ident.span());

        entries.push(quote! {
            ::vibefeeder_validate::Field::new(
                #key,
                #rules,
                ::vibefeeder_validate::AsFieldValue::as_field_value(&self.#ident),
            )
        });
    }

    let name = &input.ident;
    let (impl_generics, ty_generics, where_clause) = input.generics.split_for_impl();

    Ok(quote! {
        impl #impl_generics ::vibefeeder_validate::Validate for #name #ty_generics #where_clause {
            fn fields(&self) -> ::std::vec::Vec<::vibefeeder_validate::Field<'_>> {
                ::std::vec![#(#entries),*]
            }
        }
    })
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_expand_named_struct() {
        let item = quote! {
            struct Signup {
                #[validate("required,email")]
                email: String,
                #[validate(rules = "required,http_url", rename = "URL")]
                url: String,
                ignored: u32,
            }
        };
        let output = expand_validate(item).unwrap().to_string();
        assert!(output.contains("impl :: vibefeeder_validate :: Validate for Signup"));
        assert!(output.contains("\"email\""));
        assert!(output.contains("\"required,email\""));
        assert!(output.contains("\"URL\""));
        assert!(!output.contains("ignored"));
    }

    #[test]
    fn test_expand_generic_struct() {
        let item = quote! {
            struct Wrapper<T: Clone> {
                #[validate("required")]
                value: T,
            }
        };
        let output = expand_validate(item).unwrap().to_string();
        assert!(output.contains("Wrapper < T >"));
    }

    #[test]
    fn test_tuple_struct_is_rejected() {
        let item = quote! { struct Pair(String, String); };
        assert!(expand_validate(item).is_err());
    }

    #[test]
    fn test_enum_is_rejected() {
        let item = quote! { enum Choice { A, B } };
        assert!(expand_validate(item).is_err());
    }
}
