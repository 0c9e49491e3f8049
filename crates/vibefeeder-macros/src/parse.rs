//! Parsing of `#[validate(...)]` field attributes.

use syn::{
    parse::{Parse, ParseStream},
    punctuated::Punctuated,
    spanned::Spanned,
    Attribute, Expr, ExprLit, Lit, LitStr, Meta, Token,
};

/// Parsed contents of one `#[validate(...)]` attribute.
#[derive(Debug, Default, PartialEq, Eq)]
pub struct ValidateAttrs {
    /// Comma-separated rule list, e.g. `required,min=3`.
    pub rules: String,
    /// Key override for the field-error map.
    pub rename: Option<String>,
}

impl Parse for ValidateAttrs {
    fn parse(input: ParseStream) -> syn::Result<Self> {
        // Shorthand: #[validate("required,email")]
        if input.peek(LitStr) {
            let rules: LitStr = input.parse()?;
            if !input.is_empty() {
                return Err(input.error("unexpected tokens after rule string"));
            }
            return Ok(Self {
                rules: rules.value(),
                rename: None,
            });
        }

        let mut rules = None;
        let mut rename = None;

        let meta_list: Punctuated<Meta, Token![,]> = Punctuated::parse_terminated(input)?;

        for meta in meta_list {
            let Meta::NameValue(nv) = meta else {
                return Err(syn::Error::new(meta.span(), "expected name = \"value\""));
            };

            let ident = nv
                .path
                .get_ident()
                .ok_or_else(|| syn::Error::new(nv.path.span(), "expected identifier"))?
                .to_string();

            let value = match &nv.value {
                Expr::Lit(ExprLit {
                    lit: Lit::Str(s), ..
                }) => s.value(),
                _ => return Err(syn::Error::new(nv.value.span(), "expected string literal")),
            };

            match ident.as_str() {
                "rules" => rules = Some(value),
                "rename" => rename = Some(value),
                _ => {
                    return Err(syn::Error::new(
                        nv.path.span(),
                        format!("unknown attribute: {ident}"),
                    ))
                }
            }
        }

        Ok(Self {
            rules: rules.unwrap_or_default(),
            rename,
        })
    }
}

impl ValidateAttrs {
    /// Finds and parses the `validate` attribute among a field's attributes.
    ///
    /// Returns `Ok(None)` when the field carries no such attribute.
    pub fn from_attributes(attrs: &[Attribute]) -> syn::Result<Option<Self>> {
        let mut found = None;
        for attr in attrs.iter().filter(|a| a.path().is_ident("validate")) {
            if found.is_some() {
                return Err(syn::Error::new(attr.span(), "duplicate validate attribute"));
            }
            found = Some(attr.parse_args::<Self>()?);
        }
        Ok(found)
    }
}
