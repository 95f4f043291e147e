//! jbridge Macros - Derive support for host enum keys
//!
//! This crate provides `#[derive(ForeignEnum)]`, which binds a fieldless host
//! enum to a foreign enumerated type so it can be used as the key of a
//! `JavaEnum<K>` and passed across the bridge.

use proc_macro::TokenStream;
use proc_macro2::Span;
use quote::quote;
use syn::{
    parse::{Parse, ParseStream},
    parse_macro_input, Data, DeriveInput, Fields, Lit, Token,
};

/// Parsed `#[foreign(...)]` attributes
#[derive(Default)]
struct ForeignAttrs {
    /// Foreign type name (enum level)
    class: Option<String>,
    /// Foreign constant name (variant level)
    name: Option<String>,
}

impl Parse for ForeignAttrs {
    fn parse(input: ParseStream) -> syn::Result<Self> {
        let mut attrs = ForeignAttrs::default();

        while !input.is_empty() {
            let ident: syn::Ident = input.parse()?;
            input.parse::<Token![=]>()?;

            let value = match input.parse::<Lit>()? {
                Lit::Str(s) => s.value(),
                other => return Err(syn::Error::new(other.span(), "expected a string literal")),
            };

            match ident.to_string().as_str() {
                "class" => attrs.class = Some(value),
                "name" => attrs.name = Some(value),
                _ => {
                    return Err(syn::Error::new(ident.span(), "unknown attribute"));
                }
            }

            if input.peek(Token![,]) {
                input.parse::<Token![,]>()?;
            }
        }

        Ok(attrs)
    }
}

/// Merge every `#[foreign(...)]` attribute in `attrs`
fn foreign_attrs(attrs: &[syn::Attribute]) -> syn::Result<ForeignAttrs> {
    let mut merged = ForeignAttrs::default();
    for attr in attrs.iter().filter(|a| a.path().is_ident("foreign")) {
        let parsed: ForeignAttrs = attr.parse_args()?;
        merged.class = parsed.class.or(merged.class);
        merged.name = parsed.name.or(merged.name);
    }
    Ok(merged)
}

/// Derive the foreign constant name from a variant (e.g., "BlockBreak" -> "BLOCK_BREAK")
fn screaming_snake(ident: &str) -> String {
    let chars: Vec<char> = ident.chars().collect();
    let mut out = String::with_capacity(ident.len() + 4);
    for (i, &c) in chars.iter().enumerate() {
        if c.is_uppercase() && i > 0 {
            let prev = chars[i - 1];
            let next_lower = chars.get(i + 1).is_some_and(|n| n.is_lowercase());
            if prev.is_lowercase() || prev.is_ascii_digit() || (prev.is_uppercase() && next_lower) {
                out.push('_');
            }
        }
        out.extend(c.to_uppercase());
    }
    out
}

/// Derive macro binding a host enum to a foreign enumerated type.
///
/// # Attributes
///
/// - `#[foreign(class = "...")]` (required, on the enum): foreign type name
/// - `#[foreign(name = "...")]` (optional, on a variant): foreign constant
///   name, defaults to the variant name in SCREAMING_SNAKE_CASE
///
/// # Example
///
/// ```ignore
/// #[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, ForeignEnum)]
/// #[foreign(class = "org.bukkit.GameMode")]
/// enum GameMode {
///     Survival,
///     Creative,
///     #[foreign(name = "SPECTATOR")]
///     Ghost,
/// }
/// ```
///
/// This generates:
/// - `impl EnumKey for GameMode` with the foreign type and constant names
/// - `impl Bridged for GameMode` converting through the bound `JavaEnum`
#[proc_macro_derive(ForeignEnum, attributes(foreign))]
pub fn derive_foreign_enum(input: TokenStream) -> TokenStream {
    let input = parse_macro_input!(input as DeriveInput);
    match expand_foreign_enum(&input) {
        Ok(tokens) => tokens.into(),
        Err(e) => e.to_compile_error().into(),
    }
}

fn expand_foreign_enum(input: &DeriveInput) -> syn::Result<proc_macro2::TokenStream> {
    let Data::Enum(data) = &input.data else {
        return Err(syn::Error::new(
            Span::call_site(),
            "ForeignEnum can only be derived for enums",
        ));
    };

    let class = foreign_attrs(&input.attrs)?.class.ok_or_else(|| {
        syn::Error::new(
            input.ident.span(),
            "missing required attribute #[foreign(class = \"...\")]",
        )
    })?;

    let mut variants = Vec::new();
    let mut names = Vec::new();
    for variant in &data.variants {
        if !matches!(variant.fields, Fields::Unit) {
            return Err(syn::Error::new_spanned(
                variant,
                "ForeignEnum variants cannot carry fields",
            ));
        }
        let name = foreign_attrs(&variant.attrs)?
            .name
            .unwrap_or_else(|| screaming_snake(&variant.ident.to_string()));
        if names.contains(&name) {
            return Err(syn::Error::new_spanned(
                variant,
                format!("duplicate foreign constant name {}", name),
            ));
        }
        variants.push(&variant.ident);
        names.push(name);
    }

    let ident = &input.ident;
    let (impl_generics, ty_generics, where_clause) = input.generics.split_for_impl();

    Ok(quote! {
        impl #impl_generics ::jbridge::EnumKey for #ident #ty_generics #where_clause {
            const FOREIGN_TYPE: &'static str = #class;
            const ALL: &'static [Self] = &[#(Self::#variants),*];

            fn name(self) -> &'static str {
                match self {
                    #(Self::#variants => #names,)*
                }
            }
        }

        impl #impl_generics ::jbridge::Bridged for #ident #ty_generics #where_clause {
            fn from_foreign(
                bridge: &::jbridge::Bridge,
                value: ::jbridge::Value,
            ) -> ::jbridge::BridgeResult<Self> {
                ::jbridge::enums::key_from_foreign(bridge, value)
            }

            fn to_foreign(
                &self,
                bridge: &::jbridge::Bridge,
            ) -> ::jbridge::BridgeResult<::jbridge::Value> {
                ::jbridge::enums::key_to_foreign(bridge, *self)
            }
        }
    })
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_screaming_snake() {
        assert_eq!(screaming_snake("Survival"), "SURVIVAL");
        assert_eq!(screaming_snake("BlockStoneBreak"), "BLOCK_STONE_BREAK");
        assert_eq!(screaming_snake("HTTPServer"), "HTTP_SERVER");
        assert_eq!(screaming_snake("Music2Disc"), "MUSIC2_DISC");
    }

    #[test]
    fn test_parse_attrs() {
        let attrs: ForeignAttrs = syn::parse_str(r#"class = "org.bukkit.GameMode""#).unwrap();
        assert_eq!(attrs.class.as_deref(), Some("org.bukkit.GameMode"));
        assert!(attrs.name.is_none());

        let err = syn::parse_str::<ForeignAttrs>(r#"kind = "x""#);
        assert!(err.is_err());
    }

    #[test]
    fn test_rejects_tuple_variants() {
        let input: DeriveInput = syn::parse_str(
            r#"#[foreign(class = "t.T")] enum T { A(u8) }"#,
        )
        .unwrap();
        assert!(expand_foreign_enum(&input).is_err());
    }

    #[test]
    fn test_requires_class() {
        let input: DeriveInput = syn::parse_str("enum T { A }").unwrap();
        assert!(expand_foreign_enum(&input).is_err());
    }
}
