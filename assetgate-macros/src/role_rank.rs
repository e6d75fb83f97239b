//! RoleRank macro implementation
//!
//! Generates a static rank table from `#[rank(n)]` variant attributes

use proc_macro2::TokenStream;
use quote::quote;
use syn::{parse2, Attribute, Data, DeriveInput, Error, Fields, LitInt, Result};

pub fn derive_role_rank(input: TokenStream) -> Result<TokenStream> {
    let input: DeriveInput = parse2(input)?;
    let name = &input.ident;

    let Data::Enum(data_enum) = &input.data else {
        return Err(Error::new_spanned(&input, "RoleRank can only be derived for enums"));
    };

    if data_enum.variants.is_empty() {
        return Err(Error::new_spanned(&input, "RoleRank requires at least one variant"));
    }

    let mut all_variants = Vec::new();
    let mut match_arms = Vec::new();

    for variant in &data_enum.variants {
        let variant_name = &variant.ident;

        if !matches!(variant.fields, Fields::Unit) {
            return Err(Error::new_spanned(
                variant,
                "RoleRank only supports unit variants (no fields)",
            ));
        }

        all_variants.push(quote! { #name::#variant_name });

        // A variant without #[rank] is left out of the table and fails closed
        let arm = match extract_rank(&variant.attrs)? {
            Some(rank) => quote! { #name::#variant_name => ::core::option::Option::Some(#rank), },
            None => quote! { #name::#variant_name => ::core::option::Option::None, },
        };
        match_arms.push(arm);
    }

    Ok(quote! {
        impl #name {
            /// Every declared variant, in declaration order
            pub const ALL: &'static [#name] = &[#(#all_variants),*];

            /// Rank declared with `#[rank(n)]`, or `None` when the variant has none
            pub fn rank(&self) -> ::core::option::Option<u8> {
                match self {
                    #(#match_arms)*
                }
            }

            /// The declared rank table, skipping variants without a rank
            pub fn declared_ranks() -> ::std::vec::Vec<(#name, u8)> {
                Self::ALL
                    .iter()
                    .filter_map(|variant| variant.rank().map(|rank| (*variant, rank)))
                    .collect()
            }
        }
    })
}

/// Extract the rank from `#[rank(n)]`
fn extract_rank(attrs: &[Attribute]) -> Result<Option<u8>> {
    let mut rank = None;

    for attr in attrs {
        if !attr.path().is_ident("rank") {
            continue;
        }

        if rank.is_some() {
            return Err(Error::new_spanned(attr, "duplicate #[rank] attribute"));
        }

        let lit: LitInt = attr.parse_args()?;
        rank = Some(lit.base10_parse::<u8>()?);
    }

    Ok(rank)
}
