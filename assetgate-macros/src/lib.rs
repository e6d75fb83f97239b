//! Procedural macros for AssetGate
//!
//! This crate provides the derive macros used to declare role tables for the
//! AssetGate access-control core.

use proc_macro::TokenStream;

mod role_rank;

/// Derive macro for declaring a role hierarchy on a unit-only enum
///
/// Each variant may carry a `#[rank(n)]` attribute (`n` fits in a `u8`). The macro
/// generates:
/// - `ALL`: every variant in declaration order
/// - `rank(&self) -> Option<u8>`: the declared rank, `None` for unranked variants
/// - `declared_ranks() -> Vec<(Self, u8)>`: the rank table (requires `Copy`)
///
/// Higher ranks are more privileged. Unranked variants are treated as a
/// configuration error by the evaluator and never granted access.
///
/// # Example
///
/// ```rust,ignore
/// use assetgate_macros::RoleRank;
///
/// #[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, RoleRank)]
/// pub enum Role {
///     #[rank(1)]
///     Employee,
///
///     #[rank(2)]
///     Admin,
/// }
///
/// assert_eq!(Role::Admin.rank(), Some(2));
/// ```
#[proc_macro_derive(RoleRank, attributes(rank))]
pub fn derive_role_rank(input: TokenStream) -> TokenStream {
    role_rank::derive_role_rank(input.into())
        .unwrap_or_else(|e| e.to_compile_error())
        .into()
}
