#![allow(unreachable_pub)]
#![allow(clippy::needless_pass_by_value)]

//! # Macros
//!
//! Procedural macros for the LedgerHub infrastructure.
//! Currently this is the home of the workspace error idiom only.

mod error;

use proc_macro::TokenStream;
use syn::{DeriveInput, parse_macro_input};

/// Attribute macro for defining domain-specific error enums.
///
/// Transforms a plain enum into the workspace error type:
///
/// * **Automatic Derives**: injects `#[derive(Debug, thiserror::Error)]` unless
///   already present.
/// * **Context Support**: generates a companion `<Name>Ext` trait that adds
///   `.context(...)` to `Result<T, Name>` and to `Result<T, Source>` for every
///   variant wrapping an upstream error.
/// * **Standard Conversions**: implements `From<Source>` for variants with a
///   `source` field (or a field marked `#[source]`/`#[from]`), enabling `?`.
/// * Emits the `format_context` helper referenced by `#[error(...)]` strings.
///
/// # Requirements
///
/// 1. The macro must be applied to an **enum** with named-field variants only.
/// 2. Variants that support context must carry
///    `context: Option<Cow<'static, str>>`.
/// 3. Variants wrapping upstream errors must pair the source field with a
///    context field, so `.context(...)` has somewhere to land.
///
/// # Example
///
/// ```rust,ignore
/// use lhub_derive::lhub_error;
/// use std::borrow::Cow;
///
/// #[lhub_error]
/// pub enum StoreError {
///     #[error("IO error{}: {source}", format_context(.context))]
///     Io {
///         #[source]
///         source: std::io::Error,
///         context: Option<Cow<'static, str>>,
///     },
///
///     #[error("Key not found{}: {message}", format_context(.context))]
///     KeyNotFound { message: Cow<'static, str>, context: Option<Cow<'static, str>> },
/// }
/// ```
#[proc_macro_attribute]
pub fn lhub_error(_args: TokenStream, item: TokenStream) -> TokenStream {
    let input = parse_macro_input!(item as DeriveInput);
    error::expand(input).into()
}
