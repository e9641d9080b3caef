use proc_macro2::TokenStream;
use quote::{format_ident, quote};
use syn::{Data, DeriveInput, Fields, Ident, Type, Variant};

struct ErrorVariant<'a> {
    ident: &'a Ident,
    source: Option<(&'a Ident, &'a Type)>,
    has_context: bool,
}

pub(crate) fn expand(input: DeriveInput) -> TokenStream {
    let name = &input.ident;
    let trait_name = format_ident!("{name}Ext");

    let Data::Enum(data) = &input.data else {
        return quote! { compile_error!("lhub_error can only be applied to enums"); };
    };

    let mut variants = Vec::with_capacity(data.variants.len());
    for v in &data.variants {
        match inspect_variant(v) {
            Ok(meta) => variants.push(meta),
            Err(err) => return err,
        }
    }

    let derives = missing_derives(&input);
    let context_arms = variants.iter().filter(|v| v.has_context).map(|v| {
        let ident = v.ident;
        quote! { #name::#ident { context: c, .. } => *c = Some(context.into()), }
    });
    let from_impls = variants.iter().filter_map(|v| {
        let (field, ty) = v.source?;
        let ident = v.ident;
        Some(quote! {
            #[automatically_derived]
            impl From<#ty> for #name {
                #[inline]
                fn from(#field: #ty) -> Self { Self::#ident { #field, context: None } }
            }

            impl<T> #trait_name<T> for std::result::Result<T, #ty> {
                #[inline]
                fn context(self, context: impl Into<std::borrow::Cow<'static, str>>) -> std::result::Result<T, #name> {
                    self.map_err(|#field| #name::#ident { #field, context: Some(context.into()) })
                }
            }
        })
    });

    quote! {
        #[allow(non_shorthand_field_patterns)]
        #derives
        #input

        pub trait #trait_name<T> {
            fn context(self, context: impl Into<std::borrow::Cow<'static, str>>) -> Result<T, #name>;
        }

        #[automatically_derived]
        impl<T> #trait_name<T> for Result<T, #name> {
            #[inline]
            fn context(self, context: impl Into<std::borrow::Cow<'static, str>>) -> Self {
                self.map_err(|mut e| {
                    match &mut e {
                        #( #context_arms )*
                        _ => {}
                    }
                    e
                })
            }
        }

        #( #from_impls )*

        #[allow(dead_code)]
        fn format_context(context: &Option<std::borrow::Cow<'static, str>>) -> std::borrow::Cow<'static, str> {
            context.as_ref().map_or(std::borrow::Cow::Borrowed(""), |c| std::borrow::Cow::Owned(format!(" ({c})")))
        }
    }
}

fn inspect_variant(v: &Variant) -> Result<ErrorVariant<'_>, TokenStream> {
    let Fields::Named(fields) = &v.fields else {
        return Err(syn::Error::new_spanned(
            v,
            "lhub_error requires named fields for source/context handling",
        )
        .to_compile_error());
    };

    let mut source = None;
    let mut has_context = false;
    for field in &fields.named {
        let Some(ident) = &field.ident else { continue };
        let marked =
            field.attrs.iter().any(|a| a.path().is_ident("source") || a.path().is_ident("from"));
        if ident == "source" || marked {
            source = Some((ident, &field.ty));
        } else if ident == "context" {
            if !is_context_type(&field.ty) {
                return Err(syn::Error::new_spanned(
                    &field.ty,
                    "context field must be Option<Cow<'static, str>>",
                )
                .to_compile_error());
            }
            has_context = true;
        }
    }

    if source.is_some() && !has_context {
        return Err(syn::Error::new_spanned(
            &v.ident,
            "lhub_error requires `context: Option<Cow<'static, str>>` for variants with a source",
        )
        .to_compile_error());
    }

    Ok(ErrorVariant { ident: &v.ident, source, has_context })
}

/// Injects `Debug`/`thiserror::Error` unless the enum already derives them.
fn missing_derives(input: &DeriveInput) -> TokenStream {
    let mut has_debug = false;
    let mut has_error = false;

    for attr in &input.attrs {
        if !attr.path().is_ident("derive") {
            continue;
        }
        let _ = attr.parse_nested_meta(|meta| {
            if let Some(last) = meta.path.segments.last() {
                match last.ident.to_string().as_str() {
                    "Debug" => has_debug = true,
                    "Error" => has_error = true,
                    _ => {}
                }
            }
            Ok(())
        });
    }

    let mut tokens = Vec::new();
    if !has_debug {
        tokens.push(quote! { Debug });
    }
    if !has_error {
        tokens.push(quote! { ::thiserror::Error });
    }
    if tokens.is_empty() { quote! {} } else { quote! { #[derive(#(#tokens),*)] } }
}

fn is_context_type(ty: &Type) -> bool {
    // Walks Option < Cow < 'static, str > > structurally; aliases are rejected.
    let Type::Path(path) = ty else { return false };
    let Some(outer) = path.path.segments.last() else { return false };
    if outer.ident != "Option" {
        return false;
    }
    let syn::PathArguments::AngleBracketed(args) = &outer.arguments else { return false };
    let Some(syn::GenericArgument::Type(Type::Path(inner))) = args.args.first() else {
        return false;
    };
    let Some(cow) = inner.path.segments.last() else { return false };
    if cow.ident != "Cow" {
        return false;
    }
    let syn::PathArguments::AngleBracketed(cow_args) = &cow.arguments else { return false };
    let mut cow_args = cow_args.args.iter();
    match (cow_args.next(), cow_args.next()) {
        (
            Some(syn::GenericArgument::Lifetime(lt)),
            Some(syn::GenericArgument::Type(Type::Path(p))),
        ) => lt.ident == "static" && p.path.segments.last().is_some_and(|s| s.ident == "str"),
        _ => false,
    }
}
