//! Procedural macros for the faas-runtime invocation adapter.
//!
//! This crate provides the `#[faas_handler]` attribute, which turns a plain
//! function of shape `(Event, Context) -> Result<Response, HandlerError>`
//! into a type implementing `faas_runtime::Handler`.
//!
//! # Example
//!
//! ```ignore
//! use faas_runtime::prelude::*;
//!
//! #[faas_handler]
//! async fn greet(event: Event, ctx: Context) -> Result<Response, HandlerError> {
//!     Ok(Response::json(serde_json::json!({ "path": event.path })))
//! }
//!
//! let adapter = Adapter::new("greeter", GreetHandler);
//! ```

use proc_macro::TokenStream;
use quote::{format_ident, quote};
use syn::{
    parse_macro_input, punctuated::Punctuated, Expr, ExprLit, FnArg, ItemFn, Lit, Meta, Token,
};

/// Attributes for the `#[faas_handler]` macro.
#[derive(Default, Debug)]
struct HandlerAttrs {
    /// Override for the generated struct name.
    name: Option<String>,
}

impl HandlerAttrs {
    fn parse_meta_list(metas: Punctuated<Meta, Token![,]>) -> syn::Result<Self> {
        let mut attrs = HandlerAttrs::default();

        for meta in metas {
            match meta {
                Meta::NameValue(nv) => {
                    let ident = nv
                        .path
                        .get_ident()
                        .ok_or_else(|| syn::Error::new_spanned(&nv.path, "expected identifier"))?
                        .to_string();

                    let lit = match &nv.value {
                        Expr::Lit(ExprLit { lit, .. }) => lit.clone(),
                        _ => return Err(syn::Error::new_spanned(&nv.value, "expected literal")),
                    };

                    match (ident.as_str(), lit) {
                        ("name", Lit::Str(lit_str)) => attrs.name = Some(lit_str.value()),
                        ("name", other) => {
                            return Err(syn::Error::new_spanned(other, "name must be a string"));
                        }
                        _ => {
                            return Err(syn::Error::new_spanned(
                                nv.path,
                                format!("unknown attribute: {}", ident),
                            ));
                        }
                    }
                }
                _ => return Err(syn::Error::new_spanned(meta, "expected name = value")),
            }
        }

        Ok(attrs)
    }
}

/// Generates a unit struct implementing `faas_runtime::Handler` that calls
/// the annotated function.
///
/// The struct is named after the function in PascalCase with a `Handler`
/// suffix (`fn resize_image` becomes `ResizeImageHandler`) unless
/// `name = "..."` is given. Both `async fn` and plain `fn` are accepted; the
/// function itself is left untouched and stays callable.
#[proc_macro_attribute]
pub fn faas_handler(args: TokenStream, input: TokenStream) -> TokenStream {
    let args = parse_macro_input!(args with Punctuated::<Meta, Token![,]>::parse_terminated);
    let input_fn = parse_macro_input!(input as ItemFn);

    match generate_handler(args, input_fn) {
        Ok(tokens) => tokens.into(),
        Err(err) => err.to_compile_error().into(),
    }
}

fn generate_handler(
    args: Punctuated<Meta, Token![,]>,
    input_fn: ItemFn,
) -> syn::Result<proc_macro2::TokenStream> {
    let attrs = HandlerAttrs::parse_meta_list(args)?;

    let inputs = &input_fn.sig.inputs;
    if inputs.len() != 2 || inputs.iter().any(|arg| matches!(arg, FnArg::Receiver(_))) {
        return Err(syn::Error::new_spanned(
            &input_fn.sig,
            "faas_handler expects a free function taking (Event, Context)",
        ));
    }
    if !input_fn.sig.generics.params.is_empty() {
        return Err(syn::Error::new_spanned(
            &input_fn.sig.generics,
            "faas_handler does not support generic functions",
        ));
    }

    let fn_name = &input_fn.sig.ident;
    let struct_name = match attrs.name {
        Some(name) => format_ident!("{}", name),
        None => format_ident!("{}Handler", to_pascal_case(&fn_name.to_string())),
    };
    let fn_vis = &input_fn.vis;

    let call = if input_fn.sig.asyncness.is_some() {
        quote! { #fn_name(event, ctx).await }
    } else {
        quote! { #fn_name(event, ctx) }
    };

    let expanded = quote! {
        #input_fn

        /// Generated handler wrapping the annotated function.
        #[derive(Debug, Default, Clone, Copy)]
        #fn_vis struct #struct_name;

        #[faas_runtime::prelude::async_trait]
        impl faas_runtime::prelude::Handler for #struct_name {
            async fn invoke(
                &self,
                event: faas_runtime::prelude::Event,
                ctx: faas_runtime::prelude::Context,
            ) -> ::std::result::Result<
                faas_runtime::prelude::Response,
                faas_runtime::prelude::HandlerError,
            > {
                #call
            }
        }
    };

    Ok(expanded)
}

/// Convert a snake_case string to PascalCase.
fn to_pascal_case(s: &str) -> String {
    s.split('_')
        .map(|word| {
            let mut chars = word.chars();
            match chars.next() {
                None => String::new(),
                Some(first) => first.to_uppercase().chain(chars).collect(),
            }
        })
        .collect()
}
