use proc_macro::TokenStream;
use proc_macro2::TokenStream as TokenStream2;
use quote::quote;
use syn::{ItemFn, LitStr};

/// Proc macro to denote a Transaction
///
/// The function body is timed and its outcome recorded under the given request name. Without a
/// name the function name is used.
///
/// NOTE: Only works on async functions returning `Result<T, E>` where `E: Display`.
///
/// # Example
/// ```ignore
/// use ecommerce_load::prelude::*;
///
/// #[transaction("GET Users List")]
/// async fn list_users(gateway: &Gateway) -> Result<Response, RequestError> {
///     ...
/// }
/// ```
#[proc_macro_attribute]
pub fn transaction(attr: TokenStream, item: TokenStream) -> TokenStream {
    match transaction_internal(attr, item) {
        Ok(tokens) => tokens.into(),
        Err(err) => err.to_compile_error().into(),
    }
}

fn transaction_internal(attr: TokenStream, item: TokenStream) -> syn::Result<TokenStream2> {
    let input = syn::parse::<ItemFn>(item)?;

    let ItemFn {
        attrs,
        vis,
        sig,
        block,
    } = input;
    let stmts = &block.stmts;

    if sig.asyncness.is_none() {
        return Err(syn::Error::new_spanned(
            sig.fn_token,
            "#[transaction] only works on async functions",
        ));
    }

    let name = if attr.is_empty() {
        LitStr::new(&sig.ident.to_string(), sig.ident.span())
    } else {
        syn::parse::<LitStr>(attr)?
    };

    Ok(quote! {
        #(#attrs)* #vis #sig {
            ::ecommerce_load::transaction::transaction_hook(#name, async move {
                #(#stmts)*
            }).await
        }
    })
}
