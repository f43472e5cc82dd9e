use proc_macro::TokenStream;
use quote::quote;
use syn::{ItemFn, parse_macro_input, spanned::Spanned};

/// Marks a function as a test.
///
/// Sync functions become plain `#[test]` functions. Async functions are
/// driven to completion on the current thread with
/// `futures::executor::block_on`, so timers and local tasks spawned by the
/// body keep running until the body returns.
#[proc_macro_attribute]
pub fn test(attr: TokenStream, item: TokenStream) -> TokenStream {
  let raw_args = proc_macro2::TokenStream::from(attr);
  if !raw_args.is_empty() {
    return TokenStream::from(
      syn::Error::new(raw_args.span(), "rxclock_macro::test does not take arguments")
        .to_compile_error(),
    );
  }

  let mut input = parse_macro_input!(item as ItemFn);
  if input.sig.asyncness.is_none() {
    return TokenStream::from(quote! {
      #[test]
      #input
    });
  }

  if !input.sig.inputs.is_empty() {
    return TokenStream::from(
      syn::Error::new(input.sig.inputs.span(), "async tests cannot take parameters")
        .to_compile_error(),
    );
  }

  input.sig.asyncness = None;
  let body = &input.block;
  let attrs = &input.attrs;
  let vis = &input.vis;
  let sig = &input.sig;

  TokenStream::from(quote! {
    #[test]
    #(#attrs)*
    #vis #sig {
      ::futures::executor::block_on(async move #body)
    }
  })
}
