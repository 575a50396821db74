use proc_macro::TokenStream;
use quote::{quote, quote_spanned};
use syn::spanned::Spanned;

/// Turns `fn name(client: booker::ApiClient)` into a `#[test]` that runs
/// against a fresh stub booking service. An optional second parameter of
/// type `&booker::stub::StubServer` receives the stub itself.
///
/// `#[booking_test(configure)]` calls `configure(&mut booker::Configuration)`
/// before the client is built.
#[proc_macro_attribute]
pub fn booking_test(attrs: TokenStream, item: TokenStream) -> TokenStream {
    let input = syn::parse_macro_input!(item as syn::ItemFn);
    let args = syn::parse_macro_input!(attrs as syn::AttributeArgs);

    let configuration_function = match args.as_slice() {
        [] => None,
        [syn::NestedMeta::Meta(syn::Meta::Path(function_path))] => Some(function_path),
        [_] => {
            return quote! {
                compile_error!("The argument should be a configuration function!");
            }
            .into();
        }
        _ => {
            return quote! {
                compile_error!("At most one configuration function can be passed to the macro");
            }
            .into();
        }
    };

    let mut bindings = Vec::new();
    for argument in &input.sig.inputs {
        match argument {
            syn::FnArg::Typed(pat_type) => bindings.push((&pat_type.pat, &pat_type.ty)),
            syn::FnArg::Receiver(receiver) => {
                return quote_spanned! {receiver.span()=>
                    compile_error!("A booking test can't take self");
                }
                .into();
            }
        }
    }

    let (client_binding, stub_binding) = match bindings.as_slice() {
        [client] => (client, None),
        [client, stub] => (client, Some(stub)),
        _ => {
            return quote_spanned! {input.sig.span()=>
                compile_error!("A booking test takes the API client and, optionally, the stub server");
            }
            .into();
        }
    };

    let attributes = &input.attrs;
    let visibility = &input.vis;
    let block = &input.block;
    let mut signature = input.sig.clone();
    signature.inputs = syn::punctuated::Punctuated::new();

    let configure = configuration_function.map(|function_path| {
        quote! { #function_path(&mut __booker_configuration); }
    });

    let (client_pattern, client_type) = client_binding;
    let stub = stub_binding.map(|(stub_pattern, stub_type)| {
        quote! { let #stub_pattern: #stub_type = &__booker_stub; }
    });

    let output = quote! {
        #[test]
        #(#attributes)*
        #visibility #signature {
            booker::init_test_logging();

            let __booker_stub = booker::stub::StubServer::start()
                .expect("Couldn't start the stub booking service");
            #[allow(unused_mut)]
            let mut __booker_configuration = booker::Configuration::default()
                .with_value(booker::BASE_URL_KEY, __booker_stub.base_url())
                .with_value(booker::AUTH_USERNAME_KEY, booker::stub::DEFAULT_USERNAME)
                .with_value(booker::AUTH_PASSWORD_KEY, booker::stub::DEFAULT_PASSWORD);
            #configure

            let #client_pattern: #client_type = booker::ApiClient::new(__booker_configuration)
                .expect("Couldn't build the API client");
            #stub

            #block
        }
    };

    TokenStream::from(output)
}
