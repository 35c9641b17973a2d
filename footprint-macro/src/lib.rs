use syn::{parse2, Block, FnArg, Ident, ImplItem, ItemFn, ItemImpl, LitBool, Pat, ReturnType, Signature, Type};
use syn::ext::IdentExt;
use syn::parse::Parser;
use syn::visit::Visit;
use quote::quote;
use proc_macro::TokenStream;
use proc_macro2::TokenStream as TokenStream2;

/// Methods `#[footprint_all]` never wraps: rendering a receiver goes through them.
const DENYLIST: &[&str] = &["fmt", "to_string"];

/// Logs every call of the function: a `CALL` header with the argument
/// values, then `END` (with the returned value, if the signature declares
/// one) once the body finishes.
///
/// Options:
/// * `skip(a, b)` leaves parameters out of the header
/// * `returns = false` logs a bare `END` even though a value is returned
///
/// Values are rendered as quoted strings, then through `Display`, then
/// `Debug`, and otherwise as `<Type>`. The choice is made from what is known
/// where the function is written: a generic `T` renders as `<Type>` unless
/// the function bounds it with `Display` or `Debug`.
///
/// `const fn`s are rejected.
#[proc_macro_attribute]
pub fn footprint(attr: TokenStream, item: TokenStream) -> TokenStream {
    footprint_impl(attr.into(), item.into())
        .unwrap_or_else(syn::Error::into_compile_error)
        .into()
}

/// Applies `#[footprint]` to every method of an `impl` block, except `fmt`,
/// `to_string`, names listed in `skip(...)`, `const fn`s, and methods marked
/// `#[no_footprint]` or already carrying `#[footprint]`.
#[proc_macro_attribute]
pub fn footprint_all(attr: TokenStream, item: TokenStream) -> TokenStream {
    footprint_all_impl(attr.into(), item.into())
        .unwrap_or_else(syn::Error::into_compile_error)
        .into()
}

/// Keeps a method out of `#[footprint_all]`. On its own it changes nothing.
#[proc_macro_attribute]
pub fn no_footprint(attr: TokenStream, item: TokenStream) -> TokenStream {
    let attr: TokenStream2 = attr.into();
    if !attr.is_empty() {
        return syn::Error::new_spanned(attr, "no_footprint takes no arguments")
            .into_compile_error()
            .into();
    }

    item
}

/// Panics with `Function <name> output is None!` when the function returns `None`.
#[proc_macro_attribute]
pub fn not_none(attr: TokenStream, item: TokenStream) -> TokenStream {
    not_none_impl(attr.into(), item.into())
        .unwrap_or_else(syn::Error::into_compile_error)
        .into()
}

#[derive(Default)]
struct Options {
    skip: Vec<Ident>,
    returns: Option<bool>,
}

fn parse_options(attr: TokenStream2) -> syn::Result<Options> {
    let mut options = Options::default();

    let parser = syn::meta::parser(|meta| {
        if meta.path.is_ident("skip") {
            meta.parse_nested_meta(|inner| {
                let ident = inner.path.get_ident()
                    .cloned()
                    .ok_or_else(|| inner.error("expected a name"))?;
                options.skip.push(ident);
                Ok(())
            })
        } else if meta.path.is_ident("returns") {
            let value: LitBool = meta.value()?.parse()?;
            options.returns = Some(value.value);
            Ok(())
        } else {
            Err(meta.error("unsupported footprint option, expected `skip(...)` or `returns = bool`"))
        }
    });
    parser.parse2(attr)?;

    Ok(options)
}

/// Where the instrumented function lives. Inside `#[footprint_all]` the
/// `Self` type is known, so receivers and associated functions are named
/// after it.
#[derive(Clone, Copy, PartialEq)]
enum Owner {
    Free,
    Impl,
}

fn footprint_impl(attr: TokenStream2, item: TokenStream2) -> syn::Result<TokenStream2> {
    let options = parse_options(attr)?;
    let mut function: ItemFn = parse2(item)?;
    reject_const(&function.sig, "footprint")?;

    let block = instrument(&function.sig, &function.block, &options, Owner::Free)?;
    function.block = Box::new(block);

    Ok(quote! { #function })
}

fn footprint_all_impl(attr: TokenStream2, item: TokenStream2) -> syn::Result<TokenStream2> {
    let options = parse_options(attr)?;
    if options.returns.is_some() {
        return Err(syn::Error::new(proc_macro2::Span::call_site(), "footprint_all only accepts `skip(...)`"));
    }

    let mut item_impl: ItemImpl = parse2(item)?;

    for impl_item in item_impl.items.iter_mut() {
        let ImplItem::Fn(method) = impl_item else {
            continue;
        };

        let name = method.sig.ident.unraw().to_string();
        let denied = DENYLIST.contains(&name.as_str())
            || options.skip.iter().any(|skipped| skipped == &method.sig.ident);
        let marked = method.attrs.iter().any(|attr| {
            attr.path().segments.last()
                .is_some_and(|segment| segment.ident == "no_footprint" || segment.ident == "footprint")
        });

        // const fns cannot log, leave them as they are
        if denied || marked || method.sig.constness.is_some() {
            continue;
        }

        method.block = instrument(&method.sig, &method.block, &Options::default(), Owner::Impl)?;
    }

    Ok(quote! { #item_impl })
}

fn instrument(sig: &Signature, block: &Block, options: &Options, owner: Owner) -> syn::Result<Block> {
    let fn_name = sig.ident.unraw().to_string();

    for skipped in &options.skip {
        if !has_param(sig, skipped) {
            return Err(syn::Error::new_spanned(skipped, format!("`{}` has no parameter named `{}`", fn_name, skipped)));
        }
    }

    let self_type = match owner {
        Owner::Impl => quote! { ::std::any::type_name::<Self>() },
        Owner::Free => quote! { ::std::any::type_name_of_val(&self) },
    };

    let mut entries = Vec::new();
    let mut has_receiver = false;
    for input in &sig.inputs {
        match input {
            FnArg::Receiver(_) => {
                has_receiver = true;
                entries.push(quote! {
                    .arg("self", ::footprint::Value::instance(
                        ::footprint::__private::short_type_name(#self_type),
                        (&&&::footprint::__private::Probe::new(&self)).footprint_value(),
                    ))
                });
            }
            FnArg::Typed(typed) => {
                // destructured parameters have no single name to log
                let Pat::Ident(pat) = &*typed.pat else {
                    continue;
                };
                if options.skip.iter().any(|skipped| skipped == &pat.ident) {
                    continue;
                }

                let ident = &pat.ident;
                let name = ident.unraw().to_string();
                entries.push(quote! {
                    .arg(#name, (&&&::footprint::__private::Probe::new(&#ident)).footprint_value())
                });
            }
        }
    }

    let owner_name = match (owner, has_receiver) {
        (Owner::Impl, false) => quote! {
            .owner(::footprint::__private::short_type_name(::std::any::type_name::<Self>()))
        },
        _ => quote! {},
    };

    let returns = options.returns.unwrap_or_else(|| declares_value(&sig.output));
    let annotation = result_annotation(&sig.output);
    let invocation = match sig.asyncness {
        Some(_) => quote! { async #block.await },
        None => quote! { (|| #block)() },
    };
    let exit = match returns {
        true => quote! {
            __footprint_span.exit(::core::option::Option::Some(
                (&&&::footprint::__private::Probe::new(&__footprint_result)).footprint_value()
            ));
        },
        false => quote! {
            __footprint_span.exit(::core::option::Option::None);
        },
    };

    parse2(quote! {
        {
            #[allow(unused_imports)]
            use ::footprint::__private::{StrValue as _, DisplayValue as _, DebugValue as _, OpaqueValue as _};

            let __footprint_call = ::footprint::Call::new(::core::module_path!(), #fn_name)
                #owner_name
                #(#entries)*
                .returning(#returns);
            let __footprint_ctx = ::footprint::context();
            let __footprint_span = __footprint_ctx.enter(&__footprint_call);

            #[allow(clippy::redundant_closure_call)]
            let __footprint_result #annotation = #invocation;
            #exit

            __footprint_result
        }
    })
}

fn not_none_impl(attr: TokenStream2, item: TokenStream2) -> syn::Result<TokenStream2> {
    if !attr.is_empty() {
        return Err(syn::Error::new_spanned(attr, "not_none takes no arguments"));
    }

    let mut function: ItemFn = parse2(item)?;
    reject_const(&function.sig, "not_none")?;
    if !returns_option(&function.sig.output) {
        return Err(syn::Error::new_spanned(&function.sig, "not_none expects a function returning Option"));
    }

    let fn_name = function.sig.ident.unraw().to_string();
    let annotation = result_annotation(&function.sig.output);
    let block = &function.block;
    let invocation = match function.sig.asyncness {
        Some(_) => quote! { async #block.await },
        None => quote! { (|| #block)() },
    };

    let checked: Block = parse2(quote! {
        {
            #[allow(clippy::redundant_closure_call)]
            let __footprint_result #annotation = #invocation;
            ::core::assert!(__footprint_result.is_some(), "Function {} output is None!", #fn_name);
            __footprint_result
        }
    })?;
    function.block = Box::new(checked);

    Ok(quote! { #function })
}

fn reject_const(sig: &Signature, attribute: &str) -> syn::Result<()> {
    match &sig.constness {
        Some(constness) => Err(syn::Error::new_spanned(
            constness,
            format!("{} cannot be used on a `const fn`", attribute),
        )),
        None => Ok(()),
    }
}

fn has_param(sig: &Signature, name: &Ident) -> bool {
    sig.inputs.iter().any(|input| match input {
        FnArg::Typed(typed) => matches!(&*typed.pat, Pat::Ident(pat) if &pat.ident == name),
        FnArg::Receiver(_) => false,
    })
}

fn declares_value(output: &ReturnType) -> bool {
    match output {
        ReturnType::Default => false,
        ReturnType::Type(_, ty) => !matches!(&**ty, Type::Tuple(tuple) if tuple.elems.is_empty()),
    }
}

fn returns_option(output: &ReturnType) -> bool {
    match output {
        ReturnType::Type(_, ty) => match &**ty {
            Type::Path(path) => path.path.segments.last().is_some_and(|segment| segment.ident == "Option"),
            _ => false,
        },
        ReturnType::Default => false,
    }
}

#[derive(Default)]
struct ImplTraitFinder {
    found: bool,
}

impl<'ast> Visit<'ast> for ImplTraitFinder {
    fn visit_type_impl_trait(&mut self, _: &'ast syn::TypeImplTrait) {
        self.found = true;
    }
}

/// `: T` for the result binding, so `?` in the body knows its target type.
/// `impl Trait` cannot be written there and is left to inference.
fn result_annotation(output: &ReturnType) -> TokenStream2 {
    match output {
        ReturnType::Default => quote! {},
        ReturnType::Type(_, ty) => {
            let mut finder = ImplTraitFinder::default();
            finder.visit_type(ty);
            match finder.found {
                true => quote! {},
                false => quote! { : #ty },
            }
        }
    }
}

#[cfg(test)]
mod test {
    use super::*;

    fn expand(attr: TokenStream2, item: TokenStream2) -> String {
        footprint_impl(attr, item).unwrap().to_string()
    }

    #[test]
    fn records_every_named_parameter() {
        let expanded = expand(quote! {}, quote! {
            fn add(a: i32, b: i32) -> i32 { a + b }
        });

        assert!(expanded.contains("\"add\""));
        assert!(expanded.contains(". arg (\"a\""));
        assert!(expanded.contains(". arg (\"b\""));
        assert!(expanded.contains(". returning (true)"));
    }

    #[test]
    fn unit_functions_do_not_log_a_value() {
        let expanded = expand(quote! {}, quote! {
            fn noop() {}
        });
        let explicit = expand(quote! {}, quote! {
            fn noop() -> () {}
        });
        let overridden = expand(quote! { returns = false }, quote! {
            fn answer() -> i32 { 42 }
        });

        for expansion in [expanded, explicit, overridden] {
            assert!(expansion.contains(". returning (false)"));
            assert!(expansion.contains("Option :: None"));
        }
    }

    #[test]
    fn skipped_parameters_are_left_out() {
        let expanded = expand(quote! { skip(secret) }, quote! {
            fn login(user: &str, secret: &str) -> bool { true }
        });

        assert!(expanded.contains("\"user\""));
        assert!(!expanded.contains("\"secret\""));
    }

    #[test]
    fn skipping_an_unknown_parameter_fails() {
        let error = footprint_impl(quote! { skip(nope) }, quote! {
            fn login(user: &str) {}
        }).unwrap_err();

        assert!(error.to_string().contains("no parameter named `nope`"));
    }

    #[test]
    fn unknown_options_fail() {
        assert!(footprint_impl(quote! { level = "info" }, quote! { fn f() {} }).is_err());
    }

    #[test]
    fn impl_trait_results_are_not_annotated() {
        let expanded = expand(quote! {}, quote! {
            fn evens() -> impl Iterator<Item = u32> { (0..10).filter(|n| n % 2 == 0) }
        });

        assert!(!expanded.contains("__footprint_result : impl"));
    }

    #[test]
    fn footprint_all_skips_denied_and_marked_methods() {
        let expanded = footprint_all_impl(quote! { skip(hidden) }, quote! {
            impl Test {
                fn new() -> Self { Test }
                fn bar(&self) {}
                fn to_string(&self) -> String { String::new() }
                fn hidden(&self) {}
                #[no_footprint]
                fn quiet(&self) {}
            }
        }).unwrap().to_string();

        assert!(expanded.contains("\"new\""));
        assert!(expanded.contains(". owner ("));
        assert!(expanded.contains("\"bar\""));
        assert!(!expanded.contains("\"to_string\""));
        assert!(!expanded.contains("\"hidden\""));
        assert!(!expanded.contains("\"quiet\""));
    }

    #[test]
    fn const_functions_are_rejected() {
        let error = footprint_impl(quote! {}, quote! {
            const fn zero() -> u32 { 0 }
        }).unwrap_err();
        assert!(error.to_string().contains("cannot be used on a `const fn`"));

        assert!(not_none_impl(quote! {}, quote! { const fn f() -> Option<u32> { None } }).is_err());
    }

    #[test]
    fn footprint_all_leaves_const_methods_alone() {
        let expanded = footprint_all_impl(quote! {}, quote! {
            impl K {
                pub const fn zero() -> u32 { 0 }
                fn one(&self) -> u32 { 1 }
            }
        }).unwrap().to_string();

        assert!(!expanded.contains("\"zero\""));
        assert!(expanded.contains("pub const fn zero () -> u32 { 0 }"));
        assert!(expanded.contains("\"one\""));
    }

    #[test]
    fn not_none_requires_option() {
        assert!(not_none_impl(quote! {}, quote! { fn f() -> i32 { 1 } }).is_err());

        let expanded = not_none_impl(quote! {}, quote! {
            fn f() -> Option<i32> { Some(1) }
        }).unwrap().to_string();
        assert!(expanded.contains("is_some"));
    }
}
