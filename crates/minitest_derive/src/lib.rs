//! Registration macro for minitest test modules.
//!
//! `#[test_class]` goes on an inherent `impl` block and turns the tags declared on it into registry metadata:
//! - `TestType::type_entry()`: a `TypeEntry` describing the type, its constructor and its tagged methods
//! - an `inventory` submission, so the module harness finds the type without a hand-written table
//!
//! Method tags are inert helper attributes that only mean something inside a `#[test_class]` block:
//! `#[test_method]`, `#[before_each]`, `#[after_each]`, `#[data_row(...)]`, `#[priority(n)]`,
//! `#[description("...")]`. The macro strips them from the emitted impl.

use proc_macro::TokenStream;
use proc_macro2::TokenStream as TokenStream2;
use quote::{format_ident, quote};
use syn::parse::Parser;
use syn::punctuated::Punctuated;
use syn::spanned::Spanned;
use syn::{
    Attribute, Expr, ExprLit, ExprUnary, FnArg, ImplItem, ImplItemFn, ItemImpl, Lit, LitStr, Meta, Token, Type, UnOp,
    Visibility, parse_macro_input,
};

const METHOD_TAGS: &[&str] = &["test_method", "before_each", "after_each", "data_row", "priority", "description"];

/// Register an impl block as a test class.
///
/// # Example
/// ```ignore
/// struct Calc;
///
/// #[test_class(description = "Addition")]
/// impl Calc {
///     pub fn new() -> Self { Calc }
///
///     #[test_method]
///     #[data_row(2, 3, 5)]
///     #[data_row(2, 2, 5, display_name = "deliberately wrong")]
///     fn add(&mut self, a: i64, b: i64, expected: i64) -> Outcome {
///         assert::are_equal(expected, a + b)?;
///         Ok(())
///     }
/// }
/// ```
///
/// The argument-less constructor is a `pub fn new() -> Self` in the same block, or `Default::default()` when the
/// attribute says `#[test_class(default)]`. Types without either are still registered; discovery skips them.
#[proc_macro_attribute]
pub fn test_class(args: TokenStream, input: TokenStream) -> TokenStream {
    let args = match Punctuated::<Meta, Token![,]>::parse_terminated.parse(args) {
        Ok(args) => args,
        Err(e) => return e.to_compile_error().into(),
    };
    let item = parse_macro_input!(input as ItemImpl);

    match expand(args, item) {
        Ok(tokens) => tokens.into(),
        Err(e) => e.to_compile_error().into(),
    }
}

struct ClassOptions {
    use_default: bool,
    description: Option<LitStr>,
}

fn class_options(args: Punctuated<Meta, Token![,]>) -> syn::Result<ClassOptions> {
    let mut options = ClassOptions {
        use_default: false,
        description: None,
    };

    for meta in args {
        match &meta {
            Meta::Path(path) if path.is_ident("default") => options.use_default = true,
            Meta::NameValue(nv) if nv.path.is_ident("description") => match &nv.value {
                Expr::Lit(ExprLit { lit: Lit::Str(s), .. }) => options.description = Some(s.clone()),
                other => return Err(syn::Error::new(other.span(), "description must be a string literal")),
            },
            other => {
                return Err(syn::Error::new(
                    other.span(),
                    "unknown test_class option (expected `default` or `description = \"...\"`)",
                ));
            }
        }
    }

    Ok(options)
}

fn expand(args: Punctuated<Meta, Token![,]>, mut item: ItemImpl) -> syn::Result<TokenStream2> {
    let options = class_options(args)?;

    if let Some((_, path, _)) = &item.trait_ {
        return Err(syn::Error::new(path.span(), "#[test_class] goes on an inherent impl block"));
    }
    if !item.generics.params.is_empty() {
        return Err(syn::Error::new(item.generics.span(), "test classes cannot be generic"));
    }

    let self_ty = item.self_ty.clone();
    let type_name = quote!(#self_ty).to_string().replace(' ', "");

    let mut has_new = false;
    let mut methods = Vec::new();
    for impl_item in &mut item.items {
        let ImplItem::Fn(method) = impl_item else {
            continue;
        };
        if is_constructor(method) {
            has_new = true;
        }
        let tags = take_tags(&mut method.attrs)?;
        if tags.is_empty() {
            continue;
        }
        methods.push(method_entry(&self_ty, &type_name, method, &tags)?);
    }

    let description = options
        .description
        .map(|text| quote!(.with_tag(::minitest::ClassTag::Description(::std::string::String::from(#text)))));

    let construct_expr = if options.use_default {
        Some(quote!(<#self_ty as ::std::default::Default>::default()))
    } else if has_new {
        Some(quote!(<#self_ty>::new()))
    } else {
        None
    };
    let constructor = construct_expr.map(|expr| {
        quote! {
            .with_constructor({
                fn construct() -> ::std::boxed::Box<dyn ::std::any::Any> {
                    ::std::boxed::Box::new(#expr)
                }
                construct
            })
        }
    });

    Ok(quote! {
        #item

        impl ::minitest::TestType for #self_ty {
            fn type_entry() -> ::minitest::TypeEntry {
                ::minitest::TypeEntry::new(#type_name)
                    .with_tag(::minitest::ClassTag::TestClass)
                    #description
                    #constructor
                    #(.with_method(#methods))*
            }
        }

        ::minitest::inventory::submit! {
            ::minitest::TypeRegistration::new(<#self_ty as ::minitest::TestType>::type_entry)
        }
    })
}

/// `pub fn new() -> Self` with no parameters.
fn is_constructor(method: &ImplItemFn) -> bool {
    method.sig.ident == "new"
        && matches!(method.vis, Visibility::Public(_))
        && method.sig.inputs.is_empty()
        && method.sig.generics.params.is_empty()
}

fn is_tag(attr: &Attribute) -> bool {
    attr.path()
        .get_ident()
        .is_some_and(|ident| METHOD_TAGS.iter().any(|tag| ident == tag))
}

/// Remove the helper attributes from a method and turn them into `MethodTag` expressions, in declaration order.
fn take_tags(attrs: &mut Vec<Attribute>) -> syn::Result<Vec<TokenStream2>> {
    let mut tags = Vec::new();
    for attr in attrs.iter().filter(|a| is_tag(a)) {
        tags.push(tag_tokens(attr)?);
    }
    attrs.retain(|a| !is_tag(a));
    Ok(tags)
}

fn tag_tokens(attr: &Attribute) -> syn::Result<TokenStream2> {
    let path = attr.path();
    if path.is_ident("test_method") {
        attr.meta.require_path_only()?;
        Ok(quote!(::minitest::MethodTag::TestMethod))
    } else if path.is_ident("before_each") {
        attr.meta.require_path_only()?;
        Ok(quote!(::minitest::MethodTag::BeforeEach))
    } else if path.is_ident("after_each") {
        attr.meta.require_path_only()?;
        Ok(quote!(::minitest::MethodTag::AfterEach))
    } else if path.is_ident("priority") {
        let expr: Expr = attr.parse_args()?;
        let priority = int_literal::<i32>(&expr)?;
        Ok(quote!(::minitest::MethodTag::Priority(#priority)))
    } else if path.is_ident("description") {
        let text: LitStr = attr.parse_args()?;
        Ok(quote!(::minitest::MethodTag::Description(::std::string::String::from(#text))))
    } else {
        data_row_tokens(attr)
    }
}

/// `#[data_row(2, "x", 'c', 1.5, true, None, display_name = "...")]`
fn data_row_tokens(attr: &Attribute) -> syn::Result<TokenStream2> {
    let exprs = attr.parse_args_with(Punctuated::<Expr, Token![,]>::parse_terminated)?;

    let mut values = Vec::new();
    let mut display_name = None;
    for expr in &exprs {
        if let Expr::Assign(assign) = expr {
            let is_display_name = matches!(&*assign.left, Expr::Path(p) if p.path.is_ident("display_name"));
            match (&*assign.right, is_display_name) {
                (Expr::Lit(ExprLit { lit: Lit::Str(s), .. }), true) => {
                    display_name = Some(s.clone());
                    continue;
                }
                _ => return Err(syn::Error::new(expr.span(), "expected `display_name = \"...\"`")),
            }
        }
        values.push(value_tokens(expr)?);
    }

    let display_name = match display_name {
        Some(name) => quote!(::std::option::Option::Some(::std::string::String::from(#name))),
        None => quote!(::std::option::Option::None),
    };

    Ok(quote! {
        ::minitest::MethodTag::DataRow(::minitest::DataRow {
            values: ::std::vec![#(#values),*],
            display_name: #display_name,
        })
    })
}

fn value_tokens(expr: &Expr) -> syn::Result<TokenStream2> {
    match expr {
        Expr::Lit(ExprLit { lit, .. }) => match lit {
            Lit::Int(i) => {
                let v: i64 = i.base10_parse()?;
                Ok(quote!(::minitest::Value::Int(#v)))
            }
            Lit::Float(f) => {
                let v: f64 = f.base10_parse()?;
                Ok(quote!(::minitest::Value::Float(#v)))
            }
            Lit::Bool(b) => {
                let v = b.value;
                Ok(quote!(::minitest::Value::Bool(#v)))
            }
            Lit::Char(c) => {
                let v = c.value();
                Ok(quote!(::minitest::Value::Char(#v)))
            }
            Lit::Str(s) => Ok(quote!(::minitest::Value::Str(::std::string::String::from(#s)))),
            other => Err(syn::Error::new(other.span(), "unsupported literal in data_row")),
        },
        Expr::Unary(ExprUnary {
            op: UnOp::Neg(_), expr: inner, ..
        }) => match &**inner {
            Expr::Lit(ExprLit { lit: Lit::Int(i), .. }) => {
                let v: i64 = i.base10_parse()?;
                let v = -v;
                Ok(quote!(::minitest::Value::Int(#v)))
            }
            Expr::Lit(ExprLit { lit: Lit::Float(f), .. }) => {
                let v: f64 = f.base10_parse()?;
                let v = -v;
                Ok(quote!(::minitest::Value::Float(#v)))
            }
            other => Err(syn::Error::new(other.span(), "only numeric literals can be negated in data_row")),
        },
        Expr::Path(p) if p.path.is_ident("None") => Ok(quote!(::minitest::Value::Null)),
        Expr::Group(group) => value_tokens(&group.expr),
        other => Err(syn::Error::new(other.span(), "data_row arguments must be literals")),
    }
}

fn int_literal<T>(expr: &Expr) -> syn::Result<T>
where
    T: std::str::FromStr + std::ops::Neg<Output = T>,
    T::Err: std::fmt::Display,
{
    match expr {
        Expr::Lit(ExprLit { lit: Lit::Int(i), .. }) => i.base10_parse(),
        Expr::Unary(ExprUnary {
            op: UnOp::Neg(_), expr: inner, ..
        }) => int_literal::<T>(inner).map(|v| -v),
        other => Err(syn::Error::new(other.span(), "expected an integer literal")),
    }
}

/// Build the `MethodEntry` expression, including its invoker.
fn method_entry(
    self_ty: &Type,
    type_name: &str,
    method: &ImplItemFn,
    tags: &[TokenStream2],
) -> syn::Result<TokenStream2> {
    let sig = &method.sig;
    if !sig.generics.params.is_empty() {
        return Err(syn::Error::new(sig.generics.span(), "tagged methods cannot be generic"));
    }

    let mut has_receiver = false;
    let mut arg_types = Vec::new();
    for input in &sig.inputs {
        match input {
            FnArg::Receiver(receiver) => {
                if receiver.reference.is_none() {
                    return Err(syn::Error::new(receiver.span(), "tagged methods take `&self` or `&mut self`"));
                }
                has_receiver = true;
            }
            FnArg::Typed(pat_type) => {
                if matches!(&*pat_type.ty, Type::Reference(_)) {
                    return Err(syn::Error::new(
                        pat_type.ty.span(),
                        "data_row parameters must be owned types (e.g. `String` instead of `&str`)",
                    ));
                }
                arg_types.push((*pat_type.ty).clone());
            }
        }
    }

    let name = &sig.ident;
    let name_str = name.to_string();
    let arity = arg_types.len();
    let arg_idents: Vec<_> = (0..arity).map(|i| format_ident!("arg{}", i)).collect();
    let bind_args = arg_types.iter().zip(&arg_idents).enumerate().map(|(index, (ty, ident))| {
        quote! {
            let #ident = match ::minitest::invoke::argument::<#ty>(args, #index) {
                ::std::result::Result::Ok(value) => value,
                ::std::result::Result::Err(fault) => return ::minitest::Invocation::fault(fault),
            };
        }
    });

    let bind_receiver = if has_receiver {
        quote! {
            let this = match ::minitest::invoke::receiver::<#self_ty>(instance, #type_name) {
                ::std::result::Result::Ok(this) => this,
                ::std::result::Result::Err(fault) => return ::minitest::Invocation::fault(fault),
            };
        }
    } else {
        quote!(let _ = instance;)
    };
    let call = if has_receiver {
        quote!(this.#name(#(#arg_idents),*))
    } else {
        quote!(<#self_ty>::#name(#(#arg_idents),*))
    };

    let is_async = sig.asyncness.is_some();
    let invocation = if is_async {
        quote!(::minitest::Invocation::pending(async move { ::minitest::IntoOutcome::into_outcome(#call.await) }))
    } else {
        quote!(::minitest::Invocation::ready(#call))
    };
    let asynchronous = is_async.then(|| quote!(.asynchronous()));

    Ok(quote! {
        ::minitest::MethodEntry::new(#name_str, {
            #[allow(clippy::needless_lifetimes, unused_variables)]
            fn invoke<'a>(
                instance: &'a mut (dyn ::std::any::Any + 'static),
                args: &[::minitest::Value],
            ) -> ::minitest::Invocation<'a> {
                #bind_receiver
                if let ::std::result::Result::Err(fault) = ::minitest::invoke::check_arity(args, #arity) {
                    return ::minitest::Invocation::fault(fault);
                }
                #(#bind_args)*
                #invocation
            }
            invoke
        })
        .with_arity(#arity)
        #asynchronous
        #(.with_tag(#tags))*
    })
}
