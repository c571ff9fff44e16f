use proc_macro::TokenStream;
use proc_macro2::TokenStream as TokenStream2;
use quote::{format_ident, quote};
use syn::{
    Data, DeriveInput, Fields, FnArg, ImplItem, ImplItemFn, ItemImpl, LitStr, Pat, ReturnType,
    Type, parse_macro_input,
};

/// Derive macro for the `Mapped` registration table.
///
/// Every named field is registered under its own name, readable through
/// `ToValue` and writable through `FromWire`. `pub` fields are public, all
/// others private.
///
/// Field attributes:
///
/// - `#[mapping(rename = "col")]`: register under another name.
/// - `#[mapping(readonly)]`: no writer; writes fail with `CannotAccessField`.
/// - `#[mapping(skip)]`: not registered.
/// - `#[mapping(flatten)]`: embedded base whose members are inherited.
///
/// Struct attributes:
///
/// - `#[mapping(default)]`: `Default::default` is the no-args constructor.
/// - `#[mapping(all_args)]`: constructor over every field in declaration order.
/// - `#[mapping(methods)]`: merge the table generated by `#[mapped_methods]`.
/// - `#[mapping(static_field = "name")]`: type-level member, repeatable.
///
/// # Example
///
/// ```ignore
/// #[derive(Mapped, Default)]
/// #[mapping(default)]
/// pub struct Invoice {
///     pub id: i64,
///     #[mapping(rename = "total_amount")]
///     pub total: bigdecimal::BigDecimal,
///     #[mapping(skip)]
///     cache: Vec<u8>,
/// }
/// ```
#[proc_macro_derive(Mapped, attributes(mapping))]
pub fn derive_mapped(input: TokenStream) -> TokenStream {
    let input = parse_macro_input!(input as DeriveInput);
    match derive_mapped_impl(&input) {
        Ok(tokens) => tokens.into(),
        Err(e) => e.to_compile_error().into(),
    }
}

#[derive(Default)]
struct StructAttrs {
    default_ctor: bool,
    all_args: bool,
    methods: bool,
    static_fields: Vec<LitStr>,
}

#[derive(Default)]
struct FieldAttrs {
    rename: Option<String>,
    readonly: bool,
    skip: bool,
    flatten: bool,
}

fn parse_struct_attrs(input: &DeriveInput) -> Result<StructAttrs, syn::Error> {
    let mut attrs = StructAttrs::default();
    for attr in &input.attrs {
        if !attr.path().is_ident("mapping") {
            continue;
        }
        attr.parse_nested_meta(|meta| {
            if meta.path.is_ident("default") {
                attrs.default_ctor = true;
            } else if meta.path.is_ident("all_args") {
                attrs.all_args = true;
            } else if meta.path.is_ident("methods") {
                attrs.methods = true;
            } else if meta.path.is_ident("static_field") {
                attrs.static_fields.push(meta.value()?.parse()?);
            } else {
                return Err(meta.error("unknown mapping attribute"));
            }
            Ok(())
        })?;
    }
    Ok(attrs)
}

fn parse_field_attrs(field: &syn::Field) -> Result<FieldAttrs, syn::Error> {
    let mut attrs = FieldAttrs::default();
    for attr in &field.attrs {
        if !attr.path().is_ident("mapping") {
            continue;
        }
        attr.parse_nested_meta(|meta| {
            if meta.path.is_ident("rename") {
                let value: LitStr = meta.value()?.parse()?;
                attrs.rename = Some(value.value());
            } else if meta.path.is_ident("readonly") {
                attrs.readonly = true;
            } else if meta.path.is_ident("skip") {
                attrs.skip = true;
            } else if meta.path.is_ident("flatten") {
                attrs.flatten = true;
            } else {
                return Err(meta.error("unknown mapping attribute"));
            }
            Ok(())
        })?;
    }
    Ok(attrs)
}

fn visibility_tokens(vis: &syn::Visibility) -> TokenStream2 {
    match vis {
        syn::Visibility::Public(_) => quote! { rdsdata_api::schema::Visibility::Public },
        _ => quote! { rdsdata_api::schema::Visibility::Private },
    }
}

fn derive_mapped_impl(input: &DeriveInput) -> Result<TokenStream2, syn::Error> {
    let name = &input.ident;

    if !input.generics.params.is_empty() {
        return Err(syn::Error::new_spanned(
            &input.generics,
            "Mapped does not support generic types",
        ));
    }

    let fields = match &input.data {
        Data::Struct(data) => match &data.fields {
            Fields::Named(fields) => &fields.named,
            _ => {
                return Err(syn::Error::new_spanned(
                    name,
                    "Mapped only supports structs with named fields",
                ));
            }
        },
        _ => return Err(syn::Error::new_spanned(name, "Mapped only supports structs")),
    };

    let struct_attrs = parse_struct_attrs(input)?;

    let mut registrations = Vec::new();
    let mut ctor_params = Vec::new();
    let mut ctor_bindings = Vec::new();
    let mut ctor_inits = Vec::new();

    for (index, field) in fields.iter().enumerate() {
        let ident = field
            .ident
            .as_ref()
            .ok_or_else(|| syn::Error::new_spanned(field, "expected named field"))?;
        let ty = &field.ty;
        let attrs = parse_field_attrs(field)?;

        if struct_attrs.all_args && (attrs.skip || attrs.flatten) {
            return Err(syn::Error::new_spanned(
                ident,
                "all_args cannot be combined with skipped or flattened fields",
            ));
        }
        if attrs.skip {
            continue;
        }
        if attrs.flatten {
            registrations.push(quote! {
                info = info.inherit(
                    <#ty as rdsdata_api::schema::Mapped>::type_info(),
                    |this| &this.#ident,
                    |this| &mut this.#ident,
                );
            });
            continue;
        }

        let column = attrs.rename.unwrap_or_else(|| ident.to_string());
        let vis = visibility_tokens(&field.vis);
        let access = if attrs.readonly {
            quote! { .readonly() }
        } else {
            quote! { .writer(|this: &mut Self, value: #ty| this.#ident = value) }
        };
        registrations.push(quote! {
            info = info.field(
                rdsdata_api::schema::FieldInfo::new(#column, #vis)
                    .with_type::<#ty>()
                    .reader(|this: &Self| rdsdata_api::value::ToValue::to_value(&this.#ident))
                    #access
            );
        });

        let binding = format_ident!("__arg{}", index);
        ctor_params.push(quote! {
            rdsdata_api::schema::ParamInfo::new(#column, ::std::any::type_name::<#ty>())
        });
        ctor_inits.push(quote! {
            #ident: rdsdata_api::convert::FromWire::from_wire(#binding)?
        });
        ctor_bindings.push(binding);
    }

    for static_field in &struct_attrs.static_fields {
        registrations.push(quote! {
            info = info.field(rdsdata_api::schema::FieldInfo::static_member(
                #static_field,
                rdsdata_api::schema::Visibility::Public,
            ));
        });
    }

    if struct_attrs.default_ctor {
        registrations.push(quote! {
            info = info.constructor(rdsdata_api::schema::ConstructorInfo::no_args(
                rdsdata_api::schema::Visibility::Public,
                <Self as ::std::default::Default>::default,
            ));
        });
    }

    if struct_attrs.all_args {
        registrations.push(quote! {
            info = info.constructor(rdsdata_api::schema::ConstructorInfo::new(
                rdsdata_api::schema::Visibility::Public,
                vec![#(#ctor_params),*],
                |args| match args {
                    [#(#ctor_bindings),*] => Ok(Self { #(#ctor_inits),* }),
                    _ => Err(rdsdata_api::error::MappingError::cannot_create_instance::<Self>(
                        "wrong number of constructor arguments",
                    )),
                },
            ));
        });
    }

    if struct_attrs.methods {
        registrations.push(quote! {
            info = Self::__mapped_methods(info);
        });
    }

    Ok(quote! {
        impl rdsdata_api::schema::Mapped for #name {
            fn type_info() -> rdsdata_api::schema::TypeInfo<Self> {
                #[allow(unused_mut)]
                let mut info = rdsdata_api::schema::TypeInfo::<Self>::new();
                #(#registrations)*
                info
            }
        }
    })
}

/// Registers the accessor-shaped methods of an inherent impl block.
///
/// Every `get_*` and `set_*` fn is recorded with its visibility, static-ness
/// and parameter types. A `get_*` taking `&self` and nothing else becomes a
/// getter (or a void method, if it returns `()`); a `set_*` taking
/// `&mut self` and one owned argument becomes a setter. Other shapes are
/// recorded but cannot be invoked by mapping.
///
/// Fns marked `#[mapping(constructor)]` are registered as constructors, with
/// their parameter names as column names. Add `fallible` when the fn returns
/// `Result<Self, E>`.
///
/// Pair with `#[mapping(methods)]` on the `#[derive(Mapped)]` struct.
#[proc_macro_attribute]
pub fn mapped_methods(_args: TokenStream, input: TokenStream) -> TokenStream {
    let item = parse_macro_input!(input as ItemImpl);
    match mapped_methods_impl(item) {
        Ok(tokens) => tokens.into(),
        Err(e) => e.to_compile_error().into(),
    }
}

enum ReceiverKind {
    None,
    Ref,
    RefMut,
    Other,
}

fn receiver_kind(method: &ImplItemFn) -> ReceiverKind {
    match method.sig.receiver() {
        None => ReceiverKind::None,
        Some(r) if r.reference.is_some() && r.mutability.is_some() => ReceiverKind::RefMut,
        Some(r) if r.reference.is_some() => ReceiverKind::Ref,
        Some(_) => ReceiverKind::Other,
    }
}

fn typed_params(method: &ImplItemFn) -> Vec<&syn::PatType> {
    method
        .sig
        .inputs
        .iter()
        .filter_map(|arg| match arg {
            FnArg::Typed(pt) => Some(pt),
            FnArg::Receiver(_) => None,
        })
        .collect()
}

fn type_label(ty: &Type) -> String {
    quote!(#ty).to_string().replace(' ', "")
}

fn returns_unit(output: &ReturnType) -> bool {
    match output {
        ReturnType::Default => true,
        ReturnType::Type(_, ty) => matches!(&**ty, Type::Tuple(t) if t.elems.is_empty()),
    }
}

/// `Result<..>` or any alias whose last path segment is `Result`.
fn returns_result(output: &ReturnType) -> bool {
    match output {
        ReturnType::Default => false,
        ReturnType::Type(_, ty) => matches!(
            &**ty,
            Type::Path(p) if p.path.segments.last().is_some_and(|s| s.ident == "Result")
        ),
    }
}

/// Takes `#[mapping(...)]` off a fn, reporting `(constructor, fallible)`.
fn take_ctor_attrs(method: &mut ImplItemFn) -> Result<(bool, bool), syn::Error> {
    let mut constructor = false;
    let mut fallible = false;
    for attr in &method.attrs {
        if !attr.path().is_ident("mapping") {
            continue;
        }
        attr.parse_nested_meta(|meta| {
            if meta.path.is_ident("constructor") {
                constructor = true;
            } else if meta.path.is_ident("fallible") {
                fallible = true;
            } else {
                return Err(meta.error("unknown mapping attribute"));
            }
            Ok(())
        })?;
    }
    method.attrs.retain(|attr| !attr.path().is_ident("mapping"));
    Ok((constructor, fallible))
}

fn method_registration(method: &ImplItemFn) -> Option<TokenStream2> {
    let fn_name = &method.sig.ident;
    let name = fn_name.to_string();
    let is_getter = name.starts_with("get_");
    let is_setter = name.starts_with("set_");
    if !is_getter && !is_setter {
        return None;
    }

    let vis = visibility_tokens(&method.vis);
    let receiver = receiver_kind(method);
    let params = typed_params(method);
    let generic = !method.sig.generics.params.is_empty();

    if is_getter && !generic && matches!(receiver, ReceiverKind::Ref) && params.is_empty() {
        if returns_unit(&method.sig.output) {
            return Some(quote! {
                info = info.method(rdsdata_api::schema::MethodInfo::void(#name, #vis));
            });
        }
        return Some(quote! {
            info = info.method(rdsdata_api::schema::MethodInfo::getter(
                #name,
                #vis,
                |this: &Self| rdsdata_api::value::ToValue::to_value(&this.#fn_name()),
            ));
        });
    }

    if is_setter && !generic && matches!(receiver, ReceiverKind::RefMut) && params.len() == 1 {
        let param_ty = &params[0].ty;
        if !matches!(&**param_ty, Type::Reference(_)) {
            if returns_result(&method.sig.output) {
                return Some(quote! {
                    info = info.method(rdsdata_api::schema::MethodInfo::fallible_setter(
                        #name,
                        #vis,
                        |this: &mut Self, value: #param_ty| this.#fn_name(value),
                    ));
                });
            }
            let call = if returns_unit(&method.sig.output) {
                quote! { this.#fn_name(value); }
            } else {
                quote! { let _ = this.#fn_name(value); }
            };
            return Some(quote! {
                info = info.method(rdsdata_api::schema::MethodInfo::setter(
                    #name,
                    #vis,
                    |this: &mut Self, value: #param_ty| { #call },
                ));
            });
        }
    }

    let labels: Vec<String> = params.iter().map(|p| type_label(&p.ty)).collect();
    let associated = match receiver {
        ReceiverKind::None => quote! { .associated() },
        _ => quote! {},
    };
    Some(quote! {
        info = info.method(
            rdsdata_api::schema::MethodInfo::opaque(#name, #vis, vec![#(#labels),*])
                #associated
        );
    })
}

fn constructor_registration(
    method: &ImplItemFn,
    fallible: bool,
) -> Result<TokenStream2, syn::Error> {
    if method.sig.receiver().is_some() {
        return Err(syn::Error::new_spanned(
            &method.sig,
            "constructor must not take self",
        ));
    }

    let fn_name = &method.sig.ident;
    let vis = visibility_tokens(&method.vis);
    let mut params = Vec::new();
    let mut bindings = Vec::new();
    let mut args = Vec::new();

    for (index, param) in typed_params(method).into_iter().enumerate() {
        let param_name = match &*param.pat {
            Pat::Ident(pat) => pat.ident.to_string(),
            other => {
                return Err(syn::Error::new_spanned(
                    other,
                    "constructor parameters must be plain identifiers",
                ));
            }
        };
        let ty = &param.ty;
        let binding = format_ident!("__arg{}", index);
        params.push(quote! {
            rdsdata_api::schema::ParamInfo::new(#param_name, ::std::any::type_name::<#ty>())
        });
        args.push(quote! { rdsdata_api::convert::FromWire::from_wire(#binding)? });
        bindings.push(binding);
    }

    let call = if fallible {
        quote! {
            Self::#fn_name(#(#args),*).map_err(|e| {
                rdsdata_api::error::MappingError::cannot_create_instance::<Self>(e)
            })
        }
    } else {
        quote! { Ok(Self::#fn_name(#(#args),*)) }
    };

    Ok(quote! {
        info = info.constructor(rdsdata_api::schema::ConstructorInfo::new(
            #vis,
            vec![#(#params),*],
            |args| match args {
                [#(#bindings),*] => #call,
                _ => Err(rdsdata_api::error::MappingError::cannot_create_instance::<Self>(
                    "wrong number of constructor arguments",
                )),
            },
        ));
    })
}

fn mapped_methods_impl(mut item: ItemImpl) -> Result<TokenStream2, syn::Error> {
    if item.trait_.is_some() {
        return Err(syn::Error::new_spanned(
            &item.self_ty,
            "mapped_methods only supports inherent impl blocks",
        ));
    }

    let mut registrations = Vec::new();
    for impl_item in &mut item.items {
        let ImplItem::Fn(method) = impl_item else {
            continue;
        };
        let (constructor, fallible) = take_ctor_attrs(method)?;
        if constructor {
            registrations.push(constructor_registration(method, fallible)?);
        } else if let Some(tokens) = method_registration(method) {
            registrations.push(tokens);
        }
    }

    let self_ty = &item.self_ty;
    let (impl_generics, _, where_clause) = item.generics.split_for_impl();

    Ok(quote! {
        #item

        impl #impl_generics #self_ty #where_clause {
            #[doc(hidden)]
            #[allow(unused_mut)]
            pub fn __mapped_methods(
                mut info: rdsdata_api::schema::TypeInfo<Self>,
            ) -> rdsdata_api::schema::TypeInfo<Self> {
                #(#registrations)*
                info
            }
        }
    })
}

/// Derive macro for enums carried on the wire by variant name.
///
/// Implements `WireEnum`, `ToValue` (the variant name as text) and
/// `FromWire` (lookup by exact name). Only unit variants are supported.
#[proc_macro_derive(WireEnum)]
pub fn derive_wire_enum(input: TokenStream) -> TokenStream {
    let input = parse_macro_input!(input as DeriveInput);
    match derive_wire_enum_impl(&input) {
        Ok(tokens) => tokens.into(),
        Err(e) => e.to_compile_error().into(),
    }
}

fn derive_wire_enum_impl(input: &DeriveInput) -> Result<TokenStream2, syn::Error> {
    let name = &input.ident;
    let data = match &input.data {
        Data::Enum(data) => data,
        _ => return Err(syn::Error::new_spanned(name, "WireEnum only supports enums")),
    };

    let mut to_name = Vec::new();
    let mut from_name = Vec::new();
    for variant in &data.variants {
        if !matches!(variant.fields, Fields::Unit) {
            return Err(syn::Error::new_spanned(
                variant,
                "WireEnum only supports unit variants",
            ));
        }
        let ident = &variant.ident;
        let label = ident.to_string();
        to_name.push(quote! { Self::#ident => #label });
        from_name.push(quote! { #label => Some(Self::#ident) });
    }

    Ok(quote! {
        impl rdsdata_api::convert::WireEnum for #name {
            fn variant_name(&self) -> &'static str {
                match self {
                    #(#to_name,)*
                }
            }

            fn from_variant_name(name: &str) -> Option<Self> {
                match name {
                    #(#from_name,)*
                    _ => None,
                }
            }
        }

        impl rdsdata_api::value::ToValue for #name {
            fn to_value(&self) -> rdsdata_api::value::Value {
                rdsdata_api::value::Value::Enum(
                    rdsdata_api::convert::WireEnum::variant_name(self).to_string(),
                )
            }
        }

        impl rdsdata_api::convert::FromWire for #name {
            fn from_wire(
                field: &rdsdata_api::wire::WireField,
            ) -> Result<Self, rdsdata_api::error::MappingError> {
                rdsdata_api::convert::enum_from_wire(field)
            }
        }
    })
}
