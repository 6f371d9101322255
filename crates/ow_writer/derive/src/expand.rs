use ow_macro_utils::Manifest;
use proc_macro2::TokenStream;
use quote::quote;
use syn::{Data, DeriveInput, Fields, LitStr, Path};

use crate::attributes::{AnnotationAttr, FieldAttributes, FieldRole, Position, SkipCondition};
use crate::attributes::TypeAttributes;

pub(crate) fn expand_resource(ast: &DeriveInput) -> syn::Result<TokenStream> {
    let Data::Struct(data) = &ast.data else {
        return Err(syn::Error::new_spanned(
            &ast.ident,
            "`Resource` can only be derived for structs with named fields",
        ));
    };
    let Fields::Named(fields) = &data.fields else {
        return Err(syn::Error::new_spanned(
            &data.fields,
            "`Resource` can only be derived for structs with named fields",
        ));
    };

    let ow = Manifest::shared(|manifest| manifest.get_crate_path("ow_writer"));
    let attrs = TypeAttributes::parse_attrs(&ast.attrs)?;

    let ident = &ast.ident;
    let (impl_generics, ty_generics, where_clause) = ast.generics.split_for_impl();

    let mut statements = Vec::new();
    let mut dynamic = None;
    let mut custom = None;

    for field in &fields.named {
        let field_attrs = FieldAttributes::parse_field(field)?;
        let Some(member) = &field.ident else { continue };

        match field_attrs.role {
            FieldRole::Skipped => {}
            FieldRole::DynamicProperties => {
                if dynamic.replace(member).is_some() {
                    return Err(syn::Error::new_spanned(field, "only one field can be `dynamic`"));
                }
            }
            FieldRole::CustomAnnotations => {
                if custom.replace(member).is_some() {
                    return Err(syn::Error::new_spanned(field, "only one field can be `annotations`"));
                }
            }
            FieldRole::Property => {
                let ty = &field.ty;
                let name = field_attrs.rename.clone().unwrap_or_else(|| {
                    let text = member.to_string();
                    let text = text.strip_prefix("r#").unwrap_or(&text);
                    LitStr::new(text, member.span())
                });
                let annotations = field_attrs
                    .annotations
                    .iter()
                    .map(|attr| {
                        let (kind, accessor) = annotation_tokens(&ow, attr);
                        quote! { .with_annotation(#kind, #accessor)? }
                    });
                let position = match field_attrs.position {
                    Position::Auto => quote! {},
                    Position::Pre => {
                        quote! { .with_position(#ow::info::AnnotationPosition::PreValue) }
                    }
                    Position::Post => {
                        quote! { .with_position(#ow::info::AnnotationPosition::PostValue) }
                    }
                };
                let skip = match &field_attrs.skip {
                    SkipCondition::Never => quote! {},
                    SkipCondition::If(path) => quote! { .skip_if(#path) },
                    SkipCondition::Default => quote! { .skip_if_default() },
                };

                statements.push(quote! {
                    builder.member(
                        #ow::info::PropertyInfo::<Self, #ty>::new(#name, |r: &Self| &r.#member)?
                            #(#annotations)*
                            #position
                            #skip
                    );
                });
            }
        }
    }

    for attr in &attrs.annotations {
        let (kind, accessor) = annotation_tokens(&ow, attr);
        statements.push(quote! { builder.annotation(#kind, #accessor); });
    }
    if let Some(member) = dynamic {
        statements.push(quote! {
            builder.dynamic_properties(|r| &r.#member as &dyn ::core::any::Any);
        });
    }
    if let Some(member) = custom {
        statements.push(quote! {
            builder.custom_annotations(|r| &r.#member as &dyn ::core::any::Any);
        });
    }
    if let Some(hook) = &attrs.before_serialize {
        statements.push(quote! { builder.before_serialize(#hook); });
    }
    if let Some(hook) = &attrs.after_serialize {
        statements.push(quote! { builder.after_serialize(#hook); });
    }

    let type_name = match &attrs.name {
        Some(name) => quote! { #name },
        None => {
            let name = LitStr::new(&ident.to_string(), ident.span());
            quote! { #name }
        }
    };

    let auto_register = auto_register_impl(&ow, ast, &attrs);

    Ok(quote! {
        impl #impl_generics #ow::Resource for #ident #ty_generics #where_clause {
            fn type_name() -> &'static str {
                #type_name
            }

            fn describe(
                builder: &mut #ow::info::TypeInfoBuilder<Self>,
            ) -> ::core::result::Result<(), #ow::MetaError> {
                #(#statements)*
                ::core::result::Result::Ok(())
            }
        }

        impl #impl_generics #ow::value::WriteValue for #ident #ty_generics #where_clause {
            const KIND: #ow::value::ValueKind = #ow::value::ValueKind::Resource;

            fn write_value(
                &self,
                cx: &mut #ow::write::WriteContext<'_>,
            ) -> ::core::result::Result<bool, #ow::WriteError> {
                cx.write_nested(self)
            }
        }

        #auto_register
    })
}

fn annotation_tokens(ow: &Path, attr: &AnnotationAttr) -> (TokenStream, TokenStream) {
    let AnnotationAttr {
        kind,
        accessor,
        is_writer,
    } = attr;
    let kind = quote! { #ow::info::AnnotationKind::#kind };
    let accessor = if *is_writer {
        quote! { #ow::info::AnnotationAccessor::Writer(#accessor) }
    } else {
        quote! { #ow::info::AnnotationAccessor::Value(#accessor) }
    };
    (kind, accessor)
}

#[cfg(feature = "auto_register")]
fn auto_register_impl(ow: &Path, ast: &DeriveInput, attrs: &TypeAttributes) -> TokenStream {
    let Some(span) = attrs.auto_register else {
        return TokenStream::new();
    };
    // Generic types have no single instantiation to register.
    if !ast.generics.params.is_empty() {
        return TokenStream::new();
    }

    let ident = &ast.ident;
    quote::quote_spanned! { span =>
        #ow::__macro_exports::auto_register::inventory::submit! {
            #ow::__macro_exports::auto_register::AutoRegistration {
                register: #ow::__macro_exports::auto_register::register_type::<#ident>,
            }
        }
    }
}

#[cfg(not(feature = "auto_register"))]
fn auto_register_impl(_: &Path, _: &DeriveInput, _: &TypeAttributes) -> TokenStream {
    TokenStream::new()
}
