//! Record derive macro implementation
//!
//! Generates the `shelfmap::Record` implementation: a static metadata table
//! in field declaration order plus index-based accessors over the fields.

use proc_macro::TokenStream;
use proc_macro2::TokenStream as TokenStream2;
use quote::quote;
use syn::{parse_macro_input, Data, DataStruct, DeriveInput, Fields, Ident, Type};

use crate::attributes::{self, FieldAttributes};
use crate::type_conversion;
use crate::utils;

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
enum Kind {
    Scalar,
    OptionalScalar,
    Record,
    OptionalRecord,
}

struct FieldInfo<'a> {
    ident: &'a Ident,
    ty: &'a Type,
    /// `T` when the field type is `Option<T>`
    inner: Option<&'a Type>,
    kind: Kind,
    attrs: FieldAttributes,
}

impl FieldInfo<'_> {
    fn has_column(&self) -> bool {
        self.attrs.column().is_some()
    }
}

pub fn derive_record(input: TokenStream) -> TokenStream {
    let input = parse_macro_input!(input as DeriveInput);
    match expand(&input) {
        Ok(tokens) => tokens.into(),
        Err(err) => err.to_compile_error().into(),
    }
}

fn expand(input: &DeriveInput) -> syn::Result<TokenStream2> {
    let struct_name = &input.ident;
    if !input.generics.params.is_empty() {
        return Err(syn::Error::new_spanned(
            &input.generics,
            "Record cannot be derived for generic types",
        ));
    }

    let fields = match &input.data {
        Data::Struct(DataStruct {
            fields: Fields::Named(named),
            ..
        }) => &named.named,
        _ => {
            return Err(syn::Error::new_spanned(
                struct_name,
                "Record can only be derived for structs with named fields",
            ))
        }
    };

    let record_attrs = attributes::parse_record_attributes(&input.attrs)?;
    let type_name = struct_name.to_string();
    let table = record_attrs
        .table
        .unwrap_or_else(|| utils::default_table_name(&type_name));

    let mut infos = Vec::with_capacity(fields.len());
    for field in fields {
        let ident = field
            .ident
            .as_ref()
            .ok_or_else(|| syn::Error::new_spanned(field, "expected a named field"))?;
        let attrs = attributes::parse_field_attributes(field)?;
        let inner = type_conversion::extract_option_inner_type(&field.ty);
        let kind = match (attrs.nested, inner.is_some()) {
            (true, true) => Kind::OptionalRecord,
            (true, false) => Kind::Record,
            (false, true) => Kind::OptionalScalar,
            (false, false) => Kind::Scalar,
        };

        if attrs.primary_key {
            if attrs.nested {
                return Err(syn::Error::new_spanned(
                    field,
                    "a nested record cannot be the primary key",
                ));
            }
            if attrs.column().is_none() {
                return Err(syn::Error::new_spanned(
                    field,
                    "a primary_key field must carry a `db` column",
                ));
            }
        }

        infos.push(FieldInfo {
            ident,
            ty: &field.ty,
            inner,
            kind,
            attrs,
        });
    }

    let mut primary_keys = infos.iter().filter(|f| f.attrs.primary_key);
    let primary_key = primary_keys.next();
    if let Some(extra) = primary_keys.next() {
        return Err(syn::Error::new_spanned(
            extra.ident,
            "only one field may be marked primary_key",
        ));
    }

    let field_metas = infos.iter().map(generate_field_meta);
    let field_arms = infos.iter().enumerate().map(|(i, f)| generate_field_arm(i, f));
    let field_mut_arms = infos
        .iter()
        .enumerate()
        .map(|(i, f)| generate_field_mut_arm(i, f));
    let column_arms = infos
        .iter()
        .enumerate()
        .filter(|(_, f)| f.has_column())
        .map(|(i, f)| generate_column_value_arm(i, f));
    let scan_arms = infos
        .iter()
        .enumerate()
        .filter(|(_, f)| f.has_column())
        .map(|(i, f)| generate_scan_arm(i, f));

    let (pk_value, pk_null) = match primary_key {
        Some(pk) => {
            let ident = pk.ident;
            let ty = pk.ty;
            (
                quote! {
                    ::std::option::Option::Some(::shelfmap::ValueType::into_value(
                        ::std::clone::Clone::clone(&self.#ident),
                    ))
                },
                quote! {
                    ::std::option::Option::Some(<#ty as ::shelfmap::ValueType>::null_value())
                },
            )
        }
        None => (
            quote!(::std::option::Option::None),
            quote!(::std::option::Option::None),
        ),
    };

    Ok(quote! {
        impl ::shelfmap::Record for #struct_name {
            fn meta() -> &'static ::shelfmap::RecordMeta {
                static META: ::shelfmap::RecordMeta = ::shelfmap::RecordMeta {
                    type_name: #type_name,
                    table: #table,
                    fields: &[#(#field_metas),*],
                };
                &META
            }

            fn record_meta(&self) -> &'static ::shelfmap::RecordMeta {
                <Self as ::shelfmap::Record>::meta()
            }

            fn field(&self, index: usize) -> ::std::option::Option<::shelfmap::FieldRef<'_>> {
                match index {
                    #(#field_arms)*
                    _ => ::std::option::Option::None,
                }
            }

            fn field_mut(&mut self, index: usize) -> ::std::option::Option<::shelfmap::FieldMut<'_>> {
                match index {
                    #(#field_mut_arms)*
                    _ => ::std::option::Option::None,
                }
            }

            fn column_value(&self, index: usize) -> ::std::option::Option<::shelfmap::sea_query::Value> {
                match index {
                    #(#column_arms)*
                    _ => ::std::option::Option::None,
                }
            }

            #[allow(unused_variables)]
            fn scan_field(
                &mut self,
                index: usize,
                value: ::shelfmap::sea_query::Value,
            ) -> ::std::result::Result<(), ::shelfmap::ValueExtractionError> {
                match index {
                    #(#scan_arms)*
                    _ => ::std::result::Result::Err(::shelfmap::ValueExtractionError::ConversionError(
                        ::std::format!("field {} of {} has no column", index, #type_name),
                    )),
                }
            }

            fn primary_key_value(&self) -> ::std::option::Option<::shelfmap::sea_query::Value> {
                #pk_value
            }

            fn null_primary_key() -> ::std::option::Option<::shelfmap::sea_query::Value> {
                #pk_null
            }
        }
    })
}

fn generate_field_meta(field: &FieldInfo<'_>) -> TokenStream2 {
    let name = field.ident.to_string();
    let ty = type_conversion::type_to_string(field.ty);
    let kind = match field.kind {
        Kind::Scalar => quote!(::shelfmap::FieldKind::Scalar),
        Kind::OptionalScalar => quote!(::shelfmap::FieldKind::OptionalScalar),
        Kind::Record => quote!(::shelfmap::FieldKind::Record),
        Kind::OptionalRecord => quote!(::shelfmap::FieldKind::OptionalRecord),
    };
    let primary_key = field.attrs.primary_key;
    let generated = field.attrs.generated;
    let tags = field.attrs.tags.iter().map(|(k, v)| quote!((#k, #v)));
    quote! {
        ::shelfmap::FieldMeta {
            name: #name,
            ty: #ty,
            kind: #kind,
            primary_key: #primary_key,
            generated: #generated,
            tags: &[#(#tags),*],
        }
    }
}

fn generate_field_arm(index: usize, field: &FieldInfo<'_>) -> TokenStream2 {
    let ident = field.ident;
    let body = match field.kind {
        Kind::Scalar => quote!(::shelfmap::FieldRef::Value(&self.#ident)),
        Kind::OptionalScalar => quote!(::shelfmap::FieldRef::from_option(&self.#ident)),
        Kind::Record => quote!(::shelfmap::FieldRef::Record(&self.#ident)),
        Kind::OptionalRecord => quote!(::shelfmap::FieldRef::from_record_option(&self.#ident)),
    };
    quote!(#index => ::std::option::Option::Some(#body),)
}

fn generate_field_mut_arm(index: usize, field: &FieldInfo<'_>) -> TokenStream2 {
    let ident = field.ident;
    let body = match field.kind {
        Kind::Scalar => quote!(::shelfmap::FieldMut::Value(&mut self.#ident)),
        Kind::OptionalScalar => quote!(::shelfmap::FieldMut::Optional(&mut self.#ident)),
        Kind::Record => quote!(::shelfmap::FieldMut::Record(&mut self.#ident)),
        Kind::OptionalRecord => quote!(::shelfmap::FieldMut::OptionalRecord(&mut self.#ident)),
    };
    quote!(#index => ::std::option::Option::Some(#body),)
}

fn generate_column_value_arm(index: usize, field: &FieldInfo<'_>) -> TokenStream2 {
    let ident = field.ident;
    match field.kind {
        Kind::Scalar | Kind::OptionalScalar => quote! {
            #index => ::std::option::Option::Some(::shelfmap::ValueType::into_value(
                ::std::clone::Clone::clone(&self.#ident),
            )),
        },
        Kind::Record => quote! {
            #index => ::shelfmap::Record::primary_key_value(&self.#ident),
        },
        Kind::OptionalRecord => {
            let inner = field.inner.unwrap_or(field.ty);
            quote! {
                #index => match &self.#ident {
                    ::std::option::Option::Some(nested) => ::shelfmap::Record::primary_key_value(nested),
                    ::std::option::Option::None => <#inner as ::shelfmap::Record>::null_primary_key(),
                },
            }
        }
    }
}

fn generate_scan_arm(index: usize, field: &FieldInfo<'_>) -> TokenStream2 {
    let ident = field.ident;
    match field.kind {
        Kind::Scalar => {
            let ty = field.ty;
            quote! {
                #index => {
                    self.#ident = <#ty as ::shelfmap::TryGetable>::try_get(value)?;
                    ::std::result::Result::Ok(())
                }
            }
        }
        Kind::OptionalScalar => {
            let inner = field.inner.unwrap_or(field.ty);
            quote! {
                #index => {
                    self.#ident = <#inner as ::shelfmap::TryGetable>::try_get_opt(value)?;
                    ::std::result::Result::Ok(())
                }
            }
        }
        Kind::Record => quote! {
            #index => ::shelfmap::Record::scan_primary_key(&mut self.#ident, value),
        },
        Kind::OptionalRecord => quote! {
            #index => match self.#ident.as_mut() {
                ::std::option::Option::Some(nested) => ::shelfmap::Record::scan_primary_key(nested, value),
                ::std::option::Option::None => ::std::result::Result::Ok(()),
            },
        },
    }
}
