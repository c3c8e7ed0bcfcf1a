use crate::attributes::{find_inject_attribute, FieldAttributes, TypeAttributes};
use crate::parameter::{argument_conversion, parameter_descriptor};
use itertools::Itertools;
use proc_macro2::{Ident, TokenStream};
use quote::quote;
use syn::spanned::Spanned;
use syn::{Data, DataStruct, DeriveInput, Error, Field, Fields, Result};

struct FieldParameter<'a> {
    field: &'a Field,
    name: String,
    attributes: FieldAttributes,
}

fn field_parameters(fields: &Fields) -> Result<Vec<FieldParameter>> {
    let parameters: Vec<_> = fields
        .iter()
        .enumerate()
        .map(|(index, field)| -> Result<FieldParameter> {
            Ok(FieldParameter {
                field,
                name: field
                    .ident
                    .as_ref()
                    .map(ToString::to_string)
                    .unwrap_or_else(|| index.to_string()),
                attributes: find_inject_attribute(&field.attrs)?,
            })
        })
        .try_collect()?;

    if let Some(parameter) = parameters
        .iter()
        .filter(|parameter| !parameter.attributes.ignore)
        .rev()
        .skip(1)
        .find(|parameter| parameter.attributes.variadic)
    {
        return Err(Error::new(
            parameter.field.span(),
            "Only the last parameter can be variadic!",
        ));
    }

    Ok(parameters)
}

fn field_value(parameter: &FieldParameter) -> TokenStream {
    if parameter.attributes.ignore {
        quote!(std::default::Default::default())
    } else {
        argument_conversion(&parameter.attributes)
    }
}

fn make_construction(
    ident: &Ident,
    fields: &Fields,
    parameters: &[FieldParameter],
    attributes: &TypeAttributes,
) -> TokenStream {
    if let Some(constructor) = &attributes.constructor {
        let arguments = parameters
            .iter()
            .filter(|parameter| !parameter.attributes.ignore)
            .map(field_value);

        return quote!(#constructor(#(#arguments),*)?);
    }

    match fields {
        Fields::Named(_) => {
            let fields = parameters.iter().map(|parameter| {
                let ident = &parameter.field.ident;
                let value = field_value(parameter);
                quote!(#ident: #value)
            });

            quote!(#ident { #(#fields),* })
        }
        Fields::Unnamed(_) => {
            let fields = parameters.iter().map(field_value);
            quote!(#ident(#(#fields),*))
        }
        Fields::Unit => quote!(#ident),
    }
}

pub fn expand_injectable(input: &DeriveInput) -> Result<TokenStream> {
    let Data::Struct(DataStruct { fields, .. }) = &input.data else {
        return Err(Error::new(
            input.span(),
            "Can only derive Injectable on structs!",
        ));
    };

    if !input.generics.params.is_empty() {
        return Err(Error::new(
            input.generics.span(),
            "Generic types cannot be injectable!",
        ));
    }

    let ident = &input.ident;
    let attributes: TypeAttributes = find_inject_attribute(&input.attrs)?;
    let name = attributes
        .name
        .as_ref()
        .map(|name| name.value())
        .unwrap_or_else(|| ident.to_string());

    let parameters = field_parameters(fields)?;
    let descriptors = parameters
        .iter()
        .filter(|parameter| !parameter.attributes.ignore)
        .map(|parameter| {
            parameter_descriptor(&parameter.name, &parameter.field.ty, &parameter.attributes)
        })
        .collect_vec();

    let params = if descriptors.is_empty() {
        quote!(None)
    } else {
        quote!(Some(vec![#(#descriptors),*]))
    };

    let construction = make_construction(ident, fields, &parameters, &attributes);

    Ok(quote! {
        #[automatically_derived]
        impl rulewire_di::descriptor::Injectable for #ident {
            const NAME: &'static str = #name;
        }

        const _: () = {
            #[allow(unused_mut, unused_variables)]
            fn construct(
                args: Vec<rulewire_di::value::Value>,
            ) -> Result<rulewire_di::instance::BoxedInstance, rulewire_di::error::ContainerError> {
                let mut args = args.into_iter();
                let instance: #ident = #construction;
                Ok(Box::new(instance))
            }

            fn register() -> rulewire_di::descriptor::TypeDescriptor {
                rulewire_di::descriptor::TypeDescriptor::new::<#ident>(
                    <#ident as rulewire_di::descriptor::Injectable>::NAME,
                    #params,
                    construct,
                )
            }

            rulewire_di::type_registry::internal::submit! {
                rulewire_di::type_registry::internal::TypeRegisterer {
                    register
                }
            };
        };
    })
}
