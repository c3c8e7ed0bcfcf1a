use crate::attributes::FieldAttributes;
use proc_macro2::TokenStream;
use quote::quote;
use syn::{GenericArgument, PathArguments, Type};

const POINTER_TYPES: [&str; 3] = ["InstancePtr", "Arc", "Rc"];

fn single_generic_argument<'a>(ty: &'a Type, names: &[&str]) -> Option<&'a Type> {
    let Type::Path(path) = ty else {
        return None;
    };

    let segment = path.path.segments.last()?;
    if !names.iter().any(|name| segment.ident == name) {
        return None;
    }

    match &segment.arguments {
        PathArguments::AngleBracketed(arguments) if arguments.args.len() == 1 => {
            match arguments.args.first()? {
                GenericArgument::Type(ty) => Some(ty),
                _ => None,
            }
        }
        _ => None,
    }
}

/// Generates a `ParameterDescriptor` for a field or method argument. Instance pointers become
/// typed parameters, while `Option` makes them nullable.
pub fn parameter_descriptor(name: &str, ty: &Type, attributes: &FieldAttributes) -> TokenStream {
    let (ty, nullable) = match single_generic_argument(ty, &["Option"]) {
        Some(inner) => (inner, true),
        None => (ty, false),
    };

    let mut descriptor = match single_generic_argument(ty, &POINTER_TYPES) {
        Some(target) if !attributes.variadic => quote! {
            rulewire_di::descriptor::ParameterDescriptor::typed(
                #name,
                <#target as rulewire_di::descriptor::Injectable>::NAME,
            )
        },
        _ => quote! {
            rulewire_di::descriptor::ParameterDescriptor::untyped(#name)
        },
    };

    if nullable {
        descriptor = quote!(#descriptor.nullable());
    }

    if let Some(default) = &attributes.default {
        descriptor = quote!(#descriptor.with_default(#default()));
    }

    if attributes.variadic {
        descriptor = quote!(#descriptor.variadic());
    }

    descriptor
}

/// Generates conversion of the next resolved argument, or all remaining ones for variadic
/// parameters. Expects an `args` iterator in scope.
pub fn argument_conversion(attributes: &FieldAttributes) -> TokenStream {
    if attributes.variadic {
        quote! {
            rulewire_di::value::FromValue::from_value(
                rulewire_di::value::Value::List(args.by_ref().collect())
            )?
        }
    } else {
        quote! {
            rulewire_di::value::FromValue::from_value(args.next().unwrap_or_default())?
        }
    }
}

/// Interface type for a trait, matching the instance pointer bounds.
pub fn interface_type(path: &syn::Path) -> TokenStream {
    #[cfg(feature = "threadsafe")]
    {
        quote!(dyn #path + Send + Sync)
    }
    #[cfg(not(feature = "threadsafe"))]
    {
        quote!(dyn #path)
    }
}
