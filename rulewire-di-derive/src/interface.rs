use crate::attributes::InterfaceAttributes;
use crate::parameter::interface_type;
use proc_macro2::TokenStream;
use quote::quote;
use std::ops::Deref;
use syn::spanned::Spanned;
use syn::{Error, Item, Path, Result, Type};

pub fn register_interface(item: &Item, attributes: &InterfaceAttributes) -> Result<TokenStream> {
    let Item::Trait(item_trait) = item else {
        return Err(Error::new(
            item.span(),
            "Only traits can be registered as injectable interfaces!",
        ));
    };

    if !item_trait.generics.params.is_empty() {
        return Err(Error::new(
            item_trait.generics.span(),
            "Generic traits cannot be injectable!",
        ));
    }

    let ident = &item_trait.ident;
    let name = attributes
        .name
        .as_ref()
        .map(|name| name.value())
        .unwrap_or_else(|| ident.to_string());
    let interface = interface_type(&Path::from(ident.clone()));

    Ok(quote! {
        #item

        #[automatically_derived]
        impl rulewire_di::descriptor::Injectable for #interface {
            const NAME: &'static str = #name;
        }

        const _: () = {
            fn register() -> rulewire_di::descriptor::TypeDescriptor {
                rulewire_di::descriptor::TypeDescriptor::interface(
                    <#interface as rulewire_di::descriptor::Injectable>::NAME,
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

pub fn register_alias(item: &Item) -> Result<TokenStream> {
    let Item::Impl(item_impl) = item else {
        return Err(Error::new(
            item.span(),
            "Registering aliases is possible only on trait implementations!",
        ));
    };

    let trait_path = item_impl
        .trait_
        .as_ref()
        .map(|(_, path, ..)| path)
        .ok_or_else(|| Error::new(item.span(), "Missing trait identifier!"))?;

    let target_type = if let Type::Path(path) = item_impl.self_ty.deref() {
        &path.path
    } else {
        return Err(Error::new(
            item_impl.self_ty.span(),
            "Aliases can only be registered for injectable types!",
        ));
    };

    let interface = interface_type(trait_path);

    Ok(quote! {
        #item

        const _: () = {
            fn cast(
                instance: rulewire_di::instance::InstanceAnyPtr,
            ) -> Result<Box<dyn std::any::Any>, rulewire_di::instance::InstanceAnyPtr> {
                instance.downcast::<#target_type>().map(|p| {
                    Box::new(p as rulewire_di::instance::InstancePtr<#interface>) as Box<dyn std::any::Any>
                })
            }

            fn register() -> rulewire_di::type_registry::internal::TypeAliasDefinition {
                rulewire_di::type_registry::internal::TypeAliasDefinition {
                    alias_type: std::any::TypeId::of::<#interface>(),
                    alias_name: <#interface as rulewire_di::descriptor::Injectable>::NAME,
                    target_name: <#target_type as rulewire_di::descriptor::Injectable>::NAME,
                    cast,
                }
            }

            rulewire_di::type_registry::internal::submit! {
                rulewire_di::type_registry::internal::TypeAliasRegisterer {
                    register
                }
            };
        };
    })
}
