use crate::attributes::{find_inject_attribute, FieldAttributes, INJECT};
use crate::parameter::{argument_conversion, parameter_descriptor};
use itertools::Itertools;
use proc_macro2::TokenStream;
use quote::{format_ident, quote};
use syn::spanned::Spanned;
use syn::{Error, FnArg, ImplItem, ImplItemFn, Item, Pat, Result, Visibility};

struct RegisteredMethod {
    name: String,
    descriptor: TokenStream,
    invoker: TokenStream,
}

fn is_registered(method: &ImplItemFn) -> Result<bool> {
    let attributes: FieldAttributes = find_inject_attribute(&method.attrs)?;
    Ok(matches!(method.vis, Visibility::Public(_))
        && method.sig.receiver().is_some()
        && !attributes.ignore)
}

fn register_method(target: &syn::Type, method: &ImplItemFn) -> Result<RegisteredMethod> {
    let ident = &method.sig.ident;
    let name = ident.to_string();

    if method.sig.asyncness.is_some() || !method.sig.generics.params.is_empty() {
        return Err(Error::new(
            method.sig.span(),
            "Injectable methods cannot be async or generic!",
        ));
    }

    let mut descriptors = Vec::new();
    let mut arguments = Vec::new();
    let mut is_mut = false;

    for (index, input) in method.sig.inputs.iter().enumerate() {
        match input {
            FnArg::Receiver(receiver) => {
                if receiver.reference.is_none() {
                    return Err(Error::new(
                        receiver.span(),
                        "Injectable methods must take self by reference!",
                    ));
                }

                is_mut = receiver.mutability.is_some();
            }
            FnArg::Typed(argument) => {
                let attributes: FieldAttributes = find_inject_attribute(&argument.attrs)?;
                let name = match argument.pat.as_ref() {
                    Pat::Ident(pat) => pat.ident.to_string(),
                    _ => index.to_string(),
                };

                descriptors.push(parameter_descriptor(&name, &argument.ty, &attributes));
                arguments.push(argument_conversion(&attributes));
            }
        }
    }

    let invoke = format_ident!("invoke_{}", ident);
    let invoker = if is_mut {
        quote! {
            fn #invoke(
                target: &mut rulewire_di::instance::InstanceAny,
                args: Vec<rulewire_di::value::Value>,
            ) -> Result<rulewire_di::value::Value, rulewire_di::error::ContainerError> {
                let target = target.downcast_mut::<#target>().ok_or_else(|| {
                    rulewire_di::error::ContainerError::IncompatibleInstance {
                        expected: <#target as rulewire_di::descriptor::Injectable>::NAME.to_string(),
                        found: std::any::type_name::<rulewire_di::instance::InstanceAny>().to_string(),
                    }
                })?;
                #[allow(unused_mut, unused_variables)]
                let mut args = args.into_iter();
                Ok(rulewire_di::value::Value::from(target.#ident(#(#arguments),*)))
            }
        }
    } else {
        quote! {
            fn #invoke(
                target: &rulewire_di::instance::InstanceAny,
                args: Vec<rulewire_di::value::Value>,
            ) -> Result<rulewire_di::value::Value, rulewire_di::error::ContainerError> {
                let target = target.downcast_ref::<#target>().ok_or_else(|| {
                    rulewire_di::error::ContainerError::IncompatibleInstance {
                        expected: <#target as rulewire_di::descriptor::Injectable>::NAME.to_string(),
                        found: std::any::type_name::<rulewire_di::instance::InstanceAny>().to_string(),
                    }
                })?;
                #[allow(unused_mut, unused_variables)]
                let mut args = args.into_iter();
                Ok(rulewire_di::value::Value::from(target.#ident(#(#arguments),*)))
            }
        }
    };

    let invoker_variant = if is_mut {
        quote!(rulewire_di::descriptor::MethodInvoker::Mut(#invoke))
    } else {
        quote!(rulewire_di::descriptor::MethodInvoker::Ref(#invoke))
    };

    Ok(RegisteredMethod {
        name,
        descriptor: quote! {
            rulewire_di::descriptor::MethodDescriptor {
                params: vec![#(#descriptors),*],
                invoker: #invoker_variant,
            }
        },
        invoker,
    })
}

/// Strips helper attributes, which are not valid outside the macro.
fn strip_inject_attributes(item: &mut Item) {
    if let Item::Impl(item_impl) = item {
        for impl_item in &mut item_impl.items {
            if let ImplItem::Fn(method) = impl_item {
                method
                    .attrs
                    .retain(|attribute| !attribute.path().is_ident(INJECT));

                for input in &mut method.sig.inputs {
                    if let FnArg::Typed(argument) = input {
                        argument
                            .attrs
                            .retain(|attribute| !attribute.path().is_ident(INJECT));
                    }
                }
            }
        }
    }
}

pub fn register_methods(item: &Item) -> Result<TokenStream> {
    let Item::Impl(item_impl) = item else {
        return Err(Error::new(
            item.span(),
            "Methods can only be registered on impl blocks!",
        ));
    };

    if item_impl.trait_.is_some() || !item_impl.generics.params.is_empty() {
        return Err(Error::new(
            item_impl.span(),
            "Methods can only be registered on inherent, non-generic impl blocks!",
        ));
    }

    let target = item_impl.self_ty.as_ref();
    let mut methods = Vec::new();
    for impl_item in &item_impl.items {
        if let ImplItem::Fn(method) = impl_item {
            if is_registered(method)? {
                methods.push(register_method(target, method)?);
            }
        }
    }

    let names = methods.iter().map(|method| &method.name).collect_vec();
    let descriptors = methods.iter().map(|method| &method.descriptor).collect_vec();
    let invokers = methods.iter().map(|method| &method.invoker).collect_vec();

    let mut item = item.clone();
    strip_inject_attributes(&mut item);

    Ok(quote! {
        #item

        const _: () = {
            #(#invokers)*

            fn register() -> rulewire_di::type_registry::internal::TypeMethodsDefinition {
                rulewire_di::type_registry::internal::TypeMethodsDefinition {
                    target_name: <#target as rulewire_di::descriptor::Injectable>::NAME,
                    methods: vec![#((#names, #descriptors)),*],
                }
            }

            rulewire_di::type_registry::internal::submit! {
                rulewire_di::type_registry::internal::TypeMethodsRegisterer {
                    register
                }
            };
        };
    })
}
