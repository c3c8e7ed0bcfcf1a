use crate::attributes::InterfaceAttributes;
use crate::injectable::expand_injectable;
use crate::interface::{register_alias, register_interface};
use crate::methods::register_methods;
use proc_macro::TokenStream;
use syn::{parse_macro_input, DeriveInput, Error, Item};

mod attributes;
mod injectable;
mod interface;
mod methods;
mod parameter;

/// Registers a struct as a type constructible by the container. Please see the documentation of
/// `rulewire_di::descriptor` for supported `#[inject]` options.
#[proc_macro_derive(Injectable, attributes(inject))]
pub fn generate_injectable(input: TokenStream) -> TokenStream {
    let input = parse_macro_input!(input as DeriveInput);
    expand_injectable(&input)
        .unwrap_or_else(Error::into_compile_error)
        .into()
}

/// Registers a trait as an abstract interface type. The type identifier defaults to the trait
/// name and can be changed with `name = "..."`.
#[proc_macro_attribute]
pub fn injectable(attr: TokenStream, item: TokenStream) -> TokenStream {
    let attributes = match InterfaceAttributes::parse(attr) {
        Ok(attributes) => attributes,
        Err(error) => return error.into_compile_error().into(),
    };

    let item = parse_macro_input!(item as Item);
    register_interface(&item, &attributes)
        .unwrap_or_else(Error::into_compile_error)
        .into()
}

/// Registers a trait implementation as a subtype relation, allowing instances to be cast to the
/// trait.
#[proc_macro_attribute]
pub fn injectable_alias(_attr: TokenStream, item: TokenStream) -> TokenStream {
    let item = parse_macro_input!(item as Item);
    register_alias(&item)
        .unwrap_or_else(Error::into_compile_error)
        .into()
}

/// Registers public `&self` and `&mut self` methods of an inherent impl block as callable by
/// rules. Methods can be skipped with `#[inject(ignore)]`.
#[proc_macro_attribute]
pub fn injectable_methods(_attr: TokenStream, item: TokenStream) -> TokenStream {
    let item = parse_macro_input!(item as Item);
    register_methods(&item)
        .unwrap_or_else(Error::into_compile_error)
        .into()
}
