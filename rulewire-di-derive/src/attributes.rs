use syn::{Attribute, Error, ExprPath, LitStr, Result};

pub const INJECT: &str = "inject";

#[derive(Default)]
pub struct TypeAttributes {
    pub name: Option<LitStr>,
    pub constructor: Option<ExprPath>,
}

impl TryFrom<&Attribute> for TypeAttributes {
    type Error = Error;

    fn try_from(value: &Attribute) -> Result<Self> {
        let mut name = None;
        let mut constructor = None;
        value.parse_nested_meta(|meta| {
            if meta.path.is_ident("name") {
                name = Some(meta.value()?.parse()?);
            } else if meta.path.is_ident("constructor") {
                let path: LitStr = meta.value()?.parse()?;
                constructor = Some(path.parse()?);
            } else {
                return Err(meta.error("unsupported type attribute"));
            }

            Ok(())
        })?;

        Ok(Self { name, constructor })
    }
}

#[derive(Default)]
pub struct FieldAttributes {
    pub default: Option<ExprPath>,
    pub variadic: bool,
    pub ignore: bool,
}

impl TryFrom<&Attribute> for FieldAttributes {
    type Error = Error;

    fn try_from(value: &Attribute) -> Result<Self> {
        let mut attributes = Self::default();
        value.parse_nested_meta(|meta| {
            if meta.path.is_ident("default") {
                let path: LitStr = meta.value()?.parse()?;
                attributes.default = Some(path.parse()?);
            } else if meta.path.is_ident("variadic") {
                attributes.variadic = true;
            } else if meta.path.is_ident("ignore") {
                attributes.ignore = true;
            } else {
                return Err(meta.error("unsupported field attribute"));
            }

            Ok(())
        })?;

        Ok(attributes)
    }
}

#[derive(Default)]
pub struct InterfaceAttributes {
    pub name: Option<LitStr>,
}

impl InterfaceAttributes {
    pub fn parse(input: proc_macro::TokenStream) -> Result<Self> {
        let mut name = None;
        let parser = syn::meta::parser(|meta| {
            if meta.path.is_ident("name") {
                name = Some(meta.value()?.parse()?);
                Ok(())
            } else {
                Err(meta.error("unsupported interface attribute"))
            }
        });

        syn::parse::Parser::parse(parser, input)?;
        Ok(Self { name })
    }
}

/// Finds the single `#[inject]` attribute and parses it.
pub fn find_inject_attribute<'a, T>(attributes: &'a [Attribute]) -> Result<T>
where
    T: Default + TryFrom<&'a Attribute, Error = Error>,
{
    attributes
        .iter()
        .find(|attribute| attribute.path().is_ident(INJECT))
        .map(T::try_from)
        .transpose()
        .map(Option::unwrap_or_default)
}
