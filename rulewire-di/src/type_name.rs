//! Type identifiers name both real types and virtual ones, like `$Database` rules with an
//! `instanceOf` target. Identifiers are case-insensitive and may be written with a leading path
//! separator, so `::app::Mailer` and `App::mailer` refer to the same rule and the same shared
//! instance.

use std::fmt::{Display, Formatter};

/// Identifier of the wildcard rule, applying to every type without a more specific rule.
pub const WILDCARD: &str = "*";

const PATH_SEPARATOR: &str = "::";

/// Normalized type identifier.
#[derive(Clone, Default, Ord, PartialOrd, Eq, PartialEq, Hash, Debug)]
pub struct TypeName(String);

impl TypeName {
    pub fn new(name: &str) -> Self {
        Self(name.trim_start_matches(PATH_SEPARATOR).to_lowercase())
    }

    #[inline]
    pub fn wildcard() -> Self {
        Self(WILDCARD.to_string())
    }

    #[inline]
    pub fn is_wildcard(&self) -> bool {
        self.0 == WILDCARD
    }

    #[inline]
    pub fn as_str(&self) -> &str {
        &self.0
    }
}

impl Display for TypeName {
    fn fmt(&self, f: &mut Formatter<'_>) -> std::fmt::Result {
        f.write_str(&self.0)
    }
}

impl From<&str> for TypeName {
    #[inline]
    fn from(value: &str) -> Self {
        Self::new(value)
    }
}

impl From<String> for TypeName {
    #[inline]
    fn from(value: String) -> Self {
        Self::new(&value)
    }
}

impl From<&String> for TypeName {
    #[inline]
    fn from(value: &String) -> Self {
        Self::new(value)
    }
}

impl From<&TypeName> for TypeName {
    #[inline]
    fn from(value: &TypeName) -> Self {
        value.clone()
    }
}
