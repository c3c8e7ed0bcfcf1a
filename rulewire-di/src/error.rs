use thiserror::Error;

/// Errors related to creating instances and wiring their dependencies.
#[derive(Error, Clone, Ord, PartialOrd, Eq, PartialEq, Hash, Debug)]
pub enum ContainerError {
    #[error("Cannot find a type descriptor for: {0}")]
    TypeNotFound(String),
    #[error("Cannot instantiate abstract type '{0}' - register a rule with a concrete instanceOf.")]
    Instantiation(String),
    #[error("Malformed rule: {0}")]
    MalformedRule(String),
    #[error("Type {type_name} has no method named: {method}")]
    MethodNotFound { type_name: String, method: String },
    #[error("Cannot find constant: {0}")]
    UnknownConstant(String),
    #[error("Tried to cast instance of {found} to incompatible type: {expected}")]
    IncompatibleInstance { expected: String, found: String },
    #[error("Expected {expected} argument, got: {found}")]
    InvalidArgument { expected: String, found: String },
    #[error("Cannot call mutating method {method} on shared instance of {type_name}")]
    SharedInstanceMutation { type_name: String, method: String },
}

/// Error related to type registries.
#[derive(Error, Clone, Ord, PartialOrd, Eq, PartialEq, Hash, Debug)]
pub enum TypeRegistryError {
    #[error("Attempted to re-register type: {0}")]
    DuplicateType(String),
    #[error("Missing target type {target_type} for alias: {alias_type}")]
    MissingAliasTarget {
        alias_type: String,
        target_type: String,
    },
    #[error("Missing target type for methods: {0}")]
    MissingMethodsTarget(String),
}
