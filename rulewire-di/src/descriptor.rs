//! Rust has no runtime reflection, so every type the container can build is described by a
//! [TypeDescriptor] - its constructor signature, the interfaces it can be cast to and the methods
//! callable by rules. Descriptors are usually generated at compile time:
//!
//! ```
//! use rulewire_di::instance::InstancePtr;
//! use rulewire_di::{injectable, injectable_alias, injectable_methods, Injectable};
//!
//! #[injectable]
//! trait Transport {}
//!
//! #[derive(Injectable)]
//! struct SmtpTransport;
//!
//! #[injectable_alias]
//! impl Transport for SmtpTransport {}
//!
//! #[derive(Injectable)]
//! #[inject(name = "App::Mailer")]
//! struct Mailer {
//!     // typed dependency - matched by type or constructed on demand
//!     transport: InstancePtr<dyn Transport + Send + Sync>,
//!     // untyped parameter - filled from construct params or supplied arguments
//!     #[inject(default = "default_sender")]
//!     sender: String,
//!     // not a parameter at all
//!     #[inject(ignore)]
//!     sent: usize,
//! }
//!
//! fn default_sender() -> &'static str {
//!     "noreply@example.com"
//! }
//!
//! #[injectable_methods]
//! impl Mailer {
//!     pub fn set_sender(&mut self, sender: String) {
//!         self.sender = sender;
//!     }
//! }
//! ```
//!
//! ### Supported `#[inject]` struct configuration
//!
//! * `name = "name"` - type identifier used in rules, instead of the struct name
//! * `constructor = "expr"` - call `expr(parameters...)` to construct the instance, instead of
//! using standard struct construction; parameters must be in the same order as fields in the
//! struct while ignored fields are skipped; must return `Result<Self, ContainerError>`
//!
//! ### Supported `#[inject]` field configuration
//!
//! * `default = "expr"` - call `expr()` for the parameter default value
//! * `variadic` - collect all remaining arguments; must be the last parameter
//! * `ignore` - not a constructor parameter, initialized with `Default::default()`

use crate::error::ContainerError;
use crate::instance::{
    BoxedInstance, CastFunction, InstanceAny, InstanceAnyPtr, InstancePtr, InstanceType,
};
use crate::type_name::TypeName;
use crate::value::Value;
use derivative::Derivative;
use fxhash::FxHashMap;
use std::any::{Any, TypeId};

pub type TypeDescriptorPtr = InstancePtr<TypeDescriptor>;

/// Constructor for type-erased instances, taking resolved parameters in signature order.
pub type ConstructorFunction = fn(args: Vec<Value>) -> Result<BoxedInstance, ContainerError>;

/// Marker trait for types which can be named by type identifiers - concrete types and
/// `dyn Trait` interfaces. Typically derived.
pub trait Injectable: 'static {
    /// Type identifier used in rules.
    const NAME: &'static str;
}

/// Single constructor or method parameter.
#[derive(Clone, Debug, PartialEq)]
pub struct ParameterDescriptor {
    pub name: String,

    /// Declared type, if the parameter is a dependency rather than a plain value.
    pub type_name: Option<TypeName>,

    pub nullable: bool,

    pub default: Option<Value>,

    /// Trailing parameter collecting all remaining arguments.
    pub variadic: bool,
}

impl ParameterDescriptor {
    pub fn typed<N: Into<TypeName>>(name: &str, type_name: N) -> Self {
        Self {
            name: name.to_string(),
            type_name: Some(type_name.into()),
            nullable: false,
            default: None,
            variadic: false,
        }
    }

    pub fn untyped(name: &str) -> Self {
        Self {
            name: name.to_string(),
            type_name: None,
            nullable: false,
            default: None,
            variadic: false,
        }
    }

    pub fn nullable(mut self) -> Self {
        self.nullable = true;
        self
    }

    pub fn with_default<V: Into<Value>>(mut self, default: V) -> Self {
        self.default = Some(default.into());
        self
    }

    pub fn variadic(mut self) -> Self {
        self.variadic = true;
        self
    }
}

/// Method entry point. Shared access methods can be called on any instance, while mutating ones
/// only before an instance gets shared.
#[derive(Clone, Copy, Derivative)]
#[derivative(Debug)]
pub enum MethodInvoker {
    Ref(
        #[derivative(Debug = "ignore")]
        fn(target: &InstanceAny, args: Vec<Value>) -> Result<Value, ContainerError>,
    ),
    Mut(
        #[derivative(Debug = "ignore")]
        fn(target: &mut InstanceAny, args: Vec<Value>) -> Result<Value, ContainerError>,
    ),
}

#[derive(Clone, Debug)]
pub struct MethodDescriptor {
    pub params: Vec<ParameterDescriptor>,
    pub invoker: MethodInvoker,
}

/// Signature descriptor of a type known to the container.
#[derive(Clone, Derivative)]
#[derivative(Debug)]
pub struct TypeDescriptor {
    pub name: TypeName,

    /// Interfaces cannot be instantiated without an `instanceOf` rule.
    pub is_abstract: bool,

    /// Constructor parameters; `None` for types constructed without arguments.
    pub params: Option<Vec<ParameterDescriptor>>,

    #[derivative(Debug = "ignore")]
    pub constructor: Option<ConstructorFunction>,

    /// Direct supertypes, i.e. implemented interfaces.
    pub parents: Vec<TypeName>,

    pub methods: FxHashMap<String, MethodDescriptor>,

    #[derivative(Debug = "ignore")]
    pub casts: FxHashMap<TypeId, CastFunction>,
}

fn identity_cast<T: InstanceType>(
    instance: InstanceAnyPtr,
) -> Result<Box<dyn Any>, InstanceAnyPtr> {
    instance.downcast::<T>().map(|p| Box::new(p) as Box<dyn Any>)
}

impl TypeDescriptor {
    /// Creates a descriptor of a concrete type, castable to itself.
    pub fn new<T: InstanceType>(
        name: &str,
        params: Option<Vec<ParameterDescriptor>>,
        constructor: ConstructorFunction,
    ) -> Self {
        Self {
            name: TypeName::new(name),
            is_abstract: false,
            params,
            constructor: Some(constructor),
            parents: Vec::new(),
            methods: FxHashMap::default(),
            casts: [(TypeId::of::<T>(), identity_cast::<T> as CastFunction)]
                .into_iter()
                .collect(),
        }
    }

    /// Creates a descriptor of an abstract interface type.
    pub fn interface(name: &str) -> Self {
        Self {
            name: TypeName::new(name),
            is_abstract: true,
            params: None,
            constructor: None,
            parents: Vec::new(),
            methods: FxHashMap::default(),
            casts: FxHashMap::default(),
        }
    }

    /// Registers `parent` as a supertype reachable with the given cast.
    pub fn with_parent<P: ?Sized + 'static>(mut self, parent: &str, cast: CastFunction) -> Self {
        self.add_parent(TypeName::new(parent), TypeId::of::<P>(), cast);
        self
    }

    pub fn with_method<N: ToString>(mut self, name: N, method: MethodDescriptor) -> Self {
        self.methods.insert(name.to_string(), method);
        self
    }

    #[inline]
    pub fn method(&self, name: &str) -> Option<&MethodDescriptor> {
        self.methods.get(name)
    }

    pub(crate) fn add_parent(&mut self, parent: TypeName, type_id: TypeId, cast: CastFunction) {
        if !self.parents.contains(&parent) {
            self.parents.push(parent);
        }

        self.casts.insert(type_id, cast);
    }
}
