//! Rule-driven dependency injection container with type-directed autowiring.
//!
//! Types known to the [Container](container::Container) are described by
//! [TypeDescriptors](descriptor::TypeDescriptor), usually generated with `#[derive(Injectable)]`.
//! Requesting an instance resolves its constructor parameters: typed ones are matched against
//! available instances regardless of argument order or created on demand, while untyped ones are
//! filled with plain values. How this happens is configured with [Rules](rule::Rule) registered
//! for type identifiers:
//!
//! ```
//! use rulewire_di::container::ContainerBuilder;
//! use rulewire_di::instance::InstancePtr;
//! use rulewire_di::instance_provider::TypedInstanceProvider;
//! use rulewire_di::rule::Rule;
//! use rulewire_di::value::Value;
//! use rulewire_di::Injectable;
//!
//! #[derive(Injectable)]
//! struct Database {
//!     dsn: String,
//! }
//!
//! #[derive(Injectable)]
//! struct Repository {
//!     database: InstancePtr<Database>,
//! }
//!
//! let mut container = ContainerBuilder::new().unwrap().build();
//! container.add_rule(
//!     "Database",
//!     Rule::default()
//!         .with_shared(true)
//!         .with_construct_params(vec![Value::from("sqlite::memory:")]),
//! );
//!
//! let first = container.instance_typed::<Repository>().unwrap();
//! let second = container.instance_typed::<Repository>().unwrap();
//!
//! assert!(!InstancePtr::ptr_eq(&first, &second));
//! assert!(InstancePtr::ptr_eq(&first.database, &second.database));
//! assert_eq!(first.database.dsn, "sqlite::memory:");
//! ```
//!
//! ### Features
//!
//! * `threadsafe` - use `Arc` instead of `Rc` for instances, requiring them to be `Send + Sync`
//! * `derive` - re-export the derive macros

pub mod container;
pub mod descriptor;
pub mod error;
mod expand;
pub mod instance;
pub mod instance_provider;
pub mod resolver;
pub mod rule;
pub mod rule_store;
pub mod strategy;
pub mod type_name;
pub mod type_registry;
pub mod value;

#[cfg(feature = "derive")]
pub use rulewire_di_derive::{injectable, injectable_alias, injectable_methods, Injectable};
