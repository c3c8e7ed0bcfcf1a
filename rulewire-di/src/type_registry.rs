//! Functionality related to registering [TypeDescriptor]s. Descriptors are usually registered
//! automatically by the derive macros, but can also be registered manually, e.g. for types from
//! external crates.

use crate::descriptor::{MethodDescriptor, TypeDescriptor, TypeDescriptorPtr};
use crate::error::TypeRegistryError;
use crate::instance::InstancePtr;
use crate::type_name::TypeName;
use crate::type_registry::internal::{
    TypeAliasDefinition, TypeAliasRegisterer, TypeMethodsDefinition, TypeMethodsRegisterer,
    TypeRegisterer,
};
use fxhash::{FxHashMap, FxHashSet};
use itertools::Itertools;
#[cfg(test)]
use mockall::automock;
use tracing::trace;

/// Subtype relation between type identifiers.
#[cfg_attr(test, automock)]
pub trait TypeHierarchy {
    /// Checks if `child` is a strict subtype of `parent`, directly or transitively.
    fn is_subclass_of(&self, child: &TypeName, parent: &TypeName) -> bool;
}

/// Registry of type descriptors, keyed by normalized type identifiers.
#[derive(Clone, Debug, Default)]
pub struct TypeRegistry {
    descriptors: FxHashMap<TypeName, TypeDescriptorPtr>,
    allow_overriding: bool,
}

impl TypeRegistry {
    pub fn new(allow_overriding: bool) -> Self {
        Self {
            descriptors: FxHashMap::default(),
            allow_overriding,
        }
    }

    /// Creates a registry with all statically registered types, aliases and methods.
    pub fn from_inventory(allow_overriding: bool) -> Result<Self, TypeRegistryError> {
        let mut registry = Self::new(allow_overriding);

        for descriptor in inventory::iter::<TypeRegisterer>
            .into_iter()
            .map(|registerer| (registerer.register)())
        {
            registry.register(descriptor)?;
        }

        let aliases = inventory::iter::<TypeAliasRegisterer>
            .into_iter()
            .map(|registerer| (registerer.register)())
            .collect_vec();

        for alias in aliases {
            registry.register_alias(alias)?;
        }

        for methods in inventory::iter::<TypeMethodsRegisterer>
            .into_iter()
            .map(|registerer| (registerer.register)())
        {
            registry.register_methods(methods)?;
        }

        Ok(registry)
    }

    /// Adds a new descriptor. Note: interfaces registered implicitly by aliases can always be
    /// replaced by explicit registration.
    pub fn register(&mut self, descriptor: TypeDescriptor) -> Result<(), TypeRegistryError> {
        if let Some(existing) = self.descriptors.get(&descriptor.name) {
            if !self.allow_overriding && !Self::is_implicit(existing) {
                return Err(TypeRegistryError::DuplicateType(
                    descriptor.name.to_string(),
                ));
            }
        }

        trace!(type_name = %descriptor.name, "Registering type.");

        self.descriptors
            .insert(descriptor.name.clone(), InstancePtr::new(descriptor));
        Ok(())
    }

    /// Registers the alias type as a parent of the target type.
    pub fn register_alias(&mut self, alias: TypeAliasDefinition) -> Result<(), TypeRegistryError> {
        let alias_name = TypeName::new(alias.alias_name);
        let target_name = TypeName::new(alias.target_name);

        let target = self.descriptors.get_mut(&target_name).ok_or_else(|| {
            TypeRegistryError::MissingAliasTarget {
                alias_type: alias.alias_name.to_string(),
                target_type: alias.target_name.to_string(),
            }
        })?;

        trace!(alias = %alias_name, target = %target_name, "Registering alias.");

        InstancePtr::make_mut(target).add_parent(alias_name.clone(), alias.alias_type, alias.cast);

        self.descriptors
            .entry(alias_name)
            .or_insert_with(|| InstancePtr::new(TypeDescriptor::interface(alias.alias_name)));

        Ok(())
    }

    /// Adds callable methods to a registered type.
    pub fn register_methods(
        &mut self,
        methods: TypeMethodsDefinition,
    ) -> Result<(), TypeRegistryError> {
        let target = self
            .descriptors
            .get_mut(&TypeName::new(methods.target_name))
            .ok_or_else(|| {
                TypeRegistryError::MissingMethodsTarget(methods.target_name.to_string())
            })?;

        let target = InstancePtr::make_mut(target);
        for (name, method) in methods.methods {
            target.methods.insert(name.to_string(), method);
        }

        Ok(())
    }

    #[inline]
    pub fn descriptor(&self, type_name: &TypeName) -> Option<TypeDescriptorPtr> {
        self.descriptors.get(type_name).cloned()
    }

    /// Checks if `type_name` names `target` itself or any of its supertypes.
    pub fn is_a(&self, type_name: &TypeName, target: &TypeName) -> bool {
        type_name == target || self.is_subclass_of(type_name, target)
    }

    fn is_implicit(descriptor: &TypeDescriptor) -> bool {
        descriptor.is_abstract && descriptor.methods.is_empty() && descriptor.parents.is_empty()
    }
}

impl TypeHierarchy for TypeRegistry {
    fn is_subclass_of(&self, child: &TypeName, parent: &TypeName) -> bool {
        let mut visited = FxHashSet::default();
        let mut pending = vec![child];

        while let Some(current) = pending.pop() {
            if !visited.insert(current) {
                continue;
            }

            if let Some(descriptor) = self.descriptors.get(current) {
                if descriptor.parents.contains(parent) {
                    return true;
                }

                pending.extend(descriptor.parents.iter());
            }
        }

        false
    }
}

pub mod internal {
    use crate::descriptor::{MethodDescriptor, TypeDescriptor};
    use crate::instance::CastFunction;
    use inventory::collect;
    pub use inventory::submit;
    use std::any::TypeId;

    pub struct TypeRegisterer {
        pub register: fn() -> TypeDescriptor,
    }

    #[derive(Clone)]
    pub struct TypeAliasDefinition {
        pub alias_type: TypeId,
        pub alias_name: &'static str,
        pub target_name: &'static str,
        pub cast: CastFunction,
    }

    pub struct TypeAliasRegisterer {
        pub register: fn() -> TypeAliasDefinition,
    }

    #[derive(Clone, Debug)]
    pub struct TypeMethodsDefinition {
        pub target_name: &'static str,
        pub methods: Vec<(&'static str, MethodDescriptor)>,
    }

    pub struct TypeMethodsRegisterer {
        pub register: fn() -> TypeMethodsDefinition,
    }

    collect!(TypeRegisterer);
    collect!(TypeAliasRegisterer);
    collect!(TypeMethodsRegisterer);
}

#[cfg(test)]
mod tests {
    use crate::descriptor::{MethodDescriptor, MethodInvoker, TypeDescriptor};
    use crate::error::TypeRegistryError;
    use crate::instance::{BoxedInstance, InstanceAnyPtr};
    use crate::type_name::TypeName;
    use crate::type_registry::internal::{TypeAliasDefinition, TypeMethodsDefinition};
    use crate::type_registry::{TypeHierarchy, TypeRegistry};
    use crate::value::Value;
    use std::any::{Any, TypeId};

    trait Service {}

    trait Base {}

    struct Concrete;

    fn concrete() -> TypeDescriptor {
        TypeDescriptor::new::<Concrete>("Concrete", None, |_| {
            Ok(Box::new(Concrete) as BoxedInstance)
        })
    }

    fn failing_cast(instance: InstanceAnyPtr) -> Result<Box<dyn Any>, InstanceAnyPtr> {
        Err(instance)
    }

    fn alias<T: ?Sized + 'static>(alias_name: &'static str, target_name: &'static str) -> TypeAliasDefinition {
        TypeAliasDefinition {
            alias_type: TypeId::of::<T>(),
            alias_name,
            target_name,
            cast: failing_cast,
        }
    }

    #[test]
    fn should_register_type() {
        let mut registry = TypeRegistry::new(false);
        registry.register(concrete()).unwrap();

        assert!(registry.descriptor(&TypeName::new("concrete")).is_some());
        assert!(registry.descriptor(&TypeName::new("CONCRETE")).is_some());
    }

    #[test]
    fn should_not_register_duplicate_type() {
        let mut registry = TypeRegistry::new(false);
        registry.register(concrete()).unwrap();

        assert_eq!(
            registry.register(concrete()).unwrap_err(),
            TypeRegistryError::DuplicateType("concrete".to_string())
        );
    }

    #[test]
    fn should_override_type_when_allowed() {
        let mut registry = TypeRegistry::new(true);
        registry.register(concrete()).unwrap();

        assert!(registry.register(concrete()).is_ok());
    }

    #[test]
    fn should_register_alias_as_parent() {
        let mut registry = TypeRegistry::new(false);
        registry.register(concrete()).unwrap();
        registry
            .register_alias(alias::<dyn Service>("Service", "Concrete"))
            .unwrap();

        let descriptor = registry.descriptor(&TypeName::new("concrete")).unwrap();
        assert_eq!(descriptor.parents, vec![TypeName::new("service")]);
        assert!(descriptor.casts.contains_key(&TypeId::of::<dyn Service>()));
        assert!(registry
            .descriptor(&TypeName::new("service"))
            .unwrap()
            .is_abstract);
    }

    #[test]
    fn should_allow_explicit_interface_after_alias() {
        let mut registry = TypeRegistry::new(false);
        registry.register(concrete()).unwrap();
        registry
            .register_alias(alias::<dyn Service>("Service", "Concrete"))
            .unwrap();

        assert!(registry
            .register(TypeDescriptor::interface("Service"))
            .is_ok());
    }

    #[test]
    fn should_not_register_alias_for_missing_target() {
        let mut registry = TypeRegistry::new(false);

        assert_eq!(
            registry
                .register_alias(alias::<dyn Service>("Service", "Concrete"))
                .unwrap_err(),
            TypeRegistryError::MissingAliasTarget {
                alias_type: "Service".to_string(),
                target_type: "Concrete".to_string(),
            }
        );
    }

    #[test]
    fn should_register_methods() {
        let mut registry = TypeRegistry::new(false);
        registry.register(concrete()).unwrap();
        registry
            .register_methods(TypeMethodsDefinition {
                target_name: "Concrete",
                methods: vec![(
                    "run",
                    MethodDescriptor {
                        params: vec![],
                        invoker: MethodInvoker::Ref(|_, _| Ok(Value::Null)),
                    },
                )],
            })
            .unwrap();

        assert!(registry
            .descriptor(&TypeName::new("concrete"))
            .unwrap()
            .method("run")
            .is_some());
    }

    #[test]
    fn should_not_register_methods_for_missing_type() {
        let mut registry = TypeRegistry::new(false);

        assert_eq!(
            registry
                .register_methods(TypeMethodsDefinition {
                    target_name: "Concrete",
                    methods: vec![],
                })
                .unwrap_err(),
            TypeRegistryError::MissingMethodsTarget("Concrete".to_string())
        );
    }

    #[test]
    fn should_check_hierarchy_transitively() {
        let mut registry = TypeRegistry::new(false);
        registry.register(concrete()).unwrap();
        registry
            .register(TypeDescriptor::interface("Service").with_parent::<dyn Base>(
                "Base",
                failing_cast,
            ))
            .unwrap();
        registry
            .register_alias(alias::<dyn Service>("Service", "Concrete"))
            .unwrap();

        let concrete = TypeName::new("concrete");
        assert!(registry.is_subclass_of(&concrete, &TypeName::new("service")));
        assert!(registry.is_subclass_of(&concrete, &TypeName::new("base")));
        assert!(!registry.is_subclass_of(&concrete, &concrete));
        assert!(registry.is_a(&concrete, &concrete));
        assert!(!registry.is_subclass_of(&TypeName::new("base"), &concrete));
    }
}
