//! Core functionality for creating instances according to registered [Rule]s.

use crate::error::{ContainerError, TypeRegistryError};
use crate::instance::{Instance, InstancePtr};
use crate::instance_provider::InstanceProvider;
use crate::resolver::SharedPool;
use crate::rule::Rule;
use crate::rule_store::RuleStore;
use crate::strategy::ConstructionStrategy;
use crate::type_name::TypeName;
use crate::type_registry::TypeRegistry;
use crate::value::Value;
use fxhash::FxHashMap;
use tracing::{debug, trace};

pub type ConstantMap = FxHashMap<String, Value>;

/// Builder for [Container] with sensible defaults, for easy construction.
pub struct ContainerBuilder {
    type_registry: TypeRegistry,
    default_rule: Option<Rule>,
    constants: ConstantMap,
}

impl ContainerBuilder {
    /// Creates a new builder with all statically registered types.
    pub fn new() -> Result<Self, TypeRegistryError> {
        Ok(Self {
            type_registry: TypeRegistry::from_inventory(false)?,
            default_rule: None,
            constants: Default::default(),
        })
    }

    /// Sets new [TypeRegistry].
    pub fn with_type_registry(mut self, type_registry: TypeRegistry) -> Self {
        self.type_registry = type_registry;
        self
    }

    /// Sets the wildcard rule, applying to all types without a more specific rule.
    pub fn with_default_rule(mut self, default_rule: Rule) -> Self {
        self.default_rule = Some(default_rule);
        self
    }

    /// Adds a new constant, available to constant markers.
    pub fn with_constant<N: ToString, V: Into<Value>>(mut self, name: N, value: V) -> Self {
        self.constants.insert(name.to_string(), value.into());
        self
    }

    /// Builds resulting [Container].
    pub fn build(self) -> Container {
        let mut container = Container::new(self.type_registry);
        container.constants = self.constants;

        if let Some(default_rule) = self.default_rule {
            container.add_rule(TypeName::wildcard(), default_rule);
        }

        container
    }
}

/// Dependency injection container. Creates instances of registered types, wiring their
/// dependencies according to rules.
///
/// Construction strategies are derived from rules on first use and cached, so rules should be
/// registered before instances are requested.
#[derive(Debug)]
pub struct Container {
    type_registry: TypeRegistry,
    rules: RuleStore,
    strategies: FxHashMap<TypeName, InstancePtr<ConstructionStrategy>>,
    instances: FxHashMap<TypeName, Value>,
    /// Identifiers currently being created for a shared pool.
    sharing: Vec<TypeName>,
    pub(crate) constants: ConstantMap,
}

impl Container {
    pub fn new(type_registry: TypeRegistry) -> Self {
        Self {
            type_registry,
            rules: Default::default(),
            strategies: Default::default(),
            instances: Default::default(),
            sharing: Vec::new(),
            constants: Default::default(),
        }
    }

    #[inline]
    pub fn type_registry(&self) -> &TypeRegistry {
        &self.type_registry
    }

    /// Merges the rule with the one currently applying to given identifier.
    pub fn add_rule<N: Into<TypeName>>(&mut self, type_name: N, rule: Rule) {
        self.rules
            .add_rule(type_name.into(), rule, &self.type_registry);
    }

    /// Returns the rule applying to given identifier.
    pub fn rule<N: Into<TypeName>>(&self, type_name: N) -> Rule {
        self.rules.rule(&type_name.into(), &self.type_registry)
    }

    pub fn define_constant<N: ToString, V: Into<Value>>(&mut self, name: N, value: V) {
        self.constants.insert(name.to_string(), value.into());
    }

    #[inline]
    pub fn constant(&self, name: &str) -> Option<&Value> {
        self.constants.get(name)
    }

    /// Returns an instance for given identifier: the shared one if present, or a new one.
    #[inline]
    pub fn create<N: Into<TypeName>>(&mut self, type_name: N) -> Result<Value, ContainerError> {
        self.create_with(type_name, Vec::new(), &SharedPool::default())
    }

    /// Like [Container::create], passing additional arguments and instances shared within the
    /// current object graph.
    pub fn create_with<N: Into<TypeName>>(
        &mut self,
        type_name: N,
        args: Vec<Value>,
        pool: &SharedPool,
    ) -> Result<Value, ContainerError> {
        self.create_internal(&type_name.into(), args, pool, false)
    }

    /// Creates a new instance, even if the rule is shared. The new instance does not replace the
    /// stored shared one.
    pub fn create_new<N: Into<TypeName>>(
        &mut self,
        type_name: N,
        args: Vec<Value>,
    ) -> Result<Value, ContainerError> {
        self.create_internal(&type_name.into(), args, &SharedPool::default(), true)
    }

    pub(crate) fn create_internal(
        &mut self,
        type_name: &TypeName,
        args: Vec<Value>,
        pool: &SharedPool,
        force_new: bool,
    ) -> Result<Value, ContainerError> {
        if !force_new {
            if let Some(instance) = self.instances.get(type_name) {
                trace!(%type_name, "Returning shared instance.");
                return Ok(instance.clone());
            }
        }

        let strategy = match self.strategies.get(type_name) {
            Some(strategy) => strategy.clone(),
            None => {
                let rule = self.rule(type_name);
                let strategy = InstancePtr::new(ConstructionStrategy::build(
                    type_name.clone(),
                    &rule,
                    &self.type_registry,
                )?);

                debug!(%type_name, shared = strategy.is_shared(), "Built construction strategy.");

                self.strategies
                    .insert(type_name.clone(), strategy.clone());
                strategy
            }
        };

        strategy.invoke(self, args, pool, force_new)
    }

    /// Creates instances for identifiers not yet present in the pool. Identifiers already being
    /// created for an enclosing pool are skipped, so rules sharing each other terminate.
    pub(crate) fn share_instances(
        &mut self,
        type_names: &[TypeName],
        pool: &mut SharedPool,
    ) -> Result<(), ContainerError> {
        for type_name in type_names {
            if pool.contains(type_name) || self.sharing.contains(type_name) {
                continue;
            }

            self.sharing.push(type_name.clone());
            let instance = self.create_internal(type_name, Vec::new(), pool, false);
            self.sharing.pop();

            pool.push(type_name.clone(), instance?);
        }

        Ok(())
    }

    pub(crate) fn store_shared(&mut self, type_name: TypeName, value: Value) {
        self.instances.insert(type_name, value);
    }

    pub(crate) fn is_instance_of(&self, instance: &Instance, type_name: &TypeName) -> bool {
        self.type_registry.is_a(instance.type_name(), type_name)
    }
}

impl InstanceProvider for Container {
    #[inline]
    fn instance(
        &mut self,
        identifier: &str,
        args: Vec<Value>,
        pool: &SharedPool,
    ) -> Result<Value, ContainerError> {
        self.create_with(identifier, args, pool)
    }
}
