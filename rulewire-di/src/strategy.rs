//! Construction strategies: everything needed to build instances for a type identifier, derived
//! once from its rule and type descriptor.

use crate::container::Container;
use crate::descriptor::{ConstructorFunction, TypeDescriptorPtr};
use crate::error::ContainerError;
use crate::instance::{Instance, InstanceAnyPtr};
use crate::resolver::{ParameterResolver, SharedPool};
use crate::rule::{InstanceOf, MethodCall, Rule};
use crate::type_name::TypeName;
use crate::type_registry::TypeRegistry;
use crate::value::{FactoryPtr, Value};
use derivative::Derivative;
use tracing::trace;

#[derive(Clone, Derivative)]
#[derivative(Debug)]
enum BaseStrategy {
    /// Construct the descriptor type, resolving parameters if it has any.
    Construct {
        descriptor: TypeDescriptorPtr,
        #[derivative(Debug = "ignore")]
        constructor: ConstructorFunction,
        resolver: Option<ParameterResolver>,
    },
    /// Call a factory from an `instanceOf` rule.
    Factory(#[derivative(Debug = "ignore")] FactoryPtr),
}

/// Cached procedure building and wiring instances for a single type identifier.
#[derive(Clone, Debug)]
pub struct ConstructionStrategy {
    name: TypeName,
    base: BaseStrategy,
    shared: bool,
    share_instances: Vec<TypeName>,
    calls: Vec<MethodCall>,
}

impl ConstructionStrategy {
    pub fn build(
        name: TypeName,
        rule: &Rule,
        registry: &TypeRegistry,
    ) -> Result<Self, ContainerError> {
        let base = match &rule.instance_of {
            Some(InstanceOf::Factory(factory)) => BaseStrategy::Factory(factory.clone()),
            Some(InstanceOf::Type(target)) => Self::construct(target, rule, registry)?,
            None => Self::construct(&name, rule, registry)?,
        };

        // a type never shares itself with its own dependencies
        let share_instances = rule
            .share_instances
            .iter()
            .filter(|type_name| {
                **type_name != name && Some(*type_name) != rule.instance_of_type()
            })
            .cloned()
            .collect();

        Ok(Self {
            name,
            base,
            shared: rule.is_shared(),
            share_instances,
            calls: rule.call.clone(),
        })
    }

    fn construct(
        target: &TypeName,
        rule: &Rule,
        registry: &TypeRegistry,
    ) -> Result<BaseStrategy, ContainerError> {
        let descriptor = registry
            .descriptor(target)
            .ok_or_else(|| ContainerError::TypeNotFound(target.to_string()))?;

        let constructor = descriptor
            .constructor
            .filter(|_| !descriptor.is_abstract)
            .ok_or_else(|| ContainerError::Instantiation(target.to_string()))?;

        let resolver = descriptor
            .params
            .as_ref()
            .filter(|params| !params.is_empty())
            .map(|params| ParameterResolver::new(params, rule));

        Ok(BaseStrategy::Construct {
            descriptor,
            constructor,
            resolver,
        })
    }

    #[inline]
    pub fn is_shared(&self) -> bool {
        self.shared
    }

    /// Only parameters and calls can consume shared pool instances.
    fn uses_pool(&self) -> bool {
        let has_params = matches!(
            &self.base,
            BaseStrategy::Construct {
                resolver: Some(_),
                ..
            }
        );

        has_params || !self.calls.is_empty()
    }

    /// Creates a new instance. Shared instances are stored in the container, unless `force_new`
    /// is set.
    pub fn invoke(
        &self,
        container: &mut Container,
        args: Vec<Value>,
        pool: &SharedPool,
        force_new: bool,
    ) -> Result<Value, ContainerError> {
        let mut pool = pool.clone();
        if self.uses_pool() {
            container.share_instances(&self.share_instances, &mut pool)?;
        }

        let value = match &self.base {
            BaseStrategy::Construct {
                descriptor,
                constructor,
                resolver,
            } => {
                let args = match resolver {
                    Some(resolver) => resolver.resolve(container, args, &pool)?,
                    None => Vec::new(),
                };

                let object = constructor(args)?;
                Value::Instance(Instance::new(
                    descriptor.clone(),
                    InstanceAnyPtr::from(object),
                ))
            }
            BaseStrategy::Factory(factory) => factory(container, Vec::new())?,
        };

        let value = self.apply_calls(container, value, &pool)?;

        if self.shared && !force_new {
            trace!(type_name = %self.name, "Storing shared instance.");
            container.store_shared(self.name.clone(), value.clone());
        }

        Ok(value)
    }

    fn apply_calls(
        &self,
        container: &mut Container,
        value: Value,
        pool: &SharedPool,
    ) -> Result<Value, ContainerError> {
        if self.calls.is_empty() {
            return Ok(value);
        }

        let mut instance = match value {
            Value::Instance(instance) => instance,
            value => {
                return Err(ContainerError::MalformedRule(format!(
                    "cannot call methods on {} created for {}",
                    value.kind(),
                    self.name
                )))
            }
        };

        let call_rule = Rule::default();

        for call in &self.calls {
            let params = instance
                .descriptor()
                .method(&call.method)
                .map(|method| method.params.clone())
                .ok_or_else(|| ContainerError::MethodNotFound {
                    type_name: instance.type_name().to_string(),
                    method: call.method.clone(),
                })?;

            let args = container.expand_all(call.args.clone(), pool)?;
            let args = ParameterResolver::new(&params, &call_rule).resolve(container, args, pool)?;
            let result = instance.invoke(&call.method, args)?;

            if let Some(callback) = &call.callback {
                callback(result);
            }
        }

        Ok(Value::Instance(instance))
    }
}
