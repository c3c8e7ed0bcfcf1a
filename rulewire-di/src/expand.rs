//! Resolution of [LazyValue] markers embedded in rule values.

use crate::container::Container;
use crate::error::ContainerError;
use crate::resolver::SharedPool;
use crate::type_name::TypeName;
use crate::value::{LazyValue, Value};
use itertools::Itertools;

impl Container {
    /// Resolves all markers within the value, walking lists and maps recursively.
    pub(crate) fn expand(&mut self, value: Value, pool: &SharedPool) -> Result<Value, ContainerError> {
        self.expand_value(value, pool, false)
    }

    pub(crate) fn expand_all(
        &mut self,
        values: Vec<Value>,
        pool: &SharedPool,
    ) -> Result<Vec<Value>, ContainerError> {
        values
            .into_iter()
            .map(|value| self.expand(value, pool))
            .try_collect()
    }

    fn expand_value(
        &mut self,
        value: Value,
        pool: &SharedPool,
        create_from_str: bool,
    ) -> Result<Value, ContainerError> {
        match value {
            Value::Str(type_name) if create_from_str => {
                self.create_internal(&TypeName::new(&type_name), Vec::new(), pool, false)
            }
            Value::List(values) => self.expand_all(values, pool).map(Value::List),
            Value::Map(values) => values
                .into_iter()
                .map(|(key, value)| self.expand(value, pool).map(|value| (key, value)))
                .try_collect()
                .map(Value::Map),
            Value::Lazy(lazy) => self.resolve_lazy(*lazy, pool),
            value => Ok(value),
        }
    }

    fn resolve_lazy(&mut self, lazy: LazyValue, pool: &SharedPool) -> Result<Value, ContainerError> {
        match lazy {
            LazyValue::Create { type_name, params } => {
                let params = self.expand_all(params, pool)?;
                self.create_internal(&type_name, params, pool, false)
            }
            LazyValue::Factory { factory, params } => {
                let params = match params {
                    Some(params) => self.expand_all(params, pool)?,
                    None => Vec::new(),
                };

                factory(self, params)
            }
            LazyValue::Method {
                target,
                method,
                params,
            } => {
                let mut target = match self.expand_value(target, pool, true)? {
                    Value::Instance(instance) => instance,
                    value => {
                        return Err(ContainerError::MalformedRule(format!(
                            "cannot call {method} on {}",
                            value.kind()
                        )))
                    }
                };

                let params = match params {
                    Some(params) => self.expand_all(params, pool)?,
                    None => Vec::new(),
                };

                target.invoke(&method, params)
            }
            LazyValue::Constant(name) => self
                .constant(&name)
                .cloned()
                .ok_or(ContainerError::UnknownConstant(name)),
        }
    }
}
