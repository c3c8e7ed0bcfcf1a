//! Matching of constructor and method parameters with available arguments.

use crate::container::Container;
use crate::descriptor::ParameterDescriptor;
use crate::error::ContainerError;
use crate::rule::Rule;
use crate::type_name::TypeName;
use crate::value::Value;

/// Instances shared by all dependents within a single object graph.
#[derive(Clone, Debug, Default)]
pub struct SharedPool {
    entries: Vec<(TypeName, Value)>,
}

impl SharedPool {
    /// Checks if an instance for given identifier is already present.
    pub fn contains(&self, type_name: &TypeName) -> bool {
        self.entries.iter().any(|(name, value)| {
            name == type_name
                || value
                    .as_instance()
                    .map(|instance| instance.type_name() == type_name)
                    .unwrap_or(false)
        })
    }

    pub fn push(&mut self, type_name: TypeName, value: Value) {
        self.entries.push((type_name, value));
    }

    pub fn values(&self) -> impl Iterator<Item = &Value> {
        self.entries.iter().map(|(_, value)| value)
    }
}

impl FromIterator<(TypeName, Value)> for SharedPool {
    fn from_iter<T: IntoIterator<Item = (TypeName, Value)>>(iter: T) -> Self {
        Self {
            entries: iter.into_iter().collect(),
        }
    }
}

#[derive(Clone, Debug)]
struct ResolvedParameter {
    descriptor: ParameterDescriptor,
    substitution: Option<Value>,
    force_new: bool,
}

/// Where a working argument comes from. Supplied arguments are consumed before rule arguments by
/// untyped parameters.
#[derive(Clone, Copy, Debug, Ord, PartialOrd, Eq, PartialEq)]
enum Origin {
    Supplied,
    Rule,
    Pool,
}

/// Argument available for matching.
#[derive(Debug)]
struct WorkingArgument {
    value: Value,
    origin: Origin,
}

impl WorkingArgument {
    #[inline]
    fn is_untyped(&self) -> bool {
        !self.value.is_instance()
    }
}

/// Removes and returns plain arguments, supplied ones first, keeping relative order otherwise.
fn take_untyped(args: &mut Vec<WorkingArgument>, include_pool: bool) -> Vec<Value> {
    let (mut taken, remaining): (Vec<_>, Vec<_>) = args.drain(..).partition(|arg| {
        (include_pool || arg.origin != Origin::Pool) && arg.is_untyped()
    });

    *args = remaining;
    taken.sort_by_key(|arg| arg.origin);
    taken.into_iter().map(|arg| arg.value).collect()
}

/// Resolver of a single signature under a given rule, reusable across invocations.
#[derive(Clone, Debug)]
pub struct ParameterResolver {
    params: Vec<ResolvedParameter>,
    construct_params: Vec<Value>,
}

impl ParameterResolver {
    pub fn new(params: &[ParameterDescriptor], rule: &Rule) -> Self {
        Self {
            params: params
                .iter()
                .map(|descriptor| ResolvedParameter {
                    substitution: descriptor
                        .type_name
                        .as_ref()
                        .and_then(|type_name| rule.substitutions.get(type_name))
                        .cloned(),
                    force_new: descriptor
                        .type_name
                        .as_ref()
                        .map(|type_name| rule.new_instances.contains(type_name))
                        .unwrap_or(false),
                    descriptor: descriptor.clone(),
                })
                .collect(),
            construct_params: rule.construct_params.clone(),
        }
    }

    /// Produces the argument list for the signature. Typed parameters take the first matching
    /// instance from construct params, the pool or supplied arguments, then a substitution, then
    /// a newly created dependency. Untyped parameters take remaining plain values, supplied ones
    /// before construct params, then their defaults.
    pub fn resolve(
        &self,
        container: &mut Container,
        supplied: Vec<Value>,
        pool: &SharedPool,
    ) -> Result<Vec<Value>, ContainerError> {
        let mut args = container
            .expand_all(self.construct_params.clone(), pool)?
            .into_iter()
            .map(|value| WorkingArgument {
                value,
                origin: Origin::Rule,
            })
            .collect::<Vec<_>>();

        args.extend(pool.values().cloned().map(|value| WorkingArgument {
            value,
            origin: Origin::Pool,
        }));
        args.extend(supplied.into_iter().map(|value| WorkingArgument {
            value,
            origin: Origin::Supplied,
        }));

        let mut resolved = Vec::with_capacity(self.params.len());
        for param in &self.params {
            let descriptor = &param.descriptor;

            if let Some(type_name) = &descriptor.type_name {
                let position = args.iter().position(|arg| match &arg.value {
                    Value::Instance(instance) => container.is_instance_of(instance, type_name),
                    Value::Null => descriptor.nullable,
                    _ => false,
                });

                let value = match (position, &param.substitution) {
                    (Some(position), _) => args.remove(position).value,
                    (None, Some(substitution)) => container.expand(substitution.clone(), pool)?,
                    (None, None) => {
                        container.create_internal(type_name, Vec::new(), pool, param.force_new)?
                    }
                };

                resolved.push(value);
                continue;
            }

            if descriptor.variadic {
                for value in take_untyped(&mut args, false) {
                    resolved.push(container.expand(value, pool)?);
                }

                continue;
            }

            let position = args
                .iter()
                .enumerate()
                .filter(|(_, arg)| arg.is_untyped())
                .min_by_key(|(index, arg)| (arg.origin, *index))
                .map(|(index, _)| index);

            if let Some(position) = position {
                let value = args.remove(position).value;
                resolved.push(container.expand(value, pool)?);
                continue;
            }

            resolved.push(descriptor.default.clone().unwrap_or_default());
        }

        for value in take_untyped(&mut args, true) {
            resolved.push(container.expand(value, pool)?);
        }

        Ok(resolved)
    }
}
