//! Dynamic values used as constructor arguments, rule parameters and method results.
//!
//! Besides plain data, a [Value] can hold a constructed [Instance] or a [LazyValue] - a tagged
//! marker resolved only when an argument list is being built. Since markers are a separate
//! variant, they never collide with legitimate list or map arguments.

use crate::descriptor::Injectable;
use crate::error::ContainerError;
use crate::instance::{Instance, InstancePtr};
use crate::instance_provider::InstanceProvider;
use crate::type_name::TypeName;
use derivative::Derivative;
use indexmap::IndexMap;

#[cfg(not(feature = "threadsafe"))]
pub type FactoryPtr = InstancePtr<
    dyn Fn(&mut dyn InstanceProvider, Vec<Value>) -> Result<Value, ContainerError>,
>;
#[cfg(feature = "threadsafe")]
pub type FactoryPtr = InstancePtr<
    dyn Fn(&mut dyn InstanceProvider, Vec<Value>) -> Result<Value, ContainerError> + Send + Sync,
>;

/// Wraps a closure as a [FactoryPtr].
#[cfg(not(feature = "threadsafe"))]
pub fn factory<F>(factory: F) -> FactoryPtr
where
    F: Fn(&mut dyn InstanceProvider, Vec<Value>) -> Result<Value, ContainerError> + 'static,
{
    InstancePtr::new(factory)
}

/// Wraps a closure as a [FactoryPtr].
#[cfg(feature = "threadsafe")]
pub fn factory<F>(factory: F) -> FactoryPtr
where
    F: Fn(&mut dyn InstanceProvider, Vec<Value>) -> Result<Value, ContainerError>
        + Send
        + Sync
        + 'static,
{
    InstancePtr::new(factory)
}

/// Map argument, keeping keys in insertion order.
pub type ValueMap = IndexMap<String, Value>;

#[derive(Clone, Debug, Default)]
pub enum Value {
    #[default]
    Null,
    Bool(bool),
    Int(i64),
    Float(f64),
    Str(String),
    List(Vec<Value>),
    Map(ValueMap),
    Instance(Instance),
    Lazy(Box<LazyValue>),
}

/// Deferred instance marker.
#[derive(Clone, Derivative)]
#[derivative(Debug)]
pub enum LazyValue {
    /// Create an instance of given type, passing additional arguments.
    Create {
        type_name: TypeName,
        params: Vec<Value>,
    },
    /// Call a factory, with expanded parameters if present.
    Factory {
        #[derivative(Debug = "ignore")]
        factory: FactoryPtr,
        params: Option<Vec<Value>>,
    },
    /// Call a method on the expanded target. A bare string target is treated as a type
    /// identifier to create.
    Method {
        target: Value,
        method: String,
        params: Option<Vec<Value>>,
    },
    /// Look up a named constant.
    Constant(String),
}

impl Value {
    /// Marker for an instance of given type.
    pub fn create<N: Into<TypeName>>(type_name: N) -> Self {
        Self::create_with(type_name, Vec::new())
    }

    /// Marker for an instance of given type, created with additional arguments.
    pub fn create_with<N: Into<TypeName>>(type_name: N, params: Vec<Value>) -> Self {
        Self::Lazy(Box::new(LazyValue::Create {
            type_name: type_name.into(),
            params,
        }))
    }

    /// Marker for the result of a factory called without arguments.
    pub fn factory(factory: FactoryPtr) -> Self {
        Self::Lazy(Box::new(LazyValue::Factory {
            factory,
            params: None,
        }))
    }

    /// Marker for the result of a factory called with expanded parameters.
    pub fn factory_with(factory: FactoryPtr, params: Vec<Value>) -> Self {
        Self::Lazy(Box::new(LazyValue::Factory {
            factory,
            params: Some(params),
        }))
    }

    /// Marker for the result of a method called on `target`.
    pub fn call_method<M: ToString>(target: Value, method: M, params: Option<Vec<Value>>) -> Self {
        Self::Lazy(Box::new(LazyValue::Method {
            target,
            method: method.to_string(),
            params,
        }))
    }

    /// Marker for a named constant.
    pub fn constant<N: ToString>(name: N) -> Self {
        Self::Lazy(Box::new(LazyValue::Constant(name.to_string())))
    }

    #[inline]
    pub fn is_null(&self) -> bool {
        matches!(self, Value::Null)
    }

    #[inline]
    pub fn is_instance(&self) -> bool {
        matches!(self, Value::Instance(_))
    }

    #[inline]
    pub fn as_instance(&self) -> Option<&Instance> {
        match self {
            Value::Instance(instance) => Some(instance),
            _ => None,
        }
    }

    #[inline]
    pub fn as_str(&self) -> Option<&str> {
        match self {
            Value::Str(value) => Some(value),
            _ => None,
        }
    }

    /// Short description of the kind of value, used in error messages.
    pub fn kind(&self) -> String {
        match self {
            Value::Null => "null".to_string(),
            Value::Bool(_) => "bool".to_string(),
            Value::Int(_) => "int".to_string(),
            Value::Float(_) => "float".to_string(),
            Value::Str(_) => "string".to_string(),
            Value::List(_) => "list".to_string(),
            Value::Map(_) => "map".to_string(),
            Value::Instance(instance) => format!("instance of {}", instance.type_name()),
            Value::Lazy(_) => "lazy value".to_string(),
        }
    }

    /// Merges a more specific value on top of this one. Lists are merged element by element and
    /// maps key by key, with new keys appended; anything else is replaced.
    pub fn merge(self, other: Value) -> Value {
        match (self, other) {
            (Value::List(base), Value::List(other)) => {
                Value::List(merge_sequence_with(base, other, Value::merge))
            }
            (Value::Map(mut base), Value::Map(other)) => {
                for (key, value) in other {
                    match base.get_mut(&key) {
                        Some(existing) => *existing = std::mem::take(existing).merge(value),
                        None => {
                            base.insert(key, value);
                        }
                    }
                }
                Value::Map(base)
            }
            (_, other) => other,
        }
    }
}

/// Merges two sequences element by element: elements of `other` merge onto elements of `base`
/// at the same position, while extra elements of either are kept.
pub(crate) fn merge_sequence_with<T, F: Fn(T, T) -> T>(
    base: Vec<T>,
    other: Vec<T>,
    merge: F,
) -> Vec<T> {
    let mut other = other.into_iter();
    let mut merged: Vec<T> = base
        .into_iter()
        .map(|base| match other.next() {
            Some(other) => merge(base, other),
            None => base,
        })
        .collect();

    merged.extend(other);
    merged
}

impl PartialEq for Value {
    fn eq(&self, other: &Self) -> bool {
        match (self, other) {
            (Value::Null, Value::Null) => true,
            (Value::Bool(a), Value::Bool(b)) => a == b,
            (Value::Int(a), Value::Int(b)) => a == b,
            (Value::Float(a), Value::Float(b)) => a == b,
            (Value::Str(a), Value::Str(b)) => a == b,
            (Value::List(a), Value::List(b)) => a == b,
            (Value::Map(a), Value::Map(b)) => a == b,
            (Value::Instance(a), Value::Instance(b)) => a.ptr_eq(b),
            _ => false,
        }
    }
}

impl From<()> for Value {
    #[inline]
    fn from(_: ()) -> Self {
        Value::Null
    }
}

impl From<bool> for Value {
    #[inline]
    fn from(value: bool) -> Self {
        Value::Bool(value)
    }
}

impl From<i32> for Value {
    #[inline]
    fn from(value: i32) -> Self {
        Value::Int(value.into())
    }
}

impl From<u32> for Value {
    #[inline]
    fn from(value: u32) -> Self {
        Value::Int(value.into())
    }
}

impl From<i64> for Value {
    #[inline]
    fn from(value: i64) -> Self {
        Value::Int(value)
    }
}

impl From<f64> for Value {
    #[inline]
    fn from(value: f64) -> Self {
        Value::Float(value)
    }
}

impl From<&str> for Value {
    #[inline]
    fn from(value: &str) -> Self {
        Value::Str(value.to_string())
    }
}

impl From<String> for Value {
    #[inline]
    fn from(value: String) -> Self {
        Value::Str(value)
    }
}

impl From<Instance> for Value {
    #[inline]
    fn from(value: Instance) -> Self {
        Value::Instance(value)
    }
}

impl<T: Into<Value>> From<Option<T>> for Value {
    fn from(value: Option<T>) -> Self {
        value.map(Into::into).unwrap_or_default()
    }
}

impl<T: Into<Value>> From<Vec<T>> for Value {
    fn from(value: Vec<T>) -> Self {
        Value::List(value.into_iter().map(Into::into).collect())
    }
}

/// Conversion from resolved arguments into constructor and method parameters.
pub trait FromValue: Sized {
    fn from_value(value: Value) -> Result<Self, ContainerError>;
}

fn invalid_argument(expected: &str, value: &Value) -> ContainerError {
    ContainerError::InvalidArgument {
        expected: expected.to_string(),
        found: value.kind(),
    }
}

impl FromValue for Value {
    #[inline]
    fn from_value(value: Value) -> Result<Self, ContainerError> {
        Ok(value)
    }
}

impl FromValue for String {
    fn from_value(value: Value) -> Result<Self, ContainerError> {
        match value {
            Value::Str(value) => Ok(value),
            value => Err(invalid_argument("string", &value)),
        }
    }
}

impl FromValue for bool {
    fn from_value(value: Value) -> Result<Self, ContainerError> {
        match value {
            Value::Bool(value) => Ok(value),
            value => Err(invalid_argument("bool", &value)),
        }
    }
}

impl FromValue for i64 {
    fn from_value(value: Value) -> Result<Self, ContainerError> {
        match value {
            Value::Int(value) => Ok(value),
            value => Err(invalid_argument("int", &value)),
        }
    }
}

impl FromValue for i32 {
    fn from_value(value: Value) -> Result<Self, ContainerError> {
        match value {
            Value::Int(number) => {
                i32::try_from(number).map_err(|_| invalid_argument("i32", &Value::Int(number)))
            }
            value => Err(invalid_argument("i32", &value)),
        }
    }
}

impl FromValue for u32 {
    fn from_value(value: Value) -> Result<Self, ContainerError> {
        match value {
            Value::Int(number) => {
                u32::try_from(number).map_err(|_| invalid_argument("u32", &Value::Int(number)))
            }
            value => Err(invalid_argument("u32", &value)),
        }
    }
}

impl FromValue for f64 {
    fn from_value(value: Value) -> Result<Self, ContainerError> {
        match value {
            Value::Float(value) => Ok(value),
            Value::Int(value) => Ok(value as f64),
            value => Err(invalid_argument("float", &value)),
        }
    }
}

impl FromValue for Instance {
    fn from_value(value: Value) -> Result<Self, ContainerError> {
        match value {
            Value::Instance(instance) => Ok(instance),
            value => Err(invalid_argument("instance", &value)),
        }
    }
}

impl<T: FromValue> FromValue for Option<T> {
    fn from_value(value: Value) -> Result<Self, ContainerError> {
        match value {
            Value::Null => Ok(None),
            value => T::from_value(value).map(Some),
        }
    }
}

impl<T: FromValue> FromValue for Vec<T> {
    fn from_value(value: Value) -> Result<Self, ContainerError> {
        match value {
            Value::List(values) => values.into_iter().map(T::from_value).collect(),
            value => Err(invalid_argument("list", &value)),
        }
    }
}

impl<T: Injectable + ?Sized> FromValue for InstancePtr<T> {
    fn from_value(value: Value) -> Result<Self, ContainerError> {
        match value {
            Value::Instance(instance) => instance.cast::<T>(),
            value => Err(invalid_argument(T::NAME, &value)),
        }
    }
}

#[cfg(test)]
mod tests {
    use crate::error::ContainerError;
    use crate::value::{FromValue, Value, ValueMap};

    #[test]
    fn should_merge_lists_element_wise() {
        let base = Value::from(vec!["a", "b", "c"]);
        let merged = base.merge(Value::from(vec!["x"]));

        assert_eq!(merged, Value::from(vec!["x", "b", "c"]));
    }

    #[test]
    fn should_merge_maps_recursively() {
        let base = Value::Map(ValueMap::from([
            ("a".to_string(), Value::from(vec![1, 2])),
            ("b".to_string(), Value::from(true)),
        ]));
        let other = Value::Map(ValueMap::from([
            ("a".to_string(), Value::from(vec![3])),
            ("c".to_string(), Value::Null),
        ]));

        assert_eq!(
            base.merge(other),
            Value::Map(ValueMap::from([
                ("a".to_string(), Value::from(vec![3, 2])),
                ("b".to_string(), Value::from(true)),
                ("c".to_string(), Value::Null),
            ]))
        );
    }

    #[test]
    fn should_keep_map_key_order() {
        let base = Value::Map(ValueMap::from([
            ("z".to_string(), Value::from(1)),
            ("a".to_string(), Value::from(2)),
        ]));
        let other = Value::Map(ValueMap::from([
            ("m".to_string(), Value::from(3)),
            ("z".to_string(), Value::from(4)),
        ]));

        let Value::Map(merged) = base.merge(other) else {
            panic!("expected a map");
        };

        assert_eq!(merged.keys().collect::<Vec<_>>(), vec!["z", "a", "m"]);
        assert_eq!(merged.get("z"), Some(&Value::from(4)));
    }

    #[test]
    fn should_replace_scalars_on_merge() {
        assert_eq!(Value::from(1).merge(Value::from("a")), Value::from("a"));
    }

    #[test]
    fn should_convert_values() {
        assert_eq!(String::from_value(Value::from("a")).unwrap(), "a");
        assert_eq!(i32::from_value(Value::from(5)).unwrap(), 5);
        assert_eq!(f64::from_value(Value::from(2)).unwrap(), 2.0);
        assert_eq!(Option::<String>::from_value(Value::Null).unwrap(), None);
        assert_eq!(
            Vec::<i64>::from_value(Value::from(vec![1, 2])).unwrap(),
            vec![1, 2]
        );
    }

    #[test]
    fn should_reject_mismatched_values() {
        assert_eq!(
            String::from_value(Value::from(1)).unwrap_err(),
            ContainerError::InvalidArgument {
                expected: "string".to_string(),
                found: "int".to_string(),
            }
        );
        assert!(u32::from_value(Value::from(-1)).is_err());
    }

    #[test]
    fn should_not_treat_maps_as_markers() {
        let map = Value::Map(ValueMap::from([(
            "instance".to_string(),
            Value::from("A"),
        )]));

        assert!(!matches!(map, Value::Lazy(_)));
        assert!(matches!(Value::create("A"), Value::Lazy(_)));
    }
}
