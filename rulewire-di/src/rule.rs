//! Rules describe how instances of a type identifier are constructed and wired. They are plain
//! values: registering a rule merges it with less specific ones, while the container decides
//! what to do with the result.

use crate::instance::InstancePtr;
use crate::type_name::TypeName;
use crate::value::{merge_sequence_with, FactoryPtr, Value};
use derivative::Derivative;
use fxhash::FxHashSet;
use std::collections::BTreeMap;

#[cfg(not(feature = "threadsafe"))]
pub type CallbackPtr = InstancePtr<dyn Fn(Value)>;
#[cfg(feature = "threadsafe")]
pub type CallbackPtr = InstancePtr<dyn Fn(Value) + Send + Sync>;

/// Wraps a closure as a [CallbackPtr].
#[cfg(not(feature = "threadsafe"))]
pub fn callback<F: Fn(Value) + 'static>(callback: F) -> CallbackPtr {
    InstancePtr::new(callback)
}

/// Wraps a closure as a [CallbackPtr].
#[cfg(feature = "threadsafe")]
pub fn callback<F: Fn(Value) + Send + Sync + 'static>(callback: F) -> CallbackPtr {
    InstancePtr::new(callback)
}

/// Type actually instantiated for a rule.
#[derive(Clone, Derivative)]
#[derivative(Debug)]
pub enum InstanceOf {
    Type(TypeName),
    Factory(#[derivative(Debug = "ignore")] FactoryPtr),
}

/// Method invoked after construction.
#[derive(Clone, Derivative)]
#[derivative(Debug)]
pub struct MethodCall {
    pub method: String,
    pub args: Vec<Value>,

    /// Called with the value returned by the method.
    #[derivative(Debug = "ignore")]
    pub callback: Option<CallbackPtr>,
}

impl MethodCall {
    pub fn new<M: ToString>(method: M, args: Vec<Value>) -> Self {
        Self {
            method: method.to_string(),
            args,
            callback: None,
        }
    }

    pub fn with_callback(mut self, callback: CallbackPtr) -> Self {
        self.callback = Some(callback);
        self
    }

    fn merge(self, other: MethodCall) -> MethodCall {
        MethodCall {
            method: other.method,
            args: merge_sequence_with(self.args, other.args, Value::merge),
            callback: other.callback.or(self.callback),
        }
    }
}

#[derive(Clone, Debug, Default)]
pub struct Rule {
    /// Replacement type or factory, for virtual identifiers.
    pub instance_of: Option<InstanceOf>,

    /// Create a single instance and reuse it for every request.
    pub shared: Option<bool>,

    /// Apply this rule to subtypes. Defaults to `true`.
    pub inherit: Option<bool>,

    /// Arguments taking part in parameter matching before supplied ones.
    pub construct_params: Vec<Value>,

    /// Values used for dependencies of given types, instead of constructing them.
    pub substitutions: BTreeMap<TypeName, Value>,

    /// Types created once per object graph and passed to every dependent.
    pub share_instances: Vec<TypeName>,

    pub call: Vec<MethodCall>,

    /// Types always constructed fresh when required as dependencies.
    pub new_instances: FxHashSet<TypeName>,
}

impl Rule {
    pub fn with_instance_of<N: Into<TypeName>>(mut self, type_name: N) -> Self {
        self.instance_of = Some(InstanceOf::Type(type_name.into()));
        self
    }

    pub fn with_factory(mut self, factory: FactoryPtr) -> Self {
        self.instance_of = Some(InstanceOf::Factory(factory));
        self
    }

    pub fn with_shared(mut self, shared: bool) -> Self {
        self.shared = Some(shared);
        self
    }

    pub fn with_inherit(mut self, inherit: bool) -> Self {
        self.inherit = Some(inherit);
        self
    }

    pub fn with_construct_params(mut self, construct_params: Vec<Value>) -> Self {
        self.construct_params = construct_params;
        self
    }

    pub fn with_substitution<N: Into<TypeName>, V: Into<Value>>(
        mut self,
        type_name: N,
        value: V,
    ) -> Self {
        self.substitutions.insert(type_name.into(), value.into());
        self
    }

    pub fn with_share_instance<N: Into<TypeName>>(mut self, type_name: N) -> Self {
        self.share_instances.push(type_name.into());
        self
    }

    pub fn with_call(mut self, call: MethodCall) -> Self {
        self.call.push(call);
        self
    }

    pub fn with_new_instance<N: Into<TypeName>>(mut self, type_name: N) -> Self {
        self.new_instances.insert(type_name.into());
        self
    }

    #[inline]
    pub fn is_shared(&self) -> bool {
        self.shared.unwrap_or(false)
    }

    #[inline]
    pub fn is_inheritable(&self) -> bool {
        self.inherit.unwrap_or(true)
    }

    /// Returns the target type identifier, if the rule names one.
    #[inline]
    pub fn instance_of_type(&self) -> Option<&TypeName> {
        match &self.instance_of {
            Some(InstanceOf::Type(type_name)) => Some(type_name),
            _ => None,
        }
    }

    /// Merges a more specific rule fragment on top of this rule. Fields set in the fragment win,
    /// sequences are merged element by element and maps key by key.
    pub fn merge(self, fragment: Rule) -> Rule {
        let mut substitutions = self.substitutions;
        for (type_name, value) in fragment.substitutions {
            let value = match substitutions.remove(&type_name) {
                Some(base) => base.merge(value),
                None => value,
            };
            substitutions.insert(type_name, value);
        }

        let mut new_instances = self.new_instances;
        new_instances.extend(fragment.new_instances);

        Rule {
            instance_of: fragment.instance_of.or(self.instance_of),
            shared: fragment.shared.or(self.shared),
            inherit: fragment.inherit.or(self.inherit),
            construct_params: merge_sequence_with(
                self.construct_params,
                fragment.construct_params,
                Value::merge,
            ),
            substitutions,
            share_instances: merge_sequence_with(
                self.share_instances,
                fragment.share_instances,
                |_, other| other,
            ),
            call: merge_sequence_with(self.call, fragment.call, MethodCall::merge),
            new_instances,
        }
    }
}
