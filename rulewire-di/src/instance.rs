//! Type-erased instances created by the [Container](crate::container::Container).

use crate::descriptor::{MethodInvoker, TypeDescriptor, TypeDescriptorPtr};
use crate::error::ContainerError;
use crate::type_name::TypeName;
use crate::value::Value;
use std::any::{type_name, Any, TypeId};
use std::fmt::{Debug, Formatter};
#[cfg(not(feature = "threadsafe"))]
use std::rc::Rc;
#[cfg(feature = "threadsafe")]
use std::sync::Arc;

#[cfg(not(feature = "threadsafe"))]
pub type InstancePtr<T> = Rc<T>;
#[cfg(feature = "threadsafe")]
pub type InstancePtr<T> = Arc<T>;

#[cfg(not(feature = "threadsafe"))]
pub type InstanceAny = dyn Any + 'static;
#[cfg(feature = "threadsafe")]
pub type InstanceAny = dyn Any + Send + Sync + 'static;

pub type InstanceAnyPtr = InstancePtr<InstanceAny>;

/// Bound for concrete instance types.
#[cfg(not(feature = "threadsafe"))]
pub trait InstanceType: Any {}
#[cfg(not(feature = "threadsafe"))]
impl<T: Any> InstanceType for T {}

/// Bound for concrete instance types.
#[cfg(feature = "threadsafe")]
pub trait InstanceType: Any + Send + Sync {}
#[cfg(feature = "threadsafe")]
impl<T: Any + Send + Sync> InstanceType for T {}

/// Freshly constructed object, still exclusively owned.
pub type BoxedInstance = Box<InstanceAny>;

/// Casts an instance to `Box<InstancePtr<Target>>`, where `Target` is the concrete type or one of
/// the interfaces it implements. Returns the original pointer when the cast fails.
pub type CastFunction = fn(instance: InstanceAnyPtr) -> Result<Box<dyn Any>, InstanceAnyPtr>;

/// Object created by the container, together with the descriptor of its concrete type.
#[derive(Clone)]
pub struct Instance {
    descriptor: TypeDescriptorPtr,
    ptr: InstanceAnyPtr,
}

impl Instance {
    pub fn new(descriptor: TypeDescriptorPtr, ptr: InstanceAnyPtr) -> Self {
        Self { descriptor, ptr }
    }

    /// Name of the concrete type of this instance.
    #[inline]
    pub fn type_name(&self) -> &TypeName {
        &self.descriptor.name
    }

    #[inline]
    pub fn descriptor(&self) -> &TypeDescriptor {
        &self.descriptor
    }

    #[inline]
    pub fn as_any(&self) -> &InstanceAny {
        self.ptr.as_ref()
    }

    /// Borrows the instance as its concrete type.
    #[inline]
    pub fn downcast_ref<T: Any>(&self) -> Option<&T> {
        self.ptr.downcast_ref::<T>()
    }

    /// Checks if both values point to the very same object.
    #[inline]
    pub fn ptr_eq(&self, other: &Instance) -> bool {
        InstancePtr::ptr_eq(&self.ptr, &other.ptr)
    }

    /// Returns a typed pointer to this instance. `T` can be the concrete type or any interface
    /// registered as its alias.
    pub fn cast<T: ?Sized + 'static>(&self) -> Result<InstancePtr<T>, ContainerError> {
        let cast = self
            .descriptor
            .casts
            .get(&TypeId::of::<T>())
            .ok_or_else(|| self.incompatible::<T>())?;

        cast(self.ptr.clone())
            .ok()
            .and_then(|ptr| ptr.downcast::<InstancePtr<T>>().ok())
            .map(|ptr| *ptr)
            .ok_or_else(|| self.incompatible::<T>())
    }

    /// Invokes a registered method. Mutating methods require the instance to be the only
    /// reference to the underlying object.
    pub fn invoke(&mut self, method: &str, args: Vec<Value>) -> Result<Value, ContainerError> {
        let invoker = self
            .descriptor
            .methods
            .get(method)
            .map(|method| method.invoker)
            .ok_or_else(|| ContainerError::MethodNotFound {
                type_name: self.type_name().to_string(),
                method: method.to_string(),
            })?;

        match invoker {
            MethodInvoker::Ref(invoke) => invoke(self.ptr.as_ref(), args),
            MethodInvoker::Mut(invoke) => {
                let target = InstancePtr::get_mut(&mut self.ptr).ok_or_else(|| {
                    ContainerError::SharedInstanceMutation {
                        type_name: self.descriptor.name.to_string(),
                        method: method.to_string(),
                    }
                })?;

                invoke(target, args)
            }
        }
    }

    fn incompatible<T: ?Sized>(&self) -> ContainerError {
        ContainerError::IncompatibleInstance {
            expected: type_name::<T>().to_string(),
            found: self.type_name().to_string(),
        }
    }
}

impl Debug for Instance {
    fn fmt(&self, f: &mut Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("Instance")
            .field("type_name", self.type_name())
            .finish_non_exhaustive()
    }
}
