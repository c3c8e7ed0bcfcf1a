use crate::descriptor::Injectable;
use crate::error::ContainerError;
use crate::instance::InstancePtr;
use crate::resolver::SharedPool;
use crate::value::{FromValue, Value};
#[cfg(test)]
use mockall::automock;

/// Generic provider of instances, identified by type identifiers. Passed to factories, so they
/// can request their own dependencies.
#[cfg_attr(test, automock)]
pub trait InstanceProvider {
    /// Creates or returns a shared instance for given identifier, passing additional arguments
    /// and instances shared within the current object graph.
    fn instance(
        &mut self,
        identifier: &str,
        args: Vec<Value>,
        pool: &SharedPool,
    ) -> Result<Value, ContainerError>;
}

/// Helper trait for [InstanceProvider] providing strongly-typed access.
pub trait TypedInstanceProvider {
    /// Returns an instance of the type identified by [Injectable::NAME].
    fn instance_typed<T: Injectable + ?Sized>(&mut self) -> Result<InstancePtr<T>, ContainerError>;

    /// Returns an instance for given identifier, cast to `T`. Useful for virtual identifiers with
    /// an `instanceOf` rule.
    fn named_instance_typed<T: Injectable + ?Sized>(
        &mut self,
        identifier: &str,
    ) -> Result<InstancePtr<T>, ContainerError>;
}

impl<P: InstanceProvider + ?Sized> TypedInstanceProvider for P {
    #[inline]
    fn instance_typed<T: Injectable + ?Sized>(&mut self) -> Result<InstancePtr<T>, ContainerError> {
        self.named_instance_typed::<T>(T::NAME)
    }

    fn named_instance_typed<T: Injectable + ?Sized>(
        &mut self,
        identifier: &str,
    ) -> Result<InstancePtr<T>, ContainerError> {
        self.instance(identifier, Vec::new(), &SharedPool::default())
            .and_then(InstancePtr::<T>::from_value)
    }
}

#[cfg(test)]
mod tests {
    use crate::descriptor::Injectable;
    use crate::error::ContainerError;
    use crate::instance_provider::{MockInstanceProvider, TypedInstanceProvider};
    use crate::value::Value;
    use mockall::predicate::*;

    struct Missing;

    impl Injectable for Missing {
        const NAME: &'static str = "Missing";
    }

    #[test]
    fn should_request_instance_by_type_name() {
        let mut provider = MockInstanceProvider::new();
        provider
            .expect_instance()
            .with(eq("Missing"), eq(Vec::<Value>::new()), always())
            .times(1)
            .return_const(Err(ContainerError::TypeNotFound("missing".to_string())));

        assert_eq!(
            provider.instance_typed::<Missing>().err(),
            Some(ContainerError::TypeNotFound("missing".to_string()))
        );
    }

    #[test]
    fn should_reject_non_instance_values() {
        let mut provider = MockInstanceProvider::new();
        provider
            .expect_instance()
            .return_const(Ok(Value::from("text")));

        assert_eq!(
            provider.named_instance_typed::<Missing>("$text").err(),
            Some(ContainerError::InvalidArgument {
                expected: "Missing".to_string(),
                found: "string".to_string(),
            })
        );
    }
}
