//! Type-erased model elements

use model_managed::ManagedInstance;
use std::any::{type_name, Any};
use std::fmt::{self, Debug, Formatter};

/// A realized value held by a model node
///
/// Elements are boxed so one graph can hold synthesized instances next to
/// arbitrary external collaborators; the concrete type is recovered by the
/// caller that asked for it.
pub struct ModelElement {
    value: Box<dyn Any + Send + Sync>,
    value_type: &'static str,
}

impl ModelElement {
    /// Wrap an arbitrary value
    #[must_use]
    pub fn new<T: Any + Send + Sync>(value: T) -> Self {
        Self {
            value: Box::new(value),
            value_type: type_name::<T>(),
        }
    }

    /// Wrap a managed instance
    #[inline]
    #[must_use]
    pub fn managed(instance: ManagedInstance) -> Self {
        Self::new(instance)
    }

    /// Name of the concrete Rust type
    #[inline]
    #[must_use]
    pub fn value_type(&self) -> &'static str {
        self.value_type
    }

    /// Whether the element holds a `T`
    #[inline]
    #[must_use]
    pub fn is<T: Any>(&self) -> bool {
        self.value.is::<T>()
    }

    /// Borrow as `T`
    #[inline]
    #[must_use]
    pub fn downcast_ref<T: Any>(&self) -> Option<&T> {
        self.value.downcast_ref::<T>()
    }

    /// Mutably borrow as `T`
    #[inline]
    #[must_use]
    pub fn downcast_mut<T: Any>(&mut self) -> Option<&mut T> {
        self.value.downcast_mut::<T>()
    }

    /// Borrow as a managed instance
    #[inline]
    #[must_use]
    pub fn as_managed(&self) -> Option<&ManagedInstance> {
        self.downcast_ref()
    }

    /// Mutably borrow as a managed instance
    #[inline]
    #[must_use]
    pub fn as_managed_mut(&mut self) -> Option<&mut ManagedInstance> {
        self.downcast_mut()
    }

    /// Take the value out as `T`
    ///
    /// # Errors
    /// Returns the element unchanged when it does not hold a `T`.
    pub fn into_inner<T: Any>(self) -> Result<T, Self> {
        let value_type = self.value_type;
        self.value
            .downcast::<T>()
            .map(|boxed| *boxed)
            .map_err(|value| Self { value, value_type })
    }
}

impl Debug for ModelElement {
    fn fmt(&self, f: &mut Formatter<'_>) -> fmt::Result {
        match self.as_managed() {
            Some(instance) => write!(f, "ModelElement({instance})"),
            None => write!(f, "ModelElement<{}>", self.value_type),
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use model_managed::synthesize;
    use model_schema::{ContractValidator, TypeDescriptor, ValueType};

    #[test]
    fn downcasts_to_stored_type() {
        let mut element = ModelElement::new(vec![1u32, 2]);
        assert!(element.is::<Vec<u32>>());
        assert!(element.downcast_ref::<String>().is_none());

        element.downcast_mut::<Vec<u32>>().unwrap().push(3);
        assert_eq!(element.downcast_ref::<Vec<u32>>(), Some(&vec![1, 2, 3]));
        assert!(element.value_type().contains("Vec<u32>"));
    }

    #[test]
    fn into_inner_returns_element_on_mismatch() {
        let element = ModelElement::new(String::from("tasks"));
        let element = element.into_inner::<u32>().unwrap_err();
        assert_eq!(element.into_inner::<String>().unwrap(), "tasks");
    }

    #[test]
    fn managed_elements_expose_instance() {
        let desc = TypeDescriptor::interface("Person").property("name", ValueType::Text);
        let contract = ContractValidator::new().validate(&desc).unwrap();

        let mut element = ModelElement::managed(synthesize(&contract));
        element.as_managed_mut().unwrap().set("name", "foo").unwrap();

        assert_eq!(element.as_managed().unwrap().get("name").unwrap(), "foo");
        assert!(format!("{element:?}").contains("Person"));
        assert!(ModelElement::new(1u8).as_managed().is_none());
    }
}
