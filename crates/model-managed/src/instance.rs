//! Managed instances and their property storage

use crate::error::ManagedError;
use model_schema::{PropertySchema, ValidatedContract};
use std::fmt::{self, Display, Formatter};
use std::sync::Arc;

/// Value stored in a managed property
#[derive(Debug, Clone, PartialEq, Eq, Hash)]
#[non_exhaustive]
pub enum PropertyValue {
    /// Text value
    Text(String),
}

impl PropertyValue {
    /// Text content, if this is a text value
    #[inline]
    #[must_use]
    pub fn as_text(&self) -> Option<&str> {
        match self {
            Self::Text(s) => Some(s.as_str()),
        }
    }

    fn default_for(_schema: &PropertySchema) -> Self {
        Self::Text(String::new())
    }
}

impl From<&str> for PropertyValue {
    fn from(value: &str) -> Self {
        Self::Text(value.to_string())
    }
}

impl From<String> for PropertyValue {
    fn from(value: String) -> Self {
        Self::Text(value)
    }
}

impl Display for PropertyValue {
    fn fmt(&self, f: &mut Formatter<'_>) -> fmt::Result {
        match self {
            Self::Text(s) => f.write_str(s),
        }
    }
}

/// A live object conforming to a validated contract
///
/// Storage is owned exclusively by the instance; the only way to change a
/// value is through a mutator of the contract.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct ManagedInstance {
    contract: Arc<ValidatedContract>,
    slots: Vec<PropertyValue>,
}

impl ManagedInstance {
    pub(crate) fn new(contract: Arc<ValidatedContract>) -> Self {
        let slots = contract
            .properties()
            .iter()
            .map(PropertyValue::default_for)
            .collect();
        Self { contract, slots }
    }

    /// Contract this instance implements
    #[inline]
    #[must_use]
    pub fn contract(&self) -> &ValidatedContract {
        &self.contract
    }

    /// Current text of `property`
    ///
    /// # Errors
    /// Returns [`ManagedError::UnknownProperty`] if the contract has no such property.
    pub fn get(&self, property: &str) -> Result<&str, ManagedError> {
        let (index, _) = self
            .contract
            .property(property)
            .ok_or_else(|| self.unknown_property(property))?;
        Ok(self.text_at(index))
    }

    /// Overwrite `property` with `value`
    ///
    /// # Errors
    /// Returns [`ManagedError::UnknownProperty`] if the contract has no such property.
    pub fn set(&mut self, property: &str, value: impl Into<String>) -> Result<(), ManagedError> {
        let (index, _) = self
            .contract
            .property(property)
            .ok_or_else(|| self.unknown_property(property))?;
        self.slots[index] = PropertyValue::Text(value.into());
        Ok(())
    }

    /// Call an accessor member by name
    ///
    /// # Errors
    /// Returns [`ManagedError::UnknownMember`] if `member` is not an accessor of the contract.
    pub fn accessor(&self, member: &str) -> Result<&PropertyValue, ManagedError> {
        let (index, _) = self
            .contract
            .accessor(member)
            .ok_or_else(|| self.unknown_member(member))?;
        Ok(&self.slots[index])
    }

    /// Call a mutator member by name
    ///
    /// # Errors
    /// Returns [`ManagedError::UnknownMember`] if `member` is not a mutator of the contract.
    pub fn mutator(&mut self, member: &str, value: PropertyValue) -> Result<(), ManagedError> {
        let (index, _) = self
            .contract
            .mutator(member)
            .ok_or_else(|| self.unknown_member(member))?;
        self.slots[index] = value;
        Ok(())
    }

    /// Dispatch a member call with positional arguments
    ///
    /// Accessors take no arguments and return the stored value; mutators
    /// take one argument and return `None`.
    ///
    /// # Errors
    /// - [`ManagedError::UnknownMember`] for names outside the contract
    /// - [`ManagedError::ArgumentMismatch`] for the wrong number of arguments
    pub fn invoke(
        &mut self,
        member: &str,
        args: Vec<PropertyValue>,
    ) -> Result<Option<PropertyValue>, ManagedError> {
        if self.contract.accessor(member).is_some() {
            if !args.is_empty() {
                return Err(self.argument_mismatch(member, 0, args.len()));
            }
            return self.accessor(member).map(|v| Some(v.clone()));
        }

        if self.contract.mutator(member).is_some() {
            let found = args.len();
            let Ok([value]) = <[PropertyValue; 1]>::try_from(args) else {
                return Err(self.argument_mismatch(member, 1, found));
            };
            self.mutator(member, value)?;
            return Ok(None);
        }

        Err(self.unknown_member(member))
    }

    /// `(property, value)` pairs in contract order
    pub fn properties(&self) -> impl Iterator<Item = (&str, &PropertyValue)> {
        self.contract
            .properties()
            .iter()
            .zip(&self.slots)
            .map(|(schema, value)| (schema.name.as_str(), value))
    }

    fn text_at(&self, index: usize) -> &str {
        match &self.slots[index] {
            PropertyValue::Text(s) => s.as_str(),
        }
    }

    fn unknown_property(&self, property: &str) -> ManagedError {
        ManagedError::UnknownProperty {
            contract: self.contract.name().to_string(),
            property: property.to_string(),
        }
    }

    fn unknown_member(&self, member: &str) -> ManagedError {
        ManagedError::UnknownMember {
            contract: self.contract.name().to_string(),
            member: member.to_string(),
        }
    }

    fn argument_mismatch(&self, member: &str, expected: usize, found: usize) -> ManagedError {
        ManagedError::ArgumentMismatch {
            contract: self.contract.name().to_string(),
            member: member.to_string(),
            expected,
            found,
        }
    }
}

impl Display for ManagedInstance {
    fn fmt(&self, f: &mut Formatter<'_>) -> fmt::Result {
        write!(f, "{} {{", self.contract.name())?;
        for (i, (name, value)) in self.properties().enumerate() {
            let sep = if i == 0 { " " } else { ", " };
            write!(f, "{sep}{name}: {value:?}")?;
        }
        write!(f, " }}")
    }
}
