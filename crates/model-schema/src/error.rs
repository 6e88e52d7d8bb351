//! Contract validation errors

use crate::descriptor::ValueType;

/// Reason a candidate type is not an acceptable managed contract
///
/// Every variant names the offending type; member-level variants also name
/// the member that declared the violation.
#[derive(Debug, Clone, PartialEq, Eq, thiserror::Error)]
pub enum ContractError {
    /// Candidate has state, implementation, or is not an interface
    #[error("managed type {type_name} must be an interface: {reason}")]
    NotAnInterface {
        /// Offending type
        type_name: String,
        /// What made it concrete
        reason: String,
    },

    /// Candidate extends another contract
    #[error("managed type {type_name} must not extend other types (extends {parent})")]
    ExtendsOtherContract {
        /// Offending type
        type_name: String,
        /// First extended contract
        parent: String,
    },

    /// Member is neither an accessor nor a mutator
    #[error("invalid member {type_name}.{member}: {reason}")]
    InvalidMember {
        /// Type that declared the member
        type_name: String,
        /// Offending member
        member: String,
        /// Shape violation
        reason: String,
    },

    /// Accessor without mutator or mutator without accessor
    #[error("property '{property}' of {type_name} is not read/write: {member} has no counterpart")]
    UnpairedProperty {
        /// Offending type
        type_name: String,
        /// Property name
        property: String,
        /// The member that is present
        member: String,
    },

    /// Property kind is mismatched or unsupported
    #[error(
        "property '{property}' of {type_name} has unsupported type \
         (accessor: {accessor}, mutator: {mutator}); only text properties are supported"
    )]
    UnsupportedPropertyType {
        /// Offending type
        type_name: String,
        /// Property name
        property: String,
        /// Kind returned by the accessor
        accessor: ValueType,
        /// Kind taken by the mutator
        mutator: ValueType,
    },
}

/// Discriminant of [`ContractError`]
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum ContractErrorKind {
    /// See [`ContractError::NotAnInterface`]
    NotAnInterface,
    /// See [`ContractError::ExtendsOtherContract`]
    ExtendsOtherContract,
    /// See [`ContractError::InvalidMember`]
    InvalidMember,
    /// See [`ContractError::UnpairedProperty`]
    UnpairedProperty,
    /// See [`ContractError::UnsupportedPropertyType`]
    UnsupportedPropertyType,
}

impl ContractError {
    /// Error discriminant
    #[must_use]
    pub fn kind(&self) -> ContractErrorKind {
        match self {
            Self::NotAnInterface { .. } => ContractErrorKind::NotAnInterface,
            Self::ExtendsOtherContract { .. } => ContractErrorKind::ExtendsOtherContract,
            Self::InvalidMember { .. } => ContractErrorKind::InvalidMember,
            Self::UnpairedProperty { .. } => ContractErrorKind::UnpairedProperty,
            Self::UnsupportedPropertyType { .. } => ContractErrorKind::UnsupportedPropertyType,
        }
    }

    /// Name of the rejected type
    #[must_use]
    pub fn type_name(&self) -> &str {
        match self {
            Self::NotAnInterface { type_name, .. }
            | Self::ExtendsOtherContract { type_name, .. }
            | Self::InvalidMember { type_name, .. }
            | Self::UnpairedProperty { type_name, .. }
            | Self::UnsupportedPropertyType { type_name, .. } => type_name,
        }
    }

    /// Offending member, where the violation is member-level
    #[must_use]
    pub fn member(&self) -> Option<&str> {
        match self {
            Self::InvalidMember { member, .. } | Self::UnpairedProperty { member, .. } => {
                Some(member)
            }
            _ => None,
        }
    }

    /// Offending property, where the violation is property-level
    #[must_use]
    pub fn property(&self) -> Option<&str> {
        match self {
            Self::UnpairedProperty { property, .. }
            | Self::UnsupportedPropertyType { property, .. } => Some(property),
            _ => None,
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn display_names_type_and_member() {
        let err = ContractError::InvalidMember {
            type_name: "Person".into(),
            member: "describe".into(),
            reason: "not an accessor (getX) or mutator (setX)".into(),
        };
        let msg = err.to_string();
        assert!(msg.contains("Person.describe"));
        assert_eq!(err.member(), Some("describe"));
        assert_eq!(err.kind(), ContractErrorKind::InvalidMember);
    }

    #[test]
    fn accessors_expose_location() {
        let err = ContractError::UnpairedProperty {
            type_name: "Person".into(),
            property: "name".into(),
            member: "getName".into(),
        };
        assert_eq!(err.type_name(), "Person");
        assert_eq!(err.property(), Some("name"));
        assert_eq!(err.member(), Some("getName"));

        let err = ContractError::ExtendsOtherContract {
            type_name: "Person".into(),
            parent: "Named".into(),
        };
        assert_eq!(err.member(), None);
        assert_eq!(err.property(), None);
    }
}
