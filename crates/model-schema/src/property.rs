//! Property naming and member classification
//!
//! Accessors are `get` followed by an uppercase character, mutators are
//! `set` followed by an uppercase character. The property name is the
//! remainder, decapitalized with the JavaBeans rule: a remainder whose first
//! two characters are both uppercase is kept verbatim (`getURL` -> `URL`),
//! otherwise only the first character is lowercased (`getName` -> `name`).

use crate::descriptor::{MemberDescriptor, ValueType};

const ACCESSOR_PREFIX: &str = "get";
const MUTATOR_PREFIX: &str = "set";

/// Role a member plays in a property pair
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum MemberRole {
    /// `getX()` returning the property kind
    Accessor {
        /// Property name
        property: String,
        /// Returned kind
        kind: ValueType,
    },
    /// `setX(value)` returning nothing
    Mutator {
        /// Property name
        property: String,
        /// Parameter kind
        kind: ValueType,
    },
}

impl MemberRole {
    /// Property this member belongs to
    #[must_use]
    pub fn property(&self) -> &str {
        match self {
            Self::Accessor { property, .. } | Self::Mutator { property, .. } => property,
        }
    }
}

/// Why a member could not be classified
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Misfit {
    /// Name has neither the accessor nor the mutator prefix
    UnrecognizedName,
    /// Accessor-named member with parameters
    AccessorTakesArguments,
    /// Accessor-named member returning nothing
    AccessorReturnsVoid,
    /// Mutator-named member without exactly one parameter
    MutatorArity,
    /// Mutator-named member returning a value
    MutatorReturnsValue,
}

impl Misfit {
    /// Human-readable reason
    #[must_use]
    pub fn describe(self) -> &'static str {
        match self {
            Self::UnrecognizedName => "not an accessor (getX) or mutator (setX)",
            Self::AccessorTakesArguments => "accessor must not take parameters",
            Self::AccessorReturnsVoid => "accessor must return a value",
            Self::MutatorArity => "mutator must take exactly one parameter",
            Self::MutatorReturnsValue => "mutator must not return a value",
        }
    }
}

/// Classify a member as accessor or mutator by name and signature
///
/// # Errors
/// Returns the [`Misfit`] describing the first shape violation.
pub fn classify(member: &MemberDescriptor) -> Result<MemberRole, Misfit> {
    if let Some(property) = property_name(&member.name, ACCESSOR_PREFIX) {
        if !member.params.is_empty() {
            return Err(Misfit::AccessorTakesArguments);
        }
        let kind = member.returns.clone().ok_or(Misfit::AccessorReturnsVoid)?;
        return Ok(MemberRole::Accessor { property, kind });
    }

    if let Some(property) = property_name(&member.name, MUTATOR_PREFIX) {
        if member.returns.is_some() {
            return Err(Misfit::MutatorReturnsValue);
        }
        let [kind] = member.params.as_slice() else {
            return Err(Misfit::MutatorArity);
        };
        return Ok(MemberRole::Mutator {
            property,
            kind: kind.clone(),
        });
    }

    Err(Misfit::UnrecognizedName)
}

/// Property name for `member_name` under `prefix`, if it has that shape
#[must_use]
pub fn property_name(member_name: &str, prefix: &str) -> Option<String> {
    let rest = member_name.strip_prefix(prefix)?;
    let first = rest.chars().next()?;
    if !first.is_uppercase() {
        return None;
    }
    Some(decapitalize(rest))
}

/// JavaBeans decapitalization
#[must_use]
pub fn decapitalize(name: &str) -> String {
    let mut chars = name.chars();
    let Some(first) = chars.next() else {
        return String::new();
    };
    if first.is_uppercase() && chars.clone().next().is_some_and(char::is_uppercase) {
        return name.to_string();
    }
    first.to_lowercase().chain(chars).collect()
}

/// Accessor member name for a property
#[must_use]
pub fn accessor_name(property: &str) -> String {
    format!("{ACCESSOR_PREFIX}{}", capitalize(property))
}

/// Mutator member name for a property
#[must_use]
pub fn mutator_name(property: &str) -> String {
    format!("{MUTATOR_PREFIX}{}", capitalize(property))
}

fn capitalize(property: &str) -> String {
    let mut chars = property.chars();
    match chars.next() {
        Some(first) => first.to_uppercase().chain(chars).collect(),
        None => String::new(),
    }
}

/// A validated read/write property of a contract
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct PropertySchema {
    /// Property name
    pub name: String,
    /// Property kind
    pub kind: ValueType,
    /// Accessor member name
    pub accessor: String,
    /// Mutator member name
    pub mutator: String,
}
