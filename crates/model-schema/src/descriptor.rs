//! Structural type descriptors
//!
//! A [`TypeDescriptor`] is the language-neutral description of a candidate
//! model type: its shape, the contracts it extends, its fields and its
//! members. Descriptors are plain data; whether one is an acceptable
//! capability contract is decided by the validator.

use crate::property::{accessor_name, mutator_name};
use serde::{Deserialize, Serialize};
use std::fmt::{self, Display, Formatter};

/// Kind of value carried by a member parameter, return or property
#[derive(Debug, Clone, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum ValueType {
    /// Text value
    Text,
    /// Signed integer value
    Integer,
    /// Boolean value
    Boolean,
    /// Floating point value
    Float,
    /// Another model type, by name
    Model(String),
}

impl ValueType {
    /// Whether managed properties may carry this kind
    #[inline]
    #[must_use]
    pub fn is_supported_property(&self) -> bool {
        matches!(self, Self::Text)
    }

    fn tag(&self) -> u8 {
        match self {
            Self::Text => 1,
            Self::Integer => 2,
            Self::Boolean => 3,
            Self::Float => 4,
            Self::Model(_) => 5,
        }
    }
}

impl Display for ValueType {
    fn fmt(&self, f: &mut Formatter<'_>) -> fmt::Result {
        match self {
            Self::Text => write!(f, "text"),
            Self::Integer => write!(f, "integer"),
            Self::Boolean => write!(f, "boolean"),
            Self::Float => write!(f, "float"),
            Self::Model(name) => write!(f, "{name}"),
        }
    }
}

/// Declared shape of a type
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum TypeShape {
    /// Pure interface: members only, no state
    Interface,
    /// Concrete or abstract class
    Class,
}

/// A single declared member (method) of a type
#[derive(Debug, Clone, PartialEq, Eq, Hash, Serialize, Deserialize)]
pub struct MemberDescriptor {
    /// Member name, e.g. `getName`
    pub name: String,
    /// Ordered parameter kinds
    #[serde(default)]
    pub params: Vec<ValueType>,
    /// Return kind, `None` for void
    #[serde(default)]
    pub returns: Option<ValueType>,
    /// Whether the member carries an implementation
    #[serde(default)]
    pub has_body: bool,
}

impl MemberDescriptor {
    /// Abstract member with the given signature
    #[must_use]
    pub fn new(name: impl Into<String>, params: Vec<ValueType>, returns: Option<ValueType>) -> Self {
        Self {
            name: name.into(),
            params,
            returns,
            has_body: false,
        }
    }

    /// Mark the member as implemented
    #[inline]
    #[must_use]
    pub fn with_body(mut self) -> Self {
        self.has_body = true;
        self
    }
}

/// Structural description of a candidate model type
#[derive(Debug, Clone, PartialEq, Eq, Hash, Serialize, Deserialize)]
pub struct TypeDescriptor {
    /// Type name
    pub name: String,
    /// Declared shape
    pub shape: TypeShape,
    /// Names of extended contracts
    #[serde(default)]
    pub extends: Vec<String>,
    /// Declared state fields
    #[serde(default)]
    pub fields: Vec<String>,
    /// Members in declaration order
    #[serde(default)]
    pub members: Vec<MemberDescriptor>,
}

impl TypeDescriptor {
    /// Empty interface descriptor
    #[must_use]
    pub fn interface(name: impl Into<String>) -> Self {
        Self {
            name: name.into(),
            shape: TypeShape::Interface,
            extends: Vec::new(),
            fields: Vec::new(),
            members: Vec::new(),
        }
    }

    /// Empty class descriptor
    #[must_use]
    pub fn class(name: impl Into<String>) -> Self {
        Self {
            shape: TypeShape::Class,
            ..Self::interface(name)
        }
    }

    /// Add a zero-argument accessor returning `kind`
    #[must_use]
    pub fn accessor(self, name: impl Into<String>, kind: ValueType) -> Self {
        self.method(MemberDescriptor::new(name, Vec::new(), Some(kind)))
    }

    /// Add a single-argument void mutator taking `kind`
    #[must_use]
    pub fn mutator(self, name: impl Into<String>, kind: ValueType) -> Self {
        self.method(MemberDescriptor::new(name, vec![kind], None))
    }

    /// Add a read/write property as an accessor/mutator pair
    ///
    /// `property("name", Text)` declares `getName` and `setName`.
    #[must_use]
    pub fn property(self, property: &str, kind: ValueType) -> Self {
        self.accessor(accessor_name(property), kind.clone())
            .mutator(mutator_name(property), kind)
    }

    /// Add an arbitrary member
    #[must_use]
    pub fn method(mut self, member: MemberDescriptor) -> Self {
        self.members.push(member);
        self
    }

    /// Declare an extended contract
    #[must_use]
    pub fn extends(mut self, parent: impl Into<String>) -> Self {
        self.extends.push(parent.into());
        self
    }

    /// Declare a state field
    #[must_use]
    pub fn field(mut self, name: impl Into<String>) -> Self {
        self.fields.push(name.into());
        self
    }

    /// Structural fingerprint of this descriptor
    #[must_use]
    pub fn fingerprint(&self) -> TypeFingerprint {
        let mut hasher = blake3::Hasher::new();

        update_str(&mut hasher, &self.name);
        hasher.update(&[match self.shape {
            TypeShape::Interface => 1u8,
            TypeShape::Class => 2u8,
        }]);

        hasher.update(&(self.extends.len() as u64).to_le_bytes());
        for parent in &self.extends {
            update_str(&mut hasher, parent);
        }

        hasher.update(&(self.fields.len() as u64).to_le_bytes());
        for field in &self.fields {
            update_str(&mut hasher, field);
        }

        hasher.update(&(self.members.len() as u64).to_le_bytes());
        for member in &self.members {
            update_str(&mut hasher, &member.name);
            hasher.update(&(member.params.len() as u64).to_le_bytes());
            for param in &member.params {
                update_value_type(&mut hasher, param);
            }
            match &member.returns {
                Some(kind) => update_value_type(&mut hasher, kind),
                None => {
                    hasher.update(&[0u8]);
                }
            }
            hasher.update(&[u8::from(member.has_body)]);
        }

        TypeFingerprint(*hasher.finalize().as_bytes())
    }
}

fn update_str(hasher: &mut blake3::Hasher, value: &str) {
    hasher.update(&(value.len() as u64).to_le_bytes());
    hasher.update(value.as_bytes());
}

fn update_value_type(hasher: &mut blake3::Hasher, kind: &ValueType) {
    hasher.update(&[kind.tag()]);
    if let ValueType::Model(name) = kind {
        update_str(hasher, name);
    }
}

/// 32-byte Blake3 digest identifying a descriptor's structure
#[derive(Debug, Clone, Copy, PartialEq, Eq, PartialOrd, Ord, Hash)]
pub struct TypeFingerprint([u8; 32]);

impl TypeFingerprint {
    /// Raw digest bytes
    #[inline]
    #[must_use]
    pub const fn as_bytes(&self) -> &[u8; 32] {
        &self.0
    }

    /// Short hex form (first 8 bytes)
    #[must_use]
    pub fn short(&self) -> String {
        hex::encode(&self.0[..8])
    }
}

impl Display for TypeFingerprint {
    fn fmt(&self, f: &mut Formatter<'_>) -> fmt::Result {
        write!(f, "{}", hex::encode(self.0))
    }
}
