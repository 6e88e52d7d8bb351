//! Stable model type identifiers

use crate::descriptor::TypeDescriptor;
use std::cmp::Ordering;
use std::fmt::{self, Debug, Display, Formatter};
use std::hash::{Hash, Hasher};
use std::sync::Arc;

/// Identifier of a model element type, used to key graph nodes
///
/// Identity is the type name. A managed type additionally carries the
/// descriptor of its capability contract; an opaque type is an external
/// collaborator whose instances are supplied by creation rules.
#[derive(Clone)]
pub struct ModelType {
    name: Arc<str>,
    contract: Option<Arc<TypeDescriptor>>,
}

impl ModelType {
    /// External type with no contract
    #[must_use]
    pub fn opaque(name: impl AsRef<str>) -> Self {
        Self {
            name: Arc::from(name.as_ref()),
            contract: None,
        }
    }

    /// Managed type described by `descriptor`
    #[must_use]
    pub fn managed(descriptor: TypeDescriptor) -> Self {
        Self {
            name: Arc::from(descriptor.name.as_str()),
            contract: Some(Arc::new(descriptor)),
        }
    }

    /// Type name
    #[inline]
    #[must_use]
    pub fn name(&self) -> &str {
        &self.name
    }

    /// Contract descriptor, for managed types
    #[inline]
    #[must_use]
    pub fn contract(&self) -> Option<&TypeDescriptor> {
        self.contract.as_deref()
    }

    /// Whether instances are synthesized from a contract
    #[inline]
    #[must_use]
    pub fn is_managed(&self) -> bool {
        self.contract.is_some()
    }
}

impl PartialEq for ModelType {
    fn eq(&self, other: &Self) -> bool {
        self.name == other.name
    }
}

impl Eq for ModelType {}

impl Hash for ModelType {
    fn hash<H: Hasher>(&self, state: &mut H) {
        self.name.hash(state);
    }
}

impl PartialOrd for ModelType {
    fn partial_cmp(&self, other: &Self) -> Option<Ordering> {
        Some(self.cmp(other))
    }
}

impl Ord for ModelType {
    fn cmp(&self, other: &Self) -> Ordering {
        self.name.cmp(&other.name)
    }
}

impl Display for ModelType {
    fn fmt(&self, f: &mut Formatter<'_>) -> fmt::Result {
        f.write_str(&self.name)
    }
}

impl Debug for ModelType {
    fn fmt(&self, f: &mut Formatter<'_>) -> fmt::Result {
        if self.is_managed() {
            write!(f, "ModelType::managed({})", self.name)
        } else {
            write!(f, "ModelType::opaque({})", self.name)
        }
    }
}
