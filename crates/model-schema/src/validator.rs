//! Capability contract validation
//!
//! [`ContractValidator`] decides whether a [`TypeDescriptor`] is an
//! acceptable managed type. Checks run in a fixed order and stop at the
//! first violation:
//!
//! 1. the candidate is a pure interface that extends nothing
//! 2. every member is an accessor or a mutator
//! 3. every property has both an accessor and a mutator
//! 4. paired kinds agree and are a supported property kind
//!
//! Verdicts are memoized by [`TypeFingerprint`]; a successful verdict is a
//! [`ValidatedContract`], which can only be produced here.

use crate::descriptor::{TypeDescriptor, TypeFingerprint, TypeShape, ValueType};
use crate::error::ContractError;
use crate::property::{classify, MemberRole, PropertySchema};
use dashmap::DashMap;
use indexmap::IndexMap;
use once_cell::sync::Lazy;
use std::sync::Arc;

static GLOBAL: Lazy<Arc<ContractValidator>> = Lazy::new(|| Arc::new(ContractValidator::new()));

/// Cached outcome of validating one descriptor
pub type Verdict = Result<Arc<ValidatedContract>, ContractError>;

/// A capability contract that passed validation
///
/// There is no public constructor: holding one proves the contract was
/// accepted by [`ContractValidator::validate`].
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct ValidatedContract {
    name: String,
    fingerprint: TypeFingerprint,
    properties: Vec<PropertySchema>,
}

impl ValidatedContract {
    /// Contract type name
    #[inline]
    #[must_use]
    pub fn name(&self) -> &str {
        &self.name
    }

    /// Fingerprint of the validated descriptor
    #[inline]
    #[must_use]
    pub fn fingerprint(&self) -> TypeFingerprint {
        self.fingerprint
    }

    /// Properties in declaration order
    #[inline]
    #[must_use]
    pub fn properties(&self) -> &[PropertySchema] {
        &self.properties
    }

    /// Index and schema of a property
    #[must_use]
    pub fn property(&self, name: &str) -> Option<(usize, &PropertySchema)> {
        self.properties
            .iter()
            .enumerate()
            .find(|(_, p)| p.name == name)
    }

    /// Index and schema of the property whose accessor is `member`
    #[must_use]
    pub fn accessor(&self, member: &str) -> Option<(usize, &PropertySchema)> {
        self.properties
            .iter()
            .enumerate()
            .find(|(_, p)| p.accessor == member)
    }

    /// Index and schema of the property whose mutator is `member`
    #[must_use]
    pub fn mutator(&self, member: &str) -> Option<(usize, &PropertySchema)> {
        self.properties
            .iter()
            .enumerate()
            .find(|(_, p)| p.mutator == member)
    }
}

/// Memoizing validator for capability contracts
#[derive(Debug, Default)]
pub struct ContractValidator {
    verdicts: DashMap<TypeFingerprint, Verdict>,
}

impl ContractValidator {
    /// Validator with an empty cache
    #[inline]
    #[must_use]
    pub fn new() -> Self {
        Self {
            verdicts: DashMap::new(),
        }
    }

    /// Process-wide validator
    #[must_use]
    pub fn global() -> Arc<ContractValidator> {
        Arc::clone(&GLOBAL)
    }

    /// Validate `descriptor`, reusing a cached verdict when present
    ///
    /// # Errors
    /// Returns the first [`ContractError`] found. Failures are cached too,
    /// so a rejected contract stays rejected.
    pub fn validate(&self, descriptor: &TypeDescriptor) -> Verdict {
        let fingerprint = descriptor.fingerprint();
        if let Some(cached) = self.verdicts.get(&fingerprint) {
            tracing::trace!(contract = %descriptor.name, "validation verdict cached");
            return cached.value().clone();
        }

        let verdict = check(descriptor, fingerprint).map(Arc::new);
        match &verdict {
            Ok(contract) => tracing::debug!(
                contract = %contract.name,
                properties = contract.properties.len(),
                fingerprint = %fingerprint.short(),
                "contract validated"
            ),
            Err(err) => tracing::debug!(contract = %descriptor.name, error = %err, "contract rejected"),
        }

        self.verdicts
            .entry(fingerprint)
            .or_insert(verdict)
            .value()
            .clone()
    }

    /// Whether a verdict for `descriptor` is cached
    #[must_use]
    pub fn is_cached(&self, descriptor: &TypeDescriptor) -> bool {
        self.verdicts.contains_key(&descriptor.fingerprint())
    }

    /// Number of cached verdicts
    #[must_use]
    pub fn cached_verdicts(&self) -> usize {
        self.verdicts.len()
    }
}

/// Validate against the process-wide cache
///
/// # Errors
/// See [`ContractValidator::validate`].
pub fn validate(descriptor: &TypeDescriptor) -> Verdict {
    GLOBAL.validate(descriptor)
}

#[derive(Default)]
struct PropertySlots<'a> {
    accessor: Option<(&'a str, ValueType)>,
    mutator: Option<(&'a str, ValueType)>,
}

fn check(desc: &TypeDescriptor, fingerprint: TypeFingerprint) -> Result<ValidatedContract, ContractError> {
    check_shape(desc)?;
    let slots = collect_members(desc)?;

    let mut pairs = Vec::with_capacity(slots.len());
    for (property, slot) in &slots {
        match (&slot.accessor, &slot.mutator) {
            (Some(accessor), Some(mutator)) => pairs.push((property, accessor, mutator)),
            (Some((member, _)), None) | (None, Some((member, _))) => {
                return Err(ContractError::UnpairedProperty {
                    type_name: desc.name.clone(),
                    property: property.clone(),
                    member: (*member).to_string(),
                });
            }
            (None, None) => {}
        }
    }

    let mut properties = Vec::with_capacity(pairs.len());
    for (property, (getter, get_kind), (setter, set_kind)) in pairs {
        if get_kind != set_kind || !get_kind.is_supported_property() {
            return Err(ContractError::UnsupportedPropertyType {
                type_name: desc.name.clone(),
                property: property.clone(),
                accessor: get_kind.clone(),
                mutator: set_kind.clone(),
            });
        }
        properties.push(PropertySchema {
            name: property.clone(),
            kind: get_kind.clone(),
            accessor: (*getter).to_string(),
            mutator: (*setter).to_string(),
        });
    }

    Ok(ValidatedContract {
        name: desc.name.clone(),
        fingerprint,
        properties,
    })
}

fn check_shape(desc: &TypeDescriptor) -> Result<(), ContractError> {
    let concrete = |reason: String| ContractError::NotAnInterface {
        type_name: desc.name.clone(),
        reason,
    };

    if desc.shape == TypeShape::Class {
        return Err(concrete("declared as a class".to_string()));
    }
    if let Some(field) = desc.fields.first() {
        return Err(concrete(format!("declares field '{field}'")));
    }
    if let Some(member) = desc.members.iter().find(|m| m.has_body) {
        return Err(concrete(format!("member '{}' has an implementation", member.name)));
    }
    if let Some(parent) = desc.extends.first() {
        return Err(ContractError::ExtendsOtherContract {
            type_name: desc.name.clone(),
            parent: parent.clone(),
        });
    }
    Ok(())
}

fn collect_members(desc: &TypeDescriptor) -> Result<IndexMap<String, PropertySlots<'_>>, ContractError> {
    let invalid = |member: &str, reason: &str| ContractError::InvalidMember {
        type_name: desc.name.clone(),
        member: member.to_string(),
        reason: reason.to_string(),
    };

    let mut slots: IndexMap<String, PropertySlots<'_>> = IndexMap::new();
    for member in &desc.members {
        let role = classify(member).map_err(|misfit| invalid(&member.name, misfit.describe()))?;
        match role {
            MemberRole::Accessor { property, kind } => {
                let slot = slots.entry(property).or_default();
                if slot.accessor.is_some() {
                    return Err(invalid(&member.name, "duplicate accessor for property"));
                }
                slot.accessor = Some((member.name.as_str(), kind));
            }
            MemberRole::Mutator { property, kind } => {
                let slot = slots.entry(property).or_default();
                if slot.mutator.is_some() {
                    return Err(invalid(&member.name, "duplicate mutator for property"));
                }
                slot.mutator = Some((member.name.as_str(), kind));
            }
        }
    }
    Ok(slots)
}
