//! Registration errors

use crate::rule::RuleLocator;
use model_schema::{ContractError, ModelType, TypeFingerprint};
use thiserror::Error;

/// Why a rule was not added to the registry
#[derive(Debug, Error)]
pub enum RegistrationError {
    /// A second creation rule for a subject that already has one
    #[error("{subject} already has a creation rule at {existing}; rejected the one at {rejected}")]
    DuplicateCreationRule {
        /// Subject type
        subject: ModelType,
        /// Locator of the rule already registered
        existing: RuleLocator,
        /// Locator of the rejected rule
        rejected: RuleLocator,
    },

    /// A managed subject or input failed contract validation
    #[error("rule at {rule} refers to {subject}, which is not a valid contract")]
    InvalidContract {
        /// Offending rule
        rule: RuleLocator,
        /// Managed type that failed validation
        subject: ModelType,
        /// Validation failure
        #[source]
        source: ContractError,
    },

    /// A managed type declared with a different contract than the one
    /// already registered under its name
    #[error(
        "rule at {rule} declares {subject} as contract {}, but {subject} is already registered as contract {}",
        .declared.short(),
        .registered.short()
    )]
    ConflictingContract {
        /// Managed type as the rejected rule declared it
        subject: ModelType,
        /// Offending rule
        rule: RuleLocator,
        /// Fingerprint of the contract already registered
        registered: TypeFingerprint,
        /// Fingerprint of the contract the rule declared
        declared: TypeFingerprint,
    },

    /// An initializer declared against a type the engine cannot synthesize
    #[error("rule at {rule} initializes {subject}, but {subject} is not a managed type")]
    NoCreatorForSubject {
        /// Opaque subject type
        subject: ModelType,
        /// Offending rule
        rule: RuleLocator,
    },

    /// A rule registered after its subject was realized
    #[error("{subject} has already been realized; rule at {rule} arrives too late")]
    SubjectAlreadyRealized {
        /// Realized subject
        subject: ModelType,
        /// Offending rule
        rule: RuleLocator,
    },

    /// A rule registered after the graph was frozen
    #[error("registry is frozen; rule at {rule} rejected")]
    RegistryFrozen {
        /// Offending rule
        rule: RuleLocator,
    },
}

impl RegistrationError {
    /// Locator of the rule that was rejected
    #[must_use]
    pub fn rule(&self) -> &RuleLocator {
        match self {
            Self::DuplicateCreationRule { rejected, .. } => rejected,
            Self::InvalidContract { rule, .. }
            | Self::ConflictingContract { rule, .. }
            | Self::NoCreatorForSubject { rule, .. }
            | Self::SubjectAlreadyRealized { rule, .. }
            | Self::RegistryFrozen { rule } => rule,
        }
    }
}
