//! Graph errors

use model_rules::{RegistrationError, RuleLocator};
use model_schema::{ContractError, ModelType};
use thiserror::Error;

/// Failure to register with, finalize or realize a model graph
#[derive(Debug, Error)]
pub enum GraphError {
    /// Rule rejected at registration
    #[error(transparent)]
    Registration(#[from] RegistrationError),

    /// A managed type requested for realization failed validation
    #[error("{subject} is not a valid managed type")]
    InvalidContract {
        /// Rejected type
        subject: ModelType,
        /// Validation failure
        #[source]
        source: ContractError,
    },

    /// Neither a creation rule nor synthesis can produce the subject
    #[error("no creation rule for {subject}{}", required_by_suffix(.required_by.as_ref()))]
    NoCreatorForSubject {
        /// Type without a creation source
        subject: ModelType,
        /// Subject whose rule needed it, if any
        required_by: Option<ModelType>,
        /// Rule that declared the missing type as an input, if any
        rule: Option<RuleLocator>,
    },

    /// Realization re-entered a node that is still being realized
    #[error("cyclic dependency: {}", render_chain(.chain))]
    CyclicDependency {
        /// Types along the cycle; the first and last entries are the same type
        chain: Vec<ModelType>,
        /// Rule whose input closes the cycle
        rule: Option<RuleLocator>,
    },

    /// A rule body returned an error
    #[error("rule at {rule} failed while realizing {subject}")]
    RuleFailed {
        /// Subject being realized
        subject: ModelType,
        /// Rule that failed
        rule: RuleLocator,
        /// Error returned by the body
        #[source]
        source: anyhow::Error,
    },

    /// The node failed in an earlier realization
    #[error("{subject} failed to realize earlier")]
    PreviouslyFailed {
        /// Failed subject
        subject: ModelType,
    },

    /// The realized element is not of the requested type
    #[error("{subject} holds {found}, not {expected}")]
    TypeMismatch {
        /// Realized subject
        subject: ModelType,
        /// Requested Rust type
        expected: &'static str,
        /// Stored Rust type
        found: &'static str,
    },

    /// Nested realization went deeper than the configured limit
    #[error("realizing {subject} exceeds the maximum depth of {limit}")]
    DepthExceeded {
        /// Subject at which the limit was hit
        subject: ModelType,
        /// Configured limit
        limit: usize,
    },

    /// Broken engine invariant
    #[error("internal error: {0}")]
    Internal(String),
}

impl GraphError {
    /// Subject type the error is about, if it names one
    #[must_use]
    pub fn subject(&self) -> Option<&ModelType> {
        match self {
            Self::Registration(
                RegistrationError::DuplicateCreationRule { subject, .. }
                | RegistrationError::InvalidContract { subject, .. }
                | RegistrationError::ConflictingContract { subject, .. }
                | RegistrationError::NoCreatorForSubject { subject, .. }
                | RegistrationError::SubjectAlreadyRealized { subject, .. },
            )
            | Self::InvalidContract { subject, .. }
            | Self::NoCreatorForSubject { subject, .. }
            | Self::RuleFailed { subject, .. }
            | Self::PreviouslyFailed { subject }
            | Self::TypeMismatch { subject, .. }
            | Self::DepthExceeded { subject, .. } => Some(subject),
            Self::CyclicDependency { chain, .. } => chain.first(),
            Self::Registration(RegistrationError::RegistryFrozen { .. }) | Self::Internal(_) => {
                None
            }
        }
    }

    /// Location of the rule involved, if the error names one
    #[must_use]
    pub fn rule(&self) -> Option<&RuleLocator> {
        match self {
            Self::Registration(inner) => Some(inner.rule()),
            Self::RuleFailed { rule, .. } => Some(rule),
            Self::NoCreatorForSubject { rule, .. } | Self::CyclicDependency { rule, .. } => {
                rule.as_ref()
            }
            Self::InvalidContract { .. }
            | Self::PreviouslyFailed { .. }
            | Self::TypeMismatch { .. }
            | Self::DepthExceeded { .. }
            | Self::Internal(_) => None,
        }
    }
}

fn render_chain(chain: &[ModelType]) -> String {
    chain
        .iter()
        .map(ModelType::name)
        .collect::<Vec<_>>()
        .join(" -> ")
}

fn required_by_suffix(required_by: Option<&ModelType>) -> String {
    required_by.map_or_else(String::new, |ty| format!(" (required by {ty})"))
}
