//! Structured diagnostics for the surrounding tool's error reporter

use crate::config::ConfigError;
use crate::error::GraphError;
use model_managed::ManagedError;
use model_rules::{RegistrationError, RuleLocator};
use model_schema::{ContractError, ContractErrorKind};
use std::fmt;

/// Kind of a reported failure
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum ErrorKind {
    /// Managed type is not an interface
    NotAnInterface,
    /// Managed type extends another contract
    ExtendsOtherContract,
    /// Member is not an accessor or mutator
    InvalidMember,
    /// Property lacks its accessor or mutator
    UnpairedProperty,
    /// Property kind is not supported
    UnsupportedPropertyType,
    /// Second creation rule for a subject
    DuplicateCreationRule,
    /// Same type name declared with two different contracts
    ConflictingContract,
    /// No creation source for a subject
    NoCreatorForSubject,
    /// Rule registered for a subject already realized
    SubjectAlreadyRealized,
    /// Rule registered after the registry was frozen
    RegistryFrozen,
    /// Rule inputs form a cycle
    CyclicDependency,
    /// A rule body failed
    RuleFailed,
    /// Node failed in an earlier realization
    PreviouslyFailed,
    /// Element is not of the requested type
    TypeMismatch,
    /// Realization exceeded the depth limit
    DepthExceeded,
    /// Property outside a contract
    UnknownProperty,
    /// Member outside a contract
    UnknownMember,
    /// Wrong number of arguments for a member
    ArgumentMismatch,
    /// Configuration could not be loaded
    Config,
    /// Broken engine invariant
    Internal,
}

impl From<ContractErrorKind> for ErrorKind {
    fn from(kind: ContractErrorKind) -> Self {
        match kind {
            ContractErrorKind::NotAnInterface => Self::NotAnInterface,
            ContractErrorKind::ExtendsOtherContract => Self::ExtendsOtherContract,
            ContractErrorKind::InvalidMember => Self::InvalidMember,
            ContractErrorKind::UnpairedProperty => Self::UnpairedProperty,
            ContractErrorKind::UnsupportedPropertyType => Self::UnsupportedPropertyType,
        }
    }
}

/// Failure report: kind, offending type and member, and rule location
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Diagnostic {
    /// What went wrong
    pub kind: ErrorKind,
    /// Offending type
    pub type_name: Option<String>,
    /// Offending member, where applicable
    pub member: Option<String>,
    /// Location of the rule involved
    pub location: Option<RuleLocator>,
    /// Full error message, including causes
    pub message: String,
}

impl Diagnostic {
    fn new(kind: ErrorKind, message: String) -> Self {
        Self {
            kind,
            type_name: None,
            member: None,
            location: None,
            message,
        }
    }

    fn with_type(mut self, type_name: impl fmt::Display) -> Self {
        self.type_name = Some(type_name.to_string());
        self
    }

    fn with_member(mut self, member: Option<&str>) -> Self {
        self.member = member.map(str::to_string);
        self
    }

    fn at(mut self, location: &RuleLocator) -> Self {
        self.location = Some(location.clone());
        self
    }
}

impl fmt::Display for Diagnostic {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "[{:?}] {}", self.kind, self.message)?;
        if let Some(location) = &self.location {
            write!(f, " at {location}")?;
        }
        Ok(())
    }
}

fn chained(err: &dyn std::error::Error) -> String {
    let mut message = err.to_string();
    let mut source = err.source();
    while let Some(cause) = source {
        message.push_str(": ");
        message.push_str(&cause.to_string());
        source = cause.source();
    }
    message
}

impl From<&ContractError> for Diagnostic {
    fn from(err: &ContractError) -> Self {
        Self::new(err.kind().into(), err.to_string())
            .with_type(err.type_name())
            .with_member(err.member())
    }
}

impl From<&ManagedError> for Diagnostic {
    fn from(err: &ManagedError) -> Self {
        let message = err.to_string();
        match err {
            ManagedError::UnknownProperty { contract, property } => {
                Self::new(ErrorKind::UnknownProperty, message)
                    .with_type(contract)
                    .with_member(Some(property.as_str()))
            }
            ManagedError::UnknownMember { contract, member } => {
                Self::new(ErrorKind::UnknownMember, message)
                    .with_type(contract)
                    .with_member(Some(member.as_str()))
            }
            ManagedError::ArgumentMismatch {
                contract, member, ..
            } => Self::new(ErrorKind::ArgumentMismatch, message)
                .with_type(contract)
                .with_member(Some(member.as_str())),
        }
    }
}

impl From<&RegistrationError> for Diagnostic {
    fn from(err: &RegistrationError) -> Self {
        let message = chained(err);
        let diagnostic = match err {
            RegistrationError::DuplicateCreationRule { subject, .. } => {
                Self::new(ErrorKind::DuplicateCreationRule, message).with_type(subject)
            }
            RegistrationError::InvalidContract { source, .. } => Self {
                message,
                ..Self::from(source)
            },
            RegistrationError::ConflictingContract { subject, .. } => {
                Self::new(ErrorKind::ConflictingContract, message).with_type(subject)
            }
            RegistrationError::NoCreatorForSubject { subject, .. } => {
                Self::new(ErrorKind::NoCreatorForSubject, message).with_type(subject)
            }
            RegistrationError::SubjectAlreadyRealized { subject, .. } => {
                Self::new(ErrorKind::SubjectAlreadyRealized, message).with_type(subject)
            }
            RegistrationError::RegistryFrozen { .. } => {
                Self::new(ErrorKind::RegistryFrozen, message)
            }
        };
        diagnostic.at(err.rule())
    }
}

impl From<&GraphError> for Diagnostic {
    fn from(err: &GraphError) -> Self {
        let message = chained(err);
        let kind = match err {
            GraphError::Registration(inner) => return Self::from(inner),
            GraphError::InvalidContract { source, .. } => {
                return Self {
                    message,
                    ..Self::from(source)
                };
            }
            GraphError::NoCreatorForSubject { .. } => ErrorKind::NoCreatorForSubject,
            GraphError::CyclicDependency { .. } => ErrorKind::CyclicDependency,
            GraphError::RuleFailed { .. } => ErrorKind::RuleFailed,
            GraphError::PreviouslyFailed { .. } => ErrorKind::PreviouslyFailed,
            GraphError::TypeMismatch { .. } => ErrorKind::TypeMismatch,
            GraphError::DepthExceeded { .. } => ErrorKind::DepthExceeded,
            GraphError::Internal(_) => ErrorKind::Internal,
        };

        let mut diagnostic = Self::new(kind, message);
        if let Some(subject) = err.subject() {
            diagnostic = diagnostic.with_type(subject);
        }
        if let Some(rule) = err.rule() {
            diagnostic = diagnostic.at(rule);
        }
        diagnostic
    }
}

impl From<&ConfigError> for Diagnostic {
    fn from(err: &ConfigError) -> Self {
        Self::new(ErrorKind::Config, err.to_string())
    }
}
