//! Errors raised by managed instances

/// Call outside a managed instance's contract surface
#[derive(Debug, Clone, PartialEq, Eq, thiserror::Error)]
pub enum ManagedError {
    /// Property not declared by the contract
    #[error("{contract} has no property '{property}'")]
    UnknownProperty {
        /// Contract name
        contract: String,
        /// Requested property
        property: String,
    },

    /// Member not declared by the contract
    #[error("{contract} has no member '{member}'")]
    UnknownMember {
        /// Contract name
        contract: String,
        /// Requested member
        member: String,
    },

    /// Wrong number of arguments for a member
    #[error("{contract}.{member} takes {expected} argument(s), got {found}")]
    ArgumentMismatch {
        /// Contract name
        contract: String,
        /// Invoked member
        member: String,
        /// Declared arity
        expected: usize,
        /// Supplied arity
        found: usize,
    },
}
