//! Model nodes and their realization states

use model_rules::{ModelElement, RuleLocator};
use model_schema::ModelType;
use std::fmt;

/// Lifecycle of a model node
///
/// `Unrealized -> Realizing -> Realized` on success; a failure moves a
/// `Realizing` node to the terminal `Failed` state.
#[derive(Debug, Default)]
pub enum RealizationState {
    /// No rule has run yet
    #[default]
    Unrealized,
    /// Rules are executing; re-entry means a cycle
    Realizing,
    /// Realized element, owned by the node
    Realized(ModelElement),
    /// Realization failed; the node is unusable
    Failed,
}

impl RealizationState {
    /// Realized element, if any
    #[inline]
    #[must_use]
    pub fn element(&self) -> Option<&ModelElement> {
        match self {
            Self::Realized(element) => Some(element),
            _ => None,
        }
    }

    /// Whether the node holds a realized element
    #[inline]
    #[must_use]
    pub fn is_realized(&self) -> bool {
        matches!(self, Self::Realized(_))
    }

    /// Whether realization has begun, finished or failed
    #[inline]
    #[must_use]
    pub fn is_started(&self) -> bool {
        !matches!(self, Self::Unrealized)
    }

    /// Short state name
    #[must_use]
    pub fn label(&self) -> &'static str {
        match self {
            Self::Unrealized => "unrealized",
            Self::Realizing => "realizing",
            Self::Realized(_) => "realized",
            Self::Failed => "failed",
        }
    }
}

impl fmt::Display for RealizationState {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.label())
    }
}

/// Per-type record held by the graph
#[derive(Debug)]
pub(crate) struct ModelNode {
    pub(crate) subject: ModelType,
    pub(crate) state: RealizationState,
}

impl ModelNode {
    pub(crate) fn new(subject: ModelType) -> Self {
        Self {
            subject,
            state: RealizationState::Unrealized,
        }
    }
}

/// Read-only view of one node
#[derive(Debug)]
pub struct NodeView<'a> {
    /// Subject type
    pub subject: &'a ModelType,
    /// Locator of the creation rule
    pub creator: Option<&'a RuleLocator>,
    /// Locators of the mutation rules, in registration order
    pub mutators: Vec<&'a RuleLocator>,
    /// Current state
    pub state: &'a RealizationState,
}
