//! Model Graph
//!
//! Realizes model elements on demand from registered creation and mutation
//! rules, synthesizing managed instances for contracts nobody creates.
//!
//! # Core Concepts
//!
//! - [`ModelGraph`]: one node per type; depth-first, idempotent realization
//! - [`RealizationState`]: `Unrealized -> Realizing -> Realized | Failed`
//! - [`PlanStep`]: dry-run view of the rules a realization would execute
//! - [`Diagnostic`]: structured report for any failure of the engine
//! - [`GraphConfig`]: depth limit and freeze/finalize policies
//!
//! # Example
//!
//! ```rust
//! use model_graph::prelude::*;
//!
//! let person = ModelType::managed(
//!     TypeDescriptor::interface("Person").property("name", ValueType::Text),
//! );
//! let greeting = ModelType::opaque("Greeting");
//!
//! let mut graph = ModelGraph::new();
//! graph
//!     .register(Rule::initializer(rule_locator!(), person.clone(), vec![], |el, _| {
//!         el.as_managed_mut().unwrap().set("name", "foo")?;
//!         Ok(())
//!     }))
//!     .unwrap();
//! graph
//!     .register(Rule::creator(rule_locator!(), greeting.clone(), vec![person], |inputs| {
//!         let name = inputs.managed(0)?.get("name")?;
//!         Ok(ModelElement::new(format!("hello {name}")))
//!     }))
//!     .unwrap();
//!
//! assert_eq!(graph.realize_as::<String>(&greeting).unwrap(), "hello foo");
//! ```

#![warn(missing_docs)]
#![warn(unreachable_pub)]

mod config;
mod diagnostic;
mod error;
mod graph;
mod node;
mod order;
mod plan;

pub use config::{ConfigError, GraphConfig};
pub use diagnostic::{Diagnostic, ErrorKind};
pub use error::GraphError;
pub use graph::ModelGraph;
pub use node::{NodeView, RealizationState};
pub use plan::{PlanStep, StepKind};

/// Commonly used types across the model crates
pub mod prelude {
    pub use crate::{
        Diagnostic, GraphConfig, GraphError, ModelGraph, PlanStep, RealizationState, StepKind,
    };
    pub use model_managed::{ManagedInstance, PropertyValue};
    pub use model_rules::{rule_locator, ModelElement, Rule, RuleInputs, RuleLocator, RuleRegistry};
    pub use model_schema::{ModelType, TypeDescriptor, ValueType};
}

/// Version of this crate
pub const VERSION: &str = env!("CARGO_PKG_VERSION");
