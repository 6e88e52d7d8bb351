//! Model Rules
//!
//! Creation and mutation rules over model types, and the registry that
//! collects them.
//!
//! # Core Concepts
//!
//! - [`Rule`]: subject type, role, declared inputs and an executable body
//! - [`RuleRegistry`]: append-only store, at most one creator per subject
//! - [`ModelElement`]: type-erased value a rule produces or mutates
//! - [`RuleInputs`]: resolved inputs handed to a body in declaration order
//!
//! # Example
//!
//! ```rust
//! use model_rules::{rule_locator, ModelElement, Rule, RuleRegistry};
//! use model_schema::ModelType;
//!
//! let mut registry = RuleRegistry::new();
//! let tasks = ModelType::opaque("Tasks");
//! registry
//!     .register(Rule::creator(rule_locator!(), tasks.clone(), vec![], |_| {
//!         Ok(ModelElement::new(Vec::<String>::new()))
//!     }))
//!     .unwrap();
//! assert!(registry.creator(&tasks).is_some());
//! ```

#![warn(missing_docs)]
#![warn(unreachable_pub)]

mod element;
mod error;
mod registry;
mod rule;

pub use element::ModelElement;
pub use error::RegistrationError;
pub use registry::{RuleRegistry, SubjectRules};
pub use rule::{ApplyFn, ProduceFn, Rule, RuleBody, RuleId, RuleInputs, RuleLocator, RuleRole};

/// Version of this crate
pub const VERSION: &str = env!("CARGO_PKG_VERSION");
