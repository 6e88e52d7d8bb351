//! Managed Instances
//!
//! Synthesizes working objects for validated capability contracts. An
//! instance is a uniform property store with a thin dispatch layer over the
//! contract's accessor and mutator names, so no per-contract code is needed.
//!
//! # Example
//!
//! ```rust
//! use model_managed::synthesize;
//! use model_schema::{ContractValidator, TypeDescriptor, ValueType};
//!
//! let desc = TypeDescriptor::interface("Person").property("name", ValueType::Text);
//! let contract = ContractValidator::new().validate(&desc).unwrap();
//!
//! let mut person = synthesize(&contract);
//! person.set("name", "foo").unwrap();
//! assert_eq!(person.get("name").unwrap(), "foo");
//! ```

#![warn(missing_docs)]
#![warn(unreachable_pub)]

mod error;
mod instance;
mod synthesizer;

pub use error::ManagedError;
pub use instance::{ManagedInstance, PropertyValue};
pub use synthesizer::synthesize;

/// Version of this crate
pub const VERSION: &str = env!("CARGO_PKG_VERSION");
