//! Model Schema
//!
//! Type descriptors for model elements and the validator that decides
//! whether a descriptor is an acceptable capability contract.
//!
//! # Core Concepts
//!
//! - [`TypeDescriptor`]: structural description of a candidate type
//! - [`ModelType`]: stable identifier keying model graph nodes
//! - [`ContractValidator`]: memoizing, fail-fast contract validation
//! - [`ValidatedContract`]: proof that a contract was accepted
//!
//! # Example
//!
//! ```rust
//! use model_schema::{ContractValidator, TypeDescriptor, ValueType};
//!
//! let person = TypeDescriptor::interface("Person").property("name", ValueType::Text);
//! let contract = ContractValidator::new().validate(&person).unwrap();
//! assert_eq!(contract.properties()[0].name, "name");
//! ```

#![warn(missing_docs)]
#![warn(unreachable_pub)]

mod descriptor;
mod error;
mod model_type;
pub mod property;
mod validator;

pub use descriptor::{MemberDescriptor, TypeDescriptor, TypeFingerprint, TypeShape, ValueType};
pub use error::{ContractError, ContractErrorKind};
pub use model_type::ModelType;
pub use property::PropertySchema;
pub use validator::{validate, ContractValidator, ValidatedContract, Verdict};

/// Version of this crate
pub const VERSION: &str = env!("CARGO_PKG_VERSION");
