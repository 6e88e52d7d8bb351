//! Managed instance synthesis

use crate::instance::ManagedInstance;
use model_schema::ValidatedContract;
use std::sync::Arc;

/// Produce a fresh instance of `contract`
///
/// Every property starts at its empty default. Each call allocates new
/// storage, so instances never observe each other's mutations.
#[must_use]
pub fn synthesize(contract: &Arc<ValidatedContract>) -> ManagedInstance {
    tracing::trace!(
        contract = %contract.name(),
        properties = contract.properties().len(),
        "synthesizing managed instance"
    );
    ManagedInstance::new(Arc::clone(contract))
}
