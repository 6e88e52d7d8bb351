//! Testing utilities for the model workspace
//!
//! Sample contracts, an external task collaborator, and a shared call log.

#![allow(missing_docs)]

use model_rules::{ModelElement, Rule, RuleLocator};
use model_schema::{ModelType, TypeDescriptor, ValueType};
use parking_lot::Mutex;
use std::sync::Arc;

/// `Person { name }`, the smallest valid managed contract
pub fn person_descriptor() -> TypeDescriptor {
    TypeDescriptor::interface("Person").property("name", ValueType::Text)
}

pub fn person_type() -> ModelType {
    ModelType::managed(person_descriptor())
}

/// Opaque node type holding a [`TaskCollection`]
pub fn tasks_type() -> ModelType {
    ModelType::opaque("Tasks")
}

/// A task registered on a binary's task collection
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Task {
    pub name: String,
    pub description: String,
}

/// External collaborator: the task collection of a binary, created by a
/// plain creation rule and filled in by mutation rules
#[derive(Debug, Default, Clone, PartialEq, Eq)]
pub struct TaskCollection {
    tasks: Vec<Task>,
}

impl TaskCollection {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn create(&mut self, name: impl Into<String>, description: impl Into<String>) {
        self.tasks.push(Task {
            name: name.into(),
            description: description.into(),
        });
    }

    pub fn find(&self, name: &str) -> Option<&Task> {
        self.tasks.iter().find(|task| task.name == name)
    }

    pub fn names(&self) -> Vec<&str> {
        self.tasks.iter().map(|task| task.name.as_str()).collect()
    }

    pub fn len(&self) -> usize {
        self.tasks.len()
    }

    pub fn is_empty(&self) -> bool {
        self.tasks.is_empty()
    }
}

/// Creation rule producing an empty [`TaskCollection`] for [`tasks_type`]
pub fn tasks_creator(log: &CallLog) -> Rule {
    let log = log.clone();
    Rule::creator(RuleLocator::new("fixtures:tasks"), tasks_type(), vec![], move |_| {
        log.record("create Tasks");
        Ok(ModelElement::new(TaskCollection::new()))
    })
}

/// Ordered record of rule executions, shareable across rule bodies
#[derive(Debug, Clone, Default)]
pub struct CallLog {
    entries: Arc<Mutex<Vec<String>>>,
}

impl CallLog {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn record(&self, entry: impl Into<String>) {
        self.entries.lock().push(entry.into());
    }

    pub fn entries(&self) -> Vec<String> {
        self.entries.lock().clone()
    }

    /// Number of entries equal to `entry`
    pub fn count(&self, entry: &str) -> usize {
        self.entries.lock().iter().filter(|e| *e == entry).count()
    }

    pub fn clear(&self) {
        self.entries.lock().clear();
    }
}

/// Install a fmt subscriber filtered by `RUST_LOG`; later calls are no-ops
pub fn init_tracing() {
    let _ = tracing_subscriber::fmt()
        .with_env_filter(tracing_subscriber::EnvFilter::from_default_env())
        .with_test_writer()
        .try_init();
}
