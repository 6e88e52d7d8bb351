//! Model graph and realization scheduler
//!
//! The graph owns the rule registry and one node per known type. Realizing a
//! node resolves every declared input by realizing its node first (depth
//! first, left to right), runs the creation source, then the mutation rules
//! in registration order, and caches the element on the node.
//!
//! # Example
//!
//! ```rust
//! use model_graph::ModelGraph;
//! use model_rules::{rule_locator, Rule};
//! use model_schema::{ModelType, TypeDescriptor, ValueType};
//!
//! let person = ModelType::managed(
//!     TypeDescriptor::interface("Person").property("name", ValueType::Text),
//! );
//! let mut graph = ModelGraph::new();
//! graph
//!     .register(Rule::initializer(rule_locator!(), person.clone(), vec![], |el, _| {
//!         el.as_managed_mut().unwrap().set("name", "foo")?;
//!         Ok(())
//!     }))
//!     .unwrap();
//!
//! assert_eq!(graph.realize_managed(&person).unwrap().get("name").unwrap(), "foo");
//! ```

use crate::config::GraphConfig;
use crate::error::GraphError;
use crate::node::{ModelNode, NodeView, RealizationState};
use indexmap::IndexMap;
use model_managed::ManagedInstance;
use model_rules::{
    ModelElement, RegistrationError, Rule, RuleBody, RuleId, RuleInputs, RuleLocator,
    RuleRegistry,
};
use model_schema::{ModelType, ValidatedContract};
use smallvec::SmallVec;
use std::any::{type_name, Any};
use std::sync::Arc;
use tracing::{debug, debug_span, trace, warn};

/// Graph of model nodes realized on demand by registered rules
#[derive(Debug)]
pub struct ModelGraph {
    pub(crate) registry: RuleRegistry,
    pub(crate) nodes: IndexMap<ModelType, ModelNode>,
    pub(crate) config: GraphConfig,
    started: bool,
    finalized: bool,
}

impl Default for ModelGraph {
    fn default() -> Self {
        Self::new()
    }
}

impl ModelGraph {
    /// Empty graph with default configuration
    #[must_use]
    pub fn new() -> Self {
        Self::with_config(GraphConfig::default())
    }

    /// Empty graph with `config`
    #[must_use]
    pub fn with_config(config: GraphConfig) -> Self {
        Self::with_registry(RuleRegistry::new(), config)
    }

    /// Graph over an already populated registry
    ///
    /// A `max_realization_depth` of 0 is raised to 1.
    #[must_use]
    pub fn with_registry(registry: RuleRegistry, mut config: GraphConfig) -> Self {
        config.max_realization_depth = config.max_realization_depth.max(1);
        let mut graph = Self {
            registry,
            nodes: IndexMap::new(),
            config,
            started: false,
            finalized: false,
        };
        let known: Vec<ModelType> = graph
            .registry
            .subjects()
            .map(|(ty, _)| graph.registry.resolve(ty).unwrap_or(ty).clone())
            .collect();
        for ty in &known {
            graph.track(ty);
        }
        graph
    }

    /// Active configuration
    #[inline]
    #[must_use]
    pub fn config(&self) -> &GraphConfig {
        &self.config
    }

    /// Underlying rule registry
    #[inline]
    #[must_use]
    pub fn registry(&self) -> &RuleRegistry {
        &self.registry
    }

    /// Register a rule
    ///
    /// # Errors
    /// - [`RegistrationError::SubjectAlreadyRealized`] once the subject's
    ///   realization has started
    /// - [`RegistrationError::RegistryFrozen`] after the first realization
    ///   when `freeze_on_first_realize` is set
    /// - any error of [`RuleRegistry::register`]
    pub fn register(&mut self, rule: Rule) -> Result<RuleId, RegistrationError> {
        let started = self
            .nodes
            .get(rule.subject())
            .is_some_and(|node| node.state.is_started());
        if started {
            warn!(subject = %rule.subject(), rule = %rule.locator(), "registration after realization");
            return Err(RegistrationError::SubjectAlreadyRealized {
                subject: rule.subject().clone(),
                rule: rule.locator().clone(),
            });
        }

        let subject = rule.subject().clone();
        let inputs = rule.inputs().to_vec();
        let id = self.registry.register(rule)?;

        self.track(&subject);
        for input in &inputs {
            self.track(input);
        }
        self.finalized = false;
        Ok(id)
    }

    /// Realize `subject` and borrow its element
    ///
    /// Idempotent: a realized node returns its cached element without
    /// running any rule again.
    ///
    /// # Errors
    /// Any [`GraphError`] raised while realizing the subject or its inputs.
    /// The first failure marks every node on the failing chain as failed.
    pub fn realize(&mut self, subject: &ModelType) -> Result<&ModelElement, GraphError> {
        self.begin()?;
        let mut stack = Vec::new();
        let index = self.realize_node(subject, None, &mut stack)?;
        self.element_at(index)
    }

    /// Realize `subject` and borrow its element as `T`
    ///
    /// # Errors
    /// [`GraphError::TypeMismatch`] when the element is not a `T`, otherwise
    /// as [`realize`](Self::realize).
    pub fn realize_as<T: Any>(&mut self, subject: &ModelType) -> Result<&T, GraphError> {
        let element = self.realize(subject)?;
        element.downcast_ref::<T>().ok_or_else(|| GraphError::TypeMismatch {
            subject: subject.clone(),
            expected: type_name::<T>(),
            found: element.value_type(),
        })
    }

    /// Realize a managed subject and borrow its instance
    ///
    /// # Errors
    /// As [`realize_as`](Self::realize_as).
    pub fn realize_managed(&mut self, subject: &ModelType) -> Result<&ManagedInstance, GraphError> {
        self.realize_as::<ManagedInstance>(subject)
    }

    /// Realize every known subject in registration order
    ///
    /// A failure does not stop unrelated subjects. Follow-up failures of
    /// nodes already reported are not repeated.
    ///
    /// # Errors
    /// Every distinct failure, in the order encountered.
    pub fn realize_all(&mut self) -> Result<(), Vec<GraphError>> {
        let subjects: Vec<ModelType> = self.nodes.keys().cloned().collect();
        let mut errors = Vec::new();
        for subject in &subjects {
            match self.realize(subject) {
                Ok(_) | Err(GraphError::PreviouslyFailed { .. }) => {}
                Err(err) => errors.push(err),
            }
        }
        if errors.is_empty() {
            Ok(())
        } else {
            Err(errors)
        }
    }

    /// State of the node for `subject`
    #[must_use]
    pub fn state(&self, subject: &ModelType) -> Option<&RealizationState> {
        self.nodes.get(subject).map(|node| &node.state)
    }

    /// Read-only view of the node for `subject`
    #[must_use]
    pub fn node(&self, subject: &ModelType) -> Option<NodeView<'_>> {
        let node = self.nodes.get(subject)?;
        Some(NodeView {
            subject: &node.subject,
            creator: self.registry.creator(subject).map(|rule| rule.locator()),
            mutators: self
                .registry
                .mutators(subject)
                .map(|rule| rule.locator())
                .collect(),
            state: &node.state,
        })
    }

    /// Known types in first-seen order
    pub fn subjects(&self) -> impl Iterator<Item = &ModelType> {
        self.nodes.values().map(|node| &node.subject)
    }

    /// Number of nodes
    #[inline]
    #[must_use]
    pub fn len(&self) -> usize {
        self.nodes.len()
    }

    /// Whether the graph has no nodes
    #[inline]
    #[must_use]
    pub fn is_empty(&self) -> bool {
        self.nodes.is_empty()
    }

    pub(crate) fn mark_finalized(&mut self) {
        self.finalized = true;
    }

    /// Registered form of `ty`, carrying its contract when any rule declared it managed
    pub(crate) fn resolve(&self, ty: &ModelType) -> ModelType {
        match self.nodes.get(ty) {
            Some(node) if node.subject.is_managed() => node.subject.clone(),
            _ => self
                .registry
                .resolve(ty)
                .filter(|known| known.is_managed())
                .unwrap_or(ty)
                .clone(),
        }
    }

    /// Validated contract of a managed subject
    pub(crate) fn contract_for(
        &self,
        subject: &ModelType,
    ) -> Result<Arc<ValidatedContract>, GraphError> {
        let descriptor = subject.contract().ok_or_else(|| {
            GraphError::Internal(format!("{subject} has no contract to synthesize"))
        })?;
        self.registry
            .validator()
            .validate(descriptor)
            .map_err(|source| GraphError::InvalidContract {
                subject: subject.clone(),
                source,
            })
    }

    fn track(&mut self, ty: &ModelType) -> usize {
        let entry = self.nodes.entry(ty.clone());
        let index = entry.index();
        let node = entry.or_insert_with(|| ModelNode::new(ty.clone()));
        if ty.is_managed() && !node.subject.is_managed() {
            node.subject = ty.clone();
        }
        index
    }

    fn begin(&mut self) -> Result<(), GraphError> {
        if !self.started {
            self.started = true;
            if self.config.freeze_on_first_realize {
                self.registry.freeze();
            }
        }
        if self.config.finalize_before_realize && !self.finalized {
            self.finalize()?;
        }
        Ok(())
    }

    fn element_at(&self, index: usize) -> Result<&ModelElement, GraphError> {
        self.nodes
            .get_index(index)
            .and_then(|(_, node)| node.state.element())
            .ok_or_else(|| GraphError::Internal(format!("node #{index} is not realized")))
    }

    /// `via` is the rule that declared `requested` as an input; absent for
    /// the subject the caller asked for.
    fn realize_node(
        &mut self,
        requested: &ModelType,
        via: Option<&RuleLocator>,
        stack: &mut Vec<ModelType>,
    ) -> Result<usize, GraphError> {
        let subject = self.resolve(requested);
        let index = self.track(&subject);

        match &self.nodes[index].state {
            RealizationState::Realized(_) => return Ok(index),
            RealizationState::Failed => {
                return Err(GraphError::PreviouslyFailed { subject });
            }
            RealizationState::Realizing => {
                let start = stack.iter().position(|ty| *ty == subject).unwrap_or(0);
                let mut chain = stack[start..].to_vec();
                chain.push(subject);
                return Err(GraphError::CyclicDependency {
                    chain,
                    rule: via.cloned(),
                });
            }
            RealizationState::Unrealized => {}
        }

        if stack.len() >= self.config.max_realization_depth {
            return Err(GraphError::DepthExceeded {
                subject,
                limit: self.config.max_realization_depth,
            });
        }

        let span = debug_span!("realize", subject = %subject);
        let _entered = span.enter();
        debug!(depth = stack.len(), "realization started");

        self.nodes[index].state = RealizationState::Realizing;
        stack.push(subject.clone());
        let built = self.build(&subject, via, stack);
        stack.pop();

        match built {
            Ok(element) => {
                self.nodes[index].state = RealizationState::Realized(element);
                debug!("realization finished");
                Ok(index)
            }
            Err(err) => {
                self.nodes[index].state = RealizationState::Failed;
                warn!(error = %err, "realization failed");
                Err(err)
            }
        }
    }

    fn build(
        &mut self,
        subject: &ModelType,
        via: Option<&RuleLocator>,
        stack: &mut Vec<ModelType>,
    ) -> Result<ModelElement, GraphError> {
        let mut element = match self.registry.creator(subject).cloned() {
            Some(rule) => self.create(subject, &rule, stack)?,
            None if subject.is_managed() => self.synthesize(subject)?,
            None => {
                return Err(GraphError::NoCreatorForSubject {
                    subject: subject.clone(),
                    required_by: stack.iter().rev().nth(1).cloned(),
                    rule: via.cloned(),
                });
            }
        };

        let mutators: Vec<Arc<Rule>> = self.registry.mutators(subject).cloned().collect();
        for rule in &mutators {
            let RuleBody::Mutate(body) = rule.body() else {
                return Err(GraphError::Internal(format!(
                    "rule at {} is listed as a mutator of {subject}",
                    rule.locator()
                )));
            };
            let resolved = self.realize_inputs(rule, stack)?;
            let inputs = self.inputs_for(rule, &resolved)?;
            trace!(rule = %rule.locator(), "running mutation rule");
            body(&mut element, &inputs).map_err(|source| rule_failed(subject, rule, source))?;
        }

        Ok(element)
    }

    fn create(
        &mut self,
        subject: &ModelType,
        rule: &Arc<Rule>,
        stack: &mut Vec<ModelType>,
    ) -> Result<ModelElement, GraphError> {
        match rule.body() {
            RuleBody::Produce(body) => {
                let resolved = self.realize_inputs(rule, stack)?;
                let inputs = self.inputs_for(rule, &resolved)?;
                trace!(rule = %rule.locator(), "running creation rule");
                body(&inputs).map_err(|source| rule_failed(subject, rule, source))
            }
            RuleBody::Initialize(body) => {
                let mut element = self.synthesize(subject)?;
                let resolved = self.realize_inputs(rule, stack)?;
                let inputs = self.inputs_for(rule, &resolved)?;
                trace!(rule = %rule.locator(), "running initialization rule");
                body(&mut element, &inputs).map_err(|source| rule_failed(subject, rule, source))?;
                Ok(element)
            }
            RuleBody::Mutate(_) => Err(GraphError::Internal(format!(
                "rule at {} is registered as the creator of {subject}",
                rule.locator()
            ))),
        }
    }

    fn synthesize(&self, subject: &ModelType) -> Result<ModelElement, GraphError> {
        let contract = self.contract_for(subject)?;
        debug!(contract = %contract.name(), "synthesizing managed instance");
        Ok(ModelElement::managed(model_managed::synthesize(&contract)))
    }

    fn realize_inputs(
        &mut self,
        rule: &Rule,
        stack: &mut Vec<ModelType>,
    ) -> Result<SmallVec<[usize; 4]>, GraphError> {
        rule.inputs()
            .iter()
            .map(|input| self.realize_node(input, Some(rule.locator()), stack))
            .collect()
    }

    fn inputs_for<'a>(
        &'a self,
        rule: &'a Rule,
        resolved: &[usize],
    ) -> Result<RuleInputs<'a>, GraphError> {
        let elements = resolved
            .iter()
            .map(|&index| self.element_at(index))
            .collect::<Result<SmallVec<[&ModelElement; 4]>, _>>()?;
        Ok(RuleInputs::new(rule.inputs(), elements))
    }
}

fn rule_failed(subject: &ModelType, rule: &Rule, source: anyhow::Error) -> GraphError {
    GraphError::RuleFailed {
        subject: subject.clone(),
        rule: rule.locator().clone(),
        source,
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use model_schema::{ContractValidator, TypeDescriptor, ValueType};

    fn graph() -> ModelGraph {
        let registry = RuleRegistry::with_validator(Arc::new(ContractValidator::new()));
        ModelGraph::with_registry(registry, GraphConfig::default())
    }

    fn counter_rule(subject: &ModelType, at: &str) -> Rule {
        Rule::creator(RuleLocator::new(at), subject.clone(), vec![], |_| {
            Ok(ModelElement::new(0u32))
        })
    }

    #[test]
    fn managed_type_without_creator_is_synthesized() {
        let person = ModelType::managed(
            TypeDescriptor::interface("Person").property("name", ValueType::Text),
        );
        let mut graph = graph();
        let instance = graph.realize_managed(&person).unwrap();
        assert_eq!(instance.get("name").unwrap(), "");
    }

    #[test]
    fn opaque_type_without_creator_fails() {
        let mut graph = graph();
        let err = graph.realize(&ModelType::opaque("Tasks")).unwrap_err();
        assert!(matches!(
            err,
            GraphError::NoCreatorForSubject { required_by: None, .. }
        ));
        assert!(matches!(
            graph.state(&ModelType::opaque("Tasks")),
            Some(RealizationState::Failed)
        ));
    }

    #[test]
    fn wrong_type_request_is_a_mismatch() {
        let count = ModelType::opaque("Count");
        let mut graph = graph();
        graph.register(counter_rule(&count, "c:1")).unwrap();

        let err = graph.realize_as::<String>(&count).unwrap_err();
        assert!(matches!(err, GraphError::TypeMismatch { found: "u32", .. }));
        assert_eq!(*graph.realize_as::<u32>(&count).unwrap(), 0);
    }

    #[test]
    fn registration_after_realization_is_rejected() {
        let count = ModelType::opaque("Count");
        let mut graph = graph();
        graph.register(counter_rule(&count, "c:1")).unwrap();
        graph.realize(&count).unwrap();

        let late = Rule::mutator(RuleLocator::new("c:2"), count.clone(), vec![], |_, _| Ok(()));
        assert!(matches!(
            graph.register(late),
            Err(RegistrationError::SubjectAlreadyRealized { .. })
        ));

        graph.register(counter_rule(&ModelType::opaque("Other"), "o:1")).unwrap();
    }

    #[test]
    fn freeze_on_first_realize_rejects_everything() {
        let count = ModelType::opaque("Count");
        let registry = RuleRegistry::with_validator(Arc::new(ContractValidator::new()));
        let config = GraphConfig::new().with_freeze_on_first_realize(true);
        let mut graph = ModelGraph::with_registry(registry, config);
        graph.register(counter_rule(&count, "c:1")).unwrap();
        graph.realize(&count).unwrap();

        assert!(matches!(
            graph.register(counter_rule(&ModelType::opaque("Other"), "o:1")),
            Err(RegistrationError::RegistryFrozen { .. })
        ));
    }

    #[test]
    fn node_view_lists_rules() {
        let count = ModelType::opaque("Count");
        let mut graph = graph();
        graph.register(counter_rule(&count, "c:1")).unwrap();
        graph
            .register(Rule::mutator(RuleLocator::new("c:2"), count.clone(), vec![], |_, _| Ok(())))
            .unwrap();

        let view = graph.node(&count).unwrap();
        assert_eq!(view.creator.map(RuleLocator::as_str), Some("c:1"));
        assert_eq!(view.mutators.len(), 1);
        assert!(!view.state.is_started());
        assert!(graph.node(&ModelType::opaque("Nope")).is_none());
    }

    #[test]
    fn depth_limit_stops_long_chains() {
        let registry = RuleRegistry::with_validator(Arc::new(ContractValidator::new()));
        let mut graph =
            ModelGraph::with_registry(registry, GraphConfig::new().with_max_realization_depth(2));
        let a = ModelType::opaque("A");
        let b = ModelType::opaque("B");
        let c = ModelType::opaque("C");
        for (subject, input) in [(&a, &b), (&b, &c)] {
            graph
                .register(Rule::creator(
                    RuleLocator::new(subject.name()),
                    subject.clone(),
                    vec![input.clone()],
                    |_| Ok(ModelElement::new(())),
                ))
                .unwrap();
        }
        graph.register(counter_rule(&c, "C")).unwrap();

        let err = graph.realize(&a).unwrap_err();
        assert!(matches!(err, GraphError::DepthExceeded { limit: 2, .. }));
    }

    #[test]
    fn zero_depth_still_realizes_leaf_nodes() {
        let count = ModelType::opaque("Count");
        let registry = RuleRegistry::with_validator(Arc::new(ContractValidator::new()));
        let config = GraphConfig {
            max_realization_depth: 0,
            ..GraphConfig::default()
        };
        let mut graph = ModelGraph::with_registry(registry, config);
        graph.register(counter_rule(&count, "c:1")).unwrap();

        assert_eq!(graph.config().max_realization_depth, 1);
        assert_eq!(*graph.realize_as::<u32>(&count).unwrap(), 0);
    }
}
