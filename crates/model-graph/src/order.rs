//! Static analysis of the rule set: creation sources, cycles, ordering

use crate::error::GraphError;
use crate::graph::ModelGraph;
use model_rules::RuleLocator;
use model_schema::ModelType;
use petgraph::algo::{tarjan_scc, toposort};
use petgraph::graphmap::DiGraphMap;
use petgraph::Direction;
use tracing::debug;

/// Dependency graph over node indices; an edge `a -> b` means a rule for
/// `b` declares `a` as an input.
type DependencyGraph = DiGraphMap<usize, ()>;

impl ModelGraph {
    /// Check the registered rules without running any of them
    ///
    /// Every subject and every declared input must have a creation source
    /// (a creation rule, or a managed contract to synthesize) and no type
    /// may depend on itself through the declared inputs.
    ///
    /// # Errors
    /// - [`GraphError::NoCreatorForSubject`] naming the first subject whose
    ///   rule requires the missing type
    /// - [`GraphError::InvalidContract`] for a managed type that fails validation
    /// - [`GraphError::CyclicDependency`] naming the types on one cycle
    pub fn finalize(&mut self) -> Result<(), GraphError> {
        self.check_creation_sources()?;

        let graph = self.dependency_graph();
        if let Err(cycle) = toposort(&graph, None) {
            let chain = self.cycle_through(&graph, cycle.node_id())?;
            let rule = self.closing_rule(&chain);
            return Err(GraphError::CyclicDependency { chain, rule });
        }

        debug!(nodes = self.nodes.len(), rules = self.registry.len(), "graph finalized");
        self.mark_finalized();
        Ok(())
    }

    /// Known types ordered so that every type follows the inputs of its rules
    ///
    /// The order is deterministic for a given registration sequence.
    ///
    /// # Errors
    /// [`GraphError::CyclicDependency`] if no such order exists.
    pub fn topological_order(&self) -> Result<Vec<ModelType>, GraphError> {
        let graph = self.dependency_graph();
        match toposort(&graph, None) {
            Ok(order) => Ok(order.into_iter().map(|i| self.type_at(i)).collect()),
            Err(cycle) => {
                let chain = self.cycle_through(&graph, cycle.node_id())?;
                let rule = self.closing_rule(&chain);
                Err(GraphError::CyclicDependency { chain, rule })
            }
        }
    }

    fn check_creation_sources(&self) -> Result<(), GraphError> {
        for node in self.nodes.values() {
            let subject = &node.subject;
            if self.registry.creator(subject).is_some() {
                continue;
            }
            if subject.is_managed() {
                self.contract_for(subject)?;
                continue;
            }
            let (required_by, rule) = self.first_dependent(subject).unzip();
            return Err(GraphError::NoCreatorForSubject {
                subject: subject.clone(),
                required_by,
                rule,
            });
        }
        Ok(())
    }

    /// Subject and location of the first registered rule that declares `input`
    fn first_dependent(&self, input: &ModelType) -> Option<(ModelType, RuleLocator)> {
        self.registry
            .iter()
            .map(|(_, rule)| rule)
            .find(|rule| rule.inputs().contains(input))
            .map(|rule| (self.resolve(rule.subject()), rule.locator().clone()))
    }

    /// First registered rule for the second-to-last type of `chain` that
    /// declares the last one as an input
    fn closing_rule(&self, chain: &[ModelType]) -> Option<RuleLocator> {
        let [.., subject, input] = chain else {
            return None;
        };
        self.registry
            .iter()
            .map(|(_, rule)| rule)
            .find(|rule| rule.subject() == subject && rule.inputs().contains(input))
            .map(|rule| rule.locator().clone())
    }

    fn dependency_graph(&self) -> DependencyGraph {
        let mut graph = DependencyGraph::with_capacity(self.nodes.len(), self.registry.len());
        for index in 0..self.nodes.len() {
            graph.add_node(index);
        }
        for (_, rule) in self.registry.iter() {
            let Some(to) = self.nodes.get_index_of(rule.subject()) else {
                continue;
            };
            for input in rule.inputs() {
                if let Some(from) = self.nodes.get_index_of(input) {
                    graph.add_edge(from, to, ());
                }
            }
        }
        graph
    }

    /// A closed dependency chain through `start`, written in requesting
    /// order: each type requires the next one.
    fn cycle_through(
        &self,
        graph: &DependencyGraph,
        start: usize,
    ) -> Result<Vec<ModelType>, GraphError> {
        let component = tarjan_scc(graph)
            .into_iter()
            .find(|scc| scc.contains(&start))
            .unwrap_or_default();

        let mut path = vec![start];
        let mut current = start;
        loop {
            let next = graph
                .neighbors_directed(current, Direction::Incoming)
                .filter(|n| component.contains(n))
                .min()
                .ok_or_else(|| {
                    GraphError::Internal(format!("{} reported on a cycle", self.type_at(current)))
                })?;
            if let Some(pos) = path.iter().position(|&p| p == next) {
                path.drain(..pos);
                path.push(next);
                break;
            }
            path.push(next);
            current = next;
        }

        Ok(path.into_iter().map(|i| self.type_at(i)).collect())
    }

    fn type_at(&self, index: usize) -> ModelType {
        self.nodes
            .get_index(index)
            .map_or_else(|| ModelType::opaque("?"), |(_, node)| node.subject.clone())
    }
}
