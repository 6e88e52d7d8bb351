//! Dry-run execution plans

use crate::error::GraphError;
use crate::graph::ModelGraph;
use crate::node::RealizationState;
use indexmap::IndexSet;
use model_rules::{Rule, RuleBody, RuleLocator};
use model_schema::ModelType;
use std::fmt;

/// What a plan step does
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum StepKind {
    /// Run a creation rule that returns the element
    Produce,
    /// Synthesize a managed instance from its contract
    Synthesize,
    /// Run a creation rule over the synthesized instance
    Initialize,
    /// Run a mutation rule
    Mutate,
}

impl fmt::Display for StepKind {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(match self {
            Self::Produce => "produce",
            Self::Synthesize => "synthesize",
            Self::Initialize => "initialize",
            Self::Mutate => "mutate",
        })
    }
}

/// One step of an execution plan
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct PlanStep {
    /// Step kind
    pub kind: StepKind,
    /// Subject the step works on
    pub subject: ModelType,
    /// Rule that runs, absent for synthesis
    pub rule: Option<RuleLocator>,
}

impl fmt::Display for PlanStep {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{} {}", self.kind, self.subject)?;
        if let Some(rule) = &self.rule {
            write!(f, " ({rule})")?;
        }
        Ok(())
    }
}

struct Planner<'g> {
    graph: &'g ModelGraph,
    done: IndexSet<ModelType>,
    stack: Vec<ModelType>,
    steps: Vec<PlanStep>,
}

impl ModelGraph {
    /// Steps [`realize`](Self::realize) would run for `subject`, in order,
    /// starting from the current node states. No rule body is executed.
    ///
    /// # Errors
    /// The error `realize` would report for a missing creator, an invalid
    /// contract, a cycle, the depth limit or a previously failed node.
    pub fn execution_plan(&self, subject: &ModelType) -> Result<Vec<PlanStep>, GraphError> {
        let mut planner = Planner {
            graph: self,
            done: IndexSet::new(),
            stack: Vec::new(),
            steps: Vec::new(),
        };
        planner.visit(subject, None)?;
        Ok(planner.steps)
    }
}

impl Planner<'_> {
    fn visit(
        &mut self,
        requested: &ModelType,
        via: Option<&RuleLocator>,
    ) -> Result<(), GraphError> {
        let graph = self.graph;
        let subject = graph.resolve(requested);

        match graph.state(&subject) {
            Some(RealizationState::Realized(_)) => return Ok(()),
            Some(RealizationState::Failed) => {
                return Err(GraphError::PreviouslyFailed { subject });
            }
            _ => {}
        }
        if self.done.contains(&subject) {
            return Ok(());
        }
        if let Some(start) = self.stack.iter().position(|ty| *ty == subject) {
            let mut chain = self.stack[start..].to_vec();
            chain.push(subject);
            return Err(GraphError::CyclicDependency {
                chain,
                rule: via.cloned(),
            });
        }
        if self.stack.len() >= graph.config.max_realization_depth {
            return Err(GraphError::DepthExceeded {
                subject,
                limit: graph.config.max_realization_depth,
            });
        }

        self.stack.push(subject.clone());
        match graph.registry.creator(&subject) {
            Some(rule) => match rule.body() {
                RuleBody::Produce(_) => {
                    self.inputs(rule)?;
                    self.push(StepKind::Produce, &subject, Some(rule.locator()));
                }
                RuleBody::Initialize(_) => {
                    graph.contract_for(&subject)?;
                    self.push(StepKind::Synthesize, &subject, None);
                    self.inputs(rule)?;
                    self.push(StepKind::Initialize, &subject, Some(rule.locator()));
                }
                RuleBody::Mutate(_) => {
                    return Err(GraphError::Internal(format!(
                        "rule at {} is registered as the creator of {subject}",
                        rule.locator()
                    )));
                }
            },
            None if subject.is_managed() => {
                graph.contract_for(&subject)?;
                self.push(StepKind::Synthesize, &subject, None);
            }
            None => {
                return Err(GraphError::NoCreatorForSubject {
                    required_by: self.stack.iter().rev().nth(1).cloned(),
                    rule: via.cloned(),
                    subject,
                });
            }
        }

        for rule in graph.registry.mutators(&subject) {
            self.inputs(rule)?;
            self.push(StepKind::Mutate, &subject, Some(rule.locator()));
        }
        self.stack.pop();
        self.done.insert(subject);
        Ok(())
    }

    fn inputs(&mut self, rule: &Rule) -> Result<(), GraphError> {
        rule.inputs()
            .iter()
            .try_for_each(|input| self.visit(input, Some(rule.locator())))
    }

    fn push(&mut self, kind: StepKind, subject: &ModelType, rule: Option<&RuleLocator>) {
        self.steps.push(PlanStep {
            kind,
            subject: subject.clone(),
            rule: rule.cloned(),
        });
    }
}
