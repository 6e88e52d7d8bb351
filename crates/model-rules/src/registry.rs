//! Append-only rule registry
//!
//! Rules are stored in registration order. Per subject the registry keeps
//! at most one creation rule and the ordered list of mutation rules; every
//! managed type a rule touches is validated before the rule is accepted.
//! A type name stands for one contract: once a managed form is registered,
//! every later rule must declare the same descriptor under that name.

use crate::error::RegistrationError;
use crate::rule::{Rule, RuleBody, RuleId, RuleRole};
use indexmap::IndexMap;
use model_schema::{ContractValidator, ModelType};
use smallvec::SmallVec;
use std::sync::Arc;
use tracing::{debug, warn};

/// Rules registered against one subject
#[derive(Debug, Clone, Default)]
pub struct SubjectRules {
    creator: Option<RuleId>,
    mutators: Vec<RuleId>,
    managed: Option<ModelType>,
}

impl SubjectRules {
    /// The creation rule, if any
    #[inline]
    #[must_use]
    pub fn creator(&self) -> Option<RuleId> {
        self.creator
    }

    /// Mutation rules in registration order
    #[inline]
    #[must_use]
    pub fn mutators(&self) -> &[RuleId] {
        &self.mutators
    }
}

/// Registry of creation and mutation rules
#[derive(Debug)]
pub struct RuleRegistry {
    rules: Vec<Arc<Rule>>,
    subjects: IndexMap<ModelType, SubjectRules>,
    validator: Arc<ContractValidator>,
    frozen: bool,
}

impl Default for RuleRegistry {
    fn default() -> Self {
        Self::new()
    }
}

impl RuleRegistry {
    /// Empty registry sharing the process-wide validation cache
    #[must_use]
    pub fn new() -> Self {
        Self::with_validator(ContractValidator::global())
    }

    /// Empty registry with its own validator
    #[must_use]
    pub fn with_validator(validator: Arc<ContractValidator>) -> Self {
        Self {
            rules: Vec::new(),
            subjects: IndexMap::new(),
            validator,
            frozen: false,
        }
    }

    /// Add a rule
    ///
    /// Checks run in this order and the first failure is reported.
    ///
    /// # Errors
    /// - [`RegistrationError::RegistryFrozen`] after [`freeze`](Self::freeze)
    /// - [`RegistrationError::DuplicateCreationRule`] for a second creator of a subject
    /// - [`RegistrationError::InvalidContract`] if a managed subject or input fails validation
    /// - [`RegistrationError::ConflictingContract`] if a managed subject or input
    ///   differs from the contract already registered under its name
    /// - [`RegistrationError::NoCreatorForSubject`] for an initializer on an opaque subject
    ///
    /// A rejected rule leaves the registry unchanged.
    pub fn register(&mut self, rule: Rule) -> Result<RuleId, RegistrationError> {
        if self.frozen {
            warn!(rule = %rule.locator(), "registration after freeze");
            return Err(RegistrationError::RegistryFrozen {
                rule: rule.locator().clone(),
            });
        }

        if rule.role() == RuleRole::Create {
            if let Some(existing) = self.creator(rule.subject()) {
                let existing = existing.locator().clone();
                warn!(
                    subject = %rule.subject(),
                    existing = %existing,
                    rejected = %rule.locator(),
                    "duplicate creation rule"
                );
                return Err(RegistrationError::DuplicateCreationRule {
                    subject: rule.subject().clone(),
                    existing,
                    rejected: rule.locator().clone(),
                });
            }
        }

        self.check_contracts(&rule)?;
        self.check_conflicts(&rule)?;

        let subject = self.resolve(rule.subject()).unwrap_or(rule.subject());
        if matches!(rule.body(), RuleBody::Initialize(_)) && !subject.is_managed() {
            return Err(RegistrationError::NoCreatorForSubject {
                subject: rule.subject().clone(),
                rule: rule.locator().clone(),
            });
        }

        let id = RuleId(self.rules.len());
        let entry = self.note(rule.subject());
        match rule.role() {
            RuleRole::Create => entry.creator = Some(id),
            RuleRole::Mutate => entry.mutators.push(id),
        }
        for input in rule.inputs() {
            self.note(input);
        }

        debug!(
            rule = %rule.locator(),
            subject = %rule.subject(),
            role = ?rule.role(),
            inputs = rule.inputs().len(),
            "rule registered"
        );
        self.rules.push(Arc::new(rule));
        Ok(id)
    }

    fn note(&mut self, ty: &ModelType) -> &mut SubjectRules {
        let entry = self.subjects.entry(ty.clone()).or_default();
        if ty.is_managed() && entry.managed.is_none() {
            entry.managed = Some(ty.clone());
        }
        entry
    }

    fn check_contracts(&self, rule: &Rule) -> Result<(), RegistrationError> {
        let touched = std::iter::once(rule.subject()).chain(rule.inputs());
        for ty in touched {
            let Some(descriptor) = ty.contract() else {
                continue;
            };
            if let Err(source) = self.validator.validate(descriptor) {
                warn!(rule = %rule.locator(), subject = %ty, error = %source, "contract rejected");
                return Err(RegistrationError::InvalidContract {
                    rule: rule.locator().clone(),
                    subject: ty.clone(),
                    source,
                });
            }
        }
        Ok(())
    }

    fn check_conflicts(&self, rule: &Rule) -> Result<(), RegistrationError> {
        let touched: SmallVec<[&ModelType; 4]> =
            std::iter::once(rule.subject()).chain(rule.inputs()).collect();
        for (position, ty) in touched.iter().enumerate() {
            let Some(declared) = ty.contract() else {
                continue;
            };
            // earlier types of the same rule count as registered
            let known = self
                .subjects
                .get(*ty)
                .and_then(|rules| rules.managed.as_ref())
                .or_else(|| {
                    touched[..position]
                        .iter()
                        .copied()
                        .find(|earlier| *earlier == *ty && earlier.is_managed())
                });
            let Some(registered) = known.and_then(ModelType::contract) else {
                continue;
            };

            let (registered, declared) = (registered.fingerprint(), declared.fingerprint());
            if registered != declared {
                warn!(
                    rule = %rule.locator(),
                    subject = %ty,
                    registered = %registered.short(),
                    declared = %declared.short(),
                    "conflicting contract"
                );
                return Err(RegistrationError::ConflictingContract {
                    subject: (*ty).clone(),
                    rule: rule.locator().clone(),
                    registered,
                    declared,
                });
            }
        }
        Ok(())
    }

    /// Reject all further registrations
    pub fn freeze(&mut self) {
        self.frozen = true;
    }

    /// Whether [`freeze`](Self::freeze) was called
    #[inline]
    #[must_use]
    pub fn is_frozen(&self) -> bool {
        self.frozen
    }

    /// Rule by id
    #[inline]
    #[must_use]
    pub fn rule(&self, id: RuleId) -> Option<&Arc<Rule>> {
        self.rules.get(id.0)
    }

    /// Creation rule for `subject`
    #[must_use]
    pub fn creator(&self, subject: &ModelType) -> Option<&Arc<Rule>> {
        self.subjects
            .get(subject)
            .and_then(|rules| rules.creator)
            .and_then(|id| self.rule(id))
    }

    /// Mutation rules for `subject`, in registration order
    pub fn mutators(&self, subject: &ModelType) -> impl Iterator<Item = &Arc<Rule>> {
        self.subjects
            .get(subject)
            .map(SubjectRules::mutators)
            .unwrap_or_default()
            .iter()
            .filter_map(|id| self.rule(*id))
    }

    /// Every type named by a rule, as subject or input, in first-seen order
    pub fn subjects(&self) -> impl Iterator<Item = (&ModelType, &SubjectRules)> {
        self.subjects.iter()
    }

    /// Registered form of `subject`, which carries its contract if any rule
    /// declared it as managed
    #[must_use]
    pub fn resolve(&self, subject: &ModelType) -> Option<&ModelType> {
        self.subjects
            .get_key_value(subject)
            .map(|(ty, rules)| rules.managed.as_ref().unwrap_or(ty))
    }

    /// All rules in registration order
    pub fn iter(&self) -> impl Iterator<Item = (RuleId, &Arc<Rule>)> {
        self.rules.iter().enumerate().map(|(i, r)| (RuleId(i), r))
    }

    /// Number of registered rules
    #[inline]
    #[must_use]
    pub fn len(&self) -> usize {
        self.rules.len()
    }

    /// Whether no rule has been registered
    #[inline]
    #[must_use]
    pub fn is_empty(&self) -> bool {
        self.rules.is_empty()
    }

    /// Validator used for managed types
    #[inline]
    #[must_use]
    pub fn validator(&self) -> &Arc<ContractValidator> {
        &self.validator
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::element::ModelElement;
    use crate::rule::RuleLocator;
    use model_schema::{ContractErrorKind, TypeDescriptor, ValueType};
    use pretty_assertions::assert_eq;

    fn person() -> ModelType {
        ModelType::managed(TypeDescriptor::interface("Person").property("name", ValueType::Text))
    }

    fn registry() -> RuleRegistry {
        RuleRegistry::with_validator(Arc::new(ContractValidator::new()))
    }

    fn produce(subject: ModelType, at: &str) -> Rule {
        Rule::creator(RuleLocator::new(at), subject, vec![], |_| {
            Ok(ModelElement::new(()))
        })
    }

    #[test]
    fn second_creator_is_rejected_with_both_locations() {
        let mut reg = registry();
        let tasks = ModelType::opaque("Tasks");
        reg.register(produce(tasks.clone(), "a:1")).unwrap();

        let err = reg.register(produce(tasks.clone(), "b:2")).unwrap_err();
        match &err {
            RegistrationError::DuplicateCreationRule {
                existing, rejected, ..
            } => {
                assert_eq!(existing.as_str(), "a:1");
                assert_eq!(rejected.as_str(), "b:2");
            }
            other => panic!("unexpected error: {other:?}"),
        }
        assert!(err.to_string().contains("a:1"));
        assert_eq!(reg.len(), 1);
        assert_eq!(reg.creator(&tasks).unwrap().locator().as_str(), "a:1");
    }

    #[test]
    fn mutators_keep_registration_order() {
        let mut reg = registry();
        let tasks = ModelType::opaque("Tasks");
        for at in ["m:1", "m:2", "m:3"] {
            reg.register(Rule::mutator(RuleLocator::new(at), tasks.clone(), vec![], |_, _| Ok(())))
                .unwrap();
        }

        let order: Vec<_> = reg.mutators(&tasks).map(|r| r.locator().as_str()).collect();
        assert_eq!(order, vec!["m:1", "m:2", "m:3"]);
        assert!(reg.creator(&tasks).is_none());
    }

    #[test]
    fn invalid_managed_input_fails_at_registration() {
        let mut reg = registry();
        let broken = ModelType::managed(
            TypeDescriptor::interface("Broken").accessor("getName", ValueType::Text),
        );
        let rule = Rule::mutator(
            RuleLocator::new("x:9"),
            ModelType::opaque("Tasks"),
            vec![broken],
            |_, _| Ok(()),
        );

        let err = reg.register(rule).unwrap_err();
        let RegistrationError::InvalidContract { subject, source, .. } = &err else {
            panic!("unexpected error: {err:?}");
        };
        assert_eq!(subject.name(), "Broken");
        assert_eq!(source.kind(), ContractErrorKind::UnpairedProperty);
        assert!(reg.is_empty());
        assert_eq!(reg.subjects().count(), 0);
    }

    #[test]
    fn initializer_needs_managed_subject() {
        let mut reg = registry();
        let rule = Rule::initializer(
            RuleLocator::new("i:1"),
            ModelType::opaque("Tasks"),
            vec![],
            |_, _| Ok(()),
        );
        assert!(matches!(
            reg.register(rule),
            Err(RegistrationError::NoCreatorForSubject { .. })
        ));

        let ok = Rule::initializer(RuleLocator::new("i:2"), person(), vec![], |_, _| Ok(()));
        assert_eq!(reg.register(ok).unwrap().index(), 0);
    }

    #[test]
    fn inputs_become_known_subjects() {
        let mut reg = registry();
        let tasks = ModelType::opaque("Tasks");
        reg.register(Rule::mutator(
            RuleLocator::new("m:1"),
            tasks.clone(),
            vec![person()],
            |_, _| Ok(()),
        ))
        .unwrap();

        let names: Vec<_> = reg.subjects().map(|(ty, _)| ty.name()).collect();
        assert_eq!(names, vec!["Tasks", "Person"]);
        assert!(reg.resolve(&ModelType::opaque("Person")).unwrap().is_managed());
        assert!(reg.resolve(&ModelType::opaque("Nobody")).is_none());
    }

    #[test]
    fn same_name_with_other_contract_is_rejected() {
        let mut reg = registry();
        reg.register(Rule::initializer(RuleLocator::new("p:1"), person(), vec![], |_, _| Ok(())))
            .unwrap();

        let relocated = ModelType::managed(
            TypeDescriptor::interface("Person")
                .property("name", ValueType::Text)
                .property("city", ValueType::Text),
        );
        let rule = Rule::mutator(
            RuleLocator::new("p:2"),
            ModelType::opaque("Tasks"),
            vec![relocated.clone()],
            |_, _| Ok(()),
        );
        let err = reg.register(rule).unwrap_err();

        let RegistrationError::ConflictingContract {
            subject,
            rule,
            registered,
            declared,
        } = &err
        else {
            panic!("unexpected error: {err:?}");
        };
        assert_eq!(subject.name(), "Person");
        assert_eq!(rule.as_str(), "p:2");
        assert_eq!(*registered, person().contract().unwrap().fingerprint());
        assert_eq!(*declared, relocated.contract().unwrap().fingerprint());
        assert_eq!(reg.len(), 1);
        assert_eq!(reg.subjects().count(), 1);

        // the same descriptor again is fine
        reg.register(Rule::mutator(RuleLocator::new("p:3"), person(), vec![], |_, _| Ok(())))
            .unwrap();
    }

    #[test]
    fn conflicting_contracts_within_one_rule() {
        let mut reg = registry();
        let other = ModelType::managed(
            TypeDescriptor::interface("Person").property("title", ValueType::Text),
        );
        let rule = Rule::mutator(RuleLocator::new("p:1"), person(), vec![other], |_, _| Ok(()));
        assert!(matches!(
            reg.register(rule),
            Err(RegistrationError::ConflictingContract { .. })
        ));
        assert!(reg.is_empty());
    }

    #[test]
    fn duplicate_creator_is_reported_before_contract_errors() {
        let mut reg = registry();
        reg.register(produce(ModelType::opaque("Person"), "a:1")).unwrap();

        let broken = ModelType::managed(
            TypeDescriptor::interface("Person").accessor("getName", ValueType::Text),
        );
        let err = reg.register(produce(broken, "b:2")).unwrap_err();
        assert!(matches!(err, RegistrationError::DuplicateCreationRule { .. }));
    }

    #[test]
    fn frozen_registry_rejects() {
        let mut reg = registry();
        reg.freeze();
        assert!(matches!(
            reg.register(produce(ModelType::opaque("A"), "f:1")),
            Err(RegistrationError::RegistryFrozen { .. })
        ));
    }
}
