use model_graph::prelude::*;
use model_graph::ErrorKind;
use model_rules::RegistrationError;
use model_schema::{ContractErrorKind, ContractValidator, MemberDescriptor};
use model_test_utils::{init_tracing, person_type, tasks_creator, tasks_type, CallLog};
use std::sync::Arc;

fn graph() -> ModelGraph {
    init_tracing();
    let registry = RuleRegistry::with_validator(Arc::new(ContractValidator::new()));
    ModelGraph::with_registry(registry, GraphConfig::default())
}

#[test]
fn test_duplicate_creator_rejected_before_execution() {
    let log = CallLog::new();
    let mut graph = graph();
    graph.register(tasks_creator(&log)).unwrap();

    let second = Rule::creator(RuleLocator::new("tasks:again"), tasks_type(), vec![], |_| {
        Ok(ModelElement::new(()))
    });
    let err = graph.register(second).unwrap_err();

    assert!(log.entries().is_empty());
    let diagnostic = Diagnostic::from(&err);
    assert_eq!(diagnostic.kind, ErrorKind::DuplicateCreationRule);
    assert_eq!(diagnostic.location.as_ref().map(RuleLocator::as_str), Some("tasks:again"));
    assert!(diagnostic.message.contains("fixtures:tasks"));
    assert_eq!(graph.registry().len(), 1);
}

#[test]
fn test_invalid_contract_rejected_at_registration() {
    let broken = ModelType::managed(
        TypeDescriptor::interface("Person")
            .property("name", ValueType::Text)
            .method(MemberDescriptor::new("describe", vec![], Some(ValueType::Text))),
    );
    let mut graph = graph();
    graph.register(tasks_creator(&CallLog::new())).unwrap();

    let rule = Rule::initializer(RuleLocator::new("person:init"), broken, vec![], |_, _| Ok(()));
    let err = graph.register(rule).unwrap_err();

    let RegistrationError::InvalidContract { source, .. } = &err else {
        panic!("unexpected error: {err:?}");
    };
    assert_eq!(source.kind(), ContractErrorKind::InvalidMember);

    let diagnostic = Diagnostic::from(&err);
    assert_eq!(diagnostic.type_name.as_deref(), Some("Person"));
    assert_eq!(diagnostic.member.as_deref(), Some("describe"));
    assert_eq!(diagnostic.location.as_ref().map(RuleLocator::as_str), Some("person:init"));

    // earlier registrations survive
    assert!(graph.realize(&tasks_type()).is_ok());
}

#[test]
fn test_second_contract_under_one_name_is_rejected() {
    let mut graph = graph();
    graph
        .register(Rule::initializer(RuleLocator::new("person:1"), person_type(), vec![], |el, _| {
            el.as_managed_mut().unwrap().set("name", "foo")?;
            Ok(())
        }))
        .unwrap();

    let with_city = ModelType::managed(
        TypeDescriptor::interface("Person")
            .property("name", ValueType::Text)
            .property("city", ValueType::Text),
    );
    let err = graph
        .register(Rule::mutator(RuleLocator::new("person:2"), with_city, vec![], |el, _| {
            el.as_managed_mut().unwrap().set("city", "Oslo")?;
            Ok(())
        }))
        .unwrap_err();

    assert!(matches!(err, RegistrationError::ConflictingContract { .. }));
    let diagnostic = Diagnostic::from(&err);
    assert_eq!(diagnostic.kind, ErrorKind::ConflictingContract);
    assert_eq!(diagnostic.type_name.as_deref(), Some("Person"));
    assert_eq!(diagnostic.location.as_ref().map(RuleLocator::as_str), Some("person:2"));

    // the node keeps its first contract and still realizes
    let person = graph.realize_managed(&person_type()).unwrap();
    assert_eq!(person.get("name").unwrap(), "foo");
    assert_eq!(graph.registry().len(), 1);
}

#[test]
fn test_unsupported_property_type_names_property() {
    let aged = ModelType::managed(
        TypeDescriptor::interface("Aged")
            .accessor("getAge", ValueType::Integer)
            .mutator("setAge", ValueType::Integer),
    );
    let mut graph = graph();
    let err = graph
        .register(Rule::mutator(RuleLocator::new("aged"), tasks_type(), vec![aged], |_, _| Ok(())))
        .unwrap_err();

    let RegistrationError::InvalidContract { subject, source, .. } = err else {
        panic!("unexpected error");
    };
    assert_eq!(subject.name(), "Aged");
    assert_eq!(source.property(), Some("age"));
}

#[test]
fn test_initializer_on_opaque_type_has_no_creator() {
    let mut graph = graph();
    let rule = Rule::initializer(RuleLocator::new("tasks:init"), tasks_type(), vec![], |_, _| Ok(()));

    assert!(matches!(
        graph.register(rule),
        Err(RegistrationError::NoCreatorForSubject { .. })
    ));
}

#[test]
fn test_mutator_without_creator_fails_on_realize() {
    let mut graph = graph();
    graph
        .register(Rule::mutator(RuleLocator::new("tasks:add"), tasks_type(), vec![], |_, _| Ok(())))
        .unwrap();

    let err = graph.realize(&tasks_type()).unwrap_err();
    assert!(matches!(err, GraphError::NoCreatorForSubject { .. }));

    // a creator arriving after the failure is refused
    assert!(matches!(
        graph.register(tasks_creator(&CallLog::new())),
        Err(RegistrationError::SubjectAlreadyRealized { .. })
    ));
}

#[test]
fn test_late_creator_makes_mutator_valid() {
    let log = CallLog::new();
    let mut graph = graph();
    graph
        .register(Rule::mutator(RuleLocator::new("tasks:add"), tasks_type(), vec![], |_, _| Ok(())))
        .unwrap();
    assert!(graph.finalize().is_err());

    graph.register(tasks_creator(&log)).unwrap();
    graph.finalize().unwrap();
    graph.realize(&tasks_type()).unwrap();
    assert_eq!(log.entries(), vec!["create Tasks"]);
}

#[test]
fn test_missing_input_is_reported_with_requirer() {
    let mut graph = graph();
    let report = ModelType::opaque("Report");
    graph
        .register(Rule::creator(
            RuleLocator::new("report:1"),
            report.clone(),
            vec![tasks_type()],
            |_| Ok(ModelElement::new(())),
        ))
        .unwrap();

    let err = graph.realize(&report).unwrap_err();
    match &err {
        GraphError::NoCreatorForSubject {
            subject,
            required_by,
            rule,
        } => {
            assert_eq!(*subject, tasks_type());
            assert_eq!(required_by.as_ref(), Some(&report));
            assert_eq!(rule.as_ref().map(RuleLocator::as_str), Some("report:1"));
        }
        other => panic!("unexpected error: {other:?}"),
    }

    let diagnostic = Diagnostic::from(&err);
    assert_eq!(diagnostic.kind, ErrorKind::NoCreatorForSubject);
    assert_eq!(diagnostic.type_name.as_deref(), Some("Tasks"));
    assert_eq!(diagnostic.location.as_ref().map(RuleLocator::as_str), Some("report:1"));
}

#[test]
fn test_finalize_before_realize_fails_fast() {
    init_tracing();
    let log = CallLog::new();
    let registry = RuleRegistry::with_validator(Arc::new(ContractValidator::new()));
    let mut graph =
        ModelGraph::with_registry(registry, GraphConfig::new().with_finalize_before_realize(true));
    graph.register(tasks_creator(&log)).unwrap();
    graph
        .register(Rule::mutator(
            RuleLocator::new("tasks:needs-report"),
            tasks_type(),
            vec![ModelType::opaque("Report")],
            |_, _| Ok(()),
        ))
        .unwrap();

    assert!(matches!(
        graph.realize(&tasks_type()),
        Err(GraphError::NoCreatorForSubject { .. })
    ));
    assert!(log.entries().is_empty());
    assert!(!graph.state(&tasks_type()).unwrap().is_started());
}

#[test]
fn test_person_is_managed_wherever_declared() {
    let mut graph = graph();
    graph
        .register(Rule::mutator(
            RuleLocator::new("tasks:add"),
            tasks_type(),
            vec![person_type()],
            |_, _| Ok(()),
        ))
        .unwrap();

    let view = graph.node(&ModelType::opaque("Person")).unwrap();
    assert!(view.subject.is_managed());
    assert!(view.creator.is_none());
}
