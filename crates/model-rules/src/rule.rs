//! Rules: subject, role, declared inputs and body

use crate::element::ModelElement;
use model_managed::ManagedInstance;
use model_schema::ModelType;
use smallvec::SmallVec;
use std::any::{type_name, Any};
use std::fmt::{self, Debug, Display, Formatter};
use std::sync::Arc;

/// Body of a rule that produces its subject
pub type ProduceFn = Arc<dyn Fn(&RuleInputs<'_>) -> anyhow::Result<ModelElement> + Send + Sync>;

/// Body of a rule that works on an existing subject element
pub type ApplyFn =
    Arc<dyn Fn(&mut ModelElement, &RuleInputs<'_>) -> anyhow::Result<()> + Send + Sync>;

/// Opaque source position of a rule, supplied by whoever registered it
#[derive(Debug, Clone, PartialEq, Eq, Hash)]
pub struct RuleLocator(Arc<str>);

impl RuleLocator {
    /// Locator from any description, e.g. `"build.script:12"`
    #[must_use]
    pub fn new(location: impl AsRef<str>) -> Self {
        Self(Arc::from(location.as_ref()))
    }

    /// Locator text
    #[inline]
    #[must_use]
    pub fn as_str(&self) -> &str {
        &self.0
    }
}

impl Display for RuleLocator {
    fn fmt(&self, f: &mut Formatter<'_>) -> fmt::Result {
        f.write_str(&self.0)
    }
}

/// Locator for the invoking source line
#[macro_export]
macro_rules! rule_locator {
    () => {
        $crate::RuleLocator::new(concat!(file!(), ":", line!()))
    };
}

/// Registration sequence number of a rule
#[derive(Debug, Clone, Copy, PartialEq, Eq, PartialOrd, Ord, Hash)]
pub struct RuleId(pub(crate) usize);

impl RuleId {
    /// Zero-based registration index
    #[inline]
    #[must_use]
    pub fn index(self) -> usize {
        self.0
    }
}

/// Whether a rule creates or mutates its subject
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum RuleRole {
    /// Produces the initial element
    Create,
    /// Modifies an already-created element
    Mutate,
}

/// Executable part of a rule
#[derive(Clone)]
pub enum RuleBody {
    /// Creation returning the subject element
    Produce(ProduceFn),
    /// Creation of a managed subject: the engine synthesizes the instance
    /// and the body initializes it
    Initialize(ApplyFn),
    /// Mutation of the existing subject element
    Mutate(ApplyFn),
}

impl RuleBody {
    /// Role implied by the body shape
    #[must_use]
    pub fn role(&self) -> RuleRole {
        match self {
            Self::Produce(_) | Self::Initialize(_) => RuleRole::Create,
            Self::Mutate(_) => RuleRole::Mutate,
        }
    }

    fn shape(&self) -> &'static str {
        match self {
            Self::Produce(_) => "produce",
            Self::Initialize(_) => "initialize",
            Self::Mutate(_) => "mutate",
        }
    }
}

/// An immutable rule against one subject type
#[derive(Clone)]
pub struct Rule {
    locator: RuleLocator,
    subject: ModelType,
    inputs: Vec<ModelType>,
    body: RuleBody,
}

impl Rule {
    /// Creation rule that returns the subject element
    pub fn creator<F>(locator: RuleLocator, subject: ModelType, inputs: Vec<ModelType>, body: F) -> Self
    where
        F: Fn(&RuleInputs<'_>) -> anyhow::Result<ModelElement> + Send + Sync + 'static,
    {
        Self::with_body(locator, subject, inputs, RuleBody::Produce(Arc::new(body)))
    }

    /// Creation rule that initializes an engine-synthesized managed subject
    pub fn initializer<F>(
        locator: RuleLocator,
        subject: ModelType,
        inputs: Vec<ModelType>,
        body: F,
    ) -> Self
    where
        F: Fn(&mut ModelElement, &RuleInputs<'_>) -> anyhow::Result<()> + Send + Sync + 'static,
    {
        Self::with_body(locator, subject, inputs, RuleBody::Initialize(Arc::new(body)))
    }

    /// Mutation rule
    pub fn mutator<F>(locator: RuleLocator, subject: ModelType, inputs: Vec<ModelType>, body: F) -> Self
    where
        F: Fn(&mut ModelElement, &RuleInputs<'_>) -> anyhow::Result<()> + Send + Sync + 'static,
    {
        Self::with_body(locator, subject, inputs, RuleBody::Mutate(Arc::new(body)))
    }

    /// Rule from a prepared body
    #[must_use]
    pub fn with_body(
        locator: RuleLocator,
        subject: ModelType,
        inputs: Vec<ModelType>,
        body: RuleBody,
    ) -> Self {
        Self {
            locator,
            subject,
            inputs,
            body,
        }
    }

    /// Where the rule was declared
    #[inline]
    #[must_use]
    pub fn locator(&self) -> &RuleLocator {
        &self.locator
    }

    /// Type the rule creates or mutates
    #[inline]
    #[must_use]
    pub fn subject(&self) -> &ModelType {
        &self.subject
    }

    /// Declared input types, in order
    #[inline]
    #[must_use]
    pub fn inputs(&self) -> &[ModelType] {
        &self.inputs
    }

    /// Rule role
    #[inline]
    #[must_use]
    pub fn role(&self) -> RuleRole {
        self.body.role()
    }

    /// Rule body
    #[inline]
    #[must_use]
    pub fn body(&self) -> &RuleBody {
        &self.body
    }
}

impl Debug for Rule {
    fn fmt(&self, f: &mut Formatter<'_>) -> fmt::Result {
        f.debug_struct("Rule")
            .field("locator", &self.locator)
            .field("subject", &self.subject)
            .field("inputs", &self.inputs)
            .field("body", &self.body.shape())
            .finish()
    }
}

/// Resolved inputs handed to a rule body, in declaration order
pub struct RuleInputs<'a> {
    types: &'a [ModelType],
    elements: SmallVec<[&'a ModelElement; 4]>,
}

impl<'a> RuleInputs<'a> {
    /// Inputs for `types`, realized as `elements`
    ///
    /// # Panics
    /// Debug builds assert that both slices have the same length.
    #[must_use]
    pub fn new(types: &'a [ModelType], elements: SmallVec<[&'a ModelElement; 4]>) -> Self {
        debug_assert_eq!(types.len(), elements.len());
        Self { types, elements }
    }

    /// No inputs
    #[must_use]
    pub fn empty() -> Self {
        Self {
            types: &[],
            elements: SmallVec::new(),
        }
    }

    /// Number of inputs
    #[inline]
    #[must_use]
    pub fn len(&self) -> usize {
        self.elements.len()
    }

    /// Whether the rule declared no inputs
    #[inline]
    #[must_use]
    pub fn is_empty(&self) -> bool {
        self.elements.is_empty()
    }

    /// Raw element at `index`
    #[inline]
    #[must_use]
    pub fn element(&self, index: usize) -> Option<&'a ModelElement> {
        self.elements.get(index).copied()
    }

    /// Input at `index` as `T`
    ///
    /// # Errors
    /// Fails when the index is out of range or the element is not a `T`.
    pub fn get<T: Any>(&self, index: usize) -> anyhow::Result<&'a T> {
        let element = self.require(index)?;
        element.downcast_ref::<T>().ok_or_else(|| {
            anyhow::anyhow!(
                "input #{index} ({}) holds {}, not {}",
                self.types.get(index).map_or("?", ModelType::name),
                element.value_type(),
                type_name::<T>()
            )
        })
    }

    /// Input at `index` as a managed instance
    ///
    /// # Errors
    /// Fails when the index is out of range or the element is not managed.
    pub fn managed(&self, index: usize) -> anyhow::Result<&'a ManagedInstance> {
        self.get::<ManagedInstance>(index)
    }

    fn require(&self, index: usize) -> anyhow::Result<&'a ModelElement> {
        self.element(index).ok_or_else(|| {
            anyhow::anyhow!("input #{index} requested but only {} declared", self.len())
        })
    }
}

impl Debug for RuleInputs<'_> {
    fn fmt(&self, f: &mut Formatter<'_>) -> fmt::Result {
        f.debug_map()
            .entries(self.types.iter().map(ToString::to_string).zip(&self.elements))
            .finish()
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn role_follows_body_shape() {
        let subject = ModelType::opaque("Tasks");
        let create = Rule::creator(rule_locator!(), subject.clone(), vec![], |_| {
            Ok(ModelElement::new(()))
        });
        let mutate = Rule::mutator(rule_locator!(), subject, vec![], |_, _| Ok(()));

        assert_eq!(create.role(), RuleRole::Create);
        assert_eq!(mutate.role(), RuleRole::Mutate);
        assert!(create.locator().as_str().contains("rule.rs:"));
        assert!(format!("{create:?}").contains("produce"));
    }

    #[test]
    fn inputs_downcast_by_index() {
        let types = [ModelType::opaque("Name"), ModelType::opaque("Count")];
        let name = ModelElement::new(String::from("foo"));
        let count = ModelElement::new(3usize);
        let inputs = RuleInputs::new(&types, smallvec::smallvec![&name, &count]);

        assert_eq!(inputs.len(), 2);
        assert_eq!(inputs.get::<String>(0).unwrap(), "foo");
        assert_eq!(*inputs.get::<usize>(1).unwrap(), 3);

        let err = inputs.get::<usize>(0).unwrap_err().to_string();
        assert!(err.contains("input #0 (Name)"));
        assert!(inputs.get::<usize>(2).is_err());
        assert!(inputs.managed(0).is_err());
    }

    #[test]
    fn empty_inputs() {
        let inputs = RuleInputs::empty();
        assert!(inputs.is_empty());
        assert!(inputs.element(0).is_none());
    }
}
