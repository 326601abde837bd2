//! Behavior bundle of a registered type.

use crate::{
    construct::{Construct, Extensibility, Mismatch},
    layout::Layout,
    rule::Cursor,
    value::Sample,
};
use wireproof_descriptor::SerializationPlan;

/// How much of a received sample [TypeHandler::validate] checks.
#[derive(Clone, Copy, Debug, Default, PartialEq, Eq)]
pub enum Verification {
    /// Every member is compared.
    #[default]
    Full,
    /// Only key members are compared.
    KeyOnly,
}

/// Immutable description of a type: how to generate, validate and compare its samples, its
/// native size and (when known) its compiled serialization plan.
#[derive(Clone, Debug, PartialEq)]
pub struct TypeHandler {
    name: String,
    construct: Construct,
    layout: Layout,
    verification: Verification,
    plan: Option<SerializationPlan>,
}

impl TypeHandler {
    pub fn new(name: impl Into<String>, construct: Construct) -> Self {
        let layout = construct.layout();
        Self {
            name: name.into(),
            construct,
            layout,
            verification: Verification::Full,
            plan: None,
        }
    }

    pub fn with_verification(mut self, verification: Verification) -> Self {
        self.verification = verification;
        self
    }

    pub fn with_plan(mut self, plan: SerializationPlan) -> Self {
        self.plan = Some(plan);
        self
    }

    pub fn name(&self) -> &str {
        &self.name
    }

    pub fn construct(&self) -> &Construct {
        &self.construct
    }

    pub fn layout(&self) -> Layout {
        self.layout
    }

    /// Native size of the type in bytes.
    pub fn size_of(&self) -> usize {
        self.layout.size
    }

    pub fn extensibility(&self) -> Extensibility {
        self.construct.extensibility()
    }

    pub fn verification(&self) -> Verification {
        self.verification
    }

    pub fn plan(&self) -> Option<&SerializationPlan> {
        self.plan.as_ref()
    }

    /// Names of the top-level key members.
    pub fn keys(&self) -> Vec<&str> {
        match &self.construct {
            Construct::Struct { fields, .. } => fields
                .iter()
                .filter(|field| field.key)
                .map(|field| field.name.as_str())
                .collect(),
            _ => Vec::new(),
        }
    }

    /// Generate the sample implied by `seed`.
    pub fn generate(&self, seed: i64) -> Sample {
        Sample::new(self.construct.generate(Cursor::new(seed)))
    }

    /// Check that `sample` is what `seed` generates.
    ///
    /// Members are compared according to the handler's [Verification] mode.
    pub fn validate(&self, sample: &Sample, seed: i64) -> Result<(), Mismatch> {
        let expected = self.generate(seed);
        match self.verification {
            Verification::Full => self.construct.compare(expected.value(), sample.value()),
            Verification::KeyOnly => self.construct.compare_keys(expected.value(), sample.value()),
        }
    }

    /// Boolean form of [TypeHandler::validate].
    pub fn is_valid(&self, sample: &Sample, seed: i64) -> bool {
        self.validate(sample, seed).is_ok()
    }

    /// Compare every member of two samples.
    pub fn compare(&self, expected: &Sample, actual: &Sample) -> Result<(), Mismatch> {
        self.construct.compare(expected.value(), actual.value())
    }

    /// Check that the key members of `sample` are those `seed` generates.
    pub fn identify(&self, sample: &Sample, seed: i64) -> Result<(), Mismatch> {
        let expected = self.generate(seed);
        self.construct
            .compare_keys(expected.value(), sample.value())
    }
}
