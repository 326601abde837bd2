//! Verify native types against an external [Document].
//!
//! Every check that fails adds to the error count of the [Report]; nothing short-circuits. A
//! type the external document does not describe, or describes without a topic descriptor, is
//! skipped rather than failed. A native entry that cannot be read is reported as one failure
//! and verification continues with the next entry.

use crate::{
    differ::{diff, Diff},
    document::{Document, TypeDefinition},
    plan::{Extensibility, SerializationPlan},
    Error,
};
use std::fmt;
use tracing::{debug, warn};

/// A type as the native pipeline lays it out.
#[derive(Clone, Debug, PartialEq, Eq)]
pub struct NativeType {
    pub name: String,
    pub size: usize,
    /// Compiled plan. Types without one are only checked for size.
    pub plan: Option<SerializationPlan>,
}

impl NativeType {
    pub fn new(name: impl Into<String>, size: usize) -> Self {
        Self {
            name: name.into(),
            size,
            plan: None,
        }
    }

    pub fn with_plan(mut self, plan: SerializationPlan) -> Self {
        self.plan = Some(plan);
        self
    }

    /// Native type described by an entry of a native document.
    pub fn from_definition(definition: &TypeDefinition) -> Result<Self, Error> {
        let size = definition
            .size()
            .ok_or_else(|| Error::MissingSize(definition.name.clone()))?;
        Ok(Self {
            name: definition.name.clone(),
            size,
            plan: definition.plan()?,
        })
    }

    /// Like [NativeType::from_definition], but a failure is kept as a [Rejected] entry.
    pub fn from_entry(definition: &TypeDefinition) -> NativeEntry {
        Self::from_definition(definition).map_err(|err| Rejected {
            name: definition.name.clone(),
            reason: err.to_string(),
        })
    }

    /// Every laid-out type of a native document, in document order.
    ///
    /// Entries without a layout (see [TypeDefinition::has_layout]) are left out. Entries that
    /// cannot be read are returned as [Rejected] in their place.
    pub fn from_document(document: &Document) -> Vec<NativeEntry> {
        document
            .types
            .iter()
            .filter(|definition| {
                let layout = definition.has_layout();
                if !layout {
                    debug!(
                        name = definition.name.as_str(),
                        kind = definition.kind.as_str(),
                        "ignoring entry without layout"
                    );
                }
                layout
            })
            .map(Self::from_entry)
            .collect()
    }
}

/// A native entry that does not describe a usable type. Counts as one error.
#[derive(Clone, Debug, PartialEq, Eq)]
pub struct Rejected {
    pub name: String,
    pub reason: String,
}

/// A native type, or the reason its entry was rejected.
pub type NativeEntry = Result<NativeType, Rejected>;

/// Native size against the size the external document declares.
#[derive(Clone, Copy, Debug, PartialEq, Eq)]
pub struct SizeCheck {
    pub native: usize,
    pub external: Option<usize>,
}

impl SizeCheck {
    pub fn passed(&self) -> bool {
        self.external == Some(self.native)
    }
}

/// Outcome of comparing serialization plans.
#[derive(Clone, Debug, PartialEq, Eq)]
pub enum DescriptorCheck {
    /// The native type carries no plan (size-only verification).
    NotRequested,
    /// The external document has no descriptor for the type.
    Skipped(String),
    /// The external descriptor is unusable. Counts as one error.
    Invalid(String),
    Compared {
        diff: Diff,
        /// Set when the native plan's header disagrees with the declared extensibility.
        extensibility: Option<(Extensibility, Extensibility)>,
    },
}

/// Verification result of a single type.
#[derive(Clone, Debug, PartialEq, Eq)]
pub struct TypeReport {
    pub name: String,
    /// `None` if the external document does not describe the type.
    pub size: Option<SizeCheck>,
    pub descriptor: DescriptorCheck,
}

impl TypeReport {
    /// Report of a native entry that could not be read.
    pub fn rejected(rejected: &Rejected) -> Self {
        Self {
            name: rejected.name.clone(),
            size: None,
            descriptor: DescriptorCheck::Invalid(rejected.reason.clone()),
        }
    }

    pub fn found(&self) -> bool {
        self.size.is_some()
    }

    /// Whether the type was neither found nor rejected.
    pub fn skipped(&self) -> bool {
        self.size.is_none() && !matches!(self.descriptor, DescriptorCheck::Invalid(_))
    }

    /// Number of failed checks.
    ///
    /// Plan sizes are not counted again (the type's size check already covers them).
    pub fn errors(&self) -> usize {
        let size = self.size.map_or(0, |check| usize::from(!check.passed()));
        let descriptor = match &self.descriptor {
            DescriptorCheck::NotRequested | DescriptorCheck::Skipped(_) => 0,
            DescriptorCheck::Invalid(_) => 1,
            DescriptorCheck::Compared {
                diff,
                extensibility,
            } => {
                usize::from(!diff.length_match)
                    + diff.mismatches.len()
                    + usize::from(extensibility.is_some())
            }
        };
        size + descriptor
    }
}

impl fmt::Display for TypeReport {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        let name = &self.name;
        let Some(size) = self.size else {
            return match &self.descriptor {
                DescriptorCheck::Invalid(reason) => writeln!(f, "[FAIL] {reason}"),
                _ => writeln!(f, "[SKIP] Type {name} not found"),
            };
        };
        match size.external {
            Some(external) if size.passed() => writeln!(f, "[PASS] sizeof({name}): {external}")?,
            Some(external) => writeln!(
                f,
                "[FAIL] sizeof({name}): native {} != external {external}",
                size.native
            )?,
            None => writeln!(f, "[FAIL] sizeof({name}): external size missing")?,
        }
        match &self.descriptor {
            DescriptorCheck::NotRequested => {}
            DescriptorCheck::Skipped(reason) => writeln!(f, "[SKIP] {reason}")?,
            DescriptorCheck::Invalid(reason) => writeln!(f, "[FAIL] {reason}")?,
            DescriptorCheck::Compared {
                diff,
                extensibility,
            } => {
                if let Some((native, external)) = extensibility {
                    writeln!(
                        f,
                        "[FAIL] Extensibility of {name}: native {native:?} != external {external:?}"
                    )?;
                }
                if diff.length_match {
                    writeln!(f, "[PASS] Ops Count: {}", diff.native_len)?;
                } else {
                    writeln!(
                        f,
                        "[FAIL] Ops Count: native {} != external {}",
                        diff.native_len, diff.external_len
                    )?;
                }
                for mismatch in &diff.mismatches {
                    writeln!(f, "[FAIL] {mismatch}")?;
                }
                if diff.length_match && diff.mismatches.is_empty() {
                    writeln!(f, "[PASS] All {} Opcodes match.", diff.native_len)?;
                }
            }
        }
        Ok(())
    }
}

/// Accumulated results of a verification run.
#[derive(Clone, Debug, Default, PartialEq, Eq)]
pub struct Report {
    pub types: Vec<TypeReport>,
}

impl Report {
    /// Sum of the errors of every type. Zero means full conformance.
    pub fn errors(&self) -> usize {
        self.types.iter().map(TypeReport::errors).sum()
    }

    pub fn passed(&self) -> bool {
        self.errors() == 0
    }

    pub fn skipped(&self) -> usize {
        self.types.iter().filter(|report| report.skipped()).count()
    }
}

impl fmt::Display for Report {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        for report in &self.types {
            write!(f, "{report}")?;
        }
        writeln!(
            f,
            "{} types, {} skipped, {} errors",
            self.types.len(),
            self.skipped(),
            self.errors()
        )
    }
}

/// Checks native types against a read-only external [Document].
pub struct Verifier<'a> {
    external: &'a Document,
}

impl<'a> Verifier<'a> {
    pub fn new(external: &'a Document) -> Self {
        Self { external }
    }

    /// Verify a single type.
    pub fn verify(&self, native: &NativeType) -> TypeReport {
        let name = native.name.as_str();
        let Some(definition) = self.external.find(name) else {
            debug!(name, "type not found");
            return TypeReport {
                name: name.to_string(),
                size: None,
                descriptor: DescriptorCheck::NotRequested,
            };
        };
        let size = SizeCheck {
            native: native.size,
            external: definition.size(),
        };
        let descriptor = match &native.plan {
            None => DescriptorCheck::NotRequested,
            Some(plan) => Self::compare(plan, definition),
        };
        let report = TypeReport {
            name: name.to_string(),
            size: Some(size),
            descriptor,
        };
        let errors = report.errors();
        if errors > 0 {
            warn!(name, errors, "type failed verification");
        } else {
            debug!(name, "type verified");
        }
        report
    }

    /// Verify every type in order.
    pub fn verify_all<'b>(&self, natives: impl IntoIterator<Item = &'b NativeType>) -> Report {
        Report {
            types: natives.into_iter().map(|native| self.verify(native)).collect(),
        }
    }

    /// Verify native entries in order, reporting each rejected entry as one failure.
    pub fn verify_entries<'b>(&self, entries: impl IntoIterator<Item = &'b NativeEntry>) -> Report {
        Report {
            types: entries
                .into_iter()
                .map(|entry| match entry {
                    Ok(native) => self.verify(native),
                    Err(rejected) => {
                        warn!(
                            name = rejected.name.as_str(),
                            reason = rejected.reason.as_str(),
                            "rejected native entry"
                        );
                        TypeReport::rejected(rejected)
                    }
                })
                .collect(),
        }
    }

    fn compare(plan: &SerializationPlan, definition: &TypeDefinition) -> DescriptorCheck {
        let ops = match definition.ops() {
            Ok(Some(ops)) => ops,
            Ok(None) => {
                return DescriptorCheck::Skipped(format!(
                    "TopicDescriptor missing for {}",
                    definition.name
                ))
            }
            Err(err) => return DescriptorCheck::Invalid(err.to_string()),
        };
        let external = SerializationPlan::new(ops, definition.size().unwrap_or_default());
        let native = plan.extensibility();
        let extensibility =
            (native != definition.extensibility).then_some((native, definition.extensibility));
        DescriptorCheck::Compared {
            diff: diff(plan, &external),
            extensibility,
        }
    }
}
