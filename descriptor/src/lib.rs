//! Diff native and external serialization plans opcode-for-opcode.
//!
//! A [SerializationPlan] is the ordered opcode program (plus native byte size) a compiler emits to
//! marshal a type. Two independently produced plans for the same type are equivalent iff their
//! sizes and opcode sequences match exactly. [diff] compares one pair and surfaces every
//! discrepancy at once, while [Verifier] walks a set of native types against an external
//! [Document] and accumulates a [Report] whose error count is the process exit status of a
//! verification run.
//!
//! # Status
//!
//! `wireproof-descriptor` is **ALPHA** software and is not yet recommended for production use.
//! Developers should expect breaking changes and occasional instability.

use std::path::PathBuf;
use thiserror::Error;

mod differ;
pub use differ::{diff, Diff, OpMismatch};
mod document;
pub use document::{strip_namespace, Document, KeyDescriptor, TopicDescriptor, TypeDefinition};
pub mod opcode;
pub use opcode::Opcode;
mod plan;
pub use plan::{Extensibility, SerializationPlan};
mod verifier;
pub use verifier::{
    DescriptorCheck, NativeEntry, NativeType, Rejected, Report, SizeCheck, TypeReport, Verifier,
};

/// Errors that can occur when loading descriptions.
#[derive(Error, Debug)]
pub enum Error {
    #[error("failed to read {0}: {1}")]
    Io(PathBuf, #[source] std::io::Error),
    #[error("failed to parse {0}: {1}")]
    Parse(PathBuf, #[source] serde_json::Error),
    #[error("invalid document: {0}")]
    Invalid(#[from] serde_json::Error),
    #[error("opcode {value} at index {index} of {name} is not a 32-bit word")]
    InvalidOpcode {
        name: String,
        index: usize,
        value: i64,
    },
    #[error("missing ops for type: {0}")]
    MissingOps(String),
    #[error("missing size for type: {0}")]
    MissingSize(String),
}
