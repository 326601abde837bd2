//! Generate and validate deterministic samples of structured-message schemas.
//!
//! A schema type is described as a tree of [Construct]s. Every leaf of that tree carries the
//! rule that maps a seed to its value, so a single description is enough to both synthesize a
//! [Sample] from a seed and decide whether some received [Sample] is exactly what that seed
//! implies.
//!
//! # Overview
//!
//! * [Construct]: primitives, bounded and unbounded strings, fixed (multi-dimensional) arrays,
//!   sequences, enums, unions, structs and optional fields.
//! * [TypeHandler]: a named construct with its native size and (optionally) its compiled
//!   serialization plan.
//! * [Builder] and [Registry]: register handlers once, then share the frozen registry with any
//!   number of readers.
//! * [catalog]: the built-in `AtomicTests` suite.
//!
//! # Determinism
//!
//! Generation is a pure, total function of the seed. Integral rules use wrapping arithmetic and
//! are truncated to the width of their kind, modular rules use the euclidean remainder (so
//! negative seeds still land inside the legal domain), and floating point rules are evaluated in
//! the precision of their kind.
//!
//! # Status
//!
//! `wireproof-fixture` is **ALPHA** software and is not yet recommended for production use.
//! Developers should expect breaking changes and occasional instability.

use thiserror::Error;

pub mod catalog;
mod construct;
pub use construct::{Case, Construct, Extensibility, Field, Mismatch, Primitive};
mod handler;
pub use handler::{TypeHandler, Verification};
mod layout;
pub use layout::Layout;
mod registry;
pub use registry::{strip_namespace, Builder, Registry};
mod rule;
pub use rule::{Cursor, Length, Parity, Scalar, Text, F32_TOLERANCE, F64_TOLERANCE};
mod value;
pub use value::{Sample, Value};

/// Errors that can occur when registering or resolving types.
#[derive(Error, Debug, PartialEq, Eq)]
pub enum Error {
    #[error("duplicate type: {0}")]
    DuplicateType(String),
    #[error("unknown type: {0}")]
    UnknownType(String),
}
