//! Verify native type layouts and serialization plans against an external description.
//!
//! Native types come either from a native description document (full plans) or, when none is
//! given, from the built-in [wireproof_fixture::catalog] (sizes only). Every type is looked up in
//! the external document and checked with [Verifier]; the resulting error count is the exit status
//! of `wireproof-verify`.
//!
//! # Status
//!
//! `wireproof-verify` is **ALPHA** software and is not yet recommended for production use.
//! Developers should expect breaking changes and occasional instability.

use std::path::PathBuf;
use thiserror::Error;
use tracing::info;
use wireproof_descriptor::{Document, NativeEntry, NativeType, Report, Verifier};
use wireproof_fixture::{catalog, Registry};

/// Errors that prevent a verification run from starting.
#[derive(Error, Debug)]
pub enum Error {
    #[error("descriptor error: {0}")]
    Descriptor(#[from] wireproof_descriptor::Error),
    #[error("fixture error: {0}")]
    Fixture(#[from] wireproof_fixture::Error),
    #[error("unknown native type: {0}")]
    UnknownType(String),
}

/// Configuration of a verification run.
#[derive(Clone, Debug, Default)]
pub struct Config {
    /// External description to verify against.
    pub external: PathBuf,
    /// Native description. When absent, the built-in catalog is verified (sizes only).
    pub native: Option<PathBuf>,
    /// Restrict the run to these types (all when empty).
    pub types: Vec<String>,
}

/// Native types of the built-in catalog.
pub fn catalog_types(registry: &Registry, types: &[String]) -> Result<Vec<NativeType>, Error> {
    let handlers = if types.is_empty() {
        registry.handlers().collect::<Vec<_>>()
    } else {
        types
            .iter()
            .map(|name| registry.get(name))
            .collect::<Result<Vec<_>, _>>()?
    };
    Ok(handlers
        .into_iter()
        .map(|handler| {
            let native = NativeType::new(handler.name(), handler.size_of());
            match handler.plan() {
                Some(plan) => native.with_plan(plan.clone()),
                None => native,
            }
        })
        .collect())
}

/// Native entries of a native description document.
///
/// An entry that cannot be read is kept as a rejected entry so the rest of the run continues.
/// Only a selected name the document does not contain is an error.
pub fn document_types(document: &Document, types: &[String]) -> Result<Vec<NativeEntry>, Error> {
    if types.is_empty() {
        return Ok(NativeType::from_document(document));
    }
    types
        .iter()
        .map(|name| {
            document
                .find(name)
                .map(NativeType::from_entry)
                .ok_or_else(|| Error::UnknownType(name.clone()))
        })
        .collect()
}

/// Load both sides and verify every selected native type.
pub fn run(config: &Config) -> Result<Report, Error> {
    let external = Document::load(&config.external)?;
    let entries = match &config.native {
        Some(path) => document_types(&Document::load(path)?, &config.types)?,
        None => catalog_types(&catalog::atomic(), &config.types)?
            .into_iter()
            .map(Ok)
            .collect(),
    };
    info!(
        types = entries.len(),
        external = ?config.external,
        "verifying types"
    );
    Ok(Verifier::new(&external).verify_entries(&entries))
}

/// Process exit status for an error count.
///
/// Saturates so that a positive count can never wrap to zero.
pub fn exit_status(errors: usize) -> u8 {
    u8::try_from(errors).unwrap_or(u8::MAX)
}
