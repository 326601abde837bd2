//! Pin the output of sample generation across runs, processes and releases.
//!
//! Generation must be a pure function of the seed: the same seed yields the same sample in any
//! process, on any platform, in any release. This crate turns that property into a regression
//! test by hashing the commitments of many seeds and comparing the digest against a value stored
//! in a TOML file.
//!
//! # Commitments
//!
//! [Conformance] is implemented by anything that produces deterministic bytes from a seed. Every
//! [TypeHandler] commits to the encoding of the sample it generates.
//!
//! # Storage Format
//!
//! One hash per type:
//!
//! ```toml
//! ["AtomicTests::Int32Topic"]
//! n_cases = 256
//! hash = "abc123..."
//! ```
//!
//! The hash is the SHA-256 of the length-prefixed commitments of seeds `0..n_cases`.
//!
//! # Regeneration Mode
//!
//! Entries missing from the file are added. Existing entries are verified unless the run is in
//! [Mode::Regenerate], which [Mode::from_env] selects when `GENERATE_CONFORMANCE_TESTS` is set:
//!
//! ```bash
//! GENERATE_CONFORMANCE_TESTS=1 cargo test -p wireproof-conformance
//! ```

use core::future::Future;
use serde::{Deserialize, Serialize};
use sha2::{Digest, Sha256};
use std::{
    collections::BTreeMap,
    fmt::Write as _,
    fs,
    path::{Path, PathBuf},
};
use thiserror::Error;
use tracing::{debug, info};
use wireproof_fixture::{Registry, TypeHandler};

/// Default number of seeds hashed per type.
pub const DEFAULT_CASES: usize = 256;

/// Environment variable that switches [Mode::from_env] to [Mode::Regenerate].
pub const REGENERATE_ENV: &str = "GENERATE_CONFORMANCE_TESTS";

/// A seeded source of bytes whose output is pinned.
///
/// `commit` must return the same bytes for the same seed in every process and on every platform.
pub trait Conformance: Send + Sync {
    /// Bytes committed to by `seed`.
    fn commit(&self, seed: i64) -> impl Future<Output = Vec<u8>> + Send;
}

impl Conformance for TypeHandler {
    async fn commit(&self, seed: i64) -> Vec<u8> {
        self.generate(seed).encode()
    }
}

/// A conformance file containing pins for multiple types.
#[derive(Debug, Serialize, Deserialize, Default, PartialEq, Eq)]
#[serde(transparent)]
pub struct ConformanceFile {
    /// Pins indexed by type name.
    pub types: BTreeMap<String, TypeEntry>,
}

/// Pin of a single type.
#[derive(Debug, Serialize, Deserialize, Clone, PartialEq, Eq)]
pub struct TypeEntry {
    /// Number of seeds that were hashed together.
    pub n_cases: usize,
    /// Hex-encoded SHA-256 hash of all commitments.
    pub hash: String,
}

/// Errors that can occur when checking pins.
#[derive(Error, Debug)]
pub enum Error {
    #[error("failed to access {0}: {1}")]
    Io(PathBuf, #[source] std::io::Error),
    #[error("failed to parse {0}: {1}")]
    Parse(PathBuf, #[source] toml::de::Error),
    #[error("failed to serialize conformance file: {0}")]
    Serialize(#[from] toml::ser::Error),
    #[error("format change detected for {name}: expected {expected}, actual {actual}")]
    HashMismatch {
        name: String,
        expected: String,
        actual: String,
    },
    #[error("n_cases mismatch for {name}: expected {expected}, actual {actual}")]
    CasesMismatch {
        name: String,
        expected: usize,
        actual: usize,
    },
}

/// Whether existing pins are checked or overwritten.
#[derive(Clone, Copy, Debug, Default, PartialEq, Eq)]
pub enum Mode {
    #[default]
    Verify,
    Regenerate,
}

impl Mode {
    /// [Mode::Regenerate] if [REGENERATE_ENV] is set, else [Mode::Verify].
    pub fn from_env() -> Self {
        if std::env::var_os(REGENERATE_ENV).is_some() {
            Self::Regenerate
        } else {
            Self::Verify
        }
    }
}

/// What a check did to the file.
#[derive(Clone, Copy, Debug, PartialEq, Eq)]
pub enum Outcome {
    /// The pin matched.
    Verified,
    /// No pin existed and one was recorded.
    Added,
    /// The pin was overwritten.
    Regenerated,
}

impl ConformanceFile {
    /// Read and parse the pins stored at `path`.
    pub fn load(path: &Path) -> Result<Self, Error> {
        let contents = fs::read_to_string(path).map_err(|e| Error::Io(path.to_path_buf(), e))?;
        toml::from_str(&contents).map_err(|e| Error::Parse(path.to_path_buf(), e))
    }

    /// Like [ConformanceFile::load], but a missing file yields no pins.
    pub fn load_or_default(path: &Path) -> Result<Self, Error> {
        if path.exists() {
            Self::load(path)
        } else {
            Ok(Self::default())
        }
    }

    /// Write the file to the given path.
    pub fn save(&self, path: &Path) -> Result<(), Error> {
        let contents = toml::to_string_pretty(self)?;
        fs::write(path, contents).map_err(|e| Error::Io(path.to_path_buf(), e))
    }

    /// Check `hash` against the pin of `name`, recording it when missing (or when regenerating).
    pub fn check(
        &mut self,
        name: &str,
        n_cases: usize,
        hash: String,
        mode: Mode,
    ) -> Result<Outcome, Error> {
        let entry = TypeEntry { n_cases, hash };
        match (self.types.get(name), mode) {
            (None, _) => {
                self.types.insert(name.to_string(), entry);
                Ok(Outcome::Added)
            }
            (Some(_), Mode::Regenerate) => {
                self.types.insert(name.to_string(), entry);
                Ok(Outcome::Regenerated)
            }
            (Some(pinned), Mode::Verify) => {
                if pinned.hash != entry.hash {
                    return Err(Error::HashMismatch {
                        name: name.to_string(),
                        expected: pinned.hash.clone(),
                        actual: entry.hash,
                    });
                }
                if pinned.n_cases != n_cases {
                    return Err(Error::CasesMismatch {
                        name: name.to_string(),
                        expected: pinned.n_cases,
                        actual: n_cases,
                    });
                }
                Ok(Outcome::Verified)
            }
        }
    }
}

fn hex_encode(bytes: &[u8]) -> String {
    bytes
        .iter()
        .fold(String::with_capacity(bytes.len() * 2), |mut out, byte| {
            let _ = write!(out, "{byte:02x}");
            out
        })
}

/// Compute the conformance hash of `conformance` over seeds `0..n_cases`.
pub async fn compute_conformance_hash<C: Conformance>(conformance: &C, n_cases: usize) -> String {
    let mut digest = Sha256::new();
    for seed in 0..n_cases as i64 {
        let commitment = conformance.commit(seed).await;
        digest.update((commitment.len() as u64).to_le_bytes());
        digest.update(&commitment);
    }
    hex_encode(&digest.finalize())
}

/// Check a single type against the file at `path`, updating the file if anything was recorded.
pub async fn run_conformance_test<C: Conformance>(
    conformance: &C,
    name: &str,
    n_cases: usize,
    path: &Path,
    mode: Mode,
) -> Result<Outcome, Error> {
    // Hash before touching the file
    let hash = compute_conformance_hash(conformance, n_cases).await;

    let mut file = ConformanceFile::load_or_default(path)?;
    let outcome = file.check(name, n_cases, hash, mode)?;
    if outcome != Outcome::Verified {
        file.save(path)?;
    }
    debug!(name, ?outcome, "conformance checked");
    Ok(outcome)
}

/// Check every type of `registry` against the file at `path`.
///
/// Every type is checked before the first failure is returned, and recorded pins are written
/// even if some type failed.
pub async fn run_registry(
    registry: &Registry,
    n_cases: usize,
    path: &Path,
    mode: Mode,
) -> Result<Vec<(String, Outcome)>, Error> {
    let mut file = ConformanceFile::load_or_default(path)?;
    let mut outcomes = Vec::with_capacity(registry.len());
    let mut failure = None;
    for handler in registry.handlers() {
        let hash = compute_conformance_hash(handler, n_cases).await;
        match file.check(handler.name(), n_cases, hash, mode) {
            Ok(outcome) => outcomes.push((handler.name().to_string(), outcome)),
            Err(err) => {
                failure.get_or_insert(err);
            }
        }
    }
    if outcomes.iter().any(|(_, outcome)| *outcome != Outcome::Verified) {
        file.save(path)?;
    }
    if let Some(err) = failure {
        return Err(err);
    }
    info!(types = outcomes.len(), n_cases, "conformance verified");
    Ok(outcomes)
}
