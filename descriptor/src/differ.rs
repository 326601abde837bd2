use crate::{opcode::Opcode, plan::SerializationPlan};
use std::fmt;

/// Opcode that differs between two plans.
#[derive(Clone, Copy, Debug, PartialEq, Eq)]
pub struct OpMismatch {
    pub index: usize,
    pub native: u32,
    pub external: u32,
}

impl fmt::Display for OpMismatch {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(
            f,
            "Opcode[{}]: native {} != external {}",
            self.index,
            Opcode(self.native),
            Opcode(self.external)
        )
    }
}

/// Every discrepancy between a native and an external plan.
///
/// The size check and the opcode checks are independent.
#[derive(Clone, Debug, PartialEq, Eq)]
pub struct Diff {
    pub size_match: bool,
    pub length_match: bool,
    /// Differing opcodes (up to the shorter plan), in index order.
    pub mismatches: Vec<OpMismatch>,
    pub native_size: usize,
    pub external_size: usize,
    pub native_len: usize,
    pub external_len: usize,
}

impl Diff {
    pub fn passed(&self) -> bool {
        self.size_match && self.length_match && self.mismatches.is_empty()
    }

    /// Number of failed checks (each differing opcode counts once).
    pub fn errors(&self) -> usize {
        !self.size_match as usize + !self.length_match as usize + self.mismatches.len()
    }
}

/// Compare `native` against `external` without stopping at the first difference.
pub fn diff(native: &SerializationPlan, external: &SerializationPlan) -> Diff {
    let mismatches = native
        .ops()
        .iter()
        .zip(external.ops())
        .enumerate()
        .filter(|(_, (native, external))| native != external)
        .map(|(index, (&native, &external))| OpMismatch {
            index,
            native,
            external,
        })
        .collect();
    Diff {
        size_match: native.size() == external.size(),
        length_match: native.len() == external.len(),
        mismatches,
        native_size: native.size(),
        external_size: external.size(),
        native_len: native.len(),
        external_len: external.len(),
    }
}
