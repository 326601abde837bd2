use crate::opcode::{Opcode, OP_DLC, OP_PLC};
use serde::{Deserialize, Serialize};

/// Whether (and how) a type's wire layout may evolve.
///
/// Extensibility only changes the serialization plan of a type, never the values it holds.
#[derive(Clone, Copy, Debug, Default, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum Extensibility {
    #[default]
    Final,
    Appendable,
    Mutable,
}

/// Ordered opcode program that marshals a type, plus the type's native size in bytes.
#[derive(Clone, Debug, PartialEq, Eq)]
pub struct SerializationPlan {
    ops: Vec<u32>,
    size: usize,
}

impl SerializationPlan {
    pub fn new(ops: Vec<u32>, size: usize) -> Self {
        Self { ops, size }
    }

    pub fn ops(&self) -> &[u32] {
        &self.ops
    }

    pub fn size(&self) -> usize {
        self.size
    }

    pub fn len(&self) -> usize {
        self.ops.len()
    }

    pub fn is_empty(&self) -> bool {
        self.ops.is_empty()
    }

    pub fn opcodes(&self) -> impl Iterator<Item = Opcode> + '_ {
        self.ops.iter().copied().map(Opcode)
    }

    /// Extensibility implied by the header instruction.
    ///
    /// Appendable types start with a delimited-CDR header (`DLC`), mutable types with a
    /// parameter-list header (`PLC`).
    pub fn extensibility(&self) -> Extensibility {
        match self.opcodes().next().map(Opcode::op) {
            Some(OP_DLC) => Extensibility::Appendable,
            Some(OP_PLC) => Extensibility::Mutable,
            _ => Extensibility::Final,
        }
    }

    /// Number of key members (`ADR` instructions flagged `KEY`).
    pub fn keys(&self) -> usize {
        self.opcodes().filter(|op| op.is_key()).count()
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::opcode::{FLAG_KEY, OP_ADR, OP_RTS, TYPE_4BY};

    #[test]
    fn test_extensibility() {
        let adr = OP_ADR | TYPE_4BY | FLAG_KEY;
        let plan = SerializationPlan::new(vec![adr, 0, OP_RTS], 4);
        assert_eq!(plan.extensibility(), Extensibility::Final);
        assert_eq!(plan.keys(), 1);

        let plan = SerializationPlan::new(vec![OP_DLC, adr, 0, OP_RTS], 4);
        assert_eq!(plan.extensibility(), Extensibility::Appendable);

        let plan = SerializationPlan::new(vec![OP_PLC, OP_RTS], 4);
        assert_eq!(plan.extensibility(), Extensibility::Mutable);

        assert_eq!(SerializationPlan::new(Vec::new(), 0).extensibility(), Extensibility::Final);
    }

    #[test]
    fn test_extensibility_serde() {
        let kind: Extensibility = serde_json::from_str("\"appendable\"").unwrap();
        assert_eq!(kind, Extensibility::Appendable);
        assert_eq!(serde_json::to_string(&Extensibility::Mutable).unwrap(), "\"mutable\"");
    }
}
