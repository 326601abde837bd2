//! Decode serialization opcodes for diagnostics.
//!
//! An instruction word packs the operation in bits 24..32, the wire type of the member in bits
//! 16..23 and, for `ADR`, member flags in the low bits. Words following an instruction (offsets,
//! sizes, jump targets) are plain data and decode as whatever their bits happen to spell.

use std::fmt;

/// Mask of the operation bits.
pub const OP_MASK: u32 = 0xff00_0000;

/// Mask of the wire type bits.
pub const TYPE_MASK: u32 = 0x007f_0000;

/// Mask of the member flag bits of an `ADR` instruction.
pub const FLAG_MASK: u32 = 0x0000_007f;

pub const OP_RTS: u32 = 0x00 << 24;
pub const OP_ADR: u32 = 0x01 << 24;
pub const OP_JSR: u32 = 0x02 << 24;
pub const OP_JEQ: u32 = 0x03 << 24;
pub const OP_DLC: u32 = 0x04 << 24;
pub const OP_PLC: u32 = 0x05 << 24;
pub const OP_PLM: u32 = 0x06 << 24;
pub const OP_KOF: u32 = 0x07 << 24;
pub const OP_JEQ4: u32 = 0x08 << 24;

pub const TYPE_1BY: u32 = 0x01 << 16;
pub const TYPE_2BY: u32 = 0x02 << 16;
pub const TYPE_4BY: u32 = 0x03 << 16;
pub const TYPE_8BY: u32 = 0x04 << 16;
pub const TYPE_STR: u32 = 0x05 << 16;
pub const TYPE_BST: u32 = 0x06 << 16;
pub const TYPE_SEQ: u32 = 0x07 << 16;
pub const TYPE_ARR: u32 = 0x08 << 16;
pub const TYPE_UNI: u32 = 0x09 << 16;
pub const TYPE_STU: u32 = 0x0a << 16;
pub const TYPE_BSQ: u32 = 0x0b << 16;
pub const TYPE_ENU: u32 = 0x0c << 16;
pub const TYPE_EXT: u32 = 0x0d << 16;
pub const TYPE_BLN: u32 = 0x0e << 16;
pub const TYPE_BMK: u32 = 0x0f << 16;

pub const FLAG_KEY: u32 = 0x01;
pub const FLAG_DEF: u32 = 0x02;
pub const FLAG_SGN: u32 = 0x04;
pub const FLAG_FP: u32 = 0x08;
pub const FLAG_EXT: u32 = 0x10;
pub const FLAG_OPT: u32 = 0x20;
pub const FLAG_MU: u32 = 0x40;

const OPS: [(u32, &str); 9] = [
    (OP_RTS, "RTS"),
    (OP_ADR, "ADR"),
    (OP_JSR, "JSR"),
    (OP_JEQ, "JEQ"),
    (OP_DLC, "DLC"),
    (OP_PLC, "PLC"),
    (OP_PLM, "PLM"),
    (OP_KOF, "KOF"),
    (OP_JEQ4, "JEQ4"),
];

const TYPES: [(u32, &str); 15] = [
    (TYPE_1BY, "1BY"),
    (TYPE_2BY, "2BY"),
    (TYPE_4BY, "4BY"),
    (TYPE_8BY, "8BY"),
    (TYPE_STR, "STR"),
    (TYPE_BST, "BST"),
    (TYPE_SEQ, "SEQ"),
    (TYPE_ARR, "ARR"),
    (TYPE_UNI, "UNI"),
    (TYPE_STU, "STU"),
    (TYPE_BSQ, "BSQ"),
    (TYPE_ENU, "ENU"),
    (TYPE_EXT, "EXT"),
    (TYPE_BLN, "BLN"),
    (TYPE_BMK, "BMK"),
];

const FLAGS: [(u32, &str); 7] = [
    (FLAG_KEY, "KEY"),
    (FLAG_DEF, "DEF"),
    (FLAG_SGN, "SGN"),
    (FLAG_FP, "FP"),
    (FLAG_EXT, "EXT"),
    (FLAG_OPT, "OPT"),
    (FLAG_MU, "MU"),
];

fn name(table: &[(u32, &'static str)], bits: u32) -> Option<&'static str> {
    table
        .iter()
        .find(|(value, _)| *value == bits)
        .map(|(_, name)| *name)
}

/// A single word of a serialization plan.
#[derive(Clone, Copy, Debug, PartialEq, Eq, Hash)]
pub struct Opcode(pub u32);

impl Opcode {
    pub const fn op(self) -> u32 {
        self.0 & OP_MASK
    }

    pub const fn wire_type(self) -> u32 {
        self.0 & TYPE_MASK
    }

    pub const fn flags(self) -> u32 {
        self.0 & FLAG_MASK
    }

    pub const fn is_key(self) -> bool {
        self.op() == OP_ADR && self.flags() & FLAG_KEY != 0
    }

    /// Mnemonic of the operation, if known.
    pub fn op_name(self) -> Option<&'static str> {
        name(&OPS, self.op())
    }

    /// Mnemonic of the wire type, if known.
    pub fn type_name(self) -> Option<&'static str> {
        name(&TYPES, self.wire_type())
    }

    /// Mnemonics of the set member flags.
    pub fn flag_names(self) -> Vec<&'static str> {
        FLAGS
            .iter()
            .filter(|(flag, _)| self.0 & flag != 0)
            .map(|(_, name)| *name)
            .collect()
    }
}

impl From<u32> for Opcode {
    fn from(value: u32) -> Self {
        Self(value)
    }
}

impl fmt::Display for Opcode {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "0x{:08x}", self.0)?;
        if self.0 == 0 {
            return f.write_str(" (RTS)");
        }
        let Some(op) = self.op_name() else {
            return Ok(());
        };
        if self.op() == OP_RTS {
            // Plain data word
            return Ok(());
        }
        let mut parts = vec![op];
        if self.op() == OP_ADR {
            parts.extend(self.type_name());
            parts.extend(self.flag_names());
        }
        write!(f, " ({})", parts.join("|"))
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use test_case::test_case;

    #[test_case(OP_ADR | TYPE_4BY | FLAG_KEY, "0x01030001 (ADR|4BY|KEY)")]
    #[test_case(OP_ADR | TYPE_8BY | FLAG_FP, "0x01040008 (ADR|8BY|FP)")]
    #[test_case(OP_ADR | TYPE_4BY | FLAG_SGN | FLAG_KEY, "0x01030005 (ADR|4BY|KEY|SGN)")]
    #[test_case(OP_DLC, "0x04000000 (DLC)")]
    #[test_case(0, "0x00000000 (RTS)")]
    #[test_case(8, "0x00000008")]
    #[test_case(0xff00_0000, "0xff000000")]
    fn test_display(word: u32, expected: &str) {
        assert_eq!(Opcode(word).to_string(), expected);
    }

    #[test]
    fn test_decode() {
        let opcode = Opcode(0x0110_0001);
        assert_eq!(opcode.op(), OP_ADR);
        assert_eq!(opcode.wire_type(), 0x0010_0000);
        assert_eq!(opcode.type_name(), None);
        assert!(opcode.is_key());
        assert!(!Opcode(OP_JEQ | FLAG_KEY).is_key());
    }
}
