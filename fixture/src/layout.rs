//! Native (C ABI, 64-bit) memory layout of constructs.
//!
//! The layout mirrors what a C compiler produces for the structures emitted by the native
//! schema pipeline:
//!
//! * strings are `char *`, bounded strings are `char[N + 1]`
//! * sequences are `{ uint32_t _maximum; uint32_t _length; T *_buffer; bool _release; }`
//! * enums are 32-bit
//! * unions are `{ D _d; union { ... } _u; }`
//! * optional members are pointers

use crate::construct::{Construct, Primitive};

const POINTER: Layout = Layout::new(8, 8);
const SEQUENCE: Layout = Layout::new(24, 8);
const ENUM: Layout = Layout::new(4, 4);

/// Size and alignment of a construct in bytes.
#[derive(Clone, Copy, Debug, PartialEq, Eq)]
pub struct Layout {
    pub size: usize,
    pub align: usize,
}

impl Layout {
    pub const fn new(size: usize, align: usize) -> Self {
        Self { size, align }
    }

    const fn primitive(kind: Primitive) -> Self {
        let width = kind.width();
        Self::new(width, width)
    }

    /// Lay out `members` in order, padding each to its alignment and the whole to the largest
    /// alignment.
    fn sequential(members: impl IntoIterator<Item = Layout>) -> Self {
        let mut size = 0;
        let mut align = 1;
        for member in members {
            size = align_up(size, member.align) + member.size;
            align = align.max(member.align);
        }
        Self::new(align_up(size, align), align)
    }

    /// Overlay `members`, as a C `union` does.
    fn overlay(members: impl IntoIterator<Item = Layout>) -> Self {
        let mut size = 0;
        let mut align = 1;
        for member in members {
            size = size.max(member.size);
            align = align.max(member.align);
        }
        Self::new(align_up(size, align), align)
    }
}

const fn align_up(offset: usize, align: usize) -> usize {
    offset.div_ceil(align) * align
}

impl Construct {
    /// Native layout of the construct.
    pub fn layout(&self) -> Layout {
        match self {
            Self::Primitive { kind, .. } => Layout::primitive(*kind),
            Self::String { bound: None, .. } => POINTER,
            Self::String {
                bound: Some(bound), ..
            } => Layout::new(bound + 1, 1),
            Self::Enum { .. } => ENUM,
            Self::Array { element, dims } => {
                let element = element.layout();
                let count: usize = dims.iter().product();
                Layout::new(element.size * count, element.align)
            }
            Self::Sequence { .. } => SEQUENCE,
            Self::Union {
                discriminant,
                cases,
                ..
            } => {
                let body = Layout::overlay(cases.iter().map(|case| case.construct.layout()));
                Layout::sequential([discriminant.layout(), body])
            }
            Self::Struct { fields, .. } => {
                Layout::sequential(fields.iter().map(|field| field.construct.layout()))
            }
            Self::Optional { .. } => POINTER,
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::{Case, Field, Length, Parity, Scalar};

    fn int32() -> Construct {
        Construct::primitive(Primitive::Int32, Scalar::IDENTITY)
    }

    fn float64() -> Construct {
        Construct::primitive(Primitive::Float64, Scalar::IDENTITY)
    }

    #[test]
    fn test_struct_padding() {
        let construct = Construct::structure(
            "Padded",
            vec![
                Field::new("a", Construct::primitive(Primitive::Octet, Scalar::IDENTITY)),
                Field::new("b", float64()),
                Field::new("c", Construct::primitive(Primitive::Int16, Scalar::IDENTITY)),
            ],
        );
        assert_eq!(construct.layout(), Layout::new(24, 8));
    }

    #[test]
    fn test_strings() {
        assert_eq!(Construct::string("x").layout(), Layout::new(8, 8));
        assert_eq!(Construct::bounded_string(32, "x").layout(), Layout::new(33, 1));
        let topic = Construct::structure(
            "StringBounded32Topic",
            vec![Field::key("id", int32()), Field::new("value", Construct::bounded_string(32, "x"))],
        );
        assert_eq!(topic.layout(), Layout::new(40, 4));
    }

    #[test]
    fn test_sequence_and_array() {
        let sequence = Construct::sequence(int32(), Length::Fixed(1));
        assert_eq!(sequence.layout(), Layout::new(24, 8));
        let cube = Construct::array(int32(), &[2, 3, 4]);
        assert_eq!(cube.layout(), Layout::new(96, 4));
    }

    #[test]
    fn test_union() {
        let union = Construct::union(
            "SimpleUnion",
            int32(),
            vec![
                Case::new(1, "int_value", int32()),
                Case::new(2, "double_value", float64()),
                Case::new(3, "string_value", Construct::string("x")),
            ],
        );
        assert_eq!(union.layout(), Layout::new(16, 8));
        let topic = Construct::structure(
            "UnionLongDiscTopic",
            vec![Field::key("id", int32()), Field::new("data", union)],
        );
        assert_eq!(topic.layout(), Layout::new(24, 8));
    }

    #[test]
    fn test_optional() {
        let topic = Construct::structure(
            "OptionalInt32Topic",
            vec![
                Field::key("id", int32()),
                Field::new("opt_value", Construct::optional(int32(), Parity::Even)),
            ],
        );
        assert_eq!(topic.layout(), Layout::new(16, 8));
    }
}
