//! Schema constructs and the seed-driven generation/comparison they define.

use crate::{
    rule::{Cursor, Length, Parity, Scalar, Text},
    value::Value,
};
use thiserror::Error;
pub use wireproof_descriptor::Extensibility;

/// Primitive kinds.
#[derive(Clone, Copy, Debug, PartialEq, Eq, Hash)]
pub enum Primitive {
    Bool,
    Char,
    Octet,
    Int16,
    UInt16,
    Int32,
    UInt32,
    Int64,
    UInt64,
    Float32,
    Float64,
}

impl Primitive {
    /// Size (and alignment) of the kind in bytes.
    pub const fn width(self) -> usize {
        match self {
            Self::Bool | Self::Char | Self::Octet => 1,
            Self::Int16 | Self::UInt16 => 2,
            Self::Int32 | Self::UInt32 | Self::Float32 => 4,
            Self::Int64 | Self::UInt64 | Self::Float64 => 8,
        }
    }

    /// Evaluate `rule` at `value`, truncated to the width and signedness of the kind.
    pub fn evaluate(self, rule: &Scalar, value: i64) -> Value {
        match self {
            Self::Bool => Value::Bool(rule.boolean(value)),
            Self::Char => Value::Char(rule.integer(value) as u8),
            Self::Octet => Value::Octet(rule.integer(value) as u8),
            Self::Int16 => Value::I16(rule.integer(value) as i16),
            Self::UInt16 => Value::U16(rule.integer(value) as u16),
            Self::Int32 => Value::I32(rule.integer(value) as i32),
            Self::UInt32 => Value::U32(rule.integer(value) as u32),
            Self::Int64 => Value::I64(rule.integer(value)),
            Self::UInt64 => Value::U64(rule.integer(value) as u64),
            Self::Float32 => Value::F32(rule.single(value)),
            Self::Float64 => Value::F64(rule.double(value)),
        }
    }
}

/// Member of a struct.
#[derive(Clone, Debug, PartialEq)]
pub struct Field {
    pub name: String,
    /// Whether the field is part of the type's key.
    pub key: bool,
    pub construct: Construct,
}

impl Field {
    pub fn new(name: impl Into<String>, construct: Construct) -> Self {
        Self {
            name: name.into(),
            key: false,
            construct,
        }
    }

    pub fn key(name: impl Into<String>, construct: Construct) -> Self {
        Self {
            name: name.into(),
            key: true,
            construct,
        }
    }
}

/// Branch of a union, selected when the discriminant equals `label`.
#[derive(Clone, Debug, PartialEq)]
pub struct Case {
    pub label: i64,
    pub name: String,
    pub construct: Construct,
}

impl Case {
    pub fn new(label: i64, name: impl Into<String>, construct: Construct) -> Self {
        Self {
            label,
            name: name.into(),
            construct,
        }
    }
}

/// Node of a schema's type grammar, carrying the rules that derive its value from a seed.
#[derive(Clone, Debug, PartialEq)]
pub enum Construct {
    Primitive {
        kind: Primitive,
        rule: Scalar,
    },
    /// String, bounded to `bound` bytes when set.
    String {
        bound: Option<usize>,
        rule: Text,
    },
    /// Enum whose ordinal is `rule` reduced modulo the number of variants.
    Enum {
        name: String,
        variants: Vec<String>,
        rule: Scalar,
    },
    /// Fixed array with one entry in `dims` per dimension.
    Array {
        element: Box<Construct>,
        dims: Vec<usize>,
    },
    /// Sequence, bounded to `bound` elements when set.
    Sequence {
        element: Box<Construct>,
        bound: Option<usize>,
        length: Length,
    },
    /// Union switching on a primitive or enum discriminant.
    Union {
        name: String,
        discriminant: Box<Construct>,
        cases: Vec<Case>,
    },
    Struct {
        name: String,
        fields: Vec<Field>,
        extensibility: Extensibility,
    },
    /// Optional member, present when the cursor has the given parity.
    Optional {
        inner: Box<Construct>,
        presence: Parity,
    },
}

impl Construct {
    pub fn primitive(kind: Primitive, rule: Scalar) -> Self {
        Self::Primitive { kind, rule }
    }

    pub fn string(template: &str) -> Self {
        Self::String {
            bound: None,
            rule: Text::new(template),
        }
    }

    pub fn bounded_string(bound: usize, template: &str) -> Self {
        Self::String {
            bound: Some(bound),
            rule: Text::new(template),
        }
    }

    pub fn enumeration(name: &str, variants: &[&str], rule: Scalar) -> Self {
        Self::Enum {
            name: name.to_string(),
            variants: variants.iter().map(|v| v.to_string()).collect(),
            rule,
        }
    }

    pub fn array(element: Construct, dims: &[usize]) -> Self {
        Self::Array {
            element: Box::new(element),
            dims: dims.to_vec(),
        }
    }

    pub fn sequence(element: Construct, length: Length) -> Self {
        Self::Sequence {
            element: Box::new(element),
            bound: None,
            length,
        }
    }

    pub fn bounded_sequence(element: Construct, bound: usize, length: Length) -> Self {
        Self::Sequence {
            element: Box::new(element),
            bound: Some(bound),
            length,
        }
    }

    pub fn union(name: &str, discriminant: Construct, cases: Vec<Case>) -> Self {
        Self::Union {
            name: name.to_string(),
            discriminant: Box::new(discriminant),
            cases,
        }
    }

    pub fn structure(name: &str, fields: Vec<Field>) -> Self {
        Self::Struct {
            name: name.to_string(),
            fields,
            extensibility: Extensibility::Final,
        }
    }

    pub fn optional(inner: Construct, presence: Parity) -> Self {
        Self::Optional {
            inner: Box::new(inner),
            presence,
        }
    }

    /// Replace the extensibility of a struct (other constructs are returned unchanged).
    pub fn with_extensibility(mut self, kind: Extensibility) -> Self {
        if let Self::Struct { extensibility, .. } = &mut self {
            *extensibility = kind;
        }
        self
    }

    /// Extensibility of a struct ([Extensibility::Final] for every other construct).
    pub fn extensibility(&self) -> Extensibility {
        match self {
            Self::Struct { extensibility, .. } => *extensibility,
            _ => Extensibility::Final,
        }
    }

    /// Generate the value implied by `cursor`.
    ///
    /// Generation is total: every seed produces a value.
    pub fn generate(&self, cursor: Cursor) -> Value {
        match self {
            Self::Primitive { kind, rule } => kind.evaluate(rule, cursor.value()),
            Self::String { bound, rule } => Value::String(rule.render(cursor, *bound)),
            Self::Enum { variants, rule, .. } => {
                let ordinal = rule
                    .integer(cursor.value())
                    .checked_rem_euclid(variants.len() as i64)
                    .unwrap_or(0);
                Value::Enum(ordinal as u32)
            }
            Self::Array { element, dims } => {
                let count = dims.iter().product();
                Value::Array(
                    (0..count)
                        .map(|i| element.generate(cursor.at(i)))
                        .collect(),
                )
            }
            Self::Sequence {
                element,
                bound,
                length,
            } => {
                let mut count = length.evaluate(cursor.value());
                if let Some(bound) = bound {
                    count = count.min(*bound);
                }
                Value::Sequence(
                    (0..count)
                        .map(|i| element.generate(cursor.at(i)))
                        .collect(),
                )
            }
            Self::Union {
                discriminant,
                cases,
                ..
            } => {
                let discriminant = discriminant.generate(cursor);
                let payload = select(cases, &discriminant)
                    .map(|case| Box::new(case.construct.generate(cursor)));
                Value::Union {
                    discriminant: Box::new(discriminant),
                    payload,
                }
            }
            Self::Struct { fields, .. } => Value::Struct(
                fields
                    .iter()
                    .map(|field| field.construct.generate(cursor))
                    .collect(),
            ),
            Self::Optional { inner, presence } => Value::Optional(
                presence
                    .holds(cursor.value())
                    .then(|| Box::new(inner.generate(cursor))),
            ),
        }
    }

    /// Compare `actual` against `expected`, both interpreted as this construct.
    ///
    /// Returns the first difference found, located by a dotted path. A shape that does not fit
    /// the construct (wrong kind, wrong length, missing payload) is reported as a difference.
    pub fn compare(&self, expected: &Value, actual: &Value) -> Result<(), Mismatch> {
        self.compare_at("", expected, actual, Filter::All)
    }

    /// Like [Construct::compare], but only key fields of a top-level struct are compared.
    pub fn compare_keys(&self, expected: &Value, actual: &Value) -> Result<(), Mismatch> {
        self.compare_at("", expected, actual, Filter::Keys)
    }

    fn compare_at(
        &self,
        path: &str,
        expected: &Value,
        actual: &Value,
        filter: Filter,
    ) -> Result<(), Mismatch> {
        match (self, expected, actual) {
            (Self::Array { element, .. }, Value::Array(e), Value::Array(a))
            | (Self::Sequence { element, .. }, Value::Sequence(e), Value::Sequence(a)) => {
                if e.len() != a.len() {
                    return Err(Mismatch::new(join(path, "len"), e.len(), a.len()));
                }
                for (i, (e, a)) in e.iter().zip(a).enumerate() {
                    element.compare_at(&format!("{path}[{i}]"), e, a, Filter::All)?;
                }
                Ok(())
            }
            (Self::Struct { fields, .. }, Value::Struct(e), Value::Struct(a)) => {
                if e.len() != a.len() || e.len() != fields.len() {
                    return Err(Mismatch::new(join(path, "fields"), e.len(), a.len()));
                }
                for ((field, e), a) in fields.iter().zip(e).zip(a) {
                    if filter == Filter::Keys && !field.key {
                        continue;
                    }
                    field
                        .construct
                        .compare_at(&join(path, &field.name), e, a, Filter::All)?;
                }
                Ok(())
            }
            (
                Self::Union {
                    discriminant,
                    cases,
                    ..
                },
                Value::Union {
                    discriminant: expected_discriminant,
                    payload: expected_payload,
                },
                Value::Union {
                    discriminant: actual_discriminant,
                    payload: actual_payload,
                },
            ) => {
                // The expected discriminant selects the case
                discriminant.compare_at(
                    &join(path, "_d"),
                    expected_discriminant,
                    actual_discriminant,
                    Filter::All,
                )?;
                let case = select(cases, expected_discriminant);
                match (expected_payload, actual_payload) {
                    (None, None) => Ok(()),
                    (Some(e), Some(a)) => match case {
                        Some(case) => {
                            case.construct
                                .compare_at(&join(path, &case.name), e, a, Filter::All)
                        }
                        None => Err(Mismatch::new(join(path, "_u"), "no case", a)),
                    },
                    (e, a) => Err(Mismatch::new(
                        join(path, "_u"),
                        describe(e.as_deref()),
                        describe(a.as_deref()),
                    )),
                }
            }
            (Self::Optional { inner, .. }, Value::Optional(e), Value::Optional(a)) => {
                match (e, a) {
                    (None, None) => Ok(()),
                    (Some(e), Some(a)) => inner.compare_at(path, e, a, Filter::All),
                    (e, a) => Err(Mismatch::new(
                        path,
                        describe(e.as_deref()),
                        describe(a.as_deref()),
                    )),
                }
            }
            (_, e, a) if e.matches(a) => Ok(()),
            (_, e, a) => Err(Mismatch::new(path, e, a)),
        }
    }
}

#[derive(Clone, Copy, PartialEq, Eq)]
enum Filter {
    All,
    Keys,
}

fn select<'a>(cases: &'a [Case], discriminant: &Value) -> Option<&'a Case> {
    let label = discriminant.as_label()?;
    cases.iter().find(|case| case.label == label)
}

fn join(path: &str, name: &str) -> String {
    if path.is_empty() {
        name.to_string()
    } else {
        format!("{path}.{name}")
    }
}

fn describe(value: Option<&Value>) -> String {
    match value {
        Some(value) => value.to_string(),
        None => "absent".to_string(),
    }
}

/// Difference between an expected and an actual value.
#[derive(Error, Debug, Clone, PartialEq, Eq)]
#[error("mismatch at {path}: expected {expected}, found {actual}")]
pub struct Mismatch {
    /// Dotted path of the differing member (`<root>` for the value itself).
    pub path: String,
    pub expected: String,
    pub actual: String,
}

impl Mismatch {
    pub fn new(
        path: impl Into<String>,
        expected: impl ToString,
        actual: impl ToString,
    ) -> Self {
        let mut path = path.into();
        if path.is_empty() {
            path = "<root>".to_string();
        }
        Self {
            path,
            expected: expected.to_string(),
            actual: actual.to_string(),
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn point() -> Construct {
        Construct::structure(
            "Point2D",
            vec![
                Field::new("x", Construct::primitive(Primitive::Float64, Scalar::scale(1.0, 0.1))),
                Field::new("y", Construct::primitive(Primitive::Float64, Scalar::scale(1.0, 0.2))),
            ],
        )
    }

    fn simple_union() -> Construct {
        Construct::union(
            "SimpleUnion",
            Construct::primitive(Primitive::Int32, Scalar::modulo(3, 1)),
            vec![
                Case::new(1, "int_value", Construct::primitive(Primitive::Int32, Scalar::affine(100, 0))),
                Case::new(2, "double_value", Construct::primitive(Primitive::Float64, Scalar::scale(1.5, 0.0))),
                Case::new(3, "string_value", Construct::string("Union_{seed}")),
            ],
        )
    }

    #[test]
    fn test_primitive_truncation() {
        let rule = Scalar::affine(31, 0);
        assert_eq!(Primitive::Int16.evaluate(&rule, 2000), Value::I16(-3536));
        assert_eq!(Primitive::UInt16.evaluate(&rule, 2500), Value::U16(11964));
        assert_eq!(Primitive::Octet.evaluate(&Scalar::IDENTITY, 300), Value::Octet(44));
        assert_eq!(Primitive::Octet.evaluate(&Scalar::IDENTITY, -1), Value::Octet(255));
    }

    #[test]
    fn test_array_flattened_index() {
        let construct = Construct::array(Construct::primitive(Primitive::Int32, Scalar::IDENTITY), &[3, 4]);
        let Value::Array(values) = construct.generate(Cursor::new(10)) else {
            panic!("expected array");
        };
        assert_eq!(values.len(), 12);
        assert_eq!(values[0], Value::I32(10));
        assert_eq!(values[11], Value::I32(21));
    }

    #[test]
    fn test_sequence_respects_bound() {
        let construct = Construct::bounded_sequence(
            Construct::primitive(Primitive::Int32, Scalar::IDENTITY),
            3,
            Length::Fixed(8),
        );
        let Value::Sequence(values) = construct.generate(Cursor::new(0)) else {
            panic!("expected sequence");
        };
        assert_eq!(values.len(), 3);
    }

    #[test]
    fn test_enum_ordinal_in_domain() {
        let construct = Construct::enumeration("E", &["A", "B", "C"], Scalar::affine(5, 0));
        for seed in -10..10 {
            let Value::Enum(ordinal) = construct.generate(Cursor::new(seed)) else {
                panic!("expected enum");
            };
            assert!(ordinal < 3);
        }
    }

    #[test]
    fn test_union_generation() {
        let value = simple_union().generate(Cursor::new(4));
        assert_eq!(
            value,
            Value::Union {
                discriminant: Box::new(Value::I32(2)),
                payload: Some(Box::new(Value::F64(6.0))),
            }
        );
    }

    #[test]
    fn test_union_flags_discriminant_first() {
        let construct = simple_union();
        let expected = construct.generate(Cursor::new(4));
        let corrupted = Value::Union {
            discriminant: Box::new(Value::I32(1)),
            payload: Some(Box::new(Value::F64(6.0))),
        };
        let mismatch = construct.compare(&expected, &corrupted).unwrap_err();
        assert_eq!(mismatch.path, "_d");
        assert_eq!(mismatch.expected, "2");
        assert_eq!(mismatch.actual, "1");
    }

    #[test]
    fn test_union_without_case() {
        let construct = Construct::union(
            "Sparse",
            Construct::primitive(Primitive::Int32, Scalar::IDENTITY),
            vec![Case::new(1, "one", Construct::primitive(Primitive::Int32, Scalar::IDENTITY))],
        );
        let value = construct.generate(Cursor::new(2));
        assert_eq!(
            value,
            Value::Union {
                discriminant: Box::new(Value::I32(2)),
                payload: None,
            }
        );
        assert!(construct.compare(&value, &value).is_ok());
    }

    #[test]
    fn test_struct_paths() {
        let construct = Construct::structure(
            "Topic",
            vec![
                Field::key("id", Construct::primitive(Primitive::Int32, Scalar::IDENTITY)),
                Field::new("points", Construct::sequence(point(), Length::Fixed(2))),
            ],
        );
        let expected = construct.generate(Cursor::new(1));
        let mut actual = expected.clone();
        *actual
            .child_mut(1)
            .and_then(|points| points.child_mut(1))
            .and_then(|point| point.child_mut(0))
            .unwrap() = Value::F64(9.0);
        let mismatch = construct.compare(&expected, &actual).unwrap_err();
        assert_eq!(mismatch.path, "points[1].x");
        assert_eq!(mismatch.expected, "2.1");
        assert_eq!(mismatch.actual, "9.0");

        // Key-only comparison ignores the corrupted point
        assert!(construct.compare_keys(&expected, &actual).is_ok());
    }

    #[test]
    fn test_shape_mismatch() {
        let construct = Construct::sequence(
            Construct::primitive(Primitive::Int32, Scalar::IDENTITY),
            Length::Fixed(2),
        );
        let expected = construct.generate(Cursor::new(0));
        let mismatch = construct
            .compare(&expected, &Value::String("oops".into()))
            .unwrap_err();
        assert_eq!(mismatch.path, "<root>");

        let truncated = Value::Sequence(vec![Value::I32(0)]);
        let mismatch = construct.compare(&expected, &truncated).unwrap_err();
        assert_eq!(mismatch.path, "len");
        assert_eq!(mismatch.expected, "2");
        assert_eq!(mismatch.actual, "1");

        let wrong_kind = Value::Sequence(vec![Value::I32(0), Value::I64(1)]);
        let mismatch = construct.compare(&expected, &wrong_kind).unwrap_err();
        assert_eq!(mismatch.path, "[1]");
    }

    #[test]
    fn test_optional_presence() {
        let construct = Construct::optional(
            Construct::primitive(Primitive::Int32, Scalar::affine(10, 0)),
            Parity::Even,
        );
        assert_eq!(
            construct.generate(Cursor::new(2)),
            Value::Optional(Some(Box::new(Value::I32(20))))
        );
        assert_eq!(construct.generate(Cursor::new(3)), Value::Optional(None));

        let mismatch = construct
            .compare(&construct.generate(Cursor::new(2)), &Value::Optional(None))
            .unwrap_err();
        assert_eq!(mismatch.actual, "absent");
    }

    #[test]
    fn test_extensibility() {
        let construct = point();
        assert_eq!(construct.extensibility(), Extensibility::Final);
        let construct = construct.with_extensibility(Extensibility::Mutable);
        assert_eq!(construct.extensibility(), Extensibility::Mutable);
        let construct = Construct::string("x").with_extensibility(Extensibility::Mutable);
        assert_eq!(construct.extensibility(), Extensibility::Final);
    }
}
