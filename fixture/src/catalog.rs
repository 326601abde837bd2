//! Built-in `AtomicTests` suite.
//!
//! Every topic has an `id` key (the seed, as a 32-bit integer) or a composite key, plus the
//! construct under test. The suite covers primitives, strings, enums, sequences, arrays, nested
//! structs, unions with every discriminant kind, optional members, composite and nested keys,
//! and explicit extensibility.
//!
//! Each topic that does not exist to exercise extensibility also has an appendable twin (for
//! example `AtomicTests::Int32TopicAppendable`) sharing its rules.
//!
//! The edge-case topics (maximum-size string, maximum-length sequence, five levels of nesting and
//! a union with a bounded string case) are registered with [Verification::KeyOnly]: their
//! payloads are generated from the seed like any other, but validation only checks `id`.

use crate::{
    Builder, Case, Construct, Error, Extensibility, Field, Length, Parity, Primitive, Registry,
    Scalar, TypeHandler, Verification,
};

/// Namespace of the suite.
pub const NAMESPACE: &str = "AtomicTests";

/// Suffix of the appendable twin of a topic.
const APPENDABLE_SUFFIX: &str = "Appendable";

const SIMPLE_ENUM: [&str; 3] = ["FIRST", "SECOND", "THIRD"];
const COLOR_ENUM: [&str; 6] = ["RED", "GREEN", "BLUE", "YELLOW", "MAGENTA", "CYAN"];

/// Build the suite.
pub fn atomic() -> Registry {
    let mut builder = Builder::new();
    for handler in handlers() {
        // Names are unique by construction
        if let Err(err) = builder.register(handler) {
            tracing::warn!(?err, "skipping catalog type");
        }
    }
    builder.build()
}

/// Register the suite into an existing builder.
pub fn register(builder: &mut Builder) -> Result<(), Error> {
    for handler in handlers() {
        builder.register(handler)?;
    }
    Ok(())
}

/// Handlers of the suite, in registration order (all topics first, then their twins).
pub fn handlers() -> Vec<TypeHandler> {
    let mut handlers = Vec::new();
    let mut twins = Vec::new();
    let full = topics()
        .into_iter()
        .map(|(construct, twin)| (construct, twin, Verification::Full));
    let key_only = edge_cases()
        .into_iter()
        .map(|construct| (construct, true, Verification::KeyOnly));
    for (construct, twin, verification) in full.chain(key_only) {
        let Some(name) = struct_name(&construct) else {
            continue;
        };
        let name = format!("{NAMESPACE}::{name}");
        if twin {
            let twin = construct.clone().with_extensibility(Extensibility::Appendable);
            twins.push(
                TypeHandler::new(format!("{name}{APPENDABLE_SUFFIX}"), twin)
                    .with_verification(verification),
            );
        }
        handlers.push(TypeHandler::new(name, construct).with_verification(verification));
    }
    handlers.extend(twins);
    handlers
}

fn struct_name(construct: &Construct) -> Option<&str> {
    match construct {
        Construct::Struct { name, .. } => Some(name),
        _ => None,
    }
}

fn int16(rule: Scalar) -> Construct {
    Construct::primitive(Primitive::Int16, rule)
}

fn int32(rule: Scalar) -> Construct {
    Construct::primitive(Primitive::Int32, rule)
}

fn float64(rule: Scalar) -> Construct {
    Construct::primitive(Primitive::Float64, rule)
}

fn simple_enum(rule: Scalar) -> Construct {
    Construct::enumeration("SimpleEnum", &SIMPLE_ENUM, rule)
}

fn color_enum(rule: Scalar) -> Construct {
    Construct::enumeration("ColorEnum", &COLOR_ENUM, rule)
}

fn point2d(x: Scalar, y: Scalar) -> Construct {
    Construct::structure(
        "Point2D",
        vec![Field::new("x", float64(x)), Field::new("y", float64(y))],
    )
}

fn point3d(x: Scalar, y: Scalar, z: Scalar) -> Construct {
    Construct::structure(
        "Point3D",
        vec![
            Field::new("x", float64(x)),
            Field::new("y", float64(y)),
            Field::new("z", float64(z)),
        ],
    )
}

/// `SimpleUnion` switching on `(value % 3) + 1`.
fn simple_union(int: Scalar, double: Scalar, text: &str) -> Construct {
    Construct::union(
        "SimpleUnion",
        int32(Scalar::modulo(3, 1)),
        vec![
            Case::new(1, "int_value", int32(int)),
            Case::new(2, "double_value", float64(double)),
            Case::new(3, "string_value", Construct::string(text)),
        ],
    )
}

fn id() -> Field {
    Field::key("id", int32(Scalar::IDENTITY))
}

/// Topic keyed by `id` holding a single member.
fn topic(name: &str, member: &str, construct: Construct) -> Construct {
    Construct::structure(name, vec![id(), Field::new(member, construct)])
}

fn sequence(element: Construct, modulus: i64, add: i64) -> Construct {
    Construct::sequence(element, Length::Modulo { modulus, add })
}

/// Topics of the suite, flagged with whether they get an appendable twin.
#[allow(clippy::approx_constant)]
fn topics() -> Vec<(Construct, bool)> {
    let primitives = [
        topic("BooleanTopic", "value", Construct::primitive(Primitive::Bool, Scalar::Parity(Parity::Odd))),
        topic("CharTopic", "value", Construct::primitive(Primitive::Char, Scalar::modulo(26, b'A' as i64))),
        topic("OctetTopic", "value", Construct::primitive(Primitive::Octet, Scalar::IDENTITY)),
        topic("Int16Topic", "value", int16(Scalar::affine(31, 0))),
        topic("UInt16Topic", "value", Construct::primitive(Primitive::UInt16, Scalar::affine(31, 0))),
        topic("Int32Topic", "value", int32(Scalar::affine(1664525, 1013904223))),
        topic("UInt32Topic", "value", Construct::primitive(Primitive::UInt32, Scalar::affine(1664525, 1013904223))),
        topic("Int64Topic", "value", Construct::primitive(Primitive::Int64, Scalar::affine(1_000_000, 0))),
        topic("UInt64Topic", "value", Construct::primitive(Primitive::UInt64, Scalar::affine(1_000_000, 0))),
        topic("Float32Topic", "value", Construct::primitive(Primitive::Float32, Scalar::scale(3.14159, 0.0))),
        topic("Float64Topic", "value", float64(Scalar::scale(3.14159265359, 0.0))),
    ];

    let strings = [
        topic("StringBounded32Topic", "value", Construct::bounded_string(32, "Str_{seed}")),
        topic("StringUnboundedTopic", "value", Construct::string("StrUnbound_{seed}")),
        topic("StringBounded256Topic", "value", Construct::bounded_string(256, "StrBound256_{seed}")),
    ];

    let enums = [
        topic("EnumTopic", "value", simple_enum(Scalar::modulo(3, 0))),
        topic("ColorEnumTopic", "color", color_enum(Scalar::modulo(6, 0))),
    ];

    let sequences = [
        topic("SequenceInt32Topic", "values", sequence(int32(Scalar::affine(31, 0)), 6, 0)),
        topic(
            "BoundedSequenceInt32Topic",
            "values",
            Construct::bounded_sequence(int32(Scalar::IDENTITY), 10, Length::Modulo { modulus: 10, add: 1 }),
        ),
        topic("SequenceInt64Topic", "values", sequence(Construct::primitive(Primitive::Int64, Scalar::affine(1000, 0)), 5, 1)),
        topic("SequenceFloat32Topic", "values", sequence(Construct::primitive(Primitive::Float32, Scalar::scale(1.1, 0.0)), 5, 1)),
        topic("SequenceFloat64Topic", "values", sequence(float64(Scalar::scale(2.2, 0.0)), 5, 1)),
        topic("SequenceBooleanTopic", "values", sequence(Construct::primitive(Primitive::Bool, Scalar::Parity(Parity::Even)), 5, 1)),
        topic("SequenceOctetTopic", "bytes", sequence(Construct::primitive(Primitive::Octet, Scalar::modulo(255, 0)), 5, 1)),
        topic("SequenceStringTopic", "values", sequence(Construct::string("S_{seed}_{index}"), 5, 1)),
        topic("SequenceEnumTopic", "values", sequence(simple_enum(Scalar::modulo(3, 0)), 3, 1)),
        topic("SequenceStructTopic", "points", sequence(point2d(Scalar::scale(1.0, 0.1), Scalar::scale(1.0, 0.2)), 3, 1)),
        topic(
            "SequenceUnionTopic",
            "unions",
            sequence(simple_union(Scalar::affine(10, 0), Scalar::scale(2.5, 0.0), "U_{seed}_{index}"), 2, 1),
        ),
    ];

    let arrays = [
        topic("ArrayInt32Topic", "values", Construct::array(int32(Scalar::IDENTITY), &[5])),
        topic("ArrayFloat64Topic", "values", Construct::array(float64(Scalar::scale(1.1, 0.0)), &[5])),
        topic("ArrayStringTopic", "names", Construct::array(Construct::bounded_string(16, "S_{seed}_{index}"), &[5])),
        topic("Array2DInt32Topic", "matrix", Construct::array(int32(Scalar::IDENTITY), &[3, 4])),
        topic("Array3DInt32Topic", "cube", Construct::array(int32(Scalar::IDENTITY), &[2, 3, 4])),
        topic(
            "ArrayStructTopic",
            "points",
            Construct::array(point2d(Scalar::scale(1.0, 0.0), Scalar::scale(1.0, 0.5)), &[3]),
        ),
    ];

    let nested = [
        topic("NestedStructTopic", "point", point2d(Scalar::scale(1.1, 0.0), Scalar::scale(2.2, 0.0))),
        topic(
            "Nested3DTopic",
            "point",
            point3d(Scalar::scale(1.0, 1.0), Scalar::scale(1.0, 2.0), Scalar::scale(1.0, 3.0)),
        ),
        topic(
            "DoublyNestedTopic",
            "box",
            Construct::structure(
                "Box",
                vec![
                    Field::new("top_left", point2d(Scalar::scale(1.0, 0.0), Scalar::scale(1.0, 1.0))),
                    Field::new("bottom_right", point2d(Scalar::scale(1.0, 10.0), Scalar::scale(1.0, 11.0))),
                ],
            ),
        ),
        topic(
            "ComplexNestedTopic",
            "container",
            Construct::structure(
                "Container",
                vec![
                    Field::new("count", int32(Scalar::IDENTITY)),
                    Field::new(
                        "center",
                        point3d(Scalar::scale(1.0, 0.1), Scalar::scale(1.0, 0.2), Scalar::scale(1.0, 0.3)),
                    ),
                    Field::new("radius", float64(Scalar::scale(0.5, 0.0))),
                ],
            ),
        ),
    ];

    let unions = [
        topic(
            "UnionLongDiscTopic",
            "data",
            simple_union(Scalar::affine(100, 0), Scalar::scale(1.5, 0.0), "Union_{seed}"),
        ),
        topic(
            "UnionBoolDiscTopic",
            "data",
            Construct::union(
                "BoolUnion",
                Construct::primitive(Primitive::Bool, Scalar::Parity(Parity::Even)),
                vec![
                    Case::new(1, "true_val", int32(Scalar::affine(50, 0))),
                    Case::new(0, "false_val", float64(Scalar::scale(1.5, 0.0))),
                ],
            ),
        ),
        topic(
            "UnionEnumDiscTopic",
            "data",
            Construct::union(
                "ColorUnion",
                color_enum(Scalar::modulo(4, 0)),
                vec![
                    Case::new(0, "red_data", int32(Scalar::affine(20, 0))),
                    Case::new(1, "green_data", float64(Scalar::scale(2.5, 0.0))),
                    Case::new(2, "blue_data", Construct::string("Blue_{seed}")),
                    Case::new(3, "yellow_point", point2d(Scalar::scale(1.1, 0.0), Scalar::scale(2.2, 0.0))),
                ],
            ),
        ),
        topic(
            "UnionShortDiscTopic",
            "data",
            Construct::union(
                "ShortUnion",
                int16(Scalar::modulo(4, 1)),
                vec![
                    Case::new(1, "byte_val", Construct::primitive(Primitive::Octet, Scalar::modulo(255, 0))),
                    Case::new(2, "short_val", int16(Scalar::affine(10, 0))),
                    Case::new(3, "long_val", int32(Scalar::affine(1000, 0))),
                    Case::new(4, "float_val", Construct::primitive(Primitive::Float32, Scalar::scale(3.14, 0.0))),
                ],
            ),
        ),
    ];

    let optionals = [
        topic("OptionalInt32Topic", "opt_value", Construct::optional(int32(Scalar::affine(10, 0)), Parity::Even)),
        topic("OptionalFloat64Topic", "opt_value", Construct::optional(float64(Scalar::scale(1.5, 0.0)), Parity::Even)),
        topic("OptionalStringTopic", "opt_string", Construct::optional(Construct::bounded_string(64, "Opt_{seed}"), Parity::Even)),
        topic(
            "OptionalStructTopic",
            "opt_point",
            Construct::optional(point2d(Scalar::scale(1.0, 0.0), Scalar::scale(1.0, 0.0)), Parity::Even),
        ),
        topic("OptionalEnumTopic", "opt_enum", Construct::optional(simple_enum(Scalar::modulo(3, 0)), Parity::Even)),
        Construct::structure(
            "MultiOptionalTopic",
            vec![
                id(),
                Field::new("opt_int", Construct::optional(int32(Scalar::IDENTITY), Parity::Even)),
                Field::new("opt_double", Construct::optional(float64(Scalar::scale(1.0, 0.0)), Parity::Odd)),
                Field::new("opt_string", Construct::optional(Construct::bounded_string(32, "Opt_{seed}"), Parity::Even)),
            ],
        ),
    ];

    let keys = [
        Construct::structure(
            "TwoKeyInt32Topic",
            vec![
                Field::key("key1", int32(Scalar::IDENTITY)),
                Field::key("key2", int32(Scalar::affine(1, 1))),
                Field::new("value", float64(Scalar::scale(1.5, 0.0))),
            ],
        ),
        Construct::structure(
            "TwoKeyStringTopic",
            vec![
                Field::key("key1", Construct::bounded_string(32, "k1_{seed}")),
                Field::key("key2", Construct::bounded_string(32, "k2_{seed}")),
                Field::new("value", float64(Scalar::scale(2.5, 0.0))),
            ],
        ),
        Construct::structure(
            "ThreeKeyTopic",
            vec![
                Field::key("key1", int32(Scalar::IDENTITY)),
                Field::key("key2", Construct::bounded_string(32, "k2_{seed}")),
                Field::key("key3", int16(Scalar::modulo(100, 0))),
                Field::new("value", float64(Scalar::scale(3.5, 0.0))),
            ],
        ),
        Construct::structure(
            "FourKeyTopic",
            vec![
                Field::key("key1", int32(Scalar::IDENTITY)),
                Field::key("key2", int32(Scalar::affine(1, 1))),
                Field::key("key3", int32(Scalar::affine(1, 2))),
                Field::key("key4", int32(Scalar::affine(1, 3))),
                Field::new("description", Construct::bounded_string(64, "Desc_{seed}")),
            ],
        ),
        Construct::structure(
            "NestedKeyTopic",
            vec![
                Field::key(
                    "loc",
                    Construct::structure(
                        "Location",
                        vec![
                            Field::key("building", int32(Scalar::IDENTITY)),
                            Field::key("floor", int16(Scalar::modulo(10, 0))),
                        ],
                    ),
                ),
                Field::new("temperature", float64(Scalar::scale(1.0, 20.0))),
            ],
        ),
        Construct::structure(
            "NestedKeyGeoTopic",
            vec![
                Field::key(
                    "coords",
                    Construct::structure(
                        "Coordinates",
                        vec![
                            Field::key("latitude", float64(Scalar::scale(0.1, 0.0))),
                            Field::key("longitude", float64(Scalar::scale(0.2, 0.0))),
                        ],
                    ),
                ),
                Field::new("location_name", Construct::bounded_string(128, "Loc_{seed}")),
            ],
        ),
        Construct::structure(
            "NestedTripleKeyTopic",
            vec![
                Field::key(
                    "keys",
                    Construct::structure(
                        "TripleKey",
                        vec![
                            Field::key("id1", int32(Scalar::IDENTITY)),
                            Field::key("id2", int32(Scalar::affine(1, 1))),
                            Field::key("id3", int32(Scalar::affine(1, 2))),
                        ],
                    ),
                ),
                Field::new("data", Construct::bounded_string(64, "Data_{seed}")),
            ],
        ),
    ];

    let value = || int32(Scalar::affine(1664525, 1013904223));
    let point = || point2d(Scalar::scale(1.1, 0.0), Scalar::scale(2.2, 0.0));
    let extensibility = [
        topic("FinalInt32Topic", "value", value()),
        topic("AppendableInt32Topic", "value", value()).with_extensibility(Extensibility::Appendable),
        topic("MutableInt32Topic", "value", value()).with_extensibility(Extensibility::Mutable),
        topic("FinalStructTopic", "point", point()),
        topic("AppendableStructTopic", "point", point()).with_extensibility(Extensibility::Appendable),
        topic("MutableStructTopic", "point", point()).with_extensibility(Extensibility::Mutable),
    ];

    primitives
        .into_iter()
        .chain(strings)
        .chain(enums)
        .chain(sequences)
        .chain(arrays)
        .chain(nested)
        .chain(unions)
        .chain(optionals)
        .chain(keys)
        .map(|construct| (construct, true))
        .chain(extensibility.into_iter().map(|construct| (construct, false)))
        .collect()
}

/// `Level1` through `Level5`, each holding its level number and the next level.
fn deep_nested(level: usize) -> Construct {
    let value = Field::new(
        format!("value{level}"),
        int32(Scalar::affine(0, level as i64)),
    );
    let mut fields = vec![value];
    if level < 5 {
        fields.push(Field::new(format!("nested{}", level + 1), deep_nested(level + 1)));
    }
    Construct::structure(&format!("Level{level}"), fields)
}

/// Topics validated by key only.
fn edge_cases() -> Vec<Construct> {
    vec![
        topic("MaxSizeStringTopic", "max_string", Construct::bounded_string(8192, "Short_{seed}")),
        topic(
            "MaxLengthSequenceTopic",
            "max_seq",
            Construct::bounded_sequence(int32(Scalar::affine(1, 1)), 10_000, Length::Fixed(3)),
        ),
        topic("DeepNestedStructTopic", "nested1", deep_nested(1)),
        topic(
            "UnionWithOptionalTopic",
            "data",
            Construct::union(
                "UnionWithOptional",
                int32(Scalar::modulo(3, 1)),
                vec![
                    Case::new(1, "int_val", int32(Scalar::IDENTITY)),
                    Case::new(2, "opt_str_val", Construct::bounded_string(64, "Opt_{seed}")),
                    Case::new(3, "double_val", float64(Scalar::scale(1.0, 0.0))),
                ],
            ),
        ),
    ]
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::{Sample, Value};
    use rand::{rngs::StdRng, Rng, SeedableRng};

    fn handler(name: &str) -> TypeHandler {
        atomic().get(name).unwrap().clone()
    }

    #[test]
    fn test_catalog_size() {
        let registry = atomic();
        assert_eq!(registry.len(), 64 + 58);
        assert!(registry.names().all(|name| name.starts_with("AtomicTests::")));
        assert!(registry.lookup("AtomicTests::Int32TopicAppendable").is_some());
        assert!(registry.lookup("AtomicTests::FinalInt32TopicAppendable").is_none());
        assert_eq!(
            registry.get("Int32TopicAppendable").unwrap().extensibility(),
            Extensibility::Appendable
        );
    }

    #[test]
    fn test_register_into_builder() {
        let mut builder = Builder::new();
        register(&mut builder).unwrap();
        assert!(matches!(register(&mut builder), Err(Error::DuplicateType(_))));
    }

    #[test]
    fn test_round_trip_identity() {
        let registry = atomic();
        let mut rng = StdRng::seed_from_u64(0);
        for handler in registry.handlers() {
            for _ in 0..32 {
                let seed = rng.gen_range(-100_000..100_000);
                let sample = handler.generate(seed);
                assert!(
                    handler.validate(&sample, seed).is_ok(),
                    "{} failed for seed {seed}",
                    handler.name()
                );
                assert_eq!(sample, handler.generate(seed), "{}", handler.name());
            }
        }
    }

    #[test]
    fn test_sensitivity() {
        let registry = atomic();
        for handler in registry.handlers() {
            for seed in [0, 1, 7, 1234, -5] {
                let sample = handler.generate(seed);
                assert!(!handler.is_valid(&sample, seed + 1), "{}", handler.name());
            }
        }
    }

    #[test]
    fn test_extreme_seeds() {
        let registry = atomic();
        for handler in registry.handlers() {
            for seed in [i64::MIN, i64::MAX, i32::MIN as i64, i32::MAX as i64] {
                let sample = handler.generate(seed);
                assert!(handler.is_valid(&sample, seed), "{}", handler.name());
            }
        }
    }

    #[test]
    fn test_int32_scenario() {
        let handler = handler("Int32Topic");
        let sample = handler.generate(5);
        let expected = 5i64.wrapping_mul(1664525).wrapping_add(1013904223) as i32;
        assert_eq!(sample.value().child(1), Some(&Value::I32(expected)));
        assert!(handler.is_valid(&sample, 5));
        assert!(!handler.is_valid(&sample, 6));
    }

    #[test]
    fn test_bounded_sequence_scenario() {
        let handler = handler("BoundedSequenceInt32Topic");
        let sample = handler.generate(7);
        let values: Vec<_> = (7..15).map(Value::I32).collect();
        assert_eq!(sample.value().child(1), Some(&Value::Sequence(values.clone())));
        assert!(handler.is_valid(&sample, 7));

        let truncated = Sample::new(Value::Struct(vec![
            Value::I32(7),
            Value::Sequence(values[..7].to_vec()),
        ]));
        let mismatch = handler.validate(&truncated, 7).unwrap_err();
        assert_eq!(mismatch.path, "values.len");
    }

    #[test]
    fn test_union_scenario() {
        let handler = handler("UnionLongDiscTopic");
        let sample = handler.generate(4);
        assert_eq!(
            sample.value().child(1),
            Some(&Value::Union {
                discriminant: Box::new(Value::I32(2)),
                payload: Some(Box::new(Value::F64(6.0))),
            })
        );
        assert!(handler.is_valid(&sample, 4));

        let corrupted = Sample::new(Value::Struct(vec![
            Value::I32(4),
            Value::Union {
                discriminant: Box::new(Value::I32(1)),
                payload: Some(Box::new(Value::F64(6.0))),
            },
        ]));
        let mismatch = handler.validate(&corrupted, 4).unwrap_err();
        assert_eq!(mismatch.path, "data._d");
    }

    #[test]
    fn test_union_discriminant_kinds() {
        let sample = handler("UnionBoolDiscTopic").generate(3);
        assert_eq!(
            sample.value().child(1),
            Some(&Value::Union {
                discriminant: Box::new(Value::Bool(false)),
                payload: Some(Box::new(Value::F64(4.5))),
            })
        );

        let sample = handler("UnionEnumDiscTopic").generate(6);
        assert_eq!(
            sample.value().child(1),
            Some(&Value::Union {
                discriminant: Box::new(Value::Enum(2)),
                payload: Some(Box::new(Value::String("Blue_6".into()))),
            })
        );

        let sample = handler("UnionShortDiscTopic").generate(4);
        assert_eq!(
            sample.value().child(1),
            Some(&Value::Union {
                discriminant: Box::new(Value::I16(1)),
                payload: Some(Box::new(Value::Octet(4))),
            })
        );
    }

    #[test]
    fn test_collections() {
        let sample = handler("SequenceStringTopic").generate(3);
        assert_eq!(
            sample.value().child(1),
            Some(&Value::Sequence(
                (0..4).map(|i| Value::String(format!("S_3_{i}"))).collect()
            ))
        );

        let sample = handler("SequenceInt32Topic").generate(6);
        assert_eq!(sample.value().child(1), Some(&Value::Sequence(Vec::new())));

        let sample = handler("Array3DInt32Topic").generate(1);
        let cube = sample.value().child(1).unwrap();
        assert_eq!(cube.child(23), Some(&Value::I32(24)));

        let sample = handler("ArrayStructTopic").generate(2);
        let points = sample.value().child(1).unwrap();
        assert_eq!(
            points.child(2),
            Some(&Value::Struct(vec![Value::F64(4.0), Value::F64(4.5)]))
        );
    }

    #[test]
    fn test_primitives() {
        let value = |name: &str, seed: i64| handler(name).generate(seed).value().child(1).cloned();
        assert_eq!(value("BooleanTopic", 3), Some(Value::Bool(true)));
        assert_eq!(value("CharTopic", 27), Some(Value::Char(b'B')));
        assert_eq!(value("OctetTopic", 257), Some(Value::Octet(1)));
        assert_eq!(value("Int64Topic", 3), Some(Value::I64(3_000_000)));
        assert_eq!(value("UInt64Topic", -1), Some(Value::U64(u64::MAX - 999_999)));
        assert_eq!(value("StringBounded32Topic", 9), Some(Value::String("Str_9".into())));
        assert_eq!(value("ColorEnumTopic", 8), Some(Value::Enum(2)));
    }

    #[test]
    fn test_optionals() {
        let sample = handler("MultiOptionalTopic").generate(3);
        assert_eq!(
            sample.value(),
            &Value::Struct(vec![
                Value::I32(3),
                Value::Optional(None),
                Value::Optional(Some(Box::new(Value::F64(3.0)))),
                Value::Optional(None),
            ])
        );
        let sample = handler("OptionalStringTopic").generate(4);
        assert_eq!(
            sample.value().child(1),
            Some(&Value::Optional(Some(Box::new(Value::String("Opt_4".into())))))
        );
    }

    #[test]
    fn test_keys() {
        assert_eq!(handler("ThreeKeyTopic").keys(), vec!["key1", "key2", "key3"]);
        assert_eq!(handler("NestedKeyTopic").keys(), vec!["loc"]);
        let sample = handler("ThreeKeyTopic").generate(-7);
        assert_eq!(sample.value().child(2), Some(&Value::I16(93)));
    }

    #[test]
    fn test_sizes() {
        assert_eq!(handler("Int32Topic").size_of(), 8);
        assert_eq!(handler("Int64Topic").size_of(), 16);
        assert_eq!(handler("StringUnboundedTopic").size_of(), 16);
        assert_eq!(handler("SequenceInt32Topic").size_of(), 32);
        assert_eq!(handler("UnionLongDiscTopic").size_of(), 24);
        assert_eq!(handler("ComplexNestedTopic").size_of(), 48);
        assert_eq!(handler("NestedKeyGeoTopic").size_of(), 152);
        assert_eq!(handler("MaxSizeStringTopic").size_of(), 8200);
        assert_eq!(handler("MaxLengthSequenceTopic").size_of(), 32);
        assert_eq!(handler("DeepNestedStructTopic").size_of(), 24);
        assert_eq!(handler("UnionWithOptionalTopicAppendable").size_of(), 88);
    }

    #[test]
    fn test_key_only_edge_cases() {
        let registry = atomic();
        let key_only: Vec<_> = registry
            .handlers()
            .filter(|handler| handler.verification() == Verification::KeyOnly)
            .map(|handler| handler.name())
            .collect();
        assert_eq!(key_only.len(), 8);
        assert!(key_only.contains(&"AtomicTests::DeepNestedStructTopicAppendable"));
        assert_eq!(handler("Int32Topic").verification(), Verification::Full);

        // Payload differences are tolerated, key differences are not
        let handler = handler("DeepNestedStructTopic");
        let mut sample = handler.generate(9);
        let Value::Struct(levels) = sample.value().child(1).unwrap().clone() else {
            panic!("expected struct");
        };
        assert_eq!(levels[0], Value::I32(1));
        *sample
            .value_mut()
            .child_mut(1)
            .and_then(|level| level.child_mut(0))
            .unwrap() = Value::I32(-1);
        assert!(handler.is_valid(&sample, 9));
        assert!(handler.compare(&handler.generate(9), &sample).is_err());
        assert!(!handler.is_valid(&sample, 10));
    }

    #[test]
    fn test_edge_case_generation() {
        let sample = handler("MaxLengthSequenceTopic").generate(4);
        assert_eq!(
            sample.value().child(1),
            Some(&Value::Sequence(vec![Value::I32(5), Value::I32(6), Value::I32(7)]))
        );

        let sample = handler("UnionWithOptionalTopic").generate(4);
        assert_eq!(
            sample.value().child(1),
            Some(&Value::Union {
                discriminant: Box::new(Value::I32(2)),
                payload: Some(Box::new(Value::String("Opt_4".into()))),
            })
        );

        let sample = handler("MaxSizeStringTopic").generate(12);
        assert_eq!(sample.value().child(1), Some(&Value::String("Short_12".into())));

        let sample = handler("DeepNestedStructTopic").generate(0);
        let mut level = sample.value().child(1).unwrap();
        for depth in 1..=5 {
            assert_eq!(level.child(0), Some(&Value::I32(depth)));
            if depth < 5 {
                level = level.child(1).unwrap();
            }
        }
    }
}
