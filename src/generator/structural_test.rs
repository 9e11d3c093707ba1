use super::Generator;
use crate::adapters::format_registry::FormatRegistry;
use crate::config::{GeneratorSettings, ItemBounds};
use crate::domain::{
    Constraints, GenerationError, GenerationResult, ShapeKind, ShapeNode, ShapeSource,
};
use rand::rngs::StdRng;
use rand::{Rng, SeedableRng};
use serde_json::{json, Value};

/// Shapes addressed by their index in a vector.
struct Fixture {
    nodes: Vec<ShapeNode<usize>>,
}

impl ShapeSource for Fixture {
    type Node = usize;

    fn shape<R: Rng + ?Sized>(
        &self,
        node: &usize,
        _rng: &mut R,
    ) -> GenerationResult<Option<ShapeNode<usize>>> {
        Ok(self.nodes.get(*node).cloned())
    }

    fn item_bounds(&self, settings: &GeneratorSettings) -> ItemBounds {
        settings.typed_items
    }

    fn describe(&self, node: &usize) -> String {
        self.nodes[*node].display_name()
    }
}

fn leaf(kind: ShapeKind<usize>) -> ShapeNode<usize> {
    ShapeNode::new(kind, Constraints::default())
}

fn constant(value: Value) -> ShapeNode<usize> {
    ShapeNode::new(
        ShapeKind::Any,
        Constraints {
            enum_values: vec![value],
            ..Default::default()
        },
    )
}

fn object(properties: &[(&str, usize)], supertypes: &[usize]) -> ShapeNode<usize> {
    leaf(ShapeKind::Object {
        properties: properties
            .iter()
            .map(|(name, id)| (name.to_string(), *id))
            .collect(),
        supertypes: supertypes.to_vec(),
    })
}

fn generate(fixture: &Fixture, root: usize, seed: u64) -> GenerationResult<Option<Value>> {
    generate_with(fixture, root, seed, &FormatRegistry::new(), &GeneratorSettings::default())
}

fn generate_with(
    fixture: &Fixture,
    root: usize,
    seed: u64,
    formats: &FormatRegistry,
    settings: &GeneratorSettings,
) -> GenerationResult<Option<Value>> {
    let mut rng = StdRng::seed_from_u64(seed);
    Generator::new(&mut rng, formats, settings).generate(fixture, &root)
}

#[test]
fn test_properties_in_declaration_order_and_empty_ones_left_out() {
    let fixture = Fixture {
        nodes: vec![
            object(&[("zeta", 1), ("missing", 2), ("alpha", 3)], &[]),
            constant(json!("z")),
            leaf(ShapeKind::Any),
            leaf(ShapeKind::Boolean),
        ],
    };

    let value = generate(&fixture, 0, 1).unwrap().unwrap();
    let fields = value.as_object().unwrap();
    let keys: Vec<&str> = fields.keys().map(String::as_str).collect();
    assert_eq!(keys, vec!["zeta", "alpha"]);
    assert_eq!(fields["zeta"], json!("z"));
    assert!(fields["alpha"].is_boolean());
}

#[test]
fn test_supertypes_override_own_fields_in_order() {
    let fixture = Fixture {
        nodes: vec![
            // 0: child with two supertypes
            object(&[("kind", 3), ("own", 4)], &[1, 2]).named("Child"),
            // 1, 2: supertypes
            object(&[("kind", 5), ("first", 4)], &[]).named("First"),
            object(&[("kind", 6)], &[]).named("Second"),
            constant(json!("child")),
            constant(json!(1)),
            constant(json!("first")),
            constant(json!("second")),
        ],
    };

    let value = generate(&fixture, 0, 3).unwrap().unwrap();
    assert_eq!(value, json!({ "kind": "second", "own": 1, "first": 1 }));
    let keys: Vec<&str> = value.as_object().unwrap().keys().map(String::as_str).collect();
    assert_eq!(keys, vec!["kind", "own", "first"]);
}

#[test]
fn test_supertype_cycle_is_an_error() {
    let fixture = Fixture {
        nodes: vec![
            object(&[], &[1]).named("A"),
            object(&[], &[0]).named("B"),
        ],
    };

    let error = generate(&fixture, 0, 0).unwrap_err();
    assert_eq!(
        error,
        GenerationError::CyclicInheritance {
            chain: vec!["A".to_string(), "B".to_string(), "A".to_string()]
        }
    );
}

#[test]
fn test_alias_cycle_is_an_error() {
    let fixture = Fixture {
        nodes: vec![
            leaf(ShapeKind::Reference(1)).named("Left"),
            leaf(ShapeKind::Reference(0)).named("Right"),
        ],
    };

    let error = generate(&fixture, 0, 0).unwrap_err();
    assert!(matches!(error, GenerationError::CyclicReference { chain } if chain.len() == 3));
}

#[test]
fn test_aliases_resolve_to_their_target() {
    let fixture = Fixture {
        nodes: vec![
            leaf(ShapeKind::Reference(1)),
            leaf(ShapeKind::Reference(2)),
            constant(json!(42)),
        ],
    };
    assert_eq!(generate(&fixture, 0, 0).unwrap(), Some(json!(42)));
}

#[test]
fn test_union_keeps_one_alternative() {
    let fixture = Fixture {
        nodes: vec![
            leaf(ShapeKind::Union {
                alternatives: vec![1, 2, 3],
            }),
            constant(json!("left")),
            constant(json!("right")),
            leaf(ShapeKind::Any),
        ],
    };

    let mut seen = Vec::new();
    for seed in 0..50 {
        let value = generate(&fixture, 0, seed).unwrap().unwrap();
        assert!(value == json!("left") || value == json!("right"));
        if !seen.contains(&value) {
            seen.push(value);
        }
    }
    assert_eq!(seen.len(), 2);
}

#[test]
fn test_union_of_empty_alternatives_yields_nothing() {
    let fixture = Fixture {
        nodes: vec![
            leaf(ShapeKind::Union {
                alternatives: vec![1, 1],
            }),
            leaf(ShapeKind::Any),
        ],
    };
    assert_eq!(generate(&fixture, 0, 0).unwrap(), None);
}

#[test]
fn test_unique_items_removes_duplicates() {
    let array = ShapeNode::new(
        ShapeKind::Array { items: vec![1] },
        Constraints {
            min_items: Some(5),
            max_items: Some(8),
            unique_items: Some(true),
            ..Default::default()
        },
    );
    let fixture = Fixture {
        nodes: vec![array, leaf(ShapeKind::Boolean)],
    };

    for seed in 0..100 {
        let value = generate(&fixture, 0, seed).unwrap().unwrap();
        let items = value.as_array().unwrap();
        assert!(!items.is_empty() && items.len() <= 2);
        if items.len() == 2 {
            assert_ne!(items[0], items[1]);
        }
    }
}

#[test]
fn test_array_length_defaults_to_source_bounds() {
    let fixture = Fixture {
        nodes: vec![leaf(ShapeKind::Array { items: vec![1] }), leaf(ShapeKind::Integer)],
    };
    for seed in 0..100 {
        let value = generate(&fixture, 0, seed).unwrap().unwrap();
        assert!(value.as_array().unwrap().len() <= 10);
    }
}

#[test]
fn test_recursion_stops_at_max_depth() {
    let fixture = Fixture {
        nodes: vec![object(&[("child", 0)], &[]).named("Node")],
    };
    let settings = GeneratorSettings {
        max_depth: 3,
        ..Default::default()
    };

    let value = generate_with(&fixture, 0, 0, &FormatRegistry::new(), &settings)
        .unwrap()
        .unwrap();
    assert_eq!(value, json!({ "child": { "child": { "child": {} } } }));
}

fn count_values(value: &Value) -> usize {
    match value {
        Value::Array(items) => 1 + items.iter().map(count_values).sum::<usize>(),
        Value::Object(fields) => 1 + fields.values().map(count_values).sum::<usize>(),
        _ => 1,
    }
}

#[test]
fn test_node_budget_caps_nested_arrays() {
    let fixture = Fixture {
        nodes: vec![leaf(ShapeKind::Array { items: vec![0] })],
    };
    let settings = GeneratorSettings {
        max_nodes: 50,
        ..Default::default()
    };

    for seed in 0..20 {
        let value = generate_with(&fixture, 0, seed, &FormatRegistry::new(), &settings)
            .unwrap()
            .unwrap();
        assert!(count_values(&value) <= 50, "seed {} produced {}", seed, count_values(&value));
    }
}

#[test]
fn test_spent_budget_still_honours_min_items() {
    let list = ShapeNode::new(
        ShapeKind::Array { items: vec![2] },
        Constraints {
            min_items: Some(2),
            max_items: Some(2),
            ..Default::default()
        },
    );
    let fixture = Fixture {
        nodes: vec![object(&[("list", 1)], &[]), list, leaf(ShapeKind::Boolean)],
    };
    let settings = GeneratorSettings {
        max_nodes: 1,
        ..Default::default()
    };

    let value = generate_with(&fixture, 0, 0, &FormatRegistry::new(), &settings)
        .unwrap()
        .unwrap();
    let list = value["list"].as_array().unwrap();
    assert_eq!(list.len(), 2);
    assert!(list.iter().all(Value::is_boolean));
}

#[test]
fn test_registered_format_takes_precedence() {
    let mut formats = FormatRegistry::new();
    formats.register("fixed", |_| json!("from-plugin"));

    let fixture = Fixture {
        nodes: vec![
            ShapeNode::new(
                ShapeKind::String,
                Constraints {
                    format: Some("fixed".to_string()),
                    ..Default::default()
                },
            ),
            ShapeNode::new(
                ShapeKind::String,
                Constraints {
                    format: Some("unregistered".to_string()),
                    max_length: Some(5),
                    ..Default::default()
                },
            ),
        ],
    };
    let settings = GeneratorSettings::default();

    let value = generate_with(&fixture, 0, 0, &formats, &settings).unwrap();
    assert_eq!(value, Some(json!("from-plugin")));

    let value = generate_with(&fixture, 1, 0, &formats, &settings).unwrap().unwrap();
    let length = value.as_str().unwrap().chars().count();
    assert!((1..=5).contains(&length));
}

#[test]
fn test_enumeration_wins_over_kind() {
    let fixture = Fixture {
        nodes: vec![ShapeNode::new(
            ShapeKind::Integer,
            Constraints {
                enum_values: vec![json!("a"), json!("b")],
                ..Default::default()
            },
        )],
    };
    let value = generate(&fixture, 0, 5).unwrap().unwrap();
    assert!(value == json!("a") || value == json!("b"));
}

#[test]
fn test_same_seed_same_value() {
    let fixture = Fixture {
        nodes: vec![
            object(&[("name", 1), ("score", 2), ("tags", 3)], &[]),
            leaf(ShapeKind::String),
            leaf(ShapeKind::Number),
            leaf(ShapeKind::Array { items: vec![1] }),
        ],
    };
    assert_eq!(
        generate(&fixture, 0, 77).unwrap(),
        generate(&fixture, 0, 77).unwrap()
    );
}
