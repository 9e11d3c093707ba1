use serde::Deserialize;
use serde_json::Value;

/// Index of a node inside a [`crate::adapters::type_graph::TypeArena`].
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, PartialOrd, Ord)]
pub struct ShapeId(pub usize);

/// What a node generates, with its children addressed by the source's handle type.
#[derive(Debug, Clone, PartialEq)]
pub enum ShapeKind<N> {
    /// Declared properties in declaration order; supertypes are merged on top in order.
    Object {
        properties: Vec<(String, N)>,
        supertypes: Vec<N>,
    },
    /// Each element samples one of `items`.
    Array { items: Vec<N> },
    String,
    Number,
    Integer,
    Boolean,
    Null,
    /// Runtime union: one generated alternative is kept.
    Union { alternatives: Vec<N> },
    /// Alias of another node.
    Reference(N),
    /// No generative structure (date, file, any): the value comes from declared examples.
    Any,
}

impl<N> ShapeKind<N> {
    fn label(&self) -> &'static str {
        match self {
            ShapeKind::Object { .. } => "object",
            ShapeKind::Array { .. } => "array",
            ShapeKind::String => "string",
            ShapeKind::Number => "number",
            ShapeKind::Integer => "integer",
            ShapeKind::Boolean => "boolean",
            ShapeKind::Null => "null",
            ShapeKind::Union { .. } => "union",
            ShapeKind::Reference(_) => "reference",
            ShapeKind::Any => "any",
        }
    }
}

/// A normalized, kind-tagged description of one value to generate.
#[derive(Debug, Clone, PartialEq)]
pub struct ShapeNode<N = ShapeId> {
    /// Type name when the node is a named entry of a type dictionary.
    pub name: Option<String>,
    pub kind: ShapeKind<N>,
    pub constraints: Constraints,
}

impl<N> ShapeNode<N> {
    pub fn new(kind: ShapeKind<N>, constraints: Constraints) -> Self {
        Self {
            name: None,
            kind,
            constraints,
        }
    }

    pub fn named(mut self, name: impl Into<String>) -> Self {
        self.name = Some(name.into());
        self
    }

    pub fn display_name(&self) -> String {
        self.name
            .clone()
            .unwrap_or_else(|| format!("<anonymous {}>", self.kind.label()))
    }
}

/// Kind-specific facets shared by both schema vocabularies.
///
/// Field names follow the camelCase spelling both input formats use, so the same
/// struct deserializes straight out of a type declaration or a constraint document.
#[derive(Debug, Clone, Default, PartialEq, Deserialize)]
#[serde(default, rename_all = "camelCase")]
pub struct Constraints {
    pub pattern: Option<String>,
    pub min_length: Option<usize>,
    pub max_length: Option<usize>,
    pub minimum: Option<f64>,
    pub maximum: Option<f64>,
    /// Boolean (draft 4) or numeric (draft 6+) form.
    pub exclusive_minimum: Option<Value>,
    pub exclusive_maximum: Option<Value>,
    pub multiple_of: Option<f64>,
    pub min_items: Option<usize>,
    pub max_items: Option<usize>,
    pub unique_items: Option<bool>,
    #[serde(rename = "enum")]
    pub enum_values: Vec<Value>,
    pub format: Option<String>,
    pub example: Option<Value>,
    /// A list of examples, or a map of named examples.
    pub examples: Option<Value>,
}

impl Constraints {
    /// Lower bound, with a numeric `exclusiveMinimum` taking its place.
    pub fn lower_bound(&self) -> Option<f64> {
        match &self.exclusive_minimum {
            Some(Value::Number(n)) => n.as_f64(),
            _ => self.minimum,
        }
    }

    /// Upper bound, with a numeric `exclusiveMaximum` taking its place.
    pub fn upper_bound(&self) -> Option<f64> {
        match &self.exclusive_maximum {
            Some(Value::Number(n)) => n.as_f64(),
            _ => self.maximum,
        }
    }

    pub fn is_unique(&self) -> bool {
        self.unique_items.unwrap_or(false)
    }

    /// Declared examples flattened into a list.
    pub fn example_values(&self) -> Vec<&Value> {
        match &self.examples {
            Some(Value::Array(items)) => items.iter().collect(),
            Some(Value::Object(named)) => named
                .values()
                .map(|example| match example {
                    // RAML-style `{ value: ... }` wrappers
                    Value::Object(fields) if fields.contains_key("value") => &fields["value"],
                    other => other,
                })
                .collect(),
            _ => Vec::new(),
        }
    }
}
