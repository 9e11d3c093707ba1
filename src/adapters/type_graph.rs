//! Typed API-definition type graphs as a [`ShapeSource`].
//!
//! A [`TypeGraph`] is the serde view of a type dictionary plus an optional body
//! declaration. [`TypeArena::from_graph`] normalizes it into an arena of
//! [`ShapeNode`]s addressed by [`ShapeId`], so self-referential and mutually
//! recursive types need no owning pointers.

use anyhow::{Context, Result};
use indexmap::IndexMap;
use rand::Rng;
use serde::Deserialize;
use std::fs;
use std::path::Path;
use tracing::{debug, warn};

use crate::config::{GeneratorSettings, ItemBounds};
use crate::domain::{Constraints, GenerationResult, ShapeId, ShapeKind, ShapeNode, ShapeSource};

/// Builtins with no generative structure; their values come from declared examples.
const EXAMPLE_ONLY_TYPES: [&str; 6] = [
    "any",
    "date-only",
    "time-only",
    "datetime",
    "datetime-only",
    "file",
];

#[derive(Debug, Clone, Default, Deserialize)]
pub struct TypeGraph {
    /// Named types in declaration order.
    #[serde(default)]
    pub types: IndexMap<String, TypeSpec>,
    /// Anonymous declaration generated by [`crate::Mocker::mock_body`].
    #[serde(default)]
    pub body: Option<TypeSpec>,
}

impl TypeGraph {
    /// Read a graph from a `.json`, `.yaml` or `.yml` file.
    pub fn from_path(path: impl AsRef<Path>) -> Result<Self> {
        let path = path.as_ref();
        let text = fs::read_to_string(path)
            .with_context(|| format!("Failed to read type graph {}", path.display()))?;

        match path.extension().and_then(|extension| extension.to_str()) {
            Some("json") => serde_json::from_str(&text)
                .with_context(|| format!("Failed to parse {} as JSON", path.display())),
            _ => serde_yaml::from_str(&text)
                .with_context(|| format!("Failed to parse {} as YAML", path.display())),
        }
    }
}

/// A full declaration, or the shorthand `name: string` form.
#[derive(Debug, Clone, Deserialize)]
#[serde(untagged)]
pub enum TypeSpec {
    Expression(String),
    Declaration(Box<TypeDeclaration>),
}

#[derive(Debug, Clone, Default, Deserialize)]
pub struct TypeDeclaration {
    #[serde(rename = "type", default)]
    pub type_: Option<TypeRef>,
    #[serde(default)]
    pub properties: IndexMap<String, TypeSpec>,
    #[serde(default)]
    pub items: Option<TypeSpec>,
    #[serde(flatten)]
    pub constraints: Constraints,
}

/// A type expression, or a list of names to inherit from.
#[derive(Debug, Clone, Deserialize)]
#[serde(untagged)]
pub enum TypeRef {
    Single(String),
    Many(Vec<String>),
}

#[derive(Debug, Clone, PartialEq)]
enum TypeExpr {
    Named(String),
    Array(Box<TypeExpr>),
    Union(Vec<TypeExpr>),
}

impl TypeExpr {
    /// Parse `A | B`, `X[]` and parenthesized groups; anything else is a name.
    fn parse(expression: &str) -> Self {
        let expression = expression.trim();

        let operands = split_top_level(expression);
        if operands.len() > 1 {
            return TypeExpr::Union(operands.into_iter().map(TypeExpr::parse).collect());
        }
        if let Some(element) = expression.strip_suffix("[]") {
            return TypeExpr::Array(Box::new(TypeExpr::parse(element)));
        }
        if let Some(inner) = ungroup(expression) {
            return TypeExpr::parse(inner);
        }
        TypeExpr::Named(expression.to_string())
    }
}

/// Split on `|` outside parentheses.
fn split_top_level(expression: &str) -> Vec<&str> {
    let mut operands = Vec::new();
    let mut depth = 0usize;
    let mut start = 0;
    for (index, c) in expression.char_indices() {
        match c {
            '(' => depth += 1,
            ')' => depth = depth.saturating_sub(1),
            '|' if depth == 0 => {
                operands.push(&expression[start..index]);
                start = index + 1;
            }
            _ => {}
        }
    }
    operands.push(&expression[start..]);
    operands
}

/// The inside of `( ... )` when the outer parentheses match each other.
fn ungroup(expression: &str) -> Option<&str> {
    let inner = expression.strip_prefix('(')?.strip_suffix(')')?;
    let mut depth = 0usize;
    for c in inner.chars() {
        match c {
            '(' => depth += 1,
            ')' if depth == 0 => return None,
            ')' => depth -= 1,
            _ => {}
        }
    }
    Some(inner)
}

/// Where a declaration sits; it changes how several parent names are read.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
enum Level {
    Dictionary,
    Property,
}

/// Normalized type dictionary.
#[derive(Debug, Clone, Default)]
pub struct TypeArena {
    nodes: Vec<ShapeNode>,
    names: IndexMap<String, ShapeId>,
}

impl TypeArena {
    pub fn from_graph(graph: &TypeGraph) -> Self {
        let mut arena = Self::default();

        // Ids first, so declarations can point at types declared after them.
        for name in graph.types.keys() {
            let id = arena.push(ShapeNode::new(ShapeKind::Any, Constraints::default()));
            arena.names.insert(name.clone(), id);
        }
        for (name, spec) in &graph.types {
            let node = arena.spec_node(spec, Level::Dictionary).named(name.clone());
            let id = arena.names[name];
            arena.nodes[id.0] = node;
        }

        debug!(types = arena.names.len(), nodes = arena.nodes.len(), "Type graph normalized");
        arena
    }

    pub fn lookup(&self, name: &str) -> Option<ShapeId> {
        self.names.get(name).copied()
    }

    pub fn get(&self, id: ShapeId) -> Option<&ShapeNode> {
        self.nodes.get(id.0)
    }

    /// Add an anonymous declaration (a request or response body) that may refer to
    /// the named types.
    pub fn insert(&mut self, spec: &TypeSpec) -> ShapeId {
        let node = self.spec_node(spec, Level::Property);
        self.push(node)
    }

    fn push(&mut self, node: ShapeNode) -> ShapeId {
        self.nodes.push(node);
        ShapeId(self.nodes.len() - 1)
    }

    fn spec_node(&mut self, spec: &TypeSpec, level: Level) -> ShapeNode {
        match spec {
            TypeSpec::Expression(expression) => self.declaration_node(
                &TypeDeclaration {
                    type_: Some(TypeRef::Single(expression.clone())),
                    ..Default::default()
                },
                level,
            ),
            TypeSpec::Declaration(declaration) => self.declaration_node(declaration, level),
        }
    }

    fn declaration_node(&mut self, declaration: &TypeDeclaration, level: Level) -> ShapeNode {
        let constraints = declaration.constraints.clone();

        let kind = match &declaration.type_ {
            None if !declaration.properties.is_empty() => ShapeKind::Object {
                properties: self.properties(declaration),
                supertypes: Vec::new(),
            },
            None if declaration.items.is_some() => self.builtin_kind("array", declaration),
            None => ShapeKind::String,
            Some(TypeRef::Many(names)) => {
                let parents = names
                    .iter()
                    .map(|name| self.expression_id(&TypeExpr::parse(name)))
                    .collect();
                self.inheriting_kind(parents, declaration, level)
            }
            Some(TypeRef::Single(expression)) => match TypeExpr::parse(expression) {
                TypeExpr::Named(name) if self.names.contains_key(&name) => {
                    let parent = self.names[&name];
                    self.inheriting_kind(vec![parent], declaration, level)
                }
                TypeExpr::Named(name) if is_builtin(&name) => self.builtin_kind(&name, declaration),
                TypeExpr::Named(name) => {
                    warn!(name = %name, "Unknown type, only declared examples can be used");
                    ShapeKind::Any
                }
                TypeExpr::Array(element) => ShapeKind::Array {
                    items: vec![self.expression_id(&element)],
                },
                TypeExpr::Union(operands) => ShapeKind::Union {
                    alternatives: operands.iter().map(|operand| self.expression_id(operand)).collect(),
                },
            },
        };

        ShapeNode::new(kind, constraints)
    }

    /// Kind of a declaration naming one or more parent types.
    fn inheriting_kind(
        &mut self,
        parents: Vec<ShapeId>,
        declaration: &TypeDeclaration,
        level: Level,
    ) -> ShapeKind<ShapeId> {
        if !declaration.properties.is_empty() {
            return ShapeKind::Object {
                properties: self.properties(declaration),
                supertypes: parents,
            };
        }

        if parents.len() == 1 {
            return ShapeKind::Reference(parents[0]);
        }
        match level {
            Level::Dictionary => ShapeKind::Object {
                properties: Vec::new(),
                supertypes: parents,
            },
            Level::Property => {
                debug!(
                    count = parents.len(),
                    "Property names several types, only the first is used"
                );
                parents.first().copied().map_or(ShapeKind::Any, ShapeKind::Reference)
            }
        }
    }

    fn builtin_kind(&mut self, name: &str, declaration: &TypeDeclaration) -> ShapeKind<ShapeId> {
        match name {
            "object" => ShapeKind::Object {
                properties: self.properties(declaration),
                supertypes: Vec::new(),
            },
            "array" => {
                let item = match &declaration.items {
                    Some(spec) => {
                        let node = self.spec_node(spec, Level::Property);
                        self.push(node)
                    }
                    None => self.push(ShapeNode::new(ShapeKind::String, Constraints::default())),
                };
                ShapeKind::Array { items: vec![item] }
            }
            "string" => ShapeKind::String,
            "number" => ShapeKind::Number,
            "integer" => ShapeKind::Integer,
            "boolean" => ShapeKind::Boolean,
            "nil" | "null" => ShapeKind::Null,
            _ => ShapeKind::Any,
        }
    }

    /// Id for a type expression appearing inside another declaration.
    fn expression_id(&mut self, expression: &TypeExpr) -> ShapeId {
        if let TypeExpr::Named(name) = expression {
            if let Some(id) = self.lookup(name) {
                return id;
            }
        }
        let node = match expression {
            TypeExpr::Named(name) => self.declaration_node(
                &TypeDeclaration {
                    type_: Some(TypeRef::Single(name.clone())),
                    ..Default::default()
                },
                Level::Property,
            ),
            TypeExpr::Array(element) => ShapeNode::new(
                ShapeKind::Array {
                    items: vec![self.expression_id(element)],
                },
                Constraints::default(),
            ),
            TypeExpr::Union(operands) => ShapeNode::new(
                ShapeKind::Union {
                    alternatives: operands.iter().map(|operand| self.expression_id(operand)).collect(),
                },
                Constraints::default(),
            ),
        };
        self.push(node)
    }

    fn properties(&mut self, declaration: &TypeDeclaration) -> Vec<(String, ShapeId)> {
        declaration
            .properties
            .iter()
            .map(|(name, spec)| {
                let node = self.spec_node(spec, Level::Property);
                // `name?` marks an optional property.
                let name = name.strip_suffix('?').unwrap_or(name).to_string();
                (name, self.push(node))
            })
            .collect()
    }
}

fn is_builtin(name: &str) -> bool {
    matches!(
        name,
        "object" | "array" | "string" | "number" | "integer" | "boolean" | "nil" | "null"
    ) || EXAMPLE_ONLY_TYPES.contains(&name)
}

impl ShapeSource for TypeArena {
    type Node = ShapeId;

    fn shape<R: Rng + ?Sized>(
        &self,
        node: &ShapeId,
        _rng: &mut R,
    ) -> GenerationResult<Option<ShapeNode>> {
        Ok(self.get(*node).cloned())
    }

    fn item_bounds(&self, settings: &GeneratorSettings) -> ItemBounds {
        settings.typed_items
    }

    fn describe(&self, node: &ShapeId) -> String {
        self.get(*node)
            .map(ShapeNode::display_name)
            .unwrap_or_else(|| format!("<missing #{}>", node.0))
    }
}
