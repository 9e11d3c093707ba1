//! JSON-Schema-style constraint documents as a [`ShapeSource`].
//!
//! Nodes are resolved lazily on every visit: `$ref` chains are followed and
//! composition keywords collapsed right before the node is normalized, so chance
//! decisions (`anyOf`, `oneOf`) are drawn afresh each time a node is generated.

use anyhow::{Context, Result};
use rand::Rng;
use serde_json::{json, Map, Value};
use std::fs;
use std::path::{Path, PathBuf};
use std::sync::Arc;
use tracing::{debug, warn};

use crate::adapters::combinator_resolver::{Combinator, CombinatorResolver};
use crate::adapters::reference_resolver::{ReferenceResolver, REF_KEY};
use crate::config::{GeneratorSettings, ItemBounds};
use crate::domain::{Constraints, GenerationResult, ShapeKind, ShapeNode, ShapeSource};

const STRING_FACETS: [&str; 4] = ["pattern", "minLength", "maxLength", "format"];
const NUMERIC_FACETS: [&str; 5] = [
    "minimum",
    "maximum",
    "exclusiveMinimum",
    "exclusiveMaximum",
    "multipleOf",
];

/// A whole document and where it came from; in-document pointers resolve against it.
#[derive(Debug)]
pub struct DocumentScope {
    pub origin: String,
    pub document: Value,
}

/// One schema node together with the document its pointers refer to.
#[derive(Debug, Clone)]
pub struct DocumentNode {
    pub value: Value,
    pub scope: Arc<DocumentScope>,
}

impl PartialEq for DocumentNode {
    fn eq(&self, other: &Self) -> bool {
        Arc::ptr_eq(&self.scope, &other.scope) && self.value == other.value
    }
}

impl DocumentNode {
    fn child(&self, value: Value) -> Self {
        Self {
            value,
            scope: self.scope.clone(),
        }
    }
}

#[derive(Debug, Clone)]
pub struct ConstraintDocument {
    scope: Arc<DocumentScope>,
    references: ReferenceResolver,
}

impl ConstraintDocument {
    pub fn new(document: Value) -> Self {
        Self::with_origin(document, String::new())
    }

    fn with_origin(document: Value, origin: String) -> Self {
        Self {
            scope: Arc::new(DocumentScope { origin, document }),
            references: ReferenceResolver::default(),
        }
    }

    /// Read a JSON or YAML document from disk.
    pub fn from_path(path: impl AsRef<Path>) -> Result<Self> {
        let path = path.as_ref();
        let text = fs::read_to_string(path)
            .with_context(|| format!("Failed to read schema file {}", path.display()))?;
        let document: Value = if is_yaml(path) {
            serde_yaml::from_str(&text)
                .with_context(|| format!("Failed to parse {} as YAML", path.display()))?
        } else {
            serde_json::from_str(&text)
                .with_context(|| format!("Failed to parse {} as JSON", path.display()))?
        };
        Ok(Self::with_origin(document, path.display().to_string()))
    }

    /// Resolve external `$ref` paths against `root` instead of the working directory.
    pub fn with_reference_root(mut self, root: impl Into<PathBuf>) -> Self {
        self.references = ReferenceResolver::new(root);
        self
    }

    pub fn root(&self) -> DocumentNode {
        DocumentNode {
            value: self.scope.document.clone(),
            scope: self.scope.clone(),
        }
    }

    /// Follow references and collapse composition keywords until neither remains.
    fn resolve<R: Rng + ?Sized>(
        &self,
        node: &DocumentNode,
        rng: &mut R,
        chain: &mut Vec<String>,
    ) -> GenerationResult<Option<DocumentNode>> {
        let Some(mut current) = self.references.resolve(node, chain)? else {
            return Ok(None);
        };

        loop {
            let Value::Object(fields) = &current.value else {
                return Ok(Some(current));
            };
            let Some(combinator) = Combinator::find(fields) else {
                return Ok(Some(current));
            };

            let branches = fields
                .get(combinator.keyword())
                .and_then(Value::as_array)
                .map(Vec::as_slice)
                .unwrap_or_default();
            let Some(selected) = CombinatorResolver::select(combinator, branches, &mut *rng) else {
                return Ok(None);
            };

            let mut resolved = Vec::with_capacity(selected.len());
            for branch in selected {
                // Sibling branches may share targets; only enclosing references count.
                let mut branch_chain = chain.clone();
                match self.resolve(&current.child(branch.clone()), &mut *rng, &mut branch_chain)? {
                    Some(DocumentNode {
                        value: Value::Object(branch_fields),
                        ..
                    }) => resolved.push(branch_fields),
                    Some(_) => debug!(
                        keyword = combinator.keyword(),
                        "Ignoring non-object composition branch"
                    ),
                    None => {}
                }
            }

            let mut siblings = fields.clone();
            siblings.remove(combinator.keyword());
            current = current.child(Value::Object(CombinatorResolver::synthesize(resolved, siblings)));
        }
    }

    /// Turn a resolved node into a shape; `None` for nodes that produce no value.
    fn normalize(&self, node: &DocumentNode) -> Option<ShapeNode<DocumentNode>> {
        let Value::Object(fields) = &node.value else {
            debug!(node = %node.value, "Schema node is not an object, yielding no value");
            return None;
        };

        let mut constraints: Constraints = match serde_json::from_value(node.value.clone()) {
            Ok(constraints) => constraints,
            Err(e) => {
                warn!(error = %e, "Malformed constraint keywords, ignoring them");
                Constraints::default()
            }
        };
        if let Some(constant) = fields.get("const") {
            constraints.enum_values = vec![constant.clone()];
        }

        let kind = match fields.get("type") {
            Some(Value::String(name)) => Self::kind_named(name, fields, node)?,
            Some(Value::Array(names)) => ShapeKind::Union {
                alternatives: names
                    .iter()
                    .map(|name| {
                        let mut single = fields.clone();
                        single.insert("type".to_string(), name.clone());
                        node.child(Value::Object(single))
                    })
                    .collect(),
            },
            Some(other) => {
                debug!(keyword = %other, "Unrecognized type keyword, yielding no value");
                return None;
            }
            None => Self::inferred_kind(fields, &constraints, node)?,
        };

        Some(ShapeNode::new(kind, constraints))
    }

    fn kind_named(
        name: &str,
        fields: &Map<String, Value>,
        node: &DocumentNode,
    ) -> Option<ShapeKind<DocumentNode>> {
        let kind = match name {
            "object" => ShapeKind::Object {
                properties: fields
                    .get("properties")
                    .and_then(Value::as_object)
                    .map(|properties| {
                        properties
                            .iter()
                            .map(|(property, schema)| (property.clone(), node.child(schema.clone())))
                            .collect()
                    })
                    .unwrap_or_default(),
                supertypes: Vec::new(),
            },
            "array" => ShapeKind::Array {
                items: match fields.get("items") {
                    Some(Value::Array(list)) if !list.is_empty() => {
                        list.iter().map(|item| node.child(item.clone())).collect()
                    }
                    Some(item @ Value::Object(_)) => vec![node.child(item.clone())],
                    _ => vec![node.child(json!({ "type": "string" }))],
                },
            },
            "string" => ShapeKind::String,
            "number" => ShapeKind::Number,
            "integer" => ShapeKind::Integer,
            "boolean" => ShapeKind::Boolean,
            "null" => ShapeKind::Null,
            unknown => {
                debug!(name = unknown, "Unknown type name, yielding no value");
                return None;
            }
        };
        Some(kind)
    }

    fn inferred_kind(
        fields: &Map<String, Value>,
        constraints: &Constraints,
        node: &DocumentNode,
    ) -> Option<ShapeKind<DocumentNode>> {
        if fields.contains_key("properties") {
            Self::kind_named("object", fields, node)
        } else if fields.contains_key("items") {
            Self::kind_named("array", fields, node)
        } else if !constraints.enum_values.is_empty() {
            Some(ShapeKind::Any)
        } else if STRING_FACETS.iter().any(|facet| fields.contains_key(*facet)) {
            Some(ShapeKind::String)
        } else if NUMERIC_FACETS.iter().any(|facet| fields.contains_key(*facet)) {
            Some(ShapeKind::Number)
        } else {
            debug!("Schema node has no type and nothing to infer one from");
            None
        }
    }
}

impl ShapeSource for ConstraintDocument {
    type Node = DocumentNode;

    fn shape<R: Rng + ?Sized>(
        &self,
        node: &DocumentNode,
        rng: &mut R,
    ) -> GenerationResult<Option<ShapeNode<DocumentNode>>> {
        let resolved = self.resolve(node, rng, &mut Vec::new())?;
        Ok(resolved.and_then(|resolved| self.normalize(&resolved)))
    }

    fn item_bounds(&self, settings: &GeneratorSettings) -> ItemBounds {
        settings.document_items
    }

    fn describe(&self, node: &DocumentNode) -> String {
        let label = node.value.as_object().and_then(|fields| {
            [REF_KEY, "title", "type"]
                .iter()
                .find_map(|key| fields.get(*key))
                .map(|value| match value {
                    Value::String(text) => text.clone(),
                    other => other.to_string(),
                })
        });
        let label = label.unwrap_or_else(|| "<schema>".to_string());
        if node.scope.origin.is_empty() {
            label
        } else {
            format!("{}:{}", node.scope.origin, label)
        }
    }
}

fn is_yaml(path: &Path) -> bool {
    matches!(
        path.extension().and_then(|extension| extension.to_str()),
        Some("yaml" | "yml")
    )
}
