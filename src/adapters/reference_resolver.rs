//! `$ref` resolution for constraint documents.
//!
//! A reference is either an in-document pointer (`#/definitions/Address`) or a
//! file path followed by a pointer (`common.json#/Address`). Files are read
//! relative to a configurable root directory, the working directory by default.

use anyhow::{Context, Result};
use serde_json::{Map, Value};
use std::fs;
use std::path::{Path, PathBuf};
use std::sync::Arc;
use tracing::{trace, warn};

use crate::adapters::constraint_document::{DocumentNode, DocumentScope};
use crate::domain::{GenerationError, GenerationResult};

pub const REF_KEY: &str = "$ref";

#[derive(Debug, Clone)]
pub struct ReferenceResolver {
    root: PathBuf,
}

impl Default for ReferenceResolver {
    fn default() -> Self {
        Self::new(".")
    }
}

impl ReferenceResolver {
    pub fn new(root: impl Into<PathBuf>) -> Self {
        Self { root: root.into() }
    }

    pub fn root(&self) -> &Path {
        &self.root
    }

    /// Follow `node`'s reference chain to a node without `$ref`.
    ///
    /// Sibling keys of every referencing node are layered over the target, outermost
    /// last. `chain` carries the targets already followed by enclosing resolutions; a
    /// target appearing twice is a cycle. `Ok(None)` means the chain ends in a file
    /// or pointer that cannot be read.
    pub fn resolve(
        &self,
        node: &DocumentNode,
        chain: &mut Vec<String>,
    ) -> GenerationResult<Option<DocumentNode>> {
        let mut current = node.clone();
        let mut overlays: Vec<Map<String, Value>> = Vec::new();

        while let Some(reference) = reference_of(&current.value) {
            let (path, pointer) = reference.split_once('#').unwrap_or((reference, ""));

            let scope = if path.is_empty() {
                current.scope.clone()
            } else {
                match self.load(path) {
                    Ok(scope) => scope,
                    Err(e) => {
                        warn!(reference = %reference, error = %format!("{:#}", e), "Unresolvable external reference");
                        return Ok(None);
                    }
                }
            };

            let key = format!("{}#{}", scope.origin, pointer);
            if chain.contains(&key) {
                let mut cycle = chain.clone();
                cycle.push(key);
                return Err(GenerationError::CyclicReference { chain: cycle });
            }
            trace!(reference = %key, "Following reference");
            chain.push(key);

            let Some(target) = descend(&scope.document, pointer) else {
                warn!(reference = %reference, "Reference points at nothing");
                return Ok(None);
            };

            if let Value::Object(fields) = &current.value {
                let mut siblings = fields.clone();
                siblings.remove(REF_KEY);
                if !siblings.is_empty() {
                    overlays.push(siblings);
                }
            }
            current = DocumentNode {
                value: target.clone(),
                scope,
            };
        }

        if let Value::Object(fields) = &mut current.value {
            for overlay in overlays.into_iter().rev() {
                fields.extend(overlay);
            }
        }
        Ok(Some(current))
    }

    fn load(&self, path: &str) -> Result<Arc<DocumentScope>> {
        let location = self.root.join(path);
        let text = fs::read_to_string(&location)
            .with_context(|| format!("Failed to read {}", location.display()))?;
        let document: Value = serde_json::from_str(&text)
            .with_context(|| format!("Failed to parse {} as JSON", location.display()))?;
        Ok(Arc::new(DocumentScope {
            origin: path.to_string(),
            document,
        }))
    }
}

fn reference_of(value: &Value) -> Option<&str> {
    value.as_object()?.get(REF_KEY)?.as_str()
}

/// Descend by a JSON pointer; a pointer without its leading `/` is accepted too.
fn descend<'v>(document: &'v Value, pointer: &str) -> Option<&'v Value> {
    if pointer.is_empty() || pointer == "/" {
        return Some(document);
    }
    if pointer.starts_with('/') {
        document.pointer(pointer)
    } else {
        document.pointer(&format!("/{}", pointer))
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use serde_json::json;

    fn node_in(document: Value, value: Value) -> DocumentNode {
        DocumentNode {
            value,
            scope: Arc::new(DocumentScope {
                origin: String::new(),
                document,
            }),
        }
    }

    #[test]
    fn test_siblings_override_target() {
        let document = json!({
            "definitions": {
                "Address": { "type": "object", "description": "postal" }
            }
        });
        let node = node_in(
            document,
            json!({ "$ref": "#/definitions/Address", "description": "x" }),
        );

        let resolved = ReferenceResolver::default()
            .resolve(&node, &mut Vec::new())
            .unwrap()
            .unwrap();
        assert_eq!(resolved.value, json!({ "type": "object", "description": "x" }));
    }

    #[test]
    fn test_outermost_sibling_wins_along_chain() {
        let document = json!({
            "definitions": {
                "A": { "$ref": "#/definitions/B", "title": "inner" },
                "B": { "type": "string", "title": "target" }
            }
        });
        let node = node_in(document, json!({ "$ref": "#/definitions/A", "title": "outer" }));

        let resolved = ReferenceResolver::default()
            .resolve(&node, &mut Vec::new())
            .unwrap()
            .unwrap();
        assert_eq!(resolved.value, json!({ "type": "string", "title": "outer" }));
    }

    #[test]
    fn test_pointer_escapes_and_indices() {
        let document = json!({
            "definitions": { "a/b": { "type": "integer" } },
            "list": [{ "type": "boolean" }]
        });
        let resolver = ReferenceResolver::default();

        let escaped = node_in(document.clone(), json!({ "$ref": "#/definitions/a~1b" }));
        let resolved = resolver.resolve(&escaped, &mut Vec::new()).unwrap().unwrap();
        assert_eq!(resolved.value, json!({ "type": "integer" }));

        let indexed = node_in(document, json!({ "$ref": "#list/0" }));
        let resolved = resolver.resolve(&indexed, &mut Vec::new()).unwrap().unwrap();
        assert_eq!(resolved.value, json!({ "type": "boolean" }));
    }

    #[test]
    fn test_cycle_is_an_error() {
        let document = json!({
            "definitions": {
                "A": { "$ref": "#/definitions/B" },
                "B": { "$ref": "#/definitions/A" }
            }
        });
        let node = node_in(document, json!({ "$ref": "#/definitions/A" }));

        let error = ReferenceResolver::default()
            .resolve(&node, &mut Vec::new())
            .unwrap_err();
        assert_eq!(
            error,
            GenerationError::CyclicReference {
                chain: vec![
                    "#/definitions/A".to_string(),
                    "#/definitions/B".to_string(),
                    "#/definitions/A".to_string(),
                ]
            }
        );
    }

    #[test]
    fn test_dangling_pointer_yields_nothing() {
        let node = node_in(json!({}), json!({ "$ref": "#/definitions/Missing" }));
        let resolved = ReferenceResolver::default()
            .resolve(&node, &mut Vec::new())
            .unwrap();
        assert!(resolved.is_none());
    }

    #[test]
    fn test_missing_file_yields_nothing() {
        let dir = tempfile::tempdir().unwrap();
        let node = node_in(json!({}), json!({ "$ref": "absent.json#/Thing" }));
        let resolved = ReferenceResolver::new(dir.path())
            .resolve(&node, &mut Vec::new())
            .unwrap();
        assert!(resolved.is_none());
    }
}
