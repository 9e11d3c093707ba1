//! # Shapemock - Schema-driven mock values
//!
//! Shapemock synthesizes random values that satisfy a data shape. It reads two
//! schema vocabularies and drives both through one generator core.
//!
//! ## Features
//!
//! - **Typed type graphs**: named types with inheritance, runtime unions and `X[]` arrays
//! - **Constraint documents**: JSON Schema with `$ref` (same-document or external file),
//!   `allOf`, `anyOf` and `oneOf`
//! - **Constraint-aware scalars**: regex patterns, length bounds, `multipleOf`, and numeric
//!   ranges that keep the decimal precision of their bounds
//! - **Format plugins**: named formats (`email`, `uuid`, ...) backed by faker generators,
//!   overridable by the embedding application
//! - **Reproducible**: every random draw comes from a caller-supplied, seedable source
//!
//! ## Quick Start
//!
//! ```rust
//! use rand::rngs::StdRng;
//! use rand::SeedableRng;
//! use serde_json::json;
//! use shapemock::config::Settings;
//! use shapemock::Mocker;
//!
//! fn main() -> anyhow::Result<()> {
//!     let mocker = Mocker::new(Settings::default());
//!     let mut rng = StdRng::seed_from_u64(7);
//!
//!     let schema = json!({ "type": "string", "pattern": "[a-z]{3}" });
//!     let value = mocker.mock_document(&schema, &mut rng)?;
//!     assert_eq!(value.unwrap().as_str().unwrap().len(), 3);
//!     Ok(())
//! }
//! ```
//!
//! ## Architecture
//!
//! - **Domain**: shape nodes, constraints, errors and the [`domain::ShapeSource`] port
//! - **Generator**: structural and scalar generation over any shape source
//! - **Adapters**: the two schema front ends, reference and composition resolution,
//!   and the format registry
//! - **Config**: layered settings

pub mod adapters;
pub mod cli;
pub mod config;
pub mod domain;
pub mod generator;

use rand::rngs::StdRng;
use rand::{Rng, SeedableRng};
use serde_json::Value;

use crate::adapters::constraint_document::ConstraintDocument;
use crate::adapters::format_registry::FormatRegistry;
use crate::adapters::type_graph::{TypeArena, TypeGraph};
use crate::config::Settings;
use crate::domain::{GenerationError, GenerationResult, ShapeSource};
use crate::generator::Generator;

/// Entry point for embedding applications.
///
/// A `Mocker` holds only read-only state, so one instance can serve concurrent
/// generation calls, each with its own random source.
#[derive(Debug, Clone)]
pub struct Mocker {
    settings: Settings,
    formats: FormatRegistry,
}

impl Mocker {
    pub fn new(settings: Settings) -> Self {
        let formats = if settings.formats.builtin {
            FormatRegistry::with_builtin_formats()
        } else {
            FormatRegistry::new()
        };
        Self { settings, formats }
    }

    /// Add caller-supplied format generators; they win over built-ins of the same name.
    pub fn with_formats(mut self, formats: FormatRegistry) -> Self {
        self.formats.extend(formats);
        self
    }

    pub fn settings(&self) -> &Settings {
        &self.settings
    }

    /// Random source seeded from the configured seed, or from entropy when unset.
    pub fn rng(&self) -> StdRng {
        match self.settings.seed {
            Some(seed) => StdRng::seed_from_u64(seed),
            None => StdRng::from_entropy(),
        }
    }

    /// Generate a value of the named type in `graph`.
    pub fn mock_type<R: Rng>(
        &self,
        graph: &TypeGraph,
        root: &str,
        rng: &mut R,
    ) -> GenerationResult<Option<Value>> {
        let arena = TypeArena::from_graph(graph);
        let id = arena
            .lookup(root)
            .ok_or_else(|| GenerationError::UnknownType(root.to_string()))?;
        self.generate(&arena, &id, rng)
    }

    /// Generate a value for the graph's anonymous body declaration.
    pub fn mock_body<R: Rng>(&self, graph: &TypeGraph, rng: &mut R) -> GenerationResult<Option<Value>> {
        let body = graph
            .body
            .as_ref()
            .ok_or_else(|| GenerationError::UnknownType("body".to_string()))?;
        let mut arena = TypeArena::from_graph(graph);
        let id = arena.insert(body);
        self.generate(&arena, &id, rng)
    }

    /// Generate a value for a constraint document, resolving external references
    /// against the configured reference root.
    pub fn mock_document<R: Rng>(&self, document: &Value, rng: &mut R) -> GenerationResult<Option<Value>> {
        let document = ConstraintDocument::new(document.clone())
            .with_reference_root(&self.settings.references.root);
        self.generate(&document, &document.root(), rng)
    }

    /// Generate a value for `root` from any shape source.
    pub fn generate<S: ShapeSource, R: Rng>(
        &self,
        source: &S,
        root: &S::Node,
        rng: &mut R,
    ) -> GenerationResult<Option<Value>> {
        Generator::new(rng, &self.formats, &self.settings.generator).generate(source, root)
    }
}
