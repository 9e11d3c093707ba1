//! Structural value generation over any [`ShapeSource`].
//!
//! The generator walks shapes handed out by a source, synthesizing objects, arrays
//! and unions itself and delegating leaves to [`scalar`]. Besides the borrowed random
//! source it only counts the values generated so far, so one instance serves exactly
//! one generation call.
//!
//! Work is bounded twice: subtrees past `max_depth` yield no value, and once
//! `max_nodes` values exist arrays stop growing past their `minItems`.

pub mod scalar;

#[cfg(test)]
mod structural_test;

use rand::seq::SliceRandom;
use rand::Rng;
use serde_json::{Map, Value};
use tracing::{debug, trace};

use crate::adapters::format_registry::FormatRegistry;
use crate::config::GeneratorSettings;
use crate::domain::{
    Constraints, GenerationError, GenerationResult, ShapeKind, ShapeNode, ShapeSource,
};

pub struct Generator<'a, R: Rng> {
    rng: &'a mut R,
    formats: &'a FormatRegistry,
    settings: &'a GeneratorSettings,
    generated: usize,
}

impl<'a, R: Rng> Generator<'a, R> {
    pub fn new(rng: &'a mut R, formats: &'a FormatRegistry, settings: &'a GeneratorSettings) -> Self {
        Self {
            rng,
            formats,
            settings,
            generated: 0,
        }
    }

    /// Generate a value for `root`. `Ok(None)` means the root produced no value.
    pub fn generate<S: ShapeSource>(
        &mut self,
        source: &S,
        root: &S::Node,
    ) -> GenerationResult<Option<Value>> {
        self.node(source, root, 0, &mut Vec::new())
    }

    /// `lineage` holds the objects whose supertypes are currently being expanded.
    /// Properties and array items start a lineage of their own.
    fn node<S: ShapeSource>(
        &mut self,
        source: &S,
        node: &S::Node,
        depth: usize,
        lineage: &mut Vec<S::Node>,
    ) -> GenerationResult<Option<Value>> {
        if depth > self.settings.max_depth {
            debug!(
                depth,
                node = %source.describe(node),
                "Depth limit reached, leaving subtree empty"
            );
            return Ok(None);
        }

        let Some((handle, shape)) = self.dereference(source, node)? else {
            return Ok(None);
        };
        self.generated += 1;

        if let Some(value) = scalar::enumerated(&mut *self.rng, &shape.constraints) {
            return Ok(Some(value));
        }

        match shape.kind {
            ShapeKind::Object {
                properties,
                supertypes,
            } => {
                if lineage.contains(&handle) {
                    let mut chain: Vec<String> = lineage.iter().map(|n| source.describe(n)).collect();
                    chain.push(source.describe(&handle));
                    return Err(GenerationError::CyclicInheritance { chain });
                }
                lineage.push(handle);
                let value = self.object(source, &properties, &supertypes, depth, lineage);
                lineage.pop();
                value
            }
            ShapeKind::Array { items } => self.array(source, &items, &shape.constraints, depth),
            ShapeKind::Union { alternatives } => self.union(source, &alternatives, depth, lineage),
            kind => Ok(self.scalar(&kind, &shape.constraints)),
        }
    }

    /// Follow alias nodes to the first node that is not one.
    fn dereference<S: ShapeSource>(
        &mut self,
        source: &S,
        node: &S::Node,
    ) -> GenerationResult<Option<(S::Node, ShapeNode<S::Node>)>> {
        let mut current = node.clone();
        let mut visited: Vec<S::Node> = Vec::new();

        loop {
            let Some(shape) = source.shape(&current, &mut *self.rng)? else {
                return Ok(None);
            };
            match shape.kind {
                ShapeKind::Reference(target) => {
                    visited.push(current);
                    if visited.contains(&target) {
                        let mut chain: Vec<String> =
                            visited.iter().map(|n| source.describe(n)).collect();
                        chain.push(source.describe(&target));
                        return Err(GenerationError::CyclicReference { chain });
                    }
                    current = target;
                }
                _ => return Ok(Some((current, shape))),
            }
        }
    }

    fn object<S: ShapeSource>(
        &mut self,
        source: &S,
        properties: &[(String, S::Node)],
        supertypes: &[S::Node],
        depth: usize,
        lineage: &mut Vec<S::Node>,
    ) -> GenerationResult<Option<Value>> {
        let mut fields = Map::new();

        for (name, property) in properties {
            match self.node(source, property, depth + 1, &mut Vec::new())? {
                Some(value) => {
                    fields.insert(name.clone(), value);
                }
                None => trace!(property = %name, "Property produced no value, leaving it out"),
            }
        }

        // Each supertype is layered over everything generated so far.
        for supertype in supertypes {
            match self.node(source, supertype, depth + 1, lineage)? {
                Some(Value::Object(inherited)) => fields.extend(inherited),
                Some(_) => debug!(
                    supertype = %source.describe(supertype),
                    "Supertype produced a non-object value, skipping merge"
                ),
                None => {}
            }
        }

        Ok(Some(Value::Object(fields)))
    }

    fn array<S: ShapeSource>(
        &mut self,
        source: &S,
        items: &[S::Node],
        constraints: &Constraints,
        depth: usize,
    ) -> GenerationResult<Option<Value>> {
        let defaults = source.item_bounds(self.settings);
        let min = constraints.min_items.unwrap_or(defaults.min);
        let max = constraints
            .max_items
            .unwrap_or_else(|| defaults.max.max(min))
            .max(min);
        let count = if self.over_budget() {
            min
        } else {
            self.rng.gen_range(min..=max)
        };

        let mut elements = Vec::with_capacity(count);
        for _ in 0..count {
            if elements.len() >= min && self.over_budget() {
                trace!(generated = self.generated, "Node budget spent, closing array");
                break;
            }
            let Some(item) = items.choose(&mut *self.rng) else {
                break;
            };
            if let Some(value) = self.node(source, item, depth + 1, &mut Vec::new())? {
                elements.push(value);
            }
        }

        if constraints.is_unique() {
            let drawn = elements.len();
            let mut unique: Vec<Value> = Vec::with_capacity(drawn);
            for element in elements {
                if !unique.contains(&element) {
                    unique.push(element);
                }
            }
            if unique.len() < drawn {
                trace!(drawn, kept = unique.len(), "Dropped duplicate array items");
            }
            elements = unique;
        }

        Ok(Some(Value::Array(elements)))
    }

    fn over_budget(&self) -> bool {
        self.generated >= self.settings.max_nodes
    }

    /// Generate every alternative and keep one of those that produced a value.
    fn union<S: ShapeSource>(
        &mut self,
        source: &S,
        alternatives: &[S::Node],
        depth: usize,
        lineage: &mut Vec<S::Node>,
    ) -> GenerationResult<Option<Value>> {
        let mut candidates = Vec::with_capacity(alternatives.len());
        for alternative in alternatives {
            if let Some(value) = self.node(source, alternative, depth + 1, lineage)? {
                candidates.push(value);
            }
        }

        if candidates.is_empty() {
            return Ok(None);
        }
        let chosen = self.rng.gen_range(0..candidates.len());
        Ok(Some(candidates.swap_remove(chosen)))
    }

    fn scalar<N>(&mut self, kind: &ShapeKind<N>, constraints: &Constraints) -> Option<Value> {
        if let Some(format) = &constraints.format {
            if let Some(generator) = self.formats.lookup(format) {
                return Some(generator(&mut *self.rng));
            }
            trace!(format = %format, "No generator registered for format, using generic generation");
        }

        match kind {
            ShapeKind::String => Some(Value::String(scalar::string(
                &mut *self.rng,
                constraints,
                self.settings,
            ))),
            ShapeKind::Number => Some(scalar::number(&mut *self.rng, constraints, self.settings, false)),
            ShapeKind::Integer => Some(scalar::number(&mut *self.rng, constraints, self.settings, true)),
            ShapeKind::Boolean => Some(Value::Bool(scalar::boolean(&mut *self.rng))),
            ShapeKind::Null => Some(Value::Null),
            ShapeKind::Any => scalar::example(&mut *self.rng, constraints),
            ShapeKind::Object { .. }
            | ShapeKind::Array { .. }
            | ShapeKind::Union { .. }
            | ShapeKind::Reference(_) => None,
        }
    }
}
