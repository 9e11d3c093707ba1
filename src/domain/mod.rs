use rand::Rng;

use crate::config::{GeneratorSettings, ItemBounds};

pub mod error;
pub mod shape;

pub use error::{GenerationError, GenerationResult};
pub use shape::{Constraints, ShapeId, ShapeKind, ShapeNode};

/// A schema vocabulary the generator can walk.
///
/// Each implementation normalizes its own representation into [`ShapeNode`]s one
/// node at a time, addressing children with its own handle type.
pub trait ShapeSource {
    /// Handle of a node within this source.
    type Node: Clone + PartialEq;

    /// Normalize `node` into a shape. `Ok(None)` means the node produces no value.
    ///
    /// Resolution that involves chance (composition keywords) draws from `rng`, so it
    /// happens afresh every time a node is visited.
    fn shape<R: Rng + ?Sized>(
        &self,
        node: &Self::Node,
        rng: &mut R,
    ) -> GenerationResult<Option<ShapeNode<Self::Node>>>;

    /// Array length bounds used when a node declares none.
    fn item_bounds(&self, settings: &GeneratorSettings) -> ItemBounds;

    /// Human-readable label for `node`, used in logs and cycle reports.
    fn describe(&self, node: &Self::Node) -> String;
}
