pub mod combinator_resolver;
pub mod constraint_document;
pub mod format_registry;
pub mod reference_resolver;
pub mod type_graph;
