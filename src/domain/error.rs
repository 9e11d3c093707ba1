//! Error types for value generation

use thiserror::Error;

/// Hard failures that abort a generation call.
///
/// Everything recoverable (an unreadable external file, an unsupported keyword,
/// an unknown scalar type) degrades to "no value" for the affected node instead.
#[derive(Debug, Error, PartialEq)]
pub enum GenerationError {
    /// A reference chain revisited one of its own targets
    #[error("Cyclic reference chain: {}", chain.join(" -> "))]
    CyclicReference { chain: Vec<String> },

    /// A supertype was reached again while expanding its own lineage
    #[error("Cyclic inheritance: {}", chain.join(" -> "))]
    CyclicInheritance { chain: Vec<String> },

    /// The requested root type is missing from the type dictionary
    #[error("Unknown type: {0}")]
    UnknownType(String),
}

/// Result type alias for generation operations
pub type GenerationResult<T> = Result<T, GenerationError>;
