//! Error types for the NEAT engine.

/// Errors raised by genome evaluation, mutation and the generational cycle.
#[derive(Debug, Clone, PartialEq, Eq, thiserror::Error)]
pub enum NeatError {
    /// Feed-forward was called with the wrong number of inputs.
    #[error("invalid number of inputs: expected {expected}, got {actual}")]
    InvalidInput {
        /// Declared input count of the genome.
        expected: usize,
        /// Length of the supplied input vector.
        actual: usize,
    },

    /// Feed-forward was called before the network could be evaluated.
    #[error("network not initialized: {0}")]
    UninitializedNetwork(&'static str),

    /// Reproduction was requested without any species to draw from.
    #[error("no species with positive fitness left to reproduce from")]
    EmptySpeciesPool,

    /// No valid node pair remained for a new connection.
    #[error("no valid node pair left for a new connection")]
    ExhaustedConnectionCandidates,

    /// A configuration value is out of range.
    #[error("invalid configuration: {0}")]
    InvalidConfig(String),
}

/// Result alias used throughout the crate.
pub type Result<T> = std::result::Result<T, NeatError>;
