//! Error Types
//!
//! Every fallible operation in the crate returns [`AttendError`]. Input errors
//! are raised before any computation on the offending input starts; numeric
//! overflow into NaN is caught before a result is handed back, so a failed
//! call never produces a partial result.

use thiserror::Error;

/// Errors produced by vocabulary, embedding, attention and config operations
#[derive(Debug, Error)]
pub enum AttendError {
    /// A projection matrix does not match the embedding dimension
    #[error("Dimension mismatch for {what}: expected {expected}, found {found}")]
    DimensionMismatch {
        /// Which operand was checked
        what: &'static str,
        /// Dimension required by the other operand
        expected: usize,
        /// Dimension actually supplied
        found: usize,
    },

    /// Zero-length sequence (or empty batch)
    #[error("Empty sequence: attention needs at least one position")]
    EmptySequence,

    /// Token index outside `[0, max]`
    #[error("Invalid token index {index} (valid range is 0..={max})")]
    InvalidIndex {
        /// Offending index
        index: usize,
        /// Largest valid index (the reserved unknown slot)
        max: usize,
    },

    /// NaN or infinity where finite values are required
    #[error("Non-finite values in {what}")]
    NonFinite {
        /// Which tensor held the value
        what: &'static str,
    },

    /// Tensor has the wrong rank or shape for the operation
    #[error("Shape mismatch: expected {expected}, found {found:?}")]
    ShapeMismatch {
        /// Human readable description of the required shape
        expected: String,
        /// Shape actually supplied
        found: Vec<usize>,
    },

    /// Sequences in a batch are not all the same length
    #[error("Ragged batch: sequence {position} has length {found}, expected {expected}")]
    RaggedBatch {
        /// Length of the first sequence
        expected: usize,
        /// Length of the offending sequence
        found: usize,
        /// Position of the offending sequence in the batch
        position: usize,
    },

    /// Token appears twice while building a vocabulary
    #[error("Duplicate token in vocabulary: {0:?}")]
    DuplicateToken(String),

    /// Vocabulary indices are not exactly `0..len`
    #[error("Invalid vocabulary: {0}")]
    InvalidVocabulary(String),

    /// Configuration value out of range
    #[error("Invalid config: {0}")]
    InvalidConfig(String),

    #[error(transparent)]
    Io(#[from] std::io::Error),

    #[error(transparent)]
    Json(#[from] serde_json::Error),
}

/// Crate-wide result alias
pub type Result<T> = std::result::Result<T, AttendError>;
