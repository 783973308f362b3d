//! Attend: Token Embeddings and Self-Attention from Scratch
//!
//! A small, dependency-light implementation of the first two steps of a
//! transformer: looking up token embeddings and running one head of scaled
//! dot-product self-attention over them. Written to be read.
//!
//! # Modules
//!
//! - [`vocab`] - Word vocabulary with a reserved unknown-token slot
//! - [`embedding`] - Embedding table lookup
//! - [`attention`] - Scaled dot-product self-attention
//! - [`model`] - Configuration and the bundled [`AttentionModel`]
//! - [`tensor`] - The minimal tensor type the above are built on
//! - [`inspection_logger`] - CSV logging and console tables for attention weights
//! - [`error`] - [`AttendError`]
//!
//! # Example
//!
//! ```rust
//! use attend::{AttentionModel, Config, Vocabulary};
//!
//! let vocab = Vocabulary::new(["the", "cat", "sat", "on", "mat"])?;
//! let model = AttentionModel::new(vocab, &Config::demo())?;
//!
//! let indices = model.encode("The cat sat on the xyz");
//! assert_eq!(indices, vec![0, 1, 2, 3, 0, 5]); // "xyz" → unknown slot
//!
//! let embedded = model.embed_batch(&[indices])?;
//! let out = model.attend(&embedded)?;
//! assert_eq!(out.output.shape, vec![1, 6, 8]);
//! assert_eq!(out.weights.shape, vec![1, 6, 6]);
//! # Ok::<(), attend::AttendError>(())
//! ```

pub mod attention;
pub mod embedding;
pub mod error;
pub mod inspection_logger;
pub mod model;
pub mod tensor;
pub mod vocab;

// Re-export main types for convenience
pub use attention::{self_attend, AttentionOutput, ProjectionWeights, SelfAttention};
pub use embedding::EmbeddingTable;
pub use error::{AttendError, Result};
pub use inspection_logger::{format_attention_table, format_shape, AttentionLogger};
pub use model::{AttentionModel, Config, TextAttention};
pub use tensor::Tensor;
pub use vocab::{tokenize, Vocabulary};
