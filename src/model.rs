//! Attention Model: Vocabulary + Embeddings + Self-Attention
//!
//! Bundles everything a forward pass needs into one immutable value:
//!
//! ```text
//! "The cat sat on the mat"
//!     ↓ tokenize + vocabulary lookup
//! [0, 1, 2, 3, 0, 4]                      [seq_len]
//!     ↓ embedding table
//! X                                        [1, seq_len, d]
//!     ↓ self-attention (W_q, W_k, W_v)
//! output [1, seq_len, d], weights [1, seq_len, seq_len]
//! ```
//!
//! Nothing is global: build an [`AttentionModel`] once from a [`Vocabulary`]
//! and a [`Config`], then share it by reference. All methods take `&self`.
//!
//! ## Example
//!
//! ```rust
//! use attend::{AttentionModel, Config, Vocabulary};
//!
//! let vocab = Vocabulary::new(["the", "cat", "sat", "on", "mat"]).unwrap();
//! let model = AttentionModel::new(vocab, &Config::demo()).unwrap();
//!
//! let result = model.forward_text("The cat sat on the mat").unwrap();
//! assert_eq!(result.indices, vec![0, 1, 2, 3, 0, 4]);
//! assert_eq!(result.attention.weights.shape, vec![1, 6, 6]);
//! ```

use crate::attention::{self_attend, AttentionOutput, ProjectionWeights, SelfAttention};
use crate::embedding::EmbeddingTable;
use crate::error::{AttendError, Result};
use crate::tensor::Tensor;
use crate::vocab::{tokenize, Vocabulary};
use serde::{Deserialize, Serialize};
use std::fs;
use std::path::Path;

/// Model configuration
///
/// # Fields
///
/// - `embedding_dim`: Width of embeddings and of the square projections
/// - `init_std`: Standard deviation of the random embedding table
/// - `seed`: Seed for embeddings; projections use `seed + 1`
#[derive(Clone, Debug, PartialEq, Serialize, Deserialize)]
pub struct Config {
    pub embedding_dim: usize,
    pub init_std: f32,
    pub seed: u64,
}

impl Default for Config {
    fn default() -> Self {
        Self::demo()
    }
}

impl Config {
    /// Self-attention walkthrough: 8-dimensional embeddings
    pub fn demo() -> Self {
        Self {
            embedding_dim: 8,
            init_std: 1.0, // standard normal, like a freshly initialised embedding layer
            seed: 42,
        }
    }

    /// Word-embedding walkthrough: 16-dimensional embeddings
    pub fn word_embeddings() -> Self {
        Self {
            embedding_dim: 16,
            ..Self::demo()
        }
    }

    /// Reject configurations that cannot build a model
    pub fn validate(&self) -> Result<()> {
        if self.embedding_dim == 0 {
            return Err(AttendError::InvalidConfig(
                "embedding_dim must be at least 1".to_string(),
            ));
        }
        if !self.init_std.is_finite() || self.init_std <= 0.0 {
            return Err(AttendError::InvalidConfig(format!(
                "init_std must be positive and finite, got {}",
                self.init_std
            )));
        }
        Ok(())
    }

    /// Save as pretty JSON
    pub fn save<P: AsRef<Path>>(&self, path: P) -> Result<()> {
        let json = serde_json::to_string_pretty(self)?;
        fs::write(path, json)?;
        Ok(())
    }

    /// Load from JSON and validate
    pub fn load<P: AsRef<Path>>(path: P) -> Result<Self> {
        let json = fs::read_to_string(path)?;
        let config: Config = serde_json::from_str(&json)?;
        config.validate()?;
        Ok(config)
    }
}

/// Tokens, indices and attention for one input sentence
#[derive(Clone, Debug)]
pub struct TextAttention {
    pub tokens: Vec<String>,
    pub indices: Vec<usize>,
    pub embedded: Tensor,
    pub attention: AttentionOutput,
}

/// Immutable bundle of vocabulary, embedding table and projection weights
#[derive(Clone, Debug)]
pub struct AttentionModel {
    vocab: Vocabulary,
    embedding: EmbeddingTable,
    attention: SelfAttention,
}

impl AttentionModel {
    /// Build a model with seeded random embeddings and projections
    pub fn new(vocab: Vocabulary, config: &Config) -> Result<Self> {
        config.validate()?;
        let embedding = EmbeddingTable::random(
            vocab.len(),
            config.embedding_dim,
            config.init_std,
            config.seed,
        )?;
        let weights = ProjectionWeights::random(config.embedding_dim, config.seed.wrapping_add(1))?;
        Self::from_parts(vocab, embedding, weights)
    }

    /// Assemble a model from pre-built parts
    ///
    /// # Errors
    ///
    /// - [`AttendError::ShapeMismatch`] if the table does not have one row per
    ///   token plus the unknown row
    /// - [`AttendError::DimensionMismatch`] if the table width differs from the
    ///   projection size
    pub fn from_parts(
        vocab: Vocabulary,
        embedding: EmbeddingTable,
        weights: ProjectionWeights,
    ) -> Result<Self> {
        if embedding.weight().shape[0] != vocab.table_rows() {
            return Err(AttendError::ShapeMismatch {
                expected: format!(
                    "embedding table with {} rows ({} tokens + unknown)",
                    vocab.table_rows(),
                    vocab.len()
                ),
                found: embedding.weight().shape.clone(),
            });
        }
        if embedding.embedding_dim() != weights.dim() {
            return Err(AttendError::DimensionMismatch {
                what: "projection weights",
                expected: embedding.embedding_dim(),
                found: weights.dim(),
            });
        }
        Ok(Self {
            vocab,
            embedding,
            attention: SelfAttention::new(weights),
        })
    }

    /// Vocabulary used by [`Self::encode`]
    pub fn vocab(&self) -> &Vocabulary {
        &self.vocab
    }

    /// Embedding table
    pub fn embedding(&self) -> &EmbeddingTable {
        &self.embedding
    }

    /// Query, key and value projections
    pub fn projections(&self) -> &ProjectionWeights {
        self.attention.weights()
    }

    /// Width `d` of embeddings and projections
    pub fn embedding_dim(&self) -> usize {
        self.embedding.embedding_dim()
    }

    /// Tokenize and map to indices; unknown words get the reserved index
    pub fn encode(&self, text: &str) -> Vec<usize> {
        self.vocab.encode(text)
    }

    /// Embed one sequence → `[seq_len, d]`
    pub fn embed(&self, indices: &[usize]) -> Result<Tensor> {
        self.embedding.embed(indices)
    }

    /// Embed equal-length sequences → `[batch, seq_len, d]`
    pub fn embed_batch(&self, batch: &[Vec<usize>]) -> Result<Tensor> {
        self.embedding.embed_batch(batch)
    }

    /// Self-attention over already embedded input `[batch, seq_len, d]`
    pub fn attend(&self, embedded: &Tensor) -> Result<AttentionOutput> {
        self_attend(embedded, self.attention.weights())
    }

    /// Full pipeline for one sentence
    ///
    /// # Errors
    ///
    /// [`AttendError::EmptySequence`] if `text` contains no tokens.
    pub fn forward_text(&self, text: &str) -> Result<TextAttention> {
        let tokens = tokenize(text);
        let indices = self.vocab.tokens_to_indices(&tokens);
        let embedded = self.embed(&indices)?;
        let batched = Tensor::new(
            embedded.data.clone(),
            vec![1, indices.len(), self.embedding_dim()],
        );
        let attention = self.attention.forward(&batched)?;

        Ok(TextAttention {
            tokens,
            indices,
            embedded,
            attention,
        })
    }
}
