//! Self-Attention Mechanism
//!
//! A single attention head with no bias, no mask and no output projection:
//! every position looks at every position of the same sequence.
//!
//! ## Scaled Dot-Product Attention
//!
//! ```text
//! X: [batch, seq_len, d]
//!
//! Q, K, V = X @ W_q, X @ W_k, X @ W_v          [batch, seq_len, d]
//! scores  = (Q @ K^T) / √d                     [batch, seq_len, seq_len]
//! weights = softmax(scores, axis = -1)         each row sums to 1
//! output  = weights @ V                        [batch, seq_len, d]
//! ```
//!
//! Row `i` of `weights` says how much position `i` draws from each position
//! `j`; output row `i` is the matching convex combination of value vectors.
//!
//! ## Why Scaling?
//!
//! Dot products of `d`-dimensional vectors grow roughly with `√d`. Dividing by
//! `√d` keeps score magnitudes comparable across widths so softmax does not
//! saturate into a one-hot row. The factor is fixed, not a tunable.
//!
//! ## Degenerate Inputs
//!
//! - A sequence of length 1 attends only to itself: weights are `[[1.0]]`.
//! - All-zero embeddings give all-zero scores, which softmax turns into the
//!   uniform row `1/seq_len`. No special case is involved.
//!
//! ## Validation
//!
//! Input rank, emptiness, finiteness and the embedding dimension are checked
//! against the projection weights before the first matmul, so a bad call fails
//! without doing any work.
//!
//! Finite inputs can still overflow: scores past `f32::MAX` become `+inf` and
//! softmax gives those keys the whole row (split evenly between ties). A score
//! that comes out NaN (`inf - inf` inside a dot product) is reported as
//! [`AttendError::NonFinite`] rather than returned as weights.

use crate::error::{AttendError, Result};
use crate::tensor::Tensor;
use rand::rngs::StdRng;
use rand::{Rng, SeedableRng};

/// Query, key and value projection matrices, each `[d, d]`
#[derive(Clone, Debug)]
pub struct ProjectionWeights {
    w_q: Tensor,
    w_k: Tensor,
    w_v: Tensor,
}

impl ProjectionWeights {
    /// Bundle three projection matrices
    ///
    /// # Errors
    ///
    /// - [`AttendError::ShapeMismatch`] if a matrix is not 2D, square and non-empty
    /// - [`AttendError::DimensionMismatch`] if `W_k` or `W_v` differ in size from `W_q`
    /// - [`AttendError::NonFinite`] if any entry is NaN or infinite
    pub fn new(w_q: Tensor, w_k: Tensor, w_v: Tensor) -> Result<Self> {
        let dim = square_dim(&w_q)?;
        for (what, w) in [("W_k", &w_k), ("W_v", &w_v)] {
            let found = square_dim(w)?;
            if found != dim {
                return Err(AttendError::DimensionMismatch {
                    what,
                    expected: dim,
                    found,
                });
            }
        }
        for (what, w) in [("W_q", &w_q), ("W_k", &w_k), ("W_v", &w_v)] {
            if !all_finite(w) {
                return Err(AttendError::NonFinite { what });
            }
        }
        Ok(Self { w_q, w_k, w_v })
    }

    /// Random weights drawn uniformly from `[-1/√d, 1/√d)`
    ///
    /// This is the usual default for a bias-free linear layer with `d` inputs.
    pub fn random(dim: usize, seed: u64) -> Result<Self> {
        if dim == 0 {
            return Err(AttendError::InvalidConfig(
                "projection dimension must be at least 1".to_string(),
            ));
        }
        let bound = 1.0 / (dim as f32).sqrt();
        let mut rng = StdRng::seed_from_u64(seed);
        let mut matrix = || {
            let data = (0..dim * dim)
                .map(|_| rng.random_range(-bound..bound))
                .collect();
            Tensor::new(data, vec![dim, dim])
        };
        let (w_q, w_k, w_v) = (matrix(), matrix(), matrix());
        Ok(Self { w_q, w_k, w_v })
    }

    /// `W_q = W_k = W_v = I`, so `Q = K = V = X`
    ///
    /// Fails with [`AttendError::ShapeMismatch`] for `dim == 0`, like [`Self::new`].
    pub fn identity(dim: usize) -> Result<Self> {
        Self::new(Tensor::eye(dim), Tensor::eye(dim), Tensor::eye(dim))
    }

    /// Side length shared by all three matrices
    pub fn dim(&self) -> usize {
        self.w_q.shape[0]
    }

    /// Query projection `[d, d]`
    pub fn w_q(&self) -> &Tensor {
        &self.w_q
    }

    /// Key projection `[d, d]`
    pub fn w_k(&self) -> &Tensor {
        &self.w_k
    }

    /// Value projection `[d, d]`
    pub fn w_v(&self) -> &Tensor {
        &self.w_v
    }
}

fn square_dim(w: &Tensor) -> Result<usize> {
    if w.rank() != 2 || w.shape[0] != w.shape[1] || w.shape[0] == 0 {
        return Err(AttendError::ShapeMismatch {
            expected: "square [d, d] projection matrix with d >= 1".to_string(),
            found: w.shape.clone(),
        });
    }
    Ok(w.shape[0])
}

fn all_finite(t: &Tensor) -> bool {
    t.data.iter().all(|x| x.is_finite())
}

/// Result of a forward pass
#[derive(Clone, Debug)]
pub struct AttentionOutput {
    /// Aggregated values `[batch, seq_len, d]`
    pub output: Tensor,
    /// Attention weights `[batch, seq_len, seq_len]`; every row sums to 1
    pub weights: Tensor,
}

impl AttentionOutput {
    /// Number of sequences in the batch
    pub fn batch_size(&self) -> usize {
        self.weights.shape[0]
    }

    /// Positions per sequence
    pub fn seq_len(&self) -> usize {
        self.weights.shape[1]
    }

    /// Row-major `seq_len × seq_len` weight matrix of one batch element
    ///
    /// # Panics
    ///
    /// Panics if `batch >= self.batch_size()`.
    pub fn weights_for(&self, batch: usize) -> &[f32] {
        let n = self.seq_len() * self.seq_len();
        &self.weights.data[batch * n..(batch + 1) * n]
    }
}

/// Run scaled dot-product self-attention over `embedded`
///
/// # Arguments
///
/// * `embedded` - Input tensor `[batch, seq_len, d]`
/// * `weights` - Projection matrices of size `d`
///
/// # Errors
///
/// - [`AttendError::ShapeMismatch`] if `embedded` is not 3D
/// - [`AttendError::EmptySequence`] if `batch` or `seq_len` is 0
/// - [`AttendError::DimensionMismatch`] if `d != weights.dim()`
/// - [`AttendError::NonFinite`] if `embedded` holds NaN or infinity, or if the
///   scores or output overflow into NaN
///
/// # Example
///
/// ```rust
/// use attend::{self_attend, ProjectionWeights, Tensor};
///
/// let x = Tensor::zeros(vec![1, 4, 8]);
/// let out = self_attend(&x, &ProjectionWeights::identity(8).unwrap()).unwrap();
/// assert_eq!(out.output.shape, vec![1, 4, 8]);
/// assert!(out.weights.data.iter().all(|&w| w == 0.25));
/// ```
pub fn self_attend(embedded: &Tensor, weights: &ProjectionWeights) -> Result<AttentionOutput> {
    if embedded.rank() != 3 {
        return Err(AttendError::ShapeMismatch {
            expected: "[batch, seq_len, embed_dim]".to_string(),
            found: embedded.shape.clone(),
        });
    }
    let (batch, seq_len, dim) = (embedded.shape[0], embedded.shape[1], embedded.shape[2]);
    if batch == 0 || seq_len == 0 {
        return Err(AttendError::EmptySequence);
    }
    if dim != weights.dim() {
        return Err(AttendError::DimensionMismatch {
            what: "projection weights",
            expected: dim,
            found: weights.dim(),
        });
    }
    if !all_finite(embedded) {
        return Err(AttendError::NonFinite {
            what: "input embeddings",
        });
    }

    let q = embedded.matmul(&weights.w_q);
    let k = embedded.matmul(&weights.w_k);
    let v = embedded.matmul(&weights.w_v);

    let scale = 1.0 / (dim as f32).sqrt();
    let scores = q.matmul(&k.transpose(-2, -1)).mul_scalar(scale);
    if scores.data.iter().any(|x| x.is_nan()) {
        return Err(AttendError::NonFinite {
            what: "attention scores",
        });
    }
    let attn_weights = scores.softmax(-1);
    let output = attn_weights.matmul(&v);
    if output.data.iter().any(|x| x.is_nan()) {
        return Err(AttendError::NonFinite {
            what: "attention output",
        });
    }

    Ok(AttentionOutput {
        output,
        weights: attn_weights,
    })
}

/// Self-attention layer owning its projection weights
#[derive(Clone, Debug)]
pub struct SelfAttention {
    weights: ProjectionWeights,
}

impl SelfAttention {
    /// Layer using the given projections
    pub fn new(weights: ProjectionWeights) -> Self {
        Self { weights }
    }

    /// Layer with seeded random projections of size `dim`
    pub fn random(dim: usize, seed: u64) -> Result<Self> {
        Ok(Self::new(ProjectionWeights::random(dim, seed)?))
    }

    /// Projection matrices used by [`Self::forward`]
    pub fn weights(&self) -> &ProjectionWeights {
        &self.weights
    }

    /// Embedding width `d` the layer accepts
    pub fn embed_dim(&self) -> usize {
        self.weights.dim()
    }

    /// Forward pass over a batch `[batch, seq_len, d]`
    pub fn forward(&self, x: &Tensor) -> Result<AttentionOutput> {
        self_attend(x, &self.weights)
    }

    /// Forward pass over a single sequence `[seq_len, d]`, treated as batch 1
    pub fn forward_sequence(&self, x: &Tensor) -> Result<AttentionOutput> {
        if x.rank() != 2 {
            return Err(AttendError::ShapeMismatch {
                expected: "[seq_len, embed_dim]".to_string(),
                found: x.shape.clone(),
            });
        }
        let batched = Tensor::new(x.data.clone(), vec![1, x.shape[0], x.shape[1]]);
        self.forward(&batched)
    }
}
