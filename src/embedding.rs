//! Token Embedding Lookup
//!
//! Converts token indices to dense vectors by reading rows out of a table.
//!
//! ## Shape Transformation
//!
//! ```text
//! Table:  [vocab_size + 1, embedding_dim]     (last row = unknown token)
//! Input:  [seq_len] or [batch, seq_len]       (token indices)
//! Output: [seq_len, embedding_dim] or [batch, seq_len, embedding_dim]
//! ```
//!
//! Lookup is a pure function of the table and the indices: the same index
//! always yields the same row. Every index is range checked before any row is
//! copied, so a bad index never produces a partial tensor.

use crate::error::{AttendError, Result};
use crate::tensor::Tensor;
use rand::rngs::StdRng;
use rand::SeedableRng;
use rand_distr::{Distribution, Normal};

/// Read-only embedding table of shape `[vocab_size + 1, embedding_dim]`
#[derive(Clone, Debug)]
pub struct EmbeddingTable {
    /// Embedding weight matrix
    weight: Tensor,
}

impl EmbeddingTable {
    /// Create a table with `vocab_size + 1` rows drawn from `N(0, init_std)`
    ///
    /// `vocab_size` counts known tokens only; the extra row is the reserved
    /// unknown slot. The same `seed` always produces the same table.
    ///
    /// # Arguments
    ///
    /// * `vocab_size` - Number of known tokens
    /// * `embedding_dim` - Width of each embedding vector
    /// * `init_std` - Standard deviation of the initial weights
    /// * `seed` - RNG seed
    pub fn random(
        vocab_size: usize,
        embedding_dim: usize,
        init_std: f32,
        seed: u64,
    ) -> Result<Self> {
        if embedding_dim == 0 {
            return Err(AttendError::InvalidConfig(
                "embedding_dim must be at least 1".to_string(),
            ));
        }
        let normal = Normal::new(0.0f32, init_std)
            .map_err(|e| AttendError::InvalidConfig(format!("init_std {init_std}: {e}")))?;
        let mut rng = StdRng::seed_from_u64(seed);

        let rows = vocab_size + 1;
        let data: Vec<f32> = (0..rows * embedding_dim)
            .map(|_| normal.sample(&mut rng))
            .collect();

        Ok(Self {
            weight: Tensor::new(data, vec![rows, embedding_dim]),
        })
    }

    /// Wrap an existing `[rows, embedding_dim]` matrix
    ///
    /// The last row is treated as the unknown slot, so `rows` must be at least 1.
    pub fn from_tensor(weight: Tensor) -> Result<Self> {
        if weight.rank() != 2 || weight.shape[0] == 0 || weight.shape[1] == 0 {
            return Err(AttendError::ShapeMismatch {
                expected: "[vocab_size + 1, embedding_dim] with both dims > 0".to_string(),
                found: weight.shape.clone(),
            });
        }
        Ok(Self { weight })
    }

    /// Number of known tokens (rows minus the unknown slot)
    pub fn vocab_size(&self) -> usize {
        self.weight.shape[0] - 1
    }

    /// Index of the reserved unknown row
    pub fn unknown_index(&self) -> usize {
        self.vocab_size()
    }

    /// Width `d` of every embedding vector
    pub fn embedding_dim(&self) -> usize {
        self.weight.shape[1]
    }

    /// The full table
    pub fn weight(&self) -> &Tensor {
        &self.weight
    }

    /// Embedding vector for one index in `[0, vocab_size]`
    ///
    /// # Errors
    ///
    /// [`AttendError::InvalidIndex`] if `index > vocab_size`.
    pub fn lookup(&self, index: usize) -> Result<&[f32]> {
        self.check_index(index)?;
        Ok(self.weight.row(index))
    }

    /// Embed one sequence → `[seq_len, embedding_dim]`
    ///
    /// # Example
    ///
    /// ```rust
    /// # use attend::EmbeddingTable;
    /// let table = EmbeddingTable::random(5, 8, 1.0, 42).unwrap();
    /// let x = table.embed(&[0, 1, 2, 3, 0, 4]).unwrap();
    /// assert_eq!(x.shape, vec![6, 8]);
    /// assert_eq!(x.row(0), x.row(4));
    /// ```
    pub fn embed(&self, indices: &[usize]) -> Result<Tensor> {
        if indices.is_empty() {
            return Err(AttendError::EmptySequence);
        }
        for &index in indices {
            self.check_index(index)?;
        }

        let dim = self.embedding_dim();
        let mut output = Vec::with_capacity(indices.len() * dim);
        for &index in indices {
            output.extend_from_slice(self.weight.row(index));
        }
        Ok(Tensor::new(output, vec![indices.len(), dim]))
    }

    /// Embed a batch of equal-length sequences → `[batch, seq_len, embedding_dim]`
    ///
    /// Padding or truncation to a common length is the caller's job.
    ///
    /// # Errors
    ///
    /// - [`AttendError::EmptySequence`] for an empty batch or empty sequences
    /// - [`AttendError::RaggedBatch`] if lengths differ
    /// - [`AttendError::InvalidIndex`] for any out-of-range index
    pub fn embed_batch(&self, batch: &[Vec<usize>]) -> Result<Tensor> {
        let seq_len = batch.first().map(Vec::len).unwrap_or(0);
        if seq_len == 0 {
            return Err(AttendError::EmptySequence);
        }
        for (position, seq) in batch.iter().enumerate() {
            if seq.len() != seq_len {
                return Err(AttendError::RaggedBatch {
                    expected: seq_len,
                    found: seq.len(),
                    position,
                });
            }
            for &index in seq {
                self.check_index(index)?;
            }
        }

        let dim = self.embedding_dim();
        let mut output = Vec::with_capacity(batch.len() * seq_len * dim);
        for &index in batch.iter().flatten() {
            output.extend_from_slice(self.weight.row(index));
        }
        Ok(Tensor::new(output, vec![batch.len(), seq_len, dim]))
    }

    fn check_index(&self, index: usize) -> Result<()> {
        let max = self.vocab_size();
        if index > max {
            return Err(AttendError::InvalidIndex { index, max });
        }
        Ok(())
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_random_table_has_unknown_row() {
        let table = EmbeddingTable::random(5, 8, 1.0, 7).unwrap();
        assert_eq!(table.weight().shape, vec![6, 8]);
        assert_eq!(table.vocab_size(), 5);
        assert_eq!(table.unknown_index(), 5);
        assert!(table.lookup(5).is_ok());
    }

    #[test]
    fn test_same_seed_same_table() {
        let a = EmbeddingTable::random(3, 4, 1.0, 99).unwrap();
        let b = EmbeddingTable::random(3, 4, 1.0, 99).unwrap();
        let c = EmbeddingTable::random(3, 4, 1.0, 100).unwrap();
        assert_eq!(a.weight(), b.weight());
        assert_ne!(a.weight(), c.weight());
    }

    #[test]
    fn test_repeated_lookup_is_identical() {
        let table = EmbeddingTable::random(5, 8, 1.0, 1).unwrap();
        let x = table.embed(&[0, 1, 2, 3, 0, 4]).unwrap();
        assert_eq!(x.row(0), x.row(4));
        assert_eq!(x.row(0), table.lookup(0).unwrap());
        assert_eq!(table.lookup(0).unwrap(), table.lookup(0).unwrap());
    }

    #[test]
    fn test_invalid_index_rejected() {
        let table = EmbeddingTable::random(5, 8, 1.0, 1).unwrap();
        assert!(matches!(
            table.lookup(6),
            Err(AttendError::InvalidIndex { index: 6, max: 5 })
        ));
        assert!(matches!(
            table.embed(&[0, 1, 6]),
            Err(AttendError::InvalidIndex { index: 6, max: 5 })
        ));
    }

    #[test]
    fn test_invalid_index_in_later_batch_sequence() {
        let table = EmbeddingTable::random(5, 8, 1.0, 1).unwrap();
        assert!(matches!(
            table.embed_batch(&[vec![0], vec![9]]),
            Err(AttendError::InvalidIndex { index: 9, max: 5 })
        ));
    }

    #[test]
    fn test_empty_sequence_rejected() {
        let table = EmbeddingTable::random(5, 8, 1.0, 1).unwrap();
        assert!(matches!(table.embed(&[]), Err(AttendError::EmptySequence)));
        assert!(matches!(table.embed_batch(&[]), Err(AttendError::EmptySequence)));
        assert!(matches!(
            table.embed_batch(&[vec![]]),
            Err(AttendError::EmptySequence)
        ));
    }

    #[test]
    fn test_embed_batch_shape_and_rows() {
        let table = EmbeddingTable::random(5, 4, 1.0, 3).unwrap();
        let x = table.embed_batch(&[vec![0, 1, 2], vec![4, 5, 0]]).unwrap();
        assert_eq!(x.shape, vec![2, 3, 4]);
        assert_eq!(x.row(3), table.lookup(4).unwrap());
        assert_eq!(x.row(4), table.lookup(5).unwrap());
        assert_eq!(x.row(5), x.row(0));
    }

    #[test]
    fn test_ragged_batch_rejected() {
        let table = EmbeddingTable::random(5, 4, 1.0, 3).unwrap();
        let err = table.embed_batch(&[vec![0, 1], vec![2]]).unwrap_err();
        assert!(matches!(
            err,
            AttendError::RaggedBatch {
                expected: 2,
                found: 1,
                position: 1
            }
        ));
    }

    #[test]
    fn test_from_tensor_validates_shape() {
        let ok = EmbeddingTable::from_tensor(Tensor::new(vec![1.0, 2.0], vec![1, 2])).unwrap();
        assert_eq!(ok.vocab_size(), 0);
        assert_eq!(ok.lookup(0).unwrap(), &[1.0, 2.0]);

        let bad = EmbeddingTable::from_tensor(Tensor::zeros(vec![0, 4]));
        assert!(matches!(bad, Err(AttendError::ShapeMismatch { .. })));
        let flat = EmbeddingTable::from_tensor(Tensor::zeros(vec![4]));
        assert!(matches!(flat, Err(AttendError::ShapeMismatch { .. })));
    }

    #[test]
    fn test_bad_init_std_rejected() {
        let err = EmbeddingTable::random(5, 4, -1.0, 3).unwrap_err();
        assert!(matches!(err, AttendError::InvalidConfig(_)));
        let err = EmbeddingTable::random(5, 0, 1.0, 3).unwrap_err();
        assert!(matches!(err, AttendError::InvalidConfig(_)));
    }
}
