//! Tensor Operations for Attention
//!
//! A small row-major `f32` tensor with just the operations a single attention
//! head needs: projection matmuls, batched matmuls, transposition, scaling and
//! a numerically stable softmax.
//!
//! ## Core Concepts
//!
//! - **Data**: Flat `Vec<f32>` storing all elements in row-major order
//! - **Shape**: Dimensions of the tensor (e.g., `[batch, seq, dim]`)
//! - **Strides**: Step sizes for each dimension to compute flat indices
//!
//! ## Example
//!
//! ```rust
//! use attend::Tensor;
//!
//! // A batch of one 2x3 sequence projected by a 3x2 weight
//! let x = Tensor::new(vec![1.0, 2.0, 3.0, 4.0, 5.0, 6.0], vec![1, 2, 3]);
//! let w = Tensor::new(vec![1.0, 0.0, 0.0, 1.0, 1.0, 1.0], vec![3, 2]);
//! let y = x.matmul(&w);
//! assert_eq!(y.shape, vec![1, 2, 2]);
//! assert_eq!(y.data, vec![4.0, 5.0, 10.0, 11.0]);
//! ```
//!
//! ## Parallelism
//!
//! Batched matmul and softmax split work per batch element / per row with
//! Rayon. Each batch element is independent, so results do not depend on
//! scheduling order.

use rayon::prelude::*;

/// Work threshold (multiply-adds) above which 2D matmul splits rows across threads
const PARALLEL_MATMUL_WORK: usize = 4_096;

/// A multi-dimensional array of `f32` values
///
/// Row-major (C-style) layout. For shape `[2, 3]` the strides are `[3, 1]`:
/// one step along dimension 0 skips a whole row of three elements.
#[derive(Clone, Debug, PartialEq)]
pub struct Tensor {
    /// Flat storage of all tensor elements
    pub data: Vec<f32>,
    /// Shape of the tensor (dimensions)
    pub shape: Vec<usize>,
    /// Strides for each dimension (computed from shape)
    pub strides: Vec<usize>,
}

impl Tensor {
    /// Create a new tensor with given data and shape
    ///
    /// # Panics
    ///
    /// Panics if the product of shape dimensions doesn't equal data length.
    /// Fallible callers check shapes first and report an
    /// [`AttendError`](crate::AttendError) instead.
    ///
    /// # Example
    ///
    /// ```rust
    /// # use attend::Tensor;
    /// let tensor = Tensor::new(vec![1.0, 2.0, 3.0, 4.0], vec![2, 2]);
    /// assert_eq!(tensor.strides, vec![2, 1]);
    /// ```
    pub fn new(data: Vec<f32>, shape: Vec<usize>) -> Self {
        let expected: usize = shape.iter().product();
        assert_eq!(
            data.len(),
            expected,
            "Data length ({}) doesn't match shape {:?} (expected {})",
            data.len(),
            shape,
            expected
        );

        let strides = Self::compute_strides(&shape);
        Self {
            data,
            shape,
            strides,
        }
    }

    /// Create a tensor filled with zeros
    pub fn zeros(shape: Vec<usize>) -> Self {
        let size = shape.iter().product();
        Self::new(vec![0.0; size], shape)
    }

    /// Square identity matrix `[n, n]`
    pub fn eye(n: usize) -> Self {
        let mut data = vec![0.0; n * n];
        for i in 0..n {
            data[i * n + i] = 1.0;
        }
        Self::new(data, vec![n, n])
    }

    /// Row-major strides: for `[d0, d1, d2]` they are `[d1*d2, d2, 1]`
    fn compute_strides(shape: &[usize]) -> Vec<usize> {
        let mut strides = vec![1; shape.len()];
        for i in (0..shape.len().saturating_sub(1)).rev() {
            strides[i] = strides[i + 1] * shape[i + 1];
        }
        strides
    }

    /// Number of dimensions
    pub fn rank(&self) -> usize {
        self.shape.len()
    }

    /// Size of the last axis (0 for a scalar-shaped tensor)
    pub fn last_dim(&self) -> usize {
        self.shape.last().copied().unwrap_or(0)
    }

    /// Slice of row `i` along the last axis, counting rows across all leading dims
    ///
    /// # Panics
    ///
    /// Panics if `i` is not less than the number of rows.
    ///
    /// ```rust
    /// # use attend::Tensor;
    /// let t = Tensor::new(vec![1.0, 2.0, 3.0, 4.0, 5.0, 6.0], vec![1, 3, 2]);
    /// assert_eq!(t.row(2), &[5.0, 6.0]);
    /// ```
    pub fn row(&self, i: usize) -> &[f32] {
        let cols = self.last_dim();
        &self.data[i * cols..(i + 1) * cols]
    }

    /// Matrix multiplication
    ///
    /// Supported shape combinations:
    ///
    /// | left        | right       | result      | use                       |
    /// |-------------|-------------|-------------|---------------------------|
    /// | `[m, k]`    | `[k, n]`    | `[m, n]`    | plain matmul              |
    /// | `[b, m, k]` | `[k, n]`    | `[b, m, n]` | projection by shared weight |
    /// | `[b, m, k]` | `[b, k, n]` | `[b, m, n]` | batched (scores, `A·V`)   |
    ///
    /// # Panics
    ///
    /// Panics if the inner dimensions disagree or the ranks are unsupported.
    pub fn matmul(&self, other: &Tensor) -> Tensor {
        match (self.rank(), other.rank()) {
            (2, 2) => {
                let (m, k) = (self.shape[0], self.shape[1]);
                let n = other.shape[1];
                assert_eq!(
                    k, other.shape[0],
                    "Matrix dimensions incompatible: {:?} @ {:?}",
                    self.shape, other.shape
                );
                let mut out = vec![0.0; m * n];
                matmul_rows(&self.data, &other.data, &mut out, k, n);
                Tensor::new(out, vec![m, n])
            }
            (3, 2) => {
                // A shared weight applies to every row of every batch element,
                // so fold the batch into the row dimension.
                let (b, m, k) = (self.shape[0], self.shape[1], self.shape[2]);
                let n = other.shape[1];
                assert_eq!(
                    k, other.shape[0],
                    "Projection dimensions incompatible: {:?} @ {:?}",
                    self.shape, other.shape
                );
                let mut out = vec![0.0; b * m * n];
                matmul_rows(&self.data, &other.data, &mut out, k, n);
                Tensor::new(out, vec![b, m, n])
            }
            (3, 3) => {
                let (b, m, k) = (self.shape[0], self.shape[1], self.shape[2]);
                let n = other.shape[2];
                assert!(
                    other.shape[0] == b && other.shape[1] == k,
                    "Batched matmul incompatible: {:?} @ {:?}",
                    self.shape,
                    other.shape
                );
                let mut out = vec![0.0; b * m * n];
                if m * n > 0 {
                    out.par_chunks_mut(m * n)
                        .enumerate()
                        .for_each(|(batch, chunk)| {
                            let lhs = &self.data[batch * m * k..(batch + 1) * m * k];
                            let rhs = &other.data[batch * k * n..(batch + 1) * k * n];
                            matmul_seq(lhs, rhs, chunk, k, n);
                        });
                }
                Tensor::new(out, vec![b, m, n])
            }
            _ => panic!(
                "Unsupported matmul shapes: {:?} @ {:?}",
                self.shape, other.shape
            ),
        }
    }

    /// Swap two dimensions (negative indices count from the end)
    ///
    /// ```rust
    /// # use attend::Tensor;
    /// let t = Tensor::new(vec![1.0, 2.0, 3.0, 4.0, 5.0, 6.0], vec![2, 3]);
    /// let tt = t.transpose(-2, -1);
    /// assert_eq!(tt.shape, vec![3, 2]);
    /// assert_eq!(tt.data, vec![1.0, 4.0, 2.0, 5.0, 3.0, 6.0]);
    /// ```
    pub fn transpose(&self, dim1: isize, dim2: isize) -> Tensor {
        let d1 = self.axis(dim1);
        let d2 = self.axis(dim2);

        let mut new_shape = self.shape.clone();
        new_shape.swap(d1, d2);
        // Reading the source through swapped strides walks it in transposed order.
        let mut src_strides = self.strides.clone();
        src_strides.swap(d1, d2);

        let mut result = Vec::with_capacity(self.data.len());
        let mut coords = vec![0usize; new_shape.len()];
        for _ in 0..self.data.len() {
            let src: usize = coords
                .iter()
                .zip(&src_strides)
                .map(|(c, s)| c * s)
                .sum();
            result.push(self.data[src]);

            for axis in (0..coords.len()).rev() {
                coords[axis] += 1;
                if coords[axis] < new_shape[axis] {
                    break;
                }
                coords[axis] = 0;
            }
        }

        Tensor::new(result, new_shape)
    }

    /// Multiply all elements by scalar
    pub fn mul_scalar(&self, scalar: f32) -> Tensor {
        let result = self.data.par_iter().map(|&x| x * scalar).collect();
        Tensor::new(result, self.shape.clone())
    }

    /// Softmax along the last axis
    ///
    /// Each row is normalised independently:
    ///
    /// ```text
    /// softmax(x)[i] = exp(x[i] - max(x)) / sum_j exp(x[j] - max(x))
    /// ```
    ///
    /// Subtracting the row max keeps every exponent ≤ 0, so large scores cannot
    /// overflow. The normaliser is accumulated in `f64`.
    ///
    /// Infinite entries are handled explicitly: if a row holds `+inf`, those
    /// positions share the mass equally and all others get 0; a row of only
    /// `-inf` becomes uniform. NaN entries propagate.
    ///
    /// Only `axis = -1` (or the explicit last axis) is supported.
    ///
    /// # Example
    ///
    /// ```rust
    /// # use attend::Tensor;
    /// let logits = Tensor::new(vec![1000.0, 1000.0, 0.0, 0.0], vec![2, 2]);
    /// let probs = logits.softmax(-1);
    /// assert_eq!(probs.data, vec![0.5, 0.5, 0.5, 0.5]);
    /// ```
    pub fn softmax(&self, axis: isize) -> Tensor {
        assert_eq!(
            self.axis(axis),
            self.rank() - 1,
            "softmax is only implemented over the last axis"
        );

        let cols = self.last_dim();
        let mut result = self.data.clone();
        if cols > 0 {
            result.par_chunks_mut(cols).for_each(softmax_in_place);
        }
        Tensor::new(result, self.shape.clone())
    }

    fn axis(&self, axis: isize) -> usize {
        let rank = self.rank() as isize;
        let pos = if axis < 0 { rank + axis } else { axis };
        assert!(
            (0..rank).contains(&pos),
            "Axis {} out of range for shape {:?}",
            axis,
            self.shape
        );
        pos as usize
    }
}

/// Stable softmax of one row, in place
fn softmax_in_place(row: &mut [f32]) {
    let max = row.iter().fold(f32::NEG_INFINITY, |a, &b| a.max(b));

    // exp(inf - inf) is NaN: +inf entries split the mass, everything else gets 0
    if max == f32::INFINITY {
        let count = row.iter().filter(|&&x| x == f32::INFINITY).count();
        let share = (1.0f64 / count as f64) as f32;
        for x in row.iter_mut() {
            *x = if *x == f32::INFINITY { share } else { 0.0 };
        }
        return;
    }
    if row.iter().all(|&x| x == f32::NEG_INFINITY) {
        let share = (1.0f64 / row.len() as f64) as f32;
        row.fill(share);
        return;
    }

    let mut sum = 0.0f64;
    for x in row.iter_mut() {
        *x = (*x - max).exp();
        sum += *x as f64;
    }
    for x in row.iter_mut() {
        *x = (*x as f64 / sum) as f32;
    }
}

/// `out[m, n] = lhs[m, k] @ rhs[k, n]`, splitting rows across threads when large
fn matmul_rows(lhs: &[f32], rhs: &[f32], out: &mut [f32], k: usize, n: usize) {
    if n == 0 {
        return;
    }
    let m = out.len() / n;
    if m * n * k < PARALLEL_MATMUL_WORK {
        matmul_seq(lhs, rhs, out, k, n);
        return;
    }

    out.par_chunks_mut(n).enumerate().for_each(|(i, out_row)| {
        accumulate_row(&lhs[i * k..(i + 1) * k], rhs, out_row, n);
    });
}

/// Sequential `out = lhs @ rhs`; `out` must be zeroed
fn matmul_seq(lhs: &[f32], rhs: &[f32], out: &mut [f32], k: usize, n: usize) {
    if n == 0 {
        return;
    }
    for (i, out_row) in out.chunks_mut(n).enumerate() {
        accumulate_row(&lhs[i * k..(i + 1) * k], rhs, out_row, n);
    }
}

/// `out_row += lhs_row @ rhs`, walking `rhs` row by row so the inner loop is contiguous
#[inline(always)]
fn accumulate_row(lhs_row: &[f32], rhs: &[f32], out_row: &mut [f32], n: usize) {
    for (l, &a) in lhs_row.iter().enumerate() {
        let rhs_row = &rhs[l * n..(l + 1) * n];
        for (o, &b) in out_row.iter_mut().zip(rhs_row) {
            *o += a * b;
        }
    }
}
