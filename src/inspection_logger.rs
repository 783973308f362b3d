//! Attention Logger and Console Formatting
//!
//! Attention weights are meant to be looked at. This module records them to a
//! CSV file for later analysis and prints compact summaries and tables to the
//! console.
//!
//! ## Example
//!
//! ```rust,no_run
//! use attend::{AttentionLogger, AttentionModel, Config, Vocabulary};
//!
//! let vocab = Vocabulary::new(["the", "cat", "sat"]).unwrap();
//! let model = AttentionModel::new(vocab, &Config::demo()).unwrap();
//! let result = model.forward_text("the cat sat").unwrap();
//!
//! let mut logger = AttentionLogger::new("attention_log.csv")
//!     .expect("Failed to create logger");
//! logger.log("demo", &result.tokens, &result.attention)
//!     .expect("Failed to log");
//! ```
//!
//! ## CSV Format
//!
//! One row per attention weight:
//! - `run`: Label passed to [`AttentionLogger::log`]
//! - `elapsed_seconds`: Time since the logger was created
//! - `batch`: Batch element
//! - `query_pos` / `query_token`: Position doing the attending
//! - `key_pos` / `key_token`: Position being attended to
//! - `weight`: Attention weight (each query row sums to 1)

use crate::attention::AttentionOutput;
use std::fs::File;
use std::io::Write;
use std::path::Path;
use std::time::Instant;

/// CSV + console logger for attention weights
pub struct AttentionLogger {
    log_file: File,
    start_time: Instant,
    rows_written: usize,
}

impl AttentionLogger {
    /// Create the CSV file and write its header
    pub fn new<P: AsRef<Path>>(log_path: P) -> std::io::Result<Self> {
        let mut log_file = File::create(log_path)?;
        writeln!(
            log_file,
            "run,elapsed_seconds,batch,query_pos,query_token,key_pos,key_token,weight"
        )?;

        Ok(Self {
            log_file,
            start_time: Instant::now(),
            rows_written: 0,
        })
    }

    /// Number of weight rows written so far (header excluded)
    pub fn rows_written(&self) -> usize {
        self.rows_written
    }

    /// Append every weight of `attention` and print a one-line summary
    ///
    /// `tokens` labels positions; missing labels are written as empty fields.
    pub fn log<S: AsRef<str>>(
        &mut self,
        run: &str,
        tokens: &[S],
        attention: &AttentionOutput,
    ) -> std::io::Result<()> {
        let elapsed = self.start_time.elapsed().as_secs_f32();
        let seq_len = attention.seq_len();
        let label = |pos: usize| tokens.get(pos).map(|t| csv_field(t.as_ref())).unwrap_or_default();

        for batch in 0..attention.batch_size() {
            let weights = attention.weights_for(batch);
            for q in 0..seq_len {
                for k in 0..seq_len {
                    writeln!(
                        self.log_file,
                        "{},{:.3},{},{},{},{},{},{:.6}",
                        csv_field(run),
                        elapsed,
                        batch,
                        q,
                        label(q),
                        k,
                        label(k),
                        weights[q * seq_len + k]
                    )?;
                    self.rows_written += 1;
                }
            }
        }

        // Every call leaves the file flushed
        self.log_file.flush()?;

        let focus: Vec<String> = (0..seq_len)
            .map(|q| {
                let row = &attention.weights_for(0)[q * seq_len..(q + 1) * seq_len];
                let k = argmax(row);
                match (tokens.get(q), tokens.get(k)) {
                    (Some(a), Some(b)) => format!("{}→{}", a.as_ref(), b.as_ref()),
                    _ => format!("{}→{}", q, k),
                }
            })
            .collect();
        println!(
            "[{:7.3}s] {} | weights {} | output {} | focus: {}",
            elapsed,
            run,
            format_shape(&attention.weights.shape),
            format_shape(&attention.output.shape),
            focus.join(" ")
        );

        Ok(())
    }
}

/// Quote a CSV field if it contains a separator, quote or newline
fn csv_field(s: &str) -> String {
    if s.contains([',', '"', '\n']) {
        format!("\"{}\"", s.replace('"', "\"\""))
    } else {
        s.to_string()
    }
}

fn argmax(row: &[f32]) -> usize {
    row.iter()
        .enumerate()
        .fold((0, f32::NEG_INFINITY), |(bi, bv), (i, &v)| {
            if v > bv {
                (i, v)
            } else {
                (bi, bv)
            }
        })
        .0
}

/// Render a shape like `(1, 6, 8)`
pub fn format_shape(shape: &[usize]) -> String {
    let dims: Vec<String> = shape.iter().map(usize::to_string).collect();
    format!("({})", dims.join(", "))
}

/// Fixed-width table of an `n × n` row-major weight matrix with token headers
///
/// # Panics
///
/// Panics if `weights` holds fewer than `n * n` values.
///
/// ```rust
/// # use attend::format_attention_table;
/// let table = format_attention_table(&["a", "b"], &[0.25, 0.75, 1.0, 0.0], 2);
/// assert!(table.contains("0.7500"));
/// assert_eq!(table.lines().count(), 3);
/// ```
pub fn format_attention_table<S: AsRef<str>>(tokens: &[S], weights: &[f32], n: usize) -> String {
    let name = |i: usize| {
        tokens
            .get(i)
            .map(|t| t.as_ref().to_string())
            .unwrap_or_else(|| format!("#{}", i))
    };
    let width = (0..n).map(|i| name(i).chars().count()).max().unwrap_or(0).max(6);

    let mut out = format!("{:width$}", "", width = width);
    for k in 0..n {
        out.push_str(&format!(" {:>width$}", name(k), width = width));
    }
    for q in 0..n {
        out.push('\n');
        out.push_str(&format!("{:width$}", name(q), width = width));
        for k in 0..n {
            out.push_str(&format!(" {:>width$.4}", weights[q * n + k], width = width));
        }
    }
    out
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::attention::{self_attend, ProjectionWeights};
    use crate::tensor::Tensor;
    use std::fs;

    #[test]
    fn test_format_shape() {
        assert_eq!(format_shape(&[1, 6, 8]), "(1, 6, 8)");
        assert_eq!(format_shape(&[]), "()");
    }

    #[test]
    fn test_csv_field_quoting() {
        assert_eq!(csv_field("cat"), "cat");
        assert_eq!(csv_field("a,b"), "\"a,b\"");
        assert_eq!(csv_field("say \"hi\""), "\"say \"\"hi\"\"\"");
    }

    #[test]
    fn test_argmax_prefers_first_maximum() {
        assert_eq!(argmax(&[0.1, 0.7, 0.2]), 1);
        assert_eq!(argmax(&[0.5, 0.5]), 0);
    }

    #[test]
    fn test_table_layout() {
        let table = format_attention_table(&["the", "cat"], &[0.5, 0.5, 0.1, 0.9], 2);
        let lines: Vec<&str> = table.lines().collect();
        assert_eq!(lines.len(), 3);
        assert!(lines[0].contains("the") && lines[0].contains("cat"));
        assert!(lines[2].starts_with("cat"));
        assert!(lines[2].contains("0.9000"));
        // Every line has the same width
        assert!(lines.iter().all(|l| l.len() == lines[0].len()));
    }

    #[test]
    #[should_panic]
    fn test_table_too_few_weights_panics() {
        format_attention_table(&["a", "b"], &[0.5, 0.5, 1.0], 2);
    }

    #[test]
    fn test_logger_writes_one_row_per_weight() {
        let dir = tempfile::tempdir().unwrap();
        let path = dir.path().join("attn.csv");

        let x = Tensor::zeros(vec![2, 3, 4]);
        let out = self_attend(&x, &ProjectionWeights::identity(4).unwrap()).unwrap();

        let mut logger = AttentionLogger::new(&path).unwrap();
        logger.log("zeros", &["a", "b,c", "d"], &out).unwrap();
        assert_eq!(logger.rows_written(), 18);

        let contents = fs::read_to_string(&path).unwrap();
        let lines: Vec<&str> = contents.lines().collect();
        assert_eq!(lines.len(), 19);
        assert!(lines[0].starts_with("run,elapsed_seconds,batch"));
        assert!(lines[1].starts_with("zeros,"));
        assert!(lines[1].ends_with(",0,a,0,a,0.333333"));
        assert!(lines[2].contains(",\"b,c\","));
    }
}
