//! Attention Inspection CLI
//!
//! Run self-attention over arbitrary sentences and log the weights to CSV.
//!
//! ## Usage
//!
//! ```bash
//! # Default vocabulary and config
//! cargo run --release --example 03_inspect -- --text "the cat sat on the mat"
//!
//! # Several sentences, wider embeddings, CSV log
//! cargo run --release --example 03_inspect -- \
//!     --text "the cat sat" --text "the mat sat on the cat" \
//!     --dim 16 --seed 7 --log attention.csv
//!
//! # Vocabulary and config from JSON
//! cargo run --release --example 03_inspect -- \
//!     --vocab vocab.json --config config.json --text "hello world"
//! ```
//!
//! A vocabulary file is a JSON object `{"token": index, ...}` with indices
//! `0..n`; a config file holds `embedding_dim`, `init_std` and `seed`.

use attend::{format_attention_table, AttentionLogger, AttentionModel, Config, Vocabulary};
use clap::Parser;

#[derive(Parser)]
#[command(
    name = "inspect",
    about = "Run single-head self-attention over sentences and inspect the weights"
)]
struct Args {
    /// Sentence to run (repeatable)
    #[arg(long, required = true)]
    text: Vec<String>,

    /// Vocabulary JSON file (defaults to the-cat-sat-on-the-mat words)
    #[arg(long)]
    vocab: Option<String>,

    /// Config JSON file
    #[arg(long)]
    config: Option<String>,

    /// Embedding dimension (overrides config)
    #[arg(long)]
    dim: Option<usize>,

    /// Random seed (overrides config)
    #[arg(long)]
    seed: Option<u64>,

    /// Write every attention weight to this CSV file
    #[arg(long)]
    log: Option<String>,

    /// Save the effective config as JSON and exit
    #[arg(long)]
    save_config: Option<String>,
}

fn main() -> Result<(), Box<dyn std::error::Error>> {
    let args = Args::parse();

    let mut config = match &args.config {
        Some(path) => Config::load(path)?,
        None => Config::demo(),
    };
    if let Some(dim) = args.dim {
        config.embedding_dim = dim;
    }
    if let Some(seed) = args.seed {
        config.seed = seed;
    }
    config.validate()?;

    if let Some(path) = &args.save_config {
        config.save(path)?;
        println!("Saved config to {}", path);
        return Ok(());
    }

    let vocab = match &args.vocab {
        Some(path) => Vocabulary::load(path)?,
        None => Vocabulary::new(["the", "cat", "sat", "on", "mat"])?,
    };

    println!(
        "Vocabulary: {} words (+ unknown) | embedding_dim: {} | seed: {}",
        vocab.len(),
        config.embedding_dim,
        config.seed
    );
    let model = AttentionModel::new(vocab, &config)?;

    let mut logger = match &args.log {
        Some(path) => Some(AttentionLogger::new(path)?),
        None => None,
    };

    for (i, text) in args.text.iter().enumerate() {
        let result = match model.forward_text(text) {
            Ok(result) => result,
            Err(e) => {
                eprintln!("Skipping {:?}: {}", text, e);
                continue;
            }
        };

        println!("\n{}", "─".repeat(70));
        println!("{:?} → {:?}", text, result.indices);
        println!("{}", "─".repeat(70));
        println!(
            "{}",
            format_attention_table(
                &result.tokens,
                result.attention.weights_for(0),
                result.attention.seq_len()
            )
        );

        if let Some(logger) = logger.as_mut() {
            logger.log(&format!("text{}", i), &result.tokens, &result.attention)?;
        }
    }

    if let (Some(logger), Some(path)) = (&logger, &args.log) {
        println!("\nWrote {} weights to {}", logger.rows_written(), path);
    }
    Ok(())
}
