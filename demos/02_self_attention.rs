//! Self-Attention Walkthrough
//!
//! Runs one head of scaled dot-product self-attention over
//! "The cat sat on the mat" and prints every intermediate value.
//!
//! # Usage
//!
//! ```bash
//! cargo run --release --example 02_self_attention
//! ```

use attend::{format_attention_table, format_shape, AttentionModel, Config, Vocabulary};

fn main() -> Result<(), Box<dyn std::error::Error>> {
    println!("\n{}", "=".repeat(70));
    println!("  Self-Attention");
    println!("{}", "=".repeat(70));

    let vocab = Vocabulary::new(["the", "cat", "sat", "on", "mat"])?;
    let config = Config::demo();
    let model = AttentionModel::new(vocab, &config)?;

    let sentence = "The cat sat on the mat";
    let result = model.forward_text(sentence)?;

    // ========== Tokens ==========
    println!("\n{}", "─".repeat(70));
    println!("1. Tokens and Indices");
    println!("{}", "─".repeat(70));
    println!("\nSentence:      {:?}", sentence);
    println!("Tokens:        {:?}", result.tokens);
    println!("Token indices: {:?}", result.indices);

    // ========== Embeddings ==========
    println!("\n{}", "─".repeat(70));
    println!("2. Token Embeddings {}", format_shape(&result.embedded.shape));
    println!("{}", "─".repeat(70));
    for (pos, token) in result.tokens.iter().enumerate() {
        let row: Vec<String> = result
            .embedded
            .row(pos)
            .iter()
            .map(|v| format!("{:+.3}", v))
            .collect();
        println!("  {:>4}: [{}]", token, row.join(", "));
    }

    // ========== Output ==========
    let attention = &result.attention;
    println!("\n{}", "─".repeat(70));
    println!("3. Self-Attention Output {}", format_shape(&attention.output.shape));
    println!("{}", "─".repeat(70));
    for (pos, token) in result.tokens.iter().enumerate() {
        let row: Vec<String> = attention
            .output
            .row(pos)
            .iter()
            .map(|v| format!("{:+.3}", v))
            .collect();
        println!("  {:>4}: [{}]", token, row.join(", "));
    }

    // ========== Weights ==========
    println!("\n{}", "─".repeat(70));
    println!("4. Attention Weights {}", format_shape(&attention.weights.shape));
    println!("{}", "─".repeat(70));
    println!(
        "\n{}",
        format_attention_table(&result.tokens, attention.weights_for(0), attention.seq_len())
    );

    println!("\nEach row sums to 1.0: row i shows where token i looks.");
    println!("Scores were scaled by 1/√{} before the softmax.", config.embedding_dim);
    println!();
    Ok(())
}
