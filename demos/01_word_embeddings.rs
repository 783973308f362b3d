//! Word Embeddings Walkthrough
//!
//! Tokenize a sentence, map the words to vocabulary indices (with an unknown
//! slot for words the vocabulary has never seen) and look up a dense vector
//! for each one.
//!
//! # Usage
//!
//! ```bash
//! cargo run --release --example 01_word_embeddings
//! ```

use attend::{format_shape, tokenize, EmbeddingTable, Vocabulary};

fn main() -> Result<(), Box<dyn std::error::Error>> {
    println!("\n{}", "=".repeat(70));
    println!("  Word Embeddings");
    println!("{}", "=".repeat(70));

    // ========== Tokenization ==========
    println!("\n{}", "─".repeat(70));
    println!("1. Tokenization");
    println!("{}", "─".repeat(70));

    let input_text = "hello world this is a simple test";
    let tokens = tokenize(input_text);
    println!("\nInput:  {:?}", input_text);
    println!("Tokens: {:?}", tokens);

    // ========== Vocabulary ==========
    println!("\n{}", "─".repeat(70));
    println!("2. Vocabulary Lookup");
    println!("{}", "─".repeat(70));

    let vocab = Vocabulary::new(["hello", "world", "this", "is", "a", "test"])?;
    println!("\nVocabulary ({} words):", vocab.len());
    for (token, index) in vocab.iter() {
        println!("  {:>6} → {}", token, index);
    }
    println!("  <unk>  → {}", vocab.unknown_index());

    let indices = vocab.tokens_to_indices(&tokens);
    println!("\nToken indices: {:?}", indices);
    println!("  ('simple' is not in the vocabulary, so it gets the unknown index)");

    // ========== Embedding Lookup ==========
    println!("\n{}", "─".repeat(70));
    println!("3. Embedding Lookup");
    println!("{}", "─".repeat(70));

    let embedding_dim = 16;
    let table = EmbeddingTable::random(vocab.len(), embedding_dim, 1.0, 42)?;
    println!(
        "\nEmbedding table shape: {} ({} words + unknown, {} dims)",
        format_shape(&table.weight().shape),
        vocab.len(),
        embedding_dim
    );

    let embedded = table.embed_batch(&[indices.clone()])?;
    println!("Embedded output shape: {}", format_shape(&embedded.shape));

    for (pos, (token, &index)) in tokens.iter().zip(&indices).enumerate() {
        let row = embedded.row(pos);
        let preview: Vec<String> = row.iter().take(4).map(|v| format!("{:+.3}", v)).collect();
        println!("  {:>6} [{}] → [{}, ...]", token, index, preview.join(", "));
    }

    println!();
    Ok(())
}
