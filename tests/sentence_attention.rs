//! End-to-end checks: sentence → indices → embeddings → attention

use attend::{
    self_attend, AttendError, AttentionModel, Config, EmbeddingTable, ProjectionWeights, Tensor,
    Vocabulary,
};

fn cat_vocab() -> Vocabulary {
    Vocabulary::new(["the", "cat", "sat", "on", "mat"]).unwrap()
}

#[test]
fn cat_sentence_indices_and_shapes() {
    let model = AttentionModel::new(cat_vocab(), &Config::demo()).unwrap();

    let indices = model.encode("The cat sat on the mat");
    assert_eq!(indices, vec![0, 1, 2, 3, 0, 4]);

    let embedded = model.embed(&indices).unwrap();
    assert_eq!(embedded.shape, vec![6, 8]);
    // "the" at positions 0 and 4 reads the same row
    assert_eq!(embedded.row(0), embedded.row(4));

    let out = model.attend(&model.embed_batch(&[indices]).unwrap()).unwrap();
    assert_eq!(out.output.shape, vec![1, 6, 8]);
    assert_eq!(out.weights.shape, vec![1, 6, 6]);
    for r in 0..6 {
        let sum: f64 = out.weights.row(r).iter().map(|&w| w as f64).sum();
        assert!((sum - 1.0).abs() < 1e-6);
        assert!(out.weights.row(r).iter().all(|&w| w >= 0.0));
    }
}

#[test]
fn unknown_word_maps_to_reserved_slot() {
    let vocab = cat_vocab();
    let idx = vocab.index_of("xyz");
    assert_eq!(idx, 5);
    assert!(vocab.iter().all(|(_, known)| known != idx));

    let table = EmbeddingTable::random(vocab.len(), 8, 1.0, 0).unwrap();
    assert_eq!(table.lookup(idx).unwrap().len(), 8);
}

#[test]
fn word_embedding_walkthrough() {
    let vocab = Vocabulary::new(["hello", "world", "this", "is", "a", "test"]).unwrap();
    let model = AttentionModel::new(vocab, &Config::word_embeddings()).unwrap();

    let indices = model.encode("hello world this is a simple test");
    assert_eq!(indices, vec![0, 1, 2, 3, 4, 6, 5]);

    let embedded = model.embed_batch(&[indices]).unwrap();
    assert_eq!(embedded.shape, vec![1, 7, 16]);
}

#[test]
fn mismatched_projection_fails_fast() {
    let table = EmbeddingTable::random(5, 8, 1.0, 0).unwrap();
    let embedded = table.embed_batch(&[vec![0, 1, 2, 3, 0, 4]]).unwrap();
    let small = ProjectionWeights::random(4, 0).unwrap();

    match self_attend(&embedded, &small) {
        Err(AttendError::DimensionMismatch {
            expected, found, ..
        }) => {
            assert_eq!(expected, 8);
            assert_eq!(found, 4);
        }
        other => panic!("expected DimensionMismatch, got {other:?}"),
    }
}

#[test]
fn single_token_attends_to_itself() {
    let model = AttentionModel::new(cat_vocab(), &Config::demo()).unwrap();
    let result = model.forward_text("cat").unwrap();
    assert_eq!(result.attention.weights.data, vec![1.0]);
}

#[test]
fn zero_embeddings_attend_uniformly() {
    let vocab = cat_vocab();
    let table = EmbeddingTable::from_tensor(Tensor::zeros(vec![vocab.table_rows(), 8])).unwrap();
    let model =
        AttentionModel::from_parts(vocab, table, ProjectionWeights::random(8, 3).unwrap()).unwrap();

    let result = model.forward_text("the cat sat on the mat").unwrap();
    let uniform = (1.0f64 / 6.0) as f32;
    assert!(result.attention.weights.data.iter().all(|&w| w == uniform));
}

#[test]
fn empty_input_is_rejected() {
    let model = AttentionModel::new(cat_vocab(), &Config::demo()).unwrap();
    assert!(matches!(model.embed(&[]), Err(AttendError::EmptySequence)));
    assert!(matches!(
        model.forward_text(""),
        Err(AttendError::EmptySequence)
    ));
}

#[test]
fn out_of_range_index_is_rejected() {
    let model = AttentionModel::new(cat_vocab(), &Config::demo()).unwrap();
    assert!(matches!(
        model.embed(&[0, 42]),
        Err(AttendError::InvalidIndex { index: 42, max: 5 })
    ));
}
