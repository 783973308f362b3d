//! Word Vocabulary and Tokenization
//!
//! A fixed word-level vocabulary that maps token strings to dense indices
//! `0..len`, plus the whitespace tokenizer used to turn sentences into tokens.
//!
//! ## Unknown Tokens
//!
//! The vocabulary reserves exactly one extra index, `len()`, for every word it
//! does not know. Lookup never fails: an out-of-vocabulary word always resolves
//! to that slot, which can never collide with a known word. This is why an
//! embedding table for a vocabulary of `n` words has `n + 1` rows.
//!
//! ```text
//! {"the": 0, "cat": 1, "sat": 2, "on": 3, "mat": 4}    unknown = 5
//!
//! "The cat sat on the mat" → [0, 1, 2, 3, 0, 4]
//! "the xyz"                → [0, 5]
//! ```
//!
//! The vocabulary size is fixed at construction. Growing it later would change
//! the unknown index and break the shape of any table built for it.
//!
//! ## Example
//!
//! ```rust
//! use attend::Vocabulary;
//!
//! let vocab = Vocabulary::new(["the", "cat", "sat", "on", "mat"]).unwrap();
//! assert_eq!(vocab.encode("The cat sat on the mat"), vec![0, 1, 2, 3, 0, 4]);
//! assert_eq!(vocab.index_of("xyz"), vocab.unknown_index());
//! ```

use crate::error::{AttendError, Result};
use serde::{Deserialize, Serialize};
use std::collections::{BTreeMap, HashMap};
use std::fs;
use std::path::Path;

/// Split text into lowercase whitespace-separated tokens
///
/// ```rust
/// # use attend::tokenize;
/// assert_eq!(tokenize("  The Cat\tsat\n"), vec!["the", "cat", "sat"]);
/// ```
pub fn tokenize(text: &str) -> Vec<String> {
    text.split_whitespace().map(str::to_lowercase).collect()
}

/// Immutable token → index mapping with a reserved unknown slot
///
/// Serialized as a JSON object `{"token": index, ...}`. Deserialization goes
/// through the same validation as [`Vocabulary::from_map`].
#[derive(Clone, Debug, PartialEq, Eq, Serialize, Deserialize)]
#[serde(
    try_from = "BTreeMap<String, usize>",
    into = "BTreeMap<String, usize>"
)]
pub struct Vocabulary {
    /// Tokens in index order
    tokens: Vec<String>,
    index: HashMap<String, usize>,
}

impl Vocabulary {
    /// Build a vocabulary, assigning indices in iteration order
    ///
    /// # Errors
    ///
    /// [`AttendError::DuplicateToken`] if a token appears twice.
    pub fn new<I, S>(tokens: I) -> Result<Self>
    where
        I: IntoIterator<Item = S>,
        S: Into<String>,
    {
        let mut vocab = Self {
            tokens: Vec::new(),
            index: HashMap::new(),
        };
        for token in tokens {
            let token = token.into();
            if vocab.index.contains_key(&token) {
                return Err(AttendError::DuplicateToken(token));
            }
            vocab.index.insert(token.clone(), vocab.tokens.len());
            vocab.tokens.push(token);
        }
        Ok(vocab)
    }

    /// Build a vocabulary from an explicit token → index map
    ///
    /// The indices must be exactly `0..map.len()`, each used once.
    pub fn from_map<M>(map: M) -> Result<Self>
    where
        M: IntoIterator<Item = (String, usize)>,
    {
        let mut pairs: Vec<(String, usize)> = map.into_iter().collect();
        pairs.sort_by_key(|(_, idx)| *idx);

        for (expected, (token, idx)) in pairs.iter().enumerate() {
            if *idx != expected {
                return Err(AttendError::InvalidVocabulary(format!(
                    "token {:?} has index {}, expected {} (indices must be 0..{})",
                    token,
                    idx,
                    expected,
                    pairs.len()
                )));
            }
        }

        Self::new(pairs.into_iter().map(|(token, _)| token))
    }

    /// Number of known tokens
    pub fn len(&self) -> usize {
        self.tokens.len()
    }

    pub fn is_empty(&self) -> bool {
        self.tokens.is_empty()
    }

    /// Reserved index shared by every out-of-vocabulary token
    pub fn unknown_index(&self) -> usize {
        self.tokens.len()
    }

    /// Rows an embedding table needs for this vocabulary (known + unknown)
    pub fn table_rows(&self) -> usize {
        self.tokens.len() + 1
    }

    /// Index of `token`, or the unknown index if it is not in the vocabulary
    pub fn index_of(&self, token: &str) -> usize {
        self.index
            .get(token)
            .copied()
            .unwrap_or_else(|| self.unknown_index())
    }

    /// Token string for `index`; `None` for the unknown slot or beyond
    pub fn token(&self, index: usize) -> Option<&str> {
        self.tokens.get(index).map(String::as_str)
    }

    /// Whether `token` is a known word
    pub fn contains(&self, token: &str) -> bool {
        self.index.contains_key(token)
    }

    /// Map each token to its index
    pub fn tokens_to_indices<S: AsRef<str>>(&self, tokens: &[S]) -> Vec<usize> {
        tokens.iter().map(|t| self.index_of(t.as_ref())).collect()
    }

    /// Tokenize `text` and map it to indices
    pub fn encode(&self, text: &str) -> Vec<usize> {
        self.tokens_to_indices(&tokenize(text))
    }

    /// Iterate over `(token, index)` pairs in index order
    pub fn iter(&self) -> impl Iterator<Item = (&str, usize)> {
        self.tokens.iter().enumerate().map(|(i, t)| (t.as_str(), i))
    }

    /// Save to a JSON file
    pub fn save<P: AsRef<Path>>(&self, path: P) -> Result<()> {
        let json = serde_json::to_string_pretty(self)?;
        fs::write(path, json)?;
        Ok(())
    }

    /// Load from a JSON file written by [`Vocabulary::save`] (or any
    /// `{"token": index}` object with indices `0..n`)
    pub fn load<P: AsRef<Path>>(path: P) -> Result<Self> {
        let json = fs::read_to_string(path)?;
        let vocab: Vocabulary = serde_json::from_str(&json)?;
        Ok(vocab)
    }
}

impl TryFrom<BTreeMap<String, usize>> for Vocabulary {
    type Error = AttendError;

    fn try_from(map: BTreeMap<String, usize>) -> Result<Self> {
        Self::from_map(map)
    }
}

impl From<Vocabulary> for BTreeMap<String, usize> {
    fn from(vocab: Vocabulary) -> Self {
        vocab.index.into_iter().collect()
    }
}
