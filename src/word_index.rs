//! Sample client: text tokenization and a bag-of-words document index.
//!
//! This layer is deliberately thin: it consumes only `(key, value)` pairs
//! through [`ChainTable`]'s public operations and knows nothing about the
//! table's internals. The table, in turn, has no awareness of text.

use crate::chain_table::ChainTable;

// p2-style corpora are small; a modest prime keeps early growth visible.
const INDEX_CAPACITY: usize = 13;

/// Split `text` into lowercase, alphanumeric-only word tokens.
///
/// Words are whitespace-separated; any non-alphanumeric characters inside
/// a word are stripped, and words that become empty are dropped.
pub fn tokenize(text: &str) -> Vec<String> {
    text.split_whitespace()
        .filter_map(|raw| {
            let word: String = raw
                .chars()
                .filter(|c| c.is_alphanumeric())
                .flat_map(char::to_lowercase)
                .collect();
            if word.is_empty() {
                None
            } else {
                Some(word)
            }
        })
        .collect()
}

/// Bag-of-words index: each word maps to the ascending, deduplicated list
/// of document indices containing it.
pub struct WordIndex {
    table: ChainTable<String, Vec<usize>>,
}

impl WordIndex {
    /// Build an index over `docs`, numbering documents from zero in input
    /// order. Documents with no tokens contribute nothing but still
    /// consume an index.
    pub fn from_documents<I, D>(docs: I) -> Self
    where
        I: IntoIterator<Item = D>,
        D: AsRef<str>,
    {
        let mut table: ChainTable<String, Vec<usize>> = ChainTable::with_capacity(INDEX_CAPACITY);

        for (doc_id, doc) in docs.into_iter().enumerate() {
            let mut words = tokenize(doc.as_ref());
            if words.is_empty() {
                continue;
            }
            words.sort();
            words.dedup();

            for word in words {
                match table.get_mut(word.as_str()) {
                    Ok(ids) => {
                        // Documents arrive in ascending order, so a doc id
                        // can only ever duplicate the last one recorded.
                        if ids.last() != Some(&doc_id) {
                            ids.push(doc_id);
                        }
                    }
                    Err(_) => table.set(word, vec![doc_id]),
                }
            }
        }

        Self { table }
    }

    /// The ascending document ids containing `word`, if any.
    pub fn documents_for(&self, word: &str) -> Option<&[usize]> {
        self.table.get(word).ok().map(Vec::as_slice)
    }

    pub fn contains_word(&self, word: &str) -> bool {
        self.table.contains_key(word)
    }

    /// Number of distinct words indexed.
    pub fn word_count(&self) -> usize {
        self.table.len()
    }

    /// The underlying table, for external traversal and reporting.
    pub fn table(&self) -> &ChainTable<String, Vec<usize>> {
        &self.table
    }
}
