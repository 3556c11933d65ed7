//! Property-based test generators using proptest.
//!
//! Provides strategies for generating index names, documents and
//! entry sequences.

use proptest::prelude::*;
use streamdex_core::FileRecord;

/// Strategy for generating valid index names.
pub fn index_name_strategy() -> impl Strategy<Value = String> {
    prop::string::string_regex("[a-zA-Z_][a-zA-Z0-9_]{0,15}").expect("Invalid regex")
}

/// Strategy for generating lowercase words from a small vocabulary.
///
/// A small alphabet keeps keys colliding across documents.
pub fn word_strategy() -> impl Strategy<Value = String> {
    prop::string::string_regex("[a-e]{1,3}").expect("Invalid regex")
}

/// Strategy for generating a document: a list of words.
pub fn document_strategy() -> impl Strategy<Value = Vec<String>> {
    prop::collection::vec(word_strategy(), 0..12)
}

/// Strategy for generating a corpus of documents.
pub fn corpus_strategy(max_docs: usize) -> impl Strategy<Value = Vec<Vec<String>>> {
    prop::collection::vec(document_strategy(), 0..max_docs)
}

/// Turns generated documents into records named `doc<N>.md`.
pub fn corpus_records(corpus: &[Vec<String>]) -> Vec<FileRecord> {
    corpus
        .iter()
        .enumerate()
        .map(|(i, words)| FileRecord::new(format!("doc{i}.md"), words.join(" ")))
        .collect()
}

/// Configuration for property tests.
#[derive(Debug, Clone)]
pub struct PropTestConfig {
    /// Number of test cases to run.
    pub cases: u32,
    /// Maximum shrink iterations.
    pub max_shrink_iters: u32,
}

impl Default for PropTestConfig {
    fn default() -> Self {
        Self {
            cases: 256,
            max_shrink_iters: 1000,
        }
    }
}

impl PropTestConfig {
    /// Creates a configuration for quick tests.
    #[must_use]
    pub fn quick() -> Self {
        Self {
            cases: 32,
            max_shrink_iters: 100,
        }
    }

    /// Converts to proptest config.
    #[must_use]
    pub fn to_proptest_config(&self) -> ProptestConfig {
        ProptestConfig {
            cases: self.cases,
            max_shrink_iters: self.max_shrink_iters,
            ..ProptestConfig::default()
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use streamdex_core::FacadeNames;

    proptest! {
        #![proptest_config(PropTestConfig::quick().to_proptest_config())]

        #[test]
        fn generated_names_are_accepted(name in index_name_strategy()) {
            prop_assert!(FacadeNames::derive(&name).is_ok());
        }

        #[test]
        fn corpus_records_match_documents(corpus in corpus_strategy(6)) {
            let records = corpus_records(&corpus);
            prop_assert_eq!(records.len(), corpus.len());
            for (record, words) in records.iter().zip(&corpus) {
                prop_assert_eq!(record.text(), words.join(" "));
            }
        }
    }
}
