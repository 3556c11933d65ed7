//! Sample extraction callbacks.
//!
//! - [`full_text`]: indexes every word of a record's contents with value `1`.
//! - [`keywords`]: indexes each keyword in a front matter field with the
//!   record's base filename as value.
//!
//! Both work on any record that can expose a [`FileRecord`], including
//! records already decorated by another index.

use crate::emitter::Emitter;
use crate::error::IndexError;
use crate::facade::Decorated;
use crate::record::{FileRecord, Record};

impl AsRef<FileRecord> for FileRecord {
    fn as_ref(&self) -> &FileRecord {
        self
    }
}

impl<R: AsRef<FileRecord>, V> AsRef<FileRecord> for Decorated<R, V> {
    fn as_ref(&self) -> &FileRecord {
        self.record().as_ref()
    }
}

/// Configuration for the full-text tokenizer.
#[derive(Debug, Clone)]
pub struct TokenizerConfig {
    /// Minimum token length to index.
    pub min_token_length: usize,
    /// Maximum token length to index. Unbounded by default.
    pub max_token_length: usize,
    /// Whether tokens are lowercased.
    pub case_insensitive: bool,
}

impl Default for TokenizerConfig {
    fn default() -> Self {
        Self {
            min_token_length: 1,
            max_token_length: usize::MAX,
            case_insensitive: true,
        }
    }
}

impl TokenizerConfig {
    /// Creates a new tokenizer configuration with default values.
    #[must_use]
    pub fn new() -> Self {
        Self::default()
    }

    /// Sets minimum token length.
    #[must_use]
    pub fn min_length(mut self, len: usize) -> Self {
        self.min_token_length = len;
        self
    }

    /// Sets maximum token length.
    #[must_use]
    pub fn max_length(mut self, len: usize) -> Self {
        self.max_token_length = len;
        self
    }

    /// Keeps the original case of tokens.
    #[must_use]
    pub fn case_sensitive(mut self) -> Self {
        self.case_insensitive = false;
        self
    }

    /// Splits `text` into index tokens.
    ///
    /// Words are split on whitespace, stripped of every non-ASCII-letter
    /// character and optionally lowercased. Empty tokens and tokens outside
    /// the length bounds are dropped; repeated words are kept.
    pub fn tokenize(&self, text: &str) -> Vec<String> {
        text.split_whitespace()
            .map(|word| {
                let letters: String = word.chars().filter(char::is_ascii_alphabetic).collect();
                if self.case_insensitive {
                    letters.to_ascii_lowercase()
                } else {
                    letters
                }
            })
            .filter(|token| {
                !token.is_empty()
                    && token.len() >= self.min_token_length
                    && token.len() <= self.max_token_length
            })
            .collect()
    }
}

/// Builds a full-text indexer emitting `(token, 1)` for every token.
pub fn full_text<R>(config: TokenizerConfig) -> impl Fn(&R, Emitter<u32>) + Send + Sync
where
    R: AsRef<FileRecord>,
{
    move |record: &R, mut emitter: Emitter<u32>| {
        for token in config.tokenize(&record.as_ref().text()) {
            emitter.emit(token, 1);
        }
        emitter.done();
    }
}

/// Builds a keyword indexer over the front matter list `field`.
///
/// Emits `(keyword, basename)` for each keyword. A record without the field
/// or without a file name is rejected as malformed.
pub fn keywords<R>(field: &str) -> impl Fn(&R, Emitter<String>) + Send + Sync
where
    R: AsRef<FileRecord>,
{
    let field = field.to_string();
    move |record: &R, mut emitter: Emitter<String>| {
        let file = record.as_ref();
        let Some(keywords) = file.field(&field) else {
            emitter.reject(IndexError::malformed_record(
                file.identity(),
                format!("missing front matter field {field:?}"),
            ));
            return;
        };
        let Some(basename) = file.basename() else {
            emitter.reject(IndexError::malformed_record(
                file.identity(),
                "path has no file name",
            ));
            return;
        };

        for keyword in keywords {
            emitter.emit(keyword.clone(), basename.to_string());
        }
        emitter.done();
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::transform::build_index;

    #[test]
    fn tokenize_strips_and_lowercases() {
        let tokens = TokenizerConfig::default().tokenize("Hello, World! it's 42 foo-bar");
        assert_eq!(tokens, vec!["hello", "world", "its", "foobar"]);
    }

    #[test]
    fn tokenize_keeps_repeats() {
        let tokens = TokenizerConfig::default().tokenize("foo foo  bar\nfoo");
        assert_eq!(tokens, vec!["foo", "foo", "bar", "foo"]);
    }

    #[test]
    fn tokenize_respects_config() {
        let config = TokenizerConfig::new().min_length(3).max_length(4).case_sensitive();
        let tokens = config.tokenize("a an The Quick brown");
        assert_eq!(tokens, vec!["The"]);
    }

    #[test]
    fn tokenize_keeps_long_words_by_default() {
        let long = "a".repeat(300);
        let tokens = TokenizerConfig::default().tokenize(&format!("foo {long}"));
        assert_eq!(tokens, vec!["foo".to_string(), long.clone()]);

        let bounded = TokenizerConfig::new().max_length(256).tokenize(&format!("foo {long}"));
        assert_eq!(bounded, vec!["foo"]);
    }

    #[test]
    fn full_text_example() {
        let mut transform = build_index("fullText", full_text::<FileRecord>(TokenizerConfig::default())).unwrap();
        transform.push(FileRecord::new("a.md", "foo foo bar")).unwrap();
        transform.push(FileRecord::new("b.md", "foo baz")).unwrap();

        for decorated in transform.finish().unwrap() {
            let decorated = decorated.unwrap();
            let mut keys = decorated.all_indexed("allIndexedFullText").unwrap();
            keys.sort();
            assert_eq!(keys, vec!["bar", "baz", "foo"]);
            assert_eq!(
                decorated.lookup("lookupFullText", "foo").unwrap(),
                Some(vec![1, 1, 1])
            );
            assert_eq!(decorated.lookup("lookupFullText", "qux").unwrap(), None);
        }
    }

    #[test]
    fn keyword_example() {
        let record = FileRecord::new("/docs/doc.md", "").with_front_matter("keywords", ["x", "y"]);
        let mut transform = build_index("keywords", keywords::<FileRecord>("keywords")).unwrap();
        transform.push(record).unwrap();

        let decorated: Vec<_> = transform.finish().unwrap().collect();
        let decorated = decorated[0].as_ref().unwrap();
        assert_eq!(
            decorated.lookup("lookupKeywords", "x").unwrap(),
            Some(vec!["doc.md".to_string()])
        );
        assert_eq!(
            decorated.lookup("lookupKeywords", "y").unwrap(),
            Some(vec!["doc.md".to_string()])
        );
    }

    #[test]
    fn keyword_indexer_outlives_field_name() {
        let indexer = {
            let field = String::from("tags");
            keywords::<FileRecord>(&field)
        };
        let mut transform = build_index("tags", indexer).unwrap();
        transform
            .push(FileRecord::new("doc.md", "").with_front_matter("tags", ["home"]))
            .unwrap();

        let out: Vec<_> = transform.finish().unwrap().collect();
        assert_eq!(
            out[0].as_ref().unwrap().lookup("lookupTags", "home").unwrap(),
            Some(vec!["doc.md".to_string()])
        );
    }

    #[test]
    fn missing_keywords_is_malformed() {
        let mut transform = build_index("keywords", keywords::<FileRecord>("keywords")).unwrap();
        let err = transform.push(FileRecord::new("plain.md", "")).unwrap_err();

        assert!(matches!(err, IndexError::MalformedRecord { .. }));
        assert!(err.is_callback_error());
    }

    #[test]
    fn indexes_chain_over_decorated_records() {
        let record = FileRecord::new("doc.md", "kitchen sink").with_front_matter("tags", ["home"]);

        let mut words = build_index("fullText", full_text::<FileRecord>(TokenizerConfig::default())).unwrap();
        words.push(record).unwrap();
        let mut tags = build_index("tags", keywords::<Decorated<FileRecord, u32>>("tags")).unwrap();
        for decorated in words.finish().unwrap() {
            tags.push(decorated.unwrap()).unwrap();
        }

        let out: Vec<_> = tags.finish().unwrap().collect();
        let out = out[0].as_ref().unwrap();
        assert_eq!(out.lookup("lookupTags", "home").unwrap(), Some(vec!["doc.md".to_string()]));
        assert_eq!(
            out.record().lookup("lookupFullText", "sink").unwrap(),
            Some(vec![1])
        );
    }
}
