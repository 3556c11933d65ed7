//! Full-text command implementation.

use super::{build_report, print_report, Query};
use streamdex_core::extract::{full_text, TokenizerConfig};
use streamdex_core::{FileRecord, TransformConfig};

/// Index name used by the full-text command.
pub const INDEX_NAME: &str = "fullText";

/// Runs the full-text command.
pub fn run(
    query: &Query,
    config: TransformConfig,
    capacity: usize,
    case_sensitive: bool,
    min_length: usize,
) -> Result<(), Box<dyn std::error::Error>> {
    let mut tokenizer = TokenizerConfig::new().min_length(min_length);
    if case_sensitive {
        tokenizer = tokenizer.case_sensitive();
    }

    let report = build_report(
        query,
        INDEX_NAME,
        full_text::<FileRecord>(tokenizer),
        config,
        capacity,
    )?;
    print_report(&report, &query.format)
}

#[cfg(test)]
mod tests {
    use super::*;
    use streamdex_testkit::prelude::*;

    #[test]
    fn counts_word_occurrences() {
        let docs = TempDocs::with_md_docs();
        let query = Query {
            paths: vec![docs.path().to_path_buf()],
            base: None,
            lookup: Some("foo".to_string()),
            keys: true,
            format: "json".to_string(),
        };

        let report = build_report(
            &query,
            INDEX_NAME,
            full_text::<FileRecord>(TokenizerConfig::default()),
            TransformConfig::default(),
            2,
        )
        .unwrap();

        assert_eq!(report.lookup.unwrap().values.unwrap().len(), 5);
        assert!(report.keys.unwrap().contains(&"baz".to_string()));
    }

    #[test]
    fn run_prints_json() {
        let docs = TempDocs::with_md_docs();
        let query = Query {
            paths: vec![docs.path().to_path_buf()],
            base: None,
            lookup: Some("bar".to_string()),
            keys: false,
            format: "json".to_string(),
        };

        run(&query, TransformConfig::default().max_in_flight(4), 4, false, 1).unwrap();
    }
}
