//! Keywords command implementation.

use super::{build_report, print_report, Query};
use streamdex_core::extract::keywords;
use streamdex_core::{FileRecord, TransformConfig};

/// Index name used by the keywords command.
pub const INDEX_NAME: &str = "keywords";

/// Runs the keywords command over the front matter list `field`.
pub fn run(
    query: &Query,
    config: TransformConfig,
    capacity: usize,
    field: &str,
) -> Result<(), Box<dyn std::error::Error>> {
    let report = build_report(
        query,
        INDEX_NAME,
        keywords::<FileRecord>(field),
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
    fn custom_field() {
        let docs = TempDocs::new();
        docs.write("a.md", "---\ntags:\n  - rust\n  - cli\n---\nbody\n");
        docs.write("b.md", "---\ntags: [rust]\n---\nbody\n");
        let query = Query {
            paths: vec![docs.path().to_path_buf()],
            base: None,
            lookup: Some("rust".to_string()),
            keys: true,
            format: "text".to_string(),
        };

        let report = build_report(
            &query,
            "tags",
            keywords::<FileRecord>("tags"),
            TransformConfig::default(),
            1,
        )
        .unwrap();

        assert_eq!(report.lookup_facade, "lookupTags");
        assert_eq!(
            report.lookup.unwrap().values,
            Some(vec!["a.md".to_string(), "b.md".to_string()])
        );
        assert_eq!(report.keys, Some(vec!["rust".to_string(), "cli".to_string()]));
    }

    #[test]
    fn missing_field_fails() {
        let docs = TempDocs::with_keyword_docs();
        let query = Query {
            paths: vec![docs.path().to_path_buf()],
            base: None,
            lookup: None,
            keys: false,
            format: "text".to_string(),
        };

        assert!(run(&query, TransformConfig::default(), 1, "tags").is_err());
    }
}
