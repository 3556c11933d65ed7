//! Test fixtures and run helpers.
//!
//! Provides in-memory record sets mirroring typical markdown document
//! collections, and temporary on-disk copies of them for tests that read
//! files.

use ignore::WalkBuilder;
use std::fs;
use std::path::{Path, PathBuf};
use streamdex_core::{
    Decorated, FileRecord, IndexResult, IndexTransform, Record, TransformStats,
};
use tempfile::TempDir;

/// Base directory of the virtual filesets.
pub const VIRTUAL_BASE: &str = "/virtual/docs";

/// Markdown documents for full-text indexing.
///
/// Across the set, the word `foo` occurs five times (any case).
pub fn sample_md_docs() -> Vec<FileRecord> {
    [
        ("intro.md", "Foo is the first word. Foo again, and bar."),
        ("guide/setup.md", "Setting up foo requires bar and baz."),
        ("guide/usage.md", "Use foo; then FOO! Nothing else."),
    ]
    .into_iter()
    .map(|(path, contents)| virtual_file(path, contents))
    .collect()
}

/// Documents with a `keywords` front matter list.
///
/// `kitchen` is declared by `kitchen.md` and `renovation.md`.
pub fn docs_with_keywords() -> Vec<FileRecord> {
    [
        ("kitchen.md", &["kitchen", "cooking"][..]),
        ("bathroom.md", &["bathroom", "plumbing"][..]),
        ("projects/renovation.md", &["kitchen", "bathroom", "budget"][..]),
    ]
    .into_iter()
    .map(|(path, keywords)| {
        virtual_file(path, format!("# {path}\n")).with_front_matter("keywords", keywords.iter().copied())
    })
    .collect()
}

fn virtual_file(relative: &str, contents: impl Into<Vec<u8>>) -> FileRecord {
    FileRecord::new(Path::new(VIRTUAL_BASE).join(relative), contents).with_base(VIRTUAL_BASE)
}

/// Pushes every record through `transform` and collects the decorated output.
pub fn run_index<R, V>(
    mut transform: IndexTransform<R, V>,
    records: impl IntoIterator<Item = R>,
) -> IndexResult<Vec<Decorated<R, V>>>
where
    R: Record,
    V: Clone + Send + Sync + 'static,
{
    for record in records {
        transform.push(record)?;
    }
    transform.finish()?.collect()
}

/// Like [`run_index`], also returning the run's counters.
pub fn run_index_with_stats<R, V>(
    mut transform: IndexTransform<R, V>,
    records: impl IntoIterator<Item = R>,
) -> IndexResult<(Vec<Decorated<R, V>>, TransformStats)>
where
    R: Record,
    V: Clone + Send + Sync + 'static,
{
    for record in records {
        transform.push(record)?;
    }
    let mut output = Vec::new();
    let stats = transform.finish_into(&mut output)?;
    Ok((output, stats))
}

/// A temporary directory of documents with automatic cleanup.
pub struct TempDocs {
    dir: TempDir,
}

impl TempDocs {
    /// Creates an empty temporary directory.
    pub fn new() -> Self {
        Self {
            dir: TempDir::new().expect("Failed to create temp directory"),
        }
    }

    /// Creates a directory holding the keyword documents, with front matter.
    pub fn with_keyword_docs() -> Self {
        let docs = Self::new();
        for record in docs_with_keywords() {
            let keywords = record.field("keywords").unwrap_or_default().join(", ");
            let body = format!("---\nkeywords: [{keywords}]\n---\n{}", record.text());
            docs.write(record.relative(), body);
        }
        docs
    }

    /// Creates a directory holding the full-text documents.
    pub fn with_md_docs() -> Self {
        let docs = Self::new();
        for record in sample_md_docs() {
            docs.write(record.relative(), &record.contents);
        }
        docs
    }

    /// Writes a file relative to the directory, creating parents.
    pub fn write(&self, relative: impl AsRef<Path>, contents: impl AsRef<[u8]>) -> PathBuf {
        let path = self.dir.path().join(relative);
        if let Some(parent) = path.parent() {
            fs::create_dir_all(parent).expect("Failed to create parent directory");
        }
        fs::write(&path, contents).expect("Failed to write document");
        path
    }

    /// Returns the directory path.
    pub fn path(&self) -> &Path {
        self.dir.path()
    }

    /// Returns every regular file under the directory, sorted.
    ///
    /// Symlinks are listed neither as files nor followed.
    pub fn files(&self) -> Vec<PathBuf> {
        WalkBuilder::new(self.dir.path())
            .standard_filters(false)
            .follow_links(false)
            .sort_by_file_path(|a, b| a.cmp(b))
            .build()
            .map(|entry| entry.expect("Failed to read directory entry"))
            .filter(|entry| entry.file_type().is_some_and(|t| t.is_file()))
            .map(|entry| entry.into_path())
            .collect()
    }
}

impl Default for TempDocs {
    fn default() -> Self {
        Self::new()
    }
}
