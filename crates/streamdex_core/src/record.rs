//! Records flowing through the transform.

use std::collections::BTreeMap;
use std::path::{Path, PathBuf};

/// A unit of streamed work.
///
/// The transform never inspects a record's payload. It only needs to clone
/// it for decoration and to name it in errors and logs.
pub trait Record: Clone + Send + 'static {
    /// Returns a human-readable identity (typically a path).
    fn identity(&self) -> String;

    /// Returns the facade names already attached to this record.
    ///
    /// Plain records carry none. Decorated records report theirs so a
    /// second index cannot silently overwrite them.
    fn capability_names(&self) -> Vec<String> {
        Vec::new()
    }
}

/// A file-like record: path, contents and parsed front matter.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct FileRecord {
    /// Absolute or working-directory-relative path.
    pub path: PathBuf,
    /// Base directory the path is relative to, if known.
    pub base: Option<PathBuf>,
    /// Raw file contents.
    pub contents: Vec<u8>,
    /// List-valued front matter fields, e.g. `keywords`.
    pub front_matter: BTreeMap<String, Vec<String>>,
}

impl FileRecord {
    /// Creates a record with the given path and contents.
    pub fn new(path: impl Into<PathBuf>, contents: impl Into<Vec<u8>>) -> Self {
        Self {
            path: path.into(),
            base: None,
            contents: contents.into(),
            front_matter: BTreeMap::new(),
        }
    }

    /// Sets the base directory.
    #[must_use]
    pub fn with_base(mut self, base: impl Into<PathBuf>) -> Self {
        self.base = Some(base.into());
        self
    }

    /// Sets a list-valued front matter field.
    #[must_use]
    pub fn with_front_matter<I, S>(mut self, field: impl Into<String>, values: I) -> Self
    where
        I: IntoIterator<Item = S>,
        S: Into<String>,
    {
        self.front_matter
            .insert(field.into(), values.into_iter().map(Into::into).collect());
        self
    }

    /// Parses a leading `---` front matter block out of `contents`.
    ///
    /// The block is removed from `contents`. Files without a block are
    /// returned unchanged. Only a flat subset of YAML is understood:
    ///
    /// - `field: [a, b]` flow lists
    /// - `field:` followed by `- item` lines
    /// - `field: value` scalars, stored as a one-item list
    ///
    /// Single or double quotes around an item are stripped. Comment lines
    /// and indented nested keys are skipped. Multi-line strings, anchors
    /// and nested mappings are not interpreted.
    pub fn parse(path: impl Into<PathBuf>, raw: &[u8]) -> Self {
        let path = path.into();
        let text = String::from_utf8_lossy(raw);
        let Some((block, body)) = split_front_matter(&text) else {
            return Self::new(path, raw.to_vec());
        };

        let mut record = Self::new(path, body.as_bytes().to_vec());
        record.front_matter = parse_list_fields(block);
        record
    }

    /// Returns the final path component as a string.
    pub fn basename(&self) -> Option<&str> {
        self.path.file_name().and_then(|name| name.to_str())
    }

    /// Returns the path relative to `base`, or the full path without one.
    pub fn relative(&self) -> &Path {
        self.base
            .as_deref()
            .and_then(|base| self.path.strip_prefix(base).ok())
            .unwrap_or(&self.path)
    }

    /// Returns the contents decoded as UTF-8, replacing invalid sequences.
    pub fn text(&self) -> String {
        String::from_utf8_lossy(&self.contents).into_owned()
    }

    /// Returns a list-valued front matter field.
    pub fn field(&self, name: &str) -> Option<&[String]> {
        self.front_matter.get(name).map(Vec::as_slice)
    }
}

impl Record for FileRecord {
    fn identity(&self) -> String {
        self.relative().display().to_string()
    }
}

fn split_front_matter(text: &str) -> Option<(&str, &str)> {
    let rest = text
        .strip_prefix("---\n")
        .or_else(|| text.strip_prefix("---\r\n"))?;
    let end = rest.find("\n---")?;
    let block = &rest[..end];
    let after = &rest[end + 4..];
    let body = after
        .strip_prefix("\r\n")
        .or_else(|| after.strip_prefix('\n'))
        .unwrap_or(after);
    Some((block, body))
}

fn parse_list_fields(block: &str) -> BTreeMap<String, Vec<String>> {
    let mut fields = BTreeMap::new();
    let mut current: Option<String> = None;

    for line in block.lines() {
        let trimmed = line.trim();
        if trimmed.is_empty() || trimmed.starts_with('#') {
            continue;
        }

        if let Some(item) = trimmed.strip_prefix("- ") {
            if let Some(field) = &current {
                fields
                    .entry(field.clone())
                    .or_insert_with(Vec::new)
                    .push(unquote(item).to_string());
            }
            continue;
        }

        if line.starts_with([' ', '\t']) {
            current = None;
            continue;
        }

        let Some((name, value)) = trimmed.split_once(':') else {
            current = None;
            continue;
        };
        let name = name.trim().to_string();
        let value = value.trim();

        if value.is_empty() {
            fields.entry(name.clone()).or_insert_with(Vec::new);
            current = Some(name);
        } else if let Some(inline) = value.strip_prefix('[').and_then(|v| v.strip_suffix(']')) {
            let items = inline
                .split(',')
                .map(|item| unquote(item.trim()).to_string())
                .filter(|item| !item.is_empty())
                .collect();
            fields.insert(name, items);
            current = None;
        } else {
            fields.insert(name, vec![unquote(value).to_string()]);
            current = None;
        }
    }

    fields
}

fn unquote(value: &str) -> &str {
    value
        .strip_prefix('"')
        .and_then(|v| v.strip_suffix('"'))
        .or_else(|| value.strip_prefix('\'').and_then(|v| v.strip_suffix('\'')))
        .unwrap_or(value)
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn basename_and_relative() {
        let record = FileRecord::new("/docs/guide/intro.md", "hello").with_base("/docs");

        assert_eq!(record.basename(), Some("intro.md"));
        assert_eq!(record.relative(), Path::new("guide/intro.md"));
        assert_eq!(record.identity(), "guide/intro.md");
    }

    #[test]
    fn relative_without_base() {
        let record = FileRecord::new("a.md", "");
        assert_eq!(record.relative(), Path::new("a.md"));
    }

    #[test]
    fn parse_block_list() {
        let raw = b"---\ntitle: Kitchen\nkeywords:\n  - kitchen\n  - 'sink'\n---\nBody text\n";
        let record = FileRecord::parse("doc.md", raw);

        assert_eq!(
            record.field("keywords"),
            Some(&["kitchen".to_string(), "sink".to_string()][..])
        );
        assert_eq!(record.field("title"), Some(&["Kitchen".to_string()][..]));
        assert_eq!(record.text(), "Body text\n");
    }

    #[test]
    fn parse_inline_list() {
        let raw = b"---\nkeywords: [x, \"y\"]\n---\n";
        let record = FileRecord::parse("doc.md", raw);

        assert_eq!(
            record.field("keywords"),
            Some(&["x".to_string(), "y".to_string()][..])
        );
        assert_eq!(record.text(), "");
    }

    #[test]
    fn parse_skips_comments_and_nested_keys() {
        let raw = b"---\n# tags for search\nauthor:\n  name: Ada\n  email: ada@example.com\nkeywords:\n  - x\n---\nbody";
        let record = FileRecord::parse("doc.md", raw);

        assert_eq!(record.field("keywords"), Some(&["x".to_string()][..]));
        assert_eq!(record.field("author"), Some(&[][..]));
        assert!(record.field("name").is_none());
        assert!(record.field("email").is_none());
        assert_eq!(record.front_matter.len(), 2);
    }

    #[test]
    fn parse_without_front_matter() {
        let record = FileRecord::parse("plain.md", b"foo bar");

        assert!(record.front_matter.is_empty());
        assert_eq!(record.text(), "foo bar");
    }

    #[test]
    fn empty_keyword_field() {
        let raw = b"---\nkeywords:\n---\nbody";
        let record = FileRecord::parse("doc.md", raw);
        assert_eq!(record.field("keywords"), Some(&[][..]));
    }

    #[test]
    fn plain_records_have_no_capabilities() {
        assert!(FileRecord::new("a.md", "").capability_names().is_empty());
    }
}
