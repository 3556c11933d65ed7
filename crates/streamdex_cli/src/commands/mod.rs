//! CLI command implementations.

pub mod full_text;
pub mod keywords;

use ignore::WalkBuilder;
use serde::Serialize;
use std::fmt::Display;
use std::fs;
use std::io;
use std::path::{Path, PathBuf};
use streamdex_core::{stage, FileRecord, IndexTransform, Indexer, TransformConfig};

/// Query options shared by the index commands.
#[derive(Debug, Clone)]
pub struct Query {
    /// Files or directories to index.
    pub paths: Vec<PathBuf>,
    /// Directory the reported paths are relative to.
    pub base: Option<PathBuf>,
    /// Key to look up.
    pub lookup: Option<String>,
    /// Whether to list every indexed key.
    pub keys: bool,
    /// Output format (text, json).
    pub format: String,
}

/// Result of one index run.
#[derive(Debug, Serialize)]
pub struct IndexReport<V> {
    /// Index name.
    pub index: String,
    /// Name of the lookup facade.
    pub lookup_facade: String,
    /// Name of the all-keys facade.
    pub all_keys_facade: String,
    /// Released files, in arrival order.
    pub files: Vec<String>,
    /// Number of distinct keys.
    pub key_count: usize,
    /// Number of emitted entries.
    pub entry_count: usize,
    /// Lookup result (if requested).
    #[serde(skip_serializing_if = "Option::is_none")]
    pub lookup: Option<LookupResult<V>>,
    /// Every indexed key (if requested).
    #[serde(skip_serializing_if = "Option::is_none")]
    pub keys: Option<Vec<String>>,
}

/// Result of a single key lookup.
#[derive(Debug, Serialize)]
pub struct LookupResult<V> {
    /// Key that was looked up.
    pub key: String,
    /// Values in emission order; `None` if the key was never emitted.
    pub values: Option<Vec<V>>,
}

/// Reads every file under `query.paths` into records.
///
/// Directories are walked recursively in name order. Paths are reported
/// relative to `query.base`, or to the directory argument they were found
/// under.
pub fn load_records(query: &Query) -> io::Result<Vec<FileRecord>> {
    let mut records = Vec::new();
    for path in &query.paths {
        if path.is_dir() {
            let base = query.base.clone().unwrap_or_else(|| path.clone());
            for file in collect_files(path)? {
                records.push(read_record(&file)?.with_base(&base));
            }
        } else {
            let record = read_record(path)?;
            records.push(match &query.base {
                Some(base) => record.with_base(base),
                None => record,
            });
        }
    }
    Ok(records)
}

fn read_record(path: &Path) -> io::Result<FileRecord> {
    let raw = fs::read(path)?;
    Ok(FileRecord::parse(path, &raw))
}

/// Lists the regular files under `dir`, sorted by path.
///
/// Hidden entries and git-ignored paths are skipped. Symlinks are not
/// followed, so a link back into the tree cannot loop.
fn collect_files(dir: &Path) -> io::Result<Vec<PathBuf>> {
    let walker = WalkBuilder::new(dir)
        .hidden(true)
        .git_ignore(true)
        .follow_links(false)
        .sort_by_file_path(|a, b| a.cmp(b))
        .build();

    let mut files = Vec::new();
    for entry in walker {
        let entry = entry.map_err(io::Error::other)?;
        if entry.file_type().is_some_and(|t| t.is_file()) {
            files.push(entry.into_path());
        }
    }
    Ok(files)
}

/// Runs `indexer` over the records named by `query` on a stage thread and
/// queries the decorated output.
pub fn build_report<V, I>(
    query: &Query,
    index_name: &str,
    indexer: I,
    config: TransformConfig,
    capacity: usize,
) -> Result<IndexReport<V>, Box<dyn std::error::Error>>
where
    V: Clone + Send + Sync + 'static,
    I: Indexer<FileRecord, V> + 'static,
{
    let records = load_records(query)?;
    tracing::debug!(index = index_name, files = records.len(), "loaded records");

    let transform = IndexTransform::with_config(index_name, indexer, config)?;
    let names = transform.names().clone();
    let mut handle = stage::spawn(transform, capacity)?;

    // Nothing is released before end of input, so feeding everything first
    // cannot block on a full output channel.
    for record in records {
        if handle.send(record).is_err() {
            // The stage stopped early; its error is waiting on the output.
            break;
        }
    }
    handle.close();

    let mut report = IndexReport {
        index: index_name.to_string(),
        lookup_facade: names.lookup.clone(),
        all_keys_facade: names.all_keys.clone(),
        files: Vec::new(),
        key_count: 0,
        entry_count: 0,
        lookup: None,
        keys: None,
    };

    for decorated in handle.output() {
        let decorated = decorated?;
        if report.files.is_empty() {
            if let Some(facade) = decorated.facade() {
                report.key_count = facade.index().key_count();
                report.entry_count = facade.index().entry_count();
            }
            if let Some(key) = &query.lookup {
                report.lookup = Some(LookupResult {
                    key: key.clone(),
                    values: decorated.lookup(&names.lookup, key)?,
                });
            }
            if query.keys {
                report.keys = Some(decorated.all_indexed(&names.all_keys)?);
            }
        }
        report.files.push(decorated.relative().display().to_string());
    }
    handle.join()?;

    if report.files.is_empty() {
        if let Some(key) = &query.lookup {
            report.lookup = Some(LookupResult {
                key: key.clone(),
                values: None,
            });
        }
        if query.keys {
            report.keys = Some(Vec::new());
        }
    }

    tracing::info!(
        index = index_name,
        files = report.files.len(),
        keys = report.key_count,
        entries = report.entry_count,
        "index built"
    );
    Ok(report)
}

/// Prints `report` in the requested format.
pub fn print_report<V>(report: &IndexReport<V>, format: &str) -> Result<(), Box<dyn std::error::Error>>
where
    V: Serialize + Display,
{
    match format {
        "json" => {
            println!("{}", serde_json::to_string_pretty(report)?);
        }
        "text" => print_text(report),
        other => return Err(format!("Unknown format: {other}").into()),
    }
    Ok(())
}

fn print_text<V: Display>(report: &IndexReport<V>) {
    println!("Index: {}", report.index);
    println!(
        "Facades: {}, {}",
        report.lookup_facade, report.all_keys_facade
    );
    println!();
    println!("Files ({}):", report.files.len());
    for file in &report.files {
        println!("  {file}");
    }
    println!();
    println!("Keys:    {}", report.key_count);
    println!("Entries: {}", report.entry_count);

    if let Some(lookup) = &report.lookup {
        println!();
        match &lookup.values {
            Some(values) => {
                let joined: Vec<String> = values.iter().map(ToString::to_string).collect();
                println!("{}({:?}): {}", report.lookup_facade, lookup.key, joined.join(", "));
            }
            None => println!("{}({:?}): not found", report.lookup_facade, lookup.key),
        }
    }

    if let Some(keys) = &report.keys {
        println!();
        println!("{}:", report.all_keys_facade);
        for key in keys {
            println!("  {key}");
        }
    }
}
