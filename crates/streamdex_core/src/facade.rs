//! Lookup facade attached to decorated records.
//!
//! For an index named `fullText` every decorated record gets two facades:
//! - `lookupFullText`: key to values lookup
//! - `allIndexedFullText`: enumeration of every indexed key
//!
//! Both names resolve to the same [`LookupFacade`], and every record of a
//! run holds the same `Arc` to it.

use crate::error::{IndexError, IndexResult};
use crate::record::Record;
use crate::store::FrozenIndex;
use std::collections::BTreeMap;
use std::ops::Deref;
use std::sync::Arc;

/// Prefix of the per-key lookup facade name.
pub const LOOKUP_PREFIX: &str = "lookup";

/// Prefix of the all-keys facade name.
pub const ALL_KEYS_PREFIX: &str = "allIndexed";

/// Method names generated for one index.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct FacadeNames {
    /// Name of the per-key lookup, e.g. `lookupKeywords`.
    pub lookup: String,
    /// Name of the key enumerator, e.g. `allIndexedKeywords`.
    pub all_keys: String,
}

impl FacadeNames {
    /// Derives facade names from an index name.
    ///
    /// The name must be a non-empty identifier: an ASCII letter or `_`
    /// followed by ASCII alphanumerics or `_`.
    pub fn derive(index_name: &str) -> IndexResult<Self> {
        validate_index_name(index_name)?;
        let capitalized = capitalize(index_name);
        Ok(Self {
            lookup: format!("{LOOKUP_PREFIX}{capitalized}"),
            all_keys: format!("{ALL_KEYS_PREFIX}{capitalized}"),
        })
    }
}

fn validate_index_name(name: &str) -> IndexResult<()> {
    let mut chars = name.chars();
    let Some(first) = chars.next() else {
        return Err(IndexError::invalid_index_name(name, "name is empty"));
    };
    if !(first.is_ascii_alphabetic() || first == '_') {
        return Err(IndexError::invalid_index_name(
            name,
            "must start with an ASCII letter or underscore",
        ));
    }
    if let Some(bad) = chars.find(|c| !(c.is_ascii_alphanumeric() || *c == '_')) {
        return Err(IndexError::invalid_index_name(
            name,
            format!("character {bad:?} is not allowed"),
        ));
    }
    Ok(())
}

fn capitalize(name: &str) -> String {
    let mut chars = name.chars();
    match chars.next() {
        Some(first) => first.to_ascii_uppercase().to_string() + chars.as_str(),
        None => String::new(),
    }
}

/// Read-only lookup capabilities over one frozen index.
#[derive(Debug)]
pub struct LookupFacade<V> {
    index_name: String,
    names: FacadeNames,
    index: FrozenIndex<V>,
}

impl<V> LookupFacade<V> {
    /// Creates a facade over a frozen index.
    pub fn new(index_name: impl Into<String>, names: FacadeNames, index: FrozenIndex<V>) -> Self {
        Self {
            index_name: index_name.into(),
            names,
            index,
        }
    }

    /// Returns the index name this facade was built for.
    pub fn index_name(&self) -> &str {
        &self.index_name
    }

    /// Returns the generated method names.
    pub fn names(&self) -> &FacadeNames {
        &self.names
    }

    /// Returns every indexed key.
    pub fn all_keys(&self) -> Vec<String> {
        self.index.all_keys()
    }

    /// Returns the underlying snapshot.
    pub fn index(&self) -> &FrozenIndex<V> {
        &self.index
    }
}

impl<V: Clone> LookupFacade<V> {
    /// Looks up the values for `key`; `None` if the key was never emitted.
    pub fn lookup(&self, key: &str) -> Option<Vec<V>> {
        self.index.lookup(key)
    }
}

/// A named capability bound onto a decorated record.
#[derive(Debug)]
pub enum Capability<V> {
    /// Key to values lookup.
    Lookup(Arc<LookupFacade<V>>),
    /// All-keys enumeration.
    AllKeys(Arc<LookupFacade<V>>),
}

impl<V> Capability<V> {
    /// Returns the facade backing this capability.
    pub fn facade(&self) -> &Arc<LookupFacade<V>> {
        match self {
            Capability::Lookup(facade) | Capability::AllKeys(facade) => facade,
        }
    }
}

impl<V> Clone for Capability<V> {
    fn clone(&self) -> Self {
        match self {
            Capability::Lookup(facade) => Capability::Lookup(Arc::clone(facade)),
            Capability::AllKeys(facade) => Capability::AllKeys(Arc::clone(facade)),
        }
    }
}

/// A record released after indexing, with lookup facades attached.
///
/// Dereferences to the wrapped record, so payload fields stay accessible.
#[derive(Debug)]
pub struct Decorated<R, V> {
    record: R,
    facades: BTreeMap<String, Capability<V>>,
}

impl<R: Record, V> Decorated<R, V> {
    /// Clones `record` and binds both facades of `facade` onto the copy.
    ///
    /// Fails with [`IndexError::NameCollision`] if the record already
    /// carries a facade with either generated name.
    pub fn attach(record: &R, facade: &Arc<LookupFacade<V>>) -> IndexResult<Self> {
        Self::wrap(record.clone(), facade)
    }

    /// Binds both facades onto an owned record.
    pub fn wrap(record: R, facade: &Arc<LookupFacade<V>>) -> IndexResult<Self> {
        let existing = record.capability_names();
        let names = facade.names();
        for name in [&names.lookup, &names.all_keys] {
            if existing.iter().any(|taken| taken == name) {
                return Err(IndexError::NameCollision {
                    name: name.clone(),
                    record: record.identity(),
                });
            }
        }

        let mut facades = BTreeMap::new();
        facades.insert(names.lookup.clone(), Capability::Lookup(Arc::clone(facade)));
        facades.insert(
            names.all_keys.clone(),
            Capability::AllKeys(Arc::clone(facade)),
        );

        Ok(Self { record, facades })
    }
}

impl<R, V> Decorated<R, V> {
    /// Returns the wrapped record.
    pub fn record(&self) -> &R {
        &self.record
    }

    /// Unwraps the record, dropping the facades.
    pub fn into_record(self) -> R {
        self.record
    }

    /// Returns the attached capabilities by name.
    pub fn facades(&self) -> &BTreeMap<String, Capability<V>> {
        &self.facades
    }

    /// Returns the capability bound under `name`.
    pub fn capability(&self, name: &str) -> Option<&Capability<V>> {
        self.facades.get(name)
    }

    /// Returns the facade shared by this record's capabilities.
    pub fn facade(&self) -> Option<&Arc<LookupFacade<V>>> {
        self.facades.values().next().map(Capability::facade)
    }

    /// Calls the all-keys capability bound under `method`.
    pub fn all_indexed(&self, method: &str) -> IndexResult<Vec<String>> {
        match self.facades.get(method) {
            Some(Capability::AllKeys(facade)) => Ok(facade.all_keys()),
            _ => Err(IndexError::UnknownFacade {
                name: method.to_string(),
            }),
        }
    }
}

impl<R, V: Clone> Decorated<R, V> {
    /// Calls the lookup capability bound under `method`.
    ///
    /// The outer `Result` reports a missing facade; the inner `Option`
    /// is the not-found marker for `key`.
    pub fn lookup(&self, method: &str, key: &str) -> IndexResult<Option<Vec<V>>> {
        match self.facades.get(method) {
            Some(Capability::Lookup(facade)) => Ok(facade.lookup(key)),
            _ => Err(IndexError::UnknownFacade {
                name: method.to_string(),
            }),
        }
    }
}

impl<R: Clone, V> Clone for Decorated<R, V> {
    fn clone(&self) -> Self {
        Self {
            record: self.record.clone(),
            facades: self.facades.clone(),
        }
    }
}

impl<R, V> Deref for Decorated<R, V> {
    type Target = R;

    fn deref(&self) -> &R {
        &self.record
    }
}

impl<R: Record, V: Send + Sync + 'static> Record for Decorated<R, V> {
    fn identity(&self) -> String {
        self.record.identity()
    }

    fn capability_names(&self) -> Vec<String> {
        let mut names = self.record.capability_names();
        names.extend(self.facades.keys().cloned());
        names
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::record::FileRecord;
    use crate::store::IndexStore;

    fn facade(name: &str, entries: &[(&str, u32)]) -> Arc<LookupFacade<u32>> {
        let mut store = IndexStore::new();
        for (key, value) in entries {
            store.emit(*key, *value);
        }
        let names = FacadeNames::derive(name).unwrap();
        Arc::new(LookupFacade::new(name, names, store.freeze()))
    }

    #[test]
    fn derive_names() {
        let names = FacadeNames::derive("fullText").unwrap();
        assert_eq!(names.lookup, "lookupFullText");
        assert_eq!(names.all_keys, "allIndexedFullText");

        let names = FacadeNames::derive("keywords").unwrap();
        assert_eq!(names.lookup, "lookupKeywords");
        assert_eq!(names.all_keys, "allIndexedKeywords");

        let names = FacadeNames::derive("_tags").unwrap();
        assert_eq!(names.lookup, "lookup_tags");
    }

    #[test]
    fn reject_bad_names() {
        for bad in ["", "1abc", "full text", "key-words", "ünï"] {
            let err = FacadeNames::derive(bad).unwrap_err();
            assert!(
                matches!(err, IndexError::InvalidIndexName { .. }),
                "{bad:?} should be rejected"
            );
        }
    }

    #[test]
    fn attach_binds_both_names() {
        let shared = facade("keywords", &[("x", 1)]);
        let record = FileRecord::new("doc.md", "");
        let decorated = Decorated::attach(&record, &shared).unwrap();

        assert_eq!(decorated.lookup("lookupKeywords", "x").unwrap(), Some(vec![1]));
        assert_eq!(decorated.lookup("lookupKeywords", "y").unwrap(), None);
        assert_eq!(
            decorated.all_indexed("allIndexedKeywords").unwrap(),
            vec!["x".to_string()]
        );
        assert_eq!(decorated.path, record.path);
    }

    #[test]
    fn wrong_capability_kind_is_unknown() {
        let shared = facade("keywords", &[]);
        let decorated = Decorated::attach(&FileRecord::new("a.md", ""), &shared).unwrap();

        assert!(matches!(
            decorated.lookup("allIndexedKeywords", "x"),
            Err(IndexError::UnknownFacade { .. })
        ));
        assert!(decorated.all_indexed("lookupKeywords").is_err());
        assert!(decorated.lookup("lookupOther", "x").is_err());
    }

    #[test]
    fn both_capabilities_share_one_facade() {
        let shared = facade("tags", &[("a", 1)]);
        let decorated = Decorated::attach(&FileRecord::new("a.md", ""), &shared).unwrap();

        let lookup = decorated.capability("lookupTags").unwrap().facade();
        let all = decorated.capability("allIndexedTags").unwrap().facade();
        assert!(Arc::ptr_eq(lookup, all));
        assert!(Arc::ptr_eq(lookup, &shared));
    }

    #[test]
    fn chained_decoration_keeps_both_indexes() {
        let first = facade("tags", &[("a", 1)]);
        let second = facade("words", &[("b", 2)]);

        let once = Decorated::attach(&FileRecord::new("a.md", ""), &first).unwrap();
        let twice = Decorated::attach(&once, &second).unwrap();

        assert_eq!(twice.lookup("lookupWords", "b").unwrap(), Some(vec![2]));
        assert_eq!(
            twice.record().lookup("lookupTags", "a").unwrap(),
            Some(vec![1])
        );
        assert_eq!(twice.capability_names().len(), 4);
    }

    #[test]
    fn same_name_twice_collides() {
        let first = facade("tags", &[]);
        let again = facade("tags", &[]);

        let once = Decorated::attach(&FileRecord::new("a.md", ""), &first).unwrap();
        let err = Decorated::attach(&once, &again).unwrap_err();

        match err {
            IndexError::NameCollision { name, record } => {
                assert_eq!(name, "lookupTags");
                assert_eq!(record, "a.md");
            }
            other => panic!("unexpected error: {other}"),
        }
    }
}
