//! In-process grouping for the merge stage.
//!
//! A distributed run gets its grouping from the job framework: all values of
//! one key meet in one reducer. [`LocalShuffle`] gives the same guarantee
//! inside one process by keeping a single accumulator per identity key and
//! folding each arriving document into it.
use std::collections::btree_map::{self, Entry};
use std::collections::BTreeMap;

use document::{Document, IdentityKey, MergeConfig};
use index::{DocumentSink, IndexError, SinkOutcome};

/// One merge accumulator per identity key, in key order.
#[derive(Debug, Default)]
pub struct LocalShuffle {
    config: MergeConfig,
    groups: BTreeMap<IdentityKey, Document>,
    values: u64,
}

impl LocalShuffle {
    pub fn new(config: MergeConfig) -> Self {
        Self {
            config,
            groups: BTreeMap::new(),
            values: 0,
        }
    }

    pub fn config(&self) -> &MergeConfig {
        &self.config
    }

    /// Fold `document` into the accumulator for `key`. The first document
    /// of a key becomes its accumulator.
    pub fn push(&mut self, key: IdentityKey, document: Document) {
        let document = self.config.prepare(document);
        self.values += 1;
        match self.groups.entry(key) {
            Entry::Occupied(mut acc) => acc.get_mut().merge(&document),
            Entry::Vacant(slot) => {
                slot.insert(document);
            }
        }
    }

    /// Distinct keys seen.
    pub fn len(&self) -> usize {
        self.groups.len()
    }

    pub fn is_empty(&self) -> bool {
        self.groups.is_empty()
    }

    /// Documents pushed, across all keys.
    pub fn values(&self) -> u64 {
        self.values
    }

    pub fn get(&self, key: &IdentityKey) -> Option<&Document> {
        self.groups.get(key)
    }

    /// Merged documents in key order.
    pub fn into_documents(self) -> btree_map::IntoIter<IdentityKey, Document> {
        self.groups.into_iter()
    }
}

impl Extend<(IdentityKey, Document)> for LocalShuffle {
    fn extend<T: IntoIterator<Item = (IdentityKey, Document)>>(&mut self, iter: T) {
        for (key, document) in iter {
            self.push(key, document);
        }
    }
}

/// Lets a parse run feed the merge stage directly.
impl DocumentSink for LocalShuffle {
    fn add(&mut self, key: &IdentityKey, document: &Document) -> Result<SinkOutcome, IndexError> {
        self.push(key.clone(), document.clone());
        Ok(SinkOutcome::Admitted)
    }
}
