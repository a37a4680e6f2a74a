//! Redb backend for on-disk index storage.
//!
//! Every write is one ACID transaction; commits are durable when they
//! return, so `flush` has nothing to do.
//!
//! ```yaml
//! index:
//!   backend:
//!     type: redb
//!     path: /data/arcdoc.redb
//! ```
use std::path::Path;
use std::sync::Arc;

use redb::{Database, ReadableTable, TableDefinition};

use crate::backend::IndexBackend;
use crate::error::IndexError;

const DOCUMENTS: TableDefinition<&str, &[u8]> = TableDefinition::new("arcdoc_documents");

pub struct RedbBackend {
    db: Arc<Database>,
}

impl RedbBackend {
    /// Open or create a database file and make sure the table exists.
    ///
    /// ```no_run
    /// use index::RedbBackend;
    ///
    /// let backend = RedbBackend::open("/tmp/arcdoc.redb")?;
    /// # Ok::<(), index::IndexError>(())
    /// ```
    pub fn open<P: AsRef<Path>>(path: P) -> Result<Self, IndexError> {
        let db = Database::create(path).map_err(IndexError::backend)?;
        let write_txn = db.begin_write().map_err(IndexError::backend)?;
        {
            let _table = write_txn
                .open_table(DOCUMENTS)
                .map_err(IndexError::backend)?;
        }
        write_txn.commit().map_err(IndexError::backend)?;
        Ok(Self { db: Arc::new(db) })
    }
}

impl IndexBackend for RedbBackend {
    fn put(&self, key: &str, value: &[u8]) -> Result<(), IndexError> {
        let write_txn = self.db.begin_write().map_err(IndexError::backend)?;
        {
            let mut table = write_txn
                .open_table(DOCUMENTS)
                .map_err(IndexError::backend)?;
            table.insert(key, value).map_err(IndexError::backend)?;
        }
        write_txn.commit().map_err(IndexError::backend)
    }

    fn get(&self, key: &str) -> Result<Option<Vec<u8>>, IndexError> {
        let read_txn = self.db.begin_read().map_err(IndexError::backend)?;
        let table = read_txn
            .open_table(DOCUMENTS)
            .map_err(IndexError::backend)?;
        let value = table.get(key).map_err(IndexError::backend)?;
        Ok(value.map(|v| v.value().to_vec()))
    }

    fn delete(&self, key: &str) -> Result<(), IndexError> {
        let write_txn = self.db.begin_write().map_err(IndexError::backend)?;
        {
            let mut table = write_txn
                .open_table(DOCUMENTS)
                .map_err(IndexError::backend)?;
            table.remove(key).map_err(IndexError::backend)?;
        }
        write_txn.commit().map_err(IndexError::backend)
    }

    fn batch_put(&self, entries: Vec<(String, Vec<u8>)>) -> Result<(), IndexError> {
        let write_txn = self.db.begin_write().map_err(IndexError::backend)?;
        {
            let mut table = write_txn
                .open_table(DOCUMENTS)
                .map_err(IndexError::backend)?;
            for (key, value) in &entries {
                table
                    .insert(key.as_str(), value.as_slice())
                    .map_err(IndexError::backend)?;
            }
        }
        write_txn.commit().map_err(IndexError::backend)
    }

    fn scan(
        &self,
        visitor: &mut dyn FnMut(&[u8]) -> Result<(), IndexError>,
    ) -> Result<(), IndexError> {
        let read_txn = self.db.begin_read().map_err(IndexError::backend)?;
        let table = read_txn
            .open_table(DOCUMENTS)
            .map_err(IndexError::backend)?;
        for item in table.iter().map_err(IndexError::backend)? {
            let (_, value) = item.map_err(IndexError::backend)?;
            visitor(value.value())?;
        }
        Ok(())
    }
}
