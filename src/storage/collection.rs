//! The collection store.
//!
//! Maps a collection name to `<root>/<name>.csv` and implements every
//! operation on it. Each call is a single linear pass over one file:
//!
//! - `create` writes the header to a temp file and links it into place
//!   without clobbering, so two racing creators cannot both win.
//! - `append` writes one encoded line under the exclusive lock.
//! - `delete` and `update` read, edit and rewrite the collection under the
//!   exclusive lock; the new content goes to a temp file that is renamed over
//!   the old one, so a failed rewrite leaves the previous file intact.
//! - `query`, `schema` and `list` take no lock. Thanks to the rename they see
//!   either the old or the new file, never a truncated one.

use std::fmt;
use std::fs::{self, File, OpenOptions};
use std::io::{self, Write};
use std::path::{Path, PathBuf};
use std::sync::Arc;

use serde_json::{Map, Value};
use tempfile::NamedTempFile;
use tracing::{debug, info};

use crate::storage::codec;
use crate::storage::errors::{StorageError, StorageResult};
use crate::storage::ids::{ClockHashIdGenerator, IdGenerator};
use crate::storage::lock::LockedFile;
use crate::storage::types::{CollectionName, Filter, Record, Schema};

/// Result of a successful append.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct AppendOutcome {
    /// the stored `id` value, `None` when the schema has no `id` field
    pub id: Option<String>,
}

/// Records matched by a scan, in file order.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct QueryOutcome {
    /// the collection's header
    pub fields: Vec<String>,
    pub records: Vec<Record>,
}

impl QueryOutcome {
    pub fn count(&self) -> usize {
        self.records.len()
    }

    pub fn is_empty(&self) -> bool {
        self.records.is_empty()
    }

    pub fn iter(&self) -> impl Iterator<Item = &Record> {
        self.records.iter()
    }
}

impl IntoIterator for QueryOutcome {
    type Item = Record;
    type IntoIter = std::vec::IntoIter<Record>;

    fn into_iter(self) -> Self::IntoIter {
        self.records.into_iter()
    }
}

/// A set of collections living under one storage root.
///
/// Cheap to clone; clones share the id generator.
#[derive(Clone)]
pub struct CollectionStore {
    root: PathBuf,
    ids: Arc<dyn IdGenerator>,
    sync_writes: bool,
}

impl fmt::Debug for CollectionStore {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("CollectionStore")
            .field("root", &self.root)
            .field("sync_writes", &self.sync_writes)
            .finish_non_exhaustive()
    }
}

impl CollectionStore {
    /// Create a store rooted at `root`. The directory is created lazily.
    pub fn new(root: impl Into<PathBuf>) -> Self {
        Self {
            root: root.into(),
            ids: Arc::new(ClockHashIdGenerator::new()),
            sync_writes: false,
        }
    }

    /// Use a different id generation strategy.
    pub fn with_id_generator(mut self, ids: Arc<dyn IdGenerator>) -> Self {
        self.ids = ids;
        self
    }

    /// Fsync collection files after every mutation.
    pub fn sync_writes(mut self, value: bool) -> Self {
        self.sync_writes = value;
        self
    }

    pub fn root(&self) -> &Path {
        &self.root
    }

    /// Resolve a requested name to its sanitized form and file path.
    pub fn resolve(&self, name: &str) -> StorageResult<(CollectionName, PathBuf)> {
        let name = CollectionName::new(name)?;
        let path = name.path_in(&self.root);
        Ok((name, path))
    }

    /// check if a collection exists
    pub fn exists(&self, name: &str) -> StorageResult<bool> {
        let (_, path) = self.resolve(name)?;
        Ok(path.is_file())
    }

    // ==================== Operations ====================

    /// Create a collection with the given field order.
    ///
    /// Fails with `AlreadyExists` if a file for the sanitized name is present,
    /// whatever its fields are.
    pub fn create(&self, name: &str, fields: Vec<String>) -> StorageResult<Schema> {
        let (name, path) = self.resolve(name)?;

        fs::create_dir_all(&self.root)?;
        if path.exists() {
            return Err(StorageError::AlreadyExists(name));
        }
        let schema = Schema::new(fields)?;

        let mut tmp = NamedTempFile::new_in(&self.root)?;
        codec::write_collection(tmp.as_file_mut(), &schema, &[])?;
        if self.sync_writes {
            tmp.as_file().sync_all()?;
        }

        tmp.persist_noclobber(&path).map_err(|e| {
            if e.error.kind() == io::ErrorKind::AlreadyExists {
                StorageError::AlreadyExists(name.clone())
            } else {
                StorageError::Io(e.error)
            }
        })?;
        if self.sync_writes {
            self.sync_root()?;
        }

        info!(collection = %name, fields = ?schema.fields(), "created collection");
        Ok(schema)
    }

    /// Append one record.
    ///
    /// `data` is projected onto the header: missing fields are stored empty,
    /// unknown keys are dropped. When the header has an `id` field and `data`
    /// has no `id` key, one is synthesized.
    pub fn append(&self, name: &str, data: &Map<String, Value>) -> StorageResult<AppendOutcome> {
        let (name, path) = self.resolve(name)?;
        let schema = self.read_schema(&name, &path)?;

        let mut values = schema.project(data);
        let id_pos = schema.position(Schema::ID_FIELD);
        if let Some(pos) = id_pos {
            if !data.contains_key(Schema::ID_FIELD) {
                values[pos] = self.ids.generate(data);
            }
        }
        let line = codec::encode_row(&values)?;

        {
            let mut file = LockedFile::open(&path, OpenOptions::new().append(true))
                .map_err(|e| missing_as_not_found(e, &name))?;
            file.write_all(&line)?;
            if self.sync_writes {
                file.sync_data()?;
            }
        }

        let id = id_pos.map(|pos| values.swap_remove(pos));
        debug!(collection = %name, id = ?id, "appended record");
        Ok(AppendOutcome { id })
    }

    /// Scan the collection, optionally keeping only rows where
    /// `row[filter.field] == filter.value` (exact string equality).
    pub fn query(&self, name: &str, filter: Option<&Filter>) -> StorageResult<QueryOutcome> {
        let (name, path) = self.resolve(name)?;
        let file = File::open(&path).map_err(|e| missing_as_not_found(e, &name))?;
        let (schema, records) = codec::read_collection(file, &path)?;

        let records: Vec<Record> = match filter {
            Some(filter) => records.into_iter().filter(|r| filter.matches(r)).collect(),
            None => records,
        };

        debug!(collection = %name, filter = ?filter, matched = records.len(), "queried collection");
        Ok(QueryOutcome {
            fields: schema.into_fields(),
            records,
        })
    }

    /// Remove every record whose `id` equals `id`.
    ///
    /// Returns the number of removed rows. Surviving rows keep their order.
    /// When nothing matches, the file is not touched.
    pub fn delete(&self, name: &str, id: &str) -> StorageResult<usize> {
        let (name, path) = self.resolve(name)?;

        let removed = self.rewrite(&name, &path, id, |records| {
            let before = records.len();
            let kept: Vec<Record> = records
                .into_iter()
                .filter(|r| r.id() != Some(id))
                .collect();
            let removed = before - kept.len();
            (kept, removed)
        })?;

        info!(collection = %name, id, removed, "deleted records");
        Ok(removed)
    }

    /// Merge `data` into every record whose `id` equals `id`.
    ///
    /// Only header fields are written and the `id` value itself never changes.
    /// Returns the number of rows that matched.
    pub fn update(&self, name: &str, id: &str, data: &Map<String, Value>) -> StorageResult<usize> {
        let (name, path) = self.resolve(name)?;

        let updated = self.rewrite(&name, &path, id, |mut records| {
            let mut matched = 0;
            for record in records.iter_mut().filter(|r| r.id() == Some(id)) {
                record.merge(data);
                matched += 1;
            }
            (records, matched)
        })?;

        info!(collection = %name, id, updated, "updated records");
        Ok(updated)
    }

    /// The header of an existing collection.
    pub fn schema(&self, name: &str) -> StorageResult<Schema> {
        let (name, path) = self.resolve(name)?;
        self.read_schema(&name, &path)
    }

    /// Names of all collections under the root, sorted.
    pub fn list(&self) -> StorageResult<Vec<CollectionName>> {
        let entries = match fs::read_dir(&self.root) {
            Ok(entries) => entries,
            Err(e) if e.kind() == io::ErrorKind::NotFound => return Ok(Vec::new()),
            Err(e) => return Err(e.into()),
        };

        let mut names = Vec::new();
        for entry in entries {
            let entry = entry?;
            if !entry.file_type()?.is_file() {
                continue;
            }
            if let Some(name) = CollectionName::from_path(&entry.path()) {
                names.push(name);
            }
        }
        names.sort_by(|a, b| a.as_str().cmp(b.as_str()));
        Ok(names)
    }

    // ==================== Helpers ====================

    /// Make renames and links in the root durable.
    #[cfg(unix)]
    fn sync_root(&self) -> StorageResult<()> {
        File::open(&self.root)?.sync_all()?;
        Ok(())
    }

    #[cfg(not(unix))]
    fn sync_root(&self) -> StorageResult<()> {
        // directories cannot be opened for syncing here
        Ok(())
    }

    fn read_schema(&self, name: &CollectionName, path: &Path) -> StorageResult<Schema> {
        let file = File::open(path).map_err(|e| missing_as_not_found(e, name))?;
        codec::read_schema(file, path)
    }

    /// Read, edit and atomically replace a collection under the exclusive lock.
    ///
    /// `edit` returns the new record list and how many rows it affected; zero
    /// affected rows means `id` was not found and nothing is written.
    fn rewrite<F>(&self, name: &CollectionName, path: &Path, id: &str, edit: F) -> StorageResult<usize>
    where
        F: FnOnce(Vec<Record>) -> (Vec<Record>, usize),
    {
        let locked = LockedFile::open(path, OpenOptions::new().read(true))
            .map_err(|e| missing_as_not_found(e, name))?;
        let (schema, records) = codec::read_collection(&*locked, locked.path())?;

        let (records, affected) = edit(records);
        if affected == 0 {
            return Err(StorageError::NotFoundId {
                collection: name.clone(),
                id: id.to_string(),
            });
        }

        let mut tmp = NamedTempFile::new_in(&self.root)?;
        codec::write_collection(tmp.as_file_mut(), &schema, &records)?;
        // the replacement keeps the mode of the file it replaces
        tmp.as_file().set_permissions(locked.metadata()?.permissions())?;
        if self.sync_writes {
            tmp.as_file().sync_all()?;
        }
        tmp.persist(path).map_err(|e| StorageError::Io(e.error))?;
        if self.sync_writes {
            self.sync_root()?;
        }

        // the lock on the replaced file is held until here
        drop(locked);
        Ok(affected)
    }
}

fn missing_as_not_found(err: io::Error, name: &CollectionName) -> StorageError {
    if err.kind() == io::ErrorKind::NotFound {
        StorageError::NotFound(name.clone())
    } else {
        StorageError::Io(err)
    }
}
