//! Database API - high-level interface for csvstore.

use std::path::{Path, PathBuf};
use std::str::FromStr;
use std::sync::Arc;

use serde_json::{Map, Value};
use thiserror::Error;
use tracing::debug;

use super::command::Command;
use super::response::{Outcome, Response};
use crate::storage::{
    AppendOutcome, ClockHashIdGenerator, CollectionName, CollectionStore, Filter, IdGenerator,
    QueryOutcome, Schema, StorageError, UlidIdGenerator,
};

/// Result type for database operations.
pub type DatabaseResult<T> = Result<T, DatabaseError>;

/// Database errors.
#[derive(Debug, Error)]
pub enum DatabaseError {
    #[error(transparent)]
    Storage(#[from] StorageError),

    #[error("invalid configuration: {0}")]
    InvalidConfig(String),

    #[error("invalid payload: {0}")]
    InvalidPayload(String),

    #[error("json error: {0}")]
    Json(#[from] serde_json::Error),

    #[error("usage: {0}")]
    Usage(String),
}

/// How ids are synthesized for records that arrive without one.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default)]
pub enum IdStrategy {
    /// short hash of wall-clock time and record content
    #[default]
    ClockHash,
    /// lower-case ULID
    Ulid,
}

impl IdStrategy {
    pub(crate) fn generator(&self) -> Arc<dyn IdGenerator> {
        match self {
            IdStrategy::ClockHash => Arc::new(ClockHashIdGenerator::new()),
            IdStrategy::Ulid => Arc::new(UlidIdGenerator::new()),
        }
    }
}

impl FromStr for IdStrategy {
    type Err = DatabaseError;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        match s.to_ascii_lowercase().as_str() {
            "hash" | "clock-hash" => Ok(IdStrategy::ClockHash),
            "ulid" => Ok(IdStrategy::Ulid),
            other => Err(DatabaseError::InvalidConfig(format!(
                "unknown id strategy '{}' (expected 'hash' or 'ulid')",
                other
            ))),
        }
    }
}

/// Database configuration options.
#[derive(Debug, Clone)]
pub struct DatabaseConfig {
    /// Directory holding one file per collection.
    pub root: PathBuf,
    /// Id generation for records without an `id`.
    pub id_strategy: IdStrategy,
    /// Fsync after every mutation.
    pub sync_writes: bool,
    /// Enable verbose logging.
    pub verbose: bool,
}

impl Default for DatabaseConfig {
    fn default() -> Self {
        Self {
            root: PathBuf::from(Self::DEFAULT_ROOT),
            id_strategy: IdStrategy::default(),
            sync_writes: false,
            verbose: false,
        }
    }
}

impl DatabaseConfig {
    /// Storage root used when nothing else is configured.
    pub const DEFAULT_ROOT: &'static str = "/tmp/agent_csv_db";

    /// Environment variable overriding the storage root.
    pub const ROOT_ENV: &'static str = "CSVSTORE_ROOT";

    /// Create a new configuration with the given root.
    pub fn new(root: impl Into<PathBuf>) -> Self {
        Self {
            root: root.into(),
            ..Default::default()
        }
    }

    /// Default configuration, with the root taken from `CSVSTORE_ROOT` if set.
    pub fn from_env() -> Self {
        match std::env::var_os(Self::ROOT_ENV) {
            Some(root) if !root.is_empty() => Self::new(root),
            _ => Self::default(),
        }
    }

    /// Set the storage root.
    pub fn root(mut self, root: impl Into<PathBuf>) -> Self {
        self.root = root.into();
        self
    }

    /// Set the id strategy.
    pub fn id_strategy(mut self, value: IdStrategy) -> Self {
        self.id_strategy = value;
        self
    }

    /// Set sync_writes flag.
    pub fn sync_writes(mut self, value: bool) -> Self {
        self.sync_writes = value;
        self
    }

    /// Set verbose flag.
    pub fn verbose(mut self, value: bool) -> Self {
        self.verbose = value;
        self
    }

    fn validate(&self) -> DatabaseResult<()> {
        if self.root.as_os_str().is_empty() {
            return Err(DatabaseError::InvalidConfig("storage root is empty".into()));
        }
        Ok(())
    }
}

/// The main database handle: a configured collection store.
#[derive(Debug, Clone)]
pub struct Database {
    config: DatabaseConfig,
    store: CollectionStore,
}

impl Database {
    /// Open a database rooted at the given path.
    pub fn open(root: impl AsRef<Path>) -> DatabaseResult<Self> {
        Self::open_with_config(DatabaseConfig::new(root.as_ref()))
    }

    /// Open a database with custom configuration.
    ///
    /// Nothing is created on disk until the first collection is.
    pub fn open_with_config(config: DatabaseConfig) -> DatabaseResult<Self> {
        config.validate()?;
        let store = CollectionStore::new(&config.root)
            .with_id_generator(config.id_strategy.generator())
            .sync_writes(config.sync_writes);
        Ok(Self { config, store })
    }

    /// Open a database over an already configured store.
    pub fn with_store(store: CollectionStore) -> Self {
        let config = DatabaseConfig::new(store.root());
        Self { config, store }
    }

    /// Get the storage root.
    pub fn root(&self) -> &Path {
        &self.config.root
    }

    /// Get the configuration.
    pub fn config(&self) -> &DatabaseConfig {
        &self.config
    }

    /// Get the underlying store.
    pub fn store(&self) -> &CollectionStore {
        &self.store
    }

    pub fn create(&self, collection: &str, fields: Vec<String>) -> DatabaseResult<Schema> {
        Ok(self.store.create(collection, fields)?)
    }

    /// Append a record given as a JSON value, which must be an object.
    pub fn add(&self, collection: &str, data: &Value) -> DatabaseResult<AppendOutcome> {
        let data = as_object(data)?;
        Ok(self.store.append(collection, data)?)
    }

    pub fn query(&self, collection: &str, filter: Option<&Filter>) -> DatabaseResult<QueryOutcome> {
        Ok(self.store.query(collection, filter)?)
    }

    pub fn delete(&self, collection: &str, id: &str) -> DatabaseResult<usize> {
        Ok(self.store.delete(collection, id)?)
    }

    pub fn update(&self, collection: &str, id: &str, data: &Value) -> DatabaseResult<usize> {
        let data = as_object(data)?;
        Ok(self.store.update(collection, id, data)?)
    }

    pub fn schema(&self, collection: &str) -> DatabaseResult<Schema> {
        Ok(self.store.schema(collection)?)
    }

    /// List all collections.
    pub fn collections(&self) -> DatabaseResult<Vec<String>> {
        Ok(self
            .store
            .list()?
            .into_iter()
            .map(CollectionName::into_string)
            .collect())
    }

    /// Run one command and fold its outcome into a structured response.
    pub fn run(&self, command: &Command) -> Response {
        debug!(?command, root = %self.config.root.display(), "running command");
        match self.dispatch(command) {
            Ok(outcome) => Response::Success(outcome),
            Err(e) => Response::from(e),
        }
    }

    fn dispatch(&self, command: &Command) -> DatabaseResult<Outcome> {
        let outcome = match command {
            Command::Create { collection, fields } => {
                let schema = self.create(collection, fields.clone())?;
                Outcome::created(collection, schema.into_fields())
            }
            Command::Add { collection, data } => {
                let added = self.add(collection, data)?;
                Outcome::added(added.id)
            }
            Command::Query { collection, filter } => {
                let result = self.query(collection, filter.as_ref())?;
                Outcome::queried(result)
            }
            Command::Delete { collection, id } => {
                let removed = self.delete(collection, id)?;
                Outcome::deleted(id, removed)
            }
            Command::Update { collection, id, data } => {
                let updated = self.update(collection, id, data)?;
                Outcome::updated(id, updated)
            }
            Command::Schema { collection } => {
                let schema = self.schema(collection)?;
                Outcome::schema(collection, schema.into_fields())
            }
            Command::List => Outcome::collections(self.collections()?),
        };
        Ok(outcome)
    }
}

fn as_object(data: &Value) -> DatabaseResult<&Map<String, Value>> {
    data.as_object().ok_or_else(|| {
        DatabaseError::InvalidPayload(format!(
            "record data must be a JSON object, got {}",
            kind_of(data)
        ))
    })
}

fn kind_of(value: &Value) -> &'static str {
    match value {
        Value::Null => "null",
        Value::Bool(_) => "a boolean",
        Value::Number(_) => "a number",
        Value::String(_) => "a string",
        Value::Array(_) => "an array",
        Value::Object(_) => "an object",
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::storage::{ErrorKind, SequenceIdGenerator};
    use serde_json::json;

    fn setup() -> (tempfile::TempDir, Database) {
        let dir = tempfile::TempDir::new().unwrap();
        let store = CollectionStore::new(dir.path())
            .with_id_generator(Arc::new(SequenceIdGenerator::new()));
        (dir, Database::with_store(store))
    }

    #[test]
    fn test_open_database() {
        let dir = tempfile::TempDir::new().unwrap();
        let db = Database::open(dir.path().join("nested")).unwrap();
        assert!(db.collections().unwrap().is_empty());
        assert!(!db.root().exists());
    }

    #[test]
    fn test_empty_root_rejected() {
        let err = Database::open_with_config(DatabaseConfig::new("")).unwrap_err();
        assert!(matches!(err, DatabaseError::InvalidConfig(_)));
    }

    #[test]
    fn test_config_builder() {
        let config = DatabaseConfig::new("/data")
            .id_strategy(IdStrategy::Ulid)
            .sync_writes(true)
            .verbose(true);
        assert_eq!(config.root, PathBuf::from("/data"));
        assert_eq!(config.id_strategy, IdStrategy::Ulid);
        assert!(config.sync_writes && config.verbose);
        assert_eq!(DatabaseConfig::default().root, PathBuf::from("/tmp/agent_csv_db"));
    }

    #[test]
    fn test_id_strategy_parse() {
        assert_eq!("hash".parse::<IdStrategy>().unwrap(), IdStrategy::ClockHash);
        assert_eq!("ULID".parse::<IdStrategy>().unwrap(), IdStrategy::Ulid);
        assert!("uuid".parse::<IdStrategy>().is_err());
    }

    #[test]
    fn test_add_rejects_non_object() {
        let (_dir, db) = setup();
        db.create("t", vec!["id".into()]).unwrap();
        let err = db.add("t", &json!(["not", "a", "map"])).unwrap_err();
        assert!(matches!(err, DatabaseError::InvalidPayload(_)));
    }

    #[test]
    fn test_scenario_notes() {
        let (_dir, db) = setup();
        db.create("notes", vec!["id".into(), "text".into()]).unwrap();
        let added = db.add("notes", &json!({"text": "hello"})).unwrap();
        let id = added.id.unwrap();

        let result = db.query("notes", None).unwrap();
        assert_eq!(result.count(), 1);
        assert_eq!(result.records[0].id(), Some(id.as_str()));
        assert_eq!(result.records[0].get("text"), Some("hello"));
    }

    #[test]
    fn test_scenario_delete() {
        let (_dir, db) = setup();
        db.create("t", vec!["id".into(), "v".into()]).unwrap();
        db.add("t", &json!({"id": 1, "v": 1})).unwrap();
        db.add("t", &json!({"id": 2, "v": 2})).unwrap();
        db.delete("t", "1").unwrap();

        let result = db.query("t", None).unwrap();
        assert_eq!(result.count(), 1);
        let row: Vec<_> = result.records[0].fields().to_vec();
        assert_eq!(
            row,
            vec![("id".to_string(), "2".to_string()), ("v".to_string(), "2".to_string())]
        );
    }

    #[test]
    fn test_run_folds_errors() {
        let (_dir, db) = setup();
        let response = db.run(&Command::Add {
            collection: "ghost".into(),
            data: json!({"text": "x"}),
        });
        assert!(matches!(
            response,
            Response::Error { kind, .. } if kind == ErrorKind::NotFound.as_str()
        ));
    }

    #[test]
    fn test_run_lists_collections() {
        let (_dir, db) = setup();
        db.create("b", vec!["x".into()]).unwrap();
        db.create("a", vec!["x".into()]).unwrap();
        let response = db.run(&Command::List);
        assert_eq!(
            serde_json::to_value(&response).unwrap(),
            json!({"status": "success", "collections": ["a", "b"]})
        );
    }
}
