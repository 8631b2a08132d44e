//! storage layer for csvstore
//!
//! This module owns everything that touches collection files. The upper
//! layers (database facade, CLI) use this API and never open a file directly.
//!
//!  # Architecture
//!
//! ```text
//! ┌─────────────────────────────────────────────────────────────┐
//! │                     CollectionStore                         │
//! │   (create / append / query / delete / update / list)        │
//! └─────────────────────────────────────────────────────────────┘
//!                              │
//!        ┌─────────────────────┼─────────────────────┐
//!        │                     │                     │
//!        ▼                     ▼                     ▼
//!  ┌─────────────┐       ┌─────────────┐       ┌─────────────┐
//!  │    codec    │       │    lock     │       │     ids     │
//!  │   (csv)     │       │  (flock)    │       │ (id gen)    │
//!  └─────────────┘       └─────────────┘       └─────────────┘
//! ```
//!
//! # Usage
//!
//! ```no_run
//! use csvstore::storage::{CollectionStore, Filter};
//! use serde_json::json;
//!
//! let store = CollectionStore::new("/tmp/agent_csv_db");
//! store.create("notes", vec!["id".into(), "text".into()])?;
//!
//! let data = json!({"text": "hello"});
//! let added = store.append("notes", data.as_object().unwrap())?;
//!
//! let hits = store.query("notes", Some(&Filter::new("text", "hello")))?;
//! assert_eq!(hits.count(), 1);
//! store.delete("notes", added.id.as_deref().unwrap())?;
//! # Ok::<(), csvstore::storage::StorageError>(())
//! ```

mod codec;
mod collection;
mod errors;
mod ids;
mod lock;
mod types;

// Re-export public API
pub use collection::{AppendOutcome, CollectionStore, QueryOutcome};
pub use errors::{ErrorKind, StorageError, StorageResult};
pub use ids::{ClockHashIdGenerator, IdGenerator, SequenceIdGenerator, UlidIdGenerator};
pub use types::{
    string_form, CollectionName, Filter, InvalidNameError, Record, Schema, SchemaError,
};
