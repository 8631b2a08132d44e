//! csvstore - A CSV-backed Document Store
//!
//! This crate provides a small document store for transient agent memory.
//! Every collection is one CSV file under a storage root: the first line is
//! the field list, every other line is a record.
//!
//! # Example
//!
//! ```no_run
//! use csvstore::db::Database;
//! use serde_json::json;
//!
//! let db = Database::open("/tmp/agent_csv_db").unwrap();
//! db.create("notes", vec!["id".into(), "text".into()]).unwrap();
//! let added = db.add("notes", &json!({"text": "hello"})).unwrap();
//! println!("stored as {:?}", added.id);
//! ```

pub mod db;
pub mod logging;
pub mod storage;

pub use logging::init_logging;
