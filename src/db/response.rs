//! Structured command results.
//!
//! Every outcome, success or failure, travels through [`Response`], which
//! serializes as a single JSON object discriminated by `status`:
//!
//! ```text
//! {"status": "success", "id": "1f3a9c0b"}
//! {"status": "error", "kind": "not_found", "message": "collection 'ghost' not found"}
//! {"status": "fatal_error", "error": "io error: permission denied"}
//! ```

use serde::Serialize;

use super::api::DatabaseError;
use crate::storage::{ErrorKind, QueryOutcome, Record, StorageError};

/// Marker reported for the id of a record whose collection has no `id` field.
pub const NO_ID: &str = "N/A";

/// Result of running one command.
#[derive(Debug, Clone, PartialEq, Serialize)]
#[serde(tag = "status", rename_all = "snake_case")]
pub enum Response {
    /// The command ran; payload depends on the command.
    Success(Outcome),
    /// An expected failure: missing collection, missing id, bad name...
    Error { kind: &'static str, message: String },
    /// Anything unexpected: I/O, parse or payload-shape failures.
    FatalError { error: String },
}

impl Response {
    pub fn fatal(error: impl Into<String>) -> Self {
        Response::FatalError { error: error.into() }
    }

    pub fn is_success(&self) -> bool {
        matches!(self, Response::Success(_))
    }

    /// Queries are printed indented, everything else on one line.
    pub fn to_json(&self) -> String {
        let rendered = match self {
            Response::Success(Outcome::Queried { .. }) => serde_json::to_string_pretty(self),
            _ => serde_json::to_string(self),
        };
        rendered.unwrap_or_else(|e| {
            format!(r#"{{"status":"fatal_error","error":"cannot encode response: {}"}}"#, e)
        })
    }
}

impl From<StorageError> for Response {
    fn from(err: StorageError) -> Self {
        match err.kind() {
            ErrorKind::Fatal => Response::fatal(err.to_string()),
            kind => Response::Error {
                kind: kind.as_str(),
                message: err.to_string(),
            },
        }
    }
}

impl From<DatabaseError> for Response {
    fn from(err: DatabaseError) -> Self {
        match err {
            DatabaseError::Storage(e) => e.into(),
            other => Response::fatal(other.to_string()),
        }
    }
}

/// Per-command success payloads.
#[derive(Debug, Clone, PartialEq, Serialize)]
#[serde(untagged)]
pub enum Outcome {
    Created { message: String, fields: Vec<String> },
    Added { id: String },
    Queried { count: usize, data: Vec<Record> },
    Deleted { message: String, removed: usize },
    Updated { message: String, updated: usize },
    Schema { collection: String, fields: Vec<String> },
    Collections { collections: Vec<String> },
}

impl Outcome {
    pub fn created(collection: &str, fields: Vec<String>) -> Self {
        Outcome::Created {
            message: format!(
                "Created collection '{}' with fields: {}",
                collection,
                fields.join(", ")
            ),
            fields,
        }
    }

    pub fn added(id: Option<String>) -> Self {
        Outcome::Added {
            id: id.unwrap_or_else(|| NO_ID.to_string()),
        }
    }

    pub fn queried(result: QueryOutcome) -> Self {
        Outcome::Queried {
            count: result.count(),
            data: result.records,
        }
    }

    pub fn deleted(id: &str, removed: usize) -> Self {
        Outcome::Deleted {
            message: format!("Document {} deleted.", id),
            removed,
        }
    }

    pub fn updated(id: &str, updated: usize) -> Self {
        Outcome::Updated {
            message: format!("Document {} updated.", id),
            updated,
        }
    }

    pub fn schema(collection: &str, fields: Vec<String>) -> Self {
        Outcome::Schema {
            collection: collection.to_string(),
            fields,
        }
    }

    pub fn collections(collections: Vec<String>) -> Self {
        Outcome::Collections { collections }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::storage::{CollectionName, Schema};
    use serde_json::json;

    #[test]
    fn test_success_shapes() {
        let added = Response::Success(Outcome::added(Some("abc".into())));
        assert_eq!(
            serde_json::to_value(&added).unwrap(),
            json!({"status": "success", "id": "abc"})
        );

        let no_id = Response::Success(Outcome::added(None));
        assert_eq!(
            serde_json::to_value(&no_id).unwrap(),
            json!({"status": "success", "id": "N/A"})
        );

        let deleted = Response::Success(Outcome::deleted("7", 1));
        assert_eq!(
            serde_json::to_value(&deleted).unwrap(),
            json!({"status": "success", "message": "Document 7 deleted.", "removed": 1})
        );
    }

    #[test]
    fn test_query_shape_keeps_header_order() {
        let schema = Schema::new(vec!["id".into(), "text".into()]).unwrap();
        let result = QueryOutcome {
            fields: schema.fields().to_vec(),
            records: vec![schema.record_from_row(["1", "hello"])],
        };
        let response = Response::Success(Outcome::queried(result));
        assert!(response.is_success());

        let compact = serde_json::to_string(&response).unwrap();
        assert_eq!(
            compact,
            r#"{"status":"success","count":1,"data":[{"id":"1","text":"hello"}]}"#
        );
        assert!(response.to_json().contains('\n'));
    }

    #[test]
    fn test_error_shapes() {
        let missing = Response::from(StorageError::NotFound(CollectionName::new("ghost").unwrap()));
        assert_eq!(
            serde_json::to_value(&missing).unwrap(),
            json!({
                "status": "error",
                "kind": "not_found",
                "message": "collection 'ghost' not found"
            })
        );
        assert!(!missing.is_success());

        let io = Response::from(StorageError::Io(std::io::Error::other("boom")));
        assert_eq!(
            serde_json::to_value(&io).unwrap(),
            json!({"status": "fatal_error", "error": "io error: boom"})
        );

        let payload = Response::from(DatabaseError::InvalidPayload("bad".into()));
        assert!(matches!(payload, Response::FatalError { .. }));
    }

    #[test]
    fn test_single_line_for_mutations() {
        let response = Response::Success(Outcome::created("t", vec!["id".into()]));
        assert!(!response.to_json().contains('\n'));
    }
}
