//! core types for the storage layer: collection names, schemas, records, filters.

use std::fmt;
use std::path::{Path, PathBuf};

use serde::ser::SerializeMap;
use serde::{Deserialize, Serialize, Serializer};
use serde_json::Value;

/// A sanitized collection name.
///
/// Collection names are reduced to their identifier-safe subset before they
/// are turned into a path, so they can never escape the storage root.
///
/// Kept characters:
/// - ASCII alphanumerics
/// - underscores and hyphens
///
/// Everything else is silently stripped. Two different requested names can
/// therefore map to the same collection (`"my notes"` and `"mynotes"`).
#[derive(Debug, Clone, PartialEq, Eq, Hash, Serialize)]
pub struct CollectionName(String);

impl CollectionName {
    /// file extension of a collection file
    pub const EXTENSION: &'static str = "csv";

    /// sanitize a requested name, failing only if nothing survives
    pub fn new(name: impl AsRef<str>) -> Result<Self, InvalidNameError> {
        let requested = name.as_ref();
        let clean = Self::sanitize(requested);
        if clean.is_empty() {
            return Err(InvalidNameError::Empty(requested.to_string()));
        }
        Ok(Self(clean))
    }

    /// strip every character outside `[A-Za-z0-9_-]`
    pub fn sanitize(name: &str) -> String {
        name.chars()
            .filter(|c| c.is_ascii_alphanumeric() || *c == '_' || *c == '-')
            .collect()
    }

    /// recover a collection name from a file path, if it looks like one
    pub(crate) fn from_path(path: &Path) -> Option<Self> {
        if path.extension()? != Self::EXTENSION {
            return None;
        }
        let stem = path.file_stem()?.to_str()?;
        if stem.is_empty() || Self::sanitize(stem) != stem {
            return None;
        }
        Some(Self(stem.to_string()))
    }

    /// path of this collection's file under `root`
    pub fn path_in(&self, root: &Path) -> PathBuf {
        root.join(format!("{}.{}", self.0, Self::EXTENSION))
    }

    pub fn as_str(&self) -> &str {
        &self.0
    }

    pub fn into_string(self) -> String {
        self.0
    }
}

impl fmt::Display for CollectionName {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{}", self.0)
    }
}

impl AsRef<str> for CollectionName {
    fn as_ref(&self) -> &str {
        &self.0
    }
}

/// error type for names that sanitize to nothing
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum InvalidNameError {
    Empty(String),
}

impl fmt::Display for InvalidNameError {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Self::Empty(requested) => write!(
                f,
                "'{}' contains no usable characters (allowed: A-Z, a-z, 0-9, '_', '-')",
                requested
            ),
        }
    }
}

impl std::error::Error for InvalidNameError {}

/// The ordered field list of a collection (its header line).
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct Schema {
    fields: Vec<String>,
}

impl Schema {
    /// name of the field used as the external record identifier
    pub const ID_FIELD: &'static str = "id";

    /// build a schema, rejecting empty and duplicated field lists
    pub fn new(fields: Vec<String>) -> Result<Self, SchemaError> {
        if fields.is_empty() {
            return Err(SchemaError::NoFields);
        }
        for (i, field) in fields.iter().enumerate() {
            if fields[..i].contains(field) {
                return Err(SchemaError::DuplicateField(field.clone()));
            }
        }
        Ok(Self { fields })
    }

    pub fn fields(&self) -> &[String] {
        &self.fields
    }

    pub fn into_fields(self) -> Vec<String> {
        self.fields
    }

    pub fn len(&self) -> usize {
        self.fields.len()
    }

    pub fn is_empty(&self) -> bool {
        self.fields.is_empty()
    }

    /// position of a field in the header
    pub fn position(&self, field: &str) -> Option<usize> {
        self.fields.iter().position(|f| f == field)
    }

    pub fn contains(&self, field: &str) -> bool {
        self.position(field).is_some()
    }

    /// whether records of this collection carry an `id`
    pub fn has_id(&self) -> bool {
        self.contains(Self::ID_FIELD)
    }

    /// Project a JSON object onto the header order.
    ///
    /// Missing fields become empty strings; keys outside the header are dropped.
    pub fn project(&self, data: &serde_json::Map<String, Value>) -> Vec<String> {
        self.fields
            .iter()
            .map(|f| data.get(f).map(string_form).unwrap_or_default())
            .collect()
    }

    /// Pair a raw row with the header.
    ///
    /// Short rows are padded with empty strings, surplus values are ignored.
    pub fn record_from_row<'a, I>(&self, values: I) -> Record
    where
        I: IntoIterator<Item = &'a str>,
    {
        let mut values = values.into_iter();
        let fields = self
            .fields
            .iter()
            .map(|f| (f.clone(), values.next().unwrap_or_default().to_string()))
            .collect();
        Record { fields }
    }
}

/// schema errors raised at collection creation
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum SchemaError {
    NoFields,
    DuplicateField(String),
}

impl fmt::Display for SchemaError {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Self::NoFields => write!(f, "a collection needs at least one field"),
            Self::DuplicateField(name) => write!(f, "duplicate field '{}'", name),
        }
    }
}

impl std::error::Error for SchemaError {}

/// One stored row, as field/value pairs in header order.
#[derive(Debug, Clone, PartialEq, Eq, Default)]
pub struct Record {
    fields: Vec<(String, String)>,
}

impl Record {
    /// get a value by field name
    pub fn get(&self, field: &str) -> Option<&str> {
        self.fields
            .iter()
            .find(|(name, _)| name == field)
            .map(|(_, value)| value.as_str())
    }

    /// the record's `id` value, if the schema has one
    pub fn id(&self) -> Option<&str> {
        self.get(Schema::ID_FIELD)
    }

    pub fn fields(&self) -> &[(String, String)] {
        &self.fields
    }

    /// values in header order
    pub fn values(&self) -> impl Iterator<Item = &str> {
        self.fields.iter().map(|(_, value)| value.as_str())
    }

    pub fn len(&self) -> usize {
        self.fields.len()
    }

    pub fn is_empty(&self) -> bool {
        self.fields.is_empty()
    }

    /// Overwrite the values present in `updates`, leaving `id` untouched.
    pub fn merge(&mut self, updates: &serde_json::Map<String, Value>) {
        for (name, value) in self.fields.iter_mut() {
            if name == Schema::ID_FIELD {
                continue;
            }
            if let Some(new) = updates.get(name.as_str()) {
                *value = string_form(new);
            }
        }
    }
}

/// Serialized as a JSON object whose keys keep header order.
impl Serialize for Record {
    fn serialize<S: Serializer>(&self, serializer: S) -> Result<S::Ok, S::Error> {
        let mut map = serializer.serialize_map(Some(self.fields.len()))?;
        for (name, value) in &self.fields {
            map.serialize_entry(name, value)?;
        }
        map.end()
    }
}

/// A single-field equality filter for scans.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Filter {
    pub field: String,
    pub value: String,
}

impl Filter {
    pub fn new(field: impl Into<String>, value: impl Into<String>) -> Self {
        Self {
            field: field.into(),
            value: value.into(),
        }
    }

    /// exact string comparison, no coercion
    pub fn matches(&self, record: &Record) -> bool {
        record.get(&self.field) == Some(self.value.as_str())
    }
}

/// The string form a JSON value takes when stored in a cell.
///
/// Strings are kept verbatim, numbers use their JSON rendering, `null` is empty
/// and nested values are stored as compact JSON text.
pub fn string_form(value: &Value) -> String {
    match value {
        Value::Null => String::new(),
        Value::Bool(b) => b.to_string(),
        Value::Number(n) => n.to_string(),
        Value::String(s) => s.clone(),
        other => other.to_string(),
    }
}
