//! Record id generation.
//!
//! Ids are only synthesized when a collection declares an `id` field and the
//! caller did not supply one. None of the generators here check the file for
//! collisions; callers that need hard uniqueness supply their own ids.

use std::collections::hash_map::DefaultHasher;
use std::hash::{Hash, Hasher};
use std::sync::atomic::{AtomicU64, Ordering};

use serde_json::{Map, Value};

/// Strategy for synthesizing a record id.
pub trait IdGenerator: Send + Sync {
    /// produce an id for the record about to be appended
    fn generate(&self, data: &Map<String, Value>) -> String;
}

/// Hash of the wall-clock timestamp and the record content.
///
/// Rendered as the low-order 8 hex digits of the hash. Cheap and short, but
/// two ids can collide.
#[derive(Debug, Default, Clone, Copy)]
pub struct ClockHashIdGenerator;

impl ClockHashIdGenerator {
    /// number of hex digits kept
    const WIDTH: usize = 8;

    pub fn new() -> Self {
        Self
    }

    fn render(seed: &str) -> String {
        let mut hasher = DefaultHasher::new();
        seed.hash(&mut hasher);
        let hex = format!("{:016x}", hasher.finish());
        hex[hex.len() - Self::WIDTH..].to_string()
    }
}

impl IdGenerator for ClockHashIdGenerator {
    fn generate(&self, data: &Map<String, Value>) -> String {
        let now = chrono::Utc::now().to_rfc3339_opts(chrono::SecondsFormat::Nanos, true);
        let content = Value::Object(data.clone()).to_string();
        Self::render(&format!("{now}{content}"))
    }
}

/// Lower-case ULIDs: sortable by creation time, collision-resistant.
#[derive(Debug, Default, Clone, Copy)]
pub struct UlidIdGenerator;

impl UlidIdGenerator {
    pub fn new() -> Self {
        Self
    }
}

impl IdGenerator for UlidIdGenerator {
    fn generate(&self, _data: &Map<String, Value>) -> String {
        ulid::Ulid::new().to_string().to_lowercase()
    }
}

/// Monotonic in-process counter. Deterministic; meant for tests.
#[derive(Debug)]
pub struct SequenceIdGenerator {
    next: AtomicU64,
}

impl SequenceIdGenerator {
    pub fn new() -> Self {
        Self::starting_at(1)
    }

    pub fn starting_at(first: u64) -> Self {
        Self {
            next: AtomicU64::new(first),
        }
    }
}

impl Default for SequenceIdGenerator {
    fn default() -> Self {
        Self::new()
    }
}

impl IdGenerator for SequenceIdGenerator {
    fn generate(&self, _data: &Map<String, Value>) -> String {
        self.next.fetch_add(1, Ordering::Relaxed).to_string()
    }
}
