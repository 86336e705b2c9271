//! Read access to the hierarchical key-value store.
//!
//! The store is a JSON tree addressed by slash-separated paths. The gateway
//! only ever needs one-shot snapshot reads of a subtree, so that is the whole
//! of the [`TreeStore`] trait.
//!
//! # Example Usage
//!
//! ```rust
//! use directory_gateway::store::{InMemoryTreeStore, TreeStore};
//! use serde_json::json;
//!
//! # async fn example() -> Result<(), Box<dyn std::error::Error>> {
//! let store = InMemoryTreeStore::new();
//! store.set("users/u1", json!({"name": "Ana"})).await?;
//!
//! let snapshot = store.read("users").await?;
//! let keys: Vec<&str> = snapshot.children().map(|(key, _)| key).collect();
//! assert_eq!(keys, ["u1"]);
//! # Ok(())
//! # }
//! ```

pub mod errors;
pub mod in_memory;
pub mod realtime;

pub use errors::StoreError;
pub use in_memory::InMemoryTreeStore;
pub use realtime::RealtimeDatabaseStore;

use serde_json::Value;
use std::future::Future;

/// Characters the store does not allow inside a key.
const FORBIDDEN_KEY_CHARS: &[char] = &['.', '$', '#', '[', ']'];

/// One-shot snapshot reads of a subtree.
pub trait TreeStore: Send + Sync {
    /// Read the node at `path`. A path with no data yields an empty snapshot.
    fn read(&self, path: &str) -> impl Future<Output = Result<Snapshot, StoreError>> + Send;
}

/// The value of a node at the moment it was read.
#[derive(Debug, Clone, PartialEq)]
pub struct Snapshot {
    value: Option<Value>,
}

impl Snapshot {
    /// Wrap a node value. `null` is treated as absent.
    pub fn new(value: Value) -> Self {
        match value {
            Value::Null => Self::empty(),
            value => Self { value: Some(value) },
        }
    }

    pub fn empty() -> Self {
        Self { value: None }
    }

    pub fn exists(&self) -> bool {
        self.value.is_some()
    }

    pub fn value(&self) -> Option<&Value> {
        self.value.as_ref()
    }

    /// Child keys and values in key order. Leaves and absent nodes have no children.
    pub fn children(&self) -> impl Iterator<Item = (&str, &Value)> {
        self.value
            .as_ref()
            .and_then(Value::as_object)
            .into_iter()
            .flat_map(|object| object.iter().map(|(key, value)| (key.as_str(), value)))
    }
}

/// Split a path into its keys, ignoring leading, trailing and doubled slashes.
pub fn path_segments(path: &str) -> Result<Vec<&str>, StoreError> {
    let segments: Vec<&str> = path.split('/').filter(|s| !s.is_empty()).collect();

    for segment in &segments {
        if let Some(c) = segment.chars().find(|c| FORBIDDEN_KEY_CHARS.contains(c)) {
            return Err(StoreError::invalid_path(
                path,
                format!("contains '{}'", c),
            ));
        }
    }
    Ok(segments)
}
