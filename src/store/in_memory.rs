//! In-memory JSON tree for tests and local runs.

use super::{Snapshot, StoreError, TreeStore, path_segments};
use log::{debug, trace};
use serde_json::{Map, Value};
use std::sync::Arc;
use tokio::sync::RwLock;

/// A JSON tree behind an async lock.
///
/// Writes follow the store's semantics: intermediate nodes are created as
/// needed and writing `null` removes the node.
#[derive(Clone, Default)]
pub struct InMemoryTreeStore {
    root: Arc<RwLock<Value>>,
}

impl InMemoryTreeStore {
    pub fn new() -> Self {
        Self::default()
    }

    /// A store whose root holds `value`.
    pub fn with_root(value: Value) -> Self {
        Self {
            root: Arc::new(RwLock::new(value)),
        }
    }

    /// Replace the node at `path` with `value`.
    pub async fn set(&self, path: &str, value: Value) -> Result<(), StoreError> {
        let segments = path_segments(path)?;
        trace!("set {} = {}", path, value);

        let mut root = self.root.write().await;
        let Some((last, parents)) = segments.split_last() else {
            *root = value;
            return Ok(());
        };

        if value.is_null() {
            remove(&mut root, parents, last);
            return Ok(());
        }

        let mut node = &mut *root;
        for segment in parents {
            node = child_object(node).entry(*segment).or_insert(Value::Null);
        }
        child_object(node).insert((*last).to_string(), value);
        Ok(())
    }

    /// Drop all data.
    pub async fn clear(&self) {
        *self.root.write().await = Value::Null;
    }
}

// Turn a leaf or empty node into an object so it can hold children.
fn child_object(node: &mut Value) -> &mut Map<String, Value> {
    if !node.is_object() {
        *node = Value::Object(Map::new());
    }
    match node {
        Value::Object(map) => map,
        _ => unreachable!("node was just replaced by an object"),
    }
}

fn remove(root: &mut Value, parents: &[&str], last: &str) {
    let mut node = root;
    for segment in parents {
        match node.get_mut(*segment) {
            Some(child) => node = child,
            None => return,
        }
    }
    if let Some(map) = node.as_object_mut() {
        map.remove(last);
    }
}

impl TreeStore for InMemoryTreeStore {
    async fn read(&self, path: &str) -> Result<Snapshot, StoreError> {
        let segments = path_segments(path)?;
        debug!("Reading /{}", segments.join("/"));

        let root = self.root.read().await;
        let node = segments
            .iter()
            .try_fold(&*root, |node, segment| node.get(*segment));
        Ok(node.cloned().map(Snapshot::new).unwrap_or_else(Snapshot::empty))
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use serde_json::json;

    #[tokio::test]
    async fn test_set_and_read() {
        let store = InMemoryTreeStore::new();
        store.set("users/u1/profile", json!({"name": "Ana"})).await.unwrap();
        store.set("users/u2", json!(42)).await.unwrap();

        let users = store.read("users").await.unwrap();
        assert_eq!(
            users.value(),
            Some(&json!({"u1": {"profile": {"name": "Ana"}}, "u2": 42}))
        );
        assert_eq!(
            store.read("/users/u1/profile/name").await.unwrap().value(),
            Some(&json!("Ana"))
        );
    }

    #[tokio::test]
    async fn test_missing_path_is_empty() {
        let store = InMemoryTreeStore::new();
        assert!(!store.read("users").await.unwrap().exists());

        store.set("users/u2", json!(42)).await.unwrap();
        assert!(!store.read("users/u2/deeper").await.unwrap().exists());
    }

    #[tokio::test]
    async fn test_null_removes_node() {
        let store = InMemoryTreeStore::with_root(json!({"users": {"u1": 1, "u2": 2}}));
        store.set("users/u1", Value::Null).await.unwrap();
        store.set("nothing/here", Value::Null).await.unwrap();

        assert_eq!(
            store.read("").await.unwrap().value(),
            Some(&json!({"users": {"u2": 2}}))
        );
    }

    #[tokio::test]
    async fn test_set_replaces_leaf_with_object() {
        let store = InMemoryTreeStore::new();
        store.set("users", json!("leaf")).await.unwrap();
        store.set("users/u1", json!(true)).await.unwrap();

        assert_eq!(
            store.read("users").await.unwrap().value(),
            Some(&json!({"u1": true}))
        );
    }

    #[tokio::test]
    async fn test_invalid_path_rejected() {
        let store = InMemoryTreeStore::new();
        assert!(store.set("users/a#b", json!(1)).await.is_err());
        assert!(store.read("users/$id").await.is_err());
    }
}
