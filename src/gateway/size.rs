//! Per-user stored size, in megabytes.

use crate::store::Snapshot;
use serde::Serialize;
use serde_json::Value;
use std::collections::BTreeMap;

/// Path of the subtree whose children are keyed by user identifier.
pub const USERS_PATH: &str = "users";

const BYTES_PER_MEGABYTE: f64 = 1_048_576.0;

/// Megabytes, rounded to two decimals.
pub fn bytes_to_megabytes(bytes: usize) -> f64 {
    (bytes as f64 / BYTES_PER_MEGABYTE * 100.0).round() / 100.0
}

/// Length in bytes of the compact JSON encoding of `value`.
pub fn encoded_size(value: &Value) -> usize {
    // Encoding a `Value` only fails for non-string map keys, which it cannot hold.
    serde_json::to_vec(value).map(|bytes| bytes.len()).unwrap_or_default()
}

/// Stored size of each user's record, keyed by user identifier.
///
/// Serializes as a flat JSON object with keys in sorted order.
#[derive(Debug, Clone, Default, PartialEq, Serialize)]
#[serde(transparent)]
pub struct UserSizeReport {
    sizes: BTreeMap<String, f64>,
}

impl UserSizeReport {
    /// Measure every child of the `users` snapshot. An absent or non-object
    /// node yields an empty report.
    pub fn from_snapshot(snapshot: &Snapshot) -> Self {
        let sizes = snapshot
            .children()
            .map(|(uid, value)| (uid.to_string(), bytes_to_megabytes(encoded_size(value))))
            .collect();
        Self { sizes }
    }

    pub fn get(&self, uid: &str) -> Option<f64> {
        self.sizes.get(uid).copied()
    }

    pub fn len(&self) -> usize {
        self.sizes.len()
    }

    pub fn is_empty(&self) -> bool {
        self.sizes.is_empty()
    }

    pub fn iter(&self) -> impl Iterator<Item = (&str, f64)> {
        self.sizes.iter().map(|(uid, size)| (uid.as_str(), *size))
    }
}
