//! Cache gateway: explicit-invalidation key/value store.
//!
//! Entries live until invalidated — there is no TTL and no eviction.
//! The service layer reads through this cache and deletes keys after
//! mutations commit (write-invalidate, never write-through).

pub mod keys;

use std::collections::HashMap;
use std::sync::RwLock;

use tracing::debug;

/// Key/value cache consumed by the service layer.
///
/// Values are serialized JSON snapshots of entities or collections.
pub trait Cache: Send + Sync {
    fn get(&self, key: &str) -> Option<String>;

    /// Store a value. Setting an empty value is a no-op so that "nothing"
    /// is never cached as a positive entry.
    fn set(&self, key: &str, value: &str);

    fn delete(&self, key: &str);

    /// Remove every key sharing a prefix. Used for bulk invalidation
    /// after destructive operations.
    fn delete_prefix(&self, prefix: &str);
}

/// In-process cache backed by a `HashMap`.
#[derive(Default)]
pub struct MemoryCache {
    entries: RwLock<HashMap<String, String>>,
}

impl MemoryCache {
    pub fn new() -> Self {
        Self::default()
    }
}

impl Cache for MemoryCache {
    fn get(&self, key: &str) -> Option<String> {
        self.entries
            .read()
            .ok()
            .and_then(|map| map.get(key).cloned())
    }

    fn set(&self, key: &str, value: &str) {
        if value.is_empty() {
            return;
        }
        if let Ok(mut map) = self.entries.write() {
            map.insert(key.to_string(), value.to_string());
        }
    }

    fn delete(&self, key: &str) {
        if let Ok(mut map) = self.entries.write() {
            map.remove(key);
        }
    }

    fn delete_prefix(&self, prefix: &str) {
        if let Ok(mut map) = self.entries.write() {
            let before = map.len();
            map.retain(|key, _| !key.starts_with(prefix));
            debug!("Invalidated {} keys under '{}'", before - map.len(), prefix);
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_set_get_delete() {
        let cache = MemoryCache::new();
        assert_eq!(cache.get("tweets:1"), None);

        cache.set("tweets:1", "{\"id\":1}");
        assert_eq!(cache.get("tweets:1"), Some("{\"id\":1}".to_string()));

        cache.delete("tweets:1");
        assert_eq!(cache.get("tweets:1"), None);
    }

    #[test]
    fn test_empty_value_is_not_cached() {
        let cache = MemoryCache::new();
        cache.set("tweets", "");
        assert_eq!(cache.get("tweets"), None);
    }

    #[test]
    fn test_delete_prefix_sweeps_collection_and_items() {
        let cache = MemoryCache::new();
        cache.set("users", "[]");
        cache.set("users:1", "{}");
        cache.set("users:2", "{}");
        cache.set("tweets:1", "{}");

        cache.delete_prefix("users");

        assert_eq!(cache.get("users"), None);
        assert_eq!(cache.get("users:1"), None);
        assert_eq!(cache.get("users:2"), None);
        assert_eq!(cache.get("tweets:1"), Some("{}".to_string()));
    }
}
