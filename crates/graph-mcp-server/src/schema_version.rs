//! Schema-version fingerprint cache.
//!
//! The fingerprint is an MD5 digest over the ordered `(pack_id, updated_at_unix)` pairs of
//! every installed template pack, truncated to 16 hex characters. Computing it walks every
//! installed pack, so it is cached with a short TTL behind a double-checked lock rather than
//! recomputed on every `schema_version` tool call.

use std::sync::Arc;
use std::time::{Duration, Instant};

use tokio::sync::RwLock;

use crate::storage::StorageClient;

struct Cached {
    fingerprint: String,
    computed_at: Instant,
}

/// Caches the schema-version fingerprint for `ttl`, recomputing it from the storage
/// collaborator on expiry.
pub struct SchemaVersionCache {
    storage: Arc<dyn StorageClient>,
    ttl: Duration,
    cached: RwLock<Option<Cached>>,
}

impl SchemaVersionCache {
    #[must_use]
    pub fn new(storage: Arc<dyn StorageClient>, ttl: Duration) -> Self {
        Self { storage, ttl, cached: RwLock::new(None) }
    }

    /// Returns the current fingerprint, recomputing it if absent or stale.
    ///
    /// # Errors
    ///
    /// Returns an error if the storage collaborator fails to list installed template packs.
    pub async fn get(&self) -> Result<String, String> {
        if let Some(fingerprint) = self.fresh_cached().await {
            return Ok(fingerprint);
        }

        let mut guard = self.cached.write().await;
        // Re-check: another task may have refreshed the cache while we waited for the lock.
        if let Some(cached) = guard.as_ref() {
            if cached.computed_at.elapsed() < self.ttl {
                return Ok(cached.fingerprint.clone());
            }
        }

        let fingerprint = self.compute().await?;
        *guard = Some(Cached { fingerprint: fingerprint.clone(), computed_at: Instant::now() });
        Ok(fingerprint)
    }

    async fn fresh_cached(&self) -> Option<String> {
        let guard = self.cached.read().await;
        let cached = guard.as_ref()?;
        (cached.computed_at.elapsed() < self.ttl).then(|| cached.fingerprint.clone())
    }

    async fn compute(&self) -> Result<String, String> {
        let mut pairs = self.storage.schema_fingerprint_inputs().await?;
        pairs.sort_by_key(|(id, _)| *id);

        let canonical = pairs
            .into_iter()
            .map(|(id, updated_at)| format!("{id}:{updated_at}"))
            .collect::<Vec<_>>()
            .join("|");
        let digest = md5::compute(canonical.as_bytes());
        Ok(format!("{digest:x}")[..16].to_string())
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::storage::memory::InMemoryStorage;

    #[tokio::test]
    async fn fingerprint_is_stable_for_the_same_inputs() {
        let storage: Arc<dyn StorageClient> = Arc::new(InMemoryStorage::new());
        storage
            .create_template_pack("Pack".to_string(), "1.0".to_string(), serde_json::json!({}))
            .await
            .unwrap();
        let cache = SchemaVersionCache::new(storage, Duration::from_secs(60));
        let first = cache.get().await.unwrap();
        let second = cache.get().await.unwrap();
        assert_eq!(first, second);
        assert_eq!(first.len(), 16);
    }

    #[tokio::test]
    async fn fingerprint_changes_when_a_pack_is_added() {
        let storage: Arc<dyn StorageClient> = Arc::new(InMemoryStorage::new());
        let cache = SchemaVersionCache::new(Arc::clone(&storage), Duration::from_secs(60));
        let before = cache.get().await.unwrap();

        storage
            .create_template_pack("Pack".to_string(), "1.0".to_string(), serde_json::json!({}))
            .await
            .unwrap();
        // Still within TTL: stale value is served until expiry or an explicit new cache.
        let still_cached = cache.get().await.unwrap();
        assert_eq!(before, still_cached);

        let fresh_cache = SchemaVersionCache::new(storage, Duration::from_millis(0));
        let after = fresh_cache.get().await.unwrap();
        assert_ne!(before, after);
    }
}
