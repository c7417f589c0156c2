//! In-process cache of presigned GET URLs.
//!
//! Entries are keyed by bucket id and storage key. A task that rewrites a file
//! under an existing key must invalidate the entry so clients stop receiving a
//! URL for stale bytes.

use crate::traits::{StorageProvider, StorageResult};
use lru::LruCache;
use std::num::NonZeroUsize;
use std::sync::Mutex;
use std::time::{Duration, Instant};

#[derive(Debug, Clone)]
struct CachedUrl {
    url: String,
    expires_at: Instant,
}

pub struct SignedUrlCache {
    entries: Mutex<LruCache<(i64, String), CachedUrl>>,
    ttl: Duration,
}

impl SignedUrlCache {
    /// URLs are signed for `ttl` and served from cache until half of it has elapsed.
    pub fn new(capacity: NonZeroUsize, ttl: Duration) -> Self {
        Self {
            entries: Mutex::new(LruCache::new(capacity)),
            ttl,
        }
    }

    pub async fn get_or_sign(
        &self,
        bucket_id: i64,
        path: &str,
        provider: &dyn StorageProvider,
    ) -> StorageResult<String> {
        let key = (bucket_id, path.to_string());
        let now = Instant::now();

        if let Ok(mut entries) = self.entries.lock() {
            if let Some(cached) = entries.get(&key) {
                if cached.expires_at > now {
                    return Ok(cached.url.clone());
                }
            }
        }

        let url = provider.presigned_url(path, self.ttl).await?;
        if let Ok(mut entries) = self.entries.lock() {
            entries.put(
                key,
                CachedUrl {
                    url: url.clone(),
                    expires_at: now + self.ttl / 2,
                },
            );
        }
        Ok(url)
    }

    pub fn invalidate(&self, bucket_id: i64, path: &str) {
        if let Ok(mut entries) = self.entries.lock() {
            if entries.pop(&(bucket_id, path.to_string())).is_some() {
                tracing::debug!(bucket.id = bucket_id, key = %path, "Signed URL invalidated");
            }
        }
    }

    pub fn contains(&self, bucket_id: i64, path: &str) -> bool {
        self.entries
            .lock()
            .map(|entries| entries.contains(&(bucket_id, path.to_string())))
            .unwrap_or(false)
    }
}
