use std::time::Duration;

use moka::future::Cache;
use tracing::debug;

/// Rendered-page cache for the index listing. Entries expire after a fixed
/// time to live and are not invalidated by writes.
#[derive(Clone)]
pub struct PageCache {
    pages: Cache<String, String>,
}

impl PageCache {
    pub fn new(ttl: Duration) -> Self {
        Self {
            pages: Cache::builder()
                .max_capacity(1_000)
                .time_to_live(ttl)
                .build(),
        }
    }

    pub async fn get(&self, key: &str) -> Option<String> {
        let hit = self.pages.get(key).await;
        debug!(key, hit = hit.is_some(), "page cache lookup");
        hit
    }

    pub async fn insert(&self, key: String, body: String) {
        self.pages.insert(key, body).await;
    }

    pub fn flush(&self) {
        self.pages.invalidate_all();
    }
}
