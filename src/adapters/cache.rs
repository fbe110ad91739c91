use crate::core::{RawDocument, ScenarioRequest, ScenarioSource};
use crate::utils::error::Result;
use async_trait::async_trait;
use lru::LruCache;
use std::num::NonZeroUsize;
use std::time::{Duration, Instant};
use tokio::sync::Mutex;

const DEFAULT_CAPACITY: NonZeroUsize = match NonZeroUsize::new(128) {
    Some(capacity) => capacity,
    None => unreachable!(),
};

struct CacheEntry {
    document: RawDocument,
    stored_at: Instant,
}

/// 以正規化後的請求參數為鍵的有界快取（LRU + 可選 TTL）。
///
/// 只快取成功結果；錯誤每次都直接回傳給呼叫端。
pub struct CachedSource<S: ScenarioSource> {
    inner: S,
    entries: Mutex<LruCache<ScenarioRequest, CacheEntry>>,
    ttl: Option<Duration>,
}

impl<S: ScenarioSource> CachedSource<S> {
    pub fn new(inner: S, capacity: usize, ttl: Option<Duration>) -> Self {
        let capacity = NonZeroUsize::new(capacity).unwrap_or(DEFAULT_CAPACITY);
        Self {
            inner,
            entries: Mutex::new(LruCache::new(capacity)),
            ttl,
        }
    }

    pub async fn len(&self) -> usize {
        self.entries.lock().await.len()
    }

    pub async fn is_empty(&self) -> bool {
        self.entries.lock().await.is_empty()
    }

    async fn lookup(&self, key: &ScenarioRequest) -> Option<RawDocument> {
        let mut entries = self.entries.lock().await;
        let expired = match entries.get(key) {
            Some(entry) => match self.ttl {
                Some(ttl) if entry.stored_at.elapsed() >= ttl => true,
                _ => return Some(entry.document.clone()),
            },
            None => return None,
        };

        if expired {
            tracing::debug!("🗑️ Cache entry expired for {:?}", key);
            entries.pop(key);
        }
        None
    }
}

#[async_trait]
impl<S: ScenarioSource> ScenarioSource for CachedSource<S> {
    async fn fetch(&self, request: &ScenarioRequest) -> Result<RawDocument> {
        let key = request.normalized();

        if let Some(document) = self.lookup(&key).await {
            tracing::debug!("⚡ Cache hit for {} in '{}'", key.identifier, key.source);
            return Ok(document);
        }

        // 取得資料時不持有鎖，避免慢速上游阻塞其他請求
        let document = self.inner.fetch(request).await?;

        let mut entries = self.entries.lock().await;
        entries.put(
            key,
            CacheEntry {
                document: document.clone(),
                stored_at: Instant::now(),
            },
        );
        Ok(document)
    }
}
