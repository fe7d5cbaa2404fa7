//! Process-wide memo cache for reference lists (languages, categories).
//!
//! Values are produced once per key and handed out as shared `Arc`s.
//! Consumers never get a mutable view: anything draft-specific (such as
//! category selection) must be projected into a consumer-owned copy.
//!
//! # Example
//!
//! ```no_run
//! # async fn demo(service: &dyn article_composer::api::ArticleService) {
//! use article_composer::cache::ReferenceDataCache;
//!
//! let cache = ReferenceDataCache::new(64);
//! let first = cache.languages(service).await.unwrap();
//! let again = cache.languages(service).await.unwrap(); // no second fetch
//! assert!(std::sync::Arc::ptr_eq(&first, &again));
//! # }
//! ```

use lru::LruCache;
use std::any::Any;
use std::collections::HashMap;
use std::future::Future;
use std::num::NonZeroUsize;
use std::sync::{Arc, Mutex, PoisonError};
use thiserror::Error;
use tokio::sync::OnceCell;

use crate::api::routes;
use crate::api::{ApiError, ArticleService};
use crate::model::{Category, Language};

type SharedValue = Arc<dyn Any + Send + Sync>;
type Slot = Arc<OnceCell<SharedValue>>;

#[derive(Debug, Error)]
pub enum CacheError {
    /// The producer for `key` failed. Nothing was cached.
    #[error("Failed to load {key}: {source}")]
    Producer {
        key: String,
        #[source]
        source: ApiError,
    },
    /// `key` holds a value of a different type than requested.
    #[error("Cached value for {key} has an unexpected type")]
    TypeMismatch { key: String },
}

/// Keyed, fetch-once cache. Cloning yields another handle to the same store.
/// Cached values plus fetches still in flight. Only finished values take
/// LRU capacity, so a pending or failed fetch never evicts a good entry.
struct Entries {
    ready: LruCache<String, SharedValue>,
    pending: HashMap<String, Slot>,
}

/// Keyed, fetch-once cache. Cloning yields another handle to the same store.
#[derive(Clone)]
pub struct ReferenceDataCache {
    entries: Arc<Mutex<Entries>>,
}

impl ReferenceDataCache {
    /// Create a cache holding at most `capacity` keys (minimum 1).
    pub fn new(capacity: usize) -> Self {
        let capacity = NonZeroUsize::new(capacity).unwrap_or(NonZeroUsize::MIN);
        Self {
            entries: Arc::new(Mutex::new(Entries {
                ready: LruCache::new(capacity),
                pending: HashMap::new(),
            })),
        }
    }

    /// Return the value cached under `key`, running `producer` only if no
    /// value is cached yet.
    ///
    /// Concurrent first callers share a single producer run. A failed run
    /// leaves the key empty, so the next `get` runs the producer again.
    pub async fn get<T, F, Fut>(&self, key: &str, producer: F) -> Result<Arc<T>, CacheError>
    where
        T: Send + Sync + 'static,
        F: FnOnce() -> Fut,
        Fut: Future<Output = Result<T, ApiError>>,
    {
        let slot = {
            let mut entries = self.lock();
            if let Some(value) = entries.ready.get(key) {
                tracing::trace!(key = %key, "Reference cache hit");
                return Self::downcast(key, value);
            }
            Arc::clone(
                entries
                    .pending
                    .entry(key.to_owned())
                    .or_insert_with(|| Arc::new(OnceCell::new())),
            )
        };

        let result = slot
            .get_or_try_init(|| async move {
                tracing::debug!(key = %key, "Reference cache miss, fetching");
                producer().await.map(|v| Arc::new(v) as SharedValue)
            })
            .await
            .cloned();

        let mut entries = self.lock();
        if entries
            .pending
            .get(key)
            .is_some_and(|pending| Arc::ptr_eq(pending, &slot))
        {
            entries.pending.remove(key);
        }

        match result {
            Ok(value) => {
                entries.ready.put(key.to_owned(), Arc::clone(&value));
                Self::downcast(key, &value)
            }
            Err(source) => {
                tracing::warn!(key = %key, error = %source, "Reference fetch failed");
                Err(CacheError::Producer {
                    key: key.to_owned(),
                    source,
                })
            }
        }
    }

    /// Languages list, cached under the `admin.languages` route name.
    pub async fn languages(
        &self,
        service: &dyn ArticleService,
    ) -> Result<Arc<Vec<Language>>, CacheError> {
        self.get(routes::LANGUAGES, || service.fetch_languages()).await
    }

    /// Categories list, cached under the `admin.categories` route name.
    pub async fn categories(
        &self,
        service: &dyn ArticleService,
    ) -> Result<Arc<Vec<Category>>, CacheError> {
        self.get(routes::CATEGORIES, || service.fetch_categories())
            .await
    }

    /// Drop the value for `key`; the next `get` fetches again.
    pub fn invalidate(&self, key: &str) -> bool {
        self.lock().ready.pop(key).is_some()
    }

    pub fn clear(&self) {
        let mut entries = self.lock();
        entries.ready.clear();
        entries.pending.clear();
    }

    /// True if a value (not just a pending fetch) is cached for `key`.
    pub fn contains(&self, key: &str) -> bool {
        self.lock().ready.contains(key)
    }

    pub fn len(&self) -> usize {
        self.lock().ready.len()
    }

    pub fn is_empty(&self) -> bool {
        self.len() == 0
    }

    fn lock(&self) -> std::sync::MutexGuard<'_, Entries> {
        // The maps are never left half-updated, so a poisoned lock is still usable
        self.entries.lock().unwrap_or_else(PoisonError::into_inner)
    }

    fn downcast<T: Send + Sync + 'static>(key: &str, value: &SharedValue) -> Result<Arc<T>, CacheError> {
        Arc::clone(value)
            .downcast::<T>()
            .map_err(|_| CacheError::TypeMismatch {
                key: key.to_owned(),
            })
    }
}

impl std::fmt::Debug for ReferenceDataCache {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("ReferenceDataCache")
            .field("len", &self.len())
            .finish()
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::sync::atomic::{AtomicUsize, Ordering};
    use std::time::Duration;

    fn english() -> Vec<Language> {
        vec![Language {
            id: 5,
            name: "English".to_string(),
            slug: "en".to_string(),
        }]
    }

    #[tokio::test]
    async fn test_second_get_reuses_value() {
        let cache = ReferenceDataCache::new(8);
        let calls = AtomicUsize::new(0);

        let first = cache
            .get("languages", || async {
                calls.fetch_add(1, Ordering::SeqCst);
                Ok(english())
            })
            .await
            .unwrap();
        let second = cache
            .get("languages", || async {
                calls.fetch_add(1, Ordering::SeqCst);
                Ok(Vec::<Language>::new())
            })
            .await
            .unwrap();

        assert_eq!(calls.load(Ordering::SeqCst), 1);
        assert!(Arc::ptr_eq(&first, &second));
        assert_eq!(second[0].slug, "en");
    }

    #[tokio::test]
    async fn test_failure_is_not_cached() {
        let cache = ReferenceDataCache::new(8);

        let result = cache
            .get("languages", || async {
                Err::<Vec<Language>, _>(ApiError::HttpStatus(500))
            })
            .await;
        assert!(matches!(
            result,
            Err(CacheError::Producer {
                source: ApiError::HttpStatus(500),
                ..
            })
        ));
        assert!(!cache.contains("languages"));

        let retried = cache
            .get("languages", || async { Ok(english()) })
            .await
            .unwrap();
        assert_eq!(retried.len(), 1);
        assert!(cache.contains("languages"));
    }

    #[tokio::test]
    async fn test_type_mismatch() {
        let cache = ReferenceDataCache::new(8);
        cache
            .get("languages", || async { Ok(english()) })
            .await
            .unwrap();

        let result = cache
            .get("languages", || async { Ok(Vec::<Category>::new()) })
            .await;
        assert!(matches!(result, Err(CacheError::TypeMismatch { key }) if key == "languages"));
    }

    #[tokio::test]
    async fn test_invalidate_forces_refetch() {
        let cache = ReferenceDataCache::new(8);
        let calls = AtomicUsize::new(0);
        let produce = || async {
            calls.fetch_add(1, Ordering::SeqCst);
            Ok(english())
        };

        cache.get("languages", produce).await.unwrap();
        assert!(cache.invalidate("languages"));
        assert!(!cache.invalidate("languages"));
        cache.get("languages", produce).await.unwrap();

        assert_eq!(calls.load(Ordering::SeqCst), 2);
    }

    #[tokio::test]
    async fn test_concurrent_first_callers_share_one_fetch() {
        let cache = ReferenceDataCache::new(8);
        let calls = AtomicUsize::new(0);
        let produce = || async {
            calls.fetch_add(1, Ordering::SeqCst);
            tokio::time::sleep(Duration::from_millis(20)).await;
            Ok(english())
        };

        let (a, b) = tokio::join!(cache.get("languages", produce), cache.get("languages", produce));

        assert_eq!(calls.load(Ordering::SeqCst), 1);
        assert!(Arc::ptr_eq(&a.unwrap(), &b.unwrap()));
    }

    #[tokio::test]
    async fn test_lru_eviction() {
        let cache = ReferenceDataCache::new(1);
        cache.get("a", || async { Ok(1u32) }).await.unwrap();
        cache.get("b", || async { Ok(2u32) }).await.unwrap();

        assert!(!cache.contains("a"));
        assert!(cache.contains("b"));
        assert_eq!(cache.len(), 1);

        cache.clear();
        assert!(cache.is_empty());
    }

    #[tokio::test]
    async fn test_failed_fetch_keeps_cached_entries() {
        let cache = ReferenceDataCache::new(1);
        cache.get("a", || async { Ok(1u32) }).await.unwrap();

        let failed = cache
            .get("b", || async { Err::<u32, _>(ApiError::HttpStatus(503)) })
            .await;
        assert!(failed.is_err());

        assert!(cache.contains("a"));
        assert!(!cache.contains("b"));
        assert_eq!(cache.len(), 1);
        let a = cache
            .get("a", || async { Ok(99u32) })
            .await
            .unwrap();
        assert_eq!(*a, 1);
    }

    #[tokio::test]
    async fn test_clones_share_store() {
        let cache = ReferenceDataCache::new(4);
        let other = cache.clone();
        cache.get("k", || async { Ok(7u8) }).await.unwrap();
        assert!(other.contains("k"));
    }
}
