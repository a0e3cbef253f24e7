use std::fmt::Display;
use std::sync::Arc;

use crate::error::{AppError, AppResult};
use crate::models::MediaFilter;

mod macros;
pub mod memory;
pub mod redis;

pub use self::memory::MemoryBackend;
pub use self::redis::{create_redis_client, CacheWriterHandle, RedisBackend};

#[derive(Debug, Clone, PartialEq, Eq, Hash)]
pub enum CacheKey {
    Recommendations {
        user_id: i64,
        filter: MediaFilter,
        limit: usize,
    },
}

impl CacheKey {
    /// Prefix shared by every recommendation key of one user
    pub fn recommendations_prefix(user_id: i64) -> String {
        format!("reco:{}:", user_id)
    }
}

impl Display for CacheKey {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        match self {
            CacheKey::Recommendations {
                user_id,
                filter,
                limit,
            } => write!(
                f,
                "{}{}:{}",
                Self::recommendations_prefix(*user_id),
                filter,
                limit
            ),
        }
    }
}

/// Raw string key-value store behind [`Cache`]
#[async_trait::async_trait]
pub trait CacheBackend: Send + Sync {
    async fn get(&self, key: &str) -> AppResult<Option<String>>;

    /// Queues a write without waiting for it to land
    fn set_in_background(&self, key: String, value: String, ttl: u64);

    /// Removes every key starting with `prefix`, returning how many were removed
    async fn delete_prefix(&self, prefix: &str) -> AppResult<u64>;

    async fn ping(&self) -> AppResult<()>;

    fn name(&self) -> &'static str;
}

/// Typed cache handle shared across services
#[derive(Clone)]
pub struct Cache {
    backend: Arc<dyn CacheBackend>,
}

impl Cache {
    pub fn new(backend: Arc<dyn CacheBackend>) -> Self {
        Self { backend }
    }

    /// Cache kept in process memory, for tests and local runs without Redis
    pub fn in_memory() -> Self {
        Self::new(Arc::new(MemoryBackend::new()))
    }

    /// Redis-backed cache with its background writer task
    pub async fn redis(client: ::redis::Client) -> AppResult<(Self, CacheWriterHandle)> {
        let (backend, handle) = RedisBackend::connect(client).await?;
        Ok((Self::new(Arc::new(backend)), handle))
    }

    pub fn backend_name(&self) -> &'static str {
        self.backend.name()
    }

    /// Retrieves a value from the cache by key
    ///
    /// If the key exists in the cache, the value is deserialized and returned.
    /// If the key does not exist, `None` is returned.
    pub async fn get_from_cache<T: serde::de::DeserializeOwned>(
        &self,
        key: &CacheKey,
    ) -> AppResult<Option<T>> {
        match self.backend.get(&key.to_string()).await? {
            Some(json) => {
                let data = serde_json::from_str(&json).map_err(|e| {
                    AppError::Internal(format!("Cache deserialization error: {}", e))
                })?;
                Ok(Some(data))
            }
            None => Ok(None),
        }
    }

    /// Stores a value in the cache asynchronously without blocking
    ///
    /// Serialization failures are logged and the write is dropped.
    pub fn set_in_background<T: serde::Serialize>(&self, key: &CacheKey, value: &T, ttl: u64) {
        let json = match serde_json::to_string(value) {
            Ok(j) => j,
            Err(e) => {
                tracing::error!(error = %e, "Cache serialization error");
                return;
            }
        };

        self.backend.set_in_background(key.to_string(), json, ttl);
    }

    pub async fn invalidate_prefix(&self, prefix: &str) -> AppResult<u64> {
        self.backend.delete_prefix(prefix).await
    }

    pub async fn ping(&self) -> AppResult<()> {
        self.backend.ping().await
    }
}
