use std::collections::HashMap;
use std::sync::Mutex;

use tokio::time::{Duration, Instant};

use super::CacheBackend;
use crate::error::{AppError, AppResult};

struct Entry {
    value: String,
    expires_at: Instant,
}

/// Process-local [`CacheBackend`] with per-entry expiry
///
/// Writes land synchronously; expired entries are dropped lazily on read.
#[derive(Default)]
pub struct MemoryBackend {
    entries: Mutex<HashMap<String, Entry>>,
}

impl MemoryBackend {
    pub fn new() -> Self {
        Self::default()
    }

    fn lock(&self) -> AppResult<std::sync::MutexGuard<'_, HashMap<String, Entry>>> {
        self.entries
            .lock()
            .map_err(|_| AppError::Internal("In-memory cache lock poisoned".to_string()))
    }
}

#[async_trait::async_trait]
impl CacheBackend for MemoryBackend {
    async fn get(&self, key: &str) -> AppResult<Option<String>> {
        let mut entries = self.lock()?;
        let now = Instant::now();

        match entries.get(key) {
            Some(entry) if entry.expires_at > now => Ok(Some(entry.value.clone())),
            Some(_) => {
                entries.remove(key);
                Ok(None)
            }
            None => Ok(None),
        }
    }

    fn set_in_background(&self, key: String, value: String, ttl: u64) {
        let entry = Entry {
            value,
            expires_at: Instant::now() + Duration::from_secs(ttl),
        };

        match self.lock() {
            Ok(mut entries) => {
                entries.insert(key, entry);
            }
            Err(e) => tracing::error!(error = %e, "Failed to write to in-memory cache"),
        }
    }

    async fn delete_prefix(&self, prefix: &str) -> AppResult<u64> {
        let mut entries = self.lock()?;
        let before = entries.len();
        entries.retain(|key, _| !key.starts_with(prefix));
        Ok((before - entries.len()) as u64)
    }

    async fn ping(&self) -> AppResult<()> {
        self.lock().map(|_| ())
    }

    fn name(&self) -> &'static str {
        "memory"
    }
}
