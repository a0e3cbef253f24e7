use std::future::Future;

use redis::aio::ConnectionManager;
use redis::{AsyncCommands, Client};
use tokio::sync::mpsc;
use tokio::task::JoinHandle;

use super::CacheBackend;
use crate::error::AppResult;

const SCAN_BATCH: usize = 100;

/// Creates a Redis client for caching
pub fn create_redis_client(redis_url: &str) -> anyhow::Result<Client> {
    let client = Client::open(redis_url)?;
    Ok(client)
}

/// Write queued for the background task
struct PendingWrite {
    key: String,
    value: String,
    ttl: u64,
}

/// Redis implementation of [`CacheBackend`]
///
/// Reads go straight through a shared [`ConnectionManager`], which reconnects
/// on its own after a dropped connection. Writes are handed to a spawned task
/// so request handlers never wait on `SETEX`.
#[derive(Clone)]
pub struct RedisBackend {
    conn: ConnectionManager,
    write_tx: mpsc::UnboundedSender<PendingWrite>,
}

/// Stops the background writer once the server is done
pub struct CacheWriterHandle {
    shutdown_tx: mpsc::Sender<()>,
    task: JoinHandle<()>,
}

impl CacheWriterHandle {
    /// Spawns the writer loop, applying each queued write with `apply`
    fn spawn<F, Fut>(write_rx: mpsc::UnboundedReceiver<PendingWrite>, apply: F) -> Self
    where
        F: FnMut(PendingWrite) -> Fut + Send + 'static,
        Fut: Future<Output = AppResult<()>> + Send + 'static,
    {
        let (shutdown_tx, shutdown_rx) = mpsc::channel(1);
        let task = tokio::spawn(run_writer(apply, write_rx, shutdown_rx));
        Self { shutdown_tx, task }
    }

    /// Signals the writer and waits until its queue has been flushed
    pub async fn shutdown(self) {
        let _ = self.shutdown_tx.send(()).await;
        if let Err(e) = self.task.await {
            tracing::error!(error = %e, "Cache writer task failed");
        }
    }
}

async fn run_writer<F, Fut>(
    mut apply: F,
    mut write_rx: mpsc::UnboundedReceiver<PendingWrite>,
    mut shutdown_rx: mpsc::Receiver<()>,
) where
    F: FnMut(PendingWrite) -> Fut,
    Fut: Future<Output = AppResult<()>>,
{
    tracing::info!("Cache writer task started");

    loop {
        tokio::select! {
            Some(write) = write_rx.recv() => {
                if let Err(e) = apply(write).await {
                    tracing::error!(error = %e, "Failed to write to Redis cache");
                }
            }
            _ = shutdown_rx.recv() => {
                let mut flushed = 0usize;
                while let Ok(write) = write_rx.try_recv() {
                    match apply(write).await {
                        Ok(()) => flushed += 1,
                        Err(e) => tracing::error!(error = %e, "Failed to flush cache write during shutdown"),
                    }
                }

                tracing::info!(flushed, "Cache writer task stopped");
                break;
            }
        }
    }
}

impl RedisBackend {
    /// Opens the managed connection and spawns the writer task
    pub async fn connect(client: Client) -> AppResult<(Self, CacheWriterHandle)> {
        let conn = ConnectionManager::new(client).await?;
        let (write_tx, write_rx) = mpsc::unbounded_channel();

        let writer_conn = conn.clone();
        let handle = CacheWriterHandle::spawn(write_rx, move |write| {
            let mut conn = writer_conn.clone();
            async move { Self::apply(&mut conn, write).await }
        });

        Ok((Self { conn, write_tx }, handle))
    }

    async fn apply(conn: &mut ConnectionManager, write: PendingWrite) -> AppResult<()> {
        let _: () = conn.set_ex(write.key, write.value, write.ttl).await?;
        Ok(())
    }
}

#[async_trait::async_trait]
impl CacheBackend for RedisBackend {
    async fn get(&self, key: &str) -> AppResult<Option<String>> {
        let mut conn = self.conn.clone();
        let cached: Option<String> = conn.get(key).await?;
        Ok(cached)
    }

    fn set_in_background(&self, key: String, value: String, ttl: u64) {
        if self.write_tx.send(PendingWrite { key, value, ttl }).is_err() {
            tracing::error!("Cache writer is gone, dropping write");
        }
    }

    async fn delete_prefix(&self, prefix: &str) -> AppResult<u64> {
        let mut conn = self.conn.clone();
        let pattern = format!("{}*", prefix);
        let mut cursor: u64 = 0;
        let mut removed: u64 = 0;

        loop {
            let (next, keys): (u64, Vec<String>) = redis::cmd("SCAN")
                .arg(cursor)
                .arg("MATCH")
                .arg(&pattern)
                .arg("COUNT")
                .arg(SCAN_BATCH)
                .query_async(&mut conn)
                .await?;

            if !keys.is_empty() {
                let deleted: u64 = conn.del(&keys).await?;
                removed += deleted;
            }

            if next == 0 {
                break;
            }
            cursor = next;
        }

        Ok(removed)
    }

    async fn ping(&self) -> AppResult<()> {
        let mut conn = self.conn.clone();
        let _: String = redis::cmd("PING").query_async(&mut conn).await?;
        Ok(())
    }

    fn name(&self) -> &'static str {
        "redis"
    }
}

// These tests need a running Redis; point REDIS_URL at it.
#[cfg(test)]
mod tests {
    use std::sync::{Arc, Mutex};
    use std::time::Duration;

    use super::*;
    use crate::error::AppError;

    async fn connect() -> (RedisBackend, CacheWriterHandle) {
        let url =
            std::env::var("REDIS_URL").unwrap_or_else(|_| "redis://localhost:6379".to_string());
        let client = create_redis_client(&url).unwrap();
        RedisBackend::connect(client).await.unwrap()
    }

    #[tokio::test]
    #[ignore = "requires a running Redis instance"]
    async fn test_cache_miss() {
        let (backend, _handle) = connect().await;

        let retrieved = backend.get("reco:nonexistent:all:12345").await.unwrap();
        assert_eq!(retrieved, None);
    }

    #[tokio::test]
    #[ignore = "requires a running Redis instance"]
    async fn test_set_in_background_then_delete_prefix() {
        let (backend, _handle) = connect().await;

        backend.set_in_background("reco:-1:all:10".to_string(), "[]".to_string(), 60);
        backend.set_in_background("reco:-1:anime:5".to_string(), "[]".to_string(), 60);

        tokio::time::sleep(tokio::time::Duration::from_millis(100)).await;

        assert_eq!(
            backend.get("reco:-1:all:10").await.unwrap(),
            Some("[]".to_string())
        );

        let removed = backend.delete_prefix("reco:-1:").await.unwrap();
        assert_eq!(removed, 2);
        assert_eq!(backend.get("reco:-1:anime:5").await.unwrap(), None);
    }

    #[tokio::test]
    #[ignore = "requires a running Redis instance"]
    async fn test_shutdown_flushes_pending_writes() {
        let (backend, handle) = connect().await;

        backend.set_in_background("reco:-2:all:1".to_string(), "[1]".to_string(), 60);
        handle.shutdown().await;

        assert_eq!(
            backend.get("reco:-2:all:1").await.unwrap(),
            Some("[1]".to_string())
        );
        backend.delete_prefix("reco:-2:").await.unwrap();
    }

    fn pending(key: &str) -> PendingWrite {
        PendingWrite {
            key: key.to_string(),
            value: "[]".to_string(),
            ttl: 60,
        }
    }

    #[tokio::test]
    async fn test_shutdown_waits_for_slow_queued_writes() {
        let applied = Arc::new(Mutex::new(Vec::new()));
        let (write_tx, write_rx) = mpsc::unbounded_channel();

        let sink = applied.clone();
        let handle = CacheWriterHandle::spawn(write_rx, move |write: PendingWrite| {
            let sink = sink.clone();
            async move {
                tokio::time::sleep(Duration::from_millis(20)).await;
                sink.lock().unwrap().push(write.key);
                Ok(())
            }
        });

        for key in ["reco:1:all:10", "reco:1:anime:10", "reco:2:all:5"] {
            write_tx.send(pending(key)).unwrap();
        }
        handle.shutdown().await;

        let mut keys = applied.lock().unwrap().clone();
        keys.sort();
        assert_eq!(keys, vec!["reco:1:all:10", "reco:1:anime:10", "reco:2:all:5"]);
    }

    #[tokio::test]
    async fn test_failed_write_does_not_stop_the_writer() {
        let applied = Arc::new(Mutex::new(Vec::new()));
        let (write_tx, write_rx) = mpsc::unbounded_channel();

        let sink = applied.clone();
        let handle = CacheWriterHandle::spawn(write_rx, move |write: PendingWrite| {
            let sink = sink.clone();
            async move {
                if write.key.starts_with("reco:bad") {
                    return Err(AppError::Internal("write refused".to_string()));
                }
                sink.lock().unwrap().push(write.key);
                Ok(())
            }
        });

        write_tx.send(pending("reco:bad:all:1")).unwrap();
        write_tx.send(pending("reco:3:all:1")).unwrap();
        handle.shutdown().await;

        assert_eq!(*applied.lock().unwrap(), vec!["reco:3:all:1"]);
    }

    #[tokio::test]
    #[ignore = "requires a running Redis instance"]
    async fn test_ping() {
        let (backend, _handle) = connect().await;
        assert!(backend.ping().await.is_ok());
    }
}
