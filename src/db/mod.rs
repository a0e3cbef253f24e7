pub mod cache;
pub mod postgres;
pub mod store;

pub use cache::{create_redis_client, Cache, CacheBackend, CacheKey, CacheWriterHandle};
pub use postgres::{create_pool, run_migrations, PgCatalogStore};
pub use store::{ActivityStore, CatalogStore};
