pub mod error;
pub mod memory;
pub mod redis_store;
pub mod store;

use std::sync::Arc;

use tracing::info;

use shared_config::{AppConfig, StorageBackend};

pub use error::{StoreError, StoreResult};
pub use memory::MemoryStore;
pub use redis_store::RedisStore;
pub use store::SchedulingStore;

/// Builds the backend selected by configuration.
pub async fn connect(config: &AppConfig) -> StoreResult<Arc<dyn SchedulingStore>> {
    match config.storage_backend {
        StorageBackend::Memory => {
            info!("Using in-memory scheduling store");
            Ok(Arc::new(MemoryStore::new()))
        }
        StorageBackend::Redis => {
            let store = RedisStore::new(config).await?;
            Ok(Arc::new(store))
        }
    }
}
