//! Snapshot persistence behind a small repository interface.
//!
//! The ledger state is written as one JSON document per key. Every committed
//! ledger transition rewrites the whole snapshot; there is no append log.

mod file;
mod memory;

pub use file::FileStorage;
pub use memory::MemoryStorage;

use crate::config::{StorageBackend, StorageConfig};
use crate::error::AppResult;
use std::sync::Arc;

/// 顾客、钱包、流水、积分配置所在的快照键
pub const CUSTOMER_STORAGE_KEY: &str = "customer-storage";

pub trait Storage: Send + Sync {
    /// 读取快照，键不存在时返回 None
    fn load(&self, key: &str) -> AppResult<Option<String>>;

    /// 整体覆盖写入快照
    fn save(&self, key: &str, contents: &str) -> AppResult<()>;
}

pub fn create_storage(config: &StorageConfig) -> AppResult<Arc<dyn Storage>> {
    let storage: Arc<dyn Storage> = match config.backend {
        StorageBackend::File => Arc::new(FileStorage::open(&config.data_dir)?),
        StorageBackend::Memory => Arc::new(MemoryStorage::new()),
    };
    Ok(storage)
}
