use std::fs;
use std::path::PathBuf;

use log::{debug, info};

use crate::common::{DataType, IndexConfig, PinbaseError, Result};
use crate::storage::disk::PageFile;

use super::BTreeIndex;

/// Creates, opens and deletes named indexes. Each index id maps to one file
/// inside the configured directory, and every opened index gets its own
/// buffer pool built from the shared configuration.
pub struct IndexManager {
    config: IndexConfig,
}

impl IndexManager {
    /// Makes sure the index directory exists.
    pub fn new(config: IndexConfig) -> Result<Self> {
        fs::create_dir_all(&config.directory)?;
        info!(
            "index manager ready in {} ({} frames per index, {})",
            config.directory.display(),
            config.buffer_pool.pool_size,
            config.buffer_pool.strategy
        );
        Ok(Self { config })
    }

    pub fn config(&self) -> &IndexConfig {
        &self.config
    }

    /// Path of the file backing `index_id`.
    pub fn index_path(&self, index_id: &str) -> PathBuf {
        self.config.directory.join(index_id)
    }

    pub fn exists(&self, index_id: &str) -> bool {
        self.index_path(index_id).exists()
    }

    /// Creates an empty index over `key_type` keys with the given fan-out.
    pub fn create_btree(&self, index_id: &str, key_type: DataType, fan_out: usize) -> Result<()> {
        BTreeIndex::create(self.index_path(index_id), key_type, fan_out)
    }

    pub fn open_btree(&self, index_id: &str) -> Result<BTreeIndex> {
        BTreeIndex::open(self.index_path(index_id), &self.config.buffer_pool)
    }

    /// Removes an index file. The index must not be open.
    pub fn delete_btree(&self, index_id: &str) -> Result<()> {
        PageFile::destroy(self.index_path(index_id)).map_err(|e| match e {
            PinbaseError::FileNotFound(_) => PinbaseError::IndexNotFound(index_id.to_string()),
            other => other,
        })?;
        debug!("deleted index {}", index_id);
        Ok(())
    }
}
