use std::path::PathBuf;

use crate::buffer::ReplacementStrategy;

use super::types::PageId;

/// Size of a page in bytes (4 KB)
pub const PAGE_SIZE: usize = 4096;

/// Sentinel for "no page": empty frames, missing links, empty tree root
pub const NO_PAGE: PageId = PageId(-1);

/// Default K value for LRU-K replacement policy
pub const DEFAULT_LRUK_K: usize = 2;

/// Default buffer pool size (number of frames)
pub const DEFAULT_BUFFER_POOL_SIZE: usize = 10;

/// Default B+ tree fan-out (max keys per node)
pub const DEFAULT_BTREE_ORDER: usize = 128;

/// Longest string key, in bytes, an index will accept
pub const MAX_STRING_KEY_LEN: usize = 64;

/// Buffer pool settings
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct BufferPoolConfig {
    pub pool_size: usize,
    pub strategy: ReplacementStrategy,
}

impl Default for BufferPoolConfig {
    fn default() -> Self {
        Self {
            pool_size: DEFAULT_BUFFER_POOL_SIZE,
            strategy: ReplacementStrategy::LruK(DEFAULT_LRUK_K),
        }
    }
}

/// Settings shared by every index an `IndexManager` opens
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct IndexConfig {
    /// Directory holding one file per index id
    pub directory: PathBuf,
    pub buffer_pool: BufferPoolConfig,
}

impl Default for IndexConfig {
    fn default() -> Self {
        Self {
            directory: PathBuf::from("."),
            buffer_pool: BufferPoolConfig::default(),
        }
    }
}

impl IndexConfig {
    pub fn new<P: Into<PathBuf>>(directory: P) -> Self {
        Self {
            directory: directory.into(),
            ..Self::default()
        }
    }

    pub fn with_buffer_pool(mut self, buffer_pool: BufferPoolConfig) -> Self {
        self.buffer_pool = buffer_pool;
        self
    }
}
