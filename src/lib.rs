//! Pinbase - a paged storage core: block files, a buffer pool and a B+Tree
//!
//! The crate is organized bottom-up:
//!
//! - **Storage** (`storage`): fixed-size page files and the disk scheduler
//!   - `PageFile`: reads, writes and grows a file of `PAGE_SIZE` blocks
//!   - `DiskScheduler`: background worker that owns the file and serves I/O
//!
//! - **Buffer Pool** (`buffer`): caches pages of one file in a fixed set of frames
//!   - `BufferPoolManager`: pin/unpin, dirty tracking, flushing, I/O statistics
//!   - `Replacer`: FIFO, LRU, LFU, CLOCK and LRU-K victim selection
//!   - `PinnedPage`: RAII pin that unpins (and marks dirty) on drop
//!
//! - **Index** (`index`): a disk-resident B+Tree over typed keys
//!   - `BTreeIndex`: find, insert, delete, scans, integrity checks
//!   - `IndexManager`: creates, opens and deletes named index files
//!
//! # Example
//!
//! ```rust,no_run
//! use pinbase::{DataType, IndexConfig, IndexManager, PageId, RecordId, SlotId, Value};
//!
//! let manager = IndexManager::new(IndexConfig::new("/tmp/pinbase"))?;
//! manager.create_btree("ages", DataType::Int, 4)?;
//!
//! let mut tree = manager.open_btree("ages")?;
//! tree.insert(Value::Int(42), RecordId::new(PageId::new(1), SlotId::new(3)))?;
//! assert_eq!(tree.find(&Value::Int(42))?.slot_id, SlotId::new(3));
//! tree.close()?;
//! # Ok::<(), pinbase::PinbaseError>(())
//! ```

pub mod buffer;
pub mod common;
pub mod index;
pub mod storage;

// Re-export commonly used types at the crate root
pub use buffer::{BufferPoolManager, PinnedPage, PoolStats, ReplacementStrategy};
pub use common::{
    BufferPoolConfig, DataType, IndexConfig, PageId, PinbaseError, RecordId, Result, SlotId,
    Value, NO_PAGE, PAGE_SIZE,
};
pub use index::{BTreeIndex, IndexManager, TreeScan};
