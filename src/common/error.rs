use thiserror::Error;

use super::types::PageId;
use super::value::DataType;

/// Storage engine error types
#[derive(Error, Debug)]
pub enum PinbaseError {
    #[error("I/O error: {0}")]
    Io(#[from] std::io::Error),

    #[error("Page file {0} not found")]
    FileNotFound(String),

    #[error("Index {0} not found")]
    IndexNotFound(String),

    #[error("Index {0} already exists")]
    IndexAlreadyExists(String),

    #[error("Handle is closed or was never initialized")]
    InvalidHandle,

    #[error("Invalid page: {0}")]
    InvalidPage(PageId),

    #[error("Page {0} is not resident in the buffer pool")]
    PageNotResident(PageId),

    #[error("Page {0} is not pinned")]
    PageNotPinned(PageId),

    #[error("Buffer pool is full, no evictable frames available")]
    CapacityExhausted,

    #[error("Key not found")]
    KeyNotFound,

    #[error("Key already exists")]
    KeyAlreadyExists,

    #[error("No more entries")]
    NoMoreEntries,

    #[error("Key type mismatch: index holds {expected}, got {found}")]
    KeyTypeMismatch { expected: DataType, found: DataType },

    #[error("String key of {len} bytes exceeds the {max} byte limit")]
    KeyTooLong { len: usize, max: usize },

    #[error("Invalid key: {0}")]
    InvalidKey(String),

    #[error("Fan-out {n} is invalid: must be within 2..={max}")]
    InvalidFanOut { n: usize, max: usize },

    #[error("Page {page} corrupted: {reason}")]
    CorruptedPage { page: PageId, reason: String },

    #[error("Disk scheduler error: {0}")]
    DiskScheduler(String),
}

pub type Result<T> = std::result::Result<T, PinbaseError>;
