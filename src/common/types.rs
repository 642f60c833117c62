use std::fmt;

/// Page identifier - zero-based block number inside one paged file.
///
/// Signed so that the `NO_PAGE` sentinel (-1) and caller-supplied negative
/// numbers can be represented and rejected explicitly.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, PartialOrd, Ord)]
pub struct PageId(pub i32);

impl PageId {
    pub fn new(id: i32) -> Self {
        Self(id)
    }

    pub fn as_i32(&self) -> i32 {
        self.0
    }

    /// Byte offset of this page inside its file. Only meaningful for valid pages.
    pub fn offset(&self) -> u64 {
        self.0 as u64 * super::PAGE_SIZE as u64
    }

    pub fn is_valid(&self) -> bool {
        self.0 >= 0
    }
}

impl fmt::Display for PageId {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "PageId({})", self.0)
    }
}

/// Frame identifier - fixed slot index inside the buffer pool
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, PartialOrd, Ord)]
pub struct FrameId(pub u32);

impl FrameId {
    pub fn new(id: u32) -> Self {
        Self(id)
    }

    pub fn as_usize(&self) -> usize {
        self.0 as usize
    }
}

impl fmt::Display for FrameId {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "FrameId({})", self.0)
    }
}

/// Slot identifier within a record page
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub struct SlotId(pub u16);

impl SlotId {
    pub fn new(id: u16) -> Self {
        Self(id)
    }

    pub fn as_u16(&self) -> u16 {
        self.0
    }
}

/// Record locator handed out by the record table. The index stores it
/// opaquely as a leaf value and never interprets it.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub struct RecordId {
    pub page_id: PageId,
    pub slot_id: SlotId,
}

impl RecordId {
    pub fn new(page_id: PageId, slot_id: SlotId) -> Self {
        Self { page_id, slot_id }
    }
}

impl fmt::Display for RecordId {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{}.{}", self.page_id.0, self.slot_id.0)
    }
}

/// Logical clock tick used for last-access bookkeeping
pub type Timestamp = u64;

/// Owned, fixed-size page buffer
pub type PageBuf = Box<[u8; super::PAGE_SIZE]>;

/// Allocates a zeroed page buffer.
pub fn new_page_buf() -> PageBuf {
    Box::new([0u8; super::PAGE_SIZE])
}
