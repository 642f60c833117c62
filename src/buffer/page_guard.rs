use std::sync::Arc;

use log::warn;
use parking_lot::{RwLock, RwLockReadGuard, RwLockWriteGuard};

use crate::common::{PageBuf, PageId};

use super::BufferPoolManager;

/// Access to the bytes of a pinned page.
///
/// A handle stays valid while the page is pinned. Once the page is unpinned
/// and its frame is reused, the handle still points at the bytes it was
/// created with, which are no longer the frame's.
#[derive(Clone)]
pub struct PageHandle {
    page_id: PageId,
    data: Arc<RwLock<PageBuf>>,
}

impl PageHandle {
    pub(crate) fn new(page_id: PageId, data: Arc<RwLock<PageBuf>>) -> Self {
        Self { page_id, data }
    }

    /// Returns the page ID.
    pub fn page_id(&self) -> PageId {
        self.page_id
    }

    /// Locks the page bytes for reading.
    pub fn read(&self) -> RwLockReadGuard<'_, PageBuf> {
        self.data.read()
    }

    /// Locks the page bytes for writing. Callers must `mark_dirty` the page
    /// themselves for the change to reach disk.
    pub fn write(&self) -> RwLockWriteGuard<'_, PageBuf> {
        self.data.write()
    }
}

/// RAII pin on a page.
/// Marks the page dirty if it was written through and unpins it when dropped.
///
/// Data guards returned by `read`/`write` must be released before calling
/// back into the pool from the same thread.
pub struct PinnedPage<'a> {
    pool: &'a BufferPoolManager,
    handle: PageHandle,
    is_dirty: bool,
}

impl<'a> PinnedPage<'a> {
    pub(crate) fn new(pool: &'a BufferPoolManager, handle: PageHandle) -> Self {
        Self {
            pool,
            handle,
            is_dirty: false,
        }
    }

    /// Returns the page ID.
    pub fn page_id(&self) -> PageId {
        self.handle.page_id()
    }

    /// Returns a read guard on the page data.
    pub fn read(&self) -> RwLockReadGuard<'_, PageBuf> {
        self.handle.read()
    }

    /// Returns a write guard on the page data.
    /// Automatically marks the page as dirty.
    pub fn write(&mut self) -> RwLockWriteGuard<'_, PageBuf> {
        self.is_dirty = true;
        self.handle.write()
    }

    pub fn mark_dirty(&mut self) {
        self.is_dirty = true;
    }
}

impl Drop for PinnedPage<'_> {
    fn drop(&mut self) {
        let page_id = self.handle.page_id();
        if self.is_dirty {
            if let Err(e) = self.pool.mark_dirty(page_id) {
                warn!("failed to mark {} dirty on release: {}", page_id, e);
            }
        }
        if let Err(e) = self.pool.unpin(page_id) {
            warn!("failed to unpin {} on release: {}", page_id, e);
        }
    }
}
