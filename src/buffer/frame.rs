use std::sync::Arc;

use parking_lot::{RwLock, RwLockReadGuard};

use crate::common::{new_page_buf, FrameId, PageBuf, PageId, Timestamp, NO_PAGE};

/// Frame is one cache slot of the buffer pool: which page it holds, the page
/// bytes, and the bookkeeping the replacement strategies look at.
///
/// Frames are only mutated while the pool lock is held, so the metadata is
/// plain fields. The page bytes sit behind their own lock because page
/// handles keep reading and writing them after the pool lock is released.
pub struct Frame {
    frame_id: FrameId,
    /// The page held by this frame (NO_PAGE if empty)
    page_id: PageId,
    /// Number of outstanding pins
    pin_count: u32,
    /// Whether the bytes differ from what is on disk
    is_dirty: bool,
    /// Logical clock tick of the most recent pin
    last_access: Timestamp,
    /// Pins since the current page was loaded
    ref_count: u32,
    /// Second-chance bit swept by CLOCK
    reference_bit: bool,
    data: Arc<RwLock<PageBuf>>,
}

impl Frame {
    pub fn new(frame_id: FrameId) -> Self {
        Self {
            frame_id,
            page_id: NO_PAGE,
            pin_count: 0,
            is_dirty: false,
            last_access: 0,
            ref_count: 0,
            reference_bit: false,
            data: Arc::new(RwLock::new(new_page_buf())),
        }
    }

    pub fn frame_id(&self) -> FrameId {
        self.frame_id
    }

    pub fn page_id(&self) -> PageId {
        self.page_id
    }

    pub fn is_empty(&self) -> bool {
        self.page_id == NO_PAGE
    }

    pub fn pin_count(&self) -> u32 {
        self.pin_count
    }

    pub fn is_pinned(&self) -> bool {
        self.pin_count > 0
    }

    /// Increments the pin count and returns the new value.
    pub fn pin(&mut self) -> u32 {
        self.pin_count += 1;
        self.pin_count
    }

    /// Decrements the pin count and returns the new value.
    /// Returns None if the pin count was already 0.
    pub fn unpin(&mut self) -> Option<u32> {
        if self.pin_count == 0 {
            return None;
        }
        self.pin_count -= 1;
        Some(self.pin_count)
    }

    pub fn is_dirty(&self) -> bool {
        self.is_dirty
    }

    pub fn set_dirty(&mut self, dirty: bool) {
        self.is_dirty = dirty;
    }

    pub fn last_access(&self) -> Timestamp {
        self.last_access
    }

    pub fn ref_count(&self) -> u32 {
        self.ref_count
    }

    pub fn reference_bit(&self) -> bool {
        self.reference_bit
    }

    pub fn set_reference_bit(&mut self, bit: bool) {
        self.reference_bit = bit;
    }

    /// Records a pin at logical time `now`.
    pub fn touch(&mut self, now: Timestamp) {
        self.last_access = now;
        self.ref_count += 1;
        self.reference_bit = true;
    }

    /// Installs freshly read bytes for `page_id`.
    ///
    /// The bytes get a new allocation: handles still holding the previous
    /// page keep seeing the previous page, never the new one.
    pub fn load(&mut self, page_id: PageId, data: PageBuf) {
        self.page_id = page_id;
        self.data = Arc::new(RwLock::new(data));
        self.is_dirty = false;
        self.ref_count = 0;
    }

    /// Shared handle to the page bytes.
    pub fn data(&self) -> Arc<RwLock<PageBuf>> {
        Arc::clone(&self.data)
    }

    pub fn read_data(&self) -> RwLockReadGuard<'_, PageBuf> {
        self.data.read()
    }

    /// Resets the frame to its empty state.
    pub fn reset(&mut self) {
        self.page_id = NO_PAGE;
        self.pin_count = 0;
        self.is_dirty = false;
        self.last_access = 0;
        self.ref_count = 0;
        self.reference_bit = false;
        self.data = Arc::new(RwLock::new(new_page_buf()));
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::common::PAGE_SIZE;

    #[test]
    fn test_frame_new() {
        let frame = Frame::new(FrameId::new(0));
        assert_eq!(frame.frame_id(), FrameId::new(0));
        assert_eq!(frame.page_id(), NO_PAGE);
        assert!(frame.is_empty());
        assert_eq!(frame.pin_count(), 0);
        assert!(!frame.is_dirty());
    }

    #[test]
    fn test_frame_pin_unpin() {
        let mut frame = Frame::new(FrameId::new(0));

        assert_eq!(frame.pin(), 1);
        assert_eq!(frame.pin(), 2);
        assert_eq!(frame.pin_count(), 2);

        assert_eq!(frame.unpin(), Some(1));
        assert_eq!(frame.unpin(), Some(0));
        assert_eq!(frame.unpin(), None);
    }

    #[test]
    fn test_frame_touch_and_load() {
        let mut frame = Frame::new(FrameId::new(3));
        frame.load(PageId::new(1), new_page_buf());
        frame.touch(5);
        frame.touch(9);
        assert_eq!(frame.last_access(), 9);
        assert_eq!(frame.ref_count(), 2);
        assert!(frame.reference_bit());

        // Loading another page restarts the reference count
        frame.set_dirty(true);
        frame.load(PageId::new(2), new_page_buf());
        assert_eq!(frame.ref_count(), 0);
        assert!(!frame.is_dirty());
        assert_eq!(frame.page_id(), PageId::new(2));
    }

    #[test]
    fn test_stale_handle_keeps_old_bytes() {
        let mut frame = Frame::new(FrameId::new(0));
        let mut buf = new_page_buf();
        buf[0] = 11;
        frame.load(PageId::new(1), buf);
        let old = frame.data();

        let mut buf = new_page_buf();
        buf[0] = 22;
        frame.load(PageId::new(2), buf);

        assert_eq!(old.read()[0], 11);
        assert_eq!(frame.read_data()[0], 22);
    }

    #[test]
    fn test_frame_reset() {
        let mut frame = Frame::new(FrameId::new(0));
        frame.load(PageId::new(5), Box::new([1u8; PAGE_SIZE]));
        frame.pin();
        frame.set_dirty(true);
        frame.touch(1);

        frame.reset();

        assert_eq!(frame.page_id(), NO_PAGE);
        assert_eq!(frame.pin_count(), 0);
        assert!(!frame.is_dirty());
        assert!(!frame.reference_bit());
        assert_eq!(frame.read_data()[0], 0);
    }
}
