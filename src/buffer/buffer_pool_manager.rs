use std::collections::HashMap;
use std::path::{Path, PathBuf};

use log::{debug, trace, warn};
use parking_lot::Mutex;

use crate::common::{
    BufferPoolConfig, FrameId, PageId, PinbaseError, Result, Timestamp, NO_PAGE,
};
use crate::storage::disk::{DiskScheduler, PageFile};

use super::{Frame, PageHandle, PinnedPage, ReplacementStrategy, Replacer};

/// Point-in-time copy of the pool's bookkeeping.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct PoolStats {
    /// Page held by each frame, `NO_PAGE` for empty frames
    pub frame_contents: Vec<PageId>,
    pub dirty_flags: Vec<bool>,
    pub fix_counts: Vec<u32>,
    pub num_read_io: u64,
    pub num_write_io: u64,
}

/// Everything guarded by the pool lock
struct BufferPoolState {
    frames: Vec<Frame>,
    /// Page table: maps resident page IDs to frame IDs
    page_table: HashMap<PageId, FrameId>,
    replacer: Replacer,
    /// None once the pool has been shut down
    scheduler: Option<DiskScheduler>,
    /// Pages read from disk since init
    num_reads: u64,
    /// Pages written to disk since init
    num_writes: u64,
    /// Logical clock, advanced on every pin
    clock: Timestamp,
}

impl BufferPoolState {
    fn check_open(&self) -> Result<()> {
        if self.scheduler.is_none() {
            return Err(PinbaseError::InvalidHandle);
        }
        Ok(())
    }

    fn tick(&mut self) -> Timestamp {
        self.clock += 1;
        self.clock
    }

    fn resident_frame(&self, page_id: PageId) -> Result<FrameId> {
        self.page_table
            .get(&page_id)
            .copied()
            .ok_or(PinbaseError::PageNotResident(page_id))
    }

    fn pin(&mut self, page_id: PageId) -> Result<PageHandle> {
        self.check_open()?;
        if !page_id.is_valid() {
            return Err(PinbaseError::InvalidPage(page_id));
        }

        let frame_id = match self.page_table.get(&page_id) {
            Some(&frame_id) => {
                trace!("hit {} in {}", page_id, frame_id);
                frame_id
            }
            None => {
                let frame_id = self.get_free_frame()?;
                self.load_page(frame_id, page_id)?;
                frame_id
            }
        };

        let now = self.tick();
        let frame = &mut self.frames[frame_id.as_usize()];
        frame.pin();
        frame.touch(now);
        Ok(PageHandle::new(page_id, frame.data()))
    }

    /// Gets an empty frame: the lowest-index one if any, otherwise an evicted victim.
    fn get_free_frame(&mut self) -> Result<FrameId> {
        if let Some(index) = self.frames.iter().position(|f| f.is_empty()) {
            return Ok(FrameId::new(index as u32));
        }

        let frame_id = self
            .replacer
            .select_victim(&mut self.frames, self.num_reads)
            .ok_or(PinbaseError::CapacityExhausted)?;

        let old_page_id = self.frames[frame_id.as_usize()].page_id();
        if self.frames[frame_id.as_usize()].is_dirty() {
            self.write_frame(frame_id)?;
        }

        debug!("evicting {} from {}", old_page_id, frame_id);
        self.page_table.remove(&old_page_id);
        self.frames[frame_id.as_usize()].reset();
        Ok(frame_id)
    }

    /// Reads `page_id` from disk into an empty frame, growing the file first
    /// if the page lies past its end.
    fn load_page(&mut self, frame_id: FrameId, page_id: PageId) -> Result<()> {
        let scheduler = self.scheduler.as_ref().ok_or(PinbaseError::InvalidHandle)?;
        let needed = page_id
            .as_i32()
            .checked_add(1)
            .ok_or(PinbaseError::InvalidPage(page_id))?;
        scheduler.schedule_ensure_capacity_sync(needed)?;
        let data = scheduler.schedule_read_sync(page_id)?;
        self.num_reads += 1;

        self.frames[frame_id.as_usize()].load(page_id, data);
        self.page_table.insert(page_id, frame_id);
        trace!("loaded {} into {}", page_id, frame_id);
        Ok(())
    }

    /// Writes a frame's bytes to its page and clears the dirty flag.
    fn write_frame(&mut self, frame_id: FrameId) -> Result<()> {
        let scheduler = self.scheduler.as_ref().ok_or(PinbaseError::InvalidHandle)?;
        let frame = &mut self.frames[frame_id.as_usize()];
        {
            let data = frame.read_data();
            scheduler.schedule_write_sync(frame.page_id(), &**data)?;
        }
        frame.set_dirty(false);
        self.num_writes += 1;
        trace!("wrote {} from {}", frame.page_id(), frame_id);
        Ok(())
    }

    /// Flushes every dirty frame, stops the disk worker, and empties the pool.
    fn close(&mut self) -> Result<()> {
        let dirty: Vec<FrameId> = self
            .frames
            .iter()
            .filter(|f| !f.is_empty() && f.is_dirty())
            .map(|f| f.frame_id())
            .collect();

        for frame_id in dirty {
            let frame = &self.frames[frame_id.as_usize()];
            if frame.is_pinned() {
                warn!(
                    "shutting down with {} still pinned ({} pins), flushing it anyway",
                    frame.page_id(),
                    frame.pin_count()
                );
            }
            self.write_frame(frame_id)?;
        }

        let result = match self.scheduler.take() {
            Some(mut scheduler) => scheduler.shutdown(),
            None => Ok(()),
        };
        self.page_table.clear();
        self.frames.clear();
        result
    }
}

/// BufferPoolManager caches the pages of one paged file in a fixed number of
/// frames. Every read or write of those pages goes through it.
///
/// Callers pin a page to get at its bytes and must unpin it when done; a
/// pinned page is never evicted. Which unpinned page goes when a frame is
/// needed is decided by the configured `ReplacementStrategy`.
pub struct BufferPoolManager {
    /// Number of frames in the buffer pool
    pool_size: usize,
    strategy: ReplacementStrategy,
    path: PathBuf,
    state: Mutex<BufferPoolState>,
}

impl BufferPoolManager {
    /// Opens the page file at `path` and sets up `pool_size` empty frames.
    pub fn new<P: AsRef<Path>>(
        path: P,
        pool_size: usize,
        strategy: ReplacementStrategy,
    ) -> Result<Self> {
        let page_file = PageFile::open(path.as_ref())?;
        let scheduler = DiskScheduler::new(page_file)?;

        let frames = (0..pool_size)
            .map(|i| Frame::new(FrameId::new(i as u32)))
            .collect();

        debug!(
            "buffer pool over {} with {} frames, strategy {}",
            path.as_ref().display(),
            pool_size,
            strategy
        );

        Ok(Self {
            pool_size,
            strategy,
            path: path.as_ref().to_path_buf(),
            state: Mutex::new(BufferPoolState {
                frames,
                page_table: HashMap::new(),
                replacer: Replacer::new(strategy),
                scheduler: Some(scheduler),
                num_reads: 0,
                num_writes: 0,
                clock: 0,
            }),
        })
    }

    pub fn with_config<P: AsRef<Path>>(path: P, config: &BufferPoolConfig) -> Result<Self> {
        Self::new(path, config.pool_size, config.strategy)
    }

    /// Pins `page_id`, reading it from disk if it is not resident.
    ///
    /// Fails with `InvalidPage` for negative page numbers and with
    /// `CapacityExhausted` when every frame is pinned.
    pub fn pin(&self, page_id: PageId) -> Result<PageHandle> {
        self.state.lock().pin(page_id)
    }

    /// Pins `page_id` and returns a guard that unpins it when dropped.
    pub fn fetch_page(&self, page_id: PageId) -> Result<PinnedPage<'_>> {
        let handle = self.pin(page_id)?;
        Ok(PinnedPage::new(self, handle))
    }

    /// Releases one pin on `page_id`.
    pub fn unpin(&self, page_id: PageId) -> Result<()> {
        let mut state = self.state.lock();
        state.check_open()?;
        let frame_id = state.resident_frame(page_id)?;
        state.frames[frame_id.as_usize()]
            .unpin()
            .map(|_| ())
            .ok_or(PinbaseError::PageNotPinned(page_id))
    }

    /// Marks `page_id` as modified so it is written back before eviction.
    pub fn mark_dirty(&self, page_id: PageId) -> Result<()> {
        let mut state = self.state.lock();
        state.check_open()?;
        let frame_id = state.resident_frame(page_id)?;
        state.frames[frame_id.as_usize()].set_dirty(true);
        Ok(())
    }

    /// Writes `page_id` to disk now, pinned or not.
    pub fn force_page(&self, page_id: PageId) -> Result<()> {
        let mut state = self.state.lock();
        state.check_open()?;
        let frame_id = state.resident_frame(page_id)?;
        state.write_frame(frame_id)
    }

    /// Writes every dirty, unpinned page to disk. Pinned pages stay dirty.
    pub fn force_flush_all(&self) -> Result<()> {
        let mut state = self.state.lock();
        state.check_open()?;

        let to_flush: Vec<FrameId> = state
            .frames
            .iter()
            .filter(|f| !f.is_empty() && f.is_dirty() && !f.is_pinned())
            .map(|f| f.frame_id())
            .collect();

        for frame_id in to_flush {
            state.write_frame(frame_id)?;
        }
        Ok(())
    }

    /// Flushes all dirty pages (pinned ones included), closes the file and
    /// releases the frames. Every later call fails with `InvalidHandle`.
    pub fn shutdown(&self) -> Result<()> {
        let mut state = self.state.lock();
        state.check_open()?;
        debug!("shutting down buffer pool over {}", self.path.display());
        state.close()
    }

    pub fn is_open(&self) -> bool {
        self.state.lock().scheduler.is_some()
    }

    /// Page held by each frame, `NO_PAGE` for empty frames.
    pub fn frame_contents(&self) -> Vec<PageId> {
        self.state.lock().frames.iter().map(|f| f.page_id()).collect()
    }

    pub fn dirty_flags(&self) -> Vec<bool> {
        self.state.lock().frames.iter().map(|f| f.is_dirty()).collect()
    }

    pub fn fix_counts(&self) -> Vec<u32> {
        self.state.lock().frames.iter().map(|f| f.pin_count()).collect()
    }

    pub fn num_read_io(&self) -> u64 {
        self.state.lock().num_reads
    }

    pub fn num_write_io(&self) -> u64 {
        self.state.lock().num_writes
    }

    /// All statistics taken under a single lock acquisition.
    pub fn stats(&self) -> PoolStats {
        let state = self.state.lock();
        PoolStats {
            frame_contents: state.frames.iter().map(|f| f.page_id()).collect(),
            dirty_flags: state.frames.iter().map(|f| f.is_dirty()).collect(),
            fix_counts: state.frames.iter().map(|f| f.pin_count()).collect(),
            num_read_io: state.num_reads,
            num_write_io: state.num_writes,
        }
    }

    /// Returns the pin count for a resident page.
    pub fn get_pin_count(&self, page_id: PageId) -> Option<u32> {
        let state = self.state.lock();
        state
            .page_table
            .get(&page_id)
            .map(|&frame_id| state.frames[frame_id.as_usize()].pin_count())
    }

    /// Returns the pool size.
    pub fn pool_size(&self) -> usize {
        self.pool_size
    }

    pub fn strategy(&self) -> ReplacementStrategy {
        self.strategy
    }

    pub fn path(&self) -> &Path {
        &self.path
    }

    /// Number of frames not holding any page.
    pub fn free_frame_count(&self) -> usize {
        self.state
            .lock()
            .frames
            .iter()
            .filter(|f| f.page_id() == NO_PAGE)
            .count()
    }
}

impl Drop for BufferPoolManager {
    fn drop(&mut self) {
        let state = self.state.get_mut();
        if state.scheduler.is_some() {
            if let Err(e) = state.close() {
                warn!("buffer pool shutdown on drop failed: {}", e);
            }
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use tempfile::TempDir;

    fn create_bpm(
        pool_size: usize,
        strategy: ReplacementStrategy,
    ) -> (BufferPoolManager, TempDir) {
        let dir = TempDir::new().unwrap();
        let path = dir.path().join("pool.bin");
        PageFile::create(&path).unwrap();
        let bpm = BufferPoolManager::new(&path, pool_size, strategy).unwrap();
        (bpm, dir)
    }

    #[test]
    fn test_buffer_pool_manager_new() {
        let (bpm, _dir) = create_bpm(10, ReplacementStrategy::Lru);
        assert_eq!(bpm.pool_size(), 10);
        assert_eq!(bpm.free_frame_count(), 10);
        assert_eq!(bpm.frame_contents(), vec![NO_PAGE; 10]);
        assert_eq!(bpm.num_read_io(), 0);
    }

    #[test]
    fn test_missing_file() {
        let dir = TempDir::new().unwrap();
        let result = BufferPoolManager::new(dir.path().join("nope"), 3, ReplacementStrategy::Fifo);
        assert!(matches!(result, Err(PinbaseError::FileNotFound(_))));
    }

    #[test]
    fn test_pin_hit_does_no_io() {
        let (bpm, _dir) = create_bpm(3, ReplacementStrategy::Lru);

        bpm.pin(PageId::new(0)).unwrap();
        bpm.pin(PageId::new(0)).unwrap();
        assert_eq!(bpm.num_read_io(), 1);
        assert_eq!(bpm.get_pin_count(PageId::new(0)), Some(2));
        assert_eq!(bpm.free_frame_count(), 2);
    }

    #[test]
    fn test_pin_negative_page() {
        let (bpm, _dir) = create_bpm(3, ReplacementStrategy::Lru);
        assert!(matches!(
            bpm.pin(PageId::new(-1)),
            Err(PinbaseError::InvalidPage(_))
        ));
    }

    #[test]
    fn test_unpin_errors() {
        let (bpm, _dir) = create_bpm(3, ReplacementStrategy::Lru);
        assert!(matches!(
            bpm.unpin(PageId::new(0)),
            Err(PinbaseError::PageNotResident(_))
        ));

        bpm.pin(PageId::new(0)).unwrap();
        bpm.unpin(PageId::new(0)).unwrap();
        assert!(matches!(
            bpm.unpin(PageId::new(0)),
            Err(PinbaseError::PageNotPinned(_))
        ));
        assert!(matches!(
            bpm.mark_dirty(PageId::new(1)),
            Err(PinbaseError::PageNotResident(_))
        ));
    }

    #[test]
    fn test_dirty_victim_is_written_back() {
        let (bpm, _dir) = create_bpm(1, ReplacementStrategy::Fifo);

        let handle = bpm.pin(PageId::new(0)).unwrap();
        handle.write()[0] = 42;
        bpm.mark_dirty(PageId::new(0)).unwrap();
        bpm.unpin(PageId::new(0)).unwrap();

        bpm.pin(PageId::new(1)).unwrap();
        bpm.unpin(PageId::new(1)).unwrap();
        assert_eq!(bpm.num_write_io(), 1);

        let handle = bpm.pin(PageId::new(0)).unwrap();
        assert_eq!(handle.read()[0], 42);
        assert_eq!(bpm.num_read_io(), 3);
    }

    #[test]
    fn test_capacity_exhausted() {
        let (bpm, _dir) = create_bpm(2, ReplacementStrategy::Clock);
        bpm.pin(PageId::new(0)).unwrap();
        bpm.pin(PageId::new(1)).unwrap();
        assert!(matches!(
            bpm.pin(PageId::new(2)),
            Err(PinbaseError::CapacityExhausted)
        ));
    }

    #[test]
    fn test_pinned_page_guard() {
        let (bpm, _dir) = create_bpm(2, ReplacementStrategy::Lru);
        {
            let mut page = bpm.fetch_page(PageId::new(3)).unwrap();
            page.write()[7] = 9;
            assert_eq!(bpm.get_pin_count(PageId::new(3)), Some(1));
        }
        assert_eq!(bpm.get_pin_count(PageId::new(3)), Some(0));
        let stats = bpm.stats();
        assert_eq!(stats.frame_contents[0], PageId::new(3));
        assert!(stats.dirty_flags[0]);
    }

    #[test]
    fn test_shutdown_invalidates_pool() {
        let (bpm, _dir) = create_bpm(2, ReplacementStrategy::Lfu);
        bpm.pin(PageId::new(0)).unwrap();
        bpm.mark_dirty(PageId::new(0)).unwrap();

        // The pinned dirty page is still flushed
        bpm.shutdown().unwrap();
        assert_eq!(bpm.num_write_io(), 1);
        assert!(!bpm.is_open());

        assert!(matches!(
            bpm.pin(PageId::new(0)),
            Err(PinbaseError::InvalidHandle)
        ));
        assert!(matches!(
            bpm.force_flush_all(),
            Err(PinbaseError::InvalidHandle)
        ));
        assert!(matches!(bpm.shutdown(), Err(PinbaseError::InvalidHandle)));
    }
}
