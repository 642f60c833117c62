//! Integration tests for the buffer pool manager

use std::collections::HashMap;
use std::sync::Arc;
use std::thread;

use pinbase::buffer::{BufferPoolManager, ReplacementStrategy};
use pinbase::common::{PageId, PinbaseError, NO_PAGE};
use pinbase::storage::disk::PageFile;
use rand::rngs::StdRng;
use rand::{Rng, SeedableRng};
use tempfile::TempDir;

fn create_bpm(pool_size: usize, strategy: ReplacementStrategy) -> (BufferPoolManager, TempDir) {
    let dir = TempDir::new().unwrap();
    let path = dir.path().join("pool.db");
    PageFile::create(&path).unwrap();
    let bpm = BufferPoolManager::new(&path, pool_size, strategy).unwrap();
    (bpm, dir)
}

fn pages(ids: &[i32]) -> Vec<PageId> {
    ids.iter().map(|&id| PageId::new(id)).collect()
}

/// Pins and immediately unpins each page in turn.
fn touch_all(bpm: &BufferPoolManager, ids: &[i32]) {
    for &id in ids {
        bpm.pin(PageId::new(id)).unwrap();
        bpm.unpin(PageId::new(id)).unwrap();
    }
}

#[test]
fn test_pin_write_and_read_back() {
    let (bpm, _dir) = create_bpm(10, ReplacementStrategy::Lru);

    {
        let mut page = bpm.fetch_page(PageId::new(1)).unwrap();
        let mut data = page.write();
        data[..4].copy_from_slice(&[0xDE, 0xAD, 0xBE, 0xEF]);
    }
    assert_eq!(bpm.get_pin_count(PageId::new(1)), Some(0));
    assert!(bpm.dirty_flags()[0]);

    let page = bpm.fetch_page(PageId::new(1)).unwrap();
    assert_eq!(page.page_id(), PageId::new(1));
    assert_eq!(&page.read()[..4], &[0xDE, 0xAD, 0xBE, 0xEF]);
    assert_eq!(bpm.num_read_io(), 1);
}

#[test]
fn test_pinning_grows_the_file() {
    let (bpm, _dir) = create_bpm(3, ReplacementStrategy::Fifo);

    // The file starts with one page; page 5 lies past its end
    let handle = bpm.pin(PageId::new(5)).unwrap();
    assert!(handle.read().iter().all(|&b| b == 0));
    bpm.unpin(PageId::new(5)).unwrap();
    bpm.shutdown().unwrap();

    let file = PageFile::open(bpm.path()).unwrap();
    assert_eq!(file.total_pages(), 6);
}

#[test]
fn test_fifo_evicts_oldest_load() {
    let (bpm, _dir) = create_bpm(3, ReplacementStrategy::Fifo);
    touch_all(&bpm, &[1, 2, 3]);
    assert_eq!(bpm.frame_contents(), pages(&[1, 2, 3]));

    touch_all(&bpm, &[4]);
    assert_eq!(bpm.frame_contents(), pages(&[4, 2, 3]));

    // Re-pinning a resident page does not change the FIFO order
    touch_all(&bpm, &[2, 5]);
    assert_eq!(bpm.frame_contents(), pages(&[4, 5, 3]));
    assert_eq!(bpm.num_read_io(), 5);
}

#[test]
fn test_fifo_skips_pinned_frames() {
    let (bpm, _dir) = create_bpm(3, ReplacementStrategy::Fifo);
    touch_all(&bpm, &[1, 2, 3]);

    let _held = bpm.fetch_page(PageId::new(1)).unwrap();
    touch_all(&bpm, &[4]);
    assert_eq!(bpm.frame_contents(), pages(&[1, 4, 3]));
}

#[test]
fn test_lru_evicts_least_recently_used() {
    let (bpm, _dir) = create_bpm(2, ReplacementStrategy::Lru);
    touch_all(&bpm, &[1, 2, 1]);

    touch_all(&bpm, &[3]);
    assert_eq!(bpm.frame_contents(), pages(&[1, 3]));
    assert_eq!(bpm.num_read_io(), 3);
}

#[test]
fn test_clock_gives_second_chance() {
    let (bpm, _dir) = create_bpm(3, ReplacementStrategy::Clock);
    touch_all(&bpm, &[1, 2, 3]);

    // Every bit is set, so the hand sweeps once and takes frame 0
    touch_all(&bpm, &[4]);
    assert_eq!(bpm.frame_contents(), pages(&[4, 2, 3]));

    // Page 2 is referenced again, page 3 is not
    touch_all(&bpm, &[2, 5]);
    assert_eq!(bpm.frame_contents(), pages(&[4, 2, 5]));
}

#[test]
fn test_lfu_evicts_least_frequently_used() {
    let (bpm, _dir) = create_bpm(2, ReplacementStrategy::Lfu);
    touch_all(&bpm, &[1, 1, 1, 2]);

    touch_all(&bpm, &[3]);
    assert_eq!(bpm.frame_contents(), pages(&[1, 3]));

    // Page 3 has one use, page 1 three
    touch_all(&bpm, &[4]);
    assert_eq!(bpm.frame_contents(), pages(&[1, 4]));
}

#[test]
fn test_lru_k_evicts_kth_oldest() {
    let (bpm, _dir) = create_bpm(3, ReplacementStrategy::LruK(2));
    touch_all(&bpm, &[1, 2, 3]);

    touch_all(&bpm, &[4]);
    assert_eq!(bpm.frame_contents(), pages(&[1, 4, 3]));
}

#[test]
fn test_all_frames_pinned() {
    let (bpm, _dir) = create_bpm(2, ReplacementStrategy::Lru);
    let _a = bpm.fetch_page(PageId::new(1)).unwrap();
    let _b = bpm.fetch_page(PageId::new(2)).unwrap();

    assert!(matches!(
        bpm.pin(PageId::new(3)),
        Err(PinbaseError::CapacityExhausted)
    ));
    // A resident page can still be pinned again
    assert!(bpm.fetch_page(PageId::new(1)).is_ok());
}

#[test]
fn test_dirty_victim_is_written_back() {
    let (bpm, _dir) = create_bpm(1, ReplacementStrategy::Lru);

    {
        let mut page = bpm.fetch_page(PageId::new(1)).unwrap();
        page.write()[100] = 42;
    }
    assert_eq!(bpm.num_write_io(), 0);

    touch_all(&bpm, &[2]);
    assert_eq!(bpm.num_write_io(), 1);
    assert_eq!(bpm.dirty_flags(), vec![false]);

    let page = bpm.fetch_page(PageId::new(1)).unwrap();
    assert_eq!(page.read()[100], 42);
    assert_eq!(bpm.num_read_io(), 3);
}

#[test]
fn test_clean_victim_is_not_written() {
    let (bpm, _dir) = create_bpm(1, ReplacementStrategy::Fifo);
    touch_all(&bpm, &[1, 2, 3, 1]);
    assert_eq!(bpm.num_write_io(), 0);
    assert_eq!(bpm.num_read_io(), 4);
}

#[test]
fn test_force_flush_all_skips_pinned_pages() {
    let (bpm, _dir) = create_bpm(3, ReplacementStrategy::Lru);

    {
        let mut page = bpm.fetch_page(PageId::new(1)).unwrap();
        page.write()[0] = 1;
    }
    let held = bpm.pin(PageId::new(2)).unwrap();
    held.write()[0] = 2;
    bpm.mark_dirty(PageId::new(2)).unwrap();

    bpm.force_flush_all().unwrap();
    assert_eq!(bpm.dirty_flags(), vec![false, true, false]);
    assert_eq!(bpm.num_write_io(), 1);

    // Flushing again has nothing to do
    bpm.force_flush_all().unwrap();
    assert_eq!(bpm.num_write_io(), 1);

    // force_page writes even a pinned page
    bpm.force_page(PageId::new(2)).unwrap();
    assert_eq!(bpm.dirty_flags(), vec![false, false, false]);
    assert_eq!(bpm.num_write_io(), 2);
    bpm.unpin(PageId::new(2)).unwrap();
}

#[test]
fn test_unpin_errors() {
    let (bpm, _dir) = create_bpm(2, ReplacementStrategy::Lru);

    assert!(matches!(
        bpm.unpin(PageId::new(7)),
        Err(PinbaseError::PageNotResident(_))
    ));

    touch_all(&bpm, &[1]);
    assert!(matches!(
        bpm.unpin(PageId::new(1)),
        Err(PinbaseError::PageNotPinned(_))
    ));
    assert_eq!(bpm.get_pin_count(PageId::new(1)), Some(0));

    assert!(matches!(
        bpm.mark_dirty(PageId::new(9)),
        Err(PinbaseError::PageNotResident(_))
    ));
    assert!(matches!(
        bpm.force_page(PageId::new(9)),
        Err(PinbaseError::PageNotResident(_))
    ));
}

#[test]
fn test_negative_page_is_rejected() {
    let (bpm, _dir) = create_bpm(2, ReplacementStrategy::Lru);
    assert!(matches!(
        bpm.pin(PageId::new(-3)),
        Err(PinbaseError::InvalidPage(_))
    ));
    assert!(matches!(bpm.pin(NO_PAGE), Err(PinbaseError::InvalidPage(_))));
    assert_eq!(bpm.free_frame_count(), 2);
}

#[test]
fn test_last_page_number_is_rejected() {
    let (bpm, _dir) = create_bpm(2, ReplacementStrategy::Lru);
    assert!(matches!(
        bpm.pin(PageId::new(i32::MAX)),
        Err(PinbaseError::InvalidPage(_))
    ));
    // The failed load leaves its frame empty and the pool usable
    assert_eq!(bpm.free_frame_count(), 2);
    assert!(bpm.fetch_page(PageId::new(1)).is_ok());
}

#[test]
fn test_pin_counts_accumulate() {
    let (bpm, _dir) = create_bpm(2, ReplacementStrategy::Clock);
    let page = PageId::new(1);
    for expected in 1..=3 {
        bpm.pin(page).unwrap();
        assert_eq!(bpm.get_pin_count(page), Some(expected));
    }
    assert_eq!(bpm.fix_counts(), vec![3, 0]);
    for _ in 0..3 {
        bpm.unpin(page).unwrap();
    }
    assert_eq!(bpm.fix_counts(), vec![0, 0]);
}

#[test]
fn test_stats_snapshot() {
    let (bpm, _dir) = create_bpm(3, ReplacementStrategy::Fifo);
    {
        let mut page = bpm.fetch_page(PageId::new(2)).unwrap();
        page.mark_dirty();
    }
    let _held = bpm.fetch_page(PageId::new(4)).unwrap();

    let stats = bpm.stats();
    assert_eq!(stats.frame_contents, vec![PageId::new(2), PageId::new(4), NO_PAGE]);
    assert_eq!(stats.dirty_flags, vec![true, false, false]);
    assert_eq!(stats.fix_counts, vec![0, 1, 0]);
    assert_eq!(stats.num_read_io, 2);
    assert_eq!(stats.num_write_io, 0);
}

#[test]
fn test_shutdown_persists_and_closes() {
    let dir = TempDir::new().unwrap();
    let path = dir.path().join("pool.db");
    PageFile::create(&path).unwrap();

    {
        let bpm = BufferPoolManager::new(&path, 4, ReplacementStrategy::Lru).unwrap();
        for id in 1..=3 {
            let mut page = bpm.fetch_page(PageId::new(id)).unwrap();
            page.write()[0] = id as u8 * 10;
        }
        // Still pinned at shutdown; written anyway
        let held = bpm.pin(PageId::new(4)).unwrap();
        held.write()[0] = 40;
        bpm.mark_dirty(PageId::new(4)).unwrap();

        bpm.shutdown().unwrap();
        assert!(!bpm.is_open());
        assert!(matches!(bpm.shutdown(), Err(PinbaseError::InvalidHandle)));
        assert!(matches!(
            bpm.pin(PageId::new(1)),
            Err(PinbaseError::InvalidHandle)
        ));
        assert!(matches!(
            bpm.force_flush_all(),
            Err(PinbaseError::InvalidHandle)
        ));
    }

    let bpm = BufferPoolManager::new(&path, 2, ReplacementStrategy::Fifo).unwrap();
    for id in 1..=4 {
        let page = bpm.fetch_page(PageId::new(id)).unwrap();
        assert_eq!(page.read()[0], id as u8 * 10);
    }
}

#[test]
fn test_drop_flushes_dirty_pages() {
    let dir = TempDir::new().unwrap();
    let path = dir.path().join("pool.db");
    PageFile::create(&path).unwrap();

    {
        let bpm = BufferPoolManager::new(&path, 2, ReplacementStrategy::Lru).unwrap();
        let mut page = bpm.fetch_page(PageId::new(1)).unwrap();
        page.write()[7] = 7;
    }

    let mut file = PageFile::open(&path).unwrap();
    let mut data = [0u8; pinbase::PAGE_SIZE];
    file.read_block(PageId::new(1), &mut data).unwrap();
    assert_eq!(data[7], 7);
}

#[test]
fn test_open_missing_file() {
    let dir = TempDir::new().unwrap();
    assert!(matches!(
        BufferPoolManager::new(dir.path().join("missing.db"), 2, ReplacementStrategy::Lru),
        Err(PinbaseError::FileNotFound(_))
    ));
}

#[test]
fn test_random_operations_keep_pool_consistent() {
    for strategy in [
        ReplacementStrategy::Fifo,
        ReplacementStrategy::Lru,
        ReplacementStrategy::Clock,
        ReplacementStrategy::Lfu,
        ReplacementStrategy::LruK(2),
    ] {
        let (bpm, _dir) = create_bpm(4, strategy);
        let mut rng = StdRng::seed_from_u64(7);
        let mut pins: HashMap<PageId, u32> = HashMap::new();

        for _ in 0..500 {
            let page = PageId::new(rng.gen_range(0..10));
            let pinned = pins.get(&page).copied().unwrap_or(0);

            if pinned > 0 && rng.gen_bool(0.5) {
                bpm.unpin(page).unwrap();
                pins.insert(page, pinned - 1);
            } else {
                match bpm.pin(page) {
                    Ok(handle) => {
                        handle.write()[0] = page.as_i32() as u8;
                        bpm.mark_dirty(page).unwrap();
                        pins.insert(page, pinned + 1);
                    }
                    Err(PinbaseError::CapacityExhausted) => {
                        let resident_pinned = bpm.fix_counts().iter().filter(|&&c| c > 0).count();
                        assert_eq!(resident_pinned, bpm.pool_size(), "{}", strategy);
                    }
                    Err(e) => panic!("{}: unexpected error {}", strategy, e),
                }
            }

            // A page occupies at most one frame, and pinned pages stay resident
            let contents = bpm.frame_contents();
            let mut resident: Vec<PageId> =
                contents.iter().copied().filter(|&p| p != NO_PAGE).collect();
            resident.sort();
            resident.dedup();
            assert_eq!(
                resident.len(),
                contents.iter().filter(|&&p| p != NO_PAGE).count(),
                "{}",
                strategy
            );
            for (&page, &count) in &pins {
                if count > 0 {
                    assert_eq!(bpm.get_pin_count(page), Some(count), "{}", strategy);
                }
            }
        }

        for (&page, &count) in &pins {
            for _ in 0..count {
                bpm.unpin(page).unwrap();
            }
        }
        bpm.force_flush_all().unwrap();
        assert!(bpm.dirty_flags().iter().all(|&d| !d), "{}", strategy);
    }
}

#[test]
fn test_concurrent_access() {
    let (bpm, _dir) = create_bpm(8, ReplacementStrategy::LruK(2));
    let bpm = Arc::new(bpm);

    let handles: Vec<_> = (0..4)
        .map(|t| {
            let bpm = Arc::clone(&bpm);
            thread::spawn(move || {
                for round in 0..50u8 {
                    for i in 0..5 {
                        let page_id = PageId::new(t * 5 + i + 1);
                        let mut page = bpm.fetch_page(page_id).unwrap();
                        let mut data = page.write();
                        if round > 0 {
                            assert_eq!(data[0], round - 1);
                            assert_eq!(data[1], page_id.as_i32() as u8);
                        }
                        data[0] = round;
                        data[1] = page_id.as_i32() as u8;
                    }
                }
            })
        })
        .collect();

    for handle in handles {
        handle.join().unwrap();
    }

    assert!(bpm.fix_counts().iter().all(|&c| c == 0));
    bpm.force_flush_all().unwrap();
    for id in 1..=20 {
        let page = bpm.fetch_page(PageId::new(id)).unwrap();
        assert_eq!(page.read()[0], 49);
    }
}
