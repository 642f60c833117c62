use std::fmt;

use log::trace;

use crate::common::FrameId;

use super::Frame;

/// Page replacement strategy used when the pool needs a victim frame.
///
/// Every strategy considers unpinned frames only and breaks ties in favour of
/// the lowest frame index.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum ReplacementStrategy {
    /// Scans the frame ring starting at `read_count % capacity`.
    Fifo,
    /// Evicts the frame with the oldest last access.
    Lru,
    /// Second chance: a persistent hand clears reference bits until it finds a clear one.
    Clock,
    /// Evicts the frame pinned the fewest times since it was loaded.
    Lfu,
    /// Orders unpinned frames by last access and evicts the K-th oldest.
    ///
    /// This is not textbook LRU-K: no per-frame access history is kept, only
    /// the most recent access of each frame.
    LruK(usize),
}

impl fmt::Display for ReplacementStrategy {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            ReplacementStrategy::Fifo => write!(f, "FIFO"),
            ReplacementStrategy::Lru => write!(f, "LRU"),
            ReplacementStrategy::Clock => write!(f, "CLOCK"),
            ReplacementStrategy::Lfu => write!(f, "LFU"),
            ReplacementStrategy::LruK(k) => write!(f, "LRU-{}", k),
        }
    }
}

/// Victim selection over the pool's frame array.
///
/// The replacer owns no frame state of its own apart from the CLOCK hand; it
/// reads the usage fields the pool keeps on each `Frame`.
pub struct Replacer {
    strategy: ReplacementStrategy,
    /// Current clock hand position
    clock_hand: usize,
}

impl Replacer {
    pub fn new(strategy: ReplacementStrategy) -> Self {
        Self {
            strategy,
            clock_hand: 0,
        }
    }

    pub fn strategy(&self) -> ReplacementStrategy {
        self.strategy
    }

    /// Picks the frame to evict, or None if every frame is pinned.
    ///
    /// `frames` is mutable because CLOCK clears reference bits as it sweeps.
    /// `num_reads` is the pool's read counter, which positions the FIFO scan.
    pub fn select_victim(&mut self, frames: &mut [Frame], num_reads: u64) -> Option<FrameId> {
        if frames.is_empty() {
            return None;
        }

        let victim = match self.strategy {
            ReplacementStrategy::Fifo => Self::fifo(frames, num_reads),
            ReplacementStrategy::Lru => Self::min_by_key(frames, |f| f.last_access()),
            ReplacementStrategy::Lfu => Self::min_by_key(frames, |f| f.ref_count() as u64),
            ReplacementStrategy::Clock => self.clock(frames),
            ReplacementStrategy::LruK(k) => Self::lru_k(frames, k),
        };

        if let Some(frame_id) = victim {
            trace!("{} selected victim {}", self.strategy, frame_id);
        }
        victim
    }

    fn fifo(frames: &[Frame], num_reads: u64) -> Option<FrameId> {
        let capacity = frames.len();
        let start = (num_reads % capacity as u64) as usize;

        (0..capacity)
            .map(|offset| &frames[(start + offset) % capacity])
            .find(|frame| !frame.is_pinned())
            .map(|frame| frame.frame_id())
    }

    /// Smallest key among unpinned frames; `min_by_key` keeps the first
    /// minimum, so ties go to the lowest index.
    fn min_by_key<F>(frames: &[Frame], key: F) -> Option<FrameId>
    where
        F: Fn(&Frame) -> u64,
    {
        frames
            .iter()
            .filter(|frame| !frame.is_pinned())
            .min_by_key(|frame| key(frame))
            .map(|frame| frame.frame_id())
    }

    fn clock(&mut self, frames: &mut [Frame]) -> Option<FrameId> {
        let num_frames = frames.len();
        if self.clock_hand >= num_frames {
            self.clock_hand = 0;
        }

        // Two rotations are enough: the first clears every bit it passes.
        for _ in 0..(2 * num_frames) {
            let hand = self.clock_hand;
            self.clock_hand = (hand + 1) % num_frames;

            let frame = &mut frames[hand];
            if frame.is_pinned() {
                continue;
            }
            if frame.reference_bit() {
                frame.set_reference_bit(false);
            } else {
                return Some(frame.frame_id());
            }
        }

        None
    }

    fn lru_k(frames: &[Frame], k: usize) -> Option<FrameId> {
        let mut candidates: Vec<&Frame> = frames.iter().filter(|f| !f.is_pinned()).collect();
        if candidates.is_empty() {
            return None;
        }

        // Stable sort keeps index order among equal timestamps.
        candidates.sort_by_key(|frame| frame.last_access());
        let index = k.max(1).min(candidates.len()) - 1;
        Some(candidates[index].frame_id())
    }
}
