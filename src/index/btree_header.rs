use bytes::{Buf, BufMut};

use crate::common::{DataType, PageId, PinbaseError, Result, NO_PAGE};

use super::btree_page::max_fan_out;

/// The header page is always page 0 of an index file.
pub const HEADER_PAGE_ID: PageId = PageId(0);

const HEADER_SIZE: usize = 7 * 4;

/// Tree-wide metadata persisted in the header page.
///
/// Layout: seven little-endian `i32`s in field order: fan-out, key type tag,
/// node count, entry count, root page, next unallocated page, free-chain head.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct IndexMetadata {
    pub fan_out: usize,
    pub key_type: DataType,
    pub num_nodes: i32,
    pub num_entries: i32,
    /// NO_PAGE while the tree is empty
    pub root: PageId,
    /// First page never handed out to a node
    pub next_page: PageId,
    /// Most recently freed node page, NO_PAGE when the chain is empty
    pub free_head: PageId,
}

impl IndexMetadata {
    pub fn new(key_type: DataType, fan_out: usize) -> Self {
        Self {
            fan_out,
            key_type,
            num_nodes: 0,
            num_entries: 0,
            root: NO_PAGE,
            next_page: PageId::new(HEADER_PAGE_ID.as_i32() + 1),
            free_head: NO_PAGE,
        }
    }

    /// Fewest keys a non-root leaf may hold.
    pub fn min_leaf_keys(&self) -> usize {
        (self.fan_out + 1) / 2
    }

    /// Fewest keys a non-root internal node may hold.
    pub fn min_internal_keys(&self) -> usize {
        self.fan_out / 2
    }

    pub fn encode(&self, data: &mut [u8]) {
        data.fill(0);
        let mut buf = data;
        buf.put_i32_le(self.fan_out as i32);
        buf.put_i32_le(self.key_type.type_id());
        buf.put_i32_le(self.num_nodes);
        buf.put_i32_le(self.num_entries);
        buf.put_i32_le(self.root.as_i32());
        buf.put_i32_le(self.next_page.as_i32());
        buf.put_i32_le(self.free_head.as_i32());
    }

    pub fn decode(data: &[u8]) -> Result<Self> {
        let corrupted = |reason: &str| PinbaseError::CorruptedPage {
            page: HEADER_PAGE_ID,
            reason: reason.to_string(),
        };

        let mut buf = data;
        if buf.remaining() < HEADER_SIZE {
            return Err(corrupted("header page too short"));
        }
        let fan_out = buf.get_i32_le();
        let key_type =
            DataType::from_type_id(buf.get_i32_le()).ok_or_else(|| corrupted("unknown key type"))?;
        let meta = Self {
            fan_out: usize::try_from(fan_out).map_err(|_| corrupted("negative fan-out"))?,
            key_type,
            num_nodes: buf.get_i32_le(),
            num_entries: buf.get_i32_le(),
            root: PageId::new(buf.get_i32_le()),
            next_page: PageId::new(buf.get_i32_le()),
            free_head: PageId::new(buf.get_i32_le()),
        };

        if meta.fan_out < 2 || meta.fan_out > max_fan_out(key_type) {
            return Err(corrupted("fan-out out of range"));
        }
        if meta.num_nodes < 0 || meta.num_entries < 0 {
            return Err(corrupted("negative counters"));
        }
        if meta.next_page.as_i32() <= HEADER_PAGE_ID.as_i32() {
            return Err(corrupted("next page overlaps header"));
        }
        let in_range = |p: PageId| {
            p == NO_PAGE || (p.as_i32() > HEADER_PAGE_ID.as_i32() && p < meta.next_page)
        };
        if !in_range(meta.root) || !in_range(meta.free_head) {
            return Err(corrupted("page reference out of range"));
        }
        if (meta.root == NO_PAGE) != (meta.num_nodes == 0) {
            return Err(corrupted("root does not match node count"));
        }

        Ok(meta)
    }
}
