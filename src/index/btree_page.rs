use std::cmp::Ordering;

use bytes::{Buf, BufMut};

use crate::common::{
    DataType, PageId, PinbaseError, RecordId, Result, SlotId, Value, NO_PAGE, PAGE_SIZE,
};

/// kind (1) + key count (2) + parent (4) + next leaf (4)
pub const NODE_HEADER_SIZE: usize = 11;

const LEAF_KIND: u8 = 0;
const INTERNAL_KIND: u8 = 1;
/// Kind byte of a page sitting on the free-page chain
const FREE_KIND: u8 = 0xFF;

const VALUE_SIZE: usize = 6; // RecordId: PageId(4) + SlotId(2)
const CHILD_SIZE: usize = 4; // PageId

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum NodeKind {
    Leaf,
    Internal,
}

/// Largest fan-out whose nodes still fit one page for `key_type`.
pub fn max_fan_out(key_type: DataType) -> usize {
    (PAGE_SIZE - NODE_HEADER_SIZE) / (key_type.key_width() + VALUE_SIZE)
}

/// In-memory copy of one B+Tree node page.
///
/// Leaves carry one record locator per key in `values`; internal nodes carry
/// `keys.len() + 1` child page numbers in `children`. Only leaves use `next`.
#[derive(Debug, Clone, PartialEq)]
pub struct BTreeNode {
    pub page_id: PageId,
    pub kind: NodeKind,
    pub keys: Vec<Value>,
    pub values: Vec<RecordId>,
    pub children: Vec<PageId>,
    pub parent: PageId,
    pub next: PageId,
}

impl BTreeNode {
    pub fn new_leaf(page_id: PageId, parent: PageId) -> Self {
        Self {
            page_id,
            kind: NodeKind::Leaf,
            keys: Vec::new(),
            values: Vec::new(),
            children: Vec::new(),
            parent,
            next: NO_PAGE,
        }
    }

    pub fn new_internal(page_id: PageId, parent: PageId) -> Self {
        Self {
            kind: NodeKind::Internal,
            ..Self::new_leaf(page_id, parent)
        }
    }

    pub fn is_leaf(&self) -> bool {
        self.kind == NodeKind::Leaf
    }

    pub fn num_keys(&self) -> usize {
        self.keys.len()
    }

    /// Binary search over the keys: `Ok(i)` if `keys[i]` equals `key`,
    /// otherwise `Err(i)` with the sorted insert position.
    pub fn search_key(&self, key: &Value) -> std::result::Result<usize, usize> {
        self.keys.binary_search_by(|probe| probe.compare_key(key))
    }

    /// Index of the child to descend into: the first `i` with `key < keys[i]`,
    /// or the last child when there is none.
    pub fn child_index(&self, key: &Value) -> usize {
        self.keys
            .partition_point(|probe| key.compare_key(probe) != Ordering::Less)
    }

    /// Position of `child` among this node's children.
    pub fn child_position(&self, child: PageId) -> Option<usize> {
        self.children.iter().position(|&c| c == child)
    }

    /// Decodes a node from its page bytes.
    pub fn decode(page_id: PageId, data: &[u8], key_type: DataType) -> Result<Self> {
        let corrupted = |reason: &str| PinbaseError::CorruptedPage {
            page: page_id,
            reason: reason.to_string(),
        };

        let mut buf = data;
        if buf.remaining() < NODE_HEADER_SIZE {
            return Err(corrupted("page shorter than node header"));
        }
        let kind = match buf.get_u8() {
            LEAF_KIND => NodeKind::Leaf,
            INTERNAL_KIND => NodeKind::Internal,
            FREE_KIND => return Err(corrupted("page is on the free list")),
            _ => return Err(corrupted("unknown node kind")),
        };
        let num_keys = buf.get_u16_le() as usize;
        let parent = PageId::new(buf.get_i32_le());
        let next = PageId::new(buf.get_i32_le());

        if num_keys > max_fan_out(key_type) {
            return Err(corrupted("key count exceeds page capacity"));
        }

        let mut keys = Vec::with_capacity(num_keys + 1);
        for _ in 0..num_keys {
            let key = Value::decode_key(&mut buf, key_type)
                .ok_or_else(|| corrupted("malformed key"))?;
            keys.push(key);
        }

        let mut node = Self {
            page_id,
            kind,
            keys,
            values: Vec::new(),
            children: Vec::new(),
            parent,
            next,
        };

        match kind {
            NodeKind::Leaf => {
                if buf.remaining() < num_keys * VALUE_SIZE {
                    return Err(corrupted("truncated record locators"));
                }
                node.values = (0..num_keys)
                    .map(|_| {
                        let page = PageId::new(buf.get_i32_le());
                        let slot = SlotId::new(buf.get_u16_le());
                        RecordId::new(page, slot)
                    })
                    .collect();
            }
            NodeKind::Internal => {
                if buf.remaining() < (num_keys + 1) * CHILD_SIZE {
                    return Err(corrupted("truncated child pointers"));
                }
                node.children = (0..=num_keys)
                    .map(|_| PageId::new(buf.get_i32_le()))
                    .collect();
            }
        }

        Ok(node)
    }

    /// Encodes this node over `data`, zeroing whatever it does not use.
    pub fn encode(&self, data: &mut [u8]) {
        data.fill(0);
        let mut buf = data;

        buf.put_u8(match self.kind {
            NodeKind::Leaf => LEAF_KIND,
            NodeKind::Internal => INTERNAL_KIND,
        });
        buf.put_u16_le(self.keys.len() as u16);
        buf.put_i32_le(self.parent.as_i32());
        buf.put_i32_le(self.next.as_i32());

        for key in &self.keys {
            key.encode_key(&mut buf);
        }

        match self.kind {
            NodeKind::Leaf => {
                for rid in &self.values {
                    buf.put_i32_le(rid.page_id.as_i32());
                    buf.put_u16_le(rid.slot_id.as_u16());
                }
            }
            NodeKind::Internal => {
                for child in &self.children {
                    buf.put_i32_le(child.as_i32());
                }
            }
        }
    }
}

/// Marks a page as free, linking it to `next_free`.
pub fn encode_free_page(data: &mut [u8], next_free: PageId) {
    data.fill(0);
    let mut buf = data;
    buf.put_u8(FREE_KIND);
    buf.put_i32_le(next_free.as_i32());
}

/// Reads the free-chain link of a freed page.
pub fn decode_free_page(page_id: PageId, data: &[u8]) -> Result<PageId> {
    let mut buf = data;
    if buf.remaining() < 5 || buf.get_u8() != FREE_KIND {
        return Err(PinbaseError::CorruptedPage {
            page: page_id,
            reason: "expected a free page".to_string(),
        });
    }
    Ok(PageId::new(buf.get_i32_le()))
}
