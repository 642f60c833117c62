use std::cmp::Ordering;

use crate::common::{PinbaseError, RecordId, Result, Value, NO_PAGE};

use super::btree_index::BTreeIndex;
use super::btree_page::BTreeNode;

/// Forward scan over the leaf chain in ascending key order.
///
/// The scan caches a copy of the leaf it is positioned in and fetches the
/// next leaf only when it runs off the end. It borrows the tree, so the tree
/// cannot be modified while a scan is open.
pub struct TreeScan<'a> {
    tree: &'a BTreeIndex,
    /// Inclusive bounds; None means unbounded
    start: Option<Value>,
    end: Option<Value>,
    leaf: Option<BTreeNode>,
    position: usize,
}

impl<'a> TreeScan<'a> {
    pub(crate) fn new(tree: &'a BTreeIndex, start: Option<Value>, end: Option<Value>) -> Result<Self> {
        let mut scan = Self {
            tree,
            start,
            end,
            leaf: None,
            position: 0,
        };
        scan.restart()?;
        Ok(scan)
    }

    /// Moves the scan back to its first entry.
    pub fn restart(&mut self) -> Result<()> {
        self.position = 0;
        self.leaf = match &self.start {
            None => self.tree.first_leaf()?,
            Some(start) => match self.tree.find_leaf(start) {
                Ok(leaf) => {
                    self.position = leaf.search_key(start).unwrap_or_else(|pos| pos);
                    Some(leaf)
                }
                Err(PinbaseError::KeyNotFound) => None,
                Err(e) => return Err(e),
            },
        };
        Ok(())
    }

    /// Returns the next entry, or `NoMoreEntries` once the scan is exhausted.
    pub fn next_entry(&mut self) -> Result<(Value, RecordId)> {
        loop {
            let leaf = self.leaf.as_ref().ok_or(PinbaseError::NoMoreEntries)?;

            if self.position < leaf.num_keys() {
                let key = &leaf.keys[self.position];
                if let Some(end) = &self.end {
                    if key.compare_key(end) == Ordering::Greater {
                        self.leaf = None;
                        return Err(PinbaseError::NoMoreEntries);
                    }
                }
                let entry = (key.clone(), leaf.values[self.position]);
                self.position += 1;
                return Ok(entry);
            }

            let next = leaf.next;
            self.position = 0;
            self.leaf = if next == NO_PAGE {
                None
            } else {
                Some(self.tree.read_node(next)?)
            };
        }
    }

    /// Ends the scan.
    pub fn close_scan(self) {
        drop(self);
    }
}

impl Iterator for TreeScan<'_> {
    type Item = Result<(Value, RecordId)>;

    fn next(&mut self) -> Option<Self::Item> {
        match self.next_entry() {
            Ok(entry) => Some(Ok(entry)),
            Err(PinbaseError::NoMoreEntries) => None,
            Err(e) => Some(Err(e)),
        }
    }
}
