use std::cmp::Ordering;
use std::collections::{HashMap, VecDeque};
use std::fmt::Write as _;
use std::mem;
use std::path::Path;

use log::{debug, trace};

use crate::buffer::BufferPoolManager;
use crate::common::{
    new_page_buf, BufferPoolConfig, DataType, PageId, PinbaseError, RecordId, Result, Value,
    NO_PAGE,
};
use crate::storage::disk::PageFile;

use super::btree_header::{IndexMetadata, HEADER_PAGE_ID};
use super::btree_iterator::TreeScan;
use super::btree_page::{decode_free_page, encode_free_page, max_fan_out, BTreeNode};

/// A B+Tree mapping typed keys to record locators.
///
/// Every node is one page of the index file, read and written through the
/// tree's own buffer pool. Page 0 holds the `IndexMetadata`, which is
/// rewritten after every change to the tree.
pub struct BTreeIndex {
    index_id: String,
    pool: BufferPoolManager,
    meta: IndexMetadata,
}

impl BTreeIndex {
    /// Creates an index file at `path` holding an empty tree.
    pub fn create<P: AsRef<Path>>(path: P, key_type: DataType, fan_out: usize) -> Result<()> {
        let max = max_fan_out(key_type);
        if fan_out < 2 || fan_out > max {
            return Err(PinbaseError::InvalidFanOut { n: fan_out, max });
        }

        let path = path.as_ref();
        if path.exists() {
            return Err(PinbaseError::IndexAlreadyExists(index_name(path)));
        }

        PageFile::create(path)?;
        let mut file = PageFile::open(path)?;
        let mut page = new_page_buf();
        IndexMetadata::new(key_type, fan_out).encode(&mut page[..]);
        file.write_block(HEADER_PAGE_ID, &page)?;
        file.close()?;

        debug!(
            "created index {} over {} keys with fan-out {}",
            index_name(path),
            key_type,
            fan_out
        );
        Ok(())
    }

    /// Opens the index file at `path` with a buffer pool built from `config`.
    pub fn open<P: AsRef<Path>>(path: P, config: &BufferPoolConfig) -> Result<Self> {
        let path = path.as_ref();
        if !path.exists() {
            return Err(PinbaseError::IndexNotFound(index_name(path)));
        }

        let pool = BufferPoolManager::with_config(path, config)?;
        let meta = Self::read_header(&pool)?;
        debug!(
            "opened index {}: {} nodes, {} entries",
            index_name(path),
            meta.num_nodes,
            meta.num_entries
        );

        Ok(Self {
            index_id: index_name(path),
            pool,
            meta,
        })
    }

    /// Persists the metadata and shuts down the buffer pool, flushing every
    /// dirty node.
    pub fn close(self) -> Result<()> {
        self.persist_meta()?;
        self.pool.shutdown()
    }

    pub fn index_id(&self) -> &str {
        &self.index_id
    }

    pub fn key_type(&self) -> DataType {
        self.meta.key_type
    }

    pub fn fan_out(&self) -> usize {
        self.meta.fan_out
    }

    pub fn num_nodes(&self) -> usize {
        self.meta.num_nodes as usize
    }

    pub fn num_entries(&self) -> usize {
        self.meta.num_entries as usize
    }

    pub fn root_page_id(&self) -> PageId {
        self.meta.root
    }

    /// The buffer pool caching this index's pages.
    pub fn pool(&self) -> &BufferPoolManager {
        &self.pool
    }

    /// Looks up the record stored under `key`.
    pub fn find(&self, key: &Value) -> Result<RecordId> {
        key.validate_key(self.meta.key_type)?;

        let leaf = self.find_leaf(key)?;
        match leaf.search_key(key) {
            Ok(pos) => Ok(leaf.values[pos]),
            Err(_) => Err(PinbaseError::KeyNotFound),
        }
    }

    /// Inserts `key -> rid`, splitting nodes up the tree as they overflow.
    ///
    /// If any page access fails the in-memory metadata is left as it was, so
    /// the counters never get ahead of the nodes.
    pub fn insert(&mut self, key: Value, rid: RecordId) -> Result<()> {
        key.validate_key(self.meta.key_type)?;

        let saved = self.meta.clone();
        if let Err(e) = self.insert_entry(key, rid) {
            self.meta = saved;
            return Err(e);
        }
        self.persist_meta()
    }

    fn insert_entry(&mut self, key: Value, rid: RecordId) -> Result<()> {
        if self.meta.root == NO_PAGE {
            let root_id = self.allocate_node()?;
            let mut root = BTreeNode::new_leaf(root_id, NO_PAGE);
            root.keys.push(key);
            root.values.push(rid);
            self.write_node(&root)?;
            self.meta.root = root_id;
            self.meta.num_entries += 1;
            debug!("{}: first leaf {}", self.index_id, root_id);
            return Ok(());
        }

        let mut leaf = self.find_leaf(&key)?;
        let pos = match leaf.search_key(&key) {
            Ok(_) => return Err(PinbaseError::KeyAlreadyExists),
            Err(pos) => pos,
        };
        leaf.keys.insert(pos, key);
        leaf.values.insert(pos, rid);

        if leaf.num_keys() > self.meta.fan_out {
            self.split_leaf(leaf)?;
        } else {
            self.write_node(&leaf)?;
        }
        self.meta.num_entries += 1;
        Ok(())
    }

    /// Removes `key`, borrowing from or merging with siblings on underflow.
    pub fn delete(&mut self, key: &Value) -> Result<()> {
        key.validate_key(self.meta.key_type)?;

        let saved = self.meta.clone();
        if let Err(e) = self.delete_entry(key) {
            self.meta = saved;
            return Err(e);
        }
        self.persist_meta()
    }

    fn delete_entry(&mut self, key: &Value) -> Result<()> {
        let mut leaf = self.find_leaf(key)?;
        let pos = leaf.search_key(key).map_err(|_| PinbaseError::KeyNotFound)?;
        leaf.keys.remove(pos);
        leaf.values.remove(pos);

        self.rebalance(leaf)?;
        self.meta.num_entries -= 1;
        Ok(())
    }

    /// Starts an ascending scan over every entry.
    pub fn open_scan(&self) -> Result<TreeScan<'_>> {
        TreeScan::new(self, None, None)
    }

    /// Entries with `start <= key <= end`, in key order.
    pub fn range_scan(&self, start: &Value, end: &Value) -> Result<Vec<(Value, RecordId)>> {
        start.validate_key(self.meta.key_type)?;
        end.validate_key(self.meta.key_type)?;

        TreeScan::new(self, Some(start.clone()), Some(end.clone()))?.collect()
    }

    /// Leftmost leaf, or None for an empty tree.
    pub(crate) fn first_leaf(&self) -> Result<Option<BTreeNode>> {
        if self.meta.root == NO_PAGE {
            return Ok(None);
        }
        let mut node = self.read_node(self.meta.root)?;
        while !node.is_leaf() {
            let child = *node.children.first().ok_or_else(|| corrupted(&node, "no children"))?;
            node = self.read_node(child)?;
        }
        Ok(Some(node))
    }

    /// The leaf whose key range covers `key`. Fails with `KeyNotFound` on an
    /// empty tree.
    pub(crate) fn find_leaf(&self, key: &Value) -> Result<BTreeNode> {
        if self.meta.root == NO_PAGE {
            return Err(PinbaseError::KeyNotFound);
        }

        let mut node = self.read_node(self.meta.root)?;
        while !node.is_leaf() {
            let index = node.child_index(key);
            let child = *node
                .children
                .get(index)
                .ok_or_else(|| corrupted(&node, "missing child"))?;
            node = self.read_node(child)?;
        }
        Ok(node)
    }

    fn split_leaf(&mut self, mut leaf: BTreeNode) -> Result<()> {
        let boundary = (self.meta.fan_out + 2) / 2;
        let right_id = self.allocate_node()?;

        let mut right = BTreeNode::new_leaf(right_id, leaf.parent);
        right.keys = leaf.keys.split_off(boundary);
        right.values = leaf.values.split_off(boundary);
        right.next = leaf.next;
        leaf.next = right_id;

        trace!(
            "{}: split leaf {} -> {} ({} + {} keys)",
            self.index_id,
            leaf.page_id,
            right_id,
            leaf.num_keys(),
            right.num_keys()
        );

        let separator = right.keys[0].clone();
        self.insert_into_parent(leaf, separator, right)
    }

    fn split_internal(&mut self, mut node: BTreeNode) -> Result<()> {
        let mid = (self.meta.fan_out + 1) / 2;
        let right_id = self.allocate_node()?;

        let mut right = BTreeNode::new_internal(right_id, node.parent);
        right.keys = node.keys.split_off(mid + 1);
        right.children = node.children.split_off(mid + 1);
        let separator = node
            .keys
            .pop()
            .ok_or_else(|| corrupted(&node, "internal split without a middle key"))?;

        for &child in &right.children {
            self.set_parent(child, right_id)?;
        }

        trace!(
            "{}: split internal {} -> {}, pushing up {}",
            self.index_id,
            node.page_id,
            right_id,
            separator
        );
        self.insert_into_parent(node, separator, right)
    }

    /// Links a freshly split `right` sibling into the parent of `left`,
    /// growing a new root when `left` was the root.
    fn insert_into_parent(
        &mut self,
        mut left: BTreeNode,
        separator: Value,
        mut right: BTreeNode,
    ) -> Result<()> {
        if left.parent == NO_PAGE {
            let root_id = self.allocate_node()?;
            let mut root = BTreeNode::new_internal(root_id, NO_PAGE);
            root.keys.push(separator);
            root.children = vec![left.page_id, right.page_id];
            left.parent = root_id;
            right.parent = root_id;

            // New pages first: a failure before `left` is rewritten leaves
            // the old tree intact.
            self.write_node(&right)?;
            self.write_node(&root)?;
            self.write_node(&left)?;
            self.meta.root = root_id;
            debug!("{}: tree grew, new root {}", self.index_id, root_id);
            return Ok(());
        }

        let mut parent = self.read_node(left.parent)?;
        let index = parent
            .child_position(left.page_id)
            .ok_or_else(|| corrupted(&parent, "split child not linked from parent"))?;
        parent.keys.insert(index, separator);
        parent.children.insert(index + 1, right.page_id);
        right.parent = parent.page_id;

        self.write_node(&right)?;
        self.write_node(&left)?;

        if parent.num_keys() > self.meta.fan_out {
            self.split_internal(parent)
        } else {
            self.write_node(&parent)
        }
    }

    /// Writes `node` back, first fixing an underflow by borrowing from a
    /// sibling (left one first) or merging with one.
    fn rebalance(&mut self, mut node: BTreeNode) -> Result<()> {
        if node.parent == NO_PAGE {
            return self.adjust_root(node);
        }

        let min_keys = self.min_keys(&node);
        if node.num_keys() >= min_keys {
            return self.write_node(&node);
        }

        let mut parent = self.read_node(node.parent)?;
        let index = parent
            .child_position(node.page_id)
            .ok_or_else(|| corrupted(&parent, "underflowing child not linked from parent"))?;

        let mut left = match index.checked_sub(1) {
            Some(left_index) => Some(self.read_node(parent.children[left_index])?),
            None => None,
        };
        if let Some(left) = left.as_mut().filter(|l| l.num_keys() > min_keys) {
            self.borrow_from_left(&mut node, left, &mut parent, index)?;
            self.write_node(left)?;
            self.write_node(&node)?;
            return self.write_node(&parent);
        }

        let mut right = match parent.children.get(index + 1) {
            Some(&right_id) => Some(self.read_node(right_id)?),
            None => None,
        };
        if let Some(right) = right.as_mut().filter(|r| r.num_keys() > min_keys) {
            self.borrow_from_right(&mut node, right, &mut parent, index)?;
            self.write_node(&node)?;
            self.write_node(right)?;
            return self.write_node(&parent);
        }

        // Fold the right node of the pair into the left so the leaf chain
        // only ever loses its successor link.
        match (left, right) {
            (Some(left), _) => self.merge(left, node, parent, index - 1),
            (None, Some(right)) => self.merge(node, right, parent, index),
            (None, None) => Err(corrupted(&parent, "non-root node without siblings")),
        }
    }

    /// Root maintenance after a delete: an empty leaf root empties the tree,
    /// a keyless internal root hands the root over to its only child.
    fn adjust_root(&mut self, root: BTreeNode) -> Result<()> {
        if root.is_leaf() && root.keys.is_empty() {
            self.free_node(root.page_id)?;
            self.meta.root = NO_PAGE;
            debug!("{}: tree is now empty", self.index_id);
            return Ok(());
        }

        if !root.is_leaf() && root.keys.is_empty() {
            let child = *root
                .children
                .first()
                .ok_or_else(|| corrupted(&root, "root without children"))?;
            self.set_parent(child, NO_PAGE)?;
            self.free_node(root.page_id)?;
            self.meta.root = child;
            debug!("{}: tree shrank, new root {}", self.index_id, child);
            return Ok(());
        }

        self.write_node(&root)
    }

    fn borrow_from_left(
        &mut self,
        node: &mut BTreeNode,
        left: &mut BTreeNode,
        parent: &mut BTreeNode,
        index: usize,
    ) -> Result<()> {
        let key = left
            .keys
            .pop()
            .ok_or_else(|| corrupted(left, "lending sibling is empty"))?;

        if node.is_leaf() {
            let value = left
                .values
                .pop()
                .ok_or_else(|| corrupted(left, "leaf keys and values out of step"))?;
            node.keys.insert(0, key);
            node.values.insert(0, value);
            parent.keys[index - 1] = node.keys[0].clone();
        } else {
            let child = left
                .children
                .pop()
                .ok_or_else(|| corrupted(left, "internal node without children"))?;
            let separator = mem::replace(&mut parent.keys[index - 1], key);
            node.keys.insert(0, separator);
            node.children.insert(0, child);
            self.set_parent(child, node.page_id)?;
        }

        trace!(
            "{}: {} borrowed from left sibling {}",
            self.index_id,
            node.page_id,
            left.page_id
        );
        Ok(())
    }

    fn borrow_from_right(
        &mut self,
        node: &mut BTreeNode,
        right: &mut BTreeNode,
        parent: &mut BTreeNode,
        index: usize,
    ) -> Result<()> {
        if right.keys.is_empty() {
            return Err(corrupted(right, "lending sibling is empty"));
        }
        let key = right.keys.remove(0);

        if node.is_leaf() {
            if right.values.is_empty() || right.keys.is_empty() {
                return Err(corrupted(right, "leaf keys and values out of step"));
            }
            node.keys.push(key);
            node.values.push(right.values.remove(0));
            parent.keys[index] = right.keys[0].clone();
        } else {
            if right.children.is_empty() {
                return Err(corrupted(right, "internal node without children"));
            }
            let child = right.children.remove(0);
            let separator = mem::replace(&mut parent.keys[index], key);
            node.keys.push(separator);
            node.children.push(child);
            self.set_parent(child, node.page_id)?;
        }

        trace!(
            "{}: {} borrowed from right sibling {}",
            self.index_id,
            node.page_id,
            right.page_id
        );
        Ok(())
    }

    /// Moves everything in `right` into `left`, drops the separator at
    /// `separator_index` from the parent, and rebalances the parent.
    fn merge(
        &mut self,
        mut left: BTreeNode,
        mut right: BTreeNode,
        mut parent: BTreeNode,
        separator_index: usize,
    ) -> Result<()> {
        let separator = parent.keys.remove(separator_index);
        parent.children.remove(separator_index + 1);

        if left.is_leaf() {
            left.keys.append(&mut right.keys);
            left.values.append(&mut right.values);
            left.next = right.next;
        } else {
            left.keys.push(separator);
            left.keys.append(&mut right.keys);
            for &child in &right.children {
                self.set_parent(child, left.page_id)?;
            }
            left.children.append(&mut right.children);
        }

        trace!(
            "{}: merged {} into {}",
            self.index_id,
            right.page_id,
            left.page_id
        );

        self.write_node(&left)?;
        self.free_node(right.page_id)?;
        self.rebalance(parent)
    }

    fn min_keys(&self, node: &BTreeNode) -> usize {
        if node.is_leaf() {
            self.meta.min_leaf_keys()
        } else {
            self.meta.min_internal_keys()
        }
    }

    pub(crate) fn read_node(&self, page_id: PageId) -> Result<BTreeNode> {
        let page = self.pool.fetch_page(page_id)?;
        let data = page.read();
        let node = BTreeNode::decode(page_id, &data[..], self.meta.key_type)?;
        Ok(node)
    }

    fn write_node(&self, node: &BTreeNode) -> Result<()> {
        let mut page = self.pool.fetch_page(node.page_id)?;
        let mut data = page.write();
        node.encode(&mut data[..]);
        Ok(())
    }

    fn set_parent(&self, page_id: PageId, parent: PageId) -> Result<()> {
        let mut node = self.read_node(page_id)?;
        node.parent = parent;
        self.write_node(&node)
    }

    /// Hands out a page for a new node, reusing freed pages first.
    fn allocate_node(&mut self) -> Result<PageId> {
        let page_id = if self.meta.free_head != NO_PAGE {
            let page_id = self.meta.free_head;
            let page = self.pool.fetch_page(page_id)?;
            let data = page.read();
            self.meta.free_head = decode_free_page(page_id, &data[..])?;
            page_id
        } else {
            let page_id = self.meta.next_page;
            self.meta.next_page = PageId::new(page_id.as_i32() + 1);
            page_id
        };

        self.meta.num_nodes += 1;
        Ok(page_id)
    }

    /// Pushes a node page onto the free chain.
    fn free_node(&mut self, page_id: PageId) -> Result<()> {
        {
            let mut page = self.pool.fetch_page(page_id)?;
            let mut data = page.write();
            encode_free_page(&mut data[..], self.meta.free_head);
        }
        self.meta.free_head = page_id;
        self.meta.num_nodes -= 1;
        Ok(())
    }

    fn persist_meta(&self) -> Result<()> {
        let mut page = self.pool.fetch_page(HEADER_PAGE_ID)?;
        let mut data = page.write();
        self.meta.encode(&mut data[..]);
        Ok(())
    }

    fn read_header(pool: &BufferPoolManager) -> Result<IndexMetadata> {
        let page = pool.fetch_page(HEADER_PAGE_ID)?;
        let data = page.read();
        let meta = IndexMetadata::decode(&data[..])?;
        Ok(meta)
    }

    /// Nodes in breadth-first order, root first.
    fn nodes_breadth_first(&self) -> Result<Vec<BTreeNode>> {
        let mut nodes = Vec::new();
        let mut queue = VecDeque::new();
        if self.meta.root != NO_PAGE {
            queue.push_back(self.meta.root);
        }
        while let Some(page_id) = queue.pop_front() {
            let node = self.read_node(page_id)?;
            queue.extend(node.children.iter().copied());
            nodes.push(node);
        }
        Ok(nodes)
    }

    /// Breadth-first dump of the tree, one node per line.
    ///
    /// Nodes are numbered by their breadth-first position. Internal nodes
    /// print as `(pos)[c0,k0,c1,...]` with child positions, leaves as
    /// `(pos)[rid0,k0,rid1,k1,...,next]` with record locators and the
    /// position of the next leaf, if any.
    pub fn print_tree(&self) -> Result<String> {
        let nodes = self.nodes_breadth_first()?;
        let positions: HashMap<PageId, usize> = nodes
            .iter()
            .enumerate()
            .map(|(pos, node)| (node.page_id, pos))
            .collect();
        let position = |page_id: PageId| -> Result<usize> {
            positions
                .get(&page_id)
                .copied()
                .ok_or(PinbaseError::CorruptedPage {
                    page: page_id,
                    reason: "node not reachable from the root".to_string(),
                })
        };

        let mut out = String::new();
        for (pos, node) in nodes.iter().enumerate() {
            let mut items = Vec::new();
            if node.is_leaf() {
                for (key, rid) in node.keys.iter().zip(&node.values) {
                    items.push(rid.to_string());
                    items.push(key.to_string());
                }
                if node.next != NO_PAGE {
                    items.push(position(node.next)?.to_string());
                }
            } else {
                for (i, child) in node.children.iter().enumerate() {
                    items.push(position(*child)?.to_string());
                    if let Some(key) = node.keys.get(i) {
                        items.push(key.to_string());
                    }
                }
            }
            let _ = writeln!(out, "({})[{}]", pos, items.join(","));
        }
        Ok(out)
    }

    /// Walks the whole tree and reports the first structural violation:
    /// unsorted keys, keys outside their parent's bounds, under- or
    /// over-full nodes, stale parent links, uneven leaf depth, a broken leaf
    /// chain, or counters that disagree with the pages.
    pub fn check_integrity(&self) -> Result<()> {
        if self.meta.root == NO_PAGE {
            if self.meta.num_nodes != 0 || self.meta.num_entries != 0 {
                return Err(PinbaseError::CorruptedPage {
                    page: HEADER_PAGE_ID,
                    reason: "empty tree with non-zero counters".to_string(),
                });
            }
            return Ok(());
        }

        let mut stats = IntegrityStats::default();
        self.check_subtree(self.meta.root, NO_PAGE, None, None, 0, &mut stats)?;

        let header = |reason: &str| PinbaseError::CorruptedPage {
            page: HEADER_PAGE_ID,
            reason: reason.to_string(),
        };
        if stats.nodes != self.meta.num_nodes as usize {
            return Err(header("node count does not match the tree"));
        }
        if stats.entries != self.meta.num_entries as usize {
            return Err(header("entry count does not match the tree"));
        }

        // The leaf chain must visit the leaves left to right, in ascending order.
        let mut chain = Vec::new();
        let mut leaf = self.first_leaf()?;
        let mut previous: Option<Value> = None;
        while let Some(node) = leaf {
            for key in &node.keys {
                if let Some(prev) = &previous {
                    if prev.compare_key(key) != Ordering::Less {
                        return Err(corrupted(&node, "leaf chain out of order"));
                    }
                }
                previous = Some(key.clone());
            }
            chain.push(node.page_id);
            leaf = match node.next {
                NO_PAGE => None,
                next => Some(self.read_node(next)?),
            };
            if chain.len() > stats.leaves.len() {
                return Err(header("leaf chain longer than the number of leaves"));
            }
        }
        if chain != stats.leaves {
            return Err(header("leaf chain does not match left-to-right leaf order"));
        }
        Ok(())
    }

    fn check_subtree(
        &self,
        page_id: PageId,
        parent: PageId,
        lower: Option<&Value>,
        upper: Option<&Value>,
        depth: usize,
        stats: &mut IntegrityStats,
    ) -> Result<()> {
        let node = self.read_node(page_id)?;
        stats.nodes += 1;

        if node.parent != parent {
            return Err(corrupted(&node, "parent link does not match"));
        }
        if node.num_keys() > self.meta.fan_out {
            return Err(corrupted(&node, "node holds more than fan-out keys"));
        }
        if parent != NO_PAGE && node.num_keys() < self.min_keys(&node) {
            return Err(corrupted(&node, "node below minimum fill"));
        }
        if node
            .keys
            .windows(2)
            .any(|w| w[0].compare_key(&w[1]) != Ordering::Less)
        {
            return Err(corrupted(&node, "keys not strictly increasing"));
        }
        for key in &node.keys {
            if lower.is_some_and(|lo| key.compare_key(lo) == Ordering::Less)
                || upper.is_some_and(|hi| key.compare_key(hi) != Ordering::Less)
            {
                return Err(corrupted(&node, "key outside the range its parent allows"));
            }
        }

        if node.is_leaf() {
            if node.values.len() != node.keys.len() {
                return Err(corrupted(&node, "leaf keys and values out of step"));
            }
            match stats.leaf_depth {
                Some(d) if d != depth => return Err(corrupted(&node, "leaves at uneven depth")),
                _ => stats.leaf_depth = Some(depth),
            }
            stats.entries += node.num_keys();
            stats.leaves.push(node.page_id);
            return Ok(());
        }

        if node.children.len() != node.keys.len() + 1 {
            return Err(corrupted(&node, "child count is not key count + 1"));
        }
        if node.keys.is_empty() {
            return Err(corrupted(&node, "internal node without keys"));
        }
        for (i, &child) in node.children.iter().enumerate() {
            let lo = if i == 0 { lower } else { node.keys.get(i - 1) };
            let hi = node.keys.get(i).or(upper);
            self.check_subtree(child, node.page_id, lo, hi, depth + 1, stats)?;
        }
        Ok(())
    }
}

#[derive(Default)]
struct IntegrityStats {
    nodes: usize,
    entries: usize,
    leaves: Vec<PageId>,
    leaf_depth: Option<usize>,
}

fn corrupted(node: &BTreeNode, reason: &str) -> PinbaseError {
    PinbaseError::CorruptedPage {
        page: node.page_id,
        reason: reason.to_string(),
    }
}

fn index_name(path: &Path) -> String {
    path.file_name()
        .map(|name| name.to_string_lossy().to_string())
        .unwrap_or_else(|| path.to_string_lossy().to_string())
}
