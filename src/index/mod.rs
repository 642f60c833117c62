pub mod btree_header;
pub mod btree_index;
pub mod btree_iterator;
pub mod btree_page;
pub mod index_manager;

pub use btree_header::{IndexMetadata, HEADER_PAGE_ID};
pub use btree_index::BTreeIndex;
pub use btree_iterator::TreeScan;
pub use btree_page::{max_fan_out, BTreeNode, NodeKind};
pub use index_manager::IndexManager;
