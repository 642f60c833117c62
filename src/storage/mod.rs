pub mod disk;

pub use disk::{DiskScheduler, PageFile};
