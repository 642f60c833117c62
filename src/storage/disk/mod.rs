mod disk_scheduler;
mod page_file;

pub use disk_scheduler::*;
pub use page_file::*;
