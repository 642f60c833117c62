mod buffer_pool_manager;
mod frame;
mod page_guard;
mod replacer;

pub use buffer_pool_manager::*;
pub use frame::*;
pub use page_guard::*;
pub use replacer::*;
