mod config;
mod error;
mod types;
mod value;

pub use config::*;
pub use error::*;
pub use types::*;
pub use value::*;
