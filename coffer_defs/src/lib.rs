pub use log;

pub mod id;
pub mod stack;
