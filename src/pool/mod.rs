//! Thread pool and worker implementations

mod entry;
pub mod thread_pool;
pub mod worker;

pub use thread_pool::{ThreadPool, ThreadPoolConfig};
pub use worker::PoolStatsSnapshot;
