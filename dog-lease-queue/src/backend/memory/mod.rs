pub mod reaper;
pub mod storage;

pub use reaper::ExpirySweeper;
pub use storage::MemoryStore;
