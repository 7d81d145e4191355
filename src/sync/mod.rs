//! 跨线程同步原语：网格双缓冲与无锁标志/向量槽

pub mod double_buffer;
pub mod lock_free;

pub use double_buffer::DoubleBuffer;
pub use lock_free::{AtomicVec3, LockFreeFlag};
