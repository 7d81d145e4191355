//! 双缓冲发布
//!
//! ```text
//! ┌─────────────────┐     ┌───────────────────┐
//! │  Present Thread │     │ Simulation Thread │
//! │                 │     │                   │
//! │  Read Slot A    │◄────│  Write Slot B     │
//! └─────────────────┘     └───────────────────┘
//!                 flip selector (Release)
//! ```
//!
//! 写者把新值放进非活动槽，然后以 Release 顺序翻转选择器；
//! 读者以 Acquire 顺序读取选择器并拿到该槽中值的共享句柄。
//! 读者永远看不到构造中的值，但可能看到上一次发布的值。
//!
//! 交接不是无锁的，而是短暂加锁：每个槽有一把互斥锁，只在克隆或替换
//! `Arc` 时持有。网格的构造和绘制都在锁外进行。

use std::mem;
use std::sync::atomic::{AtomicU64, AtomicUsize, Ordering};
use std::sync::{Arc, Mutex, PoisonError};

/// 单写者、多读者的双缓冲
///
/// 槽中保存 `Arc<T>`，读者拿到的句柄在写者覆盖该槽后依然有效。
/// 槽上的互斥锁只在克隆或替换 `Arc` 的瞬间持有，读写双方最多等待一次
/// 指针拷贝，不会因对方的计算而等待。
#[derive(Debug)]
pub struct DoubleBuffer<T> {
    slots: [Mutex<Arc<T>>; 2],
    active: AtomicUsize,
    published: AtomicU64,
}

impl<T> DoubleBuffer<T> {
    /// 两个槽都以 `initial` 初始化
    pub fn new(initial: T) -> Self {
        let initial = Arc::new(initial);
        Self {
            slots: [Mutex::new(Arc::clone(&initial)), Mutex::new(initial)],
            active: AtomicUsize::new(0),
            published: AtomicU64::new(0),
        }
    }

    /// 发布新值（仅限单个写者线程调用）
    pub fn swap(&self, value: T) {
        let next = self.active.load(Ordering::Relaxed) ^ 1;
        let previous = {
            let mut slot = self.slots[next].lock().unwrap_or_else(PoisonError::into_inner);
            mem::replace(&mut *slot, Arc::new(value))
        };
        self.active.store(next, Ordering::Release);
        self.published.fetch_add(1, Ordering::Release);

        // 旧值在锁外释放
        drop(previous);
    }

    /// 获取最近发布的值
    ///
    /// 取值期间选择器变化说明该槽可能已被写入尚未发布的值，此时重读。
    pub fn get(&self) -> Arc<T> {
        let mut index = self.active.load(Ordering::Acquire);
        loop {
            let value = {
                let slot = self.slots[index].lock().unwrap_or_else(PoisonError::into_inner);
                Arc::clone(&slot)
            };
            let current = self.active.load(Ordering::Acquire);
            if current == index {
                return value;
            }
            index = current;
        }
    }

    /// 已发布的次数
    pub fn published(&self) -> u64 {
        self.published.load(Ordering::Acquire)
    }
}

impl<T: Default> Default for DoubleBuffer<T> {
    fn default() -> Self {
        Self::new(T::default())
    }
}
